//! Push hub: fan-out of sync update frames to WebSocket subscribers.
//!
//! Each subscriber owns a bounded outbox. A subscriber that stops reading
//! loses the oldest frames first and sees a `lag` marker in their place;
//! it never blocks the hub or other subscribers.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};

/// Frames pushed over `/ws/sync`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PushFrame {
    Welcome {
        etag: String,
        file_count: usize,
    },
    Update {
        etag: String,
        changed: bool,
        ts: i64,
    },
    Pong,
    /// Frames were dropped ahead of this point.
    Lag,
    Error {
        kind: String,
        message: String,
    },
}

/// Bounded drop-oldest frame queue for one subscriber.
pub struct Outbox {
    queue: Mutex<VecDeque<PushFrame>>,
    notify: Notify,
    capacity: usize,
    closed: AtomicBool,
}

impl Outbox {
    fn new(capacity: usize) -> Self {
        Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            notify: Notify::new(),
            capacity: capacity.max(2),
            closed: AtomicBool::new(false),
        }
    }

    /// Enqueue a frame. On overflow the oldest frame is dropped and a
    /// single `lag` marker takes its place at the front.
    pub async fn push(&self, frame: PushFrame) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        let mut queue = self.queue.lock().await;
        if queue.len() >= self.capacity {
            queue.pop_front();
            if queue.front() != Some(&PushFrame::Lag) {
                queue.pop_front();
                queue.push_front(PushFrame::Lag);
            }
        }
        queue.push_back(frame);
        drop(queue);
        self.notify.notify_one();
    }

    /// Wait for the next frame. Returns `None` once the outbox is closed
    /// and drained.
    pub async fn pop(&self) -> Option<PushFrame> {
        loop {
            {
                let mut queue = self.queue.lock().await;
                if let Some(frame) = queue.pop_front() {
                    return Some(frame);
                }
            }
            if self.closed.load(Ordering::Acquire) {
                return None;
            }
            self.notify.notified().await;
        }
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    pub async fn len(&self) -> usize {
        self.queue.lock().await.len()
    }
}

pub struct SyncHub {
    subscribers: Mutex<HashMap<u64, Arc<Outbox>>>,
    next_id: AtomicU64,
    outbox_capacity: usize,
}

impl SyncHub {
    pub fn new(outbox_capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            subscribers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            outbox_capacity,
        })
    }

    pub async fn subscribe(&self) -> (u64, Arc<Outbox>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let outbox = Arc::new(Outbox::new(self.outbox_capacity));
        self.subscribers.lock().await.insert(id, outbox.clone());
        tracing::debug!("sync subscriber {} connected", id);
        (id, outbox)
    }

    /// Close and forget a subscriber's outbox.
    pub async fn unsubscribe(&self, id: u64) {
        if let Some(outbox) = self.subscribers.lock().await.remove(&id) {
            outbox.close();
            tracing::debug!("sync subscriber {} reclaimed", id);
        }
    }

    /// Broadcast an etag change to every subscriber.
    pub async fn publish_update(&self, etag: &str) {
        let frame = PushFrame::Update {
            etag: etag.to_string(),
            changed: true,
            ts: chrono::Utc::now().timestamp(),
        };
        let subscribers = self.subscribers.lock().await;
        for outbox in subscribers.values() {
            outbox.push(frame.clone()).await;
        }
        tracing::debug!(
            "published etag {} to {} subscribers",
            etag,
            subscribers.len()
        );
    }

    /// Push a frame to one subscriber.
    pub async fn send_to(&self, id: u64, frame: PushFrame) {
        if let Some(outbox) = self.subscribers.lock().await.get(&id) {
            outbox.push(frame).await;
        }
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.lock().await.len()
    }
}
