//! Soft session state with per-session locks and TTL reaping.
//!
//! One `tokio::Mutex` per session linearizes play/pause/seek/summary for
//! that session; the outer map lock is held only for lookup. Nothing here
//! survives a restart.

use sensoria_core::{EmotionReading, EmotionSource, Segment};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

#[derive(Debug)]
pub struct SessionState {
    pub id: String,
    pub user_id: Option<String>,
    pub segments: Vec<Segment>,
    pub current_index: usize,
    pub playing: bool,
    pub last_emotion: EmotionReading,
    /// Monotonic; stamped on outbound events so adapters drop stale ones.
    pub plan_generation: u64,
    pub started_at: i64,
    pub updated_at: i64,
    last_touched: Instant,
}

impl SessionState {
    fn new(id: String, user_id: Option<String>) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id,
            user_id,
            segments: Vec::new(),
            current_index: 0,
            playing: false,
            last_emotion: EmotionReading::neutral(EmotionSource::Text),
            plan_generation: 0,
            started_at: now,
            updated_at: now,
            last_touched: Instant::now(),
        }
    }

    /// Refresh the inactivity clock; call on every state access.
    pub fn touch(&mut self) {
        self.last_touched = Instant::now();
        self.updated_at = chrono::Utc::now().timestamp();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_touched.elapsed()
    }
}

pub struct SessionTable {
    sessions: RwLock<HashMap<String, Arc<Mutex<SessionState>>>>,
    /// user_id -> session_id, so a replay by the same user refreshes the
    /// existing session instead of leaking a new one.
    by_user: RwLock<HashMap<String, String>>,
    ttl: Duration,
}

impl SessionTable {
    pub fn new(ttl: Duration) -> Arc<Self> {
        Arc::new(Self {
            sessions: RwLock::new(HashMap::new()),
            by_user: RwLock::new(HashMap::new()),
            ttl,
        })
    }

    /// The session for a `play` call: the user's existing session when
    /// there is one, a fresh anonymous session otherwise.
    pub async fn create_or_refresh(&self, user_id: Option<&str>) -> Arc<Mutex<SessionState>> {
        if let Some(user) = user_id {
            if let Some(existing_id) = self.by_user.read().await.get(user).cloned() {
                if let Some(session) = self.sessions.read().await.get(&existing_id).cloned() {
                    return session;
                }
            }
        }

        let id = Uuid::new_v4().to_string();
        let session = Arc::new(Mutex::new(SessionState::new(
            id.clone(),
            user_id.map(str::to_string),
        )));
        self.sessions.write().await.insert(id.clone(), session.clone());
        if let Some(user) = user_id {
            self.by_user.write().await.insert(user.to_string(), id);
        }
        session
    }

    pub async fn get(&self, session_id: &str) -> Option<Arc<Mutex<SessionState>>> {
        self.sessions.read().await.get(session_id).cloned()
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop sessions idle past the TTL. Returns how many were reaped.
    pub async fn reap_expired(&self) -> usize {
        let mut expired = Vec::new();
        {
            let sessions = self.sessions.read().await;
            for (id, session) in sessions.iter() {
                let state = session.lock().await;
                if state.idle_for() > self.ttl {
                    expired.push((id.clone(), state.user_id.clone()));
                }
            }
        }
        let reaped = expired.len();
        if reaped > 0 {
            let mut sessions = self.sessions.write().await;
            let mut by_user = self.by_user.write().await;
            for (id, user) in expired {
                sessions.remove(&id);
                if let Some(user) = user {
                    if by_user.get(&user) == Some(&id) {
                        by_user.remove(&user);
                    }
                }
                tracing::info!("session {} reaped after inactivity", id);
            }
        }
        reaped
    }

    /// Spawn the periodic TTL sweeper.
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> tokio::task::JoinHandle<()> {
        let table = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                table.reap_expired().await;
            }
        })
    }
}
