//! Bounded work pool shared by the orchestrator and device fan-out.
//!
//! Guarantees at most `per_session_limit` in-flight tasks per session.
//! Permits are semaphore-backed, so waiters within one session are served
//! in FIFO order and sessions cannot starve each other.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};

#[derive(Clone)]
pub struct WorkPool {
    per_session_limit: usize,
    sessions: Arc<Mutex<HashMap<String, Arc<Semaphore>>>>,
}

impl WorkPool {
    pub fn new(per_session_limit: usize) -> Self {
        Self {
            per_session_limit: per_session_limit.max(1),
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Acquire one work permit for `session_id`, waiting if the session is
    /// at its in-flight limit. The permit releases on drop.
    pub async fn acquire(&self, session_id: &str) -> OwnedSemaphorePermit {
        let semaphore = {
            let mut sessions = self.sessions.lock().await;
            sessions
                .entry(session_id.to_string())
                .or_insert_with(|| Arc::new(Semaphore::new(self.per_session_limit)))
                .clone()
        };
        semaphore
            .acquire_owned()
            .await
            .expect("work pool semaphore closed")
    }

    /// Drop a session's queue state once the session is reaped.
    pub async fn forget(&self, session_id: &str) {
        self.sessions.lock().await.remove(session_id);
    }

    /// Available permits for a session (the full limit if never seen).
    pub async fn available(&self, session_id: &str) -> usize {
        let sessions = self.sessions.lock().await;
        sessions
            .get(session_id)
            .map(|s| s.available_permits())
            .unwrap_or(self.per_session_limit)
    }

    pub fn per_session_limit(&self) -> usize {
        self.per_session_limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_limit_enforced_per_session() {
        let pool = WorkPool::new(2);
        let p1 = pool.acquire("s1").await;
        let _p2 = pool.acquire("s1").await;
        assert_eq!(pool.available("s1").await, 0);

        // A third acquire must wait until a permit drops.
        let pool2 = pool.clone();
        let waiter = tokio::spawn(async move { pool2.acquire("s1").await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(p1);
        let _p3 = tokio::time::timeout(Duration::from_millis(200), waiter)
            .await
            .expect("waiter should complete")
            .unwrap();
    }

    #[tokio::test]
    async fn test_sessions_do_not_share_permits() {
        let pool = WorkPool::new(1);
        let _p1 = pool.acquire("s1").await;
        // s2 is unaffected by s1 being saturated.
        let _p2 = tokio::time::timeout(Duration::from_millis(100), pool.acquire("s2"))
            .await
            .expect("s2 acquire should not block");
    }

    #[tokio::test]
    async fn test_forget_resets_state() {
        let pool = WorkPool::new(1);
        let p = pool.acquire("s1").await;
        assert_eq!(pool.available("s1").await, 0);
        drop(p);
        pool.forget("s1").await;
        assert_eq!(pool.available("s1").await, 1);
    }

    #[test]
    fn test_zero_limit_clamps_to_one() {
        assert_eq!(WorkPool::new(0).per_session_limit(), 1);
    }
}
