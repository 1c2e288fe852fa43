//! Per-subject daily quotas, consulted before the orchestrator runs.

use sensoria_core::config::QuotaConfig;
use sensoria_core::{Error, Result};
use std::collections::HashMap;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuotaKind {
    Play,
    Tts,
    Image,
}

impl QuotaKind {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Play => "play",
            Self::Tts => "tts",
            Self::Image => "image",
        }
    }
}

pub struct QuotaGuard {
    config: QuotaConfig,
    /// (subject, kind, day) -> uses
    counters: Mutex<HashMap<(String, QuotaKind, String), u32>>,
}

impl QuotaGuard {
    pub fn new(config: QuotaConfig) -> Self {
        Self {
            config,
            counters: Mutex::new(HashMap::new()),
        }
    }

    fn limit_for(&self, kind: QuotaKind) -> u32 {
        match kind {
            QuotaKind::Play => self.config.play_per_day,
            QuotaKind::Tts => self.config.tts_per_day,
            QuotaKind::Image => self.config.image_per_day,
        }
    }

    /// Count one use; errors with `quota_exceeded` on overage.
    pub async fn consume(&self, subject: &str, kind: QuotaKind) -> Result<()> {
        let day = chrono::Utc::now().format("%Y-%m-%d").to_string();
        let limit = self.limit_for(kind);
        let mut counters = self.counters.lock().await;
        // Yesterday's counters are garbage once the day rolls over.
        counters.retain(|(_, _, d), _| d == &day);

        let used = counters
            .entry((subject.to_string(), kind, day))
            .or_insert(0);
        if *used >= limit {
            return Err(Error::quota_exceeded(format!(
                "daily {} quota of {} exhausted",
                kind.as_str(),
                limit
            ))
            .with_hint("quota resets at 00:00 UTC"));
        }
        *used += 1;
        Ok(())
    }

    /// Remaining uses today, for the health/status surface.
    pub async fn remaining(&self, subject: &str, kind: QuotaKind) -> u32 {
        let day = chrono::Utc::now().format("%Y-%m-%d").to_string();
        let counters = self.counters.lock().await;
        let used = counters
            .get(&(subject.to_string(), kind, day))
            .copied()
            .unwrap_or(0);
        self.limit_for(kind).saturating_sub(used)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensoria_core::ErrorKind;

    fn tiny_quota() -> QuotaGuard {
        QuotaGuard::new(QuotaConfig {
            play_per_day: 2,
            tts_per_day: 1,
            image_per_day: 1,
            rate_per_sec: 20,
            burst: 20,
        })
    }

    #[tokio::test]
    async fn test_quota_enforced_per_kind() {
        let quota = tiny_quota();
        quota.consume("u1", QuotaKind::Play).await.unwrap();
        quota.consume("u1", QuotaKind::Play).await.unwrap();
        let err = quota.consume("u1", QuotaKind::Play).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::QuotaExceeded);
        // A different kind still has budget.
        quota.consume("u1", QuotaKind::Tts).await.unwrap();
    }

    #[tokio::test]
    async fn test_quota_is_per_subject() {
        let quota = tiny_quota();
        quota.consume("u1", QuotaKind::Tts).await.unwrap();
        assert!(quota.consume("u1", QuotaKind::Tts).await.is_err());
        quota.consume("u2", QuotaKind::Tts).await.unwrap();
    }

    #[tokio::test]
    async fn test_remaining_counts_down() {
        let quota = tiny_quota();
        assert_eq!(quota.remaining("u1", QuotaKind::Play).await, 2);
        quota.consume("u1", QuotaKind::Play).await.unwrap();
        assert_eq!(quota.remaining("u1", QuotaKind::Play).await, 1);
    }
}
