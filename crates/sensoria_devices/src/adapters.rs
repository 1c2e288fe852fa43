//! In-tree simulated device adapters.
//!
//! These stand in for vendor SDKs: they log what they receive, track the
//! newest plan generation they have seen, and drop stale events the way a
//! real adapter is expected to.

use crate::port::{DeviceError, DevicePort, OutboundEvent};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

/// A simulated device with configurable latency.
pub struct SimulatedDevice {
    id: String,
    latency: Duration,
    newest_generation: AtomicU64,
    received: Mutex<Vec<OutboundEvent>>,
}

impl SimulatedDevice {
    pub fn new(id: &str) -> Self {
        Self::with_latency(id, Duration::from_millis(10))
    }

    pub fn with_latency(id: &str, latency: Duration) -> Self {
        Self {
            id: id.to_string(),
            latency,
            newest_generation: AtomicU64::new(0),
            received: Mutex::new(Vec::new()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Events actually accepted (stale generations excluded).
    pub async fn received(&self) -> Vec<OutboundEvent> {
        self.received.lock().await.clone()
    }
}

#[async_trait]
impl DevicePort for SimulatedDevice {
    async fn send(&self, event: &OutboundEvent, deadline: Duration) -> Result<(), DeviceError> {
        if self.latency >= deadline {
            return Err(DeviceError::timeout(format!(
                "simulated device {} cannot meet {}ms deadline",
                self.id,
                deadline.as_millis()
            )));
        }
        tokio::time::sleep(self.latency).await;

        // Drop events from superseded plans without failing the dispatch.
        let newest = self.newest_generation.fetch_max(event.plan_generation, Ordering::SeqCst);
        if event.plan_generation < newest {
            tracing::debug!(
                "simulated device {} dropped stale event (generation {} < {})",
                self.id,
                event.plan_generation,
                newest
            );
            return Ok(());
        }

        self.received.lock().await.push(event.clone());
        Ok(())
    }
}
