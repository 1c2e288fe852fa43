//! Capability-typed device registry.
//!
//! Read-mostly: lookups clone a snapshot, writes go through one lock.
//! A sweeper marks devices offline after three missed heartbeat periods.

use crate::port::DevicePort;
use sensoria_core::{DeviceDescriptor, DeviceStatus};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// How many heartbeat periods a device may miss before going offline.
const OFFLINE_AFTER_PERIODS: i64 = 3;

#[derive(Clone)]
pub struct RegisteredDevice {
    pub descriptor: DeviceDescriptor,
    pub port: Arc<dyn DevicePort>,
}

pub struct DeviceRegistry {
    devices: RwLock<HashMap<String, RegisteredDevice>>,
    heartbeat_period: Duration,
}

impl DeviceRegistry {
    pub fn new(heartbeat_period: Duration) -> Arc<Self> {
        Arc::new(Self {
            devices: RwLock::new(HashMap::new()),
            heartbeat_period,
        })
    }

    /// Register or replace a device with its adapter.
    pub async fn register(&self, descriptor: DeviceDescriptor, port: Arc<dyn DevicePort>) {
        let id = descriptor.id.clone();
        let mut devices = self.devices.write().await;
        devices.insert(id.clone(), RegisteredDevice { descriptor, port });
        tracing::info!("device {} registered", id);
    }

    pub async fn deregister(&self, id: &str) -> bool {
        self.devices.write().await.remove(id).is_some()
    }

    /// Refresh a device's `last_seen` and bring it back online. Returns
    /// false for unknown devices.
    pub async fn heartbeat(&self, id: &str) -> bool {
        let mut devices = self.devices.write().await;
        match devices.get_mut(id) {
            Some(device) => {
                device.descriptor.last_seen = chrono::Utc::now().timestamp();
                device.descriptor.status = DeviceStatus::Online;
                true
            }
            None => false,
        }
    }

    pub async fn get(&self, id: &str) -> Option<RegisteredDevice> {
        self.devices.read().await.get(id).cloned()
    }

    /// Snapshot of all descriptors, sorted by id.
    pub async fn snapshot(&self) -> Vec<DeviceDescriptor> {
        let devices = self.devices.read().await;
        let mut all: Vec<DeviceDescriptor> =
            devices.values().map(|d| d.descriptor.clone()).collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    pub async fn all_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.devices.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn count(&self) -> usize {
        self.devices.read().await.len()
    }

    /// Mark devices with no contact for three heartbeat periods offline.
    /// Returns how many transitioned.
    pub async fn sweep_offline(&self) -> usize {
        let cutoff = chrono::Utc::now().timestamp()
            - OFFLINE_AFTER_PERIODS * self.heartbeat_period.as_secs() as i64;
        let mut devices = self.devices.write().await;
        let mut transitioned = 0;
        for device in devices.values_mut() {
            if device.descriptor.status != DeviceStatus::Offline
                && device.descriptor.last_seen < cutoff
            {
                device.descriptor.status = DeviceStatus::Offline;
                transitioned += 1;
                tracing::info!("device {} marked offline", device.descriptor.id);
            }
        }
        transitioned
    }

    /// Spawn the periodic offline sweeper.
    pub fn spawn_sweeper(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let registry = self.clone();
        let period = self.heartbeat_period;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                registry.sweep_offline().await;
            }
        })
    }
}
