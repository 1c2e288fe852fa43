//! Concurrent device fan-out with per-device retry and timeout.
//!
//! A broadcast dispatches to every targeted device in parallel and waits
//! for all per-device outcomes. One device failing never fails the call;
//! the result map is authoritative and always has exactly one entry per
//! target.

use crate::port::{DeviceError, DevicePayload, OutboundEvent};
use crate::registry::{DeviceRegistry, RegisteredDevice};
use sensoria_core::{DeviceClass, DispatchResult, DispatchStatus, EmotionReading};
use sensoria_emotion::{MappingTables, ModalityBundle};
use sensoria_runtime::WorkPool;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct FanOutConfig {
    /// Per-device send deadline.
    pub dispatch_timeout: Duration,
    /// Retries after the first attempt, transient errors only.
    pub max_retries: u32,
    pub backoff_initial: Duration,
    pub backoff_factor: f64,
}

impl Default for FanOutConfig {
    fn default() -> Self {
        Self {
            dispatch_timeout: Duration::from_secs(2),
            max_retries: 2,
            backoff_initial: Duration::from_millis(200),
            backoff_factor: 2.0,
        }
    }
}

/// Content accompanying a broadcast: the text refs some device classes
/// render alongside the modality payloads.
#[derive(Debug, Clone, Default)]
pub struct BroadcastContent {
    pub text: Option<String>,
}

pub struct FanOut {
    registry: Arc<DeviceRegistry>,
    tables: MappingTables,
    pool: WorkPool,
    config: FanOutConfig,
}

impl FanOut {
    pub fn new(
        registry: Arc<DeviceRegistry>,
        tables: MappingTables,
        pool: WorkPool,
        config: FanOutConfig,
    ) -> Self {
        Self {
            registry,
            tables,
            pool,
            config,
        }
    }

    /// Dispatch one emotion reading to the targeted devices (all known
    /// devices when `target_ids` is `None`). Returns one result per target.
    pub async fn broadcast(
        &self,
        session_key: &str,
        plan_generation: u64,
        reading: &EmotionReading,
        content: &BroadcastContent,
        target_ids: Option<&[String]>,
    ) -> HashMap<String, DispatchResult> {
        let targets: Vec<String> = match target_ids {
            Some(ids) => ids.to_vec(),
            None => self.registry.all_ids().await,
        };

        let bundle = self.tables.bundle(reading);
        let mut handles = Vec::with_capacity(targets.len());

        for id in &targets {
            let prepared = self.registry.get(id).await.map(|device| {
                let payload = shape_payload(&device.descriptor.class, &bundle, content);
                (device, payload)
            });
            let id = id.clone();
            let config = self.config.clone();
            let pool = self.pool.clone();
            let session_key = session_key.to_string();
            let emotion = reading.primary;

            let task_id = id.clone();
            let handle = tokio::spawn(async move {
                let _permit = pool.acquire(&session_key).await;
                match prepared {
                    None => DispatchResult {
                        status: DispatchStatus::Failed,
                        attempts: 0,
                        error: Some(format!("not_found: unknown device {}", task_id)),
                        latency_ms: 0,
                    },
                    Some((device, payload)) => {
                        let required = payload.required_capability();
                        if !device.descriptor.has_capability(required) {
                            DispatchResult::skipped_incompatible(&format!(
                                "device {} lacks capability {:?}",
                                task_id, required
                            ))
                        } else {
                            let event = OutboundEvent {
                                session_key: session_key.clone(),
                                plan_generation,
                                emotion,
                                payload,
                            };
                            dispatch_with_retry(&device, &event, &config).await
                        }
                    }
                }
            });
            handles.push((id, handle));
        }

        let mut results = HashMap::with_capacity(targets.len());
        for (id, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!("dispatch task for {} panicked: {}", id, e);
                    DispatchResult {
                        status: DispatchStatus::Failed,
                        attempts: 0,
                        error: Some("internal: dispatch task failed".to_string()),
                        latency_ms: 0,
                    }
                }
            };
            results.insert(id, result);
        }
        results
    }
}

/// Shape the modality bundle into what one device class consumes.
fn shape_payload(
    class: &DeviceClass,
    bundle: &ModalityBundle,
    content: &BroadcastContent,
) -> DevicePayload {
    match class {
        DeviceClass::Watch => DevicePayload::Nudge {
            intensity: bundle.haptic.intensity,
        },
        DeviceClass::ArGlasses => DevicePayload::Ar {
            overlay: bundle.ar.clone(),
            text: content.text.clone(),
        },
        DeviceClass::FullBodyHaptic | DeviceClass::HapticVest => {
            DevicePayload::Haptic(bundle.haptic.clone())
        }
        DeviceClass::Scent | DeviceClass::Taste => DevicePayload::Scent(bundle.scent.clone()),
        DeviceClass::GenericTts => DevicePayload::Speech {
            prosody: bundle.prosody.clone(),
            text: content.text.clone().unwrap_or_default(),
        },
        DeviceClass::GenericDisplay => DevicePayload::Display {
            text: content.text.clone().unwrap_or_default(),
        },
    }
}

/// One device's send loop: timeout per attempt, exponential backoff on
/// transient failures, immediate stop on permanent ones.
async fn dispatch_with_retry(
    device: &RegisteredDevice,
    event: &OutboundEvent,
    config: &FanOutConfig,
) -> DispatchResult {
    let started = Instant::now();
    let mut attempts = 0u32;
    let mut delay = config.backoff_initial;
    let mut last_error: Option<DeviceError> = None;

    while attempts <= config.max_retries {
        attempts += 1;
        let outcome =
            tokio::time::timeout(config.dispatch_timeout, device.port.send(event, config.dispatch_timeout))
                .await;

        let error = match outcome {
            Ok(Ok(())) => {
                let status = if attempts > 1 {
                    DispatchStatus::RetriedSuccess
                } else {
                    DispatchStatus::Success
                };
                return DispatchResult {
                    status,
                    attempts,
                    error: None,
                    latency_ms: started.elapsed().as_millis() as u64,
                };
            }
            Ok(Err(e)) => e,
            Err(_) => DeviceError::timeout(format!(
                "device {} exceeded {}ms deadline",
                device.descriptor.id,
                config.dispatch_timeout.as_millis()
            )),
        };

        let retryable = error.is_transient() && attempts <= config.max_retries;
        tracing::warn!(
            "dispatch to {} failed (attempt {}, retryable={}): {}",
            device.descriptor.id,
            attempts,
            retryable,
            error
        );
        last_error = Some(error);
        if !retryable {
            break;
        }
        tokio::time::sleep(delay).await;
        delay = Duration::from_secs_f64(delay.as_secs_f64() * config.backoff_factor);
    }

    DispatchResult {
        status: DispatchStatus::Failed,
        attempts,
        error: last_error.map(|e| e.to_string()),
        latency_ms: started.elapsed().as_millis() as u64,
    }
}
