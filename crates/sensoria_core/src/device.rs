//! Device descriptors and dispatch results.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Known device families. The class picks the payload shaping rule; the
/// capability set gates what a device may receive at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Watch,
    ArGlasses,
    FullBodyHaptic,
    HapticVest,
    Scent,
    Taste,
    GenericTts,
    GenericDisplay,
}

impl DeviceClass {
    /// Default capability set for a class, used when a device registers
    /// without declaring its own.
    pub fn default_capabilities(&self) -> BTreeSet<Capability> {
        let caps: &[Capability] = match self {
            Self::Watch => &[Capability::Haptic, Capability::Display],
            Self::ArGlasses => &[Capability::Ar, Capability::Display],
            Self::FullBodyHaptic | Self::HapticVest => &[Capability::Haptic],
            Self::Scent | Self::Taste => &[Capability::Scent],
            Self::GenericTts => &[Capability::Tts],
            Self::GenericDisplay => &[Capability::Display],
        };
        caps.iter().copied().collect()
    }
}

/// A typed capability a device supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Haptic,
    Scent,
    Ar,
    Tts,
    Display,
}

/// Device liveness as seen by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    Online,
    Degraded,
    Offline,
}

/// Registry entry for one connected device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub id: String,
    pub class: DeviceClass,
    pub capabilities: BTreeSet<Capability>,
    /// Opaque adapter address (vendor URL, BLE id, ...).
    pub addr: String,
    pub status: DeviceStatus,
    /// Unix timestamp of the last heartbeat or successful dispatch.
    pub last_seen: i64,
}

impl DeviceDescriptor {
    pub fn new(id: &str, class: DeviceClass, addr: &str) -> Self {
        Self {
            id: id.to_string(),
            class,
            capabilities: class.default_capabilities(),
            addr: addr.to_string(),
            status: DeviceStatus::Online,
            last_seen: chrono::Utc::now().timestamp(),
        }
    }

    pub fn has_capability(&self, cap: Capability) -> bool {
        self.capabilities.contains(&cap)
    }
}

/// Terminal state of one per-device dispatch. Never silently dropped: a
/// broadcast yields exactly one of these per targeted device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStatus {
    Success,
    RetriedSuccess,
    Failed,
    SkippedIncompatible,
}

/// Outcome of dispatching one payload to one device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchResult {
    pub status: DispatchStatus,
    /// Send attempts actually made (0 for skipped devices).
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub latency_ms: u64,
}

impl DispatchResult {
    pub fn skipped_incompatible(reason: &str) -> Self {
        Self {
            status: DispatchStatus::SkippedIncompatible,
            attempts: 0,
            error: Some(reason.to_string()),
            latency_ms: 0,
        }
    }

    pub fn succeeded(&self) -> bool {
        matches!(
            self.status,
            DispatchStatus::Success | DispatchStatus::RetriedSuccess
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_default_capabilities() {
        assert!(DeviceClass::HapticVest
            .default_capabilities()
            .contains(&Capability::Haptic));
        assert!(DeviceClass::Scent
            .default_capabilities()
            .contains(&Capability::Scent));
        assert!(!DeviceClass::Scent
            .default_capabilities()
            .contains(&Capability::Haptic));
    }

    #[test]
    fn test_watch_gets_haptic_and_display() {
        let d = DeviceDescriptor::new("apple_watch", DeviceClass::Watch, "sim://watch");
        assert!(d.has_capability(Capability::Haptic));
        assert!(d.has_capability(Capability::Display));
        assert!(!d.has_capability(Capability::Scent));
    }

    #[test]
    fn test_dispatch_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&DispatchStatus::SkippedIncompatible).unwrap(),
            "\"skipped_incompatible\""
        );
        assert_eq!(
            serde_json::to_string(&DispatchStatus::RetriedSuccess).unwrap(),
            "\"retried_success\""
        );
    }

    #[test]
    fn test_skipped_result_has_zero_attempts() {
        let r = DispatchResult::skipped_incompatible("no haptic capability");
        assert_eq!(r.attempts, 0);
        assert!(!r.succeeded());
    }
}
