//! The device adapter contract and the shaped payloads it carries.

use async_trait::async_trait;
use sensoria_core::{
    ArOverlay, Capability, EmotionLabel, ErrorKind, HapticPattern, ProsodyPreset, ScentRecipe,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Payload shaped for one device class. Every variant declares the
/// capability a device must hold to receive it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DevicePayload {
    Haptic(HapticPattern),
    Scent(ScentRecipe),
    Ar {
        overlay: ArOverlay,
        #[serde(skip_serializing_if = "Option::is_none")]
        text: Option<String>,
    },
    Speech {
        prosody: ProsodyPreset,
        text: String,
    },
    /// Scalar haptic nudge for watches: no pattern, just strength.
    Nudge {
        intensity: f32,
    },
    Display {
        text: String,
    },
}

impl DevicePayload {
    pub fn required_capability(&self) -> Capability {
        match self {
            Self::Haptic(_) | Self::Nudge { .. } => Capability::Haptic,
            Self::Scent(_) => Capability::Scent,
            Self::Ar { .. } => Capability::Ar,
            Self::Speech { .. } => Capability::Tts,
            Self::Display { .. } => Capability::Display,
        }
    }
}

/// One event on its way to a device. `plan_generation` lets adapters drop
/// events from a superseded playback plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundEvent {
    pub session_key: String,
    pub plan_generation: u64,
    pub emotion: EmotionLabel,
    pub payload: DevicePayload,
}

/// Adapter-side failure, classified so the fan-out knows whether to retry.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct DeviceError {
    pub kind: ErrorKind,
    pub message: String,
}

impl DeviceError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::UpstreamUnavailable,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Timeout,
            message: message.into(),
        }
    }

    pub fn incompatible(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Incompatible,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Unauthorized,
            message: message.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}

/// What a vendor adapter implements. Adapters translate the shaped payload
/// into the vendor-specific wire format and must respect `deadline`.
#[async_trait]
pub trait DevicePort: Send + Sync {
    async fn send(&self, event: &OutboundEvent, deadline: Duration) -> Result<(), DeviceError>;
}
