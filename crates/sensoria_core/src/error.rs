//! Error taxonomy shared by every crate in the workspace.
//!
//! Errors are data, not control flow: each carries a machine-readable kind,
//! a human message, an optional hint, and a trace id that also appears in
//! the logs. The gateway maps kinds to HTTP status codes at the edge.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// The closed set of error kinds surfaced to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed payload or out-of-range value.
    InvalidArgument,
    /// Absent session, doc, device, or path.
    NotFound,
    /// Missing or bad credential.
    Unauthorized,
    /// Per-subject daily limit exhausted.
    QuotaExceeded,
    /// Device lacks the required capability.
    Incompatible,
    /// Deadline elapsed on a dependency call.
    Timeout,
    /// Dependency refused or returned an error.
    UpstreamUnavailable,
    /// Invariant violated. Logged loudly, surfaced opaquely.
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid_argument",
            Self::NotFound => "not_found",
            Self::Unauthorized => "unauthorized",
            Self::QuotaExceeded => "quota_exceeded",
            Self::Incompatible => "incompatible",
            Self::Timeout => "timeout",
            Self::UpstreamUnavailable => "upstream_unavailable",
            Self::Internal => "internal",
        }
    }

    /// Transient errors are worth retrying; permanent ones are not.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout | Self::UpstreamUnavailable)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured error with the wire shape `{kind, message, hint?, trace_id}`.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    pub trace_id: String,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            hint: None,
            trace_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    pub fn quota_exceeded(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::QuotaExceeded, message)
    }

    pub fn incompatible(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Incompatible, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UpstreamUnavailable, message)
    }

    /// Internal errors log the real message and keep the wire body opaque.
    pub fn internal(message: impl Into<String>) -> Self {
        let err = Self::new(ErrorKind::Internal, "internal error");
        tracing::error!(trace_id = %err.trace_id, "internal error: {}", message.into());
        err
    }

    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}

pub type Result<T> = std::result::Result<T, Error>;
