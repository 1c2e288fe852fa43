pub mod hub;
pub mod manifest;
pub mod service;

pub use hub::{Outbox, PushFrame, SyncHub};
pub use manifest::{compute_etag, compute_manifest, hash_bytes, Manifest, ManifestEntry};
pub use service::{FileBody, ManifestResponse, SyncService};
