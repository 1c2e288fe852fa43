//! The sync service: cached manifest, conditional fetch, file bodies.
//!
//! The manifest cache lives at most `cache_secs` (file events are not
//! assumed reliable, so reads rescan when the cache is stale). Concurrent
//! recomputes coalesce behind one mutex. Etag changes publish exactly one
//! update to the hub.

use crate::hub::SyncHub;
use crate::manifest::{self, Manifest};
use sensoria_core::{Error, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Deadline for one file read.
const FILE_READ_DEADLINE: Duration = Duration::from_secs(5);

/// Result of a conditional manifest fetch.
#[derive(Debug, Clone)]
pub enum ManifestResponse {
    NotModified,
    Full(Manifest),
}

/// A served file body.
#[derive(Debug, Clone, serde::Serialize)]
pub struct FileBody {
    pub path: String,
    pub content: String,
    pub sha256: String,
}

struct CachedManifest {
    manifest: Manifest,
    computed_at: Instant,
    stale: bool,
}

impl CachedManifest {
    fn is_fresh(&self, ttl: Duration) -> bool {
        !self.stale && self.computed_at.elapsed() < ttl
    }
}

pub struct SyncService {
    content_root: PathBuf,
    whitelist: Vec<String>,
    cache_ttl: Duration,
    cache: Mutex<Option<CachedManifest>>,
    /// Serializes recomputation so concurrent cold reads coalesce.
    recompute: Mutex<()>,
    hub: Arc<SyncHub>,
}

impl SyncService {
    pub fn new(
        content_root: PathBuf,
        whitelist: Vec<String>,
        cache_ttl: Duration,
        hub: Arc<SyncHub>,
    ) -> Self {
        Self {
            content_root,
            whitelist,
            cache_ttl,
            cache: Mutex::new(None),
            recompute: Mutex::new(()),
            hub,
        }
    }

    pub fn hub(&self) -> &Arc<SyncHub> {
        &self.hub
    }

    /// Fetch the manifest, honouring `If-None-Match`.
    pub async fn manifest(&self, if_none_match: Option<&str>) -> Result<ManifestResponse> {
        let manifest = self.current_manifest().await?;
        if if_none_match == Some(manifest.etag.as_str()) {
            return Ok(ManifestResponse::NotModified);
        }
        Ok(ManifestResponse::Full(manifest))
    }

    /// The manifest, recomputed if the cached copy is stale.
    pub async fn current_manifest(&self) -> Result<Manifest> {
        {
            let cache = self.cache.lock().await;
            if let Some(ref cached) = *cache {
                if cached.is_fresh(self.cache_ttl) {
                    return Ok(cached.manifest.clone());
                }
            }
        }

        let _guard = self.recompute.lock().await;
        // A concurrent caller may have refreshed while we waited.
        {
            let cache = self.cache.lock().await;
            if let Some(ref cached) = *cache {
                if cached.is_fresh(self.cache_ttl) {
                    return Ok(cached.manifest.clone());
                }
            }
        }

        let manifest = manifest::compute_manifest(&self.content_root, &self.whitelist)
            .await
            .map_err(|e| Error::internal(format!("manifest computation failed: {e}")))?;

        let previous_etag = {
            let mut cache = self.cache.lock().await;
            let previous = cache.as_ref().map(|c| c.manifest.etag.clone());
            *cache = Some(CachedManifest {
                manifest: manifest.clone(),
                computed_at: Instant::now(),
                stale: false,
            });
            previous
        };

        if previous_etag.as_deref() != Some(manifest.etag.as_str()) {
            if previous_etag.is_some() {
                self.hub.publish_update(&manifest.etag).await;
            }
            tracing::info!(
                "manifest refreshed: etag {} over {} files",
                manifest.etag,
                manifest.file_count
            );
        }
        Ok(manifest)
    }

    /// Drop the cached manifest (file-change signal). The next read
    /// recomputes and, on an etag change, notifies subscribers.
    pub async fn invalidate(&self) {
        let mut cache = self.cache.lock().await;
        if let Some(ref mut cached) = *cache {
            cached.stale = true;
        }
    }

    /// Serve one whitelisted file. Non-whitelisted paths are `not_found`
    /// without revealing whether they exist.
    pub async fn file(&self, path: &str) -> Result<FileBody> {
        if !manifest::is_allowed(path, &self.whitelist) {
            return Err(Error::not_found(format!("no such sync file: {path}")));
        }
        let full = manifest::full_path(&self.content_root, path);
        let bytes = tokio::time::timeout(FILE_READ_DEADLINE, tokio::fs::read(&full))
            .await
            .map_err(|_| Error::timeout(format!("reading {path} exceeded deadline")))?
            .map_err(|_| Error::not_found(format!("no such sync file: {path}")))?;

        let sha256 = manifest::hash_bytes(&bytes);
        let content = String::from_utf8_lossy(&bytes).into_owned();
        Ok(FileBody {
            path: path.to_string(),
            content,
            sha256,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensoria_core::ErrorKind;

    async fn service_with(files: &[(&str, &str)]) -> (tempfile::TempDir, SyncService) {
        let dir = tempfile::tempdir().unwrap();
        let mut whitelist = Vec::new();
        for (name, body) in files {
            tokio::fs::write(dir.path().join(name), body).await.unwrap();
            whitelist.push(name.to_string());
        }
        let service = SyncService::new(
            dir.path().to_path_buf(),
            whitelist,
            Duration::from_secs(5),
            SyncHub::new(8),
        );
        (dir, service)
    }

    #[tokio::test]
    async fn test_conditional_fetch_304() {
        let (_dir, service) = service_with(&[("a.md", "alpha")]).await;
        let full = match service.manifest(None).await.unwrap() {
            ManifestResponse::Full(m) => m,
            _ => panic!("expected full manifest"),
        };
        match service.manifest(Some(&full.etag)).await.unwrap() {
            ManifestResponse::NotModified => {}
            _ => panic!("expected 304"),
        }
        match service.manifest(Some("stale-etag")).await.unwrap() {
            ManifestResponse::Full(m) => assert_eq!(m.etag, full.etag),
            _ => panic!("expected full manifest for stale etag"),
        }
    }

    #[tokio::test]
    async fn test_file_change_rotates_etag_and_notifies() {
        let (dir, service) = service_with(&[("a.md", "one")]).await;
        let (_sub, outbox) = service.hub().subscribe().await;

        let before = service.current_manifest().await.unwrap();
        tokio::fs::write(dir.path().join("a.md"), "two").await.unwrap();
        service.invalidate().await;
        let after = service.current_manifest().await.unwrap();

        assert_ne!(before.etag, after.etag);
        match outbox.pop().await.unwrap() {
            crate::hub::PushFrame::Update { etag, .. } => assert_eq!(etag, after.etag),
            other => panic!("expected update frame, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_change_keeps_etag_and_silence() {
        let (_dir, service) = service_with(&[("a.md", "same")]).await;
        let (_sub, outbox) = service.hub().subscribe().await;
        let first = service.current_manifest().await.unwrap();
        service.invalidate().await;
        let second = service.current_manifest().await.unwrap();
        assert_eq!(first.etag, second.etag);
        assert_eq!(outbox.len().await, 0);
    }

    #[tokio::test]
    async fn test_cache_serves_within_ttl() {
        let (dir, service) = service_with(&[("a.md", "v1")]).await;
        let first = service.current_manifest().await.unwrap();
        // Change on disk but do not invalidate: cached copy still serves.
        tokio::fs::write(dir.path().join("a.md"), "v2").await.unwrap();
        let second = service.current_manifest().await.unwrap();
        assert_eq!(first.etag, second.etag);
    }

    #[tokio::test]
    async fn test_file_fetch_roundtrip() {
        let (_dir, service) = service_with(&[("a.md", "file body here")]).await;
        let body = service.file("a.md").await.unwrap();
        assert_eq!(body.content, "file body here");
        assert_eq!(body.sha256, manifest::hash_bytes(b"file body here"));
    }

    #[tokio::test]
    async fn test_non_whitelisted_file_is_not_found() {
        let (dir, service) = service_with(&[("a.md", "x")]).await;
        // The file genuinely exists but is not whitelisted.
        tokio::fs::write(dir.path().join("secret.md"), "hidden").await.unwrap();
        let err = service.file("secret.md").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        let err = service.file("../outside").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
