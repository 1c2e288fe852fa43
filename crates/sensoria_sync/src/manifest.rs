//! Manifest computation: content-hash identity for the syncable file set.
//!
//! The etag is derived from the sorted `(path, sha256)` pairs only, so it
//! changes exactly when file content changes, never with mtime churn or
//! in-memory ordering.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Files above this size hash off the request path.
const OFFLOAD_HASH_BYTES: u64 = 1024 * 1024;

const HASH_CHUNK_BYTES: usize = 8192;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Relative POSIX path inside the content root.
    pub path: String,
    pub sha256: String,
    pub mtime_unix: i64,
    pub size_bytes: u64,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub etag: String,
    pub file_count: usize,
    pub files: Vec<ManifestEntry>,
}

/// Extension-derived category, used by clients to prioritize fetches.
fn categorize(path: &str) -> String {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    match ext.as_str() {
        "md" | "txt" => "text".to_string(),
        "json" | "toml" | "yaml" | "yml" => "config".to_string(),
        "html" | "css" | "js" => "web".to_string(),
        _ => "data".to_string(),
    }
}

fn hash_file_blocking(path: &Path) -> Result<String> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let mut reader = std::io::BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut chunk = [0u8; HASH_CHUNK_BYTES];
    loop {
        let n = reader.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        hasher.update(&chunk[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Hash one file in fixed-size chunks. Large files move to the blocking
/// pool so request handlers never stall on I/O-heavy hashing.
pub async fn hash_file(path: &Path, size_bytes: u64) -> Result<String> {
    if size_bytes > OFFLOAD_HASH_BYTES {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || hash_file_blocking(&path))
            .await
            .context("hash task failed")?
    } else {
        hash_file_blocking(path)
    }
}

pub fn hash_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// The etag over `(path, sha256)` pairs: canonical JSON of the sorted
/// pairs, hashed. Deterministic over content and order.
pub fn compute_etag(files: &[ManifestEntry]) -> String {
    let mut pairs: Vec<(&str, &str)> = files
        .iter()
        .map(|f| (f.path.as_str(), f.sha256.as_str()))
        .collect();
    pairs.sort();
    let canonical: Vec<serde_json::Value> = pairs
        .iter()
        .map(|(path, sha256)| serde_json::json!({"path": path, "sha256": sha256}))
        .collect();
    let body = serde_json::to_string(&canonical).expect("pairs serialize");
    hash_bytes(body.as_bytes())
}

/// Walk the whitelist and build a manifest. Missing whitelisted files are
/// skipped (they reappear once created); nothing outside the whitelist is
/// ever visited.
pub async fn compute_manifest(content_root: &Path, whitelist: &[String]) -> Result<Manifest> {
    let mut files = Vec::with_capacity(whitelist.len());
    for rel in whitelist {
        let full = content_root.join(rel);
        let meta = match tokio::fs::metadata(&full).await {
            Ok(m) if m.is_file() => m,
            _ => continue,
        };
        let size_bytes = meta.len();
        let mtime_unix = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        let sha256 = hash_file(&full, size_bytes).await?;
        files.push(ManifestEntry {
            path: rel.clone(),
            sha256,
            mtime_unix,
            size_bytes,
            category: categorize(rel),
        });
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));
    let etag = compute_etag(&files);
    Ok(Manifest {
        etag,
        file_count: files.len(),
        files,
    })
}

/// Normalized whitelist membership and traversal checks for a client path.
pub fn is_allowed(path: &str, whitelist: &[String]) -> bool {
    if path.is_empty() || path.starts_with('/') || path.contains('\\') {
        return false;
    }
    if path.split('/').any(|part| part == ".." || part == "." || part.is_empty()) {
        return false;
    }
    whitelist.iter().any(|allowed| allowed == path)
}

pub fn full_path(content_root: &Path, rel: &str) -> PathBuf {
    content_root.join(rel)
}
