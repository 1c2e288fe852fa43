use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SensoriaConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub quota: QuotaConfig,
    pub session: SessionConfig,
    pub devices: DeviceConfig,
    pub sync: SyncConfig,
    pub tts: TtsConfig,
    pub emotion: EmotionConfig,
    pub memory: MemoryConfig,
}

impl SensoriaConfig {
    /// Load config from a TOML file, falling back to defaults for missing
    /// fields. Env var overrides are applied after loading.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: SensoriaConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from path; if the file doesn't exist, return defaults
    /// with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Config file not found or invalid ({}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    /// Apply environment variable overrides on top of file-based config.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SENSORIA_BIND") {
            // "host:port" or just a port
            if let Some((host, port)) = v.rsplit_once(':') {
                if let Ok(p) = port.parse() {
                    self.server.host = host.to_string();
                    self.server.port = p;
                }
            } else if let Ok(p) = v.parse() {
                self.server.port = p;
            }
        }
        if let Ok(v) = std::env::var("SENSORIA_API_KEYS") {
            self.auth.api_keys = v
                .split(',')
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect();
        }
        if let Ok(v) = std::env::var("SENSORIA_DB_PATH") {
            self.memory.db_path = v;
        }
        if let Ok(v) = std::env::var("SENSORIA_CONTENT_ROOT") {
            self.sync.content_root = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("TTS_PROVIDER") {
            self.tts.provider = v;
        }
        if let Ok(v) = std::env::var("TTS_BASE_URL") {
            self.tts.base_url = Some(v);
        }
        if let Ok(v) = std::env::var("EMOTION_BASE_URL") {
            self.emotion.remote_base_url = Some(v);
        }
        if let Ok(v) = std::env::var("SENSORIA_READING_WPM") {
            if let Ok(n) = v.parse() {
                self.session.reading_wpm = n;
            }
        }
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8800,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Accepted API keys. Empty means auth is disabled (local development).
    pub api_keys: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QuotaConfig {
    /// Daily per-subject limits.
    pub play_per_day: u32,
    pub tts_per_day: u32,
    pub image_per_day: u32,
    /// Token bucket: sustained requests per second per key.
    pub rate_per_sec: u32,
    /// Token bucket burst size.
    pub burst: u32,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            play_per_day: 1000,
            tts_per_day: 500,
            image_per_day: 200,
            rate_per_sec: 20,
            burst: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Inactivity TTL before a session is reaped.
    pub ttl_minutes: u64,
    /// Default reading speed; per-user `voice_speed` preference scales it.
    pub reading_wpm: f64,
    /// Segmenter chunk ceiling.
    pub max_chunk_chars: usize,
    /// Bounded in-flight work per session.
    pub max_in_flight: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: 30,
            reading_wpm: 200.0,
            max_chunk_chars: 500,
            max_in_flight: 32,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub heartbeat_period_secs: u64,
    /// Per-device dispatch deadline.
    pub dispatch_timeout_ms: u64,
    /// Register the built-in simulated adapters at startup.
    pub register_simulated: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            heartbeat_period_secs: 30,
            dispatch_timeout_ms: 2000,
            register_simulated: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Root directory the whitelist is resolved against.
    pub content_root: PathBuf,
    /// Relative POSIX paths that may be served.
    pub whitelist: Vec<String>,
    /// Manifest cache lifetime.
    pub cache_secs: u64,
    /// Per-subscriber outbox capacity before drop-oldest.
    pub outbox_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            content_root: PathBuf::from("content"),
            whitelist: vec![],
            cache_secs: 5,
            outbox_capacity: 32,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    /// "mock" or "http". The concrete provider is not part of the core
    /// contract; it is selected here.
    pub provider: String,
    pub base_url: Option<String>,
    pub voice: String,
    pub timeout_ms: u64,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            provider: "mock".to_string(),
            base_url: None,
            voice: "normal".to_string(),
            timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmotionConfig {
    /// Optional remote classifier endpoint; lexicon fallback when unset.
    pub remote_base_url: Option<String>,
    pub timeout_ms: u64,
}

impl Default for EmotionConfig {
    fn default() -> Self {
        Self {
            remote_base_url: None,
            timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    pub db_path: String,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            db_path: "sensoria.db".to_string(),
        }
    }
}

// ============================================================================
// Shared handle
// ============================================================================

/// Hot-swappable config handle shared across subsystems.
pub struct SharedConfig {
    inner: ArcSwap<SensoriaConfig>,
    path: Option<PathBuf>,
}

impl SharedConfig {
    pub fn new(config: SensoriaConfig, path: Option<PathBuf>) -> Arc<Self> {
        Arc::new(Self {
            inner: ArcSwap::from_pointee(config),
            path,
        })
    }

    /// Current config snapshot.
    pub fn load(&self) -> Arc<SensoriaConfig> {
        self.inner.load_full()
    }

    /// Re-read the config file and swap it in. No-op without a file path.
    pub fn reload(&self) -> Result<()> {
        let Some(ref path) = self.path else {
            return Ok(());
        };
        let fresh = SensoriaConfig::load(path)?;
        self.inner.store(Arc::new(fresh));
        tracing::info!("Config reloaded from {}", path.display());
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = SensoriaConfig::default();
        assert_eq!(cfg.server.port, 8800);
        assert_eq!(cfg.quota.rate_per_sec, 20);
        assert_eq!(cfg.session.ttl_minutes, 30);
        assert_eq!(cfg.session.reading_wpm, 200.0);
        assert_eq!(cfg.session.max_chunk_chars, 500);
        assert_eq!(cfg.devices.dispatch_timeout_ms, 2000);
        assert_eq!(cfg.sync.cache_secs, 5);
        assert_eq!(cfg.tts.provider, "mock");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let cfg: SensoriaConfig = toml::from_str(
            r#"
            [server]
            port = 9000

            [sync]
            whitelist = ["docs/readme.md"]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.sync.whitelist, vec!["docs/readme.md".to_string()]);
        assert_eq!(cfg.quota.play_per_day, 1000);
    }

    #[test]
    fn test_shared_config_swaps() {
        let shared = SharedConfig::new(SensoriaConfig::default(), None);
        assert_eq!(shared.load().server.port, 8800);
        assert!(shared.reload().is_ok());
    }
}
