use anyhow::Result;
use clap::Parser;
use sensoria_core::config::{SensoriaConfig, SharedConfig};
use sensoria_core::ports::{SttPort, TextClassifierPort, TtsPort};
use sensoria_core::{DeviceClass, DeviceDescriptor};
use sensoria_devices::{DeviceRegistry, FanOut, FanOutConfig, SimulatedDevice};
use sensoria_emotion::{EmotionEngine, MappingTables};
use sensoria_gateway::{AppState, AuthKeys, GatewayServer, QuotaGuard, RateLimiter};
use sensoria_memory::MemoryStore;
use sensoria_orchestrator::{Orchestrator, SessionTable};
use sensoria_runtime::{ConnectorConfig, HttpTextClassifier, HttpTts, MockStt, MockTts};
use sensoria_segment::SegmentOptions;
use sensoria_sync::{SyncHub, SyncService};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "sensoria", about = "Multi-sensory reading orchestrator")]
struct Args {
    /// Path to TOML config file
    #[arg(short, long, default_value = "sensoria.toml")]
    config: String,

    /// Bind address (overrides config file), e.g. 0.0.0.0:8800
    #[arg(long)]
    bind: Option<String>,

    /// Path to the memory database (overrides config file)
    #[arg(long)]
    db: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenv::dotenv().ok();

    let args = Args::parse();

    {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
        if args.log_json {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        } else {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer())
                .init();
        }
    }

    let mut config = SensoriaConfig::load_or_default(&args.config);
    if let Some(ref bind) = args.bind {
        if let Some((host, port)) = bind.rsplit_once(':') {
            config.server.host = host.to_string();
            config.server.port = port.parse()?;
        }
    }
    if let Some(ref db) = args.db {
        config.memory.db_path = db.clone();
    }

    let config_path = std::path::Path::new(&args.config);
    let _shared_config = SharedConfig::new(
        config.clone(),
        config_path.exists().then(|| config_path.to_path_buf()),
    );

    info!("Initializing sensoria...");

    // 1. Memory store (preferences, bookmarks, RAG corpus)
    info!("Opening memory store at {}...", config.memory.db_path);
    let memory = Arc::new(MemoryStore::new(&config.memory.db_path).await?);

    // 2. Emotion engine, with an optional remote classifier
    let mut emotion = EmotionEngine::local();
    if let Some(ref base_url) = config.emotion.remote_base_url {
        info!("Using remote emotion classifier at {}", base_url);
        let classifier: Arc<dyn TextClassifierPort> = Arc::new(HttpTextClassifier::new(
            base_url,
            ConnectorConfig {
                timeout_ms: config.emotion.timeout_ms,
                ..Default::default()
            },
        )?);
        emotion = emotion.with_text_classifier(classifier);
    }
    let emotion = Arc::new(emotion);
    let tables = MappingTables::v1();

    // 3. Device registry and fan-out
    let heartbeat = Duration::from_secs(config.devices.heartbeat_period_secs);
    let registry = DeviceRegistry::new(heartbeat);
    if config.devices.register_simulated {
        for (id, class) in [
            ("apple_watch", DeviceClass::Watch),
            ("vision_pro", DeviceClass::ArGlasses),
            ("bhaptics_vest", DeviceClass::HapticVest),
            ("teslasuit", DeviceClass::FullBodyHaptic),
            ("aromajoin", DeviceClass::Scent),
        ] {
            registry
                .register(
                    DeviceDescriptor::new(id, class, &format!("sim://{id}")),
                    Arc::new(SimulatedDevice::new(id)),
                )
                .await;
        }
        info!("Registered {} simulated devices", registry.count().await);
    }
    let registry_sweeper = registry.spawn_sweeper();

    let pool = sensoria_runtime::WorkPool::new(config.session.max_in_flight);
    let fanout = Arc::new(FanOut::new(
        registry.clone(),
        tables,
        pool.clone(),
        FanOutConfig {
            dispatch_timeout: Duration::from_millis(config.devices.dispatch_timeout_ms),
            ..Default::default()
        },
    ));

    // 4. TTS / STT providers, selected by configuration
    let tts: Arc<dyn TtsPort> = match (config.tts.provider.as_str(), &config.tts.base_url) {
        ("http", Some(base_url)) => {
            info!("Using HTTP TTS provider at {}", base_url);
            Arc::new(HttpTts::new(
                base_url,
                ConnectorConfig {
                    timeout_ms: config.tts.timeout_ms,
                    ..Default::default()
                },
            )?)
        }
        _ => {
            info!("Using mock TTS provider");
            Arc::new(MockTts::new(&config.tts.voice))
        }
    };
    let stt: Arc<dyn SttPort> = Arc::new(MockStt);

    // 5. Sessions and orchestrator
    let sessions = SessionTable::new(Duration::from_secs(config.session.ttl_minutes * 60));
    let session_sweeper = sessions.spawn_sweeper(Duration::from_secs(60));
    let orchestrator = Arc::new(
        Orchestrator::new(
            sessions,
            emotion.clone(),
            tables,
            memory.clone(),
            fanout.clone(),
            tts.clone(),
            config.session.clone(),
        )
        .map_err(|e| anyhow::anyhow!("orchestrator wiring failed: {e}"))?,
    );

    // 6. Sync service + freshness poller (file events are best-effort, so
    //    the poller re-reads on the cache cadence and pushes etag changes)
    let sync = Arc::new(SyncService::new(
        config.sync.content_root.clone(),
        config.sync.whitelist.clone(),
        Duration::from_secs(config.sync.cache_secs),
        SyncHub::new(config.sync.outbox_capacity),
    ));
    let sync_poller = {
        let sync = sync.clone();
        let period = Duration::from_secs(config.sync.cache_secs.max(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                if let Err(e) = sync.current_manifest().await {
                    error!("manifest refresh failed: {}", e);
                }
            }
        })
    };

    // 7. Gateway
    let state = AppState {
        orchestrator,
        memory,
        registry,
        fanout,
        emotion,
        tables,
        sync,
        tts,
        stt,
        auth: Arc::new(AuthKeys::new(&config.auth.api_keys)),
        quota: Arc::new(QuotaGuard::new(config.quota.clone())),
        limiter: Arc::new(RateLimiter::new(
            config.quota.rate_per_sec,
            config.quota.burst,
        )),
        segment_opts: SegmentOptions {
            max_chunk_chars: config.session.max_chunk_chars,
            reading_wpm: config.session.reading_wpm,
        },
        started_at: chrono::Utc::now().timestamp(),
    };
    let server = GatewayServer::new(state, &config.server.host, config.server.port).start();

    info!(
        "sensoria ready on {}:{} (auth {})",
        config.server.host,
        config.server.port,
        if config.auth.api_keys.is_empty() {
            "disabled"
        } else {
            "enabled"
        }
    );

    tokio::signal::ctrl_c().await?;
    info!("Shutting down...");
    server.abort();
    sync_poller.abort();
    session_sweeper.abort();
    registry_sweeper.abort();
    Ok(())
}
