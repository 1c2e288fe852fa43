//! Shared gateway state: the explicit application context handed to every
//! handler. No singletons; lifetimes are scoped to the process.

use crate::auth::{AuthKeys, RateLimiter};
use crate::quota::QuotaGuard;
use sensoria_core::ports::{SttPort, TtsPort};
use sensoria_devices::{DeviceRegistry, FanOut};
use sensoria_emotion::{EmotionEngine, MappingTables};
use sensoria_memory::MemoryStore;
use sensoria_orchestrator::Orchestrator;
use sensoria_segment::SegmentOptions;
use sensoria_sync::SyncService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub memory: Arc<MemoryStore>,
    pub registry: Arc<DeviceRegistry>,
    pub fanout: Arc<FanOut>,
    pub emotion: Arc<EmotionEngine>,
    pub tables: MappingTables,
    pub sync: Arc<SyncService>,
    pub tts: Arc<dyn TtsPort>,
    pub stt: Arc<dyn SttPort>,
    pub auth: Arc<AuthKeys>,
    pub quota: Arc<QuotaGuard>,
    pub limiter: Arc<RateLimiter>,
    pub segment_opts: SegmentOptions,
    pub started_at: i64,
}
