//! The orchestrator: composes reader, emotion, device, and memory agents
//! into the play/pause/seek/summary lifecycle.
//!
//! Per-session state is serialized by the session lock, so the lifecycle
//! calls are linearizable within a session. Degradation policy: emotion or
//! TTS trouble produces a neutral-but-valid plan, never an error.

use crate::plan::{highlight_summary, PlaybackPlan};
use crate::session::{SessionState, SessionTable};
use sensoria_core::config::SessionConfig;
use sensoria_core::ports::TtsPort;
use sensoria_core::{EmotionPayload, EmotionReading, EmotionSource, Error, Result, SegmentStrategy};
use sensoria_devices::{BroadcastContent, FanOut};
use sensoria_emotion::{EmotionEngine, MappingTables};
use sensoria_memory::MemoryStore;
use sensoria_runtime::{CapabilityDescriptor, CapabilityRegistry};
use sensoria_segment::{segment, SegmentOptions};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Deadline for orchestrator-level dependency calls.
const ORCHESTRATOR_DEADLINE: Duration = Duration::from_secs(10);

/// Voice used when the TTS path degrades.
const FALLBACK_VOICE: &str = "normal";

#[derive(Debug, Clone, serde::Serialize)]
pub struct PauseOutcome {
    pub session_id: String,
    pub current_index: usize,
    pub playing: bool,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct SeekOutcome {
    pub session_id: String,
    pub current_index: usize,
    pub segment_text: String,
    pub segment_duration: f64,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct SessionSummary {
    pub summary: String,
    pub total_segments: usize,
    pub total_highlights: usize,
    pub current_index: usize,
    pub playing: bool,
    pub emotion: EmotionReading,
}

pub struct Orchestrator {
    sessions: Arc<SessionTable>,
    emotion: Arc<EmotionEngine>,
    tables: MappingTables,
    memory: Arc<MemoryStore>,
    fanout: Arc<FanOut>,
    tts: Arc<dyn TtsPort>,
    capabilities: CapabilityRegistry,
    config: SessionConfig,
}

impl Orchestrator {
    pub fn new(
        sessions: Arc<SessionTable>,
        emotion: Arc<EmotionEngine>,
        tables: MappingTables,
        memory: Arc<MemoryStore>,
        fanout: Arc<FanOut>,
        tts: Arc<dyn TtsPort>,
        config: SessionConfig,
    ) -> Result<Self> {
        let capabilities = wire_capabilities();
        // The orchestrator composes by capability; refuse to start if any
        // required output shape has no producer.
        for required in ["segments", "emotion_reading", "preferences", "dispatch_results"] {
            if capabilities.producers_of(required).is_empty() {
                return Err(Error::internal(format!(
                    "no agent produces required capability '{required}'"
                )));
            }
        }
        Ok(Self {
            sessions,
            emotion,
            tables,
            memory,
            fanout,
            tts,
            capabilities,
            config,
        })
    }

    pub fn capabilities(&self) -> &CapabilityRegistry {
        &self.capabilities
    }

    pub fn sessions(&self) -> &Arc<SessionTable> {
        &self.sessions
    }

    /// Start (or restart) playback of `text`. Builds the full multi-sensory
    /// plan and kicks off the onset broadcast to connected devices.
    pub async fn play(
        &self,
        text: &str,
        user_id: Option<&str>,
        strategy: Option<SegmentStrategy>,
    ) -> Result<PlaybackPlan> {
        if text.trim().is_empty() {
            return Err(Error::invalid_argument("text must not be empty"));
        }

        let wpm = self
            .memory
            .reading_wpm(user_id, self.config.reading_wpm)
            .await;
        let opts = SegmentOptions {
            max_chunk_chars: self.config.max_chunk_chars,
            reading_wpm: wpm,
        };
        let segments = segment(text, strategy.unwrap_or_default(), &opts);
        if segments.is_empty() {
            return Err(Error::invalid_argument("text contains no readable content"));
        }

        let reading = self.predict_with_deadline(text).await;
        let prefs = match user_id {
            Some(user) => self.memory.get_preferences(user).await.ok(),
            None => None,
        };

        let mut bundle = self.tables.bundle(&reading);
        if let Some(voice) = prefs
            .as_ref()
            .and_then(|p| p.get("preferred_voice"))
            .and_then(Value::as_str)
        {
            bundle.prosody.voice_id = voice.to_string();
        }

        let session = self.sessions.create_or_refresh(user_id).await;
        let mut state = session.lock().await;
        state.segments = segments.clone();
        state.current_index = 0;
        state.playing = true;
        state.last_emotion = reading.clone();
        // A new plan supersedes in-flight dispatches of the previous one.
        state.plan_generation += 1;
        state.touch();
        let generation = state.plan_generation;
        let session_id = state.id.clone();
        drop(state);

        let playback_url = match tokio::time::timeout(
            ORCHESTRATOR_DEADLINE,
            self.tts
                .playback_url(&session_id, text, &bundle.prosody),
        )
        .await
        {
            Ok(Ok(url)) => url,
            Ok(Err(e)) => {
                tracing::warn!("TTS adapter failed, degrading to fallback voice: {}", e);
                bundle.prosody.voice_id = FALLBACK_VOICE.to_string();
                format!("urn:sensoria:tts:{session_id}:unavailable")
            }
            Err(_) => {
                tracing::warn!("TTS adapter exceeded {:?} deadline", ORCHESTRATOR_DEADLINE);
                bundle.prosody.voice_id = FALLBACK_VOICE.to_string();
                format!("urn:sensoria:tts:{session_id}:unavailable")
            }
        };

        let mut plan = PlaybackPlan::build(
            &session_id,
            generation,
            segments,
            reading.clone(),
            &bundle,
            playback_url,
        );

        // Preference gates: a user can opt out of whole modalities.
        let pref_flag = |key: &str| {
            prefs
                .as_ref()
                .and_then(|p| p.get(key))
                .and_then(Value::as_bool)
                .unwrap_or(true)
        };
        if !pref_flag("haptics_enabled") {
            plan.haptic_events.clear();
        }
        if !pref_flag("scent_enabled") {
            plan.scent_events.clear();
        }

        self.spawn_onset_broadcast(&plan, &reading);
        Ok(plan)
    }

    /// Pause playback. Idempotent.
    pub async fn pause(&self, session_id: &str) -> Result<PauseOutcome> {
        let session = self.require_session(session_id).await?;
        let mut state = session.lock().await;
        state.playing = false;
        state.touch();
        Ok(PauseOutcome {
            session_id: state.id.clone(),
            current_index: state.current_index,
            playing: state.playing,
        })
    }

    /// Jump to a segment. Invalid indices leave the session untouched.
    pub async fn seek(&self, session_id: &str, segment_index: usize) -> Result<SeekOutcome> {
        let session = self.require_session(session_id).await?;
        let mut state = session.lock().await;
        if segment_index >= state.segments.len() {
            return Err(Error::invalid_argument(format!(
                "invalid_segment: index {} out of range (0..{})",
                segment_index,
                state.segments.len()
            )));
        }
        state.current_index = segment_index;
        state.touch();

        let seg = &state.segments[segment_index];
        let outcome = SeekOutcome {
            session_id: state.id.clone(),
            current_index: segment_index,
            segment_text: seg.text.clone(),
            segment_duration: seg.est_duration_seconds,
        };
        let reading = state.last_emotion.clone();
        let generation = state.plan_generation;
        let text = seg.text.clone();
        let id = state.id.clone();
        drop(state);

        // Re-emit downstream events from the new offset.
        self.spawn_broadcast(id, generation, reading, Some(text));
        Ok(outcome)
    }

    /// Session totals plus a short highlight-derived summary.
    pub async fn summary(&self, session_id: &str) -> Result<SessionSummary> {
        let session = self.require_session(session_id).await?;
        let mut state = session.lock().await;
        state.touch();
        Ok(SessionSummary {
            summary: highlight_summary(&state.segments, 3),
            total_segments: state.segments.len(),
            total_highlights: state.segments.iter().map(|s| s.highlights.len()).sum(),
            current_index: state.current_index,
            playing: state.playing,
            emotion: state.last_emotion.clone(),
        })
    }

    async fn require_session(
        &self,
        session_id: &str,
    ) -> Result<Arc<tokio::sync::Mutex<SessionState>>> {
        self.sessions
            .get(session_id)
            .await
            .ok_or_else(|| Error::not_found(format!("session {session_id} not found")))
    }

    /// Emotion prediction under the orchestrator deadline. Never errors:
    /// a slow or missing backend yields a neutral degraded reading.
    async fn predict_with_deadline(&self, text: &str) -> EmotionReading {
        let payload = EmotionPayload::Text(text.to_string());
        match tokio::time::timeout(ORCHESTRATOR_DEADLINE, self.emotion.predict(&payload)).await {
            Ok(reading) => reading,
            Err(_) => {
                tracing::warn!("emotion prediction exceeded deadline, degrading to neutral");
                EmotionReading::unavailable(EmotionSource::Text)
            }
        }
    }

    fn spawn_onset_broadcast(&self, plan: &PlaybackPlan, reading: &EmotionReading) {
        let text = plan.segments.first().map(|s| s.text.clone());
        self.spawn_broadcast(
            plan.session_id.clone(),
            plan.plan_generation,
            reading.clone(),
            text,
        );
    }

    fn spawn_broadcast(
        &self,
        session_id: String,
        generation: u64,
        reading: EmotionReading,
        text: Option<String>,
    ) {
        let fanout = self.fanout.clone();
        tokio::spawn(async move {
            let content = BroadcastContent { text };
            let results = fanout
                .broadcast(&session_id, generation, &reading, &content, None)
                .await;
            let failed = results.values().filter(|r| !r.succeeded()).count();
            if failed > 0 {
                tracing::debug!(
                    "broadcast for session {} generation {}: {}/{} dispatches unsuccessful",
                    session_id,
                    generation,
                    failed,
                    results.len()
                );
            }
        });
    }
}

/// The agent graph, declared by capability. The orchestrator wires against
/// these shapes, not concrete types.
fn wire_capabilities() -> CapabilityRegistry {
    let mut registry = CapabilityRegistry::new();
    registry.register(
        CapabilityDescriptor::new("reader")
            .consumes("text")
            .produces("segments"),
    );
    registry.register(
        CapabilityDescriptor::new("emotion")
            .consumes("text")
            .consumes("image_bytes")
            .consumes("audio_bytes")
            .produces("emotion_reading")
            .requires("http"),
    );
    registry.register(
        CapabilityDescriptor::new("memory")
            .consumes("user_id")
            .produces("preferences")
            .requires("sql"),
    );
    registry.register(
        CapabilityDescriptor::new("device")
            .consumes("emotion_reading")
            .produces("dispatch_results"),
    );
    registry
}
