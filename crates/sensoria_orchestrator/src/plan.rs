//! Playback plans: the synchronized event schedule for one play-through.
//!
//! Haptic events anchor to segment start times. One scent event fires at
//! emotion onset, and AR events mirror the scent schedule.

use sensoria_core::{
    ArOverlay, EmotionReading, HapticPattern, ProsodyPreset, ScentRecipe, Segment,
};
use sensoria_emotion::ModalityBundle;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimedHapticEvent {
    pub at_seconds: f64,
    pub segment_index: usize,
    pub pattern: HapticPattern,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimedScentEvent {
    pub at_seconds: f64,
    pub recipe: ScentRecipe,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimedArEvent {
    pub at_seconds: f64,
    pub overlay: ArOverlay,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackPlan {
    pub session_id: String,
    pub plan_generation: u64,
    pub segments: Vec<Segment>,
    pub emotion: EmotionReading,
    pub prosody: ProsodyPreset,
    pub haptic_events: Vec<TimedHapticEvent>,
    pub scent_events: Vec<TimedScentEvent>,
    pub ar_events: Vec<TimedArEvent>,
    pub duration_total: f64,
    /// Opaque URL from the TTS adapter.
    pub playback_url: String,
}

impl PlaybackPlan {
    pub fn build(
        session_id: &str,
        plan_generation: u64,
        segments: Vec<Segment>,
        emotion: EmotionReading,
        bundle: &ModalityBundle,
        playback_url: String,
    ) -> Self {
        let haptic_events: Vec<TimedHapticEvent> = segments
            .iter()
            .map(|seg| TimedHapticEvent {
                at_seconds: seg.start_time_seconds,
                segment_index: seg.index,
                pattern: bundle.haptic.clone(),
            })
            .collect();

        // Emotion onset: the beginning of playback.
        let scent_events = vec![TimedScentEvent {
            at_seconds: 0.0,
            recipe: bundle.scent.clone(),
        }];
        let ar_events = scent_events
            .iter()
            .map(|s| TimedArEvent {
                at_seconds: s.at_seconds,
                overlay: bundle.ar.clone(),
            })
            .collect();

        let duration_total = segments
            .iter()
            .map(|s| s.est_duration_seconds)
            .sum::<f64>();

        Self {
            session_id: session_id.to_string(),
            plan_generation,
            segments,
            emotion,
            prosody: bundle.prosody.clone(),
            haptic_events,
            scent_events,
            ar_events,
            duration_total,
            playback_url,
        }
    }

    /// The haptic schedule from `segment_index` on, rebased so the first
    /// event fires immediately. Used when a client seeks mid-plan.
    pub fn haptic_events_from(&self, segment_index: usize) -> Vec<TimedHapticEvent> {
        let Some(origin) = self
            .haptic_events
            .iter()
            .find(|e| e.segment_index == segment_index)
            .map(|e| e.at_seconds)
        else {
            return Vec::new();
        };
        self.haptic_events
            .iter()
            .filter(|e| e.segment_index >= segment_index)
            .map(|e| TimedHapticEvent {
                at_seconds: e.at_seconds - origin,
                segment_index: e.segment_index,
                pattern: e.pattern.clone(),
            })
            .collect()
    }

    pub fn total_highlights(&self) -> usize {
        self.segments.iter().map(|s| s.highlights.len()).sum()
    }
}

/// Compose a short textual summary from the highest-weight highlights
/// across all segments, in reading order.
pub fn highlight_summary(segments: &[Segment], max_parts: usize) -> String {
    let mut ranked: Vec<(f32, usize)> = Vec::new();
    for seg in segments {
        if let Some(best) = seg
            .highlights
            .iter()
            .map(|h| h.weight)
            .max_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        {
            ranked.push((best, seg.index));
        }
    }
    ranked.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.1.cmp(&b.1))
    });

    let mut picked: Vec<usize> = ranked.iter().take(max_parts).map(|(_, i)| *i).collect();
    picked.sort_unstable();

    if picked.is_empty() {
        // No highlights anywhere: fall back to the opening segment.
        return segments
            .first()
            .map(|s| s.text.trim().to_string())
            .unwrap_or_default();
    }

    picked
        .into_iter()
        .filter_map(|i| segments.get(i))
        .map(|s| s.text.trim())
        .collect::<Vec<_>>()
        .join(" … ")
}
