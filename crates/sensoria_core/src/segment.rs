//! Text segments and highlight metadata.
//!
//! Offsets are character offsets into the NFC-normalized input. Concatenating
//! `separator + text` over all segments in index order reproduces that input.

use serde::{Deserialize, Serialize};

/// Splitting strategy for the segmenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentStrategy {
    Sentence,
    Paragraph,
    #[default]
    Adaptive,
}

impl SegmentStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sentence => "sentence",
            Self::Paragraph => "paragraph",
            Self::Adaptive => "adaptive",
        }
    }

    /// Parse a client-supplied strategy name. Accepts plural aliases since
    /// clients routinely send "sentences"/"paragraphs".
    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sentence" | "sentences" => Some(Self::Sentence),
            "paragraph" | "paragraphs" => Some(Self::Paragraph),
            "adaptive" | "auto" => Some(Self::Adaptive),
            _ => None,
        }
    }
}

/// What a highlight marks inside a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightKind {
    Quote,
    Emphasis,
    Exclaim,
    Question,
    Ellipsis,
}

/// A weighted span of interest inside the normalized text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    /// Char offset of the first highlighted character (absolute).
    pub start_char: usize,
    /// Char offset one past the last highlighted character (absolute).
    pub end_char: usize,
    pub kind: HighlightKind,
    /// Relative salience in `[0, 1]`.
    pub weight: f32,
}

/// One addressable unit of the source text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    /// Stable within a session.
    pub id: String,
    /// Dense position in `[0, N-1]`.
    pub index: usize,
    /// The segment body. Terminal punctuation stays attached.
    pub text: String,
    /// Stripped text (whitespace, paragraph breaks) that preceded this
    /// segment. Recorded so the original input can be reconstructed.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub separator: String,
    /// Char offset of the first character of `text` (absolute).
    pub start_char: usize,
    /// Char offset one past the last character of `text` (absolute).
    pub end_char: usize,
    pub word_count: usize,
    pub est_duration_seconds: f64,
    /// Cumulative start time: the sum of prior segment durations.
    pub start_time_seconds: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub highlights: Vec<Highlight>,
    /// Set when the input contained invalid bytes that were replaced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl Segment {
    /// Estimated spoken duration at `wpm` words per minute.
    pub fn duration_for(word_count: usize, wpm: f64) -> f64 {
        if wpm <= 0.0 {
            return 0.0;
        }
        word_count as f64 / (wpm / 60.0)
    }
}
