//! Language-aware text segmentation.
//!
//! Splits a narrative text into addressable units with highlight metadata
//! and cumulative timing. Input is NFC-normalized first; all offsets are
//! char offsets into that normalized string. Concatenating
//! `separator + text` over the result in index order reproduces it.

pub mod highlight;
pub mod splitter;
pub mod words;

use sensoria_core::{Segment, SegmentStrategy};
use unicode_normalization::UnicodeNormalization;

/// Tunables for one segmentation run.
#[derive(Debug, Clone)]
pub struct SegmentOptions {
    /// Ceiling for adaptive chunks, in chars. 0 disables the cap.
    pub max_chunk_chars: usize,
    /// Reading speed for duration estimates.
    pub reading_wpm: f64,
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self {
            max_chunk_chars: 500,
            reading_wpm: 200.0,
        }
    }
}

/// Split `text` into segments. Never fails on valid UTF-8; text that went
/// through lossy decoding upstream gets a warning attached to the segments
/// containing the replacement character.
pub fn segment(text: &str, strategy: SegmentStrategy, opts: &SegmentOptions) -> Vec<Segment> {
    let normalized: String = text.nfc().collect();
    let chars: Vec<char> = normalized.chars().collect();
    if chars.iter().all(|c| c.is_whitespace()) {
        return Vec::new();
    }

    let spans = match strategy {
        SegmentStrategy::Sentence => splitter::sentence_spans(&chars, 0, chars.len()),
        SegmentStrategy::Paragraph => splitter::paragraph_spans(&chars, 0, chars.len()),
        SegmentStrategy::Adaptive => {
            let base = if splitter::paragraph_break_count(&chars) >= 2 {
                splitter::paragraph_spans(&chars, 0, chars.len())
            } else {
                splitter::sentence_spans(&chars, 0, chars.len())
            };
            let mut capped = Vec::new();
            for span in base {
                capped.extend(splitter::enforce_cap(&chars, span, opts.max_chunk_chars));
            }
            capped
        }
    };

    build_segments(&chars, &spans, opts)
}

fn build_segments(chars: &[char], spans: &[(usize, usize)], opts: &SegmentOptions) -> Vec<Segment> {
    let mut segments = Vec::with_capacity(spans.len());
    let mut prev_end = 0usize;
    let mut clock = 0.0f64;

    for (index, &(start, end)) in spans.iter().enumerate() {
        let separator: String = chars[prev_end..start].iter().collect();
        let mut text: String = chars[start..end].iter().collect();
        let mut end_char = end;

        // Trailing remainder (whitespace after the final span) is absorbed
        // into the last segment so reconstruction loses nothing.
        if index == spans.len() - 1 && end < chars.len() {
            text.extend(&chars[end..]);
            end_char = chars.len();
        }

        let word_count = words::count_words(&text);
        let est = Segment::duration_for(word_count, opts.reading_wpm);
        let highlights = highlight::extract(&chars[start..end], start);
        let warning = if text.contains('\u{FFFD}') {
            Some("input contained invalid bytes; replaced with U+FFFD".to_string())
        } else {
            None
        };

        segments.push(Segment {
            id: format!("seg-{index:04}"),
            index,
            text,
            separator,
            start_char: start,
            end_char,
            word_count,
            est_duration_seconds: est,
            start_time_seconds: clock,
            highlights,
            warning,
        });
        clock += est;
        prev_end = end_char;
    }

    segments
}

/// Reassemble the normalized input from a segment list. Inverse of
/// [`segment`]; used by tests and the reconstruction invariant.
pub fn reconstruct(segments: &[Segment]) -> String {
    let mut out = String::new();
    for seg in segments {
        out.push_str(&seg.separator);
        out.push_str(&seg.text);
    }
    out
}
