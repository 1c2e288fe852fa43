//! Highlight extraction over one segment's text.
//!
//! Offsets are absolute char positions in the normalized input; `base` is
//! the segment's `start_char`.

use sensoria_core::{Highlight, HighlightKind};

const QUOTE_WEIGHT: f32 = 0.5;
const EMPHASIS_WEIGHT: f32 = 0.7;
const EXCLAIM_WEIGHT: f32 = 0.9;
const QUESTION_WEIGHT: f32 = 0.6;
const ELLIPSIS_WEIGHT: f32 = 0.4;

pub fn extract(chars: &[char], base: usize) -> Vec<Highlight> {
    let mut out = Vec::new();
    quotes(chars, base, &mut out);
    punctuation_runs(chars, base, &mut out);
    all_caps_words(chars, base, &mut out);
    out.sort_by_key(|h| h.start_char);
    out
}

/// Paired `"…"`, `“…”` and `「…」` spans, quote marks included.
fn quotes(chars: &[char], base: usize, out: &mut Vec<Highlight>) {
    // Straight quotes pair up consecutively; bracket styles match open/close.
    let mut straight_open: Option<usize> = None;
    let mut curly_open: Option<usize> = None;
    let mut corner_open: Option<usize> = None;

    for (i, &c) in chars.iter().enumerate() {
        match c {
            '"' => match straight_open.take() {
                Some(open) => out.push(Highlight {
                    start_char: base + open,
                    end_char: base + i + 1,
                    kind: HighlightKind::Quote,
                    weight: QUOTE_WEIGHT,
                }),
                None => straight_open = Some(i),
            },
            '“' => curly_open = Some(i),
            '”' => {
                if let Some(open) = curly_open.take() {
                    out.push(Highlight {
                        start_char: base + open,
                        end_char: base + i + 1,
                        kind: HighlightKind::Quote,
                        weight: QUOTE_WEIGHT,
                    });
                }
            }
            '「' => corner_open = Some(i),
            '」' => {
                if let Some(open) = corner_open.take() {
                    out.push(Highlight {
                        start_char: base + open,
                        end_char: base + i + 1,
                        kind: HighlightKind::Quote,
                        weight: QUOTE_WEIGHT,
                    });
                }
            }
            _ => {}
        }
    }
}

/// Runs of `!`/`！`, `?`/`？`, and ellipses.
fn punctuation_runs(chars: &[char], base: usize, out: &mut Vec<Highlight>) {
    let mut i = 0;
    let n = chars.len();
    while i < n {
        match chars[i] {
            '!' | '！' => {
                let start = i;
                while i < n && matches!(chars[i], '!' | '！') {
                    i += 1;
                }
                out.push(Highlight {
                    start_char: base + start,
                    end_char: base + i,
                    kind: HighlightKind::Exclaim,
                    weight: EXCLAIM_WEIGHT,
                });
            }
            '?' | '？' => {
                let start = i;
                while i < n && matches!(chars[i], '?' | '？') {
                    i += 1;
                }
                out.push(Highlight {
                    start_char: base + start,
                    end_char: base + i,
                    kind: HighlightKind::Question,
                    weight: QUESTION_WEIGHT,
                });
            }
            '…' => {
                out.push(Highlight {
                    start_char: base + i,
                    end_char: base + i + 1,
                    kind: HighlightKind::Ellipsis,
                    weight: ELLIPSIS_WEIGHT,
                });
                i += 1;
            }
            '.' if i + 2 < n && chars[i + 1] == '.' && chars[i + 2] == '.' => {
                let start = i;
                while i < n && chars[i] == '.' {
                    i += 1;
                }
                out.push(Highlight {
                    start_char: base + start,
                    end_char: base + i,
                    kind: HighlightKind::Ellipsis,
                    weight: ELLIPSIS_WEIGHT,
                });
            }
            _ => i += 1,
        }
    }
}

/// ASCII all-caps words of length >= 3.
fn all_caps_words(chars: &[char], base: usize, out: &mut Vec<Highlight>) {
    let mut i = 0;
    let n = chars.len();
    while i < n {
        if chars[i].is_ascii_uppercase() {
            let start = i;
            while i < n && chars[i].is_ascii_uppercase() {
                i += 1;
            }
            // A word boundary on both sides: no adjacent alphanumerics.
            let bounded_left = start == 0 || !chars[start - 1].is_alphanumeric();
            let bounded_right = i == n || !chars[i].is_alphanumeric();
            if i - start >= 3 && bounded_left && bounded_right {
                out.push(Highlight {
                    start_char: base + start,
                    end_char: base + i,
                    kind: HighlightKind::Emphasis,
                    weight: EMPHASIS_WEIGHT,
                });
            }
        } else {
            i += 1;
        }
    }
}
