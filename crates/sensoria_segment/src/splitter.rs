//! Span computation: where segments begin and end.
//!
//! All functions work on a `&[char]` of the NFC-normalized input and return
//! half-open `(start, end)` char ranges. Ranges never overlap, are strictly
//! increasing, and skip only whitespace, so the gaps between them are the
//! stripped separators the reconstruction invariant needs.

/// Sentence-terminal punctuation. The terminator run stays with the
/// preceding segment; consecutive terminators collapse into one boundary.
pub fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '。' | '！' | '？')
}

fn trim_span(chars: &[char], start: usize, end: usize) -> (usize, usize) {
    let mut s = start;
    let mut e = end;
    while s < e && chars[s].is_whitespace() {
        s += 1;
    }
    while e > s && chars[e - 1].is_whitespace() {
        e -= 1;
    }
    (s, e)
}

/// Split `[from, to)` into sentence spans.
pub fn sentence_spans(chars: &[char], from: usize, to: usize) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut i = from;
    while i < to {
        while i < to && chars[i].is_whitespace() {
            i += 1;
        }
        if i >= to {
            break;
        }
        let start = i;
        while i < to {
            if is_terminator(chars[i]) {
                while i < to && is_terminator(chars[i]) {
                    i += 1;
                }
                break;
            }
            i += 1;
        }
        let (s, e) = trim_span(chars, start, i);
        if s < e {
            spans.push((s, e));
        }
    }
    spans
}

/// Split `[from, to)` into paragraph spans. A paragraph boundary is a
/// whitespace run containing at least two newline characters.
pub fn paragraph_spans(chars: &[char], from: usize, to: usize) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut i = from;
    while i < to {
        while i < to && chars[i].is_whitespace() {
            i += 1;
        }
        if i >= to {
            break;
        }
        let start = i;
        let mut end = to;
        let mut j = i;
        while j < to {
            if chars[j].is_whitespace() {
                let ws_start = j;
                let mut newlines = 0;
                while j < to && chars[j].is_whitespace() {
                    if chars[j] == '\n' {
                        newlines += 1;
                    }
                    j += 1;
                }
                if newlines >= 2 {
                    end = ws_start;
                    break;
                }
            } else {
                j += 1;
            }
        }
        let (s, e) = trim_span(chars, start, end);
        if s < e {
            spans.push((s, e));
        }
        i = j.max(end);
    }
    spans
}

/// Count paragraph boundaries in the whole text (used by the adaptive
/// strategy to decide between paragraph and sentence splitting).
pub fn paragraph_break_count(chars: &[char]) -> usize {
    let mut breaks = 0;
    let mut i = 0;
    while i < chars.len() {
        if chars[i].is_whitespace() {
            let mut newlines = 0;
            while i < chars.len() && chars[i].is_whitespace() {
                if chars[i] == '\n' {
                    newlines += 1;
                }
                i += 1;
            }
            if newlines >= 2 {
                breaks += 1;
            }
        } else {
            i += 1;
        }
    }
    breaks
}

/// Enforce `max_chunk_chars` on one span: sub-segment by sentence, and
/// where a single sentence is still over the limit, split at the nearest
/// whitespace before the limit (hard cut when there is none).
pub fn enforce_cap(chars: &[char], span: (usize, usize), cap: usize) -> Vec<(usize, usize)> {
    let (start, end) = span;
    if cap == 0 || end - start <= cap {
        return vec![span];
    }

    let sentences = sentence_spans(chars, start, end);
    if sentences.len() > 1 {
        let mut out = Vec::new();
        for s in sentences {
            out.extend(enforce_cap(chars, s, cap));
        }
        return out;
    }

    // One oversized sentence: whitespace-bounded pieces.
    let mut out = Vec::new();
    let mut s = start;
    while end - s > cap {
        let window_end = s + cap;
        let cut = (s + 1..=window_end)
            .rev()
            .find(|&i| chars[i - 1].is_whitespace() || (i < end && chars[i].is_whitespace()));
        let split_at = match cut {
            // Prefer cutting at whitespace so no mid-word break happens.
            Some(i) => i,
            None => window_end,
        };
        let (ts, te) = trim_span(chars, s, split_at);
        if ts < te {
            out.push((ts, te));
        }
        // Skip the whitespace we split on.
        let mut next = split_at;
        while next < end && chars[next].is_whitespace() {
            next += 1;
        }
        s = next;
    }
    let (ts, te) = trim_span(chars, s, end);
    if ts < te {
        out.push((ts, te));
    }
    out
}
