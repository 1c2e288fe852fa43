//! Language-aware word counting.
//!
//! Space-delimited scripts count one word per whitespace token; CJK text has
//! no spaces, so each CJK character counts as a word of its own. Mixed
//! tokens contribute both counts.

/// True for the CJK ranges that matter for reading-speed estimation.
fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{4E00}'..='\u{9FFF}'   // CJK Unified Ideographs
        | '\u{3400}'..='\u{4DBF}' // Extension A
        | '\u{F900}'..='\u{FAFF}' // Compatibility Ideographs
        | '\u{3040}'..='\u{30FF}' // Hiragana + Katakana
        | '\u{AC00}'..='\u{D7AF}' // Hangul Syllables
    )
}

/// Count words in `text`.
pub fn count_words(text: &str) -> usize {
    let mut count = 0;
    for token in text.split_whitespace() {
        let mut in_word_run = false;
        let mut token_words = 0;
        for c in token.chars() {
            if is_cjk(c) {
                token_words += 1;
                in_word_run = false;
            } else if c.is_alphanumeric() {
                if !in_word_run {
                    token_words += 1;
                    in_word_run = true;
                }
            } else {
                in_word_run = false;
            }
        }
        // Punctuation-only tokens still represent one unit of pacing.
        count += token_words.max(1);
    }
    count
}
