//! Keyword-lexicon emotion scoring over the seven labels.
//!
//! Shared across crates so the engine and its tests use one word list.
//! Covers Traditional/Simplified Chinese and English. This is the local
//! fallback path; a remote classifier can substitute for it at runtime.

use crate::emotion::{EmotionLabel, EmotionReading, EmotionSource};

const HAPPY: &[&str] = &[
    "開心", "开心", "高興", "高兴", "快樂", "快乐", "喜歡", "喜欢", "真好", "太棒", "棒",
    "愛", "爱", "哈哈", "謝謝", "谢谢", "happy", "joy", "glad", "great", "wonderful",
    "love", "delight", "😊", "❤️", "👍",
];

const SAD: &[&str] = &[
    "難過", "难过", "傷心", "伤心", "悲", "哭", "失望", "孤單", "孤单", "遺憾", "遗憾",
    "sad", "cry", "tears", "lonely", "grief", "miserable", "heartbroken", "😢", "💔",
];

const ANGRY: &[&str] = &[
    "生氣", "生气", "憤怒", "愤怒", "討厭", "讨厌", "恨", "氣死", "气死", "可惡", "可恶",
    "angry", "furious", "hate", "rage", "annoyed", "outrage", "😡",
];

const FEAR: &[&str] = &[
    "害怕", "恐懼", "恐惧", "緊張", "紧张", "擔心", "担心", "可怕", "恐怖", "不安",
    "fear", "afraid", "scared", "terrified", "anxious", "dread", "panic",
];

const SURPRISE: &[&str] = &[
    "驚訝", "惊讶", "驚喜", "惊喜", "意外", "突然", "居然", "竟然", "沒想到", "没想到",
    "surprise", "surprised", "astonish", "sudden", "unexpected", "wow", "😮",
];

const DISGUST: &[&str] = &[
    "噁心", "恶心", "嘔", "呕", "反感", "厭惡", "厌恶", "骯髒", "肮脏",
    "disgust", "gross", "revolting", "nauseating", "repulsive", "filthy",
];

const INTENSIFIERS: &[&str] = &[
    "非常", "特別", "特别", "超級", "超级", "極其", "极其", "太", "真", "好", "很",
    "so", "very", "extremely", "really", "totally", "!", "！", "?!", "？！",
];

fn wordlist(label: EmotionLabel) -> &'static [&'static str] {
    match label {
        EmotionLabel::Happy => HAPPY,
        EmotionLabel::Sad => SAD,
        EmotionLabel::Angry => ANGRY,
        EmotionLabel::Fear => FEAR,
        EmotionLabel::Surprise => SURPRISE,
        EmotionLabel::Disgust => DISGUST,
        EmotionLabel::Neutral => &[],
    }
}

/// Score `text` against the lexicon and produce a reading.
///
/// Primary is the label with the most keyword hits (ties resolved in the
/// fixed `EmotionLabel::ALL` order, so results are deterministic). No hits
/// at all yields the neutral reading at intensity 0.5.
pub fn analyze(text: &str) -> EmotionReading {
    let mut hits: Vec<(EmotionLabel, Vec<&str>)> = Vec::new();
    for label in EmotionLabel::ALL {
        let matched: Vec<&str> = wordlist(label)
            .iter()
            .filter(|w| text.contains(*w))
            .copied()
            .collect();
        if !matched.is_empty() {
            hits.push((label, matched));
        }
    }

    if hits.is_empty() {
        return EmotionReading::neutral(EmotionSource::Text);
    }

    // Stable sort keeps the ALL order for equal hit counts.
    hits.sort_by(|a, b| b.1.len().cmp(&a.1.len()));

    let (primary, matched) = hits[0].clone();
    let secondary: Vec<EmotionLabel> = hits.iter().skip(1).take(3).map(|(l, _)| *l).collect();

    let intensifier_hits = INTENSIFIERS.iter().filter(|w| text.contains(*w)).count();
    let total_hits: usize = hits.iter().map(|(_, m)| m.len()).sum();

    let intensity = ((matched.len() as f32 * 0.25) + (intensifier_hits as f32 * 0.15))
        .clamp(0.1, 1.0);
    // Confidence grows with evidence and shrinks when labels compete.
    let margin = matched.len() as f32 / total_hits as f32;
    let confidence = (0.4 + 0.1 * total_hits as f32).min(0.9) * margin;

    let features = matched.join(",");
    EmotionReading::new(
        primary,
        intensity,
        secondary,
        features,
        EmotionSource::Text,
        confidence,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_traditional_chinese() {
        let r = analyze("今天天氣真好！我很開心。");
        assert_eq!(r.primary, EmotionLabel::Happy);
        assert!(r.intensity > 0.3);
        assert!(r.confidence > 0.0);
    }

    #[test]
    fn test_sad_english() {
        let r = analyze("I feel so lonely, I could cry.");
        assert_eq!(r.primary, EmotionLabel::Sad);
    }

    #[test]
    fn test_no_hits_is_neutral() {
        let r = analyze("The report covers three quarters.");
        assert_eq!(r.primary, EmotionLabel::Neutral);
        assert_eq!(r.intensity, 0.5);
    }

    #[test]
    fn test_intensifier_raises_intensity() {
        let weak = analyze("I am glad.");
        let strong = analyze("I am so extremely glad!");
        assert!(strong.intensity > weak.intensity);
    }

    #[test]
    fn test_mixed_text_records_secondary() {
        let r = analyze("驚喜之後我很開心，開心得不得了，真是太快樂了");
        assert_eq!(r.primary, EmotionLabel::Happy);
        assert!(r.secondary.contains(&EmotionLabel::Surprise));
    }

    #[test]
    fn test_features_lists_matched_words() {
        let r = analyze("wow, what a surprise");
        assert!(r.features.contains("surprise"));
    }

    #[test]
    fn test_deterministic_for_same_input() {
        let a = analyze("angry and sad");
        let b = analyze("angry and sad");
        assert_eq!(a.primary, b.primary);
        assert_eq!(a.secondary, b.secondary);
    }
}
