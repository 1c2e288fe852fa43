//! Model selection policy for constrained clients.
//!
//! A deterministic rule table: given the client's device class, available
//! memory, and quality preference, pick the inference model tier it should
//! use and a fallback. No learning, no probing; clients re-ask when their
//! conditions change.

use serde::{Deserialize, Serialize};

const MODEL_FULL: &str = "sensoria-affect-large";
const MODEL_LITE: &str = "sensoria-affect-lite";
const MODEL_TINY: &str = "sensoria-affect-tiny";
const MODEL_LEXICON: &str = "lexicon-local";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelChoice {
    pub chosen: String,
    pub fallback: String,
    pub reasons: Vec<String>,
}

/// Pick a model for the given constraints.
pub fn select_model(device: &str, memory_mb: u32, prefer_quality: bool) -> ModelChoice {
    let mut reasons = Vec::new();
    let device = device.to_lowercase();

    let constrained_device = matches!(device.as_str(), "watch" | "wearable" | "embedded");
    if constrained_device {
        reasons.push(format!("device class '{}' is compute-constrained", device));
        return ModelChoice {
            chosen: MODEL_TINY.to_string(),
            fallback: MODEL_LEXICON.to_string(),
            reasons,
        };
    }

    if memory_mb < 1024 {
        reasons.push(format!("{} MiB is below the lite-tier floor (1024)", memory_mb));
        return ModelChoice {
            chosen: MODEL_TINY.to_string(),
            fallback: MODEL_LEXICON.to_string(),
            reasons,
        };
    }

    if prefer_quality && memory_mb >= 2048 {
        reasons.push("quality preferred and memory allows the large tier".to_string());
        return ModelChoice {
            chosen: MODEL_FULL.to_string(),
            fallback: MODEL_LITE.to_string(),
            reasons,
        };
    }

    if prefer_quality {
        reasons.push(format!(
            "quality preferred but {} MiB cannot hold the large tier (2048 needed)",
            memory_mb
        ));
    } else {
        reasons.push("latency preferred; lite tier chosen".to_string());
    }
    ModelChoice {
        chosen: MODEL_LITE.to_string(),
        fallback: MODEL_TINY.to_string(),
        reasons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_gets_tiny() {
        let c = select_model("watch", 8192, true);
        assert_eq!(c.chosen, MODEL_TINY);
        assert_eq!(c.fallback, MODEL_LEXICON);
    }

    #[test]
    fn test_low_memory_gets_tiny() {
        let c = select_model("desktop", 512, true);
        assert_eq!(c.chosen, MODEL_TINY);
    }

    #[test]
    fn test_quality_with_memory_gets_large() {
        let c = select_model("desktop", 4096, true);
        assert_eq!(c.chosen, MODEL_FULL);
        assert_eq!(c.fallback, MODEL_LITE);
    }

    #[test]
    fn test_default_is_lite() {
        let c = select_model("mobile", 2048, false);
        assert_eq!(c.chosen, MODEL_LITE);
        assert!(!c.reasons.is_empty());
    }

    #[test]
    fn test_quality_without_memory_degrades_to_lite() {
        let c = select_model("mobile", 1500, true);
        assert_eq!(c.chosen, MODEL_LITE);
    }
}
