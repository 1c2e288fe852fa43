//! Retrieval scoring: deterministic Jaccard over token multisets.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One retrievable document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagDoc {
    pub doc_id: String,
    pub text: String,
    /// Lowercased whitespace-split token bag, sorted so serialization is
    /// deterministic and round-trip-safe.
    pub tokens: Vec<String>,
    #[serde(default)]
    pub meta: serde_json::Value,
}

impl RagDoc {
    pub fn new(doc_id: String, text: String, meta: serde_json::Value) -> Self {
        let tokens = tokenize(&text);
        Self {
            doc_id,
            text,
            tokens,
            meta,
        }
    }
}

/// Lowercase, split on whitespace, sort. Exact tokenization is an
/// implementation choice; this one is deterministic and reproducible from
/// the stored text alone.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens: Vec<String> = text
        .split_whitespace()
        .map(|t| t.to_lowercase())
        .collect();
    tokens.sort_unstable();
    tokens
}

fn counts(tokens: &[String]) -> HashMap<&str, u32> {
    let mut map: HashMap<&str, u32> = HashMap::new();
    for t in tokens {
        *map.entry(t.as_str()).or_insert(0) += 1;
    }
    map
}

/// Multiset Jaccard: sum of per-token min counts over sum of max counts.
/// 1.0 for identical bags, 0.0 for disjoint (or either side empty).
pub fn jaccard(a: &[String], b: &[String]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let ca = counts(a);
    let cb = counts(b);
    let mut intersection: u64 = 0;
    let mut union: u64 = 0;
    for (token, &na) in &ca {
        let nb = cb.get(token).copied().unwrap_or(0);
        intersection += na.min(nb) as u64;
        union += na.max(nb) as u64;
    }
    for (token, &nb) in &cb {
        if !ca.contains_key(token) {
            union += nb as u64;
        }
    }
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}

/// Rank `docs` against a query. Ties break by shorter `doc_id`, then
/// lexically, so results are stable across runs.
pub fn rank<'a>(docs: impl Iterator<Item = &'a RagDoc>, query: &str, top_k: usize) -> Vec<(RagDoc, f64)> {
    let q = tokenize(query);
    let mut scored: Vec<(RagDoc, f64)> = docs
        .map(|d| {
            let score = jaccard(&d.tokens, &q);
            (d.clone(), score)
        })
        .collect();
    scored.sort_by(|(a, sa), (b, sb)| {
        sb.partial_cmp(sa)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.doc_id.len().cmp(&b.doc_id.len()))
            .then_with(|| a.doc_id.cmp(&b.doc_id))
    });
    scored.truncate(top_k);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, text: &str) -> RagDoc {
        RagDoc::new(id.to_string(), text.to_string(), serde_json::json!({}))
    }

    #[test]
    fn test_tokenize_is_sorted_and_lowercased() {
        assert_eq!(tokenize("B a A"), vec!["a", "a", "b"]);
    }

    #[test]
    fn test_jaccard_identity() {
        let t = tokenize("the rain in spain");
        assert!((jaccard(&t, &t) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_jaccard_disjoint() {
        assert_eq!(jaccard(&tokenize("a b"), &tokenize("c d")), 0.0);
    }

    #[test]
    fn test_jaccard_multiset_counts() {
        // {a,a,b} vs {a,b,b}: min 1+1=2 over max 2+2=4
        let s = jaccard(&tokenize("a a b"), &tokenize("a b b"));
        assert!((s - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_rank_exact_match_first() {
        let docs = vec![
            doc("long-doc-id", "completely different words"),
            doc("d1", "the exact query text"),
        ];
        let ranked = rank(docs.iter(), "the exact query text", 5);
        assert_eq!(ranked[0].0.doc_id, "d1");
        assert!(ranked[0].1 > ranked[1].1);
    }

    #[test]
    fn test_rank_tie_breaks_by_id_length_then_lexical() {
        let docs = vec![doc("bb", "same text"), doc("a", "same text"), doc("ab", "same text")];
        let ranked = rank(docs.iter(), "same text", 3);
        let ids: Vec<&str> = ranked.iter().map(|(d, _)| d.doc_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "ab", "bb"]);
    }

    #[test]
    fn test_rank_truncates_to_top_k() {
        let docs: Vec<RagDoc> = (0..10).map(|i| doc(&format!("d{i}"), "common words")).collect();
        assert_eq!(rank(docs.iter(), "common", 3).len(), 3);
    }

    #[test]
    fn test_empty_query_scores_zero() {
        let docs = vec![doc("d1", "anything")];
        let ranked = rank(docs.iter(), "", 5);
        assert_eq!(ranked[0].1, 0.0);
    }
}
