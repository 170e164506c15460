use super::normalize::normalize_column_name;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const DEFAULT_SIMILARITY_THRESHOLD: u8 = 85;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Minimum similarity (0-100) for two headers to share a column.
    pub similarity_threshold: u8,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

/// Similarity of two strings as a rounded percentage of the longer length
/// not touched by the edit distance. Two empty strings score 100.
pub fn similarity(a: &str, b: &str) -> u8 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 100;
    }
    let distance = strsim::levenshtein(a, b);
    ((1.0 - distance as f64 / max_len as f64) * 100.0).round() as u8
}

/// Normalized header to canonical key, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl ColumnMapping {
    fn insert(&mut self, normalized: String, canonical: String) {
        self.index.insert(normalized.clone(), self.entries.len());
        self.entries.push((normalized, canonical));
    }

    pub fn get(&self, normalized: &str) -> Option<&str> {
        self.index
            .get(normalized)
            .map(|&idx| self.entries[idx].1.as_str())
    }

    /// Canonical key for a raw header. Headers never seen map to their own
    /// normalized form.
    pub fn canonical(&self, raw_header: &str) -> String {
        let normalized = normalize_column_name(raw_header);
        match self.get(&normalized) {
            Some(canonical) => canonical.to_string(),
            None => normalized,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, c)| (n.as_str(), c.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct ColumnMatcher {
    threshold: u8,
}

impl Default for ColumnMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_SIMILARITY_THRESHOLD)
    }
}

impl ColumnMatcher {
    pub fn new(threshold: u8) -> Self {
        Self { threshold }
    }

    /// Groups near-duplicate headers under canonical representatives.
    ///
    /// Each header is compared against the representatives in creation order
    /// and joins the first one scoring at or above the threshold, not the
    /// best one. Output therefore depends on input order.
    pub fn build_mapping<S: AsRef<str>>(&self, header_lists: &[Vec<S>]) -> ColumnMapping {
        let mut mapping = ColumnMapping::default();
        let mut representatives: Vec<String> = Vec::new();

        for header in header_lists.iter().flatten() {
            let normalized = normalize_column_name(header.as_ref());
            if mapping.get(&normalized).is_some() {
                continue;
            }

            let canonical = representatives
                .iter()
                .find(|rep| similarity(&normalized, rep) >= self.threshold)
                .cloned();

            match canonical {
                Some(canonical) => {
                    tracing::debug!("Column {} matched to {}", normalized, canonical);
                    mapping.insert(normalized, canonical);
                }
                None => {
                    representatives.push(normalized.clone());
                    mapping.insert(normalized.clone(), normalized);
                }
            }
        }

        mapping
    }
}

pub fn build_column_mapping<S: AsRef<str>>(header_lists: &[Vec<S>], threshold: u8) -> ColumnMapping {
    ColumnMatcher::new(threshold).build_mapping(header_lists)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_similarity_values() {
        assert_eq!(similarity("", ""), 100);
        assert_eq!(similarity("price", "price"), 100);
        assert_eq!(similarity("price", "prices"), 83);
        assert_eq!(similarity("quantity", "quantty"), 88);
        assert_eq!(similarity("abc", ""), 0);
        assert_eq!(similarity("abc", "xyz"), 0);
    }

    #[test]
    fn test_build_mapping_unifies_variants() {
        let mapping = build_column_mapping(
            &[vec!["Quantity", "Price"], vec!["Quantty", "price "]],
            DEFAULT_SIMILARITY_THRESHOLD,
        );
        assert_eq!(mapping.len(), 3);
        assert_eq!(mapping.get("quantty"), Some("quantity"));
        assert_eq!(mapping.get("price"), Some("price"));
        assert_eq!(mapping.canonical("QUANTTY"), "quantity");
        assert_eq!(mapping.canonical("Unseen Header"), "unseen_header");
    }

    #[test]
    fn test_first_match_wins_over_best_match() {
        // the last header scores 85 against the first representative and 95
        // against the second; the earlier representative is chosen
        let mapping = build_column_mapping(
            &[vec![
                "abcdefghijklmnopqxyz",
                "wbcdefghijklmnopqrst",
                "abcdefghijklmnopqrst",
            ]],
            DEFAULT_SIMILARITY_THRESHOLD,
        );
        assert_eq!(mapping.get("wbcdefghijklmnopqrst"), Some("wbcdefghijklmnopqrst"));
        assert_eq!(mapping.get("abcdefghijklmnopqrst"), Some("abcdefghijklmnopqxyz"));
    }

    #[test]
    fn test_matches_against_representatives_only() {
        // "abcdefyy" is close to "abcdefgy" but that header is a group member,
        // not a representative, so it starts its own group
        let mapping = build_column_mapping(&[vec!["abcdefgh", "abcdefgy", "abcdefyy"]], 85);
        assert_eq!(mapping.get("abcdefgy"), Some("abcdefgh"));
        assert_eq!(mapping.get("abcdefyy"), Some("abcdefyy"));
        let order: Vec<_> = mapping.iter().map(|(n, _)| n).collect();
        assert_eq!(order, vec!["abcdefgh", "abcdefgy", "abcdefyy"]);
    }

    proptest! {
        #[test]
        fn test_similarity_self_is_100(s in ".{0,20}") {
            prop_assert_eq!(similarity(&s, &s), 100);
        }

        #[test]
        fn test_similarity_in_range(a in "[a-z_]{0,12}", b in "[a-z_]{0,12}") {
            prop_assert!(similarity(&a, &b) <= 100);
        }

        #[test]
        fn test_mapping_is_deterministic(headers in proptest::collection::vec("[a-z ]{1,10}", 0..12)) {
            let lists = vec![headers.clone(), headers];
            prop_assert_eq!(
                build_column_mapping(&lists, 85),
                build_column_mapping(&lists, 85)
            );
        }
    }
}
