//! Label vocabulary
//!
//! Sorted, de-duplicated crop labels fixed at training time. The index of a label is the
//! class index used by the booster, and the order is the secondary key of the top-k
//! tie-break, so it must never change once an artifact is written.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelVocabulary {
    labels: Vec<String>,
}

impl LabelVocabulary {
    /// Build the vocabulary from raw labels and encode them
    ///
    /// Returns the vocabulary (labels sorted ascending) and each input's class index.
    pub fn fit(labels: &[String]) -> (Self, Vec<usize>) {
        let mut sorted: Vec<String> = labels.to_vec();
        sorted.sort();
        sorted.dedup();

        let vocabulary = Self { labels: sorted };
        let encoded = labels
            .iter()
            .map(|label| {
                vocabulary
                    .labels
                    .binary_search(label)
                    .unwrap_or_else(|_| unreachable!("label taken from the fitted set"))
            })
            .collect();

        (vocabulary, encoded)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn label(&self, idx: usize) -> Option<&str> {
        self.labels.get(idx).map(|s| s.as_str())
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.binary_search_by(|entry| entry.as_str().cmp(label)).ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(|s| s.as_str())
    }

    pub fn as_slice(&self) -> &[String] {
        &self.labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_sorts_and_encodes() {
        let raw: Vec<String> = ["rice", "maize", "rice", "apple"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let (vocab, encoded) = LabelVocabulary::fit(&raw);

        assert_eq!(vocab.as_slice(), &["apple", "maize", "rice"]);
        assert_eq!(encoded, vec![2, 1, 2, 0]);
        assert_eq!(vocab.index_of("maize"), Some(1));
        assert_eq!(vocab.index_of("wheat"), None);
        assert_eq!(vocab.label(0), Some("apple"));
        assert_eq!(vocab.label(3), None);
    }
}
