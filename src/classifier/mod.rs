//! Predict-only classifier facades
//!
//! Both facades wrap a shared, read-only `ModelArtifact` and turn its probability
//! distribution into a ranked `Prediction`.
//!
//! **Ranking rule**: candidates are the `TOP_K` labels by probability, descending. Equal
//! probabilities are ordered by *descending* vocabulary index, i.e. the label that appears
//! later in the vocabulary comes first. Sorting by (probability, index) ascending and reading
//! the tail backwards gives the same order.

pub mod crop;
pub mod soil;

pub use crop::CropClassifier;
pub use soil::{SoilCropClassifier, SoilPrediction};

use crate::model::LabelVocabulary;
use crate::utils::round2;
use serde::Serialize;
use smallvec::SmallVec;

/// Number of ranked candidates returned per prediction
pub const TOP_K: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub label: String,
    /// Percentage in [0, 100], rounded to 2 decimals
    pub probability: f64,
}

pub type Candidates = SmallVec<[Candidate; TOP_K]>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: String,
    /// 100 × max probability, rounded to 2 decimals
    pub confidence: f64,
    pub candidates: Candidates,
}

/// Rank a probability distribution indexed by `vocabulary`
pub fn rank_candidates(probabilities: &[f64], vocabulary: &LabelVocabulary) -> Prediction {
    debug_assert_eq!(probabilities.len(), vocabulary.len());

    let mut order: Vec<usize> = (0..probabilities.len()).collect();
    order.sort_by(|&a, &b| {
        probabilities[b]
            .total_cmp(&probabilities[a])
            .then_with(|| b.cmp(&a))
    });

    let candidates: Candidates = order
        .iter()
        .take(TOP_K)
        .map(|&idx| Candidate {
            label: vocabulary.label(idx).unwrap_or_default().to_string(),
            probability: round2(probabilities[idx] * 100.0),
        })
        .collect();

    let top = order.first().copied();
    Prediction {
        label: candidates
            .first()
            .map(|c| c.label.clone())
            .unwrap_or_default(),
        confidence: top.map_or(0.0, |idx| round2(probabilities[idx] * 100.0)),
        candidates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn vocab(labels: &[&str]) -> LabelVocabulary {
        let raw: Vec<String> = labels.iter().map(|s| s.to_string()).collect();
        LabelVocabulary::fit(&raw).0
    }

    #[test]
    fn test_top_three_descending() {
        let v = vocab(&["apple", "banana", "maize", "rice"]);
        let p = rank_candidates(&[0.1, 0.5, 0.15, 0.25], &v);

        assert_eq!(p.label, "banana");
        assert_relative_eq!(p.confidence, 50.0);
        let labels: Vec<&str> = p.candidates.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["banana", "rice", "maize"]);
        assert_relative_eq!(p.candidates[2].probability, 15.0);
    }

    #[test]
    fn test_ties_prefer_later_vocabulary_label() {
        let v = vocab(&["apple", "banana", "maize", "rice"]);
        let p = rank_candidates(&[0.25, 0.25, 0.25, 0.25], &v);

        let labels: Vec<&str> = p.candidates.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["rice", "maize", "banana"]);
        assert_eq!(p.label, "rice");

        let p = rank_candidates(&[0.4, 0.1, 0.4, 0.1], &v);
        let labels: Vec<&str> = p.candidates.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["maize", "apple", "rice"]);
    }

    #[test]
    fn test_small_vocabulary_yields_fewer_candidates() {
        let v = vocab(&["lentil", "rice"]);
        let p = rank_candidates(&[0.3, 0.7], &v);
        assert_eq!(p.candidates.len(), 2);
        assert_eq!(p.label, "rice");
        assert_relative_eq!(p.confidence, 70.0);
    }
}
