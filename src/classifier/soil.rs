//! Soil-to-crop classifier: soil vector → crop, plus that crop's target levels

use super::{rank_candidates, Prediction};
use crate::data::TargetLevels;
use crate::error::{EngineError, Result};
use crate::features::SoilFeatures;
use crate::model::{LabelVocabulary, ModelArtifact, ModelStore, ModelVariant};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoilPrediction {
    #[serde(flatten)]
    pub prediction: Prediction,
    /// Mean training features of the predicted crop; empty when none were recorded
    pub target_levels: BTreeMap<String, f64>,
}

#[derive(Debug, Clone)]
pub struct SoilCropClassifier {
    artifact: Arc<ModelArtifact>,
}

impl SoilCropClassifier {
    pub fn new(artifact: Arc<ModelArtifact>) -> Result<Self> {
        if artifact.variant != ModelVariant::SoilToCrop {
            return Err(EngineError::ModelUnavailable(format!(
                "soil-to-crop classifier given a {} artifact",
                artifact.variant.display_name()
            )));
        }
        Ok(Self { artifact })
    }

    pub fn open(store: &mut ModelStore) -> Result<Self> {
        Self::new(store.open()?.artifact)
    }

    pub fn predict(&self, features: &SoilFeatures) -> SoilPrediction {
        let probabilities = self.artifact.predict_proba(&features.to_row());
        let prediction = rank_candidates(&probabilities, &self.artifact.vocabulary);

        let target_levels = self
            .target_levels()
            .and_then(|levels| levels.get(&prediction.label))
            .cloned()
            .unwrap_or_default();

        SoilPrediction {
            prediction,
            target_levels,
        }
    }

    /// Per-crop aggregates recorded at training time
    pub fn target_levels(&self) -> Option<&TargetLevels> {
        self.artifact.target_levels.as_ref()
    }

    pub fn vocabulary(&self) -> &LabelVocabulary {
        &self.artifact.vocabulary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoosterParams, FeatureMatrix, GradientBoostedClassifier, TrainingSource};

    fn soil_artifact(target_levels: Option<TargetLevels>) -> Arc<ModelArtifact> {
        let mut values = Vec::new();
        let mut labels = Vec::new();
        for i in 0..12 {
            values.extend(std::iter::repeat(i as f64 * 10.0).take(5));
            labels.push(if i < 6 { "lentil".to_string() } else { "rice".to_string() });
        }
        let (vocabulary, y) = LabelVocabulary::fit(&labels);
        let params = BoosterParams {
            n_estimators: 5,
            max_depth: 2,
            ..BoosterParams::soil()
        };
        let classifier = GradientBoostedClassifier::fit(
            &params,
            &FeatureMatrix::new(values, 5),
            &y,
            vocabulary.len(),
            None,
        )
        .unwrap();
        Arc::new(ModelArtifact::new(
            ModelVariant::SoilToCrop,
            classifier,
            vocabulary,
            target_levels,
            TrainingSource::Synthetic { rows: 12 },
        ))
    }

    fn levels(raw: &[(&str, f64)]) -> TargetLevels {
        let raw: BTreeMap<String, BTreeMap<String, f64>> = raw
            .iter()
            .map(|&(crop, n)| (crop.to_string(), BTreeMap::from([("N".to_string(), n)])))
            .collect();
        serde_json::from_value(serde_json::to_value(&raw).unwrap()).unwrap()
    }

    fn soil(value: f64) -> SoilFeatures {
        SoilFeatures {
            nitrogen: value,
            phosphorus: value,
            potassium: value,
            ph: value,
            soil_moisture: value,
        }
    }

    #[test]
    fn test_missing_aggregates_give_empty_target_levels() {
        let classifier = SoilCropClassifier::new(soil_artifact(None)).unwrap();
        assert!(classifier.target_levels().is_none());

        let predicted = classifier.predict(&soil(100.0));
        assert!(!predicted.prediction.label.is_empty());
        assert!(predicted.target_levels.is_empty());

        let json = serde_json::to_value(&predicted).unwrap();
        assert_eq!(json["target_levels"], serde_json::json!({}));
    }

    #[test]
    fn test_label_absent_from_aggregates_gives_empty_target_levels() {
        let classifier =
            SoilCropClassifier::new(soil_artifact(Some(levels(&[("barley", 70.0)])))).unwrap();
        for value in [0.0, 55.0, 110.0] {
            assert!(classifier.predict(&soil(value)).target_levels.is_empty());
        }

        let classifier = SoilCropClassifier::new(soil_artifact(Some(levels(&[
            ("lentil", 20.0),
            ("rice", 90.0),
        ]))))
        .unwrap();
        let predicted = classifier.predict(&soil(110.0));
        let expected = if predicted.prediction.label == "rice" { 90.0 } else { 20.0 };
        assert_eq!(predicted.target_levels["N"], expected);
    }

    #[test]
    fn test_rejects_crop_artifact() {
        let artifact = soil_artifact(None);
        let mut crop = (*artifact).clone();
        crop.variant = ModelVariant::Crop;
        assert!(matches!(
            SoilCropClassifier::new(Arc::new(crop)),
            Err(EngineError::ModelUnavailable(_))
        ));
    }
}
