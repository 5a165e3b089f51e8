//! Crop classifier: climate vector → crop

use super::{rank_candidates, Prediction};
use crate::error::{EngineError, Result};
use crate::features::ClimateFeatures;
use crate::model::{LabelVocabulary, ModelArtifact, ModelStore, ModelVariant};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct CropClassifier {
    artifact: Arc<ModelArtifact>,
}

impl CropClassifier {
    pub fn new(artifact: Arc<ModelArtifact>) -> Result<Self> {
        if artifact.variant != ModelVariant::Crop {
            return Err(EngineError::ModelUnavailable(format!(
                "crop classifier given a {} artifact",
                artifact.variant.display_name()
            )));
        }
        Ok(Self { artifact })
    }

    /// Open (load or train) the store and wrap its artifact
    pub fn open(store: &mut ModelStore) -> Result<Self> {
        Self::new(store.open()?.artifact)
    }

    pub fn predict(&self, features: &ClimateFeatures) -> Prediction {
        let probabilities = self.artifact.predict_proba(&features.to_row());
        rank_candidates(&probabilities, &self.artifact.vocabulary)
    }

    pub fn vocabulary(&self) -> &LabelVocabulary {
        &self.artifact.vocabulary
    }

    pub fn artifact(&self) -> &Arc<ModelArtifact> {
        &self.artifact
    }
}
