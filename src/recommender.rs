//! Recommendation Orchestrator
//!
//! Two entry modes over the Fertilizer Deficit Engine:
//! - **Direct**: explicit crop name, no classification, `inference` is null. Always the
//!   static requirement table
//! - **Inferred**: soil vector → soil-to-crop prediction → deficit rules on the predicted crop,
//!   with the prediction's confidence, candidates and target levels attached. Uses the
//!   blended table when target-level blending is on

use crate::classifier::{Candidates, SoilCropClassifier};
use crate::features::{SoilFeatures, SoilType};
use crate::fertilizer::{DeficitEngine, DeficitResult, RequirementTable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationMode {
    Direct,
    Inferred,
}

/// Classification context attached to an inferred recommendation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoilInference {
    pub confidence: f64,
    pub candidates: Candidates,
    pub target_levels: BTreeMap<String, f64>,
    /// Raw soil input the prediction was made from
    pub input_soil: SoilFeatures,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FertilizerPlan {
    pub mode: RecommendationMode,
    pub crop: String,
    #[serde(flatten)]
    pub recommendation: DeficitResult,
    pub inference: Option<SoilInference>,
}

/// A fertilizer request as a collaborator submits it
///
/// An absent or blank crop selects the inferred mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FertilizerRequest {
    #[serde(default)]
    pub crop: Option<String>,
    pub soil: SoilFeatures,
    pub soil_type: SoilType,
}

#[derive(Debug, Clone)]
pub struct Recommender {
    classifier: SoilCropClassifier,
    direct: DeficitEngine,
    inferred: DeficitEngine,
}

impl Recommender {
    /// With `blend_target_levels`, the classifier's per-crop aggregates are overlaid onto the
    /// static requirement table for inferred recommendations. Direct mode keeps the static
    /// table either way.
    pub fn new(classifier: SoilCropClassifier, blend_target_levels: bool) -> Self {
        let inferred = match classifier.target_levels() {
            Some(levels) if blend_target_levels => {
                RequirementTable::standard().with_target_levels(levels)
            }
            _ => RequirementTable::standard(),
        };

        Self {
            classifier,
            direct: DeficitEngine::new(),
            inferred: DeficitEngine::with_table(inferred),
        }
    }

    /// Rules used for crops named by the caller
    pub fn direct_engine(&self) -> &DeficitEngine {
        &self.direct
    }

    /// Rules used for crops predicted from soil readings
    pub fn inferred_engine(&self) -> &DeficitEngine {
        &self.inferred
    }

    pub fn recommend(
        &self,
        crop: &str,
        n: f64,
        p: f64,
        k: f64,
        soil_type: &SoilType,
    ) -> FertilizerPlan {
        FertilizerPlan {
            mode: RecommendationMode::Direct,
            crop: crop.trim().to_lowercase(),
            recommendation: self.direct.recommend(crop, n, p, k, soil_type),
            inference: None,
        }
    }

    pub fn recommend_from_soil(&self, soil: &SoilFeatures, soil_type: &SoilType) -> FertilizerPlan {
        let predicted = self.classifier.predict(soil);
        let crop = predicted.prediction.label;

        tracing::debug!(
            "Inferred crop {} ({:.2}%) from soil input",
            crop,
            predicted.prediction.confidence
        );

        let recommendation =
            self.inferred
                .recommend(&crop, soil.nitrogen, soil.phosphorus, soil.potassium, soil_type);

        FertilizerPlan {
            mode: RecommendationMode::Inferred,
            crop,
            recommendation,
            inference: Some(SoilInference {
                confidence: predicted.prediction.confidence,
                candidates: predicted.prediction.candidates,
                target_levels: predicted.target_levels,
                input_soil: *soil,
            }),
        }
    }

    /// Dispatch on whether the request names a crop
    pub fn advise(&self, request: &FertilizerRequest) -> FertilizerPlan {
        match request.crop.as_deref().map(str::trim) {
            Some(crop) if !crop.is_empty() => self.recommend(
                crop,
                request.soil.nitrogen,
                request.soil.phosphorus,
                request.soil.potassium,
                &request.soil_type,
            ),
            _ => self.recommend_from_soil(&request.soil, &request.soil_type),
        }
    }
}
