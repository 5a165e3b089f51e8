//! Agronomy Engine
//!
//! The explicit engine object collaborators construct once and share by reference. It owns
//! both classifiers (read-only after `open`), the orchestrator and the scheduler, and exposes
//! the synchronous engine API. Every method takes `&self`, so one engine can serve concurrent
//! callers from any number of threads.

use crate::classifier::{CropClassifier, Prediction, SoilCropClassifier, SoilPrediction};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::features::{ClimateFeatures, SoilFeatures, SoilType};
use crate::irrigation::{IrrigationScheduler, SchedulePlan};
use crate::model::{ModelArtifact, ModelSource, ModelStore, ModelVariant};
use crate::recommender::{FertilizerPlan, FertilizerRequest, Recommender};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct AgronomyEngine {
    crop: CropClassifier,
    soil: SoilCropClassifier,
    recommender: Recommender,
    scheduler: IrrigationScheduler,
    sources: [(ModelVariant, ModelSource); 2],
}

impl AgronomyEngine {
    /// Load (or train and persist) both models as configured
    pub fn open(config: &EngineConfig) -> Result<Self> {
        let start = Instant::now();

        let mut crop_store = ModelStore::from_config(ModelVariant::Crop, config);
        let crop_model = crop_store.open()?;

        let mut soil_store = ModelStore::from_config(ModelVariant::SoilToCrop, config);
        let soil_model = soil_store.open()?;

        let engine = Self::from_artifacts(
            crop_model.artifact,
            soil_model.artifact,
            config.blend_target_levels,
        )?
        .with_sources(crop_model.source, soil_model.source);

        tracing::info!(
            "Engine ready in {:.2}s (crop: {:?}, soil-to-crop: {:?})",
            start.elapsed().as_secs_f64(),
            crop_model.source,
            soil_model.source
        );
        Ok(engine)
    }

    /// Assemble an engine from already-loaded artifacts
    pub fn from_artifacts(
        crop: Arc<ModelArtifact>,
        soil: Arc<ModelArtifact>,
        blend_target_levels: bool,
    ) -> Result<Self> {
        let crop = CropClassifier::new(crop)?;
        let soil = SoilCropClassifier::new(soil)?;
        let recommender = Recommender::new(soil.clone(), blend_target_levels);

        Ok(Self {
            crop,
            soil,
            recommender,
            scheduler: IrrigationScheduler::new(),
            sources: [
                (ModelVariant::Crop, ModelSource::Persisted),
                (ModelVariant::SoilToCrop, ModelSource::Persisted),
            ],
        })
    }

    fn with_sources(mut self, crop: ModelSource, soil: ModelSource) -> Self {
        self.sources = [
            (ModelVariant::Crop, crop),
            (ModelVariant::SoilToCrop, soil),
        ];
        self
    }

    /// How each model was obtained when the engine was opened
    pub fn sources(&self) -> &[(ModelVariant, ModelSource)] {
        &self.sources
    }

    pub fn crop_classifier(&self) -> &CropClassifier {
        &self.crop
    }

    pub fn soil_classifier(&self) -> &SoilCropClassifier {
        &self.soil
    }

    pub fn predict(&self, features: &ClimateFeatures) -> Prediction {
        self.crop.predict(features)
    }

    pub fn predict_soil(&self, features: &SoilFeatures) -> SoilPrediction {
        self.soil.predict(features)
    }

    pub fn recommend(&self, crop: &str, n: f64, p: f64, k: f64, soil_type: &SoilType) -> FertilizerPlan {
        self.recommender.recommend(crop, n, p, k, soil_type)
    }

    pub fn recommend_from_soil(&self, soil: &SoilFeatures, soil_type: &SoilType) -> FertilizerPlan {
        self.recommender.recommend_from_soil(soil, soil_type)
    }

    pub fn advise(&self, request: &FertilizerRequest) -> FertilizerPlan {
        self.recommender.advise(request)
    }

    pub fn create_schedule(
        &self,
        crop: &str,
        soil_type: &SoilType,
        area: f64,
        temperature: f64,
        humidity: f64,
    ) -> SchedulePlan {
        self.scheduler
            .create_schedule(crop, soil_type, area, temperature, humidity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BoosterParams;
    use rayon::prelude::*;

    fn fast_config(root: &std::path::Path) -> EngineConfig {
        EngineConfig::rooted_at(root).with_params(BoosterParams {
            n_estimators: 4,
            max_depth: 3,
            ..BoosterParams::soil()
        })
    }

    #[test]
    fn test_engine_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AgronomyEngine>();
    }

    #[test]
    fn test_open_without_datasets_trains_synthetic_models() {
        let dir = tempfile::tempdir().unwrap();
        let engine = AgronomyEngine::open(&fast_config(dir.path())).unwrap();

        assert!(matches!(engine.sources()[0].1, ModelSource::Synthetic { rows: 2200 }));
        assert!(matches!(engine.sources()[1].1, ModelSource::Synthetic { rows: 2300 }));

        let reopened = AgronomyEngine::open(&fast_config(dir.path())).unwrap();
        assert_eq!(reopened.sources()[0].1, ModelSource::Persisted);
        assert_eq!(reopened.sources()[1].1, ModelSource::Persisted);
    }

    #[test]
    fn test_concurrent_predictions_match_sequential() {
        let dir = tempfile::tempdir().unwrap();
        let engine = AgronomyEngine::open(&fast_config(dir.path())).unwrap();

        let inputs: Vec<ClimateFeatures> = (0..64)
            .map(|i| {
                let t = i as f64;
                ClimateFeatures {
                    nitrogen: 2.0 * t,
                    phosphorus: 5.0 + t,
                    potassium: 5.0 + 3.0 * t,
                    temperature: 8.0 + 0.5 * t,
                    humidity: 14.0 + t,
                    ph: 3.5 + 0.09 * t,
                    rainfall: 20.0 + 4.0 * t,
                }
            })
            .collect();

        let sequential: Vec<Prediction> = inputs.iter().map(|f| engine.predict(f)).collect();
        let parallel: Vec<Prediction> = inputs.par_iter().map(|f| engine.predict(f)).collect();
        assert_eq!(sequential, parallel);

        for prediction in &sequential {
            assert!((0.0..=100.0).contains(&prediction.confidence));
            assert_eq!(prediction.candidates.len(), 3);
            assert!(prediction
                .candidates
                .windows(2)
                .all(|pair| pair[0].probability >= pair[1].probability));
        }
    }

    #[test]
    fn test_schedule_and_direct_recommendation_pass_through() {
        let dir = tempfile::tempdir().unwrap();
        let config = fast_config(dir.path());
        assert!(config.blend_target_levels);
        let engine = AgronomyEngine::open(&config).unwrap();

        // blending is on, but a named crop still uses the static table
        let plan = engine.recommend("rice", 50.0, 30.0, 20.0, &SoilType::Loamy);
        assert_eq!(
            (
                plan.recommendation.required_n,
                plan.recommendation.required_p,
                plan.recommendation.required_k
            ),
            (80.0, 40.0, 40.0)
        );
        assert_eq!(plan.recommendation.application_rate, "60 kg/hectare");
        assert_eq!(plan.recommendation.target_soil_moisture, None);

        let schedule = engine.create_schedule("rice", &SoilType::Loamy, 2.5, 28.0, 75.0);
        assert_eq!(schedule.schedule.len(), 30);
    }
}
