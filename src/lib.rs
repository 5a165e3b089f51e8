//! AgriSmart Engine
//!
//! Agronomic decision support: crop prediction from climate or soil readings, rule-based
//! fertilizer recommendations and 30-day irrigation plans.
//!
//! Layout, leaf-first:
//! - `data/`, `synthetic/`: training tables from a dataset file (Polars) or seeded synthesis
//! - `model/`: gradient-boosted classifier, label vocabulary, artifact file, model store
//! - `classifier/`: predict-only facades with top-3 ranking
//! - `fertilizer`, `irrigation`: pure rule engines over read-only lookup tables
//! - `recommender`: direct and soil-inferred fertilizer workflows
//! - `engine`: `AgronomyEngine`, the object collaborators hold
//!
//! Training happens out of band (see the `train_models` binary); the prediction path only
//! reads artifacts.

pub mod error;
pub mod config;
pub mod utils;
pub mod features;
pub mod data;
pub mod synthetic;
pub mod model;
pub mod classifier;
pub mod fertilizer;
pub mod irrigation;
pub mod recommender;
pub mod engine;

// Re-export commonly used types
pub use error::{EngineError, Result};
pub use config::{EngineConfig, StoreConfig};
pub use features::{ClimateFeatures, SoilFeatures, SoilType};
pub use model::{BoosterParams, LoadedModel, ModelSource, ModelStore, ModelVariant, TrainingOutcome};
pub use classifier::{Candidate, CropClassifier, Prediction, SoilCropClassifier, SoilPrediction};
pub use fertilizer::{DeficitEngine, DeficitResult, FertilizerProduct, RequirementTable};
pub use irrigation::{IrrigationScheduler, ScheduleEntry, SchedulePlan};
pub use recommender::{FertilizerPlan, FertilizerRequest, RecommendationMode, Recommender};
pub use engine::AgronomyEngine;
