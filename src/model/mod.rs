//! Classifier training, persistence and the model store
//!
//! - `matrix`: dense row-major feature matrix
//! - `tree`: histogram-based regression tree (weak learner)
//! - `booster`: multiclass gradient-boosted classifier (softmax objective)
//! - `vocabulary`: ordered, immutable label set
//! - `artifact`: persisted {classifier, vocabulary, target levels} bundle
//! - `store`: load-or-train state machine owning one artifact file

pub mod matrix;
pub mod tree;
pub mod booster;
pub mod vocabulary;
pub mod artifact;
pub mod store;

pub use matrix::FeatureMatrix;
pub use booster::{BoosterParams, GradientBoostedClassifier};
pub use vocabulary::LabelVocabulary;
pub use artifact::{ModelArtifact, ModelVariant, TrainingSource, ARTIFACT_FORMAT_VERSION};
pub use store::{LoadedModel, ModelSource, ModelStore, StoreState, TrainingOutcome};
