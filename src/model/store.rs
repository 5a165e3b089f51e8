//! Model Store
//!
//! Owns one artifact file and resolves it into a ready-to-predict model.
//!
//! ```text
//! Unloaded ──(artifact exists, no forced retrain)──────────────► Ready
//! Unloaded ──► Training ──► Persisted ──► Ready
//!                  │
//!                  ├─ dataset file present → train on the dataset
//!                  └─ dataset file absent  → train on synthetic rows
//! ```
//!
//! Synthetic training is chosen by an explicit existence check on the dataset path, not by
//! recovering from a read failure: a dataset that exists but is malformed fails training.

use crate::config::EngineConfig;
use crate::data::{load_training_table, TrainingTable};
use crate::error::{EngineError, Result};
use crate::model::{
    BoosterParams, GradientBoostedClassifier, LabelVocabulary, ModelArtifact, ModelVariant,
    TrainingSource,
};
use crate::synthetic;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    Unloaded,
    Training,
    Persisted,
    Ready,
}

/// Result of one training attempt
#[derive(Debug)]
pub enum TrainingOutcome {
    DatasetTrained { artifact: ModelArtifact, rows: usize },
    SyntheticTrained { artifact: ModelArtifact, rows: usize },
    Failed(EngineError),
}

impl TrainingOutcome {
    pub fn into_result(self) -> Result<ModelArtifact> {
        match self {
            TrainingOutcome::DatasetTrained { artifact, .. }
            | TrainingOutcome::SyntheticTrained { artifact, .. } => Ok(artifact),
            TrainingOutcome::Failed(err) => Err(err),
        }
    }
}

/// How the ready model was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelSource {
    Persisted,
    Dataset { rows: usize },
    Synthetic { rows: usize },
}

/// A ready model, shared read-only between classifier facades
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub artifact: Arc<ModelArtifact>,
    pub source: ModelSource,
}

#[derive(Debug)]
pub struct ModelStore {
    variant: ModelVariant,
    dataset_path: PathBuf,
    artifact_path: PathBuf,
    dataset_params: BoosterParams,
    synthetic_params: BoosterParams,
    force_retrain: bool,
    time_budget: Option<Duration>,
    state: StoreState,
}

impl ModelStore {
    /// Store with the reference hyper-parameters for `variant`
    pub fn new(
        variant: ModelVariant,
        dataset_path: impl Into<PathBuf>,
        artifact_path: impl Into<PathBuf>,
    ) -> Self {
        let (dataset_params, synthetic_params) = match variant {
            ModelVariant::Crop => (
                BoosterParams::climate_dataset(),
                BoosterParams::climate_synthetic(),
            ),
            ModelVariant::SoilToCrop => (BoosterParams::soil(), BoosterParams::soil()),
        };

        Self {
            variant,
            dataset_path: dataset_path.into(),
            artifact_path: artifact_path.into(),
            dataset_params,
            synthetic_params,
            force_retrain: false,
            time_budget: None,
            state: StoreState::Unloaded,
        }
    }

    pub fn from_config(variant: ModelVariant, config: &EngineConfig) -> Self {
        Self::new(
            variant,
            config.dataset_path(variant),
            config.artifact_path(variant),
        )
        .with_params(config.dataset_params(variant), config.synthetic_params(variant))
        .with_force_retrain(config.force_retrain)
        .with_time_budget(config.training_timeout())
    }

    pub fn with_params(mut self, dataset: BoosterParams, synthetic: BoosterParams) -> Self {
        self.dataset_params = dataset;
        self.synthetic_params = synthetic;
        self
    }

    pub fn with_force_retrain(mut self, force: bool) -> Self {
        self.force_retrain = force;
        self
    }

    pub fn with_time_budget(mut self, budget: Option<Duration>) -> Self {
        self.time_budget = budget;
        self
    }

    pub fn variant(&self) -> ModelVariant {
        self.variant
    }

    pub fn state(&self) -> StoreState {
        self.state
    }

    pub fn artifact_path(&self) -> &Path {
        &self.artifact_path
    }

    pub fn dataset_path(&self) -> &Path {
        &self.dataset_path
    }

    /// Load the persisted artifact, or train and persist a new one
    pub fn open(&mut self) -> Result<LoadedModel> {
        if !self.force_retrain && self.artifact_path.exists() {
            let artifact = ModelArtifact::load(&self.artifact_path).map_err(|err| match err {
                EngineError::Configuration(_) => err,
                other => EngineError::ModelUnavailable(format!(
                    "failed to load {:?}: {}",
                    self.artifact_path, other
                )),
            })?;
            artifact.ensure_compatible(self.variant)?;

            tracing::info!(
                "Loaded {} model from {:?} ({} labels)",
                self.variant.display_name(),
                self.artifact_path,
                artifact.vocabulary.len()
            );
            self.state = StoreState::Ready;
            return Ok(LoadedModel {
                artifact: Arc::new(artifact),
                source: ModelSource::Persisted,
            });
        }

        self.retrain()
    }

    /// Train unconditionally, persist, and return the new model
    pub fn retrain(&mut self) -> Result<LoadedModel> {
        self.state = StoreState::Training;

        let (artifact, source) = match self.train() {
            TrainingOutcome::DatasetTrained { artifact, rows } => {
                (artifact, ModelSource::Dataset { rows })
            }
            TrainingOutcome::SyntheticTrained { artifact, rows } => {
                (artifact, ModelSource::Synthetic { rows })
            }
            TrainingOutcome::Failed(err) => {
                self.state = StoreState::Unloaded;
                return Err(err);
            }
        };

        if let Err(err) = artifact.save(&self.artifact_path) {
            self.state = StoreState::Unloaded;
            return Err(err);
        }
        self.state = StoreState::Persisted;
        tracing::debug!("{} store: {:?} → Ready", self.variant.display_name(), self.state);

        self.state = StoreState::Ready;
        Ok(LoadedModel {
            artifact: Arc::new(artifact),
            source,
        })
    }

    /// Run one training attempt without touching the artifact file
    pub fn train(&self) -> TrainingOutcome {
        if self.dataset_path.exists() {
            tracing::info!(
                "Training {} model on dataset {:?}",
                self.variant.display_name(),
                self.dataset_path
            );
            let result = load_training_table(&self.dataset_path, self.variant.schema()).and_then(
                |table| {
                    let source = TrainingSource::Dataset {
                        path: self.dataset_path.clone(),
                        rows: table.n_rows(),
                    };
                    self.fit_table(&table, &self.dataset_params, source)
                        .map(|artifact| (artifact, table.n_rows()))
                },
            );
            return match result {
                Ok((artifact, rows)) => TrainingOutcome::DatasetTrained { artifact, rows },
                Err(err) => TrainingOutcome::Failed(err),
            };
        }

        tracing::info!(
            "No dataset at {:?}; training {} model on synthetic data",
            self.dataset_path,
            self.variant.display_name()
        );
        let table = synthetic::generate(self.variant, self.synthetic_params.seed);
        let rows = table.n_rows();
        match self.fit_table(&table, &self.synthetic_params, TrainingSource::Synthetic { rows }) {
            Ok(artifact) => TrainingOutcome::SyntheticTrained { artifact, rows },
            Err(err) => TrainingOutcome::Failed(err),
        }
    }

    fn fit_table(
        &self,
        table: &TrainingTable,
        params: &BoosterParams,
        source: TrainingSource,
    ) -> Result<ModelArtifact> {
        let (vocabulary, encoded) = LabelVocabulary::fit(&table.labels);
        let classifier = GradientBoostedClassifier::fit(
            params,
            &table.features,
            &encoded,
            vocabulary.len(),
            self.time_budget,
        )?;

        let target_levels = self
            .variant
            .aggregates_target_levels()
            .then(|| table.target_levels());

        tracing::info!(
            "Trained {} model: {} rows, {} labels",
            self.variant.display_name(),
            table.n_rows(),
            vocabulary.len()
        );

        Ok(ModelArtifact::new(
            self.variant,
            classifier,
            vocabulary,
            target_levels,
            source,
        ))
    }
}
