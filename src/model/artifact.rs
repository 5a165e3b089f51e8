//! Model Artifact
//!
//! Single-file persisted bundle of {classifier, label vocabulary, optional per-label target
//! levels} plus metadata identifying what it was trained on.
//!
//! **Encoding**: bincode of the whole struct. f64 values round-trip bit-exactly, so a reloaded
//! artifact reproduces the original predictions.
//!
//! **Atomic writes**: the artifact is written to a hidden temp file in the same directory,
//! fsynced, then renamed over the target. Readers see either the old or the new artifact.

use crate::data::TargetLevels;
use crate::error::{EngineError, Result};
use crate::features::{FeatureSchema, CLIMATE_SCHEMA, SOIL_SCHEMA};
use crate::model::{GradientBoostedClassifier, LabelVocabulary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Bumped whenever the serialized layout changes
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Which classifier an artifact belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelVariant {
    /// Climate vector → crop
    Crop,
    /// Soil vector → crop, with per-crop target levels
    SoilToCrop,
}

impl ModelVariant {
    pub fn schema(&self) -> FeatureSchema {
        match self {
            ModelVariant::Crop => CLIMATE_SCHEMA,
            ModelVariant::SoilToCrop => SOIL_SCHEMA,
        }
    }

    pub fn aggregates_target_levels(&self) -> bool {
        matches!(self, ModelVariant::SoilToCrop)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ModelVariant::Crop => "crop",
            ModelVariant::SoilToCrop => "soil-to-crop",
        }
    }
}

/// Where the training rows came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TrainingSource {
    Dataset { path: PathBuf, rows: usize },
    Synthetic { rows: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub variant: ModelVariant,
    pub feature_names: Vec<String>,
    pub classifier: GradientBoostedClassifier,
    pub vocabulary: LabelVocabulary,
    pub target_levels: Option<TargetLevels>,
    pub source: TrainingSource,
    pub trained_at: DateTime<Utc>,
}

impl ModelArtifact {
    pub fn new(
        variant: ModelVariant,
        classifier: GradientBoostedClassifier,
        vocabulary: LabelVocabulary,
        target_levels: Option<TargetLevels>,
        source: TrainingSource,
    ) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            variant,
            feature_names: variant.schema().feature_names(),
            classifier,
            vocabulary,
            target_levels,
            source,
            trained_at: Utc::now(),
        }
    }

    /// Per-label probabilities, indexed like the vocabulary
    pub fn predict_proba(&self, row: &[f64]) -> Vec<f64> {
        self.classifier.predict_proba(row)
    }

    /// Write the artifact atomically (uniquely named temp file + rename)
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model".to_string());

        // Removed on drop if anything below fails
        let mut tmp = tempfile::Builder::new()
            .prefix(&format!(".{}.", file_name))
            .suffix(".tmp")
            .tempfile_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            bincode::serialize_into(&mut writer, self)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|err| EngineError::Io(err.error))?;

        tracing::info!("Persisted {} artifact to {:?}", self.variant.display_name(), path);
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let artifact: ModelArtifact = bincode::deserialize_from(BufReader::new(file))?;
        Ok(artifact)
    }

    /// Check the artifact matches what a store for `variant` expects
    pub fn ensure_compatible(&self, variant: ModelVariant) -> Result<()> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(EngineError::Configuration(format!(
                "artifact format version {} (expected {})",
                self.format_version, ARTIFACT_FORMAT_VERSION
            )));
        }
        if self.variant != variant {
            return Err(EngineError::Configuration(format!(
                "artifact holds a {} model, expected {}",
                self.variant.display_name(),
                variant.display_name()
            )));
        }
        let expected = variant.schema().feature_names();
        if self.feature_names != expected {
            return Err(EngineError::Configuration(format!(
                "artifact features {:?} do not match {:?}",
                self.feature_names, expected
            )));
        }
        if self.classifier.n_features() != expected.len() {
            return Err(EngineError::ModelUnavailable(format!(
                "artifact classifier expects {} features, schema has {}",
                self.classifier.n_features(),
                expected.len()
            )));
        }
        self.classifier
            .validate_structure()
            .map_err(|reason| EngineError::ModelUnavailable(format!("corrupt artifact: {}", reason)))?;
        if self.classifier.n_classes() != self.vocabulary.len() {
            return Err(EngineError::Configuration(format!(
                "artifact classifier has {} classes but vocabulary has {} labels",
                self.classifier.n_classes(),
                self.vocabulary.len()
            )));
        }
        Ok(())
    }
}
