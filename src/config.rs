//! Engine configuration
//!
//! Defaults reproduce the reference layout (`Data/` for datasets, `instance/` for artifacts)
//! and hyper-parameters. A JSON file can override any field; environment variables are
//! applied on top:
//!
//! - `AGRI_CONFIG`: JSON file loaded first
//! - `AGRI_DATA_DIR`, `AGRI_MODEL_DIR`
//! - `AGRI_FORCE_RETRAIN` (`1`/`true`/`yes`)
//! - `AGRI_TRAINING_TIMEOUT_SECS`

use crate::error::{EngineError, Result};
use crate::model::{BoosterParams, ModelVariant};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Per-store overrides; anything unset falls back to the variant's reference value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub dataset_file: Option<String>,
    pub artifact_file: Option<String>,
    /// Replaces the preset used when training on the dataset
    pub dataset_params: Option<BoosterParams>,
    /// Replaces the preset used when training on synthetic rows
    pub synthetic_params: Option<BoosterParams>,
}

fn default_dataset_file(variant: ModelVariant) -> &'static str {
    match variant {
        ModelVariant::Crop => "Crop_recommendation.csv",
        ModelVariant::SoilToCrop => "fertilizer.csv",
    }
}

fn default_artifact_file(variant: ModelVariant) -> &'static str {
    match variant {
        ModelVariant::Crop => "crop_gbdt_model.bin",
        ModelVariant::SoilToCrop => "fertilizer_gbdt_model.bin",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub data_dir: PathBuf,
    pub model_dir: PathBuf,
    pub crop: StoreConfig,
    pub soil: StoreConfig,
    pub force_retrain: bool,
    pub training_timeout_secs: Option<u64>,
    /// Overlay soil-model target levels onto the fertilizer requirement table
    pub blend_target_levels: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("Data"),
            model_dir: PathBuf::from("instance"),
            crop: StoreConfig::default(),
            soil: StoreConfig::default(),
            force_retrain: false,
            training_timeout_secs: None,
            blend_target_levels: true,
        }
    }
}

impl EngineConfig {
    /// Configuration rooted at one directory: datasets in `root/Data`, artifacts in
    /// `root/instance`
    pub fn rooted_at(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            data_dir: root.join("Data"),
            model_dir: root.join("instance"),
            ..Self::default()
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|err| {
            EngineError::Configuration(format!("cannot read config {:?}: {}", path, err))
        })?;
        let config = serde_json::from_str(&raw)?;
        tracing::info!("Loaded engine configuration from {:?}", path);
        Ok(config)
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = match lookup("AGRI_CONFIG") {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };

        if let Some(dir) = lookup("AGRI_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("AGRI_MODEL_DIR") {
            config.model_dir = PathBuf::from(dir);
        }
        if let Some(flag) = lookup("AGRI_FORCE_RETRAIN") {
            config.force_retrain = matches!(
                flag.trim().to_lowercase().as_str(),
                "1" | "true" | "yes"
            );
        }
        if let Some(secs) = lookup("AGRI_TRAINING_TIMEOUT_SECS") {
            let secs = secs.trim().parse::<u64>().map_err(|_| {
                EngineError::Configuration(format!(
                    "AGRI_TRAINING_TIMEOUT_SECS must be whole seconds, got {:?}",
                    secs
                ))
            })?;
            config.training_timeout_secs = Some(secs);
        }

        Ok(config)
    }

    pub fn store(&self, variant: ModelVariant) -> &StoreConfig {
        match variant {
            ModelVariant::Crop => &self.crop,
            ModelVariant::SoilToCrop => &self.soil,
        }
    }

    pub fn dataset_path(&self, variant: ModelVariant) -> PathBuf {
        let file = self.store(variant).dataset_file.as_deref();
        self.data_dir.join(file.unwrap_or_else(|| default_dataset_file(variant)))
    }

    pub fn artifact_path(&self, variant: ModelVariant) -> PathBuf {
        let file = self.store(variant).artifact_file.as_deref();
        self.model_dir.join(file.unwrap_or_else(|| default_artifact_file(variant)))
    }

    pub fn dataset_params(&self, variant: ModelVariant) -> BoosterParams {
        self.store(variant).dataset_params.clone().unwrap_or_else(|| match variant {
            ModelVariant::Crop => BoosterParams::climate_dataset(),
            ModelVariant::SoilToCrop => BoosterParams::soil(),
        })
    }

    pub fn synthetic_params(&self, variant: ModelVariant) -> BoosterParams {
        self.store(variant).synthetic_params.clone().unwrap_or_else(|| match variant {
            ModelVariant::Crop => BoosterParams::climate_synthetic(),
            ModelVariant::SoilToCrop => BoosterParams::soil(),
        })
    }

    pub fn training_timeout(&self) -> Option<Duration> {
        self.training_timeout_secs.map(Duration::from_secs)
    }

    /// Use the same hyper-parameters for every store and training path
    pub fn with_params(mut self, params: BoosterParams) -> Self {
        for store in [&mut self.crop, &mut self.soil] {
            store.dataset_params = Some(params.clone());
            store.synthetic_params = Some(params.clone());
        }
        self
    }
}
