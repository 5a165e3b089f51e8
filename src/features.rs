//! Feature vectors, dataset schemas and soil types
//!
//! Two feature layouts feed the two classifiers:
//! - climate vector: N, P, K, temperature, humidity, ph, rainfall (crop classifier)
//! - soil vector: N, P, K, pH, soil_moisture (soil-to-crop classifier)
//!
//! Values are taken as given. There is no range validation; out-of-distribution inputs still
//! produce a best-effort prediction.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Column layout of a training dataset: ordered feature columns plus the label column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSchema {
    pub features: &'static [&'static str],
    pub label: &'static str,
}

/// Crop_recommendation.csv layout
pub const CLIMATE_SCHEMA: FeatureSchema = FeatureSchema {
    features: &["N", "P", "K", "temperature", "humidity", "ph", "rainfall"],
    label: "label",
};

/// fertilizer.csv layout
pub const SOIL_SCHEMA: FeatureSchema = FeatureSchema {
    features: &["N", "P", "K", "pH", "soil_moisture"],
    label: "Crop",
};

impl FeatureSchema {
    pub fn n_features(&self) -> usize {
        self.features.len()
    }

    /// Owned feature names, as stored in model artifacts
    pub fn feature_names(&self) -> Vec<String> {
        self.features.iter().map(|s| s.to_string()).collect()
    }
}

/// Climate/soil sample for the crop classifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClimateFeatures {
    #[serde(rename = "N")]
    pub nitrogen: f64,
    #[serde(rename = "P")]
    pub phosphorus: f64,
    #[serde(rename = "K")]
    pub potassium: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub ph: f64,
    pub rainfall: f64,
}

impl ClimateFeatures {
    /// Values in `CLIMATE_SCHEMA` column order
    pub fn to_row(&self) -> [f64; 7] {
        [
            self.nitrogen,
            self.phosphorus,
            self.potassium,
            self.temperature,
            self.humidity,
            self.ph,
            self.rainfall,
        ]
    }
}

/// Soil-only sample for the soil-to-crop classifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoilFeatures {
    #[serde(rename = "N")]
    pub nitrogen: f64,
    #[serde(rename = "P")]
    pub phosphorus: f64,
    #[serde(rename = "K")]
    pub potassium: f64,
    #[serde(rename = "pH")]
    pub ph: f64,
    pub soil_moisture: f64,
}

impl SoilFeatures {
    /// Values in `SOIL_SCHEMA` column order
    pub fn to_row(&self) -> [f64; 5] {
        [
            self.nitrogen,
            self.phosphorus,
            self.potassium,
            self.ph,
            self.soil_moisture,
        ]
    }
}

/// Soil texture class used by the fertilizer and irrigation rules
///
/// Parsing is case-insensitive and never fails: anything unrecognised is kept, lower-cased,
/// as `Other` and gets the neutral factor. Serde goes through the same parser, so records
/// carry soil types as plain strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SoilType {
    Sandy,
    Clay,
    Loamy,
    Other(String),
}

impl SoilType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "sandy" => SoilType::Sandy,
            "clay" => SoilType::Clay,
            "loamy" => SoilType::Loamy,
            other => SoilType::Other(other.to_string()),
        }
    }
}

impl From<&str> for SoilType {
    fn from(raw: &str) -> Self {
        SoilType::parse(raw)
    }
}

impl From<String> for SoilType {
    fn from(raw: String) -> Self {
        SoilType::parse(&raw)
    }
}

impl From<SoilType> for String {
    fn from(soil_type: SoilType) -> Self {
        soil_type.to_string()
    }
}

impl fmt::Display for SoilType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SoilType::Sandy => write!(f, "sandy"),
            SoilType::Clay => write!(f, "clay"),
            SoilType::Loamy => write!(f, "loamy"),
            SoilType::Other(name) => write!(f, "{}", name),
        }
    }
}
