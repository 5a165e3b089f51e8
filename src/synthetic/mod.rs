//! Synthetic training data
//!
//! Used when no dataset file exists. Both generators are driven by a seeded `StdRng`, so the
//! same seed always produces the same table.
//!
//! - `crop`: uniform climate/soil draws labelled by a short decision cascade
//! - `soil`: per-crop soil draws from agronomic-category ranges

pub mod crop;
pub mod soil;

use crate::data::TrainingTable;
use crate::model::ModelVariant;

/// Crops known to the synthetic generators
pub const CROPS: &[&str] = &[
    "rice",
    "wheat",
    "maize",
    "chickpea",
    "kidneybeans",
    "pigeonpeas",
    "mothbeans",
    "mungbean",
    "blackgram",
    "lentil",
    "pomegranate",
    "banana",
    "mango",
    "grapes",
    "watermelon",
    "muskmelon",
    "apple",
    "orange",
    "papaya",
    "coconut",
    "cotton",
    "jute",
    "coffee",
];

/// Generate the synthetic table for a model variant
pub fn generate(variant: ModelVariant, seed: u64) -> TrainingTable {
    match variant {
        ModelVariant::Crop => crop::generate(seed),
        ModelVariant::SoilToCrop => soil::generate(seed),
    }
}
