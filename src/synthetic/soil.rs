//! Synthetic soil rows for the soil-to-crop classifier
//!
//! Every crop in `CROPS` gets 100 rows of {N, P, K, pH, soil_moisture} drawn from the ranges
//! of its agronomic category.

use super::CROPS;
use crate::data::TrainingTable;
use crate::features::SOIL_SCHEMA;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const SAMPLES_PER_CROP: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoilCategory {
    /// High N requirement
    Cereal,
    Fiber,
    /// High K requirement
    FruitTree,
    OtherFruit,
    /// Nitrogen-fixing, so low N
    Legume,
    Default,
}

impl SoilCategory {
    pub fn of(crop: &str) -> Self {
        match crop {
            "rice" | "wheat" | "maize" | "sugarcane" => SoilCategory::Cereal,
            "cotton" | "jute" => SoilCategory::Fiber,
            "banana" | "mango" | "coconut" | "pomegranate" => SoilCategory::FruitTree,
            "grapes" | "watermelon" | "muskmelon" | "orange" | "papaya" | "apple" => {
                SoilCategory::OtherFruit
            }
            "chickpea" | "pigeonpeas" | "mothbeans" | "mungbean" | "blackgram" | "lentil" => {
                SoilCategory::Legume
            }
            _ => SoilCategory::Default,
        }
    }

    /// Uniform ranges in `SOIL_SCHEMA` order: N, P, K, pH, soil_moisture
    pub fn ranges(&self) -> [(f64, f64); 5] {
        match self {
            SoilCategory::Cereal => [(80.0, 120.0), (30.0, 60.0), (30.0, 60.0), (5.5, 7.5), (60.0, 85.0)],
            SoilCategory::Fiber => [(60.0, 100.0), (30.0, 50.0), (40.0, 70.0), (6.0, 7.5), (50.0, 75.0)],
            SoilCategory::FruitTree => [(50.0, 90.0), (25.0, 50.0), (60.0, 100.0), (5.5, 7.0), (55.0, 80.0)],
            SoilCategory::OtherFruit => [(40.0, 80.0), (20.0, 50.0), (50.0, 90.0), (5.5, 7.5), (50.0, 80.0)],
            SoilCategory::Legume => [(20.0, 50.0), (30.0, 60.0), (20.0, 50.0), (6.0, 8.0), (45.0, 70.0)],
            SoilCategory::Default => [(40.0, 80.0), (25.0, 55.0), (30.0, 60.0), (5.5, 7.5), (50.0, 75.0)],
        }
    }
}

pub fn generate(seed: u64) -> TrainingTable {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut rows = Vec::with_capacity(CROPS.len() * SAMPLES_PER_CROP);
    let mut labels = Vec::with_capacity(CROPS.len() * SAMPLES_PER_CROP);

    for &crop in CROPS {
        let ranges = SoilCategory::of(crop).ranges();
        let columns: Vec<Vec<f64>> = ranges
            .iter()
            .map(|&(lo, hi)| (0..SAMPLES_PER_CROP).map(|_| rng.gen_range(lo..hi)).collect())
            .collect();

        for idx in 0..SAMPLES_PER_CROP {
            rows.push(columns.iter().map(|column| column[idx]).collect());
            labels.push(crop.to_string());
        }
    }

    TrainingTable::from_rows(SOIL_SCHEMA, rows, labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(SoilCategory::of("rice"), SoilCategory::Cereal);
        assert_eq!(SoilCategory::of("jute"), SoilCategory::Fiber);
        assert_eq!(SoilCategory::of("coconut"), SoilCategory::FruitTree);
        assert_eq!(SoilCategory::of("papaya"), SoilCategory::OtherFruit);
        assert_eq!(SoilCategory::of("lentil"), SoilCategory::Legume);
        assert_eq!(SoilCategory::of("coffee"), SoilCategory::Default);
        assert_eq!(SoilCategory::of("kidneybeans"), SoilCategory::Default);
    }

    #[test]
    fn test_generate_rows_follow_category_ranges() {
        let table = generate(42);
        assert_eq!(table.n_rows(), CROPS.len() * SAMPLES_PER_CROP);

        for idx in 0..table.n_rows() {
            let ranges = SoilCategory::of(&table.labels[idx]).ranges();
            for (value, (lo, hi)) in table.features.row(idx).iter().zip(ranges) {
                assert!(*value >= lo && *value < hi);
            }
        }

        // Legumes average well below cereals on N
        let levels = table.target_levels();
        assert!(levels.get("lentil").unwrap()["N"] < levels.get("rice").unwrap()["N"]);
        assert_eq!(levels.len(), CROPS.len());
    }
}
