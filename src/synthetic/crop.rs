//! Synthetic climate rows for the crop classifier
//!
//! 2200 rows, every feature drawn uniformly from a fixed range. Labels come from a decision
//! cascade on (temperature, rainfall, pH, N, K); rows no rule claims get a uniformly random
//! crop from `CROPS`.

use super::CROPS;
use crate::data::TrainingTable;
use crate::features::CLIMATE_SCHEMA;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const N_SAMPLES: usize = 2200;

/// Uniform draw ranges in `CLIMATE_SCHEMA` order
pub const FEATURE_RANGES: [(f64, f64); 7] = [
    (0.0, 140.0),  // N
    (5.0, 145.0),  // P
    (5.0, 205.0),  // K
    (8.0, 44.0),   // temperature
    (14.0, 100.0), // humidity
    (3.5, 9.5),    // ph
    (20.0, 300.0), // rainfall
];

/// First matching rule wins; `None` means "no rule applies"
pub fn label_by_rules(row: &[f64]) -> Option<&'static str> {
    let (n, k) = (row[0], row[2]);
    let (temp, ph, rain) = (row[3], row[5], row[6]);

    if temp < 20.0 && rain > 100.0 {
        return Some("wheat");
    }
    if temp > 30.0 && rain > 200.0 {
        return Some("rice");
    }
    if (20.0..=30.0).contains(&temp) && rain < 100.0 {
        return Some("maize");
    }
    if ph > 7.0 && temp > 25.0 {
        return Some("banana");
    }
    if n > 80.0 && k > 80.0 {
        return Some("cotton");
    }
    if temp > 28.0 && rain > 150.0 {
        return Some("coffee");
    }
    None
}

pub fn generate(seed: u64) -> TrainingTable {
    let mut rng = StdRng::seed_from_u64(seed);

    // Column by column, then labels, so the feature draws do not depend on the cascade
    let columns: Vec<Vec<f64>> = FEATURE_RANGES
        .iter()
        .map(|&(lo, hi)| (0..N_SAMPLES).map(|_| rng.gen_range(lo..hi)).collect())
        .collect();

    let mut rows = Vec::with_capacity(N_SAMPLES);
    let mut labels = Vec::with_capacity(N_SAMPLES);
    for idx in 0..N_SAMPLES {
        let row: Vec<f64> = columns.iter().map(|column| column[idx]).collect();
        let label = label_by_rules(&row)
            .unwrap_or_else(|| CROPS[rng.gen_range(0..CROPS.len())]);
        rows.push(row);
        labels.push(label.to_string());
    }

    TrainingTable::from_rows(CLIMATE_SCHEMA, rows, labels)
}
