//! Fertilizer Deficit Engine
//!
//! Pure rule evaluation over a crop's reference nutrient profile:
//!
//! 1. `deficit_x = max(0, required_x − current_x)` for N, P, K
//! 2. Product selection, first match wins:
//!    - N deficit strictly above both others → Urea (46-0-0), rate = N × 2
//!    - P deficit above K deficit → DAP (18-46-0), rate = P × 2.2
//!    - any K deficit → MOP (0-0-60), rate = K × 1.7
//!    - otherwise → NPK Complex (19-19-19), fixed 50 kg/hectare maintenance dose
//! 3. Soil adjustment factor (sandy 1.2, clay 0.9, otherwise 1.0) is reported alongside the
//!    rate but not multiplied into it.

use crate::data::TargetLevels;
use crate::features::SoilType;
use crate::utils::{format_rate, round2};
use rustc_hash::FxHashMap;
use serde::{Serialize, Serializer};

/// Reference nutrient profile for one crop
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FertilizerRequirement {
    pub n: f64,
    pub p: f64,
    pub k: f64,
    pub target_ph: Option<f64>,
    pub target_soil_moisture: Option<f64>,
    pub fertilizers: Vec<String>,
}

impl FertilizerRequirement {
    fn from_static(n: f64, p: f64, k: f64, fertilizers: &[&str]) -> Self {
        Self {
            n,
            p,
            k,
            target_ph: None,
            target_soil_moisture: None,
            fertilizers: fertilizers.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Profile used for crops absent from the table
    pub fn default_profile() -> Self {
        Self::from_static(100.0, 50.0, 50.0, &["NPK Complex"])
    }
}

/// (crop, N, P, K, candidate fertilizers)
const STANDARD_REQUIREMENTS: &[(&str, f64, f64, f64, &[&str])] = &[
    ("rice", 80.0, 40.0, 40.0, &["Urea", "DAP", "MOP"]),
    ("wheat", 120.0, 60.0, 40.0, &["Urea", "DAP", "MOP"]),
    ("maize", 100.0, 50.0, 50.0, &["Urea", "SSP", "MOP"]),
    ("cotton", 150.0, 75.0, 75.0, &["Urea", "DAP", "MOP"]),
    ("sugarcane", 200.0, 80.0, 80.0, &["Urea", "SSP", "MOP"]),
    ("banana", 200.0, 100.0, 200.0, &["Urea", "SSP", "MOP"]),
    ("mango", 100.0, 50.0, 100.0, &["Urea", "SSP", "MOP"]),
    ("potato", 120.0, 80.0, 120.0, &["Urea", "DAP", "MOP"]),
    ("tomato", 150.0, 100.0, 100.0, &["NPK Complex", "DAP"]),
];

/// Read-only crop → requirement lookup with an explicit default entry
#[derive(Debug, Clone)]
pub struct RequirementTable {
    entries: FxHashMap<String, FertilizerRequirement>,
    default: FertilizerRequirement,
}

impl RequirementTable {
    pub fn standard() -> Self {
        let entries = STANDARD_REQUIREMENTS
            .iter()
            .map(|&(crop, n, p, k, fertilizers)| {
                (
                    crop.to_string(),
                    FertilizerRequirement::from_static(n, p, k, fertilizers),
                )
            })
            .collect();

        Self {
            entries,
            default: FertilizerRequirement::default_profile(),
        }
    }

    /// Overlay per-crop aggregates from the soil-to-crop training data
    ///
    /// Aggregated N/P/K replace the static values, pH and soil moisture become targets, and
    /// the candidate fertilizer list is kept from the static entry (or `NPK Complex`).
    /// Crops present only in the aggregates are added.
    pub fn with_target_levels(mut self, levels: &TargetLevels) -> Self {
        for (crop, stats) in levels.iter() {
            let base = self.entries.get(crop.as_str());
            let pick = |key: &str, fallback: f64| stats.get(key).copied().unwrap_or(fallback);

            let blended = FertilizerRequirement {
                n: pick("N", base.map_or(100.0, |b| b.n)),
                p: pick("P", base.map_or(50.0, |b| b.p)),
                k: pick("K", base.map_or(50.0, |b| b.k)),
                target_ph: stats
                    .get("pH")
                    .copied()
                    .or_else(|| base.and_then(|b| b.target_ph)),
                target_soil_moisture: stats
                    .get("soil_moisture")
                    .copied()
                    .or_else(|| base.and_then(|b| b.target_soil_moisture)),
                fertilizers: base
                    .map(|b| b.fertilizers.clone())
                    .unwrap_or_else(|| vec!["NPK Complex".to_string()]),
            };
            self.entries.insert(crop.clone(), blended);
        }

        tracing::debug!(
            "Requirement table blended with {} crop aggregates ({} entries)",
            levels.len(),
            self.entries.len()
        );
        self
    }

    /// Case-insensitive lookup; unknown crops get the default profile
    pub fn get(&self, crop: &str) -> &FertilizerRequirement {
        self.entries
            .get(crop.trim().to_lowercase().as_str())
            .unwrap_or(&self.default)
    }

    pub fn contains(&self, crop: &str) -> bool {
        self.entries.contains_key(crop.trim().to_lowercase().as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for RequirementTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FertilizerProduct {
    Urea,
    Dap,
    Mop,
    NpkComplex,
}

impl FertilizerProduct {
    pub fn name(&self) -> &'static str {
        match self {
            FertilizerProduct::Urea => "Urea",
            FertilizerProduct::Dap => "DAP (Di-ammonium Phosphate)",
            FertilizerProduct::Mop => "MOP (Muriate of Potash)",
            FertilizerProduct::NpkComplex => "NPK Complex",
        }
    }

    pub fn npk_ratio(&self) -> &'static str {
        match self {
            FertilizerProduct::Urea => "46-0-0",
            FertilizerProduct::Dap => "18-46-0",
            FertilizerProduct::Mop => "0-0-60",
            FertilizerProduct::NpkComplex => "19-19-19",
        }
    }
}

impl Serialize for FertilizerProduct {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Fixed dose when no nutrient is short
pub const MAINTENANCE_RATE_KG: f64 = 50.0;

/// Advisory multiplier for the soil texture (not applied to the rate)
pub fn soil_adjustment_factor(soil_type: &SoilType) -> f64 {
    match soil_type {
        SoilType::Sandy => 1.2,
        SoilType::Clay => 0.9,
        _ => 1.0,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeficitResult {
    pub fertilizer: FertilizerProduct,
    pub npk_ratio: String,
    pub application_rate: String,
    /// Numeric form of `application_rate` in kg/hectare
    pub application_rate_kg: f64,
    pub n_deficit: f64,
    pub p_deficit: f64,
    pub k_deficit: f64,
    pub required_n: f64,
    pub required_p: f64,
    pub required_k: f64,
    pub n_deficit_percent: i64,
    pub p_deficit_percent: i64,
    pub k_deficit_percent: i64,
    pub soil_adjustment_factor: f64,
    pub target_ph: Option<f64>,
    pub target_soil_moisture: Option<f64>,
}

fn deficit_percent(deficit: f64, required: f64) -> i64 {
    if required > 0.0 {
        (deficit / required * 100.0) as i64
    } else {
        0
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeficitEngine {
    table: RequirementTable,
}

impl DeficitEngine {
    /// Engine over the static requirement table
    pub fn new() -> Self {
        Self::with_table(RequirementTable::standard())
    }

    pub fn with_table(table: RequirementTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &RequirementTable {
        &self.table
    }

    pub fn recommend(
        &self,
        crop: &str,
        current_n: f64,
        current_p: f64,
        current_k: f64,
        soil_type: &SoilType,
    ) -> DeficitResult {
        let required = self.table.get(crop);

        let n_deficit = (required.n - current_n).max(0.0);
        let p_deficit = (required.p - current_p).max(0.0);
        let k_deficit = (required.k - current_k).max(0.0);

        let (product, rate_kg) = if n_deficit > p_deficit && n_deficit > k_deficit {
            (FertilizerProduct::Urea, n_deficit * 2.0)
        } else if p_deficit > k_deficit {
            (FertilizerProduct::Dap, p_deficit * 2.2)
        } else if k_deficit > 0.0 {
            (FertilizerProduct::Mop, k_deficit * 1.7)
        } else {
            (FertilizerProduct::NpkComplex, MAINTENANCE_RATE_KG)
        };

        DeficitResult {
            fertilizer: product,
            npk_ratio: product.npk_ratio().to_string(),
            application_rate: format_rate(rate_kg),
            application_rate_kg: round2(rate_kg),
            n_deficit: round2(n_deficit),
            p_deficit: round2(p_deficit),
            k_deficit: round2(k_deficit),
            required_n: required.n,
            required_p: required.p,
            required_k: required.k,
            n_deficit_percent: deficit_percent(n_deficit, required.n),
            p_deficit_percent: deficit_percent(p_deficit, required.p),
            k_deficit_percent: deficit_percent(k_deficit, required.k),
            soil_adjustment_factor: soil_adjustment_factor(soil_type),
            target_ph: required.target_ph,
            target_soil_moisture: required.target_soil_moisture,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::BTreeMap;

    #[test]
    fn test_rice_nitrogen_dominant() {
        let result = DeficitEngine::new().recommend("rice", 50.0, 30.0, 20.0, &SoilType::Loamy);

        assert_eq!(result.fertilizer, FertilizerProduct::Urea);
        assert_eq!(result.npk_ratio, "46-0-0");
        assert_eq!(result.application_rate, "60 kg/hectare");
        assert_relative_eq!(result.n_deficit, 30.0);
        assert_relative_eq!(result.p_deficit, 10.0);
        assert_relative_eq!(result.k_deficit, 20.0);
        assert_eq!(result.n_deficit_percent, 37);
        assert_eq!(result.p_deficit_percent, 25);
        assert_eq!(result.k_deficit_percent, 50);
        assert_relative_eq!(result.soil_adjustment_factor, 1.0);
        assert_eq!(result.target_ph, None);
    }

    #[test]
    fn test_unknown_crop_uses_default_and_ignores_soil_factor_in_rate() {
        let result =
            DeficitEngine::new().recommend("UnknownPlant", 10.0, 10.0, 10.0, &SoilType::Sandy);

        assert_relative_eq!(result.required_n, 100.0);
        assert_relative_eq!(result.required_p, 50.0);
        assert_relative_eq!(result.required_k, 50.0);
        assert_eq!(result.fertilizer, FertilizerProduct::Urea);
        assert_eq!(result.application_rate, "180 kg/hectare");
        assert_relative_eq!(result.application_rate_kg, 180.0);
        assert_relative_eq!(result.soil_adjustment_factor, 1.2);
    }

    #[test]
    fn test_selection_branches() {
        let engine = DeficitEngine::new();

        // wheat 120/60/40: deficits 0/20/10 → DAP
        let dap = engine.recommend("Wheat", 130.0, 40.0, 30.0, &SoilType::Clay);
        assert_eq!(dap.fertilizer, FertilizerProduct::Dap);
        assert_eq!(dap.npk_ratio, "18-46-0");
        assert_eq!(dap.application_rate, "44 kg/hectare");
        assert_relative_eq!(dap.soil_adjustment_factor, 0.9);

        // rice: deficits 0/0/7 → MOP
        let mop = engine.recommend("rice", 90.0, 40.0, 33.0, &SoilType::Loamy);
        assert_eq!(mop.fertilizer, FertilizerProduct::Mop);
        assert_eq!(mop.application_rate, "11.9 kg/hectare");

        // N tied with K is not N-dominant; P below K → MOP
        let tie = engine.recommend("rice", 60.0, 35.0, 20.0, &SoilType::Loamy);
        assert_eq!(tie.fertilizer, FertilizerProduct::Mop);

        // nothing short → maintenance
        let npk = engine.recommend("rice", 200.0, 200.0, 200.0, &SoilType::Loamy);
        assert_eq!(npk.fertilizer, FertilizerProduct::NpkComplex);
        assert_eq!(npk.npk_ratio, "19-19-19");
        assert_eq!(npk.application_rate, "50 kg/hectare");
        assert_eq!(npk.n_deficit_percent, 0);
    }

    #[test]
    fn test_deficits_never_negative() {
        let engine = DeficitEngine::new();
        for current in [-50.0, 0.0, 45.0, 500.0, 1e9] {
            let r = engine.recommend("banana", current, current, current, &SoilType::Loamy);
            assert!(r.n_deficit >= 0.0 && r.p_deficit >= 0.0 && r.k_deficit >= 0.0);
            assert!(r.n_deficit_percent >= 0);
        }
    }

    #[test]
    fn test_deterministic() {
        let engine = DeficitEngine::new();
        let a = engine.recommend("maize", 12.5, 7.25, 3.0, &SoilType::Sandy);
        let b = engine.recommend("maize", 12.5, 7.25, 3.0, &SoilType::Sandy);
        assert_eq!(a, b);
    }

    #[test]
    fn test_target_levels_blending() {
        let mut raw = BTreeMap::new();
        raw.insert(
            "rice".to_string(),
            BTreeMap::from([
                ("N".to_string(), 95.5),
                ("P".to_string(), 44.0),
                ("K".to_string(), 41.0),
                ("pH".to_string(), 6.4),
                ("soil_moisture".to_string(), 72.3),
            ]),
        );
        raw.insert(
            "jute".to_string(),
            BTreeMap::from([("N".to_string(), 80.0)]),
        );
        let levels: TargetLevels = serde_json::from_value(serde_json::to_value(&raw).unwrap()).unwrap();

        let table = RequirementTable::standard().with_target_levels(&levels);
        let rice = table.get("RICE");
        assert_relative_eq!(rice.n, 95.5);
        assert_eq!(rice.target_ph, Some(6.4));
        assert_eq!(rice.target_soil_moisture, Some(72.3));
        assert_eq!(rice.fertilizers, vec!["Urea", "DAP", "MOP"]);

        let jute = table.get("jute");
        assert_relative_eq!(jute.n, 80.0);
        assert_relative_eq!(jute.p, 50.0);
        assert_eq!(jute.fertilizers, vec!["NPK Complex"]);
        assert!(table.contains("jute"));

        let result = DeficitEngine::with_table(table).recommend("rice", 50.0, 30.0, 20.0, &SoilType::Loamy);
        assert_relative_eq!(result.n_deficit, 45.5);
        assert_eq!(result.application_rate, "91 kg/hectare");
        assert_eq!(result.target_ph, Some(6.4));
    }

    #[test]
    fn test_zero_requirement_reports_zero_percent() {
        let raw = BTreeMap::from([(
            "fallow".to_string(),
            BTreeMap::from([
                ("N".to_string(), 0.0),
                ("P".to_string(), 0.0),
                ("K".to_string(), 0.0),
            ]),
        )]);
        let levels: TargetLevels = serde_json::from_value(serde_json::to_value(&raw).unwrap()).unwrap();
        let engine = DeficitEngine::with_table(RequirementTable::standard().with_target_levels(&levels));

        for current in [-5.0, 0.0, 12.0] {
            let r = engine.recommend("fallow", current, current, current, &SoilType::Clay);
            assert_eq!(r.required_n, 0.0);
            assert_eq!(
                (r.n_deficit_percent, r.p_deficit_percent, r.k_deficit_percent),
                (0, 0, 0)
            );
            assert!(r.n_deficit.is_finite() && r.application_rate_kg.is_finite());
        }

        assert_eq!(deficit_percent(5.0, 0.0), 0);
        assert_eq!(deficit_percent(5.0, -10.0), 0);
        assert_eq!(deficit_percent(30.0, 80.0), 37);
    }

    #[test]
    fn test_product_serializes_as_display_name() {
        let json = serde_json::to_value(FertilizerProduct::Dap).unwrap();
        assert_eq!(json, "DAP (Di-ammonium Phosphate)");
    }
}
