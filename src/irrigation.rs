//! Irrigation Scheduler
//!
//! Builds a 30-day watering plan from a per-crop {daily requirement, frequency} table:
//!
//! ```text
//! temp_factor     = 1 + (temperature − 25) × 0.02
//! humidity_factor = 1 − (humidity − 60) × 0.005
//! soil_factor     = sandy 1.3 | clay 0.8 | otherwise 1.0
//! base_water      = daily × area × temp_factor × humidity_factor × soil_factor
//! ```
//!
//! Every entry carries the same `base_water`. Factors are not clamped, so extreme inputs can
//! produce negative volumes.

use crate::features::SoilType;
use crate::utils::round2;
use rustc_hash::FxHashMap;
use serde::Serialize;

pub const SCHEDULE_HORIZON_DAYS: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WaterRequirement {
    pub daily: f64,
    /// Days between waterings
    pub frequency: u32,
}

const STANDARD_WATER: &[(&str, f64, u32)] = &[
    ("rice", 8.0, 1),
    ("wheat", 5.0, 3),
    ("maize", 6.0, 2),
    ("cotton", 6.5, 3),
    ("sugarcane", 10.0, 2),
    ("potato", 5.5, 2),
    ("tomato", 5.0, 2),
    ("banana", 7.0, 2),
    ("mango", 4.0, 5),
];

const DEFAULT_WATER: WaterRequirement = WaterRequirement {
    daily: 6.0,
    frequency: 3,
};

#[derive(Debug, Clone)]
pub struct WaterTable {
    entries: FxHashMap<String, WaterRequirement>,
    default: WaterRequirement,
}

impl WaterTable {
    pub fn standard() -> Self {
        let entries = STANDARD_WATER
            .iter()
            .map(|&(crop, daily, frequency)| (crop.to_string(), WaterRequirement { daily, frequency }))
            .collect();
        Self {
            entries,
            default: DEFAULT_WATER,
        }
    }

    /// Case-insensitive lookup; unknown crops get {daily: 6, frequency: 3}
    pub fn get(&self, crop: &str) -> WaterRequirement {
        self.entries
            .get(crop.trim().to_lowercase().as_str())
            .copied()
            .unwrap_or(self.default)
    }
}

impl Default for WaterTable {
    fn default() -> Self {
        Self::standard()
    }
}

pub fn irrigation_soil_factor(soil_type: &SoilType) -> f64 {
    match soil_type {
        SoilType::Sandy => 1.3,
        SoilType::Clay => 0.8,
        _ => 1.0,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleEntry {
    pub day: u32,
    /// "Day N"
    pub date: String,
    pub water_amount: f64,
    /// Minutes
    pub duration: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScheduleAdjustments {
    pub temperature_factor: f64,
    pub humidity_factor: f64,
    pub soil_factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchedulePlan {
    pub crop_type: String,
    pub schedule: Vec<ScheduleEntry>,
    pub total_water: f64,
    pub frequency: u32,
    pub adjustments: ScheduleAdjustments,
}

#[derive(Debug, Clone, Default)]
pub struct IrrigationScheduler {
    table: WaterTable,
}

impl IrrigationScheduler {
    pub fn new() -> Self {
        Self::with_table(WaterTable::standard())
    }

    pub fn with_table(table: WaterTable) -> Self {
        Self { table }
    }

    pub fn create_schedule(
        &self,
        crop: &str,
        soil_type: &SoilType,
        area: f64,
        temperature: f64,
        humidity: f64,
    ) -> SchedulePlan {
        let crop_type = crop.trim().to_lowercase();
        let requirement = self.table.get(&crop_type);

        let temp_factor = 1.0 + (temperature - 25.0) * 0.02;
        let humidity_factor = 1.0 - (humidity - 60.0) * 0.005;
        let soil_factor = irrigation_soil_factor(soil_type);
        let base_water = requirement.daily * area * temp_factor * humidity_factor * soil_factor;

        let water_amount = round2(base_water);
        let duration = (base_water / 10.0) as i64;
        let schedule: Vec<ScheduleEntry> = (0..SCHEDULE_HORIZON_DAYS)
            .step_by(requirement.frequency.max(1) as usize)
            .map(|day| ScheduleEntry {
                day,
                date: format!("Day {}", day),
                water_amount,
                duration,
            })
            .collect();

        let total_water = round2(schedule.iter().map(|entry| entry.water_amount).sum());

        SchedulePlan {
            crop_type,
            schedule,
            total_water,
            frequency: requirement.frequency,
            adjustments: ScheduleAdjustments {
                temperature_factor: round2(temp_factor),
                humidity_factor: round2(humidity_factor),
                soil_factor,
            },
        }
    }
}
