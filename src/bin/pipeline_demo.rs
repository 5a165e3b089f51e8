//! Run the sample scenarios end to end and print each result record as JSON
//!
//! Opens the engine with the environment configuration (training models on first run),
//! then exercises crop prediction, both fertilizer workflows and an irrigation plan.
//!
//! Usage:
//!   cargo run --bin pipeline_demo

use agrismart_engine::{
    AgronomyEngine, ClimateFeatures, EngineConfig, FertilizerRequest, SoilFeatures, SoilType,
};
use anyhow::Context;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn print_record<T: Serialize>(title: &str, record: &T) -> anyhow::Result<()> {
    println!("\n{}", "-".repeat(70));
    println!("{}", title);
    println!("{}", "-".repeat(70));
    println!("{}", serde_json::to_string_pretty(record)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agrismart_engine=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = EngineConfig::from_env().context("failed to resolve engine configuration")?;
    let engine = AgronomyEngine::open(&config).context("failed to open the agronomy engine")?;

    let climate_samples = [
        ("Sample 1: rice-like climate", [90.0, 42.0, 43.0, 20.88, 82.0, 6.5, 202.94]),
        ("Sample 2: maize-like climate", [85.0, 58.0, 41.0, 21.77, 80.32, 7.04, 226.66]),
        ("Sample 3: chickpea-like climate", [60.0, 55.0, 44.0, 23.0, 82.32, 7.84, 263.96]),
    ];
    for (title, [n, p, k, temperature, humidity, ph, rainfall]) in climate_samples {
        let features = ClimateFeatures {
            nitrogen: n,
            phosphorus: p,
            potassium: k,
            temperature,
            humidity,
            ph,
            rainfall,
        };
        print_record(title, &engine.predict(&features))?;
    }

    print_record(
        "Fertilizer (direct): rice, N50 P30 K20, loamy",
        &engine.recommend("rice", 50.0, 30.0, 20.0, &SoilType::Loamy),
    )?;

    let request = FertilizerRequest {
        crop: None,
        soil: SoilFeatures {
            nitrogen: 45.0,
            phosphorus: 40.0,
            potassium: 35.0,
            ph: 6.8,
            soil_moisture: 58.0,
        },
        soil_type: SoilType::Clay,
    };
    print_record("Fertilizer (inferred from soil), clay", &engine.advise(&request))?;

    print_record(
        "Irrigation: rice, loamy, 2.5 ha, 28°C, 75% humidity",
        &engine.create_schedule("rice", &SoilType::Loamy, 2.5, 28.0, 75.0),
    )?;

    Ok(())
}
