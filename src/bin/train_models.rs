//! Train both classifiers and persist their artifacts
//!
//! Always retrains, even when artifacts exist. Datasets are read from the configured data
//! directory; a missing dataset file falls back to synthetic rows.
//!
//! Usage:
//!   cargo run --release --bin train_models
//!   AGRI_DATA_DIR=/srv/agri/Data AGRI_TRAINING_TIMEOUT_SECS=600 cargo run --release --bin train_models

use agrismart_engine::{EngineConfig, ModelSource, ModelStore, ModelVariant};
use anyhow::Context;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agrismart_engine=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = EngineConfig::from_env().context("failed to resolve engine configuration")?;

    tracing::info!("Configuration:");
    tracing::info!("  data_dir: {:?}", config.data_dir);
    tracing::info!("  model_dir: {:?}", config.model_dir);
    tracing::info!("  training_timeout_secs: {:?}", config.training_timeout_secs);

    println!("\n{}", "=".repeat(70));
    println!("Model Training");
    println!("{}", "=".repeat(70));

    let total_start = Instant::now();

    for variant in [ModelVariant::Crop, ModelVariant::SoilToCrop] {
        let start = Instant::now();
        let mut store = ModelStore::from_config(variant, &config).with_force_retrain(true);

        let model = store
            .open()
            .with_context(|| format!("training the {} model failed", variant.display_name()))?;

        let origin = match model.source {
            ModelSource::Dataset { rows } => format!("dataset {:?} ({} rows)", store.dataset_path(), rows),
            ModelSource::Synthetic { rows } => format!("synthetic ({} rows)", rows),
            ModelSource::Persisted => "persisted artifact".to_string(),
        };
        let classes: Vec<&str> = model.artifact.vocabulary.iter().collect();

        println!("\n{} model", variant.display_name());
        println!("  Source:   {}", origin);
        println!("  Classes:  {} [{}]", classes.len(), classes.join(", "));
        println!("  Rounds:   {}", model.artifact.classifier.n_rounds());
        println!("  Artifact: {:?}", store.artifact_path());
        println!("  Time:     {:.2}s", start.elapsed().as_secs_f64());
    }

    println!("\n{}", "=".repeat(70));
    println!("Done in {:.2}s", total_start.elapsed().as_secs_f64());
    println!("{}", "=".repeat(70));

    Ok(())
}
