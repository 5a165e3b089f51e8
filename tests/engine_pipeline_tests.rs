// End-to-end pipeline tests
//
// Each test builds its own Data/ and instance/ directories under a temp dir, writes small
// datasets on the fly and opens an engine with fast booster settings.
// Run with: cargo test --test engine_pipeline_tests

use agrismart_engine::{
    AgronomyEngine, BoosterParams, ClimateFeatures, EngineConfig, EngineError, ModelSource,
    RecommendationMode, SoilFeatures, SoilType,
};
use approx::assert_relative_eq;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

fn fast_params() -> BoosterParams {
    BoosterParams {
        n_estimators: 12,
        max_depth: 3,
        learning_rate: 0.3,
        subsample: 1.0,
        colsample_bytree: 1.0,
        ..BoosterParams::soil()
    }
}

fn config_for(root: &Path) -> EngineConfig {
    EngineConfig::rooted_at(root).with_params(fast_params())
}

/// (label, N, P, K, temperature, humidity, ph, rainfall) cluster centres
const CLIMATE_CLUSTERS: &[(&str, [f64; 7])] = &[
    ("Rice", [80.0, 45.0, 40.0, 24.0, 82.0, 6.4, 230.0]),
    ("maize", [78.0, 48.0, 20.0, 22.0, 65.0, 6.2, 85.0]),
    ("LENTIL", [20.0, 68.0, 19.0, 24.0, 64.0, 6.9, 45.0]),
];

fn write_climate_dataset(root: &Path, clusters: &[(&str, [f64; 7])], rows_per_label: usize) {
    let mut csv = String::from("Unnamed: 0,N,P,K,temperature,humidity,ph,rainfall,label\n");
    let mut index = 0;
    for (label, centre) in clusters {
        for i in 0..rows_per_label {
            let jitter = (i % 5) as f64 * 0.4 - 0.8;
            let values: Vec<String> = centre.iter().map(|v| format!("{:.2}", v + jitter)).collect();
            writeln!(csv, "{},{},{}", index, values.join(","), label).unwrap();
            index += 1;
        }
    }
    // Incomplete row, dropped during cleaning
    writeln!(csv, "{},90,NA,43,20.8,82.0,6.5,202.9,rice", index).unwrap();

    fs::create_dir_all(root.join("Data")).unwrap();
    fs::write(root.join("Data").join("Crop_recommendation.csv"), csv).unwrap();
}

fn climate(values: [f64; 7]) -> ClimateFeatures {
    ClimateFeatures {
        nitrogen: values[0],
        phosphorus: values[1],
        potassium: values[2],
        temperature: values[3],
        humidity: values[4],
        ph: values[5],
        rainfall: values[6],
    }
}

#[test]
fn test_dataset_training_cleans_and_predicts() {
    let dir = tempfile::tempdir().unwrap();
    write_climate_dataset(dir.path(), CLIMATE_CLUSTERS, 20);

    let engine = AgronomyEngine::open(&config_for(dir.path())).unwrap();
    assert_eq!(engine.sources()[0].1, ModelSource::Dataset { rows: 60 });

    let vocabulary: Vec<&str> = engine.crop_classifier().vocabulary().iter().collect();
    assert_eq!(vocabulary, vec!["lentil", "maize", "rice"]);

    for (label, centre) in CLIMATE_CLUSTERS {
        let prediction = engine.predict(&climate(*centre));
        assert_eq!(prediction.label, label.to_lowercase());
        assert_eq!(prediction.candidates.len(), 3);
        assert!(prediction.confidence > 50.0 && prediction.confidence <= 100.0);
        assert_relative_eq!(prediction.confidence, prediction.candidates[0].probability);
    }
}

#[test]
fn test_candidate_count_is_capped_by_vocabulary() {
    let dir = tempfile::tempdir().unwrap();
    write_climate_dataset(dir.path(), &CLIMATE_CLUSTERS[..2], 15);

    let engine = AgronomyEngine::open(&config_for(dir.path())).unwrap();
    let prediction = engine.predict(&climate(CLIMATE_CLUSTERS[0].1));

    assert_eq!(prediction.candidates.len(), 2);
    assert!(prediction.candidates[0].probability > prediction.candidates[1].probability);
}

#[test]
fn test_reload_reproduces_predictions() {
    let dir = tempfile::tempdir().unwrap();
    write_climate_dataset(dir.path(), CLIMATE_CLUSTERS, 20);
    let config = config_for(dir.path());

    let trained = AgronomyEngine::open(&config).unwrap();
    let reloaded = AgronomyEngine::open(&config).unwrap();
    assert_eq!(reloaded.sources()[0].1, ModelSource::Persisted);

    let inputs = [
        CLIMATE_CLUSTERS[0].1,
        [50.0, 50.0, 30.0, 23.0, 70.0, 6.5, 150.0],
        [-10.0, 500.0, 0.0, 60.0, 120.0, 14.0, 0.0],
    ];
    for input in inputs {
        let before = trained.predict(&climate(input));
        let after = reloaded.predict(&climate(input));
        assert_eq!(before.label, after.label);
        assert_eq!(before.confidence.to_bits(), after.confidence.to_bits());
        assert_eq!(before, after);
    }
}

#[test]
fn test_missing_column_is_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("Data")).unwrap();
    fs::write(
        dir.path().join("Data").join("Crop_recommendation.csv"),
        "N,P,K,temperature,humidity,ph,label\n90,42,43,20.8,82.0,6.5,rice\n",
    )
    .unwrap();

    let err = AgronomyEngine::open(&config_for(dir.path())).unwrap_err();
    match err {
        EngineError::Configuration(message) => assert!(message.contains("rainfall")),
        other => panic!("expected a configuration error, got {:?}", other),
    }
    assert!(!dir.path().join("instance").join("crop_gbdt_model.bin").exists());
}

#[test]
fn test_dataset_empty_after_cleaning_is_insufficient_data() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("Data")).unwrap();
    fs::write(
        dir.path().join("Data").join("fertilizer.csv"),
        "N,P,K,pH,soil_moisture,Crop\n90,NA,43,6.5,60,rice\nNA,42,43,6.5,60,maize\n",
    )
    .unwrap();

    let err = AgronomyEngine::open(&config_for(dir.path())).unwrap_err();
    assert!(matches!(err, EngineError::InsufficientData { .. }));
}

#[test]
fn test_soil_dataset_target_levels_drive_inferred_recommendation() {
    let dir = tempfile::tempdir().unwrap();
    let mut csv = String::from("N,P,K,pH,soil_moisture,Crop\n");
    for i in 0..12 {
        let offset = if i % 2 == 0 { 1.0 } else { -1.0 };
        writeln!(csv, "{},{},{},{},{},Rice", 100.0 + offset, 45.0 + offset, 45.0, 6.5, 75.0).unwrap();
        writeln!(csv, "{},{},{},{},{},Lentil", 30.0 + offset, 60.0, 25.0 + offset, 7.2, 50.0).unwrap();
    }
    fs::create_dir_all(dir.path().join("Data")).unwrap();
    fs::write(dir.path().join("Data").join("fertilizer.csv"), csv).unwrap();

    let engine = AgronomyEngine::open(&config_for(dir.path())).unwrap();
    assert_eq!(engine.sources()[1].1, ModelSource::Dataset { rows: 24 });

    let soil = SoilFeatures {
        nitrogen: 40.0,
        phosphorus: 30.0,
        potassium: 30.0,
        ph: 6.5,
        soil_moisture: 74.0,
    };
    let predicted = engine.predict_soil(&SoilFeatures { nitrogen: 100.0, ..soil });
    assert_eq!(predicted.prediction.label, "rice");
    assert_relative_eq!(predicted.target_levels["N"], 100.0);
    assert_relative_eq!(predicted.target_levels["pH"], 6.5);
    assert_relative_eq!(predicted.target_levels["soil_moisture"], 75.0);

    let plan = engine.recommend_from_soil(&SoilFeatures { nitrogen: 100.0, ..soil }, &SoilType::Loamy);
    assert_eq!(plan.mode, RecommendationMode::Inferred);
    assert_eq!(plan.crop, "rice");
    // blended requirement: N 100, P 45, K 45 against current 100/30/30 → P and K short by 15
    assert_relative_eq!(plan.recommendation.required_n, 100.0);
    assert_relative_eq!(plan.recommendation.n_deficit, 0.0);
    assert_relative_eq!(plan.recommendation.p_deficit, 15.0);
    assert_relative_eq!(plan.recommendation.k_deficit, 15.0);
    assert_eq!(plan.recommendation.application_rate, "25.5 kg/hectare");
    assert_eq!(plan.recommendation.target_soil_moisture, Some(75.0));

    let json = serde_json::to_value(&plan).unwrap();
    assert_eq!(json["fertilizer"], "MOP (Muriate of Potash)");
    assert_eq!(json["inference"]["input_soil"]["pH"], 6.5);
}

#[test]
fn test_missing_datasets_fall_back_to_synthetic_models() {
    let dir = tempfile::tempdir().unwrap();
    let engine = AgronomyEngine::open(&config_for(dir.path())).unwrap();

    assert_eq!(engine.sources()[0].1, ModelSource::Synthetic { rows: 2200 });
    assert_eq!(engine.sources()[1].1, ModelSource::Synthetic { rows: 2300 });
    assert_eq!(engine.soil_classifier().vocabulary().len(), 23);
    assert!(dir.path().join("instance").join("crop_gbdt_model.bin").exists());
    assert!(dir.path().join("instance").join("fertilizer_gbdt_model.bin").exists());

    let prediction = engine.predict(&climate([90.0, 42.0, 43.0, 20.88, 82.0, 6.5, 202.94]));
    assert!((0.0..=100.0).contains(&prediction.confidence));
    assert_eq!(prediction.candidates.len(), 3);
}
