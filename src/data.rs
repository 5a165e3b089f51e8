//! Dataset Loading and Cleaning
//!
//! Loads a tabular training dataset (CSV or Parquet) with Polars and turns it into a dense
//! `TrainingTable` for the booster.
//!
//! **Cleaning steps** (in order):
//!   1. Drop bookkeeping columns left behind by a previous export (`Unnamed: 0`, blank headers)
//!   2. Verify every required feature column and the label column exist (fatal if not)
//!   3. Drop rows with a null/NaN in any required column
//!   4. Lower-case the label strings
//!
//! An empty table after step 3 is an `InsufficientData` error.

use crate::error::{EngineError, Result};
use crate::features::FeatureSchema;
use crate::model::FeatureMatrix;
use crate::utils::round2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Cleaned, dense training data
#[derive(Debug, Clone)]
pub struct TrainingTable {
    pub schema: FeatureSchema,
    pub features: FeatureMatrix,
    pub labels: Vec<String>,
}

/// Mean feature value per label, e.g. `{"rice": {"N": 99.8, "pH": 6.51, ...}}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetLevels(BTreeMap<String, BTreeMap<String, f64>>);

impl TargetLevels {
    /// Aggregates for one label, if any were recorded
    pub fn get(&self, label: &str) -> Option<&BTreeMap<String, f64>> {
        self.0.get(label)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|s| s.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeMap<String, f64>)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TrainingTable {
    pub fn n_rows(&self) -> usize {
        self.labels.len()
    }

    /// Build a table from in-memory rows (used by the synthetic generators)
    pub fn from_rows(schema: FeatureSchema, rows: Vec<Vec<f64>>, labels: Vec<String>) -> Self {
        debug_assert_eq!(rows.len(), labels.len());
        let mut values = Vec::with_capacity(rows.len() * schema.n_features());
        for row in &rows {
            debug_assert_eq!(row.len(), schema.n_features());
            values.extend_from_slice(row);
        }

        Self {
            schema,
            features: FeatureMatrix::new(values, schema.n_features()),
            labels,
        }
    }

    /// Column-wise mean per label, rounded to 2 decimals
    pub fn target_levels(&self) -> TargetLevels {
        let n_features = self.schema.n_features();
        let mut sums: BTreeMap<&str, (Vec<f64>, usize)> = BTreeMap::new();

        for (idx, label) in self.labels.iter().enumerate() {
            let entry = sums
                .entry(label.as_str())
                .or_insert_with(|| (vec![0.0; n_features], 0));
            for (acc, value) in entry.0.iter_mut().zip(self.features.row(idx)) {
                *acc += value;
            }
            entry.1 += 1;
        }

        let levels = sums
            .into_iter()
            .map(|(label, (totals, count))| {
                let means = self
                    .schema
                    .features
                    .iter()
                    .zip(totals)
                    .map(|(name, total)| (name.to_string(), round2(total / count as f64)))
                    .collect();
                (label.to_string(), means)
            })
            .collect();

        TargetLevels(levels)
    }
}

/// Load and clean a dataset file for the given schema
///
/// The file must exist; callers choose between dataset and synthetic training by checking
/// for the file first.
pub fn load_training_table(path: &Path, schema: FeatureSchema) -> Result<TrainingTable> {
    let raw = read_frame(path)?;
    tracing::debug!("Read {} rows × {} columns from {:?}", raw.height(), raw.width(), path);

    let df = drop_bookkeeping_columns(raw)?;
    check_required_columns(&df, schema, path)?;
    clean_rows(&df, schema, path)
}

/// Read CSV or Parquet depending on the file extension
fn read_frame(path: &Path) -> Result<DataFrame> {
    let is_parquet = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("parquet"));

    if is_parquet {
        let df = LazyFrame::scan_parquet(path, Default::default())?.collect()?;
        return Ok(df);
    }

    let parse_options = CsvParseOptions::default()
        .with_null_values(Some(NullValues::AllColumnsSingle("NA".into())));

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_parse_options(parse_options)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    Ok(df)
}

fn is_bookkeeping_column(name: &str) -> bool {
    let trimmed = name.trim();
    trimmed.is_empty() || trimmed.to_lowercase().starts_with("unnamed")
}

fn drop_bookkeeping_columns(df: DataFrame) -> Result<DataFrame> {
    let names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect();

    let (dropped, kept): (Vec<&String>, Vec<&String>) =
        names.iter().partition(|name| is_bookkeeping_column(name));

    if dropped.is_empty() {
        return Ok(df);
    }

    tracing::warn!("Ignoring bookkeeping columns: {:?}", dropped);
    Ok(df.select(kept.iter().map(|name| name.as_str()))?)
}

fn check_required_columns(df: &DataFrame, schema: FeatureSchema, path: &Path) -> Result<()> {
    let present: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect();

    let missing: Vec<&str> = schema
        .features
        .iter()
        .chain(std::iter::once(&schema.label))
        .copied()
        .filter(|required| !present.iter().any(|name| name == required))
        .collect();

    if !missing.is_empty() {
        return Err(EngineError::Configuration(format!(
            "dataset {:?} is missing required columns: {}",
            path,
            missing.join(", ")
        )));
    }

    Ok(())
}

fn clean_rows(df: &DataFrame, schema: FeatureSchema, path: &Path) -> Result<TrainingTable> {
    let feature_columns: Vec<Column> = schema
        .features
        .iter()
        .map(|name| df.column(name)?.cast(&DataType::Float64))
        .collect::<PolarsResult<_>>()?;
    let feature_values: Vec<&Float64Chunked> = feature_columns
        .iter()
        .map(|column| column.f64())
        .collect::<PolarsResult<_>>()?;

    let label_column = df.column(schema.label)?.cast(&DataType::String)?;
    let label_values = label_column.str()?;

    let mut values = Vec::with_capacity(df.height() * schema.n_features());
    let mut labels = Vec::with_capacity(df.height());
    let mut row = Vec::with_capacity(schema.n_features());
    let mut dropped = 0usize;

    for idx in 0..df.height() {
        let Some(label) = label_values.get(idx) else {
            dropped += 1;
            continue;
        };

        row.clear();
        for values_ca in &feature_values {
            match values_ca.get(idx) {
                Some(v) if !v.is_nan() => row.push(v),
                _ => break,
            }
        }
        if row.len() != schema.n_features() {
            dropped += 1;
            continue;
        }

        values.extend_from_slice(&row);
        labels.push(label.to_lowercase());
    }

    if dropped > 0 {
        tracing::warn!("Dropped {} rows with missing values from {:?}", dropped, path);
    }

    if labels.is_empty() {
        return Err(EngineError::InsufficientData {
            path: path.to_path_buf(),
            reason: format!("no complete rows remain out of {}", df.height()),
        });
    }

    tracing::debug!("Kept {} clean rows from {:?}", labels.len(), path);

    Ok(TrainingTable {
        schema,
        features: FeatureMatrix::new(values, schema.n_features()),
        labels,
    })
}
