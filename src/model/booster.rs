//! Gradient-Boosted Multiclass Classifier
//!
//! Softmax-objective gradient boosting with one regression tree per class per round.
//!
//! # Algorithm
//!
//! 1. Start every class margin at 0 (uniform softmax)
//! 2. For each boosting round:
//!    - p = softmax(margins) per row
//!    - per class k: g = p_k - 1[y = k], h = max(2·p_k·(1 - p_k), 1e-16)
//!    - fit a `RegressionTree` per class on a shared row subsample and a per-tree column sample
//!    - margins += tree output (learning rate already folded into the leaves)
//! 3. Predicted distribution = softmax(sum of tree outputs)
//!
//! Row and column samples are drawn sequentially from one seeded `StdRng` before the
//! per-class trees are fitted in parallel, so a given seed always yields the same model.

use crate::error::{EngineError, Result};
use crate::model::tree::{BinnedFeatures, RegressionTree, TreeParams};
use crate::model::FeatureMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Boosting hyper-parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoosterParams {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub learning_rate: f64,
    /// Fraction of rows sampled per round, in (0, 1]
    pub subsample: f64,
    /// Fraction of features sampled per tree, in (0, 1]
    pub colsample_bytree: f64,
    /// L2 regularisation on leaf weights
    pub lambda: f64,
    pub min_child_weight: f64,
    pub max_bins: usize,
    pub seed: u64,
}

impl BoosterParams {
    /// Climate dataset training
    pub fn climate_dataset() -> Self {
        Self {
            n_estimators: 300,
            max_depth: 6,
            learning_rate: 0.08,
            subsample: 0.9,
            colsample_bytree: 0.9,
            ..Self::base()
        }
    }

    /// Climate synthetic training
    pub fn climate_synthetic() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 8,
            learning_rate: 0.1,
            ..Self::base()
        }
    }

    /// Soil-to-crop training (dataset and synthetic)
    pub fn soil() -> Self {
        Self {
            n_estimators: 300,
            max_depth: 4,
            learning_rate: 0.08,
            subsample: 0.9,
            colsample_bytree: 0.9,
            ..Self::base()
        }
    }

    fn base() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 6,
            learning_rate: 0.3,
            subsample: 1.0,
            colsample_bytree: 1.0,
            lambda: 1.0,
            min_child_weight: 1.0,
            max_bins: 64,
            seed: 42,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(EngineError::InvalidParameters(msg));

        if self.n_estimators == 0 {
            return fail("n_estimators must be at least 1".into());
        }
        if self.max_depth == 0 {
            return fail("max_depth must be at least 1".into());
        }
        if !(self.learning_rate > 0.0) {
            return fail(format!("learning_rate must be positive, got {}", self.learning_rate));
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return fail(format!("subsample must be in (0, 1], got {}", self.subsample));
        }
        if !(self.colsample_bytree > 0.0 && self.colsample_bytree <= 1.0) {
            return fail(format!(
                "colsample_bytree must be in (0, 1], got {}",
                self.colsample_bytree
            ));
        }
        if !(self.lambda >= 0.0) || !(self.min_child_weight >= 0.0) {
            return fail("lambda and min_child_weight must be non-negative".into());
        }
        if self.max_bins < 2 || self.max_bins > u16::MAX as usize {
            return fail(format!("max_bins must be in 2..=65535, got {}", self.max_bins));
        }
        Ok(())
    }

    fn tree_params(&self) -> TreeParams {
        TreeParams {
            max_depth: self.max_depth,
            learning_rate: self.learning_rate,
            lambda: self.lambda,
            min_child_weight: self.min_child_weight,
        }
    }
}

impl Default for BoosterParams {
    fn default() -> Self {
        Self::climate_dataset()
    }
}

/// Fitted multiclass booster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedClassifier {
    params: BoosterParams,
    n_classes: usize,
    n_features: usize,
    /// `rounds[r][k]` is the tree for class k in round r
    rounds: Vec<Vec<RegressionTree>>,
}

impl GradientBoostedClassifier {
    /// Fit on `x` with encoded labels `y` (each in `0..n_classes`)
    ///
    /// `time_budget` bounds total training time; exceeding it aborts with
    /// `EngineError::TrainingTimeout` and no model.
    pub fn fit(
        params: &BoosterParams,
        x: &FeatureMatrix,
        y: &[usize],
        n_classes: usize,
        time_budget: Option<Duration>,
    ) -> Result<Self> {
        params.validate()?;

        let n_rows = x.n_rows();
        if n_rows != y.len() {
            return Err(EngineError::InvalidParameters(format!(
                "feature rows ({}) and labels ({}) differ",
                n_rows,
                y.len()
            )));
        }
        if n_rows == 0 || n_classes == 0 {
            return Err(EngineError::InvalidParameters(
                "cannot fit a classifier without rows or classes".into(),
            ));
        }
        if let Some(&bad) = y.iter().find(|&&label| label >= n_classes) {
            return Err(EngineError::InvalidParameters(format!(
                "label index {} out of range for {} classes",
                bad, n_classes
            )));
        }

        let started = Instant::now();
        let n_features = x.n_features();
        let binned = BinnedFeatures::build(x, params.max_bins);
        let tree_params = params.tree_params();
        let mut rng = StdRng::seed_from_u64(params.seed);

        let mut margins = vec![0.0_f64; n_rows * n_classes];
        let mut probs = vec![0.0_f64; n_rows * n_classes];
        let mut rounds = Vec::with_capacity(params.n_estimators);

        for round in 0..params.n_estimators {
            for row in 0..n_rows {
                let span = row * n_classes..(row + 1) * n_classes;
                softmax_into(&margins[span.clone()], &mut probs[span]);
            }

            let rows = sample_rows(&mut rng, n_rows, params.subsample);
            let feature_sets: Vec<Vec<usize>> = (0..n_classes)
                .map(|_| sample_features(&mut rng, n_features, params.colsample_bytree))
                .collect();

            let trees: Vec<RegressionTree> = feature_sets
                .par_iter()
                .enumerate()
                .map(|(class, features)| {
                    let mut grad = vec![0.0; n_rows];
                    let mut hess = vec![0.0; n_rows];
                    for row in 0..n_rows {
                        let p = probs[row * n_classes + class];
                        let target = if y[row] == class { 1.0 } else { 0.0 };
                        grad[row] = p - target;
                        hess[row] = (2.0 * p * (1.0 - p)).max(1e-16);
                    }
                    RegressionTree::fit(&binned, &grad, &hess, rows.clone(), features, tree_params)
                })
                .collect();

            for row in 0..n_rows {
                let values = x.row(row);
                for (class, tree) in trees.iter().enumerate() {
                    margins[row * n_classes + class] += tree.predict(values);
                }
            }
            rounds.push(trees);

            if (round + 1) % 25 == 0 {
                tracing::debug!(
                    "Boosting round {}/{} (train logloss {:.4})",
                    round + 1,
                    params.n_estimators,
                    log_loss(&margins, y, n_classes)
                );
            }

            if let Some(budget) = time_budget {
                let elapsed = started.elapsed();
                if elapsed > budget {
                    return Err(EngineError::TrainingTimeout {
                        elapsed_secs: elapsed.as_secs_f64(),
                        rounds_completed: round + 1,
                    });
                }
            }
        }

        tracing::debug!(
            "Fitted {} rounds × {} classes in {:.2?}",
            rounds.len(),
            n_classes,
            started.elapsed()
        );

        Ok(Self {
            params: params.clone(),
            n_classes,
            n_features,
            rounds,
        })
    }

    /// Class probability distribution for one row (sums to 1)
    pub fn predict_proba(&self, row: &[f64]) -> Vec<f64> {
        debug_assert_eq!(row.len(), self.n_features);
        let mut margins = vec![0.0; self.n_classes];
        for trees in &self.rounds {
            for (class, tree) in trees.iter().enumerate() {
                margins[class] += tree.predict(row);
            }
        }

        let mut probs = vec![0.0; self.n_classes];
        softmax_into(&margins, &mut probs);
        probs
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Check every round holds one routable tree per class
    pub fn validate_structure(&self) -> std::result::Result<(), String> {
        for (round, trees) in self.rounds.iter().enumerate() {
            if trees.len() != self.n_classes {
                return Err(format!(
                    "round {} has {} trees for {} classes",
                    round,
                    trees.len(),
                    self.n_classes
                ));
            }
            for (class, tree) in trees.iter().enumerate() {
                tree.validate(self.n_features)
                    .map_err(|reason| format!("round {} class {}: {}", round, class, reason))?;
            }
        }
        Ok(())
    }

    pub fn n_rounds(&self) -> usize {
        self.rounds.len()
    }

    pub fn params(&self) -> &BoosterParams {
        &self.params
    }
}

fn softmax_into(margins: &[f64], out: &mut [f64]) {
    let max = margins.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut total = 0.0;
    for (o, &m) in out.iter_mut().zip(margins) {
        *o = (m - max).exp();
        total += *o;
    }
    for o in out.iter_mut() {
        *o /= total;
    }
}

fn sample_rows(rng: &mut StdRng, n_rows: usize, subsample: f64) -> Vec<usize> {
    if subsample >= 1.0 {
        return (0..n_rows).collect();
    }
    let rows: Vec<usize> = (0..n_rows).filter(|_| rng.gen::<f64>() < subsample).collect();
    if rows.is_empty() {
        (0..n_rows).collect()
    } else {
        rows
    }
}

fn sample_features(rng: &mut StdRng, n_features: usize, colsample: f64) -> Vec<usize> {
    if colsample >= 1.0 {
        return (0..n_features).collect();
    }
    let k = ((colsample * n_features as f64).round() as usize).clamp(1, n_features);
    let mut picked = rand::seq::index::sample(rng, n_features, k).into_vec();
    picked.sort_unstable();
    picked
}

fn log_loss(margins: &[f64], y: &[usize], n_classes: usize) -> f64 {
    let mut probs = vec![0.0; n_classes];
    let total: f64 = y
        .iter()
        .enumerate()
        .map(|(row, &label)| {
            softmax_into(&margins[row * n_classes..(row + 1) * n_classes], &mut probs);
            -probs[label].max(1e-15).ln()
        })
        .sum();
    total / y.len() as f64
}
