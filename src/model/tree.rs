//! Regression Tree Weak Learner
//!
//! Second-order (gradient + hessian) regression tree grown depth-first on pre-binned
//! features, as used by XGBoost-style boosting.
//!
//! **Split search**: every feature is quantised once into at most `max_bins` bins
//! (`BinnedFeatures`). Each node builds a per-bin (G, H) histogram and scans the bin
//! boundaries left to right. Gain of a split:
//!
//! ```text
//! gain = G_L² / (H_L + λ) + G_R² / (H_R + λ) - G² / (H + λ)
//! ```
//!
//! Leaf weight = `-G / (H + λ) × learning_rate` (shrinkage is baked into the leaves).
//!
//! **Routing**: a row goes right when `value >= threshold`, left otherwise. NaN therefore
//! always goes left, and NaN is binned into bin 0, so training and prediction agree.

use crate::model::FeatureMatrix;
use serde::{Deserialize, Serialize};

/// Per-feature bin boundaries plus the bin index of every training row
#[derive(Debug, Clone)]
pub struct BinnedFeatures {
    /// `cuts[f]` is strictly increasing; bin `b` covers `[cuts[b-1], cuts[b])`
    cuts: Vec<Vec<f64>>,
    /// `bins[f][row]`
    bins: Vec<Vec<u16>>,
}

impl BinnedFeatures {
    pub fn build(x: &FeatureMatrix, max_bins: usize) -> Self {
        let mut cuts = Vec::with_capacity(x.n_features());
        let mut bins = Vec::with_capacity(x.n_features());

        for feature in 0..x.n_features() {
            let column = x.column(feature);
            let feature_cuts = compute_cuts(&column, max_bins);
            let feature_bins = column
                .iter()
                .map(|&value| bin_index(&feature_cuts, value))
                .collect();
            cuts.push(feature_cuts);
            bins.push(feature_bins);
        }

        Self { cuts, bins }
    }

    #[inline]
    fn bin(&self, feature: usize, row: usize) -> usize {
        self.bins[feature][row] as usize
    }

    fn n_cuts(&self, feature: usize) -> usize {
        self.cuts[feature].len()
    }
}

/// Candidate thresholds for one column: midpoints between distinct values, thinned to
/// roughly equal-frequency boundaries when there are more distinct values than bins.
fn compute_cuts(column: &[f64], max_bins: usize) -> Vec<f64> {
    let mut unique: Vec<f64> = column.iter().copied().filter(|v| !v.is_nan()).collect();
    unique.sort_by(|a, b| a.total_cmp(b));
    unique.dedup();

    if unique.len() < 2 {
        return Vec::new();
    }

    let midpoint = |j: usize| (unique[j - 1] + unique[j]) / 2.0;

    let mut cuts: Vec<f64> = if unique.len() <= max_bins {
        (1..unique.len()).map(midpoint).collect()
    } else {
        (1..max_bins)
            .map(|i| i * unique.len() / max_bins)
            .filter(|&j| j >= 1)
            .map(midpoint)
            .collect()
    };
    cuts.dedup();
    cuts
}

#[inline]
fn bin_index(cuts: &[f64], value: f64) -> u16 {
    cuts.partition_point(|&cut| cut <= value) as u16
}

/// Tree growth settings, derived from the booster parameters
#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub max_depth: usize,
    pub learning_rate: f64,
    pub lambda: f64,
    pub min_child_weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Fitted regression tree stored as a flat node arena (root at index 0)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<TreeNode>,
}

struct SplitCandidate {
    feature: usize,
    bin: usize,
    gain: f64,
}

struct GrowContext<'a> {
    binned: &'a BinnedFeatures,
    grad: &'a [f64],
    hess: &'a [f64],
    features: &'a [usize],
    params: TreeParams,
}

impl RegressionTree {
    /// Fit a tree to per-row gradients/hessians over the given row and feature subsets
    pub fn fit(
        binned: &BinnedFeatures,
        grad: &[f64],
        hess: &[f64],
        rows: Vec<usize>,
        features: &[usize],
        params: TreeParams,
    ) -> Self {
        let ctx = GrowContext {
            binned,
            grad,
            hess,
            features,
            params,
        };

        let mut tree = RegressionTree { nodes: Vec::new() };
        tree.grow(&ctx, rows, 0);
        tree
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] >= *threshold { *right } else { *left };
                }
            }
        }
    }

    /// Check the node arena is routable for rows of `n_features` values
    ///
    /// Children always sit after their parent in a fitted tree, which also rules out cycles.
    pub fn validate(&self, n_features: usize) -> std::result::Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                left,
                right,
                ..
            } = node
            {
                if *feature >= n_features {
                    return Err(format!(
                        "node {} splits on feature {} of {}",
                        idx, feature, n_features
                    ));
                }
                for &child in [left, right] {
                    if child <= idx || child >= self.nodes.len() {
                        return Err(format!(
                            "node {} points to child {} ({} nodes)",
                            idx,
                            child,
                            self.nodes.len()
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, TreeNode::Leaf { .. }))
            .count()
    }

    pub fn depth(&self) -> usize {
        self.depth_from(0)
    }

    fn depth_from(&self, idx: usize) -> usize {
        match &self.nodes[idx] {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Split { left, right, .. } => {
                1 + self.depth_from(*left).max(self.depth_from(*right))
            }
        }
    }

    fn grow(&mut self, ctx: &GrowContext<'_>, rows: Vec<usize>, depth: usize) -> usize {
        let (g, h) = rows.iter().fold((0.0, 0.0), |(g, h), &row| {
            (g + ctx.grad[row], h + ctx.hess[row])
        });

        let idx = self.nodes.len();
        self.nodes.push(TreeNode::Leaf {
            value: leaf_weight(g, h, &ctx.params),
        });

        if depth >= ctx.params.max_depth || rows.len() < 2 {
            return idx;
        }

        let Some(split) = best_split(ctx, &rows, g, h) else {
            return idx;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&row| ctx.binned.bin(split.feature, row) <= split.bin);

        let left = self.grow(ctx, left_rows, depth + 1);
        let right = self.grow(ctx, right_rows, depth + 1);

        self.nodes[idx] = TreeNode::Split {
            feature: split.feature,
            threshold: ctx.binned.cuts[split.feature][split.bin],
            left,
            right,
        };
        idx
    }
}

fn leaf_weight(g: f64, h: f64, params: &TreeParams) -> f64 {
    -g / (h + params.lambda) * params.learning_rate
}

fn best_split(ctx: &GrowContext<'_>, rows: &[usize], g: f64, h: f64) -> Option<SplitCandidate> {
    let lambda = ctx.params.lambda;
    let min_child = ctx.params.min_child_weight;
    let parent_score = g * g / (h + lambda);

    let mut best: Option<SplitCandidate> = None;

    for &feature in ctx.features {
        let n_cuts = ctx.binned.n_cuts(feature);
        if n_cuts == 0 {
            continue;
        }

        let mut hist = vec![(0.0_f64, 0.0_f64); n_cuts + 1];
        for &row in rows {
            let slot = &mut hist[ctx.binned.bin(feature, row)];
            slot.0 += ctx.grad[row];
            slot.1 += ctx.hess[row];
        }

        let (mut gl, mut hl) = (0.0, 0.0);
        for (bin, &(bg, bh)) in hist.iter().enumerate().take(n_cuts) {
            gl += bg;
            hl += bh;
            let (gr, hr) = (g - gl, h - hl);
            if hl < min_child || hr < min_child {
                continue;
            }

            let gain = gl * gl / (hl + lambda) + gr * gr / (hr + lambda) - parent_score;
            // Strict comparison keeps the first (lowest feature, lowest bin) among equal gains
            if gain > 1e-12 && best.as_ref().map_or(true, |b| gain > b.gain) {
                best = Some(SplitCandidate { feature, bin, gain });
            }
        }
    }

    best
}
