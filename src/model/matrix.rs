//! Dense row-major feature matrix

/// Row-major `n_rows × n_features` matrix of f64 feature values
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    values: Vec<f64>,
    n_features: usize,
}

impl FeatureMatrix {
    /// Wrap row-major values. `values.len()` must be a multiple of `n_features`.
    pub fn new(values: Vec<f64>, n_features: usize) -> Self {
        assert!(n_features > 0, "feature matrix needs at least one column");
        assert_eq!(values.len() % n_features, 0, "ragged feature matrix");
        Self { values, n_features }
    }

    pub fn n_rows(&self) -> usize {
        self.values.len() / self.n_features
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn row(&self, idx: usize) -> &[f64] {
        let start = idx * self.n_features;
        &self.values[start..start + self.n_features]
    }

    pub fn value(&self, row: usize, feature: usize) -> f64 {
        self.values[row * self.n_features + feature]
    }

    /// Copy of one column
    pub fn column(&self, feature: usize) -> Vec<f64> {
        (0..self.n_rows()).map(|row| self.value(row, feature)).collect()
    }
}
