//! Gradient-boosted regression trees with leaf-wise growth
//!
//! LightGBM-style booster for a squared-error objective:
//! - Features are pre-binned into at most `max_bin` histogram bins
//! - Trees grow leaf-wise (best-first) up to `max_leaves`
//! - Per-tree row bagging (`subsample`) and feature sampling (`colsample_bytree`)
//! - Seeded RNG, so identical inputs and config give identical models

use crate::error::{DietError, Result};
use super::models::Regressor;
use ndarray::{Array1, Array2, ArrayView1};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostingConfig {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_leaves: usize,
    pub max_depth: Option<usize>,
    pub min_child_samples: usize,
    pub reg_lambda: f64,
    pub subsample: f64,
    pub colsample_bytree: f64,
    pub max_bin: usize,
    pub random_state: u64,
}

impl Default for BoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 800,
            learning_rate: 0.05,
            max_leaves: 63,
            max_depth: None,
            min_child_samples: 20,
            reg_lambda: 0.0,
            subsample: 0.9,
            colsample_bytree: 0.9,
            max_bin: 255,
            random_state: 42,
        }
    }
}

impl BoostingConfig {
    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    pub fn with_max_leaves(mut self, leaves: usize) -> Self {
        self.max_leaves = leaves;
        self
    }

    pub fn with_min_child_samples(mut self, n: usize) -> Self {
        self.min_child_samples = n;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |name: &str, value: String| {
            Err(DietError::ConfigError(format!("Invalid boosting parameter {} = {}", name, value)))
        };
        if self.n_estimators == 0 {
            return invalid("n_estimators", self.n_estimators.to_string());
        }
        if self.max_leaves < 2 {
            return invalid("max_leaves", self.max_leaves.to_string());
        }
        if !(self.learning_rate > 0.0) {
            return invalid("learning_rate", self.learning_rate.to_string());
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return invalid("subsample", self.subsample.to_string());
        }
        if !(self.colsample_bytree > 0.0 && self.colsample_bytree <= 1.0) {
            return invalid("colsample_bytree", self.colsample_bytree.to_string());
        }
        if !(2..=256).contains(&self.max_bin) {
            return invalid("max_bin", self.max_bin.to_string());
        }
        Ok(())
    }
}

// ---- Binning ----

/// Upper bin edges per feature; value `v` falls in bin `#{edge < v}`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BinMapper {
    edges: Vec<f64>,
}

impl BinMapper {
    fn fit(values: ArrayView1<f64>, max_bin: usize) -> Self {
        let mut distinct: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        distinct.sort_by(|a, b| a.total_cmp(b));
        distinct.dedup();

        let edges = if distinct.len() <= max_bin {
            distinct.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect()
        } else {
            let mut edges: Vec<f64> = (1..max_bin)
                .map(|b| {
                    let pos = b * (distinct.len() - 1) / max_bin;
                    (distinct[pos] + distinct[pos + 1]) / 2.0
                })
                .collect();
            edges.dedup();
            edges
        };
        Self { edges }
    }

    fn n_bins(&self) -> usize {
        self.edges.len() + 1
    }

    fn bin(&self, value: f64) -> u8 {
        self.edges.partition_point(|&e| e < value) as u8
    }
}

/// Column-major binned copy of the training matrix
struct BinnedMatrix {
    mappers: Vec<BinMapper>,
    bins: Vec<Vec<u8>>,
}

impl BinnedMatrix {
    fn new(x: &Array2<f64>, max_bin: usize) -> Self {
        let (mappers, bins): (Vec<_>, Vec<_>) = (0..x.ncols())
            .into_par_iter()
            .map(|j| {
                let column = x.column(j);
                let mapper = BinMapper::fit(column, max_bin);
                let bins = column.iter().map(|&v| mapper.bin(v)).collect();
                (mapper, bins)
            })
            .unzip();
        Self { mappers, bins }
    }
}

// ---- Trees ----

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Leaf { value: f64 },
    Split { feature: usize, threshold: f64, left: usize, right: usize },
}

/// Flattened regression tree; node 0 is the root
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn predict(&self, sample: ArrayView1<f64>) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split { feature, threshold, left, right } => {
                    idx = if sample[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

fn leaf_weight(g: f64, h: f64, lambda: f64) -> f64 {
    -g / (h + lambda)
}

fn gain_term(g: f64, h: f64, lambda: f64) -> f64 {
    g * g / (h + lambda)
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    gain: f64,
    feature: usize,
    bin: usize,
}

#[derive(Clone, Copy, Default)]
struct BinStats {
    g: f64,
    h: f64,
    n: usize,
}

struct TreeBuilder<'a> {
    binned: &'a BinnedMatrix,
    gradients: &'a [f64],
    hessians: &'a [f64],
    features: Vec<usize>,
    config: &'a BoostingConfig,
}

impl<'a> TreeBuilder<'a> {
    fn best_split_for_feature(&self, indices: &[usize], feature: usize) -> Option<SplitCandidate> {
        let mapper = &self.binned.mappers[feature];
        let n_bins = mapper.n_bins();
        if n_bins < 2 {
            return None;
        }

        let bins = &self.binned.bins[feature];
        let mut hist = vec![BinStats::default(); n_bins];
        for &i in indices {
            let s = &mut hist[bins[i] as usize];
            s.g += self.gradients[i];
            s.h += self.hessians[i];
            s.n += 1;
        }

        let total = hist.iter().fold(BinStats::default(), |acc, s| BinStats {
            g: acc.g + s.g,
            h: acc.h + s.h,
            n: acc.n + s.n,
        });
        let lambda = self.config.reg_lambda;
        let parent = gain_term(total.g, total.h, lambda);
        let min_child = self.config.min_child_samples.max(1);

        let mut left = BinStats::default();
        let mut best: Option<SplitCandidate> = None;
        for (b, s) in hist.iter().enumerate().take(n_bins - 1) {
            left.g += s.g;
            left.h += s.h;
            left.n += s.n;
            let right_n = total.n - left.n;
            if left.n < min_child || right_n < min_child {
                continue;
            }
            let gain = gain_term(left.g, left.h, lambda)
                + gain_term(total.g - left.g, total.h - left.h, lambda)
                - parent;
            if gain > 0.0 && best.map_or(true, |c| gain > c.gain) {
                best = Some(SplitCandidate { gain, feature, bin: b });
            }
        }
        best
    }

    fn best_split(&self, indices: &[usize]) -> Option<SplitCandidate> {
        if indices.len() < self.config.min_child_samples.max(1) * 2 {
            return None;
        }
        // collect keeps feature order, so ties resolve the same way every run
        let candidates: Vec<Option<SplitCandidate>> = self
            .features
            .par_iter()
            .map(|&f| self.best_split_for_feature(indices, f))
            .collect();
        candidates.into_iter().flatten().fold(None, |best, c| match best {
            Some(b) if b.gain >= c.gain => Some(b),
            _ => Some(c),
        })
    }

    fn partition(&self, indices: &[usize], split: &SplitCandidate) -> (Vec<usize>, Vec<usize>) {
        let bins = &self.binned.bins[split.feature];
        indices.iter().partition(|&&i| (bins[i] as usize) <= split.bin)
    }

    fn leaf(&self, indices: &[usize]) -> Node {
        let g: f64 = indices.iter().map(|&i| self.gradients[i]).sum();
        let h: f64 = indices.iter().map(|&i| self.hessians[i]).sum();
        Node::Leaf { value: leaf_weight(g, h, self.config.reg_lambda) }
    }

    /// Grow one tree best-first; returns the tree and per-feature split gains
    fn build(&self, indices: Vec<usize>, importances: &mut [f64]) -> Tree {
        struct Pending {
            gain: f64,
            node: usize,
            split: SplitCandidate,
        }
        impl PartialEq for Pending {
            fn eq(&self, other: &Self) -> bool { self.gain == other.gain && self.node == other.node }
        }
        impl Eq for Pending {}
        impl PartialOrd for Pending {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
        }
        impl Ord for Pending {
            fn cmp(&self, other: &Self) -> Ordering {
                self.gain
                    .total_cmp(&other.gain)
                    .then_with(|| other.node.cmp(&self.node))
            }
        }

        let max_depth = self.config.max_depth.unwrap_or(usize::MAX);
        let mut members: Vec<Vec<usize>> = vec![indices];
        let mut depths: Vec<usize> = vec![0];
        let mut children: Vec<Option<(SplitCandidate, usize, usize)>> = vec![None];
        let mut heap = BinaryHeap::new();

        if let Some(split) = self.best_split(&members[0]) {
            heap.push(Pending { gain: split.gain, node: 0, split });
        }

        let mut n_leaves = 1;
        while n_leaves < self.config.max_leaves {
            let Some(pending) = heap.pop() else { break };
            if depths[pending.node] >= max_depth {
                continue;
            }

            let (left, right) = self.partition(&members[pending.node], &pending.split);
            let depth = depths[pending.node] + 1;
            let left_id = members.len();
            let right_id = left_id + 1;
            members.push(left);
            members.push(right);
            depths.extend([depth, depth]);
            children.extend([None, None]);
            children[pending.node] = Some((pending.split, left_id, right_id));
            importances[pending.split.feature] += pending.split.gain;
            n_leaves += 1;

            if depth < max_depth {
                for child in [left_id, right_id] {
                    if let Some(split) = self.best_split(&members[child]) {
                        heap.push(Pending { gain: split.gain, node: child, split });
                    }
                }
            }
        }

        let nodes = (0..members.len())
            .map(|id| match children[id] {
                Some((split, left, right)) => Node::Split {
                    feature: split.feature,
                    threshold: self.binned.mappers[split.feature].edges[split.bin],
                    left,
                    right,
                },
                None => self.leaf(&members[id]),
            })
            .collect();
        Tree { nodes }
    }
}

// ============ Regressor ============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostedRegressor {
    pub config: BoostingConfig,
    trees: Vec<Tree>,
    base_prediction: f64,
    n_features: usize,
    importances: Vec<f64>,
}

impl GradientBoostedRegressor {
    pub fn new(config: BoostingConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            base_prediction: 0.0,
            n_features: 0,
            importances: Vec::new(),
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    fn sample_rows(&self, n: usize, rng: &mut Xoshiro256PlusPlus) -> Vec<usize> {
        let mut idx: Vec<usize> = (0..n).collect();
        if self.config.subsample < 1.0 {
            let k = ((n as f64 * self.config.subsample).ceil() as usize).clamp(1, n);
            idx.shuffle(rng);
            idx.truncate(k);
            idx.sort_unstable();
        }
        idx
    }

    fn sample_features(&self, n_features: usize, rng: &mut Xoshiro256PlusPlus) -> Vec<usize> {
        let mut idx: Vec<usize> = (0..n_features).collect();
        if self.config.colsample_bytree < 1.0 {
            let k = ((n_features as f64 * self.config.colsample_bytree).ceil() as usize).clamp(1, n_features);
            idx.shuffle(rng);
            idx.truncate(k);
            idx.sort_unstable();
        }
        idx
    }

    fn predict_one(&self, sample: ArrayView1<f64>) -> f64 {
        self.base_prediction
            + self.trees.iter().map(|t| self.config.learning_rate * t.predict(sample)).sum::<f64>()
    }
}

impl Regressor for GradientBoostedRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.config.validate()?;
        let n = x.nrows();
        if n == 0 {
            return Err(DietError::TrainingError("Empty dataset".into()));
        }
        if n != y.len() {
            return Err(DietError::ShapeError {
                expected: format!("y length = {}", n),
                actual: format!("y length = {}", y.len()),
            });
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(DietError::TrainingError("Non-finite value in training data".into()));
        }

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.random_state);
        let binned = BinnedMatrix::new(x, self.config.max_bin);
        let hessians = vec![1.0; n];

        self.n_features = x.ncols();
        self.importances = vec![0.0; x.ncols()];
        self.trees = Vec::with_capacity(self.config.n_estimators);
        self.base_prediction = y.mean().unwrap_or(0.0);
        let mut predictions = Array1::from_elem(n, self.base_prediction);

        for _ in 0..self.config.n_estimators {
            let gradients: Vec<f64> = predictions.iter().zip(y.iter()).map(|(&p, &yi)| p - yi).collect();
            let rows = self.sample_rows(n, &mut rng);
            let features = self.sample_features(x.ncols(), &mut rng);

            let builder = TreeBuilder {
                binned: &binned,
                gradients: &gradients,
                hessians: &hessians,
                features,
                config: &self.config,
            };
            let tree = builder.build(rows, &mut self.importances);

            for (i, row) in x.rows().into_iter().enumerate() {
                predictions[i] += self.config.learning_rate * tree.predict(row);
            }
            self.trees.push(tree);
        }
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(DietError::ModelNotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(DietError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(x.rows().into_iter().map(|row| self.predict_one(row)).collect())
    }

    fn feature_importances(&self) -> Option<Array1<f64>> {
        let total: f64 = self.importances.iter().sum();
        if self.importances.is_empty() || total <= 0.0 {
            return None;
        }
        Some(self.importances.iter().map(|g| g / total).collect())
    }

    fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

impl GradientBoostedRegressor {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_regression_data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((200, 3), |(i, j)| ((i * (j + 3)) % 97) as f64 / 10.0);
        let y = x.rows().into_iter().map(|r| 3.0 * r[0] - 2.0 * r[1] + 5.0).collect();
        (x, y)
    }

    fn small_config() -> BoostingConfig {
        BoostingConfig::default()
            .with_n_estimators(60)
            .with_max_leaves(8)
            .with_min_child_samples(3)
    }

    #[test]
    fn test_default_profile() {
        let config = BoostingConfig::default();
        assert_eq!(config.n_estimators, 800);
        assert_eq!(config.max_leaves, 63);
        assert_eq!(config.learning_rate, 0.05);
        assert_eq!(config.subsample, 0.9);
        assert_eq!(config.colsample_bytree, 0.9);
        assert_eq!(config.random_state, 42);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_fit_reduces_error() {
        let (x, y) = make_regression_data();
        let mut model = GradientBoostedRegressor::new(small_config());
        model.fit(&x, &y).unwrap();
        let preds = model.predict(&x).unwrap();

        let mean = y.mean().unwrap();
        let baseline: f64 = y.iter().map(|v| (v - mean).powi(2)).sum();
        let residual: f64 = preds.iter().zip(y.iter()).map(|(p, t)| (p - t).powi(2)).sum();
        assert_eq!(model.n_trees(), 60);
        assert!(residual < baseline * 0.2, "residual {} vs baseline {}", residual, baseline);
    }

    #[test]
    fn test_seeded_fit_is_deterministic() {
        let (x, y) = make_regression_data();
        let mut a = GradientBoostedRegressor::new(small_config());
        let mut b = GradientBoostedRegressor::new(small_config());
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let model = GradientBoostedRegressor::new(small_config());
        assert!(matches!(model.predict(&Array2::zeros((1, 3))), Err(DietError::ModelNotFitted)));
    }

    #[test]
    fn test_wrong_feature_count() {
        let (x, y) = make_regression_data();
        let mut model = GradientBoostedRegressor::new(small_config().with_n_estimators(5));
        model.fit(&x, &y).unwrap();
        assert!(model.predict(&Array2::zeros((1, 2))).is_err());
    }

    #[test]
    fn test_bytes_roundtrip_preserves_predictions() {
        let (x, y) = make_regression_data();
        let mut model = GradientBoostedRegressor::new(small_config().with_n_estimators(10));
        model.fit(&x, &y).unwrap();
        let restored = GradientBoostedRegressor::from_bytes(&model.to_bytes().unwrap()).unwrap();
        assert_eq!(restored.predict(&x).unwrap(), model.predict(&x).unwrap());
    }

    #[test]
    fn test_importances_favor_informative_feature() {
        let (x, y) = make_regression_data();
        let mut model = GradientBoostedRegressor::new(small_config());
        model.fit(&x, &y).unwrap();
        let imp = model.feature_importances().unwrap();
        assert!((imp.sum() - 1.0).abs() < 1e-9);
        assert!(imp[0] > imp[2]);
    }

    #[test]
    fn test_bin_mapper_threshold_consistency() {
        let values = Array1::from_vec(vec![1.0, 2.0, 2.0, 3.0, 10.0]);
        let mapper = BinMapper::fit(values.view(), 255);
        assert_eq!(mapper.n_bins(), 4);
        for (b, edge) in mapper.edges.iter().enumerate() {
            for &v in values.iter() {
                assert_eq!(v <= *edge, (mapper.bin(v) as usize) <= b);
            }
        }
    }
}
