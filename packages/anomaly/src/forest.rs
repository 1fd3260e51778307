//! Seeded isolation forest.
//!
//! Each tree is grown on a random subsample by repeatedly picking a random
//! non-constant feature and a split point uniformly between that feature's
//! min and max at the node. Outliers are isolated in fewer splits, so a
//! short average path length means an anomalous row.
//!
//! Scores follow the usual normalization: `s(x) = -2^(-E[h(x)] / c(ψ))`
//! where `ψ` is the subsample size and `c` the average unsuccessful-search
//! path length of a binary search tree. The decision offset is the
//! `contamination` percentile of the training scores, so roughly that
//! fraction of the training rows ends up below zero.

use rand::seq::index;
use rand::{Rng as _, SeedableRng as _};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::AnomalyError;

/// Euler-Mascheroni constant, used in the harmonic number approximation.
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Model hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    /// Number of trees.
    pub n_estimators: usize,
    /// Upper bound on rows drawn (without replacement) for each tree.
    pub max_samples: usize,
    /// Expected fraction of anomalies, in `(0, 0.5]`.
    pub contamination: f64,
    /// RNG seed. Identical data and seed give identical scores.
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_samples: 256,
            contamination: 0.01,
            seed: 42,
        }
    }
}

impl ForestParams {
    /// Checks that every parameter is in range.
    ///
    /// # Errors
    ///
    /// Returns [`AnomalyError::InvalidParameter`] naming the first bad
    /// parameter.
    pub fn validate(&self) -> Result<(), AnomalyError> {
        if self.n_estimators == 0 {
            return Err(AnomalyError::InvalidParameter {
                name: "n_estimators",
                message: "must be at least 1".to_string(),
            });
        }
        if self.max_samples == 0 {
            return Err(AnomalyError::InvalidParameter {
                name: "max_samples",
                message: "must be at least 1".to_string(),
            });
        }
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(AnomalyError::InvalidParameter {
                name: "contamination",
                message: format!("{} is outside (0, 0.5]", self.contamination),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone)]
struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    fn grow(data: &[Vec<f64>], rows: Vec<usize>, max_depth: usize, rng: &mut ChaCha8Rng) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow_node(data, rows, 0, max_depth, rng);
        tree
    }

    fn grow_node(
        &mut self,
        data: &[Vec<f64>],
        rows: Vec<usize>,
        depth: usize,
        max_depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(Node::Leaf { size: rows.len() });

        if depth >= max_depth || rows.len() <= 1 {
            return idx;
        }

        let width = data[rows[0]].len();
        let candidates: Vec<(usize, f64, f64)> = (0..width)
            .filter_map(|feature| {
                let (lo, hi) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |acc, &r| {
                    let v = data[r][feature];
                    (acc.0.min(v), acc.1.max(v))
                });
                (hi > lo).then_some((feature, lo, hi))
            })
            .collect();

        if candidates.is_empty() {
            return idx;
        }

        let (feature, lo, hi) = candidates[rng.gen_range(0..candidates.len())];
        let threshold = rng.gen_range(lo..hi);
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&r| data[r][feature] <= threshold);

        let left = self.grow_node(data, left_rows, depth + 1, max_depth, rng);
        let right = self.grow_node(data, right_rows, depth + 1, max_depth, rng);
        self.nodes[idx] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        idx
    }

    fn path_length(&self, x: &[f64]) -> f64 {
        let mut node = 0;
        let mut depth = 0.0;
        loop {
            match &self.nodes[node] {
                Node::Leaf { size } => return depth + average_path_length(*size),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if x[*feature] <= *threshold { *left } else { *right };
                    depth += 1.0;
                }
            }
        }
    }
}

/// Average path length of an unsuccessful binary-search-tree lookup over
/// `n` items. Used both to normalize scores and to credit the unexpanded
/// depth of a leaf holding more than one row.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0f64.mul_add((n - 1.0).ln() + EULER_GAMMA, -(2.0 * (n - 1.0) / n))
        }
    }
}

/// A fitted isolation forest.
#[derive(Debug, Clone)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    subsample_size: usize,
    offset: f64,
}

impl IsolationForest {
    /// Grows the forest on `data` and calibrates the decision offset.
    ///
    /// # Errors
    ///
    /// Returns [`AnomalyError`] if the parameters are out of range, the
    /// matrix is empty, or its rows differ in width.
    pub fn fit(data: &[Vec<f64>], params: &ForestParams) -> Result<Self, AnomalyError> {
        params.validate()?;
        crate::matrix_width(data)?;

        let n = data.len();
        let subsample_size = params.max_samples.min(n);
        let max_depth = max_depth_for(subsample_size);
        let mut rng = ChaCha8Rng::seed_from_u64(params.seed);

        log::debug!(
            "Growing {} isolation trees on {subsample_size}/{n} rows (depth limit {max_depth})",
            params.n_estimators
        );

        let trees = (0..params.n_estimators)
            .map(|_| {
                let rows = index::sample(&mut rng, n, subsample_size).into_vec();
                IsolationTree::grow(data, rows, max_depth, &mut rng)
            })
            .collect();

        let mut forest = Self {
            trees,
            subsample_size,
            offset: 0.0,
        };

        let training_scores = forest.score_samples(data);
        forest.offset = percentile(&training_scores, params.contamination);
        log::debug!("Decision offset: {:.6}", forest.offset);

        Ok(forest)
    }

    /// Raw anomaly scores in `[-1, 0)`. Lower is more anomalous.
    #[must_use]
    pub fn score_samples(&self, data: &[Vec<f64>]) -> Vec<f64> {
        let normalizer = average_path_length(self.subsample_size).max(1.0);
        #[allow(clippy::cast_precision_loss)]
        let n_trees = self.trees.len() as f64;

        data.iter()
            .map(|x| {
                let mean_depth =
                    self.trees.iter().map(|t| t.path_length(x)).sum::<f64>() / n_trees;
                -(2.0f64.powf(-mean_depth / normalizer))
            })
            .collect()
    }

    /// Scores shifted by the calibrated offset. Negative means anomalous;
    /// more negative means more anomalous.
    #[must_use]
    pub fn decision_function(&self, data: &[Vec<f64>]) -> Vec<f64> {
        self.score_samples(data)
            .into_iter()
            .map(|s| s - self.offset)
            .collect()
    }

    /// The calibrated decision offset.
    #[must_use]
    pub const fn offset(&self) -> f64 {
        self.offset
    }
}

fn max_depth_for(subsample_size: usize) -> usize {
    let mut depth = 0;
    while (1usize << depth) < subsample_size.max(2) {
        depth += 1;
    }
    depth
}

/// Linear-interpolation percentile of unsorted values, `q` in `[0, 1]`.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    (sorted[hi] - sorted[lo]).mul_add(pos - lo as f64, sorted[lo])
}
