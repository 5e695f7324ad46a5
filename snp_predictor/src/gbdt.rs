//! gbdt.rs – gradient boosted regression trees for a binary log-loss target
//!
//! Each round fits a depth-bounded regression tree to the residuals `y - p`
//! of the current ensemble by squared-error split search, then replaces every
//! leaf with its Newton step `Σr / Σp(1-p)`. No row or column subsampling is
//! done, so a fit is fully determined by its inputs.

use log::{debug, info};
use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::{PredictorError, Result};

const MIN_HESSIAN: f64 = 1e-8;
const PROBABILITY_CLAMP: f64 = 1e-8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostingParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
}

impl Default for BoostingParams {
    fn default() -> Self {
        BoostingParams {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 6,
            min_samples_leaf: 1,
        }
    }
}

impl BoostingParams {
    fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(PredictorError::InvalidInput("n_estimators must be > 0".into()));
        }
        if self.max_depth == 0 {
            return Err(PredictorError::InvalidInput("max_depth must be > 0".into()));
        }
        if !(self.learning_rate > 0.0) {
            return Err(PredictorError::InvalidInput("learning_rate must be > 0".into()));
        }
        Ok(())
    }
}

// ───────── trees ─────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        /// reduction in residual sum of squares, used for importance
        gain: f64,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    fn predict(&self, sample: ArrayView1<f64>) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split { feature, threshold, left, right, .. } => {
                    idx = if sample[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Children always point forward, so a well-formed tree cannot loop.
    fn is_well_formed(&self, n_features: usize) -> bool {
        !self.nodes.is_empty()
            && self.nodes.iter().enumerate().all(|(idx, node)| match node {
                Node::Leaf { value } => value.is_finite(),
                Node::Split { feature, threshold, left, right, .. } => {
                    *feature < n_features
                        && !threshold.is_nan()
                        && (idx + 1..self.nodes.len()).contains(left)
                        && (idx + 1..self.nodes.len()).contains(right)
                }
            })
    }
}

struct TreeBuilder<'x, 'g> {
    x: ArrayView2<'x, f64>,
    residuals: &'g [f64],
    hessians: &'g [f64],
    max_depth: usize,
    min_samples_leaf: usize,
    nodes: Vec<Node>,
}

impl TreeBuilder<'_, '_> {
    fn newton_leaf(&mut self, indices: &[usize]) -> usize {
        let sum_r: f64 = indices.iter().map(|&i| self.residuals[i]).sum();
        let sum_h: f64 = indices.iter().map(|&i| self.hessians[i]).sum();
        let value = if sum_h > 0.0 { sum_r / sum_h } else { 0.0 };
        self.nodes.push(Node::Leaf { value });
        self.nodes.len() - 1
    }

    fn build(&mut self, indices: Vec<usize>, depth: usize) -> usize {
        if depth >= self.max_depth || indices.len() < 2 || indices.len() <= self.min_samples_leaf {
            return self.newton_leaf(&indices);
        }

        let Some((feature, threshold, gain)) = self.best_split(&indices) else {
            return self.newton_leaf(&indices);
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) =
            indices.iter().copied().partition(|&i| self.x[[i, feature]] <= threshold);
        if left_idx.is_empty() || right_idx.is_empty() {
            return self.newton_leaf(&indices);
        }

        let node = self.nodes.len();
        self.nodes.push(Node::Leaf { value: 0.0 }); // placeholder
        let left = self.build(left_idx, depth + 1);
        let right = self.build(right_idx, depth + 1);
        self.nodes[node] = Node::Split { feature, threshold, left, right, gain };
        node
    }

    /// Best (feature, threshold, gain) by residual sum-of-squares reduction.
    fn best_split(&self, indices: &[usize]) -> Option<(usize, f64, f64)> {
        let n = indices.len();
        let total_sum: f64 = indices.iter().map(|&i| self.residuals[i]).sum();
        let parent_score = total_sum * total_sum / n as f64;

        let mut best: Option<(usize, f64, f64)> = None;
        let mut best_gain = 1e-12;

        for feature in 0..self.x.ncols() {
            let mut pairs: Vec<(f64, f64)> = indices
                .iter()
                .map(|&i| (self.x[[i, feature]], self.residuals[i]))
                .collect();
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_sum = 0.0;
            for k in 0..n - 1 {
                left_sum += pairs[k].1;
                let left_count = k + 1;
                let right_count = n - left_count;

                // no threshold separates equal values
                if pairs[k].0 == pairs[k + 1].0 {
                    continue;
                }
                if left_count < self.min_samples_leaf || right_count < self.min_samples_leaf {
                    continue;
                }

                let right_sum = total_sum - left_sum;
                let gain = left_sum * left_sum / left_count as f64
                    + right_sum * right_sum / right_count as f64
                    - parent_score;

                if gain > best_gain {
                    best_gain = gain;
                    best = Some((feature, (pairs[k].0 + pairs[k + 1].0) / 2.0, gain));
                }
            }
        }
        best
    }
}

// ───────── ensemble ─────────

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn log_loss(label: bool, p: f64) -> f64 {
    let p = p.clamp(1e-15, 1.0 - 1e-15);
    if label { -p.ln() } else { -(1.0 - p).ln() }
}

/// Additive ensemble of regression trees over log-odds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedTrees {
    n_features: usize,
    /// Initial log-odds, F_0
    base_score: f64,
    learning_rate: f64,
    trees: Vec<RegressionTree>,
}

impl GradientBoostedTrees {
    /// Fit on `x` (one row per sample) against boolean labels.
    pub fn fit(x: ArrayView2<f64>, y: ArrayView1<bool>, params: &BoostingParams) -> Result<Self> {
        params.validate()?;
        let (n_samples, n_features) = x.dim();
        if n_samples == 0 || n_features == 0 {
            return Err(PredictorError::InvalidInput("cannot fit on an empty training set".into()));
        }
        if y.len() != n_samples {
            return Err(PredictorError::InvalidInput(format!(
                "{} labels for {} samples",
                y.len(),
                n_samples
            )));
        }

        let positives = y.iter().filter(|&&l| l).count();
        let p0 = (positives as f64 / n_samples as f64).clamp(PROBABILITY_CLAMP, 1.0 - PROBABILITY_CLAMP);
        let base_score = (p0 / (1.0 - p0)).ln();
        info!(
            "Boosting {} trees (depth ≤ {}) on {} samples, {} positive",
            params.n_estimators, params.max_depth, n_samples, positives
        );

        let mut raw = vec![base_score; n_samples];
        let mut residuals = vec![0.0; n_samples];
        let mut hessians = vec![0.0; n_samples];
        let mut trees = Vec::with_capacity(params.n_estimators);

        for round in 0..params.n_estimators {
            for i in 0..n_samples {
                let p = sigmoid(raw[i]);
                residuals[i] = if y[i] { 1.0 - p } else { -p };
                hessians[i] = (p * (1.0 - p)).max(MIN_HESSIAN);
            }

            let mut builder = TreeBuilder {
                x,
                residuals: &residuals,
                hessians: &hessians,
                max_depth: params.max_depth,
                min_samples_leaf: params.min_samples_leaf.max(1),
                nodes: Vec::new(),
            };
            builder.build((0..n_samples).collect(), 0);
            let tree = RegressionTree { nodes: builder.nodes };

            for (i, f) in raw.iter_mut().enumerate() {
                *f += params.learning_rate * tree.predict(x.row(i));
            }
            trees.push(tree);

            if (round + 1) % 10 == 0 || round + 1 == params.n_estimators {
                let loss = raw
                    .iter()
                    .zip(y.iter())
                    .map(|(&f, &l)| log_loss(l, sigmoid(f)))
                    .sum::<f64>()
                    / n_samples as f64;
                debug!("round {:>4}: train log-loss {:.6}", round + 1, loss);
            }
        }

        Ok(GradientBoostedTrees {
            n_features,
            base_score,
            learning_rate: params.learning_rate,
            trees,
        })
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Structural sanity of a deserialized ensemble: every split refers to an
    /// existing feature and child node.
    pub fn is_well_formed(&self) -> bool {
        self.n_features > 0
            && self.base_score.is_finite()
            && self.learning_rate > 0.0
            && self.trees.iter().all(|tree| tree.is_well_formed(self.n_features))
    }

    /// Raw log-odds score.
    ///
    /// Panics if `sample` does not have the training dimensionality; feeding
    /// features in a different layout is a caller bug, not a data condition.
    pub fn decision_function(&self, sample: &[f64]) -> f64 {
        assert_eq!(
            sample.len(),
            self.n_features,
            "sample has {} features, ensemble was trained on {}",
            sample.len(),
            self.n_features
        );
        let row = ArrayView1::from(sample);
        self.base_score
            + self
                .trees
                .iter()
                .map(|tree| self.learning_rate * tree.predict(row))
                .sum::<f64>()
    }

    /// Probability of the positive class.
    pub fn predict_proba(&self, sample: &[f64]) -> f64 {
        sigmoid(self.decision_function(sample))
    }

    /// Split gain per feature, normalised to sum to 1 (all zeros for a stump-free ensemble).
    pub fn feature_importance(&self) -> Vec<f64> {
        let mut importance = vec![0.0; self.n_features];
        for tree in &self.trees {
            for node in &tree.nodes {
                if let Node::Split { feature, gain, .. } = node {
                    importance[*feature] += gain;
                }
            }
        }
        let total: f64 = importance.iter().sum();
        if total > 0.0 {
            importance.iter_mut().for_each(|v| *v /= total);
        }
        importance
    }
}
