//! Bagged ensemble of decision trees
//!
//! Bootstrap row sampling plus per-split feature subsampling; predicted
//! probabilities are the average of the per-tree leaf distributions, so
//! output classes are exactly the label set observed in training.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::tree::{grow_tree, DecisionTree, TreeParams};

/// Ensemble shape and determinism knobs
#[derive(Debug, Clone)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 200,
            max_depth: 16,
            min_samples_split: 2,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestClassifier {
    trees: Vec<DecisionTree>,
    n_classes: usize,
}

impl ForestClassifier {
    /// Fit the ensemble. `labels` are dense class ids in `0..n_classes`.
    pub fn fit(
        rows: &[Vec<f64>],
        labels: &[usize],
        n_classes: usize,
        params: &ForestParams,
    ) -> Self {
        let tree_params = TreeParams {
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split,
            feature_candidates: 0,
        };
        let mut trees = Vec::with_capacity(params.n_trees);
        for t in 0..params.n_trees {
            let mut rng = SmallRng::seed_from_u64(params.seed.wrapping_add(t as u64));
            let sample: Vec<usize> = (0..rows.len())
                .map(|_| rng.random_range(0..rows.len()))
                .collect();
            trees.push(grow_tree(
                rows,
                labels,
                &sample,
                n_classes,
                &tree_params,
                &mut rng,
            ));
        }
        debug!(trees = trees.len(), n_classes, "forest fitted");
        Self { trees, n_classes }
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Averaged class distribution across all trees
    pub fn predict_proba(&self, row: &[f64]) -> Vec<f64> {
        let mut probs = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (acc, p) in probs.iter_mut().zip(tree.predict_proba(row)) {
                *acc += p;
            }
        }
        let n = self.trees.len().max(1) as f64;
        for p in &mut probs {
            *p /= n;
        }
        probs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_class_data() -> (Vec<Vec<f64>>, Vec<usize>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..30 {
            let class = i % 3;
            rows.push(vec![class as f64 * 10.0 + (i % 5) as f64, (i % 2) as f64]);
            labels.push(class);
        }
        (rows, labels)
    }

    fn small_params() -> ForestParams {
        ForestParams {
            n_trees: 25,
            ..ForestParams::default()
        }
    }

    #[test]
    fn separates_three_classes() {
        let (rows, labels) = three_class_data();
        let forest = ForestClassifier::fit(&rows, &labels, 3, &small_params());

        let probs = forest.predict_proba(&[1.0, 0.0]);
        assert_eq!(probs.len(), 3);
        assert!(probs[0] > probs[1] && probs[0] > probs[2]);

        let probs = forest.predict_proba(&[22.0, 0.0]);
        assert!(probs[2] > probs[0] && probs[2] > probs[1]);
    }

    #[test]
    fn probabilities_sum_to_one() {
        let (rows, labels) = three_class_data();
        let forest = ForestClassifier::fit(&rows, &labels, 3, &small_params());
        let probs = forest.predict_proba(&[11.0, 1.0]);
        assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn same_seed_same_forest() {
        let (rows, labels) = three_class_data();
        let a = ForestClassifier::fit(&rows, &labels, 3, &small_params());
        let b = ForestClassifier::fit(&rows, &labels, 3, &small_params());
        let row = vec![12.0, 1.0];
        assert_eq!(a.predict_proba(&row), b.predict_proba(&row));
    }
}
