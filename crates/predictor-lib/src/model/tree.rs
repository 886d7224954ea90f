//! CART decision trees over dense feature rows
//!
//! Gini-impurity splits with per-node feature subsampling, built for use
//! inside a bagged ensemble. Leaves store the class distribution of their
//! training rows so the ensemble can average probabilities.

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Node {
    Leaf {
        probs: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Node,
    n_classes: usize,
}

impl DecisionTree {
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Class distribution at the leaf this row falls into
    pub fn predict_proba(&self, row: &[f64]) -> &[f64] {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { probs } => return probs,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row.get(*feature).copied().unwrap_or(0.0) <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

/// Growth limits and subsampling behavior for a single tree
#[derive(Debug, Clone)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    /// Features considered per split; 0 means sqrt of the feature count
    pub feature_candidates: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: 16,
            min_samples_split: 2,
            feature_candidates: 0,
        }
    }
}

/// Grow one tree over the given sample indices.
///
/// `rows` is the full row-major feature matrix; `indices` selects the
/// (possibly bootstrapped, possibly repeated) training sample.
pub fn grow_tree(
    rows: &[Vec<f64>],
    labels: &[usize],
    indices: &[usize],
    n_classes: usize,
    params: &TreeParams,
    rng: &mut SmallRng,
) -> DecisionTree {
    let n_features = rows.first().map(Vec::len).unwrap_or(0);
    let candidates = if params.feature_candidates == 0 {
        ((n_features as f64).sqrt().ceil() as usize).max(1)
    } else {
        params.feature_candidates.min(n_features.max(1))
    };
    let mut builder = TreeBuilder {
        rows,
        labels,
        n_classes,
        params,
        candidates,
        features: (0..n_features).collect(),
        rng,
    };
    let root = builder.build(indices, 0);
    DecisionTree { root, n_classes }
}

struct TreeBuilder<'a> {
    rows: &'a [Vec<f64>],
    labels: &'a [usize],
    n_classes: usize,
    params: &'a TreeParams,
    candidates: usize,
    features: Vec<usize>,
    rng: &'a mut SmallRng,
}

impl TreeBuilder<'_> {
    fn build(&mut self, indices: &[usize], depth: usize) -> Node {
        let counts = self.class_counts(indices);
        if depth >= self.params.max_depth
            || indices.len() < self.params.min_samples_split
            || is_pure(&counts)
        {
            return leaf(&counts, indices.len());
        }

        let Some((feature, threshold)) = self.best_split(indices, &counts) else {
            return leaf(&counts, indices.len());
        };

        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| self.rows[i][feature] <= threshold);
        if left.is_empty() || right.is_empty() {
            return leaf(&counts, indices.len());
        }

        Node::Split {
            feature,
            threshold,
            left: Box::new(self.build(&left, depth + 1)),
            right: Box::new(self.build(&right, depth + 1)),
        }
    }

    fn class_counts(&self, indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &i in indices {
            counts[self.labels[i]] += 1;
        }
        counts
    }

    /// Best (feature, threshold) among a random feature subset, by
    /// weighted gini of the induced partition
    fn best_split(&mut self, indices: &[usize], parent_counts: &[usize]) -> Option<(usize, f64)> {
        let parent_gini = gini(parent_counts, indices.len());
        self.features.shuffle(self.rng);
        let picked: Vec<usize> = self.features.iter().copied().take(self.candidates).collect();

        let mut best: Option<(usize, f64, f64)> = None;
        for feature in picked {
            // Sweep sorted values, moving counts from right to left.
            let mut order: Vec<usize> = indices.to_vec();
            order.sort_by(|&a, &b| {
                self.rows[a][feature]
                    .partial_cmp(&self.rows[b][feature])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            let mut left_counts = vec![0usize; self.n_classes];
            let mut right_counts = parent_counts.to_vec();
            for window in 0..order.len() - 1 {
                let moved = order[window];
                left_counts[self.labels[moved]] += 1;
                right_counts[self.labels[moved]] -= 1;

                let current = self.rows[moved][feature];
                let next = self.rows[order[window + 1]][feature];
                if next <= current {
                    continue;
                }

                let n_left = window + 1;
                let n_right = order.len() - n_left;
                let weighted = (n_left as f64 * gini(&left_counts, n_left)
                    + n_right as f64 * gini(&right_counts, n_right))
                    / order.len() as f64;
                if weighted + 1e-12 < best.map(|(_, _, g)| g).unwrap_or(parent_gini) {
                    best = Some((feature, (current + next) / 2.0, weighted));
                }
            }
        }
        best.map(|(feature, threshold, _)| (feature, threshold))
    }
}

fn is_pure(counts: &[usize]) -> bool {
    counts.iter().filter(|&&c| c > 0).count() <= 1
}

fn leaf(counts: &[usize], total: usize) -> Node {
    let total = total.max(1) as f64;
    Node::Leaf {
        probs: counts.iter().map(|&c| c as f64 / total).collect(),
    }
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn separable() -> (Vec<Vec<f64>>, Vec<usize>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..20 {
            rows.push(vec![i as f64, (i % 3) as f64]);
            labels.push(usize::from(i >= 10));
        }
        (rows, labels)
    }

    #[test]
    fn learns_a_threshold_on_separable_data() {
        let (rows, labels) = separable();
        let indices: Vec<usize> = (0..rows.len()).collect();
        let mut rng = SmallRng::seed_from_u64(1);
        let params = TreeParams {
            feature_candidates: 2,
            ..TreeParams::default()
        };
        let tree = grow_tree(&rows, &labels, &indices, 2, &params, &mut rng);

        assert!(tree.predict_proba(&[2.0, 0.0])[0] > 0.9);
        assert!(tree.predict_proba(&[18.0, 0.0])[1] > 0.9);
    }

    #[test]
    fn pure_node_becomes_a_leaf() {
        let rows = vec![vec![0.0], vec![1.0], vec![2.0]];
        let labels = vec![0, 0, 0];
        let indices = vec![0, 1, 2];
        let mut rng = SmallRng::seed_from_u64(1);
        let tree = grow_tree(&rows, &labels, &indices, 2, &TreeParams::default(), &mut rng);
        assert_eq!(tree.predict_proba(&[1.5]), &[1.0, 0.0]);
    }

    #[test]
    fn gini_bounds() {
        assert_eq!(gini(&[4, 0], 4), 0.0);
        assert!((gini(&[2, 2], 4) - 0.5).abs() < 1e-12);
    }
}
