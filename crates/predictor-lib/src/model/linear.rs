//! Calibrated linear classifier for the plausibility scenario
//!
//! A maximum-margin linear boundary (hinge loss, SGD, balanced class
//! weights) whose raw decision scores are mapped to probabilities by a
//! Platt sigmoid. The sigmoid is fitted on pooled out-of-fold scores from
//! a 3-fold split so calibration never sees scores the margin was fitted
//! on; the served margin is then refitted on the full training set.

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Folds used for out-of-fold calibration scores
const CALIBRATION_FOLDS: usize = 3;

/// Training knobs for the linear margin and calibration
#[derive(Debug, Clone)]
pub struct LinearParams {
    pub epochs: usize,
    pub learning_rate: f64,
    pub l2: f64,
    pub seed: u64,
}

impl Default for LinearParams {
    fn default() -> Self {
        Self {
            epochs: 50,
            learning_rate: 0.1,
            l2: 1e-4,
            seed: 42,
        }
    }
}

/// Fitted linear margin: `score = w . x + b`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearMargin {
    weights: Vec<f64>,
    bias: f64,
}

impl LinearMargin {
    /// Hinge-loss SGD with per-class weights compensating imbalance.
    /// `labels` are 0 (negative) or 1 (positive).
    fn fit(rows: &[Vec<f64>], labels: &[usize], params: &LinearParams, seed: u64) -> Self {
        let n_features = rows.first().map(Vec::len).unwrap_or(0);
        let mut weights = vec![0.0; n_features];
        let mut bias = 0.0;

        let n_pos = labels.iter().filter(|&&y| y == 1).count().max(1);
        let n_neg = (labels.len() - n_pos).max(1);
        // Balanced weighting: n / (2 * n_class)
        let weight_pos = labels.len() as f64 / (2.0 * n_pos as f64);
        let weight_neg = labels.len() as f64 / (2.0 * n_neg as f64);

        let mut rng = SmallRng::seed_from_u64(seed);
        let mut order: Vec<usize> = (0..rows.len()).collect();
        for epoch in 0..params.epochs {
            order.shuffle(&mut rng);
            let lr = params.learning_rate / (1.0 + epoch as f64 * 0.1);
            for &i in &order {
                let signed = if labels[i] == 1 { 1.0 } else { -1.0 };
                let class_weight = if labels[i] == 1 { weight_pos } else { weight_neg };
                let score: f64 = weights
                    .iter()
                    .zip(&rows[i])
                    .map(|(w, x)| w * x)
                    .sum::<f64>()
                    + bias;

                for (w, x) in weights.iter_mut().zip(&rows[i]) {
                    let mut grad = params.l2 * *w;
                    if signed * score < 1.0 {
                        grad -= class_weight * signed * x;
                    }
                    *w -= lr * grad;
                }
                if signed * score < 1.0 {
                    bias += lr * class_weight * signed;
                }
            }
        }
        Self { weights, bias }
    }

    fn score(&self, row: &[f64]) -> f64 {
        self.weights
            .iter()
            .zip(row)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.bias
    }
}

/// Platt sigmoid: `p = 1 / (1 + exp(a * score + b))`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigmoidCalibration {
    a: f64,
    b: f64,
}

impl SigmoidCalibration {
    /// Fit by gradient descent on the cross-entropy of Platt's smoothed
    /// targets
    fn fit(scores: &[f64], labels: &[usize]) -> Self {
        let n_pos = labels.iter().filter(|&&y| y == 1).count();
        let n_neg = labels.len() - n_pos;
        let target_pos = (n_pos as f64 + 1.0) / (n_pos as f64 + 2.0);
        let target_neg = 1.0 / (n_neg as f64 + 2.0);

        let mut a = -1.0;
        let mut b = 0.0;
        let n = scores.len().max(1) as f64;
        let lr = 0.01;
        for _ in 0..2000 {
            let mut grad_a = 0.0;
            let mut grad_b = 0.0;
            for (&score, &label) in scores.iter().zip(labels) {
                let target = if label == 1 { target_pos } else { target_neg };
                let p = sigmoid(a * score + b);
                // d(xent)/d(a*s+b) = p - target, chain through score
                let delta = p - target;
                grad_a += delta * score;
                grad_b += delta;
            }
            a -= lr * grad_a / n;
            b -= lr * grad_b / n;
        }
        Self { a, b }
    }

    fn probability(&self, score: f64) -> f64 {
        sigmoid(self.a * score + self.b)
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Linear margin plus its fitted calibration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibratedLinear {
    margin: LinearMargin,
    calibration: SigmoidCalibration,
}

impl CalibratedLinear {
    /// Fit with out-of-fold calibration, then refit the margin on all rows
    pub fn fit(rows: &[Vec<f64>], labels: &[usize], params: &LinearParams) -> Self {
        let mut rng = SmallRng::seed_from_u64(params.seed);
        let mut order: Vec<usize> = (0..rows.len()).collect();
        order.shuffle(&mut rng);

        let mut oof_scores = Vec::with_capacity(rows.len());
        let mut oof_labels = Vec::with_capacity(rows.len());
        let folds = CALIBRATION_FOLDS.min(rows.len().max(1));
        for fold in 0..folds {
            let held: Vec<usize> = order
                .iter()
                .copied()
                .skip(fold)
                .step_by(folds)
                .collect();
            let held_set: std::collections::HashSet<usize> = held.iter().copied().collect();
            let train_rows: Vec<Vec<f64>> = order
                .iter()
                .filter(|i| !held_set.contains(i))
                .map(|&i| rows[i].clone())
                .collect();
            let train_labels: Vec<usize> = order
                .iter()
                .filter(|i| !held_set.contains(i))
                .map(|&i| labels[i])
                .collect();
            if train_rows.is_empty() {
                continue;
            }
            let fold_margin =
                LinearMargin::fit(&train_rows, &train_labels, params, params.seed + fold as u64);
            for &i in &held {
                oof_scores.push(fold_margin.score(&rows[i]));
                oof_labels.push(labels[i]);
            }
        }

        let calibration = SigmoidCalibration::fit(&oof_scores, &oof_labels);
        let margin = LinearMargin::fit(rows, labels, params, params.seed);
        debug!(
            oof_points = oof_scores.len(),
            "calibrated linear classifier fitted"
        );
        Self {
            margin,
            calibration,
        }
    }

    /// Probability of the positive class, strictly inside (0, 1)
    pub fn predict_positive(&self, row: &[f64]) -> f64 {
        self.calibration.probability(self.margin.score(row))
    }

    /// Two-class distribution ordered `[negative, positive]` to match the
    /// class list persisted with the pipeline
    pub fn predict_proba(&self, row: &[f64]) -> Vec<f64> {
        let positive = self.predict_positive(row);
        vec![1.0 - positive, positive]
    }
}
