//! Classification pipelines
//!
//! A pipeline bundles a fitted one-hot encoder, a classifier, and the
//! literal string labels observed at training time, so serving needs no
//! label-index bookkeeping.

mod encoder;
mod forest;
mod linear;
mod tree;

pub use encoder::OneHotEncoder;
pub use forest::{ForestClassifier, ForestParams};
pub use linear::{CalibratedLinear, LinearParams};
pub use tree::{DecisionTree, TreeParams};

use serde::{Deserialize, Serialize};

use crate::error::RequestError;

/// The classifier behind a pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClassifierModel {
    Forest(ForestClassifier),
    CalibratedLinear(CalibratedLinear),
}

/// Fitted preprocessing + classifier + class labels for one scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioPipeline {
    pub encoder: OneHotEncoder,
    pub model: ClassifierModel,
    /// Numeric columns appended after the one-hot block
    pub n_numeric: usize,
    /// Label strings in the classifier's internal class order
    pub classes: Vec<String>,
}

impl ScenarioPipeline {
    /// Encode a feature row and return per-class probabilities aligned
    /// with `classes`. The encoder validates the categorical width; the
    /// numeric tail is validated here.
    pub fn predict_proba(
        &self,
        categorical: &[String],
        numeric: &[f64],
    ) -> Result<Vec<f64>, RequestError> {
        if numeric.len() != self.n_numeric {
            return Err(RequestError::NumericWidth {
                got: numeric.len(),
                expected: self.n_numeric,
            });
        }
        let mut row = self.encoder.transform(categorical)?;
        row.extend_from_slice(numeric);
        Ok(match &self.model {
            ClassifierModel::Forest(forest) => forest.predict_proba(&row),
            ClassifierModel::CalibratedLinear(linear) => linear.predict_proba(&row),
        })
    }
}
