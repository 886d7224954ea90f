//! Caller-attributable request failures
//!
//! Configuration problems (no batches, missing artifacts) surface as
//! `anyhow` errors and are fatal; everything a caller can fix about a
//! single request is a `RequestError` so the serving layer can map it to
//! a 400 response.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RequestError {
    /// The persisted schema names a feature column this build cannot
    /// derive from the request
    #[error("persisted schema requires unknown feature column `{0}`")]
    UnknownColumn(String),

    /// Categorical row width does not match the fitted encoder
    #[error("request produced {got} categorical values, model expects {expected}")]
    CategoricalWidth { got: usize, expected: usize },

    /// Numeric row width does not match the fitted pipeline
    #[error("request produced {got} numeric values, model expects {expected}")]
    NumericWidth { got: usize, expected: usize },
}
