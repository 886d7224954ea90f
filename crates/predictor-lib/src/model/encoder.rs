//! One-hot encoding for categorical feature columns
//!
//! Vocabularies are fitted per column at training time and persisted with
//! the pipeline. A value unseen at training maps to an all-zero block,
//! never an error; a row with the wrong number of columns is a request
//! error.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::RequestError;

/// Fitted vocabulary for one categorical column
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CategoryMap {
    index: HashMap<String, usize>,
    width: usize,
}

/// Fitted one-hot encoder over an ordered list of categorical columns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneHotEncoder {
    columns: Vec<CategoryMap>,
}

impl OneHotEncoder {
    /// Fit per-column vocabularies over row-major training values.
    /// Category indices are assigned in sorted order so refitting the
    /// same data yields the same encoding.
    pub fn fit(rows: &[Vec<String>], n_columns: usize) -> Self {
        let mut columns = Vec::with_capacity(n_columns);
        for col in 0..n_columns {
            let mut values: Vec<&String> = rows.iter().map(|row| &row[col]).collect();
            values.sort();
            values.dedup();
            let index: HashMap<String, usize> = values
                .into_iter()
                .enumerate()
                .map(|(i, value)| (value.clone(), i))
                .collect();
            let width = index.len();
            columns.push(CategoryMap { index, width });
        }
        Self { columns }
    }

    /// Number of categorical columns the encoder was fitted on
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Total width of the encoded block
    pub fn encoded_width(&self) -> usize {
        self.columns.iter().map(|c| c.width).sum()
    }

    /// Encode one row into its one-hot block. Unseen values leave their
    /// column block all-zero.
    pub fn transform(&self, values: &[String]) -> Result<Vec<f64>, RequestError> {
        if values.len() != self.columns.len() {
            return Err(RequestError::CategoricalWidth {
                got: values.len(),
                expected: self.columns.len(),
            });
        }
        let mut encoded = vec![0.0; self.encoded_width()];
        let mut offset = 0;
        for (column, value) in self.columns.iter().zip(values) {
            if let Some(&position) = column.index.get(value) {
                encoded[offset + position] = 1.0;
            }
            offset += column.width;
        }
        Ok(encoded)
    }
}
