//! Term indexing: the model's single numeric "time" feature
//!
//! Every (year, semester) pair maps to a dense rank `year * 2 + order`,
//! shifted by a baseline fitted once per training run. The baseline is
//! persisted inside each artifact so a live request is indexed against the
//! training scale, never against a freshly computed one.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Semesters per calendar year in the raw rank formula
const SEMESTERS_PER_YEAR: i64 = 2;

/// Fixed within-year ordering. Unrecognized semester names rank with
/// Spring; the original data pipeline behaved the same way.
pub fn semester_order(semester: &str) -> i64 {
    match semester.trim() {
        "Spring" => 0,
        "Fall" => 1,
        other => {
            debug!(semester = other, "unmapped semester, defaulting to order 0");
            0
        }
    }
}

/// Baseline-anchored term index, fitted at training time and persisted
/// with every artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermBaseline {
    pub base: i64,
}

impl TermBaseline {
    /// Raw, baseline-free rank of a (year, semester) pair
    pub fn raw_rank(year: i32, semester: &str) -> i64 {
        i64::from(year) * SEMESTERS_PER_YEAR + semester_order(semester)
    }

    /// Fit the baseline as the minimum raw rank over a training batch.
    /// Returns `None` for an empty batch.
    pub fn fit<'a, I>(terms: I) -> Option<Self>
    where
        I: IntoIterator<Item = (i32, &'a str)>,
    {
        terms
            .into_iter()
            .map(|(year, semester)| Self::raw_rank(year, semester))
            .min()
            .map(|base| Self { base })
    }

    /// Baseline-relative index of a (year, semester) pair
    pub fn index_for(&self, year: i32, semester: &str) -> i64 {
        Self::raw_rank(year, semester) - self.base
    }
}
