//! Per-scenario feature schemas
//!
//! A schema is the ordered list of categorical and numeric column names a
//! model was trained on. It is persisted inside the artifact; inference
//! reassembles a feature row in exactly this order or fails with a
//! request error. Unseen categorical *values* are fine (the encoder maps
//! them to all-zeros); unknown *columns* are not.

use serde::{Deserialize, Serialize};

use crate::error::RequestError;
use crate::models::EngineeredRecord;

/// Categorical columns for the instructor and slot scenarios
pub const CAT_COURSE_CONTEXT: &[&str] =
    &["Dept", "CourseCode", "Mode", "Type", "Semester", "Building"];

/// Numeric columns for the instructor and slot scenarios
pub const NUM_COURSE_CONTEXT: &[&str] =
    &["Unit", "Year", "SemesterIndex", "DurationMinutes", "HasGE"];

/// Categorical columns for the course scenario
pub const CAT_INSTRUCTOR_CONTEXT: &[&str] =
    &["Instructor", "Mode", "Type", "Semester", "Building"];

/// Numeric columns for the course scenario
pub const NUM_INSTRUCTOR_CONTEXT: &[&str] = &["Year", "SemesterIndex"];

/// Categorical columns for the plausibility scenario: the combination key
/// plus its pairwise interactions
pub const CAT_PLAUSIBILITY: &[&str] = &[
    "CourseCode",
    "Instructor",
    "Slot",
    "Type",
    "Course_Instructor",
    "Course_Slot",
    "Instructor_Slot",
    "Course_Type",
];

/// Ordered feature columns, fixed at training time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub categorical: Vec<String>,
    pub numeric: Vec<String>,
}

impl FeatureSchema {
    pub fn new(categorical: &[&str], numeric: &[&str]) -> Self {
        Self {
            categorical: categorical.iter().map(|c| c.to_string()).collect(),
            numeric: numeric.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Assemble one feature row from an engineered record, in schema
    /// order. Used identically when building the training table and when
    /// featurizing a live request.
    pub fn assemble(
        &self,
        record: &EngineeredRecord,
    ) -> Result<(Vec<String>, Vec<f64>), RequestError> {
        let mut categorical = Vec::with_capacity(self.categorical.len());
        for column in &self.categorical {
            categorical.push(
                categorical_value(record, column)
                    .ok_or_else(|| RequestError::UnknownColumn(column.clone()))?,
            );
        }
        let mut numeric = Vec::with_capacity(self.numeric.len());
        for column in &self.numeric {
            numeric.push(
                numeric_value(record, column)
                    .ok_or_else(|| RequestError::UnknownColumn(column.clone()))?,
            );
        }
        Ok((categorical, numeric))
    }
}

fn categorical_value(record: &EngineeredRecord, column: &str) -> Option<String> {
    let value = match column {
        "Dept" => &record.dept,
        "CourseCode" => &record.course_code,
        "Mode" => &record.mode,
        "Type" => &record.component,
        "Semester" => &record.semester,
        "Building" => &record.building,
        "Instructor" => &record.instructor,
        "Slot" => &record.slot,
        _ => return None,
    };
    Some(value.clone())
}

fn numeric_value(record: &EngineeredRecord, column: &str) -> Option<f64> {
    let value = match column {
        "Unit" => record.unit,
        "Year" => f64::from(record.year),
        "SemesterIndex" => record.semester_index as f64,
        "DurationMinutes" => f64::from(record.duration_minutes),
        "HasGE" => record.has_ge as f64,
        _ => return None,
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> EngineeredRecord {
        EngineeredRecord {
            dept: "CS".into(),
            course_number: "146".into(),
            course_code: "CS 146".into(),
            mode: "In Person".into(),
            component: "LEC".into(),
            instructor: "Richard Low".into(),
            semester: "Fall".into(),
            term: "2025_Fall".into(),
            building: "ENG".into(),
            slot: "TR_540".into(),
            unit: 3.0,
            year: 2025,
            semester_index: 4,
            start_minutes: 540,
            end_minutes: 615,
            duration_minutes: 75,
            has_ge: 0,
        }
    }

    #[test]
    fn assembles_in_declared_order() {
        let schema = FeatureSchema::new(CAT_COURSE_CONTEXT, NUM_COURSE_CONTEXT);
        let (cat, num) = schema.assemble(&record()).unwrap();
        assert_eq!(cat, vec!["CS", "CS 146", "In Person", "LEC", "Fall", "ENG"]);
        assert_eq!(num, vec![3.0, 2025.0, 4.0, 75.0, 0.0]);
    }

    #[test]
    fn unknown_column_is_a_request_error() {
        let schema = FeatureSchema::new(&["Dept", "Nonexistent"], &[]);
        let err = schema.assemble(&record()).unwrap_err();
        assert!(matches!(err, RequestError::UnknownColumn(col) if col == "Nonexistent"));
    }
}
