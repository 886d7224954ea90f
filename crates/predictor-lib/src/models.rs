//! Core data models for schedule prediction

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default satisfies-requirement text when the scraped row has none
pub const DEFAULT_SATIFIES: &str = "MajorOnly";

/// Default location when the scraped row has none
pub const DEFAULT_LOCATION: &str = "Unknown";

/// Sentinel used wherever a string field could not be parsed
pub const UNKNOWN: &str = "Unknown";

/// One scraped course offering, as it arrives from a CSV batch.
///
/// Fields are loosely typed on purpose; missing values are tolerated and
/// resolved to defaults during engineering. `Satifies` is the canonical
/// external spelling and is accepted as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "Section", default)]
    pub section: String,
    #[serde(rename = "Number", alias = "CourseNumber", default)]
    pub number: Option<String>,
    #[serde(rename = "Mode", default)]
    pub mode: String,
    #[serde(rename = "Title", default)]
    pub title: Option<String>,
    #[serde(rename = "Satifies", default)]
    pub satifies: Option<String>,
    #[serde(rename = "Unit", default)]
    pub unit: Option<f64>,
    #[serde(rename = "Type", default)]
    pub component: String,
    #[serde(rename = "Days", default)]
    pub days: String,
    #[serde(rename = "Times", default)]
    pub times: String,
    #[serde(rename = "Instructor", default)]
    pub instructor: String,
    #[serde(rename = "Location", default)]
    pub location: Option<String>,
    #[serde(rename = "DatesRange", default)]
    pub dates_range: Option<String>,
    #[serde(rename = "Seats", default)]
    pub seats: Option<String>,
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Semester")]
    pub semester: String,
}

/// A raw record plus every derived feature the models consume.
///
/// All derived fields are deterministic, total functions of the raw row;
/// only `semester_index` additionally depends on the fitted term baseline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineeredRecord {
    pub dept: String,
    pub course_number: String,
    pub course_code: String,
    pub mode: String,
    pub component: String,
    pub instructor: String,
    pub semester: String,
    pub term: String,
    pub building: String,
    pub slot: String,
    pub unit: f64,
    pub year: i32,
    pub semester_index: i64,
    pub start_minutes: i32,
    pub end_minutes: i32,
    pub duration_minutes: i32,
    pub has_ge: i64,
}

/// The four predictive tasks, each with its own schema and artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scenario {
    Instructor,
    Slot,
    Course,
    Plausibility,
}

impl Scenario {
    pub const ALL: [Scenario; 4] = [
        Scenario::Instructor,
        Scenario::Slot,
        Scenario::Course,
        Scenario::Plausibility,
    ];

    /// Artifact filename, resolved relative to the artifacts directory
    pub fn artifact_filename(&self) -> &'static str {
        match self {
            Scenario::Instructor => "scenario_instructor.json",
            Scenario::Slot => "scenario_slot.json",
            Scenario::Course => "scenario_course.json",
            Scenario::Plausibility => "scenario_plausibility.json",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::Instructor => "instructor",
            Scenario::Slot => "slot",
            Scenario::Course => "course",
            Scenario::Plausibility => "plausibility",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "instructor" => Ok(Scenario::Instructor),
            "slot" => Ok(Scenario::Slot),
            "course" => Ok(Scenario::Course),
            "plausibility" => Ok(Scenario::Plausibility),
            other => Err(format!(
                "unknown scenario `{other}` (expected instructor, slot, course or plausibility)"
            )),
        }
    }
}

/// Prediction request for the instructor and slot scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CourseContext {
    pub section: String,
    pub mode: String,
    pub unit: f64,
    #[serde(rename = "type")]
    pub component: String,
    pub days: String,
    pub times: String,
    #[serde(default = "default_satifies")]
    pub satifies: String,
    #[serde(default = "default_location")]
    pub location: String,
    pub year: i32,
    pub semester: String,
}

/// Prediction request for the course scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstructorContext {
    pub instructor: String,
    pub mode: String,
    #[serde(rename = "type")]
    pub component: String,
    pub semester: String,
    pub building: String,
    pub year: i32,
}

/// Prediction request for the plausibility scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComboContext {
    pub section: String,
    pub instructor: String,
    #[serde(rename = "type")]
    pub component: String,
    pub days: String,
    pub times: String,
}

fn default_satifies() -> String {
    DEFAULT_SATIFIES.to_string()
}

fn default_location() -> String {
    DEFAULT_LOCATION.to_string()
}

/// One ranked label with its predicted probability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub probability: f64,
}

/// Ranked prediction output: the best label plus the full top-k list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub best: Prediction,
    pub topk: Vec<Prediction>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_round_trips_through_str() {
        for scenario in Scenario::ALL {
            assert_eq!(scenario.as_str().parse::<Scenario>().unwrap(), scenario);
        }
    }

    #[test]
    fn course_context_defaults_optional_fields() {
        let req: CourseContext = serde_json::from_str(
            r#"{"section":"CS 146 (Section 01)","mode":"In Person","unit":3,
                "type":"LEC","days":"TR","times":"09:00AM-10:15AM",
                "year":2025,"semester":"Fall"}"#,
        )
        .unwrap();
        assert_eq!(req.satifies, DEFAULT_SATIFIES);
        assert_eq!(req.location, DEFAULT_LOCATION);
    }

    #[test]
    fn course_context_rejects_unknown_fields() {
        let err = serde_json::from_str::<CourseContext>(
            r#"{"section":"CS 146","mode":"In Person","unit":3,"type":"LEC",
                "days":"TR","times":"TBA","year":2025,"semester":"Fall",
                "bogus":1}"#,
        );
        assert!(err.is_err());
    }
}
