//! Raw batch loading and feature engineering
//!
//! Loads every CSV batch under a data directory, applies the defaults for
//! missing `Satifies`/`Location`, and derives the engineered table through
//! the shared feature transforms. No input batches is a configuration
//! error; a batch that parses to zero rows is not (training rejects the
//! empty table explicitly).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::{debug, info, warn};

use crate::features;
use crate::models::{EngineeredRecord, RawRecord, DEFAULT_LOCATION, DEFAULT_SATIFIES};
use crate::term::TermBaseline;

/// Unit value carried when the raw row has none; a sentinel in the same
/// spirit as the `-1` minute values
pub const UNIT_SENTINEL: f64 = -1.0;

/// Load all raw batches from a directory of CSV files, in filename order.
///
/// Rows that fail to deserialize are skipped with a warning; an empty
/// directory fails fast.
pub fn load_raw_batches(data_dir: &Path) -> Result<Vec<RawRecord>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(data_dir)
        .with_context(|| format!("failed to read data directory {}", data_dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "csv"))
        .collect();
    paths.sort();

    if paths.is_empty() {
        bail!("no CSV batches found in {}", data_dir.display());
    }

    let mut records = Vec::new();
    for path in &paths {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("failed to open batch {}", path.display()))?;
        let mut loaded = 0usize;
        for (row, result) in reader.deserialize::<RawRecord>().enumerate() {
            match result {
                Ok(record) => {
                    records.push(record);
                    loaded += 1;
                }
                Err(err) => {
                    warn!(batch = %path.display(), row, %err, "skipping malformed row");
                }
            }
        }
        debug!(batch = %path.display(), rows = loaded, "loaded batch");
    }

    info!(batches = paths.len(), rows = records.len(), "raw batches loaded");
    Ok(records)
}

/// Derive the engineered table and fit the term baseline over the batch.
///
/// An empty input yields an empty table with a zero baseline; rejecting
/// that is the trainer's job.
pub fn engineer(records: &[RawRecord]) -> (Vec<EngineeredRecord>, TermBaseline) {
    let baseline = TermBaseline::fit(
        records
            .iter()
            .map(|r| (r.year, r.semester.as_str())),
    )
    .unwrap_or(TermBaseline { base: 0 });

    let engineered = records
        .iter()
        .map(|record| engineer_record(record, &baseline))
        .collect();
    (engineered, baseline)
}

/// Derive every feature for one raw record against a fitted baseline.
/// Shared with inference, which calls it on a request-shaped raw record
/// using the artifact's persisted baseline.
pub fn engineer_record(record: &RawRecord, baseline: &TermBaseline) -> EngineeredRecord {
    let satifies = record
        .satifies
        .clone()
        .unwrap_or_else(|| DEFAULT_SATIFIES.to_string());
    let location = record
        .location
        .clone()
        .unwrap_or_else(|| DEFAULT_LOCATION.to_string());

    let (dept, course_number) = features::decompose_section_code(&record.section);
    let course_code = features::course_code(&dept, &course_number);
    let (start_minutes, end_minutes, duration_minutes) =
        features::parse_time_range(&record.times);
    let slot = features::build_slot_key(&record.days, start_minutes);
    let building = features::extract_building(&location);
    let has_ge = i64::from(features::has_general_education_flag(&satifies));

    EngineeredRecord {
        dept,
        course_number,
        course_code,
        mode: record.mode.clone(),
        component: record.component.clone(),
        instructor: record.instructor.clone(),
        semester: record.semester.clone(),
        term: format!("{}_{}", record.year, record.semester),
        building,
        slot,
        unit: record.unit.unwrap_or(UNIT_SENTINEL),
        year: record.year,
        semester_index: baseline.index_for(record.year, &record.semester),
        start_minutes,
        end_minutes,
        duration_minutes,
        has_ge,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const HEADER: &str = "Section,Number,Mode,Title,Satifies,Unit,Type,Days,Times,Instructor,Location,Year,Semester";

    fn write_batch(dir: &TempDir, name: &str, rows: &[&str]) {
        let mut file = fs::File::create(dir.path().join(name)).unwrap();
        writeln!(file, "{HEADER}").unwrap();
        for row in rows {
            writeln!(file, "{row}").unwrap();
        }
    }

    #[test]
    fn empty_directory_is_a_configuration_error() {
        let dir = TempDir::new().unwrap();
        let err = load_raw_batches(dir.path()).unwrap_err();
        assert!(err.to_string().contains("no CSV batches"));
    }

    #[test]
    fn header_only_batch_yields_empty_table() {
        let dir = TempDir::new().unwrap();
        write_batch(&dir, "fall.csv", &[]);
        let records = load_raw_batches(dir.path()).unwrap();
        assert!(records.is_empty());
        let (engineered, _) = engineer(&records);
        assert!(engineered.is_empty());
    }

    #[test]
    fn loads_and_engineers_a_row() {
        let dir = TempDir::new().unwrap();
        write_batch(
            &dir,
            "fall.csv",
            &["CS 146 (Section 01),146,In Person,Data Structures,GE: B2,3,LEC,TR,09:00AM-10:15AM,Richard Low,ENG305,2025,Fall"],
        );
        let records = load_raw_batches(dir.path()).unwrap();
        assert_eq!(records.len(), 1);

        let (engineered, baseline) = engineer(&records);
        let row = &engineered[0];
        assert_eq!(row.dept, "CS");
        assert_eq!(row.course_code, "CS 146");
        assert_eq!(row.duration_minutes, 75);
        assert_eq!(row.slot, "TR_540");
        assert_eq!(row.building, "ENG");
        assert_eq!(row.has_ge, 1);
        assert_eq!(row.term, "2025_Fall");
        assert_eq!(row.semester_index, baseline.index_for(2025, "Fall"));
    }

    #[test]
    fn missing_satifies_and_location_use_defaults() {
        let dir = TempDir::new().unwrap();
        write_batch(
            &dir,
            "spring.csv",
            &["MATH 30 (Section 02),30,In Person,Calculus,,4,LEC,MWF,TBA,Ada Doe,,2024,Spring"],
        );
        let records = load_raw_batches(dir.path()).unwrap();
        let (engineered, _) = engineer(&records);
        let row = &engineered[0];
        assert_eq!(row.building, DEFAULT_LOCATION);
        assert_eq!(row.has_ge, 0);
        assert_eq!(row.slot, "MWF_TBA");
        assert_eq!(row.duration_minutes, -1);
    }

    #[test]
    fn malformed_rows_are_skipped_not_fatal() {
        let dir = TempDir::new().unwrap();
        write_batch(
            &dir,
            "fall.csv",
            &[
                "CS 146 (Section 01),146,In Person,Data Structures,MajorOnly,3,LEC,TR,09:00AM-10:15AM,Richard Low,ENG305,2025,Fall",
                "CS 151 (Section 01),151,In Person,OOP,MajorOnly,3,LEC,MW,10:30AM-11:45AM,Ada Doe,ENG303,not-a-year,Fall",
            ],
        );
        let records = load_raw_batches(dir.path()).unwrap();
        assert_eq!(records.len(), 1);
    }
}
