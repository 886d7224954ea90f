//! Inference over persisted artifacts
//!
//! Artifacts are loaded exactly once at construction; a missing or corrupt
//! file is a startup failure, never a per-request one. Each request is
//! featurized with the same transforms used at training time, against the
//! artifact's persisted term baseline, and assembled in the artifact's
//! declared column order.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::artifact::ScenarioArtifact;
use crate::dataset;
use crate::error::RequestError;
use crate::features;
use crate::models::{
    ComboContext, CourseContext, InstructorContext, Prediction, PredictionResponse, RawRecord,
    Scenario, UNKNOWN,
};
use crate::sampler::ComboKey;

/// Default length of the ranked label list
pub const DEFAULT_TOP_K: usize = 3;

/// Immutable, share-by-all-requests prediction service
pub struct InferenceService {
    instructor: ScenarioArtifact,
    slot: ScenarioArtifact,
    course: ScenarioArtifact,
    plausibility: ScenarioArtifact,
}

impl InferenceService {
    /// Load every scenario artifact from the artifacts directory. Refuses
    /// to start if any is missing rather than serving with a stale or
    /// default model.
    pub fn load(artifacts_dir: &Path) -> Result<Self> {
        let service = Self {
            instructor: ScenarioArtifact::load(artifacts_dir, Scenario::Instructor)
                .context("instructor scenario unavailable")?,
            slot: ScenarioArtifact::load(artifacts_dir, Scenario::Slot)
                .context("slot scenario unavailable")?,
            course: ScenarioArtifact::load(artifacts_dir, Scenario::Course)
                .context("course scenario unavailable")?,
            plausibility: ScenarioArtifact::load(artifacts_dir, Scenario::Plausibility)
                .context("plausibility scenario unavailable")?,
        };
        info!(dir = %artifacts_dir.display(), "all scenario artifacts loaded");
        Ok(service)
    }

    /// Rank likely instructors for a course context
    pub fn predict_instructor(
        &self,
        request: &CourseContext,
        k: Option<usize>,
    ) -> Result<PredictionResponse, RequestError> {
        self.predict_course_context(&self.instructor, request, k)
    }

    /// Rank likely time slots for a course context
    pub fn predict_slot(
        &self,
        request: &CourseContext,
        k: Option<usize>,
    ) -> Result<PredictionResponse, RequestError> {
        self.predict_course_context(&self.slot, request, k)
    }

    /// Rank likely courses for an instructor context
    pub fn predict_course(
        &self,
        request: &InstructorContext,
        k: Option<usize>,
    ) -> Result<PredictionResponse, RequestError> {
        let artifact = &self.course;
        let raw = RawRecord {
            section: String::new(),
            number: None,
            mode: request.mode.clone(),
            title: None,
            satifies: None,
            unit: None,
            component: request.component.clone(),
            days: String::new(),
            times: String::new(),
            instructor: request.instructor.clone(),
            location: Some(request.building.clone()),
            dates_range: None,
            seats: None,
            year: request.year,
            semester: request.semester.clone(),
        };
        let mut record = dataset::engineer_record(&raw, &artifact.baseline);
        // The caller supplies the building directly for this scenario;
        // keep it verbatim rather than re-deriving from a location string.
        record.building = request.building.clone();
        let (cat, num) = artifact.schema.assemble(&record)?;
        rank(artifact, &cat, &num, k)
    }

    /// Score whether a (course, instructor, slot, type) combination is
    /// plausible at all
    pub fn predict_plausibility(
        &self,
        request: &ComboContext,
        k: Option<usize>,
    ) -> Result<PredictionResponse, RequestError> {
        let artifact = &self.plausibility;
        let (dept, number) = features::decompose_section_code(&request.section);
        let (start, _, _) = features::parse_time_range(&request.times);
        let key = ComboKey {
            course_code: features::course_code(&dept, &number),
            instructor: request.instructor.clone(),
            slot: features::build_slot_key(&request.days, start),
            component: request.component.clone(),
            dept,
        };
        let cat = key.interaction_row();
        rank(artifact, &cat, &[], k)
    }

    /// Shared path for the two course-context scenarios
    fn predict_course_context(
        &self,
        artifact: &ScenarioArtifact,
        request: &CourseContext,
        k: Option<usize>,
    ) -> Result<PredictionResponse, RequestError> {
        let raw = RawRecord {
            section: request.section.clone(),
            number: None,
            mode: request.mode.clone(),
            title: None,
            satifies: Some(request.satifies.clone()),
            unit: Some(request.unit),
            component: request.component.clone(),
            days: request.days.clone(),
            times: request.times.clone(),
            instructor: UNKNOWN.to_string(),
            location: Some(request.location.clone()),
            dates_range: None,
            seats: None,
            year: request.year,
            semester: request.semester.clone(),
        };
        let record = dataset::engineer_record(&raw, &artifact.baseline);
        let (cat, num) = artifact.schema.assemble(&record)?;
        rank(artifact, &cat, &num, k)
    }
}

/// Run the pipeline and return the top-k labels by probability,
/// descending; ties keep the pipeline's internal class order. `k` is
/// clamped to the number of available classes.
fn rank(
    artifact: &ScenarioArtifact,
    categorical: &[String],
    numeric: &[f64],
    k: Option<usize>,
) -> Result<PredictionResponse, RequestError> {
    let probs = artifact.pipeline.predict_proba(categorical, numeric)?;
    let classes = &artifact.pipeline.classes;
    let k = k.unwrap_or(DEFAULT_TOP_K).clamp(1, classes.len());

    let mut order: Vec<usize> = (0..classes.len()).collect();
    order.sort_by(|&a, &b| {
        probs[b]
            .partial_cmp(&probs[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let topk: Vec<Prediction> = order
        .into_iter()
        .take(k)
        .map(|i| Prediction {
            label: classes[i].clone(),
            probability: probs[i],
        })
        .collect();
    debug!(k, best = %topk[0].label, "ranked prediction");

    Ok(PredictionResponse {
        best: topk[0].clone(),
        topk,
    })
}
