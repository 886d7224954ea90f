//! Multi-scenario training
//!
//! Fits one bagged-forest pipeline per multi-class scenario (instructor,
//! slot, course) and one calibrated linear pipeline for plausibility, and
//! persists each as an atomic artifact. Schedule prediction is a
//! forecasting task, so the multi-class scenarios hold out the two most
//! recent terms rather than a random sample; plausibility is judged
//! combination-wise, so it uses a stratified random split.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{bail, Result};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{info, warn};

use crate::artifact::ScenarioArtifact;
use crate::model::{
    CalibratedLinear, ClassifierModel, ForestClassifier, ForestParams, LinearParams,
    OneHotEncoder, ScenarioPipeline,
};
use crate::models::{EngineeredRecord, Scenario};
use crate::sampler;
use crate::schema::{
    FeatureSchema, CAT_COURSE_CONTEXT, CAT_INSTRUCTOR_CONTEXT, CAT_PLAUSIBILITY,
    NUM_COURSE_CONTEXT, NUM_INSTRUCTOR_CONTEXT,
};
use crate::term::TermBaseline;

/// Most recent terms held out for multi-class evaluation
const HOLDOUT_TERMS: usize = 2;

/// Holdout fraction for the plausibility split
const PLAUSIBILITY_HOLDOUT: f64 = 0.2;

/// Class labels for the plausibility scenario, in pipeline class order
pub const PLAUSIBILITY_CLASSES: [&str; 2] = ["0", "1"];

/// Knobs for one training run
#[derive(Debug, Clone)]
pub struct TrainerConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub negatives_per_row: usize,
    pub seed: u64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            n_trees: 200,
            max_depth: 16,
            negatives_per_row: sampler::DEFAULT_NEGATIVES_PER_ROW,
            seed: 42,
        }
    }
}

/// Holdout accuracy per scenario, for the run log
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub rows: usize,
    pub scenarios: Vec<(Scenario, f64)>,
}

/// Train all four scenarios and write their artifacts.
///
/// Fails explicitly on an empty engineered table or an empty training
/// partition; a model fitted on nothing would only ever predict a
/// degenerate class.
pub fn train_all(
    records: &[EngineeredRecord],
    baseline: TermBaseline,
    artifacts_dir: &Path,
    config: &TrainerConfig,
) -> Result<TrainingReport> {
    if records.is_empty() {
        bail!("engineered table is empty; refusing to train");
    }

    let holdout_terms = newest_terms(records);
    let (train_rows, test_rows): (Vec<&EngineeredRecord>, Vec<&EngineeredRecord>) = records
        .iter()
        .partition(|r| !holdout_terms.contains(&r.semester_index));
    if train_rows.is_empty() {
        bail!("no training rows remain after holding out the newest terms");
    }
    info!(
        train = train_rows.len(),
        holdout = test_rows.len(),
        ?holdout_terms,
        "temporal split"
    );

    let mut report = TrainingReport {
        rows: records.len(),
        scenarios: Vec::new(),
    };

    for scenario in [Scenario::Instructor, Scenario::Slot, Scenario::Course] {
        let accuracy = train_multiclass(
            scenario,
            &train_rows,
            &test_rows,
            baseline,
            artifacts_dir,
            config,
        )?;
        report.scenarios.push((scenario, accuracy));
    }

    let accuracy = train_plausibility(records, baseline, artifacts_dir, config)?;
    report.scenarios.push((Scenario::Plausibility, accuracy));

    Ok(report)
}

/// Schema and label column for one multi-class scenario
fn scenario_schema(scenario: Scenario) -> FeatureSchema {
    match scenario {
        Scenario::Instructor | Scenario::Slot => {
            FeatureSchema::new(CAT_COURSE_CONTEXT, NUM_COURSE_CONTEXT)
        }
        Scenario::Course => FeatureSchema::new(CAT_INSTRUCTOR_CONTEXT, NUM_INSTRUCTOR_CONTEXT),
        Scenario::Plausibility => FeatureSchema::new(CAT_PLAUSIBILITY, &[]),
    }
}

fn scenario_label(scenario: Scenario, record: &EngineeredRecord) -> String {
    match scenario {
        Scenario::Instructor => record.instructor.clone(),
        Scenario::Slot => record.slot.clone(),
        Scenario::Course => record.course_code.clone(),
        Scenario::Plausibility => unreachable!("plausibility labels come from the sampler"),
    }
}

fn train_multiclass(
    scenario: Scenario,
    train_rows: &[&EngineeredRecord],
    test_rows: &[&EngineeredRecord],
    baseline: TermBaseline,
    artifacts_dir: &Path,
    config: &TrainerConfig,
) -> Result<f64> {
    let schema = scenario_schema(scenario);

    let mut cat_rows = Vec::with_capacity(train_rows.len());
    let mut num_rows = Vec::with_capacity(train_rows.len());
    let mut labels = Vec::with_capacity(train_rows.len());
    for record in train_rows {
        let (cat, num) = schema.assemble(record)?;
        cat_rows.push(cat);
        num_rows.push(num);
        labels.push(scenario_label(scenario, record));
    }

    let classes = interned_classes(&labels);
    if classes.len() < 2 {
        bail!("{scenario} training data has {} distinct labels; need at least 2", classes.len());
    }
    let label_ids: Vec<usize> = labels
        .iter()
        .map(|label| classes.binary_search(label).unwrap_or(0))
        .collect();

    let encoder = OneHotEncoder::fit(&cat_rows, schema.categorical.len());
    let x: Vec<Vec<f64>> = cat_rows
        .iter()
        .zip(&num_rows)
        .map(|(cat, num)| {
            let mut row = encoder.transform(cat)?;
            row.extend_from_slice(num);
            Ok(row)
        })
        .collect::<Result<_, crate::error::RequestError>>()?;

    let forest = ForestClassifier::fit(
        &x,
        &label_ids,
        classes.len(),
        &ForestParams {
            n_trees: config.n_trees,
            max_depth: config.max_depth,
            min_samples_split: 2,
            seed: config.seed,
        },
    );

    let pipeline = ScenarioPipeline {
        encoder,
        model: ClassifierModel::Forest(forest),
        n_numeric: schema.numeric.len(),
        classes,
    };

    let accuracy = multiclass_accuracy(scenario, &pipeline, &schema, test_rows);
    info!(%scenario, accuracy, holdout = test_rows.len(), "scenario fitted");

    ScenarioArtifact {
        pipeline,
        baseline,
        schema,
    }
    .save(artifacts_dir, scenario)?;
    Ok(accuracy)
}

fn multiclass_accuracy(
    scenario: Scenario,
    pipeline: &ScenarioPipeline,
    schema: &FeatureSchema,
    test_rows: &[&EngineeredRecord],
) -> f64 {
    if test_rows.is_empty() {
        warn!(%scenario, "no holdout rows; skipping evaluation");
        return 0.0;
    }
    let mut hits = 0usize;
    for record in test_rows {
        let Ok((cat, num)) = schema.assemble(record) else {
            continue;
        };
        let Ok(probs) = pipeline.predict_proba(&cat, &num) else {
            continue;
        };
        let best = probs
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i)
            .unwrap_or(0);
        if pipeline.classes[best] == scenario_label(scenario, record) {
            hits += 1;
        }
    }
    hits as f64 / test_rows.len() as f64
}

fn train_plausibility(
    records: &[EngineeredRecord],
    baseline: TermBaseline,
    artifacts_dir: &Path,
    config: &TrainerConfig,
) -> Result<f64> {
    let mut rng = SmallRng::seed_from_u64(config.seed);
    let set = sampler::build_plausibility_set(records, config.negatives_per_row, &mut rng);
    if set.positives.is_empty() {
        bail!("plausibility training has no positive combinations");
    }
    if set.negatives.is_empty() {
        bail!(
            "negative sampler produced nothing; the batch has too little \
             variation to define an implausible class"
        );
    }
    info!(
        positives = set.positives.len(),
        negatives = set.negatives.len(),
        "plausibility pool built"
    );

    let mut cat_rows: Vec<Vec<String>> = Vec::new();
    let mut labels: Vec<usize> = Vec::new();
    for key in &set.positives {
        cat_rows.push(key.interaction_row());
        labels.push(1);
    }
    for key in &set.negatives {
        cat_rows.push(key.interaction_row());
        labels.push(0);
    }

    let (train_idx, test_idx) = stratified_split(&labels, PLAUSIBILITY_HOLDOUT, config.seed);
    if train_idx.is_empty() {
        bail!("plausibility training partition is empty");
    }

    let schema = scenario_schema(Scenario::Plausibility);
    let encoder = OneHotEncoder::fit(&cat_rows, schema.categorical.len());
    let encode = |i: usize| encoder.transform(&cat_rows[i]);

    let train_x: Vec<Vec<f64>> = train_idx
        .iter()
        .map(|&i| encode(i))
        .collect::<Result<_, _>>()?;
    let train_y: Vec<usize> = train_idx.iter().map(|&i| labels[i]).collect();

    let model = CalibratedLinear::fit(
        &train_x,
        &train_y,
        &LinearParams {
            seed: config.seed,
            ..LinearParams::default()
        },
    );

    let mut hits = 0usize;
    for &i in &test_idx {
        let p = {
            let row = encode(i)?;
            model.predict_positive(&row)
        };
        if (p >= 0.5) == (labels[i] == 1) {
            hits += 1;
        }
    }
    let accuracy = if test_idx.is_empty() {
        0.0
    } else {
        hits as f64 / test_idx.len() as f64
    };
    info!(accuracy, holdout = test_idx.len(), "plausibility fitted");

    let pipeline = ScenarioPipeline {
        encoder,
        model: ClassifierModel::CalibratedLinear(model),
        n_numeric: 0,
        classes: PLAUSIBILITY_CLASSES.iter().map(|c| c.to_string()).collect(),
    };
    ScenarioArtifact {
        pipeline,
        baseline,
        schema,
    }
    .save(artifacts_dir, Scenario::Plausibility)?;
    Ok(accuracy)
}

/// The `HOLDOUT_TERMS` most recent semester indices in the batch
fn newest_terms(records: &[EngineeredRecord]) -> BTreeSet<i64> {
    let all: BTreeSet<i64> = records.iter().map(|r| r.semester_index).collect();
    all.into_iter().rev().take(HOLDOUT_TERMS).collect()
}

/// Sorted unique labels; sorted order doubles as the class order
fn interned_classes(labels: &[String]) -> Vec<String> {
    let unique: BTreeSet<&String> = labels.iter().collect();
    unique.into_iter().cloned().collect()
}

/// Per-class shuffled split, holding out roughly `fraction` of each class
fn stratified_split(labels: &[usize], fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut rng = SmallRng::seed_from_u64(seed.wrapping_add(1));
    let mut train = Vec::new();
    let mut test = Vec::new();
    for class in [0usize, 1] {
        let mut members: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, &y)| y == class)
            .map(|(i, _)| i)
            .collect();
        members.shuffle(&mut rng);
        let held = ((members.len() as f64) * fraction).floor() as usize;
        test.extend(members.iter().take(held));
        train.extend(members.iter().skip(held));
    }
    (train, test)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_terms_picks_the_two_latest() {
        let mut records = Vec::new();
        for index in [0i64, 1, 2, 3] {
            for _ in 0..2 {
                let mut r = sample_record();
                r.semester_index = index;
                records.push(r);
            }
        }
        let terms = newest_terms(&records);
        assert_eq!(terms.into_iter().collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn interned_classes_are_sorted_and_unique() {
        let labels = vec!["b".to_string(), "a".to_string(), "b".to_string()];
        assert_eq!(interned_classes(&labels), vec!["a", "b"]);
    }

    #[test]
    fn stratified_split_holds_out_both_classes() {
        let labels: Vec<usize> = (0..40).map(|i| usize::from(i % 4 == 0)).collect();
        let (train, test) = stratified_split(&labels, 0.2, 7);
        assert_eq!(train.len() + test.len(), labels.len());
        assert!(test.iter().any(|&i| labels[i] == 1));
        assert!(test.iter().any(|&i| labels[i] == 0));
    }

    #[test]
    fn empty_table_is_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = train_all(
            &[],
            TermBaseline { base: 0 },
            dir.path(),
            &TrainerConfig::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    fn sample_record() -> EngineeredRecord {
        EngineeredRecord {
            dept: "CS".into(),
            course_number: "146".into(),
            course_code: "CS 146".into(),
            mode: "In Person".into(),
            component: "LEC".into(),
            instructor: "Low".into(),
            semester: "Fall".into(),
            term: "2025_Fall".into(),
            building: "ENG".into(),
            slot: "TR_540".into(),
            unit: 3.0,
            year: 2025,
            semester_index: 0,
            start_minutes: 540,
            end_minutes: 615,
            duration_minutes: 75,
            has_ge: 0,
        }
    }
}
