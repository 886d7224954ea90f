//! Synthetic negative examples for the plausibility scenario
//!
//! Only positive (observed) combinations exist in the data, so the
//! plausibility classifier needs a manufactured "no" class. Negatives are
//! built by perturbing known-valid structure — real instructors from the
//! same department, real slots from the same course/type — rather than
//! drawing from the full cross-product, which would make the negative
//! class trivially separable. A per-row cap and a retry bound keep
//! generation terminating and the class ratio near 1:K.

use std::collections::{HashMap, HashSet};

use rand::rngs::SmallRng;
use rand::Rng;

use crate::models::EngineeredRecord;

/// Negatives attempted per positive row
pub const DEFAULT_NEGATIVES_PER_ROW: usize = 3;

/// Retry budget per positive row, as a multiple of the per-row cap
pub const RETRY_FACTOR: usize = 25;

/// Interaction-feature separator (kept stable: it is part of the schema)
pub const INTERACTION_SEPARATOR: &str = "||";

/// One observed or synthesized (course, instructor, slot, type, dept)
/// combination
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComboKey {
    pub course_code: String,
    pub instructor: String,
    pub slot: String,
    pub component: String,
    pub dept: String,
}

impl ComboKey {
    /// Categorical feature row in `CAT_PLAUSIBILITY` order: the four key
    /// columns plus their pairwise interactions, so a linear-boundary
    /// classifier can capture combination-specific effects.
    pub fn interaction_row(&self) -> Vec<String> {
        let sep = INTERACTION_SEPARATOR;
        vec![
            self.course_code.clone(),
            self.instructor.clone(),
            self.slot.clone(),
            self.component.clone(),
            format!("{}{sep}{}", self.course_code, self.instructor),
            format!("{}{sep}{}", self.course_code, self.slot),
            format!("{}{sep}{}", self.instructor, self.slot),
            format!("{}{sep}{}", self.course_code, self.component),
        ]
    }
}

/// Positive and synthetic-negative pools for one training run
#[derive(Debug)]
pub struct PlausibilitySet {
    pub positives: Vec<ComboKey>,
    pub negatives: Vec<ComboKey>,
}

/// Build the positive set and synthesize negatives.
///
/// Each positive row contributes at most `negatives_per_row` negatives;
/// rows whose instructor and slot pools both offer fewer than two choices
/// are skipped. The returned negative set is disjoint from the positive
/// set and internally deduplicated.
pub fn build_plausibility_set(
    records: &[EngineeredRecord],
    negatives_per_row: usize,
    rng: &mut SmallRng,
) -> PlausibilitySet {
    let mut positives = Vec::new();
    let mut positive_set = HashSet::new();
    for record in records {
        let key = ComboKey {
            course_code: record.course_code.clone(),
            instructor: record.instructor.clone(),
            slot: record.slot.clone(),
            component: record.component.clone(),
            dept: record.dept.clone(),
        };
        if positive_set.insert(key.clone()) {
            positives.push(key);
        }
    }

    let instructor_pool = instructors_by_dept(&positives);
    let slot_pool = slots_by_course_type(&positives);

    let retry_budget = RETRY_FACTOR * negatives_per_row;
    let mut negatives = Vec::new();
    let mut negative_set = HashSet::new();

    for positive in &positives {
        let instructors = instructor_pool
            .get(&positive.dept)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let slots = slot_pool
            .get(&(positive.course_code.clone(), positive.component.clone()))
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        if instructors.len() < 2 && slots.len() < 2 {
            continue;
        }

        let mut emitted: HashSet<ComboKey> = HashSet::new();
        let mut tries = 0usize;
        while emitted.len() < negatives_per_row && tries < retry_budget {
            tries += 1;
            let Some(candidate) = perturb(positive, instructors, slots, rng) else {
                continue;
            };
            if positive_set.contains(&candidate) || emitted.contains(&candidate) {
                continue;
            }
            emitted.insert(candidate.clone());
            if negative_set.insert(candidate.clone()) {
                negatives.push(candidate);
            }
        }
    }

    PlausibilitySet {
        positives,
        negatives,
    }
}

/// One perturbation attempt: swap the instructor, the slot, or both, each
/// strategy drawn with equal probability. Returns `None` when the chosen
/// strategy cannot vary anything.
fn perturb(
    positive: &ComboKey,
    instructors: &[String],
    slots: &[String],
    rng: &mut SmallRng,
) -> Option<ComboKey> {
    let mut candidate = positive.clone();
    match rng.random_range(0..3u8) {
        0 => {
            candidate.instructor = pick_other(instructors, &positive.instructor, rng)?;
        }
        1 => {
            candidate.slot = pick_other(slots, &positive.slot, rng)?;
        }
        _ => {
            let mut changed = false;
            if instructors.len() >= 2 {
                if let Some(instructor) = pick_other(instructors, &positive.instructor, rng) {
                    candidate.instructor = instructor;
                    changed = true;
                }
            }
            if slots.len() >= 2 {
                if let Some(slot) = pick_other(slots, &positive.slot, rng) {
                    candidate.slot = slot;
                    changed = true;
                }
            }
            if !changed {
                return None;
            }
        }
    }
    Some(candidate)
}

/// Pick a pool member different from `current`; needs at least two
/// choices in the pool to have anything to offer
fn pick_other(pool: &[String], current: &str, rng: &mut SmallRng) -> Option<String> {
    if pool.len() < 2 {
        return None;
    }
    let choices: Vec<&String> = pool.iter().filter(|value| *value != current).collect();
    if choices.is_empty() {
        return None;
    }
    Some(choices[rng.random_range(0..choices.len())].clone())
}

/// Instructors historically associated with each department, in first-seen
/// order so a seeded run is reproducible
fn instructors_by_dept(positives: &[ComboKey]) -> HashMap<String, Vec<String>> {
    let mut pool: HashMap<String, Vec<String>> = HashMap::new();
    for key in positives {
        let entry = pool.entry(key.dept.clone()).or_default();
        if !entry.contains(&key.instructor) {
            entry.push(key.instructor.clone());
        }
    }
    pool
}

/// Slots historically associated with each (course, type) pair
fn slots_by_course_type(positives: &[ComboKey]) -> HashMap<(String, String), Vec<String>> {
    let mut pool: HashMap<(String, String), Vec<String>> = HashMap::new();
    for key in positives {
        let entry = pool
            .entry((key.course_code.clone(), key.component.clone()))
            .or_default();
        if !entry.contains(&key.slot) {
            entry.push(key.slot.clone());
        }
    }
    pool
}
