//! Persisted training artifacts
//!
//! One JSON file per scenario holding the fitted pipeline, the term
//! baseline, and the exact feature schema. Files are written to a
//! temporary path and renamed into place, so a crashed training run can
//! never leave a loadable partial artifact.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::model::ScenarioPipeline;
use crate::models::Scenario;
use crate::schema::FeatureSchema;
use crate::term::TermBaseline;

/// Immutable bundle of everything needed to reproduce a model's input
/// features and run it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioArtifact {
    pub pipeline: ScenarioPipeline,
    pub baseline: TermBaseline,
    pub schema: FeatureSchema,
}

impl ScenarioArtifact {
    /// Write the artifact atomically under the artifacts directory
    pub fn save(&self, artifacts_dir: &Path, scenario: Scenario) -> Result<PathBuf> {
        fs::create_dir_all(artifacts_dir).with_context(|| {
            format!(
                "failed to create artifacts directory {}",
                artifacts_dir.display()
            )
        })?;
        let path = artifacts_dir.join(scenario.artifact_filename());
        let tmp = path.with_extension("json.tmp");

        let payload = serde_json::to_vec(self)
            .with_context(|| format!("failed to serialize {scenario} artifact"))?;
        fs::write(&tmp, payload)
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("failed to move artifact into place at {}", path.display()))?;

        info!(%scenario, path = %path.display(), "artifact saved");
        Ok(path)
    }

    /// Load one scenario artifact; a missing file is a configuration
    /// error, not something to default around
    pub fn load(artifacts_dir: &Path, scenario: Scenario) -> Result<Self> {
        let path = artifacts_dir.join(scenario.artifact_filename());
        let payload = fs::read(&path).with_context(|| {
            format!(
                "missing model artifact {} — run training first",
                path.display()
            )
        })?;
        serde_json::from_slice(&payload)
            .with_context(|| format!("corrupt {scenario} artifact at {}", path.display()))
    }
}
