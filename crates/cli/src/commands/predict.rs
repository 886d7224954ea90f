//! Offline prediction from a JSON request body

use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use predictor_lib::{
    ComboContext, CourseContext, InferenceService, InstructorContext, PredictionResponse, Scenario,
};

pub fn run(
    artifacts_dir: &Path,
    scenario: Scenario,
    request: &Path,
    k: Option<usize>,
) -> Result<()> {
    let body = read_request(request)?;
    let service = InferenceService::load(artifacts_dir)?;

    let response: PredictionResponse = match scenario {
        Scenario::Instructor => {
            let req: CourseContext = parse_request(&body)?;
            service.predict_instructor(&req, k)?
        }
        Scenario::Slot => {
            let req: CourseContext = parse_request(&body)?;
            service.predict_slot(&req, k)?
        }
        Scenario::Course => {
            let req: InstructorContext = parse_request(&body)?;
            service.predict_course(&req, k)?
        }
        Scenario::Plausibility => {
            let req: ComboContext = parse_request(&body)?;
            service.predict_plausibility(&req, k)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn read_request(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut body = String::new();
        std::io::stdin()
            .read_to_string(&mut body)
            .context("failed to read request body from stdin")?;
        Ok(body)
    } else {
        fs::read_to_string(path)
            .with_context(|| format!("failed to read request file {}", path.display()))
    }
}

fn parse_request<T: serde::de::DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).context("request body does not match the scenario's schema")
}
