//! Integration tests for the prediction API endpoints
//!
//! These train a small model set into a temp directory and drive the
//! router directly with `tower::ServiceExt::oneshot`, so no socket is
//! needed.

use std::fs;
use std::io::Write;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use predictor_lib::dataset;
use predictor_lib::inference::InferenceService;
use predictor_lib::trainer::{self, TrainerConfig};
use tempfile::TempDir;
use tower::ServiceExt;

// The router module lives in the binary crate; rebuild the same routes
// here against the library service, mirroring what main() wires up.
mod server_api {
    include!("../src/api.rs");
}

const HEADER: &str = "Section,Number,Mode,Title,Satifies,Unit,Type,Days,Times,Instructor,Location,Year,Semester";

fn write_corpus(dir: &TempDir) {
    let rows = [
        ("CS 146 (Section 01)", "Richard Low", "TR", "09:00AM-10:15AM"),
        ("CS 146 (Section 02)", "Ada Doe", "MW", "10:30AM-11:45AM"),
        ("CS 151 (Section 01)", "Ada Doe", "TR", "01:30PM-02:45PM"),
        ("CS 151 (Section 02)", "Omar Khan", "MW", "03:00PM-04:15PM"),
        ("MATH 30 (Section 01)", "Lena Euler", "MWF", "08:00AM-08:50AM"),
        ("MATH 30 (Section 02)", "Carl Gauss", "MWF", "09:00AM-09:50AM"),
    ];
    for (year, semester) in [(2023, "Fall"), (2024, "Spring"), (2024, "Fall"), (2025, "Spring")] {
        let mut file =
            fs::File::create(dir.path().join(format!("{year}_{semester}.csv"))).unwrap();
        writeln!(file, "{HEADER}").unwrap();
        for (section, instructor, days, times) in rows {
            writeln!(
                file,
                "{section},1,In Person,Title,MajorOnly,3,LEC,{days},{times},{instructor},ENG305,{year},{semester}"
            )
            .unwrap();
        }
    }
}

fn test_state() -> Arc<server_api::AppState> {
    let data_dir = TempDir::new().unwrap();
    let artifacts_dir = TempDir::new().unwrap();
    write_corpus(&data_dir);

    let records = dataset::load_raw_batches(data_dir.path()).unwrap();
    let (engineered, baseline) = dataset::engineer(&records);
    let config = TrainerConfig {
        n_trees: 10,
        max_depth: 8,
        ..TrainerConfig::default()
    };
    trainer::train_all(&engineered, baseline, artifacts_dir.path(), &config).unwrap();

    let service = InferenceService::load(artifacts_dir.path()).unwrap();
    Arc::new(server_api::AppState::new(service))
}

fn course_body() -> String {
    r#"{"section":"CS 146 (Section 01)","mode":"In Person","unit":3,
        "type":"LEC","days":"TR","times":"09:00AM-10:15AM",
        "satifies":"MajorOnly","location":"ENG305",
        "year":2025,"semester":"Fall"}"#
        .to_string()
}

#[tokio::test]
async fn predict_instructor_returns_ranked_labels() {
    let app = server_api::create_router(test_state());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/ml/predict/instructor?k=2")
                .header("content-type", "application/json")
                .body(Body::from(course_body()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let payload: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    let topk = payload["topk"].as_array().unwrap();
    assert_eq!(topk.len(), 2);
    assert_eq!(payload["best"]["label"], topk[0]["label"]);
    assert!(topk[0]["probability"].as_f64().unwrap() >= topk[1]["probability"].as_f64().unwrap());
}

#[tokio::test]
async fn unknown_field_is_rejected() {
    let app = server_api::create_router(test_state());

    let body = r#"{"section":"CS 146","mode":"In Person","unit":3,"type":"LEC",
        "days":"TR","times":"TBA","year":2025,"semester":"Fall","surprise":true}"#;
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/ml/predict/instructor")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn missing_required_column_is_rejected() {
    let app = server_api::create_router(test_state());

    // No `section` field: the request cannot populate the persisted schema.
    let body = r#"{"mode":"In Person","unit":3,"type":"LEC",
        "days":"TR","times":"TBA","year":2025,"semester":"Fall"}"#;
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/ml/predict/slot")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn plausibility_endpoint_serves_two_classes() {
    let app = server_api::create_router(test_state());

    let body = r#"{"section":"CS 146 (Section 01)","instructor":"Richard Low",
        "type":"LEC","days":"TR","times":"09:00AM-10:15AM"}"#;
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/ml/predict/plausibility?k=2")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let payload: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(payload["topk"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn health_endpoints_respond() {
    let app = server_api::create_router(test_state());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
