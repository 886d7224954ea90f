// HTTP API for schedule predictions and health checks

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use predictor_lib::{
    ComboContext, CourseContext, InferenceService, InstructorContext, RequestError,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

/// Shared application state: the loaded artifact set, immutable for the
/// life of the process
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<InferenceService>,
}

impl AppState {
    pub fn new(service: InferenceService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

/// Optional ranking depth, `?k=`
#[derive(Debug, Deserialize)]
pub struct TopKParams {
    pub k: Option<usize>,
}

fn request_error(err: RequestError) -> (StatusCode, Json<serde_json::Value>) {
    warn!(%err, "rejecting prediction request");
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": err.to_string() })),
    )
}

async fn predict_instructor(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TopKParams>,
    Json(payload): Json<CourseContext>,
) -> impl IntoResponse {
    match state.service.predict_instructor(&payload, params.k) {
        Ok(response) => (StatusCode::OK, Json(json!(response))),
        Err(err) => request_error(err),
    }
}

async fn predict_slot(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TopKParams>,
    Json(payload): Json<CourseContext>,
) -> impl IntoResponse {
    match state.service.predict_slot(&payload, params.k) {
        Ok(response) => (StatusCode::OK, Json(json!(response))),
        Err(err) => request_error(err),
    }
}

async fn predict_course(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TopKParams>,
    Json(payload): Json<InstructorContext>,
) -> impl IntoResponse {
    match state.service.predict_course(&payload, params.k) {
        Ok(response) => (StatusCode::OK, Json(json!(response))),
        Err(err) => request_error(err),
    }
}

async fn predict_plausibility(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TopKParams>,
    Json(payload): Json<ComboContext>,
) -> impl IntoResponse {
    match state.service.predict_plausibility(&payload, params.k) {
        Ok(response) => (StatusCode::OK, Json(json!(response))),
        Err(err) => request_error(err),
    }
}

/// Liveness: the process is up
async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Readiness: artifacts loaded at startup, so a running server is ready
async fn readyz() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "ready": true })))
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ml/predict/instructor", post(predict_instructor))
        .route("/ml/predict/slot", post(predict_slot))
        .route("/ml/predict/course", post(predict_course))
        .route("/ml/predict/plausibility", post(predict_plausibility))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting prediction API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
