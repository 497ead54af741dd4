use crate::infra::{AppState, ReferenceData};
use crate::requests::{replay_estimate, EstimateRequest, EstimateResponse, SimulateRequest};
use aid_engine::error::AppError;
use aid_engine::estimation::{simulate, SimulationOutcome};
use axum::body::Bytes;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

pub(crate) fn estimation_routes() -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/estimate", post(estimate_endpoint))
        .route("/api/v1/simulate", post(simulate_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

// Bodies are decoded by hand so malformed input surfaces as a 400 with the serde message.
pub(crate) async fn estimate_endpoint(
    Extension(reference): Extension<Arc<ReferenceData>>,
    body: Bytes,
) -> Result<Json<EstimateResponse>, AppError> {
    let request: EstimateRequest = serde_json::from_slice(&body)?;
    let stage = request.stage;
    let result = replay_estimate(&reference, request)?;

    info!(
        stage = stage.label(),
        confirmed = result.confirmed.len(),
        potential = result.potential.len(),
        degraded = result.catalog_degraded,
        "estimate served"
    );
    Ok(Json(EstimateResponse::from(result)))
}

pub(crate) async fn simulate_endpoint(
    Extension(reference): Extension<Arc<ReferenceData>>,
    body: Bytes,
) -> Result<Json<SimulationOutcome>, AppError> {
    let request: SimulateRequest = serde_json::from_slice(&body)?;
    let outcome = simulate(&reference.bareme, request.qf, request.price_cents)?;
    Ok(Json(outcome))
}
