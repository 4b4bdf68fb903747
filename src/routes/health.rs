use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    response::{ApiResponse, Meta},
    state::AppState,
};

#[derive(Serialize, ToSchema)]
pub struct HealthData {
    pub status: String,
    pub version: String,
}

#[derive(Serialize, ToSchema)]
pub struct ReadinessData {
    pub status: String,
    pub database: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Process is up", body = ApiResponse<HealthData>),
    ),
    tag = "Health"
)]
pub async fn health_check() -> Json<ApiResponse<HealthData>> {
    let data = HealthData {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    Json(ApiResponse::success(
        "Health check",
        data,
        Some(Meta::empty()),
    ))
}

#[utoipa::path(
    get,
    path = "/health/ready",
    responses(
        (status = 200, description = "Database reachable", body = ApiResponse<ReadinessData>),
        (status = 503, description = "Database unreachable", body = ApiResponse<ReadinessData>),
    ),
    tag = "Health"
)]
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<ApiResponse<ReadinessData>>) {
    let (status, database) = match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => (StatusCode::OK, "up"),
        Err(err) => {
            tracing::warn!(error = %err, "readiness check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "down")
        }
    };
    let data = ReadinessData {
        status: if status.is_success() { "ok" } else { "degraded" }.to_string(),
        database: database.to_string(),
    };
    (
        status,
        Json(ApiResponse::success("Readiness check", data, Some(Meta::empty()))),
    )
}
