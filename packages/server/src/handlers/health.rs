use axum::Json;
use axum::http::{Method, Uri};
use serde::Serialize;

use crate::error::AppError;
use crate::models::shared::ApiResponse;

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: &'static str,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    operation_id = "health",
    summary = "Liveness probe",
    responses((status = 200, description = "Server is up", body = ApiResponse<HealthResponse>)),
)]
pub async fn health() -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::ok(HealthResponse { status: "ok" }))
}

/// Fallback for unmatched routes.
pub async fn not_found(method: Method, uri: Uri) -> AppError {
    AppError::NotFound(format!("Route {method} {} not found", uri.path()))
}
