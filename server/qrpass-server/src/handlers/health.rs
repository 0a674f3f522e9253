use crate::error::{api_success, ApiError, ApiResponse};
use crate::server::QrPassServer;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall system health status
    pub status: String,
    /// Current timestamp in RFC3339 format
    pub timestamp: String,
    /// API version
    pub version: String,
}

/// Version information response
#[derive(Debug, Serialize)]
pub struct VersionResponse {
    /// Application name
    pub name: String,
    /// Application version
    pub version: String,
}

/// Health check handler
pub async fn health_check() -> Result<Json<ApiResponse<HealthResponse>>, ApiError> {
    Ok(Json(api_success(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })))
}

/// Version information handler
pub async fn version_info(
    State(server): State<QrPassServer>,
) -> Result<Json<ApiResponse<VersionResponse>>, ApiError> {
    Ok(Json(api_success(VersionResponse {
        name: server.config.name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })))
}
