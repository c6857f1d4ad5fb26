use axum::{Json, extract::State};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, InTimeResponse, InTimeUpdateRequest, validation};

/// GET /api/in-time
/// The current in-time threshold, initializing it from config on first read.
pub async fn get_in_time(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<InTimeResponse>>, ApiError> {
    let in_time_threshold = state
        .shared
        .store
        .get_in_time_threshold(&state.shared.config.attendance.default_in_time)
        .await?;

    Ok(Json(ApiResponse::success(InTimeResponse {
        in_time_threshold,
    })))
}

/// POST /api/update-in-time
pub async fn update_in_time(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<InTimeUpdateRequest>,
) -> Result<Json<ApiResponse<InTimeResponse>>, ApiError> {
    let threshold = validation::validate_threshold(&payload.in_time_threshold)?;

    state.shared.store.set_in_time_threshold(threshold).await?;

    tracing::info!("In-time threshold updated to {threshold}");

    Ok(Json(ApiResponse::success(InTimeResponse {
        in_time_threshold: threshold.to_string(),
    })))
}
