use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::{Capabilities, SharedState};

mod attendance;
mod enrollment;
mod error;
mod settings;
mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,
}

pub async fn create_app_state(shared: Arc<SharedState>) -> anyhow::Result<Arc<AppState>> {
    Ok(Arc::new(AppState { shared }))
}

pub async fn create_app_state_from_config(config: Config) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    create_app_state(shared).await
}

/// Test wiring: same state graph with injected face/mail capabilities.
pub async fn create_app_state_with_capabilities(
    config: Config,
    capabilities: Capabilities,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::with_capabilities(config, capabilities).await?);
    create_app_state(shared).await
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.shared.config.server.cors_allowed_origins.clone();

    let api_router = Router::new()
        .route("/register", post(enrollment::register))
        .route("/verify-otp", post(enrollment::verify_otp))
        .route("/send-update-otp", post(enrollment::send_update_otp))
        .route("/update-employee", post(enrollment::update_employee))
        .route("/login", post(enrollment::login))
        .route(
            "/send-forgot-password-otp",
            post(enrollment::send_forgot_password_otp),
        )
        .route("/reset-password", post(enrollment::reset_password))
        .route("/in-time", get(settings::get_in_time))
        .route("/update-in-time", post(settings::update_in_time))
        .route("/verify", post(attendance::verify))
        .route("/verify-fallback", post(attendance::verify_fallback))
        .route("/mark-absent", post(attendance::mark_absent))
        .route("/attendance-records", get(attendance::attendance_records))
        .route("/employee-history", get(attendance::employee_history))
        .route("/employees", get(attendance::roster))
        .route("/attendance", post(attendance::attendance_percentage))
        .with_state(state);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}
