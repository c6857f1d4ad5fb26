use axum::{Json, extract::State};
use std::sync::Arc;

use super::{
    ApiError, ApiResponse, AppState, ForgotPasswordRequest, LoginRequest, LoginResponse,
    MessageResponse, RegisterRequest, ResetPasswordRequest, SendUpdateOtpRequest,
    UpdateEmployeeRequest, VerifyOtpRequest, validation,
};
use crate::services::{ProfileUpdate, RegistrationRequest};

/// POST /api/register
/// Validates registration details and emails an OTP; no identity exists yet.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let employee_id = validation::require_field(&payload.employee_id, "Employee ID")?;
    validation::require_field(&payload.email, "Email")?;
    validation::require_field(&payload.employee_name, "Employee name")?;
    validation::require_field(&payload.department, "Department")?;
    validation::decode_image(&payload.face_image)?;

    state
        .shared
        .enrollment_service
        .begin_registration(RegistrationRequest {
            employee_id: employee_id.to_string(),
            email: payload.email.trim().to_string(),
            employee_name: payload.employee_name.trim().to_string(),
            department: payload.department.trim().to_string(),
            face_image: payload.face_image.trim().to_string(),
        })
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "OTP sent to email for verification".to_string(),
    })))
}

/// POST /api/verify-otp
/// Consumes the registration OTP and creates the employee.
pub async fn verify_otp(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<VerifyOtpRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let employee_id = validation::require_field(&payload.employee_id, "Employee ID")?;
    let otp = validation::require_field(&payload.otp, "OTP")?;
    validation::require_field(&payload.password, "Password")?;

    state
        .shared
        .enrollment_service
        .confirm_registration(employee_id, otp, &payload.password)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Registration completed successfully".to_string(),
    })))
}

/// POST /api/send-update-otp
pub async fn send_update_otp(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SendUpdateOtpRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let employee_id = validation::require_field(&payload.employee_id, "Employee ID")?;
    let email = validation::require_field(&payload.email, "Email")?;

    state
        .shared
        .enrollment_service
        .begin_update(employee_id, email)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "OTP sent to email for update verification".to_string(),
    })))
}

/// POST /api/update-employee
/// Consumes the update OTP and applies new profile details.
pub async fn update_employee(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UpdateEmployeeRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let employee_id = validation::require_field(&payload.employee_id, "Employee ID")?;
    let otp = validation::require_field(&payload.otp, "OTP")?;
    validation::require_field(&payload.employee_name, "Employee name")?;
    validation::require_field(&payload.email, "Email")?;
    validation::require_field(&payload.department, "Department")?;
    if let Some(image) = &payload.face_image {
        validation::decode_image(image)?;
    }

    state
        .shared
        .enrollment_service
        .confirm_update(ProfileUpdate {
            employee_id: employee_id.to_string(),
            otp: otp.to_string(),
            employee_name: payload.employee_name.trim().to_string(),
            email: payload.email.trim().to_string(),
            department: payload.department.trim().to_string(),
            face_image: payload.face_image.map(|i| i.trim().to_string()),
        })
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Employee details updated successfully".to_string(),
    })))
}

/// POST /api/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let employee_id = validation::require_field(&payload.employee_id, "Employee ID")?;
    validation::require_field(&payload.password, "Password")?;

    let employee_name = state
        .shared
        .enrollment_service
        .login(employee_id, &payload.password)
        .await?;

    Ok(Json(ApiResponse::success(LoginResponse {
        message: format!("Login successful. Welcome, {employee_name}!"),
        employee_name,
    })))
}

/// POST /api/send-forgot-password-otp
pub async fn send_forgot_password_otp(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let email = validation::require_field(&payload.email, "Email")?;

    state
        .shared
        .enrollment_service
        .begin_password_reset(email)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "OTP sent to email for password reset".to_string(),
    })))
}

/// POST /api/reset-password
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let email = validation::require_field(&payload.email, "Email")?;
    let otp = validation::require_field(&payload.otp, "OTP")?;
    validation::require_field(&payload.password, "Password")?;

    state
        .shared
        .enrollment_service
        .confirm_password_reset(email, otp, &payload.password)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Password reset successfully".to_string(),
    })))
}
