use serde::{Deserialize, Serialize};

use crate::db::AttendanceRecord;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// Non-fatal refusal that still carries a payload, like "already marked
    /// today" with the original in-time. Serves with HTTP 200.
    pub fn refusal(data: T, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Some(data),
            error: Some(message.into()),
        }
    }
}

// ============================================================================
// Identity lifecycle
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(rename = "employeeID")]
    pub employee_id: String,
    pub email: String,
    pub employee_name: String,
    pub department: String,
    /// Base64-encoded reference image.
    pub face_image: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    #[serde(rename = "employeeID")]
    pub employee_id: String,
    pub otp: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SendUpdateOtpRequest {
    #[serde(rename = "employeeID")]
    pub employee_id: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmployeeRequest {
    #[serde(rename = "employeeID")]
    pub employee_id: String,
    pub otp: String,
    pub employee_name: String,
    pub email: String,
    pub department: String,
    /// Absent to keep the stored reference image.
    pub face_image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(rename = "employeeID")]
    pub employee_id: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub otp: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: String,
    pub employee_name: String,
}

// ============================================================================
// Attendance
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    #[serde(rename = "employeeID")]
    pub employee_id: String,
    pub face_image: String,
    /// Clock-in time, HH:MM:SS.
    pub in_time: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyFallbackRequest {
    #[serde(rename = "employeeID")]
    pub employee_id: String,
    pub password: String,
    pub face_image: String,
    /// Defaults to the current time when absent.
    pub in_time: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MarkAbsentRequest {
    #[serde(rename = "employeeID")]
    pub employee_id: String,
}

#[derive(Debug, Deserialize)]
pub struct AttendanceQuery {
    #[serde(rename = "employeeID")]
    pub employee_id: String,
    /// Exact day, YYYY-MM-DD; takes precedence over `month`.
    pub date: Option<String>,
    /// Month prefix, YYYY-MM.
    pub month: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EmployeeQuery {
    #[serde(rename = "employeeID")]
    pub employee_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RosterQuery {
    pub date: Option<String>,
    pub month: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifySuccess {
    pub message: String,
    pub date: String,
    pub in_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub late_time: Option<String>,
    pub similarity_score: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRefusal {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_score: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecordDto {
    #[serde(rename = "employeeID")]
    pub employee_id: String,
    pub date: String,
    pub in_time: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub late_time: Option<String>,
}

impl From<AttendanceRecord> for AttendanceRecordDto {
    fn from(record: AttendanceRecord) -> Self {
        Self {
            employee_id: record.employee_id,
            date: record.date,
            in_time: record.in_time,
            status: record.status,
            late_time: record.late_time,
        }
    }
}

// ============================================================================
// Settings
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct InTimeUpdateRequest {
    /// New threshold, HH:MM.
    #[serde(rename = "inTimeThreshold")]
    pub in_time_threshold: String,
}

#[derive(Debug, Serialize)]
pub struct InTimeResponse {
    #[serde(rename = "inTimeThreshold")]
    pub in_time_threshold: String,
}
