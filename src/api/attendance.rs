use axum::{
    Json,
    extract::{Query, State},
};
use std::sync::Arc;

use super::{
    ApiError, ApiResponse, AppState, AttendanceQuery, AttendanceRecordDto, EmployeeQuery,
    MarkAbsentRequest, RosterQuery, VerifyFallbackRequest, VerifyRefusal, VerifyRequest,
    VerifySuccess, validation,
};
use crate::db::DateFilter;
use crate::services::{AbsenceOutcome, AttendancePercentage, RosterEntry, VerifyOutcome};

fn verify_response(outcome: VerifyOutcome) -> Json<ApiResponse<serde_json::Value>> {
    match outcome {
        VerifyOutcome::Recorded {
            date,
            in_time,
            late_time,
            similarity,
        } => {
            let body = VerifySuccess {
                message: "Attendance recorded successfully".to_string(),
                date,
                in_time,
                late_time,
                similarity_score: similarity,
            };
            Json(ApiResponse::success(
                serde_json::to_value(body).unwrap_or_default(),
            ))
        }
        VerifyOutcome::AlreadyMarked { in_time } => {
            let body = VerifyRefusal {
                in_time: Some(in_time),
                similarity_score: None,
            };
            Json(ApiResponse::refusal(
                serde_json::to_value(body).unwrap_or_default(),
                "Attendance already marked for today",
            ))
        }
        VerifyOutcome::Rejected { similarity } => {
            let body = VerifyRefusal {
                in_time: None,
                similarity_score: Some(similarity),
            };
            Json(ApiResponse::refusal(
                serde_json::to_value(body).unwrap_or_default(),
                "Face verification failed",
            ))
        }
    }
}

/// POST /api/verify
/// Live-camera check-in: liveness gate, face comparison, ledger write.
pub async fn verify(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<VerifyRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let employee_id = validation::require_field(&payload.employee_id, "Employee ID")?;
    let captured = validation::decode_image(&payload.face_image)?;
    let in_time = validation::require_field(&payload.in_time, "In-time")?;

    let outcome = state
        .shared
        .attendance_service
        .verify_and_record(employee_id, &captured, in_time)
        .await?;

    Ok(verify_response(outcome))
}

/// POST /api/verify-fallback
/// Credential-assisted check-in with strict face detection.
pub async fn verify_fallback(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<VerifyFallbackRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let employee_id = validation::require_field(&payload.employee_id, "Employee ID")?;
    validation::require_field(&payload.password, "Password")?;
    let captured = validation::decode_image(&payload.face_image)?;

    let outcome = state
        .shared
        .attendance_service
        .verify_fallback(
            employee_id,
            &payload.password,
            &captured,
            payload.in_time.as_deref(),
        )
        .await?;

    Ok(verify_response(outcome))
}

/// POST /api/mark-absent
/// Marks today as absent, only after the cutoff hour.
pub async fn mark_absent(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<MarkAbsentRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let employee_id = validation::require_field(&payload.employee_id, "Employee ID")?;

    let outcome = state.shared.attendance_service.mark_absent(employee_id).await?;

    let response = match outcome {
        AbsenceOutcome::Marked { date } => ApiResponse::success(serde_json::json!({
            "message": "Employee marked absent",
            "date": date,
        })),
        AbsenceOutcome::AlreadyMarked => ApiResponse::refusal(
            serde_json::Value::Null,
            "Attendance already marked for today",
        ),
        AbsenceOutcome::TooEarly => ApiResponse::refusal(
            serde_json::Value::Null,
            "Too early to mark absent",
        ),
    };

    Ok(Json(response))
}

/// GET /api/attendance-records?employeeID=..&date=..|month=..
pub async fn attendance_records(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AttendanceQuery>,
) -> Result<Json<ApiResponse<Vec<AttendanceRecordDto>>>, ApiError> {
    let employee_id = validation::require_field(&query.employee_id, "Employee ID")?;

    let filter = DateFilter {
        date: query.date,
        month: query.month,
    };

    let records = state
        .shared
        .attendance_service
        .records(employee_id, &filter)
        .await?;

    Ok(Json(ApiResponse::success(
        records.into_iter().map(AttendanceRecordDto::from).collect(),
    )))
}

/// GET /api/employee-history?employeeID=..
pub async fn employee_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EmployeeQuery>,
) -> Result<Json<ApiResponse<Vec<AttendanceRecordDto>>>, ApiError> {
    let employee_id = validation::require_field(&query.employee_id, "Employee ID")?;

    let records = state.shared.attendance_service.history(employee_id).await?;

    Ok(Json(ApiResponse::success(
        records.into_iter().map(AttendanceRecordDto::from).collect(),
    )))
}

/// GET /api/employees
/// Every employee joined with their attendance under the filter (today by
/// default).
pub async fn roster(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RosterQuery>,
) -> Result<Json<ApiResponse<Vec<RosterEntry>>>, ApiError> {
    let filter = DateFilter {
        date: query.date,
        month: query.month,
    };

    let entries = state.shared.attendance_service.roster(&filter).await?;

    Ok(Json(ApiResponse::success(entries)))
}

/// POST /api/attendance
/// Attendance percentage for one employee over all recorded dates.
pub async fn attendance_percentage(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<MarkAbsentRequest>,
) -> Result<Json<ApiResponse<AttendancePercentage>>, ApiError> {
    let employee_id = validation::require_field(&payload.employee_id, "Employee ID")?;

    let stats = state.shared.attendance_service.percentage(employee_id).await?;

    Ok(Json(ApiResponse::success(stats)))
}
