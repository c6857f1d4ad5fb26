//! Domain service for the attendance decision engine: face-gated check-in,
//! the credential-assisted fallback path, absence marking, and ledger reads.

use serde::Serialize;
use thiserror::Error;

use crate::db::{AttendanceRecord, DateFilter};

#[derive(Debug, Error)]
pub enum AttendanceError {
    /// Liveness gate tripped: no face found, or the eyes are too close
    /// together for a live capture.
    #[error("Face is too far from the camera or not clearly visible")]
    LivenessRejected,

    /// Detection was enforced and the image contained no usable face.
    #[error("No face detected in image")]
    NoFaceDetected,

    #[error("{0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    /// The face-analysis sidecar failed or answered garbage.
    #[error("Face analysis failed: {0}")]
    External(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AttendanceError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AttendanceError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Result of a check-in attempt. `AlreadyMarked` and `Rejected` are normal
/// outcomes, not errors.
#[derive(Debug, Clone)]
pub enum VerifyOutcome {
    Recorded {
        date: String,
        in_time: String,
        late_time: Option<String>,
        similarity: f64,
    },
    /// The ledger already holds a record for today; carries its in-time.
    AlreadyMarked { in_time: String },
    /// The comparison ran but did not clear the similarity bar.
    Rejected { similarity: f64 },
}

#[derive(Debug, Clone)]
pub enum AbsenceOutcome {
    Marked { date: String },
    AlreadyMarked,
    /// The absence cutoff hour has not passed yet.
    TooEarly,
}

/// One row of the all-employees roster view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    #[serde(rename = "employeeID")]
    pub employee_id: String,
    pub employee_name: String,
    pub department: String,
    pub email: String,
    pub status: String,
    pub in_time: Option<String>,
    pub late_time: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendancePercentage {
    pub present_days: usize,
    pub total_days: usize,
    #[serde(rename = "attendancePercentage")]
    pub percentage: f64,
}

#[async_trait::async_trait]
pub trait AttendanceService: Send + Sync {
    /// Live-camera check-in: liveness gate, lenient-detection comparison,
    /// 70% similarity bar, then an idempotent ledger write for today.
    ///
    /// # Errors
    ///
    /// Returns [`AttendanceError::LivenessRejected`] when the gate trips and
    /// [`AttendanceError::NotFound`] for an unknown employee. A failed match
    /// is a normal [`VerifyOutcome::Rejected`], not an error.
    async fn verify_and_record(
        &self,
        employee_id: &str,
        captured: &[u8],
        in_time: &str,
    ) -> Result<VerifyOutcome, AttendanceError>;

    /// Fallback check-in: no liveness gate, strict detection, 80% bar.
    /// A wrong password does not fail the attempt; the stored reference
    /// image is used either way. `in_time` defaults to the current time.
    async fn verify_fallback(
        &self,
        employee_id: &str,
        password: &str,
        captured: &[u8],
        in_time: Option<&str>,
    ) -> Result<VerifyOutcome, AttendanceError>;

    /// Marks the employee absent for today, only after the cutoff hour and
    /// only when no record exists yet.
    async fn mark_absent(&self, employee_id: &str) -> Result<AbsenceOutcome, AttendanceError>;

    /// Ledger rows for one employee under an optional date/month filter,
    /// newest first.
    async fn records(
        &self,
        employee_id: &str,
        filter: &DateFilter,
    ) -> Result<Vec<AttendanceRecord>, AttendanceError>;

    /// Full history for an existing employee.
    ///
    /// # Errors
    ///
    /// Returns [`AttendanceError::NotFound`] when the employee is unknown.
    async fn history(&self, employee_id: &str) -> Result<Vec<AttendanceRecord>, AttendanceError>;

    /// Every employee joined with their attendance record under the filter;
    /// the filter defaults to today when empty.
    async fn roster(&self, filter: &DateFilter) -> Result<Vec<RosterEntry>, AttendanceError>;

    /// Present days over all distinct ledger dates, as a percentage.
    /// An empty ledger yields zero.
    async fn percentage(
        &self,
        employee_id: &str,
    ) -> Result<AttendancePercentage, AttendanceError>;
}
