//! Domain service for the OTP-gated identity lifecycle.
//!
//! Registration, profile updates, and password resets all follow the same
//! two-step shape: a `begin_*` call that validates, issues an OTP ticket and
//! emails the code, and a `confirm_*` call that consumes the ticket and
//! persists the change.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnrollmentError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    /// Bad OTP or bad credentials.
    #[error("{0}")]
    Auth(String),

    /// Email delivery or another upstream dependency failed.
    #[error("Upstream service failed: {0}")]
    External(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for EnrollmentError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for EnrollmentError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Everything needed to open a registration; held in the OTP ticket until
/// the code confirms.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    pub employee_id: String,
    pub email: String,
    pub employee_name: String,
    pub department: String,
    /// Base64-encoded reference image.
    pub face_image: String,
}

#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub employee_id: String,
    pub otp: String,
    pub employee_name: String,
    pub email: String,
    pub department: String,
    /// `None` keeps the stored reference image.
    pub face_image: Option<String>,
}

#[async_trait::async_trait]
pub trait EnrollmentService: Send + Sync {
    /// Validates the request, stages it behind a fresh OTP, and emails the
    /// code. No identity exists until the OTP confirms.
    ///
    /// # Errors
    ///
    /// Returns [`EnrollmentError::Conflict`] when the employee id or email is
    /// already registered; no email is sent in that case.
    async fn begin_registration(&self, request: RegistrationRequest) -> Result<(), EnrollmentError>;

    /// Consumes the registration OTP and creates the employee with the
    /// staged details and the given password.
    async fn confirm_registration(
        &self,
        employee_id: &str,
        otp: &str,
        password: &str,
    ) -> Result<(), EnrollmentError>;

    /// Issues an update OTP for an existing employee. Both id and email must
    /// match the stored record.
    async fn begin_update(&self, employee_id: &str, email: &str) -> Result<(), EnrollmentError>;

    /// Consumes the update OTP and applies the new profile details.
    async fn confirm_update(&self, update: ProfileUpdate) -> Result<(), EnrollmentError>;

    /// Verifies credentials and returns the employee's display name.
    ///
    /// # Errors
    ///
    /// Returns [`EnrollmentError::Auth`] on a bad id/password pair.
    async fn login(&self, employee_id: &str, password: &str) -> Result<String, EnrollmentError>;

    /// Issues a password-reset OTP for the account registered under `email`.
    async fn begin_password_reset(&self, email: &str) -> Result<(), EnrollmentError>;

    /// Consumes the reset OTP and replaces the password.
    async fn confirm_password_reset(
        &self,
        email: &str,
        otp: &str,
        password: &str,
    ) -> Result<(), EnrollmentError>;
}
