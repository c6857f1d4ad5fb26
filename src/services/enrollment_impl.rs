//! `SeaORM` implementation of the `EnrollmentService` trait.

use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

use crate::clients::mailer::Notifier;
use crate::db::{EmployeeUpdate, NewEmployee, Store};
use crate::services::enrollment::{
    EnrollmentError, EnrollmentService, ProfileUpdate, RegistrationRequest,
};
use crate::services::otp::{OtpError, OtpKind, OtpVault, RegistrationPayload};

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"))
}

pub struct SeaOrmEnrollmentService {
    store: Store,
    vault: OtpVault,
    notifier: Arc<dyn Notifier>,
}

impl SeaOrmEnrollmentService {
    #[must_use]
    pub fn new(store: Store, vault: OtpVault, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            vault,
            notifier,
        }
    }

    /// Emails an OTP; on delivery failure the just-issued ticket is
    /// discarded so a dead mailbox never leaves a confirmable code behind.
    async fn dispatch_otp(
        &self,
        employee_id: &str,
        email: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), EnrollmentError> {
        if let Err(e) = self.notifier.send(email, subject, body).await {
            warn!("OTP email to {email} failed: {e}");
            self.vault.discard(employee_id).await;
            return Err(EnrollmentError::External(
                "Failed to send OTP email".to_string(),
            ));
        }
        Ok(())
    }
}

fn map_otp_error(err: OtpError) -> EnrollmentError {
    match err {
        OtpError::Invalid => EnrollmentError::Auth("Invalid OTP".to_string()),
        OtpError::Expired => EnrollmentError::Auth("OTP has expired".to_string()),
    }
}

#[async_trait]
impl EnrollmentService for SeaOrmEnrollmentService {
    async fn begin_registration(&self, request: RegistrationRequest) -> Result<(), EnrollmentError> {
        if !email_regex().is_match(&request.email) {
            return Err(EnrollmentError::Validation(
                "Invalid email format".to_string(),
            ));
        }

        // All conflict checks run before the OTP is issued, so a rejected
        // registration has no side effects.
        if self.store.get_employee(&request.employee_id).await?.is_some() {
            return Err(EnrollmentError::Conflict(
                "Employee ID already registered".to_string(),
            ));
        }
        if self
            .store
            .get_employee_by_email(&request.email)
            .await?
            .is_some()
        {
            return Err(EnrollmentError::Conflict(
                "Email already registered".to_string(),
            ));
        }

        let payload = RegistrationPayload {
            employee_name: request.employee_name,
            department: request.department,
            face_image: request.face_image,
        };
        let code = self
            .vault
            .issue(
                &request.employee_id,
                &request.email,
                OtpKind::Registration,
                Some(payload),
            )
            .await;

        self.dispatch_otp(
            &request.employee_id,
            &request.email,
            "Verify Your Email - Face Recognition System",
            &format!("Your OTP for registration is: {code}. Please use this to set your password."),
        )
        .await?;

        info!("Registration OTP sent for employee {}", request.employee_id);
        Ok(())
    }

    async fn confirm_registration(
        &self,
        employee_id: &str,
        otp: &str,
        password: &str,
    ) -> Result<(), EnrollmentError> {
        let ticket = self
            .vault
            .confirm(employee_id, otp, OtpKind::Registration)
            .await
            .map_err(map_otp_error)?;

        let payload = ticket.payload.ok_or_else(|| {
            EnrollmentError::Internal("Registration ticket missing staged details".to_string())
        })?;

        self.store
            .insert_employee(NewEmployee {
                employee_id: employee_id.to_string(),
                email: ticket.email,
                employee_name: payload.employee_name,
                department: payload.department,
                password: password.to_string(),
                face_image: payload.face_image,
            })
            .await?;

        info!("Employee {employee_id} registered");
        Ok(())
    }

    async fn begin_update(&self, employee_id: &str, email: &str) -> Result<(), EnrollmentError> {
        let employee = self
            .store
            .get_employee_by_id_and_email(employee_id, email)
            .await?
            .ok_or_else(|| {
                EnrollmentError::NotFound(
                    "No employee found with this ID and email".to_string(),
                )
            })?;

        let code = self
            .vault
            .issue(&employee.employee_id, email, OtpKind::Update, None)
            .await;

        self.dispatch_otp(
            employee_id,
            email,
            "Update Your Details - Face Recognition System",
            &format!("Your OTP for updating your details is: {code}. Please use this to proceed."),
        )
        .await
    }

    async fn confirm_update(&self, update: ProfileUpdate) -> Result<(), EnrollmentError> {
        if !email_regex().is_match(&update.email) {
            return Err(EnrollmentError::Validation(
                "Invalid email format".to_string(),
            ));
        }

        self.vault
            .confirm(&update.employee_id, &update.otp, OtpKind::Update)
            .await
            .map_err(map_otp_error)?;

        self.store
            .update_employee_details(
                &update.employee_id,
                EmployeeUpdate {
                    employee_name: update.employee_name,
                    email: update.email,
                    department: update.department,
                    face_image: update.face_image,
                },
            )
            .await?;

        info!("Employee {} details updated", update.employee_id);
        Ok(())
    }

    async fn login(&self, employee_id: &str, password: &str) -> Result<String, EnrollmentError> {
        let is_valid = self
            .store
            .verify_employee_password(employee_id, password)
            .await?;

        if !is_valid {
            return Err(EnrollmentError::Auth(
                "Invalid employee ID or password".to_string(),
            ));
        }

        let employee = self
            .store
            .get_employee(employee_id)
            .await?
            .ok_or_else(|| EnrollmentError::Internal("Employee vanished after login".to_string()))?;

        Ok(employee.employee_name)
    }

    async fn begin_password_reset(&self, email: &str) -> Result<(), EnrollmentError> {
        let employee = self
            .store
            .get_employee_by_email(email)
            .await?
            .ok_or_else(|| EnrollmentError::NotFound("Email not registered".to_string()))?;

        let code = self
            .vault
            .issue(&employee.employee_id, email, OtpKind::PasswordReset, None)
            .await;

        self.dispatch_otp(
            &employee.employee_id,
            email,
            "Reset Your Password - Face Recognition System",
            &format!(
                "Your OTP to reset your password is: {code}. Please use this to set a new password."
            ),
        )
        .await
    }

    async fn confirm_password_reset(
        &self,
        email: &str,
        otp: &str,
        password: &str,
    ) -> Result<(), EnrollmentError> {
        let employee = self
            .store
            .get_employee_by_email(email)
            .await?
            .ok_or_else(|| EnrollmentError::NotFound("Email not registered".to_string()))?;

        self.vault
            .confirm(&employee.employee_id, otp, OtpKind::PasswordReset)
            .await
            .map_err(map_otp_error)?;

        self.store
            .update_employee_password(&employee.employee_id, password)
            .await?;

        info!("Password reset for employee {}", employee.employee_id);
        Ok(())
    }
}
