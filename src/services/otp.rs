//! In-process OTP ticket store.
//!
//! One live ticket per employee id; issuing overwrites, confirming consumes.
//! Tickets expire `ttl` after issuance, checked at confirm time.

use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OtpError {
    /// No ticket, wrong code, or wrong operation kind. The ticket (if any)
    /// stays live.
    #[error("Invalid OTP")]
    Invalid,

    #[error("OTP has expired")]
    Expired,
}

/// The account operation a ticket was issued for. A code only confirms the
/// kind it was issued under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpKind {
    Registration,
    Update,
    PasswordReset,
}

/// Pending registration details held until the OTP confirms.
#[derive(Debug, Clone)]
pub struct RegistrationPayload {
    pub employee_name: String,
    pub department: String,
    pub face_image: String,
}

#[derive(Debug, Clone)]
pub struct OtpTicket {
    code: String,
    pub email: String,
    pub kind: OtpKind,
    pub payload: Option<RegistrationPayload>,
    issued_at: Instant,
}

#[derive(Clone)]
pub struct OtpVault {
    tickets: Arc<RwLock<HashMap<String, OtpTicket>>>,
    ttl: Duration,
}

impl OtpVault {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            tickets: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Issues a fresh 6-digit code for `employee_id`, replacing any prior
    /// ticket regardless of its kind.
    pub async fn issue(
        &self,
        employee_id: &str,
        email: &str,
        kind: OtpKind,
        payload: Option<RegistrationPayload>,
    ) -> String {
        let code = generate_code();

        let ticket = OtpTicket {
            code: code.clone(),
            email: email.to_string(),
            kind,
            payload,
            issued_at: Instant::now(),
        };

        self.tickets
            .write()
            .await
            .insert(employee_id.to_string(), ticket);

        debug!("Issued {kind:?} OTP for employee {employee_id}");
        code
    }

    /// Consumes the ticket for `employee_id` when `code` and `kind` match
    /// and the ticket has not expired. Removal happens under the write lock,
    /// so a code confirms at most once.
    pub async fn confirm(
        &self,
        employee_id: &str,
        code: &str,
        kind: OtpKind,
    ) -> Result<OtpTicket, OtpError> {
        let mut tickets = self.tickets.write().await;

        let ticket = tickets.get(employee_id).ok_or(OtpError::Invalid)?;

        if ticket.code != code || ticket.kind != kind {
            return Err(OtpError::Invalid);
        }

        if ticket.issued_at.elapsed() > self.ttl {
            tickets.remove(employee_id);
            return Err(OtpError::Expired);
        }

        tickets.remove(employee_id).ok_or(OtpError::Invalid)
    }

    pub async fn discard(&self, employee_id: &str) {
        self.tickets.write().await.remove(employee_id);
    }
}

/// Uniformly random 6-digit code, 100000..=999999.
fn generate_code() -> String {
    let mut rng = rand::rng();
    rng.random_range(100_000..=999_999).to_string()
}
