//! Email dispatch behind the [`Notifier`] trait: a JSON client for a
//! transactional-mail HTTP API, plus a no-op used when the mailer is
//! disabled in config.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::MailerConfig;

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("Email delivery failed: {0}")]
    DeliveryFailed(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailerError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmailAddress {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailBody {
    sender: EmailAddress,
    to: Vec<EmailAddress>,
    subject: String,
    text_content: String,
}

pub struct MailApiClient {
    client: reqwest::Client,
    config: MailerConfig,
}

impl MailApiClient {
    pub fn new(config: MailerConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("Rollcall/0.1")
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build mail client: {e}"))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl Notifier for MailApiClient {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailerError> {
        let payload = SendEmailBody {
            sender: EmailAddress {
                email: self.config.sender_email.clone(),
                name: Some(self.config.sender_name.clone()),
            },
            to: vec![EmailAddress {
                email: to.to_string(),
                name: None,
            }],
            subject: subject.to_string(),
            text_content: body.to_string(),
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .header("api-key", &self.config.api_key)
            .header("Accept", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| MailerError::DeliveryFailed(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            info!("Email sent to {to}: {subject}");
            return Ok(());
        }

        let text = response.text().await.unwrap_or_default();
        Err(MailerError::DeliveryFailed(format!(
            "mail API returned {status}: {text}"
        )))
    }
}

/// Logs instead of sending; wired in when `mailer.enabled = false`.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn send(&self, to: &str, subject: &str, _body: &str) -> Result<(), MailerError> {
        debug!("Mailer disabled, skipping email to {to}: {subject}");
        Ok(())
    }
}
