use std::collections::HashSet;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tokio::sync::Mutex;

use super::DeliveryError;
use crate::config::SmtpConfig;

/// Sends a single plain-text email.
#[async_trait]
pub trait Mailer: Send + Sync {
    fn name(&self) -> &str;
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), DeliveryError>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, DeliveryError> {
        let creds = Credentials::new(config.user.clone(), config.pass.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| DeliveryError::from(format!("SMTP relay error: {e}")))?
            .port(config.port)
            .credentials(creds)
            .build();

        Ok(Self {
            transport,
            from: config.from.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    fn name(&self) -> &str {
        "smtp"
    }

    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), DeliveryError> {
        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| DeliveryError::from(format!("Invalid from address: {e}")))?,
            )
            .to(to
                .parse()
                .map_err(|e| DeliveryError::from(format!("Invalid to address: {e}")))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| DeliveryError::from(format!("Failed to build email: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| DeliveryError::from(format!("Failed to send email: {e}")))?;

        Ok(())
    }
}

/// Stand-in used when SMTP is not configured. Logs the message and reports success.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), DeliveryError> {
        tracing::info!(to, subject, "Mail (SMTP not configured)");
        tracing::debug!("{body}");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Keeps every message in memory. Recipients registered with
/// [`RecordingMailer::fail_for`] get an error instead.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentMail>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn fail_for(&self, recipient: &str) {
        self.failing.lock().await.insert(recipient.to_string());
    }

    pub async fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_to(&self, recipient: &str) -> Vec<SentMail> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|m| m.to == recipient)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), DeliveryError> {
        if self.failing.lock().await.contains(to) {
            return Err(DeliveryError::from(format!("mailbox {to} rejected the message")));
        }
        self.sent.lock().await.push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}
