//! Best-effort delivery of notification payloads.
//!
//! Every payload is sent on its own: a failure or timeout is logged and
//! recorded in the [`DeliveryReport`], and the next payload is still tried.

pub mod mailer;
pub mod webhook;

use std::time::Duration;

use serde::Serialize;

use crate::notify::{Notification, NotificationKind, SkippedNotification};

pub use mailer::{LogMailer, Mailer, RecordingMailer, SentMail, SmtpMailer};
pub use webhook::SlackNotifier;

#[derive(Debug)]
pub struct DeliveryError {
    pub message: String,
}

impl std::fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for DeliveryError {}

impl From<String> for DeliveryError {
    fn from(s: String) -> Self {
        DeliveryError { message: s }
    }
}

impl From<&str> for DeliveryError {
    fn from(s: &str) -> Self {
        DeliveryError {
            message: s.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    Delivered,
    Failed(String),
    Skipped(String),
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Failed(_) => "failed",
            DeliveryStatus::Skipped(_) => "skipped",
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            DeliveryStatus::Delivered => None,
            DeliveryStatus::Failed(d) | DeliveryStatus::Skipped(d) => Some(d.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub kind: NotificationKind,
    pub recipient: String,
    pub status: DeliveryStatus,
}

impl Serialize for DeliveryOutcome {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Flat<'a> {
            kind: NotificationKind,
            recipient: &'a str,
            status: &'static str,
            #[serde(skip_serializing_if = "Option::is_none")]
            detail: Option<&'a str>,
        }

        Flat {
            kind: self.kind,
            recipient: &self.recipient,
            status: self.status.as_str(),
            detail: self.status.detail(),
        }
        .serialize(serializer)
    }
}

/// One outcome per payload that was attempted or skipped for a submission.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct DeliveryReport {
    pub outcomes: Vec<DeliveryOutcome>,
}

impl DeliveryReport {
    pub fn push(&mut self, outcome: DeliveryOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn record_skipped(&mut self, skipped: &[SkippedNotification]) {
        for s in skipped {
            self.outcomes.push(DeliveryOutcome {
                kind: s.kind,
                recipient: String::new(),
                status: DeliveryStatus::Skipped(s.reason.clone()),
            });
        }
    }

    pub fn get(&self, kind: NotificationKind) -> Option<&DeliveryOutcome> {
        self.outcomes.iter().find(|o| o.kind == kind)
    }

    pub fn delivered(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == DeliveryStatus::Delivered)
            .count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &DeliveryOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, DeliveryStatus::Failed(_)))
    }
}

/// Send one payload, bounded by `timeout`. Never returns an error.
pub async fn deliver(
    mailer: &dyn Mailer,
    notification: &Notification,
    timeout: Duration,
) -> DeliveryOutcome {
    let status = match tokio::time::timeout(
        timeout,
        mailer.send(&notification.to, &notification.subject, &notification.body),
    )
    .await
    {
        Ok(Ok(())) => {
            tracing::info!(
                "Sent {} to {} via {}",
                notification.kind,
                notification.to,
                mailer.name()
            );
            DeliveryStatus::Delivered
        }
        Ok(Err(e)) => {
            tracing::error!(
                "Failed to send {} to {}: {e}",
                notification.kind,
                notification.to
            );
            DeliveryStatus::Failed(e.message)
        }
        Err(_) => {
            let msg = format!("timed out after {}ms", timeout.as_millis());
            tracing::warn!(
                "Sending {} to {} {msg}",
                notification.kind,
                notification.to
            );
            DeliveryStatus::Failed(msg)
        }
    };

    DeliveryOutcome {
        kind: notification.kind,
        recipient: notification.to.clone(),
        status,
    }
}

/// Send every payload in order. A failed send does not stop the rest.
pub async fn dispatch(
    mailer: &dyn Mailer,
    notifications: &[Notification],
    timeout: Duration,
) -> DeliveryReport {
    let mut report = DeliveryReport::default();
    for notification in notifications {
        report.push(deliver(mailer, notification, timeout).await);
    }
    report
}
