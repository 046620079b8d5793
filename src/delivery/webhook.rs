use std::time::Duration;

use serde_json::json;

use super::{DeliveryError, DeliveryOutcome, DeliveryStatus};
use crate::notify::Notification;

/// Posts urgent alerts to a Slack-compatible incoming webhook.
pub struct SlackNotifier {
    client: reqwest::Client,
    url: String,
}

impl SlackNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DeliveryError::from(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub async fn post(&self, notification: &Notification) -> Result<(), DeliveryError> {
        let text = format!("*{}*\n{}", notification.subject, notification.body);

        let resp = self
            .client
            .post(&self.url)
            .json(&json!({ "text": text }))
            .send()
            .await
            .map_err(|e| DeliveryError::from(format!("Webhook request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(256)
                .collect::<String>();
            return Err(DeliveryError::from(format!(
                "Webhook returned {}: {body}",
                status.as_u16()
            )));
        }

        Ok(())
    }

    /// Like [`SlackNotifier::post`] but folds the result into an outcome.
    pub async fn deliver(&self, notification: &Notification) -> DeliveryOutcome {
        let status = match self.post(notification).await {
            Ok(()) => {
                tracing::info!("Posted {} to Slack", notification.kind);
                DeliveryStatus::Delivered
            }
            Err(e) => {
                tracing::error!("Slack alert for {} failed: {e}", notification.kind);
                DeliveryStatus::Failed(e.message)
            }
        };

        DeliveryOutcome {
            kind: notification.kind,
            recipient: "slack".to_string(),
            status,
        }
    }
}
