use chrono::Utc;

use crate::delivery::{self, DeliveryReport, DeliveryStatus};
use crate::error::AppError;
use crate::models::Inquiry;
use crate::notify::{self, NotificationKind};
use crate::state::{AppState, SharedState};

use super::fields;
use super::metadata::RequestMetadata;
use super::priority::Priority;
use super::record::{RawSubmission, SubmissionRecord};
use super::response_id::ResponseId;

pub struct ProcessOutcome {
    pub record: SubmissionRecord,
    pub persisted: bool,
    pub deliveries: DeliveryReport,
}

/// Run one submission through extraction, classification, persistence and
/// notification.
///
/// Persistence and delivery faults are logged and reported in the outcome;
/// they never abort the remaining steps.
pub async fn process(
    state: &AppState,
    raw: &RawSubmission,
    metadata: &RequestMetadata,
) -> ProcessOutcome {
    let intake = &state.config.intake;

    let fields = fields::extract(raw);
    let response_id = ResponseId::generate(&intake.response_id_prefix);
    let record = SubmissionRecord::new(response_id, fields, intake.priority_policy, Utc::now());

    tracing::info!(
        "Submission {} classified {} (triggers: {:?})",
        record.response_id(),
        record.priority(),
        record.triggers()
    );

    let inquiry = Inquiry::from_record(&record, metadata.to_json());
    let persisted = match state.sink.append(&inquiry).await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!("Failed to store submission {}: {e}", record.response_id());
            false
        }
    };

    let mut set = notify::build_notifications(&record, &state.config.business);

    if !intake.email_notifications {
        let (kept, disabled): (Vec<_>, Vec<_>) = set
            .notifications
            .into_iter()
            .partition(|n| n.kind == NotificationKind::UrgentAlert);
        set.notifications = kept;
        for n in disabled {
            set.skipped.push(notify::SkippedNotification {
                kind: n.kind,
                reason: "email notifications disabled".to_string(),
            });
        }
    }

    let mut deliveries =
        delivery::dispatch(state.mailer.as_ref(), &set.notifications, intake.send_timeout).await;
    deliveries.record_skipped(&set.skipped);

    if record.priority() == Priority::High {
        if let (Some(slack), Some(urgent)) =
            (state.slack.as_ref(), set.get(NotificationKind::UrgentAlert))
        {
            deliveries.push(slack.deliver(urgent).await);
        }
    }

    for outcome in &deliveries.outcomes {
        if let Err(e) = state
            .sink
            .record_delivery(record.response_id().as_str(), outcome)
            .await
        {
            tracing::warn!(
                "Failed to log {} delivery for {}: {e}",
                outcome.kind,
                record.response_id()
            );
        }
    }

    tracing::info!(
        "Submission {} processed ({} of {} notifications delivered)",
        record.response_id(),
        deliveries.delivered(),
        deliveries.outcomes.len()
    );
    for failed in deliveries.failed() {
        tracing::warn!(
            "Submission {}: {} to {} was not delivered",
            record.response_id(),
            failed.kind,
            failed.recipient
        );
    }

    ProcessOutcome {
        record,
        persisted,
        deliveries,
    }
}

/// Top-level submission handler.
///
/// Processing runs on its own task so a panic inside it is caught here,
/// logged and reported to the admin by email.
pub async fn handle(
    state: &SharedState,
    raw: RawSubmission,
    metadata: RequestMetadata,
) -> Result<ProcessOutcome, AppError> {
    let task_state = state.clone();
    let joined = tokio::spawn(async move { process(&task_state, &raw, &metadata).await }).await;

    match joined {
        Ok(outcome) => Ok(outcome),
        Err(e) => {
            let message = format!("Submission processing aborted: {e}");
            tracing::error!("{message}");
            report_failure(state, "processing a submission", &message).await;
            Err(AppError::Internal(message))
        }
    }
}

/// Email the admin about a system error. A failure here is only logged.
pub async fn report_failure(state: &AppState, context: &str, error: &str) {
    let notification = match notify::error_alert(&state.config.business, context, error) {
        Ok(n) => n,
        Err(e) => {
            tracing::error!("Cannot render error notification: {e}");
            return;
        }
    };

    let outcome = delivery::deliver(
        state.mailer.as_ref(),
        &notification,
        state.config.intake.send_timeout,
    )
    .await;

    if let DeliveryStatus::Failed(reason) = outcome.status {
        tracing::error!("Cannot send error notification: {reason}");
    }
}
