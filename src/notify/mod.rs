//! Outbound message construction.
//!
//! Nothing here sends mail. Builders turn a classified [`SubmissionRecord`]
//! (or a report / error) into [`Notification`] payloads that the delivery
//! layer hands to a [`crate::delivery::Mailer`].

pub mod templates;

use askama::Template;
use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::config::BusinessSettings;
use crate::store::DailyStats;
use crate::submission::priority::Priority;
use crate::submission::record::SubmissionRecord;

pub const NOT_SPECIFIED: &str = "Not specified";
pub const TO_BE_DISCUSSED: &str = "To be discussed";
pub const NO_DETAILS: &str = "No additional details provided";
pub const INDIVIDUAL: &str = "Individual";
pub const NOT_PROVIDED: &str = "Not provided";
const GREETING_FALLBACK: &str = "there";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ClientConfirmation,
    AdminAlert,
    UrgentAlert,
    ErrorAlert,
    DailyReport,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::ClientConfirmation => "client_confirmation",
            NotificationKind::AdminAlert => "admin_alert",
            NotificationKind::UrgentAlert => "urgent_alert",
            NotificationKind::ErrorAlert => "error_alert",
            NotificationKind::DailyReport => "daily_report",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// A payload that was deliberately not built, with the reason.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedNotification {
    pub kind: NotificationKind,
    pub reason: String,
}

/// Everything produced for one submission.
#[derive(Debug, Clone, Default)]
pub struct NotificationSet {
    pub notifications: Vec<Notification>,
    pub skipped: Vec<SkippedNotification>,
}

impl NotificationSet {
    pub fn get(&self, kind: NotificationKind) -> Option<&Notification> {
        self.notifications.iter().find(|n| n.kind == kind)
    }

    fn push(&mut self, kind: NotificationKind, built: Result<Notification, askama::Error>) {
        match built {
            Ok(notification) => self.notifications.push(notification),
            Err(e) => {
                tracing::error!("Failed to render {kind} notification: {e}");
                self.skip(kind, format!("template error: {e}"));
            }
        }
    }

    fn skip(&mut self, kind: NotificationKind, reason: impl Into<String>) {
        self.skipped.push(SkippedNotification {
            kind,
            reason: reason.into(),
        });
    }
}

fn or<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or(fallback)
}

/// Build the client confirmation, admin alert and (for HIGH priority) the
/// urgent alert for a submission.
///
/// A submission without an email address gets no client confirmation; it
/// is reported in [`NotificationSet::skipped`] instead.
pub fn build_notifications(record: &SubmissionRecord, business: &BusinessSettings) -> NotificationSet {
    let mut set = NotificationSet::default();

    match record.fields().email.as_deref().filter(|e| !e.trim().is_empty()) {
        Some(email) => set.push(
            NotificationKind::ClientConfirmation,
            client_confirmation(record, business, email),
        ),
        None => set.skip(NotificationKind::ClientConfirmation, "no client email"),
    }

    set.push(NotificationKind::AdminAlert, admin_alert(record, business));

    if record.priority() == Priority::High {
        set.push(NotificationKind::UrgentAlert, urgent_alert(record, business));
    }

    set
}

fn client_confirmation(
    record: &SubmissionRecord,
    business: &BusinessSettings,
    to: &str,
) -> Result<Notification, askama::Error> {
    let f = record.fields();
    let body = templates::ClientConfirmation {
        company_name: &business.company_name,
        name: or(f.name.as_deref(), GREETING_FALLBACK),
        response_id: record.response_id().as_str(),
        services: or(f.services.as_deref(), NOT_SPECIFIED),
        timeline: or(f.timeline.as_deref(), NOT_SPECIFIED),
        budget: or(f.budget.as_deref(), TO_BE_DISCUSSED),
        business_email: &business.business_email,
        link_url: &business.link_url,
    }
    .render()?;

    Ok(Notification {
        kind: NotificationKind::ClientConfirmation,
        to: to.to_string(),
        subject: format!(
            "Inquiry Received - {} | {}",
            record.response_id(),
            business.company_name
        ),
        body,
    })
}

fn admin_alert(
    record: &SubmissionRecord,
    business: &BusinessSettings,
) -> Result<Notification, askama::Error> {
    let f = record.fields();
    let priority = record.priority();
    let body = templates::AdminAlert {
        response_id: record.response_id().as_str(),
        name: or(f.name.as_deref(), NOT_PROVIDED),
        email: or(f.email.as_deref(), NOT_PROVIDED),
        phone: or(f.phone.as_deref(), NOT_PROVIDED),
        company: or(f.company.as_deref(), INDIVIDUAL),
        services: or(f.services.as_deref(), NOT_SPECIFIED),
        project_type: or(f.project_type.as_deref(), NOT_SPECIFIED),
        package_tier: or(f.package_tier.as_deref(), NOT_SPECIFIED),
        timeline: or(f.timeline.as_deref(), NOT_SPECIFIED),
        budget: or(f.budget.as_deref(), TO_BE_DISCUSSED),
        lead_source: or(f.lead_source.as_deref(), NOT_SPECIFIED),
        requirements: or(f.requirements.as_deref(), NO_DETAILS),
        priority: priority.as_str(),
        dashboard_url: &business.dashboard_url,
    }
    .render()?;

    Ok(Notification {
        kind: NotificationKind::AdminAlert,
        to: business.admin_email.clone(),
        subject: format!("New Lead Alert [{priority}] - {}", record.response_id()),
        body,
    })
}

fn urgent_alert(
    record: &SubmissionRecord,
    business: &BusinessSettings,
) -> Result<Notification, askama::Error> {
    let f = record.fields();
    let body = templates::UrgentAlert {
        name: or(f.name.as_deref(), NOT_PROVIDED),
        email: or(f.email.as_deref(), NOT_PROVIDED),
        phone: or(f.phone.as_deref(), NOT_PROVIDED),
        reasons: record
            .classification()
            .urgent_reasons()
            .map(|t| t.describe())
            .collect(),
        response_id: record.response_id().as_str(),
    }
    .render()?;

    Ok(Notification {
        kind: NotificationKind::UrgentAlert,
        to: business.admin_email.clone(),
        subject: format!(
            "HIGH PRIORITY LEAD - Immediate Action Required - {}",
            record.response_id()
        ),
        body,
    })
}

/// System error email for the admin. `context` names what was running,
/// e.g. "processing a submission".
pub fn error_alert(
    business: &BusinessSettings,
    context: &str,
    error: &str,
) -> Result<Notification, askama::Error> {
    let body = templates::ErrorAlert {
        context,
        error,
        occurred_at: Utc::now().to_rfc3339(),
    }
    .render()?;

    Ok(Notification {
        kind: NotificationKind::ErrorAlert,
        to: business.admin_email.clone(),
        subject: format!("{} System Error Alert", business.company_name),
        body,
    })
}

pub fn daily_report(
    business: &BusinessSettings,
    stats: &DailyStats,
    date: NaiveDate,
) -> Result<Notification, askama::Error> {
    let buckets = |rows: &[(String, i64)]| {
        rows.iter()
            .map(|(label, count)| templates::Bucket {
                label: label.clone(),
                count: *count,
            })
            .collect::<Vec<_>>()
    };

    let body = templates::DailyReport {
        company_name: &business.company_name,
        date: date.format("%a %b %d %Y").to_string(),
        total: stats.total,
        high_priority: stats.high_priority,
        low_priority: stats.low_priority,
        by_budget: buckets(&stats.by_budget),
        by_lead_source: buckets(&stats.by_lead_source),
        dashboard_url: &business.dashboard_url,
    }
    .render()?;

    Ok(Notification {
        kind: NotificationKind::DailyReport,
        to: business.admin_email.clone(),
        subject: format!("Daily Analytics Report - {}", date.format("%Y-%m-%d")),
        body,
    })
}
