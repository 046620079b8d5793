//! Persistence sink for classified inquiries and their delivery outcomes.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use crate::delivery::DeliveryOutcome;
use crate::models::{DeliveryLog, Inquiry};

pub use memory::MemorySink;
pub use postgres::PgSink;

/// Label used when grouping rows that have no value for the column.
pub const UNSPECIFIED_LABEL: &str = "Not specified";

#[derive(Debug)]
pub struct StoreError {
    pub message: String,
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for StoreError {}

impl From<String> for StoreError {
    fn from(s: String) -> Self {
        StoreError { message: s }
    }
}

impl From<&str> for StoreError {
    fn from(s: &str) -> Self {
        StoreError {
            message: s.to_string(),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError {
            message: format!("database error: {err}"),
        }
    }
}

/// Counts for one UTC day of inquiries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DailyStats {
    pub total: i64,
    pub high_priority: i64,
    pub low_priority: i64,
    /// `(budget, count)`, most frequent first.
    pub by_budget: Vec<(String, i64)>,
    /// `(lead source, count)`, most frequent first.
    pub by_lead_source: Vec<(String, i64)>,
}

/// Append-only storage for inquiries.
#[async_trait]
pub trait SubmissionSink: Send + Sync {
    async fn append(&self, inquiry: &Inquiry) -> Result<(), StoreError>;

    async fn record_delivery(
        &self,
        response_id: &str,
        outcome: &DeliveryOutcome,
    ) -> Result<(), StoreError>;

    async fn find_inquiry(&self, response_id: &str) -> Result<Option<Inquiry>, StoreError>;

    async fn list_deliveries(&self, response_id: &str) -> Result<Vec<DeliveryLog>, StoreError>;

    async fn daily_stats(&self, date: NaiveDate) -> Result<DailyStats, StoreError>;
}

/// `[start, end)` of a UTC calendar day.
pub fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_time(NaiveTime::MIN).and_utc();
    let end = date
        .checked_add_days(Days::new(1))
        .map(|next| next.and_time(NaiveTime::MIN).and_utc())
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    (start, end)
}
