use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{DailyStats, StoreError, SubmissionSink, UNSPECIFIED_LABEL, day_bounds};
use crate::delivery::DeliveryOutcome;
use crate::models::{DeliveryLog, Inquiry};
use crate::submission::priority::Priority;

/// In-process sink. Used when no database is configured and in tests.
#[derive(Default)]
pub struct MemorySink {
    inquiries: Mutex<Vec<Inquiry>>,
    deliveries: Mutex<Vec<DeliveryLog>>,
    fail_appends: AtomicBool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `append` fail, to exercise persistence faults.
    pub fn fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    pub async fn inquiries(&self) -> Vec<Inquiry> {
        self.inquiries.lock().await.clone()
    }

    pub async fn deliveries(&self) -> Vec<DeliveryLog> {
        self.deliveries.lock().await.clone()
    }
}

#[async_trait]
impl SubmissionSink for MemorySink {
    async fn append(&self, inquiry: &Inquiry) -> Result<(), StoreError> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(StoreError::from("memory sink is refusing writes"));
        }

        let mut rows = self.inquiries.lock().await;
        if rows.iter().any(|r| r.response_id == inquiry.response_id) {
            return Err(StoreError::from(format!(
                "duplicate response id {}",
                inquiry.response_id
            )));
        }
        rows.push(inquiry.clone());
        Ok(())
    }

    async fn record_delivery(
        &self,
        response_id: &str,
        outcome: &DeliveryOutcome,
    ) -> Result<(), StoreError> {
        self.deliveries.lock().await.push(DeliveryLog {
            id: Uuid::now_v7(),
            response_id: response_id.to_string(),
            kind: outcome.kind.as_str().to_string(),
            recipient: outcome.recipient.clone(),
            status: outcome.status.as_str().to_string(),
            detail: outcome.status.detail().map(|d| d.to_string()),
            attempted_at: Utc::now(),
        });
        Ok(())
    }

    async fn find_inquiry(&self, response_id: &str) -> Result<Option<Inquiry>, StoreError> {
        Ok(self
            .inquiries
            .lock()
            .await
            .iter()
            .find(|r| r.response_id == response_id)
            .cloned())
    }

    async fn list_deliveries(&self, response_id: &str) -> Result<Vec<DeliveryLog>, StoreError> {
        Ok(self
            .deliveries
            .lock()
            .await
            .iter()
            .filter(|d| d.response_id == response_id)
            .cloned()
            .collect())
    }

    async fn daily_stats(&self, date: NaiveDate) -> Result<DailyStats, StoreError> {
        let (from, to) = day_bounds(date);
        let rows = self.inquiries.lock().await;
        let day: Vec<&Inquiry> = rows
            .iter()
            .filter(|r| r.received_at >= from && r.received_at < to)
            .collect();

        let count_priority = |p: Priority| day.iter().filter(|r| r.priority == p.as_str()).count() as i64;

        Ok(DailyStats {
            total: day.len() as i64,
            high_priority: count_priority(Priority::High),
            low_priority: count_priority(Priority::Low),
            by_budget: group(day.iter().map(|r| r.budget.as_deref())),
            by_lead_source: group(day.iter().map(|r| r.lead_source.as_deref())),
        })
    }
}

fn group<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Vec<(String, i64)> {
    let mut counts: HashMap<String, i64> = HashMap::new();
    for value in values {
        *counts
            .entry(value.unwrap_or(UNSPECIFIED_LABEL).to_string())
            .or_insert(0) += 1;
    }
    let mut grouped: Vec<(String, i64)> = counts.into_iter().collect();
    grouped.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    grouped
}
