use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;

use super::{DailyStats, StoreError, SubmissionSink, UNSPECIFIED_LABEL, day_bounds};
use crate::db;
use crate::db::inquiries::GroupColumn;
use crate::delivery::DeliveryOutcome;
use crate::models::{DeliveryLog, Inquiry};

pub struct PgSink {
    pool: PgPool,
}

impl PgSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubmissionSink for PgSink {
    async fn append(&self, inquiry: &Inquiry) -> Result<(), StoreError> {
        db::inquiries::create(&self.pool, inquiry).await?;
        Ok(())
    }

    async fn record_delivery(
        &self,
        response_id: &str,
        outcome: &DeliveryOutcome,
    ) -> Result<(), StoreError> {
        db::delivery_log::create(
            &self.pool,
            response_id,
            outcome.kind.as_str(),
            &outcome.recipient,
            outcome.status.as_str(),
            outcome.status.detail(),
        )
        .await?;
        Ok(())
    }

    async fn find_inquiry(&self, response_id: &str) -> Result<Option<Inquiry>, StoreError> {
        Ok(db::inquiries::find_by_response_id(&self.pool, response_id).await?)
    }

    async fn list_deliveries(&self, response_id: &str) -> Result<Vec<DeliveryLog>, StoreError> {
        Ok(db::delivery_log::list_by_response_id(&self.pool, response_id).await?)
    }

    async fn daily_stats(&self, date: NaiveDate) -> Result<DailyStats, StoreError> {
        let (from, to) = day_bounds(date);

        let (total, high_priority, low_priority) =
            db::inquiries::count_by_priority(&self.pool, from, to).await?;
        let by_budget = db::inquiries::count_grouped(
            &self.pool,
            GroupColumn::Budget,
            from,
            to,
            UNSPECIFIED_LABEL,
        )
        .await?;
        let by_lead_source = db::inquiries::count_grouped(
            &self.pool,
            GroupColumn::LeadSource,
            from,
            to,
            UNSPECIFIED_LABEL,
        )
        .await?;

        Ok(DailyStats {
            total,
            high_priority,
            low_priority,
            by_budget,
            by_lead_source,
        })
    }
}
