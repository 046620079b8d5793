use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::Inquiry;

pub async fn create(pool: &PgPool, inquiry: &Inquiry) -> Result<Inquiry, sqlx::Error> {
    sqlx::query_as::<_, Inquiry>(
        "INSERT INTO inquiries (
             id, response_id, name, email, phone, company, timeline, services,
             project_type, package_tier, budget, requirements, familiarity,
             lead_source, comments, communication_preferences, priority, triggers,
             metadata, status, assigned_to, follow_up_date, estimated_value, notes,
             received_at
         )
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                 $16, $17, $18, $19, $20, $21, $22, $23, $24, $25)
         RETURNING *",
    )
    .bind(inquiry.id)
    .bind(&inquiry.response_id)
    .bind(&inquiry.name)
    .bind(&inquiry.email)
    .bind(&inquiry.phone)
    .bind(&inquiry.company)
    .bind(&inquiry.timeline)
    .bind(&inquiry.services)
    .bind(&inquiry.project_type)
    .bind(&inquiry.package_tier)
    .bind(&inquiry.budget)
    .bind(&inquiry.requirements)
    .bind(&inquiry.familiarity)
    .bind(&inquiry.lead_source)
    .bind(&inquiry.comments)
    .bind(&inquiry.communication_preferences)
    .bind(&inquiry.priority)
    .bind(&inquiry.triggers)
    .bind(&inquiry.metadata)
    .bind(&inquiry.status)
    .bind(&inquiry.assigned_to)
    .bind(inquiry.follow_up_date)
    .bind(&inquiry.estimated_value)
    .bind(&inquiry.notes)
    .bind(inquiry.received_at)
    .fetch_one(pool)
    .await
}

pub async fn find_by_response_id(
    pool: &PgPool,
    response_id: &str,
) -> Result<Option<Inquiry>, sqlx::Error> {
    sqlx::query_as::<_, Inquiry>("SELECT * FROM inquiries WHERE response_id = $1")
        .bind(response_id)
        .fetch_optional(pool)
        .await
}

/// `(total, high, low)` for inquiries received in `[from, to)`.
pub async fn count_by_priority(
    pool: &PgPool,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<(i64, i64, i64), sqlx::Error> {
    sqlx::query_as::<_, (i64, i64, i64)>(
        "SELECT COUNT(*),
                COUNT(*) FILTER (WHERE priority = 'HIGH'),
                COUNT(*) FILTER (WHERE priority = 'LOW')
         FROM inquiries
         WHERE received_at >= $1 AND received_at < $2",
    )
    .bind(from)
    .bind(to)
    .fetch_one(pool)
    .await
}

/// Inquiry counts grouped by a text column, most frequent first.
pub async fn count_grouped(
    pool: &PgPool,
    column: GroupColumn,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    missing_label: &str,
) -> Result<Vec<(String, i64)>, sqlx::Error> {
    let col = match column {
        GroupColumn::Budget => "budget",
        GroupColumn::LeadSource => "lead_source",
    };

    sqlx::query_as::<_, (String, i64)>(&format!(
        "SELECT COALESCE({col}, $3) AS label, COUNT(*)
         FROM inquiries
         WHERE received_at >= $1 AND received_at < $2
         GROUP BY label
         ORDER BY COUNT(*) DESC, label ASC"
    ))
    .bind(from)
    .bind(to)
    .bind(missing_label)
    .fetch_all(pool)
    .await
}

#[derive(Debug, Clone, Copy)]
pub enum GroupColumn {
    Budget,
    LeadSource,
}
