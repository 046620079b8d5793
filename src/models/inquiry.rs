use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::submission::record::SubmissionRecord;

/// Persisted inquiry row. The operational columns (`status` onwards) belong
/// to whoever works the lead; intake only sets their defaults.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Inquiry {
    pub id: Uuid,
    pub response_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub timeline: Option<String>,
    pub services: Option<String>,
    pub project_type: Option<String>,
    pub package_tier: Option<String>,
    pub budget: Option<String>,
    pub requirements: Option<String>,
    pub familiarity: Option<String>,
    pub lead_source: Option<String>,
    pub comments: Option<String>,
    pub communication_preferences: Option<String>,
    pub priority: String,
    pub triggers: serde_json::Value,
    pub metadata: serde_json::Value,
    pub status: String,
    pub assigned_to: Option<String>,
    pub follow_up_date: Option<NaiveDate>,
    pub estimated_value: Option<String>,
    pub notes: Option<String>,
    pub received_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

pub const DEFAULT_STATUS: &str = "New";

impl Inquiry {
    pub fn from_record(record: &SubmissionRecord, metadata: serde_json::Value) -> Self {
        let f = record.fields().clone();
        Self {
            id: Uuid::now_v7(),
            response_id: record.response_id().to_string(),
            name: f.name,
            email: f.email,
            phone: f.phone,
            company: f.company,
            timeline: f.timeline,
            services: f.services,
            project_type: f.project_type,
            package_tier: f.package_tier,
            budget: f.budget,
            requirements: f.requirements,
            familiarity: f.familiarity,
            lead_source: f.lead_source,
            comments: f.comments,
            communication_preferences: f.communication_preferences,
            priority: record.priority().to_string(),
            triggers: serde_json::to_value(record.triggers()).unwrap_or_default(),
            metadata,
            status: DEFAULT_STATUS.to_string(),
            assigned_to: None,
            follow_up_date: None,
            estimated_value: None,
            notes: None,
            received_at: record.received_at(),
            created_at: Utc::now(),
        }
    }
}
