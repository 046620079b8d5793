use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct DeliveryLog {
    pub id: Uuid,
    pub response_id: String,
    pub kind: String,
    pub recipient: String,
    pub status: String,
    pub detail: Option<String>,
    pub attempted_at: DateTime<Utc>,
}
