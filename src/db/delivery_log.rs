use sqlx::PgPool;
use uuid::Uuid;

use crate::models::DeliveryLog;

pub async fn create(
    pool: &PgPool,
    response_id: &str,
    kind: &str,
    recipient: &str,
    status: &str,
    detail: Option<&str>,
) -> Result<DeliveryLog, sqlx::Error> {
    sqlx::query_as::<_, DeliveryLog>(
        "INSERT INTO delivery_log (id, response_id, kind, recipient, status, detail)
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(response_id)
    .bind(kind)
    .bind(recipient)
    .bind(status)
    .bind(detail)
    .fetch_one(pool)
    .await
}

pub async fn list_by_response_id(
    pool: &PgPool,
    response_id: &str,
) -> Result<Vec<DeliveryLog>, sqlx::Error> {
    sqlx::query_as::<_, DeliveryLog>(
        "SELECT * FROM delivery_log WHERE response_id = $1 ORDER BY attempted_at ASC",
    )
    .bind(response_id)
    .fetch_all(pool)
    .await
}
