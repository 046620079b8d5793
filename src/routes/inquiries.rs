use axum::Json;
use axum::extract::{Path, State};
use serde_json::{Value, json};

use crate::auth::ApiCaller;
use crate::error::AppError;
use crate::state::SharedState;

pub async fn get(
    caller: ApiCaller,
    State(state): State<SharedState>,
    Path(response_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    caller.require_authenticated()?;

    let inquiry = state
        .sink
        .find_inquiry(&response_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Inquiry {response_id} not found")))?;

    let deliveries = state.sink.list_deliveries(&response_id).await?;

    Ok(Json(json!({
        "inquiry": inquiry,
        "deliveries": deliveries,
    })))
}
