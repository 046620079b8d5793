use std::net::{IpAddr, SocketAddr};

use axum::Json;
use axum::body::Bytes;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::auth::ApiCaller;
use crate::error::AppError;
use crate::state::SharedState;
use crate::submission::metadata::RequestMetadata;
use crate::submission::{fields, parser, pipeline};

pub async fn ingest(
    _caller: ApiCaller,
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok());

    let raw = if content_type.is_some_and(|ct| ct.contains("multipart/form-data")) {
        parser::parse_multipart(&headers, body)
            .await
            .map_err(AppError::BadRequest)?
    } else {
        parser::parse_body(content_type, &body).map_err(AppError::BadRequest)?
    };

    if raw.is_empty() {
        return Err(AppError::BadRequest(
            "Submission contains no answers".to_string(),
        ));
    }

    if let Some(email) = fields::extract(&raw).email {
        if let Err(retry_after) = state.submission_limiter.check(&email) {
            tracing::warn!("Rate limited submission from {email}");
            return Err(AppError::RateLimited(format!(
                "Too many submissions. Retry after {retry_after}s"
            )));
        }
    }

    let peer_ip: Option<IpAddr> = Some(addr.ip());
    let metadata =
        RequestMetadata::from_request(&headers, peer_ip, &state.config.trusted_proxies);

    let outcome = pipeline::handle(&state, raw, metadata).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "created",
            "response_id": outcome.record.response_id(),
            "priority": outcome.record.priority(),
            "triggers": outcome.record.triggers(),
            "persisted": outcome.persisted,
            "deliveries": outcome.deliveries,
        })),
    )
        .into_response())
}
