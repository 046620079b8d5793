use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use subtle::ConstantTimeEq;

use crate::error::AppError;
use crate::state::SharedState;

/// Caller of the HTTP API.
///
/// When `LEADDESK_INGEST_TOKEN` is set every request must carry it as a
/// bearer token. Without it requests are let through unauthenticated.
#[derive(Debug, Clone, Copy)]
pub struct ApiCaller {
    pub authenticated: bool,
}

impl ApiCaller {
    /// Endpoints that expose stored inquiries require a configured token.
    pub fn require_authenticated(&self) -> Result<(), AppError> {
        if self.authenticated {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "An API token must be configured to read inquiries".to_string(),
            ))
        }
    }
}

impl FromRequestParts<SharedState> for ApiCaller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.config.ingest_token.as_deref() else {
            return Ok(ApiCaller {
                authenticated: false,
            });
        };

        let auth_header = parts
            .headers
            .get("authorization")
            .ok_or_else(|| AppError::Unauthorized("Missing authentication token".to_string()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid authorization header".to_string()))?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("Expected a bearer token".to_string()))?;

        if bool::from(token.as_bytes().ct_eq(expected.as_bytes())) {
            Ok(ApiCaller {
                authenticated: true,
            })
        } else {
            Err(AppError::Unauthorized("Invalid token".to_string()))
        }
    }
}
