pub mod auth;
pub mod config;
pub mod db;
pub mod delivery;
pub mod error;
pub mod models;
pub mod notify;
pub mod rate_limit;
pub mod routes;
pub mod scheduler;
pub mod state;
pub mod store;
pub mod submission;

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderName, HeaderValue};
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::delivery::{Mailer, SlackNotifier};
use crate::rate_limit::SubmissionRateLimiter;
use crate::state::{AppState, SharedState};
use crate::store::SubmissionSink;

/// Build the HTTP router and the state it runs on.
///
/// The state is returned as well so the caller can hand it to the daily
/// report scheduler.
pub fn build_app(
    config: Config,
    sink: Arc<dyn SubmissionSink>,
    mailer: Arc<dyn Mailer>,
) -> (Router, SharedState) {
    let slack = config.intake.slack_webhook_url.as_ref().and_then(|url| {
        match SlackNotifier::new(url.as_str(), config.intake.send_timeout) {
            Ok(notifier) => {
                tracing::info!("Slack urgent alerts configured");
                Some(notifier)
            }
            Err(e) => {
                tracing::warn!("Slack urgent alerts not available: {e}");
                None
            }
        }
    });

    let submission_limiter =
        SubmissionRateLimiter::new(config.intake.rate_limit_per_email, rate_limit::DAY);
    let max_body_size = config.max_body_size;

    let state: SharedState = Arc::new(AppState {
        config,
        sink,
        mailer,
        slack,
        submission_limiter,
    });

    // Security headers
    let layers = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ));

    let app = Router::new()
        .merge(routes::api_routes())
        .merge(routes::ingest_routes())
        .route("/health", axum::routing::get(health))
        .layer(layers)
        .with_state(state.clone());

    (app, state)
}

async fn health() -> &'static str {
    "ok"
}
