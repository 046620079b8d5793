pub mod ingest;
pub mod inquiries;

use axum::Router;
use axum::routing::{get, post};

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new().route("/api/v1/inquiries/{response_id}", get(inquiries::get))
}

pub fn ingest_routes() -> Router<SharedState> {
    Router::new().route("/v1/submissions", post(ingest::ingest))
}
