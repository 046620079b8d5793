use std::sync::Arc;

use crate::config::Config;
use crate::delivery::{Mailer, SlackNotifier};
use crate::rate_limit::SubmissionRateLimiter;
use crate::store::SubmissionSink;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub sink: Arc<dyn SubmissionSink>,
    pub mailer: Arc<dyn Mailer>,
    pub slack: Option<SlackNotifier>,
    pub submission_limiter: SubmissionRateLimiter,
}
