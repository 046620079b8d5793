#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use leaddesk::config::{BusinessSettings, Config, IntakeSettings};
use leaddesk::delivery::RecordingMailer;
use leaddesk::state::SharedState;
use leaddesk::store::MemorySink;

pub const TOKEN: &str = "test-token";
pub const ADMIN_EMAIL: &str = "admin@test.com";

/// A running test server backed by an in-memory sink and a recording mailer.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub sink: Arc<MemorySink>,
    pub mailer: Arc<RecordingMailer>,
    pub state: SharedState,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Submit a JSON body with the test token, return (body, status).
    pub async fn submit_json(&self, data: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/v1/submissions"))
            .bearer_auth(TOKEN)
            .json(data)
            .send()
            .await
            .expect("submit json failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Submit form-urlencoded data with the test token, return (body, status).
    pub async fn submit_form(&self, data: &[(&str, &str)]) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/v1/submissions"))
            .bearer_auth(TOKEN)
            .form(data)
            .send()
            .await
            .expect("submit form failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Make an authenticated GET request.
    pub async fn get_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }
}

/// The form from the intake questionnaire, answered the way a hurried
/// mobile-app client would.
pub fn urgent_submission() -> Value {
    json!({
        "Full Name": "Jane Doe",
        "Email Address": "jane@x.io",
        "Phone Number": "+1 555 0100",
        "Which services are you interested in?": ["Web Development", "Mobile Application"],
        "Project Timeline": "ASAP (Rush)",
        "Budget Range": "$15,000+ (Enterprise)",
        "Project Requirements": "A booking app"
    })
}

pub fn test_config() -> Config {
    Config {
        database_url: None,
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        max_body_size: 1_048_576,
        trusted_proxies: vec![],
        ingest_token: Some(TOKEN.to_string()),
        log_level: "warn".to_string(),
        smtp: None,
        business: BusinessSettings {
            admin_email: ADMIN_EMAIL.to_string(),
            ..BusinessSettings::default()
        },
        intake: IntakeSettings {
            send_timeout: Duration::from_secs(5),
            ..IntakeSettings::default()
        },
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(test_config()).await
}

/// Spawn a test app with the given configuration.
pub async fn spawn_app_with(config: Config) -> TestApp {
    let sink = Arc::new(MemorySink::new());
    let mailer = Arc::new(RecordingMailer::new());

    let (app, state) = leaddesk::build_app(config, sink.clone(), mailer.clone());

    // Bind to random port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    // Spawn server in background
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        client,
        sink,
        mailer,
        state,
    }
}
