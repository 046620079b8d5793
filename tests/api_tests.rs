mod common;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::StatusCode;
use serde_json::json;
use tokio::sync::watch;

use leaddesk::delivery::{self, DeliveryError, DeliveryStatus, Mailer, RecordingMailer};
use leaddesk::models::{DeliveryLog, Inquiry};
use leaddesk::notify::{Notification, NotificationKind};
use leaddesk::store::{DailyStats, StoreError, SubmissionSink};
use leaddesk::submission::metadata::RequestMetadata;
use leaddesk::submission::pipeline;
use leaddesk::submission::record::RawSubmission;

use common::{ADMIN_EMAIL, TOKEN};

// ── Health ──────────────────────────────────────────────────────

#[tokio::test]
async fn health_returns_ok() {
    let app = common::spawn_app().await;

    let resp = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(resp.text().await.unwrap(), "ok");
}

// ── Ingest ──────────────────────────────────────────────────────

#[tokio::test]
async fn urgent_submission_is_classified_and_notified() {
    let app = common::spawn_app().await;

    let (body, status) = app.submit_json(&common::urgent_submission()).await;
    assert_eq!(status, StatusCode::CREATED, "ingest failed: {body}");
    assert_eq!(body["status"], "created");
    assert_eq!(body["priority"], "HIGH");
    assert_eq!(body["persisted"], true);
    assert_eq!(
        body["triggers"],
        json!(["asap_timeline", "high_budget", "mobile_application"])
    );

    let response_id = body["response_id"].as_str().unwrap();
    assert!(response_id.starts_with("IAH-"));

    let client_mail = app.mailer.sent_to("jane@x.io").await;
    assert_eq!(client_mail.len(), 1);
    assert!(client_mail[0].subject.contains(response_id));
    assert!(client_mail[0].body.contains("Dear Jane Doe"));
    assert!(client_mail[0].body.contains("Budget Range: $15,000+ (Enterprise)"));

    let admin_mail = app.mailer.sent_to(ADMIN_EMAIL).await;
    assert_eq!(admin_mail.len(), 2);
    assert_eq!(
        admin_mail[0].subject,
        format!("New Lead Alert [HIGH] - {response_id}")
    );
    assert!(admin_mail[0].body.contains("Company: Individual"));
    assert!(admin_mail[1].subject.starts_with("HIGH PRIORITY LEAD"));
    assert!(admin_mail[1].body.contains("- URGENT timeline requirement"));
    assert!(admin_mail[1].body.contains("- High budget potential"));
    assert!(admin_mail[1].body.contains("- Mobile application project"));

    let stored = app.sink.inquiries().await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].response_id, response_id);
    assert_eq!(stored[0].priority, "HIGH");
    assert_eq!(stored[0].status, "New");
    assert_eq!(
        stored[0].services.as_deref(),
        Some("Web Development, Mobile Application")
    );
    assert_eq!(stored[0].metadata["ip"], "127.0.0.1");
}

#[tokio::test]
async fn medium_submission_sends_no_urgent_alert() {
    let app = common::spawn_app().await;

    let (body, status) = app
        .submit_form(&[
            ("Full Name", "Sam"),
            ("Email", "sam@x.io"),
            ("Project Timeline", "Flexible timeline"),
            ("Budget Range", "$500 - $2,000 (Basic)"),
        ])
        .await;
    assert_eq!(status, StatusCode::CREATED, "ingest failed: {body}");
    assert_eq!(body["priority"], "MEDIUM");
    assert_eq!(body["triggers"], json!([]));

    let admin_mail = app.mailer.sent_to(ADMIN_EMAIL).await;
    assert_eq!(admin_mail.len(), 1);
    assert!(admin_mail[0].subject.contains("[MEDIUM]"));
    assert_eq!(app.mailer.sent().await.len(), 2);
}

#[tokio::test]
async fn sequential_policy_lets_later_low_rule_win() {
    let app = common::spawn_app().await;

    let (body, status) = app
        .submit_json(&json!({
            "Email": "a@x.io",
            "Timeline": "ASAP - Just exploring"
        }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["priority"], "LOW");
    assert_eq!(app.mailer.sent_to(ADMIN_EMAIL).await.len(), 1);
}

#[tokio::test]
async fn missing_email_skips_client_confirmation() {
    let app = common::spawn_app().await;

    let (body, status) = app
        .submit_json(&json!({ "Full Name": "No Mail", "Budget": "Need consultation" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["priority"], "LOW");

    let deliveries = body["deliveries"].as_array().unwrap();
    let skipped = deliveries
        .iter()
        .find(|d| d["kind"] == "client_confirmation")
        .unwrap();
    assert_eq!(skipped["status"], "skipped");
    assert_eq!(skipped["detail"], "no client email");

    let sent = app.mailer.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, ADMIN_EMAIL);
}

#[tokio::test]
async fn failing_admin_mail_does_not_block_client_mail() {
    let app = common::spawn_app().await;
    app.mailer.fail_for(ADMIN_EMAIL).await;

    let (body, status) = app.submit_json(&common::urgent_submission()).await;
    assert_eq!(status, StatusCode::CREATED);

    assert_eq!(app.mailer.sent_to("jane@x.io").await.len(), 1);

    let deliveries = body["deliveries"].as_array().unwrap();
    let failed: Vec<_> = deliveries
        .iter()
        .filter(|d| d["status"] == "failed")
        .collect();
    assert_eq!(failed.len(), 2);

    let logged = app.sink.deliveries().await;
    assert_eq!(logged.len(), 3);
    assert!(
        logged
            .iter()
            .any(|d| d.kind == "client_confirmation" && d.status == "delivered")
    );
}

#[tokio::test]
async fn persistence_failure_still_sends_notifications() {
    let app = common::spawn_app().await;
    app.sink.fail_appends(true);

    let (body, status) = app.submit_json(&common::urgent_submission()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["persisted"], false);
    assert_eq!(app.mailer.sent().await.len(), 3);
    assert!(app.sink.inquiries().await.is_empty());
}

#[tokio::test]
async fn disabled_email_notifications_still_send_urgent_alert() {
    let mut config = common::test_config();
    config.intake.email_notifications = false;
    let app = common::spawn_app_with(config).await;

    let (body, status) = app.submit_json(&common::urgent_submission()).await;
    assert_eq!(status, StatusCode::CREATED);

    let sent = app.mailer.sent().await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].subject.starts_with("HIGH PRIORITY LEAD"));

    let skipped = body["deliveries"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|d| d["status"] == "skipped")
        .count();
    assert_eq!(skipped, 2);
}

#[tokio::test]
async fn ingest_rejects_wrong_token() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/v1/submissions"))
        .bearer_auth("wrong")
        .json(&common::urgent_submission())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app
        .client
        .post(app.url("/v1/submissions"))
        .json(&common::urgent_submission())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(app.mailer.sent().await.is_empty());
}

#[tokio::test]
async fn ingest_without_configured_token_is_open() {
    let mut config = common::test_config();
    config.ingest_token = None;
    let app = common::spawn_app_with(config).await;

    let resp = app
        .client
        .post(app.url("/v1/submissions"))
        .json(&common::urgent_submission())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn ingest_rejects_bad_bodies() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/v1/submissions"))
        .bearer_auth(TOKEN)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let (_, status) = app.submit_json(&json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, status) = app.submit_json(&json!([1, 2, 3])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn answers_array_shape_is_accepted() {
    let app = common::spawn_app().await;

    let (body, status) = app
        .submit_json(&json!({
            "answers": [
                { "label": "Full Name", "value": "Ana" },
                { "label": "Email", "value": "ana@x.io" },
                { "label": "Select services", "value": ["Mobile Application"] }
            ]
        }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "ingest failed: {body}");
    assert_eq!(body["priority"], "HIGH");
    assert_eq!(body["triggers"], json!(["mobile_application"]));
}

#[tokio::test]
async fn submissions_are_rate_limited_per_email() {
    let app = common::spawn_app().await;

    for _ in 0..5 {
        let (_, status) = app.submit_json(&common::urgent_submission()).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (body, status) = app.submit_json(&common::urgent_submission()).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(body["error"].as_str().unwrap().contains("Too many submissions"));

    // Different address, separate budget.
    let mut other = common::urgent_submission();
    other["Email Address"] = json!("someone@else.io");
    let (_, status) = app.submit_json(&other).await;
    assert_eq!(status, StatusCode::CREATED);

    assert_eq!(app.sink.inquiries().await.len(), 6);
}

// ── Inquiries ───────────────────────────────────────────────────

#[tokio::test]
async fn inquiry_can_be_fetched_with_deliveries() {
    let app = common::spawn_app().await;

    let (body, _) = app.submit_json(&common::urgent_submission()).await;
    let response_id = body["response_id"].as_str().unwrap();

    let (body, status) = app
        .get_auth(&format!("/api/v1/inquiries/{response_id}"), TOKEN)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["inquiry"]["response_id"], response_id);
    assert_eq!(body["inquiry"]["name"], "Jane Doe");
    assert_eq!(body["inquiry"]["priority"], "HIGH");
    assert_eq!(body["deliveries"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn unknown_inquiry_returns_not_found() {
    let app = common::spawn_app().await;

    let (_, status) = app.get_auth("/api/v1/inquiries/IAH-NOPE0000", TOKEN).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, status) = app.get_auth("/api/v1/inquiries/IAH-NOPE0000", "wrong").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn inquiries_are_forbidden_without_configured_token() {
    let mut config = common::test_config();
    config.ingest_token = None;
    let app = common::spawn_app_with(config).await;

    let resp = app
        .client
        .get(app.url("/api/v1/inquiries/IAH-ANYTHING"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

// ── Daily report ────────────────────────────────────────────────

#[tokio::test]
async fn daily_report_summarises_the_day() {
    let app = common::spawn_app().await;

    app.submit_json(&common::urgent_submission()).await;
    app.submit_json(&json!({
        "Email": "b@x.io",
        "Budget": "Need consultation",
        "How did you hear about us?": "Instagram"
    }))
    .await;

    let today = Utc::now().date_naive();
    let outcome = leaddesk::scheduler::send_daily_report(&app.state, today)
        .await
        .unwrap();
    assert_eq!(outcome.recipient, ADMIN_EMAIL);

    let report = app
        .mailer
        .sent()
        .await
        .into_iter()
        .find(|m| m.subject.starts_with("Daily Analytics Report"))
        .unwrap();
    assert_eq!(
        report.subject,
        format!("Daily Analytics Report - {}", today.format("%Y-%m-%d"))
    );
    assert!(report.body.contains("Total inquiries: 2"));
    assert!(report.body.contains("High priority leads: 1"));
    assert!(report.body.contains("Low priority leads: 1"));
    assert!(report.body.contains("- Instagram: 1"));
    assert!(report.body.contains("- Not specified: 1"));
}

// ── Faults ──────────────────────────────────────────────────────

/// Sink whose writes blow up, to exercise the processing guard.
struct PanickingSink;

#[async_trait]
impl SubmissionSink for PanickingSink {
    async fn append(&self, _inquiry: &Inquiry) -> Result<(), StoreError> {
        panic!("sink exploded");
    }

    async fn record_delivery(
        &self,
        _response_id: &str,
        _outcome: &delivery::DeliveryOutcome,
    ) -> Result<(), StoreError> {
        Ok(())
    }

    async fn find_inquiry(&self, _response_id: &str) -> Result<Option<Inquiry>, StoreError> {
        Ok(None)
    }

    async fn list_deliveries(&self, _response_id: &str) -> Result<Vec<DeliveryLog>, StoreError> {
        Ok(vec![])
    }

    async fn daily_stats(&self, _date: NaiveDate) -> Result<DailyStats, StoreError> {
        Ok(DailyStats::default())
    }
}

#[tokio::test]
async fn processing_fault_alerts_admin() {
    let mailer = Arc::new(RecordingMailer::new());
    let (_app, state) = leaddesk::build_app(
        common::test_config(),
        Arc::new(PanickingSink),
        mailer.clone(),
    );

    let raw = RawSubmission::new().with_text("Email", "a@x.io");
    let result = pipeline::handle(&state, raw, RequestMetadata::default()).await;
    assert!(result.is_err());

    let sent = mailer.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, ADMIN_EMAIL);
    assert_eq!(sent[0].subject, "The IAH Creations System Error Alert");
    assert!(sent[0].body.contains("while processing a submission"));
}

/// Mailer that stalls for one recipient and succeeds for the rest.
struct StallingMailer {
    stall_for: String,
    inner: RecordingMailer,
}

#[async_trait]
impl Mailer for StallingMailer {
    fn name(&self) -> &str {
        "stalling"
    }

    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), DeliveryError> {
        if to == self.stall_for {
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
        self.inner.send(to, subject, body).await
    }
}

fn notification(kind: NotificationKind, to: &str) -> Notification {
    Notification {
        kind,
        to: to.to_string(),
        subject: "subject".to_string(),
        body: "body".to_string(),
    }
}

#[tokio::test]
async fn slow_send_times_out_without_blocking_the_next() {
    let mailer = StallingMailer {
        stall_for: "slow@x.io".to_string(),
        inner: RecordingMailer::new(),
    };
    let batch = [
        notification(NotificationKind::ClientConfirmation, "slow@x.io"),
        notification(NotificationKind::AdminAlert, ADMIN_EMAIL),
    ];

    let report = delivery::dispatch(&mailer, &batch, Duration::from_millis(50)).await;

    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(
        report.outcomes[0].status,
        DeliveryStatus::Failed("timed out after 50ms".to_string())
    );
    assert_eq!(report.outcomes[1].status, DeliveryStatus::Delivered);
    assert_eq!(report.failed().count(), 1);

    let sent = mailer.inner.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, ADMIN_EMAIL);
}

/// Local webhook that always answers 500.
async fn spawn_broken_webhook() -> String {
    let app = axum::Router::new().route(
        "/hook",
        axum::routing::post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "down") }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind webhook stub");
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Webhook stub failed");
    });
    format!("http://{addr}/hook")
}

#[tokio::test]
async fn failing_slack_alert_does_not_block_mail() {
    let mut config = common::test_config();
    config.intake.slack_webhook_url = Some(spawn_broken_webhook().await);
    let app = common::spawn_app_with(config).await;

    let (body, status) = app.submit_json(&common::urgent_submission()).await;
    assert_eq!(status, StatusCode::CREATED, "ingest failed: {body}");

    let deliveries = body["deliveries"].as_array().unwrap();
    let slack = deliveries
        .iter()
        .find(|d| d["recipient"] == "slack")
        .unwrap();
    assert_eq!(slack["kind"], "urgent_alert");
    assert_eq!(slack["status"], "failed");
    assert!(slack["detail"].as_str().unwrap().contains("500"));

    let delivered = deliveries
        .iter()
        .filter(|d| d["status"] == "delivered")
        .count();
    assert_eq!(delivered, 3);
    assert_eq!(app.mailer.sent().await.len(), 3);
}

// ── Scheduler ───────────────────────────────────────────────────

#[tokio::test]
async fn scheduler_stops_when_sender_is_dropped() {
    let app = common::spawn_app().await;
    let (tx, rx) = watch::channel(false);
    let handle = tokio::spawn(leaddesk::scheduler::run(app.state.clone(), rx));

    drop(tx);

    let finished = tokio::time::timeout(Duration::from_secs(2), handle).await;
    assert!(finished.is_ok(), "scheduler kept running after its sender was dropped");
}

#[tokio::test]
async fn scheduler_stops_on_shutdown_signal() {
    let app = common::spawn_app().await;
    let (tx, rx) = watch::channel(false);
    let handle = tokio::spawn(leaddesk::scheduler::run(app.state.clone(), rx));

    tx.send(true).unwrap();

    let finished = tokio::time::timeout(Duration::from_secs(2), handle).await;
    assert!(finished.is_ok());
    drop(tx);
}
