//! Integration tests for report-relay.
//!
//! The webhook and relay tests run against a local HTTP server and need no
//! environment. The mailbox and portal tests require live credentials and
//! are disabled by default. To run them:
//!
//! ```bash
//! # Set environment variables
//! export REPORT_RELAY_TEST_TENANT_ID="tenant-guid"
//! export REPORT_RELAY_TEST_CLIENT_ID="client-guid"
//! export REPORT_RELAY_TEST_CLIENT_SECRET="secret-value"
//! export REPORT_RELAY_TEST_MAILBOX="ops@example.com"
//! export REPORT_RELAY_TEST_SENDER="noreply@vendor.example"
//!
//! # Optional: portal automation (needs a running WebDriver server)
//! export REPORT_RELAY_TEST_LOGIN_URL="https://portal.example.com/"
//! export REPORT_RELAY_TEST_REPORT_URL="https://portal.example.com/reporting/call"
//! export REPORT_RELAY_TEST_PORTAL_EMAIL="ops@example.com"
//! export REPORT_RELAY_TEST_PORTAL_PASSWORD="portal-password"
//!
//! # Run with the integration-tests feature
//! cargo test --features integration-tests -- --ignored
//! ```

use report_relay::matcher::CodeMatcher;
use report_relay::{
    Error, MailboxClient, MailboxConfig, PortalConfig, PortalDriver, RelayConfig, ReportRelay,
    ReportRow, WebhookClient, WebhookConfig,
};
use std::env;
use std::io::Read;
use std::time::Duration;

// ─────────────────────────────────────────────────────────────────────────────
// Test Configuration Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn live_mailbox_config() -> Option<MailboxConfig> {
    dotenvy::dotenv().ok();
    let tenant_id = env::var("REPORT_RELAY_TEST_TENANT_ID").ok()?;
    let client_id = env::var("REPORT_RELAY_TEST_CLIENT_ID").ok()?;
    let client_secret = env::var("REPORT_RELAY_TEST_CLIENT_SECRET").ok()?;
    let mailbox = env::var("REPORT_RELAY_TEST_MAILBOX").ok()?;
    let sender = env::var("REPORT_RELAY_TEST_SENDER").ok()?;

    MailboxConfig::builder()
        .tenant_id(tenant_id)
        .client_id(client_id)
        .client_secret(client_secret)
        .mailbox(mailbox)
        .sender(sender)
        .subject(
            env::var("REPORT_RELAY_TEST_SUBJECT")
                .unwrap_or_else(|_| "Login security code".to_string()),
        )
        .build()
        .ok()
}

fn live_mailbox_config_with_short_timeout() -> Option<MailboxConfig> {
    dotenvy::dotenv().ok();
    let tenant_id = env::var("REPORT_RELAY_TEST_TENANT_ID").ok()?;
    let client_id = env::var("REPORT_RELAY_TEST_CLIENT_ID").ok()?;
    let client_secret = env::var("REPORT_RELAY_TEST_CLIENT_SECRET").ok()?;
    let mailbox = env::var("REPORT_RELAY_TEST_MAILBOX").ok()?;

    MailboxConfig::builder()
        .tenant_id(tenant_id)
        .client_id(client_id)
        .client_secret(client_secret)
        .mailbox(mailbox)
        // A sender that never writes, so waiting must time out
        .sender("nobody@nonexistent-sender.example")
        .subject("WILL_NEVER_MATCH_XYZ123")
        .max_wait(Duration::from_secs(5))
        .poll_interval(Duration::from_secs(1))
        .build()
        .ok()
}

fn live_portal_config() -> Option<PortalConfig> {
    dotenvy::dotenv().ok();
    let login_url = env::var("REPORT_RELAY_TEST_LOGIN_URL").ok()?;
    let report_url = env::var("REPORT_RELAY_TEST_REPORT_URL").ok()?;
    let email = env::var("REPORT_RELAY_TEST_PORTAL_EMAIL").ok()?;
    let password = env::var("REPORT_RELAY_TEST_PORTAL_PASSWORD").ok()?;

    PortalConfig::builder()
        .login_url(login_url)
        .report_url(report_url)
        .email(email)
        .password(password)
        .build()
        .ok()
}

fn sample_row(date_time: &str, caller: &str) -> ReportRow {
    let mut row = ReportRow::new();
    row.insert("Date & Time".to_string(), date_time.to_string());
    row.insert("Caller".to_string(), caller.to_string());
    row
}

/// Serves exactly one request with the given status and returns its body.
fn one_shot_server(status: u16) -> (u16, std::thread::JoinHandle<String>) {
    let server = tiny_http::Server::http("127.0.0.1:0").expect("bind local server");
    let port = server.server_addr().port();

    let handle = std::thread::spawn(move || {
        let mut request = server.recv().expect("receive request");
        assert_eq!(request.method(), &tiny_http::Method::Post);

        let mut body = String::new();
        request
            .as_reader()
            .read_to_string(&mut body)
            .expect("read request body");

        let response = tiny_http::Response::from_string("ok").with_status_code(status);
        request.respond(response).expect("send response");
        body
    });

    (port, handle)
}

// ─────────────────────────────────────────────────────────────────────────────
// Webhook Tests (local server)
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_webhook_delivery_success() {
    let (port, handle) = one_shot_server(200);

    let config = WebhookConfig::builder()
        .url(format!("http://127.0.0.1:{port}/hook"))
        .build()
        .unwrap();
    let client = WebhookClient::new(config).unwrap();

    let rows = vec![sample_row("2025-09-30 10:09:23", "Alice")];
    client.send(&rows).await.expect("delivery succeeds on 200");

    let body = handle.join().unwrap();
    let value: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["total_reports"], 1);
    assert!(value["timestamp"].is_string());
    assert_eq!(value["reports"][0]["Caller"], "Alice");
}

#[tokio::test]
async fn test_webhook_non_200_is_failure_without_retry() {
    let (port, handle) = one_shot_server(500);

    let config = WebhookConfig::builder()
        .url(format!("http://127.0.0.1:{port}/hook"))
        .build()
        .unwrap();
    let client = WebhookClient::new(config).unwrap();

    let rows = vec![sample_row("2025-09-30 10:09:23", "Alice")];
    let err = client.send(&rows).await.unwrap_err();

    assert!(!err.is_retryable());
    assert!(matches!(err, Error::WebhookStatus { status } if status.as_u16() == 500));

    // The server answered exactly one request; a retry would hang the test
    handle.join().unwrap();
}

// ─────────────────────────────────────────────────────────────────────────────
// Relay Tests (local folder + local server)
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_relay_end_to_end_posts_latest_day_only() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("export.csv"),
        "Date & Time,Caller\n\
         2025-09-29 09:00:00,Old\n\
         2025-09-30 10:09:23,Alice\n\
         2025-09-30 11:00:00,Bob\n",
    )
    .unwrap();

    let (port, handle) = one_shot_server(200);

    let webhook = WebhookConfig::builder()
        .url(format!("http://127.0.0.1:{port}/hook"))
        .build()
        .unwrap();
    let relay = ReportRelay::new(
        RelayConfig::builder()
            .folder(dir.path())
            .webhook(webhook)
            .build()
            .unwrap(),
    )
    .unwrap();

    let summary = relay.process_and_send().await.unwrap();
    assert_eq!(summary.rows_sent, 2);
    assert_eq!(summary.report_date.to_string(), "2025-09-30");

    let body = handle.join().unwrap();
    let value: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["total_reports"], 2);
    let reports = value["reports"].as_array().unwrap();
    assert!(reports
        .iter()
        .all(|r| r["Date & Time"].as_str().unwrap().starts_with("2025-09-30")));
}

#[tokio::test]
async fn test_relay_fails_on_empty_folder() {
    let dir = tempfile::tempdir().unwrap();

    let webhook = WebhookConfig::builder()
        .url("http://127.0.0.1:9/unreachable")
        .build()
        .unwrap();
    let relay = ReportRelay::new(
        RelayConfig::builder()
            .folder(dir.path())
            .webhook(webhook)
            .build()
            .unwrap(),
    )
    .unwrap();

    let err = relay.process_and_send().await.unwrap_err();
    assert!(matches!(err, Error::NoReport { .. }));
}

#[tokio::test]
async fn test_relay_fails_on_dateless_report() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("export.csv"),
        "Date & Time,Caller\nnot a date,Alice\n",
    )
    .unwrap();

    let webhook = WebhookConfig::builder()
        .url("http://127.0.0.1:9/unreachable")
        .build()
        .unwrap();
    let relay = ReportRelay::new(
        RelayConfig::builder()
            .folder(dir.path())
            .webhook(webhook)
            .build()
            .unwrap(),
    )
    .unwrap();

    let err = relay.process_and_send().await.unwrap_err();
    assert!(matches!(err, Error::EmptyReport { .. }));
}

// ─────────────────────────────────────────────────────────────────────────────
// Mailbox Tests (live, ignored)
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
#[ignore = "requires Graph credentials"]
async fn test_connect_and_fetch_recent() {
    let config = live_mailbox_config().expect("Test config from environment variables");

    let client = MailboxClient::connect(config)
        .await
        .expect("Failed to connect");

    let messages = client.fetch_recent().await.expect("Failed to fetch");
    println!("Fetched {} messages", messages.len());
}

#[tokio::test]
#[ignore = "requires Graph credentials"]
async fn test_latest_code_from_live_mailbox() {
    let config = live_mailbox_config().expect("Test config from environment variables");

    let client = MailboxClient::connect(config)
        .await
        .expect("Failed to connect");

    match client.latest_code(&CodeMatcher::vendor_default()).await {
        Ok(hit) => {
            assert_eq!(hit.code.len(), 6);
            assert!(hit.code.chars().all(|c| c.is_ascii_digit()));
        }
        Err(e) => {
            // NoCode is expected if no passcode emails exist
            println!("No passcode found (expected if mailbox is quiet): {}", e);
        }
    }
}

#[tokio::test]
#[ignore = "requires Graph credentials"]
async fn test_wait_for_code_timeout() {
    let config =
        live_mailbox_config_with_short_timeout().expect("Test config from environment variables");

    let client = MailboxClient::connect(config)
        .await
        .expect("Failed to connect");

    let result = client.wait_for_code(&CodeMatcher::vendor_default()).await;

    assert!(result.is_err());
    let err = result.unwrap_err();

    // CodeTimeout is not retryable
    assert!(!err.is_retryable());
}

#[tokio::test]
#[ignore = "requires intentionally wrong credentials"]
async fn test_rejected_client_secret() {
    dotenvy::dotenv().ok();
    let config = MailboxConfig::builder()
        .tenant_id(env::var("REPORT_RELAY_TEST_TENANT_ID").unwrap_or_default())
        .client_id(env::var("REPORT_RELAY_TEST_CLIENT_ID").unwrap_or_default())
        .client_secret("definitely-wrong-secret")
        .mailbox("ops@example.com")
        .sender("noreply@vendor.example")
        .subject("Login security code")
        .build()
        .expect("valid config structure");

    let result = MailboxClient::connect(config).await;

    assert!(result.is_err());
    let err = result.unwrap_err();
    println!("Connection error: {}", err);
    println!("Category: {}", err.category());
}

// ─────────────────────────────────────────────────────────────────────────────
// Portal Tests (live, ignored)
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
#[ignore = "requires a running WebDriver server"]
async fn test_launch_and_quit() {
    let config = live_portal_config().expect("Test config from environment variables");

    let driver = PortalDriver::launch(config)
        .await
        .expect("Failed to start browser session");

    let debug_str = format!("{:?}", driver);
    assert!(debug_str.contains("PortalDriver"));

    driver.quit().await.expect("Failed to close session");
}

// ─────────────────────────────────────────────────────────────────────────────
// Config Validation Tests
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_invalid_mailbox_format() {
    let result = MailboxConfig::builder()
        .tenant_id("tenant")
        .client_id("client")
        .client_secret("secret")
        .mailbox("not-an-email")
        .sender("noreply@vendor.example")
        .subject("Login security code")
        .build();

    assert!(result.is_err());
}

#[tokio::test]
async fn test_missing_required_fields() {
    // Missing everything
    let result = MailboxConfig::builder().build();
    assert!(result.is_err());

    // Missing webhook URL
    let result = WebhookConfig::builder().build();
    assert!(result.is_err());

    // Missing portal password
    let result = PortalConfig::builder()
        .login_url("https://portal.example.com/")
        .report_url("https://portal.example.com/reporting/call")
        .email("ops@example.com")
        .build();
    assert!(result.is_err());
}
