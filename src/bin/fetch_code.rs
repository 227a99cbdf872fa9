//! Standalone passcode fetch: poll the mailbox once, write the snapshot
//! file, and print the latest extracted code.
//!
//! ```bash
//! export REPORT_RELAY_TENANT_ID="tenant-guid"
//! export REPORT_RELAY_CLIENT_ID="client-guid"
//! export REPORT_RELAY_CLIENT_SECRET="secret-value"
//! export REPORT_RELAY_MAILBOX="ops@example.com"
//! export REPORT_RELAY_CODE_SENDERS="noreply@vendor.example"
//! fetch-code
//! ```
//!
//! Exit code 0 when a code was found, 1 otherwise.

use report_relay::matcher::CodeMatcher;
use report_relay::{Error, LatestCode, MailboxClient, MailboxConfig, Result};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

fn required_var(name: &str) -> Result<String> {
    env_var(name).ok_or_else(|| Error::InvalidConfig {
        message: format!("{name} environment variable is required"),
    })
}

fn mailbox_config() -> Result<MailboxConfig> {
    let senders = required_var("REPORT_RELAY_CODE_SENDERS")?;

    MailboxConfig::builder()
        .tenant_id(required_var("REPORT_RELAY_TENANT_ID")?)
        .client_id(required_var("REPORT_RELAY_CLIENT_ID")?)
        .client_secret(required_var("REPORT_RELAY_CLIENT_SECRET")?)
        .mailbox(required_var("REPORT_RELAY_MAILBOX")?)
        .senders(
            senders
                .split(',')
                .map(str::trim)
                .filter(|sender| !sender.is_empty())
                .map(String::from),
        )
        .subject(
            env_var("REPORT_RELAY_CODE_SUBJECT")
                .unwrap_or_else(|| "Login security code".to_string()),
        )
        .build()
}

async fn run() -> Result<LatestCode> {
    let config = mailbox_config()?;
    let snapshot_path = PathBuf::from(
        env_var("REPORT_RELAY_SNAPSHOT").unwrap_or_else(|| "reports.json".to_string()),
    );

    let client = MailboxClient::connect(config).await?;
    let matcher = CodeMatcher::vendor_default();

    let records = client.snapshot(&matcher, &snapshot_path).await?;
    println!(
        "Saved {} candidate messages to {}",
        records.len(),
        snapshot_path.display()
    );

    client.latest_code(&matcher).await
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run().await {
        Ok(hit) => {
            println!("Latest passcode: {}", hit.code);
            println!("From: {}", hit.sender);
            println!("Received: {}", hit.received);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, category = %e.category(), "No passcode retrieved");
            ExitCode::FAILURE
        }
    }
}
