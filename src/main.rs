//! Full automation entry point: login with emailed passcode, export the
//! report, relay it to the webhook.
//!
//! Configuration comes from environment variables (a `.env` file is loaded
//! if present):
//!
//! ```bash
//! export REPORT_RELAY_TENANT_ID="tenant-guid"
//! export REPORT_RELAY_CLIENT_ID="client-guid"
//! export REPORT_RELAY_CLIENT_SECRET="secret-value"
//! export REPORT_RELAY_MAILBOX="ops@example.com"
//! export REPORT_RELAY_CODE_SENDERS="noreply@vendor.example,noreply@mailer.example"
//! export REPORT_RELAY_LOGIN_URL="https://portal.example.com/"
//! export REPORT_RELAY_REPORT_URL="https://portal.example.com/v2/location/<id>/reporting/call"
//! export REPORT_RELAY_PORTAL_EMAIL="ops@example.com"
//! export REPORT_RELAY_PORTAL_PASSWORD="portal-password"
//! export REPORT_RELAY_WEBHOOK_URL="https://hooks.example.com/report"
//! report-relay
//! ```
//!
//! Exit code 0 on success, 1 on failure.

use report_relay::{
    Error, MailboxConfig, PortalAutomation, PortalConfig, RelayConfig, Result, RunSummary,
    WebhookConfig,
};
use std::env;
use std::process::ExitCode;
use tracing::{error, info};
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

fn portal_config() -> Result<PortalConfig> {
    let mut builder = PortalConfig::builder()
        .login_url(required_var("REPORT_RELAY_LOGIN_URL")?)
        .report_url(required_var("REPORT_RELAY_REPORT_URL")?)
        .email(required_var("REPORT_RELAY_PORTAL_EMAIL")?)
        .password(required_var("REPORT_RELAY_PORTAL_PASSWORD")?);

    if let Some(url) = env_var("REPORT_RELAY_WEBDRIVER_URL") {
        builder = builder.webdriver_url(url);
    }
    if let Some(dir) = env_var("REPORT_RELAY_DOWNLOAD_DIR") {
        builder = builder.download_dir(dir);
    }
    if env_var("REPORT_RELAY_HEADLESS").is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
    {
        builder = builder.headless(true);
    }

    builder.build()
}

fn relay_config() -> Result<RelayConfig> {
    let webhook = WebhookConfig::builder()
        .url(required_var("REPORT_RELAY_WEBHOOK_URL")?)
        .build()?;

    let mut builder = RelayConfig::builder().webhook(webhook);
    if let Some(dir) = env_var("REPORT_RELAY_DOWNLOAD_DIR") {
        builder = builder.folder(dir);
    }
    if let Some(column) = env_var("REPORT_RELAY_DATE_COLUMN") {
        builder = builder.date_column(column);
    }

    builder.build()
}

async fn run() -> Result<RunSummary> {
    let automation = PortalAutomation::new(mailbox_config()?, portal_config()?, relay_config()?);
    automation.run().await
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
        Ok(summary) => {
            info!(
                export = %summary.export_path.display(),
                rows = summary.relay.rows_sent,
                date = %summary.relay.report_date,
                "Automation run completed"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(
                error = %e,
                category = %e.category(),
                retryable = e.is_retryable(),
                "Automation run failed"
            );
            ExitCode::FAILURE
        }
    }
}
