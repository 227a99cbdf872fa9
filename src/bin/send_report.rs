//! Standalone report relay: latest report file, latest-day rows only,
//! posted to the webhook.
//!
//! ```bash
//! export REPORT_RELAY_WEBHOOK_URL="https://hooks.example.com/report"
//! send-report
//! ```
//!
//! Exit code 0 on success, 1 on failure.

use report_relay::{Error, RelayConfig, RelaySummary, ReportRelay, Result, WebhookConfig};
use std::env;
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

async fn run() -> Result<RelaySummary> {
    let relay = ReportRelay::new(relay_config()?)?;
    relay.process_and_send().await
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
            println!(
                "Relayed {} rows for {} from {}",
                summary.rows_sent,
                summary.report_date,
                summary.file.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, category = %e.category(), "Report relay failed");
            ExitCode::FAILURE
        }
    }
}
