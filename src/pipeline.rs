//! The full login/export/relay sequence.
//!
//! [`PortalAutomation`] wires the three stages together: it drives the
//! portal through login, requests the passcode email, reads the code out of
//! the mailbox mid-sequence, completes the export, and hands the downloaded
//! file to the report relay. The browser session is closed on the way out,
//! success or failure.

use crate::config::{MailboxConfig, PortalConfig, RelayConfig};
use crate::error::Result;
use crate::mailbox::MailboxClient;
use crate::matcher::CodeMatcher;
use crate::portal::PortalDriver;
use crate::report::{RelaySummary, ReportRelay};
use chrono::{Days, Local};
use std::path::PathBuf;
use tokio::time::sleep;
use tracing::{info, instrument, warn};

/// Outcome of a completed automation run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// The passcode used to complete the login.
    pub code: String,
    /// The exported file saved by the browser.
    pub export_path: PathBuf,
    /// The relay outcome.
    pub relay: RelaySummary,
}

/// Orchestrates one full run: login with emailed passcode, date-range
/// export, webhook relay.
///
/// # Example
///
/// ```no_run
/// use report_relay::{
///     MailboxConfig, PortalAutomation, PortalConfig, RelayConfig, WebhookConfig,
/// };
///
/// # async fn example() -> report_relay::Result<()> {
/// # let mailbox = MailboxConfig::builder()
/// #     .tenant_id("t").client_id("c").client_secret("s")
/// #     .mailbox("ops@example.com").sender("noreply@vendor.example")
/// #     .subject("Login security code").build()?;
/// # let portal = PortalConfig::builder()
/// #     .login_url("https://portal.example.com/")
/// #     .report_url("https://portal.example.com/reporting/call")
/// #     .email("ops@example.com").password("secret").build()?;
/// # let relay = RelayConfig::builder()
/// #     .webhook(WebhookConfig::builder().url("https://hooks.example.com/report").build()?)
/// #     .build()?;
/// let automation = PortalAutomation::new(mailbox, portal, relay);
/// let summary = automation.run().await?;
/// println!("Relayed {} rows", summary.relay.rows_sent);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct PortalAutomation {
    mailbox: MailboxConfig,
    portal: PortalConfig,
    relay: RelayConfig,
}

impl PortalAutomation {
    /// Creates the automation from its stage configurations.
    #[must_use]
    pub fn new(mailbox: MailboxConfig, portal: PortalConfig, relay: RelayConfig) -> Self {
        Self {
            mailbox,
            portal,
            relay,
        }
    }

    /// Executes the full sequence.
    ///
    /// The first error aborts the run; the browser session is closed
    /// regardless of the outcome.
    ///
    /// # Errors
    ///
    /// Returns the first stage error encountered.
    #[instrument(name = "PortalAutomation::run", skip(self))]
    pub async fn run(&self) -> Result<RunSummary> {
        let mailbox = MailboxClient::connect(self.mailbox.clone()).await?;
        let driver = PortalDriver::launch(self.portal.clone()).await?;

        let result = self.run_steps(&mailbox, &driver).await;

        // Always close the browser, whatever happened above
        if let Err(quit_error) = driver.quit().await {
            warn!(error = %quit_error, "Failed to close browser session");
        }

        result
    }

    async fn run_steps(
        &self,
        mailbox: &MailboxClient,
        driver: &PortalDriver,
    ) -> Result<RunSummary> {
        let delays = &self.portal.delays;

        driver.sign_in().await?;
        driver.request_code().await?;

        info!(delay = ?delays.email_arrival, "Waiting for passcode email to arrive");
        sleep(delays.email_arrival).await;

        let matcher = CodeMatcher::vendor_default();
        let code = mailbox.wait_for_code(&matcher).await?;
        info!("Passcode retrieved from mailbox");

        driver.submit_code(&code).await?;

        info!(delay = ?delays.post_login, "Waiting for login processing");
        sleep(delays.post_login).await;

        driver.open_report_page().await?;

        info!(delay = ?delays.pre_interaction, "Waiting before setting date range");
        sleep(delays.pre_interaction).await;

        // Last one day: yesterday through today
        let today = Local::now().date_naive();
        let yesterday = today.checked_sub_days(Days::new(1)).unwrap_or(today);
        driver.set_date_range(yesterday, today).await?;

        let export_path = driver.export_report().await?;

        let relay = ReportRelay::new(self.relay.clone())?;
        let relay_summary = relay.process_and_send().await?;
        info!(
            rows = relay_summary.rows_sent,
            date = %relay_summary.report_date,
            "Reports relayed to webhook"
        );

        // Grace period before the session is torn down
        sleep(delays.post_export).await;

        Ok(RunSummary {
            code,
            export_path,
            relay: relay_summary,
        })
    }
}
