//! Browser automation for the vendor portal.
//!
//! [`PortalDriver`] walks a WebDriver session through the portal's fixed UI
//! sequence: credential login, passcode request and entry, report page
//! navigation, date-range selection, and export. The portal renders
//! asynchronously with no reliable readiness signals, so steps are paced by
//! the fixed delays in [`DelayConfig`](crate::config::DelayConfig) and the
//! date-range controls are resolved through ordered selector fallback lists.

use crate::config::PortalConfig;
use crate::error::{Error, Result};
use chrono::NaiveDate;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thirtyfour::error::WebDriverError;
use thirtyfour::prelude::*;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

/// Poll interval for element queries and download watching.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Candidates for the report page's date picker control.
fn picker_candidates() -> Vec<By> {
    vec![
        By::Css("#location-dashboard_date-picker"),
        By::Css(r#"[data-testid="date-picker"]"#),
        By::Css(".date-picker"),
        By::Css(r#"input[type="text"][placeholder*="date"]"#),
        By::Css(".n-date-picker"),
    ]
}

/// Candidates for the start/end date inputs inside the picker panel.
fn input_candidates() -> Vec<By> {
    vec![
        By::Css(r#"input[placeholder="Start Date"]"#),
        By::Css(r#"input[placeholder*="Start"]"#),
        By::Css(r#"input[placeholder*="start"]"#),
        By::Css(r#".n-input input[type="text"]"#),
        By::Css(".date-input input"),
    ]
}

/// Candidates for the picker's confirm button.
fn confirm_candidates() -> Vec<By> {
    vec![
        By::Css(".n-button.n-button--primary-type.n-button--tiny-type"),
        By::Css(".n-button--primary-type"),
        By::Css(r#"button[type="submit"]"#),
        By::XPath("//button[contains(., 'Confirm')]"),
        By::XPath("//button[contains(., 'Apply')]"),
        By::XPath("//button[contains(., 'OK')]"),
        By::Css(".confirm-btn"),
        By::Css(".apply-btn"),
    ]
}

/// Dates are typed into the picker as `MM/DD/YYYY`.
fn format_portal_date(date: NaiveDate) -> String {
    date.format("%m/%d/%Y").to_string()
}

/// Partially-written downloads the browser leaves while transferring.
fn is_partial_download(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            ext.eq_ignore_ascii_case("crdownload")
                || ext.eq_ignore_ascii_case("tmp")
                || ext.eq_ignore_ascii_case("part")
        })
        .unwrap_or(false)
}

/// WebDriver session scripted against the vendor portal.
///
/// Create using [`PortalDriver::launch`]; call [`quit`](Self::quit) when
/// done. The orchestration in [`PortalAutomation`](crate::PortalAutomation)
/// guarantees the session is closed on both success and failure.
pub struct PortalDriver {
    driver: WebDriver,
    config: PortalConfig,
    download_dir: PathBuf,
}

impl PortalDriver {
    /// Starts a WebDriver session configured to download into the configured
    /// folder.
    ///
    /// # Errors
    ///
    /// Returns an error if the download folder cannot be created or the
    /// WebDriver session cannot be started.
    #[instrument(
        name = "PortalDriver::launch",
        skip_all,
        fields(webdriver_url = %config.webdriver_url, headless = config.headless)
    )]
    pub async fn launch(config: PortalConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.download_dir).map_err(|source| Error::ReportDir {
            path: config.download_dir.clone(),
            source,
        })?;
        // The browser needs an absolute path for its download preference
        let download_dir =
            config
                .download_dir
                .canonicalize()
                .map_err(|source| Error::ReportDir {
                    path: config.download_dir.clone(),
                    source,
                })?;

        let caps_err = |source: WebDriverError| Error::Browser {
            action: "configure browser capabilities".into(),
            source,
        };

        let mut caps = DesiredCapabilities::chrome();
        if config.headless {
            caps.add_chrome_arg("--headless=new").map_err(caps_err)?;
        }
        caps.add_chrome_arg("--start-maximized").map_err(caps_err)?;
        caps.add_chrome_option(
            "prefs",
            serde_json::json!({
                "download.default_directory": download_dir.to_string_lossy(),
                "download.prompt_for_download": false,
                "download.directory_upgrade": true,
            }),
        )
        .map_err(caps_err)?;

        let driver = WebDriver::new(&config.webdriver_url, caps)
            .await
            .map_err(|source| Error::SessionStart {
                webdriver_url: config.webdriver_url.clone(),
                source,
            })?;

        debug!(download_dir = %download_dir.display(), "Browser session started");

        Ok(Self {
            driver,
            config,
            download_dir,
        })
    }

    /// Opens the login page and submits the account credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the page cannot be opened or the login form
    /// elements cannot be resolved.
    #[instrument(
        name = "PortalDriver::sign_in",
        skip(self),
        fields(login_url = %self.config.login_url)
    )]
    pub async fn sign_in(&self) -> Result<()> {
        self.driver
            .goto(self.config.login_url.as_str())
            .await
            .map_err(|source| Error::Browser {
                action: "open login page".into(),
                source,
            })?;

        let email = self.required(By::Css("#email"), "email input").await?;
        email
            .send_keys(self.config.email())
            .await
            .map_err(|source| Error::Browser {
                action: "fill email".into(),
                source,
            })?;

        let password = self.required(By::Css("#password"), "password input").await?;
        password
            .send_keys(self.config.password())
            .await
            .map_err(|source| Error::Browser {
                action: "fill password".into(),
                source,
            })?;

        self.required(By::Css(r#"button[type="submit"]"#), "login submit")
            .await?
            .click()
            .await
            .map_err(|source| Error::Browser {
                action: "submit login form".into(),
                source,
            })?;

        info!("Login form submitted");
        Ok(())
    }

    /// Waits for the passcode verification prompt and requests a code email.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt or the send button does not appear
    /// within the element timeout.
    #[instrument(name = "PortalDriver::request_code", skip(self))]
    pub async fn request_code(&self) -> Result<()> {
        self.required(
            By::XPath("//*[contains(text(), 'Verify Security Code')]"),
            "passcode verification prompt",
        )
        .await?;

        self.required(
            By::XPath("//*[contains(text(), 'Send Security Code')]"),
            "send code button",
        )
        .await?
        .click()
        .await
        .map_err(|source| Error::Browser {
            action: "request passcode email".into(),
            source,
        })?;

        info!("Passcode email requested");
        Ok(())
    }

    /// Types the passcode into the per-digit inputs of the verification form.
    ///
    /// # Errors
    ///
    /// Returns an error if the input container cannot be resolved or a digit
    /// cannot be typed.
    #[instrument(name = "PortalDriver::submit_code", skip_all)]
    pub async fn submit_code(&self, code: &str) -> Result<()> {
        let container = self
            .required(
                By::Css(".flex.flex-row.justify-center.px-2.text-center"),
                "passcode input container",
            )
            .await?;

        let inputs = container
            .find_all(By::Tag("input"))
            .await
            .map_err(|source| Error::Browser {
                action: "locate passcode inputs".into(),
                source,
            })?;

        debug!(inputs = inputs.len(), digits = code.len(), "Typing passcode");

        // One input per digit; extra digits beyond the inputs are dropped
        for (input, digit) in inputs.iter().zip(code.chars()) {
            input
                .send_keys(digit.to_string())
                .await
                .map_err(|source| Error::Browser {
                    action: "type passcode digit".into(),
                    source,
                })?;
            sleep(self.config.delays.keystroke).await;
        }

        info!("Passcode entered");
        Ok(())
    }

    /// Navigates to the report dashboard and lets the page settle.
    ///
    /// # Errors
    ///
    /// Returns an error if navigation fails.
    #[instrument(
        name = "PortalDriver::open_report_page",
        skip(self),
        fields(report_url = %self.config.report_url)
    )]
    pub async fn open_report_page(&self) -> Result<()> {
        self.driver
            .goto(self.config.report_url.as_str())
            .await
            .map_err(|source| Error::Browser {
                action: "open report page".into(),
                source,
            })?;

        sleep(self.config.delays.page_settle).await;

        if let Ok(url) = self.driver.current_url().await {
            debug!(url = %url, "Report page loaded");
        }

        Ok(())
    }

    /// Sets the dashboard date range through the selector fallback lists.
    ///
    /// The picker itself is required; a start or end input that resolves
    /// through none of its candidates is logged and skipped; a missing
    /// confirm button falls back to pressing Enter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ElementNotFound`] if no date picker candidate
    /// resolves, or an error for any interaction that fails outright.
    #[instrument(name = "PortalDriver::set_date_range", skip(self))]
    pub async fn set_date_range(&self, start: NaiveDate, end: NaiveDate) -> Result<()> {
        let picker = self
            .first_matching(
                "date picker",
                picker_candidates(),
                self.config.timeouts.picker_probe,
            )
            .await
            .ok_or_else(|| Error::ElementNotFound {
                element: "date picker".into(),
            })?;

        picker.click().await.map_err(|source| Error::Browser {
            action: "open date picker".into(),
            source,
        })?;

        sleep(self.config.delays.picker_open).await;

        let start_str = format_portal_date(start);
        let end_str = format_portal_date(end);
        info!(start = %start_str, end = %end_str, "Setting date range");

        let (start_input, end_input) = self.date_inputs().await;

        match &start_input {
            Some(input) => {
                self.fill_date(input, &start_str, "start date").await?;
            }
            None => warn!("Start date input not found, skipping"),
        }

        match &end_input {
            Some(input) => {
                self.fill_date(input, &end_str, "end date").await?;
            }
            None => warn!("End date input not found, skipping"),
        }

        sleep(self.config.delays.pre_confirm).await;

        match self
            .first_matching(
                "confirm button",
                confirm_candidates(),
                self.config.timeouts.confirm_probe,
            )
            .await
        {
            Some(button) => {
                button.click().await.map_err(|source| Error::Browser {
                    action: "confirm date range".into(),
                    source,
                })?;
                debug!("Date range confirmed");
            }
            None => {
                warn!("Confirm button not found, pressing Enter");
                self.driver
                    .action_chain()
                    .send_keys("\u{e007}") // WebDriver "Enter" key code
                    .perform()
                    .await
                    .map_err(|source| Error::Browser {
                        action: "press enter to confirm".into(),
                        source,
                    })?;
            }
        }

        sleep(self.config.delays.data_load).await;
        Ok(())
    }

    /// Clicks the export control and waits for the downloaded file.
    ///
    /// Returns the path of the new file in the download folder.
    ///
    /// # Errors
    ///
    /// Returns an error if the export control cannot be resolved or no new
    /// file appears within the download timeout.
    #[instrument(name = "PortalDriver::export_report", skip(self))]
    pub async fn export_report(&self) -> Result<PathBuf> {
        let existing = self.download_entries()?;

        self.required(
            By::Css("#call-reporting-dashboard_btn--export"),
            "export button",
        )
        .await?
        .click()
        .await
        .map_err(|source| Error::Browser {
            action: "click export".into(),
            source,
        })?;

        let path = self.wait_for_download(&existing).await?;
        info!(file = %path.display(), "Export downloaded");
        Ok(path)
    }

    /// Closes the browser session.
    ///
    /// # Errors
    ///
    /// Returns an error if the WebDriver session cannot be ended cleanly.
    #[instrument(name = "PortalDriver::quit", skip(self))]
    pub async fn quit(self) -> Result<()> {
        self.driver.quit().await.map_err(|source| Error::Browser {
            action: "close browser session".into(),
            source,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Private methods
    // ─────────────────────────────────────────────────────────────────────────

    /// Resolves a required element, bounded by the element timeout.
    async fn required(&self, by: By, element: &str) -> Result<WebElement> {
        self.driver
            .query(by)
            .wait(self.config.timeouts.element, POLL_INTERVAL)
            .first()
            .await
            .map_err(|_| Error::ElementNotFound {
                element: element.to_string(),
            })
    }

    /// Returns the first element resolving through the candidate list, each
    /// candidate bounded by `probe`.
    async fn first_matching(
        &self,
        element: &str,
        candidates: Vec<By>,
        probe: Duration,
    ) -> Option<WebElement> {
        for by in candidates {
            let selector = format!("{by:?}");
            match self
                .driver
                .query(by)
                .wait(probe, POLL_INTERVAL)
                .first()
                .await
            {
                Ok(found) => {
                    debug!(element, selector = %selector, "Resolved element");
                    return Some(found);
                }
                Err(_) => continue,
            }
        }
        None
    }

    /// Locates the start and end date inputs: the first candidate resolving
    /// any input supplies the start (its first input), the first resolving
    /// more than one supplies the end (its second input).
    async fn date_inputs(&self) -> (Option<WebElement>, Option<WebElement>) {
        let mut start = None;
        for by in input_candidates() {
            if let Ok(inputs) = self.driver.find_all(by).await {
                if !inputs.is_empty() {
                    start = inputs.into_iter().next();
                    break;
                }
            }
        }

        let mut end = None;
        for by in input_candidates() {
            if let Ok(mut inputs) = self.driver.find_all(by).await {
                if inputs.len() > 1 {
                    end = Some(inputs.swap_remove(1));
                    break;
                }
            }
        }

        (start, end)
    }

    /// Clears a date input and types the formatted date into it.
    async fn fill_date(&self, input: &WebElement, value: &str, field: &str) -> Result<()> {
        input.clear().await.map_err(|source| Error::Browser {
            action: format!("clear {field} input"),
            source,
        })?;
        input.send_keys(value).await.map_err(|source| Error::Browser {
            action: format!("fill {field} input"),
            source,
        })?;
        debug!(field, value, "Filled date input");
        Ok(())
    }

    /// Lists the download folder contents.
    fn download_entries(&self) -> Result<HashSet<PathBuf>> {
        let entries = std::fs::read_dir(&self.download_dir).map_err(|source| Error::ReportDir {
            path: self.download_dir.clone(),
            source,
        })?;

        let mut paths = HashSet::new();
        for entry in entries {
            let entry = entry.map_err(|source| Error::ReportDir {
                path: self.download_dir.clone(),
                source,
            })?;
            paths.insert(entry.path());
        }
        Ok(paths)
    }

    /// Polls the download folder until a new, fully-written file appears.
    async fn wait_for_download(&self, existing: &HashSet<PathBuf>) -> Result<PathBuf> {
        let timeout = self.config.timeouts.download;
        let deadline = Instant::now() + timeout;

        loop {
            for path in self.download_entries()? {
                if existing.contains(&path) || is_partial_download(&path) {
                    continue;
                }

                // A freshly-renamed download may still be flushing; accept it
                // once its size holds steady across one poll interval.
                let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
                sleep(POLL_INTERVAL).await;
                let settled = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(u64::MAX);
                if size == settled {
                    return Ok(path);
                }
            }

            if Instant::now() > deadline {
                return Err(Error::DownloadTimeout { timeout });
            }

            sleep(POLL_INTERVAL).await;
        }
    }
}

impl std::fmt::Debug for PortalDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortalDriver")
            .field("login_url", &self.config.login_url)
            .field("download_dir", &self.download_dir)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_portal_date() {
        let date = NaiveDate::from_ymd_opt(2025, 9, 30).unwrap();
        assert_eq!(format_portal_date(date), "09/30/2025");

        let date = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
        assert_eq!(format_portal_date(date), "10/01/2025");
    }

    #[test]
    fn test_is_partial_download() {
        assert!(is_partial_download(Path::new("reports/export.crdownload")));
        assert!(is_partial_download(Path::new("reports/export.CRDOWNLOAD")));
        assert!(is_partial_download(Path::new("reports/export.tmp")));
        assert!(!is_partial_download(Path::new("reports/export.csv")));
        assert!(!is_partial_download(Path::new("reports/export")));
    }

    #[test]
    fn test_fallback_lists_keep_priority_order() {
        // The id-based selectors are the most specific and must stay first
        let pickers = picker_candidates();
        assert!(format!("{:?}", pickers[0]).contains("location-dashboard_date-picker"));

        let inputs = input_candidates();
        assert!(format!("{:?}", inputs[0]).contains("Start Date"));

        assert!(!confirm_candidates().is_empty());
    }
}
