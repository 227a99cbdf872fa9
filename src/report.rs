//! Report location, parsing, and latest-day filtering.
//!
//! The relay reads the most recently modified report in a folder, parses it
//! as header-delimited CSV, keeps only the rows of the single most recent
//! calendar date present, and hands them to the webhook.
//!
//! # Example
//!
//! ```no_run
//! use report_relay::{RelayConfig, ReportRelay, WebhookConfig};
//!
//! # async fn example() -> report_relay::Result<()> {
//! let webhook = WebhookConfig::builder()
//!     .url("https://hooks.example.com/report")
//!     .build()?;
//! let relay = ReportRelay::new(RelayConfig::builder().webhook(webhook).build()?)?;
//!
//! let summary = relay.process_and_send().await?;
//! println!("Relayed {} rows for {}", summary.rows_sent, summary.report_date);
//! # Ok(())
//! # }
//! ```

use crate::config::RelayConfig;
use crate::error::{Error, Result};
use crate::webhook::WebhookClient;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, instrument};

/// One parsed report line: column name to trimmed value.
pub type ReportRow = BTreeMap<String, String>;

/// Returns the most recently modified file with the given extension
/// (without dot, case-insensitive) in `folder`.
///
/// # Errors
///
/// Returns [`Error::ReportDir`] if the folder cannot be read and
/// [`Error::NoReport`] if no file with the extension exists.
pub fn latest_report(folder: &Path, extension: &str) -> Result<PathBuf> {
    let entries = std::fs::read_dir(folder).map_err(|source| Error::ReportDir {
        path: folder.to_path_buf(),
        source,
    })?;

    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for entry in entries {
        let entry = entry.map_err(|source| Error::ReportDir {
            path: folder.to_path_buf(),
            source,
        })?;
        let path = entry.path();

        let matches_extension = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case(extension))
            .unwrap_or(false);
        if !matches_extension {
            continue;
        }

        let modified = entry
            .metadata()
            .and_then(|metadata| metadata.modified())
            .map_err(|source| Error::ReportDir {
                path: folder.to_path_buf(),
                source,
            })?;

        if newest
            .as_ref()
            .map_or(true, |(newest_time, _)| modified > *newest_time)
        {
            newest = Some((modified, path));
        }
    }

    newest
        .map(|(_, path)| path)
        .ok_or_else(|| Error::NoReport {
            path: folder.to_path_buf(),
        })
}

/// Parses a report file into row maps with trimmed headers and values.
///
/// # Errors
///
/// Returns [`Error::ReportParse`] if the file cannot be read as CSV.
pub fn parse_rows(path: &Path) -> Result<Vec<ReportRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| Error::ReportParse {
            path: path.to_path_buf(),
            source,
        })?;

    let headers = reader
        .headers()
        .map_err(|source| Error::ReportParse {
            path: path.to_path_buf(),
            source,
        })?
        .clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| Error::ReportParse {
            path: path.to_path_buf(),
            source,
        })?;

        let row: ReportRow = headers
            .iter()
            .zip(record.iter())
            .map(|(header, value)| (header.to_string(), value.to_string()))
            .collect();
        rows.push(row);
    }

    Ok(rows)
}

/// Returns the maximum calendar date found in `date_column` across the rows.
///
/// The column holds `YYYY-MM-DD HH:MM:SS` timestamps; only the date part is
/// read. Rows with a missing or unparseable value are skipped.
#[must_use]
pub fn latest_day(rows: &[ReportRow], date_column: &str) -> Option<NaiveDate> {
    rows.iter()
        .filter_map(|row| row_date(row, date_column))
        .max()
}

/// Keeps only the rows whose date equals the maximum date present.
///
/// Returns the date and the kept rows, or `None` if no row carries a
/// parseable date.
#[must_use]
pub fn rows_for_latest_day(
    rows: Vec<ReportRow>,
    date_column: &str,
) -> Option<(NaiveDate, Vec<ReportRow>)> {
    let max_date = latest_day(&rows, date_column)?;

    let kept: Vec<ReportRow> = rows
        .into_iter()
        .filter(|row| row_date(row, date_column) == Some(max_date))
        .collect();

    Some((max_date, kept))
}

/// Parses the date part of a row's timestamp column.
fn row_date(row: &ReportRow, date_column: &str) -> Option<NaiveDate> {
    let value = row.get(date_column)?;
    let date_part = value.split_whitespace().next()?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Summary of a completed relay run.
#[derive(Debug, Clone)]
pub struct RelaySummary {
    /// The report file that was relayed.
    pub file: PathBuf,
    /// The calendar date the forwarded rows belong to.
    pub report_date: NaiveDate,
    /// How many rows were forwarded.
    pub rows_sent: usize,
}

/// Locates the latest report, filters it to its most recent day, and posts
/// the rows to the webhook.
///
/// Create using [`ReportRelay::new`].
#[derive(Debug)]
pub struct ReportRelay {
    config: RelayConfig,
    webhook: WebhookClient,
}

impl ReportRelay {
    /// Creates a relay from its configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the webhook HTTP client cannot be built.
    pub fn new(config: RelayConfig) -> Result<Self> {
        let webhook = WebhookClient::new(config.webhook.clone())?;
        Ok(Self { config, webhook })
    }

    /// Runs the full relay: locate, parse, filter, send.
    ///
    /// Each stage short-circuits the run on failure or when it produces
    /// nothing to forward.
    ///
    /// # Errors
    ///
    /// Returns the first stage error, [`Error::EmptyReport`] when the file
    /// has no forwardable rows, or the webhook delivery error.
    #[instrument(
        name = "ReportRelay::process_and_send",
        skip(self),
        fields(folder = %self.config.folder.display())
    )]
    pub async fn process_and_send(&self) -> Result<RelaySummary> {
        let file = latest_report(&self.config.folder, &self.config.extension)?;
        info!(file = %file.display(), "Found latest report");

        let rows = parse_rows(&file)?;
        if rows.is_empty() {
            return Err(Error::EmptyReport { path: file });
        }
        debug!(rows = rows.len(), "Parsed report");

        let (report_date, kept) = rows_for_latest_day(rows, &self.config.date_column)
            .ok_or_else(|| Error::EmptyReport { path: file.clone() })?;
        info!(date = %report_date, kept = kept.len(), "Filtered to latest day");

        self.webhook.send(&kept).await?;

        Ok(RelaySummary {
            file,
            report_date,
            rows_sent: kept.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::thread;
    use std::time::Duration;

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.sync_all().unwrap();
        path
    }

    fn row(date_time: &str, caller: &str) -> ReportRow {
        let mut row = ReportRow::new();
        row.insert("Date & Time".to_string(), date_time.to_string());
        row.insert("Caller".to_string(), caller.to_string());
        row
    }

    #[test]
    fn test_latest_report_picks_most_recently_modified() {
        let dir = tempfile::tempdir().unwrap();

        write_file(dir.path(), "first.csv", "a,b\n1,2\n");
        thread::sleep(Duration::from_millis(20));
        write_file(dir.path(), "second.csv", "a,b\n3,4\n");
        thread::sleep(Duration::from_millis(20));
        let newest = write_file(dir.path(), "third.csv", "a,b\n5,6\n");

        let found = latest_report(dir.path(), "csv").unwrap();
        assert_eq!(found, newest);
    }

    #[test]
    fn test_latest_report_ignores_other_extensions() {
        let dir = tempfile::tempdir().unwrap();

        let report = write_file(dir.path(), "export.csv", "a\n1\n");
        thread::sleep(Duration::from_millis(20));
        write_file(dir.path(), "notes.txt", "newer but not a report");

        let found = latest_report(dir.path(), "csv").unwrap();
        assert_eq!(found, report);
    }

    #[test]
    fn test_latest_report_empty_folder() {
        let dir = tempfile::tempdir().unwrap();
        let result = latest_report(dir.path(), "csv");
        assert!(matches!(result, Err(Error::NoReport { .. })));
    }

    #[test]
    fn test_latest_report_missing_folder() {
        let result = latest_report(Path::new("no-such-folder-anywhere"), "csv");
        assert!(matches!(result, Err(Error::ReportDir { .. })));
    }

    #[test]
    fn test_parse_rows_trims_headers_and_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "export.csv",
            "Date & Time , Caller \n2025-09-30 10:09:23 ,  Alice \n",
        );

        let rows = parse_rows(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["Date & Time"], "2025-09-30 10:09:23");
        assert_eq!(rows[0]["Caller"], "Alice");
    }

    #[test]
    fn test_rows_for_latest_day_keeps_max_date_only() {
        let rows = vec![
            row("2025-09-29 23:59:59", "old-1"),
            row("2025-09-30 08:00:00", "new-1"),
            row("2025-09-29 12:00:00", "old-2"),
            row("2025-09-30 10:09:23", "new-2"),
        ];

        let (date, kept) = rows_for_latest_day(rows, "Date & Time").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 9, 30).unwrap());
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|r| r["Caller"].starts_with("new-")));
    }

    #[test]
    fn test_rows_for_latest_day_skips_unparseable_dates() {
        let rows = vec![
            row("not a date", "bad"),
            row("", "empty"),
            row("2025-09-30 10:00:00", "good"),
        ];

        let (date, kept) = rows_for_latest_day(rows, "Date & Time").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 9, 30).unwrap());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0]["Caller"], "good");
    }

    #[test]
    fn test_rows_for_latest_day_no_parseable_date() {
        let rows = vec![row("not a date", "bad"), row("also bad", "worse")];
        assert!(rows_for_latest_day(rows, "Date & Time").is_none());
    }

    #[test]
    fn test_rows_for_latest_day_missing_column() {
        let rows = vec![row("2025-09-30 10:00:00", "a")];
        assert!(rows_for_latest_day(rows, "Timestamp").is_none());
    }

    #[test]
    fn test_latest_day_across_rows() {
        let rows = vec![
            row("2025-09-28 10:00:00", "a"),
            row("2025-09-30 10:00:00", "b"),
            row("2025-09-29 10:00:00", "c"),
        ];
        assert_eq!(
            latest_day(&rows, "Date & Time"),
            NaiveDate::from_ymd_opt(2025, 9, 30)
        );
    }
}
