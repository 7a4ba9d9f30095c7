//! In-memory report store.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::debug;

use basalt_core::{Error, Report, Result};

/// Upload kind for report payloads.
pub const KIND_REPORTS: &str = "reports";

/// Upload kind for check log streams.
pub const KIND_LOGS: &str = "logs";

/// Thread-safe in-memory sink for the reports checks deliver.
///
/// One store lives for the duration of a run. Running checks upload
/// results concurrently while a summarizer may read; a single mutex
/// serializes every access, so readers never observe a torn entry.
#[derive(Debug, Default)]
pub struct ReportStore {
    reports: Mutex<HashMap<String, Report>>,
}

impl ReportStore {
    pub fn new() -> ReportStore {
        ReportStore::default()
    }

    /// Ingests data delivered by a check.
    ///
    /// `"reports"` content is decoded and stored under `check_id`,
    /// replacing any previous report for that check. `"logs"` content is
    /// accepted and discarded. Any other kind is an error. The returned
    /// link is always empty: this store has no external location to point
    /// at.
    pub fn upload_check_data(
        &self,
        check_id: &str,
        kind: &str,
        started_at: DateTime<Utc>,
        content: &[u8],
    ) -> Result<String> {
        let mut reports = self.reports.lock().unwrap();

        match kind {
            KIND_REPORTS => {
                debug!("report from check {check_id} ({} bytes)", content.len());
                let report: Report =
                    serde_json::from_slice(content).map_err(|e| Error::MalformedReport {
                        check_id: check_id.to_string(),
                        reason: e.to_string(),
                    })?;
                reports.insert(check_id.to_string(), report);
            }
            KIND_LOGS => {
                debug!(
                    "logs from check {check_id} started at {started_at} ({} bytes), discarding",
                    content.len()
                );
            }
            other => return Err(Error::UnknownDataKind(other.to_string())),
        }
        Ok(String::new())
    }

    /// One human-readable line per stored report.
    ///
    /// Line order follows map iteration and is unspecified; callers that
    /// need determinism sort the result.
    pub fn summary(&self) -> Vec<String> {
        let reports = self.reports.lock().unwrap();
        reports
            .values()
            .map(|r| {
                let start = r
                    .start_time
                    .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
                    .unwrap_or_else(|| "-".to_string());
                format!(
                    "checktype={} target={} start={} status={}",
                    r.checktype_name, r.target, start, r.status
                )
            })
            .collect()
    }

    /// Snapshot of the stored reports, keyed by check identifier.
    pub fn reports(&self) -> HashMap<String, Report> {
        self.reports.lock().unwrap().clone()
    }
}
