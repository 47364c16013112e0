//! Import job shapes as returned by the upload and status endpoints.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{JobId, Timestamp};

/// Fallback shown when a job fails without an `error_message`.
pub const DEFAULT_FAILURE_MESSAGE: &str = "Import failed";

/// Server-side lifecycle of an import job.
///
/// Progression is monotonic; `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportJobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ImportJobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ImportJobStatus::Completed | ImportJobStatus::Failed)
    }

    /// Wire value, e.g. `"processing"`.
    pub fn as_str(self) -> &'static str {
        match self {
            ImportJobStatus::Pending => "pending",
            ImportJobStatus::Processing => "processing",
            ImportJobStatus::Completed => "completed",
            ImportJobStatus::Failed => "failed",
        }
    }

    /// Capitalised display label, e.g. `"Processing"`.
    pub fn label(self) -> &'static str {
        match self {
            ImportJobStatus::Pending => "Pending",
            ImportJobStatus::Processing => "Processing",
            ImportJobStatus::Completed => "Completed",
            ImportJobStatus::Failed => "Failed",
        }
    }
}

/// Capitalise the first character of a raw status string.
///
/// Used for statuses the client does not model, such as the free-form
/// `status` echoed by the upload endpoint.
pub fn status_label(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Body of a successful `POST /api/upload/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadAccepted {
    pub job_id: JobId,
    /// Initial job status as reported by the server (normally `pending`).
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
}

/// Body of a successful `GET /api/import/{job_id}/status/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportJobSnapshot {
    pub status: ImportJobStatus,
    /// Percentage in `0..=100`.
    pub progress: u8,
    pub total_records: u64,
    pub processed_records: u64,
    pub successful_records: u64,
    pub failed_records: u64,
    /// Only populated when `status` is `failed`.
    #[serde(default)]
    pub error_message: Option<String>,

    // Informational fields below never fail the parse: a value of the
    // wrong shape reads as `None`.
    #[serde(default, deserialize_with = "lenient")]
    pub job_id: Option<JobId>,
    #[serde(default, deserialize_with = "lenient")]
    pub file_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub file_size: Option<u64>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub started_at: Option<Timestamp>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub completed_at: Option<Timestamp>,
    /// Wall-clock processing time in seconds.
    #[serde(default, deserialize_with = "lenient")]
    pub duration: Option<f64>,
}

impl ImportJobSnapshot {
    /// Failure message to surface, falling back to [`DEFAULT_FAILURE_MESSAGE`].
    pub fn failure_message(&self) -> String {
        self.error_message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(DEFAULT_FAILURE_MESSAGE)
            .to_string()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
    Value(T),
    Other(#[allow(dead_code)] IgnoredAny),
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match Option::<Lenient<T>>::deserialize(deserializer)? {
        Some(Lenient::Value(value)) => Some(value),
        Some(Lenient::Other(_)) | None => None,
    })
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = lenient(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

/// Parse an ISO 8601 timestamp. Values without an offset (as produced by
/// a server running without time zone support) are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Progress shape handed to observers on every non-terminal poll tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    pub percent: u8,
    pub status: ImportJobStatus,
    pub status_label: String,
    pub processed: u64,
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
}

impl ProgressSnapshot {
    /// Baseline shown the moment an upload starts, before any response.
    pub fn initial() -> Self {
        Self {
            percent: 0,
            status: ImportJobStatus::Pending,
            status_label: ImportJobStatus::Pending.label().to_string(),
            processed: 0,
            total: 0,
            successful: 0,
            failed: 0,
        }
    }

    /// `"processed / total"`, as rendered next to the progress bar.
    pub fn ratio_label(&self) -> String {
        format!("{} / {}", self.processed, self.total)
    }
}

impl From<&ImportJobSnapshot> for ProgressSnapshot {
    fn from(job: &ImportJobSnapshot) -> Self {
        Self {
            percent: job.progress.min(100),
            status: job.status,
            status_label: job.status.label().to_string(),
            processed: job.processed_records,
            total: job.total_records,
            successful: job.successful_records,
            failed: job.failed_records,
        }
    }
}
