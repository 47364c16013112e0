//! Events published by the upload session and job poller.

use catalog_core::import_job::ProgressSnapshot;
use catalog_core::types::JobId;
use serde::Serialize;

/// Broadcast channel capacity for import events.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// An observable change in the upload / import lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImportEvent {
    /// A file was accepted for upload; progress is reset to the baseline
    /// before the server answers.
    UploadStarted {
        file_name: String,
        size_label: String,
        progress: ProgressSnapshot,
    },

    /// The server accepted the upload and assigned a job id.
    UploadAccepted {
        job_id: JobId,
        /// Capitalised initial status, e.g. `"Pending"`.
        status_label: String,
    },

    /// Tracking of an existing job started without an upload.
    Watching { job_id: JobId },

    /// Non-terminal poll tick.
    Progress {
        job_id: JobId,
        progress: ProgressSnapshot,
    },

    /// The job reached `completed`. Published at most once per job.
    Completed {
        job_id: JobId,
        progress: ProgressSnapshot,
    },

    /// The job reached `failed`. Published at most once per job.
    Failed { job_id: JobId, message: String },

    /// An upload or status request failed; `job_id` is set when the
    /// failure happened while polling.
    Error {
        job_id: Option<JobId>,
        message: String,
    },

    /// Local state was cleared ("retry" / "upload another").
    Reset,
}

impl ImportEvent {
    /// The job this event concerns, if any.
    pub fn job_id(&self) -> Option<&str> {
        match self {
            ImportEvent::UploadAccepted { job_id, .. }
            | ImportEvent::Watching { job_id }
            | ImportEvent::Progress { job_id, .. }
            | ImportEvent::Completed { job_id, .. }
            | ImportEvent::Failed { job_id, .. } => Some(job_id),
            ImportEvent::Error { job_id, .. } => job_id.as_deref(),
            ImportEvent::UploadStarted { .. } | ImportEvent::Reset => None,
        }
    }

    /// Whether this event ends tracking of a job.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ImportEvent::Completed { .. } | ImportEvent::Failed { .. } | ImportEvent::Error { .. }
        )
    }
}
