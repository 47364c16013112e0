//! The upload session: submitter state, current job id and poller.
//!
//! One [`UploadSession`] backs one upload screen for its whole lifetime
//! (`new` → any number of `submit`/`reset` cycles). All state that the
//! screen used to keep in process-wide variables lives here.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use catalog_client::{CsrfResolver, ImportTransport};
use catalog_core::error::ImportError;
use catalog_core::import_job::{status_label, ProgressSnapshot};
use catalog_core::selected_file::SelectedFile;
use catalog_core::types::JobId;
use tokio::sync::broadcast;

use crate::events::{ImportEvent, EVENT_CHANNEL_CAPACITY};
use crate::poller::JobPoller;

/// Shown when a dropped file does not carry the `.csv` extension.
pub const NOT_CSV_MESSAGE: &str = "Please select a CSV file";

/// Whether an upload request is currently outstanding.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmitState {
    #[default]
    Idle,
    Submitting { file_name: String },
}

/// What happened to a file handed to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Another upload was in flight; nothing was sent.
    Ignored,
    /// Dropped file without the `.csv` extension; nothing was sent.
    NotCsv,
    /// The server accepted the file and polling started.
    Accepted(JobId),
    /// The upload failed; the error was published as an event.
    Failed(ImportError),
}

/// Client-side state of one upload screen.
pub struct UploadSession {
    transport: Arc<dyn ImportTransport>,
    csrf: CsrfResolver,
    state: Mutex<SubmitState>,
    job_id: Mutex<Option<JobId>>,
    poller: JobPoller,
    events: broadcast::Sender<ImportEvent>,
}

/// Returns the session to [`SubmitState::Idle`] when dropped, so every
/// exit path of a submission (including cancellation of the future)
/// clears the in-flight state.
struct InFlightGuard<'a> {
    state: &'a Mutex<SubmitState>,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        *lock(self.state) = SubmitState::Idle;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl UploadSession {
    pub fn new(transport: Arc<dyn ImportTransport>, csrf: CsrfResolver) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let poller = JobPoller::new(Arc::clone(&transport), events.clone());

        Self {
            transport,
            csrf,
            state: Mutex::new(SubmitState::Idle),
            job_id: Mutex::new(None),
            poller,
            events,
        }
    }

    /// Subscribe to upload and polling events.
    pub fn subscribe(&self) -> broadcast::Receiver<ImportEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> SubmitState {
        lock(&self.state).clone()
    }

    pub fn is_submitting(&self) -> bool {
        matches!(*lock(&self.state), SubmitState::Submitting { .. })
    }

    /// Job id assigned by the server for the last accepted upload.
    pub fn job_id(&self) -> Option<JobId> {
        lock(&self.job_id).clone()
    }

    pub fn poller(&self) -> &JobPoller {
        &self.poller
    }

    /// Upload `file` and start tracking the resulting job.
    ///
    /// A no-op returning [`SubmitOutcome::Ignored`] while another upload is
    /// in flight. Failures are published as [`ImportEvent::Error`] and
    /// also returned.
    pub async fn submit(&self, file: SelectedFile) -> SubmitOutcome {
        if !self.try_begin(&file.name) {
            tracing::debug!(file_name = %file.name, "Upload already in flight, ignoring");
            return SubmitOutcome::Ignored;
        }
        self.upload(file).await
    }

    /// Drag-and-drop entry point: like [`submit`](Self::submit), but
    /// files without the `.csv` extension are refused locally.
    pub async fn drop_file(&self, file: SelectedFile) -> SubmitOutcome {
        if self.is_submitting() {
            tracing::debug!(file_name = %file.name, "Upload already in flight, ignoring drop");
            return SubmitOutcome::Ignored;
        }
        if !file.is_csv() {
            tracing::info!(file_name = %file.name, "Dropped file is not a CSV");
            self.poller.stop_polling();
            self.publish(ImportEvent::Error {
                job_id: None,
                message: NOT_CSV_MESSAGE.to_string(),
            });
            return SubmitOutcome::NotCsv;
        }
        self.submit(file).await
    }

    /// Track an already-submitted job without uploading anything.
    pub fn watch(&self, job_id: impl Into<JobId>) {
        let job_id = job_id.into();
        *lock(&self.job_id) = Some(job_id.clone());
        self.publish(ImportEvent::Watching {
            job_id: job_id.clone(),
        });
        self.poller.stop_polling();
        self.poller.start_polling(job_id);
    }

    /// Clear local state so a fresh upload can be attempted.
    ///
    /// An upload already in flight is not cancelled.
    pub fn reset(&self) {
        self.poller.stop_polling();
        *lock(&self.job_id) = None;
        tracing::debug!("Upload session reset");
        self.publish(ImportEvent::Reset);
    }

    // ---- private helpers ----

    /// Idle -> Submitting. Returns `false` if already submitting.
    fn try_begin(&self, file_name: &str) -> bool {
        let mut state = lock(&self.state);
        if matches!(*state, SubmitState::Submitting { .. }) {
            return false;
        }
        *state = SubmitState::Submitting {
            file_name: file_name.to_string(),
        };
        true
    }

    async fn upload(&self, file: SelectedFile) -> SubmitOutcome {
        let guard = InFlightGuard { state: &self.state };

        // The previous job's progress would overwrite the fresh baseline.
        self.poller.stop_polling();
        *lock(&self.job_id) = None;
        self.publish(ImportEvent::UploadStarted {
            file_name: file.name.clone(),
            size_label: file.size_label(),
            progress: ProgressSnapshot::initial(),
        });

        let token = self.csrf.resolve();
        match &token {
            Some(token) => tracing::debug!(source = ?token.source, "Resolved CSRF token"),
            None => tracing::warn!("No CSRF token available, uploading without one"),
        }

        tracing::info!(file_name = %file.name, size = file.size(), "Uploading CSV");
        let result = self
            .transport
            .upload_csv(&file, token.as_ref().map(|t| t.value.as_str()))
            .await;
        drop(guard);

        match result {
            Ok(accepted) => {
                *lock(&self.job_id) = Some(accepted.job_id.clone());
                tracing::info!(job_id = %accepted.job_id, "Upload accepted");
                self.publish(ImportEvent::UploadAccepted {
                    job_id: accepted.job_id.clone(),
                    status_label: status_label(&accepted.status),
                });
                self.poller.stop_polling();
                self.poller.start_polling(accepted.job_id.clone());
                SubmitOutcome::Accepted(accepted.job_id)
            }
            Err(err) => {
                tracing::warn!(file_name = %file.name, error = %err, "Upload failed");
                self.publish(ImportEvent::Error {
                    job_id: None,
                    message: upload_error_message(&err),
                });
                SubmitOutcome::Failed(err)
            }
        }
    }

    fn publish(&self, event: ImportEvent) {
        let _ = self.events.send(event);
    }
}

/// User-visible message for a failed upload.
fn upload_error_message(err: &ImportError) -> String {
    match err {
        ImportError::Network(msg) => format!("Upload failed: {msg}"),
        ImportError::Transport(msg) | ImportError::ServerRejected(msg) => msg.clone(),
        ImportError::MalformedResponse(_) => {
            "Upload failed: unexpected response from server".to_string()
        }
    }
}
