//! Fixed-interval status polling for a single import job.
//!
//! [`JobPoller`] is either **Idle** or **Polling** exactly one job. Each
//! polling run is a spawned ticker task owning a [`CancellationToken`];
//! every tick dispatches an independent status request without waiting
//! for earlier ones, so responses may overlap on a slow network.
//!
//! Responses are evaluated under the slot lock and only while their
//! generation is still the live one. That single check makes late
//! responses after [`stop_polling`](JobPoller::stop_polling) harmless and
//! guarantees at most one terminal event per job, however many
//! stragglers come back.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use catalog_client::ImportTransport;
use catalog_core::error::ImportError;
use catalog_core::import_job::{ImportJobSnapshot, ImportJobStatus, ProgressSnapshot};
use catalog_core::types::JobId;
use tokio::sync::broadcast;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::events::ImportEvent;

/// Delay between status requests. Fixed; there is no backoff.
pub const POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Polls job status and publishes progress and terminal events.
///
/// Dropping the poller stops any active polling run.
pub struct JobPoller {
    inner: Arc<PollerInner>,
}

struct PollerInner {
    transport: Arc<dyn ImportTransport>,
    events: broadcast::Sender<ImportEvent>,
    /// The live handle; `None` while Idle.
    slot: Mutex<Option<PollHandle>>,
    next_generation: AtomicU64,
}

/// Bookkeeping for the one active polling run.
struct PollHandle {
    job_id: JobId,
    generation: u64,
    cancel: CancellationToken,
}

impl JobPoller {
    pub fn new(
        transport: Arc<dyn ImportTransport>,
        events: broadcast::Sender<ImportEvent>,
    ) -> Self {
        Self {
            inner: Arc::new(PollerInner {
                transport,
                events,
                slot: Mutex::new(None),
                next_generation: AtomicU64::new(1),
            }),
        }
    }

    /// Subscribe to the events this poller publishes.
    pub fn subscribe(&self) -> broadcast::Receiver<ImportEvent> {
        self.inner.events.subscribe()
    }

    /// Start polling `job_id`, abandoning any job polled so far.
    ///
    /// The abandoned job receives no further events. The first request
    /// is sent one [`POLL_INTERVAL`] after this call.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_polling(&self, job_id: impl Into<JobId>) {
        let job_id = job_id.into();
        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();

        {
            let mut slot = self.inner.lock_slot();
            if let Some(previous) = slot.take() {
                tracing::debug!(job_id = %previous.job_id, "Abandoning previous poll");
                previous.cancel.cancel();
            }
            *slot = Some(PollHandle {
                job_id: job_id.clone(),
                generation,
                cancel: cancel.clone(),
            });
        }

        tracing::info!(job_id = %job_id, generation, "Polling import job");
        tokio::spawn(run_ticker(Arc::clone(&self.inner), job_id, generation, cancel));
    }

    /// Stop polling. Safe to call while Idle.
    ///
    /// Requests already in flight are not aborted; their responses are
    /// ignored when they arrive.
    pub fn stop_polling(&self) {
        if let Some(handle) = self.inner.lock_slot().take() {
            tracing::debug!(job_id = %handle.job_id, "Polling stopped");
            handle.cancel.cancel();
        }
    }

    pub fn is_polling(&self) -> bool {
        self.inner.lock_slot().is_some()
    }

    /// The job currently being polled.
    pub fn current_job(&self) -> Option<JobId> {
        self.inner.lock_slot().as_ref().map(|h| h.job_id.clone())
    }
}

impl Drop for JobPoller {
    fn drop(&mut self) {
        self.stop_polling();
    }
}

impl PollerInner {
    fn lock_slot(&self) -> MutexGuard<'_, Option<PollHandle>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, event: ImportEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }

    /// Apply one status response if its polling run is still live.
    fn handle_response(
        &self,
        job_id: &str,
        generation: u64,
        result: Result<ImportJobSnapshot, ImportError>,
    ) {
        let mut slot = self.lock_slot();
        let live = slot
            .as_ref()
            .is_some_and(|handle| handle.generation == generation);
        if !live {
            tracing::debug!(job_id, generation, "Ignoring stale status response");
            return;
        }

        let snapshot = match result {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(job_id, error = %err, "Status request failed");
                finish(&mut slot);
                self.publish(ImportEvent::Error {
                    job_id: Some(job_id.to_string()),
                    message: status_error_message(&err),
                });
                return;
            }
        };

        match snapshot.status {
            ImportJobStatus::Completed => {
                finish(&mut slot);
                tracing::info!(
                    job_id,
                    successful = snapshot.successful_records,
                    failed = snapshot.failed_records,
                    duration_secs = ?snapshot.duration,
                    started_at = ?snapshot.started_at,
                    completed_at = ?snapshot.completed_at,
                    "Import completed",
                );
                self.publish(ImportEvent::Completed {
                    job_id: job_id.to_string(),
                    progress: ProgressSnapshot::from(&snapshot),
                });
            }
            ImportJobStatus::Failed => {
                finish(&mut slot);
                let message = snapshot.failure_message();
                tracing::warn!(job_id, message = %message, "Import failed");
                self.publish(ImportEvent::Failed {
                    job_id: job_id.to_string(),
                    message,
                });
            }
            ImportJobStatus::Pending | ImportJobStatus::Processing => {
                tracing::debug!(
                    job_id,
                    status = snapshot.status.as_str(),
                    progress = snapshot.progress,
                    "Import progress",
                );
                self.publish(ImportEvent::Progress {
                    job_id: job_id.to_string(),
                    progress: ProgressSnapshot::from(&snapshot),
                });
            }
        }
    }
}

/// Transition to Idle: drop the live handle and stop its ticker.
fn finish(slot: &mut Option<PollHandle>) {
    if let Some(handle) = slot.take() {
        handle.cancel.cancel();
    }
}

/// User-visible message for a failed status request.
fn status_error_message(err: &ImportError) -> String {
    match err {
        ImportError::ServerRejected(msg) => msg.clone(),
        other => format!("Failed to get status: {}", other.detail()),
    }
}

/// Fire a status request every [`POLL_INTERVAL`] until cancelled.
async fn run_ticker(
    inner: Arc<PollerInner>,
    job_id: JobId,
    generation: u64,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + POLL_INTERVAL, POLL_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let inner = Arc::clone(&inner);
                let job_id = job_id.clone();
                tokio::spawn(async move {
                    let result = inner.transport.job_status(&job_id).await;
                    inner.handle_response(&job_id, generation, result);
                });
            }
        }
    }

    tracing::debug!(job_id = %job_id, generation, "Poll ticker exited");
}
