//! Shared helpers for the import integration tests.
//!
//! [`ScriptedTransport`] plays back queued responses per job id and
//! records every call, so tests can assert on both what observers saw
//! and how many requests reached the "server".

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use catalog_client::ImportTransport;
use catalog_core::error::ImportError;
use catalog_core::import_job::{ImportJobSnapshot, ImportJobStatus, UploadAccepted};
use catalog_core::selected_file::SelectedFile;
use catalog_import::ImportEvent;
use tokio::sync::{broadcast, Semaphore};

/// One recorded upload call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadCall {
    pub file_name: String,
    pub size: u64,
    pub csrf_token: Option<String>,
}

struct StatusStep {
    delay: Duration,
    result: Result<ImportJobSnapshot, ImportError>,
}

#[derive(Default)]
pub struct ScriptedTransport {
    statuses: Mutex<HashMap<String, VecDeque<StatusStep>>>,
    status_calls: Mutex<HashMap<String, usize>>,
    uploads: Mutex<VecDeque<Result<UploadAccepted, ImportError>>>,
    upload_calls: Mutex<Vec<UploadCall>>,
    /// When set, each upload waits for a permit before answering.
    gate: Option<Semaphore>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Uploads block until [`release_upload`](Self::release_upload).
    pub fn gated() -> Arc<Self> {
        Arc::new(Self {
            gate: Some(Semaphore::new(0)),
            ..Self::default()
        })
    }

    pub fn push_status(&self, job_id: &str, result: Result<ImportJobSnapshot, ImportError>) {
        self.push_delayed_status(job_id, Duration::ZERO, result);
    }

    /// Queue a status response that takes `delay` to come back.
    pub fn push_delayed_status(
        &self,
        job_id: &str,
        delay: Duration,
        result: Result<ImportJobSnapshot, ImportError>,
    ) {
        self.statuses
            .lock()
            .unwrap()
            .entry(job_id.to_string())
            .or_default()
            .push_back(StatusStep { delay, result });
    }

    pub fn push_upload(&self, result: Result<UploadAccepted, ImportError>) {
        self.uploads.lock().unwrap().push_back(result);
    }

    pub fn release_upload(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn status_calls(&self, job_id: &str) -> usize {
        self.status_calls
            .lock()
            .unwrap()
            .get(job_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn upload_calls(&self) -> Vec<UploadCall> {
        self.upload_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImportTransport for ScriptedTransport {
    async fn upload_csv(
        &self,
        file: &SelectedFile,
        csrf_token: Option<&str>,
    ) -> Result<UploadAccepted, ImportError> {
        self.upload_calls.lock().unwrap().push(UploadCall {
            file_name: file.name.clone(),
            size: file.size(),
            csrf_token: csrf_token.map(str::to_string),
        });

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        self.uploads
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ImportError::Network("no scripted upload".into())))
    }

    async fn job_status(&self, job_id: &str) -> Result<ImportJobSnapshot, ImportError> {
        *self
            .status_calls
            .lock()
            .unwrap()
            .entry(job_id.to_string())
            .or_default() += 1;

        let step = self
            .statuses
            .lock()
            .unwrap()
            .get_mut(job_id)
            .and_then(VecDeque::pop_front);

        match step {
            Some(step) => {
                if !step.delay.is_zero() {
                    tokio::time::sleep(step.delay).await;
                }
                step.result
            }
            None => Err(ImportError::Network("no scripted status".into())),
        }
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn snapshot(status: ImportJobStatus, progress: u8) -> ImportJobSnapshot {
    ImportJobSnapshot {
        status,
        progress,
        total_records: 100,
        processed_records: u64::from(progress),
        successful_records: u64::from(progress),
        failed_records: 0,
        error_message: None,
        job_id: None,
        file_name: None,
        file_size: None,
        started_at: None,
        completed_at: None,
        duration: None,
    }
}

pub fn pending(progress: u8) -> Result<ImportJobSnapshot, ImportError> {
    Ok(snapshot(ImportJobStatus::Pending, progress))
}

pub fn processing(progress: u8) -> Result<ImportJobSnapshot, ImportError> {
    Ok(snapshot(ImportJobStatus::Processing, progress))
}

pub fn completed() -> Result<ImportJobSnapshot, ImportError> {
    Ok(snapshot(ImportJobStatus::Completed, 100))
}

pub fn failed(message: Option<&str>) -> Result<ImportJobSnapshot, ImportError> {
    let mut job = snapshot(ImportJobStatus::Failed, 40);
    job.error_message = message.map(str::to_string);
    Ok(job)
}

pub fn accepted(job_id: &str) -> Result<UploadAccepted, ImportError> {
    Ok(UploadAccepted {
        job_id: job_id.to_string(),
        status: "pending".to_string(),
        file_name: None,
        file_size: None,
    })
}

pub fn csv(name: &str) -> SelectedFile {
    SelectedFile::new(name, b"sku,name,description\nA-1,Widget,\n".to_vec())
}

// ---------------------------------------------------------------------------
// Event helpers
// ---------------------------------------------------------------------------

/// Wait for the next event; panics if none arrives within a minute of
/// (paused) time.
pub async fn next_event(rx: &mut broadcast::Receiver<ImportEvent>) -> ImportEvent {
    tokio::time::timeout(Duration::from_secs(60), rx.recv())
        .await
        .expect("timed out waiting for an import event")
        .expect("event channel closed")
}

/// Everything already queued on the receiver.
pub fn drain(rx: &mut broadcast::Receiver<ImportEvent>) -> Vec<ImportEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Let the paused clock run forward so any pending ticks fire.
pub async fn settle() {
    tokio::time::sleep(Duration::from_secs(20)).await;
}
