//! Headless model of the upload screen.
//!
//! The screen shows at most one of three panels (progress, error,
//! success) plus a "Selected: ..." line. [`ImportView::apply`] folds
//! [`ImportEvent`]s into that state; front ends render it however they
//! like.

use catalog_core::import_job::ProgressSnapshot;
use catalog_core::types::JobId;

use crate::events::ImportEvent;

/// Which panel of the upload screen is visible.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Panel {
    #[default]
    None,
    Progress,
    Error(String),
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportView {
    pub file_info: String,
    pub panel: Panel,
    pub progress: ProgressSnapshot,
    pub job_id: Option<JobId>,
}

impl Default for ImportView {
    fn default() -> Self {
        Self {
            file_info: String::new(),
            panel: Panel::None,
            progress: ProgressSnapshot::initial(),
            job_id: None,
        }
    }
}

impl ImportView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: &ImportEvent) {
        match event {
            ImportEvent::UploadStarted {
                file_name,
                size_label,
                progress,
            } => {
                self.file_info = format!("Selected: {file_name} ({size_label})");
                self.panel = Panel::Progress;
                self.progress = progress.clone();
                self.job_id = None;
            }
            ImportEvent::UploadAccepted {
                job_id,
                status_label,
            } => {
                self.job_id = Some(job_id.clone());
                self.progress.status_label = status_label.clone();
            }
            ImportEvent::Watching { job_id } => {
                self.job_id = Some(job_id.clone());
                self.panel = Panel::Progress;
                self.progress = ProgressSnapshot::initial();
            }
            ImportEvent::Progress { progress, .. } => {
                self.progress = progress.clone();
            }
            ImportEvent::Completed { progress, .. } => {
                self.progress = progress.clone();
                self.panel = Panel::Success;
            }
            ImportEvent::Failed { message, .. } | ImportEvent::Error { message, .. } => {
                self.panel = Panel::Error(message.clone());
            }
            ImportEvent::Reset => *self = Self::default(),
        }
    }

    /// Progress bar text, e.g. `"55%"`.
    pub fn percent_label(&self) -> String {
        format!("{}%", self.progress.percent)
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.panel {
            Panel::Error(message) => Some(message),
            _ => None,
        }
    }
}
