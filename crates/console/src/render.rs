//! Text rendering of the upload screen for a terminal.

use catalog_import::{ImportEvent, ImportView, Panel};

/// The line to print after `event` has been applied to `view`, if any.
pub fn event_line(view: &ImportView, event: &ImportEvent) -> Option<String> {
    match event {
        ImportEvent::UploadStarted { .. } => Some(format!("{}\nUploading...", view.file_info)),
        ImportEvent::UploadAccepted {
            job_id,
            status_label,
        } => Some(format!("Import job {job_id} created ({status_label})")),
        ImportEvent::Watching { job_id } => Some(format!("Watching import job {job_id}")),
        ImportEvent::Progress { .. } => Some(progress_line(view)),
        ImportEvent::Completed { .. } => Some(summary_line(view)),
        ImportEvent::Failed { .. } | ImportEvent::Error { .. } => {
            view.error_message().map(|message| format!("Error: {message}"))
        }
        ImportEvent::Reset => None,
    }
}

/// `"[Processing] 55% (55 / 100)"`
pub fn progress_line(view: &ImportView) -> String {
    format!(
        "[{}] {} ({})",
        view.progress.status_label,
        view.percent_label(),
        view.progress.ratio_label()
    )
}

/// Final line for a finished job.
pub fn summary_line(view: &ImportView) -> String {
    match &view.panel {
        Panel::Success => format!(
            "Import completed: {} imported, {} failed ({} processed)",
            view.progress.successful,
            view.progress.failed,
            view.progress.ratio_label()
        ),
        Panel::Error(message) => format!("Import did not complete: {message}"),
        Panel::Progress | Panel::None => progress_line(view),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_core::import_job::{ImportJobStatus, ProgressSnapshot};

    fn snapshot(status: ImportJobStatus, percent: u8) -> ProgressSnapshot {
        ProgressSnapshot {
            percent,
            status,
            status_label: status.label().to_string(),
            processed: 55,
            total: 100,
            successful: 50,
            failed: 5,
        }
    }

    fn applied(events: &[ImportEvent]) -> ImportView {
        let mut view = ImportView::new();
        for event in events {
            view.apply(event);
        }
        view
    }

    #[test]
    fn progress_line_shows_status_percent_and_ratio() {
        let event = ImportEvent::Progress {
            job_id: "j1".into(),
            progress: snapshot(ImportJobStatus::Processing, 55),
        };
        let view = applied(std::slice::from_ref(&event));

        assert_eq!(
            event_line(&view, &event).as_deref(),
            Some("[Processing] 55% (55 / 100)")
        );
    }

    #[test]
    fn completion_summary() {
        let event = ImportEvent::Completed {
            job_id: "j1".into(),
            progress: snapshot(ImportJobStatus::Completed, 100),
        };
        let view = applied(std::slice::from_ref(&event));

        assert_eq!(
            event_line(&view, &event).as_deref(),
            Some("Import completed: 50 imported, 5 failed (55 / 100 processed)")
        );
    }

    #[test]
    fn errors_are_prefixed() {
        let event = ImportEvent::Error {
            job_id: None,
            message: "Upload failed: connection refused".into(),
        };
        let view = applied(std::slice::from_ref(&event));

        assert_eq!(
            event_line(&view, &event).as_deref(),
            Some("Error: Upload failed: connection refused")
        );
        assert_eq!(
            summary_line(&view),
            "Import did not complete: Upload failed: connection refused"
        );
    }

    #[test]
    fn reset_prints_nothing() {
        let view = ImportView::new();
        assert_eq!(event_line(&view, &ImportEvent::Reset), None);
    }
}
