//! Drives an [`ImportView`] from the session's event stream.

use catalog_import::{ImportEvent, ImportView, Panel};
use tokio::sync::broadcast::{self, error::RecvError};

/// Apply events from `rx` to `view` until one ends the job, printing each
/// rendered line through `print`.
///
/// Returns early if the channel closes; the view then reflects whatever
/// arrived before that.
pub async fn follow<P>(
    rx: &mut broadcast::Receiver<ImportEvent>,
    view: &mut ImportView,
    mut print: P,
) where
    P: FnMut(&str),
{
    loop {
        let event = match rx.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Console fell behind the event stream");
                continue;
            }
            Err(RecvError::Closed) => {
                tracing::debug!("Event stream closed");
                return;
            }
        };

        view.apply(&event);
        if let Some(line) = crate::render::event_line(view, &event) {
            print(&line);
        }
        if event.is_terminal() {
            return;
        }
    }
}

/// Whether the view ended on the success panel.
pub fn succeeded(view: &ImportView) -> bool {
    view.panel == Panel::Success
}
