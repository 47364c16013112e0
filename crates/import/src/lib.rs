//! Upload submission and import job tracking.
//!
//! [`UploadSession`] owns the whole client-side lifecycle of one upload
//! screen: it accepts a file, enforces that at most one upload is in
//! flight, hands the resulting job id to a [`JobPoller`], and publishes
//! every observable change as an [`ImportEvent`] on a
//! [`tokio::sync::broadcast`] channel. [`ImportView`] folds those events
//! into the state the upload screen renders.

pub mod events;
pub mod poller;
pub mod session;
pub mod view;

pub use events::ImportEvent;
pub use poller::{JobPoller, POLL_INTERVAL};
pub use session::{SubmitOutcome, SubmitState, UploadSession};
pub use view::{ImportView, Panel};
