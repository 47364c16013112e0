//! The seam between the import session and the network.

use async_trait::async_trait;
use catalog_core::error::ImportError;
use catalog_core::import_job::{ImportJobSnapshot, UploadAccepted};
use catalog_core::selected_file::SelectedFile;

/// Operations the upload submitter and job poller need from the server.
///
/// [`ImportApi`](crate::api::ImportApi) is the production implementation;
/// tests substitute scripted fakes.
#[async_trait]
pub trait ImportTransport: Send + Sync + 'static {
    /// `POST /api/upload/` with `file` as a multipart field.
    async fn upload_csv(
        &self,
        file: &SelectedFile,
        csrf_token: Option<&str>,
    ) -> Result<UploadAccepted, ImportError>;

    /// `GET /api/import/{job_id}/status/`.
    async fn job_status(&self, job_id: &str) -> Result<ImportJobSnapshot, ImportError>;
}
