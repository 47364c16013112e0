//! REST client for the catalog import endpoints.
//!
//! Every response goes through the same classification before any
//! endpoint-specific parsing:
//!
//! 1. non-2xx status -> [`ImportError::Transport`] (an HTML body is never
//!    parsed; a JSON `error` field is quoted when present)
//! 2. non-JSON content type or unparseable body -> [`ImportError::Transport`]
//! 3. JSON `error` field -> [`ImportError::ServerRejected`]
//! 4. missing required field -> [`ImportError::MalformedResponse`]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use catalog_core::error::ImportError;
use catalog_core::import_job::{ImportJobSnapshot, UploadAccepted};
use catalog_core::selected_file::SelectedFile;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;

use crate::transport::ImportTransport;

/// Header Django checks for the anti-forgery token.
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const JSON_MIME: &str = "application/json";
const CSV_MIME: &str = "text/csv";

/// HTTP client for one catalog server.
///
/// Holds a cookie jar so that the `csrftoken` cookie set by the upload
/// page is replayed on the upload request.
pub struct ImportApi {
    client: reqwest::Client,
    api_url: String,
    cookies: Arc<Jar>,
}

impl ImportApi {
    /// Create a client for `api_url` (e.g. `http://localhost:8000`).
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let cookies = Arc::new(Jar::default());
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .cookie_provider(Arc::clone(&cookies))
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            cookies,
        })
    }

    /// Base URL with any trailing slash removed.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Fetch the upload page (`GET /`).
    ///
    /// Returns the HTML so the caller can look for the hidden
    /// anti-forgery field; as a side effect the server's `csrftoken`
    /// cookie lands in the jar.
    pub async fn fetch_upload_page(&self) -> Result<String, ImportError> {
        let response = self
            .client
            .get(format!("{}/", self.api_url))
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImportError::Transport(format!(
                "Server returned HTTP {} for the upload page",
                status.as_u16()
            )));
        }

        response.text().await.map_err(network_error)
    }

    /// The `Cookie` header the jar would send to the server, if any.
    pub fn cookie_header(&self) -> Option<String> {
        let url = reqwest::Url::parse(&self.api_url).ok()?;
        let header = self.cookies.cookies(&url)?;
        header.to_str().ok().map(str::to_string)
    }

    fn upload_url(&self) -> String {
        format!("{}/api/upload/", self.api_url)
    }

    fn status_url(&self, job_id: &str) -> String {
        format!("{}/api/import/{}/status/", self.api_url, job_id)
    }
}

#[async_trait]
impl ImportTransport for ImportApi {
    async fn upload_csv(
        &self,
        file: &SelectedFile,
        csrf_token: Option<&str>,
    ) -> Result<UploadAccepted, ImportError> {
        let part = reqwest::multipart::Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(CSV_MIME)
            .map_err(|e| ImportError::Transport(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let mut request = self.client.post(self.upload_url()).multipart(form);
        if let Some(token) = csrf_token {
            request = request.header(CSRF_HEADER, token);
        }

        tracing::debug!(file_name = %file.name, size = file.size(), "Uploading CSV");
        let response = request.send().await.map_err(network_error)?;
        let body = read_json(response).await?;
        parse_upload(body)
    }

    async fn job_status(&self, job_id: &str) -> Result<ImportJobSnapshot, ImportError> {
        let response = self
            .client
            .get(self.status_url(job_id))
            .send()
            .await
            .map_err(network_error)?;
        let body = read_json(response).await?;
        parse_status(body)
    }
}

// ---- response classification ----

fn network_error(err: reqwest::Error) -> ImportError {
    ImportError::Network(err.to_string())
}

/// Media type without parameters, lowercased (`"text/html"`).
fn media_type(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty())
}

/// Render a JSON `error` field, which is usually a string but may be an
/// object of field errors.
fn error_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn error_field(body: &Value) -> Option<String> {
    body.get("error").filter(|v| !v.is_null()).map(error_text)
}

/// Apply steps 1-3 of the classification and return the JSON body.
async fn read_json(response: reqwest::Response) -> Result<Value, ImportError> {
    let status = response.status();
    let media_type = media_type(&response);
    let is_json = media_type.as_deref() == Some(JSON_MIME);

    if !status.is_success() {
        let described = media_type.as_deref().unwrap_or("no content type");
        let mut message = format!("Server returned HTTP {} ({described})", status.as_u16());
        if is_json {
            if let Some(server_error) = response
                .json::<Value>()
                .await
                .ok()
                .as_ref()
                .and_then(error_field)
            {
                message = format!("{message}: {server_error}");
            }
        }
        tracing::warn!(status = status.as_u16(), content_type = described, "Non-success response");
        return Err(ImportError::Transport(message));
    }

    if !is_json {
        let described = media_type.as_deref().unwrap_or("no content type");
        return Err(ImportError::Transport(format!(
            "Expected a JSON response but received {described}"
        )));
    }

    let bytes = response.bytes().await.map_err(network_error)?;
    let body: Value = serde_json::from_slice(&bytes)
        .map_err(|e| ImportError::Transport(format!("Response body is not valid JSON: {e}")))?;

    if let Some(server_error) = error_field(&body) {
        return Err(ImportError::ServerRejected(server_error));
    }

    Ok(body)
}

pub(crate) fn parse_upload(body: Value) -> Result<UploadAccepted, ImportError> {
    if body.get("job_id").and_then(Value::as_str).is_none() {
        return Err(ImportError::MalformedResponse(
            "Upload response did not include a job id".to_string(),
        ));
    }
    serde_json::from_value(body).map_err(|e| ImportError::MalformedResponse(e.to_string()))
}

pub(crate) fn parse_status(body: Value) -> Result<ImportJobSnapshot, ImportError> {
    serde_json::from_value(body).map_err(|e| ImportError::MalformedResponse(e.to_string()))
}
