//! `catalog-console` -- upload product CSV files and follow import jobs.
//!
//! # Environment variables
//!
//! | Variable                       | Required | Default                 | Description                         |
//! |--------------------------------|----------|-------------------------|-------------------------------------|
//! | `CATALOG_API_URL`              | no       | `http://localhost:8000` | Catalog server base URL             |
//! | `CATALOG_CSRF_TOKEN`           | no       | --                      | Anti-forgery token to send          |
//! | `CATALOG_REQUEST_TIMEOUT_SECS` | no       | `30`                    | Per-request HTTP timeout in seconds |

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use catalog_client::{CsrfResolver, ImportApi};
use catalog_console::config::{parse_api_url, ConsoleConfig};
use catalog_console::follow::{follow, succeeded};
use catalog_core::selected_file::SelectedFile;
use catalog_import::{ImportView, SubmitOutcome, UploadSession};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for catalog-console
#[derive(Parser, Debug)]
#[command(name = "catalog-console")]
#[command(about = "Upload product CSV files and follow their import jobs")]
#[command(version)]
struct Args {
    /// Catalog server base URL
    #[arg(long, env = "CATALOG_API_URL", value_parser = parse_api_url)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload a CSV file and follow the resulting import job
    Upload { file: PathBuf },
    /// Follow an import job that was already submitted
    Watch { job_id: String },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "catalog_console=info,catalog_import=info,catalog_client=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let mut config = ConsoleConfig::from_env().context("Invalid console configuration")?;
    if let Some(api_url) = args.api_url {
        config.api_url = api_url;
    }

    tracing::info!(
        api_url = %config.api_url,
        timeout_secs = config.request_timeout_secs,
        "Starting catalog-console",
    );

    let api = ImportApi::new(config.api_url.clone(), config.request_timeout())
        .context("Failed to build HTTP client")?;

    let csrf = match &args.command {
        Command::Upload { .. } => csrf_resolver(&api, &config).await,
        Command::Watch { .. } => CsrfResolver::new(),
    };

    let session = UploadSession::new(Arc::new(api), csrf);
    let mut rx = session.subscribe();

    match args.command {
        Command::Upload { file } => {
            let file = read_file(&file).await?;
            if let SubmitOutcome::Failed(err) = session.submit(file).await {
                tracing::debug!(error = ?err, "Upload did not produce a job");
            }
        }
        Command::Watch { job_id } => session.watch(job_id),
    }

    let mut view = ImportView::new();
    tokio::select! {
        _ = follow(&mut rx, &mut view, |line| println!("{line}")) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, no longer following the import job");
            session.reset();
        }
    }

    Ok(if succeeded(&view) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Resolver over the configured token, the session cookie and the upload
/// page's hidden form field.
async fn csrf_resolver(api: &ImportApi, config: &ConsoleConfig) -> CsrfResolver {
    let mut csrf = CsrfResolver::new();

    if let Some(token) = config.csrf_token.clone() {
        csrf = csrf.with_accessor(move || Some(token.clone()));
    }

    match api.fetch_upload_page().await {
        Ok(html) => csrf = csrf.with_form_html(html),
        Err(err) => tracing::warn!(error = %err, "Could not load the upload page"),
    }
    if let Some(cookies) = api.cookie_header() {
        csrf = csrf.with_cookie_header(cookies);
    }

    csrf
}

async fn read_file(path: &Path) -> Result<SelectedFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("{} is not a file", path.display()))?;
    Ok(SelectedFile::new(name, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn api_url_flag_is_validated() {
        let result = Args::try_parse_from([
            "catalog-console",
            "--api-url",
            "ftp://x",
            "watch",
            "j1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn api_url_flag_is_normalised() {
        let args = Args::try_parse_from([
            "catalog-console",
            "--api-url",
            "https://catalog.example.com/",
            "watch",
            "j1",
        ])
        .unwrap();

        assert_eq!(args.api_url.as_deref(), Some("https://catalog.example.com"));
        assert_matches!(args.command, Command::Watch { job_id } if job_id == "j1");
    }

    #[test]
    fn upload_takes_a_path() {
        let args =
            Args::try_parse_from(["catalog-console", "--api-url", "http://h", "upload", "p.csv"])
                .unwrap();
        assert_matches!(args.command, Command::Upload { file } if file == PathBuf::from("p.csv"));
    }
}
