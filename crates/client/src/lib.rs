//! HTTP client for the catalog import endpoints.
//!
//! Wraps the upload and job status REST endpoints with [`reqwest`],
//! classifies every response into the
//! [`ImportError`](catalog_core::error::ImportError) taxonomy, and
//! resolves the anti-forgery token that state-mutating requests carry.

pub mod api;
pub mod csrf;
pub mod transport;

pub use api::ImportApi;
pub use csrf::CsrfResolver;
pub use transport::ImportTransport;
