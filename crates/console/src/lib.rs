//! Terminal front end for catalog CSV imports.
//!
//! The binary wires an [`catalog_client::ImportApi`] into an
//! [`catalog_import::UploadSession`] and prints the upload screen as text.

pub mod config;
pub mod follow;
pub mod render;
