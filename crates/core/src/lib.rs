//! Domain types shared by the catalog import console crates.
//!
//! Nothing in here performs I/O: import job snapshots, the progress
//! shape handed to observers, the import error taxonomy and a couple of
//! display helpers used by the upload screen.

pub mod error;
pub mod file_size;
pub mod import_job;
pub mod selected_file;
pub mod types;
