//! Export GitHub issues, pull requests and discussions to CSV files.

pub mod client;
pub mod config;
pub mod domain;
pub mod export;
pub mod id;
pub mod logging;
pub mod result;

pub use config::ExporterConfig;
pub use export::{ExportSummary, Exporter};
pub use id::RepoName;
pub use result::{ExportError, Result};
