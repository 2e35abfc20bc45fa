use std::path::PathBuf;

use thiserror::Error;

use crate::client::ClientError;

pub type Result<T> = std::result::Result<T, ExportError>;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Invalid GitHub token: {0}")]
    InvalidToken(#[source] ClientError),

    #[error("No GitHub token configured, pass --token or set GITHUB_TOKEN")]
    MissingToken,

    #[error("Repository name must look like owner/repository, got {0:?}")]
    InvalidRepoName(String),

    #[error("Failed to load configuration from: {path}: {message}")]
    ConfigLoad { path: PathBuf, message: String },

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write CSV record to {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl ExportError {
    /// Create a configuration load error
    pub fn config_load(path: PathBuf, source: impl std::fmt::Display) -> Self {
        Self::ConfigLoad { path, message: source.to_string() }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv { path: path.into(), source }
    }
}
