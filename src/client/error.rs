//! Error types for the GitHub client

use compact_str::CompactString;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Authentication failed, check the GitHub token")]
    Authentication,

    #[error("{resource} not found")]
    NotFound { resource: CompactString },

    #[error("GitHub API rate limit exceeded{}", reset_suffix(.reset))]
    RateLimit { reset: Option<CompactString> },

    #[error("GitHub API error: {message}")]
    GithubApi { message: CompactString },

    #[error("Failed to parse response from {path}: {message}")]
    JsonParse {
        path: String,
        message: CompactString,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration for {field}: {message}")]
    ConfigValidation { field: CompactString, message: CompactString },
}

fn reset_suffix(reset: &Option<CompactString>) -> String {
    reset
        .as_ref()
        .map(|r| format!(", resets at {r}"))
        .unwrap_or_default()
}

impl ClientError {
    pub fn not_found(resource: impl Into<CompactString>) -> Self {
        Self::NotFound { resource: resource.into() }
    }

    pub fn rate_limit(reset: Option<CompactString>) -> Self {
        Self::RateLimit { reset }
    }

    pub fn github_api(message: impl Into<CompactString>) -> Self {
        Self::GithubApi { message: message.into() }
    }

    pub fn json_parse(
        path: impl Into<String>,
        message: impl Into<CompactString>,
        source: serde_json::Error,
    ) -> Self {
        Self::JsonParse { path: path.into(), message: message.into(), source }
    }

    pub fn config_validation(
        field: impl Into<CompactString>,
        message: impl Into<CompactString>,
    ) -> Self {
        Self::ConfigValidation { field: field.into(), message: message.into() }
    }
}
