//! Configuration management for GitHub client

use compact_str::{CompactString, format_compact};

use super::error::{ClientError, Result};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Main configuration for GitHub client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// REST API base URL
    pub base_url: CompactString,
    /// GraphQL endpoint
    pub graphql_url: CompactString,
    /// Personal access token, sent as a bearer token
    pub token: CompactString,
    /// Request configuration
    pub request: RequestConfig,
}

/// HTTP request configuration
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// Number of items per page for paginated requests
    pub per_page: u32,
    pub user_agent: CompactString,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            per_page: 100,
            user_agent: format_compact!("gh-export/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// GraphQL endpoint belonging to a REST base URL. GitHub Enterprise serves
/// REST under `/api/v3` and GraphQL under `/api/graphql`.
pub fn graphql_url_for(base_url: &str) -> CompactString {
    match base_url.strip_suffix("/api/v3") {
        Some(host) => format_compact!("{host}/api/graphql"),
        None => format_compact!("{base_url}/graphql"),
    }
}

impl ClientConfig {
    /// Create a new client configuration against the public GitHub API
    pub fn new(token: impl Into<CompactString>) -> Self {
        Self {
            base_url: DEFAULT_API_URL.into(),
            graphql_url: graphql_url_for(DEFAULT_API_URL),
            token: token.into(),
            request: RequestConfig::default(),
        }
    }

    /// Point the client at another REST base URL. The GraphQL endpoint follows
    /// unless it was overridden separately.
    pub fn with_base_url(mut self, base_url: impl Into<CompactString>) -> Self {
        let base_url: CompactString = base_url.into();
        let base_url = CompactString::from(base_url.trim_end_matches('/'));
        if self.graphql_url == graphql_url_for(&self.base_url) {
            self.graphql_url = graphql_url_for(&base_url);
        }
        self.base_url = base_url;
        self
    }

    pub fn with_graphql_url(mut self, graphql_url: impl Into<CompactString>) -> Self {
        self.graphql_url = graphql_url.into();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(ClientError::config_validation(
                "token",
                "GitHub token cannot be empty",
            ));
        }

        if self.token.chars().any(char::is_whitespace) {
            return Err(ClientError::config_validation(
                "token",
                "GitHub token must not contain whitespace",
            ));
        }

        for (field, value) in [("api_url", &self.base_url), ("graphql_url", &self.graphql_url)] {
            if !value.starts_with("http://") && !value.starts_with("https://") {
                return Err(ClientError::config_validation(
                    field,
                    "URL must start with http:// or https://",
                ));
            }

            if url::Url::parse(value).is_err() {
                return Err(ClientError::config_validation(
                    field,
                    "URL is not a valid URL format",
                ));
            }
        }

        if self.request.per_page == 0 || self.request.per_page > 100 {
            return Err(ClientError::config_validation(
                "per_page",
                "per_page must be between 1 and 100",
            ));
        }

        Ok(())
    }
}
