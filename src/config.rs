use std::path::{Path, PathBuf};

use compact_str::CompactString;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::{
    client::{ClientConfig, config::DEFAULT_API_URL},
    result::{ExportError, Result},
};

/// Settings the exporter is constructed with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExporterConfig {
    /// Personal access token
    pub token: CompactString,
    pub api_url: CompactString,
    /// Defaults to `{api_url}/graphql`, or `{host}/api/graphql` for an
    /// Enterprise `/api/v3` base
    pub graphql_url: Option<CompactString>,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            token: CompactString::default(),
            api_url: DEFAULT_API_URL.into(),
            graphql_url: None,
        }
    }
}

impl ExporterConfig {
    pub fn new(token: impl Into<CompactString>) -> Self {
        Self { token: token.into(), ..Default::default() }
    }

    pub fn with_api_url(mut self, api_url: impl Into<CompactString>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Apply command line / environment values over the file contents
    pub fn merge(
        mut self,
        token: Option<CompactString>,
        api_url: Option<CompactString>,
        graphql_url: Option<CompactString>,
    ) -> Self {
        if let Some(token) = token {
            self.token = token;
        }
        if let Some(api_url) = api_url {
            self.api_url = api_url;
        }
        if graphql_url.is_some() {
            self.graphql_url = graphql_url;
        }
        self
    }

    pub fn client_config(&self) -> Result<ClientConfig> {
        if self.token.trim().is_empty() {
            return Err(ExportError::MissingToken);
        }

        let mut config = ClientConfig::new(self.token.clone()).with_base_url(self.api_url.clone());
        if let Some(graphql_url) = &self.graphql_url {
            config = config.with_graphql_url(graphql_url.clone());
        }
        config.validate()?;
        Ok(config)
    }
}

pub fn default_config_path() -> PathBuf {
    if let Some(dirs) = BaseDirs::new() {
        dirs.config_dir().join("gh-export.toml")
    } else {
        PathBuf::from("gh-export.toml")
    }
}

/// Load the config file, falling back to defaults when it does not exist
pub fn load_config(config_file: &Path) -> Result<ExporterConfig> {
    if !config_file.exists() {
        return Ok(ExporterConfig::default());
    }

    confy::load_path(config_file).map_err(|e| ExportError::config_load(config_file.into(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, ExporterConfig::default());
        assert!(!dir.path().join("absent.toml").exists());
    }

    #[test]
    fn reads_token_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gh-export.toml");
        std::fs::write(&path, "token = \"ghp_fromfile\"\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.token, "ghp_fromfile");
        assert_eq!(config.api_url, "https://api.github.com");
        assert_eq!(config.graphql_url, None);
    }

    #[test]
    fn malformed_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gh-export.toml");
        std::fs::write(&path, "token = [").unwrap();

        assert!(matches!(load_config(&path), Err(ExportError::ConfigLoad { .. })));
    }

    #[test]
    fn overrides_take_precedence() {
        let config = ExporterConfig::new("ghp_fromfile").merge(
            Some("ghp_fromenv".into()),
            None,
            Some("https://ghe.example.com/api/graphql".into()),
        );
        assert_eq!(config.token, "ghp_fromenv");
        assert_eq!(config.api_url, "https://api.github.com");

        let client = config.client_config().unwrap();
        assert_eq!(client.graphql_url, "https://ghe.example.com/api/graphql");
    }

    #[test]
    fn enterprise_api_url_derives_graphql_endpoint() {
        let client = ExporterConfig::new("ghp_token")
            .with_api_url("https://ghe.example.com/api/v3")
            .client_config()
            .unwrap();
        assert_eq!(client.base_url, "https://ghe.example.com/api/v3");
        assert_eq!(client.graphql_url, "https://ghe.example.com/api/graphql");
    }

    #[test]
    fn empty_token_is_missing() {
        assert!(matches!(
            ExporterConfig::default().client_config(),
            Err(ExportError::MissingToken)
        ));
    }
}
