//! Configuration management for the schema-form CLI

use schema_form::EngineConfig;
use schema_loader::{AnySource, FetcherConfig, HttpSource, PathSource};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::{CliError, ConfigError};

/// Configuration structure for the schema-form CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding `<endpoint>.schema.yaml` programs
    pub schema_dir: PathBuf,

    /// Base URL serving schema programs; takes precedence over `schema_dir`
    pub base_url: Option<String>,

    /// Endpoint used when `--endpoint` is not given
    pub default_endpoint: Option<String>,

    /// Request timeout in seconds
    pub timeout_seconds: u64,

    /// Walker and codec limits
    pub engine: EngineConfig,
}

impl Default for Config {
    fn default() -> Self {
        let schema_dir = Self::get_config_dir()
            .map(|dir| dir.join("schemas"))
            .unwrap_or_else(|_| PathBuf::from("schemas"));
        Self {
            schema_dir,
            base_url: None,
            default_endpoint: None,
            timeout_seconds: 30,
            engine: EngineConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location. A missing file yields
    /// the defaults.
    pub async fn load() -> Result<Self, CliError> {
        let path = Self::get_config_path()?;
        Self::load_from(&path).await
    }

    pub async fn load_from(path: &Path) -> Result<Self, CliError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_yml::from_str(&content).map_err(ConfigError::InvalidFormat)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), CliError> {
        if let Some(base_url) = &self.base_url {
            Url::parse(base_url).map_err(|e| ConfigError::InvalidUrl(e.to_string()))?;
        }
        Ok(())
    }

    /// Apply command-line overrides
    pub fn with_overrides(
        mut self,
        schema_dir: Option<PathBuf>,
        url: Option<String>,
        endpoint: Option<String>,
    ) -> Result<Self, CliError> {
        if let Some(dir) = schema_dir {
            self.schema_dir = dir;
            self.base_url = None;
        }
        if url.is_some() {
            self.base_url = url;
        }
        if endpoint.is_some() {
            self.default_endpoint = endpoint;
        }
        self.validate()?;
        Ok(self)
    }

    /// Endpoint to resolve types against
    pub fn endpoint(&self) -> Result<&str, CliError> {
        self.default_endpoint.as_deref().ok_or(CliError::NoEndpoint)
    }

    /// Engine settings with payload leaves defaulting to the active endpoint
    pub fn engine(&self) -> EngineConfig {
        let mut engine = self.engine.clone();
        if engine.payload_endpoint.is_none() {
            engine.payload_endpoint = self.default_endpoint.clone();
        }
        engine
    }

    /// Schema source selected by this configuration
    pub fn source(&self) -> Result<AnySource, CliError> {
        let fetcher = FetcherConfig {
            timeout_seconds: self.timeout_seconds,
            ..FetcherConfig::default()
        };
        match &self.base_url {
            Some(base_url) => {
                let base =
                    Url::parse(base_url).map_err(|e| ConfigError::InvalidUrl(e.to_string()))?;
                let source = HttpSource::with_config(base, &fetcher)
                    .map_err(|e| ConfigError::InvalidUrl(e.to_string()))?;
                Ok(AnySource::Http(source))
            }
            None => Ok(AnySource::Path(PathSource::with_config(
                self.schema_dir.clone(),
                fetcher,
            ))),
        }
    }

    /// Get the configuration file path
    pub fn get_config_path() -> Result<PathBuf, CliError> {
        Ok(Self::get_config_dir()?.join("config.yaml"))
    }

    /// Get the configuration directory path
    pub fn get_config_dir() -> Result<PathBuf, CliError> {
        let home_dir = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home_dir.join(".schema-form"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Config::load_from(&dir.path().join("config.yaml"))
            .await
            .expect("load");
        assert_eq!(config.timeout_seconds, 30);
        assert_eq!(config.engine, EngineConfig::default());
        assert_matches!(config.endpoint(), Err(CliError::NoEndpoint));
    }

    #[tokio::test]
    async fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "default_endpoint: station\nengine:\n  max_recursion_depth: 3\n",
        )
        .expect("write config");

        let config = Config::load_from(&path).await.expect("load");
        assert_eq!(config.endpoint().expect("endpoint"), "station");
        assert_eq!(config.engine.max_recursion_depth, 3);
        assert_eq!(config.engine().payload_endpoint.as_deref(), Some("station"));
    }

    #[tokio::test]
    async fn rejects_bad_base_url() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "base_url: not a url\n").expect("write config");
        assert_matches!(
            Config::load_from(&path).await,
            Err(CliError::Config(ConfigError::InvalidUrl(_)))
        );
    }

    #[test]
    fn schema_dir_flag_wins_over_url() {
        let config = Config {
            base_url: Some("http://localhost:1/schemas".into()),
            ..Config::default()
        }
        .with_overrides(Some(PathBuf::from("/tmp/schemas")), None, Some("station".into()))
        .expect("overrides");
        assert!(config.base_url.is_none());
        assert!(matches!(config.source().expect("source"), AnySource::Path(_)));
    }
}
