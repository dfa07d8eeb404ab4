//! Path-based Schema Source
//!
//! Reads `<dir>/<endpoint><suffix>` from the local filesystem.

use crate::fetcher::{check_endpoint, FetchError, FetchResult, FetcherConfig, SchemaSource};
use std::path::PathBuf;

pub struct PathSource {
    dir: PathBuf,
    config: FetcherConfig,
}

impl PathSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_config(dir, FetcherConfig::default())
    }

    pub fn with_config(dir: impl Into<PathBuf>, config: FetcherConfig) -> Self {
        Self {
            dir: dir.into(),
            config,
        }
    }

    pub fn file_for(&self, endpoint: &str) -> PathBuf {
        self.dir
            .join(format!("{}{}", endpoint, self.config.file_suffix))
    }
}

impl SchemaSource for PathSource {
    async fn fetch(&self, endpoint: &str) -> Result<FetchResult, FetchError> {
        check_endpoint(endpoint)?;
        let file = self.file_for(endpoint);
        tracing::debug!(path = %file.display(), "reading schema file");

        let content = match tokio::fs::read_to_string(&file).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FetchError::NotFound(file.display().to_string()));
            }
            Err(e) => return Err(FetchError::Io(e)),
        };

        Ok(FetchResult {
            content,
            location: file.display().to_string(),
        })
    }
}
