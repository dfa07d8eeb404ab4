//! HTTP Schema Source
//!
//! Fetches `<base>/<endpoint>` with an async reqwest client.

use crate::fetcher::{check_endpoint, FetchError, FetchResult, FetcherConfig, SchemaSource};
use std::time::Duration;
use url::Url;

pub struct HttpSource {
    client: reqwest::Client,
    base: Url,
}

impl HttpSource {
    pub fn new(base: Url) -> Result<Self, FetchError> {
        Self::with_config(base, &FetcherConfig::default())
    }

    pub fn with_config(mut base: Url, config: &FetcherConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| FetchError::Http {
                status: 0,
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        /* Url::join drops the last segment unless the base ends with '/' */
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self { client, base })
    }

    pub fn url_for(&self, endpoint: &str) -> Result<Url, FetchError> {
        check_endpoint(endpoint)?;
        self.base
            .join(endpoint)
            .map_err(|_| FetchError::InvalidEndpoint(endpoint.to_string()))
    }
}

impl SchemaSource for HttpSource {
    async fn fetch(&self, endpoint: &str) -> Result<FetchResult, FetchError> {
        let url = self.url_for(endpoint)?;
        tracing::debug!(%url, "fetching schema");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Http {
                status: 0,
                message: format!("Request failed: {}", e),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                message: format!("HTTP {} for {}", status, url),
            });
        }

        let content = response.text().await.map_err(|e| FetchError::Http {
            status: 0,
            message: format!("Failed to read response body: {}", e),
        })?;

        Ok(FetchResult {
            content,
            location: url.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_is_appended_to_base_path() {
        let source =
            HttpSource::new(Url::parse("http://localhost:8080/schemas").expect("url")).expect("client");
        assert_eq!(
            source.url_for("station").expect("url").as_str(),
            "http://localhost:8080/schemas/station"
        );
        assert!(source.url_for("../admin").is_err());
    }
}
