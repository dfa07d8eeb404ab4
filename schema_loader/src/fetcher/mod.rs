//! Schema Sources
//!
//! Pluggable sources an endpoint's schema program can be fetched from:
//! local directories, HTTP servers, and in-memory maps.

#[cfg(not(target_arch = "wasm32"))]
pub mod http;
pub mod memory;
#[cfg(not(target_arch = "wasm32"))]
pub mod path;

use std::future::Future;
use thiserror::Error;

/* ============================================================================
   Fetcher Configuration
   ============================================================================ */

/* Settings shared by every source */
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /* Timeout for remote requests in seconds */
    pub timeout_seconds: u64,
    /* User agent sent by the HTTP source */
    pub user_agent: String,
    /* File suffix appended to the endpoint name by the path source */
    pub file_suffix: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agent: "schema-form-loader/0.1".to_string(),
            file_suffix: ".schema.yaml".to_string(),
        }
    }
}

/* ============================================================================
   Fetch Result
   ============================================================================ */

/* Raw program text returned by a source */
#[derive(Debug, Clone)]
pub struct FetchResult {
    /* YAML content of the schema program */
    pub content: String,
    /* Where the content came from (file path or URL) */
    pub location: String,
}

/* ============================================================================
   Fetch Error
   ============================================================================ */

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("schema not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },
    #[error("invalid endpoint '{0}'")]
    InvalidEndpoint(String),
}

/* ============================================================================
   Source Trait
   ============================================================================ */

pub trait SchemaSource: Send + Sync {
    /* Fetch the raw schema program for an endpoint */
    fn fetch(&self, endpoint: &str) -> impl Future<Output = Result<FetchResult, FetchError>> + Send;
}

/* Endpoint names are used as file names and URL segments */
pub(crate) fn check_endpoint(endpoint: &str) -> Result<(), FetchError> {
    let valid = !endpoint.is_empty()
        && endpoint
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && !endpoint.starts_with('.');
    if valid {
        Ok(())
    } else {
        Err(FetchError::InvalidEndpoint(endpoint.to_string()))
    }
}

/* ============================================================================
   Any Source
   ============================================================================ */

/* Source chosen at run time, e.g. from CLI configuration */
pub enum AnySource {
    #[cfg(not(target_arch = "wasm32"))]
    Path(path::PathSource),
    #[cfg(not(target_arch = "wasm32"))]
    Http(http::HttpSource),
    Memory(memory::MemorySource),
}

impl SchemaSource for AnySource {
    async fn fetch(&self, endpoint: &str) -> Result<FetchResult, FetchError> {
        match self {
            #[cfg(not(target_arch = "wasm32"))]
            AnySource::Path(source) => source.fetch(endpoint).await,
            #[cfg(not(target_arch = "wasm32"))]
            AnySource::Http(source) => source.fetch(endpoint).await,
            AnySource::Memory(source) => source.fetch(endpoint).await,
        }
    }
}
