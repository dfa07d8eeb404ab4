use crate::fetcher::FetchError;
use crate::file::ParseError;
use schema_types::NodeError;
use thiserror::Error;

/* Errors surfaced while turning an endpoint + selector into a TypeNode */
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /* Fetching or parsing the program failed; retry on re-mount */
    #[error("schema for '{endpoint}' is unavailable: {reason}")]
    SchemaUnavailable { endpoint: String, reason: String },

    #[error("unknown type '{0}'")]
    UnknownType(String),

    #[error("unknown method '{0}'")]
    UnknownMethod(String),

    #[error("invalid type: {0}")]
    InvalidType(#[from] NodeError),

    /* Non-recursive references are expanded in place, so shared
     * definitions multiply; the expansion is cut off past this size */
    #[error("type expands to more than {limit} nodes")]
    TooLarge { limit: usize },

    /* A newer request was issued while this one was in flight */
    #[error("request superseded by a newer one")]
    Superseded,
}

impl ResolveError {
    pub fn unavailable(endpoint: &str, reason: impl ToString) -> Self {
        ResolveError::SchemaUnavailable {
            endpoint: endpoint.to_string(),
            reason: reason.to_string(),
        }
    }

    /* Whether re-mounting can succeed without a configuration change */
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ResolveError::SchemaUnavailable { .. } | ResolveError::Superseded
        )
    }

    pub(crate) fn from_fetch(endpoint: &str, err: FetchError) -> Self {
        Self::unavailable(endpoint, err)
    }

    pub(crate) fn from_parse(endpoint: &str, err: ParseError) -> Self {
        Self::unavailable(endpoint, err)
    }
}

pub type Result<T> = std::result::Result<T, ResolveError>;
