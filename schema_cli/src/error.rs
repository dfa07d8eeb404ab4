//! Error types for the schema-form CLI

use schema_form::{DecodeError, EditError, EncodeError, EngineError};
use schema_loader::ResolveError;
use thiserror::Error;

/// Main error type for the schema-form CLI
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The type could not be obtained from its endpoint
    #[error("{0}")]
    Resolve(#[from] ResolveError),

    /// The engine rejected the input
    #[error("{0}")]
    Engine(#[from] EngineError),

    /// An edit operation in a script was rejected
    #[error("Step {step}: {source}")]
    Script {
        step: usize,
        #[source]
        source: EditError,
    },

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Malformed command input
    #[error("Invalid input: {0}")]
    Input(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No endpoint was given and none is configured
    #[error("No endpoint given; pass --endpoint or set default_endpoint in the config file")]
    NoEndpoint,
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration format: {0}")]
    InvalidFormat(#[from] serde_yml::Error),

    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),

    #[error("Could not find home directory")]
    NoHomeDir,
}
