use crate::codec::{DecodeError, EncodeError};
use crate::path::FieldPath;
use crate::value::ValueError;
use schema_loader::ResolveError;
use schema_types::NodeError;
use thiserror::Error;

/// Errors surfaced by the form engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("invalid type tree: {0}")]
    InvalidType(#[from] NodeError),

    #[error("invalid value: {0}")]
    InvalidValue(#[from] ValueError),

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("encode failed: {0}")]
    Encode(#[from] EncodeError),

    #[error("invalid settings: {0}")]
    Settings(String),
}

/// Rejected change operations. The edit state is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("no field at '{0}'")]
    UnknownPath(FieldPath),

    #[error("field '{path}' is a {found}, not a {expected}")]
    NotA {
        path: FieldPath,
        expected: &'static str,
        found: &'static str,
    },

    #[error("field '{0}' is disabled")]
    Disabled(FieldPath),

    #[error("'{tag}' is not a case of '{path}'")]
    UnknownCase { path: FieldPath, tag: String },

    #[error("index {index} is out of range for '{path}' ({len} items)")]
    IndexOutOfRange {
        path: FieldPath,
        index: usize,
        len: usize,
    },

    #[error("value does not fit '{path}': {reason}")]
    TypeMismatch { path: FieldPath, reason: String },

    #[error("field '{0}' has no decoded payload")]
    NoPayload(FieldPath),
}

pub type Result<T> = std::result::Result<T, EngineError>;
