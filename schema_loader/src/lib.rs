//! Schema Loading and Type Resolution
//!
//! This crate fetches schema programs published by endpoints, parses them,
//! and expands named types, method argument tuples and method result tuples
//! into `TypeNode` trees. Parsed programs are cached per endpoint, and
//! `LatestRequest` tickets let callers drop results that were superseded
//! while in flight.

pub mod error;
pub mod expand;
pub mod fetcher;
pub mod file;
pub mod resolver;
pub mod ticket;

// Re-export commonly used types at the crate root
pub use error::{ResolveError, Result};
pub use expand::{Selected, TypeSelector};
pub use fetcher::memory::MemorySource;
pub use fetcher::{AnySource, FetchError, FetchResult, FetcherConfig, SchemaSource};
#[cfg(not(target_arch = "wasm32"))]
pub use fetcher::{http::HttpSource, path::PathSource};
pub use file::{ParseError, SchemaFile, SchemaProgram};
pub use resolver::{Resolved, SchemaResolver};
pub use ticket::{LatestRequest, Ticket, TicketSequence};

// Re-export schema_types for convenience
pub use schema_types;
