//! Schema Type Definitions
//!
//! This crate contains the core type definitions for the schema system.
//! `types` holds the source form of a schema program (what endpoints publish),
//! `node` holds the normalized, possibly self-referential tree the form and
//! view engines walk. Neither module performs any I/O.

pub mod node;
pub mod types;

// Re-export commonly used types at the crate root
pub use node::*;
pub use types::*;
