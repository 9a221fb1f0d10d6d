//! YAML key path resolution and in-place value rewriting.
//!
//! # Module Organization
//!
//! - [`error`]: Error types for YAML operations
//! - [`path`]: Key path grammar (`a.b[0].c`)
//! - [`tree`]: Arena document tree built from the parser events
//! - [`query`]: Resolution of a key path to a scalar node
//! - [`mutation`]: Scalar replacement
//! - [`serialize`]: Format preserving write-back
//! - [`session`]: File level check / apply / get operations

mod error;
mod mutation;
mod path;
mod query;
mod serialize;
mod session;
mod tree;

// Re-export error type
pub use error::Error;

pub use query::Scope;
pub use serialize::DEFAULT_INDENT;
pub use session::{Session, Status};
