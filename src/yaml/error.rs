//! Error types for YAML operations.

use saphyr_parser::ScanError;
use std::io;

/// Error type for YAML operations.
///
/// Only structural failures are errors. A key that cannot be found (or an
/// index past the end of a sequence) is reported through a `found == false`
/// match instead.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// File open, read or write failure
    Io(String),
    /// Malformed input document
    Parse(String),
    /// Path segment with forbidden characters or an unusable index
    InvalidSegment(String),
    /// Operation applied to a node of the wrong kind
    Type(String),
    /// Failure while writing the tree back to text
    Encode(String),
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

impl From<ScanError> for Error {
    fn from(e: ScanError) -> Self {
        Error::Parse(format!("cannot parse document: {}", e))
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "{}", e),
            Error::Parse(e) => write!(f, "{}", e),
            Error::InvalidSegment(e) => write!(f, "{}", e),
            Error::Type(e) => write!(f, "{}", e),
            Error::Encode(e) => write!(f, "{}", e),
        }
    }
}
