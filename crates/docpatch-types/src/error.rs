use serde_json::Value;
use thiserror::Error;

/// Errors produced when building paths from loosely-typed input.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PathError {
    #[error("unsupported path segment {0}")]
    UnsupportedSegment(Value),

    #[error("path must be an array of segments, got {0}")]
    NotAnArray(Value),
}
