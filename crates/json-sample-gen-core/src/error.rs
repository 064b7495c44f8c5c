//! Error types for schema resolution and sample generation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Boxed error returned by caller-supplied override and selector callables.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Stable, machine-readable error codes.
///
/// Variant names and their serialized `snake_case` strings are part of the
/// public contract and must not change across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ErrorCode {
    /// JSON (de)serialization error.
    JsonParseError,
    /// A path string could not be parsed.
    MalformedPath,
    /// A `$ref` target does not exist.
    UnresolvableRef,
    /// A schema node has no discriminator the generator can act on.
    UnsupportedSchema,
    /// The schema base URI is not a valid URI.
    InvalidBaseUri,
    /// A oneOf selector returned something that is not a candidate.
    InvalidSelection,
    /// Traversal went deeper than the configured hard limit.
    RecursionDepthExceeded,
    /// A caller-supplied callable failed.
    CallbackError,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerateError {
    #[error("JSON (de)serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Malformed path '{path}': {message}")]
    MalformedPath { path: String, message: String },

    #[error("Unresolvable $ref at {path}: {reference}")]
    UnresolvableRef { path: String, reference: String },

    #[error("Unsupported schema at {path}: {message}")]
    UnsupportedSchema { path: String, message: String },

    #[error("Invalid base URI '{uri}': {source}")]
    InvalidBaseUri {
        uri: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Invalid oneOf selection at {path}: {message}")]
    InvalidSelection { path: String, message: String },

    #[error("Recursion depth exceeded at {path} (max: {max_depth})")]
    RecursionDepthExceeded { path: String, max_depth: usize },

    /// Failure raised by an override or selector callable, passed through as-is.
    #[error(transparent)]
    Callback(BoxError),
}

impl GenerateError {
    pub(crate) fn malformed_path(path: &str, message: impl Into<String>) -> Self {
        GenerateError::MalformedPath {
            path: path.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn unsupported(path: &str, message: impl Into<String>) -> Self {
        GenerateError::UnsupportedSchema {
            path: path.to_string(),
            message: message.into(),
        }
    }

    /// Returns the stable error code for this error variant.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            GenerateError::JsonError(_) => ErrorCode::JsonParseError,
            GenerateError::MalformedPath { .. } => ErrorCode::MalformedPath,
            GenerateError::UnresolvableRef { .. } => ErrorCode::UnresolvableRef,
            GenerateError::UnsupportedSchema { .. } => ErrorCode::UnsupportedSchema,
            GenerateError::InvalidBaseUri { .. } => ErrorCode::InvalidBaseUri,
            GenerateError::InvalidSelection { .. } => ErrorCode::InvalidSelection,
            GenerateError::RecursionDepthExceeded { .. } => ErrorCode::RecursionDepthExceeded,
            GenerateError::Callback(_) => ErrorCode::CallbackError,
        }
    }

    /// Returns the path context (output path or schema path), if available.
    pub fn path(&self) -> Option<&str> {
        match self {
            GenerateError::MalformedPath { path, .. }
            | GenerateError::UnresolvableRef { path, .. }
            | GenerateError::UnsupportedSchema { path, .. }
            | GenerateError::InvalidSelection { path, .. }
            | GenerateError::RecursionDepthExceeded { path, .. } => Some(path),
            GenerateError::JsonError(_)
            | GenerateError::InvalidBaseUri { .. }
            | GenerateError::Callback(_) => None,
        }
    }

    /// Structured JSON form: `{"code": "...", "message": "...", "path": "..." | null}`.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "code": self.error_code(),
            "message": self.to_string(),
            "path": self.path(),
        })
    }
}

// ===========================================================================
// Tests
// ===========================================================================
