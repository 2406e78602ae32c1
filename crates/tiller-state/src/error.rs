//! Error types for tiller-state operations.

use crate::Path;
use thiserror::Error;

/// Result type alias for tiller-state operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur during tiller-state operations.
#[derive(Debug, Error)]
pub enum StateError {
    /// A path segment does not exist on the controlled shape.
    #[error("path not found: {path}")]
    PathNotFound {
        /// The path that was not found.
        path: Path,
    },

    /// A path is malformed for the requested operation.
    #[error("invalid path: {message}")]
    InvalidPath {
        /// Description of what is wrong with the path.
        message: String,
    },

    /// Tried to descend through a value that is not an object.
    #[error("cannot descend into {path}: expected object, found {found}")]
    NotAnObject {
        /// The path of the non-object value.
        path: Path,
        /// The actual type found.
        found: &'static str,
    },

    /// A write payload names a field the controlled shape does not have.
    #[error("unknown field `{field}` at {path}")]
    UnknownField {
        /// The composite the payload targeted.
        path: Path,
        /// The unrecognized field name.
        field: String,
    },

    /// A payload's shape does not conform to the target field's shape.
    #[error("shape mismatch at {path}: expected {expected}, found {found}")]
    ShapeMismatch {
        /// The path where the mismatch occurred.
        path: Path,
        /// The expected shape.
        expected: &'static str,
        /// The actual shape found.
        found: &'static str,
    },

    /// JSON serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The live-state lock was poisoned by a panicking writer.
    #[error("state lock poisoned")]
    Poisoned,
}

impl StateError {
    /// Create a path not found error.
    #[inline]
    pub fn path_not_found(path: Path) -> Self {
        StateError::PathNotFound { path }
    }

    /// Create an invalid path error.
    #[inline]
    pub fn invalid_path(message: impl Into<String>) -> Self {
        StateError::InvalidPath {
            message: message.into(),
        }
    }

    /// Create a not-an-object error.
    #[inline]
    pub fn not_an_object(path: Path, found: &'static str) -> Self {
        StateError::NotAnObject { path, found }
    }

    /// Create an unknown field error.
    #[inline]
    pub fn unknown_field(path: Path, field: impl Into<String>) -> Self {
        StateError::UnknownField {
            path,
            field: field.into(),
        }
    }

    /// Create a shape mismatch error.
    #[inline]
    pub fn shape_mismatch(path: Path, expected: &'static str, found: &'static str) -> Self {
        StateError::ShapeMismatch {
            path,
            expected,
            found,
        }
    }
}

/// Get the type name of a JSON value.
#[inline]
pub fn value_type_name(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
