//! Error type for control operations, with HTTP status mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tiller_state::StateError;

/// Result type alias for control operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors surfaced by a control session or its serving layer.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    /// An operation arrived after the session was stopped.
    #[error("not serving: the control session is stopped")]
    NotServing,

    /// A state-engine failure (bad path, bad shape, unknown field).
    #[error(transparent)]
    State(#[from] StateError),

    /// An internal failure in the serving layer.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ControlError {
    fn status(&self) -> StatusCode {
        match self {
            ControlError::NotServing => StatusCode::SERVICE_UNAVAILABLE,
            ControlError::State(err) => match err {
                StateError::PathNotFound { .. } => StatusCode::NOT_FOUND,
                StateError::InvalidPath { .. }
                | StateError::NotAnObject { .. }
                | StateError::UnknownField { .. }
                | StateError::ShapeMismatch { .. }
                | StateError::Serialization(_) => StatusCode::BAD_REQUEST,
                StateError::Poisoned => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ControlError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ControlError {
    fn into_response(self) -> Response {
        let code = self.status();
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (code, body).into_response()
    }
}
