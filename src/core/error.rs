//! Typed error handling for crudkit
//!
//! Every failure the binder, the dispatcher or the CRUD handlers can produce is
//! a [`ScaffoldError`]. Each variant knows its HTTP status and a stable error
//! code, and the whole enum renders itself as an HTTP response:
//!
//! ```json
//! { "error": { "code": 404, "kind": "REFERENCE_NOT_FOUND", "message": "author not found", "data": null } }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! match resolve_bindings(&mut book, &registry, 8).await {
//!     Ok(()) => {}
//!     Err(ScaffoldError::ReferenceNotFound { name }) => println!("{} is missing", name),
//!     Err(e) => return Err(e),
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::core::validation::ValidationError;

/// Data access operation that failed, used to shape the error message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    List,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Operation::Create => "Creation error",
            Operation::Read => "Read error",
            Operation::List => "Get collection request error",
            Operation::Update => "Update error",
            Operation::Delete => "Delete error",
        };
        f.write_str(message)
    }
}

/// The main error type for crudkit
#[derive(Debug, Error)]
pub enum ScaffoldError {
    /// A bound identifier does not match any stored resource
    #[error("{name} not found")]
    ReferenceNotFound { name: String },

    /// Structural or custom validation failed
    #[error("Validation errors")]
    ValidationFailed(Vec<ValidationError>),

    /// A query parameter matches no declared filter
    #[error("Param {param} is not a filter")]
    UnknownFilterParam { param: String },

    /// An event listener stopped the current operation
    #[error("{message}")]
    ListenerAborted {
        status: StatusCode,
        message: String,
    },

    /// The requested resource does not exist
    #[error("Not found")]
    NotFound { resource: String, id: String },

    /// Missing or invalid security token
    #[error("{message}")]
    Unauthorized { message: String },

    /// Binding resolution went deeper than the configured limit
    #[error("bindings nested deeper than {max_depth} levels")]
    BindingDepthExceeded { max_depth: usize },

    /// No data access object was registered for a resource type
    #[error("no data access registered for resource '{resource}'")]
    DataAccessMissing { resource: String },

    /// The data access layer failed while performing an operation
    #[error("{operation}")]
    OperationFailed {
        operation: Operation,
        #[source]
        source: anyhow::Error,
    },

    /// Internal errors (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error body rendered in HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// HTTP status code
    pub code: u16,
    /// Stable error code for programmatic handling
    pub kind: &'static str,
    /// Human-readable error message
    pub message: String,
    /// Optional additional data (validation errors, ...)
    pub data: Option<serde_json::Value>,
}

impl ScaffoldError {
    /// Build a listener failure answered with `400 Bad Request`
    pub fn listener(message: impl Into<String>) -> Self {
        ScaffoldError::ListenerAborted {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    /// Build a listener failure answered with a specific status
    pub fn listener_with_status(status: StatusCode, message: impl Into<String>) -> Self {
        ScaffoldError::ListenerAborted {
            status,
            message: message.into(),
        }
    }

    /// Build an operation failure from a data access error
    pub fn operation(operation: Operation, source: anyhow::Error) -> Self {
        ScaffoldError::OperationFailed { operation, source }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ScaffoldError::ReferenceNotFound { .. } => StatusCode::NOT_FOUND,
            ScaffoldError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            ScaffoldError::UnknownFilterParam { .. } => StatusCode::NOT_FOUND,
            ScaffoldError::ListenerAborted { status, .. } => *status,
            ScaffoldError::NotFound { .. } => StatusCode::NOT_FOUND,
            ScaffoldError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ScaffoldError::BindingDepthExceeded { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ScaffoldError::DataAccessMissing { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ScaffoldError::OperationFailed { operation, .. } => match operation {
                Operation::Read | Operation::List => StatusCode::NOT_FOUND,
                Operation::Create | Operation::Update | Operation::Delete => {
                    StatusCode::BAD_REQUEST
                }
            },
            ScaffoldError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            ScaffoldError::ReferenceNotFound { .. } => "REFERENCE_NOT_FOUND",
            ScaffoldError::ValidationFailed(_) => "VALIDATION_FAILED",
            ScaffoldError::UnknownFilterParam { .. } => "UNKNOWN_FILTER_PARAM",
            ScaffoldError::ListenerAborted { .. } => "LISTENER_ABORTED",
            ScaffoldError::NotFound { .. } => "NOT_FOUND",
            ScaffoldError::Unauthorized { .. } => "UNAUTHORIZED",
            ScaffoldError::BindingDepthExceeded { .. } => "BINDING_DEPTH_EXCEEDED",
            ScaffoldError::DataAccessMissing { .. } => "DATA_ACCESS_MISSING",
            ScaffoldError::OperationFailed { .. } => "OPERATION_FAILED",
            ScaffoldError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to an error body
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            code: self.status_code().as_u16(),
            kind: self.error_code(),
            message: self.to_string(),
            data: self.data(),
        }
    }

    fn data(&self) -> Option<serde_json::Value> {
        match self {
            ScaffoldError::ValidationFailed(errors) => serde_json::to_value(errors).ok(),
            ScaffoldError::NotFound { resource, id } => Some(serde_json::json!({
                "resource": resource,
                "id": id,
            })),
            _ => None,
        }
    }
}

impl IntoResponse for ScaffoldError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, kind = self.error_code(), "request failed");
        }
        let body = Json(serde_json::json!({ "error": self.to_body() }));
        (status, body).into_response()
    }
}

impl From<serde_json::Error> for ScaffoldError {
    fn from(err: serde_json::Error) -> Self {
        ScaffoldError::Internal(format!("JSON error: {}", err))
    }
}
