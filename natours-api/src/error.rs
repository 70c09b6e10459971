//! Error types and HTTP response conversion
//!
//! Operational failures (not found, validation, bad credentials) render as
//! `status: "fail"` with their message intact; anything unexpected renders
//! as `status: "error"` with a generic message, and the detail goes to the
//! log instead of the caller.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::handlers::envelope::Envelope;
use crate::store::StoreError;

/// Result type alias using the application error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the application
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// Resource not found
    #[error("{0}")]
    NotFound(String),

    /// Bad request
    #[error("{0}")]
    BadRequest(String),

    /// Entity attribute constraints violated
    #[error("Invalid input data. {0}")]
    Validation(String),

    /// Authentication failed
    #[error("{0}")]
    Unauthorized(String),

    /// Authorization failed
    #[error("{0}")]
    Forbidden(String),

    /// Storage failure that is not a validation error
    #[error("{0}")]
    Store(StoreError),

    /// Email delivery failure
    #[error("Email error: {0}")]
    Email(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal server error
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl Error {
    /// The canonical "no entity with this id" failure
    ///
    /// `display_name` is the entity's configured singular name; the message
    /// shape is shared by get-one, update-one, and delete-one.
    pub fn no_document(display_name: &str, id: &str) -> Self {
        Self::NotFound(format!("No {display_name} found with ID: {id}"))
    }

    /// Whether this failure is anticipated and safe to show to the caller
    #[must_use]
    pub fn is_operational(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::BadRequest(_)
                | Self::Validation(_)
                | Self::Unauthorized(_)
                | Self::Forbidden(_)
        )
    }
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        if err.is_validation() {
            Self::Validation(err.message)
        } else {
            Self::Store(err)
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (code, message) = match self {
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Error::Validation(msg) => {
                (StatusCode::BAD_REQUEST, format!("Invalid input data. {msg}"))
            }
            Error::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            Error::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            Error::Store(err) => {
                tracing::error!(kind = %err.kind, "Store error: {}", err.message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went very wrong!".to_string(),
                )
            }
            Error::Email(msg) => {
                tracing::error!("Email error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "There was an error sending the email. Try again later!".to_string(),
                )
            }
            Error::Config(err) => {
                tracing::error!("Configuration error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went very wrong!".to_string(),
                )
            }
            Error::Io(err) => {
                tracing::error!("I/O error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went very wrong!".to_string(),
                )
            }
            Error::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went very wrong!".to_string(),
                )
            }
        };

        Envelope::failure(code, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_document_message_shape() {
        let err = Error::no_document("tour", "42");
        assert_eq!(err.to_string(), "No tour found with ID: 42");
        assert!(err.is_operational());
    }

    #[test]
    fn test_store_validation_becomes_operational() {
        let err: Error = StoreError::validation("A tour must have a name").into();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.is_operational());
    }

    #[test]
    fn test_store_infrastructure_stays_internal() {
        let err: Error = StoreError::serialization("bad document").into();
        assert!(matches!(err, Error::Store(_)));
        assert!(!err.is_operational());
    }
}
