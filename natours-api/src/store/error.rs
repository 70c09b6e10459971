//! Store error types
//!
//! Point lookups report "not found" as `Ok(None)` rather than an error, so
//! the error surface here is small: validation failures (which the caller
//! must be able to distinguish) and everything else.

use std::fmt;

/// Category of store error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreErrorKind {
    /// A validation hook rejected the document before it was committed
    Validation,
    /// A document could not be serialized or deserialized
    Serialization,
    /// Other unclassified store failure
    Other,
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Serialization => write!(f, "serialization"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Structured store error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Store {kind} error: {message}")]
pub struct StoreError {
    /// The category of error
    pub kind: StoreErrorKind,
    /// Human-readable error message
    pub message: String,
}

impl StoreError {
    /// Create a new store error
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Validation, message)
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Serialization, message)
    }

    /// Check whether this error carries a validation failure
    #[must_use]
    pub fn is_validation(&self) -> bool {
        self.kind == StoreErrorKind::Validation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_kind() {
        let err = StoreError::validation("rating out of range");
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "Store validation error: rating out of range");
    }

    #[test]
    fn test_other_kind() {
        let err = StoreError::new(StoreErrorKind::Other, "boom");
        assert!(!err.is_validation());
    }
}
