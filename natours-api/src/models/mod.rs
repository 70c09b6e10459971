//! Entity type descriptors
//!
//! Each resource (tour, user, review, booking) describes itself through the
//! [`Model`] trait: its collection name, its configured singular display
//! name, its attribute constraints, and how it relates to other resources.
//! The handler factory is generic over this trait and never knows a
//! concrete entity shape.

pub mod booking;
pub mod review;
pub mod tour;
pub mod user;

use std::fmt;

use serde_json::Value;

pub use booking::Booking;
pub use review::Review;
pub use tour::Tour;
pub use user::{Role, User};

use crate::store::{Document, StoreError};

/// One or more violated attribute constraints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Messages for each violated constraint
    pub errors: Vec<String>,
}

impl ValidationError {
    /// Wrap a single constraint message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            errors: vec![message.into()],
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.errors.join(". "))
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for StoreError {
    fn from(err: ValidationError) -> Self {
        StoreError::validation(err.to_string())
    }
}

impl From<ValidationError> for crate::error::Error {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// A related entity to embed when fetching a single document
///
/// The identifier stored under `field` is replaced by the related document,
/// narrowed to `select` (plus its identifier).
#[derive(Debug, Clone, Copy)]
pub struct Expansion {
    /// The field holding the related entity's identifier
    pub field: &'static str,
    /// The collection the related entity lives in
    pub collection: &'static str,
    /// The related fields worth embedding
    pub select: &'static [&'static str],
}

/// Descriptor of a resource type
///
/// The display name is configured explicitly rather than derived from the
/// collection name, so irregular plurals cannot produce nonsense.
pub trait Model: Send + Sync + 'static {
    /// Collection the entities live in; also the data key of list responses
    const COLLECTION: &'static str;

    /// Singular display name; data key of single-entity responses and the
    /// `No <type> found` message subject
    const SINGULAR: &'static str;

    /// Check every attribute constraint against a full document
    fn validate(doc: &Document) -> Result<(), ValidationError>;

    /// Attribute defaults applied before create-time validation
    fn defaults() -> Vec<(&'static str, Value)> {
        Vec::new()
    }

    /// Fields stripped from every response (never from storage)
    fn hidden_fields() -> &'static [&'static str] {
        &[]
    }

    /// Related entities embedded by get-one
    fn expansions() -> &'static [Expansion] {
        &[]
    }
}

/// Collects constraint violations across a document
///
/// Mirrors how a schema layer reports several failures at once instead of
/// stopping at the first.
#[derive(Debug, Default)]
pub(crate) struct ConstraintChecker {
    errors: Vec<String>,
}

impl ConstraintChecker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The field must hold a non-empty string
    pub(crate) fn require_string(&mut self, doc: &Document, field: &str, message: &str) {
        match doc.get(field) {
            Some(Value::String(s)) if !s.trim().is_empty() => {}
            _ => self.errors.push(message.to_string()),
        }
    }

    /// The field must hold a number strictly greater than zero
    pub(crate) fn require_positive_number(&mut self, doc: &Document, field: &str, message: &str) {
        match doc.get(field).and_then(Value::as_f64) {
            Some(n) if n > 0.0 => {}
            _ => self.errors.push(message.to_string()),
        }
    }

    /// If present, the field must be a number within the inclusive range
    pub(crate) fn check_range(
        &mut self,
        doc: &Document,
        field: &str,
        min: f64,
        max: f64,
        message: &str,
    ) {
        if let Some(value) = doc.get(field) {
            match value.as_f64() {
                Some(n) if (min..=max).contains(&n) => {}
                _ => self.errors.push(message.to_string()),
            }
        }
    }

    /// If present, the field must be one of the allowed string values
    pub(crate) fn check_one_of(
        &mut self,
        doc: &Document,
        field: &str,
        allowed: &[&str],
        message: &str,
    ) {
        if let Some(value) = doc.get(field) {
            match value.as_str() {
                Some(s) if allowed.contains(&s) => {}
                _ => self.errors.push(message.to_string()),
            }
        }
    }

    /// Record a custom violation
    pub(crate) fn fail(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    pub(crate) fn finish(self) -> Result<(), ValidationError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                errors: self.errors,
            })
        }
    }
}

/// Minimal shape check for email addresses
///
/// Full RFC 5322 parsing is not the goal; rejecting obvious garbage is.
pub(crate) fn looks_like_email(candidate: &str) -> bool {
    let Some((local, domain)) = candidate.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !candidate.contains(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_checker_collects_all_violations() {
        let d = doc(json!({"name": ""}));
        let mut checker = ConstraintChecker::new();
        checker.require_string(&d, "name", "A tour must have a name");
        checker.require_positive_number(&d, "price", "A tour must have a price");
        let err = checker.finish().unwrap_err();
        assert_eq!(err.errors.len(), 2);
        assert_eq!(
            err.to_string(),
            "A tour must have a name. A tour must have a price"
        );
    }

    #[test]
    fn test_range_only_checked_when_present() {
        let d = doc(json!({}));
        let mut checker = ConstraintChecker::new();
        checker.check_range(&d, "rating", 1.0, 5.0, "out of range");
        assert!(checker.finish().is_ok());

        let d = doc(json!({"rating": 6}));
        let mut checker = ConstraintChecker::new();
        checker.check_range(&d, "rating", 1.0, 5.0, "out of range");
        assert!(checker.finish().is_err());
    }

    #[test]
    fn test_one_of() {
        let d = doc(json!({"difficulty": "extreme"}));
        let mut checker = ConstraintChecker::new();
        checker.check_one_of(&d, "difficulty", &["easy", "medium", "difficult"], "bad");
        assert!(checker.finish().is_err());
    }

    #[test]
    fn test_email_shape() {
        assert!(looks_like_email("ada@example.com"));
        assert!(looks_like_email("a.b+c@mail.example.org"));
        assert!(!looks_like_email("ada"));
        assert!(!looks_like_email("ada@"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("ada@example"));
        assert!(!looks_like_email("ada@.com"));
        assert!(!looks_like_email("ada smith@example.com"));
    }

    #[test]
    fn test_validation_error_converts_to_store_error() {
        let err: StoreError = ValidationError::new("rating out of range").into();
        assert!(err.is_validation());
    }
}
