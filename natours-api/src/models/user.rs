//! User entity
//!
//! The stored document carries the Argon2 password hash and the password
//! reset bookkeeping; all of those are hidden from every response the
//! handler factory produces. Auth flows read the full document through the
//! store directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::Document;

use super::{looks_like_email, ConstraintChecker, Model, ValidationError};

/// Authorization roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// A regular customer
    #[default]
    User,
    /// A tour guide
    Guide,
    /// A lead tour guide
    LeadGuide,
    /// An administrator
    Admin,
}

/// The role names a user document may carry
pub const ROLES: [&str; 4] = ["user", "guide", "lead-guide", "admin"];

/// A user as stored
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub role: Role,
    /// Argon2 hash, never serialized into a response
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub password_changed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub password_reset_token: Option<String>,
    #[serde(default)]
    pub password_reset_expires: Option<DateTime<Utc>>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl User {
    /// Deserialize a stored document into the typed entity
    pub fn from_document(doc: &Document) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(doc.clone()))
    }

    /// Whether the password was changed after a token issued at `issued_at`
    /// (seconds since the epoch)
    #[must_use]
    pub fn changed_password_after(&self, issued_at: i64) -> bool {
        self.password_changed_at
            .is_some_and(|changed| issued_at < changed.timestamp())
    }

    /// Whether the user holds one of the given roles
    #[must_use]
    pub fn has_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role)
    }
}

impl Model for User {
    const COLLECTION: &'static str = "users";
    const SINGULAR: &'static str = "user";

    fn validate(doc: &Document) -> Result<(), ValidationError> {
        let mut checker = ConstraintChecker::new();
        checker.require_string(doc, "name", "Please tell us your name");
        checker.require_string(doc, "email", "Please provide your email");
        if let Some(email) = doc.get("email").and_then(Value::as_str) {
            if !looks_like_email(email) {
                checker.fail("Please provide a valid email");
            }
        }
        checker.check_one_of(
            doc,
            "role",
            &ROLES,
            "Role is either: user, guide, lead-guide, admin",
        );
        checker.require_string(doc, "password", "Please provide a password");
        checker.finish()
    }

    fn hidden_fields() -> &'static [&'static str] {
        &["password", "passwordResetToken", "passwordResetExpires"]
    }
}
