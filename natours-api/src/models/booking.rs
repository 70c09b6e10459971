//! Booking entity
//!
//! Records a paid (or pending) purchase of a tour by a user. Created by the
//! checkout webhook once the payment settles, or by staff through the
//! booking CRUD routes.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::store::Document;

use super::{ConstraintChecker, Expansion, Model, ValidationError};

/// A booking as stored
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    /// Identifier of the booked tour
    pub tour: String,
    /// Identifier of the purchasing user
    pub user: String,
    /// Price paid, in major currency units
    pub price: f64,
    #[serde(default = "default_paid")]
    pub paid: bool,
}

fn default_paid() -> bool {
    true
}

impl Booking {
    /// Serialize into a document ready for insertion
    pub fn into_document(self) -> Document {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Document::new(),
        }
    }
}

impl Model for Booking {
    const COLLECTION: &'static str = "bookings";
    const SINGULAR: &'static str = "booking";

    fn validate(doc: &Document) -> Result<(), ValidationError> {
        let mut checker = ConstraintChecker::new();
        checker.require_string(doc, "tour", "Booking must belong to a tour");
        checker.require_string(doc, "user", "Booking must belong to a user");
        checker.require_positive_number(doc, "price", "Booking must have a price");
        checker.finish()
    }

    fn defaults() -> Vec<(&'static str, Value)> {
        vec![("paid", json!(true))]
    }

    fn expansions() -> &'static [Expansion] {
        &[
            Expansion {
                field: "tour",
                collection: "tours",
                select: &["name"],
            },
            Expansion {
                field: "user",
                collection: "users",
                select: &["name", "email"],
            },
        ]
    }
}
