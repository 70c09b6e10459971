//! Checkout integration
//!
//! The payment processor itself is an external collaborator; this module is
//! the thin seam around it. [`CheckoutGateway`] builds the session a client
//! completes elsewhere, and [`verify_signature`] authenticates the webhook
//! call that reports the settled payment. The webhook payload shape
//! (`client_reference_id`, `customer_email`, `amount_total` in minor
//! currency units) matches what hosted checkout providers send, so a real
//! gateway drops in without touching the booking flow.

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::config::PaymentsConfig;
use crate::models::Tour;

/// Header carrying the webhook's shared-secret signature
pub const SIGNATURE_HEADER: &str = "x-checkout-signature";

/// Event kind reported once a checkout settles
pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

/// Builds checkout sessions for tours
#[derive(Debug, Clone)]
pub struct CheckoutGateway {
    currency: String,
    public_url: String,
}

impl CheckoutGateway {
    /// Create the gateway from configuration
    #[must_use]
    pub fn new(config: &PaymentsConfig, public_url: &str) -> Self {
        Self {
            currency: config.currency.clone(),
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    /// Build a checkout session for one tour and the purchasing customer
    #[must_use]
    pub fn session_for(&self, tour_id: &str, tour: &Tour, customer_email: &str) -> CheckoutSession {
        CheckoutSession {
            id: format!("cs_{}", Uuid::new_v4().simple()),
            mode: "payment".to_string(),
            client_reference_id: tour_id.to_string(),
            customer_email: customer_email.to_string(),
            currency: self.currency.clone(),
            // Minor currency units
            amount_total: (tour.price * 100.0).round() as u64,
            product_name: format!("{} Tour", tour.name),
            product_description: tour.summary.clone(),
            success_url: format!("{}/my-tours?alert=booking", self.public_url),
            cancel_url: format!("{}/tours/{tour_id}", self.public_url),
        }
    }
}

/// A checkout session handed to the client
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct CheckoutSession {
    pub id: String,
    pub mode: String,
    pub client_reference_id: String,
    pub customer_email: String,
    pub currency: String,
    pub amount_total: u64,
    pub product_name: String,
    pub product_description: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// The event body a webhook call delivers
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutEvent {
    /// Event kind, e.g. `checkout.session.completed`
    #[serde(rename = "type")]
    pub kind: String,
    /// Event payload
    pub data: CheckoutEventData,
}

/// Payload wrapper within an event
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutEventData {
    /// The session the event reports on
    pub object: CheckoutSessionPayload,
}

/// The slice of a completed session the booking flow needs
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSessionPayload {
    /// Tour identifier the session was created for
    pub client_reference_id: String,
    /// Email of the purchasing customer
    pub customer_email: String,
    /// Amount paid, in minor currency units
    pub amount_total: u64,
}

/// Compare the webhook's signature header against the shared secret
///
/// Constant-time comparison; a missing or differently-sized value fails
/// without revealing where it diverged.
#[must_use]
pub fn verify_signature(secret: &str, provided: &str) -> bool {
    secret.as_bytes().ct_eq(provided.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn tour() -> Tour {
        serde_json::from_value(json!({
            "id": "t1",
            "name": "The Forest Hiker",
            "duration": 5,
            "maxGroupSize": 25,
            "difficulty": "easy",
            "price": 397,
            "summary": "Breathtaking hike",
            "imageCover": "cover.jpg"
        }))
        .unwrap()
    }

    fn gateway() -> CheckoutGateway {
        CheckoutGateway::new(&PaymentsConfig::default(), "http://localhost:3000/")
    }

    #[test]
    fn test_session_fields() {
        let session = gateway().session_for("t1", &tour(), "ada@example.com");
        assert!(session.id.starts_with("cs_"));
        assert_eq!(session.client_reference_id, "t1");
        assert_eq!(session.customer_email, "ada@example.com");
        assert_eq!(session.amount_total, 39_700);
        assert_eq!(session.product_name, "The Forest Hiker Tour");
        assert_eq!(session.success_url, "http://localhost:3000/my-tours?alert=booking");
        assert_eq!(session.cancel_url, "http://localhost:3000/tours/t1");
    }

    #[test]
    fn test_signature_verification() {
        assert!(verify_signature("shared-secret", "shared-secret"));
        assert!(!verify_signature("shared-secret", "shared-secreT"));
        assert!(!verify_signature("shared-secret", ""));
        assert!(!verify_signature("shared-secret", "shared-secret-longer"));
    }

    #[test]
    fn test_event_deserialization() {
        let event: CheckoutEvent = serde_json::from_value(json!({
            "type": "checkout.session.completed",
            "data": {
                "object": {
                    "client_reference_id": "t1",
                    "customer_email": "ada@example.com",
                    "amount_total": 39700
                }
            }
        }))
        .unwrap();
        assert_eq!(event.kind, CHECKOUT_COMPLETED);
        assert_eq!(event.data.object.amount_total, 39_700);
    }
}
