//! Booking routes
//!
//! A customer asks for a checkout session for a tour; the payment processor
//! later reports the settled payment to the webhook, which records the
//! booking. The CRUD surface is for staff.

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    middleware::from_fn_with_state,
    routing::get,
    Extension, Json, Router,
};
use serde_json::{json, Value};

use crate::auth::{protect, require_role, CurrentUser};
use crate::error::{Error, Result};
use crate::handlers::envelope::Envelope;
use crate::handlers::factory;
use crate::handlers::features::QueryParams;
use crate::models::{Booking, Model, Role, Tour, User};
use crate::payments::{verify_signature, CheckoutEvent, CHECKOUT_COMPLETED, SIGNATURE_HEADER};
use crate::state::AppState;
use crate::store::{DocumentStore, FilterCondition, ListQuery};

/// Assemble the booking router
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/checkout-session/{id}", get(checkout_session))
        .route("/", get(list_bookings).post(create_booking))
        .route(
            "/{id}",
            get(get_booking).patch(update_booking).delete(delete_booking),
        )
        .route_layer(from_fn_with_state(state, protect))
}

/// Build a checkout session for the current user and a tour
async fn checkout_session(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(tour_id): Path<String>,
) -> Result<Envelope> {
    let Some(doc) = state.store.find_by_id(Tour::COLLECTION, &tour_id).await? else {
        return Err(Error::no_document(Tour::SINGULAR, &tour_id));
    };
    let tour = Tour::from_document(&doc)
        .map_err(|e| Error::Internal(format!("Malformed tour document: {e}")))?;

    let session = state.gateway.session_for(&tour_id, &tour, &user.email);
    let session = serde_json::to_value(session)
        .map_err(|e| Error::Internal(format!("Failed to serialize session: {e}")))?;
    Ok(Envelope::item("session", session))
}

/// Record the booking a completed checkout reports
///
/// Mounted outside the authenticated API surface; the caller proves itself
/// with the shared-secret signature header instead.
pub async fn webhook_checkout(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<Value>> {
    let provided = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if !verify_signature(&state.config.payments.webhook_secret, provided) {
        return Err(Error::BadRequest(
            "Webhook error: invalid signature".to_string(),
        ));
    }

    let event: CheckoutEvent = serde_json::from_str(&body)
        .map_err(|e| Error::BadRequest(format!("Webhook error: {e}")))?;

    if event.kind == CHECKOUT_COMPLETED {
        let session = event.data.object;
        let query = ListQuery {
            filter: vec![FilterCondition::eq(
                "email",
                session.customer_email.to_lowercase(),
            )],
            ..ListQuery::default()
        };
        let user = state.store.find(User::COLLECTION, &query).await?.pop();
        match user.and_then(|doc| doc.get("id").and_then(Value::as_str).map(String::from)) {
            Some(user_id) => {
                factory::create_one::<Booking, _>(
                    state.store.as_ref(),
                    json!({
                        "tour": session.client_reference_id,
                        "user": user_id,
                        "price": session.amount_total as f64 / 100.0,
                        "paid": true,
                    }),
                )
                .await?;
            }
            None => {
                tracing::warn!(
                    email = %session.customer_email,
                    "Checkout completed for an unknown customer; booking skipped"
                );
            }
        }
    }

    Ok(Json(json!({ "received": true })))
}

async fn list_bookings(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Envelope> {
    require_role(&user, &[Role::Admin, Role::LeadGuide])?;
    factory::get_all::<Booking, _>(state.store.as_ref(), Vec::new(), QueryParams::from(params))
        .await
}

async fn create_booking(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<Value>,
) -> Result<Envelope> {
    require_role(&user, &[Role::Admin, Role::LeadGuide])?;
    factory::create_one::<Booking, _>(state.store.as_ref(), body).await
}

async fn get_booking(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Envelope> {
    require_role(&user, &[Role::Admin, Role::LeadGuide])?;
    factory::get_one::<Booking, _>(state.store.as_ref(), &id).await
}

async fn update_booking(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Envelope> {
    require_role(&user, &[Role::Admin, Role::LeadGuide])?;
    factory::update_one::<Booking, _>(state.store.as_ref(), &id, body).await
}

async fn delete_booking(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Envelope> {
    require_role(&user, &[Role::Admin, Role::LeadGuide])?;
    factory::delete_one::<Booking, _>(state.store.as_ref(), &id).await
}
