//! Review routes
//!
//! Mounted twice: at `/api/v1/reviews` for flat access, and nested under
//! `/api/v1/tours/{id}/reviews` where the tour scope comes from the path.
//! Everything requires authentication; writing is for customers (and staff
//! moderation on item routes). Every write recomputes the parent tour's
//! rating aggregates.

use axum::{
    extract::{Path, Query, State},
    middleware::from_fn_with_state,
    routing::get,
    Extension, Json, Router,
};
use serde_json::Value;

use crate::auth::{protect, require_role, CurrentUser};
use crate::error::{Error, Result};
use crate::handlers::envelope::Envelope;
use crate::handlers::factory;
use crate::handlers::features::QueryParams;
use crate::models::review::recalculate_tour_ratings;
use crate::models::{Model, Review, Role};
use crate::state::AppState;
use crate::store::{DocumentStore, FilterCondition, ListQuery};

/// Assemble the flat review router
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(list_reviews).post(create_review))
        .route(
            "/{id}",
            get(get_review).patch(update_review).delete(delete_review),
        )
        .route_layer(from_fn_with_state(state, protect))
}

/// Assemble the router nested under a tour
pub fn nested_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(list_tour_reviews).post(create_tour_review))
        .route_layer(from_fn_with_state(state, protect))
}

async fn list_reviews(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Envelope> {
    factory::get_all::<Review, _>(state.store.as_ref(), Vec::new(), QueryParams::from(params)).await
}

async fn list_tour_reviews(
    State(state): State<AppState>,
    Path(tour_id): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Envelope> {
    let scope = vec![FilterCondition::eq("tour", tour_id)];
    factory::get_all::<Review, _>(state.store.as_ref(), scope, QueryParams::from(params)).await
}

async fn create_review(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<Value>,
) -> Result<Envelope> {
    require_role(&user, &[Role::User])?;
    submit_review(&state, &user.id, None, body).await
}

async fn create_tour_review(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(tour_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Envelope> {
    require_role(&user, &[Role::User])?;
    submit_review(&state, &user.id, Some(tour_id), body).await
}

/// Default the tour and user references, reject duplicates, create,
/// and fold the tour's new rating aggregates
async fn submit_review(
    state: &AppState,
    user_id: &str,
    tour_id: Option<String>,
    body: Value,
) -> Result<Envelope> {
    let Value::Object(mut body) = body else {
        return Err(Error::BadRequest(
            "Request body must be a JSON object".to_string(),
        ));
    };
    if let Some(tour_id) = tour_id {
        body.insert("tour".to_string(), Value::String(tour_id));
    }
    body.insert("user".to_string(), Value::String(user_id.to_string()));

    if let Some(tour) = body.get("tour").and_then(Value::as_str) {
        let existing = ListQuery {
            filter: vec![
                FilterCondition::eq("tour", tour),
                FilterCondition::eq("user", user_id),
            ],
            ..ListQuery::default()
        };
        if !state
            .store
            .find(Review::COLLECTION, &existing)
            .await?
            .is_empty()
        {
            return Err(Error::BadRequest(
                "You have already reviewed this tour".to_string(),
            ));
        }
    }

    let envelope = factory::create_one::<Review, _>(state.store.as_ref(), Value::Object(body)).await?;
    if let Some(tour) = tour_of(&envelope) {
        recalculate_tour_ratings(state.store.as_ref(), &tour).await?;
    }
    Ok(envelope)
}

async fn get_review(State(state): State<AppState>, Path(id): Path<String>) -> Result<Envelope> {
    factory::get_one::<Review, _>(state.store.as_ref(), &id).await
}

async fn update_review(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Envelope> {
    require_role(&user, &[Role::User, Role::Admin])?;
    let envelope = factory::update_one::<Review, _>(state.store.as_ref(), &id, body).await?;
    if let Some(tour) = tour_of(&envelope) {
        recalculate_tour_ratings(state.store.as_ref(), &tour).await?;
    }
    Ok(envelope)
}

async fn delete_review(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Envelope> {
    require_role(&user, &[Role::User, Role::Admin])?;
    // The tour reference is needed after the document is gone
    let tour = state
        .store
        .find_by_id(Review::COLLECTION, &id)
        .await?
        .and_then(|doc| doc.get("tour").and_then(Value::as_str).map(String::from));

    let envelope = factory::delete_one::<Review, _>(state.store.as_ref(), &id).await?;
    if let Some(tour) = tour {
        recalculate_tour_ratings(state.store.as_ref(), &tour).await?;
    }
    Ok(envelope)
}

/// Pull the tour reference out of a review envelope
fn tour_of(envelope: &Envelope) -> Option<String> {
    envelope
        .data
        .as_ref()
        .and_then(|data| data.get(Review::SINGULAR))
        .and_then(|review| review.get("tour"))
        .and_then(Value::as_str)
        .map(String::from)
}
