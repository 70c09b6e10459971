//! Tour routes
//!
//! Public: listing (with the top-5-cheap alias) and the stats endpoint.
//! Staff-only: creation, updates, deletion, the monthly plan, and single-tour
//! detail.

use axum::{
    extract::{Path, Query, State},
    middleware::from_fn_with_state,
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::Value;

use crate::auth::{protect, require_role, CurrentUser};
use crate::error::{Error, Result};
use crate::handlers::envelope::Envelope;
use crate::handlers::factory;
use crate::handlers::features::QueryParams;
use crate::models::tour::{monthly_plan as plan_for_year, stats_by_difficulty};
use crate::models::{Model, Role, Tour};
use crate::state::AppState;
use crate::store::{DocumentStore, ListQuery};

use super::reviews;

/// Assemble the tour router
pub fn router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/", post(create_tour))
        .route(
            "/{id}",
            get(get_tour).patch(update_tour).delete(delete_tour),
        )
        .route("/monthly-plan/{year}", get(monthly_plan))
        .route_layer(from_fn_with_state(state.clone(), protect));

    Router::new()
        .route("/", get(list_tours))
        .route("/top-5-cheap", get(top_five_cheap))
        .route("/stats", get(tour_stats))
        // Same parameter name as the item routes; matchit rejects two names
        // for one position
        .nest("/{id}/reviews", reviews::nested_router(state))
        .merge(protected)
}

async fn list_tours(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Envelope> {
    factory::get_all::<Tour, _>(state.store.as_ref(), Vec::new(), QueryParams::from(params)).await
}

/// Alias: the five best-rated cheap tours, trimmed to card fields
async fn top_five_cheap(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Envelope> {
    let mut params = QueryParams::from(params);
    params.set("limit", "5");
    params.set("sort", "-ratingsAverage,price");
    params.set("fields", "name,price,ratingsAverage,summary,difficulty");
    factory::get_all::<Tour, _>(state.store.as_ref(), Vec::new(), params).await
}

async fn tour_stats(State(state): State<AppState>) -> Result<Envelope> {
    let docs = state
        .store
        .find(Tour::COLLECTION, &ListQuery::default())
        .await?;
    let stats = serde_json::to_value(stats_by_difficulty(&docs))
        .map_err(|e| Error::Internal(format!("Failed to serialize stats: {e}")))?;
    Ok(Envelope::item("stats", stats))
}

async fn monthly_plan(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(year): Path<i32>,
) -> Result<Envelope> {
    require_role(&user, &[Role::Admin, Role::LeadGuide])?;
    let docs = state
        .store
        .find(Tour::COLLECTION, &ListQuery::default())
        .await?;
    let plan = serde_json::to_value(plan_for_year(&docs, year))
        .map_err(|e| Error::Internal(format!("Failed to serialize plan: {e}")))?;
    Ok(Envelope::item("plan", plan))
}

async fn create_tour(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<Value>,
) -> Result<Envelope> {
    require_role(&user, &[Role::Admin])?;
    factory::create_one::<Tour, _>(state.store.as_ref(), body).await
}

async fn get_tour(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Envelope> {
    require_role(&user, &[Role::Admin, Role::LeadGuide, Role::Guide])?;
    factory::get_one::<Tour, _>(state.store.as_ref(), &id).await
}

async fn update_tour(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Envelope> {
    require_role(&user, &[Role::Admin])?;
    factory::update_one::<Tour, _>(state.store.as_ref(), &id, body).await
}

async fn delete_tour(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Envelope> {
    require_role(&user, &[Role::Admin, Role::LeadGuide])?;
    factory::delete_one::<Tour, _>(state.store.as_ref(), &id).await
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::config::Config;
    use crate::models::user::User;

    use super::*;

    fn test_state() -> AppState {
        AppState::new(Config::default()).unwrap()
    }

    fn staff(role: Role) -> CurrentUser {
        CurrentUser(User {
            id: "staff".to_string(),
            name: "Staff".to_string(),
            email: "staff@example.com".to_string(),
            photo: None,
            role,
            password: None,
            password_changed_at: None,
            password_reset_token: None,
            password_reset_expires: None,
            active: true,
        })
    }

    async fn seed_tour(state: &AppState, name: &str, price: f64, rating: f64) {
        factory::create_one::<Tour, _>(
            state.store.as_ref(),
            json!({
                "name": name,
                "duration": 5,
                "maxGroupSize": 25,
                "difficulty": "easy",
                "price": price,
                "ratingsAverage": rating,
                "summary": "A tour",
                "imageCover": "cover.jpg",
                "startDates": ["2026-06-01T09:00:00Z"]
            }),
        )
        .await
        .unwrap();
    }

    fn body_of(envelope: &Envelope) -> serde_json::Value {
        serde_json::to_value(envelope).unwrap()
    }

    #[tokio::test]
    async fn test_top_five_cheap_presets_envelope() {
        let state = test_state();
        for i in 0..7 {
            seed_tour(
                &state,
                &format!("Tour {i}"),
                100.0 + i as f64,
                4.0 + 0.1 * i as f64,
            )
            .await;
        }

        let envelope = top_five_cheap(State(state), Query(Vec::new())).await.unwrap();
        let body = body_of(&envelope);
        assert_eq!(body["results"], 5);
        // Best-rated first
        assert_eq!(body["data"]["tours"][0]["name"], "Tour 6");
        // Projection trimmed to card fields
        assert!(body["data"]["tours"][0].get("summary").is_some());
        assert!(body["data"]["tours"][0].get("imageCover").is_none());
    }

    #[tokio::test]
    async fn test_tour_stats_endpoint() {
        let state = test_state();
        seed_tour(&state, "A", 100.0, 4.0).await;
        seed_tour(&state, "B", 300.0, 5.0).await;

        let envelope = tour_stats(State(state)).await.unwrap();
        let body = body_of(&envelope);
        assert_eq!(body["data"]["stats"][0]["difficulty"], "easy");
        assert_eq!(body["data"]["stats"][0]["numTours"], 2);
        assert_eq!(body["data"]["stats"][0]["avgPrice"], 200.0);
    }

    #[tokio::test]
    async fn test_monthly_plan_requires_staff_role() {
        let state = test_state();
        seed_tour(&state, "A", 100.0, 4.0).await;

        let err = monthly_plan(
            State(state.clone()),
            Extension(staff(Role::User)),
            Path(2026),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));

        let envelope = monthly_plan(
            State(state),
            Extension(staff(Role::LeadGuide)),
            Path(2026),
        )
        .await
        .unwrap();
        let body = body_of(&envelope);
        assert_eq!(body["data"]["plan"][0]["month"], 6);
        assert_eq!(body["data"]["plan"][0]["numTourStarts"], 1);
    }

    #[tokio::test]
    async fn test_create_tour_requires_admin() {
        let state = test_state();
        let body = json!({
            "name": "New",
            "duration": 3,
            "maxGroupSize": 10,
            "difficulty": "easy",
            "price": 100,
            "summary": "s",
            "imageCover": "c.jpg"
        });

        let err = create_tour(
            State(state.clone()),
            Extension(staff(Role::Guide)),
            Json(body.clone()),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));

        let envelope = create_tour(State(state), Extension(staff(Role::Admin)), Json(body))
            .await
            .unwrap();
        assert_eq!(body_of(&envelope)["data"]["tour"]["name"], "New");
    }
}
