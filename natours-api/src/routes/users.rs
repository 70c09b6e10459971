//! User routes
//!
//! Public: signup, login, and the password reset pair. Authenticated:
//! the `me` self-service endpoints. Admin: the user CRUD, with account
//! creation deliberately stubbed out in favor of signup.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use serde_json::Value;

use crate::auth::{self, protect, require_role, CurrentUser};
use crate::error::Result;
use crate::handlers::envelope::Envelope;
use crate::handlers::factory;
use crate::handlers::features::QueryParams;
use crate::models::{Role, User};
use crate::state::AppState;
use crate::store::FilterCondition;

/// Assemble the user router
pub fn router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/me", get(auth::get_me))
        .route("/update-me", patch(auth::update_me))
        .route("/delete-me", axum::routing::delete(auth::delete_me))
        .route("/update-my-password", patch(auth::update_my_password))
        .route("/", get(list_users).post(create_user))
        .route(
            "/{id}",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .route_layer(from_fn_with_state(state.clone(), protect));

    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password/{token}", patch(auth::reset_password))
        .merge(protected)
}

async fn list_users(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Envelope> {
    require_role(&user, &[Role::Admin])?;
    // Deactivated accounts stay out of listings
    let scope = vec![FilterCondition::eq("active", true)];
    factory::get_all::<User, _>(state.store.as_ref(), scope, QueryParams::from(params)).await
}

/// Accounts are created through signup, never through the CRUD surface
async fn create_user() -> Envelope {
    Envelope::failure(
        StatusCode::INTERNAL_SERVER_ERROR,
        "This route is not defined! Please use /signup instead",
    )
}

async fn get_user(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Envelope> {
    require_role(&user, &[Role::Admin])?;
    factory::get_one::<User, _>(state.store.as_ref(), &id).await
}

async fn update_user(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Envelope> {
    require_role(&user, &[Role::Admin])?;
    factory::update_one::<User, _>(state.store.as_ref(), &id, body).await
}

async fn delete_user(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Envelope> {
    require_role(&user, &[Role::Admin])?;
    factory::delete_one::<User, _>(state.store.as_ref(), &id).await
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::config::Config;
    use crate::error::Error;
    use crate::models::Model;
    use crate::store::DocumentStore;

    use super::*;

    fn test_state() -> AppState {
        AppState::new(Config::default()).unwrap()
    }

    fn admin() -> CurrentUser {
        CurrentUser(User {
            id: "admin".to_string(),
            name: "Admin".to_string(),
            email: "admin@example.com".to_string(),
            photo: None,
            role: Role::Admin,
            password: None,
            password_changed_at: None,
            password_reset_token: None,
            password_reset_expires: None,
            active: true,
        })
    }

    async fn seed_user(state: &AppState, id: &str, active: bool) {
        let doc = match json!({
            "id": id,
            "name": id,
            "email": format!("{id}@example.com"),
            "role": "user",
            "password": "hash",
            "active": active,
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        state.store.insert(User::COLLECTION, doc).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_user_is_stubbed() {
        let envelope = create_user().await;
        assert_eq!(envelope.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = serde_json::to_value(&envelope).unwrap();
        assert_eq!(body["status"], "error");
        assert_eq!(
            body["message"],
            "This route is not defined! Please use /signup instead"
        );
    }

    #[tokio::test]
    async fn test_list_users_excludes_deactivated_and_requires_admin() {
        let state = test_state();
        seed_user(&state, "u1", true).await;
        seed_user(&state, "u2", false).await;

        let envelope = list_users(State(state.clone()), Extension(admin()), Query(Vec::new()))
            .await
            .unwrap();
        let body = serde_json::to_value(&envelope).unwrap();
        assert_eq!(body["results"], 1);
        assert_eq!(body["data"]["users"][0]["id"], "u1");
        assert!(body["data"]["users"][0].get("password").is_none());

        let mut customer = admin();
        customer.0.role = Role::User;
        let err = list_users(State(state), Extension(customer), Query(Vec::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
    }
}
