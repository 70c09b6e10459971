//! HTTP routing
//!
//! Resource routers mounted under `/api/v1`, the unauthenticated checkout
//! webhook, and the JSON 404 fallback.

pub mod bookings;
pub mod reviews;
pub mod tours;
pub mod users;

use axum::{http::Uri, routing::post, Router};

use crate::error::Error;
use crate::state::AppState;

/// Assemble the full application router
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1/tours", tours::router(state.clone()))
        .nest("/api/v1/users", users::router(state.clone()))
        .nest("/api/v1/reviews", reviews::router(state.clone()))
        .nest("/api/v1/bookings", bookings::router(state.clone()))
        .route("/webhook-checkout", post(bookings::webhook_checkout))
        .fallback(not_found)
        .with_state(state)
}

async fn not_found(uri: Uri) -> Error {
    Error::NotFound(format!("Cannot find {} on this server", uri.path()))
}
