//! Natours API
//!
//! A tour booking REST API: tours, user accounts, reviews, and bookings
//! purchased through an external checkout.
//!
//! The interesting part is the reusable core every resource shares:
//!
//! - [`handlers::features`] — the query-feature pipeline, translating a
//!   request's flat query string into a staged list query
//!   (filter → sort → field projection → pagination)
//! - [`handlers::factory`] — the generic resource-handler factory producing
//!   the five canonical CRUD operations for any [`models::Model`]
//! - [`store`] — the document store contract the factory executes against,
//!   with an in-memory reference implementation
//!
//! Around that core: JWT authentication with Argon2 password hashing and
//! mailed password resets ([`auth`], [`email`]), a thin checkout seam with a
//! signed webhook ([`payments`]), figment configuration ([`config`]), and a
//! tower-http server shell ([`server`]).
//!
//! # Quick start
//!
//! ```rust,no_run
//! use natours_api::{routes, AppState, Config, Server};
//!
//! # async fn run() -> natours_api::Result<()> {
//! let config = Config::load()?;
//! let state = AppState::new(config)?;
//! let server = Server::new(state.config.as_ref().clone());
//! server.serve(routes::app_router(state)).await
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod email;
pub mod error;
pub mod handlers;
pub mod models;
pub mod observability;
pub mod payments;
pub mod routes;
pub mod server;
pub mod state;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
pub use server::Server;
pub use state::AppState;
