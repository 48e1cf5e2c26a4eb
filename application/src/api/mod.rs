//! REST API definitions.

pub mod auth;
pub mod booking;
pub mod item;

use axum::{
    routing::{get, post},
    Router,
};

/// Builds the [`Router`] of all API endpoints.
///
/// The [`Service`] is expected to be provided as a request extension.
///
/// [`Service`]: crate::Service
#[must_use]
pub fn router() -> Router {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/bookings", post(booking::create).get(booking::list))
        .route("/bookings/:id", get(booking::find).put(booking::update))
        .route("/items/:id", get(item::find))
}
