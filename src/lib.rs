//! Event auto-matching service - library exposing the modules for the binary
//! and the integration tests

pub mod core;
pub mod dtos;
pub mod entities;
pub mod matching;
pub mod notifications;
pub mod repositories;
pub mod services;

pub use crate::core::{AppError, AppState, auth, config};
pub use services::root;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;

/// Builds the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .nest("/events", configure_event_routes(state.clone()))
        .with_state(state)
}

/// Event routes, all behind bearer authentication
fn configure_event_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/", get(list_events).post(create_event))
        .route("/auto-match", post(auto_match))
        .route("/{event_id}", get(get_event))
        .route("/{event_id}/invitations", get(list_event_invitations))
        .route("/{event_id}/decline", post(decline_event))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}
