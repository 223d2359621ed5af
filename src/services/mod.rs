//! Services module - HTTP handlers
//!
//! Each sub-module groups the endpoints of one feature.

pub mod event;
pub mod matching;

pub use event::{create_event, decline_event, get_event, list_event_invitations, list_events};
pub use matching::auto_match;

use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

/// Root endpoint - health check
pub async fn root(State(_state): State<Arc<AppState>>) -> impl IntoResponse {
    (StatusCode::OK, "Server is running!")
}
