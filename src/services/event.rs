//! Event services - creation, browsing, invitations and declines

use crate::core::{AppError, AppState, AuthUser};
use crate::dtos::{
    AutoMatchingResultsDTO, CreateEventDTO, CreateEventResponse, DeclineResponse, EventDTO,
    EventDetailDTO, EventsQuery, InvitationDTO, MatchedUserDTO,
};
use crate::entities::EventSnapshot;
use crate::matching::MatchParams;
use axum::{
    Extension,
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

const DEFAULT_LIST_LIMIT: usize = 50;
const MAX_LIST_LIMIT: usize = 200;

async fn load_event(state: &AppState, event_id: i32) -> Result<EventSnapshot, AppError> {
    state.ports.events.read_event(event_id).await?.ok_or_else(|| {
        warn!("Event {} not found", event_id);
        AppError::not_found("Event not found")
    })
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id, auto_matching = body.auto_matching_enabled))]
pub async fn create_event(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<AuthUser>,
    Json(body): Json<CreateEventDTO>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Creating new event");
    // 1. Validate the body
    // 2. The caller becomes the host, so it must exist
    // 3. Persist event, host attendance and direct invitations in one unit
    // 4. When requested, run auto-matching; its failure never fails creation
    body.validate()?;

    if state
        .ports
        .users
        .read_user(current_user.user_id)
        .await?
        .is_none()
    {
        warn!("Host {} not found", current_user.user_id);
        return Err(AppError::not_found("Host not found"));
    }

    let new_event = body.into_new_event(current_user.user_id);
    let snapshot = state.ports.event_writer.create_event(&new_event).await?;
    let event_id = snapshot.event.event_id;
    info!("Event {} created", event_id);

    let auto_matching_results = if snapshot.event.auto_matching_enabled {
        let params = MatchParams::from_settings(state.engine.settings());
        // a shutdown cancels the run, never the creation
        let token = state.shutdown.child_token();
        let summary = state
            .engine
            .auto_match_on_create(&snapshot, &params, &token)
            .await;
        AutoMatchingResultsDTO {
            enabled: true,
            invites_sent: summary.invites_sent,
            matched_users: summary.matched.into_iter().map(MatchedUserDTO::from).collect(),
            error: summary.error,
        }
    } else {
        AutoMatchingResultsDTO::default()
    };

    Ok((
        StatusCode::CREATED,
        Json(CreateEventResponse {
            event_id,
            event: EventDTO::from(snapshot.event),
            auto_matching_results,
        }),
    ))
}

#[instrument(skip(state, current_user, query), fields(user_id = %current_user.user_id))]
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<AuthUser>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<Vec<EventDTO>>, AppError> {
    debug!("Listing upcoming events");
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);

    let events = state
        .ports
        .events
        .list_visible(current_user.user_id, Utc::now(), limit)
        .await?;

    info!("Found {} visible events", events.len());
    Ok(Json(events.into_iter().map(EventDTO::from).collect()))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id, event_id = %event_id))]
pub async fn get_event(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<AuthUser>,
    Path(event_id): Path<i32>,
) -> Result<Json<EventDetailDTO>, AppError> {
    debug!("Fetching event");
    let snapshot = load_event(&state, event_id).await?;
    if !snapshot.event.is_public && !snapshot.is_member(current_user.user_id) {
        warn!("User is not allowed to see private event");
        return Err(AppError::forbidden("This event is private"));
    }
    Ok(Json(EventDetailDTO::from(snapshot)))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id, event_id = %event_id))]
pub async fn list_event_invitations(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<AuthUser>,
    Path(event_id): Path<i32>,
) -> Result<Json<Vec<InvitationDTO>>, AppError> {
    debug!("Listing invitations");
    let snapshot = load_event(&state, event_id).await?;
    if !snapshot.event.is_public && !snapshot.is_member(current_user.user_id) {
        warn!("User is not allowed to see private event");
        return Err(AppError::forbidden("This event is private"));
    }

    let invitations = state.ports.invitations.list_invitations(event_id).await?;
    info!("Found {} invitations", invitations.len());
    Ok(Json(invitations.into_iter().map(InvitationDTO::from).collect()))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id, event_id = %event_id))]
pub async fn decline_event(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<AuthUser>,
    Path(event_id): Path<i32>,
) -> Result<Json<DeclineResponse>, AppError> {
    debug!("Declining event");
    // 1. The event must exist
    // 2. The host cannot decline its own event
    // 3. Record the decline; repeating it is not an error
    let snapshot = load_event(&state, event_id).await?;
    if snapshot.event.host_id == current_user.user_id {
        warn!("Host tried to decline own event");
        return Err(AppError::bad_request("The host cannot decline its own event"));
    }

    let recorded = state
        .ports
        .declines
        .record_decline(current_user.user_id, event_id)
        .await?;

    if recorded {
        info!("Decline recorded");
    } else {
        debug!("Decline already on record");
    }
    Ok(Json(DeclineResponse { event_id, recorded }))
}
