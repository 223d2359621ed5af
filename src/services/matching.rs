//! Matching services - explicit auto-match

use crate::core::{AppError, AppState, AuthUser};
use crate::dtos::{AutoMatchRequestDTO, AutoMatchResponse, MatchedUserDTO, PotentialMatchesResponse};
use crate::matching::{MatchOutcome, MatchParams};
use axum::{
    Extension,
    extract::{Json, State},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id, event_id = %body.event_id, potentials_only = body.potentials_only))]
pub async fn auto_match(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<AuthUser>,
    Json(body): Json<AutoMatchRequestDTO>,
) -> Result<Response, AppError> {
    debug!("Explicit auto-match requested");
    // 1. Validate the body and parse the event id
    // 2. Only the host may trigger matching for its event
    // 3. Run the pipeline, writing invitations unless potentials_only is set
    body.validate()?;

    let event_id: i32 = body.event_id.trim().parse().map_err(|_| {
        warn!("Malformed event id");
        AppError::bad_request("Invalid event_id").with_details("event_id must be an integer id")
    })?;

    let snapshot = state
        .ports
        .events
        .read_event(event_id)
        .await?
        .ok_or_else(|| {
            warn!("Event not found");
            AppError::not_found("Event not found")
        })?;

    if snapshot.event.host_id != current_user.user_id {
        warn!("Caller is not the host of the event");
        return Err(AppError::forbidden("Only the host can run auto-matching"));
    }

    let defaults = state.engine.settings();
    let params = MatchParams {
        max_invites: body
            .max_invites
            .map(|v| v as usize)
            .unwrap_or(defaults.default_max_invites),
        min_score: body.min_score.unwrap_or(defaults.default_min_score),
        ..MatchParams::from_settings(defaults)
    };

    let token = state.shutdown.child_token();
    let outcome = state
        .engine
        .auto_match_explicit(event_id, &params, body.potentials_only, &token)
        .await?;

    let response = match outcome {
        MatchOutcome::Invited(summary) => {
            info!("Auto-match sent {} invitations", summary.invites_sent);
            Json(AutoMatchResponse {
                invites_sent: summary.invites_sent,
                matched_users: summary.matched.into_iter().map(MatchedUserDTO::from).collect(),
            })
            .into_response()
        }
        MatchOutcome::Potentials {
            event_id,
            event_title,
            matches,
        } => {
            info!("Auto-match found {} potential matches", matches.len());
            Json(PotentialMatchesResponse {
                total_potential_matches: matches.len(),
                potential_matches: matches.into_iter().map(MatchedUserDTO::from).collect(),
                event_id,
                event_title,
            })
            .into_response()
        }
    };

    Ok(response)
}
