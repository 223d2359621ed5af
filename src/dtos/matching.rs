//! Auto-match DTOs

use crate::matching::{ScoreBreakdown, ScoredCandidate};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Body of `POST /events/auto-match`
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct AutoMatchRequestDTO {
    pub event_id: String,
    #[validate(range(min = 0, max = 100, message = "max_invites must be between 0 and 100"))]
    pub max_invites: Option<i64>,
    #[validate(range(min = 0.0, message = "min_score must not be negative"))]
    pub min_score: Option<f64>,
    #[serde(default)]
    pub potentials_only: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MatchedUserDTO {
    pub user_id: i32,
    pub username: String,
    pub score: f64,
    pub matching_interests: Vec<String>,
    pub score_breakdown: ScoreBreakdown,
}

impl From<ScoredCandidate> for MatchedUserDTO {
    fn from(value: ScoredCandidate) -> Self {
        Self {
            user_id: value.user_id,
            username: value.username,
            score: (value.total_score * 100.0).round() / 100.0,
            matching_interests: value.matching_interests,
            score_breakdown: value.breakdown,
        }
    }
}

/// `auto_matching_results` object of the create-event response
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct AutoMatchingResultsDTO {
    pub enabled: bool,
    pub invites_sent: usize,
    pub matched_users: Vec<MatchedUserDTO>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AutoMatchResponse {
    pub invites_sent: usize,
    pub matched_users: Vec<MatchedUserDTO>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PotentialMatchesResponse {
    pub potential_matches: Vec<MatchedUserDTO>,
    pub total_potential_matches: usize,
    pub event_id: i32,
    pub event_title: String,
}
