//! Event entity and the records derived from a user's event history

use super::enums::EventType;
use super::invitation::Invitation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Point on the earth's surface, decimal degrees
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Event {
    pub event_id: i32,
    pub title: String,
    pub description: String,
    pub host_id: i32,
    pub location: GeoPoint,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub is_public: bool,
    pub event_type: EventType,
    pub max_participants: i32,
    pub auto_matching_enabled: bool,
    pub interest_tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// An event together with the membership sets the matcher must honor.
///
/// Read once per auto-match call; nothing holds a lock on it afterwards.
#[derive(Debug, Clone)]
pub struct EventSnapshot {
    pub event: Event,
    pub attendees: HashSet<i32>,
    pub invitations: Vec<Invitation>,
}

impl EventSnapshot {
    pub fn invited_ids(&self) -> HashSet<i32> {
        self.invitations.iter().map(|i| i.user_id).collect()
    }

    pub fn is_member(&self, user_id: i32) -> bool {
        user_id == self.event.host_id
            || self.attendees.contains(&user_id)
            || self.invitations.iter().any(|i| i.user_id == user_id)
    }
}

/// One past or upcoming event a user hosted or attended
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub event_type: EventType,
    pub starts_at: DateTime<Utc>,
    pub location: GeoPoint,
}

/// Aggregates maintained by the rating subsystem
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, sqlx::FromRow)]
pub struct ReputationStats {
    pub total_ratings: i32,
    pub average_rating: f64,
    pub trust_level: i32,
    pub events_hosted: i32,
    pub events_attended: i32,
}
