//! Storage ports
//!
//! The matching engine only ever talks to storage through these traits, so it
//! can run against MySQL in production and against [`MemoryStore`] in tests.
//! Every port is object safe and shared as `Arc<dyn Port>`.
//!
//! [`MemoryStore`]: super::MemoryStore

use super::StoreError;
use crate::entities::{
    Event, EventSnapshot, EventType, GeoPoint, HistoryEntry, Invitation, ReputationStats, User,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Read access to users and their profiles
#[async_trait]
pub trait UserReader: Send + Sync {
    /// Reads a user by primary key
    ///
    /// # Returns
    /// * `Ok(Some(User))` - user found, profile attached (defaults when the
    ///   profile row is missing)
    /// * `Ok(None)` - no user with that id
    async fn read_user(&self, user_id: i32) -> Result<Option<User>, StoreError>;

    /// Returns up to `limit` users with `auto_invite_enabled`, whose id is
    /// greater than `after_id` and not contained in `exclude`, ascending by id.
    ///
    /// Ascending ids are only used as a pagination cursor; callers must not
    /// attach any meaning to the order.
    async fn find_candidates(
        &self,
        exclude: &HashSet<i32>,
        after_id: Option<i32>,
        limit: usize,
    ) -> Result<Vec<User>, StoreError>;
}

/// Read access to events
#[async_trait]
pub trait EventReader: Send + Sync {
    /// Reads an event together with its attendees and invitation records
    async fn read_event(&self, event_id: i32) -> Result<Option<EventSnapshot>, StoreError>;

    /// Upcoming public events, hiding the ones `viewer_id` declined
    async fn list_visible(
        &self,
        viewer_id: i32,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Event>, StoreError>;
}

/// Data required to persist a new event
#[derive(Debug, Clone)]
pub struct NewEvent {
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
    /// Users invited directly by the host (`is_auto_matched = false`)
    pub direct_invitees: Vec<i32>,
}

#[async_trait]
pub trait EventWriter: Send + Sync {
    /// Inserts the event, adds the host as attendee and records the direct
    /// invitations, all in one transaction. Unknown invitees and the host
    /// itself are skipped.
    async fn create_event(&self, data: &NewEvent) -> Result<EventSnapshot, StoreError>;
}

/// Symmetric friendship relation
#[async_trait]
pub trait FriendshipReader: Send + Sync {
    async fn friends_of(&self, user_id: i32) -> Result<HashSet<i32>, StoreError>;
}

#[async_trait]
pub trait ReputationReader: Send + Sync {
    async fn reputation(&self, user_id: i32) -> Result<Option<ReputationStats>, StoreError>;
}

#[async_trait]
pub trait LocationReader: Send + Sync {
    /// Most recent known position: the point of the latest hosted event,
    /// else of the latest attended event, else `None`.
    async fn last_known_location(&self, user_id: i32) -> Result<Option<GeoPoint>, StoreError>;
}

#[async_trait]
pub trait HistoryReader: Send + Sync {
    /// Events the user hosted or attended, at most `limit`.
    ///
    /// Events started at or before `now` come first, newest first, so a
    /// crowded calendar never pushes the past out of the window. Upcoming
    /// events follow, soonest first.
    async fn history(
        &self,
        user_id: i32,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, StoreError>;
}

#[async_trait]
pub trait DeclineStore: Send + Sync {
    async fn declined_user_ids(&self, event_id: i32) -> Result<HashSet<i32>, StoreError>;

    /// Records a decline. Returns `false` when it was already recorded.
    async fn record_decline(&self, user_id: i32, event_id: i32) -> Result<bool, StoreError>;
}

/// Result of one auto-invitation write unit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvitationWriteOutcome {
    /// Newly invited users, in the order they were submitted
    pub created: Vec<i32>,
    /// Users that already had an invitation for the event
    pub conflicts: Vec<i32>,
    /// Users refused by the write-time membership and decline check, or
    /// deleted since they were read
    pub rejected: Vec<i32>,
}

#[async_trait]
pub trait InvitationWriter: Send + Sync {
    /// Links every user to the event with `is_auto_matched = true`, in order,
    /// inside a single transaction. Existing invitations are left untouched
    /// and reported as conflicts. Any storage error aborts the whole unit.
    async fn write_auto_invitations(
        &self,
        event_id: i32,
        user_ids: &[i32],
    ) -> Result<InvitationWriteOutcome, StoreError>;

    /// Invitations of an event in the order they were written
    async fn list_invitations(&self, event_id: i32) -> Result<Vec<Invitation>, StoreError>;
}
