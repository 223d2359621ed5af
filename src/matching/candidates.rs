//! Candidate source and per-candidate data gathering

use super::signals::CandidateContext;
use crate::entities::{EventSnapshot, User};
use crate::repositories::{Ports, StoreError};
use chrono::Utc;
use std::collections::HashSet;
use tracing::{debug, warn};

/// How many history entries are read per candidate
pub const HISTORY_LIMIT: usize = 50;

/// Streams the users eligible for an event in bounded batches.
///
/// Excluded: the host, attendees, anyone already invited, anyone who declined
/// the event, users who did not opt in, plus any caller-supplied ids. The
/// exclusion is applied in the query and checked again on every batch.
pub struct CandidateSource {
    ports: Ports,
    exclude: HashSet<i32>,
    seen: HashSet<i32>,
    cursor: Option<i32>,
    batch_size: usize,
    exhausted: bool,
}

impl CandidateSource {
    pub async fn prepare(
        ports: &Ports,
        snapshot: &EventSnapshot,
        extra_exclude: &HashSet<i32>,
        batch_size: usize,
    ) -> Result<Self, StoreError> {
        let declined = ports
            .declines
            .declined_user_ids(snapshot.event.event_id)
            .await?;

        let mut exclude: HashSet<i32> = extra_exclude.clone();
        exclude.insert(snapshot.event.host_id);
        exclude.extend(snapshot.attendees.iter().copied());
        exclude.extend(snapshot.invited_ids());
        exclude.extend(declined);

        debug!(
            "Candidate source for event {} excludes {} users",
            snapshot.event.event_id,
            exclude.len()
        );

        Ok(Self {
            ports: ports.clone(),
            exclude,
            seen: HashSet::new(),
            cursor: None,
            batch_size: batch_size.max(1),
            exhausted: false,
        })
    }

    /// Next batch of eligible users, `None` once the population is exhausted
    pub async fn next_batch(&mut self) -> Result<Option<Vec<User>>, StoreError> {
        if self.exhausted {
            return Ok(None);
        }

        let users = self
            .ports
            .users
            .find_candidates(&self.exclude, self.cursor, self.batch_size)
            .await?;

        if users.len() < self.batch_size {
            self.exhausted = true;
        }
        if users.is_empty() {
            return Ok(None);
        }
        self.cursor = users.iter().map(|u| u.user_id).max().max(self.cursor);

        let batch: Vec<User> = users
            .into_iter()
            .filter(|u| u.profile.auto_invite_enabled && !self.exclude.contains(&u.user_id))
            .filter(|u| self.seen.insert(u.user_id))
            .collect();

        debug!("Fetched candidate batch of {} users", batch.len());
        Ok(Some(batch))
    }
}

/// Reads friends, location, reputation and history for one candidate.
///
/// A failing port contributes its empty value so the signals depending on it
/// score 0.
pub async fn gather_context(ports: &Ports, user_id: i32) -> CandidateContext {
    let now = Utc::now();
    let (friends, location, reputation, history) = futures::join!(
        ports.friendships.friends_of(user_id),
        ports.locations.last_known_location(user_id),
        ports.reputation.reputation(user_id),
        ports.history.history(user_id, now, HISTORY_LIMIT),
    );

    CandidateContext {
        friends: friends.unwrap_or_else(|e| {
            warn!("Friends unavailable for user {}: {}", user_id, e);
            HashSet::new()
        }),
        location: location.unwrap_or_else(|e| {
            warn!("Location unavailable for user {}: {}", user_id, e);
            None
        }),
        reputation: reputation.unwrap_or_else(|e| {
            warn!("Reputation unavailable for user {}: {}", user_id, e);
            None
        }),
        history: history.unwrap_or_else(|e| {
            warn!("History unavailable for user {}: {}", user_id, e);
            Vec::new()
        }),
    }
}
