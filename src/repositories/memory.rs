//! MemoryStore - every storage port over in-process collections
//!
//! Used as the test double for the engine and the HTTP layer. Writes follow
//! the same all-or-nothing and ignore-conflict rules as the MySQL
//! repositories. Locks are never held across an await point.

use super::{
    DeclineStore, EventReader, EventWriter, FriendshipReader, HistoryReader,
    InvitationWriteOutcome, InvitationWriter, LocationReader, NewEvent, ReputationReader,
    StoreError, UserReader,
};
use crate::entities::{
    Decline, Event, EventSnapshot, GeoPoint, HistoryEntry, Invitation, ReputationStats, User,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct MemoryData {
    users: BTreeMap<i32, User>,
    // unordered pairs stored as (low, high)
    friendships: BTreeSet<(i32, i32)>,
    reputation: HashMap<i32, ReputationStats>,
    events: BTreeMap<i32, Event>,
    attendees: HashMap<i32, BTreeSet<i32>>,
    invitations: Vec<Invitation>,
    declines: Vec<Decline>,
    next_event_id: i32,
    fail_writes: bool,
}

impl MemoryData {
    fn snapshot(&self, event_id: i32) -> Option<EventSnapshot> {
        let event = self.events.get(&event_id)?.clone();
        Some(EventSnapshot {
            attendees: self
                .attendees
                .get(&event_id)
                .map(|a| a.iter().copied().collect())
                .unwrap_or_default(),
            invitations: self
                .invitations
                .iter()
                .filter(|i| i.event_id == event_id)
                .cloned()
                .collect(),
            event,
        })
    }

    fn has_invitation(&self, event_id: i32, user_id: i32) -> bool {
        self.invitations
            .iter()
            .any(|i| i.event_id == event_id && i.user_id == user_id)
    }

    /// Events hosted or attended by `user_id`, newest first
    fn participations(&self, user_id: i32) -> Vec<&Event> {
        let mut events: Vec<&Event> = self
            .events
            .values()
            .filter(|e| {
                e.host_id == user_id
                    || self
                        .attendees
                        .get(&e.event_id)
                        .is_some_and(|a| a.contains(&user_id))
            })
            .collect();
        events.sort_by(|a, b| {
            b.starts_at
                .cmp(&a.starts_at)
                .then(b.event_id.cmp(&a.event_id))
        });
        events
    }
}

pub struct MemoryStore {
    data: RwLock<MemoryData>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(MemoryData {
                next_event_id: 1,
                ..MemoryData::default()
            }),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryData>, StoreError> {
        self.data
            .read()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryData>, StoreError> {
        self.data
            .write()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned"))
    }

    // ********************* SEEDING **********************//

    pub fn insert_user(&self, user: User) {
        if let Ok(mut data) = self.write() {
            data.users.insert(user.user_id, user);
        }
    }

    pub fn remove_user(&self, user_id: i32) {
        if let Ok(mut data) = self.write() {
            data.users.remove(&user_id);
        }
    }

    pub fn add_friendship(&self, a: i32, b: i32) {
        if a == b {
            return;
        }
        if let Ok(mut data) = self.write() {
            data.friendships.insert((a.min(b), a.max(b)));
        }
    }

    pub fn set_reputation(&self, user_id: i32, stats: ReputationStats) {
        if let Ok(mut data) = self.write() {
            data.reputation.insert(user_id, stats);
        }
    }

    /// Stores a fully formed event; the host is always added as attendee.
    /// A zero `event_id` gets the next free id. Returns the id used.
    pub fn insert_event(&self, mut event: Event) -> i32 {
        let Ok(mut data) = self.write() else {
            return event.event_id;
        };
        if event.event_id == 0 {
            event.event_id = data.next_event_id;
        }
        data.next_event_id = data.next_event_id.max(event.event_id + 1);
        let event_id = event.event_id;
        data.attendees
            .entry(event_id)
            .or_default()
            .insert(event.host_id);
        data.events.insert(event_id, event);
        event_id
    }

    pub fn add_attendee(&self, event_id: i32, user_id: i32) {
        if let Ok(mut data) = self.write() {
            data.attendees.entry(event_id).or_default().insert(user_id);
        }
    }

    /// Inserts a host-issued invitation (`is_auto_matched = false`)
    pub fn insert_direct_invitation(&self, event_id: i32, user_id: i32) {
        if let Ok(mut data) = self.write() {
            if !data.has_invitation(event_id, user_id) {
                data.invitations.push(Invitation {
                    event_id,
                    user_id,
                    is_auto_matched: false,
                    created_at: Utc::now(),
                });
            }
        }
    }

    /// Makes every subsequent write fail, to exercise rollback paths
    pub fn set_fail_writes(&self, fail: bool) {
        if let Ok(mut data) = self.write() {
            data.fail_writes = fail;
        }
    }

    pub fn invitation_count(&self, event_id: i32) -> usize {
        self.read()
            .map(|d| d.invitations.iter().filter(|i| i.event_id == event_id).count())
            .unwrap_or(0)
    }

    pub fn auto_invitation_count(&self, event_id: i32) -> usize {
        self.read()
            .map(|d| {
                d.invitations
                    .iter()
                    .filter(|i| i.event_id == event_id && i.is_auto_matched)
                    .count()
            })
            .unwrap_or(0)
    }
}

#[async_trait]
impl UserReader for MemoryStore {
    async fn read_user(&self, user_id: i32) -> Result<Option<User>, StoreError> {
        Ok(self.read()?.users.get(&user_id).cloned())
    }

    async fn find_candidates(
        &self,
        exclude: &HashSet<i32>,
        after_id: Option<i32>,
        limit: usize,
    ) -> Result<Vec<User>, StoreError> {
        let data = self.read()?;
        let lower = after_id.map_or(std::ops::Bound::Unbounded, std::ops::Bound::Excluded);
        Ok(data
            .users
            .range((lower, std::ops::Bound::Unbounded))
            .map(|(_, user)| user)
            .filter(|u| u.profile.auto_invite_enabled && !exclude.contains(&u.user_id))
            .take(limit)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl EventReader for MemoryStore {
    async fn read_event(&self, event_id: i32) -> Result<Option<EventSnapshot>, StoreError> {
        Ok(self.read()?.snapshot(event_id))
    }

    async fn list_visible(
        &self,
        viewer_id: i32,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Event>, StoreError> {
        let data = self.read()?;
        let declined: HashSet<i32> = data
            .declines
            .iter()
            .filter(|d| d.user_id == viewer_id)
            .map(|d| d.event_id)
            .collect();
        let mut events: Vec<Event> = data
            .events
            .values()
            .filter(|e| e.is_public && e.starts_at > now && !declined.contains(&e.event_id))
            .cloned()
            .collect();
        events.sort_by(|a, b| a.starts_at.cmp(&b.starts_at).then(a.event_id.cmp(&b.event_id)));
        events.truncate(limit);
        Ok(events)
    }
}

#[async_trait]
impl EventWriter for MemoryStore {
    async fn create_event(&self, new: &NewEvent) -> Result<EventSnapshot, StoreError> {
        let mut data = self.write()?;
        if data.fail_writes {
            return Err(StoreError::Unavailable("writes disabled"));
        }
        let now = Utc::now();
        let event_id = data.next_event_id;
        data.next_event_id += 1;

        data.events.insert(
            event_id,
            Event {
                event_id,
                title: new.title.clone(),
                description: new.description.clone(),
                host_id: new.host_id,
                location: new.location,
                starts_at: new.starts_at,
                ends_at: new.ends_at,
                is_public: new.is_public,
                event_type: new.event_type,
                max_participants: new.max_participants,
                auto_matching_enabled: new.auto_matching_enabled,
                interest_tags: new.interest_tags.clone(),
                created_at: now,
            },
        );
        data.attendees
            .entry(event_id)
            .or_default()
            .insert(new.host_id);

        for &user_id in &new.direct_invitees {
            if user_id == new.host_id
                || !data.users.contains_key(&user_id)
                || data.has_invitation(event_id, user_id)
            {
                continue;
            }
            data.invitations.push(Invitation {
                event_id,
                user_id,
                is_auto_matched: false,
                created_at: now,
            });
        }

        data.snapshot(event_id)
            .ok_or(StoreError::NotFound("event"))
    }
}

#[async_trait]
impl FriendshipReader for MemoryStore {
    async fn friends_of(&self, user_id: i32) -> Result<HashSet<i32>, StoreError> {
        Ok(self
            .read()?
            .friendships
            .iter()
            .filter_map(|&(low, high)| match user_id {
                id if id == low => Some(high),
                id if id == high => Some(low),
                _ => None,
            })
            .collect())
    }
}

#[async_trait]
impl ReputationReader for MemoryStore {
    async fn reputation(&self, user_id: i32) -> Result<Option<ReputationStats>, StoreError> {
        Ok(self.read()?.reputation.get(&user_id).cloned())
    }
}

#[async_trait]
impl LocationReader for MemoryStore {
    async fn last_known_location(&self, user_id: i32) -> Result<Option<GeoPoint>, StoreError> {
        let data = self.read()?;
        let participations = data.participations(user_id);
        let hosted = participations.iter().find(|e| e.host_id == user_id);
        Ok(hosted
            .or_else(|| participations.first())
            .map(|e| e.location))
    }
}

#[async_trait]
impl HistoryReader for MemoryStore {
    async fn history(
        &self,
        user_id: i32,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, StoreError> {
        let data = self.read()?;
        // participations are newest first, so the upcoming ones are reversed
        let (past, mut upcoming): (Vec<&Event>, Vec<&Event>) = data
            .participations(user_id)
            .into_iter()
            .partition(|e| e.starts_at <= now);
        upcoming.reverse();

        Ok(past
            .into_iter()
            .chain(upcoming)
            .take(limit)
            .map(|e| HistoryEntry {
                event_type: e.event_type,
                starts_at: e.starts_at,
                location: e.location,
            })
            .collect())
    }
}

#[async_trait]
impl DeclineStore for MemoryStore {
    async fn declined_user_ids(&self, event_id: i32) -> Result<HashSet<i32>, StoreError> {
        Ok(self
            .read()?
            .declines
            .iter()
            .filter(|d| d.event_id == event_id)
            .map(|d| d.user_id)
            .collect())
    }

    async fn record_decline(&self, user_id: i32, event_id: i32) -> Result<bool, StoreError> {
        let mut data = self.write()?;
        if data.fail_writes {
            return Err(StoreError::Unavailable("writes disabled"));
        }
        if data
            .declines
            .iter()
            .any(|d| d.user_id == user_id && d.event_id == event_id)
        {
            return Ok(false);
        }
        data.declines.push(Decline {
            user_id,
            event_id,
            declined_at: Utc::now(),
        });
        Ok(true)
    }
}

#[async_trait]
impl InvitationWriter for MemoryStore {
    async fn write_auto_invitations(
        &self,
        event_id: i32,
        user_ids: &[i32],
    ) -> Result<InvitationWriteOutcome, StoreError> {
        let mut data = self.write()?;
        if data.fail_writes {
            return Err(StoreError::Unavailable("writes disabled"));
        }
        let host_id = data
            .events
            .get(&event_id)
            .map(|e| e.host_id)
            .ok_or(StoreError::NotFound("event"))?;

        let mut blocked: HashSet<i32> = data
            .declines
            .iter()
            .filter(|d| d.event_id == event_id)
            .map(|d| d.user_id)
            .collect();
        if let Some(attendees) = data.attendees.get(&event_id) {
            blocked.extend(attendees.iter().copied());
        }
        blocked.insert(host_id);

        // stage everything first, then apply in one step
        let now = Utc::now();
        let mut outcome = InvitationWriteOutcome::default();
        let mut staged = Vec::new();
        for &user_id in user_ids {
            if blocked.contains(&user_id) || !data.users.contains_key(&user_id) {
                outcome.rejected.push(user_id);
            } else if data.has_invitation(event_id, user_id) || staged.contains(&user_id) {
                outcome.conflicts.push(user_id);
            } else {
                staged.push(user_id);
            }
        }

        data.invitations.extend(staged.iter().map(|&user_id| Invitation {
            event_id,
            user_id,
            is_auto_matched: true,
            created_at: now,
        }));
        outcome.created = staged;
        Ok(outcome)
    }

    async fn list_invitations(&self, event_id: i32) -> Result<Vec<Invitation>, StoreError> {
        Ok(self
            .read()?
            .invitations
            .iter()
            .filter(|i| i.event_id == event_id)
            .cloned()
            .collect())
    }
}
