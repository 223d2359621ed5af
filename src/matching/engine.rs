//! Auto-match orchestrator
//!
//! Wires candidate source, signal extraction, scorer and writer together and
//! exposes the two entry points used by the HTTP layer:
//! [`MatchEngine::auto_match_on_create`] and [`MatchEngine::auto_match_explicit`].

use super::candidates::{CandidateSource, gather_context};
use super::error::MatchError;
use super::scorer::{ScoredCandidate, Scorer, Weights};
use super::signals::{CandidateFeatures, EventFeatures, extract};
use super::writer::AutoInviter;
use crate::entities::{EventSnapshot, User};
use crate::notifications::Notifier;
use crate::repositories::Ports;
use chrono::Utc;
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, timeout_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Upper bound accepted for `max_invites`
pub const MAX_INVITES_LIMIT: usize = 100;

/// Engine-wide defaults, built from the service configuration
#[derive(Debug, Clone)]
pub struct MatchSettings {
    pub default_max_invites: usize,
    pub default_min_score: f64,
    pub batch_size: usize,
    pub deadline: Duration,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            default_max_invites: 10,
            default_min_score: 30.0,
            batch_size: 100,
            deadline: Duration::from_millis(5000),
        }
    }
}

/// Per-call parameters
#[derive(Debug, Clone, PartialEq)]
pub struct MatchParams {
    pub max_invites: usize,
    pub min_score: f64,
    /// Users the caller wants left out on top of the built-in exclusions
    pub exclude: HashSet<i32>,
}

impl MatchParams {
    pub fn from_settings(settings: &MatchSettings) -> Self {
        Self {
            max_invites: settings.default_max_invites,
            min_score: settings.default_min_score,
            exclude: HashSet::new(),
        }
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        if self.max_invites > MAX_INVITES_LIMIT {
            return Err(MatchError::InvalidParameters(format!(
                "max_invites must be at most {MAX_INVITES_LIMIT}"
            )));
        }
        if !self.min_score.is_finite() || self.min_score < 0.0 {
            return Err(MatchError::InvalidParameters(
                "min_score must be a non-negative number".to_string(),
            ));
        }
        Ok(())
    }
}

/// Result of a pipeline run that wrote invitations
#[derive(Debug, Clone, Default)]
pub struct AutoMatchSummary {
    pub invites_sent: usize,
    /// Newly invited users in rank order
    pub matched: Vec<ScoredCandidate>,
    /// Set when matching failed; the event itself is unaffected
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub enum MatchOutcome {
    Invited(AutoMatchSummary),
    Potentials {
        event_id: i32,
        event_title: String,
        matches: Vec<ScoredCandidate>,
    },
}

pub struct MatchEngine {
    ports: Ports,
    inviter: AutoInviter,
    settings: MatchSettings,
    weights: Weights,
}

impl MatchEngine {
    pub fn new(ports: Ports, notifier: Arc<dyn Notifier>, settings: MatchSettings) -> Self {
        Self {
            inviter: AutoInviter::new(ports.invitations.clone(), notifier),
            ports,
            settings,
            weights: Weights::DEFAULT,
        }
    }

    pub fn settings(&self) -> &MatchSettings {
        &self.settings
    }

    /// Runs matching for a freshly created event.
    ///
    /// Never fails: any error, cancellation included, is logged and reported
    /// in the summary with zero invites, so event creation is not affected.
    #[instrument(skip(self, snapshot, params, token), fields(event_id = %snapshot.event.event_id))]
    pub async fn auto_match_on_create(
        &self,
        snapshot: &EventSnapshot,
        params: &MatchParams,
        token: &CancellationToken,
    ) -> AutoMatchSummary {
        let result = match params.validate() {
            Ok(()) => self.run_and_write(snapshot, params, token).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(summary) => summary,
            Err(MatchError::Cancelled) => {
                warn!("Auto-match on create cancelled, event kept without invitations");
                AutoMatchSummary {
                    invites_sent: 0,
                    matched: Vec::new(),
                    error: Some(MatchError::Cancelled.to_string()),
                }
            }
            Err(e) => {
                error!("Auto-match on create failed: {}", e);
                AutoMatchSummary {
                    invites_sent: 0,
                    matched: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Runs matching for an existing event.
    ///
    /// With `potentials_only` the ranked list is returned and nothing is
    /// written. Cancelling `token` before the write commits leaves storage
    /// untouched.
    #[instrument(skip(self, params, token))]
    pub async fn auto_match_explicit(
        &self,
        event_id: i32,
        params: &MatchParams,
        potentials_only: bool,
        token: &CancellationToken,
    ) -> Result<MatchOutcome, MatchError> {
        params.validate()?;

        let snapshot = self
            .ports
            .events
            .read_event(event_id)
            .await?
            .ok_or(MatchError::EventNotFound(event_id))?;

        if potentials_only {
            let cap = capacity(params.max_invites, snapshot.event.max_participants);
            let matches = self.rank(&snapshot, params, cap, token).await?;
            info!("Found {} potential matches", matches.len());
            return Ok(MatchOutcome::Potentials {
                event_id: snapshot.event.event_id,
                event_title: snapshot.event.title.clone(),
                matches,
            });
        }

        self.run_and_write(&snapshot, params, token)
            .await
            .map(MatchOutcome::Invited)
    }

    async fn run_and_write(
        &self,
        snapshot: &EventSnapshot,
        params: &MatchParams,
        token: &CancellationToken,
    ) -> Result<AutoMatchSummary, MatchError> {
        // earlier runs count against the same budget, so repeated calls
        // cannot grow the auto-matched set past the cap
        let already = snapshot
            .invitations
            .iter()
            .filter(|i| i.is_auto_matched)
            .count();
        let budget = capacity(params.max_invites, snapshot.event.max_participants)
            .saturating_sub(already);

        if budget == 0 {
            info!("No invitation budget left ({} auto-matched already)", already);
            return Ok(AutoMatchSummary::default());
        }

        let ranked = self.rank(snapshot, params, budget, token).await?;

        if token.is_cancelled() {
            warn!("Cancelled before writing invitations");
            return Err(MatchError::Cancelled);
        }

        let report = self.inviter.write(&snapshot.event, &ranked).await?;
        Ok(AutoMatchSummary {
            invites_sent: report.invited.len(),
            matched: report.invited,
            error: None,
        })
    }

    /// Scores the whole candidate population and returns the best `cap`
    /// candidates at or above `min_score`.
    ///
    /// Batches still being gathered when the deadline passes are dropped and
    /// whatever was scored so far is ranked.
    async fn rank(
        &self,
        snapshot: &EventSnapshot,
        params: &MatchParams,
        cap: usize,
        token: &CancellationToken,
    ) -> Result<Vec<ScoredCandidate>, MatchError> {
        if cap == 0 {
            return Ok(Vec::new());
        }

        let deadline = Instant::now() + self.settings.deadline;
        let scorer = Scorer::new(self.weights, params.min_score);
        let features = self.event_features(snapshot).await;

        if features.tag_count() == 0 {
            debug!("Event has no interest tags, interest signals will be 0");
        }

        let mut source = CandidateSource::prepare(
            &self.ports,
            snapshot,
            &params.exclude,
            self.settings.batch_size,
        )
        .await?;

        let mut scored: Vec<ScoredCandidate> = Vec::new();
        let mut seen = 0usize;

        loop {
            if token.is_cancelled() {
                warn!("Auto-match cancelled while scoring");
                return Err(MatchError::Cancelled);
            }

            let step = async {
                let Some(batch) = source.next_batch().await? else {
                    return Ok::<_, MatchError>(None);
                };
                let contexts =
                    join_all(batch.iter().map(|u| gather_context(&self.ports, u.user_id))).await;
                Ok(Some(batch.into_iter().zip(contexts).collect::<Vec<_>>()))
            };

            let gathered = tokio::select! {
                _ = token.cancelled() => {
                    warn!("Auto-match cancelled while gathering candidates");
                    return Err(MatchError::Cancelled);
                }
                res = timeout_at(deadline, step) => res,
            };

            let batch = match gathered {
                Ok(result) => match result? {
                    Some(batch) => batch,
                    None => break,
                },
                Err(_) => {
                    warn!(
                        "Deadline of {:?} reached after {} candidates, ranking partial results",
                        self.settings.deadline, seen
                    );
                    break;
                }
            };

            let now = Utc::now();
            for (user, context) in batch {
                seen += 1;
                let candidate = CandidateFeatures::new(&user, context);
                let raw = extract(&features, &candidate, now);
                let (total, breakdown) = scorer.score(&raw);
                debug!("Candidate {} scored {:.2}", user.user_id, total);
                if scorer.passes(total) {
                    scored.push(ScoredCandidate {
                        user_id: user.user_id,
                        username: user.username,
                        total_score: total,
                        interest_match: raw.interest_match,
                        matching_interests: candidate.matching_interests(&features),
                        breakdown,
                    });
                }
            }
        }

        let ranked = scorer.rank(scored, cap);
        info!(
            "Ranked {} of {} candidates (min_score {}, cap {})",
            ranked.len(),
            seen,
            scorer.min_score(),
            cap
        );
        Ok(ranked)
    }

    async fn event_features(&self, snapshot: &EventSnapshot) -> EventFeatures {
        let host_id = snapshot.event.host_id;
        let (host, friends) = futures::join!(
            self.ports.users.read_user(host_id),
            self.ports.friendships.friends_of(host_id),
        );

        let host: Option<User> = host.unwrap_or_else(|e| {
            warn!("Host {} unavailable: {}", host_id, e);
            None
        });
        let friends = friends.unwrap_or_else(|e| {
            warn!("Friends of host {} unavailable: {}", host_id, e);
            HashSet::new()
        });

        EventFeatures::new(&snapshot.event, host.as_ref(), friends)
    }
}

/// `min(max_invites, max_participants)`, with a non-positive capacity meaning none
fn capacity(max_invites: usize, max_participants: i32) -> usize {
    max_invites.min(usize::try_from(max_participants).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Event, EventType, GeoPoint, SkillLevel, UserProfile};
    use crate::notifications::NotificationHub;
    use crate::entities::{HistoryEntry, Invitation};
    use crate::repositories::{
        DeclineStore, HistoryReader, InvitationWriteOutcome, InvitationWriter, MemoryStore,
        StoreError,
    };
    use async_trait::async_trait;
    use chrono::{DateTime, Duration as ChronoDuration};

    const HOST: i32 = 1;

    fn user(id: i32, interests: &[&str]) -> User {
        User {
            user_id: id,
            username: format!("user{id}"),
            profile: UserProfile {
                interests: interests.iter().map(|s| s.to_string()).collect(),
                auto_invite_enabled: true,
                ..UserProfile::default()
            },
        }
    }

    fn event(tags: &[&str], max_participants: i32) -> Event {
        let starts_at = Utc::now() + ChronoDuration::days(3);
        Event {
            event_id: 0,
            title: "Weekly meetup".into(),
            description: String::new(),
            host_id: HOST,
            location: GeoPoint {
                latitude: 45.0,
                longitude: 7.0,
            },
            starts_at,
            ends_at: starts_at + ChronoDuration::hours(2),
            is_public: true,
            event_type: EventType::Other,
            max_participants,
            auto_matching_enabled: true,
            interest_tags: tags.iter().map(|s| s.to_string()).collect(),
            created_at: Utc::now(),
        }
    }

    fn engine(store: &Arc<MemoryStore>) -> MatchEngine {
        MatchEngine::new(
            Ports::memory(store.clone()),
            Arc::new(NotificationHub::new()),
            MatchSettings::default(),
        )
    }

    fn params(max_invites: usize, min_score: f64) -> MatchParams {
        MatchParams {
            max_invites,
            min_score,
            exclude: HashSet::new(),
        }
    }

    async fn invite(engine: &MatchEngine, event_id: i32, p: &MatchParams) -> AutoMatchSummary {
        match engine
            .auto_match_explicit(event_id, p, false, &CancellationToken::new())
            .await
            .unwrap()
        {
            MatchOutcome::Invited(summary) => summary,
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    fn ids(matched: &[ScoredCandidate]) -> Vec<i32> {
        matched.iter().map(|c| c.user_id).collect()
    }

    #[tokio::test]
    async fn pure_interest_match_ranks_full_overlap_first() {
        let store = Arc::new(MemoryStore::new());
        store.insert_user(user(HOST, &[]));
        store.insert_user(user(2, &["Python", "ML"]));
        store.insert_user(user(3, &["python"]));
        store.insert_user(user(4, &["cooking"]));
        let event_id = store.insert_event(event(&["python", "ml"], 10));

        let summary = invite(&engine(&store), event_id, &params(10, 30.0)).await;

        assert_eq!(ids(&summary.matched), vec![2, 3]);
        assert_eq!(summary.invites_sent, 2);
        let first = &summary.matched[0];
        assert_eq!(first.interest_match, 2);
        assert_eq!(first.breakdown.interest_match, 50.0);
        assert_eq!(first.breakdown.interest_ratio, 30.0);
        assert_eq!(first.matching_interests, vec!["ML".to_string(), "Python".to_string()]);
        assert_eq!(summary.matched[1].breakdown.interest_ratio, 15.0);
    }

    #[tokio::test]
    async fn host_is_never_matched() {
        let store = Arc::new(MemoryStore::new());
        let mut host = user(HOST, &["rust", "tokio"]);
        host.profile.skills.insert("rust".into(), SkillLevel::Expert);
        store.insert_user(host);
        store.insert_user(user(2, &["rust"]));
        let event_id = store.insert_event(event(&["rust", "tokio"], 10));

        let summary = invite(&engine(&store), event_id, &params(10, 0.0)).await;
        assert_eq!(ids(&summary.matched), vec![2]);
    }

    #[tokio::test]
    async fn declined_users_stay_out_and_reruns_add_nothing() {
        let store = Arc::new(MemoryStore::new());
        store.insert_user(user(HOST, &[]));
        store.insert_user(user(2, &["chess"]));
        store.insert_user(user(3, &["chess"]));
        let event_id = store.insert_event(event(&["chess"], 10));
        store.record_decline(2, event_id).await.unwrap();

        let engine = engine(&store);
        let first = invite(&engine, event_id, &params(10, 30.0)).await;
        let second = invite(&engine, event_id, &params(10, 30.0)).await;

        assert_eq!(ids(&first.matched), vec![3]);
        assert_eq!(second.invites_sent, 0);
        assert!(second.matched.is_empty());
        assert_eq!(store.auto_invitation_count(event_id), 1);
    }

    #[tokio::test]
    async fn capacity_caps_invitations_and_keeps_the_best() {
        let store = Arc::new(MemoryStore::new());
        store.insert_user(user(HOST, &[]));
        for id in 2..=51 {
            // the lower ids get a second matching interest
            let interests: &[&str] = if id <= 6 { &["go", "k8s"] } else { &["go"] };
            store.insert_user(user(id, interests));
        }
        let event_id = store.insert_event(event(&["go", "k8s"], 5));

        let engine = engine(&store);
        let summary = invite(&engine, event_id, &params(10, 30.0)).await;

        assert_eq!(ids(&summary.matched), vec![2, 3, 4, 5, 6]);
        assert_eq!(store.auto_invitation_count(event_id), 5);

        let again = invite(&engine, event_id, &params(10, 30.0)).await;
        assert_eq!(again.invites_sent, 0);
        assert_eq!(store.auto_invitation_count(event_id), 5);
    }

    #[tokio::test]
    async fn host_friend_outranks_identical_stranger() {
        let store = Arc::new(MemoryStore::new());
        store.insert_user(user(HOST, &[]));
        store.insert_user(user(2, &["jazz"]));
        store.insert_user(user(3, &["jazz"]));
        store.add_friendship(HOST, 3);
        let event_id = store.insert_event(event(&["jazz"], 10));

        let summary = invite(&engine(&store), event_id, &params(10, 30.0)).await;
        assert_eq!(ids(&summary.matched), vec![3, 2]);
        assert!(summary.matched[0].total_score > summary.matched[1].total_score);
    }

    #[tokio::test]
    async fn potentials_only_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        store.insert_user(user(HOST, &[]));
        store.insert_user(user(2, &["hiking"]));
        let event_id = store.insert_event(event(&["hiking"], 10));

        let outcome = engine(&store)
            .auto_match_explicit(event_id, &params(10, 30.0), true, &CancellationToken::new())
            .await
            .unwrap();

        match outcome {
            MatchOutcome::Potentials {
                event_id: id,
                matches,
                ..
            } => {
                assert_eq!(id, event_id);
                assert_eq!(ids(&matches), vec![2]);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(store.invitation_count(event_id), 0);
    }

    #[tokio::test]
    async fn empty_tags_only_leave_other_signals() {
        let store = Arc::new(MemoryStore::new());
        store.insert_user(user(HOST, &[]));
        store.insert_user(user(2, &["anything"]));
        let event_id = store.insert_event(event(&[], 10));

        let outcome = engine(&store)
            .auto_match_explicit(event_id, &params(10, 0.0), true, &CancellationToken::new())
            .await
            .unwrap();
        let MatchOutcome::Potentials { matches, .. } = outcome else {
            panic!("expected potentials");
        };
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].breakdown.interest_match, 0.0);
        assert_eq!(matches[0].breakdown.interest_ratio, 0.0);
        assert!(matches[0].matching_interests.is_empty());
    }

    #[tokio::test]
    async fn zero_capacity_invites_nobody() {
        let store = Arc::new(MemoryStore::new());
        store.insert_user(user(HOST, &[]));
        store.insert_user(user(2, &["art"]));
        let event_id = store.insert_event(event(&["art"], 0));

        let summary = invite(&engine(&store), event_id, &params(10, 0.0)).await;
        assert_eq!(summary.invites_sent, 0);
        assert_eq!(store.invitation_count(event_id), 0);
    }

    #[tokio::test]
    async fn unknown_event_is_reported() {
        let store = Arc::new(MemoryStore::new());
        let err = engine(&store)
            .auto_match_explicit(42, &params(10, 30.0), false, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, MatchError::EventNotFound(42)));
    }

    #[tokio::test]
    async fn invalid_parameters_are_rejected() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine(&store);
        let token = CancellationToken::new();
        let err = engine
            .auto_match_explicit(1, &params(MAX_INVITES_LIMIT + 1, 30.0), false, &token)
            .await
            .unwrap_err();
        assert!(matches!(err, MatchError::InvalidParameters(_)));
        let err = engine
            .auto_match_explicit(1, &params(10, -1.0), false, &token)
            .await
            .unwrap_err();
        assert!(matches!(err, MatchError::InvalidParameters(_)));
    }

    #[tokio::test]
    async fn cancelled_run_changes_nothing() {
        let store = Arc::new(MemoryStore::new());
        store.insert_user(user(HOST, &[]));
        store.insert_user(user(2, &["poker"]));
        let event_id = store.insert_event(event(&["poker"], 10));

        let token = CancellationToken::new();
        token.cancel();
        let err = engine(&store)
            .auto_match_explicit(event_id, &params(10, 30.0), false, &token)
            .await
            .unwrap_err();

        assert!(matches!(err, MatchError::Cancelled));
        assert_eq!(store.invitation_count(event_id), 0);
    }

    #[tokio::test]
    async fn failed_write_is_reported_but_does_not_fail_creation() {
        let store = Arc::new(MemoryStore::new());
        store.insert_user(user(HOST, &[]));
        store.insert_user(user(2, &["salsa"]));
        let event_id = store.insert_event(event(&["salsa"], 10));
        store.set_fail_writes(true);

        let engine = engine(&store);
        let snapshot = engine
            .ports
            .events
            .read_event(event_id)
            .await
            .unwrap()
            .unwrap();
        let summary = engine
            .auto_match_on_create(&snapshot, &params(10, 30.0), &CancellationToken::new())
            .await;

        assert_eq!(summary.invites_sent, 0);
        assert!(summary.matched.is_empty());
        assert!(summary.error.is_some());
        assert_eq!(store.invitation_count(event_id), 0);
    }

    #[tokio::test]
    async fn matches_are_sorted_and_above_threshold() {
        let store = Arc::new(MemoryStore::new());
        store.insert_user(user(HOST, &[]));
        let pool: [&[&str]; 5] = [
            &["a"],
            &["a", "b"],
            &["a", "b", "c"],
            &["z"],
            &["b", "c"],
        ];
        for (i, interests) in pool.iter().enumerate() {
            store.insert_user(user(i as i32 + 2, interests));
        }
        let event_id = store.insert_event(event(&["a", "b", "c"], 10));

        let outcome = engine(&store)
            .auto_match_explicit(event_id, &params(10, 30.0), true, &CancellationToken::new())
            .await
            .unwrap();
        let MatchOutcome::Potentials { matches, .. } = outcome else {
            panic!("expected potentials");
        };

        assert_eq!(ids(&matches), vec![4, 3, 6, 2]);
        assert!(matches.iter().all(|c| c.total_score >= 30.0));
        assert!(matches.windows(2).all(|w| w[0].total_score >= w[1].total_score));
    }

    #[tokio::test]
    async fn cancelled_creation_run_reports_error_and_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        store.insert_user(user(HOST, &[]));
        store.insert_user(user(2, &["tango"]));
        let event_id = store.insert_event(event(&["tango"], 10));

        let engine = engine(&store);
        let snapshot = engine
            .ports
            .events
            .read_event(event_id)
            .await
            .unwrap()
            .unwrap();
        let token = CancellationToken::new();
        token.cancel();
        let summary = engine
            .auto_match_on_create(&snapshot, &params(10, 30.0), &token)
            .await;

        assert_eq!(summary.invites_sent, 0);
        assert!(summary.matched.is_empty());
        assert_eq!(summary.error, Some(MatchError::Cancelled.to_string()));
        assert_eq!(store.invitation_count(event_id), 0);
    }

    /// History port that stalls for one user
    struct StallingHistory {
        store: Arc<MemoryStore>,
        stalled_user: i32,
    }

    #[async_trait]
    impl HistoryReader for StallingHistory {
        async fn history(
            &self,
            user_id: i32,
            now: DateTime<Utc>,
            limit: usize,
        ) -> Result<Vec<HistoryEntry>, StoreError> {
            if user_id == self.stalled_user {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            self.store.history(user_id, now, limit).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_drops_the_batch_in_flight_and_ranks_the_rest() {
        let store = Arc::new(MemoryStore::new());
        store.insert_user(user(HOST, &[]));
        for id in 2..=4 {
            store.insert_user(user(id, &["chess"]));
        }
        let event_id = store.insert_event(event(&["chess"], 10));

        let mut ports = Ports::memory(store.clone());
        ports.history = Arc::new(StallingHistory {
            store: store.clone(),
            stalled_user: 3,
        });
        let engine = MatchEngine::new(
            ports,
            Arc::new(NotificationHub::new()),
            MatchSettings {
                batch_size: 1,
                ..MatchSettings::default()
            },
        );

        let outcome = engine
            .auto_match_explicit(event_id, &params(10, 30.0), true, &CancellationToken::new())
            .await
            .unwrap();
        let MatchOutcome::Potentials { matches, .. } = outcome else {
            panic!("expected potentials");
        };

        // user 3 stalls past the deadline, so user 4 is never reached either
        assert_eq!(ids(&matches), vec![2]);
    }

    /// Invitation port whose referent disappears right before the write
    struct VanishingInvitee {
        store: Arc<MemoryStore>,
        vanished_user: i32,
    }

    #[async_trait]
    impl InvitationWriter for VanishingInvitee {
        async fn write_auto_invitations(
            &self,
            event_id: i32,
            user_ids: &[i32],
        ) -> Result<InvitationWriteOutcome, StoreError> {
            self.store.remove_user(self.vanished_user);
            self.store.write_auto_invitations(event_id, user_ids).await
        }

        async fn list_invitations(&self, event_id: i32) -> Result<Vec<Invitation>, StoreError> {
            self.store.list_invitations(event_id).await
        }
    }

    #[tokio::test]
    async fn candidate_deleted_before_the_write_is_skipped() {
        let store = Arc::new(MemoryStore::new());
        store.insert_user(user(HOST, &[]));
        store.insert_user(user(2, &["go", "chess"]));
        store.insert_user(user(3, &["chess"]));
        store.insert_user(user(4, &["chess"]));
        let event_id = store.insert_event(event(&["go", "chess"], 10));

        let mut ports = Ports::memory(store.clone());
        ports.invitations = Arc::new(VanishingInvitee {
            store: store.clone(),
            vanished_user: 3,
        });
        let engine = MatchEngine::new(
            ports,
            Arc::new(NotificationHub::new()),
            MatchSettings::default(),
        );

        let summary = invite(&engine, event_id, &params(10, 30.0)).await;

        assert!(summary.error.is_none());
        assert_eq!(ids(&summary.matched), vec![2, 4]);
        assert_eq!(summary.invites_sent, 2);
        assert_eq!(store.auto_invitation_count(event_id), 2);
    }

    #[test]
    fn capacity_handles_negative_participants() {
        assert_eq!(capacity(10, 5), 5);
        assert_eq!(capacity(3, 5), 3);
        assert_eq!(capacity(10, -1), 0);
    }
}
