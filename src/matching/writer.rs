//! Invitation writer - persists the ranked candidates and notifies them

use super::error::MatchError;
use super::scorer::ScoredCandidate;
use crate::entities::Event;
use crate::notifications::{InvitationNotice, Notifier};
use crate::repositories::{InvitationWriter, StoreError};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// What one write unit achieved
#[derive(Debug, Clone, Default)]
pub struct WriteReport {
    /// Newly invited candidates, in score order
    pub invited: Vec<ScoredCandidate>,
    pub conflicts: usize,
    pub rejected: usize,
}

pub struct AutoInviter {
    invitations: Arc<dyn InvitationWriter>,
    notifier: Arc<dyn Notifier>,
}

impl AutoInviter {
    pub fn new(invitations: Arc<dyn InvitationWriter>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            invitations,
            notifier,
        }
    }

    /// Writes all invitations in one unit, then sends the notices.
    ///
    /// Storage failures abort the unit and are returned; notification
    /// failures are only logged.
    #[instrument(skip(self, event, ranked), fields(event_id = %event.event_id, candidates = ranked.len()))]
    pub async fn write(
        &self,
        event: &Event,
        ranked: &[ScoredCandidate],
    ) -> Result<WriteReport, MatchError> {
        if ranked.is_empty() {
            debug!("Nothing to write");
            return Ok(WriteReport::default());
        }

        let user_ids: Vec<i32> = ranked.iter().map(|c| c.user_id).collect();
        let outcome = self
            .invitations
            .write_auto_invitations(event.event_id, &user_ids)
            .await
            .map_err(|e| match e {
                StoreError::NotFound(_) => MatchError::EventNotFound(event.event_id),
                other => MatchError::Storage(other),
            })?;

        let invited: Vec<ScoredCandidate> = ranked
            .iter()
            .filter(|c| outcome.created.contains(&c.user_id))
            .cloned()
            .collect();

        if !outcome.rejected.is_empty() {
            warn!(
                "Write-time check refused {} candidates: {:?}",
                outcome.rejected.len(),
                outcome.rejected
            );
        }

        for candidate in &invited {
            let notice = InvitationNotice {
                event_id: event.event_id,
                event_title: event.title.clone(),
                score: candidate.total_score,
            };
            if let Err(e) = self.notifier.notify(candidate.user_id, &notice) {
                warn!("Notification to user {} failed: {}", candidate.user_id, e);
            }
        }

        info!(
            "Created {} invitations ({} already present)",
            invited.len(),
            outcome.conflicts.len()
        );

        Ok(WriteReport {
            invited,
            conflicts: outcome.conflicts.len(),
            rejected: outcome.rejected.len(),
        })
    }
}
