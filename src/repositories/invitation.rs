//! InvitationRepository - transactional auto-invitation writes

use super::{InvitationWriteOutcome, InvitationWriter, PoolType, StoreError};
use crate::entities::Invitation;
use async_trait::async_trait;
use std::collections::HashSet;
use tracing::{debug, warn};

pub struct InvitationRepository {
    connection_pool: PoolType,
}

impl InvitationRepository {
    pub fn new(connection_pool: PoolType) -> Self {
        Self { connection_pool }
    }
}

#[async_trait]
impl InvitationWriter for InvitationRepository {
    async fn write_auto_invitations(
        &self,
        event_id: i32,
        user_ids: &[i32],
    ) -> Result<InvitationWriteOutcome, StoreError> {
        let mut outcome = InvitationWriteOutcome::default();
        if user_ids.is_empty() {
            return Ok(outcome);
        }

        let now = chrono::Utc::now();
        // dropping `tx` on any early return rolls everything back
        let mut tx = self.connection_pool.begin().await?;

        // lock the event row so concurrent runs for the same event serialize here
        let host: Option<(i32,)> =
            sqlx::query_as("SELECT host_id FROM events WHERE event_id = ? FOR UPDATE")
                .bind(event_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((host_id,)) = host else {
            return Err(StoreError::NotFound("event"));
        };

        let mut blocked: HashSet<i32> = sqlx::query_as::<_, (i32,)>(
            r#"
            SELECT user_id FROM event_attendees WHERE event_id = ?
            UNION
            SELECT user_id FROM event_declines WHERE event_id = ?
            "#,
        )
        .bind(event_id)
        .bind(event_id)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(|(id,)| id)
        .collect();
        blocked.insert(host_id);

        let mut existing_users = sqlx::QueryBuilder::new("SELECT user_id FROM users WHERE user_id IN (");
        let mut separated = existing_users.separated(", ");
        for id in user_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");
        let existing: HashSet<i32> = existing_users
            .build_query_as::<(i32,)>()
            .fetch_all(&mut *tx)
            .await?
            .into_iter()
            .map(|(id,)| id)
            .collect();

        for &user_id in user_ids {
            if blocked.contains(&user_id) || !existing.contains(&user_id) {
                warn!(
                    "Refusing auto invitation of user {} to event {}",
                    user_id, event_id
                );
                outcome.rejected.push(user_id);
                continue;
            }

            let result = sqlx::query(
                r#"
                INSERT IGNORE INTO event_invitations (event_id, user_id, is_auto_matched, created_at)
                VALUES (?, ?, TRUE, ?)
                "#,
            )
            .bind(event_id)
            .bind(user_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 1 {
                outcome.created.push(user_id);
            } else {
                debug!("Invitation for user {} already present", user_id);
                outcome.conflicts.push(user_id);
            }
        }

        tx.commit().await?;
        Ok(outcome)
    }

    async fn list_invitations(&self, event_id: i32) -> Result<Vec<Invitation>, StoreError> {
        let invitations = sqlx::query_as::<_, Invitation>(
            r#"
            SELECT event_id, user_id, is_auto_matched, created_at
            FROM event_invitations
            WHERE event_id = ?
            ORDER BY invitation_seq ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(invitations)
    }
}
