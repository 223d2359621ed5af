//! ReputationRepository - per-user rating aggregates

use super::{PoolType, ReputationReader, StoreError};
use crate::entities::ReputationStats;
use async_trait::async_trait;

pub struct ReputationRepository {
    connection_pool: PoolType,
}

impl ReputationRepository {
    pub fn new(connection_pool: PoolType) -> Self {
        Self { connection_pool }
    }
}

#[async_trait]
impl ReputationReader for ReputationRepository {
    async fn reputation(&self, user_id: i32) -> Result<Option<ReputationStats>, StoreError> {
        let stats = sqlx::query_as::<_, ReputationStats>(
            r#"
            SELECT
                total_ratings,
                average_rating,
                trust_level,
                events_hosted,
                events_attended
            FROM user_reputation
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(stats)
    }
}
