//! DeclineRepository - persistent event rejections

use super::{DeclineStore, PoolType, StoreError};
use async_trait::async_trait;
use std::collections::HashSet;

pub struct DeclineRepository {
    connection_pool: PoolType,
}

impl DeclineRepository {
    pub fn new(connection_pool: PoolType) -> Self {
        Self { connection_pool }
    }
}

#[async_trait]
impl DeclineStore for DeclineRepository {
    async fn declined_user_ids(&self, event_id: i32) -> Result<HashSet<i32>, StoreError> {
        let rows: Vec<(i32,)> =
            sqlx::query_as("SELECT user_id FROM event_declines WHERE event_id = ?")
                .bind(event_id)
                .fetch_all(&self.connection_pool)
                .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn record_decline(&self, user_id: i32, event_id: i32) -> Result<bool, StoreError> {
        // unique (user_id, event_id) makes repeated declines a no-op
        let result = sqlx::query(
            "INSERT IGNORE INTO event_declines (user_id, event_id, declined_at) VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(event_id)
        .bind(chrono::Utc::now())
        .execute(&self.connection_pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
