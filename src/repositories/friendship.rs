//! FriendshipRepository - symmetric friendship pairs
//!
//! Each pair is stored once with `user_low < user_high`; lookups read both
//! columns so the relation is symmetric by construction.

use super::{FriendshipReader, PoolType, StoreError};
use async_trait::async_trait;
use std::collections::HashSet;

pub struct FriendshipRepository {
    connection_pool: PoolType,
}

impl FriendshipRepository {
    pub fn new(connection_pool: PoolType) -> Self {
        Self { connection_pool }
    }
}

#[async_trait]
impl FriendshipReader for FriendshipRepository {
    async fn friends_of(&self, user_id: i32) -> Result<HashSet<i32>, StoreError> {
        let friends: Vec<(i32,)> = sqlx::query_as(
            r#"
            SELECT user_high AS friend_id FROM friendships WHERE user_low = ?
            UNION
            SELECT user_low AS friend_id FROM friendships WHERE user_high = ?
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(friends.into_iter().map(|(id,)| id).collect())
    }
}
