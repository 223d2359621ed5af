//! Invitation and decline entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of `event_invitations`, unique on (event_id, user_id)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Invitation {
    pub event_id: i32,
    pub user_id: i32,
    pub is_auto_matched: bool,
    pub created_at: DateTime<Utc>,
}

/// A user's rejection of an event. Declines are permanent for the event.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Decline {
    pub user_id: i32,
    pub event_id: i32,
    pub declined_at: DateTime<Utc>,
}
