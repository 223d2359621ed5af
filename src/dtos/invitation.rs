//! Invitation DTOs

use crate::entities::Invitation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct InvitationDTO {
    pub event_id: i32,
    pub user_id: i32,
    /// True when created by the matcher, false for host invitations
    pub is_auto_matched: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Invitation> for InvitationDTO {
    fn from(value: Invitation) -> Self {
        Self {
            event_id: value.event_id,
            user_id: value.user_id,
            is_auto_matched: value.is_auto_matched,
            created_at: value.created_at,
        }
    }
}
