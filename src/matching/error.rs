//! Errors surfaced by the matching engine

use crate::repositories::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("event {0} not found")]
    EventNotFound(i32),

    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),

    #[error("auto-match cancelled")]
    Cancelled,
}
