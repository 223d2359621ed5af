//! Repositories module - storage ports and their implementations
//!
//! `traits` declares the ports the matching engine consumes. Each MySQL
//! repository implements the ports of one entity; `memory` implements all of
//! them over in-process collections.

// ************************* NOTES ON SQLX ************************* //

/*
   Queries are checked at run time (`sqlx::query` / `sqlx::query_as` with
   `FromRow` row structs), so the crate builds without a live database.
   Row structs stay private to each repository and are converted into
   entities right after fetching; JSON columns decode through
   `sqlx::types::Json<T>`.

   Pick the fetch method by the number of rows you expect:
   .execute         -> INSERT/UPDATE/DELETE, inspect rows_affected()
   .fetch_optional  -> zero or one row
   .fetch_one       -> exactly one row (aggregates)
   .fetch_all       -> many rows
*/

// ************************* MODULES ************************* //

pub mod decline;
pub mod event;
pub mod friendship;
pub mod invitation;
pub mod memory;
pub mod reputation;
pub mod traits;
pub mod user;

pub use traits::{
    DeclineStore, EventReader, EventWriter, FriendshipReader, HistoryReader,
    InvitationWriteOutcome, InvitationWriter, LocationReader, NewEvent, ReputationReader,
    UserReader,
};

pub use decline::DeclineRepository;
pub use event::EventRepository;
pub use friendship::FriendshipRepository;
pub use invitation::InvitationRepository;
pub use memory::MemoryStore;
pub use reputation::ReputationRepository;
pub use user::UserRepository;

use sqlx::MySqlPool;
use std::sync::Arc;
use thiserror::Error;

/// Alias for the pool type, so switching database only touches this line
pub type PoolType = MySqlPool;

/// Failure reported by a storage port
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("malformed stored value: {0}")]
    Malformed(String),

    #[error("storage unavailable: {0}")]
    Unavailable(&'static str),
}

/// Every port the service needs, shared as trait objects
#[derive(Clone)]
pub struct Ports {
    pub users: Arc<dyn UserReader>,
    pub events: Arc<dyn EventReader>,
    pub event_writer: Arc<dyn EventWriter>,
    pub friendships: Arc<dyn FriendshipReader>,
    pub reputation: Arc<dyn ReputationReader>,
    pub locations: Arc<dyn LocationReader>,
    pub history: Arc<dyn HistoryReader>,
    pub declines: Arc<dyn DeclineStore>,
    pub invitations: Arc<dyn InvitationWriter>,
}

impl Ports {
    /// Ports backed by the MySQL repositories sharing one pool
    pub fn mysql(pool: PoolType) -> Self {
        let events = Arc::new(EventRepository::new(pool.clone()));
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            events: events.clone(),
            event_writer: events.clone(),
            friendships: Arc::new(FriendshipRepository::new(pool.clone())),
            reputation: Arc::new(ReputationRepository::new(pool.clone())),
            locations: events.clone(),
            history: events,
            declines: Arc::new(DeclineRepository::new(pool.clone())),
            invitations: Arc::new(InvitationRepository::new(pool)),
        }
    }

    /// Ports backed by a single in-memory store
    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            users: store.clone(),
            events: store.clone(),
            event_writer: store.clone(),
            friendships: store.clone(),
            reputation: store.clone(),
            locations: store.clone(),
            history: store.clone(),
            declines: store.clone(),
            invitations: store,
        }
    }
}
