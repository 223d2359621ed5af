//! Application State - shared by every route and middleware

use crate::matching::{MatchEngine, MatchSettings};
use crate::notifications::NotificationHub;
use crate::repositories::{MemoryStore, Ports, PoolType};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct AppState {
    /// Storage ports, MySQL in production
    pub ports: Ports,

    pub engine: MatchEngine,

    /// Subscribers waiting for invitation notices
    pub notifications: Arc<NotificationHub>,

    /// Secret key for the JWT tokens
    pub jwt_secret: String,

    /// Cancelled on shutdown; per-request tokens are children of it
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Builds the state over MySQL repositories sharing `pool`.
    ///
    /// # Arguments
    /// * `pool` - shared MySQL connection pool
    /// * `jwt_secret` - key used to verify bearer tokens
    /// * `settings` - matching defaults
    pub fn new(pool: PoolType, jwt_secret: String, settings: MatchSettings) -> Self {
        Self::with_ports(Ports::mysql(pool), jwt_secret, settings)
    }

    /// Builds the state over an in-memory store
    pub fn in_memory(store: Arc<MemoryStore>, jwt_secret: String, settings: MatchSettings) -> Self {
        Self::with_ports(Ports::memory(store), jwt_secret, settings)
    }

    pub fn with_ports(ports: Ports, jwt_secret: String, settings: MatchSettings) -> Self {
        let notifications = Arc::new(NotificationHub::new());
        Self {
            engine: MatchEngine::new(ports.clone(), notifications.clone(), settings),
            ports,
            notifications,
            jwt_secret,
            shutdown: CancellationToken::new(),
        }
    }
}
