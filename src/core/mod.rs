//! Core Module - infrastructure shared by the whole service
//!
//! - JWT bearer authentication
//! - Configuration
//! - Error handling
//! - Application state

pub mod auth;
pub mod config;
pub mod error;
pub mod state;

pub use auth::{AuthUser, Claims, authentication_middleware, decode_jwt};
pub use config::Config;
pub use error::AppError;
pub use state::AppState;
