//! Entities module - domain types persisted in the database
//!
//! Each entity maps onto one table (or a table plus its side-table, as for
//! users and their profiles).

pub mod enums;
pub mod event;
pub mod invitation;
pub mod user;

// Re-exports
pub use enums::{EventType, SkillLevel};
pub use event::{Event, EventSnapshot, GeoPoint, HistoryEntry, ReputationStats};
pub use invitation::{Decline, Invitation};
pub use user::{DEFAULT_PREFERRED_RADIUS_KM, User, UserProfile};
