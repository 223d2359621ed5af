//! User entity and its profile side-table

use super::enums::SkillLevel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_PREFERRED_RADIUS_KM: f64 = 10.0;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub user_id: i32,
    pub username: String,
    pub profile: UserProfile,
}

/// Academic and interest data the matcher reads.
///
/// Users are registered elsewhere; this service never writes profiles.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserProfile {
    pub institution: String,
    pub program: String,
    pub enrollment_year: String,
    pub bio: String,
    pub interests: Vec<String>,
    pub skills: BTreeMap<String, SkillLevel>,
    pub auto_invite_enabled: bool,
    pub preferred_radius_km: f64,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            institution: String::new(),
            program: String::new(),
            enrollment_year: String::new(),
            bio: String::new(),
            interests: Vec::new(),
            skills: BTreeMap::new(),
            auto_invite_enabled: false,
            preferred_radius_km: DEFAULT_PREFERRED_RADIUS_KM,
        }
    }
}

impl User {
    /// Radius used by the location signal, falling back to the default
    /// when the stored value is not a positive number.
    pub fn preferred_radius(&self) -> f64 {
        let r = self.profile.preferred_radius_km;
        if r.is_finite() && r > 0.0 {
            r
        } else {
            DEFAULT_PREFERRED_RADIUS_KM
        }
    }
}
