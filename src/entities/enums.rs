//! Enumerations shared by the entities

use serde::{Deserialize, Serialize};

// ********************* ENUMERATIONS **********************//

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "event_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Study,
    Party,
    Business,
    #[default]
    Other,
}

/// Self-declared proficiency for a profile skill
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    #[serde(alias = "Beginner")]
    Beginner,
    #[serde(alias = "Intermediate")]
    Intermediate,
    #[serde(alias = "Advanced")]
    Advanced,
    #[serde(alias = "Expert")]
    Expert,
}

impl SkillLevel {
    /// Parses a stored level, ignoring case and surrounding whitespace
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "beginner" => Some(SkillLevel::Beginner),
            "intermediate" => Some(SkillLevel::Intermediate),
            "advanced" => Some(SkillLevel::Advanced),
            "expert" => Some(SkillLevel::Expert),
            _ => None,
        }
    }

    /// Contribution of one matching skill to the skill relevance signal
    pub fn weight(self) -> f64 {
        match self {
            SkillLevel::Beginner => 0.3,
            SkillLevel::Intermediate => 0.6,
            SkillLevel::Advanced => 0.8,
            SkillLevel::Expert => 1.0,
        }
    }
}
