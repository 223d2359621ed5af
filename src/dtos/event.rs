//! Event DTOs - Data Transfer Objects for events

use crate::entities::{Event, EventSnapshot, EventType, GeoPoint};
use crate::repositories::NewEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::matching::AutoMatchingResultsDTO;

pub const MAX_TAGS: usize = 50;
pub const MAX_TAG_LENGTH: usize = 50;

fn default_true() -> bool {
    true
}

/// Body of `POST /events`; the host is the authenticated caller
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
#[validate(schema(function = "validate_placement"))]
pub struct CreateEventDTO {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[serde(default)]
    pub event_type: EventType,
    #[serde(default = "default_true")]
    pub is_public: bool,
    #[validate(range(min = 1, message = "max_participants must be at least 1"))]
    pub max_participants: i32,
    #[serde(default)]
    pub auto_matching_enabled: bool,
    #[serde(default)]
    #[validate(custom(function = "validate_tags"))]
    pub interest_tags: Vec<String>,
    /// Users invited directly by the host
    #[serde(default)]
    pub invitees: Vec<i32>,
}

/// Coordinates in range, start before end, start in the future
fn validate_placement(dto: &CreateEventDTO) -> Result<(), ValidationError> {
    if !(-90.0..=90.0).contains(&dto.latitude) {
        return Err(ValidationError::new("latitude").with_message("Latitude must be within [-90, 90]".into()));
    }
    if !(-180.0..=180.0).contains(&dto.longitude) {
        return Err(ValidationError::new("longitude").with_message("Longitude must be within [-180, 180]".into()));
    }
    if dto.starts_at >= dto.ends_at {
        return Err(ValidationError::new("schedule").with_message("starts_at must be before ends_at".into()));
    }
    if dto.starts_at <= Utc::now() {
        return Err(ValidationError::new("schedule").with_message("starts_at must be in the future".into()));
    }
    Ok(())
}

fn validate_tags(tags: &[String]) -> Result<(), ValidationError> {
    if tags.len() > MAX_TAGS {
        return Err(ValidationError::new("interest_tags").with_message("At most 50 interest tags are allowed".into()));
    }
    if tags
        .iter()
        .any(|t| t.trim().is_empty() || t.chars().count() > MAX_TAG_LENGTH)
    {
        return Err(ValidationError::new("interest_tags").with_message("Each tag must be between 1 and 50 characters".into()));
    }
    Ok(())
}

impl CreateEventDTO {
    pub fn into_new_event(self, host_id: i32) -> NewEvent {
        let mut tags: Vec<String> = Vec::with_capacity(self.interest_tags.len());
        for tag in self.interest_tags {
            let tag = tag.trim().to_string();
            if !tags.iter().any(|t| t.eq_ignore_ascii_case(&tag)) {
                tags.push(tag);
            }
        }

        NewEvent {
            title: self.title.trim().to_string(),
            description: self.description,
            host_id,
            location: GeoPoint {
                latitude: self.latitude,
                longitude: self.longitude,
            },
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            is_public: self.is_public,
            event_type: self.event_type,
            max_participants: self.max_participants,
            auto_matching_enabled: self.auto_matching_enabled,
            interest_tags: tags,
            direct_invitees: self.invitees,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EventDTO {
    pub event_id: i32,
    pub title: String,
    pub description: String,
    pub host_id: i32,
    pub latitude: f64,
    pub longitude: f64,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub is_public: bool,
    pub event_type: EventType,
    pub max_participants: i32,
    pub auto_matching_enabled: bool,
    pub interest_tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Event> for EventDTO {
    fn from(value: Event) -> Self {
        Self {
            event_id: value.event_id,
            title: value.title,
            description: value.description,
            host_id: value.host_id,
            latitude: value.location.latitude,
            longitude: value.location.longitude,
            starts_at: value.starts_at,
            ends_at: value.ends_at,
            is_public: value.is_public,
            event_type: value.event_type,
            max_participants: value.max_participants,
            auto_matching_enabled: value.auto_matching_enabled,
            interest_tags: value.interest_tags,
            created_at: value.created_at,
        }
    }
}

/// Event plus its membership, as returned by `GET /events/{event_id}`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EventDetailDTO {
    #[serde(flatten)]
    pub event: EventDTO,
    /// Sorted ascending
    pub attendees: Vec<i32>,
    pub invitation_count: usize,
}

impl From<EventSnapshot> for EventDetailDTO {
    fn from(value: EventSnapshot) -> Self {
        let mut attendees: Vec<i32> = value.attendees.into_iter().collect();
        attendees.sort_unstable();
        Self {
            invitation_count: value.invitations.len(),
            event: value.event.into(),
            attendees,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateEventResponse {
    pub event_id: i32,
    pub event: EventDTO,
    pub auto_matching_results: AutoMatchingResultsDTO,
}

/// Query parameters of `GET /events`
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct EventsQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DeclineResponse {
    pub event_id: i32,
    /// False when the decline was already on record
    pub recorded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn dto() -> CreateEventDTO {
        let starts_at = Utc::now() + Duration::days(1);
        CreateEventDTO {
            title: "Rust meetup".into(),
            description: String::new(),
            latitude: 45.07,
            longitude: 7.69,
            starts_at,
            ends_at: starts_at + Duration::hours(2),
            event_type: EventType::Study,
            is_public: true,
            max_participants: 20,
            auto_matching_enabled: true,
            interest_tags: vec!["rust".into(), " Rust ".into(), "async".into()],
            invitees: vec![],
        }
    }

    #[test]
    fn valid_event_passes() {
        assert!(dto().validate().is_ok());
    }

    #[test]
    fn schedule_must_be_ordered_and_upcoming() {
        let mut reversed = dto();
        reversed.ends_at = reversed.starts_at - Duration::minutes(1);
        assert!(reversed.validate().is_err());

        let mut past = dto();
        past.starts_at = Utc::now() - Duration::hours(1);
        assert!(past.validate().is_err());
    }

    #[test]
    fn coordinates_and_capacity_are_checked() {
        let mut bad = dto();
        bad.latitude = 91.0;
        assert!(bad.validate().is_err());

        let mut empty = dto();
        empty.max_participants = 0;
        assert!(empty.validate().is_err());
    }

    #[test]
    fn tags_are_limited() {
        let mut many = dto();
        many.interest_tags = (0..=MAX_TAGS).map(|i| format!("tag{i}")).collect();
        assert!(many.validate().is_err());

        let mut blank = dto();
        blank.interest_tags = vec!["   ".into()];
        assert!(blank.validate().is_err());
    }

    #[test]
    fn duplicate_tags_collapse_on_conversion() {
        let new_event = dto().into_new_event(4);
        assert_eq!(new_event.host_id, 4);
        assert_eq!(new_event.interest_tags, vec!["rust".to_string(), "async".to_string()]);
    }
}
