//! Signal extractors
//!
//! Each extractor is a pure function over pre-normalized features and returns
//! a raw value in `0.0..=1.0`. The only exception is [`interest_match`], which
//! returns the size of the tag overlap. Missing external data (no location,
//! no reputation, empty history) yields 0, never an error.

use super::geo::haversine_km;
use super::text::{jaccard, leading_year, normalize, tokenize};
use crate::entities::{
    Event, EventType, GeoPoint, HistoryEntry, ReputationStats, SkillLevel, User,
};
use chrono::{DateTime, Duration, Timelike, Utc};
use std::collections::{BTreeMap, HashSet};

/// How many of the most recent history entries time compatibility looks at
pub const TIME_WINDOW_EVENTS: usize = 10;
/// Hour distance still counted as compatible
pub const TIME_TOLERANCE_HOURS: i64 = 3;
/// Look-back window of the activity signal
pub const ACTIVITY_WINDOW_DAYS: i64 = 30;

/// Institution, program and enrollment year, normalized once
#[derive(Debug, Clone, Default)]
pub struct AcademicProfile {
    institution: String,
    institution_tokens: HashSet<String>,
    program_tokens: HashSet<String>,
    year: Option<i32>,
}

impl AcademicProfile {
    pub fn from_user(user: &User) -> Self {
        let institution = normalize(&user.profile.institution);
        Self {
            institution_tokens: tokenize(&institution),
            institution,
            program_tokens: tokenize(&user.profile.program),
            year: leading_year(&user.profile.enrollment_year),
        }
    }
}

/// Everything about the event the extractors need
#[derive(Debug, Clone)]
pub struct EventFeatures {
    pub event_id: i32,
    pub host_id: i32,
    tags: HashSet<String>,
    text_tokens: HashSet<String>,
    location: GeoPoint,
    start_hour: u32,
    event_type: EventType,
    host: AcademicProfile,
    host_friends: HashSet<i32>,
}

impl EventFeatures {
    pub fn new(event: &Event, host: Option<&User>, host_friends: HashSet<i32>) -> Self {
        Self {
            event_id: event.event_id,
            host_id: event.host_id,
            tags: event
                .interest_tags
                .iter()
                .map(|t| normalize(t))
                .filter(|t| !t.is_empty())
                .collect(),
            text_tokens: tokenize(&format!("{} {}", event.title, event.description)),
            location: event.location,
            start_hour: event.starts_at.hour(),
            event_type: event.event_type,
            host: host.map(AcademicProfile::from_user).unwrap_or_default(),
            host_friends,
        }
    }

    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }
}

/// Data gathered from the read ports for one candidate
#[derive(Debug, Clone, Default)]
pub struct CandidateContext {
    pub friends: HashSet<i32>,
    pub location: Option<GeoPoint>,
    pub reputation: Option<ReputationStats>,
    /// Newest first
    pub history: Vec<HistoryEntry>,
}

/// A candidate with its strings normalized at ingestion
#[derive(Debug, Clone)]
pub struct CandidateFeatures {
    pub user_id: i32,
    pub username: String,
    // normalized interest -> spelling as entered by the user
    interests: BTreeMap<String, String>,
    interest_tokens: HashSet<String>,
    bio_tokens: HashSet<String>,
    skills: Vec<(HashSet<String>, SkillLevel)>,
    academic: AcademicProfile,
    preferred_radius_km: f64,
    context: CandidateContext,
}

impl CandidateFeatures {
    pub fn new(user: &User, context: CandidateContext) -> Self {
        let mut interests = BTreeMap::new();
        for interest in &user.profile.interests {
            let key = normalize(interest);
            if !key.is_empty() {
                interests
                    .entry(key)
                    .or_insert_with(|| interest.trim().to_string());
            }
        }

        Self {
            user_id: user.user_id,
            username: user.username.clone(),
            interest_tokens: tokenize(&user.profile.interests.join(" ")),
            interests,
            bio_tokens: tokenize(&user.profile.bio),
            skills: user
                .profile
                .skills
                .iter()
                .map(|(name, level)| (tokenize(name), *level))
                .collect(),
            academic: AcademicProfile::from_user(user),
            preferred_radius_km: user.preferred_radius(),
            context,
        }
    }

    /// Interests shared with the event tags, in the user's own spelling
    pub fn matching_interests(&self, event: &EventFeatures) -> Vec<String> {
        self.interests
            .iter()
            .filter(|(key, _)| event.tags.contains(*key))
            .map(|(_, original)| original.clone())
            .collect()
    }
}

/// Raw value of every signal for one (event, candidate) pair
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSignals {
    pub interest_match: usize,
    pub interest_ratio: f64,
    pub content_similarity: f64,
    pub location: f64,
    pub social: f64,
    pub academic_similarity: f64,
    pub skill_relevance: f64,
    pub bio_similarity: f64,
    pub reputation: f64,
    pub event_type_preference: f64,
    pub time_compatibility: f64,
    pub activity_level: f64,
}

/// Clamps to `0.0..=1.0`, mapping non-finite values to 0
pub fn sanitise(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Runs every extractor
pub fn extract(event: &EventFeatures, candidate: &CandidateFeatures, now: DateTime<Utc>) -> RawSignals {
    let history = &candidate.context.history;
    RawSignals {
        interest_match: interest_match(event, candidate),
        interest_ratio: sanitise(interest_ratio(event, candidate)),
        content_similarity: sanitise(jaccard(&event.text_tokens, &candidate.interest_tokens)),
        location: sanitise(location_proximity(
            event.location,
            candidate.context.location,
            candidate.preferred_radius_km,
        )),
        social: sanitise(social(
            &event.host_friends,
            candidate.user_id,
            &candidate.context.friends,
        )),
        academic_similarity: sanitise(academic_similarity(&event.host, &candidate.academic)),
        skill_relevance: sanitise(skill_relevance(&event.text_tokens, &candidate.skills)),
        bio_similarity: sanitise(jaccard(&candidate.bio_tokens, &event.text_tokens)),
        reputation: sanitise(reputation(candidate.context.reputation.as_ref())),
        event_type_preference: sanitise(event_type_preference(history, event.event_type)),
        time_compatibility: sanitise(time_compatibility(history, event.start_hour)),
        activity_level: sanitise(activity_level(history, now)),
    }
}

/// Number of event tags the candidate lists among their interests
pub fn interest_match(event: &EventFeatures, candidate: &CandidateFeatures) -> usize {
    candidate
        .interests
        .keys()
        .filter(|key| event.tags.contains(*key))
        .count()
}

pub fn interest_ratio(event: &EventFeatures, candidate: &CandidateFeatures) -> f64 {
    if event.tags.is_empty() {
        return 0.0;
    }
    interest_match(event, candidate) as f64 / event.tags.len() as f64
}

/// 1 inside the preferred radius, quadratic fall-off up to three radii
pub fn location_proximity(event: GeoPoint, candidate: Option<GeoPoint>, radius_km: f64) -> f64 {
    let Some(candidate) = candidate else {
        return 0.0;
    };
    let distance = haversine_km(event, candidate);
    if distance <= radius_km {
        1.0
    } else if distance <= 3.0 * radius_km {
        1.0 - ((distance - radius_km) / (2.0 * radius_km)).powi(2)
    } else {
        0.0
    }
}

/// 1 for a friend of the host, otherwise grows with mutual friends
pub fn social(host_friends: &HashSet<i32>, candidate_id: i32, candidate_friends: &HashSet<i32>) -> f64 {
    if host_friends.contains(&candidate_id) {
        return 1.0;
    }
    let mutual = candidate_friends.intersection(host_friends).count();
    if mutual == 0 {
        return 0.0;
    }
    (mutual as f64 / 3.0).sqrt().min(1.0)
}

pub fn academic_similarity(host: &AcademicProfile, candidate: &AcademicProfile) -> f64 {
    let mut score = 0.0;

    if !host.institution.is_empty() && !candidate.institution.is_empty() {
        if host.institution == candidate.institution {
            score += 0.4;
        } else if !host
            .institution_tokens
            .is_disjoint(&candidate.institution_tokens)
        {
            score += 0.2;
        }
    }

    score += jaccard(&host.program_tokens, &candidate.program_tokens) * 0.3;

    if let (Some(a), Some(b)) = (host.year, candidate.year) {
        score += match (a - b).abs() {
            0 => 0.3,
            1 => 0.2,
            2 => 0.1,
            _ => 0.0,
        };
    }

    score.min(1.0)
}

/// Sum of level weights of the skills mentioned in the event text, over 3
pub fn skill_relevance(event_tokens: &HashSet<String>, skills: &[(HashSet<String>, SkillLevel)]) -> f64 {
    let total: f64 = skills
        .iter()
        .filter(|(tokens, _)| !tokens.is_disjoint(event_tokens))
        .map(|(_, level)| level.weight())
        .sum();
    (total / 3.0).min(1.0)
}

pub fn reputation(stats: Option<&ReputationStats>) -> f64 {
    let Some(stats) = stats else {
        return 0.0;
    };

    let trust = (f64::from(stats.trust_level) / 5.0).clamp(0.0, 1.0) * 0.5;
    let rating = if stats.average_rating > 0.0 {
        ((stats.average_rating - 3.0) / 2.0).clamp(0.0, 1.0) * 0.3
    } else {
        0.0
    };
    let activity = (f64::from(stats.events_hosted + stats.events_attended) / 10.0).clamp(0.0, 1.0) * 0.2;

    trust + rating + activity
}

/// Share of the user's past events with the same category
pub fn event_type_preference(history: &[HistoryEntry], event_type: EventType) -> f64 {
    if history.is_empty() {
        return 0.0;
    }
    let same = history.iter().filter(|h| h.event_type == event_type).count();
    same as f64 / history.len() as f64
}

/// Share of the latest events starting within a few hours of the same time of day
pub fn time_compatibility(history: &[HistoryEntry], start_hour: u32) -> f64 {
    let recent = &history[..history.len().min(TIME_WINDOW_EVENTS)];
    if recent.is_empty() {
        return 0.0;
    }
    let compatible = recent
        .iter()
        .filter(|h| (i64::from(h.starts_at.hour()) - i64::from(start_hour)).abs() <= TIME_TOLERANCE_HOURS)
        .count();
    compatible as f64 / recent.len() as f64
}

/// Events in the last 30 days, saturating at five
pub fn activity_level(history: &[HistoryEntry], now: DateTime<Utc>) -> f64 {
    let since = now - Duration::days(ACTIVITY_WINDOW_DAYS);
    let recent = history
        .iter()
        .filter(|h| h.starts_at >= since && h.starts_at <= now)
        .count();
    (recent as f64 / 5.0).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::UserProfile;
    use chrono::TimeZone;

    fn user_with(id: i32, profile: UserProfile) -> User {
        User {
            user_id: id,
            username: format!("user{id}"),
            profile,
        }
    }

    fn event_with(tags: &[&str], title: &str, description: &str) -> Event {
        let starts_at = Utc.with_ymd_and_hms(2030, 5, 10, 18, 0, 0).unwrap();
        Event {
            event_id: 1,
            title: title.to_string(),
            description: description.to_string(),
            host_id: 100,
            location: GeoPoint {
                latitude: 45.0,
                longitude: 7.0,
            },
            starts_at,
            ends_at: starts_at + Duration::hours(2),
            is_public: true,
            event_type: EventType::Study,
            max_participants: 10,
            auto_matching_enabled: true,
            interest_tags: tags.iter().map(|t| t.to_string()).collect(),
            created_at: starts_at - Duration::days(3),
        }
    }

    fn history_at(hours: &[u32], event_type: EventType) -> Vec<HistoryEntry> {
        hours
            .iter()
            .map(|&h| HistoryEntry {
                event_type,
                starts_at: Utc.with_ymd_and_hms(2030, 4, 1, h, 0, 0).unwrap(),
                location: GeoPoint {
                    latitude: 0.0,
                    longitude: 0.0,
                },
            })
            .collect()
    }

    #[test]
    fn interests_match_case_insensitively_and_trimmed() {
        let event = EventFeatures::new(&event_with(&["Python", " ML "], "", ""), None, HashSet::new());
        let candidate = CandidateFeatures::new(
            &user_with(
                1,
                UserProfile {
                    interests: vec!["python".into(), "ml".into(), "cooking".into(), "PYTHON".into()],
                    ..UserProfile::default()
                },
            ),
            CandidateContext::default(),
        );

        assert_eq!(interest_match(&event, &candidate), 2);
        assert_eq!(interest_ratio(&event, &candidate), 1.0);
        assert_eq!(candidate.matching_interests(&event), vec!["ml".to_string(), "python".to_string()]);
    }

    #[test]
    fn empty_tags_give_zero_interest_signals() {
        let event = EventFeatures::new(&event_with(&[], "Python night", ""), None, HashSet::new());
        let candidate = CandidateFeatures::new(
            &user_with(
                1,
                UserProfile {
                    interests: vec!["python".into()],
                    ..UserProfile::default()
                },
            ),
            CandidateContext::default(),
        );
        assert_eq!(interest_match(&event, &candidate), 0);
        assert_eq!(interest_ratio(&event, &candidate), 0.0);
    }

    #[test]
    fn location_is_inclusive_at_radius_and_decays_to_three_radii() {
        let origin = GeoPoint {
            latitude: 0.0,
            longitude: 0.0,
        };
        let one_degree = haversine_km(
            origin,
            GeoPoint {
                latitude: 1.0,
                longitude: 0.0,
            },
        );
        let candidate = Some(GeoPoint {
            latitude: 1.0,
            longitude: 0.0,
        });

        assert_eq!(location_proximity(origin, candidate, one_degree), 1.0);
        assert_eq!(location_proximity(origin, None, 10.0), 0.0);

        // d = 2r -> 1 - (1/2)^2
        let half = location_proximity(origin, candidate, one_degree / 2.0);
        assert!((half - 0.75).abs() < 1e-9);

        assert_eq!(location_proximity(origin, candidate, one_degree / 3.5), 0.0);
    }

    #[test]
    fn social_rewards_friends_and_mutuals() {
        let host_friends = HashSet::from([2, 3, 4, 5]);
        assert_eq!(social(&host_friends, 2, &HashSet::new()), 1.0);
        assert_eq!(social(&host_friends, 9, &HashSet::from([7, 8])), 0.0);

        let one_mutual = social(&host_friends, 9, &HashSet::from([3]));
        assert!((one_mutual - (1.0f64 / 3.0).sqrt()).abs() < 1e-12);

        assert_eq!(social(&host_friends, 9, &HashSet::from([2, 3, 4, 5])), 1.0);
    }

    #[test]
    fn academic_similarity_combines_components() {
        let host = AcademicProfile::from_user(&user_with(
            1,
            UserProfile {
                institution: "Politecnico di Torino".into(),
                program: "Computer Engineering".into(),
                enrollment_year: "2022".into(),
                ..UserProfile::default()
            },
        ));
        let same = AcademicProfile::from_user(&user_with(
            2,
            UserProfile {
                institution: "politecnico di torino".into(),
                program: "computer engineering".into(),
                enrollment_year: "2022".into(),
                ..UserProfile::default()
            },
        ));
        assert!((academic_similarity(&host, &same) - 1.0).abs() < 1e-12);

        let partial = AcademicProfile::from_user(&user_with(
            3,
            UserProfile {
                institution: "Politecnico di Milano".into(),
                program: "Mechanical Engineering".into(),
                enrollment_year: "2020 transfer".into(),
                ..UserProfile::default()
            },
        ));
        // 0.2 token overlap + 0.3 * 1/3 program + 0.1 for two years apart
        assert!((academic_similarity(&host, &partial) - 0.4).abs() < 1e-9);

        assert_eq!(academic_similarity(&host, &AcademicProfile::default()), 0.0);
    }

    #[test]
    fn skill_relevance_weights_levels() {
        let event_tokens = tokenize("Rust and Python workshop");
        let skills = vec![
            (tokenize("Python"), SkillLevel::Expert),
            (tokenize("Rust"), SkillLevel::Intermediate),
            (tokenize("Painting"), SkillLevel::Expert),
        ];
        assert!((skill_relevance(&event_tokens, &skills) - 1.6 / 3.0).abs() < 1e-12);
        assert_eq!(skill_relevance(&event_tokens, &[]), 0.0);
    }

    #[test]
    fn reputation_components() {
        assert_eq!(reputation(None), 0.0);

        let top = ReputationStats {
            total_ratings: 40,
            average_rating: 5.0,
            trust_level: 5,
            events_hosted: 6,
            events_attended: 9,
        };
        assert!((reputation(Some(&top)) - 1.0).abs() < 1e-12);

        let newcomer = ReputationStats {
            total_ratings: 0,
            average_rating: 0.0,
            trust_level: 1,
            events_hosted: 0,
            events_attended: 2,
        };
        assert!((reputation(Some(&newcomer)) - (0.1 + 0.04)).abs() < 1e-12);
    }

    #[test]
    fn history_based_signals() {
        let mut history = history_at(&[18, 19, 9], EventType::Study);
        history.extend(history_at(&[21], EventType::Party));

        assert_eq!(event_type_preference(&history, EventType::Study), 0.75);
        assert_eq!(event_type_preference(&[], EventType::Study), 0.0);

        // 18, 19 and 21 are within three hours of 18
        assert_eq!(time_compatibility(&history, 18), 0.75);
        assert_eq!(time_compatibility(&[], 18), 0.0);
    }

    #[test]
    fn time_compatibility_looks_at_ten_latest() {
        let mut history = history_at(&[18; 10], EventType::Study);
        history.extend(history_at(&[3; 10], EventType::Study));
        assert_eq!(time_compatibility(&history, 18), 1.0);
    }

    #[test]
    fn activity_counts_last_thirty_days() {
        let now = Utc.with_ymd_and_hms(2030, 4, 20, 12, 0, 0).unwrap();
        let history = history_at(&[8, 9, 10], EventType::Study);
        assert!((activity_level(&history, now) - 0.6).abs() < 1e-12);

        let later = now + Duration::days(60);
        assert_eq!(activity_level(&history, later), 0.0);
    }
}
