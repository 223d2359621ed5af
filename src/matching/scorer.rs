//! Weighted scoring and ranking of candidates

use super::signals::RawSignals;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Per-signal weights. `interest_match` multiplies the raw overlap count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub interest_ratio: f64,
    pub interest_match: f64,
    pub academic_similarity: f64,
    pub content_similarity: f64,
    pub skill_relevance: f64,
    pub social: f64,
    pub location: f64,
    pub bio_similarity: f64,
    pub reputation: f64,
    pub event_type_preference: f64,
    pub time_compatibility: f64,
    pub activity_level: f64,
}

impl Weights {
    pub const DEFAULT: Weights = Weights {
        interest_ratio: 30.0,
        interest_match: 25.0,
        academic_similarity: 25.0,
        content_similarity: 20.0,
        skill_relevance: 20.0,
        social: 20.0,
        location: 15.0,
        bio_similarity: 15.0,
        reputation: 15.0,
        event_type_preference: 10.0,
        time_compatibility: 10.0,
        activity_level: 10.0,
    };
}

impl Default for Weights {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Weighted contribution of each signal, rounded to two decimals.
///
/// Reported for observability only; ranking uses the unrounded total.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ScoreBreakdown {
    pub interest_match: f64,
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

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A candidate that passed the threshold, ready to be invited
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub user_id: i32,
    pub username: String,
    pub total_score: f64,
    pub interest_match: usize,
    pub matching_interests: Vec<String>,
    pub breakdown: ScoreBreakdown,
}

// totals closer than this rank as equal and fall through to the tie-breaks
const RANK_RESOLUTION: f64 = 1e-6;

fn rank_key(total: f64) -> i64 {
    (total / RANK_RESOLUTION).round() as i64
}

/// Orders by total descending, then overlap count descending, then id ascending
pub fn rank_order(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    rank_key(b.total_score)
        .cmp(&rank_key(a.total_score))
        .then(b.interest_match.cmp(&a.interest_match))
        .then(a.user_id.cmp(&b.user_id))
}

#[derive(Debug, Clone)]
pub struct Scorer {
    weights: Weights,
    min_score: f64,
}

impl Scorer {
    pub fn new(weights: Weights, min_score: f64) -> Self {
        Self { weights, min_score }
    }

    pub fn with_min_score(min_score: f64) -> Self {
        Self::new(Weights::DEFAULT, min_score)
    }

    pub fn min_score(&self) -> f64 {
        self.min_score
    }

    /// Full-precision total and the rounded per-signal breakdown
    pub fn score(&self, raw: &RawSignals) -> (f64, ScoreBreakdown) {
        let w = &self.weights;
        let contributions = ScoreBreakdown {
            interest_match: w.interest_match * raw.interest_match as f64,
            interest_ratio: w.interest_ratio * raw.interest_ratio,
            content_similarity: w.content_similarity * raw.content_similarity,
            location: w.location * raw.location,
            social: w.social * raw.social,
            academic_similarity: w.academic_similarity * raw.academic_similarity,
            skill_relevance: w.skill_relevance * raw.skill_relevance,
            bio_similarity: w.bio_similarity * raw.bio_similarity,
            reputation: w.reputation * raw.reputation,
            event_type_preference: w.event_type_preference * raw.event_type_preference,
            time_compatibility: w.time_compatibility * raw.time_compatibility,
            activity_level: w.activity_level * raw.activity_level,
        };

        let total = contributions.interest_match
            + contributions.interest_ratio
            + contributions.content_similarity
            + contributions.location
            + contributions.social
            + contributions.academic_similarity
            + contributions.skill_relevance
            + contributions.bio_similarity
            + contributions.reputation
            + contributions.event_type_preference
            + contributions.time_compatibility
            + contributions.activity_level;

        let rounded = ScoreBreakdown {
            interest_match: round2(contributions.interest_match),
            interest_ratio: round2(contributions.interest_ratio),
            content_similarity: round2(contributions.content_similarity),
            location: round2(contributions.location),
            social: round2(contributions.social),
            academic_similarity: round2(contributions.academic_similarity),
            skill_relevance: round2(contributions.skill_relevance),
            bio_similarity: round2(contributions.bio_similarity),
            reputation: round2(contributions.reputation),
            event_type_preference: round2(contributions.event_type_preference),
            time_compatibility: round2(contributions.time_compatibility),
            activity_level: round2(contributions.activity_level),
        };

        (total, rounded)
    }

    pub fn passes(&self, total: f64) -> bool {
        total >= self.min_score
    }

    /// Drops candidates under the threshold, sorts, keeps the first `cap`
    pub fn rank(&self, candidates: Vec<ScoredCandidate>, cap: usize) -> Vec<ScoredCandidate> {
        let mut ranked: Vec<ScoredCandidate> = candidates
            .into_iter()
            .filter(|c| self.passes(c.total_score))
            .collect();
        ranked.sort_by(rank_order);
        ranked.truncate(cap);
        ranked
    }
}
