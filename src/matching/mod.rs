//! Matching engine: candidate source, signal extractors, scorer, writer and
//! the orchestrator tying them together.

pub mod candidates;
pub mod engine;
pub mod error;
pub mod geo;
pub mod scorer;
pub mod signals;
pub mod text;
pub mod writer;

pub use engine::{AutoMatchSummary, MatchEngine, MatchOutcome, MatchParams, MatchSettings};
pub use error::MatchError;
pub use scorer::{ScoreBreakdown, ScoredCandidate, Scorer, Weights};
