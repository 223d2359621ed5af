//! Text normalization shared by the signal extractors
//!
//! Everything is lowercased and whitespace-split once, when the event and
//! candidate features are built, so the extractors compare plain sets.

use std::collections::HashSet;

/// Canonical form of a tag or interest: trimmed, lowercased
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Lowercased whitespace tokens
pub fn tokenize(text: &str) -> HashSet<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

/// `|A ∩ B| / |A ∪ B|`, 0 when either side is empty
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}

/// Leading integer of the first whitespace token, e.g. `"2023 cohort"` -> 2023
pub fn leading_year(value: &str) -> Option<i32> {
    let first = value.split_whitespace().next()?;
    let digits: String = first.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}
