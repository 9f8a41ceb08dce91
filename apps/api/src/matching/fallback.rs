//! Deterministic skill-overlap scorer. Always available; used whenever the
//! AI path fails or returns something unusable.
//!
//! score = matched * 100 / required (integer division). A posting that lists
//! no skills gets a neutral 50. Matching is exact and case-sensitive.

use std::collections::HashSet;

use crate::models::posting::Posting;
use crate::models::profile::Profile;

use super::{Recommendation, ScorerBackend};

pub const NEUTRAL_SCORE: u8 = 50;

/// Returns the overlap score and the posting skills found in the profile,
/// in posting order. Duplicate posting skills count once per occurrence.
pub fn calculate_skill_match(profile_skills: &[String], posting_skills: &[String]) -> (u8, Vec<String>) {
    let owned: HashSet<&str> = profile_skills.iter().map(String::as_str).collect();

    let matched: Vec<String> = posting_skills
        .iter()
        .filter(|s| owned.contains(s.as_str()))
        .cloned()
        .collect();

    if posting_skills.is_empty() {
        return (NEUTRAL_SCORE, matched);
    }

    let score = matched.len() * 100 / posting_skills.len();
    (score as u8, matched)
}

pub fn score_posting(profile: &Profile, posting: &Posting) -> Recommendation {
    let (score, matched) = calculate_skill_match(&profile.skills, &posting.skills);
    Recommendation {
        job: posting.clone(),
        score,
        match_reason: format!("Matches {} of your skills", matched.len()),
        skill_match: matched,
        skill_gaps: vec![],
        scorer_backend: ScorerBackend::Fallback,
    }
}

/// Scores every candidate and keeps those with a positive score, in candidate order.
pub fn recommend(profile: &Profile, candidates: &[Posting]) -> Vec<Recommendation> {
    candidates
        .iter()
        .map(|posting| score_posting(profile, posting))
        .filter(|r| r.score > 0)
        .collect()
}
