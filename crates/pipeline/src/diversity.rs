//! Diversity-enforced top-N selection.
//!
//! ## Algorithm
//! 1. Drop unmatched candidates, sort the rest by score (descending)
//! 2. Take the best positively-scored candidate per distinct country
//! 3. Fill the remaining slots with the next best positive scores,
//!    regardless of country
//! 4. Still short of `limit`: fall back to the plain top-`limit` by score
//!
//! The result is returned in descending score order.

use crate::scoring::ScoredFlight;
use flight_data::CandidateFlight;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Default number of recommendations shown
pub const DEFAULT_LIMIT: usize = 6;

fn by_score_desc(a: &ScoredFlight, b: &ScoredFlight) -> Ordering {
    b.score().partial_cmp(&a.score()).unwrap_or(Ordering::Equal)
}

/// Select up to `limit` candidates, spreading them across countries.
pub fn select_diverse(scored: Vec<ScoredFlight>, limit: usize) -> Vec<CandidateFlight> {
    let mut ranked: Vec<ScoredFlight> = scored.into_iter().filter(|s| s.is_matched()).collect();
    ranked.sort_by(by_score_desc);

    let mut taken = vec![false; ranked.len()];
    let mut picked = 0;

    // Pass 1: one per country
    let mut countries: HashSet<&str> = HashSet::new();
    for (i, candidate) in ranked.iter().enumerate() {
        if picked == limit {
            break;
        }
        if candidate.score() <= 0.0 {
            continue;
        }
        let country = candidate.flight.country.as_deref().unwrap_or_default();
        if countries.insert(country) {
            taken[i] = true;
            picked += 1;
        }
    }

    // Pass 2: best remaining positives
    for (i, candidate) in ranked.iter().enumerate() {
        if picked == limit {
            break;
        }
        if !taken[i] && candidate.score() > 0.0 {
            taken[i] = true;
            picked += 1;
        }
    }

    if picked < limit {
        tracing::debug!(
            "Only {} positively scored candidates, using plain top {}",
            picked,
            limit
        );
        return ranked.into_iter().take(limit).map(|s| s.flight).collect();
    }

    ranked
        .into_iter()
        .zip(taken)
        .filter_map(|(s, keep)| keep.then_some(s.flight))
        .collect()
}
