//! Filter to collapse repeated flight ids.
//!
//! Keeps the cheaper listing when the same id shows up more than once, and
//! otherwise preserves the order of first appearance.

use crate::traits::Filter;
use anyhow::Result;
use flight_data::CandidateFlight;
use preferences::UserPreferences;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

pub struct DuplicateFlightFilter;

impl Filter for DuplicateFlightFilter {
    fn name(&self) -> &str {
        "DuplicateFlightFilter"
    }

    fn apply(
        &self,
        candidates: Vec<CandidateFlight>,
        _preferences: &UserPreferences,
    ) -> Result<Vec<CandidateFlight>> {
        let mut slots: HashMap<String, usize> = HashMap::with_capacity(candidates.len());
        let mut kept: Vec<CandidateFlight> = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            match slots.entry(candidate.id.clone()) {
                Entry::Occupied(slot) => {
                    let existing = &mut kept[*slot.get()];
                    if candidate.price < existing.price {
                        *existing = candidate;
                    }
                }
                Entry::Vacant(slot) => {
                    slot.insert(kept.len());
                    kept.push(candidate);
                }
            }
        }

        Ok(kept)
    }
}
