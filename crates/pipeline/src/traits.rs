//! Core traits for the candidate pipeline.
//!
//! This module defines the Filter trait that allows composable hygiene
//! passes to run over a candidate set before it is scored.

use anyhow::Result;
use flight_data::CandidateFlight;
use preferences::UserPreferences;

/// Core trait for filtering candidate flights.
///
/// All filters must implement this trait to be used in the FilterPipeline.
///
/// ## Design Note
/// - `Send + Sync` allows filters to be shared across threads
/// - Filters take ownership of the Vec and return the retained subset,
///   so no candidate is cloned along the way
pub trait Filter: Send + Sync {
    /// Returns the name of this filter (for logging/debugging)
    fn name(&self) -> &str;

    /// Apply this filter to a set of candidates.
    ///
    /// `preferences` is a read-only snapshot; filters never mutate it.
    fn apply(
        &self,
        candidates: Vec<CandidateFlight>,
        preferences: &UserPreferences,
    ) -> Result<Vec<CandidateFlight>>;
}
