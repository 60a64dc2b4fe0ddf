//! The FilterPipeline chains hygiene filters together.

use crate::traits::Filter;
use anyhow::{Context, Result};
use flight_data::CandidateFlight;
use preferences::UserPreferences;

/// Chains multiple filters together into a processing pipeline.
///
/// ## Usage
/// ```ignore
/// let pipeline = FilterPipeline::new()
///     .add_filter(SelfRouteFilter)
///     .add_filter(DuplicateFlightFilter);
///
/// let cleaned = pipeline.apply(candidates, &preferences)?;
/// ```
pub struct FilterPipeline {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterPipeline {
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Add a filter to the pipeline (builder pattern).
    pub fn add_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Number of filters in the chain
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Apply all filters in insertion order.
    pub fn apply(
        &self,
        candidates: Vec<CandidateFlight>,
        preferences: &UserPreferences,
    ) -> Result<Vec<CandidateFlight>> {
        let mut current = candidates;
        for filter in &self.filters {
            let before = current.len();
            current = filter
                .apply(current, preferences)
                .with_context(|| format!("filter {} failed", filter.name()))?;
            tracing::debug!(
                "Filter {}: {} -> {} candidates",
                filter.name(),
                before,
                current.len()
            );
        }
        Ok(current)
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{DuplicateFlightFilter, SelfRouteFilter};
    use chrono::NaiveDate;

    fn flight(id: &str, origin: &str, dest: &str, price: f64) -> CandidateFlight {
        let date = NaiveDate::from_ymd_opt(2026, 12, 1).unwrap();
        CandidateFlight::new(id, origin, dest, price, date)
    }

    #[test]
    fn test_empty_pipeline() {
        let pipeline = FilterPipeline::new();
        assert!(pipeline.is_empty());

        let candidates = vec![
            flight("1", "LHR", "CDG", 100.0),
            flight("2", "LHR", "FCO", 120.0),
        ];
        let filtered = pipeline
            .apply(candidates.clone(), &UserPreferences::new())
            .unwrap();
        assert_eq!(filtered, candidates);
    }

    #[test]
    fn test_filters_run_in_sequence() {
        let pipeline = FilterPipeline::new()
            .add_filter(SelfRouteFilter)
            .add_filter(DuplicateFlightFilter);
        assert_eq!(pipeline.len(), 2);

        let candidates = vec![
            flight("1", "LHR", "LHR", 10.0),
            flight("2", "LHR", "CDG", 150.0),
            flight("2", "LHR", "CDG", 130.0),
            flight("3", "LHR", "AMS", 90.0),
        ];

        let filtered = pipeline.apply(candidates, &UserPreferences::new()).unwrap();
        let ids: Vec<&str> = filtered.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3"]);
        assert_eq!(filtered[0].price, 130.0);
    }
}
