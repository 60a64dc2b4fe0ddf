//! The recommendation pass: enrich → filter → score → select.

use crate::diversity::{select_diverse, DEFAULT_LIMIT};
use crate::filter_pipeline::FilterPipeline;
use crate::filters::{DuplicateFlightFilter, SelfRouteFilter};
use crate::scoring::{score_all, ScoredFlight};
use anyhow::Result;
use flight_data::{CandidateFlight, DestinationIndex, Season};
use preferences::UserPreferences;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Turns raw candidate flights into a short, diverse, personalized list.
///
/// Read-only with respect to preferences: feedback goes through
/// `PreferenceStore`, and callers pass a fresh snapshot on each call.
pub struct RecommendationEngine {
    index: Arc<DestinationIndex>,
    filters: FilterPipeline,
    limit: usize,
}

impl RecommendationEngine {
    /// Engine with the default hygiene filters and a limit of 6.
    pub fn new(index: Arc<DestinationIndex>) -> Self {
        Self {
            index,
            filters: FilterPipeline::new()
                .add_filter(SelfRouteFilter)
                .add_filter(DuplicateFlightFilter),
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Replace the hygiene filters.
    pub fn with_filters(mut self, filters: FilterPipeline) -> Self {
        self.filters = filters;
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn index(&self) -> &Arc<DestinationIndex> {
        &self.index
    }

    /// Ranked recommendations, each with `recommendation_score` set.
    pub fn recommend(
        &self,
        candidates: Vec<CandidateFlight>,
        preferences: &UserPreferences,
        season: Season,
    ) -> Result<Vec<CandidateFlight>> {
        let start = Instant::now();
        let total = candidates.len();

        let scored = self.score(candidates, preferences, season)?;
        let selected = select_diverse(scored, self.limit);

        info!(
            "Recommended {} of {} candidates ({}) in {:?}",
            selected.len(),
            total,
            season,
            start.elapsed()
        );
        Ok(selected)
    }

    /// Every candidate that survives the filters, scored and explained,
    /// highest score first. Unmatched candidates are kept at the end.
    pub fn explain(
        &self,
        candidates: Vec<CandidateFlight>,
        preferences: &UserPreferences,
        season: Season,
    ) -> Result<Vec<ScoredFlight>> {
        let mut scored = self.score(candidates, preferences, season)?;
        scored.sort_by(|a, b| {
            b.is_matched()
                .cmp(&a.is_matched())
                .then(b.score().partial_cmp(&a.score()).unwrap_or(std::cmp::Ordering::Equal))
        });
        Ok(scored)
    }

    fn score(
        &self,
        mut candidates: Vec<CandidateFlight>,
        preferences: &UserPreferences,
        season: Season,
    ) -> Result<Vec<ScoredFlight>> {
        let matched = self.index.enrich(&mut candidates);
        if matched < candidates.len() {
            debug!(
                "{} of {} candidates have an unknown destination",
                candidates.len() - matched,
                candidates.len()
            );
        }

        let candidates = self.filters.apply(candidates, preferences)?;
        Ok(score_all(candidates, preferences, season))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use preferences::{FeedbackKind, PriceRange};

    fn flight(id: &str, dest: &str, price: f64) -> CandidateFlight {
        let date = NaiveDate::from_ymd_opt(2026, 7, 15).unwrap();
        CandidateFlight::new(id, "LHR", dest, price, date)
    }

    fn engine() -> RecommendationEngine {
        RecommendationEngine::new(Arc::new(DestinationIndex::builtin()))
    }

    #[test]
    fn test_recommend_scores_and_enriches() {
        let mut prefs = UserPreferences::new();
        prefs.price_range = PriceRange::new(100.0, 300.0);
        prefs.favorite_countries = vec!["France".to_string()];
        prefs.seasonal_preferences.summer = 2;

        let result = engine()
            .recommend(
                vec![flight("1", "BCN", 200.0), flight("2", "CDG", 200.0)],
                &prefs,
                Season::Summer,
            )
            .unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].destination_code, "CDG");
        assert_eq!(result[0].city.as_deref(), Some("Paris"));
        assert_eq!(result[0].recommendation_score, Some(14.5));
        assert_eq!(result[1].country.as_deref(), Some("Spain"));
        assert_eq!(result[1].recommendation_score, Some(6.5));
    }

    #[test]
    fn test_diversity_across_six_countries() {
        let candidates = vec![
            flight("1", "CDG", 120.0),
            flight("2", "NCE", 110.0),
            flight("3", "FCO", 130.0),
            flight("4", "MXP", 100.0),
            flight("5", "BCN", 140.0),
            flight("6", "AMS", 150.0),
            flight("7", "PRG", 160.0),
            flight("8", "VIE", 170.0),
            flight("9", "LIS", 180.0),
        ];

        let result = engine()
            .recommend(candidates, &UserPreferences::new(), Season::Autumn)
            .unwrap();

        assert_eq!(result.len(), 6);
        let mut countries: Vec<&str> = result.iter().filter_map(|f| f.country.as_deref()).collect();
        countries.sort();
        countries.dedup();
        assert_eq!(countries.len(), 6);
    }

    #[test]
    fn test_disliked_destination_loses_its_country_slot() {
        let mut prefs = UserPreferences::new();
        prefs.apply_feedback("CDG", FeedbackKind::Dislike);

        let candidates: Vec<CandidateFlight> = vec![
            flight("1", "CDG", 50.0),
            flight("2", "NCE", 900.0),
            flight("3", "FCO", 300.0),
            flight("4", "BCN", 300.0),
            flight("5", "AMS", 300.0),
            flight("6", "PRG", 300.0),
            flight("7", "VIE", 300.0),
        ];
        let result = engine().recommend(candidates, &prefs, Season::Winter).unwrap();

        assert_eq!(result.len(), 6);
        assert!(result.iter().all(|f| f.destination_code != "CDG"));
        assert!(result.iter().any(|f| f.destination_code == "NCE"));
    }

    #[test]
    fn test_disliked_destination_ranks_last_in_fallback() {
        let mut prefs = UserPreferences::new();
        prefs.apply_feedback("CDG", FeedbackKind::Dislike);

        let result = engine()
            .recommend(
                vec![flight("1", "CDG", 50.0), flight("2", "NCE", 900.0)],
                &prefs,
                Season::Winter,
            )
            .unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].destination_code, "NCE");
        assert_eq!(result[1].destination_code, "CDG");
        assert!(result[1].recommendation_score.unwrap() < 0.0);
    }

    #[test]
    fn test_unknown_and_self_routes_dropped() {
        let result = engine()
            .recommend(
                vec![
                    flight("1", "ZZZ", 50.0),
                    flight("2", "LHR", 50.0),
                    flight("3", "AMS", 90.0),
                ],
                &UserPreferences::new(),
                Season::Spring,
            )
            .unwrap();

        let codes: Vec<&str> = result.iter().map(|f| f.destination_code.as_str()).collect();
        assert_eq!(codes, vec!["AMS"]);
    }

    #[test]
    fn test_explain_lists_unmatched_last() {
        let explained = engine()
            .explain(
                vec![flight("1", "ZZZ", 50.0), flight("2", "AMS", 90.0)],
                &UserPreferences::new(),
                Season::Spring,
            )
            .unwrap();

        assert_eq!(explained.len(), 2);
        assert!(explained[0].is_matched());
        assert!(!explained[1].is_matched());
    }

    #[test]
    fn test_empty_input() {
        let result = engine()
            .recommend(Vec::new(), &UserPreferences::new(), Season::Summer)
            .unwrap();
        assert!(result.is_empty());
    }
}
