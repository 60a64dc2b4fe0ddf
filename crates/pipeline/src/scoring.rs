//! Additive scoring of enriched candidate flights.
//!
//! Each candidate gets a `ScoreBreakdown` whose terms sum to its
//! recommendation score:
//!
//! | term        | value                                                    |
//! |-------------|----------------------------------------------------------|
//! | country     | +10 if the country is one of the top-5 favorites         |
//! | price       | `5 × (1 − (p − min)/(max − min))` inside the price range |
//! | season      | + observation count for the current season               |
//! | feedback    | +15 liked, −20 disliked                                  |
//! | click       | +5 if the destination was clicked before                 |
//! | exploration | +2 if the country is not a favorite                      |
//!
//! Candidates whose destination is not in the reference table are
//! unmatched: they score 0 and carry no breakdown.

use flight_data::{CandidateFlight, Season};
use preferences::{PriceRange, UserPreferences};
use rayon::prelude::*;

pub const FAVORITE_COUNTRY_BONUS: f64 = 10.0;
pub const PRICE_WEIGHT: f64 = 5.0;
pub const LIKED_BONUS: f64 = 15.0;
pub const DISLIKED_PENALTY: f64 = -20.0;
pub const CLICKED_BONUS: f64 = 5.0;
pub const EXPLORATION_BONUS: f64 = 2.0;

/// Per-term contributions to a candidate's score.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreBreakdown {
    pub country: f64,
    pub price: f64,
    pub season: f64,
    pub feedback: f64,
    pub click: f64,
    pub exploration: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.country + self.price + self.season + self.feedback + self.click + self.exploration
    }
}

/// A candidate together with the explanation of its score.
#[derive(Debug, Clone)]
pub struct ScoredFlight {
    /// `recommendation_score` is always set
    pub flight: CandidateFlight,
    /// `None` for unmatched destinations
    pub breakdown: Option<ScoreBreakdown>,
}

impl ScoredFlight {
    pub fn score(&self) -> f64 {
        self.flight.recommendation_score.unwrap_or(0.0)
    }

    pub fn is_matched(&self) -> bool {
        self.breakdown.is_some()
    }
}

/// Price term: cheaper-within-range scores higher; no term outside the range.
pub fn price_term(price: f64, range: &PriceRange) -> f64 {
    if !range.contains(price) {
        return 0.0;
    }
    let span = range.max - range.min;
    if span <= 0.0 {
        return 0.0;
    }
    PRICE_WEIGHT * (1.0 - (price - range.min) / span)
}

/// Score one candidate. Returns `None` if its country is unknown.
pub fn score_breakdown(
    candidate: &CandidateFlight,
    preferences: &UserPreferences,
    season: Season,
) -> Option<ScoreBreakdown> {
    let country = candidate.country.as_deref()?;
    let code = candidate.destination_code.as_str();
    let favorite = preferences.is_favorite_country(country);

    let feedback = if preferences.is_disliked(code) {
        DISLIKED_PENALTY
    } else if preferences.is_liked(code) {
        LIKED_BONUS
    } else {
        0.0
    };

    Some(ScoreBreakdown {
        country: if favorite { FAVORITE_COUNTRY_BONUS } else { 0.0 },
        price: price_term(candidate.price, &preferences.price_range),
        season: f64::from(preferences.seasonal_preferences.get(season)),
        feedback,
        click: if preferences.has_clicked(code) { CLICKED_BONUS } else { 0.0 },
        exploration: if favorite { 0.0 } else { EXPLORATION_BONUS },
    })
}

/// Score every candidate in parallel, preserving input order.
pub fn score_all(
    candidates: Vec<CandidateFlight>,
    preferences: &UserPreferences,
    season: Season,
) -> Vec<ScoredFlight> {
    candidates
        .into_par_iter()
        .map(|mut flight| {
            let breakdown = score_breakdown(&flight, preferences, season);
            flight.recommendation_score = Some(breakdown.map_or(0.0, |b| b.total()));
            ScoredFlight { flight, breakdown }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use preferences::FeedbackKind;

    fn enriched(code: &str, country: &str, price: f64) -> CandidateFlight {
        let date = NaiveDate::from_ymd_opt(2026, 7, 10).unwrap();
        let mut flight = CandidateFlight::new(format!("f-{}", code), "LHR", code, price, date);
        flight.country = Some(country.to_string());
        flight
    }

    fn summer_france_prefs() -> UserPreferences {
        let mut prefs = UserPreferences::new();
        prefs.price_range = PriceRange::new(100.0, 300.0);
        prefs.favorite_countries = vec!["France".to_string()];
        prefs.seasonal_preferences.summer = 2;
        prefs
    }

    #[test]
    fn test_favorite_country_scenario() {
        let prefs = summer_france_prefs();

        let france = score_breakdown(&enriched("CDG", "France", 200.0), &prefs, Season::Summer).unwrap();
        assert_eq!(france.country, 10.0);
        assert_eq!(france.price, 2.5);
        assert_eq!(france.season, 2.0);
        assert_eq!(france.exploration, 0.0);
        assert!((france.total() - 14.5).abs() < 1e-9);

        let spain = score_breakdown(&enriched("BCN", "Spain", 200.0), &prefs, Season::Summer).unwrap();
        assert_eq!(spain.exploration, 2.0);
        assert!((spain.total() - 6.5).abs() < 1e-9);
    }

    #[test]
    fn test_price_term_bounds() {
        let range = PriceRange::new(100.0, 300.0);
        assert_eq!(price_term(100.0, &range), 5.0);
        assert_eq!(price_term(300.0, &range), 0.0);
        assert_eq!(price_term(99.0, &range), 0.0);
        assert_eq!(price_term(301.0, &range), 0.0);

        let flat = PriceRange::new(150.0, 150.0);
        assert_eq!(price_term(150.0, &flat), 0.0);
    }

    #[test]
    fn test_feedback_and_click_terms() {
        let mut prefs = UserPreferences::new();
        prefs.apply_feedback("FCO", FeedbackKind::Like);
        prefs.apply_feedback("BCN", FeedbackKind::Dislike);
        prefs.push_click("FCO", chrono::Utc::now());

        let rome = score_breakdown(&enriched("FCO", "Italy", 2000.0), &prefs, Season::Winter).unwrap();
        assert_eq!(rome.feedback, 15.0);
        assert_eq!(rome.click, 5.0);

        let barcelona = score_breakdown(&enriched("BCN", "Spain", 2000.0), &prefs, Season::Winter).unwrap();
        assert_eq!(barcelona.feedback, -20.0);
        assert_eq!(barcelona.click, 0.0);
    }

    #[test]
    fn test_dislike_dominates_positive_signals() {
        let mut prefs = summer_france_prefs();
        prefs.push_click("CDG", chrono::Utc::now());
        let baseline = score_breakdown(&enriched("CDG", "France", 100.0), &prefs, Season::Summer)
            .unwrap()
            .total();

        prefs.apply_feedback("CDG", FeedbackKind::Dislike);
        let disliked = score_breakdown(&enriched("CDG", "France", 100.0), &prefs, Season::Summer)
            .unwrap()
            .total();

        assert!(disliked < baseline);
        assert_eq!(baseline - disliked, 20.0);
    }

    #[test]
    fn test_unmatched_candidate_scores_zero() {
        let date = NaiveDate::from_ymd_opt(2026, 7, 10).unwrap();
        let unknown = CandidateFlight::new("x", "LHR", "ZZZ", 120.0, date);
        let known = enriched("CDG", "France", 120.0);

        let scored = score_all(vec![unknown, known], &summer_france_prefs(), Season::Summer);

        assert_eq!(scored.len(), 2);
        assert!(!scored[0].is_matched());
        assert_eq!(scored[0].flight.recommendation_score, Some(0.0));
        assert!(scored[1].is_matched());
        assert!(scored[1].score() > 0.0);
    }
}
