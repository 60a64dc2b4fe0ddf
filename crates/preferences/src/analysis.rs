//! Re-derive cached preference fields from raw history.
//!
//! - Favorite countries: countries of clicked destinations, ranked by
//!   click count (ties go to the more recently clicked country), top 5
//! - Price range: min/max of prices seen in search history
//! - Seasonal affinity: season counts of searched departure dates

use crate::types::{
    DerivedPreferences, PriceRange, SeasonalAffinity, UserPreferences, MAX_FAVORITE_COUNTRIES,
};
use flight_data::{DestinationIndex, Season};
use std::collections::HashMap;

/// Compute the derived fields for `prefs`.
///
/// Pure function of the raw history; calling it twice on the same input
/// gives the same output.
pub fn derive(prefs: &UserPreferences, index: &DestinationIndex) -> DerivedPreferences {
    DerivedPreferences {
        favorite_countries: rank_favorite_countries(prefs, index),
        price_range: observed_price_range(prefs),
        seasonal_preferences: seasonal_affinity(prefs),
    }
}

fn rank_favorite_countries(prefs: &UserPreferences, index: &DestinationIndex) -> Vec<String> {
    // country -> (click count, position of most recent click)
    let mut stats: HashMap<&str, (u32, usize)> = HashMap::new();
    for (position, click) in prefs.clicked_destinations.iter().enumerate() {
        if let Some(country) = index.country_of(&click.code) {
            let entry = stats.entry(country).or_insert((0, position));
            entry.0 += 1;
            entry.1 = position;
        }
    }

    let mut ranked: Vec<(&str, (u32, usize))> = stats.into_iter().collect();
    ranked.sort_by(|(_, (count_a, last_a)), (_, (count_b, last_b))| {
        count_b.cmp(count_a).then_with(|| last_b.cmp(last_a))
    });

    ranked
        .into_iter()
        .take(MAX_FAVORITE_COUNTRIES)
        .map(|(country, _)| country.to_string())
        .collect()
}

fn observed_price_range(prefs: &UserPreferences) -> PriceRange {
    let mut prices = prefs
        .search_history
        .iter()
        .filter_map(|event| event.price)
        .filter(|price| price.is_finite() && *price >= 0.0);

    let Some(first) = prices.next() else {
        return PriceRange::default();
    };
    let (min, max) = prices.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
    PriceRange::new(min, max)
}

fn seasonal_affinity(prefs: &UserPreferences) -> SeasonalAffinity {
    let mut affinity = SeasonalAffinity::default();
    for date in prefs.search_history.iter().filter_map(|e| e.departure_date) {
        affinity.increment(Season::of_date(date));
    }
    affinity
}
