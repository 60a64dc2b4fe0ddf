//! Static sample destinations served in degraded mode.
//!
//! Placeholder data: prices are plausible round numbers and dates are a
//! few days to weeks ahead of `today`.

use chrono::{NaiveDate, TimeDelta};
use flight_data::parser::normalize_code;
use flight_data::CandidateFlight;

/// (destination code, price, days ahead of today)
const SAMPLE_DESTINATIONS: [(&str, f64, i64); 6] = [
    ("CDG", 129.0, 14), // Paris
    ("FCO", 149.0, 21), // Rome
    ("BCN", 119.0, 10), // Barcelona
    ("AMS", 99.0, 7),   // Amsterdam
    ("PRG", 89.0, 28),  // Prague
    ("VIE", 139.0, 18), // Vienna
];

/// The fallback candidate set for `origin`, dated relative to `today`.
pub fn fallback_candidates(origin: &str, today: NaiveDate) -> Vec<CandidateFlight> {
    let origin = normalize_code(origin);
    SAMPLE_DESTINATIONS
        .iter()
        .map(|&(code, price, days_ahead)| {
            CandidateFlight::new(
                format!("sample-{}-{}", origin, code),
                origin.clone(),
                code,
                price,
                today + TimeDelta::days(days_ahead),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flight_data::DestinationIndex;

    #[test]
    fn test_fallback_covers_six_cities() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let mut flights = fallback_candidates("lhr", today);
        DestinationIndex::builtin().enrich(&mut flights);

        let cities: Vec<&str> = flights.iter().filter_map(|f| f.city.as_deref()).collect();
        assert_eq!(
            cities,
            vec!["Paris", "Rome", "Barcelona", "Amsterdam", "Prague", "Vienna"]
        );
        assert!(flights.iter().all(|f| f.origin_code == "LHR"));
        assert!(flights.iter().all(|f| f.departure_date > today));
    }
}
