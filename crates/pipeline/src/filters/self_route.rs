//! Filter to drop flights that return to their own origin.
//!
//! The booking API occasionally lists the origin airport among the
//! "nearby" destinations; recommending it makes no sense.

use crate::traits::Filter;
use anyhow::Result;
use flight_data::CandidateFlight;
use preferences::UserPreferences;

/// Removes candidates whose destination equals their origin.
pub struct SelfRouteFilter;

impl Filter for SelfRouteFilter {
    fn name(&self) -> &str {
        "SelfRouteFilter"
    }

    fn apply(
        &self,
        candidates: Vec<CandidateFlight>,
        _preferences: &UserPreferences,
    ) -> Result<Vec<CandidateFlight>> {
        Ok(candidates
            .into_iter()
            .filter(|c| !c.destination_code.eq_ignore_ascii_case(&c.origin_code))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_self_route_filter() {
        let date = NaiveDate::from_ymd_opt(2026, 12, 1).unwrap();
        let candidates = vec![
            CandidateFlight::new("1", "LHR", "CDG", 100.0, date),
            CandidateFlight::new("2", "LHR", "lhr", 50.0, date),
            CandidateFlight::new("3", "LHR", "AMS", 80.0, date),
        ];

        let filtered = SelfRouteFilter
            .apply(candidates, &UserPreferences::new())
            .unwrap();

        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].id, "1");
        assert_eq!(filtered[1].id, "3");
    }
}
