//! Core domain types shared by every crate in the workspace.
//!
//! - `CandidateFlight`: one bookable flight offer, produced per fetch
//! - `OriginContext`: where the user is flying from
//! - `Season`: coarse travel season derived from a calendar month

use crate::error::DataError;
use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Airport / destination code (IATA style, e.g. "CDG")
pub type AirportCode = String;

/// Identifier of a flight offer as returned by the booking API
pub type FlightId = String;

// =============================================================================
// Candidate flights
// =============================================================================

/// A candidate flight offer.
///
/// Built from the remote API (or the static fallback set), then enriched
/// with `country`/`city` from the destination table, and finally annotated
/// with a `recommendation_score` by the recommendation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateFlight {
    pub id: FlightId,
    pub destination_code: AirportCode,
    pub origin_code: AirportCode,
    pub price: f64,
    pub departure_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Filled in by `DestinationIndex::enrich`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    /// Filled in by the recommendation engine. May be negative.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation_score: Option<f64>,
}

impl CandidateFlight {
    /// Create a bare (not yet enriched or scored) candidate.
    pub fn new(
        id: impl Into<FlightId>,
        origin_code: impl Into<AirportCode>,
        destination_code: impl Into<AirportCode>,
        price: f64,
        departure_date: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            destination_code: destination_code.into(),
            origin_code: origin_code.into(),
            price,
            departure_date,
            image_url: None,
            country: None,
            city: None,
            recommendation_score: None,
        }
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    /// Whether the destination was matched against the reference table.
    pub fn is_enriched(&self) -> bool {
        self.country.is_some()
    }
}

// =============================================================================
// Origin
// =============================================================================

/// The origin a "nearby flights" request is made for.
///
/// Supplied by an external collaborator (geolocation or a default pick).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OriginContext {
    pub code: AirportCode,
    pub city: String,
    pub country: String,
}

impl OriginContext {
    pub fn new(
        code: impl Into<AirportCode>,
        city: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            city: city.into(),
            country: country.into(),
        }
    }
}

// =============================================================================
// Seasons
// =============================================================================

/// Travel season, using northern-hemisphere meteorological seasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Spring, Season::Summer, Season::Autumn, Season::Winter];

    /// Map a calendar month (1-12) to its season.
    ///
    /// Mar-May spring, Jun-Aug summer, Sep-Nov autumn, Dec-Feb winter.
    pub fn from_month(month: u32) -> Self {
        match month {
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            9..=11 => Season::Autumn,
            _ => Season::Winter,
        }
    }

    pub fn of_date(date: NaiveDate) -> Self {
        Self::from_month(date.month())
    }

    /// Season of today's date (UTC).
    pub fn current() -> Self {
        Self::of_date(Utc::now().date_naive())
    }

    pub fn label(&self) -> &'static str {
        match self {
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Autumn => "autumn",
            Season::Winter => "winter",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Season {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spring" => Ok(Season::Spring),
            "summer" => Ok(Season::Summer),
            "autumn" | "fall" => Ok(Season::Autumn),
            "winter" => Ok(Season::Winter),
            _ => Err(DataError::InvalidValue {
                field: "season".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_season_from_month() {
        assert_eq!(Season::from_month(1), Season::Winter);
        assert_eq!(Season::from_month(3), Season::Spring);
        assert_eq!(Season::from_month(7), Season::Summer);
        assert_eq!(Season::from_month(10), Season::Autumn);
        assert_eq!(Season::from_month(12), Season::Winter);
    }

    #[test]
    fn test_season_parse() {
        assert_eq!("Summer".parse::<Season>().unwrap(), Season::Summer);
        assert_eq!("fall".parse::<Season>().unwrap(), Season::Autumn);
        assert!("monsoon".parse::<Season>().is_err());
    }

    #[test]
    fn test_candidate_serializes_camel_case() {
        let date = NaiveDate::from_ymd_opt(2026, 11, 2).unwrap();
        let flight = CandidateFlight::new("F1", "LHR", "CDG", 120.0, date);
        let json = serde_json::to_value(&flight).unwrap();

        assert_eq!(json["destinationCode"], "CDG");
        assert_eq!(json["departureDate"], "2026-11-02");
        assert!(json.get("recommendationScore").is_none());
    }
}
