//! Preference record types.
//!
//! `UserPreferences` holds two kinds of fields:
//! - raw history (searches, clicks, like/dislike feedback), the source of truth
//! - derived caches (favorite countries, price range, seasonal affinity),
//!   always recomputable from the raw history by `analysis::derive`

use chrono::{DateTime, NaiveDate, Utc};
use flight_data::parser::normalize_code;
use flight_data::{AirportCode, DataError, Season};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Maximum entries kept in each raw history list
pub const HISTORY_LIMIT: usize = 20;

/// Maximum number of favorite countries kept
pub const MAX_FAVORITE_COUNTRIES: usize = 5;

/// A search submission observed from the storefront.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchEvent {
    pub origin_code: AirportCode,
    pub action: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_code: Option<AirportCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_date: Option<NaiveDate>,
}

impl SearchEvent {
    pub fn new(origin_code: &str, action: impl Into<String>) -> Self {
        Self {
            origin_code: normalize_code(origin_code),
            action: action.into(),
            timestamp: Utc::now(),
            destination_code: None,
            price: None,
            departure_date: None,
        }
    }

    pub fn with_destination(mut self, code: &str) -> Self {
        self.destination_code = Some(normalize_code(code));
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_departure_date(mut self, date: NaiveDate) -> Self {
        self.departure_date = Some(date);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickEvent {
    pub code: AirportCode,
    pub timestamp: DateTime<Utc>,
}

/// Explicit feedback on a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    Like,
    Dislike,
}

impl fmt::Display for FeedbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedbackKind::Like => f.write_str("like"),
            FeedbackKind::Dislike => f.write_str("dislike"),
        }
    }
}

impl FromStr for FeedbackKind {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "like" => Ok(FeedbackKind::Like),
            "dislike" => Ok(FeedbackKind::Dislike),
            _ => Err(DataError::InvalidValue {
                field: "feedback".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Price band the user has historically searched in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, price: f64) -> bool {
        price >= self.min && price <= self.max
    }
}

impl Default for PriceRange {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 1000.0,
        }
    }
}

/// How often each season showed up in searched departure dates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonalAffinity {
    pub spring: u32,
    pub summer: u32,
    pub autumn: u32,
    pub winter: u32,
}

impl SeasonalAffinity {
    pub fn get(&self, season: Season) -> u32 {
        match season {
            Season::Spring => self.spring,
            Season::Summer => self.summer,
            Season::Autumn => self.autumn,
            Season::Winter => self.winter,
        }
    }

    pub fn increment(&mut self, season: Season) {
        match season {
            Season::Spring => self.spring += 1,
            Season::Summer => self.summer += 1,
            Season::Autumn => self.autumn += 1,
            Season::Winter => self.winter += 1,
        }
    }
}

/// The derived (cache) part of the preferences, compared as a unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedPreferences {
    pub favorite_countries: Vec<String>,
    pub price_range: PriceRange,
    pub seasonal_preferences: SeasonalAffinity,
}

/// Everything we know about a user's travel preferences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPreferences {
    // Raw history
    pub search_history: Vec<SearchEvent>,
    pub clicked_destinations: Vec<ClickEvent>,
    pub liked_destinations: BTreeSet<AirportCode>,
    pub disliked_destinations: BTreeSet<AirportCode>,

    // Derived caches
    pub favorite_countries: Vec<String>,
    pub price_range: PriceRange,
    pub seasonal_preferences: SeasonalAffinity,

    pub last_updated: Option<DateTime<Utc>>,
}

impl UserPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a search, evicting the oldest entries past the limit.
    pub fn push_search(&mut self, event: SearchEvent) {
        self.search_history.push(event);
        truncate_oldest(&mut self.search_history);
    }

    pub fn push_click(&mut self, code: &str, timestamp: DateTime<Utc>) {
        self.clicked_destinations.push(ClickEvent {
            code: normalize_code(code),
            timestamp,
        });
        truncate_oldest(&mut self.clicked_destinations);
    }

    /// Apply like/dislike feedback. A code is never in both sets.
    ///
    /// Returns `true` if anything changed.
    pub fn apply_feedback(&mut self, code: &str, kind: FeedbackKind) -> bool {
        let code = normalize_code(code);
        let (add_to, remove_from) = match kind {
            FeedbackKind::Like => (&mut self.liked_destinations, &mut self.disliked_destinations),
            FeedbackKind::Dislike => (&mut self.disliked_destinations, &mut self.liked_destinations),
        };
        let removed = remove_from.remove(&code);
        let added = add_to.insert(code);
        removed || added
    }

    pub fn is_liked(&self, code: &str) -> bool {
        self.liked_destinations.contains(&normalize_code(code))
    }

    pub fn is_disliked(&self, code: &str) -> bool {
        self.disliked_destinations.contains(&normalize_code(code))
    }

    pub fn has_clicked(&self, code: &str) -> bool {
        let code = normalize_code(code);
        self.clicked_destinations.iter().any(|c| c.code == code)
    }

    pub fn is_favorite_country(&self, country: &str) -> bool {
        self.favorite_countries
            .iter()
            .take(MAX_FAVORITE_COUNTRIES)
            .any(|c| c == country)
    }

    /// Current derived caches.
    pub fn derived(&self) -> DerivedPreferences {
        DerivedPreferences {
            favorite_countries: self.favorite_countries.clone(),
            price_range: self.price_range,
            seasonal_preferences: self.seasonal_preferences,
        }
    }

    pub fn set_derived(&mut self, derived: DerivedPreferences) {
        self.favorite_countries = derived.favorite_countries;
        self.price_range = derived.price_range;
        self.seasonal_preferences = derived.seasonal_preferences;
    }
}

fn truncate_oldest<T>(history: &mut Vec<T>) {
    if history.len() > HISTORY_LIMIT {
        let overflow = history.len() - HISTORY_LIMIT;
        history.drain(..overflow);
    }
}
