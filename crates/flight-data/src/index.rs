//! Destination reference table.
//!
//! Static lookup from airport code to city and country. Used to enrich
//! candidate flights and to rank favorite countries from click history.

use crate::parser::normalize_code;
use crate::types::CandidateFlight;
use std::collections::HashMap;

/// One row of the reference table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub code: String,
    pub city: String,
    pub country: String,
}

/// Built-in reference rows: (code, city, country).
const REFERENCE_TABLE: &[(&str, &str, &str)] = &[
    // Western Europe
    ("CDG", "Paris", "France"),
    ("ORY", "Paris", "France"),
    ("NCE", "Nice", "France"),
    ("LYS", "Lyon", "France"),
    ("FCO", "Rome", "Italy"),
    ("MXP", "Milan", "Italy"),
    ("VCE", "Venice", "Italy"),
    ("NAP", "Naples", "Italy"),
    ("BCN", "Barcelona", "Spain"),
    ("MAD", "Madrid", "Spain"),
    ("AGP", "Malaga", "Spain"),
    ("PMI", "Palma de Mallorca", "Spain"),
    ("LIS", "Lisbon", "Portugal"),
    ("OPO", "Porto", "Portugal"),
    ("AMS", "Amsterdam", "Netherlands"),
    ("BRU", "Brussels", "Belgium"),
    ("LHR", "London", "United Kingdom"),
    ("LGW", "London", "United Kingdom"),
    ("MAN", "Manchester", "United Kingdom"),
    ("EDI", "Edinburgh", "United Kingdom"),
    ("DUB", "Dublin", "Ireland"),
    // Central Europe
    ("BER", "Berlin", "Germany"),
    ("MUC", "Munich", "Germany"),
    ("FRA", "Frankfurt", "Germany"),
    ("HAM", "Hamburg", "Germany"),
    ("VIE", "Vienna", "Austria"),
    ("ZRH", "Zurich", "Switzerland"),
    ("GVA", "Geneva", "Switzerland"),
    ("PRG", "Prague", "Czech Republic"),
    ("BUD", "Budapest", "Hungary"),
    ("WAW", "Warsaw", "Poland"),
    ("KRK", "Krakow", "Poland"),
    // Northern Europe
    ("CPH", "Copenhagen", "Denmark"),
    ("ARN", "Stockholm", "Sweden"),
    ("OSL", "Oslo", "Norway"),
    ("HEL", "Helsinki", "Finland"),
    ("KEF", "Reykjavik", "Iceland"),
    // Southern and Eastern Mediterranean
    ("ATH", "Athens", "Greece"),
    ("IST", "Istanbul", "Turkey"),
    ("SPU", "Split", "Croatia"),
    ("DBV", "Dubrovnik", "Croatia"),
    ("MLA", "Valletta", "Malta"),
    ("RAK", "Marrakesh", "Morocco"),
    ("CAI", "Cairo", "Egypt"),
    // Rest of the world
    ("DXB", "Dubai", "United Arab Emirates"),
    ("JFK", "New York", "United States"),
    ("LAX", "Los Angeles", "United States"),
    ("MIA", "Miami", "United States"),
    ("YYZ", "Toronto", "Canada"),
    ("YVR", "Vancouver", "Canada"),
    ("MEX", "Mexico City", "Mexico"),
    ("CUN", "Cancun", "Mexico"),
    ("GRU", "Sao Paulo", "Brazil"),
    ("EZE", "Buenos Aires", "Argentina"),
    ("NRT", "Tokyo", "Japan"),
    ("ICN", "Seoul", "South Korea"),
    ("SIN", "Singapore", "Singapore"),
    ("BKK", "Bangkok", "Thailand"),
    ("SYD", "Sydney", "Australia"),
    ("CPT", "Cape Town", "South Africa"),
];

/// Lookup table keyed by normalized airport code.
#[derive(Debug, Clone, Default)]
pub struct DestinationIndex {
    by_code: HashMap<String, Destination>,
}

impl DestinationIndex {
    /// Creates an empty index
    pub fn new() -> Self {
        Self {
            by_code: HashMap::new(),
        }
    }

    /// Index pre-populated with the built-in reference table.
    pub fn builtin() -> Self {
        let mut index = Self::new();
        for &(code, city, country) in REFERENCE_TABLE {
            index.insert(code, city, country);
        }
        index
    }

    pub fn insert(&mut self, code: &str, city: &str, country: &str) {
        let code = normalize_code(code);
        self.by_code.insert(
            code.clone(),
            Destination {
                code,
                city: city.to_string(),
                country: country.to_string(),
            },
        );
    }

    /// Look up a destination; codes are matched case-insensitively.
    pub fn get(&self, code: &str) -> Option<&Destination> {
        self.by_code.get(&normalize_code(code))
    }

    pub fn country_of(&self, code: &str) -> Option<&str> {
        self.get(code).map(|d| d.country.as_str())
    }

    /// Fill in `country` and `city` for every candidate we know about.
    ///
    /// Unknown destinations are left untouched (country stays `None`).
    pub fn enrich(&self, candidates: &mut [CandidateFlight]) -> usize {
        let mut matched = 0;
        for candidate in candidates.iter_mut() {
            if let Some(destination) = self.get(&candidate.destination_code) {
                candidate.country = Some(destination.country.clone());
                candidate.city = Some(destination.city.clone());
                matched += 1;
            }
        }
        matched
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}
