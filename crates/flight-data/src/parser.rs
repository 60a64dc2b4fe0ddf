//! Parser for candidate records returned by the booking API.
//!
//! Expected shape is a JSON array of:
//! `{id, destinationCode | destination, price, departureDate, imageUrl?}`
//!
//! Records that cannot be decoded are skipped with a warning; a payload
//! that is not an array at all is an error.

use crate::error::{DataError, Result};
use crate::types::{AirportCode, CandidateFlight};
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// Flight ids come back as strings or numbers depending on the backend.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCandidate {
    id: RawId,
    #[serde(default)]
    destination_code: Option<String>,
    /// Older backends send the code under `destination`
    #[serde(default)]
    destination: Option<String>,
    price: f64,
    departure_date: String,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    origin_code: Option<String>,
}

/// Parse a response body into candidate flights for `origin`.
///
/// Records without an explicit `originCode` inherit the requested origin.
pub fn parse_candidates(body: &str, origin: &str) -> Result<Vec<CandidateFlight>> {
    let payload: Value = serde_json::from_str(body)?;
    let records = match payload {
        Value::Array(records) => records,
        other => {
            return Err(DataError::NotAnArray {
                found: json_kind(&other).to_string(),
            });
        }
    };

    let total = records.len();
    let candidates: Vec<CandidateFlight> = records
        .into_iter()
        .enumerate()
        .filter_map(|(position, record)| match parse_record(record, origin) {
            Ok(candidate) => Some(candidate),
            Err(e) => {
                warn!("Skipping candidate record {}: {}", position, e);
                None
            }
        })
        .collect();

    if candidates.len() < total {
        warn!(
            "Decoded {} of {} candidate records for origin {}",
            candidates.len(),
            total,
            origin
        );
    }
    Ok(candidates)
}

fn parse_record(record: Value, origin: &str) -> Result<CandidateFlight> {
    let raw: RawCandidate = serde_json::from_value(record)?;

    if !raw.price.is_finite() || raw.price < 0.0 {
        return Err(DataError::InvalidValue {
            field: "price".to_string(),
            value: raw.price.to_string(),
        });
    }

    let raw_destination = raw
        .destination_code
        .filter(|code| !code.trim().is_empty())
        .or(raw.destination)
        .unwrap_or_default();
    let destination = normalize_code(&raw_destination);
    if destination.is_empty() {
        return Err(DataError::InvalidValue {
            field: "destinationCode".to_string(),
            value: raw_destination,
        });
    }

    let origin_code = raw
        .origin_code
        .as_deref()
        .map(normalize_code)
        .unwrap_or_else(|| normalize_code(origin));

    let mut candidate = CandidateFlight::new(
        raw.id.into_string(),
        origin_code,
        destination,
        raw.price,
        parse_departure_date(&raw.departure_date)?,
    );
    candidate.image_url = raw.image_url.filter(|url| !url.is_empty());
    Ok(candidate)
}

/// Parse a departure date given as `YYYY-MM-DD` or an RFC 3339 timestamp.
pub fn parse_departure_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.date_naive())
        .map_err(|_| DataError::InvalidValue {
            field: "departureDate".to_string(),
            value: s.to_string(),
        })
}

/// Upper-case and trim an airport code.
pub fn normalize_code(code: &str) -> AirportCode {
    code.trim().to_ascii_uppercase()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
