//! Defensive parsing of oracle output into [`PlaceRecord`]s.
//!
//! The oracle is a text generator, so its "JSON" may be wrapped in Markdown
//! fences or prose, and any field may be missing, mistyped or nonsense. Every
//! element is coerced on its own; elements that cannot be displayed (no name
//! or no usable location) are dropped rather than failing the whole payload.

use super::types::PlaceRecord;
use crate::location::GeoCoordinate;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

const PLACE_ID_KEYS: &[&str] = &["placeId", "place_id", "id"];
const NAME_KEYS: &[&str] = &["name", "title"];
const RATING_KEYS: &[&str] = &["rating"];
const REVIEW_COUNT_KEYS: &[&str] = &["reviewCount", "review_count", "userRatingsTotal", "user_ratings_total"];
const VICINITY_KEYS: &[&str] = &["vicinity", "address", "formattedAddress", "formatted_address"];
const LAT_KEYS: &[&str] = &["lat", "latitude"];
const LNG_KEYS: &[&str] = &["lng", "lon", "longitude"];

/// Why an oracle payload could not be read as a list of places.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("response is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("response is not a JSON array (got {0})")]
    NotAnArray(&'static str),
}

/// Parse raw oracle text into validated place records, in oracle order.
pub fn normalize(raw: &str) -> Result<Vec<PlaceRecord>, ParseError> {
    let value = parse_payload(raw)?;
    normalize_value(&value)
}

/// Normalize an already-parsed JSON value.
pub fn normalize_value(value: &Value) -> Result<Vec<PlaceRecord>, ParseError> {
    let items = value.as_array().ok_or(ParseError::NotAnArray(json_kind(value)))?;

    let records: Vec<PlaceRecord> = items.iter().filter_map(coerce_record).collect();

    let dropped = items.len() - records.len();
    if dropped > 0 {
        tracing::debug!(dropped, kept = records.len(), "dropped place records without name or location");
    }

    Ok(records)
}

/// Stable fallback ID derived from name and coordinate.
///
/// Identical content always maps to the same ID, so repeated suggestions of
/// one place collapse when de-duplicating.
pub fn synthesize_place_id(name: &str, location: GeoCoordinate) -> String {
    let key = format!(
        "{}|{:.6},{:.6}",
        name.trim().to_lowercase(),
        location.lat,
        location.lng
    );
    let digest = Sha256::digest(key.as_bytes());
    let hex: String = digest.iter().take(8).map(|b| format!("{:02x}", b)).collect();
    format!("gen-{}", hex)
}

/// Parse the text, tolerating code fences and surrounding prose.
fn parse_payload(raw: &str) -> Result<Value, ParseError> {
    let body = strip_code_fence(raw.trim());

    match serde_json::from_str(body) {
        Ok(v) => Ok(v),
        Err(first_err) => {
            // "Here are some places: [ ... ] Enjoy!"
            if let (Some(start), Some(end)) = (body.find('['), body.rfind(']')) {
                if start < end {
                    if let Ok(v) = serde_json::from_str(&body[start..=end]) {
                        return Ok(v);
                    }
                }
            }
            Err(ParseError::InvalidJson(first_err))
        }
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(open) = text.find("```") else {
        return text;
    };
    let after_open = &text[open + 3..];
    // Skip the info string ("json") up to the end of the fence line.
    let content_start = after_open.find('\n').map(|i| i + 1).unwrap_or(after_open.len());
    let content = &after_open[content_start..];
    match content.find("```") {
        Some(close) => content[..close].trim(),
        None => content.trim(),
    }
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

fn coerce_record(value: &Value) -> Option<PlaceRecord> {
    let obj = value.as_object()?;

    let name = first_of(obj, NAME_KEYS).and_then(as_text)?;
    let location = location_of(obj)?;

    let place_id = first_of(obj, PLACE_ID_KEYS)
        .and_then(as_text)
        .unwrap_or_else(|| synthesize_place_id(&name, location));

    let rating = first_of(obj, RATING_KEYS).and_then(as_number).unwrap_or(0.0);

    let review_count = first_of(obj, REVIEW_COUNT_KEYS)
        .and_then(as_number)
        .filter(|n| *n > 0.0)
        .map(|n| n.trunc() as u64)
        .unwrap_or(0);

    let vicinity = first_of(obj, VICINITY_KEYS).and_then(as_text);

    let mut types: Vec<String> = Vec::new();
    if let Some(items) = obj.get("types").and_then(Value::as_array) {
        for t in items.iter().filter_map(as_text) {
            if !types.contains(&t) {
                types.push(t);
            }
        }
    }

    Some(PlaceRecord {
        place_id,
        name,
        rating,
        review_count,
        vicinity,
        location,
        types,
    })
}

fn first_of<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| obj.get(*k).filter(|v| !v.is_null()))
}

/// Non-blank trimmed string; numbers are accepted and stringified.
fn as_text(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Finite number, or a string that parses as one.
fn as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// `location: {lat, lng}` or Places-API style `geometry.location`.
fn location_of(obj: &Map<String, Value>) -> Option<GeoCoordinate> {
    let loc = obj
        .get("location")
        .or_else(|| obj.get("geometry").and_then(|g| g.get("location")))?
        .as_object()?;
    let lat = first_of(loc, LAT_KEYS).and_then(as_number)?;
    let lng = first_of(loc, LNG_KEYS).and_then(as_number)?;
    GeoCoordinate::new(lat, lng).ok()
}
