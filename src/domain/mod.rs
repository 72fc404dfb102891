use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One raw occurrence tuple as it appears on the wire:
/// `[startDate, startTime, endDate, endTime]`, date as `YYYY-MM-DD`, time as
/// free-form 12-hour text or empty.
pub type RawOccurrence = (
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
);

/// Raw event record as delivered by the backend payload.
///
/// Coordinates arrive as either JSON numbers or numeric strings, so they
/// stay `serde_json::Value` until normalization decides whether the record
/// is usable at all.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEventRecord {
    pub name: Option<String>,
    pub location: Option<String>,
    pub sublocation: Option<String>,
    pub short_name: Option<String>,
    pub description: Option<String>,
    pub emoji: Option<String>,
    pub lat: Option<serde_json::Value>,
    pub lng: Option<serde_json::Value>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub occurrences: Option<Vec<RawOccurrence>>,
}

/// Raw location record as delivered by the backend payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RawLocationRecord {
    pub lat: Option<serde_json::Value>,
    pub lng: Option<serde_json::Value>,
    pub name: Option<String>,
    pub short_name: Option<String>,
    pub emoji: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// A deduplicated place on the map, keyed by its coordinate text.
#[derive(Debug, Clone, Serialize)]
pub struct Location {
    pub key: String,
    pub name: String,
    pub short_name: Option<String>,
    pub emoji: Option<String>,
    pub tags: Vec<String>,
    pub lat: String,
    pub lng: String,
}

/// One concrete start/end span on which an event takes place.
///
/// The original time-of-day strings are retained verbatim for display
/// formatting downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Occurrence {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub start_time_text: String,
    pub end_time_text: String,
}

/// A normalized, admitted event.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    /// Ordinal identifier, unique within a load generation.
    pub id: u32,
    pub name: String,
    pub short_name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub sublocation: Option<String>,
    pub emoji: Option<String>,
    /// Coordinates exactly as supplied, not reformatted.
    pub lat: String,
    pub lng: String,
    pub location_key: String,
    /// The event's own tags; location tags are merged at index time only.
    pub tags: Vec<String>,
    /// Ascending by start.
    pub occurrences: Vec<Occurrence>,
}

/// Textual form of a raw coordinate: a JSON number prints itself, a
/// non-empty string passes through verbatim, anything else is unusable.
pub fn coordinate_text(value: Option<&serde_json::Value>) -> Option<String> {
    match value {
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// The `"{lat},{lng}"` identity of a location: exact textual match, not
/// geometric proximity.
pub fn coordinate_key(lat: &str, lng: &str) -> String {
    format!("{},{}", lat, lng)
}
