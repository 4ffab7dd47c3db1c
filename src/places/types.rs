//! Place records as shown to the user.

use crate::location::GeoCoordinate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A validated place suggested by the oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceRecord {
    /// Oracle-supplied ID, or a content hash when the oracle gave none.
    pub place_id: String,
    pub name: String,
    /// Star rating, normally 0–5; 0 when unknown.
    pub rating: f64,
    pub review_count: u64,
    /// Free-text locality ("123 Main St, Springfield, IL").
    #[serde(default)]
    pub vicinity: Option<String>,
    pub location: GeoCoordinate,
    #[serde(default)]
    pub types: Vec<String>,
}

/// A place with its distance from the user attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedPlace {
    #[serde(flatten)]
    pub place: PlaceRecord,
    /// `None` when no finite distance could be computed.
    pub distance_km: Option<f64>,
}

/// Ordering applied to the visible list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Distance,
    Rating,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Distance => write!(f, "distance"),
            Self::Rating => write!(f, "rating"),
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "distance" | "nearest" => Ok(Self::Distance),
            "rating" | "best" => Ok(Self::Rating),
            other => Err(format!("Unknown sort '{}'. Use 'distance' or 'rating'.", other)),
        }
    }
}
