//! Core types for the location subsystem.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A point on the Earth's surface in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    #[serde(alias = "latitude")]
    pub lat: f64,
    #[serde(alias = "lon", alias = "longitude")]
    pub lng: f64,
}

impl GeoCoordinate {
    /// Build a coordinate, rejecting values outside lat -90..90 / lng -180..180.
    pub fn new(lat: f64, lng: f64) -> Result<Self, LocationError> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(LocationError::InvalidCoordinates { lat, lng });
        }
        Ok(Self { lat, lng })
    }
}

impl fmt::Display for GeoCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", super::distance::format_coords(self.lat, self.lng))
    }
}

/// How the user's position was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationSource {
    IpApi,
    Manual,
}

impl fmt::Display for LocationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IpApi => write!(f, "IP"),
            Self::Manual => write!(f, "Manual"),
        }
    }
}

/// The user's position together with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub coord: GeoCoordinate,
    pub source: LocationSource,
    /// Human label from the provider (e.g. "Stockholm, Sweden")
    #[serde(default)]
    pub label: Option<String>,
}

impl ResolvedLocation {
    pub fn display_line(&self) -> String {
        match &self.label {
            Some(label) => format!("{} ({}) via {}", label, self.coord, self.source),
            None => format!("{} via {}", self.coord, self.source),
        }
    }
}

/// Location resolution errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LocationError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Invalid geolocation response: {0}")]
    InvalidResponse(String),
    #[error("Invalid coordinates ({lat}, {lng}). Lat: -90..90, Lng: -180..180")]
    InvalidCoordinates { lat: f64, lng: f64 },
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("No location available. Use --lat/--lon or --auto")]
    Unavailable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_accepts_bounds() {
        assert!(GeoCoordinate::new(90.0, 180.0).is_ok());
        assert!(GeoCoordinate::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn test_new_rejects_out_of_range() {
        assert!(matches!(
            GeoCoordinate::new(91.0, 0.0),
            Err(LocationError::InvalidCoordinates { .. })
        ));
        assert!(GeoCoordinate::new(0.0, -180.5).is_err());
        assert!(GeoCoordinate::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_deserialize_aliases() {
        let a: GeoCoordinate = serde_json::from_str(r#"{"lat":1.5,"lng":2.5}"#).unwrap();
        let b: GeoCoordinate = serde_json::from_str(r#"{"latitude":1.5,"longitude":2.5}"#).unwrap();
        let c: GeoCoordinate = serde_json::from_str(r#"{"lat":1.5,"lon":2.5}"#).unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn test_display_line_with_label() {
        let loc = ResolvedLocation {
            coord: GeoCoordinate { lat: 59.3293, lng: 18.0686 },
            source: LocationSource::IpApi,
            label: Some("Stockholm, Sweden".into()),
        };
        let line = loc.display_line();
        assert!(line.starts_with("Stockholm, Sweden"));
        assert!(line.ends_with("via IP"));
    }
}
