//! The place oracle: an external text generator asked for nearby places.
//!
//! Oracles return raw text only. Turning that text into records is the job of
//! [`crate::places::normalize`], which treats it as untrusted input.

pub mod gemini;

use crate::location::GeoCoordinate;
use std::path::Path;

pub use gemini::{build_prompt, GeminiOracle};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OracleError {
    #[error("network error: {0}")]
    Network(String),
    #[error("oracle returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("invalid oracle response: {0}")]
    InvalidResponse(String),
    #[error("oracle returned no content")]
    EmptyResponse,
    #[error("oracle refused the request: {0}")]
    Blocked(String),
}

/// Something that can suggest places for a query near a coordinate.
pub trait PlaceOracle: Send + Sync {
    fn find_places(&self, query: &str, at: GeoCoordinate) -> Result<String, OracleError>;
}

/// Replays a fixed response regardless of the query. Used for offline runs.
pub struct ReplayOracle {
    body: String,
}

impl ReplayOracle {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }

    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        std::fs::read_to_string(path).map(Self::new)
    }
}

impl PlaceOracle for ReplayOracle {
    fn find_places(&self, query: &str, at: GeoCoordinate) -> Result<String, OracleError> {
        tracing::debug!(query, %at, "replaying recorded oracle response");
        Ok(self.body.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replay_oracle_from_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("places.json");
        std::fs::write(&path, "[]").unwrap();

        let oracle = ReplayOracle::from_path(&path).unwrap();
        let body = oracle.find_places("coffee", GeoCoordinate { lat: 0.0, lng: 0.0 }).unwrap();
        assert_eq!(body, "[]");
    }

    #[test]
    fn test_replay_oracle_missing_file() {
        assert!(ReplayOracle::from_path(Path::new("/definitely/not/here.json")).is_err());
    }
}
