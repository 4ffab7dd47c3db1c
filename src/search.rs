//! Nearby search: the pipeline from (query, position) to a displayable list,
//! and the per-activation state a front end keeps around it.
//!
//! Flow: validate → oracle → normalize → de-duplicate → attach distances.
//! Sorting and filtering happen afterwards in [`SearchState::visible`] and
//! never go back to the oracle.

use crate::location::{GeoCoordinate, LocationError};
use crate::oracle::{OracleError, PlaceOracle};
use crate::places::{apply_view, attach_distances, dedupe_by_place_id, normalize, RankedPlace, SortKey};
use serde::Serialize;
use std::time::Instant;

pub const MAX_RATING: f64 = 5.0;

/// Every way a search can end without results, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "detail")]
pub enum SearchError {
    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),
    #[error("Enter something to search for")]
    EmptyQuery,
    #[error("Something went wrong while searching: {0}")]
    OracleFailure(String),
    #[error("No places found. Try a different query or lower the minimum rating")]
    NoResults,
    #[error("A search is already in progress")]
    InProgress,
}

impl From<LocationError> for SearchError {
    fn from(e: LocationError) -> Self {
        Self::LocationUnavailable(e.to_string())
    }
}

impl From<OracleError> for SearchError {
    fn from(e: OracleError) -> Self {
        Self::OracleFailure(e.to_string())
    }
}

/// Run one oracle call and return the results in oracle order.
///
/// Empty output is `NoResults`; unparsable output is `OracleFailure`.
pub fn search_nearby(
    oracle: &dyn PlaceOracle,
    query: &str,
    user: Option<GeoCoordinate>,
) -> Result<Vec<RankedPlace>, SearchError> {
    let query = validate_query(query)?;
    let user = user.ok_or_else(|| SearchError::from(LocationError::Unavailable))?;

    let start = Instant::now();
    let outcome = oracle.find_places(query, user);
    let results = process_outcome(outcome, user)?;

    tracing::info!(
        query,
        results = results.len(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "nearby search complete"
    );
    Ok(results)
}

fn validate_query(query: &str) -> Result<&str, SearchError> {
    let q = query.trim();
    if q.is_empty() {
        Err(SearchError::EmptyQuery)
    } else {
        Ok(q)
    }
}

fn process_outcome(
    outcome: Result<String, OracleError>,
    user: GeoCoordinate,
) -> Result<Vec<RankedPlace>, SearchError> {
    let text = outcome.inspect_err(|e| tracing::warn!(error = %e, "oracle call failed"))?;

    let records = normalize(&text).map_err(|e| {
        tracing::warn!(error = %e, "oracle response could not be parsed");
        SearchError::OracleFailure(e.to_string())
    })?;

    let records = dedupe_by_place_id(records);
    if records.is_empty() {
        return Err(SearchError::NoResults);
    }
    Ok(attach_distances(&records, user))
}

/// A search accepted by [`SearchState::begin_search`], to be sent to an oracle.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    pub at: GeoCoordinate,
}

/// State for one view activation. Nothing here outlives it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchState {
    query: String,
    user_location: Option<GeoCoordinate>,
    location_error: Option<String>,
    location_settled: bool,
    /// Oracle order, with distances attached.
    results: Vec<RankedPlace>,
    sort_key: SortKey,
    min_rating: f64,
    loading: bool,
    error: Option<SearchError>,
}

impl SearchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the one geolocation outcome for this activation.
    ///
    /// Returns `false` (and changes nothing) if an outcome was already recorded.
    pub fn resolve_location(&mut self, outcome: Result<GeoCoordinate, LocationError>) -> bool {
        if self.location_settled {
            tracing::debug!("ignoring repeated geolocation outcome");
            return false;
        }
        self.location_settled = true;
        match outcome {
            Ok(coord) => self.user_location = Some(coord),
            Err(e) => {
                tracing::warn!(error = %e, "geolocation failed");
                let msg = e.to_string();
                self.location_error = Some(msg.clone());
                self.error = Some(SearchError::LocationUnavailable(msg));
            }
        }
        true
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Validate and mark a submission as in flight.
    pub fn begin_search(&mut self) -> Result<SearchRequest, SearchError> {
        if self.loading {
            return Err(SearchError::InProgress);
        }
        let query = match validate_query(&self.query) {
            Ok(q) => q.to_string(),
            Err(e) => {
                self.error = Some(e.clone());
                return Err(e);
            }
        };
        let Some(at) = self.user_location else {
            let e = SearchError::LocationUnavailable(
                self.location_error.clone().unwrap_or_else(|| LocationError::Unavailable.to_string()),
            );
            self.error = Some(e.clone());
            return Err(e);
        };

        self.loading = true;
        self.error = None;
        Ok(SearchRequest { query, at })
    }

    /// Settle the in-flight submission with the oracle's outcome.
    ///
    /// Outcomes arriving with nothing in flight are ignored.
    pub fn complete_search(&mut self, outcome: Result<String, OracleError>) {
        if !self.loading {
            tracing::debug!("ignoring search outcome with no submission in flight");
            return;
        }
        let Some(at) = self.user_location else {
            self.loading = false;
            return;
        };
        match process_outcome(outcome, at) {
            Ok(results) => {
                self.results = results;
                self.error = None;
            }
            Err(e) => {
                self.results.clear();
                self.error = Some(e);
            }
        }
        self.loading = false;
    }

    /// Submit the current query through `oracle` and wait for it.
    pub fn search(&mut self, oracle: &dyn PlaceOracle) -> Result<(), SearchError> {
        let request = self.begin_search()?;
        let outcome = oracle.find_places(&request.query, request.at);
        self.complete_search(outcome);
        match &self.error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    pub fn set_sort_key(&mut self, key: SortKey) {
        self.sort_key = key;
    }

    /// Clamped to 0–5; non-finite values reset the filter.
    pub fn set_min_rating(&mut self, min_rating: f64) {
        self.min_rating = if min_rating.is_finite() {
            min_rating.clamp(0.0, MAX_RATING)
        } else {
            0.0
        };
    }

    /// Results after the rating filter and sort order.
    pub fn visible(&self) -> Vec<RankedPlace> {
        apply_view(&self.results, self.sort_key, self.min_rating)
    }

    /// What to tell the user, if anything: the last error, or `NoResults`
    /// when the filter hides every result.
    pub fn notice(&self) -> Option<SearchError> {
        if let Some(e) = &self.error {
            return Some(e.clone());
        }
        if !self.results.is_empty() && self.visible().is_empty() {
            return Some(SearchError::NoResults);
        }
        None
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn user_location(&self) -> Option<GeoCoordinate> {
        self.user_location
    }

    pub fn results(&self) -> &[RankedPlace] {
        &self.results
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    pub fn min_rating(&self) -> f64 {
        self.min_rating
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Submissions are refused while loading or before a position is known.
    pub fn can_submit(&self) -> bool {
        !self.loading && self.user_location.is_some() && !self.query.trim().is_empty()
    }
}
