use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::location::{format_distance, GeoCoordinate, LocationError, ResolvedLocation};
use crate::places::{apply_view, attach_distances, extract_locality, PlaceRecord, RankedPlace, SortKey};
use crate::search::{search_nearby, SearchError, MAX_RATING};

use super::state::{AppState, ResultCache};

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

pub struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.1,
            code: self.0.as_u16(),
        };
        (self.0, Json(body)).into_response()
    }
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    ApiError(status, msg.into())
}

impl From<SearchError> for ApiError {
    fn from(e: SearchError) -> Self {
        let status = match e {
            SearchError::OracleFailure(_) => StatusCode::BAD_GATEWAY,
            SearchError::InProgress => StatusCode::CONFLICT,
            SearchError::LocationUnavailable(_) | SearchError::EmptyQuery | SearchError::NoResults => {
                StatusCode::BAD_REQUEST
            }
        };
        api_error(status, e.to_string())
    }
}

// ─── GET /api/health ─────────────────────────────────────────────

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// ─── GET /api/locate ─────────────────────────────────────────────

pub async fn locate(State(state): State<Arc<AppState>>) -> Result<Json<ResolvedLocation>, ApiError> {
    let Some(geolocator) = state.geolocator.clone() else {
        return Err(api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "Automatic geolocation is disabled",
        ));
    };

    let outcome = tokio::task::spawn_blocking(move || geolocator.locate())
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    match outcome {
        Ok(loc) => {
            tracing::info!(location = %loc.display_line(), "GET /api/locate");
            Ok(Json(loc))
        }
        Err(e) => {
            tracing::warn!(error = %e, "GET /api/locate failed");
            Err(api_error(StatusCode::SERVICE_UNAVAILABLE, e.to_string()))
        }
    }
}

// ─── GET /api/nearby ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct NearbyQuery {
    pub query: Option<String>,
    pub lat: Option<f64>,
    #[serde(alias = "lon")]
    pub lng: Option<f64>,
    pub sort: Option<String>,
    pub min_rating: Option<f64>,
}

#[derive(Serialize)]
pub struct PlaceView {
    #[serde(flatten)]
    pub ranked: RankedPlace,
    pub distance_label: String,
    pub locality: Option<String>,
}

impl From<RankedPlace> for PlaceView {
    fn from(ranked: RankedPlace) -> Self {
        let distance_label = format_distance(ranked.distance_km.unwrap_or(f64::INFINITY));
        let locality = ranked.place.vicinity.as_deref().map(extract_locality);
        Self {
            ranked,
            distance_label,
            locality,
        }
    }
}

#[derive(Serialize)]
pub struct NearbyResponse {
    pub query: String,
    pub location: GeoCoordinate,
    pub sort: SortKey,
    pub min_rating: f64,
    /// Results before the rating filter.
    pub total: usize,
    pub cached: bool,
    pub results: Vec<PlaceView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

pub async fn nearby(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NearbyQuery>,
) -> Result<Json<NearbyResponse>, ApiError> {
    let start = Instant::now();

    let query = params.query.as_deref().unwrap_or("").trim().to_string();
    if query.is_empty() {
        return Err(SearchError::EmptyQuery.into());
    }

    let at = match (params.lat, params.lng) {
        (Some(lat), Some(lng)) => GeoCoordinate::new(lat, lng)
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?,
        _ => return Err(SearchError::from(LocationError::Unavailable).into()),
    };

    let sort = match params.sort.as_deref() {
        Some(s) => s.parse::<SortKey>().map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?,
        None => SortKey::default(),
    };

    let min_rating = match params.min_rating {
        Some(r) if !r.is_finite() => {
            return Err(api_error(StatusCode::BAD_REQUEST, "min_rating must be a number"));
        }
        Some(r) => r.clamp(0.0, MAX_RATING),
        None => 0.0,
    };

    let key = ResultCache::key(&query, at);
    let cached = state.results().get(&key);
    let hit = cached.is_some();

    let records: Vec<PlaceRecord> = match cached {
        Some(records) => records,
        None => {
            let oracle = Arc::clone(&state.oracle);
            let q = query.clone();
            let outcome = tokio::task::spawn_blocking(move || search_nearby(oracle.as_ref(), &q, Some(at)))
                .await
                .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

            let records: Vec<PlaceRecord> = match outcome {
                Ok(results) => results.into_iter().map(|r| r.place).collect(),
                Err(SearchError::NoResults) => Vec::new(),
                Err(e) => {
                    tracing::warn!(query = %query, error = %e, "GET /api/nearby failed");
                    return Err(e.into());
                }
            };
            state.results().put(key, records.clone());
            records
        }
    };

    let all = attach_distances(&records, at);

    let visible = apply_view(&all, sort, min_rating);
    let notice = visible.is_empty().then(|| SearchError::NoResults.to_string());

    tracing::info!(
        query = %query,
        %at,
        %sort,
        min_rating,
        total = all.len(),
        shown = visible.len(),
        cached = hit,
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "GET /api/nearby"
    );

    Ok(Json(NearbyResponse {
        query,
        location: at,
        sort,
        min_rating,
        total: all.len(),
        cached: hit,
        results: visible.into_iter().map(PlaceView::from).collect(),
        notice,
    }))
}
