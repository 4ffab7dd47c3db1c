//! Geolocation providers: IP API and user-supplied coordinates.

use super::types::{GeoCoordinate, LocationError, LocationSource, ResolvedLocation};
use serde::Deserialize;
use std::time::Duration;

/// A one-shot source for the user's position.
///
/// Called at most once per view activation; implementations must not retry.
pub trait Geolocator: Send + Sync {
    fn locate(&self) -> Result<ResolvedLocation, LocationError>;
}

// ─── IP-based geolocation ───────────────────────────────────────

#[derive(Deserialize)]
struct IpApiResult {
    latitude: Option<f64>,
    longitude: Option<f64>,
    city: Option<String>,
    country_name: Option<String>,
    #[serde(default)]
    error: bool,
    #[serde(default)]
    reason: Option<String>,
}

/// Auto-detect location via an ipapi.co compatible endpoint.
pub struct IpGeolocator {
    agent: ureq::Agent,
    url: String,
}

impl IpGeolocator {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("Wayfarer/", env!("CARGO_PKG_VERSION")))
            .build();
        Self { agent, url: url.into() }
    }
}

impl Geolocator for IpGeolocator {
    fn locate(&self) -> Result<ResolvedLocation, LocationError> {
        let response = self
            .agent
            .get(&self.url)
            .call()
            .map_err(|e| LocationError::Network(e.to_string()))?;

        let r: IpApiResult = response
            .into_json()
            .map_err(|e| LocationError::InvalidResponse(e.to_string()))?;

        if r.error {
            return Err(LocationError::InvalidResponse(
                r.reason.unwrap_or_else(|| "provider reported an error".into()),
            ));
        }

        let lat = r.latitude.ok_or_else(|| LocationError::InvalidResponse("no latitude".into()))?;
        let lng = r.longitude.ok_or_else(|| LocationError::InvalidResponse("no longitude".into()))?;
        let coord = GeoCoordinate::new(lat, lng)?;

        let label = match (r.city, r.country_name) {
            (Some(city), Some(country)) if !country.is_empty() => Some(format!("{}, {}", city, country)),
            (Some(city), _) => Some(city),
            (None, country) => country,
        };

        tracing::debug!(lat, lng, ?label, "IP geolocation resolved");

        Ok(ResolvedLocation {
            coord,
            source: LocationSource::IpApi,
            label,
        })
    }
}

// ─── Manual coordinates ─────────────────────────────────────────

/// Coordinates supplied directly by the user (flags, query parameters).
pub struct FixedGeolocator {
    location: ResolvedLocation,
}

impl FixedGeolocator {
    pub fn new(lat: f64, lng: f64) -> Result<Self, LocationError> {
        let coord = GeoCoordinate::new(lat, lng)?;
        Ok(Self {
            location: ResolvedLocation {
                coord,
                source: LocationSource::Manual,
                label: None,
            },
        })
    }
}

impl Geolocator for FixedGeolocator {
    fn locate(&self) -> Result<ResolvedLocation, LocationError> {
        Ok(self.location.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn locate_against(body: serde_json::Value, status: u16) -> Result<ResolvedLocation, LocationError> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/json/"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/json/", server.uri());
        tokio::task::spawn_blocking(move || IpGeolocator::new(url, Duration::from_secs(5)).locate())
            .await
            .unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_ip_geolocate_success() {
        let loc = locate_against(
            serde_json::json!({
                "latitude": 59.3293,
                "longitude": 18.0686,
                "city": "Stockholm",
                "country_name": "Sweden"
            }),
            200,
        )
        .await
        .unwrap();
        assert_eq!(loc.source, LocationSource::IpApi);
        assert_eq!(loc.label.as_deref(), Some("Stockholm, Sweden"));
        assert!((loc.coord.lat - 59.3293).abs() < 1e-9);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_ip_geolocate_missing_latitude() {
        let err = locate_against(serde_json::json!({ "longitude": 18.0 }), 200)
            .await
            .unwrap_err();
        assert!(matches!(err, LocationError::InvalidResponse(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_ip_geolocate_provider_error() {
        let err = locate_against(serde_json::json!({ "error": true, "reason": "RateLimited" }), 200)
            .await
            .unwrap_err();
        assert_eq!(err, LocationError::InvalidResponse("RateLimited".into()));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_ip_geolocate_http_failure() {
        let err = locate_against(serde_json::json!({}), 503).await.unwrap_err();
        assert!(matches!(err, LocationError::Network(_)));
    }

    #[test]
    fn test_fixed_geolocator() {
        let loc = FixedGeolocator::new(1.0, 1.0).unwrap().locate().unwrap();
        assert_eq!(loc.source, LocationSource::Manual);
        assert_eq!(loc.coord, GeoCoordinate { lat: 1.0, lng: 1.0 });
    }

    #[test]
    fn test_fixed_geolocator_rejects_invalid() {
        assert!(FixedGeolocator::new(100.0, 0.0).is_err());
    }
}
