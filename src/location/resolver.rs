//! Location resolver — picks the single geolocation attempt for a session.
//!
//! Order: manual coordinates → IP geolocation (when enabled) → error.
//! There is no retry and no cache; a failure is terminal for the activation.

use super::providers::{FixedGeolocator, Geolocator, IpGeolocator};
use super::types::{LocationError, ResolvedLocation};
use std::time::Duration;

/// Resolves the user's position once per activation.
pub struct LocationResolver {
    auto: Option<Box<dyn Geolocator>>,
}

impl LocationResolver {
    /// Resolver that can fall back to IP geolocation at `url`.
    pub fn new(geolocate_url: &str, timeout: Duration) -> Self {
        Self {
            auto: Some(Box::new(IpGeolocator::new(geolocate_url, timeout))),
        }
    }

    /// Resolver limited to manual coordinates.
    pub fn offline() -> Self {
        Self { auto: None }
    }

    /// Create a resolver with a specific automatic source (for testing).
    pub fn with_geolocator(geolocator: Box<dyn Geolocator>) -> Self {
        Self { auto: Some(geolocator) }
    }

    pub fn resolve(&self, manual: Option<(f64, f64)>, auto: bool) -> Result<ResolvedLocation, LocationError> {
        if let Some((lat, lng)) = manual {
            return FixedGeolocator::new(lat, lng)?.locate();
        }

        if auto {
            if let Some(ref geolocator) = self.auto {
                return geolocator.locate().inspect_err(|e| {
                    tracing::warn!(error = %e, "automatic geolocation failed");
                });
            }
        }

        Err(LocationError::Unavailable)
    }
}
