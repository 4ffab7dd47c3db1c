//! Location subsystem for Wayfarer.
//!
//! Provides the coordinate type, haversine distance, display formatting,
//! and the one-shot geolocation sources used to place the user.

pub mod distance;
pub mod providers;
pub mod resolver;
pub mod types;

pub use distance::{distance_km, format_coords, format_distance, EARTH_RADIUS_KM};
pub use providers::{FixedGeolocator, Geolocator, IpGeolocator};
pub use resolver::LocationResolver;
pub use types::{GeoCoordinate, LocationError, LocationSource, ResolvedLocation};
