//! Great-circle distance and display formatting.
//!
//! Spherical-Earth haversine; good to ~0.5% which is plenty for listing
//! places a few kilometres away.

use super::types::GeoCoordinate;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two coordinates, in kilometres.
pub fn distance_km(a: GeoCoordinate, b: GeoCoordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Short human label for a distance: "350 m", "1.2 km", "12 km".
pub fn format_distance(km: f64) -> String {
    if !km.is_finite() {
        return "—".to_string();
    }
    // Round to 10 m; anything finer is noise for a listing.
    let m = ((km.max(0.0) * 1000.0) / 10.0).round() * 10.0;
    if m < 1000.0 {
        format!("{} m", m as u32)
    } else if (km * 10.0).round() < 100.0 {
        format!("{:.1} km", km)
    } else {
        format!("{:.0} km", km)
    }
}

/// Format coordinates as "59.3293°N, 18.0686°E".
pub fn format_coords(lat: f64, lng: f64) -> String {
    let ns = if lat >= 0.0 { 'N' } else { 'S' };
    let ew = if lng >= 0.0 { 'E' } else { 'W' };
    format!("{:.4}\u{00B0}{}, {:.4}\u{00B0}{}", lat.abs(), ns, lng.abs(), ew)
}
