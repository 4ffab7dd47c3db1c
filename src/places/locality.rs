//! Locality headers for grouping results.

use super::types::RankedPlace;

/// Header used for places with no vicinity text.
pub const OTHER_LOCALITY: &str = "Other";

/// Pick the most locality-like segment of a comma-separated address.
///
/// Scans from the second-to-last segment backward, skipping purely numeric
/// segments (postcodes, street numbers) and anything under 3 characters
/// (state codes). Falls back to the second-to-last segment, or the whole
/// string when there is only one. Best effort; never fails.
pub fn extract_locality(vicinity: &str) -> String {
    let segments: Vec<&str> = vicinity.split(',').map(str::trim).collect();
    if segments.len() < 2 {
        return vicinity.trim().to_string();
    }

    let candidate = segments[..segments.len() - 1]
        .iter()
        .rev()
        .find(|s| s.chars().count() >= 3 && !is_numeric(s));

    candidate
        .copied()
        .unwrap_or(segments[segments.len() - 2])
        .to_string()
}

/// Group ranked places under locality headers, preserving list order.
///
/// Groups appear in order of their first member; members keep their
/// position relative to each other.
pub fn group_by_locality(places: &[RankedPlace]) -> Vec<(String, Vec<&RankedPlace>)> {
    let mut groups: Vec<(String, Vec<&RankedPlace>)> = Vec::new();
    for place in places {
        let header = place
            .place
            .vicinity
            .as_deref()
            .map(extract_locality)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| OTHER_LOCALITY.to_string());

        match groups.iter_mut().find(|(h, _)| *h == header) {
            Some((_, members)) => members.push(place),
            None => groups.push((header, vec![place])),
        }
    }
    groups
}

fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::GeoCoordinate;
    use crate::places::types::PlaceRecord;

    #[test]
    fn test_street_city_state() {
        assert_eq!(extract_locality("123 Main St, Springfield, IL"), "Springfield");
    }

    #[test]
    fn test_single_segment() {
        assert_eq!(extract_locality("Paris"), "Paris");
        assert_eq!(extract_locality("  Paris "), "Paris");
    }

    #[test]
    fn test_skips_postcode() {
        assert_eq!(extract_locality("Drottninggatan 1, Stockholm, 11151, Sweden"), "Stockholm");
    }

    #[test]
    fn test_falls_back_to_second_to_last() {
        assert_eq!(extract_locality("12, 34, XY"), "34");
        assert_eq!(extract_locality("A, B"), "A");
    }

    #[test]
    fn test_two_segments() {
        assert_eq!(extract_locality("Shibuya Crossing, Tokyo"), "Shibuya Crossing");
    }

    #[test]
    fn test_empty() {
        assert_eq!(extract_locality(""), "");
    }

    fn ranked(id: &str, vicinity: Option<&str>) -> RankedPlace {
        RankedPlace {
            place: PlaceRecord {
                place_id: id.into(),
                name: id.into(),
                rating: 0.0,
                review_count: 0,
                vicinity: vicinity.map(String::from),
                location: GeoCoordinate { lat: 0.0, lng: 0.0 },
                types: vec![],
            },
            distance_km: Some(0.0),
        }
    }

    #[test]
    fn test_group_by_locality_order() {
        let places = vec![
            ranked("a", Some("1 Rue X, Paris, FR")),
            ranked("b", None),
            ranked("c", Some("2 High St, London, UK")),
            ranked("d", Some("3 Rue Y, Paris, FR")),
        ];
        let groups = group_by_locality(&places);
        let headers: Vec<&str> = groups.iter().map(|(h, _)| h.as_str()).collect();
        assert_eq!(headers, vec!["Paris", OTHER_LOCALITY, "London"]);
        let paris: Vec<&str> = groups[0].1.iter().map(|p| p.place.place_id.as_str()).collect();
        assert_eq!(paris, vec!["a", "d"]);
    }
}
