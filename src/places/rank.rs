//! Distance attachment, rating filter and ordering.
//!
//! All functions here are pure: re-sorting or re-filtering a result set is a
//! recomputation over records already in hand, never a new oracle call.

use super::types::{PlaceRecord, RankedPlace, SortKey};
use crate::location::{distance_km, GeoCoordinate};
use std::cmp::Ordering;
use std::collections::HashSet;

/// The user's position is required to rank by distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("user location is not available")]
pub struct LocationUnavailable;

/// Drop later records whose `place_id` was already seen.
pub fn dedupe_by_place_id(records: Vec<PlaceRecord>) -> Vec<PlaceRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| r.place_id.is_empty() || seen.insert(r.place_id.clone()))
        .collect()
}

/// Attach `distance_km` from `user` to every record, keeping oracle order.
pub fn attach_distances(records: &[PlaceRecord], user: GeoCoordinate) -> Vec<RankedPlace> {
    records
        .iter()
        .map(|place| {
            let d = distance_km(user, place.location);
            RankedPlace {
                place: place.clone(),
                distance_km: d.is_finite().then_some(d),
            }
        })
        .collect()
}

/// Filter by `min_rating` and order by `sort_key`.
///
/// The sort is stable, so equal keys keep their incoming (oracle) order.
pub fn apply_view(places: &[RankedPlace], sort_key: SortKey, min_rating: f64) -> Vec<RankedPlace> {
    let mut visible: Vec<RankedPlace> = places
        .iter()
        .filter(|p| p.place.rating >= min_rating)
        .cloned()
        .collect();

    match sort_key {
        SortKey::Distance => visible.sort_by(|a, b| cmp_distance(a.distance_km, b.distance_km)),
        SortKey::Rating => visible.sort_by(|a, b| b.place.rating.total_cmp(&a.place.rating)),
    }

    visible
}

/// Full ranking: distances, filter, order.
pub fn rank(
    records: &[PlaceRecord],
    user: Option<GeoCoordinate>,
    sort_key: SortKey,
    min_rating: f64,
) -> Result<Vec<RankedPlace>, LocationUnavailable> {
    let user = user.ok_or(LocationUnavailable)?;
    Ok(apply_view(&attach_distances(records, user), sort_key, min_rating))
}

/// Ascending; a missing distance counts as +infinity.
fn cmp_distance(a: Option<f64>, b: Option<f64>) -> Ordering {
    let a = a.unwrap_or(f64::INFINITY);
    let b = b.unwrap_or(f64::INFINITY);
    a.total_cmp(&b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(id: &str, rating: f64, lat: f64, lng: f64) -> PlaceRecord {
        PlaceRecord {
            place_id: id.into(),
            name: format!("Place {}", id),
            rating,
            review_count: 0,
            vicinity: None,
            location: GeoCoordinate { lat, lng },
            types: vec![],
        }
    }

    fn sample() -> Vec<PlaceRecord> {
        vec![
            place("far", 4.0, 1.5, 1.5),
            place("near", 3.0, 1.01, 1.0),
            place("mid", 4.0, 1.2, 1.2),
            place("here", 5.0, 1.0, 1.0),
            place("unrated", 0.0, 1.05, 1.05),
        ]
    }

    const USER: GeoCoordinate = GeoCoordinate { lat: 1.0, lng: 1.0 };

    fn ids(places: &[RankedPlace]) -> Vec<&str> {
        places.iter().map(|p| p.place.place_id.as_str()).collect()
    }

    #[test]
    fn test_distance_sort_non_decreasing() {
        let ranked = rank(&sample(), Some(USER), SortKey::Distance, 0.0).unwrap();
        assert_eq!(ids(&ranked), vec!["here", "near", "unrated", "mid", "far"]);
        let d: Vec<f64> = ranked.iter().map(|p| p.distance_km.unwrap()).collect();
        assert!(d.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(d[0], 0.0);
    }

    #[test]
    fn test_rating_sort_is_stable() {
        let ranked = rank(&sample(), Some(USER), SortKey::Rating, 0.0).unwrap();
        // "far" and "mid" share 4.0 and keep oracle order.
        assert_eq!(ids(&ranked), vec!["here", "far", "mid", "near", "unrated"]);
        assert!(ranked.windows(2).all(|w| w[0].place.rating >= w[1].place.rating));
    }

    #[test]
    fn test_min_rating_filter() {
        for min in [0.0, 3.0, 3.5, 4.0, 5.0, 5.5] {
            for key in [SortKey::Distance, SortKey::Rating] {
                let ranked = rank(&sample(), Some(USER), key, min).unwrap();
                assert!(ranked.iter().all(|p| p.place.rating >= min));
            }
        }
        let ranked = rank(&sample(), Some(USER), SortKey::Distance, 4.0).unwrap();
        assert_eq!(ids(&ranked), vec!["here", "mid", "far"]);
    }

    #[test]
    fn test_missing_location_fails() {
        assert_eq!(rank(&sample(), None, SortKey::Distance, 0.0), Err(LocationUnavailable));
    }

    #[test]
    fn test_unknown_distance_sorts_last() {
        let mut places = attach_distances(&sample(), USER);
        places[3].distance_km = None;
        let view = apply_view(&places, SortKey::Distance, 0.0);
        assert_eq!(view.last().unwrap().place.place_id, "here");
    }

    #[test]
    fn test_deterministic() {
        let a = rank(&sample(), Some(USER), SortKey::Rating, 0.0).unwrap();
        let b = rank(&sample(), Some(USER), SortKey::Rating, 0.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_dedupe_keeps_first() {
        let records = vec![
            place("a", 1.0, 1.0, 1.0),
            place("b", 2.0, 1.0, 1.0),
            place("a", 5.0, 2.0, 2.0),
        ];
        let deduped = dedupe_by_place_id(records);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].rating, 1.0);
        assert_eq!(deduped[1].place_id, "b");
    }

    #[test]
    fn test_attach_keeps_oracle_order() {
        let places = attach_distances(&sample(), USER);
        assert_eq!(ids(&places), vec!["far", "near", "mid", "here", "unrated"]);
    }
}
