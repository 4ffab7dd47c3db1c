//! Place records: parsing oracle output, ranking, and display grouping.

pub mod locality;
pub mod normalize;
pub mod rank;
pub mod types;

pub use locality::{extract_locality, group_by_locality, OTHER_LOCALITY};
pub use normalize::{normalize, synthesize_place_id, ParseError};
pub use rank::{apply_view, attach_distances, dedupe_by_place_id, rank, LocationUnavailable};
pub use types::{PlaceRecord, RankedPlace, SortKey};
