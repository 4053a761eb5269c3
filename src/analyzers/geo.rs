//! Joins county tallies against the coordinate table for map rendering.

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::analyzers::tally::CategoryCount;
use crate::analyzers::utility::min_max_normalize;
use crate::reference::{Coordinates, CountyGeo};

/// A county placed on the map. `weight` is the count rescaled onto [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub county: String,
    pub latitude: f64,
    pub longitude: f64,
    pub count: u64,
    pub weight: f64,
}

/// Result of a geographic join. Counties without coordinates land in `unmatched`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoJoin {
    pub points: Vec<GeoPoint>,
    pub unmatched: Vec<String>,
}

impl GeoJoin {
    pub fn total(&self) -> u64 {
        self.points.iter().map(|p| p.count).sum()
    }
}

/// Attaches coordinates to each label of `counts`, keeping the tally order.
///
/// Labels that resolve to the same county, e.g. "Kings" and "KINGS", become one point
/// named as in `geo`, carrying their summed count.
pub fn geographic_join(counts: &CategoryCount, geo: &CountyGeo) -> GeoJoin {
    let mut matched: Vec<(&str, Coordinates, u64)> = Vec::with_capacity(counts.len());
    let mut unmatched = Vec::new();

    for entry in &counts.entries {
        match geo.get(&entry.label) {
            Some((name, coords)) => match matched.iter_mut().find(|(n, _, _)| *n == name) {
                Some((_, _, count)) => *count += entry.count,
                None => matched.push((name, coords, entry.count)),
            },
            None => {
                warn!(
                    county = %entry.label,
                    count = entry.count,
                    "County has no coordinates, left off the map"
                );
                unmatched.push(entry.label.clone());
            }
        }
    }

    // merging can lift a later county above earlier ones; stable keeps ties in place
    matched.sort_by_key(|(_, _, count)| Reverse(*count));

    let weights = min_max_normalize(&matched.iter().map(|(_, _, c)| *c).collect::<Vec<_>>());
    let points: Vec<GeoPoint> = matched
        .into_iter()
        .zip(weights)
        .map(|((name, coords, count), weight)| GeoPoint {
            county: name.to_string(),
            latitude: coords.latitude,
            longitude: coords.longitude,
            count,
            weight,
        })
        .collect();

    debug!(
        matched = points.len(),
        unmatched = unmatched.len(),
        "Geographic join done"
    );
    GeoJoin { points, unmatched }
}
