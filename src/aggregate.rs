use std::cmp::Ordering;

use indexmap::IndexMap;

use crate::data::{Address, Comparable, Coordinates};
use crate::dates::parse_execution_date;

/// Headline statistics over a set of comparables.
#[derive(Clone, Debug, PartialEq)]
pub struct ComparableSummary {
    /// Number of comparables summarized.
    pub count: usize,
    /// Mean starting rent; `NaN` when `count == 0`.
    pub mean_starting_rent: f64,
    /// Mean leased area; `NaN` when `count == 0`.
    pub mean_transaction_sqft: f64,
    /// Sum of leased area, saturating at `u64::MAX`.
    pub total_transaction_sqft: u64,
}

impl ComparableSummary {
    /// True when the summary covers no comparables (means are `NaN`).
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Retail/office split used by map legends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SpaceTypeBreakdown {
    /// Space type mentions `retail` (any case).
    pub retail: usize,
    /// Everything else.
    pub office: usize,
}

/// Compute count, means, and total area.
///
/// Means are plain sums divided by the count, so an empty slice yields `NaN`.
pub fn summarize(comps: &[Comparable]) -> ComparableSummary {
    let count = comps.len();
    let rent_sum: f64 = comps.iter().map(|comp| comp.starting_rent).sum();
    let sqft_sum: f64 = comps.iter().map(|comp| comp.transaction_sqft as f64).sum();
    let total_transaction_sqft = comps
        .iter()
        .map(|comp| comp.transaction_sqft)
        .fold(0u64, u64::saturating_add);
    ComparableSummary {
        count,
        mean_starting_rent: rent_sum / count as f64,
        mean_transaction_sqft: sqft_sum / count as f64,
        total_transaction_sqft,
    }
}

/// Bucket comparables by address.
///
/// Keys keep first-seen order; records keep input order within a bucket.
pub fn group_by_address(comps: &[Comparable]) -> IndexMap<Address, Vec<Comparable>> {
    let mut groups: IndexMap<Address, Vec<Comparable>> = IndexMap::new();
    for comp in comps {
        groups
            .entry(comp.address.clone())
            .or_default()
            .push(comp.clone());
    }
    groups
}

/// Mean latitude/longitude of `comps`, or `None` when empty.
pub fn map_center(comps: &[Comparable]) -> Option<Coordinates> {
    if comps.is_empty() {
        return None;
    }
    let count = comps.len() as f64;
    let lat: f64 = comps.iter().map(|comp| comp.coordinates.lat).sum();
    let lng: f64 = comps.iter().map(|comp| comp.coordinates.lng).sum();
    Some(Coordinates::new(lat / count, lng / count))
}

/// Count retail versus non-retail comparables.
pub fn space_type_breakdown(comps: &[Comparable]) -> SpaceTypeBreakdown {
    let retail = comps.iter().filter(|comp| comp.is_retail()).count();
    SpaceTypeBreakdown {
        retail,
        office: comps.len() - retail,
    }
}

/// Copy of `comps` ordered by execution date, newest first.
///
/// Unparsable dates sort after every parsable one; ties keep input order.
pub fn sorted_by_execution_date_desc(comps: &[Comparable]) -> Vec<Comparable> {
    let mut keyed: Vec<_> = comps
        .iter()
        .map(|comp| (parse_execution_date(&comp.execution_date), comp))
        .collect();
    keyed.sort_by(|(left, _), (right, _)| match (left, right) {
        (Some(left), Some(right)) => right.cmp(left),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    keyed.into_iter().map(|(_, comp)| comp.clone()).collect()
}
