//! Display ordering.

use std::cmp::Ordering;

use crate::state::{HitMap, PackageMap, PackageRecord, SearchHit};

/// Display order: case-insensitive name, then version, then id.
fn display_cmp(a: &PackageRecord, b: &PackageRecord) -> Ordering {
    a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then_with(|| a.version.cmp(&b.version))
        .then_with(|| a.id.cmp(&b.id))
}

/// What: Stable display order for installed records.
///
/// Details:
/// - Maps carry no order; the display layer sorts independently of the store.
#[must_use]
pub fn sorted_records(records: &PackageMap) -> Vec<&PackageRecord> {
    let mut out: Vec<&PackageRecord> = records.values().collect();
    out.sort_by(|a, b| display_cmp(a, b));
    out
}

/// Stable display order for search hits, same key as [`sorted_records`].
#[must_use]
pub fn sorted_hits(hits: &HitMap) -> Vec<&SearchHit> {
    let mut out: Vec<&SearchHit> = hits.values().collect();
    out.sort_by(|a, b| display_cmp(&a.record, &b.record));
    out
}
