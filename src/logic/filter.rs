//! Local filtering of the installed set.

use std::sync::Arc;

use crate::state::PackageMap;

/// What: Normalize free-text input for matching.
///
/// Output:
/// - Trimmed, lowercased copy of `query`.
#[must_use]
pub fn normalize(query: &str) -> String {
    query.trim().to_lowercase()
}

/// What: Filter the installed set by package id substring.
///
/// Inputs:
/// - `query`: Raw user text
/// - `source`: Installed snapshot records
///
/// Output:
/// - `source` itself (same `Arc`) when the normalized query is empty;
///   otherwise a new map holding the entries whose id contains it,
///   case-insensitively.
///
/// Details:
/// - Matching is on the full `name;version;arch;origin` id, so version and
///   arch fragments match too.
#[must_use]
pub fn filter_installed(query: &str, source: &Arc<PackageMap>) -> Arc<PackageMap> {
    let needle = normalize(query);
    if needle.is_empty() {
        return Arc::clone(source);
    }
    Arc::new(
        source
            .iter()
            .filter(|(id, _)| id.to_lowercase().contains(&needle))
            .map(|(id, rec)| (id.clone(), rec.clone()))
            .collect(),
    )
}
