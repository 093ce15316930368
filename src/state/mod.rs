//! Package value types shared across the store, search and actions.

pub mod types;

pub use types::{HitMap, PackageFound, PackageInfo, PackageMap, PackageRecord, SearchHit};
