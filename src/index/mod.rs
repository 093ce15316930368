//! Installed package cache and its refresh coordinator.
//!
//! The [`InstalledStore`] is the only shared mutable state in the panel. It is
//! owned by whoever builds the panel and handed out as an `Arc` to consumers
//! (search, actions, display); consumers subscribe to change notifications
//! through a tokio `watch` channel instead of polling. A snapshot swap is a
//! single channel update, so no consumer ever sees a half-filled map.

mod installed;

pub use installed::{InstalledSnapshot, InstalledStore, RefreshOutcome};
