//! Core non-UI logic split into modular submodules.

pub mod debounce;
pub mod filter;
pub mod query;
pub mod search;
pub mod sort;

pub use debounce::{DEFAULT_DEBOUNCE, Debouncer};
pub use filter::{filter_installed, normalize};
pub use query::{QueryTracker, SearchQuery};
pub use search::{Mode, SearchCoordinator, SearchOutcome, search_remote};
pub use sort::{sorted_hits, sorted_records};
