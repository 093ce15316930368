//! Command-line argument parsing and handling.

pub mod config;
pub mod definition;
pub mod install;
pub mod list;
pub mod remove;
pub mod search;
pub mod utils;

// Re-export commonly used items
pub use definition::{Args, Command, process_args};
pub use utils::determine_log_level;
