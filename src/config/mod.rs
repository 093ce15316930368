//! Settings file handling: XDG paths, line parsing and the typed settings.

pub mod parsing;
pub mod paths;
pub mod settings;

pub use paths::{config_dir, logs_dir, settings_path};
pub use settings::{SKELETON, Settings};
