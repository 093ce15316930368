//! Command-line settings handling.

use std::path::Path;
use std::process::ExitCode;

use crate::config::Settings;

/// What: Print the effective settings or write the settings skeleton.
///
/// Inputs:
/// - `explicit`: `--config` path, if given
/// - `settings`: Effective settings
/// - `print`/`init`: Requested operation; neither prints the file path
///
/// Output:
/// - `FAILURE` only when the skeleton cannot be written.
pub fn handle_config(explicit: Option<&Path>, settings: &Settings, print: bool, init: bool) -> ExitCode {
    let path = Settings::resolve_path(explicit);
    if init {
        return match Settings::init(&path) {
            Ok(true) => {
                println!("Wrote {}", path.display());
                ExitCode::SUCCESS
            }
            Ok(false) => {
                println!("{} already exists; left unchanged", path.display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("pkpanel: {e}");
                ExitCode::FAILURE
            }
        };
    }
    if print {
        print!("{}", settings.render());
    } else {
        println!("{}", path.display());
    }
    ExitCode::SUCCESS
}
