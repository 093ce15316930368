//! Shared utilities for argument processing.

use std::sync::Arc;

use crate::index::InstalledStore;
use crate::sources::PackageBackend;
use crate::state::PackageRecord;

/// What: Determine the log level based on command-line arguments.
///
/// Inputs:
/// - `args`: Parsed command-line arguments.
///
/// Output:
/// - Log level string (trace, debug, info, warn, error).
///
/// Details:
/// - Verbose flag overrides `log_level`; `RUST_LOG` overrides both at
///   subscriber setup.
#[must_use]
pub fn determine_log_level(args: &crate::args::Args) -> String {
    if args.verbose {
        "debug".to_string()
    } else {
        args.log_level.clone()
    }
}

/// What: Prompt the user for yes/no confirmation on the terminal.
///
/// Inputs:
/// - `message`: Question to display.
///
/// Output:
/// - `true` only for an explicit `y`/`yes`; empty input and read errors mean no.
#[must_use]
pub fn prompt_user_no_default(message: &str) -> bool {
    use std::io::{self, Write};

    print!("{message} [y/N]: ");
    io::stdout().flush().ok();

    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_ok() {
        let trimmed = input.trim();
        trimmed.eq_ignore_ascii_case("y") || trimmed.eq_ignore_ascii_case("yes")
    } else {
        false
    }
}

/// What: Create an installed store and load it once.
///
/// Output:
/// - The store and whether the load succeeded; on failure the store stays
///   empty and the error is printed.
pub async fn loaded_store(backend: &Arc<dyn PackageBackend>) -> (Arc<InstalledStore>, bool) {
    let store = Arc::new(InstalledStore::new(Arc::clone(backend)));
    let ok = match store.refresh().await {
        Ok(_) => true,
        Err(e) => {
            eprintln!("pkpanel: {e}");
            false
        }
    };
    (store, ok)
}

/// One text line per package: `name version arch [marker] - summary`.
///
/// The marker and the ` - summary` tail are left out when empty.
#[must_use]
pub fn format_record(record: &PackageRecord, marker: &str) -> String {
    let mut line = format!("{} {} {}", record.name, record.version, record.arch);
    if !marker.is_empty() {
        line.push(' ');
        line.push_str(marker);
    }
    let summary = record.summary_line();
    if !summary.is_empty() {
        line.push_str(" - ");
        line.push_str(summary);
    }
    line
}
