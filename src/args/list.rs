//! Command-line list installed packages functionality.

use std::process::ExitCode;
use std::sync::Arc;

use super::utils::{format_record, loaded_store};
use crate::logic::{filter_installed, sorted_records};
use crate::sources::PackageBackend;

/// What: Print installed packages whose id contains `filter`.
///
/// Inputs:
/// - `backend`: Package service
/// - `filter`: Case-insensitive id substring; empty lists everything
/// - `json`: Print a JSON array instead of text lines
///
/// Output:
/// - `SUCCESS`, or `FAILURE` when the installed set could not be loaded.
pub async fn handle_list(backend: Arc<dyn PackageBackend>, filter: &str, json: bool) -> ExitCode {
    tracing::info!(filter, json, "list installed packages requested from CLI");
    let (store, ok) = loaded_store(&backend).await;
    if !ok {
        return ExitCode::FAILURE;
    }
    let matched = filter_installed(filter, &store.snapshot().records);
    let rows = sorted_records(&matched);
    if json {
        match serde_json::to_string_pretty(&rows) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                eprintln!("pkpanel: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        for r in rows {
            println!("{}", format_record(r, ""));
        }
    }
    ExitCode::SUCCESS
}
