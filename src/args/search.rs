//! Command-line search functionality.

use std::process::ExitCode;
use std::sync::Arc;

use super::utils::{format_record, loaded_store};
use crate::logic::{search_remote, sorted_hits};
use crate::sources::PackageBackend;

/// What: Search packages by name and print hits with their installed marker.
///
/// Inputs:
/// - `backend`: Package service
/// - `query`: Search text
/// - `json`: Print a JSON array instead of text lines
///
/// Output:
/// - `SUCCESS`, or `FAILURE` when the search failed.
///
/// Details:
/// - The installed set is loaded first to annotate hits; if that fails hits
///   are shown as not installed.
pub async fn handle_search(backend: Arc<dyn PackageBackend>, query: &str, json: bool) -> ExitCode {
    tracing::info!(query, json, "search requested from CLI");
    let (store, _) = loaded_store(&backend).await;
    let hits = match search_remote(&*backend, &store, query).await {
        Ok(h) => h,
        Err(e) => {
            eprintln!("pkpanel: {e}");
            tracing::error!(error = %e, "search failed");
            return ExitCode::FAILURE;
        }
    };
    let rows = sorted_hits(&hits);
    if json {
        match serde_json::to_string_pretty(&rows) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                eprintln!("pkpanel: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        for h in rows {
            let marker = if h.is_installed { "[installed]" } else { "" };
            println!("{}", format_record(&h.record, marker));
        }
    }
    ExitCode::SUCCESS
}
