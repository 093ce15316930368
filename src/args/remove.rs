//! Command-line remove functionality.

use std::process::ExitCode;
use std::sync::Arc;

use super::utils::{format_record, loaded_store, prompt_user_no_default};
use crate::config::Settings;
use crate::error::TransactionError;
use crate::install::{AuditLog, RemoveDialog, confirm_remove};
use crate::privilege::probe;
use crate::sources::PackageBackend;

/// What: Remove one installed package by id.
///
/// Inputs:
/// - `backend`: Package service
/// - `settings`: Remove flags and admin groups
/// - `id`: Installed package id
/// - `yes`: Skip the confirmation prompt
///
/// Output:
/// - `SUCCESS` when removed or cancelled by the user, `FAILURE` otherwise.
///
/// Details:
/// - The id must be present in the installed set; matching is exact.
pub async fn handle_remove(
    backend: Arc<dyn PackageBackend>,
    settings: &Settings,
    id: &str,
    yes: bool,
) -> ExitCode {
    tracing::info!(id, "remove requested from CLI");
    if !probe(&settings.admin_groups).is_admin() {
        eprintln!("pkpanel: {}", TransactionError::NotAuthorized);
        return ExitCode::FAILURE;
    }
    let (store, ok) = loaded_store(&backend).await;
    if !ok {
        return ExitCode::FAILURE;
    }
    let Some(record) = store.snapshot().records.get(id).cloned() else {
        eprintln!("pkpanel: not installed: {id}");
        return ExitCode::FAILURE;
    };
    if !yes && !prompt_user_no_default(&format!("Remove {}?", format_record(&record, ""))) {
        tracing::info!("user cancelled removal");
        println!("Cancelled.");
        return ExitCode::SUCCESS;
    }
    let mut dialog = RemoveDialog::new();
    if let Err(e) = dialog.open(record) {
        eprintln!("pkpanel: {e}");
        return ExitCode::FAILURE;
    }
    let audit = AuditLog::in_logs_dir();
    match confirm_remove(&mut dialog, &*backend, &store, settings.remove_options(), &audit).await {
        Ok(()) => {
            println!("Removed {id}.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("pkpanel: remove {id}: {}", e.message());
            ExitCode::FAILURE
        }
    }
}
