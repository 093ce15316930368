//! Command-line install functionality.

use std::process::ExitCode;
use std::sync::Arc;

use super::utils::prompt_user_no_default;
use crate::config::Settings;
use crate::error::TransactionError;
use crate::index::InstalledStore;
use crate::install::{AuditLog, BackendInstallDialog, install};
use crate::privilege::probe;
use crate::sources::PackageBackend;

/// What: Install one package by name.
///
/// Inputs:
/// - `backend`: Package service
/// - `settings`: Admin groups for the privilege check
/// - `name`: Package name
/// - `yes`: Skip the confirmation prompt
///
/// Output:
/// - `SUCCESS` when installed or cancelled by the user, `FAILURE` otherwise.
pub async fn handle_install(
    backend: Arc<dyn PackageBackend>,
    settings: &Settings,
    name: &str,
    yes: bool,
) -> ExitCode {
    tracing::info!(name, "install requested from CLI");
    if !probe(&settings.admin_groups).is_admin() {
        eprintln!("pkpanel: {}", TransactionError::NotAuthorized);
        return ExitCode::FAILURE;
    }
    if !yes && !prompt_user_no_default(&format!("Install {name}?")) {
        tracing::info!("user cancelled install");
        println!("Cancelled.");
        return ExitCode::SUCCESS;
    }
    let store = Arc::new(InstalledStore::new(Arc::clone(&backend)));
    let dialog = BackendInstallDialog::new(backend);
    match install(&dialog, &store, name, false, &AuditLog::in_logs_dir()).await {
        Ok(()) => {
            println!("Installed {name}.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("pkpanel: install {name}: {}", e.message());
            ExitCode::FAILURE
        }
    }
}
