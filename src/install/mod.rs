//! Mutation actions: install through a confirmation collaborator and the
//! remove confirmation flow.

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::error::TransactionError;
use crate::index::InstalledStore;
use crate::sources::PackageBackend;

mod audit;
mod remove;

pub use audit::AuditLog;
pub use remove::{RemoveDialog, RemovePhase, confirm_remove, execute_remove};

/// What: Collaborator that confirms and runs an install for a package name.
///
/// Details:
/// - Runs its own transaction and resolves or rejects; the caller only
///   reacts to the outcome.
pub trait InstallDialog: Send + Sync {
    /// Install `name`, resolving once the transaction ended.
    fn install(&self, name: &str) -> BoxFuture<'static, Result<(), TransactionError>>;
}

/// Install collaborator backed directly by the package service.
#[derive(Clone, Debug)]
pub struct BackendInstallDialog {
    backend: Arc<dyn PackageBackend>,
}

impl BackendInstallDialog {
    /// Wrap `backend`.
    #[must_use]
    pub fn new(backend: Arc<dyn PackageBackend>) -> Self {
        Self { backend }
    }
}

impl InstallDialog for BackendInstallDialog {
    fn install(&self, name: &str) -> BoxFuture<'static, Result<(), TransactionError>> {
        let tx = self.backend.install_packages(&[name.to_string()]);
        Box::pin(async move { tx.finish().await.map_err(TransactionError::from) })
    }
}

/// What: Install `name` and refresh the installed store on success.
///
/// Inputs:
/// - `dialog`: Install collaborator
/// - `store`: Installed store refreshed afterwards
/// - `name`: Package name
/// - `refresh_after`: Whether a successful install triggers a refresh
/// - `audit`: Where the installed name is recorded
///
/// Output:
/// - The collaborator's outcome. A failing follow-up refresh is logged only.
///
/// # Errors
///
/// Returns the collaborator's `TransactionError` unchanged.
pub async fn install(
    dialog: &dyn InstallDialog,
    store: &Arc<InstalledStore>,
    name: &str,
    refresh_after: bool,
    audit: &AuditLog,
) -> Result<(), TransactionError> {
    let name = name.trim();
    tracing::info!(name, "install requested");
    if let Err(e) = dialog.install(name).await {
        tracing::warn!(name, error = %e, "install failed");
        return Err(e);
    }
    tracing::info!(name, "install finished");
    audit.log_installed(&[name.to_string()]);
    if refresh_after && let Err(e) = store.refresh().await {
        tracing::warn!(error = %e, "refresh after install failed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{BackendCall, Filter, ScriptedBackend, ScriptedResponse};
    use crate::state::{PackageFound, PackageInfo};

    fn setup() -> (Arc<ScriptedBackend>, Arc<InstalledStore>, BackendInstallDialog) {
        let backend = Arc::new(ScriptedBackend::new());
        let dyn_backend: Arc<dyn PackageBackend> = Arc::clone(&backend) as Arc<dyn PackageBackend>;
        let store = Arc::new(InstalledStore::new(Arc::clone(&dyn_backend)));
        (backend, store, BackendInstallDialog::new(dyn_backend))
    }

    #[tokio::test]
    /// What: A successful install refreshes the store once.
    ///
    /// Inputs:
    /// - Install succeeds; the follow-up listing includes the new package.
    ///
    /// Output:
    /// - Calls are install then one `GetPackages(Installed)`; the store holds
    ///   the package and the audit log names it.
    async fn install_success_refreshes_store() {
        let (backend, store, dialog) = setup();
        backend.push_install(ScriptedResponse::ok(Vec::new()));
        backend.push_get_packages(ScriptedResponse::ok(vec![PackageFound::new(
            PackageInfo::Installed,
            "htop;3.3;x86_64;",
            "",
        )]));

        let logs = tempfile::tempdir().expect("tempdir");
        install(&dialog, &store, " htop ", true, &AuditLog::in_dir(logs.path()))
            .await
            .expect("install");
        assert_eq!(
            backend.calls(),
            vec![
                BackendCall::InstallPackages(vec!["htop".into()]),
                BackendCall::GetPackages(Filter::Installed),
            ]
        );
        assert!(store.is_installed("htop;3.3;x86_64;"));
        let audit = std::fs::read_to_string(logs.path().join("install_log.log")).expect("audit");
        assert!(audit.trim_end().ends_with(" htop"));
    }

    #[tokio::test]
    /// What: A failed install passes the message through and skips the refresh.
    async fn install_failure_skips_refresh() {
        let (backend, store, dialog) = setup();
        backend.push_install(ScriptedResponse::failed("package not found"));
        let logs = tempfile::tempdir().expect("tempdir");
        let err = install(&dialog, &store, "nope", true, &AuditLog::in_dir(logs.path()))
            .await
            .expect_err("fails");
        assert_eq!(err.message(), "package not found");
        assert_eq!(backend.get_packages_calls(), 0);
        assert!(!logs.path().join("install_log.log").exists());
    }
}
