//! Remove confirmation state machine and the remove transaction.

use std::sync::Arc;

use super::audit::AuditLog;
use crate::error::TransactionError;
use crate::index::InstalledStore;
use crate::sources::{PackageBackend, RemoveOptions};
use crate::state::PackageRecord;

/// Phase of the remove confirmation.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum RemovePhase {
    /// No confirmation open.
    #[default]
    Idle,
    /// Awaiting the user's decision; `error` holds the last failure, if any.
    Confirming {
        /// Package to remove.
        target: PackageRecord,
        /// Inline failure message from the previous attempt.
        error: Option<String>,
    },
    /// Remove transaction running; cancel is refused.
    Removing {
        /// Package being removed.
        target: PackageRecord,
    },
}

/// What: Remove confirmation state machine.
///
/// Details:
/// - `Idle -> Confirming -> Removing`, then back to `Idle` on success or to
///   `Confirming` with the error message on failure.
/// - Cancel returns to `Idle` only while not `Removing`.
#[derive(Debug, Default)]
pub struct RemoveDialog {
    phase: RemovePhase,
}

impl RemoveDialog {
    /// Closed dialog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> &RemovePhase {
        &self.phase
    }

    /// Whether a confirmation is showing.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        !matches!(self.phase, RemovePhase::Idle)
    }

    /// Whether the transaction is running.
    #[must_use]
    pub const fn is_removing(&self) -> bool {
        matches!(self.phase, RemovePhase::Removing { .. })
    }

    /// What: Open the confirmation for `target`.
    ///
    /// # Errors
    ///
    /// Returns `Busy` while a remove transaction is running. Opening over an
    /// existing confirmation replaces its target.
    pub fn open(&mut self, target: PackageRecord) -> Result<(), TransactionError> {
        if self.is_removing() {
            return Err(TransactionError::Busy);
        }
        tracing::debug!(id = %target.id, "remove confirmation opened");
        self.phase = RemovePhase::Confirming {
            target,
            error: None,
        };
        Ok(())
    }

    /// Close the confirmation; `false` when refused (running) or nothing open.
    pub fn cancel(&mut self) -> bool {
        match self.phase {
            RemovePhase::Confirming { .. } => {
                tracing::debug!("remove confirmation cancelled");
                self.phase = RemovePhase::Idle;
                true
            }
            RemovePhase::Idle | RemovePhase::Removing { .. } => false,
        }
    }

    /// What: Move from `Confirming` to `Removing`.
    ///
    /// Output:
    /// - The record to remove.
    ///
    /// # Errors
    ///
    /// `NothingToConfirm` when idle, `Busy` when already removing.
    pub fn begin(&mut self) -> Result<PackageRecord, TransactionError> {
        match std::mem::take(&mut self.phase) {
            RemovePhase::Confirming { target, .. } => {
                self.phase = RemovePhase::Removing {
                    target: target.clone(),
                };
                Ok(target)
            }
            RemovePhase::Idle => Err(TransactionError::NothingToConfirm),
            running @ RemovePhase::Removing { .. } => {
                self.phase = running;
                Err(TransactionError::Busy)
            }
        }
    }

    /// What: Settle a running remove with its outcome.
    ///
    /// Output:
    /// - `true` when the phase changed (a remove was running).
    ///
    /// Details:
    /// - Success closes the confirmation; failure reopens it with the
    ///   service's message inline so the user may retry or cancel.
    pub fn finish(&mut self, result: &Result<(), TransactionError>) -> bool {
        let RemovePhase::Removing { target } = std::mem::take(&mut self.phase) else {
            return false;
        };
        if let Err(e) = result {
            self.phase = RemovePhase::Confirming {
                target,
                error: Some(e.message()),
            };
        }
        true
    }
}

/// What: Issue one remove transaction for exactly `id`.
///
/// # Errors
///
/// Returns the service failure as `TransactionError::Service`.
pub async fn execute_remove(
    backend: &dyn PackageBackend,
    id: &str,
    options: RemoveOptions,
    audit: &AuditLog,
) -> Result<(), TransactionError> {
    tracing::info!(id, allow_deps = options.allow_deps, autoremove = options.autoremove, "removing package");
    match backend.remove_packages(&[id.to_string()], options).finish().await {
        Ok(()) => {
            tracing::info!(id, "package removed");
            audit.log_removed(&[id.to_string()]);
            Ok(())
        }
        Err(e) => {
            tracing::warn!(id, error = %e, "remove failed");
            Err(e.into())
        }
    }
}

/// What: Run the confirmed removal end to end.
///
/// Inputs:
/// - `dialog`: Confirmation in the `Confirming` phase
/// - `backend`: Package service
/// - `store`: Installed store refreshed after success
/// - `options`: Remove flags
/// - `audit`: Where the removed id is recorded
///
/// Output:
/// - The transaction outcome; the dialog has already been settled.
///
/// # Errors
///
/// Returns `NothingToConfirm`/`Busy` from the dialog, or the service failure.
///
/// Details:
/// - Success triggers exactly one store refresh; failure leaves the store alone.
pub async fn confirm_remove(
    dialog: &mut RemoveDialog,
    backend: &dyn PackageBackend,
    store: &Arc<InstalledStore>,
    options: RemoveOptions,
    audit: &AuditLog,
) -> Result<(), TransactionError> {
    let target = dialog.begin()?;
    let result = execute_remove(backend, &target.id, options, audit).await;
    dialog.finish(&result);
    if result.is_ok()
        && let Err(e) = store.refresh().await
    {
        tracing::warn!(error = %e, "refresh after remove failed");
    }
    result
}
