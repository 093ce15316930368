//! Package service backends.
//!
//! The package service is an external collaborator: every call starts a
//! transaction that streams zero or more [`PackageFound`] results and then
//! terminates with success or failure. This module defines the
//! [`PackageBackend`] seam and the [`Transaction`] handle that models that
//! contract as a finite, non-restartable sequence terminated by a `Result`.
//!
//! Backends:
//! - [`pkcon::PkconBackend`]: drives the PackageKit console client
//! - [`scripted::ScriptedBackend`]: replays canned responses in-process

use tokio::sync::mpsc;

use crate::error::ServiceError;
use crate::state::PackageFound;

pub mod pkcon;
pub mod scripted;

pub use pkcon::PkconBackend;
pub use scripted::{BackendCall, ScriptedBackend, ScriptedResponse};

/// Package filter applied to a listing or search.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Filter {
    /// No filtering.
    #[default]
    None,
    /// Only installed packages.
    Installed,
}

impl Filter {
    /// Filter spelling understood by the PackageKit tools.
    #[must_use]
    pub const fn as_arg(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Installed => "installed",
        }
    }
}

/// Flags passed along with a remove transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RemoveOptions {
    /// Allow removing packages that depend on the target.
    pub allow_deps: bool,
    /// Also remove dependencies no longer needed.
    pub autoremove: bool,
}

impl Default for RemoveOptions {
    fn default() -> Self {
        Self {
            allow_deps: true,
            autoremove: false,
        }
    }
}

/// Event pushed by a backend into a [`Transaction`].
#[derive(Debug)]
enum TransactionEvent {
    Package(PackageFound),
    Finished(Result<(), ServiceError>),
}

/// Producer half of a transaction, held by the backend task.
#[derive(Debug)]
pub struct TransactionSink {
    tx: mpsc::UnboundedSender<TransactionEvent>,
}

impl TransactionSink {
    /// What: Stream one result to the consumer.
    ///
    /// Output:
    /// - `false` once the consumer dropped its handle; backends stop work then.
    pub fn package(&self, found: PackageFound) -> bool {
        self.tx.send(TransactionEvent::Package(found)).is_ok()
    }

    /// Deliver the terminal result; consumes the sink.
    pub fn finish(self, result: Result<(), ServiceError>) {
        let _ = self.tx.send(TransactionEvent::Finished(result));
    }

    /// Resolves once the consumer dropped its [`Transaction`].
    pub async fn closed(&self) {
        self.tx.closed().await;
    }
}

/// Consumer handle of a running transaction.
///
/// Dropping the handle cancels the underlying work.
#[derive(Debug)]
pub struct Transaction {
    rx: mpsc::UnboundedReceiver<TransactionEvent>,
    outcome: Option<Result<(), ServiceError>>,
}

impl Transaction {
    /// Create a connected sink/handle pair.
    #[must_use]
    pub fn channel() -> (TransactionSink, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            TransactionSink { tx },
            Self { rx, outcome: None },
        )
    }

    /// Handle that is already finished with `result` and streams nothing.
    #[must_use]
    pub fn ready(result: Result<(), ServiceError>) -> Self {
        let (sink, tx) = Self::channel();
        sink.finish(result);
        tx
    }

    /// What: Await the next streamed result.
    ///
    /// Output:
    /// - `Some(found)` for each streamed package; `None` once the terminal
    ///   result arrived (kept for [`Transaction::finish`]).
    ///
    /// Details:
    /// - A backend that vanishes without a terminal result counts as cancelled.
    pub async fn next_package(&mut self) -> Option<PackageFound> {
        if self.outcome.is_some() {
            return None;
        }
        match self.rx.recv().await {
            Some(TransactionEvent::Package(found)) => Some(found),
            Some(TransactionEvent::Finished(result)) => {
                self.outcome = Some(result);
                None
            }
            None => {
                self.outcome = Some(Err(ServiceError::Cancelled));
                None
            }
        }
    }

    /// Drain remaining results and return the terminal outcome.
    ///
    /// # Errors
    ///
    /// Returns the backend's failure, or `Cancelled` if it vanished.
    pub async fn finish(mut self) -> Result<(), ServiceError> {
        while self.next_package().await.is_some() {}
        self.outcome.take().unwrap_or(Err(ServiceError::Cancelled))
    }

    /// Gather every streamed result, failing if the transaction failed.
    ///
    /// # Errors
    ///
    /// Returns the backend's failure; partial results are discarded.
    pub async fn collect(mut self) -> Result<Vec<PackageFound>, ServiceError> {
        let mut out = Vec::new();
        while let Some(found) = self.next_package().await {
            out.push(found);
        }
        self.outcome
            .take()
            .unwrap_or(Err(ServiceError::Cancelled))
            .map(|()| out)
    }
}

/// What: The external package-management service.
///
/// Details:
/// - Every method starts the transaction immediately and returns its handle;
///   implementations spawn onto the current tokio runtime.
/// - Package ids are passed through verbatim.
pub trait PackageBackend: Send + Sync + std::fmt::Debug {
    /// `GetPackages(filter)`: list packages, typically `Filter::Installed`.
    fn get_packages(&self, filter: Filter) -> Transaction;

    /// `SearchNames(filter, terms)`: search packages by name.
    fn search_names(&self, filter: Filter, terms: &[String]) -> Transaction;

    /// `RemovePackages(ids, allowDeps, autoremove)`.
    fn remove_packages(&self, package_ids: &[String], options: RemoveOptions) -> Transaction;

    /// Install the named packages.
    fn install_packages(&self, names: &[String]) -> Transaction;
}
