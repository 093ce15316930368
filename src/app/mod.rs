//! Panel coordinator: ties the installed store, the search box, the remove
//! confirmation and the privilege gate together and turns user intent into
//! background tasks.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::config::Settings;
use crate::error::{QueryError, TransactionError};
use crate::index::{InstalledStore, RefreshOutcome};
use crate::install::{AuditLog, InstallDialog, RemoveDialog, RemovePhase, execute_remove, install};
use crate::logic::{Mode, SearchCoordinator, SearchOutcome, sorted_hits, sorted_records};
use crate::privilege::Privilege;
use crate::sources::{PackageBackend, RemoveOptions};

pub mod runtime;
pub mod surface;

pub use runtime::{Channels, run_interactive};
pub use surface::{ADMIN_REQUIRED, ConfirmView, DisplaySurface, PanelView, Row, RowAction, TextSurface};

/// User intent dispatched to the panel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Search box text changed.
    Input(String),
    /// Apply the typed text now.
    Search,
    /// Empty the search box and query now.
    Clear,
    /// Switch between the uninstall and install views.
    SwitchMode(Mode),
    /// Re-query the installed set.
    Refresh,
    /// Open the remove confirmation for an installed id.
    RequestRemove(String),
    /// Confirm the open removal.
    ConfirmRemove,
    /// Close the open confirmation.
    CancelRemove,
    /// Install a package by name.
    Install(String),
    /// Leave the panel.
    Quit,
}

/// Completion of a background task started by the panel.
#[derive(Debug)]
pub enum TaskDone {
    /// Remove transaction ended.
    Removed(Result<(), TransactionError>),
    /// Install finished (including its follow-up refresh).
    Installed {
        /// Package name.
        name: String,
        /// Outcome.
        result: Result<(), TransactionError>,
    },
    /// Installed store refresh ended.
    Refreshed(Result<RefreshOutcome, QueryError>),
}

/// Behaviour knobs taken from the settings.
///
/// The default options record no audit lines; [`PanelOptions::from`] the
/// settings writes them under the logs directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PanelOptions {
    /// Search debounce interval.
    pub debounce: Duration,
    /// Remove transaction flags.
    pub remove: RemoveOptions,
    /// Refresh after a successful install.
    pub refresh_after_install: bool,
    /// Audit log for finished transactions.
    pub audit: AuditLog,
}

impl From<&Settings> for PanelOptions {
    fn from(s: &Settings) -> Self {
        Self {
            debounce: s.debounce(),
            remove: s.remove_options(),
            refresh_after_install: s.refresh_after_install,
            audit: AuditLog::in_logs_dir(),
        }
    }
}

impl Default for PanelOptions {
    fn default() -> Self {
        let s = Settings::default();
        Self {
            debounce: s.debounce(),
            remove: s.remove_options(),
            refresh_after_install: s.refresh_after_install,
            audit: AuditLog::default(),
        }
    }
}

/// What: The package panel.
///
/// Details:
/// - All state lives on the event loop; transactions and refreshes run as
///   spawned tasks that report back through [`Channels`].
/// - Mutations are refused with `NotAuthorized` while unprivileged.
pub struct Panel {
    store: Arc<InstalledStore>,
    backend: Arc<dyn PackageBackend>,
    installer: Arc<dyn InstallDialog>,
    search: SearchCoordinator,
    remove: RemoveDialog,
    privilege: Privilege,
    options: PanelOptions,
    installing: Option<String>,
    refresh_error: Option<String>,
    notice: Option<String>,
    task_tx: mpsc::UnboundedSender<TaskDone>,
}

impl std::fmt::Debug for Panel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Panel")
            .field("mode", &self.search.mode())
            .field("remove", &self.remove)
            .field("privilege", &self.privilege)
            .field("installing", &self.installing)
            .finish_non_exhaustive()
    }
}

impl Panel {
    /// What: Assemble a panel.
    ///
    /// Inputs:
    /// - `store`: Shared installed store
    /// - `backend`: Package service for searches and removals
    /// - `installer`: Install confirmation collaborator
    /// - `options`: Behaviour knobs
    /// - `privilege`: Access level at startup
    ///
    /// Output:
    /// - The panel and the channels its background tasks report on.
    #[must_use]
    pub fn new(
        store: Arc<InstalledStore>,
        backend: Arc<dyn PackageBackend>,
        installer: Arc<dyn InstallDialog>,
        options: PanelOptions,
        privilege: Privilege,
    ) -> (Self, Channels) {
        let (search, outcome_rx) =
            SearchCoordinator::new(Arc::clone(&store), Arc::clone(&backend), options.debounce);
        let (task_tx, task_rx) = mpsc::unbounded_channel();
        let channels = Channels {
            outcome_rx,
            task_rx,
            store_rx: store.subscribe(),
        };
        let panel = Self {
            store,
            backend,
            installer,
            search,
            remove: RemoveDialog::new(),
            privilege,
            options,
            installing: None,
            refresh_error: None,
            notice: None,
            task_tx,
        };
        (panel, channels)
    }

    /// Initial population of the installed store.
    pub fn start(&mut self) {
        self.spawn_refresh();
    }

    /// What: Handle one user action.
    ///
    /// Output:
    /// - `true` when the panel should close.
    pub fn dispatch(&mut self, action: Action) -> bool {
        tracing::debug!(?action, "dispatch");
        match action {
            Action::Input(text) => self.search.input(&text),
            Action::Search => {
                self.search.submit();
            }
            Action::Clear => self.search.clear(),
            Action::SwitchMode(mode) => {
                self.search.set_mode(mode);
            }
            Action::Refresh => self.spawn_refresh(),
            Action::RequestRemove(id) => self.request_remove(&id),
            Action::ConfirmRemove => self.confirm_remove(),
            Action::CancelRemove => {
                self.remove.cancel();
            }
            Action::Install(name) => self.start_install(&name),
            Action::Quit => return true,
        }
        false
    }

    fn request_remove(&mut self, id: &str) {
        let id = id.trim();
        let Some(record) = self.store.snapshot().records.get(id).cloned() else {
            self.notice = Some(format!("not installed: {id}"));
            return;
        };
        match self.remove.open(record) {
            Ok(()) => self.notice = None,
            Err(e) => self.notice = Some(e.message()),
        }
    }

    fn confirm_remove(&mut self) {
        let target = match self.remove.begin() {
            Ok(t) => t,
            Err(e) => {
                self.notice = Some(e.message());
                return;
            }
        };
        if !self.privilege.is_admin() {
            self.remove.finish(&Err(TransactionError::NotAuthorized));
            return;
        }
        let backend = Arc::clone(&self.backend);
        let options = self.options.remove;
        let audit = self.options.audit.clone();
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let result = execute_remove(&*backend, &target.id, options, &audit).await;
            let _ = tx.send(TaskDone::Removed(result));
        });
    }

    fn start_install(&mut self, name: &str) {
        let name = name.trim().to_string();
        if name.is_empty() {
            return;
        }
        if !self.privilege.is_admin() {
            self.notice = Some(TransactionError::NotAuthorized.message());
            return;
        }
        if self.installing.is_some() {
            self.notice = Some(TransactionError::Busy.message());
            return;
        }
        self.installing = Some(name.clone());
        self.notice = None;
        let installer = Arc::clone(&self.installer);
        let store = Arc::clone(&self.store);
        let refresh_after = self.options.refresh_after_install;
        let audit = self.options.audit.clone();
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let result = install(&*installer, &store, &name, refresh_after, &audit).await;
            let _ = tx.send(TaskDone::Installed { name, result });
        });
    }

    fn spawn_refresh(&self) {
        // `refresh` claims synchronously so loading shows before the task runs.
        let refresh = self.store.refresh();
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(TaskDone::Refreshed(refresh.await));
        });
    }

    /// What: Apply a finished background task.
    ///
    /// Details:
    /// - A successful remove closes the confirmation and triggers exactly one
    ///   refresh; a failed one reopens it with the message inline.
    pub fn on_task(&mut self, done: TaskDone) {
        match done {
            TaskDone::Removed(result) => {
                self.remove.finish(&result);
                if result.is_ok() {
                    self.spawn_refresh();
                }
            }
            TaskDone::Installed { name, result } => {
                self.installing = None;
                self.notice = result.err().map(|e| format!("install {name}: {}", e.message()));
            }
            TaskDone::Refreshed(Ok(RefreshOutcome::Replaced { .. })) => self.refresh_error = None,
            // The queued re-run reports on the refresh that is still running.
            TaskDone::Refreshed(Ok(RefreshOutcome::Coalesced)) => {}
            TaskDone::Refreshed(Err(e)) => self.refresh_error = Some(e.to_string()),
        }
    }

    /// Feed a remote search completion; `true` when it was applied.
    pub fn on_search_outcome(&mut self, outcome: SearchOutcome) -> bool {
        self.search.on_outcome(outcome)
    }

    /// The installed store changed.
    pub fn on_store_changed(&mut self) {
        self.search.on_store_changed();
    }

    /// Administrative access changed.
    pub fn on_privilege(&mut self, privilege: Privilege) {
        if privilege != self.privilege {
            tracing::info!(?privilege, "panel access changed");
        }
        self.privilege = privilege;
    }

    /// Apply debounced text as the effective query.
    pub fn apply_debounced(&mut self, text: &str) {
        self.search.apply(text);
    }

    /// Resolves once typed input settled; see [`SearchCoordinator::next_debounced`].
    pub async fn next_debounced(&mut self) -> String {
        self.search.next_debounced().await
    }

    /// Show a one-line message, e.g. a usage hint.
    pub fn notify(&mut self, message: impl Into<String>) {
        self.notice = Some(message.into());
    }

    /// Search box state.
    #[must_use]
    pub const fn search(&self) -> &SearchCoordinator {
        &self.search
    }

    /// Remove confirmation state.
    #[must_use]
    pub const fn remove_dialog(&self) -> &RemoveDialog {
        &self.remove
    }

    /// What: Build the frame for the display surface.
    ///
    /// Output:
    /// - `AdminRequired` while unprivileged, otherwise the sorted rows of the
    ///   active mode with loading, error and confirmation state.
    #[must_use]
    pub fn view(&self) -> PanelView {
        if !self.privilege.is_admin() {
            return PanelView::AdminRequired;
        }
        let snapshot = self.store.snapshot();
        let mode = self.search.mode();
        let rows = match mode {
            Mode::Remove => sorted_records(self.search.filtered())
                .into_iter()
                .map(|r| Row {
                    id: r.id.clone(),
                    name: r.name.clone(),
                    version: r.version.clone(),
                    summary: r.summary_line().to_string(),
                    action: RowAction::Uninstall,
                })
                .collect(),
            Mode::Install => sorted_hits(self.search.hits())
                .into_iter()
                .map(|h| Row {
                    id: h.record.id.clone(),
                    name: h.record.name.clone(),
                    version: h.record.version.clone(),
                    summary: h.record.summary_line().to_string(),
                    action: if h.is_installed {
                        RowAction::Reinstall
                    } else {
                        RowAction::Install
                    },
                })
                .collect(),
        };
        let loading = match mode {
            Mode::Remove => snapshot.loading,
            Mode::Install => self.search.is_searching(),
        };
        let error = self
            .notice
            .clone()
            .or_else(|| self.search.last_error().map(String::from))
            .or_else(|| self.refresh_error.clone());
        let confirm = match self.remove.phase() {
            RemovePhase::Idle => None,
            RemovePhase::Confirming { target, error } => Some(ConfirmView {
                id: target.id.clone(),
                name: target.name.clone(),
                removing: false,
                error: error.clone(),
            }),
            RemovePhase::Removing { target } => Some(ConfirmView {
                id: target.id.clone(),
                name: target.name.clone(),
                removing: true,
                error: None,
            }),
        };
        PanelView::Packages {
            mode,
            query: self.search.typed().to_string(),
            rows,
            loading,
            error,
            confirm,
            installing: self.installing.clone(),
        }
    }
}
