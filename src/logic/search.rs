//! Search box coordination for both views.
//!
//! Uninstall mode filters the installed snapshot locally; install mode runs
//! remote name searches and annotates hits with their installed state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::debounce::Debouncer;
use super::filter::{filter_installed, normalize};
use super::query::{QueryTracker, SearchQuery};
use crate::error::QueryError;
use crate::index::InstalledStore;
use crate::sources::{Filter, PackageBackend};
use crate::state::{HitMap, PackageMap, PackageRecord, SearchHit};

/// Which view the search box drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Mode {
    /// Filter the installed set (uninstall flow).
    #[default]
    Remove,
    /// Search the package service by name (install flow).
    Install,
}

impl Mode {
    /// Short label for headers and logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Remove => "uninstall",
            Self::Install => "install",
        }
    }
}

/// Completed remote search, tagged with the query's sequence number.
#[derive(Debug)]
pub struct SearchOutcome {
    /// Sequence number of the query this answers.
    pub seq: u64,
    /// Hits or the failure.
    pub result: Result<HitMap, QueryError>,
}

/// What: Run one remote name search and annotate hits with installed state.
///
/// Inputs:
/// - `backend`: Package service
/// - `store`: Installed store probed per streamed result
/// - `term`: Raw search text
///
/// Output:
/// - Empty map without contacting the service when `term` normalizes to
///   empty; otherwise every streamed package keyed by id.
///
/// # Errors
///
/// Returns `QueryError` when the service reports a failure.
pub async fn search_remote(
    backend: &dyn PackageBackend,
    store: &InstalledStore,
    term: &str,
) -> Result<HitMap, QueryError> {
    if normalize(term).is_empty() {
        return Ok(HashMap::new());
    }
    let mut tx = backend.search_names(Filter::None, &[term.trim().to_string()]);
    let mut hits = HashMap::new();
    while let Some(found) = tx.next_package().await {
        let record = PackageRecord::from_found(found);
        let is_installed = store.is_installed(&record.id);
        hits.insert(
            record.id.clone(),
            SearchHit {
                record,
                is_installed,
            },
        );
    }
    tx.finish()
        .await
        .map_err(|source| QueryError::new("SearchNames", source))?;
    Ok(hits)
}

/// What: Owns the search box: debounce, effective query, and the filtered
/// view for the active mode.
///
/// Details:
/// - Uninstall mode filters the installed snapshot locally; the filter is
///   deferred while the store is loading and evaluated once it settles.
/// - Install mode spawns one remote search per effective query. Completions
///   come back on the outcome channel and only the latest one is applied.
/// - Switching mode resets the effective query and aborts the in-flight
///   remote search.
#[derive(Debug)]
pub struct SearchCoordinator {
    mode: Mode,
    store: Arc<InstalledStore>,
    backend: Arc<dyn PackageBackend>,
    debouncer: Debouncer,
    tracker: QueryTracker,
    typed: String,
    effective: String,
    filtered: Arc<PackageMap>,
    filter_deferred: bool,
    hits: Arc<HitMap>,
    searching: bool,
    last_error: Option<String>,
    in_flight: Option<JoinHandle<()>>,
    outcome_tx: mpsc::UnboundedSender<SearchOutcome>,
}

impl SearchCoordinator {
    /// What: Build a coordinator in uninstall mode with an empty query.
    ///
    /// Output:
    /// - The coordinator and the receiver its remote searches report to; the
    ///   owner feeds received outcomes back through [`Self::on_outcome`].
    #[must_use]
    pub fn new(
        store: Arc<InstalledStore>,
        backend: Arc<dyn PackageBackend>,
        debounce: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<SearchOutcome>) {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let mut this = Self {
            mode: Mode::default(),
            store,
            backend,
            debouncer: Debouncer::new(debounce),
            tracker: QueryTracker::new(),
            typed: String::new(),
            effective: String::new(),
            filtered: Arc::new(HashMap::new()),
            filter_deferred: false,
            hits: Arc::new(HashMap::new()),
            searching: false,
            last_error: None,
            in_flight: None,
            outcome_tx,
        };
        this.refilter();
        (this, outcome_rx)
    }

    /// Record a keystroke; the effective query follows after the quiet interval.
    pub fn input(&mut self, text: &str) {
        self.typed = text.to_string();
        self.debouncer.input(text);
    }

    /// Resolves with the typed text once the debounce interval elapsed.
    pub async fn next_debounced(&mut self) -> String {
        self.debouncer.fired().await
    }

    /// Explicit search: apply the typed text now.
    pub fn submit(&mut self) -> Option<SearchQuery> {
        let text = self.debouncer.flush().unwrap_or_else(|| self.typed.clone());
        self.apply(&text)
    }

    /// Explicit clear: empty the box and the effective query now.
    pub fn clear(&mut self) {
        self.typed.clear();
        self.debouncer.cancel();
        self.apply("");
    }

    /// What: Switch between uninstall and install views.
    ///
    /// Output:
    /// - `true` when the mode changed.
    ///
    /// Details:
    /// - Resets typed and effective query, drops pending input, aborts and
    ///   invalidates any in-flight remote search.
    pub fn set_mode(&mut self, mode: Mode) -> bool {
        if mode == self.mode {
            return false;
        }
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
        self.tracker.invalidate();
        self.debouncer.cancel();
        self.typed.clear();
        self.effective.clear();
        self.searching = false;
        self.last_error = None;
        self.hits = Arc::new(HashMap::new());
        self.mode = mode;
        tracing::debug!(mode = mode.label(), "search mode switched");
        self.refilter();
        true
    }

    /// What: Make `raw` the effective query for the active mode.
    ///
    /// Output:
    /// - The issued remote query in install mode (`None` for an empty query
    ///   or in uninstall mode).
    pub fn apply(&mut self, raw: &str) -> Option<SearchQuery> {
        self.effective = normalize(raw);
        match self.mode {
            Mode::Remove => {
                self.refilter();
                None
            }
            Mode::Install => self.issue_remote(raw),
        }
    }

    /// React to an installed-store change notification.
    pub fn on_store_changed(&mut self) {
        match self.mode {
            Mode::Remove => self.refilter(),
            Mode::Install => self.reannotate(),
        }
    }

    /// What: Apply a completed remote search if it is still current.
    ///
    /// Output:
    /// - `true` when the outcome changed displayed state; `false` when it was
    ///   stale and silently dropped.
    ///
    /// Details:
    /// - Failures keep the previous hits and are remembered as a non-modal
    ///   error line.
    pub fn on_outcome(&mut self, outcome: SearchOutcome) -> bool {
        if self.mode != Mode::Install || !self.tracker.is_current(outcome.seq) {
            tracing::debug!(seq = outcome.seq, latest = self.tracker.latest(), "discarding stale search result");
            return false;
        }
        self.searching = false;
        self.in_flight = None;
        match outcome.result {
            Ok(hits) => {
                tracing::info!(seq = outcome.seq, count = hits.len(), "search results applied");
                self.hits = Arc::new(hits);
                self.last_error = None;
            }
            Err(e) => {
                tracing::warn!(seq = outcome.seq, error = %e, "package search failed; keeping previous results");
                self.last_error = Some(e.to_string());
            }
        }
        true
    }

    fn issue_remote(&mut self, raw: &str) -> Option<SearchQuery> {
        let query = self.tracker.issue(raw);
        if query.normalized.is_empty() {
            self.searching = false;
            self.last_error = None;
            self.hits = Arc::new(HashMap::new());
            return None;
        }
        tracing::info!(seq = query.seq, query = %query.raw.trim(), "issuing package search");
        self.searching = true;
        let backend = Arc::clone(&self.backend);
        let store = Arc::clone(&self.store);
        let tx = self.outcome_tx.clone();
        let seq = query.seq;
        let term = query.raw.clone();
        // The previous search keeps running; its result is discarded on arrival.
        self.in_flight = Some(tokio::spawn(async move {
            let result = search_remote(&*backend, &store, &term).await;
            let _ = tx.send(SearchOutcome { seq, result });
        }));
        Some(query)
    }

    fn refilter(&mut self) {
        if self.mode != Mode::Remove {
            return;
        }
        let snapshot = self.store.snapshot();
        if snapshot.loading {
            self.filter_deferred = true;
            return;
        }
        self.filter_deferred = false;
        self.filtered = filter_installed(&self.effective, &snapshot.records);
    }

    fn reannotate(&mut self) {
        let snapshot = self.store.snapshot();
        if snapshot.loading || self.hits.is_empty() {
            return;
        }
        let stale = self
            .hits
            .values()
            .any(|h| h.is_installed != snapshot.contains(&h.record.id));
        if !stale {
            return;
        }
        let updated = self
            .hits
            .iter()
            .map(|(id, h)| {
                let mut h = h.clone();
                h.is_installed = snapshot.contains(id);
                (id.clone(), h)
            })
            .collect();
        self.hits = Arc::new(updated);
    }

    /// Active mode.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Text as last typed.
    #[must_use]
    pub fn typed(&self) -> &str {
        &self.typed
    }

    /// Normalized effective query.
    #[must_use]
    pub fn effective_query(&self) -> &str {
        &self.effective
    }

    /// Filtered installed records (uninstall view).
    #[must_use]
    pub fn filtered(&self) -> &Arc<PackageMap> {
        &self.filtered
    }

    /// Whether the uninstall filter waits for the store to finish loading.
    #[must_use]
    pub const fn filter_deferred(&self) -> bool {
        self.filter_deferred
    }

    /// Current remote hits (install view).
    #[must_use]
    pub fn hits(&self) -> &Arc<HitMap> {
        &self.hits
    }

    /// Whether a current remote search is outstanding.
    #[must_use]
    pub const fn is_searching(&self) -> bool {
        self.searching
    }

    /// Last non-modal search failure.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Whether typed input is waiting out the debounce interval.
    #[must_use]
    pub const fn input_pending(&self) -> bool {
        self.debouncer.is_pending()
    }
}
