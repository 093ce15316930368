//! Installed store: snapshot, change notification and coalesced refresh.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;

use crate::error::QueryError;
use crate::sources::{Filter, PackageBackend};
use crate::state::{PackageMap, PackageRecord};

/// Point-in-time view of the installed set.
#[derive(Clone, Debug)]
pub struct InstalledSnapshot {
    /// Installed packages keyed by id; replaced wholesale, never edited.
    pub records: Arc<PackageMap>,
    /// A refresh is in progress.
    pub loading: bool,
}

impl InstalledSnapshot {
    /// Whether `id` is present in this snapshot.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }
}

/// Result of a `refresh` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The snapshot was replaced with `count` records.
    Replaced {
        /// Records in the new snapshot.
        count: usize,
    },
    /// Another refresh was already running; it will query once more.
    Coalesced,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    Running,
    RunningWithRerun,
}

/// What: Single source of truth for the installed package set.
///
/// Details:
/// - Created empty with `loading = true`; the owner triggers the first refresh.
/// - Consumers read through [`InstalledStore::snapshot`] or subscribe to
///   change notifications; only [`InstalledStore::refresh`] mutates.
/// - Overlapping refreshes never overlap queries: a call made while one is
///   running returns `Coalesced` and the running refresh queries once more
///   after it completes, so the final snapshot reflects state after the
///   latest request.
pub struct InstalledStore {
    backend: Arc<dyn PackageBackend>,
    state: watch::Sender<InstalledSnapshot>,
    phase: Mutex<Phase>,
}

impl std::fmt::Debug for InstalledStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstalledStore")
            .field("snapshot", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl InstalledStore {
    /// Create an empty, loading store backed by `backend`.
    #[must_use]
    pub fn new(backend: Arc<dyn PackageBackend>) -> Self {
        let (state, _) = watch::channel(InstalledSnapshot {
            records: Arc::new(HashMap::new()),
            loading: true,
        });
        Self {
            backend,
            state,
            phase: Mutex::new(Phase::Idle),
        }
    }

    /// Non-blocking read of the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> InstalledSnapshot {
        self.state.borrow().clone()
    }

    /// Receiver notified on every snapshot or loading change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<InstalledSnapshot> {
        self.state.subscribe()
    }

    /// Whether the current snapshot contains `id`.
    #[must_use]
    pub fn is_installed(&self, id: &str) -> bool {
        self.state.borrow().contains(id)
    }

    /// What: Re-query the installed set from the backend.
    ///
    /// Output:
    /// - Future resolving to `Replaced` with the new record count, or
    ///   `Coalesced` when another refresh was already running.
    ///
    /// Details:
    /// - `loading` flips to `true` before this returns, so callers observe it
    ///   without polling the future.
    /// - On failure the previous records are kept untouched and `loading`
    ///   is cleared; the error is logged and returned.
    pub fn refresh(
        self: &Arc<Self>,
    ) -> impl Future<Output = Result<RefreshOutcome, QueryError>> + Send + use<> {
        let claimed = self.claim();
        let store = Arc::clone(self);
        async move {
            if !claimed {
                return Ok(RefreshOutcome::Coalesced);
            }
            store.run_claimed().await
        }
    }

    /// Mark a refresh as requested; `true` if the caller must run it.
    fn claim(&self) -> bool {
        let mut phase = self.phase.lock().unwrap_or_else(PoisonError::into_inner);
        match *phase {
            Phase::Idle => {
                *phase = Phase::Running;
                self.state.send_modify(|s| s.loading = true);
                true
            }
            Phase::Running | Phase::RunningWithRerun => {
                *phase = Phase::RunningWithRerun;
                tracing::debug!("installed refresh already running; coalescing");
                false
            }
        }
    }

    async fn run_claimed(&self) -> Result<RefreshOutcome, QueryError> {
        loop {
            let outcome = match self.fetch().await {
                Ok(records) => {
                    let count = records.len();
                    self.state.send_modify(|s| s.records = Arc::new(records));
                    tracing::info!(count, "installed package cache refreshed");
                    Ok(RefreshOutcome::Replaced { count })
                }
                Err(e) => {
                    tracing::warn!(error = %e, "installed package refresh failed; keeping previous snapshot");
                    Err(e)
                }
            };
            let rerun = {
                let mut phase = self.phase.lock().unwrap_or_else(PoisonError::into_inner);
                if *phase == Phase::RunningWithRerun {
                    *phase = Phase::Running;
                    true
                } else {
                    *phase = Phase::Idle;
                    self.state.send_modify(|s| s.loading = false);
                    false
                }
            };
            if !rerun {
                return outcome;
            }
            tracing::debug!("re-running installed refresh requested while busy");
        }
    }

    async fn fetch(&self) -> Result<PackageMap, QueryError> {
        let found = self
            .backend
            .get_packages(Filter::Installed)
            .collect()
            .await
            .map_err(|source| QueryError::new("GetPackages", source))?;
        let mut records = HashMap::with_capacity(found.len());
        for f in found {
            let record = PackageRecord::from_found(f);
            records.insert(record.id.clone(), record);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::sources::{ScriptedBackend, ScriptedResponse};
    use crate::state::{PackageFound, PackageInfo};

    fn installed(id: &str) -> PackageFound {
        PackageFound::new(PackageInfo::Installed, id, "summary")
    }

    fn store_with(backend: &Arc<ScriptedBackend>) -> Arc<InstalledStore> {
        let dyn_backend: Arc<dyn PackageBackend> = Arc::clone(backend) as Arc<dyn PackageBackend>;
        Arc::new(InstalledStore::new(dyn_backend))
    }

    #[tokio::test]
    /// What: A new store starts empty and loading.
    async fn new_store_is_empty_and_loading() {
        let store = store_with(&Arc::new(ScriptedBackend::new()));
        let snap = store.snapshot();
        assert!(snap.loading);
        assert!(snap.records.is_empty());
    }

    #[tokio::test]
    /// What: A successful refresh replaces the snapshot wholesale.
    ///
    /// Inputs:
    /// - First refresh returns `a`, second returns `b` only.
    ///
    /// Output:
    /// - After the second refresh only `b` remains and `loading` is false.
    async fn refresh_replaces_records_wholesale() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_get_packages(ScriptedResponse::ok(vec![installed("a;1;x86_64;")]));
        backend.push_get_packages(ScriptedResponse::ok(vec![installed("b;1;x86_64;")]));
        let store = store_with(&backend);

        store.refresh().await.expect("first refresh");
        assert!(store.is_installed("a;1;x86_64;"));
        let outcome = store.refresh().await.expect("second refresh");
        assert_eq!(outcome, RefreshOutcome::Replaced { count: 1 });

        let snap = store.snapshot();
        assert!(!snap.loading);
        assert_eq!(snap.records.len(), 1);
        assert!(snap.contains("b;1;x86_64;"));
        assert!(!snap.contains("a;1;x86_64;"));
    }

    #[tokio::test]
    /// What: A failed refresh keeps the very same records and clears loading.
    ///
    /// Inputs:
    /// - Successful refresh followed by a failing one.
    ///
    /// Output:
    /// - `Arc::ptr_eq` holds between the records before and after; `loading` is false.
    async fn failed_refresh_keeps_previous_snapshot() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_get_packages(ScriptedResponse::ok(vec![installed("a;1;x86_64;")]));
        backend.push_get_packages(ScriptedResponse::failed("daemon unavailable"));
        let store = store_with(&backend);

        store.refresh().await.expect("first refresh");
        let before = store.snapshot().records;
        let err = store.refresh().await.expect_err("second refresh fails");
        assert_eq!(err.operation, "GetPackages");

        let after = store.snapshot();
        assert!(Arc::ptr_eq(&before, &after.records));
        assert!(!after.loading);
    }

    #[tokio::test]
    /// What: Loading is visible as soon as `refresh` is called, before awaiting.
    async fn loading_is_set_synchronously() {
        let backend = Arc::new(ScriptedBackend::new());
        let store = store_with(&backend);
        store.refresh().await.expect("initial refresh");
        assert!(!store.snapshot().loading);

        let pending = store.refresh();
        assert!(store.snapshot().loading);
        pending.await.expect("refresh");
        assert!(!store.snapshot().loading);
    }

    #[tokio::test(start_paused = true)]
    /// What: Overlapping refreshes coalesce into one extra query.
    ///
    /// Inputs:
    /// - A slow first query, then two refresh calls while it runs.
    ///
    /// Output:
    /// - Both late calls return `Coalesced`; exactly two queries hit the
    ///   backend and the final snapshot is the second answer.
    async fn overlapping_refreshes_coalesce() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_get_packages(
            ScriptedResponse::ok(vec![installed("old;1;x86_64;")]).after(Duration::from_millis(100)),
        );
        backend.push_get_packages(ScriptedResponse::ok(vec![installed("new;1;x86_64;")]));
        let store = store_with(&backend);

        let first = tokio::spawn(store.refresh());
        tokio::task::yield_now().await;
        assert_eq!(store.refresh().await.expect("coalesced"), RefreshOutcome::Coalesced);
        assert_eq!(store.refresh().await.expect("coalesced"), RefreshOutcome::Coalesced);

        let outcome = first.await.expect("join").expect("refresh");
        assert_eq!(outcome, RefreshOutcome::Replaced { count: 1 });
        assert_eq!(backend.get_packages_calls(), 2);
        let snap = store.snapshot();
        assert!(snap.contains("new;1;x86_64;"));
        assert!(!snap.loading);
    }

    #[tokio::test]
    /// What: Subscribers are notified when the snapshot changes.
    async fn subscribers_see_refreshes() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_get_packages(ScriptedResponse::ok(vec![installed("a;1;x86_64;")]));
        let store = store_with(&backend);
        let mut rx = store.subscribe();
        let _ = rx.borrow_and_update();

        store.refresh().await.expect("refresh");
        assert!(rx.has_changed().expect("sender alive"));
        assert!(rx.borrow_and_update().contains("a;1;x86_64;"));
    }
}
