//! In-process backend replaying canned responses.
//!
//! Each operation has its own FIFO of [`ScriptedResponse`]s; an empty queue
//! answers with an empty successful transaction. Every call is recorded so
//! callers can assert on exactly what was asked of the service.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::{Filter, PackageBackend, RemoveOptions, Transaction};
use crate::error::ServiceError;
use crate::state::PackageFound;

/// One canned transaction.
#[derive(Clone, Debug, Default)]
pub struct ScriptedResponse {
    /// Results streamed before the terminal outcome.
    pub packages: Vec<PackageFound>,
    /// Delay before anything is streamed.
    pub delay: Duration,
    /// Failure message, or `None` for success.
    pub failure: Option<String>,
}

impl ScriptedResponse {
    /// Successful response streaming `packages`.
    #[must_use]
    pub fn ok(packages: Vec<PackageFound>) -> Self {
        Self {
            packages,
            ..Self::default()
        }
    }

    /// Failed response reporting `message`.
    #[must_use]
    pub fn failed(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Delay the response by `delay`.
    #[must_use]
    pub const fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// A recorded backend call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendCall {
    /// `get_packages(filter)`
    GetPackages(Filter),
    /// `search_names(filter, terms)`
    SearchNames(Filter, Vec<String>),
    /// `remove_packages(ids, options)`
    RemovePackages(Vec<String>, RemoveOptions),
    /// `install_packages(names)`
    InstallPackages(Vec<String>),
}

#[derive(Debug, Default)]
struct Script {
    get_packages: VecDeque<ScriptedResponse>,
    search_names: VecDeque<ScriptedResponse>,
    remove_packages: VecDeque<ScriptedResponse>,
    install_packages: VecDeque<ScriptedResponse>,
    calls: Vec<BackendCall>,
}

/// Backend whose answers are queued up front.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    script: Mutex<Script>,
}

impl ScriptedBackend {
    /// Empty script: every call succeeds with no results.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue the next `get_packages` answer.
    pub fn push_get_packages(&self, response: ScriptedResponse) {
        self.lock().get_packages.push_back(response);
    }

    /// Queue the next `search_names` answer.
    pub fn push_search(&self, response: ScriptedResponse) {
        self.lock().search_names.push_back(response);
    }

    /// Queue the next `remove_packages` answer.
    pub fn push_remove(&self, response: ScriptedResponse) {
        self.lock().remove_packages.push_back(response);
    }

    /// Queue the next `install_packages` answer.
    pub fn push_install(&self, response: ScriptedResponse) {
        self.lock().install_packages.push_back(response);
    }

    /// Every call made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<BackendCall> {
        self.lock().calls.clone()
    }

    /// Number of `get_packages` calls made so far.
    #[must_use]
    pub fn get_packages_calls(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, BackendCall::GetPackages(_)))
            .count()
    }

    /// Search terms of every `search_names` call, in order.
    #[must_use]
    pub fn searched_terms(&self) -> Vec<Vec<String>> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                BackendCall::SearchNames(_, terms) => Some(terms.clone()),
                _ => None,
            })
            .collect()
    }
}

/// Spawn a task that plays `response` into a fresh transaction.
fn play(response: ScriptedResponse) -> Transaction {
    let (sink, tx) = Transaction::channel();
    tokio::spawn(async move {
        if !response.delay.is_zero() {
            tokio::time::sleep(response.delay).await;
        }
        for found in response.packages {
            if !sink.package(found) {
                return;
            }
        }
        sink.finish(match response.failure {
            Some(message) => Err(ServiceError::Failed { message }),
            None => Ok(()),
        });
    });
    tx
}

impl PackageBackend for ScriptedBackend {
    fn get_packages(&self, filter: Filter) -> Transaction {
        let mut script = self.lock();
        script.calls.push(BackendCall::GetPackages(filter));
        let response = script.get_packages.pop_front().unwrap_or_default();
        drop(script);
        play(response)
    }

    fn search_names(&self, filter: Filter, terms: &[String]) -> Transaction {
        let mut script = self.lock();
        script.calls.push(BackendCall::SearchNames(filter, terms.to_vec()));
        let response = script.search_names.pop_front().unwrap_or_default();
        drop(script);
        play(response)
    }

    fn remove_packages(&self, package_ids: &[String], options: RemoveOptions) -> Transaction {
        let mut script = self.lock();
        script
            .calls
            .push(BackendCall::RemovePackages(package_ids.to_vec(), options));
        let response = script.remove_packages.pop_front().unwrap_or_default();
        drop(script);
        play(response)
    }

    fn install_packages(&self, names: &[String]) -> Transaction {
        let mut script = self.lock();
        script.calls.push(BackendCall::InstallPackages(names.to_vec()));
        let response = script.install_packages.pop_front().unwrap_or_default();
        drop(script);
        play(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::PackageInfo;

    #[tokio::test]
    /// What: Queued responses are consumed in order and calls are recorded.
    ///
    /// Inputs:
    /// - One failing and one successful `search_names` response.
    ///
    /// Output:
    /// - First call fails with the queued message, second streams the package,
    ///   a third falls back to an empty success.
    async fn responses_replay_in_order() {
        let backend = ScriptedBackend::new();
        backend.push_search(ScriptedResponse::failed("offline"));
        backend.push_search(ScriptedResponse::ok(vec![PackageFound::new(
            PackageInfo::Available,
            "htop;3.3;x86_64;updates",
            "viewer",
        )]));

        let first = backend.search_names(Filter::None, &["h".into()]).collect().await;
        assert_eq!(first.expect_err("first fails").to_string(), "offline");
        let second = backend
            .search_names(Filter::None, &["htop".into()])
            .collect()
            .await
            .expect("second succeeds");
        assert_eq!(second.len(), 1);
        let third = backend
            .search_names(Filter::None, &["x".into()])
            .collect()
            .await
            .expect("default succeeds");
        assert!(third.is_empty());
        assert_eq!(
            backend.searched_terms(),
            vec![vec!["h".to_string()], vec!["htop".into()], vec!["x".into()]]
        );
    }
}
