//! Integration tests for the panel coordinator.
//!
//! Tests cover:
//! - Remove confirmation failure and success through `dispatch`
//! - The administrative access gate
//! - Install followed by an installed-set refresh
//! - Refresh errors surviving a coalesced refresh
//! - The interactive loop rendering frames until `/quit`, including debounced
//!   input and privilege notifications

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncWriteExt, BufReader};
use tokio::sync::watch;

use pkpanel::app::{Action, Channels, DisplaySurface, Panel, PanelOptions, PanelView, RowAction, TaskDone};
use pkpanel::app::runtime::run_loop;
use pkpanel::error::{QueryError, ServiceError};
use pkpanel::index::RefreshOutcome;
use pkpanel::install::BackendInstallDialog;
use pkpanel::index::InstalledStore;
use pkpanel::logic::Mode;
use pkpanel::privilege::Privilege;
use pkpanel::sources::{BackendCall, PackageBackend, ScriptedBackend, ScriptedResponse};
use pkpanel::state::{PackageFound, PackageInfo};

const VIM: &str = "vim;9.0;x86_64;fedora";

fn installed(id: &str) -> PackageFound {
    PackageFound::new(PackageInfo::Installed, id, "editor")
}

/// What: Build a panel over a scripted backend whose first listing holds `vim`.
///
/// Inputs:
/// - `privilege`: Access level at startup
///
/// Output:
/// - Backend, panel and channels; the initial refresh has not run yet.
fn panel_with(privilege: Privilege) -> (Arc<ScriptedBackend>, Panel, Channels) {
    let backend = Arc::new(ScriptedBackend::new());
    backend.push_get_packages(ScriptedResponse::ok(vec![installed(VIM)]));
    let dyn_backend: Arc<dyn PackageBackend> = Arc::clone(&backend) as Arc<dyn PackageBackend>;
    let store = Arc::new(InstalledStore::new(Arc::clone(&dyn_backend)));
    let installer = Arc::new(BackendInstallDialog::new(Arc::clone(&dyn_backend)));
    let (panel, channels) = Panel::new(store, dyn_backend, installer, PanelOptions::default(), privilege);
    (backend, panel, channels)
}

/// Wait for the next task completion and apply it, then sync the store view.
async fn settle_task(panel: &mut Panel, channels: &mut Channels) {
    let done = channels.task_rx.recv().await.expect("task completion");
    panel.on_task(done);
    panel.on_store_changed();
}

/// Start the panel and wait for its initial refresh.
async fn started(panel: &mut Panel, channels: &mut Channels) {
    panel.start();
    settle_task(panel, channels).await;
}

#[tokio::test]
/// What: A failed remove keeps the confirmation open with the service message.
///
/// Inputs:
/// - Installed `vim`; remove transaction fails with `"locked"`.
///
/// Output:
/// - Confirmation shows `"locked"`, no extra refresh, `vim` still listed.
async fn remove_failure_keeps_confirmation() {
    let (backend, mut panel, mut channels) = panel_with(Privilege::Administrator);
    backend.push_remove(ScriptedResponse::failed("locked"));
    started(&mut panel, &mut channels).await;

    panel.dispatch(Action::RequestRemove(VIM.into()));
    panel.dispatch(Action::ConfirmRemove);
    let PanelView::Packages { confirm: Some(c), .. } = panel.view() else {
        panic!("confirmation expected");
    };
    assert!(c.removing);

    let done = channels.task_rx.recv().await.expect("remove done");
    assert!(matches!(done, TaskDone::Removed(Err(_))));
    panel.on_task(done);

    let PanelView::Packages { confirm: Some(c), rows, .. } = panel.view() else {
        panic!("confirmation expected");
    };
    assert!(!c.removing);
    assert_eq!(c.error.as_deref(), Some("locked"));
    assert_eq!(rows.len(), 1);
    assert_eq!(backend.get_packages_calls(), 1);

    panel.dispatch(Action::CancelRemove);
    assert!(!panel.remove_dialog().is_open());
}

#[tokio::test]
/// What: A successful remove closes the confirmation and refreshes exactly once.
///
/// Inputs:
/// - Installed `vim`; remove succeeds; the next listing is empty.
///
/// Output:
/// - Backend calls: listing, remove of exactly the id, one listing; no rows remain.
async fn remove_success_refreshes_once() {
    let (backend, mut panel, mut channels) = panel_with(Privilege::Administrator);
    backend.push_remove(ScriptedResponse::ok(Vec::new()));
    backend.push_get_packages(ScriptedResponse::ok(Vec::new()));
    started(&mut panel, &mut channels).await;

    panel.dispatch(Action::RequestRemove(VIM.into()));
    panel.dispatch(Action::ConfirmRemove);
    settle_task(&mut panel, &mut channels).await;
    assert!(!panel.remove_dialog().is_open());
    settle_task(&mut panel, &mut channels).await;

    assert_eq!(backend.get_packages_calls(), 2);
    assert!(backend.calls().contains(&BackendCall::RemovePackages(
        vec![VIM.to_string()],
        PanelOptions::default().remove
    )));
    let PanelView::Packages { rows, confirm, .. } = panel.view() else {
        panic!("package view expected");
    };
    assert!(rows.is_empty());
    assert!(confirm.is_none());
}

#[tokio::test]
/// What: Without administrative access the surface is replaced and mutations refused.
///
/// Inputs:
/// - Panel started unprivileged; install requested; access granted later.
///
/// Output:
/// - `AdminRequired` view, no install call; the package view returns after
///   the privilege change.
async fn access_gate_replaces_surface() {
    let (backend, mut panel, mut channels) = panel_with(Privilege::Unprivileged);
    started(&mut panel, &mut channels).await;
    assert_eq!(panel.view(), PanelView::AdminRequired);

    panel.dispatch(Action::Install("htop".into()));
    panel.dispatch(Action::RequestRemove(VIM.into()));
    panel.dispatch(Action::ConfirmRemove);
    assert!(!backend
        .calls()
        .iter()
        .any(|c| matches!(c, BackendCall::InstallPackages(_) | BackendCall::RemovePackages(..))));

    panel.on_privilege(Privilege::Administrator);
    let PanelView::Packages { confirm: Some(c), .. } = panel.view() else {
        panic!("package view with refused confirmation expected");
    };
    assert_eq!(c.error.as_deref(), Some("administrative access required"));
}

#[tokio::test]
/// What: Installing from the install view refreshes the installed set.
///
/// Inputs:
/// - Search hit `htop`, install succeeds, next listing includes `htop`.
///
/// Output:
/// - The hit's row switches from `Install` to `Reinstall`.
async fn install_refreshes_and_reannotates() {
    let (backend, mut panel, mut channels) = panel_with(Privilege::Administrator);
    backend.push_search(ScriptedResponse::ok(vec![PackageFound::new(
        PackageInfo::Available,
        "htop;3.3;x86_64;fedora",
        "process viewer",
    )]));
    backend.push_install(ScriptedResponse::ok(Vec::new()));
    backend.push_get_packages(ScriptedResponse::ok(vec![
        installed(VIM),
        installed("htop;3.3;x86_64;fedora"),
    ]));
    started(&mut panel, &mut channels).await;

    panel.dispatch(Action::SwitchMode(Mode::Install));
    panel.dispatch(Action::Input("htop".into()));
    panel.dispatch(Action::Search);
    let outcome = channels.outcome_rx.recv().await.expect("search outcome");
    assert!(panel.on_search_outcome(outcome));
    let PanelView::Packages { rows, .. } = panel.view() else {
        panic!("package view expected");
    };
    assert_eq!(rows[0].action, RowAction::Install);

    panel.dispatch(rows[0].dispatch_action());
    settle_task(&mut panel, &mut channels).await;
    let PanelView::Packages { rows, installing, error, .. } = panel.view() else {
        panic!("package view expected");
    };
    assert!(installing.is_none());
    assert!(error.is_none());
    assert_eq!(rows[0].action, RowAction::Reinstall);
    assert_eq!(backend.get_packages_calls(), 2);
}

#[tokio::test]
/// What: A refresh error stays visible until a refresh actually replaces the snapshot.
///
/// Inputs:
/// - A failed refresh, then a coalesced completion, then a replacing one.
///
/// Output:
/// - The error line survives `Coalesced` and clears on `Replaced`.
async fn coalesced_refresh_keeps_error_line() {
    let (_backend, mut panel, mut channels) = panel_with(Privilege::Administrator);
    started(&mut panel, &mut channels).await;

    panel.on_task(TaskDone::Refreshed(Err(QueryError::new(
        "GetPackages",
        ServiceError::Failed {
            message: "backend busy".into(),
        },
    ))));
    let error_line = |panel: &Panel| match panel.view() {
        PanelView::Packages { error, .. } => error,
        PanelView::AdminRequired => panic!("package view expected"),
    };
    assert!(error_line(&panel).is_some_and(|e| e.contains("backend busy")));

    panel.on_task(TaskDone::Refreshed(Ok(RefreshOutcome::Coalesced)));
    assert!(error_line(&panel).is_some_and(|e| e.contains("backend busy")));

    panel.on_task(TaskDone::Refreshed(Ok(RefreshOutcome::Replaced { count: 1 })));
    assert_eq!(error_line(&panel), None);
}

/// Surface recording every frame.
#[derive(Default)]
struct Recorder {
    frames: Vec<PanelView>,
}

impl DisplaySurface for Recorder {
    fn render(&mut self, view: &PanelView) -> std::io::Result<()> {
        self.frames.push(view.clone());
        Ok(())
    }
}

#[tokio::test]
/// What: The loop renders the loading frame first and stops on `/quit`.
async fn run_loop_renders_until_quit() {
    let (_backend, panel, channels) = panel_with(Privilege::Administrator);
    let (_privilege_tx, privilege_rx) = watch::channel(Privilege::Administrator);
    let mut surface = Recorder::default();
    let input: &[u8] = b"/remove\n/quit\n";

    run_loop(panel, channels, privilege_rx, input, &mut surface)
        .await
        .expect("loop ends cleanly");

    assert!(matches!(
        surface.frames.first(),
        Some(PanelView::Packages { loading: true, .. })
    ));
}

#[tokio::test(start_paused = true)]
/// What: Typed text reaches the service through the loop's debounce, and a
/// privilege notification restores the package view.
///
/// Inputs:
/// - Panel started unprivileged; access granted through the watch channel;
///   `/install` then `firefox` typed; `/quit` after the search.
///
/// Output:
/// - `AdminRequired` frames until the notification, then package frames.
/// - No search before the debounce interval, exactly one `["firefox"]` after.
async fn run_loop_debounces_input_and_follows_privilege() {
    let (backend, panel, channels) = panel_with(Privilege::Unprivileged);
    backend.push_search(ScriptedResponse::ok(vec![PackageFound::new(
        PackageInfo::Available,
        "firefox;131.0;x86_64;fedora",
        "web browser",
    )]));
    let (privilege_tx, privilege_rx) = watch::channel(Privilege::Unprivileged);
    let (mut keyboard, input) = tokio::io::duplex(256);
    let mut surface = Recorder::default();

    let driver = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        privilege_tx.send(Privilege::Administrator).expect("loop listening");
        keyboard.write_all(b"/install\nfirefox\n").await.expect("write input");
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(backend.searched_terms().is_empty());
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(backend.searched_terms(), vec![vec!["firefox".to_string()]]);
        keyboard.write_all(b"/quit\n").await.expect("write quit");
    };
    let (result, ()) = tokio::join!(
        run_loop(panel, channels, privilege_rx, BufReader::new(input), &mut surface),
        driver
    );
    result.expect("loop ends cleanly");

    let frames = &surface.frames;
    assert_eq!(frames.first(), Some(&PanelView::AdminRequired));
    let granted = frames
        .iter()
        .position(|f| matches!(f, PanelView::Packages { .. }))
        .expect("package view after access granted");
    assert!(frames[..granted].iter().all(|f| *f == PanelView::AdminRequired));
    assert!(frames[granted..].iter().all(|f| matches!(f, PanelView::Packages { .. })));
    assert!(frames.iter().any(|f| matches!(
        f,
        PanelView::Packages { mode: Mode::Install, rows, .. }
            if rows.iter().any(|r| r.name == "firefox")
    )));
    assert_eq!(backend.searched_terms().len(), 1);
}
