//! Event loop driving the panel from input lines, background results and
//! privilege notifications.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::select;
use tokio::sync::{mpsc, watch};

use super::{DisplaySurface, Panel, PanelOptions, TaskDone, TextSurface};
use crate::config::Settings;
use crate::events::parse_line;
use crate::index::{InstalledSnapshot, InstalledStore};
use crate::install::BackendInstallDialog;
use crate::logic::SearchOutcome;
use crate::privilege::{Privilege, spawn_privilege_watcher};
use crate::sources::PackageBackend;

/// Receivers the panel's background work reports on.
#[derive(Debug)]
pub struct Channels {
    /// Remote search completions.
    pub outcome_rx: mpsc::UnboundedReceiver<SearchOutcome>,
    /// Transaction and refresh completions.
    pub task_rx: mpsc::UnboundedReceiver<TaskDone>,
    /// Installed store change notifications.
    pub store_rx: watch::Receiver<InstalledSnapshot>,
}

/// What: Process one event from any source.
///
/// Inputs:
/// - `panel`: Panel state
/// - `channels`: Background result channels
/// - `privilege_rx`: Administrative access notifications
/// - `lines`: Interactive input
///
/// Output: `Ok(true)` when the loop should exit.
///
/// # Errors
///
/// Returns input read errors.
async fn process_events<R>(
    panel: &mut Panel,
    channels: &mut Channels,
    privilege_rx: &mut watch::Receiver<Privilege>,
    lines: &mut tokio::io::Lines<R>,
) -> std::io::Result<bool>
where
    R: AsyncBufRead + Unpin,
{
    select! {
        line = lines.next_line() => {
            let Some(line) = line? else {
                tracing::debug!("input closed");
                return Ok(true);
            };
            match parse_line(&line) {
                Ok(action) => return Ok(panel.dispatch(action)),
                Err(usage) => panel.notify(usage),
            }
        }
        text = panel.next_debounced() => panel.apply_debounced(&text),
        Some(outcome) = channels.outcome_rx.recv() => {
            panel.on_search_outcome(outcome);
        }
        Some(done) = channels.task_rx.recv() => panel.on_task(done),
        Ok(()) = channels.store_rx.changed() => {
            let _ = channels.store_rx.borrow_and_update();
            panel.on_store_changed();
        }
        Ok(()) = privilege_rx.changed() => {
            let privilege = *privilege_rx.borrow_and_update();
            panel.on_privilege(privilege);
        }
    }
    Ok(false)
}

/// What: Drive the panel until the user quits or input ends.
///
/// Inputs:
/// - `panel`/`channels`: From [`Panel::new`]
/// - `privilege_rx`: Administrative access notifications
/// - `input`: Line-oriented user input
/// - `surface`: Where frames are rendered
///
/// # Errors
///
/// Returns input read or surface write errors.
pub async fn run_loop<R, S>(
    mut panel: Panel,
    mut channels: Channels,
    mut privilege_rx: watch::Receiver<Privilege>,
    input: R,
    surface: &mut S,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    S: DisplaySurface + ?Sized,
{
    let mut lines = input.lines();
    panel.start();
    surface.render(&panel.view())?;
    let mut last = panel.view();
    loop {
        if process_events(&mut panel, &mut channels, &mut privilege_rx, &mut lines).await? {
            break;
        }
        let view = panel.view();
        if view != last {
            surface.render(&view)?;
            last = view;
        }
    }
    tracing::info!("panel closed");
    Ok(())
}

/// What: Run the interactive panel on stdin/stdout.
///
/// Inputs:
/// - `settings`: Effective settings
/// - `backend`: Package service
///
/// # Errors
///
/// Returns terminal I/O errors.
pub async fn run_interactive(settings: &Settings, backend: Arc<dyn PackageBackend>) -> std::io::Result<()> {
    let store = Arc::new(InstalledStore::new(Arc::clone(&backend)));
    let privilege_rx = spawn_privilege_watcher(settings.admin_groups.clone(), settings.privilege_poll());
    let installer = Arc::new(BackendInstallDialog::new(Arc::clone(&backend)));
    let initial = *privilege_rx.borrow();
    let (panel, channels) = Panel::new(store, backend, installer, PanelOptions::from(settings), initial);
    let mut surface = TextSurface::new(std::io::stdout());
    run_loop(panel, channels, privilege_rx, BufReader::new(tokio::io::stdin()), &mut surface).await
}
