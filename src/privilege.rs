//! Administrative access detection and change notification.

use std::time::Duration;

use tokio::sync::watch;

/// Whether the acting user may run package transactions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Privilege {
    /// Root or member of an administrative group.
    Administrator,
    /// Mutations are refused; the surface shows the access notice.
    Unprivileged,
}

impl Privilege {
    /// Whether mutations are allowed.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Administrator)
    }
}

/// What: Probe the current process for administrative access.
///
/// Inputs:
/// - `admin_groups`: Group names that grant access
///
/// Output:
/// - `Administrator` for effective uid 0 or membership of any listed group.
///
/// Details:
/// - Group lookup failures count as "not a member".
#[cfg(unix)]
#[must_use]
pub fn probe(admin_groups: &[String]) -> Privilege {
    use nix::unistd::{Group, geteuid};

    if geteuid().is_root() {
        return Privilege::Administrator;
    }
    let groups = supplementary_groups();
    let member = groups.into_iter().any(|gid| {
        matches!(Group::from_gid(gid), Ok(Some(g)) if admin_groups.iter().any(|a| *a == g.name))
    });
    if member {
        Privilege::Administrator
    } else {
        Privilege::Unprivileged
    }
}

/// Non-unix targets have no group model; treat the user as an administrator.
#[cfg(not(unix))]
#[must_use]
pub fn probe(_admin_groups: &[String]) -> Privilege {
    Privilege::Administrator
}

#[cfg(all(unix, not(target_vendor = "apple")))]
fn supplementary_groups() -> Vec<nix::unistd::Gid> {
    let mut gids = nix::unistd::getgroups().unwrap_or_else(|e| {
        tracing::debug!(error = %e, "getgroups failed");
        Vec::new()
    });
    gids.push(nix::unistd::getegid());
    gids
}

#[cfg(all(unix, target_vendor = "apple"))]
fn supplementary_groups() -> Vec<nix::unistd::Gid> {
    vec![nix::unistd::getegid()]
}

/// What: Poll [`probe`] and publish changes.
///
/// Inputs:
/// - `admin_groups`: Group names that grant access
/// - `interval`: Poll period
///
/// Output:
/// - Receiver holding the current privilege; it changes only when the probe
///   result differs from the last published value.
///
/// Details:
/// - The polling task ends once every receiver is dropped.
#[must_use]
pub fn spawn_privilege_watcher(admin_groups: Vec<String>, interval: Duration) -> watch::Receiver<Privilege> {
    let initial = probe(&admin_groups);
    tracing::info!(privilege = ?initial, "administrative access probed");
    let (tx, rx) = watch::channel(initial);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await;
        loop {
            tokio::select! {
                () = tx.closed() => break,
                _ = ticker.tick() => {
                    let now = probe(&admin_groups);
                    let changed = tx.send_if_modified(|cur| {
                        if *cur == now {
                            false
                        } else {
                            *cur = now;
                            true
                        }
                    });
                    if changed {
                        tracing::info!(privilege = ?now, "administrative access changed");
                    }
                }
            }
        }
    });
    rx
}
