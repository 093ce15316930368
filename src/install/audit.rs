//! Audit trail of installed and removed packages.

use std::io::Write;
use std::path::{Path, PathBuf};

/// What: Append one timestamped line per package to an audit log.
///
/// Inputs:
/// - `dir`: Directory holding the log
/// - `file`: Log file name
/// - `entries`: Package names or ids to record
///
/// Output:
/// - `Ok(())` on success; otherwise an I/O error.
///
/// Details: Each line is `<UTC timestamp> <entry>`.
pub(crate) fn append_entries(dir: &Path, file: &str, entries: &[String]) -> std::io::Result<()> {
    let mut f = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(file))?;
    let when = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S");
    for e in entries {
        writeln!(f, "{when} {e}")?;
    }
    Ok(())
}

/// What: Where install and remove audit lines go.
///
/// Details:
/// - [`AuditLog::default`] records nothing; [`AuditLog::in_logs_dir`] writes
///   `install_log.log` and `remove_log.log` under the logs directory.
/// - Write failures are logged and never fail the transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuditLog {
    dir: Option<PathBuf>,
}

impl AuditLog {
    /// Audit log under [`crate::config::logs_dir`].
    #[must_use]
    pub fn in_logs_dir() -> Self {
        Self::in_dir(crate::config::logs_dir())
    }

    /// Audit log under `dir`.
    #[must_use]
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: Some(dir.into()) }
    }

    /// Record installed package names in `install_log.log`.
    pub fn log_installed(&self, names: &[String]) {
        self.append("install_log.log", names);
    }

    /// Record removed package ids in `remove_log.log`.
    pub fn log_removed(&self, ids: &[String]) {
        self.append("remove_log.log", ids);
    }

    fn append(&self, file: &str, entries: &[String]) {
        let Some(dir) = &self.dir else {
            return;
        };
        if let Err(e) = append_entries(dir, file, entries) {
            tracing::warn!(error = %e, file, "failed to write audit log");
        }
    }
}
