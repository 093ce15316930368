//! XDG-based locations for the settings file and logs.

use std::env;
use std::path::PathBuf;

/// Application directory name under the XDG bases.
const APP_DIR: &str = "pkpanel";

/// Resolve an XDG base directory from environment or default to `$HOME` + segments.
///
/// Inputs:
/// - `var`: Environment variable to check (e.g., `XDG_CONFIG_HOME`).
/// - `home_default`: Fallback path segments relative to `$HOME` if `var` is unset/empty.
///
/// Output: Resolved base directory path.
fn xdg_base_dir(var: &str, home_default: &[&str]) -> PathBuf {
    if let Ok(p) = env::var(var)
        && !p.trim().is_empty()
    {
        return PathBuf::from(p);
    }
    let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
    let mut base = PathBuf::from(home);
    for seg in home_default {
        base = base.join(seg);
    }
    base
}

/// XDG config directory for pkpanel: `$XDG_CONFIG_HOME/pkpanel`.
///
/// Not created here; only `config --init` writes into it.
#[must_use]
pub fn config_dir() -> PathBuf {
    xdg_base_dir("XDG_CONFIG_HOME", &[".config"]).join(APP_DIR)
}

/// Default settings file location.
#[must_use]
pub fn settings_path() -> PathBuf {
    config_dir().join("settings.conf")
}

/// Logs directory: `$XDG_STATE_HOME/pkpanel/logs` (ensured to exist).
#[must_use]
pub fn logs_dir() -> PathBuf {
    let dir = xdg_base_dir("XDG_STATE_HOME", &[".local", "state"])
        .join(APP_DIR)
        .join("logs");
    let _ = std::fs::create_dir_all(&dir);
    dir
}
