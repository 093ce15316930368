//! Typed settings, the commented skeleton written by `config --init`, and
//! loading from `settings.conf`.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::parsing::{parse_bool, parse_key_value};
use crate::error::ConfigError;
use crate::sources::RemoveOptions;

/// Commented settings skeleton written by `config --init`.
pub const SKELETON: &str = "\
# pkpanel settings
# Lines are `key = value`; `#`, `//` and `;` start comments.

# Quiet interval (milliseconds) before typed text becomes the search query.
search_debounce_ms = 500

# PackageKit console client used as the package service.
backend_program = pkcon

# Remove transactions: allow removing dependents, remove orphaned deps.
remove_allow_deps = true
remove_autoremove = false

# Refresh the installed list after a successful install.
refresh_after_install = true

# How often (seconds) administrative access is re-checked.
privilege_poll_secs = 5

# Groups whose members count as administrators (comma separated).
admin_groups = wheel,sudo,admin
";

/// User-configurable settings with their defaults.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Debounce interval for the search box, in milliseconds.
    pub search_debounce_ms: u64,
    /// Backend program name or path.
    pub backend_program: String,
    /// `allowDeps` flag for remove transactions.
    pub remove_allow_deps: bool,
    /// `autoremove` flag for remove transactions.
    pub remove_autoremove: bool,
    /// Refresh the installed store after an install succeeds.
    pub refresh_after_install: bool,
    /// Privilege re-check interval, in seconds.
    pub privilege_poll_secs: u64,
    /// Groups granting administrative access.
    pub admin_groups: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            search_debounce_ms: 500,
            backend_program: "pkcon".to_string(),
            remove_allow_deps: true,
            remove_autoremove: false,
            refresh_after_install: true,
            privilege_poll_secs: 5,
            admin_groups: ["wheel", "sudo", "admin"].map(String::from).to_vec(),
        }
    }
}

impl Settings {
    /// What: Parse settings from `settings.conf` content.
    ///
    /// Inputs:
    /// - `content`: File contents.
    ///
    /// Output:
    /// - Settings with every recognized key applied over the defaults.
    ///
    /// Details:
    /// - Unknown keys are logged and ignored; unparsable values keep the default.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut settings = Self::default();
        for (lineno, line) in content.lines().enumerate() {
            let Some((key, val)) = parse_key_value(line) else {
                continue;
            };
            if !settings.apply(&key, val) {
                tracing::warn!(line = lineno + 1, key = %key, value = %val, "ignoring settings entry");
            }
        }
        settings
    }

    /// Apply one normalized entry; `false` when the key or value is not usable.
    fn apply(&mut self, key: &str, val: &str) -> bool {
        match key {
            "search_debounce_ms" | "debounce_ms" => val
                .parse()
                .map(|v| self.search_debounce_ms = v)
                .is_ok(),
            "backend_program" | "backend" => {
                if val.is_empty() {
                    return false;
                }
                self.backend_program = val.to_string();
                true
            }
            "remove_allow_deps" => parse_bool(val)
                .map(|v| self.remove_allow_deps = v)
                .is_some(),
            "remove_autoremove" => parse_bool(val)
                .map(|v| self.remove_autoremove = v)
                .is_some(),
            "refresh_after_install" => parse_bool(val)
                .map(|v| self.refresh_after_install = v)
                .is_some(),
            "privilege_poll_secs" => match val.parse::<u64>() {
                Ok(v) if v > 0 => {
                    self.privilege_poll_secs = v;
                    true
                }
                _ => false,
            },
            "admin_groups" => {
                self.admin_groups = val
                    .split(',')
                    .map(str::trim)
                    .filter(|g| !g.is_empty())
                    .map(String::from)
                    .collect();
                true
            }
            _ => false,
        }
    }

    /// What: Load settings from `path`, or the default location when `None`.
    ///
    /// Output:
    /// - Defaults when the default file does not exist.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Read` when an explicitly given file is missing or
    /// any existing file cannot be read.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (super::settings_path(), false),
        };
        if !explicit && !path.is_file() {
            tracing::debug!(path = %path.display(), "no settings file; using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "settings loaded");
        Ok(Self::parse(&content))
    }

    /// What: Write [`SKELETON`] to `path` unless a file already exists.
    ///
    /// Output:
    /// - `true` when the skeleton was written, `false` when left untouched.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Write` when the directory or file cannot be created.
    pub fn init(path: &Path) -> Result<bool, ConfigError> {
        if path.exists() {
            return Ok(false);
        }
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(path, SKELETON).map_err(write_err)?;
        tracing::info!(path = %path.display(), "settings skeleton written");
        Ok(true)
    }

    /// Effective settings rendered in `settings.conf` syntax.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "search_debounce_ms = {}", self.search_debounce_ms);
        let _ = writeln!(out, "backend_program = {}", self.backend_program);
        let _ = writeln!(out, "remove_allow_deps = {}", self.remove_allow_deps);
        let _ = writeln!(out, "remove_autoremove = {}", self.remove_autoremove);
        let _ = writeln!(out, "refresh_after_install = {}", self.refresh_after_install);
        let _ = writeln!(out, "privilege_poll_secs = {}", self.privilege_poll_secs);
        let _ = writeln!(out, "admin_groups = {}", self.admin_groups.join(","));
        out
    }

    /// Debounce interval as a `Duration`.
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    /// Privilege poll interval as a `Duration`.
    #[must_use]
    pub const fn privilege_poll(&self) -> Duration {
        Duration::from_secs(self.privilege_poll_secs)
    }

    /// Remove transaction flags.
    #[must_use]
    pub const fn remove_options(&self) -> RemoveOptions {
        RemoveOptions {
            allow_deps: self.remove_allow_deps,
            autoremove: self.remove_autoremove,
        }
    }

    /// Resolve `--config` or the default settings file path.
    #[must_use]
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        explicit.map_or_else(super::settings_path, Path::to_path_buf)
    }
}
