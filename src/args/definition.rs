//! Command-line argument definition and processing.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::config::Settings;
use crate::sources::{PackageBackend, PkconBackend};

/// pkpanel - search, install and remove packages through PackageKit
#[derive(Parser, Debug)]
#[command(name = "pkpanel")]
#[command(version)]
#[command(about = "Search, install and remove packages through PackageKit", long_about = None)]
pub struct Args {
    /// Set the logging level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    /// Enable verbose output (equivalent to --log-level debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file to use instead of ~/.config/pkpanel/settings.conf
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// What to do; defaults to the interactive panel
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Line-driven interactive panel (default)
    Interactive,
    /// List installed packages whose id contains FILTER
    List {
        /// Case-insensitive substring of the package id
        filter: Option<String>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Search available packages by name
    Search {
        /// Name to search for
        query: String,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Install a package by name
    Install {
        /// Package name
        name: String,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Remove an installed package by id (name;version;arch;origin)
    Remove {
        /// Package id as shown by `list`
        id: String,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Show or create the settings file
    Config {
        /// Print the effective settings
        #[arg(long)]
        print: bool,
        /// Write a commented settings skeleton if none exists
        #[arg(long, conflicts_with = "print")]
        init: bool,
    },
}

/// What: Locate the configured backend program.
///
/// Output:
/// - The backend, or `None` after reporting the failure.
fn open_backend(settings: &Settings) -> Option<Arc<dyn PackageBackend>> {
    match PkconBackend::locate(&settings.backend_program) {
        Ok(b) => {
            tracing::info!(program = %b.program().display(), "package backend located");
            Some(Arc::new(b))
        }
        Err(e) => {
            eprintln!("pkpanel: {e}");
            tracing::error!(error = %e, "package backend unavailable");
            None
        }
    }
}

/// What: Run the selected subcommand.
///
/// Inputs:
/// - `args`: Parsed command-line arguments.
/// - `settings`: Effective settings.
///
/// Output:
/// - Process exit code.
///
/// Details:
/// - `config` works without a backend; every other command needs the
///   backend program on `PATH`.
pub async fn process_args(args: &Args, settings: &Settings) -> ExitCode {
    let command = args.command.clone().unwrap_or(Command::Interactive);
    if let Command::Config { print, init } = command {
        return super::config::handle_config(args.config.as_deref(), settings, print, init);
    }
    let Some(backend) = open_backend(settings) else {
        return ExitCode::FAILURE;
    };
    match command {
        Command::Interactive => match crate::app::run_interactive(settings, backend).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!(error = %e, "interactive panel failed");
                eprintln!("pkpanel: {e}");
                ExitCode::FAILURE
            }
        },
        Command::List { filter, json } => {
            super::list::handle_list(backend, filter.as_deref().unwrap_or(""), json).await
        }
        Command::Search { query, json } => super::search::handle_search(backend, &query, json).await,
        Command::Install { name, yes } => super::install::handle_install(backend, settings, &name, yes).await,
        Command::Remove { id, yes } => super::remove::handle_remove(backend, settings, &id, yes).await,
        Command::Config { .. } => ExitCode::SUCCESS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// What: No subcommand means interactive; global flags parse anywhere.
    fn parses_default_and_subcommands() {
        let args = Args::parse_from(["pkpanel"]);
        assert!(args.command.is_none());
        assert_eq!(args.log_level, "info");

        let args = Args::parse_from(["pkpanel", "list", "vi", "--json", "--verbose"]);
        assert!(args.verbose);
        assert_eq!(
            args.command,
            Some(Command::List {
                filter: Some("vi".into()),
                json: true
            })
        );

        let args = Args::parse_from(["pkpanel", "remove", "vim;9.0;x86_64;fedora", "-y"]);
        assert_eq!(
            args.command,
            Some(Command::Remove {
                id: "vim;9.0;x86_64;fedora".into(),
                yes: true
            })
        );
    }

    #[test]
    /// What: `config --print --init` is rejected.
    fn config_flags_conflict() {
        assert!(Args::try_parse_from(["pkpanel", "config", "--print", "--init"]).is_err());
    }
}
