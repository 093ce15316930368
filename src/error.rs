//! Error types shared by the package backends, the installed store and the
//! mutation actions.

use std::fmt;
use std::path::PathBuf;

/// What: Failure reported by a package backend transaction.
///
/// Inputs: Produced by backend implementations while driving a transaction.
///
/// Output: Implements `Display`/`Error` for ergonomic propagation.
///
/// Details:
/// - `Failed` carries the service's own message verbatim so it can be shown
///   inline to the user (e.g. `"locked"`).
#[derive(Debug)]
pub enum ServiceError {
    /// Backend program could not be located on `PATH`.
    NotFound {
        /// Program that was looked up.
        program: String,
    },
    /// Spawning the backend process failed.
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// I/O error while streaming backend output.
    Io(std::io::Error),
    /// Service reported a failure message.
    Failed {
        /// Message text as reported by the service.
        message: String,
    },
    /// Backend exited unsuccessfully without a message.
    Exit {
        /// Program that exited.
        program: String,
        /// Exit code, if the process was not killed by a signal.
        code: Option<i32>,
    },
    /// The transaction ended without a terminal result (dropped or cancelled).
    Cancelled,
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { program } => write!(f, "{program} not found on PATH"),
            Self::Spawn { program, source } => write!(f, "failed to start {program}: {source}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
            Self::Failed { message } => f.write_str(message),
            Self::Exit { program, code } => match code {
                Some(c) => write!(f, "{program} exited with status {c}"),
                None => write!(f, "{program} was terminated by a signal"),
            },
            Self::Cancelled => f.write_str("transaction cancelled"),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Spawn { source, .. } => Some(source),
            Self::Io(err) => Some(err),
            Self::NotFound { .. } | Self::Failed { .. } | Self::Exit { .. } | Self::Cancelled => None,
        }
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Listing or search failure. Non-fatal: callers log it and keep their
/// last-good state.
#[derive(Debug)]
pub struct QueryError {
    /// Service operation that failed (`GetPackages`, `SearchNames`).
    pub operation: &'static str,
    /// Underlying backend failure.
    pub source: ServiceError,
}

impl QueryError {
    /// Wrap a backend failure for the named operation.
    #[must_use]
    pub const fn new(operation: &'static str, source: ServiceError) -> Self {
        Self { operation, source }
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.operation, self.source)
    }
}

impl std::error::Error for QueryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Install or remove failure, surfaced inline in the confirmation.
#[derive(Debug)]
pub enum TransactionError {
    /// The service rejected or failed the transaction.
    Service(ServiceError),
    /// The acting user lacks administrative access.
    NotAuthorized,
    /// Nothing is awaiting confirmation.
    NothingToConfirm,
    /// A transaction for this confirmation is already running.
    Busy,
}

impl TransactionError {
    /// What: Text shown inside the confirmation affordance.
    ///
    /// Output:
    /// - The service message verbatim for `Service(Failed)`, otherwise the
    ///   `Display` rendering.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Service(ServiceError::Failed { message }) => message.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for TransactionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Service(err) => write!(f, "{err}"),
            Self::NotAuthorized => f.write_str("administrative access required"),
            Self::NothingToConfirm => f.write_str("no package awaiting confirmation"),
            Self::Busy => f.write_str("a transaction is already running"),
        }
    }
}

impl std::error::Error for TransactionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Service(err) => Some(err),
            Self::NotAuthorized | Self::NothingToConfirm | Self::Busy => None,
        }
    }
}

impl From<ServiceError> for TransactionError {
    fn from(value: ServiceError) -> Self {
        Self::Service(value)
    }
}

/// Settings file could not be read or written.
#[derive(Debug)]
pub enum ConfigError {
    /// Reading an explicitly requested settings file failed.
    Read {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Writing the settings skeleton failed.
    Write {
        /// File that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, source } => write!(f, "cannot read {}: {source}", path.display()),
            Self::Write { path, source } => write!(f, "cannot write {}: {source}", path.display()),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read { source, .. } | Self::Write { source, .. } => Some(source),
        }
    }
}
