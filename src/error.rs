//! Core error taxonomy shared by the executor, undo engine and duplicate
//! finder.
//!
//! Per-file failures inside a batch are captured into the batch summary
//! rather than propagated; only structural problems (an invalid root, an
//! unreadable action log) abort a whole call.

use std::path::PathBuf;

/// Errors raised by the mutating and hashing parts of the crate.
#[derive(Debug)]
pub enum CoreError {
    /// A path vanished between scanning and operating on it.
    NotFound(PathBuf),
    /// The filesystem refused access to a path.
    PermissionDenied(PathBuf),
    /// The destination already exists and the overwrite policy is `skip`.
    Conflict { source: PathBuf, dest: PathBuf },
    /// An undo precondition did not hold (missing destination, changed
    /// content, or an occupied original path).
    VerificationFailed { path: PathBuf, reason: String },
    /// An I/O error occurred while streaming a file through the hasher.
    HashFailure {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A scan or batch root is missing or not a directory.
    InvalidRoot(PathBuf),
    /// The action log could not be read or written.
    Log {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A persisted action record could not be parsed.
    LogFormat { path: PathBuf, reason: String },
    /// A user-supplied rename pattern did not compile.
    InvalidPattern { pattern: String, reason: String },
    /// Any other I/O fault during a file operation.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl CoreError {
    /// Classify an I/O error for a single-file operation into the
    /// taxonomy, so batch summaries carry precise reasons.
    pub fn from_io(path: PathBuf, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => CoreError::NotFound(path),
            std::io::ErrorKind::PermissionDenied => CoreError::PermissionDenied(path),
            _ => CoreError::Io { path, source: err },
        }
    }
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "Path not found: {}", path.display()),
            Self::PermissionDenied(path) => {
                write!(f, "Permission denied: {}", path.display())
            }
            Self::Conflict { source, dest } => {
                write!(
                    f,
                    "Destination {} already exists (moving {})",
                    dest.display(),
                    source.display()
                )
            }
            Self::VerificationFailed { path, reason } => {
                write!(f, "Verification failed for {}: {}", path.display(), reason)
            }
            Self::HashFailure { path, source } => {
                write!(f, "Failed to hash {}: {}", path.display(), source)
            }
            Self::InvalidRoot(path) => {
                write!(
                    f,
                    "Invalid root {}: not an existing directory",
                    path.display()
                )
            }
            Self::Log { path, source } => {
                write!(f, "Action log error at {}: {}", path.display(), source)
            }
            Self::LogFormat { path, reason } => {
                write!(f, "Malformed action log {}: {}", path.display(), reason)
            }
            Self::InvalidPattern { pattern, reason } => {
                write!(f, "Invalid pattern '{}': {}", pattern, reason)
            }
            Self::Io { path, source } => {
                write!(f, "I/O error for {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for CoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::HashFailure { source, .. }
            | Self::Log { source, .. }
            | Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type used throughout the core modules.
pub type CoreResult<T> = Result<T, CoreError>;
