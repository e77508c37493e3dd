//! Error types for safe-migrate.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for safe-migrate operations.
///
/// The rewrite itself never fails; only the file boundary does.
#[derive(Debug, Error)]
pub enum SafeMigrateError {
    /// The input script could not be read (missing, unreadable, or not UTF-8).
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The output script could not be written.
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configuration file is missing or malformed.
    #[error("Configuration error in {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
}

impl SafeMigrateError {
    /// Create a read error for the given path.
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Create a write error for the given path.
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error for the given path.
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for safe-migrate operations.
pub type SafeMigrateResult<T> = Result<T, SafeMigrateError>;
