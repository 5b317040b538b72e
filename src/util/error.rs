// ULP Validator - util/error.rs
//
// Typed errors per subsystem with context-preserving error chains.
// Every I/O failure carries the path it happened on so the single
// `Failed` message a run emits is actionable on its own.

use std::fmt;
use std::io;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Run errors
// ---------------------------------------------------------------------------

/// Fatal errors of a processing run. Any of these aborts the run; none is
/// retried.
#[derive(Debug)]
pub enum RunError {
    /// The target file could not be opened (pre-scan or processing pass).
    TargetOpen { path: PathBuf, source: io::Error },

    /// Reading the target file failed part-way through.
    TargetRead {
        path: PathBuf,
        line_number: u64,
        source: io::Error,
    },

    /// The existing master file could not be read for deduplication.
    MasterRead { path: PathBuf, source: io::Error },

    /// The master file could not be opened for appending.
    MasterOpen { path: PathBuf, source: io::Error },

    /// Appending an accepted record to the master file failed.
    MasterWrite { path: PathBuf, source: io::Error },

    /// The logs directory could not be created.
    LogsDirectory { path: PathBuf, source: io::Error },

    /// A rejection log could not be created, written, or flushed.
    RejectionLog { path: PathBuf, source: io::Error },

    /// `start` was called while a run is still active.
    AlreadyRunning,

    /// The worker thread could not be spawned.
    WorkerSpawn { source: io::Error },
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TargetOpen { path, source } => {
                write!(f, "Cannot open target file '{}': {source}", path.display())
            }
            Self::TargetRead {
                path,
                line_number,
                source,
            } => write!(
                f,
                "Cannot read target file '{}' at line {line_number}: {source}",
                path.display()
            ),
            Self::MasterRead { path, source } => {
                write!(f, "Cannot read master file '{}': {source}", path.display())
            }
            Self::MasterOpen { path, source } => write!(
                f,
                "Cannot open master file '{}' for appending: {source}",
                path.display()
            ),
            Self::MasterWrite { path, source } => {
                write!(f, "Cannot append to master file '{}': {source}", path.display())
            }
            Self::LogsDirectory { path, source } => write!(
                f,
                "Cannot create logs directory '{}': {source}",
                path.display()
            ),
            Self::RejectionLog { path, source } => {
                write!(f, "Rejection log '{}' failed: {source}", path.display())
            }
            Self::AlreadyRunning => {
                write!(f, "A run is already in progress; stop it before starting another")
            }
            Self::WorkerSpawn { source } => {
                write!(f, "Cannot spawn processing worker: {source}")
            }
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TargetOpen { source, .. }
            | Self::TargetRead { source, .. }
            | Self::MasterRead { source, .. }
            | Self::MasterOpen { source, .. }
            | Self::MasterWrite { source, .. }
            | Self::LogsDirectory { source, .. }
            | Self::RejectionLog { source, .. }
            | Self::WorkerSpawn { source } => Some(source),
            Self::AlreadyRunning => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
///
/// `load_config` downgrades these to warnings; they are surfaced as typed
/// values so callers can log or display them consistently.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A config value is out of the allowed range or not recognised.
    ValueOutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "Config '{field}' = '{value}' is out of range. Expected: {expected}"
            ),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            Self::ValueOutOfRange { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Session errors
// ---------------------------------------------------------------------------

/// Failures saving the remembered paths. Never fatal; the CLI logs them.
#[derive(Debug)]
pub enum SessionError {
    /// The session data could not be encoded as JSON.
    Serialize { source: serde_json::Error },

    /// A filesystem step of the atomic save failed.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serialize { source } => write!(f, "Cannot serialise session: {source}"),
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "Session I/O error during {operation} on '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Serialize { source } => Some(source),
            Self::Io { source, .. } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_run_error_message_names_path() {
        let err = RunError::MasterOpen {
            path: PathBuf::from("/data/master.txt"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/data/master.txt"), "got: {msg}");
        assert!(msg.contains("denied"), "got: {msg}");
    }

    #[test]
    fn test_run_error_preserves_source() {
        let err = RunError::TargetOpen {
            path: PathBuf::from("target.txt"),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        };
        let io = err.source().expect("io error source");
        assert_eq!(io.to_string(), "missing");
    }

    #[test]
    fn test_session_error_names_operation_and_path() {
        let err = SessionError::Io {
            path: PathBuf::from("/cfg/session.json"),
            operation: "rename",
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("rename"), "got: {msg}");
        assert!(msg.contains("/cfg/session.json"), "got: {msg}");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_already_running_has_no_source() {
        assert!(RunError::AlreadyRunning.source().is_none());
    }
}
