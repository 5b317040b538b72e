// ULP Validator - app/session.rs
//
// Session persistence: remember the master and target paths between runs so
// the CLI can be re-invoked without repeating them.
//
// Design principles:
// - Session is saved atomically (write→temp, rename→final) so a crash
//   during save never corrupts the previous good session.
// - Load errors are silently discarded (corrupt or incompatible sessions
//   just start fresh rather than surfacing errors to the user).
// - The processing engine never touches this file; it only receives the
//   resolved paths in a `RunRequest`.

use crate::util::constants::SESSION_FILE_NAME;
use crate::util::error::SessionError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Version stamp for forward-compatibility checks.
///
/// Version mismatches silently discard the session.
pub const SESSION_VERSION: u32 = 1;

/// Remembered file selections.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SessionData {
    /// Schema version; must equal `SESSION_VERSION` to be accepted.
    pub version: u32,

    /// Master file used in the last run.
    #[serde(default)]
    pub master_path: Option<PathBuf>,

    /// Target file used in the last run.
    #[serde(default)]
    pub target_path: Option<PathBuf>,
}

impl SessionData {
    pub fn new(master_path: Option<PathBuf>, target_path: Option<PathBuf>) -> Self {
        Self {
            version: SESSION_VERSION,
            master_path,
            target_path,
        }
    }

    /// Remembered master path, only if it still exists on disk.
    pub fn existing_master(&self) -> Option<&Path> {
        self.master_path.as_deref().filter(|p| p.exists())
    }

    /// Remembered target path, only if it still exists on disk.
    pub fn existing_target(&self) -> Option<&Path> {
        self.target_path.as_deref().filter(|p| p.exists())
    }
}

// =============================================================================
// I/O helpers
// =============================================================================

/// Resolve the session file path from the platform data directory.
pub fn session_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SESSION_FILE_NAME)
}

/// Save `data` to `path` atomically (write temp → rename).
///
/// Creates all parent directories as needed. A failed rename removes the
/// temp file; the previous session file is left as it was.
pub fn save(data: &SessionData, path: &Path) -> Result<(), SessionError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err(parent, "create directory"))?;
    }

    let json =
        serde_json::to_string_pretty(data).map_err(|source| SessionError::Serialize { source })?;

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json.as_bytes()).map_err(io_err(&tmp, "write"))?;

    if let Err(source) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, "rename")(source));
    }

    tracing::debug!(path = %path.display(), "Session saved");
    Ok(())
}

fn io_err(path: &Path, operation: &'static str) -> impl FnOnce(std::io::Error) -> SessionError {
    let path = path.to_path_buf();
    move |source| SessionError::Io {
        path,
        operation,
        source,
    }
}

/// Load and validate a `SessionData` from `path`.
///
/// Returns `None` on any error (file not found, JSON parse failure,
/// version mismatch).
pub fn load(path: &Path) -> Option<SessionData> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::debug!(path = %path.display(), error = %e, "Cannot read session file");
            }
        })
        .ok()?;

    let data: SessionData = serde_json::from_str(&content)
        .map_err(|e| {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Session file is malformed; starting fresh"
            );
        })
        .ok()?;

    if data.version != SESSION_VERSION {
        tracing::warn!(
            found = data.version,
            expected = SESSION_VERSION,
            "Session file version mismatch; starting fresh"
        );
        return None;
    }

    tracing::debug!(path = %path.display(), "Session file loaded");
    Some(data)
}

// =============================================================================
// Unit tests
// =============================================================================
