// ULP Validator - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "ULP Validator";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "ULPValidator";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Record format
// =============================================================================

/// Field delimiter inside a record.
pub const RECORD_DELIMITER: char = ':';

/// Number of segments a record must split into. Only the first
/// `RECORD_PARTS - 1` delimiters separate fields; the last segment keeps
/// any further delimiters verbatim (URLs with ports, passwords with colons).
pub const RECORD_PARTS: usize = 3;

// =============================================================================
// Rejection logs
// =============================================================================

/// File name of the log receiving lines that are empty after stripping.
pub const EMPTY_LINE_LOG: &str = "Empty Line.txt";

/// File name of the log receiving lines with the wrong number of segments.
pub const NOT_ENOUGH_PARTS_LOG: &str = "Not Enough Parts.txt";

/// File name of the log receiving lines already present in the master file.
pub const DUPLICATE_LOG: &str = "Duplicate.txt";

/// Default base directory for per-run logs folders (relative to the CWD).
pub const DEFAULT_LOGS_BASE_DIR: &str = "Logs";

/// `chrono` format for a run's logs folder name, e.g. `19-10-2026 03-04-05 PM`.
/// Avoids `:` so the name is valid on Windows.
pub const LOGS_DIR_TIMESTAMP_FORMAT: &str = "%d-%m-%Y %I-%M-%S %p";

/// Maximum ` (n)` suffix tried when a timestamped logs folder already exists.
pub const MAX_LOGS_DIR_SUFFIX: u32 = 100;

// =============================================================================
// Progress and run control
// =============================================================================

/// Publish a progress snapshot every this many processed lines.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 100;

/// Minimum user-configurable progress interval (lines).
pub const MIN_PROGRESS_INTERVAL: u64 = 1;

/// Maximum user-configurable progress interval (lines).
pub const MAX_PROGRESS_INTERVAL: u64 = 1_000_000;

/// Upper bound on how long a paused worker sleeps before re-checking the
/// run flags (ms). Resume and stop normally wake it immediately.
pub const DEFAULT_PAUSE_POLL_MS: u64 = 100;

/// Minimum user-configurable pause poll interval (ms).
pub const MIN_PAUSE_POLL_MS: u64 = 10;

/// Maximum user-configurable pause poll interval (ms).
pub const MAX_PAUSE_POLL_MS: u64 = 5_000;

/// Read buffer size for the target and master files.
pub const READ_BUFFER_SIZE: usize = 256 * 1024; // 256 KB

/// Write buffer size for each rejection log.
pub const LOG_WRITE_BUFFER_SIZE: usize = 64 * 1024; // 64 KB

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Maximum number of characters of a record included in trace output.
/// Records routinely hold credentials; keep previews short.
pub const DEBUG_MAX_LINE_PREVIEW: usize = 200;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Session persistence file name (stored in the platform data directory).
pub const SESSION_FILE_NAME: &str = "session.json";
