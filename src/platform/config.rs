// ULP Validator - platform/config.rs
//
// Platform-specific configuration, data directory resolution, and config.toml
// loading with startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Resolved platform paths for ULP Validator data and configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/ulpvalidator/ or %APPDATA%\ULPValidator\config\)
    pub config_dir: PathBuf,

    /// Data directory for the session file.
    pub data_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            let data_dir = proj_dirs.data_dir().to_path_buf();

            tracing::debug!(
                config = %config_dir.display(),
                data = %data_dir.display(),
                "Platform paths resolved"
            );

            Self {
                config_dir,
                data_dir,
            }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            Self {
                config_dir: PathBuf::from("."),
                data_dir: PathBuf::from("."),
            }
        }
    }

    /// Use `dir` for both config and data (CLI `--config-dir` override).
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            config_dir: dir.to_path_buf(),
            data_dir: dir.to_path_buf(),
        }
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored for forward compatibility.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[processing]` section.
    pub processing: ProcessingSection,
    /// `[logs]` section.
    pub logs: LogsSection,
    /// `[logging]` section.
    pub logging: LoggingSection,
}

/// `[processing]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ProcessingSection {
    /// Lines between progress snapshots.
    pub progress_interval: Option<u64>,
    /// Paused-worker re-check interval in ms.
    pub pause_poll_ms: Option<u64>,
}

/// `[logs]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LogsSection {
    /// Directory under which each run's timestamped logs folder is created.
    pub base_dir: Option<String>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
    /// Log file path (empty = stderr only).
    pub file: Option<String>,
}

/// Validated application configuration derived from `config.toml`.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    // -- Processing --
    /// Lines between progress snapshots.
    pub progress_interval: u64,
    /// Paused-worker re-check interval in ms.
    pub pause_poll_ms: u64,

    // -- Logs --
    /// Base directory for per-run logs folders.
    pub logs_base_dir: PathBuf,

    // -- Logging --
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
    /// Log file path.
    pub log_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            progress_interval: constants::DEFAULT_PROGRESS_INTERVAL,
            pause_poll_ms: constants::DEFAULT_PAUSE_POLL_MS,
            logs_base_dir: PathBuf::from(constants::DEFAULT_LOGS_BASE_DIR),
            log_level: None,
            log_file: None,
        }
    }
}

/// Path of `config.toml` for a given config directory.
pub fn config_path(config_dir: &Path) -> PathBuf {
    config_dir.join(constants::CONFIG_FILE_NAME)
}

/// Load and validate `config.toml` from the given config directory.
///
/// Returns `AppConfig` with validated values and a list of non-fatal
/// problems. A missing file yields defaults with no problems (first run).
/// An unreadable or unparseable file yields defaults plus the error; each
/// invalid value falls back to its default and is reported.
pub fn load_config(config_dir: &Path) -> (AppConfig, Vec<ConfigError>) {
    let path = config_path(config_dir);
    let mut problems: Vec<ConfigError> = Vec::new();

    if !path.exists() {
        tracing::debug!(path = %path.display(), "No config.toml found; using defaults");
        return (AppConfig::default(), problems);
    }

    let content = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(source) => {
            problems.push(ConfigError::Io { path, source });
            return (AppConfig::default(), problems);
        }
    };

    let (config, problems) = parse_config(&content, &path);
    tracing::info!(path = %path.display(), "Loaded config.toml");
    if !problems.is_empty() {
        tracing::warn!(count = problems.len(), "Config validation produced warnings");
    }
    (config, problems)
}

/// Parse and validate config text. `path` is only used in error messages.
pub fn parse_config(content: &str, path: &Path) -> (AppConfig, Vec<ConfigError>) {
    let mut problems: Vec<ConfigError> = Vec::new();

    let raw: RawConfig = match toml::from_str(content) {
        Ok(r) => r,
        Err(source) => {
            problems.push(ConfigError::TomlParse {
                path: path.to_path_buf(),
                source,
            });
            return (AppConfig::default(), problems);
        }
    };

    let mut config = AppConfig::default();

    // -- Processing: progress_interval --
    if let Some(interval) = raw.processing.progress_interval {
        if (constants::MIN_PROGRESS_INTERVAL..=constants::MAX_PROGRESS_INTERVAL).contains(&interval)
        {
            config.progress_interval = interval;
        } else {
            problems.push(ConfigError::ValueOutOfRange {
                field: "[processing] progress_interval".to_string(),
                value: interval.to_string(),
                expected: format!(
                    "{}-{} (using default {})",
                    constants::MIN_PROGRESS_INTERVAL,
                    constants::MAX_PROGRESS_INTERVAL,
                    constants::DEFAULT_PROGRESS_INTERVAL
                ),
            });
        }
    }

    // -- Processing: pause_poll_ms --
    if let Some(ms) = raw.processing.pause_poll_ms {
        if (constants::MIN_PAUSE_POLL_MS..=constants::MAX_PAUSE_POLL_MS).contains(&ms) {
            config.pause_poll_ms = ms;
        } else {
            problems.push(ConfigError::ValueOutOfRange {
                field: "[processing] pause_poll_ms".to_string(),
                value: ms.to_string(),
                expected: format!(
                    "{}-{} (using default {})",
                    constants::MIN_PAUSE_POLL_MS,
                    constants::MAX_PAUSE_POLL_MS,
                    constants::DEFAULT_PAUSE_POLL_MS
                ),
            });
        }
    }

    // -- Logs: base_dir --
    if let Some(ref dir) = raw.logs.base_dir {
        if dir.trim().is_empty() {
            problems.push(ConfigError::ValueOutOfRange {
                field: "[logs] base_dir".to_string(),
                value: dir.clone(),
                expected: format!(
                    "a non-empty path (using default \"{}\")",
                    constants::DEFAULT_LOGS_BASE_DIR
                ),
            });
        } else {
            config.logs_base_dir = PathBuf::from(dir);
        }
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.to_lowercase());
        } else {
            problems.push(ConfigError::ValueOutOfRange {
                field: "[logging] level".to_string(),
                value: level.clone(),
                expected: "error, warn, info, debug, trace (using default info)".to_string(),
            });
        }
    }

    // -- Logging: file --
    if let Some(ref file) = raw.logging.file {
        if !file.is_empty() {
            config.log_file = Some(PathBuf::from(file));
        }
    }

    (config, problems)
}
