// ULP Validator - platform/fs.rs
//
// Filesystem helpers used by front ends before a run starts.

use crate::util::constants::{LOGS_DIR_TIMESTAMP_FORMAT, MAX_LOGS_DIR_SUFFIX};
use chrono::{DateTime, TimeZone};
use std::fmt::Display;
use std::io;
use std::path::{Path, PathBuf};

/// Name of a run's logs folder for a start time, e.g. `19-10-2026 03-04-05 PM`.
pub fn logs_dir_name<Tz>(started: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    started.format(LOGS_DIR_TIMESTAMP_FORMAT).to_string()
}

/// Create a fresh, timestamped logs folder under `base`.
///
/// If the folder for this second already exists, ` (2)`, ` (3)`, ... are
/// tried so a run never writes into another run's logs.
pub fn create_run_logs_dir<Tz>(base: &Path, started: &DateTime<Tz>) -> io::Result<PathBuf>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    std::fs::create_dir_all(base)?;
    let name = logs_dir_name(started);

    for attempt in 1..=MAX_LOGS_DIR_SUFFIX {
        let candidate = if attempt == 1 {
            base.join(&name)
        } else {
            base.join(format!("{name} ({attempt})"))
        };
        match std::fs::create_dir(&candidate) {
            Ok(()) => {
                tracing::debug!(dir = %candidate.display(), "Logs folder created");
                return Ok(candidate);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }

    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!(
            "no free logs folder name for '{name}' under '{}'",
            base.display()
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn afternoon() -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(15, 4, 5)
            .unwrap()
            .and_utc()
    }

    #[test]
    fn test_logs_dir_name_uses_twelve_hour_clock() {
        assert_eq!(logs_dir_name(&afternoon()), "19-10-2026 03-04-05 PM");
    }

    #[test]
    fn test_create_run_logs_dir_is_fresh_each_time() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("Logs");

        let first = create_run_logs_dir(&base, &afternoon()).unwrap();
        let second = create_run_logs_dir(&base, &afternoon()).unwrap();

        assert!(first.is_dir());
        assert!(second.is_dir());
        assert_ne!(first, second);
        assert_eq!(
            second.file_name().unwrap().to_str().unwrap(),
            "19-10-2026 03-04-05 PM (2)"
        );
    }
}
