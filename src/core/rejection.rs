// ULP Validator - core/rejection.rs
//
// Per-reason rejection logs for one run.
//
// One buffered file per `RejectReason` is created (truncating) inside the
// run's logs directory. Each rejected line is written as
// `Line <n>: <stripped text>`.
//
// Lifetime: `close_all` consumes the sink, flushes every log and reports the
// first failure. If the sink is dropped without `close_all` (fatal error or
// panic on the worker), `Drop` flushes best-effort so no buffered lines are
// lost and no handle outlives the run.

use crate::core::model::RejectReason;
use crate::util::constants::LOG_WRITE_BUFFER_SIZE;
use crate::util::error::RunError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

struct RejectionLog {
    reason: RejectReason,
    path: PathBuf,
    writer: BufWriter<File>,
}

/// Open rejection logs of a single run.
pub struct RejectionSink {
    dir: PathBuf,
    logs: Vec<RejectionLog>,
}

impl RejectionSink {
    /// Create `dir` if needed, then one log file per rejection reason.
    pub fn open(dir: &Path) -> Result<Self, RunError> {
        std::fs::create_dir_all(dir).map_err(|source| RunError::LogsDirectory {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut logs = Vec::with_capacity(RejectReason::all().len());
        for &reason in RejectReason::all() {
            let path = dir.join(reason.log_file_name());
            let file = File::create(&path).map_err(|source| RunError::RejectionLog {
                path: path.clone(),
                source,
            })?;
            logs.push(RejectionLog {
                reason,
                path,
                writer: BufWriter::with_capacity(LOG_WRITE_BUFFER_SIZE, file),
            });
        }

        tracing::debug!(dir = %dir.display(), "Rejection logs opened");
        Ok(Self {
            dir: dir.to_path_buf(),
            logs,
        })
    }

    /// Directory holding the logs.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Append `Line <line_number>: <content>` to the log for `reason`.
    pub fn record(
        &mut self,
        reason: RejectReason,
        line_number: u64,
        content: &str,
    ) -> Result<(), RunError> {
        // `open` pushes logs in `RejectReason::all()` order, which is `index()` order.
        let log = &mut self.logs[reason.index()];
        debug_assert_eq!(log.reason, reason);
        writeln!(log.writer, "Line {line_number}: {content}").map_err(|source| {
            RunError::RejectionLog {
                path: log.path.clone(),
                source,
            }
        })
    }

    /// Flush and close every log. Every log is flushed even if an earlier
    /// one fails; the first error is returned.
    pub fn close_all(mut self) -> Result<(), RunError> {
        let mut first_err = None;
        for mut log in self.logs.drain(..) {
            if let Err(source) = log.writer.flush() {
                tracing::warn!(path = %log.path.display(), error = %source, "Rejection log flush failed");
                first_err.get_or_insert(RunError::RejectionLog {
                    path: log.path.clone(),
                    source,
                });
            }
        }
        tracing::debug!(dir = %self.dir.display(), "Rejection logs closed");
        first_err.map_or(Ok(()), Err)
    }
}

impl Drop for RejectionSink {
    fn drop(&mut self) {
        for log in &mut self.logs {
            if let Err(e) = log.writer.flush() {
                tracing::warn!(path = %log.path.display(), error = %e, "Rejection log flush on drop failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_creates_one_file_per_reason() {
        let dir = tempfile::tempdir().unwrap();
        let logs_dir = dir.path().join("run");
        let sink = RejectionSink::open(&logs_dir).unwrap();
        sink.close_all().unwrap();

        let mut names: Vec<String> = std::fs::read_dir(&logs_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec!["Duplicate.txt", "Empty Line.txt", "Not Enough Parts.txt"]
        );
    }

    #[test]
    fn test_record_routes_by_reason() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = RejectionSink::open(dir.path()).unwrap();
        sink.record(RejectReason::NotEnoughParts, 3, "user:example.com")
            .unwrap();
        sink.record(RejectReason::EmptyLine, 5, "").unwrap();
        sink.record(RejectReason::Duplicate, 9, "a:b:c").unwrap();
        sink.record(RejectReason::Duplicate, 12, "a:b:c").unwrap();
        sink.close_all().unwrap();

        let read = |name: &str| std::fs::read_to_string(dir.path().join(name)).unwrap();
        assert_eq!(read("Not Enough Parts.txt"), "Line 3: user:example.com\n");
        assert_eq!(read("Empty Line.txt"), "Line 5: \n");
        assert_eq!(
            read("Duplicate.txt"),
            "Line 9: a:b:c\nLine 12: a:b:c\n"
        );
    }

    #[test]
    fn test_drop_without_close_flushes() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut sink = RejectionSink::open(dir.path()).unwrap();
            sink.record(RejectReason::EmptyLine, 1, "").unwrap();
        }
        let content = std::fs::read_to_string(dir.path().join("Empty Line.txt")).unwrap();
        assert_eq!(content, "Line 1: \n");
    }

    #[test]
    fn test_open_truncates_previous_logs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Duplicate.txt"), "stale\n").unwrap();
        RejectionSink::open(dir.path()).unwrap().close_all().unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("Duplicate.txt")).unwrap(),
            ""
        );
    }

    #[test]
    fn test_open_fails_when_dir_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("not_a_dir");
        std::fs::write(&file, "x").unwrap();
        let result = RejectionSink::open(&file);
        assert!(matches!(result, Err(RunError::LogsDirectory { .. })));
    }
}
