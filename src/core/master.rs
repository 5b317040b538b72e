// ULP Validator - core/master.rs
//
// Append-only writer for the master file.
//
// The file is opened with `append(true)`, so existing bytes are never
// truncated or rewritten. Each accepted record goes out as a single
// `write_all` of `record + "\n"` on an unbuffered `File`, so it is handed to
// the OS before the next line is processed and survives an abrupt stop.

use crate::util::error::RunError;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Open master file in append mode.
pub struct MasterAppender {
    path: PathBuf,
    file: File,
    /// The existing content ends without `\n`; emit one before the first record.
    needs_separator: bool,
    appended: u64,
}

impl MasterAppender {
    /// Open (creating if absent) `path` for appending.
    pub fn open(path: &Path) -> Result<Self, RunError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(path)
            .map_err(|source| RunError::MasterOpen {
                path: path.to_path_buf(),
                source,
            })?;

        let needs_separator = ends_without_newline(&mut file).map_err(|source| {
            RunError::MasterOpen {
                path: path.to_path_buf(),
                source,
            }
        })?;

        tracing::debug!(
            path = %path.display(),
            needs_separator,
            "Master file opened for appending"
        );

        Ok(Self {
            path: path.to_path_buf(),
            file,
            needs_separator,
            appended: 0,
        })
    }

    /// Append one record as its own line.
    pub fn append(&mut self, record: &str) -> Result<(), RunError> {
        let mut line = Vec::with_capacity(record.len() + 2);
        if self.needs_separator {
            line.push(b'\n');
        }
        line.extend_from_slice(record.as_bytes());
        line.push(b'\n');

        self.file
            .write_all(&line)
            .and_then(|()| self.file.flush())
            .map_err(|source| RunError::MasterWrite {
                path: self.path.clone(),
                source,
            })?;

        self.needs_separator = false;
        self.appended += 1;
        Ok(())
    }

    /// Flush and release the file handle.
    pub fn close(mut self) -> Result<(), RunError> {
        self.file.flush().map_err(|source| RunError::MasterWrite {
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!(
            path = %self.path.display(),
            appended = self.appended,
            "Master file closed"
        );
        Ok(())
    }
}

/// True when the file is non-empty and its last byte is not `\n`.
fn ends_without_newline(file: &mut File) -> io::Result<bool> {
    let len = file.seek(SeekFrom::End(0))?;
    if len == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creates_missing_master() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("master.txt");
        let mut master = MasterAppender::open(&path).unwrap();
        master.append("a:b:c").unwrap();
        master.close().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a:b:c\n");
    }

    #[test]
    fn test_existing_content_is_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("master.txt");
        std::fs::write(&path, "old:one:1\n").unwrap();

        let mut master = MasterAppender::open(&path).unwrap();
        master.append("new:two:2").unwrap();
        master.append("new:three:3").unwrap();
        master.close().unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "old:one:1\nnew:two:2\nnew:three:3\n"
        );
    }

    #[test]
    fn test_unterminated_last_line_is_not_merged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("master.txt");
        std::fs::write(&path, "old:one:1").unwrap();

        let mut master = MasterAppender::open(&path).unwrap();
        master.append("new:two:2").unwrap();
        master.close().unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "old:one:1\nnew:two:2\n"
        );
    }

    #[test]
    fn test_no_append_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("master.txt");
        std::fs::write(&path, "old:one:1").unwrap();
        MasterAppender::open(&path).unwrap().close().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "old:one:1");
    }

    #[test]
    fn test_write_is_visible_before_close() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("master.txt");
        let mut master = MasterAppender::open(&path).unwrap();
        master.append("a:b:c").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a:b:c\n");
        drop(master);
    }
}
