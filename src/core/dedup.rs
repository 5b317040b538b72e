// ULP Validator - core/dedup.rs
//
// In-memory deduplication index seeded from the master file.
//
// The master file is trusted content: every line is stripped and inserted
// as-is on preload, blank lines included, without re-running the classifier.
// A blank entry can never match a record because blank target lines are
// rejected as `EmptyLine` before the index is consulted.
//
// Scaling limit: memory grows with the number of distinct master lines plus
// records accepted during the run. Nothing is evicted.

use crate::core::lines::LossyLines;
use crate::util::constants::READ_BUFFER_SIZE;
use crate::util::error::RunError;
use std::collections::HashSet;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Set of records already present in, or appended to, the master file.
#[derive(Debug, Default)]
pub struct DedupIndex {
    records: HashSet<String>,
}

impl DedupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every line of `path` into a new index.
    ///
    /// A missing master file yields an empty index (it is created later when
    /// opened for appending). Any other I/O failure is fatal for the run.
    pub fn preload(path: &Path) -> Result<Self, RunError> {
        let file = match std::fs::File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "Master file not found; starting empty");
                return Ok(Self::new());
            }
            Err(source) => {
                return Err(RunError::MasterRead {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let index = Self::from_reader(BufReader::with_capacity(READ_BUFFER_SIZE, file)).map_err(
            |source| RunError::MasterRead {
                path: path.to_path_buf(),
                source,
            },
        )?;

        tracing::info!(
            path = %path.display(),
            records = index.len(),
            "Master file loaded for deduplication"
        );
        Ok(index)
    }

    /// Build an index from the lines of `reader`.
    pub fn from_reader<R: BufRead>(reader: R) -> io::Result<Self> {
        let mut records = HashSet::new();
        for line in LossyLines::new(reader) {
            let line = line?;
            records.insert(line.stripped().to_owned());
        }
        Ok(Self { records })
    }

    pub fn contains(&self, record: &str) -> bool {
        self.records.contains(record)
    }

    /// Record `record` as present. Returns `false` if it already was.
    pub fn insert(&mut self, record: String) -> bool {
        self.records.insert(record)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
