// ULP Validator - core/model.rs
//
// Core data model types. Pure data definitions with no I/O.
//
// These types are the shared vocabulary across all layers: the classifier
// produces `Classification`, the sink is keyed by `RejectReason`, and the
// controller publishes `RunEvent`s built from `ProgressSnapshot`s.

use crate::util::constants;
use std::path::PathBuf;
use std::time::Duration;

// =============================================================================
// Lines and records
// =============================================================================

/// A line as read from the target file, trailing newline included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    /// 1-based physical line number in the target file.
    pub number: u64,

    /// Decoded text, undecodable bytes already dropped.
    pub text: String,
}

impl RawLine {
    pub fn new(number: u64, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }

    /// The line with leading/trailing whitespace removed; what the rejection
    /// logs and the master file receive.
    pub fn stripped(&self) -> &str {
        self.text.trim()
    }
}

/// Result of structurally classifying one line.
///
/// `Duplicate` is never produced here; it is decided by the controller
/// against the dedup index after a line classifies as `Valid`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The stripped line, accepted as a record.
    Valid(String),

    /// The line failed a structural check.
    Rejected(RejectReason),
}

// =============================================================================
// Rejection reasons
// =============================================================================

/// Closed set of reasons a line is routed to a rejection log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RejectReason {
    EmptyLine,
    NotEnoughParts,
    Duplicate,
}

impl RejectReason {
    /// Returns all variants in log-file order.
    pub fn all() -> &'static [RejectReason] {
        &[
            RejectReason::NotEnoughParts,
            RejectReason::EmptyLine,
            RejectReason::Duplicate,
        ]
    }

    /// Human-readable label for display.
    pub fn label(&self) -> &'static str {
        match self {
            RejectReason::EmptyLine => "Empty Line",
            RejectReason::NotEnoughParts => "Not Enough Parts",
            RejectReason::Duplicate => "Duplicate",
        }
    }

    /// File name of this reason's log inside a run's logs directory.
    pub fn log_file_name(&self) -> &'static str {
        match self {
            RejectReason::EmptyLine => constants::EMPTY_LINE_LOG,
            RejectReason::NotEnoughParts => constants::NOT_ENOUGH_PARTS_LOG,
            RejectReason::Duplicate => constants::DUPLICATE_LOG,
        }
    }

    /// Dense index for per-reason arrays.
    pub(crate) fn index(&self) -> usize {
        match self {
            RejectReason::NotEnoughParts => 0,
            RejectReason::EmptyLine => 1,
            RejectReason::Duplicate => 2,
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-reason rejection tallies for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RejectCounts {
    counts: [u64; 3],
}

impl RejectCounts {
    pub fn increment(&mut self, reason: RejectReason) {
        self.counts[reason.index()] += 1;
    }

    pub fn get(&self, reason: RejectReason) -> u64 {
        self.counts[reason.index()]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

// =============================================================================
// Progress and run events
// =============================================================================

/// Point-in-time view of a run's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub total: u64,
    pub processed: u64,
    pub valid: u64,
    pub rejected: u64,
}

impl ProgressSnapshot {
    /// Fraction of lines processed, in `0.0..=1.0`. An empty target counts
    /// as complete.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.processed as f64 / self.total as f64
        }
    }
}

/// Final figures of a run that ended without a fatal error.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Counters at the moment the loop exited.
    pub snapshot: ProgressSnapshot,

    /// Rejections broken down by reason.
    pub rejections: RejectCounts,

    /// Wall-clock time from start to teardown.
    pub duration: Duration,

    /// Directory holding this run's rejection logs.
    pub logs_dir: PathBuf,
}

/// Messages published by a run to its observer.
#[derive(Debug, Clone)]
pub enum RunEvent {
    /// Throttled progress update.
    Progress(ProgressSnapshot),

    /// Target file exhausted; all resources released.
    Completed(RunSummary),

    /// Stop command honoured; all resources released.
    Stopped(RunSummary),

    /// Fatal error; the run was aborted.
    Failed { error: String },
}

impl RunEvent {
    /// True for the three events that end a run.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunEvent::Progress(_))
    }
}
