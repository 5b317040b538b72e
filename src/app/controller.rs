// ULP Validator - app/controller.rs
//
// Run lifecycle management. Executes one validate-deduplicate-append pass
// over the target file on a background thread and publishes `RunEvent`s to
// an observer (by default an mpsc channel polled by the front end).
//
// Architecture:
//   - `ProcessingController` lives on the caller's thread; `run_pass` runs
//     on a dedicated worker thread. Exactly one worker per run.
//   - `RunControl` is the only state shared between them: the running and
//     paused flags plus the four counters, behind one mutex. Commands flip a
//     flag and return immediately.
//   - The worker checks the flags before every line. Stop takes effect at
//     the next line boundary; pause parks the worker on a condvar, bounded by
//     `RunOptions::pause_poll`, until resumed or stopped.
//
// Teardown: the rejection sink and the master handle are owned by
// `execute`, so every exit path (completion, stop, `?` on a fatal error)
// releases them before the terminal event is published.

use crate::core::classifier;
use crate::core::dedup::DedupIndex;
use crate::core::lines::{self, LossyLines};
use crate::core::master::MasterAppender;
use crate::core::model::{
    Classification, ProgressSnapshot, RejectCounts, RejectReason, RunEvent, RunSummary,
};
use crate::core::progress::{ProgressChannel, RunObserver};
use crate::core::rejection::RejectionSink;
use crate::util::constants::{DEFAULT_PAUSE_POLL_MS, DEFAULT_PROGRESS_INTERVAL, READ_BUFFER_SIZE};
use crate::util::error::RunError;
use crate::util::logging::preview;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

// =============================================================================
// Run parameters
// =============================================================================

/// Tunables of a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Publish a progress snapshot every this many processed lines.
    pub progress_interval: u64,

    /// Longest a paused worker sleeps before re-checking the flags.
    pub pause_poll: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            pause_poll: Duration::from_millis(DEFAULT_PAUSE_POLL_MS),
        }
    }
}

/// Everything a run needs, supplied by the caller at start.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Accumulating, deduplicated output. Created if missing.
    pub master_path: PathBuf,

    /// New input to validate and merge.
    pub target_path: PathBuf,

    /// Fresh directory for this run's rejection logs. Created if missing.
    pub logs_dir: PathBuf,

    pub options: RunOptions,
}

impl RunRequest {
    pub fn new(
        master_path: impl Into<PathBuf>,
        target_path: impl Into<PathBuf>,
        logs_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            master_path: master_path.into(),
            target_path: target_path.into(),
            logs_dir: logs_dir.into(),
            options: RunOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }
}

// =============================================================================
// Shared run state
// =============================================================================

/// Externally visible lifecycle phase of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Running,
    Paused,
    Completed,
    Stopped,
    Failed,
}

impl RunPhase {
    /// Running or paused.
    pub fn is_active(&self) -> bool {
        matches!(self, RunPhase::Running | RunPhase::Paused)
    }
}

#[derive(Debug)]
struct RunState {
    running: bool,
    paused: bool,
    /// Set once by the worker when the run ends.
    outcome: Option<RunPhase>,
    counters: ProgressSnapshot,
}

/// Flags and counters shared between the worker and command issuers.
#[derive(Debug)]
pub struct RunControl {
    state: Mutex<RunState>,
    wake: Condvar,
}

impl RunControl {
    /// Fresh state for a run that is about to start.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RunState {
                running: true,
                paused: false,
                outcome: None,
                counters: ProgressSnapshot::default(),
            }),
            wake: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RunState> {
        // Counters stay consistent per line even if a holder panicked.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn pause(&self) {
        self.lock().paused = true;
    }

    pub fn resume(&self) {
        self.lock().paused = false;
        self.wake.notify_all();
    }

    pub fn stop(&self) {
        self.lock().running = false;
        self.wake.notify_all();
    }

    /// Consistent copy of the four counters.
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.lock().counters
    }

    pub fn phase(&self) -> RunPhase {
        let state = self.lock();
        match state.outcome {
            Some(phase) => phase,
            None if state.paused && state.running => RunPhase::Paused,
            None => RunPhase::Running,
        }
    }

    /// Block while paused. Returns `false` once a stop has been requested.
    fn proceed(&self, poll: Duration) -> bool {
        let mut state = self.lock();
        let mut announced = false;
        loop {
            if !state.running {
                return false;
            }
            if !state.paused {
                if announced {
                    tracing::info!(processed = state.counters.processed, "Run resumed");
                }
                return true;
            }
            if !announced {
                tracing::info!(processed = state.counters.processed, "Run paused");
                announced = true;
            }
            state = self
                .wake
                .wait_timeout(state, poll)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    fn set_total(&self, total: u64) {
        self.lock().counters.total = total;
    }

    /// Count one fully handled line and return the updated counters.
    fn record_line(&self, valid: bool) -> ProgressSnapshot {
        let mut state = self.lock();
        let c = &mut state.counters;
        c.processed += 1;
        if valid {
            c.valid += 1;
        } else {
            c.rejected += 1;
        }
        // The target grew after the pre-scan; keep processed <= total.
        if c.processed > c.total {
            c.total = c.processed;
        }
        *c
    }

    fn finish(&self, phase: RunPhase) {
        let mut state = self.lock();
        state.running = false;
        state.paused = false;
        state.outcome = Some(phase);
    }
}

impl Default for RunControl {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// ProcessingController
// =============================================================================

/// Starts runs and relays commands to the active one.
pub struct ProcessingController {
    /// Channel receiver for the caller to poll run events (set by `start`).
    pub events_rx: Option<mpsc::Receiver<RunEvent>>,

    control: Option<Arc<RunControl>>,
    worker: Option<JoinHandle<()>>,
}

impl ProcessingController {
    pub fn new() -> Self {
        Self {
            events_rx: None,
            control: None,
            worker: None,
        }
    }

    /// Launch a run whose events are delivered to `events_rx`.
    /// Returns as soon as the worker thread is spawned.
    pub fn start(&mut self, request: RunRequest) -> Result<(), RunError> {
        let (tx, rx) = mpsc::channel::<RunEvent>();
        self.start_with_observer(request, Box::new(tx))?;
        self.events_rx = Some(rx);
        Ok(())
    }

    /// Launch a run whose events are delivered to `observer` on the worker
    /// thread.
    pub fn start_with_observer(
        &mut self,
        request: RunRequest,
        observer: Box<dyn RunObserver>,
    ) -> Result<(), RunError> {
        if self.is_active() {
            return Err(RunError::AlreadyRunning);
        }
        // Reap the previous worker; it has already published its outcome.
        self.wait();

        let control = Arc::new(RunControl::new());
        let worker_control = Arc::clone(&control);

        tracing::info!(
            master = %request.master_path.display(),
            target = %request.target_path.display(),
            logs = %request.logs_dir.display(),
            "Run starting"
        );

        let worker = std::thread::Builder::new()
            .name("ulp-worker".to_string())
            .spawn(move || run_pass(request, worker_control, observer))
            .map_err(|source| RunError::WorkerSpawn { source })?;

        self.events_rx = None;
        self.control = Some(control);
        self.worker = Some(worker);
        Ok(())
    }

    /// Pause the active run before its next line. No-op without a run.
    pub fn pause(&self) {
        if let Some(control) = &self.control {
            control.pause();
        }
    }

    /// Resume a paused run. No-op without a run.
    pub fn resume(&self) {
        if let Some(control) = &self.control {
            control.resume();
        }
    }

    /// Stop the active run before its next line. No-op without a run.
    pub fn stop(&self) {
        if let Some(control) = &self.control {
            control.stop();
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.control
            .as_ref()
            .map_or(RunPhase::Idle, |c| c.phase())
    }

    pub fn is_active(&self) -> bool {
        let worker_alive = self.worker.as_ref().is_some_and(|w| !w.is_finished());
        worker_alive && self.phase().is_active()
    }

    /// Current counters of the latest run, if any.
    pub fn snapshot(&self) -> Option<ProgressSnapshot> {
        self.control.as_ref().map(|c| c.snapshot())
    }

    /// Shared control of the latest run, for observers that issue commands.
    pub fn control(&self) -> Option<Arc<RunControl>> {
        self.control.clone()
    }

    /// Poll for events without blocking. Returns all pending events.
    pub fn poll_events(&self) -> Vec<RunEvent> {
        let mut events = Vec::new();
        if let Some(ref rx) = self.events_rx {
            while let Ok(event) = rx.try_recv() {
                events.push(event);
            }
        }
        events
    }

    /// Block until the worker thread has exited.
    pub fn wait(&mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("Processing worker panicked");
                if let Some(control) = &self.control {
                    if control.phase().is_active() {
                        control.finish(RunPhase::Failed);
                    }
                }
            }
        }
    }
}

impl Default for ProcessingController {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Worker
// =============================================================================

/// How `execute` ended when no fatal error occurred.
struct RunOutcome {
    stopped: bool,
    summary: RunSummary,
}

/// Execute a run on the calling thread, then publish exactly one terminal
/// event. `ProcessingController` calls this on its worker thread; callers
/// that manage their own thread pass a fresh `RunControl` they keep a clone of.
pub fn run_pass(
    request: RunRequest,
    control: Arc<RunControl>,
    observer: Box<dyn RunObserver>,
) {
    let mut progress = ProgressChannel::new(observer, request.options.progress_interval);

    match execute(&request, &control, &mut progress) {
        Ok(RunOutcome { stopped, summary }) => {
            let s = summary.snapshot;
            if stopped {
                tracing::info!(
                    processed = s.processed,
                    total = s.total,
                    valid = s.valid,
                    rejected = s.rejected,
                    "Run stopped"
                );
                control.finish(RunPhase::Stopped);
                progress.finish(RunEvent::Stopped(summary));
            } else {
                tracing::info!(
                    processed = s.processed,
                    valid = s.valid,
                    rejected = s.rejected,
                    duration_ms = summary.duration.as_millis() as u64,
                    "Run complete"
                );
                control.finish(RunPhase::Completed);
                progress.finish(RunEvent::Completed(summary));
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Run failed");
            control.finish(RunPhase::Failed);
            progress.finish(RunEvent::Failed {
                error: e.to_string(),
            });
        }
    }
}

/// One pass over the target file.
fn execute(
    request: &RunRequest,
    control: &RunControl,
    progress: &mut ProgressChannel,
) -> Result<RunOutcome, RunError> {
    let started = Instant::now();

    // -------------------------------------------------------------------------
    // Setup: pre-count, logs, dedup index, master handle
    // -------------------------------------------------------------------------
    let total = lines::count_lines(open_target(&request.target_path)?).map_err(|source| {
        RunError::TargetRead {
            path: request.target_path.clone(),
            line_number: 0,
            source,
        }
    })?;
    control.set_total(total);
    tracing::info!(path = %request.target_path.display(), lines = total, "Target counted");

    let mut sink = RejectionSink::open(&request.logs_dir)?;
    let mut index = DedupIndex::preload(&request.master_path)?;
    let mut master = MasterAppender::open(&request.master_path)?;

    // -------------------------------------------------------------------------
    // Line loop
    // -------------------------------------------------------------------------
    let mut target = LossyLines::new(open_target(&request.target_path)?);
    let mut rejections = RejectCounts::default();
    let mut stopped = false;

    loop {
        if !control.proceed(request.options.pause_poll) {
            stopped = true;
            break;
        }

        let line = match target.next() {
            None => break,
            Some(Ok(line)) => line,
            Some(Err(source)) => {
                return Err(RunError::TargetRead {
                    path: request.target_path.clone(),
                    line_number: target.line_number() + 1,
                    source,
                })
            }
        };

        let rejected = match classifier::classify(&line.text) {
            Classification::Valid(record) => {
                if index.contains(&record) {
                    sink.record(RejectReason::Duplicate, line.number, &record)?;
                    Some(RejectReason::Duplicate)
                } else {
                    master.append(&record)?;
                    index.insert(record);
                    None
                }
            }
            Classification::Rejected(reason) => {
                sink.record(reason, line.number, line.stripped())?;
                Some(reason)
            }
        };

        tracing::trace!(
            line = line.number,
            outcome = rejected.map_or("Valid", |r| r.label()),
            text = preview(line.stripped()),
            "Line classified"
        );

        if let Some(reason) = rejected {
            rejections.increment(reason);
        }
        let snapshot = control.record_line(rejected.is_none());
        progress.line_processed(snapshot);
    }

    // -------------------------------------------------------------------------
    // Teardown
    // -------------------------------------------------------------------------
    master.close()?;
    let logs_dir = sink.dir().to_path_buf();
    sink.close_all()?;

    let snapshot = control.snapshot();
    progress.publish_final(snapshot);

    Ok(RunOutcome {
        stopped,
        summary: RunSummary {
            snapshot,
            rejections,
            duration: started.elapsed(),
            logs_dir,
        },
    })
}

fn open_target(path: &Path) -> Result<BufReader<File>, RunError> {
    File::open(path)
        .map(|f| BufReader::with_capacity(READ_BUFFER_SIZE, f))
        .map_err(|source| RunError::TargetOpen {
            path: path.to_path_buf(),
            source,
        })
}

// =============================================================================
// Unit tests
// =============================================================================
