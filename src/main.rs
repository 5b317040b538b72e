// ULP Validator - main.rs
//
// Command-line front end. Handles:
// 1. CLI argument parsing
// 2. config.toml loading and logging initialisation
// 3. Remembered master/target paths (session.json)
// 4. Creating the run's timestamped logs folder
// 5. Driving a run: progress bar from run events, pause/resume/stop from stdin

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use ulpvalidator::app::controller::{ProcessingController, RunControl, RunOptions, RunRequest};
use ulpvalidator::app::session::{self, SessionData};
use ulpvalidator::core::model::{RejectReason, RunEvent, RunSummary};
use ulpvalidator::platform::config::{self, PlatformPaths};
use ulpvalidator::platform::fs::create_run_logs_dir;
use ulpvalidator::util;

/// ULP Validator - merge colon-delimited records into a deduplicated master file.
///
/// Each line of the target file must split into three `:`-separated parts.
/// New records are appended to the master file; empty, malformed, and
/// duplicate lines are written to per-reason logs. While running, type
/// `p` (pause), `r` (resume) or `s` (stop) followed by Enter.
#[derive(Parser, Debug)]
#[command(name = "ulpvalidator", version, about)]
struct Cli {
    /// Master file receiving accepted records (defaults to the last one used).
    #[arg(short = 'm', long = "master")]
    master: Option<PathBuf>,

    /// Target file to validate and merge (defaults to the last one used).
    #[arg(short = 't', long = "target")]
    target: Option<PathBuf>,

    /// Base directory for this run's timestamped logs folder
    /// (overrides [logs] base_dir).
    #[arg(short = 'l', long = "logs-dir")]
    logs_dir: Option<PathBuf>,

    /// Directory holding config.toml and session.json instead of the
    /// platform default.
    #[arg(short = 'c', long = "config-dir")]
    config_dir: Option<PathBuf>,

    /// Do not remember the master/target paths for the next run.
    #[arg(long = "no-remember")]
    no_remember: bool,

    /// Hide the progress bar.
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn main() {
    let cli = Cli::parse();

    let paths = match cli.config_dir {
        Some(ref dir) => PlatformPaths::in_dir(dir),
        None => PlatformPaths::resolve(),
    };
    let (app_config, config_problems) = config::load_config(&paths.config_dir);

    util::logging::init(
        cli.debug,
        app_config.log_level.as_deref(),
        app_config.log_file.as_deref(),
    );

    tracing::info!(
        version = util::constants::APP_VERSION,
        debug = cli.debug,
        "ULP Validator starting"
    );
    for problem in &config_problems {
        tracing::warn!(error = %problem, "Config problem; default used");
    }

    // -------------------------------------------------------------------------
    // Resolve inputs: CLI > remembered session
    // -------------------------------------------------------------------------
    let session_file = session::session_path(&paths.data_dir);
    let remembered = session::load(&session_file).unwrap_or_default();

    let master = cli
        .master
        .clone()
        .or_else(|| remembered.existing_master().map(PathBuf::from));
    let target = cli
        .target
        .clone()
        .or_else(|| remembered.existing_target().map(PathBuf::from));

    let (master, target) = match (master, target) {
        (Some(m), Some(t)) => (m, t),
        (m, t) => {
            if m.is_none() {
                eprintln!("Error: no master file given (use --master) and none remembered");
            }
            if t.is_none() {
                eprintln!("Error: no target file given (use --target) and none remembered");
            }
            std::process::exit(2);
        }
    };

    if !cli.no_remember {
        let data = SessionData::new(Some(master.clone()), Some(target.clone()));
        if let Err(e) = session::save(&data, &session_file) {
            tracing::warn!(error = %e, "Could not remember file paths");
        }
    }

    let logs_base = cli
        .logs_dir
        .clone()
        .unwrap_or_else(|| app_config.logs_base_dir.clone());
    let logs_dir = match create_run_logs_dir(&logs_base, &chrono::Local::now()) {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!(
                "Error: cannot create logs folder under '{}': {e}",
                logs_base.display()
            );
            std::process::exit(1);
        }
    };

    // -------------------------------------------------------------------------
    // Run
    // -------------------------------------------------------------------------
    let request = RunRequest::new(&master, &target, &logs_dir).with_options(RunOptions {
        progress_interval: app_config.progress_interval,
        pause_poll: Duration::from_millis(app_config.pause_poll_ms),
    });

    let mut controller = ProcessingController::new();
    if let Err(e) = controller.start(request) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    println!("Master file: {}", master.display());
    println!("Target file: {}", target.display());
    println!("Logs folder: {}", logs_dir.display());

    let bar = progress_bar(cli.quiet);
    if let Some(control) = controller.control() {
        spawn_command_reader(control, bar.clone());
    }

    let exit_code = match controller.events_rx.take() {
        Some(rx) => drive(&rx, &bar),
        None => 1,
    };

    controller.wait();
    std::process::exit(exit_code);
}

/// Consume run events until the terminal one; returns the process exit code.
fn drive(rx: &std::sync::mpsc::Receiver<RunEvent>, bar: &ProgressBar) -> i32 {
    while let Ok(event) = rx.recv() {
        match event {
            RunEvent::Progress(s) => {
                bar.set_length(s.total);
                bar.set_position(s.processed);
                bar.set_message(format!("valid {} | rejected {}", s.valid, s.rejected));
            }
            RunEvent::Completed(summary) => {
                bar.finish_and_clear();
                print_summary("Processing completed", &summary);
                return 0;
            }
            RunEvent::Stopped(summary) => {
                bar.finish_and_clear();
                print_summary("Processing stopped", &summary);
                return 0;
            }
            RunEvent::Failed { error } => {
                bar.abandon();
                eprintln!("Error: {error}");
                return 1;
            }
        }
    }

    bar.abandon();
    eprintln!("Error: processing worker exited without a result");
    1
}

fn progress_bar(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    bar.enable_steady_tick(Duration::from_millis(200));
    bar
}

/// Read `p`/`r`/`s` commands from stdin on a detached thread.
fn spawn_command_reader(control: Arc<RunControl>, bar: ProgressBar) {
    let spawned = std::thread::Builder::new()
        .name("stdin-commands".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                match line.trim().to_lowercase().as_str() {
                    "p" | "pause" => {
                        control.pause();
                        bar.set_message("paused (r to resume, s to stop)");
                    }
                    "r" | "resume" => {
                        control.resume();
                        bar.set_message("resumed");
                    }
                    "s" | "stop" => {
                        control.stop();
                        bar.set_message("stopping");
                    }
                    "" => {}
                    other => bar.println(format!(
                        "Unknown command '{other}'. Use p (pause), r (resume), s (stop)."
                    )),
                }
            }
        });

    if let Err(e) = spawned {
        tracing::warn!(error = %e, "Cannot read commands from stdin; run is not interactive");
    }
}

fn print_summary(heading: &str, summary: &RunSummary) {
    let s = summary.snapshot;
    println!("{heading} in {:.1}s", summary.duration.as_secs_f64());
    println!("  Total lines:     {}", s.total);
    println!(
        "  Processed lines: {} ({:.1}%)",
        s.processed,
        s.fraction() * 100.0
    );
    println!("  Valid lines:     {}", s.valid);
    println!("  Rejected lines:  {}", s.rejected);
    for reason in RejectReason::all() {
        println!(
            "    {:<17} {}",
            format!("{}:", reason.label()),
            summary.rejections.get(*reason)
        );
    }
    println!("  Logs folder:     {}", summary.logs_dir.display());
}
