//! buddylogd - Buddy presence CSV logging daemon.
//!
//! Watches a JSON roster file exported by the host messaging application and
//! appends one presence row per trigger to an append-only CSV log.
//!
//! Usage:
//!   buddylogd -r roster.json                  # event mode, default log path
//!   buddylogd -r roster.json -l /tmp/log.csv  # explicit log file
//!   buddylogd -r roster.json -t timer -c 120  # dump every 2 minutes
//!   buddylogd -r roster.json -m 60            # allow a row every minute

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use tracing::{Level, info, warn};
use tracing_subscriber::EnvFilter;

use buddylog::config::{
    DEFAULT_MIN_DELAY_SECS, LogConfig, SharedConfig, TriggerMode, clamp_min_delay,
    default_log_path,
};
use buddylog::logger::CsvLogger;
use buddylog::roster::file::FileRoster;
use buddylog::trigger::{TriggerHub, TriggerKind};

/// Buddy presence CSV logging daemon.
#[derive(Parser)]
#[command(name = "buddylogd", about = "Buddy presence CSV logging daemon", version)]
struct Args {
    /// JSON roster file exported by the host application.
    #[arg(short, long)]
    roster: PathBuf,

    /// CSV log file. Default: per-user data directory + buddylog.csv.
    #[arg(short, long)]
    log_file: Option<PathBuf>,

    /// Minimum delay between data rows in seconds (clamped to [10, 10800]).
    #[arg(short, long, default_value_t = DEFAULT_MIN_DELAY_SECS)]
    min_delay: u64,

    /// Trigger mode: dump when the roster file changes, or on a fixed cycle.
    #[arg(short, long, value_enum, default_value_t = TriggerMode::Event)]
    trigger: TriggerMode,

    /// Cycle length for timer mode, in seconds.
    #[arg(short, long, default_value = "60")]
    cycle: u64,

    /// Roster change poll interval for event mode, in milliseconds.
    #[arg(long, default_value = "1000")]
    poll_ms: u64,

    /// Increase logging verbosity (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Initializes the tracing subscriber with the appropriate log level.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("buddylogd={}", level).parse().unwrap())
        .add_directive(format!("buddylog={}", level).parse().unwrap());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    let log_path = args.log_file.clone().or_else(default_log_path);
    if log_path.is_none() {
        warn!("no log file configured and no per-user data directory found; dumps will be skipped");
    }

    let min_delay = clamp_min_delay(args.min_delay);
    if min_delay.as_secs() != args.min_delay {
        warn!(
            "min delay {}s out of range, clamped to {}s",
            args.min_delay,
            min_delay.as_secs()
        );
    }

    info!("buddylogd {} starting", env!("CARGO_PKG_VERSION"));
    info!(
        "Config: roster={}, log={}, min_delay={}s, mode={:?}",
        args.roster.display(),
        log_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<none>".to_string()),
        min_delay.as_secs(),
        args.trigger,
    );

    let config = SharedConfig::new(LogConfig {
        log_path,
        min_delay,
    });

    let roster = FileRoster::new(&args.roster);
    let logger = CsvLogger::new(config, roster.clone());

    let cycle = match args.trigger {
        TriggerMode::Event => None,
        TriggerMode::Timer => Some(Duration::from_secs(args.cycle.max(1))),
    };
    let mut hub = TriggerHub::start(logger, cycle);

    // Setup graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    let poll = Duration::from_millis(args.poll_ms.max(100));
    let handle = hub.handle();
    let mut last_modified = roster.modified();

    while running.load(Ordering::SeqCst) {
        std::thread::sleep(poll);

        // In timer mode the hub's cycle does the sampling; here we only
        // watch for roster changes to fire the event triggers.
        if args.trigger == TriggerMode::Event {
            let modified = roster.modified();
            if modified != last_modified {
                last_modified = modified;
                handle.fire(TriggerKind::StatusChanged);
            }
        }
    }

    hub.stop();
    info!("buddylogd stopped");
}
