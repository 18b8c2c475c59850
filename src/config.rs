//! Log path and write-delay configuration.
//!
//! The configuration is owned by the host; the core only reads it. The gate
//! re-reads the path on every acquisition through a [`SharedConfig`] handle,
//! so a path change takes effect on the next dump without restarting anything.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Default minimum delay between data rows, in seconds.
pub const DEFAULT_MIN_DELAY_SECS: u64 = 300;

/// Lower bound for the minimum delay (10 seconds).
pub const MIN_DELAY_FLOOR_SECS: u64 = 10;

/// Upper bound for the minimum delay (3 hours).
pub const MIN_DELAY_CEIL_SECS: u64 = 10_800;

/// File name used under the per-user data directory when no path is given.
pub const DEFAULT_LOG_FILE_NAME: &str = "buddylog.csv";

/// How dumps are triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TriggerMode {
    /// Dump on host events (status/idle/sign-on/sign-off).
    #[default]
    Event,
    /// Dump on a periodic cycle.
    Timer,
}

/// Configuration read by the core on every dump.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Target CSV file. `None` suppresses all writes.
    pub log_path: Option<PathBuf>,
    /// Minimum delay between data rows. Header rows are exempt.
    pub min_delay: Duration,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_path: default_log_path(),
            min_delay: Duration::from_secs(DEFAULT_MIN_DELAY_SECS),
        }
    }
}

/// Per-user default location: data directory + `buddylog.csv`.
///
/// `None` when the platform exposes no data directory; the dump then skips
/// until a path is configured.
pub fn default_log_path() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join(DEFAULT_LOG_FILE_NAME))
}

/// Clamps a requested delay into the valid [10 s, 3 h] range.
pub fn clamp_min_delay(secs: u64) -> Duration {
    Duration::from_secs(secs.clamp(MIN_DELAY_FLOOR_SECS, MIN_DELAY_CEIL_SECS))
}

/// Cloneable handle to the live configuration.
///
/// Readers take the lock briefly per dump; writers (the host's settings
/// surface) may swap the path or delay at any time.
#[derive(Debug, Clone, Default)]
pub struct SharedConfig {
    inner: Arc<RwLock<LogConfig>>,
}

impl SharedConfig {
    pub fn new(config: LogConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Current log path, if one is configured.
    pub fn log_path(&self) -> Option<PathBuf> {
        self.inner.read().ok()?.log_path.clone()
    }

    /// Current minimum delay between data rows.
    pub fn min_delay(&self) -> Duration {
        self.inner
            .read()
            .map(|c| c.min_delay)
            .unwrap_or(Duration::from_secs(DEFAULT_MIN_DELAY_SECS))
    }

    /// Replaces the log path. Takes effect on the next dump.
    pub fn set_log_path(&self, path: Option<PathBuf>) {
        if let Ok(mut config) = self.inner.write() {
            config.log_path = path;
        }
    }

    /// Replaces the minimum delay, clamped to the valid range.
    pub fn set_min_delay_secs(&self, secs: u64) {
        if let Ok(mut config) = self.inner.write() {
            config.min_delay = clamp_min_delay(secs);
        }
    }
}
