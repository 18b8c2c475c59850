//! Mutex-guarded exclusive access to the log file.
//!
//! The gate owns the only synchronization primitive in the crate. Everything
//! a dump does between acquisition and release (roster read, row building,
//! the append itself) runs under its mutex, so rows are never interleaved and
//! at most one dump is inside the gate process-wide.
//!
//! Acquisition yields a [`WriteTicket`] guard that owns the open file handle
//! and the lock. Dropping the ticket closes the file and releases the mutex
//! on every exit path, so release cannot be forgotten or double-run.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use tracing::trace;

use crate::config::SharedConfig;

/// Whether this acquisition is the first write to the target file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    /// The target file did not exist; the caller must emit the header row.
    FirstWrite,
    /// The target file existed; the caller emits a data row.
    Subsequent,
}

/// Why an acquisition was refused.
///
/// All variants are non-fatal and externally identical: the dump becomes a
/// no-op. Nothing propagates to the trigger source.
#[derive(Debug)]
pub enum SkipReason {
    /// No log path is configured.
    ConfigMissing,
    /// Gate state is unusable (a previous holder panicked mid-write).
    AlreadyInProgress,
    /// The log file could not be opened for append.
    FileOpenFailed(io::Error),
    /// A data row was written less than the minimum delay ago.
    RateLimited,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::ConfigMissing => write!(f, "no log path configured"),
            SkipReason::AlreadyInProgress => write!(f, "write gate unusable"),
            SkipReason::FileOpenFailed(e) => write!(f, "log file open failed: {}", e),
            SkipReason::RateLimited => write!(f, "within minimum write delay"),
        }
    }
}

impl std::error::Error for SkipReason {}

#[derive(Debug, Default)]
struct GateState {
    /// Completion time of the last successful data row. Header rows and
    /// refused acquisitions never touch this.
    last_write: Option<Instant>,
}

/// Process-wide write gate: one mutex, one last-write clock.
///
/// The configured path is re-read on every acquisition, so a path change
/// takes effect on the next dump.
#[derive(Debug)]
pub struct WriteGate {
    config: SharedConfig,
    state: Mutex<GateState>,
}

impl WriteGate {
    pub fn new(config: SharedConfig) -> Self {
        Self {
            config,
            state: Mutex::new(GateState::default()),
        }
    }

    /// Handle to the configuration this gate reads.
    pub fn config(&self) -> &SharedConfig {
        &self.config
    }

    /// Attempts to acquire the gate for one write.
    ///
    /// Blocks on the mutex while another dump is inside the gate. Once the
    /// lock is held:
    ///
    /// - no configured path refuses with [`SkipReason::ConfigMissing`];
    /// - the file is opened create-new first, so existence detection and the
    ///   append open are a single atomic decision: creation means
    ///   [`WriteKind::FirstWrite`], an existing file is reopened for append
    ///   as [`WriteKind::Subsequent`];
    /// - a subsequent write inside the minimum delay refuses with
    ///   [`SkipReason::RateLimited`]. A first write always proceeds: a brand
    ///   new file gets its header immediately.
    ///
    /// On refusal the lock (and any opened handle) is released before
    /// returning.
    pub fn try_acquire(&self) -> Result<WriteTicket<'_>, SkipReason> {
        let state = self
            .state
            .lock()
            .map_err(|_| SkipReason::AlreadyInProgress)?;

        let path = self.config.log_path().ok_or(SkipReason::ConfigMissing)?;

        let (file, kind) = match OpenOptions::new()
            .append(true)
            .create_new(true)
            .open(&path)
        {
            Ok(file) => (file, WriteKind::FirstWrite),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                let file = OpenOptions::new()
                    .append(true)
                    .open(&path)
                    .map_err(SkipReason::FileOpenFailed)?;
                (file, WriteKind::Subsequent)
            }
            Err(e) => return Err(SkipReason::FileOpenFailed(e)),
        };

        if kind == WriteKind::Subsequent {
            if let Some(last) = state.last_write {
                if last.elapsed() < self.config.min_delay() {
                    return Err(SkipReason::RateLimited);
                }
            }
        }

        trace!("write gate acquired ({:?})", kind);
        Ok(WriteTicket { state, file, kind })
    }
}

/// Guard for one write: holds the gate's mutex and the open file handle.
///
/// Dropping the ticket closes the file and unlocks the gate unconditionally.
pub struct WriteTicket<'a> {
    state: MutexGuard<'a, GateState>,
    file: File,
    kind: WriteKind,
}

impl WriteTicket<'_> {
    pub fn kind(&self) -> WriteKind {
        self.kind
    }

    /// Appends one row and a terminating newline, flushed before return.
    pub fn write_row(&mut self, row: &str) -> io::Result<()> {
        self.file.write_all(row.as_bytes())?;
        self.file.write_all(b"\n")?;
        self.file.flush()
    }

    /// Records the current instant as the last data-row write time.
    ///
    /// Called only after a successful data row; header rows are exempt from
    /// rate limiting and must not move the clock.
    pub fn mark_written(&mut self) {
        self.state.last_write = Some(Instant::now());
    }
}
