//! Header/data row construction and the `dump()` entry point.
//!
//! A dump is fire-and-forget: every trigger calls [`CsvLogger::dump`], which
//! either appends exactly one row or does nothing. Refusals (no path, rate
//! limit, open failure) are traced and swallowed; the trigger source never
//! sees an error.

use chrono::Local;
use tracing::{debug, trace};

use crate::config::SharedConfig;
use crate::gate::{WriteGate, WriteKind};
use crate::roster::{PresenceCode, RosterEntry, RosterSnapshot, RosterSource};

/// Timestamp layout for data-row column 0: local time, second resolution.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Cell written for a non-contact roster position.
const PLACEHOLDER_CELL: &str = "nc";

/// Builds the header row from a snapshot: `Time` plus one cell per entry in
/// traversal order. Contact cells are the alias (empty when absent);
/// placeholder cells are `nc`.
pub fn header_row(snapshot: &RosterSnapshot) -> String {
    let mut cells = vec!["Time".to_string()];
    cells.extend(snapshot.entries().map(|entry| match entry {
        RosterEntry::Contact { alias, .. } => alias.clone().unwrap_or_default(),
        RosterEntry::Placeholder => PLACEHOLDER_CELL.to_string(),
    }));
    cells.join(",")
}

/// Builds a data row: the timestamp plus one presence-code digit (or `nc`)
/// per entry, in the same traversal order as [`header_row`].
pub fn data_row(timestamp: &str, snapshot: &RosterSnapshot) -> String {
    let mut cells = vec![timestamp.to_string()];
    cells.extend(snapshot.entries().map(|entry| match entry {
        RosterEntry::Contact { presence, .. } => {
            PresenceCode::classify(*presence).as_digit().to_string()
        }
        RosterEntry::Placeholder => PLACEHOLDER_CELL.to_string(),
    }));
    cells.join(",")
}

/// Appends presence rows to the configured CSV file.
///
/// The column layout is fixed by the header row written on first use. The
/// logger does not re-derive or validate column identity afterwards: callers
/// must keep the roster's membership and order stable for the lifetime of a
/// log file, or start a new file.
pub struct CsvLogger<S: RosterSource> {
    gate: WriteGate,
    roster: S,
}

impl<S: RosterSource> CsvLogger<S> {
    pub fn new(config: SharedConfig, roster: S) -> Self {
        Self {
            gate: WriteGate::new(config),
            roster,
        }
    }

    /// Handle to the configuration the logger's gate reads.
    pub fn config(&self) -> &SharedConfig {
        self.gate.config()
    }

    /// Samples the roster and appends one row, or does nothing.
    ///
    /// The first successful dump against a fresh file writes the header row;
    /// every later dump writes a data row. Data rows move the gate's
    /// rate-limit clock; header rows do not.
    pub fn dump(&self) {
        let mut ticket = match self.gate.try_acquire() {
            Ok(ticket) => ticket,
            Err(reason) => {
                trace!("dump skipped: {}", reason);
                return;
            }
        };

        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();

        // Ticket drop on these early returns closes the file and releases
        // the gate without writing.
        let snapshot = match self.roster.snapshot() {
            Some(s) if !s.is_empty() => s,
            _ => {
                trace!("dump skipped: roster empty or unavailable");
                return;
            }
        };

        let kind = ticket.kind();
        let row = match kind {
            WriteKind::FirstWrite => header_row(&snapshot),
            WriteKind::Subsequent => data_row(&timestamp, &snapshot),
        };

        match ticket.write_row(&row) {
            Ok(()) => {
                if kind == WriteKind::Subsequent {
                    ticket.mark_written();
                }
                trace!("dump wrote {:?} row, {} columns", kind, snapshot.entries().count() + 1);
            }
            Err(e) => debug!("dump write failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LogConfig, SharedConfig};
    use crate::roster::mock::MockRoster;
    use crate::roster::{Group, Presence, RosterSnapshot};
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::tempdir;

    fn config_for(path: &Path, min_delay: Duration) -> SharedConfig {
        SharedConfig::new(LogConfig {
            log_path: Some(path.to_path_buf()),
            min_delay,
        })
    }

    /// Roster with contacts alice (available), a placeholder, and bob
    /// (offline), all in one group.
    fn sample_roster() -> MockRoster {
        let roster = MockRoster::new();
        let group = roster.add_group("Friends");
        roster.add_contact(
            group,
            Some("alice"),
            Presence {
                online: true,
                available: true,
                idle: false,
            },
        );
        roster.add_placeholder(group);
        roster.add_contact(group, Some("bob"), Presence::default());
        roster
    }

    fn read_lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_header_row_cells() {
        let roster = sample_roster();
        let snapshot = roster.snapshot().unwrap();
        assert_eq!(header_row(&snapshot), "Time,alice,nc,bob");
    }

    #[test]
    fn test_header_row_missing_alias_is_empty_cell() {
        let roster = MockRoster::new();
        let group = roster.add_group("Friends");
        roster.add_contact(group, Some("alice"), Presence::default());
        roster.add_contact(group, None, Presence::default());
        roster.add_contact(group, Some("carol"), Presence::default());

        let snapshot = roster.snapshot().unwrap();
        assert_eq!(header_row(&snapshot), "Time,alice,,carol");
    }

    #[test]
    fn test_data_row_cells() {
        let roster = sample_roster();
        let snapshot = roster.snapshot().unwrap();
        assert_eq!(
            data_row("2026-01-01T00:00:00", &snapshot),
            "2026-01-01T00:00:00,3,nc,0"
        );
    }

    #[test]
    fn test_rows_flatten_across_groups() {
        let snapshot = RosterSnapshot {
            groups: vec![
                Group {
                    name: "A".to_string(),
                    entries: vec![crate::roster::RosterEntry::Contact {
                        alias: Some("alice".to_string()),
                        presence: Presence::default(),
                    }],
                },
                Group {
                    name: "Empty".to_string(),
                    entries: Vec::new(),
                },
                Group {
                    name: "B".to_string(),
                    entries: vec![crate::roster::RosterEntry::Contact {
                        alias: Some("bob".to_string()),
                        presence: Presence::default(),
                    }],
                },
            ],
        };

        // Empty groups contribute no cells and no stray separators.
        assert_eq!(header_row(&snapshot), "Time,alice,bob");
        assert_eq!(data_row("t", &snapshot), "t,0,0");
    }

    #[test]
    fn test_header_written_exactly_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("buddylog.csv");
        let logger = CsvLogger::new(config_for(&path, Duration::ZERO), sample_roster());

        for _ in 0..5 {
            logger.dump();
        }

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "Time,alice,nc,bob");
        for line in &lines[1..] {
            assert!(!line.starts_with("Time"), "duplicate header: {}", line);
        }
    }

    #[test]
    fn test_rate_limit_suppresses_then_allows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("buddylog.csv");
        let logger = CsvLogger::new(
            config_for(&path, Duration::from_millis(80)),
            sample_roster(),
        );

        logger.dump(); // header
        logger.dump(); // first data row
        logger.dump(); // inside the window, suppressed
        assert_eq!(read_lines(&path).len(), 2);

        std::thread::sleep(Duration::from_millis(100));
        logger.dump();
        assert_eq!(read_lines(&path).len(), 3);
    }

    #[test]
    fn test_column_stability_with_stable_roster() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("buddylog.csv");
        let roster = sample_roster();
        let logger = CsvLogger::new(config_for(&path, Duration::ZERO), roster.clone());

        logger.dump();
        roster.set_presence(
            0,
            0,
            Presence {
                online: true,
                available: true,
                idle: true,
            },
        );
        logger.dump();
        logger.dump();

        // Header fixed 4 columns; every data row has 4 cells with "nc"
        // pinned at the placeholder's position.
        for line in read_lines(&path) {
            let cells: Vec<_> = line.split(',').collect();
            assert_eq!(cells.len(), 4);
            assert_eq!(cells[2], "nc");
        }
    }

    #[test]
    fn test_idle_beats_available_in_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("buddylog.csv");
        let roster = MockRoster::new();
        let group = roster.add_group("Friends");
        roster.add_contact(
            group,
            Some("alice"),
            Presence {
                online: true,
                available: true,
                idle: true,
            },
        );
        let logger = CsvLogger::new(config_for(&path, Duration::ZERO), roster);

        logger.dump();
        logger.dump();

        let lines = read_lines(&path);
        assert!(lines[1].ends_with(",2"), "expected idle code: {}", lines[1]);
    }

    #[test]
    fn test_no_path_never_creates_file() {
        let dir = tempdir().unwrap();
        let config = SharedConfig::new(LogConfig {
            log_path: None,
            min_delay: Duration::ZERO,
        });
        let logger = CsvLogger::new(config, sample_roster());

        for _ in 0..10 {
            logger.dump();
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_empty_roster_writes_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("buddylog.csv");
        let logger = CsvLogger::new(config_for(&path, Duration::ZERO), MockRoster::new());

        logger.dump();
        logger.dump();

        // The gate creates the file on first acquisition, but no rows land.
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_timestamp_format_shape() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("buddylog.csv");
        let logger = CsvLogger::new(config_for(&path, Duration::ZERO), sample_roster());

        logger.dump();
        logger.dump();

        let lines = read_lines(&path);
        let ts = lines[1].split(',').next().unwrap();
        // YYYY-MM-DDTHH:MM:SS
        assert_eq!(ts.len(), 19);
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], "T");
        assert_eq!(&ts[13..14], ":");
    }

    #[test]
    fn test_concurrent_dumps_serialize() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("buddylog.csv");
        let logger = Arc::new(CsvLogger::new(
            config_for(&path, Duration::ZERO),
            sample_roster(),
        ));

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let logger = Arc::clone(&logger);
                std::thread::spawn(move || logger.dump())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        // One header plus 49 data rows, every row whole and well-formed.
        let lines = read_lines(&path);
        assert_eq!(lines.len(), 50);
        assert_eq!(lines[0], "Time,alice,nc,bob");
        for line in &lines[1..] {
            let cells: Vec<_> = line.split(',').collect();
            assert_eq!(cells.len(), 4, "torn row: {}", line);
            assert_eq!(cells[1], "3");
            assert_eq!(cells[2], "nc");
            assert_eq!(cells[3], "0");
        }
    }
}
