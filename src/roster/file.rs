//! JSON-file-backed roster source for the standalone daemon.
//!
//! The host application (or an export script) maintains a JSON description of
//! the roster; `FileRoster` re-reads it on every snapshot call, so presence
//! changes land in the next dump without any daemon restart. The file's
//! modification time doubles as the daemon's change signal in event mode.

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

use crate::roster::{RosterSnapshot, RosterSource};

/// Error reading or decoding the roster file.
#[derive(Debug)]
pub enum RosterFileError {
    /// I/O error reading the file.
    Io(io::Error),
    /// The file is not valid roster JSON.
    Decode(serde_json::Error),
}

impl std::fmt::Display for RosterFileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RosterFileError::Io(e) => write!(f, "I/O error: {}", e),
            RosterFileError::Decode(e) => write!(f, "decode error: {}", e),
        }
    }
}

impl std::error::Error for RosterFileError {}

impl From<io::Error> for RosterFileError {
    fn from(e: io::Error) -> Self {
        RosterFileError::Io(e)
    }
}

/// Roster source backed by a JSON file.
///
/// The expected shape mirrors [`RosterSnapshot`]:
///
/// ```json
/// {
///   "groups": [
///     {
///       "name": "Friends",
///       "entries": [
///         { "Contact": { "alias": "alice",
///                        "presence": { "online": true,
///                                      "available": true,
///                                      "idle": false } } },
///         "Placeholder"
///       ]
///     }
///   ]
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileRoster {
    path: PathBuf,
}

impl FileRoster {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and decodes the backing file.
    pub fn load(&self) -> Result<RosterSnapshot, RosterFileError> {
        let data = std::fs::read_to_string(&self.path)?;
        serde_json::from_str(&data).map_err(RosterFileError::Decode)
    }

    /// Modification time of the backing file, if it exists.
    ///
    /// Event-mode triggering polls this to detect roster changes.
    pub fn modified(&self) -> Option<SystemTime> {
        std::fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .ok()
    }
}

impl RosterSource for FileRoster {
    fn snapshot(&self) -> Option<RosterSnapshot> {
        match self.load() {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                debug!("roster file unreadable, skipping dump: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::{Presence, PresenceCode, RosterEntry};
    use std::io::Write;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"{
        "groups": [
            {
                "name": "Friends",
                "entries": [
                    { "Contact": { "alias": "alice",
                                   "presence": { "online": true,
                                                 "available": false,
                                                 "idle": true } } },
                    "Placeholder",
                    { "Contact": { "alias": null,
                                   "presence": { "online": false,
                                                 "available": false,
                                                 "idle": false } } }
                ]
            }
        ]
    }"#;

    #[test]
    fn test_load_sample() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roster.json");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(SAMPLE.as_bytes()).unwrap();

        let roster = FileRoster::new(&path);
        let snapshot = roster.snapshot().unwrap();
        assert_eq!(snapshot.groups.len(), 1);
        assert_eq!(snapshot.groups[0].entries.len(), 3);

        match &snapshot.groups[0].entries[0] {
            RosterEntry::Contact { alias, presence } => {
                assert_eq!(alias.as_deref(), Some("alice"));
                assert_eq!(PresenceCode::classify(*presence), PresenceCode::Idle);
            }
            RosterEntry::Placeholder => panic!("expected contact"),
        }
        assert_eq!(snapshot.groups[0].entries[1], RosterEntry::Placeholder);
    }

    #[test]
    fn test_missing_file_yields_no_snapshot() {
        let dir = tempdir().unwrap();
        let roster = FileRoster::new(dir.path().join("absent.json"));
        assert!(roster.snapshot().is_none());
        assert!(roster.modified().is_none());
    }

    #[test]
    fn test_invalid_json_yields_no_snapshot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roster.json");
        std::fs::write(&path, "not json").unwrap();

        let roster = FileRoster::new(&path);
        assert!(roster.snapshot().is_none());
        assert!(roster.modified().is_some());
    }

    #[test]
    fn test_reload_sees_changes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roster.json");
        std::fs::write(&path, SAMPLE).unwrap();

        let roster = FileRoster::new(&path);
        assert!(!roster.snapshot().unwrap().is_empty());

        std::fs::write(&path, r#"{ "groups": [] }"#).unwrap();
        assert!(roster.snapshot().unwrap().is_empty());
    }

    #[test]
    fn test_presence_default_flags() {
        // A contact with no flags set decodes as offline.
        let presence = Presence::default();
        assert_eq!(PresenceCode::classify(presence), PresenceCode::Offline);
    }
}
