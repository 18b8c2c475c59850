//! In-memory mutable roster for tests and host-less environments.
//!
//! `MockRoster` hands out clones of a shared snapshot, so tests can mutate
//! the roster between dumps and observe how rows track (or deliberately do
//! not track) the live state.

use std::sync::{Arc, Mutex};

use crate::roster::{Group, Presence, RosterEntry, RosterSnapshot, RosterSource};

/// Shared, mutable roster source.
///
/// Clones share the same underlying snapshot, so a test can keep one handle
/// to mutate while the logger holds another.
#[derive(Debug, Clone, Default)]
pub struct MockRoster {
    snapshot: Arc<Mutex<RosterSnapshot>>,
}

impl MockRoster {
    /// Creates an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an empty group and returns its index.
    pub fn add_group(&self, name: impl Into<String>) -> usize {
        let mut snapshot = self.snapshot.lock().unwrap();
        snapshot.groups.push(Group {
            name: name.into(),
            entries: Vec::new(),
        });
        snapshot.groups.len() - 1
    }

    /// Appends a contact to the group at `group`.
    pub fn add_contact(&self, group: usize, alias: Option<&str>, presence: Presence) {
        let mut snapshot = self.snapshot.lock().unwrap();
        snapshot.groups[group].entries.push(RosterEntry::Contact {
            alias: alias.map(str::to_string),
            presence,
        });
    }

    /// Appends a non-contact placeholder to the group at `group`.
    pub fn add_placeholder(&self, group: usize) {
        let mut snapshot = self.snapshot.lock().unwrap();
        snapshot.groups[group].entries.push(RosterEntry::Placeholder);
    }

    /// Replaces the presence flags of the `entry`-th entry of `group`.
    ///
    /// Panics if the entry is a placeholder; placeholders carry no presence.
    pub fn set_presence(&self, group: usize, entry: usize, presence: Presence) {
        let mut snapshot = self.snapshot.lock().unwrap();
        match &mut snapshot.groups[group].entries[entry] {
            RosterEntry::Contact { presence: p, .. } => *p = presence,
            RosterEntry::Placeholder => panic!("placeholder entries have no presence"),
        }
    }

    /// Replaces the whole snapshot.
    pub fn replace(&self, snapshot: RosterSnapshot) {
        *self.snapshot.lock().unwrap() = snapshot;
    }

    /// Drops every group, leaving an empty roster.
    pub fn clear(&self) {
        self.snapshot.lock().unwrap().groups.clear();
    }
}

impl RosterSource for MockRoster {
    fn snapshot(&self) -> Option<RosterSnapshot> {
        Some(self.snapshot.lock().unwrap().clone())
    }
}
