//! Roster snapshot model and presence classification.
//!
//! The core never computes presence itself: a [`RosterSource`] hands it an
//! ordered two-level tree (groups containing entries) at the moment of a dump,
//! and each contact entry already carries the raw presence flags of its
//! priority member. Classification collapses those flags to a single ordinal
//! code per contact.

pub mod file;
pub mod mock;

use serde::{Deserialize, Serialize};

/// Raw presence flags for one contact, as reported by the host.
///
/// For a multi-device identity these are the flags of the identity's
/// priority member; other members are not sampled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presence {
    /// Contact is connected at all.
    pub online: bool,
    /// Contact is connected and willing to talk.
    pub available: bool,
    /// Contact has been inactive past the host's idle threshold.
    pub idle: bool,
}

/// Ordinal presence classification written to data rows.
///
/// Exactly one code results from a set of [`Presence`] flags; idle wins over
/// available, which wins over plain online.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresenceCode {
    /// Not connected.
    Offline = 0,
    /// Connected but not marked available (away, busy, invisible).
    Online = 1,
    /// Connected and idle.
    Idle = 2,
    /// Connected and available.
    Available = 3,
}

impl PresenceCode {
    /// Classifies raw presence flags into a single code.
    pub fn classify(presence: Presence) -> Self {
        if presence.idle {
            PresenceCode::Idle
        } else if presence.available {
            PresenceCode::Available
        } else if presence.online {
            PresenceCode::Online
        } else {
            PresenceCode::Offline
        }
    }

    /// The digit written to a CSV data cell.
    pub fn as_digit(self) -> u8 {
        self as u8
    }
}

/// One position under a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RosterEntry {
    /// A contact occupying one CSV column.
    Contact {
        /// Display name used for the header cell. Absent aliases render
        /// as an empty cell.
        alias: Option<String>,
        /// Presence flags of the contact's priority member.
        presence: Presence,
    },
    /// A non-contact node (chat, separator). Rendered as the literal
    /// cell `nc` in both header and data rows.
    Placeholder,
}

/// A named group with its direct children, in display order.
///
/// Only direct children occupy columns; deeper nesting is not traversed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    pub entries: Vec<RosterEntry>,
}

/// The full roster at one instant: groups in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterSnapshot {
    pub groups: Vec<Group>,
}

impl RosterSnapshot {
    /// True when no group contributes any entry.
    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|g| g.entries.is_empty())
    }

    /// Entries in traversal order: groups first-to-last, direct children
    /// first-to-last within each group.
    pub fn entries(&self) -> impl Iterator<Item = &RosterEntry> {
        self.groups.iter().flat_map(|g| g.entries.iter())
    }
}

/// Source of roster snapshots.
///
/// Implementations are queried once per dump, under the write gate's mutex,
/// so a snapshot is consistent with the row built from it. Returning `None`
/// (or an empty snapshot) suppresses the write for that dump.
pub trait RosterSource: Send + Sync {
    fn snapshot(&self) -> Option<RosterSnapshot>;
}
