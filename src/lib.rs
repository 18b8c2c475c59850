//! buddylog - Buddy presence CSV logging library.
//!
//! Periodically samples the presence of every contact on a roster and appends
//! one row per sample to an append-only CSV file. The column layout is fixed
//! by the header row written on first use; every later row reproduces it.
//!
//! This library provides the core functionality used by:
//! - `buddylogd` - standalone daemon that samples a roster file
//! - host applications embedding [`logger::CsvLogger`] behind their own
//!   event callbacks
//!
//! Modules:
//! - `roster` - snapshot model, presence classification, roster sources
//! - `config` - log path and write-delay configuration
//! - `gate` - mutex-guarded exclusive access to the log file
//! - `logger` - header/data row construction and the `dump()` entry point
//! - `trigger` - event and timer triggers feeding `dump()`

pub mod config;
pub mod gate;
pub mod logger;
pub mod roster;
pub mod trigger;
