//! Convoscope - conversation session reconstruction library
//!
//! Reconstructs conversation sessions from a messaging history: bursts of
//! messages in one space separated by at most a context window, reported per
//! calendar day.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `model`: Messages, participants, spaces and sessions
//! - `grouping`: Splitting one space's messages into sessions
//! - `aggregate`: Merging sessions across spaces and summarizing them
//! - `calendar`: Day windows, date ranges and time formatting
//! - `source`: Message source abstraction with Webex and JSON export backends
//! - `runner`: Per-day fetch, group and aggregate pipeline
//! - `report`: Text and JSON rendering
//! - `config`, `cli`, `logging`, `error`: Application plumbing
//!
//! # Example
//!
//! ```
//! use chrono::{Duration, TimeZone, Utc};
//! use convoscope::grouping::group;
//! use convoscope::model::{Message, Participant};
//!
//! let me = Participant::new("me", "Me");
//! let t = |m| Utc.with_ymd_and_hms(2025, 8, 6, 9, m, 0).unwrap();
//! let messages = vec![
//!     Message::new("1", "space", me.clone(), t(0), "hi", "me"),
//!     Message::new("2", "space", me.clone(), t(20), "again", "me"),
//! ];
//! let sessions = group(messages, Duration::minutes(15));
//! assert_eq!(sessions.len(), 2);
//! ```

pub mod aggregate;
pub mod calendar;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod grouping;
pub mod logging;
pub mod model;
pub mod report;
pub mod runner;
pub mod source;

// Re-export commonly used types
pub use aggregate::{DayReport, ReportEntry, Summary};
pub use config::Config;
pub use error::{ConvoscopeError, Result};
pub use grouping::{group, group_with_policy, SessionPolicy};
pub use model::{Message, Participant, Session, Space, SpaceKind};
pub use source::{MessageSource, SpaceQuery};

#[cfg(test)]
pub mod test_utils;
