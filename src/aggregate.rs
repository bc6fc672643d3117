//! Session aggregation across spaces
//!
//! Merges per-space session lists into one chronological report for a
//! reporting day and derives summary totals from it. Each day is aggregated
//! on its own; sessions are never merged across days.

use crate::model::{Session, Space, SpaceKind};
use chrono::{Duration, NaiveDate};
use std::collections::{HashMap, HashSet};

/// A session paired with the space it happened in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    /// Space metadata
    pub space: Space,
    /// The session
    pub session: Session,
}

/// Totals for one kind of space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindTotals {
    /// Number of sessions
    pub sessions: usize,
    /// Number of messages across those sessions
    pub messages: usize,
    /// Sum of session durations
    pub duration: Duration,
}

impl Default for KindTotals {
    fn default() -> Self {
        Self {
            sessions: 0,
            messages: 0,
            duration: Duration::zero(),
        }
    }
}

/// Summary totals for an ordered session list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Number of sessions
    pub session_count: usize,
    /// Distinct people other than the primary user
    pub counterpart_count: usize,
    /// Number of messages across all sessions
    pub message_count: usize,
    /// Sum of session durations
    pub total_duration: Duration,
    /// Totals for direct spaces
    pub direct: KindTotals,
    /// Totals for group spaces
    pub group: KindTotals,
}

impl Default for Summary {
    fn default() -> Self {
        Self {
            session_count: 0,
            counterpart_count: 0,
            message_count: 0,
            total_duration: Duration::zero(),
            direct: KindTotals::default(),
            group: KindTotals::default(),
        }
    }
}

/// Aggregated sessions for one reporting day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayReport {
    /// Calendar date in the report timezone
    pub date: NaiveDate,
    /// Sessions across all spaces, ordered by start time
    pub entries: Vec<ReportEntry>,
    /// Totals over `entries`
    pub summary: Summary,
}

impl DayReport {
    /// Build a report for `date` from aggregated entries
    pub fn new(date: NaiveDate, entries: Vec<ReportEntry>) -> Self {
        let summary = summarize(&entries);
        Self {
            date,
            entries,
            summary,
        }
    }

    /// Report with no activity
    pub fn empty(date: NaiveDate) -> Self {
        Self::new(date, Vec::new())
    }

    /// True when no session survived grouping and filtering
    pub fn has_activity(&self) -> bool {
        !self.entries.is_empty()
    }
}

/// Merge per-space sessions into one list ordered by start time
///
/// Ties on `started_at` are broken by space id. Spaces without metadata are
/// reported as group spaces labelled by their id.
///
/// # Arguments
///
/// * `per_space_sessions` - Sessions keyed by space id
/// * `spaces` - Space metadata keyed by space id
pub fn aggregate(
    per_space_sessions: HashMap<String, Vec<Session>>,
    spaces: &HashMap<String, Space>,
) -> Vec<ReportEntry> {
    let mut entries: Vec<ReportEntry> = Vec::new();

    for (space_id, sessions) in per_space_sessions {
        if sessions.is_empty() {
            continue;
        }
        let space = match spaces.get(&space_id) {
            Some(space) => space.clone(),
            None => {
                tracing::warn!(space_id = %space_id, "No metadata for space, labelling by id");
                Space::new(space_id.clone(), SpaceKind::Group, space_id.clone())
            }
        };
        entries.extend(sessions.into_iter().map(|session| ReportEntry {
            space: space.clone(),
            session,
        }));
    }

    entries.sort_by(|a, b| {
        a.session
            .started_at()
            .cmp(&b.session.started_at())
            .then_with(|| a.space.id.cmp(&b.space.id))
            .then_with(|| a.session.ended_at().cmp(&b.session.ended_at()))
    });
    entries
}

/// Compute totals over an ordered session list
pub fn summarize(entries: &[ReportEntry]) -> Summary {
    let mut summary = Summary::default();
    let mut counterparts: HashSet<&str> = HashSet::new();

    for entry in entries {
        let session = &entry.session;
        let duration = session.duration();

        summary.session_count += 1;
        summary.message_count += session.len();
        summary.total_duration = summary.total_duration + duration;
        counterparts.extend(session.counterparts().map(|p| p.id.as_str()));

        let totals = match entry.space.kind {
            SpaceKind::Direct => &mut summary.direct,
            SpaceKind::Group => &mut summary.group,
        };
        totals.sessions += 1;
        totals.messages += session.len();
        totals.duration = totals.duration + duration;
    }

    summary.counterpart_count = counterparts.len();
    summary
}
