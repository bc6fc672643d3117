//! Session grouping engine
//!
//! Partitions one space's messages into sessions with a sliding gap
//! threshold, then optionally drops sessions in which the primary user never
//! spoke. Windowing always runs over every message in the space; the passive
//! filter only decides which finished sessions are kept.
//!
//! Everything here is pure and synchronous, so grouping independent spaces
//! concurrently needs no coordination.

use crate::model::{Message, Session};
use chrono::Duration;
use std::collections::{BTreeMap, HashMap};

/// Default context window in minutes
pub const DEFAULT_CONTEXT_WINDOW_MINUTES: i64 = 15;

/// Policy parameters for grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    /// Largest gap between consecutive messages that keeps a session open
    pub context_window: Duration,
    /// Keep sessions in which the primary user only received messages
    pub include_passive: bool,
}

impl SessionPolicy {
    /// Create a policy from a window in minutes
    ///
    /// Negative values become zero and values beyond what `Duration` can hold
    /// saturate at `Duration::MAX`.
    pub fn from_minutes(context_window_minutes: i64, include_passive: bool) -> Self {
        let context_window =
            Duration::try_minutes(context_window_minutes.max(0)).unwrap_or(Duration::MAX);
        Self {
            context_window,
            include_passive,
        }
    }
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self::from_minutes(DEFAULT_CONTEXT_WINDOW_MINUTES, false)
    }
}

/// Deduplicate by id (last occurrence wins) and sort by `(sent_at, id)`
///
/// Upstream ordering guarantees are not trusted; `group` calls this on every
/// input.
pub fn normalize(messages: Vec<Message>) -> Vec<Message> {
    let mut slots: HashMap<String, usize> = HashMap::with_capacity(messages.len());
    let mut unique: Vec<Message> = Vec::with_capacity(messages.len());

    for msg in messages {
        match slots.get(&msg.id) {
            Some(&idx) => {
                tracing::debug!(message_id = %msg.id, "Replacing duplicate message id");
                unique[idx] = msg;
            }
            None => {
                slots.insert(msg.id.clone(), unique.len());
                unique.push(msg);
            }
        }
    }

    unique.sort_by(|a, b| a.sent_at.cmp(&b.sent_at).then_with(|| a.id.cmp(&b.id)));
    unique
}

/// Split a mixed batch into per-space sequences keyed by space id
pub fn partition_by_space(messages: Vec<Message>) -> BTreeMap<String, Vec<Message>> {
    let mut by_space: BTreeMap<String, Vec<Message>> = BTreeMap::new();
    for msg in messages {
        by_space.entry(msg.space_id.clone()).or_default().push(msg);
    }
    by_space
}

/// Window one space's messages into sessions
///
/// A gap exactly equal to `context_window` stays inside the session; only a
/// strictly larger gap starts a new one. Messages sharing a timestamp are
/// never split. A negative window behaves like zero.
///
/// # Arguments
///
/// * `messages` - Messages of a single space, in any order
/// * `context_window` - Largest gap that keeps a session open
///
/// # Returns
///
/// Sessions in chronological order, partitioning the normalized input
///
/// # Examples
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use convoscope::grouping::group;
/// use convoscope::model::{Message, Participant};
///
/// let me = Participant::new("me", "Me");
/// let t = |h, m| Utc.with_ymd_and_hms(2025, 8, 6, h, m, 0).unwrap();
/// let messages = vec![
///     Message::new("1", "s", me.clone(), t(9, 0), "", "me"),
///     Message::new("2", "s", me.clone(), t(9, 10), "", "me"),
///     Message::new("3", "s", me, t(9, 30), "", "me"),
/// ];
/// let sessions = group(messages, Duration::minutes(15));
/// assert_eq!(sessions.len(), 2);
/// ```
pub fn group(messages: Vec<Message>, context_window: Duration) -> Vec<Session> {
    let context_window = context_window.max(Duration::zero());
    let messages = normalize(messages);

    let mut sessions = Vec::new();
    let mut current: Vec<Message> = Vec::new();

    for msg in messages {
        if let Some(last) = current.last() {
            let gap = msg.sent_at - last.sent_at;
            if gap > context_window {
                sessions.extend(Session::from_run(std::mem::take(&mut current)));
            }
        }
        current.push(msg);
    }
    sessions.extend(Session::from_run(current));

    sessions
}

/// Drop passive sessions unless `include_passive` is set
///
/// Idempotent, and the identity when `include_passive` is true.
pub fn filter_passive(sessions: Vec<Session>, include_passive: bool) -> Vec<Session> {
    if include_passive {
        return sessions;
    }
    sessions
        .into_iter()
        .filter(Session::has_primary_user_activity)
        .collect()
}

/// Group one space's messages and apply the passive filter
pub fn group_with_policy(messages: Vec<Message>, policy: &SessionPolicy) -> Vec<Session> {
    let sessions = group(messages, policy.context_window);
    let total = sessions.len();
    let kept = filter_passive(sessions, policy.include_passive);

    if kept.len() != total {
        tracing::debug!(
            total,
            kept = kept.len(),
            "Dropped passive sessions from space"
        );
    }
    kept
}
