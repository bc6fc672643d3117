//! Per-day report orchestration
//!
//! For each reporting day the runner lists the spaces to inspect, fetches
//! their messages concurrently, groups every space on its own, and merges the
//! result into a [`DayReport`]. Days run one after another and any retrieval
//! error aborts the whole run.

use crate::aggregate::{aggregate, DayReport};
use crate::calendar::ReportTimezone;
use crate::error::{ConvoscopeError, Result};
use crate::grouping::{group_with_policy, partition_by_space, SessionPolicy};
use crate::model::{Message, Participant, Space};
use crate::source::{MessageSource, SpaceQuery};
use chrono::NaiveDate;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::HashMap;

/// Which spaces a run covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Every space with activity on the reporting day
    AllSpaces,
    /// One space chosen up front
    Single(Space),
}

/// Drives sources through grouping and aggregation
pub struct Runner<'a> {
    source: &'a dyn MessageSource,
    policy: SessionPolicy,
    timezone: ReportTimezone,
    max_concurrent: usize,
}

impl<'a> Runner<'a> {
    /// Create a runner
    ///
    /// # Arguments
    ///
    /// * `source` - Where spaces and messages come from
    /// * `policy` - Context window and passive filtering
    /// * `timezone` - Timezone defining day boundaries
    /// * `max_concurrent` - Spaces fetched at the same time (at least 1)
    pub fn new(
        source: &'a dyn MessageSource,
        policy: SessionPolicy,
        timezone: ReportTimezone,
        max_concurrent: usize,
    ) -> Self {
        Self {
            source,
            policy,
            timezone,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Build one report per date, in the order given
    ///
    /// # Errors
    ///
    /// Returns the first retrieval error; no partial reports are returned.
    pub async fn run(&self, dates: &[NaiveDate], scope: &Scope) -> Result<Vec<DayReport>> {
        let me = self.source.primary_user().await?;
        tracing::debug!(source = self.source.name(), user = %me.display_name, "Starting run");

        let mut reports = Vec::with_capacity(dates.len());
        for date in dates {
            reports.push(self.run_day(*date, &me, scope).await?);
        }
        Ok(reports)
    }

    /// Build the report for a single date
    pub async fn run_day(
        &self,
        date: NaiveDate,
        primary_user: &Participant,
        scope: &Scope,
    ) -> Result<DayReport> {
        let window = self.timezone.day_window(date)?;
        tracing::info!(%date, start = %window.start, end = %window.end, "Summarizing day");

        let spaces = match scope {
            Scope::AllSpaces => self.source.active_spaces(window.start).await?,
            Scope::Single(space) => vec![space.clone()],
        };

        let window_ref = &window;
        let user_id = primary_user.id.as_str();
        let fetched: Vec<Vec<Message>> = stream::iter(spaces.iter())
            .map(|space| async move {
                let messages = self
                    .source
                    .space_messages(space, window_ref, user_id)
                    .await?;
                tracing::debug!(space = %space.label, count = messages.len(), "Fetched messages");
                Ok::<_, anyhow::Error>(messages)
            })
            .buffer_unordered(self.max_concurrent)
            .try_collect()
            .await?;

        let messages: Vec<Message> = fetched.into_iter().flatten().collect();
        let per_space: HashMap<String, _> = partition_by_space(messages)
            .into_iter()
            .map(|(space_id, messages)| (space_id, group_with_policy(messages, &self.policy)))
            .collect();
        let metadata: HashMap<String, Space> =
            spaces.into_iter().map(|s| (s.id.clone(), s)).collect();

        let report = DayReport::new(date, aggregate(per_space, &metadata));
        tracing::info!(
            %date,
            sessions = report.summary.session_count,
            messages = report.summary.message_count,
            "Day summarized"
        );
        Ok(report)
    }
}

/// Resolve a room query to a space
///
/// # Errors
///
/// Returns [`ConvoscopeError::NotFound`] with a hint when nothing matches.
pub async fn resolve_space(source: &dyn MessageSource, query: &SpaceQuery) -> Result<Space> {
    match source.find_space(query).await? {
        Some(space) => {
            tracing::debug!(space_id = %space.id, "Resolved {}", query);
            Ok(space)
        }
        None => Err(ConvoscopeError::NotFound(format!(
            "No {} found. {}",
            query,
            query.not_found_hint()
        ))
        .into()),
    }
}
