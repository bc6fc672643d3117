//! Rendering of day reports
//!
//! Text output shows one panel and message table per session followed by an
//! overview table and summary statistics. JSON output carries the same data
//! with ISO timestamps for scripting.

use crate::aggregate::{DayReport, KindTotals, ReportEntry, Summary};
use crate::calendar::{ReportTimezone, TimeFormat};
use crate::error::{ConvoscopeError, Result};
use crate::model::SpaceKind;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use colored::Colorize;
use prettytable::{format, row, Table};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// Display settings for text output
#[derive(Debug, Clone, Copy)]
pub struct DisplayOptions {
    /// Timezone for displayed instants
    pub timezone: ReportTimezone,
    /// 12 or 24 hour clock
    pub time_format: TimeFormat,
}

impl DisplayOptions {
    fn time(&self, instant: DateTime<Utc>) -> String {
        self.timezone.format(instant, self.time_format)
    }
}

/// Lowercase, hyphen separated form of `value` for use in ids
pub fn slugify(value: &str) -> String {
    static NON_ALNUM: OnceLock<Regex> = OnceLock::new();
    let re = NON_ALNUM.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("slug pattern is valid"));
    re.replace_all(&value.to_lowercase(), "-")
        .trim_matches('-')
        .to_string()
}

/// Identifier of the `index`-th (1-based) session of a report
///
/// Direct sessions are named after the counterpart, group sessions after the
/// space title.
pub fn session_id(entry: &ReportEntry, index: usize) -> String {
    let name = match entry.space.kind {
        SpaceKind::Direct => entry
            .session
            .counterparts()
            .next()
            .map(|p| p.display_name.as_str())
            .unwrap_or(entry.space.label.as_str()),
        SpaceKind::Group => entry.space.label.as_str(),
    };
    let slug = match slugify(name) {
        s if s.is_empty() => "unknown".to_string(),
        s => s,
    };
    format!("{}-{}-{}", entry.space.kind.as_str(), slug, index)
}

/// Precise human readable duration, e.g. `1 hour, 5 minutes and 3 seconds`
///
/// # Examples
///
/// ```
/// use chrono::Duration;
/// use convoscope::report::format_duration;
///
/// assert_eq!(format_duration(Duration::seconds(3903)), "1 hour, 5 minutes and 3 seconds");
/// assert_eq!(format_duration(Duration::zero()), "0 seconds");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total = duration.num_seconds().max(0);
    let units = [
        (total / 86_400, "day"),
        (total % 86_400 / 3_600, "hour"),
        (total % 3_600 / 60, "minute"),
        (total % 60, "second"),
    ];

    let parts: Vec<String> = units
        .iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, unit)| {
            if *n == 1 {
                format!("{} {}", n, unit)
            } else {
                format!("{} {}s", n, unit)
            }
        })
        .collect();

    match parts.as_slice() {
        [] => "0 seconds".to_string(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

/// Boxed header separating days of a range run
pub fn render_date_header(date: NaiveDate) -> String {
    let text = format!(" {} - Sessions ", date.format("%Y-%m-%d"));
    let width = 60.max(text.chars().count() + 8);
    let inner = width - 2;
    let top = format!("╔{}╗", "═".repeat(inner));
    let mid = format!("║{:^inner$}║", text, inner = inner);
    let bot = format!("╚{}╝", "═".repeat(inner));
    format!(
        "\n{}\n{}\n{}",
        top.blue().bold(),
        mid.white().bold(),
        bot.blue().bold()
    )
}

/// Panel and message table for one session
pub fn render_session(entry: &ReportEntry, index: usize, display: &DisplayOptions) -> String {
    let session = &entry.session;
    let participants = session
        .participants()
        .iter()
        .map(|p| p.display_name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let activity = if session.has_primary_user_activity() {
        "Active".green()
    } else {
        "Passive".yellow()
    };

    let header = format!(
        "{} | {} | {} {} | {} {} | {} {} | {} {} | {}",
        format!("Session {}", session_id(entry, index)).bold(),
        format!("{} messages", session.len()).cyan(),
        "Space:".magenta(),
        entry.space.label,
        "Participants:".magenta(),
        participants,
        "Start:".green(),
        display.time(session.started_at()),
        "Duration:".yellow(),
        format_duration(session.duration()),
        activity
    );

    let mut panel = Table::new();
    panel.set_format(*format::consts::FORMAT_BOX_CHARS);
    panel.add_row(row![header]);

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
    table.set_titles(row!["Date & Time".bold(), "Sender".bold(), "Message".bold()]);
    for msg in session.messages() {
        table.add_row(row![
            display.time(msg.sent_at).cyan(),
            msg.sender.display_name.green(),
            msg.text
        ]);
    }

    format!("{}{}", panel, table)
}

/// Overview table listing every session of a report
pub fn render_overview(report: &DayReport, display: &DisplayOptions) -> String {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.set_titles(row![
        "Session ID".bold(),
        "Space".bold(),
        "Participants".bold(),
        "Start".bold(),
        "End".bold(),
        "Duration".bold()
    ]);

    for (i, entry) in report.entries.iter().enumerate() {
        let participants = entry
            .session
            .participants()
            .iter()
            .map(|p| p.display_name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(row![
            session_id(entry, i + 1).blue(),
            entry.space.label,
            participants,
            display.time(entry.session.started_at()),
            display.time(entry.session.ended_at()),
            format_duration(entry.session.duration())
        ]);
    }

    table.to_string()
}

fn render_kind(label: &str, totals: &KindTotals) -> String {
    format!(
        "  {}: {} sessions, {} messages, {}",
        label,
        totals.sessions,
        totals.messages,
        format_duration(totals.duration).yellow()
    )
}

/// Summary statistics block
pub fn render_summary(summary: &Summary) -> String {
    [
        "Summary Statistics:".bold().to_string(),
        format!("Total sessions: {}", summary.session_count.to_string().green().bold()),
        format!("People interacted with: {}", summary.counterpart_count.to_string().green()),
        format!("Total messages: {}", summary.message_count),
        format!(
            "Total session time: {}",
            format_duration(summary.total_duration).yellow().bold()
        ),
        render_kind("Direct", &summary.direct),
        render_kind("Group", &summary.group),
    ]
    .join("\n")
}

/// Full text rendering of one day
pub fn render_day(report: &DayReport, display: &DisplayOptions) -> String {
    if !report.has_activity() {
        return format!("{}\n", "No activity found for this date.".yellow());
    }

    let mut out = String::new();
    for (i, entry) in report.entries.iter().enumerate() {
        out.push_str(&render_session(entry, i + 1, display));
        out.push('\n');
    }
    out.push_str(&format!("{}\n", "=".repeat(80)));
    out.push_str(&format!("{}\n", "Daily Session Summary".cyan().bold()));
    out.push_str(&format!("{}\n", "=".repeat(80)));
    out.push_str(&render_overview(report, display));
    out.push('\n');
    out.push_str(&render_summary(&report.summary));
    out.push('\n');
    out
}

/// Print reports as text; range runs get a header per day
pub fn print_reports(reports: &[DayReport], display: &DisplayOptions) {
    let with_headers = reports.len() > 1;
    for report in reports {
        if with_headers {
            println!("{}", render_date_header(report.date));
        }
        println!("{}", render_day(report, display));
    }
}

/// One message row in JSON output
#[derive(Debug, Serialize)]
pub struct JsonMessage {
    /// Message id
    pub id: String,
    /// Sender id
    pub sender_id: String,
    /// Sender display name
    pub sender: String,
    /// When the message was sent
    pub sent_at: DateTime<Utc>,
    /// Message text, possibly empty
    pub text: String,
    /// Whether the primary user sent it
    pub from_primary_user: bool,
}

/// One session in JSON output
#[derive(Debug, Serialize)]
pub struct JsonSession {
    /// Session id such as `dm-bob-1`, numbered across the day
    pub id: String,
    /// Id of the space the session happened in
    pub space_id: String,
    /// Space label
    pub space: String,
    /// Direct or group
    pub kind: SpaceKind,
    /// First message time
    pub started_at: DateTime<Utc>,
    /// Last message time
    pub ended_at: DateTime<Utc>,
    /// `ended_at - started_at` in whole seconds
    pub duration_seconds: i64,
    /// Whether the primary user sent at least one message
    pub active: bool,
    /// Distinct sender names in order of first appearance
    pub participants: Vec<String>,
    /// Messages in chronological order
    pub messages: Vec<JsonMessage>,
}

/// Totals for one kind of space in JSON output
#[derive(Debug, Serialize)]
pub struct JsonKindTotals {
    /// Number of sessions
    pub sessions: usize,
    /// Messages across those sessions
    pub messages: usize,
    /// Summed session durations in seconds
    pub duration_seconds: i64,
}

impl From<&KindTotals> for JsonKindTotals {
    fn from(totals: &KindTotals) -> Self {
        Self {
            sessions: totals.sessions,
            messages: totals.messages,
            duration_seconds: totals.duration.num_seconds(),
        }
    }
}

/// Summary in JSON output
#[derive(Debug, Serialize)]
pub struct JsonSummary {
    /// Sessions reported for the day
    pub session_count: usize,
    /// Distinct people the primary user talked with
    pub counterpart_count: usize,
    /// Messages across all sessions
    pub message_count: usize,
    /// Summed session durations in seconds
    pub total_duration_seconds: i64,
    /// Totals for direct spaces
    pub direct: JsonKindTotals,
    /// Totals for group spaces
    pub group: JsonKindTotals,
}

/// One day in JSON output
#[derive(Debug, Serialize)]
pub struct JsonDayReport {
    /// Reporting day
    pub date: NaiveDate,
    /// Sessions in chronological order
    pub sessions: Vec<JsonSession>,
    /// Totals for the day
    pub summary: JsonSummary,
}

impl From<&DayReport> for JsonDayReport {
    fn from(report: &DayReport) -> Self {
        let sessions = report
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let session = &entry.session;
                JsonSession {
                    id: session_id(entry, i + 1),
                    space_id: entry.space.id.clone(),
                    space: entry.space.label.clone(),
                    kind: entry.space.kind,
                    started_at: session.started_at(),
                    ended_at: session.ended_at(),
                    duration_seconds: session.duration().num_seconds(),
                    active: session.has_primary_user_activity(),
                    participants: session
                        .participants()
                        .iter()
                        .map(|p| p.display_name.clone())
                        .collect(),
                    messages: session
                        .messages()
                        .iter()
                        .map(|m| JsonMessage {
                            id: m.id.clone(),
                            sender_id: m.sender.id.clone(),
                            sender: m.sender.display_name.clone(),
                            sent_at: m.sent_at,
                            text: m.text.clone(),
                            from_primary_user: m.is_primary_user,
                        })
                        .collect(),
                }
            })
            .collect();

        let summary = &report.summary;
        Self {
            date: report.date,
            sessions,
            summary: JsonSummary {
                session_count: summary.session_count,
                counterpart_count: summary.counterpart_count,
                message_count: summary.message_count,
                total_duration_seconds: summary.total_duration.num_seconds(),
                direct: (&summary.direct).into(),
                group: (&summary.group).into(),
            },
        }
    }
}

/// Serialize reports as a pretty JSON array
///
/// # Errors
///
/// Returns `ConvoscopeError::Serialization` if serialization fails
pub fn to_json(reports: &[DayReport]) -> Result<String> {
    let days: Vec<JsonDayReport> = reports.iter().map(JsonDayReport::from).collect();
    serde_json::to_string_pretty(&days).map_err(|e| ConvoscopeError::Serialization(e).into())
}
