//! Command-line interface definition for Convoscope
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for daily summaries and single-room reports.

use crate::calendar::TimeFormat;
use crate::source::SpaceQuery;
use clap::{ArgGroup, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Convoscope - reconstruct your conversation sessions for a day
///
/// Groups your Webex messages into conversation sessions per space and
/// reports when each started, ended, and who took part.
#[derive(Parser, Debug, Clone)]
#[command(name = "convoscope")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Convoscope
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Summarize conversation sessions across all active spaces
    Summarize {
        /// Dates, grouping policy, and output options
        #[command(flatten)]
        report: ReportArgs,
    },

    /// Summarize conversation sessions in a single space
    Room {
        /// Which space to report on
        #[command(flatten)]
        target: RoomTarget,

        /// Dates, grouping policy, and output options
        #[command(flatten)]
        report: ReportArgs,
    },
}

impl Commands {
    /// Report options shared by every command, if any
    pub fn report_args(&self) -> Option<&ReportArgs> {
        match self {
            Commands::Summarize { report } | Commands::Room { report, .. } => Some(report),
        }
    }
}

/// Options shared by the reporting commands
#[derive(Args, Debug, Clone, Default)]
pub struct ReportArgs {
    /// Day to summarize (YYYY-MM-DD); defaults to today
    #[arg(short, long, conflicts_with_all = ["start_date", "end_date"])]
    pub date: Option<String>,

    /// First day of a range (YYYY-MM-DD)
    #[arg(long, requires = "end_date")]
    pub start_date: Option<String>,

    /// Last day of a range, inclusive (YYYY-MM-DD)
    #[arg(long, requires = "start_date")]
    pub end_date: Option<String>,

    /// Context window in minutes
    #[arg(short = 'w', long)]
    pub context_window: Option<i64>,

    /// Include sessions where you only received messages
    #[arg(short, long)]
    pub passive: bool,

    /// Time display format (12h or 24h)
    #[arg(long)]
    pub time_format: Option<TimeFormat>,

    /// IANA timezone for day boundaries (defaults to the local timezone)
    #[arg(long)]
    pub timezone: Option<String>,

    /// Read messages from a JSON export instead of the Webex API
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Print reports as JSON
    #[arg(long)]
    pub json: bool,
}

/// Space selector for the `room` command
#[derive(Args, Debug, Clone, Default)]
#[command(group(ArgGroup::new("target").required(true).args(["id", "name", "person"])))]
pub struct RoomTarget {
    /// Exact space id
    #[arg(long)]
    pub id: Option<String>,

    /// Exact space title (case-sensitive)
    #[arg(long)]
    pub name: Option<String>,

    /// Display name of the other person in a direct space
    #[arg(long)]
    pub person: Option<String>,
}

impl RoomTarget {
    /// Convert the selected flag into a space query
    pub fn query(&self) -> Option<SpaceQuery> {
        if let Some(id) = &self.id {
            return Some(SpaceQuery::Id(id.clone()));
        }
        if let Some(name) = &self.name {
            return Some(SpaceQuery::Title(name.clone()));
        }
        self.person.clone().map(SpaceQuery::Person)
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            command: Commands::Summarize {
                report: ReportArgs::default(),
            },
        }
    }
}
