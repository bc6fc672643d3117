/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes two top-level command modules:

- `summarize` - Sessions across every active space
- `room` - Sessions in one space

Both share date resolution, source selection and output handling defined
here.
*/

use crate::aggregate::DayReport;
use crate::calendar::{date_range, parse_date, ReportTimezone};
use crate::cli::ReportArgs;
use crate::config::Config;
use crate::error::Result;
use crate::report::{print_reports, to_json, DisplayOptions};
use crate::runner::{resolve_space, Runner, Scope};
use crate::source::{create_source, SpaceQuery};
use chrono::NaiveDate;

/// Dates requested by the report flags; today when none are given
///
/// # Errors
///
/// Returns an error for malformed dates or an invalid range
pub fn resolve_dates(args: &ReportArgs, timezone: &ReportTimezone) -> Result<Vec<NaiveDate>> {
    if let Some(date) = &args.date {
        return Ok(vec![parse_date(date)?]);
    }
    match (&args.start_date, &args.end_date) {
        (Some(start), Some(end)) => date_range(parse_date(start)?, parse_date(end)?),
        _ => Ok(vec![timezone.today()]),
    }
}

/// Build reports for the requested dates
///
/// With a `query` only the matching space is reported on.
async fn build_reports(
    config: &Config,
    args: &ReportArgs,
    query: Option<&SpaceQuery>,
) -> Result<Vec<DayReport>> {
    let timezone = config.display.report_timezone()?;
    let dates = resolve_dates(args, &timezone)?;
    let source = create_source(&config.webex, args.input.as_deref())?;

    let scope = match query {
        Some(query) => Scope::Single(resolve_space(source.as_ref(), query).await?),
        None => Scope::AllSpaces,
    };

    let runner = Runner::new(
        source.as_ref(),
        config.sessions.policy(),
        timezone,
        config.webex.max_concurrent_requests,
    );
    runner.run(&dates, &scope).await
}

/// Print reports as text or JSON
fn emit(config: &Config, reports: &[DayReport], json: bool) -> Result<()> {
    if json {
        println!("{}", to_json(reports)?);
        return Ok(());
    }
    let display = DisplayOptions {
        timezone: config.display.report_timezone()?,
        time_format: config.display.time_format,
    };
    print_reports(reports, &display);
    Ok(())
}

/// `summarize` command
pub mod summarize {
    use super::*;

    /// Summarize sessions across every space active on the requested days
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `args` - Date, policy and output flags
    pub async fn run_summarize(config: Config, args: ReportArgs) -> Result<()> {
        let reports = build_reports(&config, &args, None).await?;
        emit(&config, &reports, args.json)
    }
}

/// `room` command
pub mod room {
    use super::*;
    use crate::cli::RoomTarget;
    use crate::error::ConvoscopeError;

    /// Summarize sessions in a single space
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `target` - Which space to report on
    /// * `args` - Date, policy and output flags
    ///
    /// # Errors
    ///
    /// Returns `ConvoscopeError::NotFound` when no space matches the target
    pub async fn run_room(config: Config, target: RoomTarget, args: ReportArgs) -> Result<()> {
        let query = target.query().ok_or_else(|| {
            ConvoscopeError::Config("One of --id, --name or --person is required".to_string())
        })?;
        tracing::info!("Reporting on {}", query);
        let reports = build_reports(&config, &args, Some(&query)).await?;
        emit(&config, &reports, args.json)
    }
}
