//! Reporting days, date ranges, and time formatting
//!
//! Day boundaries are local midnight to local midnight in the report
//! timezone, converted to UTC instants before any message is compared
//! against them.

use crate::error::{ConvoscopeError, Result};
use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Longest date range accepted for a single run
pub const MAX_RANGE_DAYS: i64 = 366;

/// Timezone used for day boundaries and displayed times
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportTimezone {
    /// The host's local timezone
    Local,
    /// A named IANA timezone
    Named(Tz),
}

impl ReportTimezone {
    /// Resolve an optional IANA name; `None` selects the host timezone
    ///
    /// # Errors
    ///
    /// Returns a config error if the name is not a known IANA zone
    pub fn from_name(name: Option<&str>) -> Result<Self> {
        match name {
            None => Ok(ReportTimezone::Local),
            Some(name) => name.parse::<Tz>().map(ReportTimezone::Named).map_err(|e| {
                ConvoscopeError::Config(format!("Unknown timezone '{}': {}", name, e)).into()
            }),
        }
    }

    /// Today's date in this timezone
    pub fn today(&self) -> NaiveDate {
        let now = Utc::now();
        match self {
            ReportTimezone::Local => now.with_timezone(&chrono::Local).date_naive(),
            ReportTimezone::Named(tz) => now.with_timezone(tz).date_naive(),
        }
    }

    /// Window covering `date` from local midnight to the next local midnight
    pub fn day_window(&self, date: NaiveDate) -> Result<DayWindow> {
        let next = date
            .succ_opt()
            .ok_or_else(|| ConvoscopeError::InvalidDate(format!("{} has no next day", date)))?;
        Ok(DayWindow {
            date,
            start: self.midnight(date)?,
            end: self.midnight(next)?,
        })
    }

    fn midnight(&self, date: NaiveDate) -> Result<DateTime<Utc>> {
        let naive = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| ConvoscopeError::InvalidDate(date.to_string()))?;
        match self {
            ReportTimezone::Local => first_valid_instant(&chrono::Local, naive),
            ReportTimezone::Named(tz) => first_valid_instant(tz, naive),
        }
    }

    /// Format an instant in this timezone
    pub fn format(&self, instant: DateTime<Utc>, format: TimeFormat) -> String {
        let pattern = format.datetime_pattern();
        match self {
            ReportTimezone::Local => instant.with_timezone(&chrono::Local).format(pattern).to_string(),
            ReportTimezone::Named(tz) => instant.with_timezone(tz).format(pattern).to_string(),
        }
    }
}

/// Earliest valid instant at or after a local wall-clock time.
///
/// DST gaps at midnight are skipped forward in 15 minute steps.
fn first_valid_instant<Z: TimeZone>(zone: &Z, naive: NaiveDateTime) -> Result<DateTime<Utc>> {
    let mut candidate = naive;
    for _ in 0..16 {
        match zone.from_local_datetime(&candidate) {
            LocalResult::Single(dt) => return Ok(dt.with_timezone(&Utc)),
            LocalResult::Ambiguous(earliest, _) => return Ok(earliest.with_timezone(&Utc)),
            LocalResult::None => candidate += Duration::minutes(15),
        }
    }
    Err(ConvoscopeError::InvalidDate(format!("No valid local time near {}", naive)).into())
}

/// One reporting day as a half-open UTC interval `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayWindow {
    /// Calendar date in the report timezone
    pub date: NaiveDate,
    /// Local midnight as a UTC instant
    pub start: DateTime<Utc>,
    /// Next local midnight as a UTC instant
    pub end: DateTime<Utc>,
}

impl DayWindow {
    /// Whether `instant` falls inside the window
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        ConvoscopeError::InvalidDate(format!("'{}' (expected YYYY-MM-DD)", value)).into()
    })
}

/// Every date from `start` to `end`, inclusive
///
/// # Errors
///
/// Returns an error if `end` precedes `start` or the range exceeds
/// [`MAX_RANGE_DAYS`].
pub fn date_range(start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>> {
    if end < start {
        return Err(ConvoscopeError::InvalidDate(format!(
            "end date {} is before start date {}",
            end, start
        ))
        .into());
    }
    let days = (end - start).num_days() + 1;
    if days > MAX_RANGE_DAYS {
        return Err(ConvoscopeError::InvalidDate(format!(
            "range of {} days exceeds the maximum of {}",
            days, MAX_RANGE_DAYS
        ))
        .into());
    }
    Ok(start.iter_days().take(days as usize).collect())
}

/// Clock style for displayed times
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TimeFormat {
    /// `03:04:05 PM`
    #[default]
    #[serde(rename = "12h")]
    H12,
    /// `15:04:05`
    #[serde(rename = "24h")]
    H24,
}

impl TimeFormat {
    /// strftime pattern with date and time
    pub fn datetime_pattern(&self) -> &'static str {
        match self {
            TimeFormat::H12 => "%Y-%m-%d %I:%M:%S %p",
            TimeFormat::H24 => "%Y-%m-%d %H:%M:%S",
        }
    }
}

impl std::str::FromStr for TimeFormat {
    type Err = ConvoscopeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "12h" => Ok(TimeFormat::H12),
            "24h" => Ok(TimeFormat::H24),
            other => Err(ConvoscopeError::Config(format!(
                "Invalid time format: {} (expected 12h or 24h)",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::assert_error_contains;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_day_window_in_named_zone() {
        let tz = ReportTimezone::from_name(Some("America/New_York")).unwrap();
        let window = tz.day_window(date(2025, 8, 6)).unwrap();

        assert_eq!(window.start, Utc.with_ymd_and_hms(2025, 8, 6, 4, 0, 0).unwrap());
        assert_eq!(window.end, Utc.with_ymd_and_hms(2025, 8, 7, 4, 0, 0).unwrap());
    }

    #[test]
    fn test_day_window_across_dst_change_is_23_hours() {
        let tz = ReportTimezone::from_name(Some("Europe/Berlin")).unwrap();
        let window = tz.day_window(date(2025, 3, 30)).unwrap();
        assert_eq!(window.end - window.start, Duration::hours(23));
    }

    #[test]
    fn test_midnight_inside_dst_gap_moves_forward() {
        // Santiago springs forward at local midnight.
        let tz = ReportTimezone::from_name(Some("America/Santiago")).unwrap();
        let window = tz.day_window(date(2024, 9, 8)).unwrap();
        assert_eq!(window.start, Utc.with_ymd_and_hms(2024, 9, 8, 4, 0, 0).unwrap());
    }

    #[test]
    fn test_day_window_contains_is_half_open() {
        let tz = ReportTimezone::from_name(Some("UTC")).unwrap();
        let window = tz.day_window(date(2025, 8, 6)).unwrap();

        assert!(window.contains(window.start));
        assert!(window.contains(window.end - Duration::seconds(1)));
        assert!(!window.contains(window.end));
    }

    #[test]
    fn test_unknown_timezone_is_config_error() {
        let err = ReportTimezone::from_name(Some("Mars/Olympus")).unwrap_err();
        assert!(err.to_string().contains("Unknown timezone"));
        assert_eq!(ReportTimezone::from_name(None).unwrap(), ReportTimezone::Local);
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2025-08-06").unwrap(), date(2025, 8, 6));
        assert!(parse_date("08/06/2025").is_err());
        assert!(parse_date("2025-02-30").is_err());
    }

    #[test]
    fn test_date_range_inclusive() {
        let range = date_range(date(2025, 8, 30), date(2025, 9, 2)).unwrap();
        assert_eq!(
            range,
            vec![date(2025, 8, 30), date(2025, 8, 31), date(2025, 9, 1), date(2025, 9, 2)]
        );
        assert_eq!(date_range(date(2025, 8, 6), date(2025, 8, 6)).unwrap().len(), 1);
    }

    #[test]
    fn test_date_range_rejects_reversed_and_oversized() {
        assert!(date_range(date(2025, 8, 6), date(2025, 8, 5)).is_err());
        assert!(date_range(date(2024, 1, 1), date(2025, 12, 31)).is_err());
    }

    #[test]
    fn test_format_in_both_clocks() {
        let tz = ReportTimezone::from_name(Some("UTC")).unwrap();
        let instant = Utc.with_ymd_and_hms(2025, 8, 6, 15, 4, 5).unwrap();

        assert_eq!(tz.format(instant, TimeFormat::H24), "2025-08-06 15:04:05");
        assert_eq!(tz.format(instant, TimeFormat::H12), "2025-08-06 03:04:05 PM");
    }

    #[test]
    fn test_time_format_parse_and_serde() {
        assert_eq!("24h".parse::<TimeFormat>().unwrap(), TimeFormat::H24);
        assert_eq!("12H".parse::<TimeFormat>().unwrap(), TimeFormat::H12);
        assert_error_contains("noon".parse::<TimeFormat>(), "expected 12h or 24h");

        let yaml = serde_yaml::to_string(&TimeFormat::H24).unwrap();
        assert!(yaml.contains("24h"));
        assert_eq!(TimeFormat::default(), TimeFormat::H12);
    }
}
