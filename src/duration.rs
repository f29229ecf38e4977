//! ISO-8601 duration parsing and unit normalization.
//!
//! Challenge and series metadata carry `frequency`, `horizon` and
//! `context_length` as duration strings such as `"PT1H"` or `"P7D"`. This
//! module turns them into a [`DurationBreakdown`], a total number of seconds,
//! a display label ("23 Hours") and horizon step counts.
//!
//! Conversion factors are calendar-naive: a year is 365 days and a month is
//! 30 days. Displayed values elsewhere in the dashboard depend on these exact
//! numbers.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sentinel returned by [`horizon_steps`] when the step count is unknown.
pub const UNAVAILABLE_STEPS: i64 = -1;

/// Accepted grammar: `P[nY][nM][nW][nD][T[nH][nM][nS]]`, integer quantities only.
static DURATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^P(?:(?P<years>[0-9]+)Y)?(?:(?P<months>[0-9]+)M)?(?:(?P<weeks>[0-9]+)W)?(?:(?P<days>[0-9]+)D)?(?P<time>T(?:(?P<hours>[0-9]+)H)?(?:(?P<minutes>[0-9]+)M)?(?:(?P<seconds>[0-9]+)S)?)?$",
    )
    .expect("duration pattern is a valid regex")
});

/// Errors from duration parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    #[error("Invalid ISO 8601 duration: {0:?}")]
    InvalidFormat(String),

    /// Well-formed, but a quantity or the total does not fit in `u64`.
    /// Display code should fall back exactly as it does for `InvalidFormat`.
    #[error("Duration out of range: {0:?}")]
    OutOfRange(String),
}

/// Unit kinds, ordered from largest to smallest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    Years,
    Months,
    Weeks,
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl DurationUnit {
    const SECONDS_PER_MINUTE: u64 = 60;
    const SECONDS_PER_HOUR: u64 = 60 * 60;
    const SECONDS_PER_DAY: u64 = 24 * 60 * 60;
    const SECONDS_PER_WEEK: u64 = 7 * 24 * 60 * 60;
    const SECONDS_PER_MONTH: u64 = 30 * 24 * 60 * 60;
    const SECONDS_PER_YEAR: u64 = 365 * 24 * 60 * 60;

    /// All units, largest first.
    pub const ALL: [DurationUnit; 7] = [
        DurationUnit::Years,
        DurationUnit::Months,
        DurationUnit::Weeks,
        DurationUnit::Days,
        DurationUnit::Hours,
        DurationUnit::Minutes,
        DurationUnit::Seconds,
    ];

    /// Approximate length of one unit in seconds.
    pub fn as_seconds(&self) -> u64 {
        match self {
            DurationUnit::Years => Self::SECONDS_PER_YEAR,
            DurationUnit::Months => Self::SECONDS_PER_MONTH,
            DurationUnit::Weeks => Self::SECONDS_PER_WEEK,
            DurationUnit::Days => Self::SECONDS_PER_DAY,
            DurationUnit::Hours => Self::SECONDS_PER_HOUR,
            DurationUnit::Minutes => Self::SECONDS_PER_MINUTE,
            DurationUnit::Seconds => 1,
        }
    }

    pub fn singular(&self) -> &'static str {
        match self {
            DurationUnit::Years => "Year",
            DurationUnit::Months => "Month",
            DurationUnit::Weeks => "Week",
            DurationUnit::Days => "Day",
            DurationUnit::Hours => "Hour",
            DurationUnit::Minutes => "Minute",
            DurationUnit::Seconds => "Second",
        }
    }

    pub fn plural(&self) -> &'static str {
        match self {
            DurationUnit::Years => "Years",
            DurationUnit::Months => "Months",
            DurationUnit::Weeks => "Weeks",
            DurationUnit::Days => "Days",
            DurationUnit::Hours => "Hours",
            DurationUnit::Minutes => "Minutes",
            DurationUnit::Seconds => "Seconds",
        }
    }

    /// Label for `value` units: singular only when `value == 1`.
    pub fn label_for(&self, value: u64) -> &'static str {
        if value == 1 {
            self.singular()
        } else {
            self.plural()
        }
    }

    /// Capture group name in [`DURATION_PATTERN`].
    fn group_name(&self) -> &'static str {
        match self {
            DurationUnit::Years => "years",
            DurationUnit::Months => "months",
            DurationUnit::Weeks => "weeks",
            DurationUnit::Days => "days",
            DurationUnit::Hours => "hours",
            DurationUnit::Minutes => "minutes",
            DurationUnit::Seconds => "seconds",
        }
    }
}

impl fmt::Display for DurationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.group_name())
    }
}

/// Named components of a duration string. Absent components are zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DurationBreakdown {
    pub years: u64,
    pub months: u64,
    pub weeks: u64,
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl DurationBreakdown {
    /// Quantity stored for `unit`.
    pub fn get(&self, unit: DurationUnit) -> u64 {
        match unit {
            DurationUnit::Years => self.years,
            DurationUnit::Months => self.months,
            DurationUnit::Weeks => self.weeks,
            DurationUnit::Days => self.days,
            DurationUnit::Hours => self.hours,
            DurationUnit::Minutes => self.minutes,
            DurationUnit::Seconds => self.seconds,
        }
    }

    fn set(&mut self, unit: DurationUnit, value: u64) {
        match unit {
            DurationUnit::Years => self.years = value,
            DurationUnit::Months => self.months = value,
            DurationUnit::Weeks => self.weeks = value,
            DurationUnit::Days => self.days = value,
            DurationUnit::Hours => self.hours = value,
            DurationUnit::Minutes => self.minutes = value,
            DurationUnit::Seconds => self.seconds = value,
        }
    }

    /// Sum of every component in seconds, or `None` on `u64` overflow.
    pub fn checked_total_seconds(&self) -> Option<u64> {
        DurationUnit::ALL.iter().try_fold(0u64, |acc, unit| {
            self.get(*unit)
                .checked_mul(unit.as_seconds())
                .and_then(|secs| acc.checked_add(secs))
        })
    }

    /// Sum of every component in seconds, saturating at `u64::MAX`.
    ///
    /// Breakdowns produced by [`parse_iso8601_duration`] never saturate.
    pub fn total_seconds(&self) -> u64 {
        self.checked_total_seconds().unwrap_or(u64::MAX)
    }

    pub fn is_zero(&self) -> bool {
        DurationUnit::ALL.iter().all(|unit| self.get(*unit) == 0)
    }

    /// The smallest unit with a non-zero quantity.
    ///
    /// `P1DT2H` anchors on hours, not days: the display tracks the most
    /// granular component that was actually written.
    pub fn anchor_unit(&self) -> Option<DurationUnit> {
        DurationUnit::ALL
            .iter()
            .rev()
            .copied()
            .find(|unit| self.get(*unit) > 0)
    }
}

/// Result of parsing a duration string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParsedDuration {
    pub breakdown: DurationBreakdown,
    pub total_seconds: u64,
}

impl ParsedDuration {
    /// Display label for this duration, see [`format_max_unit`].
    pub fn label(&self) -> String {
        format_max_unit(&self.breakdown)
    }
}

impl FromStr for ParsedDuration {
    type Err = DurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_iso8601_duration(s)
    }
}

impl fmt::Display for ParsedDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Parse an ISO-8601 duration such as `"P3Y6M4DT12H30M5S"`.
///
/// Components must appear in the order `Y M W D T H M S`; each is optional.
/// A bare `"P"` is a zero duration, while a `T` designator must be followed
/// by at least one time component.
pub fn parse_iso8601_duration(duration: &str) -> Result<ParsedDuration, DurationError> {
    let invalid = || DurationError::InvalidFormat(duration.to_string());

    let captures = DURATION_PATTERN.captures(duration).ok_or_else(invalid)?;

    if captures.name("time").is_some()
        && [
            DurationUnit::Hours,
            DurationUnit::Minutes,
            DurationUnit::Seconds,
        ]
        .iter()
        .all(|unit| captures.name(unit.group_name()).is_none())
    {
        return Err(invalid());
    }

    let breakdown = breakdown_from_captures(&captures, duration)?;
    let total_seconds = breakdown
        .checked_total_seconds()
        .ok_or_else(|| DurationError::OutOfRange(duration.to_string()))?;

    Ok(ParsedDuration {
        breakdown,
        total_seconds,
    })
}

fn breakdown_from_captures(
    captures: &Captures<'_>,
    duration: &str,
) -> Result<DurationBreakdown, DurationError> {
    let mut breakdown = DurationBreakdown::default();
    for unit in DurationUnit::ALL {
        if let Some(m) = captures.name(unit.group_name()) {
            let value = m
                .as_str()
                .parse::<u64>()
                .map_err(|_| DurationError::OutOfRange(duration.to_string()))?;
            breakdown.set(unit, value);
        }
    }
    Ok(breakdown)
}

/// Render a breakdown as `"<value> <Unit>"` in its anchor unit.
///
/// The value is the whole duration floor-divided by the anchor unit's length,
/// so `{days: 1, hours: 2}` becomes `"26 Hours"` and `{days: 7}` stays
/// `"7 Days"`. A zero duration is `"0 Seconds"`.
pub fn format_max_unit(breakdown: &DurationBreakdown) -> String {
    let total_seconds = breakdown.total_seconds();
    if total_seconds == 0 {
        return "0 Seconds".to_string();
    }

    match breakdown.anchor_unit() {
        Some(unit) => {
            let value = total_seconds / unit.as_seconds();
            format!("{} {}", value, unit.label_for(value))
        }
        None => format!("{} Seconds", total_seconds),
    }
}

/// Number of whole `frequency` periods that fit into `span`.
///
/// `None` when either string fails to parse or the frequency is zero.
pub fn steps_between(frequency: &str, span: &str) -> Option<u64> {
    let frequency = parse_iso8601_duration(frequency).ok()?;
    let span = parse_iso8601_duration(span).ok()?;
    span.total_seconds.checked_div(frequency.total_seconds)
}

/// Forecast horizon in sampling steps, or [`UNAVAILABLE_STEPS`] (−1).
///
/// Missing or malformed metadata is a normal state for upcoming challenges,
/// so this reports a sentinel instead of an error.
pub fn horizon_steps(frequency: &str, horizon: &str) -> i64 {
    steps_between(frequency, horizon)
        .and_then(|steps| i64::try_from(steps).ok())
        .unwrap_or(UNAVAILABLE_STEPS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn breakdown(s: &str) -> DurationBreakdown {
        parse_iso8601_duration(s).unwrap().breakdown
    }

    #[test]
    fn test_parse_full_duration() {
        let parsed = parse_iso8601_duration("P3Y6M4DT12H30M5S").unwrap();
        assert_eq!(
            parsed.breakdown,
            DurationBreakdown {
                years: 3,
                months: 6,
                weeks: 0,
                days: 4,
                hours: 12,
                minutes: 30,
                seconds: 5,
            }
        );
        assert_eq!(
            parsed.total_seconds,
            3 * 31_536_000 + 6 * 2_592_000 + 4 * 86_400 + 12 * 3600 + 30 * 60 + 5
        );
    }

    #[test]
    fn test_parse_weeks() {
        let parsed = parse_iso8601_duration("P2W").unwrap();
        assert_eq!(parsed.breakdown.weeks, 2);
        assert_eq!(parsed.total_seconds, 1_209_600);
    }

    #[test]
    fn test_month_and_minute_designators_are_positional() {
        let parsed = parse_iso8601_duration("P1M").unwrap();
        assert_eq!(parsed.breakdown.months, 1);
        assert_eq!(parsed.breakdown.minutes, 0);
        assert_eq!(parsed.total_seconds, 2_592_000);

        let parsed = parse_iso8601_duration("PT1M").unwrap();
        assert_eq!(parsed.breakdown.months, 0);
        assert_eq!(parsed.breakdown.minutes, 1);
        assert_eq!(parsed.total_seconds, 60);
    }

    #[test]
    fn test_parse_bare_p_is_zero() {
        let parsed = parse_iso8601_duration("P").unwrap();
        assert!(parsed.breakdown.is_zero());
        assert_eq!(parsed.total_seconds, 0);
    }

    #[test]
    fn test_parse_explicit_zero_components() {
        let parsed = parse_iso8601_duration("P0D").unwrap();
        assert!(parsed.breakdown.is_zero());
        assert_eq!(parsed.total_seconds, 0);
    }

    #[test]
    fn test_parse_leading_zeros() {
        assert_eq!(parse_iso8601_duration("PT015M").unwrap().total_seconds, 900);
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        for input in [
            "", "PT", "1H", "PT1S1H", "P1D1Y", "P1H", "PT1D", "P1.5D", "P-1D", "P1DT", "p1d",
            "P1D ", " P1D", "P1DD", "PT1H1H", "P1Y2Y", "PT1HX",
        ] {
            assert!(
                matches!(
                    parse_iso8601_duration(input),
                    Err(DurationError::InvalidFormat(_))
                ),
                "expected InvalidFormat for {:?}",
                input
            );
        }
    }

    #[test]
    fn test_parse_rejects_non_ascii_digits() {
        // Arabic-Indic digit one
        assert!(parse_iso8601_duration("PT\u{0661}H").is_err());
    }

    #[test]
    fn test_parse_out_of_range() {
        assert_eq!(
            parse_iso8601_duration("PT99999999999999999999999S"),
            Err(DurationError::OutOfRange(
                "PT99999999999999999999999S".to_string()
            ))
        );
        // Fits in u64 as a quantity, overflows once scaled to seconds.
        assert!(matches!(
            parse_iso8601_duration("P18446744073709551615Y"),
            Err(DurationError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_from_str() {
        let parsed: ParsedDuration = "PT1H".parse().unwrap();
        assert_eq!(parsed.total_seconds, 3600);
        assert!("nope".parse::<ParsedDuration>().is_err());
    }

    #[test]
    fn test_error_display() {
        let err = parse_iso8601_duration("1H").unwrap_err();
        assert_eq!(err.to_string(), "Invalid ISO 8601 duration: \"1H\"");
    }

    #[test]
    fn test_format_zero() {
        assert_eq!(format_max_unit(&breakdown("P")), "0 Seconds");
        assert_eq!(format_max_unit(&DurationBreakdown::default()), "0 Seconds");
    }

    #[test]
    fn test_format_anchors_on_smallest_unit() {
        assert_eq!(format_max_unit(&breakdown("P1DT2H")), "26 Hours");
        assert_eq!(format_max_unit(&breakdown("P1W3D")), "10 Days");
        assert_eq!(format_max_unit(&breakdown("P1DT0H")), "1 Day");
    }

    #[test]
    fn test_format_keeps_written_unit() {
        assert_eq!(format_max_unit(&breakdown("P7D")), "7 Days");
        assert_eq!(format_max_unit(&breakdown("PT168H")), "168 Hours");
        assert_eq!(format_max_unit(&breakdown("PT23H")), "23 Hours");
        assert_eq!(format_max_unit(&breakdown("P2D")), "2 Days");
    }

    #[test]
    fn test_format_singular_labels() {
        assert_eq!(format_max_unit(&breakdown("PT1H")), "1 Hour");
        assert_eq!(format_max_unit(&breakdown("P1Y")), "1 Year");
        assert_eq!(format_max_unit(&breakdown("P1M")), "1 Month");
        assert_eq!(format_max_unit(&breakdown("P1W")), "1 Week");
        assert_eq!(format_max_unit(&breakdown("PT1M")), "1 Minute");
        assert_eq!(format_max_unit(&breakdown("PT1S")), "1 Second");
    }

    #[test]
    fn test_format_mixed_units_floor_division() {
        // 1 year + 1 month anchors on months: (31_536_000 + 2_592_000) / 2_592_000 = 13
        assert_eq!(format_max_unit(&breakdown("P1Y1M")), "13 Months");
        assert_eq!(format_max_unit(&breakdown("PT1H30M")), "90 Minutes");
        assert_eq!(format_max_unit(&breakdown("PT15M")), "15 Minutes");
    }

    #[test]
    fn test_anchor_unit() {
        assert_eq!(breakdown("P").anchor_unit(), None);
        assert_eq!(breakdown("P1Y2W").anchor_unit(), Some(DurationUnit::Weeks));
        assert_eq!(
            breakdown("P1DT5S").anchor_unit(),
            Some(DurationUnit::Seconds)
        );
    }

    #[test]
    fn test_total_seconds_saturates_for_constructed_breakdowns() {
        let huge = DurationBreakdown {
            years: u64::MAX,
            ..Default::default()
        };
        assert_eq!(huge.checked_total_seconds(), None);
        assert_eq!(huge.total_seconds(), u64::MAX);
        assert_eq!(format_max_unit(&huge), format!("{} Years", u64::MAX / 31_536_000));
    }

    #[test]
    fn test_horizon_steps() {
        assert_eq!(horizon_steps("PT1H", "P1D"), 24);
        assert_eq!(horizon_steps("PT15M", "PT1H"), 4);
        assert_eq!(horizon_steps("P1D", "P1W"), 7);
        assert_eq!(horizon_steps("PT1H", "PT90M"), 1);
        assert_eq!(horizon_steps("P1D", "PT1H"), 0);
    }

    #[test]
    fn test_horizon_steps_unavailable() {
        assert_eq!(horizon_steps("PT1H", ""), UNAVAILABLE_STEPS);
        assert_eq!(horizon_steps("", "P1D"), UNAVAILABLE_STEPS);
        assert_eq!(horizon_steps("P0D", "P1D"), UNAVAILABLE_STEPS);
        assert_eq!(horizon_steps("P", "P1D"), UNAVAILABLE_STEPS);
        assert_eq!(horizon_steps("hourly", "P1D"), UNAVAILABLE_STEPS);
    }

    #[test]
    fn test_steps_between() {
        assert_eq!(steps_between("PT1H", "P7D"), Some(168));
        assert_eq!(steps_between("PT0S", "P7D"), None);
        assert_eq!(steps_between("PT1H", "bogus"), None);
    }

    #[test]
    fn test_unit_table() {
        assert_eq!(DurationUnit::Years.as_seconds(), 31_536_000);
        assert_eq!(DurationUnit::Months.as_seconds(), 2_592_000);
        assert_eq!(DurationUnit::Weeks.as_seconds(), 604_800);
        assert_eq!(DurationUnit::Days.as_seconds(), 86_400);
        assert_eq!(DurationUnit::Hours.as_seconds(), 3600);
        assert_eq!(DurationUnit::Minutes.as_seconds(), 60);
        assert_eq!(DurationUnit::Seconds.as_seconds(), 1);
    }

    #[test]
    fn test_parsed_duration_serialization() {
        let parsed = parse_iso8601_duration("PT1H").unwrap();
        let json = serde_json::to_value(parsed).unwrap();
        assert_eq!(json["breakdown"]["hours"], 1);
        assert_eq!(json["total_seconds"], 3600);
        assert_eq!(parsed.to_string(), "1 Hour");
    }
}
