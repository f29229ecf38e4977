//! Challenge summary cards.
//!
//! Turns challenge and series metadata into the values shown on a card:
//! horizon and context in steps, a frequency label and a registration or
//! results countdown.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

use crate::duration::{format_max_unit, parse_iso8601_duration};
use crate::models::{Challenge, ChallengeId, ChallengeSeries, ChallengeStatus, DurationField};

/// Frequency assumed when neither series nor challenge declares one.
pub const DEFAULT_FREQUENCY: &str = "PT1H";

/// A count that may not be known yet ("tbd" on announced challenges).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Count {
    Known(u32),
    Tbd,
}

impl Serialize for Count {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Count::Known(n) => serializer.serialize_u32(*n),
            Count::Tbd => serializer.serialize_str("tbd"),
        }
    }
}

impl fmt::Display for Count {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Count::Known(n) => write!(f, "{}", n),
            Count::Tbd => f.write_str("tbd"),
        }
    }
}

/// Display-ready facts about one challenge.
#[derive(Debug, Clone, Serialize)]
pub struct ChallengeSummary {
    pub challenge_id: ChallengeId,
    pub title: String,
    pub status: ChallengeStatus,
    pub n_time_series: Count,
    pub model_count: Count,
    /// Sampling frequency as a duration string
    pub frequency: String,
    /// Frequency rendered in its anchor unit, e.g. "1 Hour"
    pub frequency_label: String,
    pub horizon_steps: Option<u64>,
    pub context_steps: Option<u64>,
    /// `"<steps> x <frequency>"`, or `"TBA x <frequency>"`
    pub horizon_label: String,
    pub countdown: Option<String>,
    pub registration_start: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl ChallengeSummary {
    /// Build a summary. Series-level metadata wins over challenge-level
    /// metadata since it is set per series by the benchmark.
    pub fn build(challenge: &Challenge, series: &[ChallengeSeries], now: DateTime<Utc>) -> Self {
        let first = series.first();

        let frequency = first
            .and_then(|s| s.frequency.clone())
            .or_else(|| challenge.frequency.clone())
            .unwrap_or_else(|| DEFAULT_FREQUENCY.to_string());

        let frequency_label = frequency_label(&frequency);

        let horizon_steps = resolve_steps(
            &frequency,
            first.and_then(|s| s.horizon.as_ref()),
            challenge.horizon.as_ref(),
        );
        let context_steps = resolve_steps(
            &frequency,
            first.and_then(|s| s.context_length.as_ref()),
            challenge.context_length.as_ref(),
        );

        let horizon_label = match horizon_steps {
            Some(steps) => format!("{} x {}", steps, frequency_label),
            None => format!("TBA x {}", frequency_label),
        };

        let announced = challenge.status == ChallengeStatus::Announced;
        let count = |n: u32| {
            if announced && n == 0 {
                Count::Tbd
            } else {
                Count::Known(n)
            }
        };

        Self {
            challenge_id: challenge.challenge_id.clone(),
            title: challenge.title(),
            status: challenge.status.clone(),
            n_time_series: count(challenge.n_time_series),
            model_count: count(challenge.model_count.unwrap_or(0)),
            frequency,
            frequency_label,
            horizon_steps,
            context_steps,
            horizon_label,
            countdown: countdown(challenge, now),
            registration_start: challenge.registration_start,
            end_time: challenge.end_time,
        }
    }

    /// Horizon as shown in the challenge header: `"24 Steps"` or `"N/A Steps"`.
    pub fn horizon_steps_label(&self) -> String {
        match self.horizon_steps {
            Some(steps) => format!("{} Steps", steps),
            None => "N/A Steps".to_string(),
        }
    }

    pub fn context_label(&self) -> String {
        self.context_steps
            .map(|steps| steps.to_string())
            .unwrap_or_else(|| "TBA".to_string())
    }
}

impl fmt::Display for ChallengeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} (ID: {}) | Series: {} | Models: {} | Horizon: {} | Context: {} | Frequency: {}",
            self.status.as_str().to_uppercase(),
            self.title,
            self.challenge_id.short(8),
            self.n_time_series,
            self.model_count,
            self.horizon_label,
            self.context_label(),
            self.frequency_label,
        )?;
        if let Some(countdown) = &self.countdown {
            write!(f, " | {}", countdown)?;
        }
        Ok(())
    }
}

/// `format_max_unit` of the frequency, or the raw string when it does not parse.
pub fn frequency_label(frequency: &str) -> String {
    match parse_iso8601_duration(frequency) {
        Ok(parsed) => format_max_unit(&parsed.breakdown),
        Err(e) => {
            tracing::debug!("Could not parse frequency for display: {}", e);
            frequency.to_string()
        }
    }
}

/// Step count from the preferred field, falling back to the secondary one
/// when the preferred value is missing or cannot be converted.
fn resolve_steps(
    frequency: &str,
    preferred: Option<&DurationField>,
    fallback: Option<&DurationField>,
) -> Option<u64> {
    [preferred, fallback]
        .into_iter()
        .flatten()
        .find_map(|field| field.steps(frequency))
}

/// Status-dependent countdown text, `None` for statuses without a deadline.
pub fn countdown(challenge: &Challenge, now: DateTime<Utc>) -> Option<String> {
    let (target, pending, elapsed) = match challenge.status {
        ChallengeStatus::Registration => (
            challenge.registration_end,
            "Registration closes in: ",
            "Registration closed",
        ),
        ChallengeStatus::Announced => (
            challenge.registration_start,
            "Registration opens in: ",
            "Registration open now!",
        ),
        ChallengeStatus::Active => (challenge.end_time, "Results in: ", "Challenge ended"),
        _ => return None,
    };

    let Some(target) = target else {
        return Some("TBD".to_string());
    };

    let remaining = (target - now).num_seconds();
    if remaining <= 0 {
        Some(elapsed.to_string())
    } else {
        Some(format!("{}{}", pending, format_remaining(remaining)))
    }
}

/// `"2d 3h 4m"`, `"3h 4m"` or `"4m"`.
fn format_remaining(seconds: i64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3600;
    let minutes = (seconds % 3600) / 60;
    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}
