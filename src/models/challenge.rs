//! Challenge and series models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use super::{timestamp, ChallengeId, SeriesId};
use crate::duration::steps_between;

/// Lifecycle status of a challenge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChallengeStatus {
    Announced,
    Registration,
    Active,
    Completed,
    /// Any status string this build does not know about
    Unknown(String),
}

impl ChallengeStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ChallengeStatus::Announced => "announced",
            ChallengeStatus::Registration => "registration",
            ChallengeStatus::Active => "active",
            ChallengeStatus::Completed => "completed",
            ChallengeStatus::Unknown(s) => s,
        }
    }

    /// Statuses shown in the "upcoming" sidebar.
    pub fn is_upcoming(&self) -> bool {
        matches!(
            self,
            ChallengeStatus::Announced | ChallengeStatus::Registration
        )
    }
}

impl Default for ChallengeStatus {
    fn default() -> Self {
        ChallengeStatus::Unknown("unknown".to_string())
    }
}

impl From<String> for ChallengeStatus {
    fn from(s: String) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "announced" => ChallengeStatus::Announced,
            "registration" => ChallengeStatus::Registration,
            "active" => ChallengeStatus::Active,
            "completed" => ChallengeStatus::Completed,
            _ => ChallengeStatus::Unknown(s),
        }
    }
}

impl From<&str> for ChallengeStatus {
    fn from(s: &str) -> Self {
        ChallengeStatus::from(s.to_string())
    }
}

impl From<ChallengeStatus> for String {
    fn from(status: ChallengeStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for ChallengeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A horizon or context length as sent by the API: either a step count or
/// an ISO-8601 duration string.
///
/// Numeric values may arrive as floats (`24.0`); those are truncated toward
/// zero. Negative or non-finite numbers are kept as text and never resolve
/// to a step count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DurationField {
    Steps(u64),
    Iso(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDurationField {
    Int(u64),
    Float(f64),
    Text(String),
}

impl From<RawDurationField> for DurationField {
    fn from(raw: RawDurationField) -> Self {
        match raw {
            RawDurationField::Int(n) => DurationField::Steps(n),
            RawDurationField::Float(x) if x.is_finite() && x >= 0.0 && x < u64::MAX as f64 => {
                DurationField::Steps(x.trunc() as u64)
            }
            RawDurationField::Float(x) => DurationField::Iso(x.to_string()),
            RawDurationField::Text(s) => DurationField::Iso(s),
        }
    }
}

impl<'de> Deserialize<'de> for DurationField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawDurationField::deserialize(deserializer).map(DurationField::from)
    }
}

impl DurationField {
    /// Number of `frequency` steps this field covers.
    ///
    /// Step counts are returned as-is; duration strings are divided by the
    /// frequency.
    pub fn steps(&self, frequency: &str) -> Option<u64> {
        match self {
            DurationField::Steps(n) => Some(*n),
            DurationField::Iso(s) => steps_between(frequency, s),
        }
    }
}

/// Treats an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl fmt::Display for DurationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DurationField::Steps(n) => write!(f, "{}", n),
            DurationField::Iso(s) => f.write_str(s),
        }
    }
}

/// A challenge (one round of a benchmark definition).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    pub challenge_id: ChallengeId,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub status: ChallengeStatus,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub n_time_series: u32,

    #[serde(default)]
    pub model_count: Option<u32>,

    #[serde(default)]
    pub forecast_count: Option<u32>,

    /// Forecast horizon (duration string or step count)
    #[serde(default)]
    pub horizon: Option<DurationField>,

    /// Context window (duration string or step count)
    #[serde(default)]
    pub context_length: Option<DurationField>,

    /// Sampling frequency as a duration string
    #[serde(default)]
    pub frequency: Option<String>,

    #[serde(default, with = "timestamp::option")]
    pub registration_start: Option<DateTime<Utc>>,

    #[serde(default, with = "timestamp::option")]
    pub registration_end: Option<DateTime<Utc>>,

    #[serde(default, with = "timestamp::option")]
    pub start_time: Option<DateTime<Utc>>,

    #[serde(default, with = "timestamp::option")]
    pub end_time: Option<DateTime<Utc>>,

    #[serde(default)]
    pub domains: Option<Vec<String>>,

    #[serde(default)]
    pub categories: Option<Vec<String>>,

    #[serde(default)]
    pub subcategories: Option<Vec<String>>,
}

impl Challenge {
    /// Human-facing title: description, then name, then the id.
    pub fn title(&self) -> String {
        self.description
            .as_deref()
            .filter(|d| !d.is_empty())
            .or(self.name.as_deref().filter(|n| !n.is_empty()))
            .map(str::to_string)
            .unwrap_or_else(|| format!("Challenge {}", self.challenge_id))
    }
}

/// A time series taking part in a challenge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeSeries {
    pub series_id: SeriesId,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub frequency: Option<String>,

    #[serde(default)]
    pub horizon: Option<DurationField>,

    #[serde(default)]
    pub context_length: Option<DurationField>,

    #[serde(default, with = "timestamp::option")]
    pub start_time: Option<DateTime<Utc>>,

    #[serde(default, with = "timestamp::option")]
    pub end_time: Option<DateTime<Utc>>,

    #[serde(default, with = "timestamp::option")]
    pub context_start_time: Option<DateTime<Utc>>,

    #[serde(default, with = "timestamp::option")]
    pub context_end_time: Option<DateTime<Utc>>,

    #[serde(default)]
    pub domain: Option<String>,

    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub subcategory: Option<String>,
}

impl ChallengeSeries {
    /// Display name: description, then name, then `Series <id>`.
    pub fn display_name(&self) -> String {
        self.description
            .as_deref()
            .filter(|d| !d.is_empty())
            .or(self.name.as_deref().filter(|n| !n.is_empty()))
            .map(str::to_string)
            .unwrap_or_else(|| format!("Series {}", self.series_id))
    }

    /// Short label used for plot traces: name, then `Series <id>`.
    pub fn label(&self) -> String {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Series {}", self.series_id))
    }
}
