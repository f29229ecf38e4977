//! Per-model pages: model card, Elo history and per-series forecasts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{timestamp, ForecastPoint, ModelId, ResourceId, SeriesId, TimeSeriesPoint};

/// Model card.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelDetails {
    #[serde(default)]
    pub readable_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub model_family: Option<String>,
    #[serde(default)]
    pub model_size: Option<f64>,
    #[serde(default)]
    pub hosting: Option<String>,
    #[serde(default)]
    pub architecture: Option<String>,
    #[serde(default)]
    pub pretraining_data: Option<String>,
    #[serde(default)]
    pub publishing_date: Option<String>,
}

/// The model endpoint answers with either one object or a list holding it.
/// `Many` must stay first: every `ModelDetails` field defaults, so an empty
/// list also deserializes as a card.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum ModelDetailsPayload {
    Many(Vec<ModelDetails>),
    One(ModelDetails),
}

impl ModelDetailsPayload {
    pub(crate) fn into_first(self) -> Option<ModelDetails> {
        match self {
            ModelDetailsPayload::Many(list) => list.into_iter().next(),
            ModelDetailsPayload::One(details) => Some(details),
        }
    }
}

/// Elo standing of a model on one calculation date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRanking {
    pub calculation_date: String,
    #[serde(default)]
    pub elo_score: Option<f64>,
    #[serde(default)]
    pub elo_ci_lower: Option<f64>,
    #[serde(default)]
    pub elo_ci_upper: Option<f64>,
    #[serde(default)]
    pub rank_position: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefinitionRankingHistory {
    pub definition_id: ResourceId,
    #[serde(default)]
    pub definition_name: Option<String>,
    #[serde(default)]
    pub daily_rankings: Vec<DailyRanking>,
}

impl DefinitionRankingHistory {
    /// Most recent entry by calculation date (ISO dates sort lexically).
    pub fn latest(&self) -> Option<&DailyRanking> {
        self.daily_rankings
            .iter()
            .max_by(|a, b| a.calculation_date.cmp(&b.calculation_date))
    }
}

/// Elo history of one model across benchmark definitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRankingHistory {
    pub model_id: ModelId,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub definition_rankings: Vec<DefinitionRankingHistory>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSeriesInfo {
    pub series_id: SeriesId,
    #[serde(default)]
    pub series_name: Option<String>,
    #[serde(default)]
    pub series_unique_id: Option<String>,
    #[serde(default)]
    pub rounds_participated: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefinitionSeries {
    pub definition_id: ResourceId,
    #[serde(default)]
    pub definition_name: Option<String>,
    #[serde(default)]
    pub series: Vec<ModelSeriesInfo>,
}

/// Series a model has forecast, grouped by definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSeriesByDefinition {
    pub model_id: ModelId,
    #[serde(default)]
    pub model_readable_id: Option<String>,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub definitions: Vec<DefinitionSeries>,
}

/// A model's forecast for one series in one round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSeriesRound {
    pub round_id: ResourceId,
    #[serde(default)]
    pub round_name: Option<String>,
    #[serde(default, with = "timestamp::option")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub series_in_round: bool,
    #[serde(default)]
    pub forecast_exists: bool,
    #[serde(default)]
    pub forecasts: Option<Vec<ForecastPoint>>,
}

/// Every round's forecast of one model for one series of a definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSeriesForecasts {
    pub model_id: ModelId,
    #[serde(default)]
    pub model_readable_id: Option<String>,
    #[serde(default)]
    pub model_name: Option<String>,
    pub definition_id: ResourceId,
    #[serde(default)]
    pub definition_name: Option<String>,
    pub series_id: SeriesId,
    #[serde(default)]
    pub series_name: Option<String>,
    #[serde(default)]
    pub rounds: Vec<ModelSeriesRound>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ground_truth: Option<Vec<TimeSeriesPoint>>,
}

impl ModelSeriesForecasts {
    /// Rounds for which the model actually submitted a forecast.
    pub fn forecast_rounds(&self) -> impl Iterator<Item = &ModelSeriesRound> {
        self.rounds
            .iter()
            .filter(|r| r.forecast_exists && r.forecasts.as_ref().is_some_and(|f| !f.is_empty()))
    }
}

/// Start and end of the window requested for a model's series forecasts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastWindow {
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

impl ForecastWindow {
    /// Upstream names the bounds `start_time` / `end_time`.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(start) = self.start_date.as_ref().filter(|s| !s.is_empty()) {
            query.push(("start_time", start.clone()));
        }
        if let Some(end) = self.end_date.as_ref().filter(|s| !s.is_empty()) {
            query.push(("end_time", end.clone()));
        }
        query
    }
}
