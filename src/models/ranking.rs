//! Model and ranking models, plus the query filters sent upstream.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::{ChallengeStatus, ResourceId};

/// A forecasting model registered in the benchmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub readable_id: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub model_size: Option<f64>,

    #[serde(default)]
    pub architecture: Option<String>,

    #[serde(default)]
    pub description: Option<String>,
}

impl Model {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.readable_id)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum ModelEntry {
    Full(Model),
    Id(String),
}

/// Models endpoint payload: either `{"models": [...]}` or a bare list whose
/// entries are model objects or readable ids.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum ModelsPayload {
    Wrapped { models: Vec<ModelEntry> },
    Bare(Vec<ModelEntry>),
}

impl ModelsPayload {
    pub(crate) fn into_models(self) -> Vec<Model> {
        let entries = match self {
            ModelsPayload::Wrapped { models } => models,
            ModelsPayload::Bare(models) => models,
        };
        entries
            .into_iter()
            .map(|entry| match entry {
                ModelEntry::Full(model) => model,
                ModelEntry::Id(readable_id) => Model {
                    readable_id,
                    name: None,
                    model_size: None,
                    architecture: None,
                    description: None,
                },
            })
            .collect()
    }
}

/// One row of a model ranking table.
///
/// Only the columns the dashboard reads are typed; everything else the API
/// returns is carried through in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelRanking {
    #[serde(default)]
    pub model_name: Option<String>,

    #[serde(default)]
    pub readable_id: Option<String>,

    #[serde(default)]
    pub rank_position: Option<u32>,

    #[serde(default)]
    pub elo_score: Option<f64>,

    #[serde(default, alias = "avg_mase")]
    pub mase_avg: Option<f64>,

    #[serde(default, alias = "n_completed")]
    pub rounds_participated: Option<u32>,

    /// Time range this row was computed for (set by the dashboard)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_range: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum RankingsPayload {
    Wrapped {
        #[serde(default)]
        rankings: Vec<ModelRanking>,
    },
    Bare(Vec<ModelRanking>),
}

impl RankingsPayload {
    pub(crate) fn into_rankings(self) -> Vec<ModelRanking> {
        match self {
            RankingsPayload::Wrapped { rankings } => rankings,
            RankingsPayload::Bare(rankings) => rankings,
        }
    }
}

/// A benchmark definition offered as an Elo ranking filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefinitionOption {
    pub id: ResourceId,
    #[serde(default)]
    pub name: String,
}

/// Values offered by the ranking filter widgets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub subcategories: Vec<String>,
    #[serde(default)]
    pub frequencies: Vec<String>,
    #[serde(default)]
    pub horizons: Vec<String>,
    #[serde(default)]
    pub time_ranges: Vec<String>,
    #[serde(default)]
    pub definitions: Vec<DefinitionOption>,
    /// Combined `<frequency>/<horizon>` keys used by the Elo rankings
    #[serde(default)]
    pub frequency_horizons: Vec<String>,
}

/// Split a comma-separated query value, dropping empty items.
pub fn split_csv(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn push_list(query: &mut Vec<(&'static str, String)>, key: &'static str, values: &[String]) {
    if !values.is_empty() {
        query.push((key, values.join(",")));
    }
}

/// Filters for the challenge list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChallengeFilters {
    #[serde(default)]
    pub statuses: Vec<ChallengeStatus>,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub frequencies: Vec<String>,
    #[serde(default)]
    pub horizons: Vec<String>,
    /// Lower bound on the challenge end time (ISO timestamp)
    #[serde(default)]
    pub from: Option<String>,
    /// Upper bound on the challenge end time (ISO timestamp)
    #[serde(default)]
    pub to: Option<String>,
    /// Free-text match on name and description
    #[serde(default)]
    pub search: Option<String>,
}

impl ChallengeFilters {
    pub fn with_statuses(statuses: &[ChallengeStatus]) -> Self {
        Self {
            statuses: statuses.to_vec(),
            ..Default::default()
        }
    }

    /// Query parameters for the upstream request. Empty filters are omitted
    /// and the pseudo-status `all` is dropped.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        let statuses: Vec<String> = self
            .statuses
            .iter()
            .map(|s| s.as_str().to_string())
            .filter(|s| s != "all")
            .collect();
        push_list(&mut query, "status", &statuses);
        push_list(&mut query, "domain", &self.domains);
        push_list(&mut query, "category", &self.categories);
        push_list(&mut query, "frequency", &self.frequencies);
        push_list(&mut query, "horizon", &self.horizons);
        if let Some(from) = self.from.as_ref().filter(|s| !s.is_empty()) {
            query.push(("from", from.clone()));
        }
        if let Some(to) = self.to.as_ref().filter(|s| !s.is_empty()) {
            query.push(("to", to.clone()));
        }
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query.push(("search", search.to_string()));
        }
        query
    }
}

/// Filters for the model ranking endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankingFilters {
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub frequencies: Vec<String>,
    #[serde(default)]
    pub horizons: Vec<String>,
    #[serde(default)]
    pub time_range: Option<String>,
    /// Elo rankings: benchmark definition to rank within
    #[serde(default)]
    pub definition_id: Option<String>,
    /// Elo rankings: `<frequency>/<horizon>` key
    #[serde(default)]
    pub frequency_horizon: Option<String>,
    /// Elo rankings: date (`YYYY-MM-DD`) of the ranking snapshot
    #[serde(default)]
    pub calculation_date: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl RankingFilters {
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        push_list(&mut query, "domain", &self.domains);
        push_list(&mut query, "category", &self.categories);
        push_list(&mut query, "frequency", &self.frequencies);
        push_list(&mut query, "horizon", &self.horizons);
        if let Some(range) = self.time_range.as_ref().filter(|s| !s.is_empty()) {
            query.push(("time_range", range.clone()));
        }
        for (key, value) in [
            ("definition_id", &self.definition_id),
            ("frequency_horizon", &self.frequency_horizon),
            ("calculation_date", &self.calculation_date),
        ] {
            if let Some(value) = value.as_ref().filter(|s| !s.is_empty()) {
                query.push((key, value.clone()));
            }
        }
        if let Some(limit) = self.limit.filter(|l| *l > 0) {
            query.push(("limit", limit.to_string()));
        }
        query
    }

    /// Whether an Elo-specific filter is set. Elo rankings are computed per
    /// definition and date, not per time range.
    pub fn is_elo(&self) -> bool {
        [
            &self.definition_id,
            &self.frequency_horizon,
            &self.calculation_date,
        ]
        .into_iter()
        .any(|v| v.as_ref().is_some_and(|s| !s.is_empty()))
    }

    pub fn for_time_range(&self, time_range: &str) -> Self {
        Self {
            time_range: Some(time_range.to_string()),
            ..self.clone()
        }
    }
}
