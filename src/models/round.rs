//! Rounds grouped under a benchmark definition, plus the rounds metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{timestamp, ChallengeStatus, DurationField, ResourceId};

/// One round of a benchmark definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefinitionRound {
    pub id: ResourceId,

    #[serde(default)]
    pub round_name: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub status: ChallengeStatus,

    #[serde(default, with = "timestamp::option")]
    pub registration_start: Option<DateTime<Utc>>,

    #[serde(default, with = "timestamp::option")]
    pub registration_end: Option<DateTime<Utc>>,

    #[serde(default, with = "timestamp::option")]
    pub start_time: Option<DateTime<Utc>>,

    #[serde(default, with = "timestamp::option")]
    pub end_time: Option<DateTime<Utc>>,

    #[serde(default)]
    pub context_length: Option<DurationField>,

    #[serde(default)]
    pub horizon: Option<DurationField>,

    #[serde(default)]
    pub frequency: Option<String>,

    #[serde(default)]
    pub model_count: Option<u32>,

    #[serde(default)]
    pub forecast_count: Option<u32>,

    #[serde(default)]
    pub domains: Option<Vec<String>>,

    #[serde(default)]
    pub categories: Option<Vec<String>>,

    #[serde(default)]
    pub subcategories: Option<Vec<String>>,
}

/// Paging info returned next to a page of rounds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub page_size: u32,
    #[serde(default)]
    pub total_items: u64,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub has_next: bool,
    #[serde(default)]
    pub has_previous: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefinitionRoundsPage {
    #[serde(default)]
    pub items: Vec<DefinitionRound>,
    #[serde(default)]
    pub pagination: Pagination,
}

/// Query for one page of a definition's rounds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundPageQuery {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub status: Option<String>,
}

impl RoundPageQuery {
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(page) = self.page {
            query.push(("page", page.to_string()));
        }
        if let Some(page_size) = self.page_size {
            query.push(("page_size", page_size.to_string()));
        }
        if let Some(status) = self.status.as_ref().filter(|s| !s.is_empty() && *s != "all") {
            query.push(("status", status.clone()));
        }
        query
    }
}

/// Values available for the round list filters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundsMetadata {
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
    pub statuses: Vec<String>,
}
