use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::api::context::RequestContext;
use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::{split_csv, FilterOptions, ModelRanking, RankingFilters};

/// Time range used when the benchmark does not advertise any.
pub const DEFAULT_TIME_RANGE: &str = "All";

#[derive(Debug, Default, Deserialize)]
pub struct RankingParams {
    pub domain: Option<String>,
    pub category: Option<String>,
    pub frequency: Option<String>,
    pub horizon: Option<String>,
    pub time_range: Option<String>,
    pub definition_id: Option<String>,
    pub frequency_horizon: Option<String>,
    pub calculation_date: Option<String>,
    pub limit: Option<u32>,
}

impl RankingParams {
    fn to_filters(&self) -> RankingFilters {
        RankingFilters {
            domains: split_csv(self.domain.as_deref()),
            categories: split_csv(self.category.as_deref()),
            frequencies: split_csv(self.frequency.as_deref()),
            horizons: split_csv(self.horizon.as_deref()),
            time_range: None,
            definition_id: self.definition_id.clone(),
            frequency_horizon: self.frequency_horizon.clone(),
            calculation_date: self.calculation_date.clone(),
            limit: self.limit,
        }
    }
}

/// Rankings for the requested time range, or for every time range the
/// benchmark offers. Each row is tagged with the range it belongs to.
///
/// With an Elo filter (`definition_id`, `frequency_horizon` or
/// `calculation_date`) a single request is made and rows are returned as the
/// benchmark ranks them.
pub async fn rankings(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(params): Query<RankingParams>,
) -> Result<Json<Vec<ModelRanking>>, ApiError> {
    let filters = params.to_filters();

    if filters.is_elo() {
        let filters = match params.time_range.as_deref().filter(|r| !r.is_empty()) {
            Some(range) => filters.for_time_range(range),
            None => filters,
        };
        let rows = state.source.get_filtered_rankings(&filters).await?;
        tracing::debug!(
            request_id = %ctx.request_id,
            "{} Elo ranking rows for definition {:?}",
            rows.len(),
            filters.definition_id
        );
        return Ok(Json(rows));
    }

    let time_ranges = match params.time_range.as_deref().filter(|r| !r.is_empty()) {
        Some(range) => vec![range.to_string()],
        None => {
            let options = state.source.get_filter_options().await?;
            if options.time_ranges.is_empty() {
                vec![DEFAULT_TIME_RANGE.to_string()]
            } else {
                options.time_ranges
            }
        }
    };

    let mut rows = Vec::new();
    for range in &time_ranges {
        let ranked = state
            .source
            .get_filtered_rankings(&filters.for_time_range(range))
            .await?;
        tracing::debug!(
            request_id = %ctx.request_id,
            "{} ranking rows for time range {}",
            ranked.len(),
            range
        );
        rows.extend(ranked.into_iter().map(|mut row| {
            row.time_range = Some(range.clone());
            row
        }));
    }

    Ok(Json(rows))
}

pub async fn ranking_filters(
    State(state): State<AppState>,
) -> Result<Json<FilterOptions>, ApiError> {
    Ok(Json(state.source.get_filter_options().await?))
}
