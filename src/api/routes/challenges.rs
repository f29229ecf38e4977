use axum::extract::{OriginalUri, Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::context::RequestContext;
use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::{
    split_csv, Challenge, ChallengeFilters, ChallengeSeries, ChallengeStatus, ForecastsResponse,
    Model, SeriesData,
};
use crate::plot::{ForecastPlot, PlotInput, SeriesPlotData};
use crate::summary::ChallengeSummary;

const DEFAULT_UPCOMING_LIMIT: usize = 5;

#[derive(Debug, Default, Deserialize)]
pub struct ChallengeListParams {
    pub status: Option<String>,
    pub domain: Option<String>,
    pub category: Option<String>,
    pub frequency: Option<String>,
    pub horizon: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub search: Option<String>,
}

impl ChallengeListParams {
    fn into_filters(self) -> ChallengeFilters {
        ChallengeFilters {
            statuses: split_csv(self.status.as_deref())
                .into_iter()
                .map(ChallengeStatus::from)
                .collect(),
            domains: split_csv(self.domain.as_deref()),
            categories: split_csv(self.category.as_deref()),
            frequencies: split_csv(self.frequency.as_deref()),
            horizons: split_csv(self.horizon.as_deref()),
            from: self.from,
            to: self.to,
            search: self.search,
        }
    }
}

pub async fn list_challenges(
    State(state): State<AppState>,
    Query(params): Query<ChallengeListParams>,
) -> Result<Json<Vec<Challenge>>, ApiError> {
    let filters = params.into_filters();
    let challenges = state.source.list_challenges(&filters).await?;
    Ok(Json(challenges))
}

#[derive(Debug, Deserialize)]
pub struct UpcomingParams {
    pub limit: Option<usize>,
}

/// Announced and open-for-registration challenges, soonest registration first.
pub async fn upcoming_challenges(
    State(state): State<AppState>,
    Query(params): Query<UpcomingParams>,
) -> Result<Json<Vec<Challenge>>, ApiError> {
    let mut challenges = state.source.list_upcoming_challenges().await?;
    challenges.retain(|c| c.status.is_upcoming());
    challenges.sort_by_key(|c| (c.registration_start.is_none(), c.registration_start));
    challenges.truncate(params.limit.unwrap_or(DEFAULT_UPCOMING_LIMIT));
    Ok(Json(challenges))
}

#[derive(Debug, Serialize)]
pub struct ChallengeDetail {
    pub challenge: Challenge,
    pub summary: ChallengeSummary,
    pub series: Vec<ChallengeSeries>,
}

pub async fn challenge_detail(
    State(state): State<AppState>,
    ctx: RequestContext,
    OriginalUri(uri): OriginalUri,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let page = state
        .cache
        .get_or_try_insert_with(&uri.to_string(), || async {
            let challenge = find_challenge(&state, &id).await?;

            // A challenge without reachable series still gets a summary.
            let series = match state.source.get_challenge_series(&id).await {
                Ok(series) => series,
                Err(e) => {
                    tracing::warn!(request_id = %ctx.request_id, "No series for challenge {}: {}", id, e);
                    Vec::new()
                }
            };

            let summary = ChallengeSummary::build(&challenge, &series, Utc::now());
            serde_json::to_value(ChallengeDetail {
                challenge,
                summary,
                series,
            })
            .map_err(|e| ApiError::Internal(e.to_string()))
        })
        .await?;
    Ok(Json(page))
}

pub async fn challenge_series(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ChallengeSeries>>, ApiError> {
    Ok(Json(state.source.get_challenge_series(&id).await?))
}

#[derive(Debug, Deserialize)]
pub struct SeriesDataParams {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

pub async fn series_data(
    State(state): State<AppState>,
    Path((id, series_id)): Path<(String, String)>,
    Query(params): Query<SeriesDataParams>,
) -> Result<Json<SeriesData>, ApiError> {
    let (Some(start), Some(end)) = (
        params.start_time.filter(|s| !s.is_empty()),
        params.end_time.filter(|s| !s.is_empty()),
    ) else {
        return Err(ApiError::BadRequest(
            "start_time and end_time are required".to_string(),
        ));
    };

    let data = state
        .source
        .get_series_data(&id, &series_id, &start, &end)
        .await?;
    Ok(Json(data))
}

pub async fn series_forecasts(
    State(state): State<AppState>,
    Path((id, series_id)): Path<(String, String)>,
) -> Result<Json<ForecastsResponse>, ApiError> {
    Ok(Json(state.source.get_series_forecasts(&id, &series_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct PlotParams {
    /// Comma-separated readable model ids; all models when absent
    pub models: Option<String>,
    /// Comma-separated series ids; all series when absent or empty
    pub series: Option<String>,
}

impl PlotParams {
    fn selected_models(&self) -> Option<Vec<String>> {
        self.models.as_deref().map(|m| split_csv(Some(m)))
    }
}

/// Plot for one series of a challenge.
pub async fn series_plot(
    State(state): State<AppState>,
    ctx: RequestContext,
    OriginalUri(uri): OriginalUri,
    Path((id, series_id)): Path<(String, String)>,
    Query(params): Query<PlotParams>,
) -> Result<Json<Value>, ApiError> {
    let page = state
        .cache
        .get_or_try_insert_with(&uri.to_string(), || async {
            let challenge = find_challenge(&state, &id).await?;
            let series = state
                .source
                .get_challenge_series(&id)
                .await?
                .into_iter()
                .find(|s| s.series_id.as_str() == series_id)
                .ok_or_else(|| {
                    ApiError::NotFound(format!("series {} in challenge {}", series_id, id))
                })?;

            let plot =
                assemble_plot(&state, &ctx, challenge, vec![series], params.selected_models())
                    .await?;
            serde_json::to_value(plot).map_err(|e| ApiError::Internal(e.to_string()))
        })
        .await?;
    Ok(Json(page))
}

/// Plot for several series of a challenge, chosen with `series=a,b`.
pub async fn challenge_plot(
    State(state): State<AppState>,
    ctx: RequestContext,
    OriginalUri(uri): OriginalUri,
    Path(id): Path<String>,
    Query(params): Query<PlotParams>,
) -> Result<Json<Value>, ApiError> {
    let page = state
        .cache
        .get_or_try_insert_with(&uri.to_string(), || async {
            let challenge = find_challenge(&state, &id).await?;
            let wanted = split_csv(params.series.as_deref());
            let series: Vec<ChallengeSeries> = state
                .source
                .get_challenge_series(&id)
                .await?
                .into_iter()
                .filter(|s| wanted.is_empty() || wanted.iter().any(|w| w == s.series_id.as_str()))
                .collect();

            let plot =
                assemble_plot(&state, &ctx, challenge, series, params.selected_models()).await?;
            serde_json::to_value(plot).map_err(|e| ApiError::Internal(e.to_string()))
        })
        .await?;
    Ok(Json(page))
}

async fn find_challenge(state: &AppState, id: &str) -> Result<Challenge, ApiError> {
    state
        .source
        .get_challenge(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("challenge {}", id)))
}

/// Fetch windows and forecasts for each series and build the plot. Actual
/// values are only drawn for the first series, so only that one is fetched.
async fn assemble_plot(
    state: &AppState,
    ctx: &RequestContext,
    challenge: Challenge,
    series: Vec<ChallengeSeries>,
    selected_models: Option<Vec<String>>,
) -> Result<ForecastPlot, ApiError> {
    let challenge_id = challenge.challenge_id.as_str();
    let summary = ChallengeSummary::build(&challenge, &series, Utc::now());

    let mut entries = Vec::with_capacity(series.len());
    for (idx, series) in series.into_iter().enumerate() {
        let series_id = series.series_id.as_str().to_string();
        let context = fetch_window(
            state,
            ctx,
            challenge_id,
            &series_id,
            series.context_start_time,
            series.context_end_time,
        )
        .await?;
        let actual = if idx == 0 {
            fetch_window(
                state,
                ctx,
                challenge_id,
                &series_id,
                series.context_end_time,
                series.end_time,
            )
            .await?
        } else {
            SeriesData::default()
        };
        let forecasts = state
            .source
            .get_series_forecasts(challenge_id, &series_id)
            .await?;
        entries.push(SeriesPlotData {
            series,
            context,
            actual,
            forecasts,
        });
    }

    let plot = ForecastPlot::assemble(PlotInput {
        challenge_title: challenge.title(),
        series: entries,
        selected_models,
        horizon_steps: summary.horizon_steps,
    });
    tracing::debug!(
        request_id = %ctx.request_id,
        "Plot for challenge {}: {} traces, {} forecasts",
        challenge_id,
        plot.traces.len(),
        plot.forecast_traces().count()
    );
    Ok(plot)
}

/// Observed values between two timestamps, empty when either bound is unknown.
async fn fetch_window(
    state: &AppState,
    ctx: &RequestContext,
    challenge_id: &str,
    series_id: &str,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<SeriesData, ApiError> {
    let (Some(start), Some(end)) = (start, end) else {
        tracing::debug!(
            request_id = %ctx.request_id,
            "Series {}/{} has no time window, skipping data",
            challenge_id,
            series_id
        );
        return Ok(SeriesData::default());
    };
    Ok(state
        .source
        .get_series_data(challenge_id, series_id, &start.to_rfc3339(), &end.to_rfc3339())
        .await?)
}

pub async fn challenge_models(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Model>>, ApiError> {
    Ok(Json(state.source.list_challenge_models(&id).await?))
}
