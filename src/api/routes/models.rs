use axum::extract::{Path, Query, State};
use axum::Json;

use super::numeric_id;
use crate::api::context::RequestContext;
use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::{
    ForecastWindow, ModelDetails, ModelRankingHistory, ModelSeriesByDefinition,
    ModelSeriesForecasts,
};

pub async fn model_detail(
    State(state): State<AppState>,
    Path(model_id): Path<String>,
) -> Result<Json<ModelDetails>, ApiError> {
    state
        .source
        .get_model_details(&model_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("model {}", model_id)))
}

/// Daily Elo history of a model for every definition it is ranked in.
pub async fn model_rankings(
    State(state): State<AppState>,
    Path(model_id): Path<String>,
) -> Result<Json<ModelRankingHistory>, ApiError> {
    Ok(Json(state.source.get_model_rankings(&model_id).await?))
}

pub async fn model_series_by_definition(
    State(state): State<AppState>,
    Path(model_id): Path<String>,
) -> Result<Json<ModelSeriesByDefinition>, ApiError> {
    let model_id = numeric_id("model", &model_id)?;
    Ok(Json(
        state.source.get_model_series_by_definition(model_id).await?,
    ))
}

/// Every round's forecast of a model for one series, optionally limited to
/// `start_date..end_date`.
pub async fn model_series_forecasts(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((model_id, definition_id, series_id)): Path<(String, String, String)>,
    Query(window): Query<ForecastWindow>,
) -> Result<Json<ModelSeriesForecasts>, ApiError> {
    let model_id = numeric_id("model", &model_id)?;
    let definition_id = numeric_id("definition", &definition_id)?;
    let series_id = numeric_id("series", &series_id)?;

    let forecasts = state
        .source
        .get_model_series_forecasts(model_id, definition_id, series_id, &window)
        .await?;
    tracing::debug!(
        request_id = %ctx.request_id,
        "Model {} has forecasts in {} of {} rounds for series {}",
        model_id,
        forecasts.forecast_rounds().count(),
        forecasts.rounds.len(),
        series_id
    );
    Ok(Json(forecasts))
}
