use axum::extract::{Path, Query};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::ApiError;
use crate::duration::{self, parse_iso8601_duration, DurationBreakdown};

#[derive(Debug, Serialize)]
pub struct DurationResponse {
    pub breakdown: DurationBreakdown,
    pub total_seconds: u64,
    pub label: String,
}

pub async fn describe_duration(Path(value): Path<String>) -> Result<Json<DurationResponse>, ApiError> {
    let parsed = parse_iso8601_duration(&value)?;
    Ok(Json(DurationResponse {
        breakdown: parsed.breakdown,
        total_seconds: parsed.total_seconds,
        label: parsed.label(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct HorizonStepsParams {
    pub frequency: Option<String>,
    pub horizon: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HorizonStepsResponse {
    /// -1 when the step count cannot be computed
    pub steps: i64,
}

/// A missing `frequency` or `horizon` is treated like an unparsable one.
pub async fn horizon_steps(Query(params): Query<HorizonStepsParams>) -> Json<HorizonStepsResponse> {
    let frequency = params.frequency.unwrap_or_default();
    let horizon = params.horizon.unwrap_or_default();
    Json(HorizonStepsResponse {
        steps: duration::horizon_steps(&frequency, &horizon),
    })
}
