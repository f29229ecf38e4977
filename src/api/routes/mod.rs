pub mod challenges;
pub mod durations;
pub mod models;
pub mod rankings;
pub mod rounds;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::ApiError;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Name of the benchmark source behind the API
    pub source: &'static str,
    pub cached_pages: usize,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        source: state.source.name(),
        cached_pages: state.cache.len().await,
    })
}

/// Reject ids the benchmark can only resolve as integers.
pub(crate) fn numeric_id<'a>(kind: &str, value: &'a str) -> Result<&'a str, ApiError> {
    if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
        Ok(value)
    } else {
        Err(ApiError::BadRequest(format!("Invalid {} ID: {:?}", kind, value)))
    }
}

/// In-memory [`BenchmarkSource`](crate::client::BenchmarkSource) and request
/// helpers shared by the route tests.
#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::util::ServiceExt;

    use crate::api::build_router;
    use crate::api::state::AppState;
    use crate::client::{BenchmarkSource, ClientError};
    use crate::config::CacheConfig;
    use crate::models::{
        Challenge, ChallengeFilters, ChallengeSeries, DefinitionRoundsPage, FilterOptions,
        ForecastWindow, ForecastsResponse, Model, ModelDetails, ModelRanking, ModelRankingHistory,
        ModelSeriesByDefinition, ModelSeriesForecasts, RankingFilters, RoundPageQuery,
        RoundsMetadata, SeriesData,
    };

    #[derive(Default)]
    pub struct StaticSource {
        pub challenges: Vec<Challenge>,
        pub series: HashMap<String, Vec<ChallengeSeries>>,
        pub data: HashMap<String, SeriesData>,
        pub forecasts: HashMap<String, ForecastsResponse>,
        pub models: HashMap<String, Vec<Model>>,
        pub filter_options: FilterOptions,
        pub rankings: HashMap<String, Vec<ModelRanking>>,
        pub model_details: HashMap<String, ModelDetails>,
        pub model_rankings: HashMap<String, ModelRankingHistory>,
        pub model_series: HashMap<String, ModelSeriesByDefinition>,
        /// Keyed by `"<model>/<definition>/<series>"`
        pub model_forecasts: HashMap<String, ModelSeriesForecasts>,
        pub definition_rounds: HashMap<String, DefinitionRoundsPage>,
        pub rounds_metadata: RoundsMetadata,
        /// Status returned by every call when set
        pub fail_with: Option<u16>,
        pub calls: AtomicUsize,
        pub last_challenge_filters: Mutex<Option<ChallengeFilters>>,
        pub last_ranking_filters: Mutex<Option<RankingFilters>>,
        pub last_forecast_window: Mutex<Option<ForecastWindow>>,
        pub last_round_query: Mutex<Option<RoundPageQuery>>,
    }

    impl StaticSource {
        fn record(&self) -> Result<(), ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.fail_with {
                Some(404) => Err(ClientError::NotFound("/api/v1".to_string())),
                Some(status) => Err(ClientError::HttpStatus {
                    status,
                    message: "upstream failure".to_string(),
                }),
                None => Ok(()),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn lookup<T: Clone>(map: &HashMap<String, T>, key: String) -> Result<T, ClientError> {
            map.get(&key)
                .cloned()
                .ok_or_else(|| ClientError::NotFound(format!("/api/v1/{}", key)))
        }
    }

    #[async_trait]
    impl BenchmarkSource for StaticSource {
        fn name(&self) -> &'static str {
            "static"
        }

        async fn list_challenges(
            &self,
            filters: &ChallengeFilters,
        ) -> Result<Vec<Challenge>, ClientError> {
            self.record()?;
            *self.last_challenge_filters.lock().unwrap() = Some(filters.clone());
            Ok(self
                .challenges
                .iter()
                .filter(|c| filters.statuses.is_empty() || filters.statuses.contains(&c.status))
                .cloned()
                .collect())
        }

        async fn get_challenge(
            &self,
            challenge_id: &str,
        ) -> Result<Option<Challenge>, ClientError> {
            self.record()?;
            Ok(self
                .challenges
                .iter()
                .find(|c| c.challenge_id.as_str() == challenge_id)
                .cloned())
        }

        async fn get_challenge_series(
            &self,
            challenge_id: &str,
        ) -> Result<Vec<ChallengeSeries>, ClientError> {
            self.record()?;
            Ok(self.series.get(challenge_id).cloned().unwrap_or_default())
        }

        async fn get_series_data(
            &self,
            challenge_id: &str,
            series_id: &str,
            start_time: &str,
            _end_time: &str,
        ) -> Result<SeriesData, ClientError> {
            self.record()?;
            let key = format!("{}/{}/{}", challenge_id, series_id, start_time);
            Ok(self.data.get(&key).cloned().unwrap_or_default())
        }

        async fn get_series_forecasts(
            &self,
            challenge_id: &str,
            series_id: &str,
        ) -> Result<ForecastsResponse, ClientError> {
            self.record()?;
            let key = format!("{}/{}", challenge_id, series_id);
            Ok(self.forecasts.get(&key).cloned().unwrap_or_default())
        }

        async fn list_challenge_models(
            &self,
            challenge_id: &str,
        ) -> Result<Vec<Model>, ClientError> {
            self.record()?;
            Ok(self.models.get(challenge_id).cloned().unwrap_or_default())
        }

        async fn get_filter_options(&self) -> Result<FilterOptions, ClientError> {
            self.record()?;
            Ok(self.filter_options.clone())
        }

        async fn get_filtered_rankings(
            &self,
            filters: &RankingFilters,
        ) -> Result<Vec<ModelRanking>, ClientError> {
            self.record()?;
            *self.last_ranking_filters.lock().unwrap() = Some(filters.clone());
            let range = filters.time_range.clone().unwrap_or_default();
            Ok(self.rankings.get(&range).cloned().unwrap_or_default())
        }

        async fn get_model_details(
            &self,
            model_id: &str,
        ) -> Result<Option<ModelDetails>, ClientError> {
            self.record()?;
            Ok(self.model_details.get(model_id).cloned())
        }

        async fn get_model_rankings(
            &self,
            model_id: &str,
        ) -> Result<ModelRankingHistory, ClientError> {
            self.record()?;
            Self::lookup(&self.model_rankings, model_id.to_string())
        }

        async fn get_model_series_by_definition(
            &self,
            model_id: &str,
        ) -> Result<ModelSeriesByDefinition, ClientError> {
            self.record()?;
            Self::lookup(&self.model_series, model_id.to_string())
        }

        async fn get_model_series_forecasts(
            &self,
            model_id: &str,
            definition_id: &str,
            series_id: &str,
            window: &ForecastWindow,
        ) -> Result<ModelSeriesForecasts, ClientError> {
            self.record()?;
            *self.last_forecast_window.lock().unwrap() = Some(window.clone());
            Self::lookup(
                &self.model_forecasts,
                format!("{}/{}/{}", model_id, definition_id, series_id),
            )
        }

        async fn list_definition_rounds(
            &self,
            definition_id: &str,
            query: &RoundPageQuery,
        ) -> Result<DefinitionRoundsPage, ClientError> {
            self.record()?;
            *self.last_round_query.lock().unwrap() = Some(query.clone());
            Self::lookup(&self.definition_rounds, definition_id.to_string())
        }

        async fn get_rounds_metadata(&self) -> Result<RoundsMetadata, ClientError> {
            self.record()?;
            Ok(self.rounds_metadata.clone())
        }
    }

    pub fn challenge(json: &str) -> Challenge {
        serde_json::from_str(json).unwrap()
    }

    pub fn app(source: Arc<StaticSource>) -> axum::Router {
        let state = AppState::new(source, &CacheConfig::default());
        build_router(state, false, "*")
    }

    pub async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::util::ServiceExt;

    #[tokio::test]
    async fn test_health() {
        let (status, json) = get_json(app(Arc::new(StaticSource::default())), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(json["source"], "static");
        assert_eq!(json["cached_pages"], 0);
    }

    #[tokio::test]
    async fn test_health_counts_cached_pages() {
        let src = Arc::new(StaticSource {
            challenges: vec![challenge(r#"{"challenge_id": 1, "status": "active"}"#)],
            ..Default::default()
        });
        let router = app(src);
        let (status, _) = get_json(router.clone(), "/api/v1/challenges/1").await;
        assert_eq!(status, StatusCode::OK);

        let (_, json) = get_json(router, "/health").await;
        assert_eq!(json["cached_pages"], 1);
    }

    #[test]
    fn test_numeric_id() {
        assert_eq!(super::numeric_id("model", "42").unwrap(), "42");
        for bad in ["", "undefined", "4a", "-1", "1.5"] {
            assert!(super::numeric_id("model", bad).is_err(), "{:?}", bad);
        }
    }

    #[tokio::test]
    async fn test_request_id_echoed() {
        let resp = app(Arc::new(StaticSource::default()))
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("x-request-id", "req-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.headers()["x-request-id"], "req-42");
    }

    #[tokio::test]
    async fn test_request_id_generated() {
        let resp = app(Arc::new(StaticSource::default()))
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let id = resp.headers()["x-request-id"].to_str().unwrap();
        assert!(uuid::Uuid::parse_str(id).is_ok());
    }

    #[tokio::test]
    async fn test_unknown_route_404() {
        let (status, _) =
            get_json(app(Arc::new(StaticSource::default())), "/api/v1/nothing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
