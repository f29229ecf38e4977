//! REST client for the benchmark API.
//!
//! [`BenchmarkSource`] is the seam the server and CLI talk to;
//! [`DashboardClient`] implements it over HTTP with a static `X-API-Key`
//! header. Only `GET` requests are issued.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

use crate::config::ApiConfig;
use crate::models::{
    Challenge, ChallengeFilters, ChallengeSeries, ChallengeStatus, DefinitionRoundsPage,
    FilterOptions, ForecastWindow, ForecastsResponse, Model, ModelDetails, ModelDetailsPayload,
    ModelRanking, ModelRankingHistory, ModelSeriesByDefinition, ModelSeriesForecasts,
    ModelsPayload, RankingFilters, RankingsPayload, RoundPageQuery, RoundsMetadata, SeriesData,
};

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Errors that can occur while talking to the benchmark API.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Read access to challenges, series, forecasts and rankings.
#[async_trait]
pub trait BenchmarkSource: Send + Sync {
    /// Source name for logging.
    fn name(&self) -> &'static str;

    async fn list_challenges(
        &self,
        filters: &ChallengeFilters,
    ) -> Result<Vec<Challenge>, ClientError>;

    /// Challenge metadata, or `None` when the challenge does not exist.
    async fn get_challenge(&self, challenge_id: &str) -> Result<Option<Challenge>, ClientError>;

    async fn get_challenge_series(
        &self,
        challenge_id: &str,
    ) -> Result<Vec<ChallengeSeries>, ClientError>;

    async fn get_series_data(
        &self,
        challenge_id: &str,
        series_id: &str,
        start_time: &str,
        end_time: &str,
    ) -> Result<SeriesData, ClientError>;

    async fn get_series_forecasts(
        &self,
        challenge_id: &str,
        series_id: &str,
    ) -> Result<ForecastsResponse, ClientError>;

    async fn list_challenge_models(&self, challenge_id: &str) -> Result<Vec<Model>, ClientError>;

    async fn get_filter_options(&self) -> Result<FilterOptions, ClientError>;

    async fn get_filtered_rankings(
        &self,
        filters: &RankingFilters,
    ) -> Result<Vec<ModelRanking>, ClientError>;

    /// Model card, or `None` when the model does not exist.
    async fn get_model_details(&self, model_id: &str) -> Result<Option<ModelDetails>, ClientError>;

    /// Daily Elo history of a model, per benchmark definition.
    async fn get_model_rankings(&self, model_id: &str) -> Result<ModelRankingHistory, ClientError>;

    async fn get_model_series_by_definition(
        &self,
        model_id: &str,
    ) -> Result<ModelSeriesByDefinition, ClientError>;

    async fn get_model_series_forecasts(
        &self,
        model_id: &str,
        definition_id: &str,
        series_id: &str,
        window: &ForecastWindow,
    ) -> Result<ModelSeriesForecasts, ClientError>;

    /// One page of the rounds run under a benchmark definition.
    async fn list_definition_rounds(
        &self,
        definition_id: &str,
        query: &RoundPageQuery,
    ) -> Result<DefinitionRoundsPage, ClientError>;

    async fn get_rounds_metadata(&self) -> Result<RoundsMetadata, ClientError>;

    /// Challenges open for registration or announced.
    async fn list_upcoming_challenges(&self) -> Result<Vec<Challenge>, ClientError> {
        self.list_challenges(&ChallengeFilters::with_statuses(&[
            ChallengeStatus::Registration,
            ChallengeStatus::Announced,
        ]))
        .await
    }

    /// Completed challenges that ended at or after `since`.
    async fn list_completed_challenges_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<Challenge>, ClientError> {
        let filters = ChallengeFilters {
            from: Some(since.to_rfc3339()),
            ..ChallengeFilters::with_statuses(&[ChallengeStatus::Completed])
        };
        self.list_challenges(&filters).await
    }
}

/// HTTP client for the benchmark API.
pub struct DashboardClient {
    client: Client,
    base_url: Url,
}

impl DashboardClient {
    /// Create a client from the API section of the application config.
    pub fn new(config: &ApiConfig) -> Result<Self, ClientError> {
        let base_url = Url::parse(config.normalized_base_url())
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if config.has_api_key() {
            let mut key = HeaderValue::from_str(&config.api_key)
                .map_err(|_| ClientError::InvalidUrl("API key is not a valid header value".into()))?;
            key.set_sensitive(true);
            headers.insert(HeaderName::from_static(API_KEY_HEADER), key);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .build()?;

        debug!(
            "Benchmark API: {} (API key configured: {})",
            base_url,
            config.has_api_key()
        );

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URL for `/api/v1/<segments...>`; each segment is percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(format!("{} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(["api", "v1"])
            .extend(segments);
        Ok(url)
    }

    /// Issue a GET and decode the JSON body.
    async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let url = self.endpoint(segments)?;
        debug!("GET {} with params: {:?}", url, query);

        let response = self.client.get(url.clone()).query(query).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(url.path().to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("API request failed: GET {} -> {} {}", url, status, body);
            return Err(ClientError::HttpStatus {
                status: status.as_u16(),
                message: if body.is_empty() {
                    status.canonical_reason().unwrap_or("Unknown").to_string()
                } else {
                    body
                },
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl BenchmarkSource for DashboardClient {
    fn name(&self) -> &'static str {
        "dashboard-api"
    }

    async fn list_challenges(
        &self,
        filters: &ChallengeFilters,
    ) -> Result<Vec<Challenge>, ClientError> {
        let challenges: Vec<Challenge> = self
            .get(&["challenges"], &filters.to_query())
            .await?;
        debug!("list_challenges found {} challenges", challenges.len());
        for c in &challenges {
            debug!(
                "  - ID: {}, Status: {}, Desc: {}",
                c.challenge_id,
                c.status,
                c.description.as_deref().unwrap_or("N/A")
            );
        }
        Ok(challenges)
    }

    async fn get_challenge(&self, challenge_id: &str) -> Result<Option<Challenge>, ClientError> {
        match self
            .get(&["challenges", challenge_id], &[])
            .await
        {
            Ok(challenge) => Ok(Some(challenge)),
            Err(ClientError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn get_challenge_series(
        &self,
        challenge_id: &str,
    ) -> Result<Vec<ChallengeSeries>, ClientError> {
        self.get(&["challenges", challenge_id, "series"], &[]).await
    }

    async fn get_series_data(
        &self,
        challenge_id: &str,
        series_id: &str,
        start_time: &str,
        end_time: &str,
    ) -> Result<SeriesData, ClientError> {
        self.get(
            &["challenges", challenge_id, "series", series_id, "data"],
            &[
                ("start_time", start_time.to_string()),
                ("end_time", end_time.to_string()),
            ],
        )
        .await
    }

    async fn get_series_forecasts(
        &self,
        challenge_id: &str,
        series_id: &str,
    ) -> Result<ForecastsResponse, ClientError> {
        self.get(
            &["challenges", challenge_id, "series", series_id, "forecasts"],
            &[],
        )
        .await
    }

    async fn list_challenge_models(&self, challenge_id: &str) -> Result<Vec<Model>, ClientError> {
        let payload: ModelsPayload = self
            .get(&["challenges", challenge_id, "models"], &[])
            .await?;
        Ok(payload.into_models())
    }

    async fn get_filter_options(&self) -> Result<FilterOptions, ClientError> {
        self.get(&["models", "ranking-filters"], &[]).await
    }

    async fn get_filtered_rankings(
        &self,
        filters: &RankingFilters,
    ) -> Result<Vec<ModelRanking>, ClientError> {
        let payload: RankingsPayload = self
            .get(&["models", "rankings"], &filters.to_query())
            .await?;
        Ok(payload.into_rankings())
    }

    async fn get_model_details(&self, model_id: &str) -> Result<Option<ModelDetails>, ClientError> {
        match self.get::<ModelDetailsPayload>(&["models", model_id], &[]).await {
            Ok(payload) => Ok(payload.into_first()),
            Err(ClientError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn get_model_rankings(&self, model_id: &str) -> Result<ModelRankingHistory, ClientError> {
        self.get(&["models", model_id, "rankings"], &[]).await
    }

    async fn get_model_series_by_definition(
        &self,
        model_id: &str,
    ) -> Result<ModelSeriesByDefinition, ClientError> {
        self.get(&["models", model_id, "series-by-definition"], &[])
            .await
    }

    async fn get_model_series_forecasts(
        &self,
        model_id: &str,
        definition_id: &str,
        series_id: &str,
        window: &ForecastWindow,
    ) -> Result<ModelSeriesForecasts, ClientError> {
        self.get(
            &[
                "models",
                model_id,
                "definitions",
                definition_id,
                "series",
                series_id,
                "forecasts",
            ],
            &window.to_query(),
        )
        .await
    }

    async fn list_definition_rounds(
        &self,
        definition_id: &str,
        query: &RoundPageQuery,
    ) -> Result<DefinitionRoundsPage, ClientError> {
        let page: DefinitionRoundsPage = self
            .get(&["definitions", definition_id, "rounds"], &query.to_query())
            .await?;
        debug!(
            "Definition {}: {} rounds on page {} of {}",
            definition_id,
            page.items.len(),
            page.pagination.page,
            page.pagination.total_pages
        );
        Ok(page)
    }

    async fn get_rounds_metadata(&self) -> Result<RoundsMetadata, ClientError> {
        self.get(&["rounds", "metadata"], &[]).await
    }
}
