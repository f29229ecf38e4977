use axum::extract::{Path, Query, State};
use axum::Json;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::{DefinitionRoundsPage, RoundPageQuery, RoundsMetadata};

/// One page of the rounds run under a benchmark definition.
pub async fn definition_rounds(
    State(state): State<AppState>,
    Path(definition_id): Path<String>,
    Query(query): Query<RoundPageQuery>,
) -> Result<Json<DefinitionRoundsPage>, ApiError> {
    let definition_id = definition_id.trim();
    if definition_id.is_empty() || definition_id == "undefined" {
        return Err(ApiError::BadRequest("Invalid definition ID".to_string()));
    }
    Ok(Json(
        state
            .source
            .list_definition_rounds(definition_id, &query)
            .await?,
    ))
}

pub async fn rounds_metadata(
    State(state): State<AppState>,
) -> Result<Json<RoundsMetadata>, ApiError> {
    Ok(Json(state.source.get_rounds_metadata().await?))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use axum::http::StatusCode;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::api::routes::test_support::*;

    fn source() -> StaticSource {
        StaticSource {
            definition_rounds: HashMap::from([(
                "4".to_string(),
                serde_json::from_str(
                    r#"{"items": [{"id": 12, "round_name": "Day-ahead load #12",
                                   "status": "active", "horizon": 24.0}],
                        "pagination": {"page": 2, "page_size": 1, "total_items": 3,
                                       "total_pages": 3, "has_next": true,
                                       "has_previous": true}}"#,
                )
                .unwrap(),
            )]),
            rounds_metadata: RoundsMetadata {
                statuses: vec!["active".to_string(), "completed".to_string()],
                frequencies: vec!["PT1H".to_string()],
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_definition_rounds_page() {
        let src = Arc::new(source());
        let (status, json) = get_json(
            app(src.clone()),
            "/api/v1/definitions/4/rounds?page=2&page_size=1&status=active",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["items"][0]["id"], "12");
        assert_eq!(json["items"][0]["horizon"], 24);
        assert_eq!(json["pagination"]["has_next"], true);

        let query = src.last_round_query.lock().unwrap().clone().unwrap();
        assert_eq!(
            query,
            RoundPageQuery {
                page: Some(2),
                page_size: Some(1),
                status: Some("active".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_definition_rounds_invalid_id() {
        let src = Arc::new(source());
        let (status, json) = get_json(app(src.clone()), "/api/v1/definitions/undefined/rounds").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
        assert_eq!(src.call_count(), 0);
    }

    #[tokio::test]
    async fn test_definition_rounds_unknown() {
        let (status, _) = get_json(app(Arc::new(source())), "/api/v1/definitions/9/rounds").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_rounds_metadata() {
        let (status, json) = get_json(app(Arc::new(source())), "/api/v1/rounds/metadata").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["statuses"], serde_json::json!(["active", "completed"]));
        assert_eq!(json["domains"], serde_json::json!([]));
    }
}
