use super::types::{AiQueryRequest, AiQueryResponse, ErrorResponse, HealthResponse};
use crate::{Error, config::GenerationConfig, model::TextGenerator, query};
use axum::{
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<dyn TextGenerator>,
    pub generation: Arc<GenerationConfig>,
}

type ErrorReply = (StatusCode, Json<ErrorResponse>);

fn error_reply(e: Error) -> ErrorReply {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

/// Only a JSON object is a valid body; arrays would otherwise fill the
/// fields by position.
fn parse_request(body: Value) -> Result<AiQueryRequest, Error> {
    if !body.is_object() {
        return Err(Error::invalid_request("request body must be a JSON object"));
    }
    serde_json::from_value(body).map_err(|e| Error::invalid_request(e.to_string()))
}

pub async fn ai_query(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<AiQueryResponse>, ErrorReply> {
    let request_id = Uuid::new_v4();

    let request = payload
        .map_err(|rejection| Error::invalid_request(rejection.body_text()))
        .and_then(|Json(body)| parse_request(body))
        .map_err(|e| {
            error!(%request_id, "Error processing request: {}", e);
            error_reply(e)
        })?;
    let user_query = request.query.unwrap_or_default();
    let page_data = request.page_data.unwrap_or_default();

    info!(
        %request_id,
        query = %user_query,
        page_data_len = page_data.len(),
        "Received AI query"
    );

    let prompt = query::build_prompt(&page_data, &user_query);
    let generator = Arc::clone(&state.generator);
    let params = Arc::clone(&state.generation);
    let task_prompt = prompt.clone();

    let raw = tokio::task::spawn_blocking(move || generator.generate(&task_prompt, &params))
        .await
        .map_err(|e| Error::internal(format!("generation task failed: {e}")))
        .and_then(|result| result)
        .map_err(|e| {
            error!(%request_id, "Error processing request: {}", e);
            error_reply(e)
        })?;

    let response = query::strip_prompt_echo(&raw, &prompt, &user_query).to_string();
    info!(%request_id, response_len = response.len(), "AI query answered");

    Ok(Json(AiQueryResponse {
        inferred_query: query::inferred_query(&user_query),
        response,
    }))
}

/// CORS preflight for clients that send a bare `OPTIONS`.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        model: state.generator.model_id(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MockTextGenerator;
    use mockall::predicate::{always, eq};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn state_with(mock: MockTextGenerator) -> AppState {
        AppState {
            generator: Arc::new(mock),
            generation: Arc::new(GenerationConfig::default()),
        }
    }

    #[tokio::test]
    async fn test_ai_query_strips_echo() {
        let mut mock = MockTextGenerator::new();
        mock.expect_generate()
            .with(eq("Page Data: docs\nQuery: hi"), always())
            .times(1)
            .returning(|prompt, _| Ok(format!("{prompt} hello there")));

        let request = json!({ "query": "hi", "pageData": "docs" });
        let Json(response) = ai_query(State(state_with(mock)), Ok(Json(request)))
            .await
            .unwrap();

        assert_eq!(response.inferred_query, "Understood as: 'hi'");
        assert_eq!(response.response, "hello there");
    }

    #[tokio::test]
    async fn test_ai_query_maps_generation_error_to_500() {
        let mut mock = MockTextGenerator::new();
        mock.expect_generate()
            .returning(|_, _| Err(Error::generation("out of memory")));

        let (status, Json(body)) = ai_query(State(state_with(mock)), Ok(Json(json!({}))))
        .await
        .unwrap_err();

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "Generation error: out of memory");
    }

    #[test]
    fn test_parse_request_treats_null_as_missing() {
        let request = parse_request(json!({ "query": null, "pageData": "docs" })).unwrap();

        assert_eq!(request.query, None);
        assert_eq!(request.page_data.as_deref(), Some("docs"));
    }

    #[test]
    fn test_parse_request_rejects_non_objects() {
        for body in [json!(["q", "p"]), json!("q"), json!(null), json!(7)] {
            let err = parse_request(body).unwrap_err();
            assert!(matches!(err, Error::InvalidRequest(_)));
        }
    }

    #[tokio::test]
    async fn test_health_reports_model() {
        let mut mock = MockTextGenerator::new();
        mock.expect_model_id().return_const("gpt2-model".to_string());

        let Json(body) = health(State(state_with(mock))).await;

        assert_eq!(body.status, "ok");
        assert_eq!(body.model, "gpt2-model");
    }
}
