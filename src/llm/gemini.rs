//! Google Gemini provider implementation

use super::types::{LlmRequest, LlmResponse, MessageRole, Usage};
use super::{LlmError, LlmService};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

/// Gemini has its own sampling defaults for the narrator
const GEMINI_TEMPERATURE: f32 = 0.8;
const GEMINI_MAX_OUTPUT_TOKENS: u32 = 500;

/// Gemini service implementation
pub struct GeminiService {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiService {
    pub fn new(api_key: String, model: Option<&str>, base_url: Option<&str>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_key,
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            model: model.unwrap_or(DEFAULT_MODEL).to_string(),
        }
    }

    fn translate_request(request: &LlmRequest) -> GeminiRequest {
        let system_text = request
            .messages
            .iter()
            .filter(|m| m.role == MessageRole::System)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let system_instruction = if system_text.is_empty() {
            None
        } else {
            Some(GeminiContent {
                role: None,
                parts: vec![GeminiPart { text: system_text }],
            })
        };

        let contents = request
            .messages
            .iter()
            .filter_map(|m| {
                let role = match m.role {
                    MessageRole::System => return None,
                    MessageRole::User => "user",
                    MessageRole::Assistant => "model",
                };
                Some(GeminiContent {
                    role: Some(role.to_string()),
                    parts: vec![GeminiPart {
                        text: m.content.clone(),
                    }],
                })
            })
            .collect();

        GeminiRequest {
            contents,
            system_instruction,
            generation_config: GeminiGenerationConfig {
                temperature: GEMINI_TEMPERATURE,
                max_output_tokens: GEMINI_MAX_OUTPUT_TOKENS.min(request.sampling.max_tokens),
            },
        }
    }

    fn normalize_response(resp: GeminiResponse) -> Result<LlmResponse, LlmError> {
        let text = resp
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<String>()
            })
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| LlmError::empty_response("No text in Gemini response"))?;

        let usage = resp.usage_metadata.map_or_else(Usage::default, |u| Usage {
            input_tokens: u64::from(u.prompt_token_count),
            output_tokens: u64::from(u.candidates_token_count),
        });

        Ok(LlmResponse { text, usage })
    }

    fn error_message(body: &str) -> String {
        serde_json::from_str::<GeminiErrorResponse>(body)
            .map_or_else(|_| body.to_string(), |e| e.error.message)
    }
}

#[async_trait]
impl LlmService for GeminiService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let gemini_request = Self::translate_request(request);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&gemini_request)
            .send()
            .await
            .map_err(|e| LlmError::from_transport(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(LlmError::from_status(
                status.as_u16(),
                &Self::error_message(&body),
            ));
        }

        let gemini_response: GeminiResponse = serde_json::from_str(&body).map_err(|e| {
            LlmError::unknown(format!("Failed to parse response: {e} - body: {body}"))
        })?;

        Self::normalize_response(gemini_response)
    }

    async fn check_credentials(&self) -> Result<(), LlmError> {
        let url = format!("{}/v1beta/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| LlmError::from_transport(&e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(LlmError::from_status(
            status.as_u16(),
            &Self::error_message(&body),
        ))
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

// Gemini API types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<GeminiUsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiError,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmErrorKind, LlmMessage, SamplingParams};
    use crate::testing::spawn_server;
    use axum::{
        extract::{Path, Query},
        http::StatusCode,
        routing::post,
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    fn request() -> LlmRequest {
        LlmRequest {
            messages: vec![
                LlmMessage::system("Ты ведьмак."),
                LlmMessage::assistant("Подходи, не бойся."),
                LlmMessage::user("Сколько стоит убить утопца?"),
            ],
            sampling: SamplingParams::default(),
        }
    }

    #[test]
    fn test_translate_request_splits_system_and_maps_roles() {
        let wire = serde_json::to_value(GeminiService::translate_request(&request())).unwrap();
        assert_eq!(wire["systemInstruction"]["parts"][0]["text"], "Ты ведьмак.");
        assert_eq!(wire["contents"].as_array().unwrap().len(), 2);
        assert_eq!(wire["contents"][0]["role"], "model");
        assert_eq!(wire["contents"][1]["role"], "user");
        assert_eq!(wire["generationConfig"]["maxOutputTokens"], 500);
    }

    #[tokio::test]
    async fn test_complete_joins_parts() {
        let seen: Arc<Mutex<Option<(String, Option<String>)>>> = Arc::new(Mutex::new(None));
        let seen_handler = seen.clone();
        let app = Router::new().route(
            "/v1beta/models/:call",
            post(
                move |Path(call): Path<String>,
                      Query(q): Query<HashMap<String, String>>,
                      Json(_body): Json<Value>| {
                    let seen = seen_handler.clone();
                    async move {
                        *seen.lock().unwrap() = Some((call, q.get("key").cloned()));
                        Json(json!({
                            "candidates": [{ "content": { "role": "model", "parts": [
                                { "text": "Сто крон. " }, { "text": "Не меньше." }
                            ] } }],
                            "usageMetadata": { "promptTokenCount": 7, "candidatesTokenCount": 4 }
                        }))
                    }
                },
            ),
        );
        let base = spawn_server(app).await;

        let service = GeminiService::new("g-key".to_string(), None, Some(&base));
        let response = service.complete(&request()).await.unwrap();
        assert_eq!(response.text, "Сто крон. Не меньше.");
        assert_eq!(response.usage.output_tokens, 4);

        let (call, key) = seen.lock().unwrap().take().unwrap();
        assert_eq!(call, "gemini-2.0-flash-exp:generateContent");
        assert_eq!(key.as_deref(), Some("g-key"));
    }

    #[tokio::test]
    async fn test_error_status_maps_to_auth() {
        let app = Router::new().route(
            "/v1beta/models/:call",
            post(|| async {
                (
                    StatusCode::FORBIDDEN,
                    Json(json!({ "error": { "code": 403, "message": "API_KEY invalid" } })),
                )
            }),
        );
        let base = spawn_server(app).await;

        let service = GeminiService::new("nope".to_string(), None, Some(&base));
        let err = service.complete(&request()).await.unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::Auth);
        assert!(err.message.contains("API_KEY"));
    }

    #[tokio::test]
    async fn test_no_candidates_is_empty_response() {
        let app = Router::new().route(
            "/v1beta/models/:call",
            post(|| async { Json(json!({ "candidates": [] })) }),
        );
        let base = spawn_server(app).await;

        let service = GeminiService::new("g-key".to_string(), None, Some(&base));
        let err = service.complete(&request()).await.unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::EmptyResponse);
    }
}
