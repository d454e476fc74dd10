//! Upstream generation client.
//!
//! [`Generate`] is the seam the chat service calls through; [`GeminiClient`]
//! implements it against the public Gemini REST API. Failures are classified
//! into transient and fatal [`ChatError`]s; nothing is retried here.

mod types;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};

use crate::assembler::OutboundTurn;
use crate::error::ChatError;
use crate::thinking::ThinkingConfig;

use types::{
    Content, ErrorWrapper, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
};

/// Public Gemini REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Everything the provider needs for one generation call.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub model: String,
    pub turns: Vec<OutboundTurn>,
    pub thinking: ThinkingConfig,
}

/// A text generation backend.
#[async_trait]
pub trait Generate: Send + Sync {
    /// Run one generation and return the reply text.
    async fn generate(&self, request: &GenerateRequest) -> Result<String, ChatError>;
}

/// [`Generate`] implementation backed by the Gemini REST API.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl GeminiClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl Generate for GeminiClient {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, ChatError> {
        let body = build_body(request);
        info!(model = %request.model, turns = request.turns.len(), "gemini request");

        let response = self
            .client
            .post(self.endpoint(&request.model))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                let message = format!("Gemini API request failed: {err}");
                if err.is_connect() || err.is_timeout() {
                    ChatError::UpstreamTransient { status: None, message }
                } else {
                    ChatError::UpstreamFatal { status: None, message }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_owned());
            warn!(status = status.as_u16(), "gemini returned an error");
            return Err(map_http_error(status, &body_text));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|err| {
            ChatError::UpstreamFatal {
                status: Some(status.as_u16()),
                message: format!("Failed to parse Gemini response: {err}"),
            }
        })?;

        let reply = extract_text(parsed)?;
        debug!(reply_len = reply.len(), "gemini reply received");
        Ok(reply)
    }
}

fn build_body(request: &GenerateRequest) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: request.turns.iter().map(Content::from).collect(),
        generation_config: GenerationConfig {
            thinking_config: (&request.thinking).into(),
        },
    }
}

/// Concatenate the visible (non-thought) text of the first candidate.
fn extract_text(response: GenerateContentResponse) -> Result<String, ChatError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(ChatError::UpstreamFatal {
            status: None,
            message: format!("Prompt was blocked by the provider: {reason}"),
        });
    }

    let candidate = response.candidates.into_iter().next().ok_or_else(|| {
        ChatError::UpstreamFatal {
            status: None,
            message: "Gemini API returned no candidates".into(),
        }
    })?;

    let text: String = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter(|p| !p.thought)
        .filter_map(|p| p.text)
        .collect();

    if text.is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "UNKNOWN".into());
        return Err(ChatError::UpstreamFatal {
            status: None,
            message: format!("Gemini API returned no text (finish reason: {reason})"),
        });
    }
    Ok(text)
}

fn map_http_error(status: StatusCode, body: &str) -> ChatError {
    let message = serde_json::from_str::<ErrorWrapper>(body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.to_owned());
            if status_text.is_empty() { msg } else { format!("{status_text}: {msg}") }
        })
        .unwrap_or_else(|_| format!("API error {}: {}", status.as_u16(), truncate(body, 200)));

    let transient = matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    );

    let status = Some(status.as_u16());
    if transient {
        ChatError::UpstreamTransient { status, message }
    } else {
        ChatError::UpstreamFatal { status, message }
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::assembler::OutboundPart;
    use crate::conversation::Role;
    use crate::part::AttachmentPart;
    use serde_json::json;

    fn request(thinking: ThinkingConfig) -> GenerateRequest {
        GenerateRequest {
            model: "gemini-2.5-pro".into(),
            turns: vec![
                OutboundTurn {
                    role: Role::User,
                    parts: vec![
                        OutboundPart::Attachment(AttachmentPart::new(&b"hi"[..], "text/plain")),
                        OutboundPart::Text("question".into()),
                    ],
                },
                OutboundTurn { role: Role::Model, parts: vec![OutboundPart::Text("answer".into())] },
            ],
            thinking,
        }
    }

    #[test]
    fn body_uses_camel_case_wire_names() {
        let body = serde_json::to_value(build_body(&request(ThinkingConfig::Budget(4096)))).unwrap();
        assert_eq!(
            body,
            json!({
                "contents": [
                    {"role": "user", "parts": [
                        {"inlineData": {"mimeType": "text/plain", "data": "aGk="}},
                        {"text": "question"}
                    ]},
                    {"role": "model", "parts": [{"text": "answer"}]}
                ],
                "generationConfig": {"thinkingConfig": {"thinkingBudget": 4096}}
            })
        );
    }

    #[test]
    fn level_config_omits_budget() {
        let body = serde_json::to_value(build_body(&request(ThinkingConfig::Level("minimal".into()))))
            .unwrap();
        assert_eq!(
            body["generationConfig"]["thinkingConfig"],
            json!({"thinkingLevel": "minimal"})
        );
    }

    #[test]
    fn reply_skips_thought_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"parts": [
                    {"text": "pondering", "thought": true},
                    {"text": "Hello "},
                    {"text": "world"}
                ]},
                "finishReason": "STOP"
            }]
        }))
        .unwrap();
        assert_eq!(extract_text(response).unwrap(), "Hello world");
    }

    #[test]
    fn blocked_prompt_is_fatal() {
        let response: GenerateContentResponse =
            serde_json::from_value(json!({"promptFeedback": {"blockReason": "SAFETY"}})).unwrap();
        let err = extract_text(response).unwrap_err();
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn empty_candidate_reports_finish_reason() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"finishReason": "MAX_TOKENS"}]
        }))
        .unwrap();
        assert!(extract_text(response).unwrap_err().to_string().contains("MAX_TOKENS"));
    }

    #[test]
    fn http_errors_are_classified() {
        let body = r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
        let err = map_http_error(StatusCode::TOO_MANY_REQUESTS, body);
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "RESOURCE_EXHAUSTED: Quota exceeded");
        assert_eq!(err.upstream_status(), Some(429));

        let err = map_http_error(StatusCode::BAD_REQUEST, "not json");
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "API error 400: not json");
    }

    #[test]
    fn debug_redacts_key() {
        let client = GeminiClient::new("secret-key", DEFAULT_BASE_URL, Duration::from_secs(5)).unwrap();
        let rendered = format!("{client:?}");
        assert!(!rendered.contains("secret-key"));
        assert_eq!(
            client.endpoint("gemini-2.5-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }
}
