use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use tracing::{debug, error, instrument};

use crate::constants;
use crate::relay::Turn;

const ANTHROPIC_API_VERSION: &str = "2023-06-01";

// Structures matching the Anthropic /v1/messages endpoint
#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: &'a [Turn],
}

/// One block of reply content. Only text blocks are consumed; anything else
/// the model sends (tool use, thinking, future block kinds) is carried as
/// `Other` rather than failing deserialization.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

/// The subset of the Messages API response this application reads.
#[derive(Debug, Deserialize)]
pub struct MessageResponse {
    pub id: String,
    pub content: Vec<ContentBlock>,
    pub stop_reason: Option<String>,
}

impl MessageResponse {
    /// Text of the first content block, or the empty string when the first
    /// block is missing or non-textual.
    pub fn leading_text(&self) -> &str {
        match self.content.first() {
            Some(ContentBlock::Text { text }) => text,
            _ => "",
        }
    }
}

#[derive(Debug, Error)]
pub enum AnthropicError {
    #[error("ANTHROPIC_API_KEY is not set")]
    MissingApiKey,

    #[error("request to the Anthropic API failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Anthropic API error ({status} {kind}): {message}")]
    Api {
        status: u16,
        kind: String,
        message: String,
    },
}

/// Handle to the Anthropic Messages API. Built once at startup and passed
/// into the router state; never constructed per request.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl AnthropicClient {
    /// Build a client from `ANTHROPIC_API_KEY`, with the base URL and model
    /// name taken from their env-backed defaults in `constants`.
    pub fn from_env() -> Result<Self, AnthropicError> {
        let api_key = env::var("ANTHROPIC_API_KEY").map_err(|_| AnthropicError::MissingApiKey)?;
        Ok(Self::new(api_key))
    }

    pub fn new(api_key: String) -> Self {
        Self {
            // No request timeout: an in-flight call runs to completion or
            // failure, there is no abort path.
            http: Client::new(),
            api_key,
            base_url: constants::ANTHROPIC_API_URL.clone(),
            model: constants::TRELLIS_CHAT_MODEL.clone(),
        }
    }

    /// Point the client at a different endpoint (tests aim this at a mock
    /// server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Single best-effort call to the Messages API. No retries; every
    /// failure is returned to the caller.
    #[instrument(skip(self, system, turns), fields(model = %self.model, turns = turns.len()))]
    pub async fn complete(
        &self,
        system: &str,
        turns: &[Turn],
        max_tokens: u32,
    ) -> Result<MessageResponse, AnthropicError> {
        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let payload = MessagesRequest {
            model: &self.model,
            max_tokens,
            system,
            messages: turns,
        };

        let response = self
            .http
            .post(&url)
            .header("x-api-key", self.api_key.as_str())
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            let (kind, message) = parse_error_body(&body);
            error!(%status, %kind, "Anthropic API request failed");
            return Err(AnthropicError::Api {
                status,
                kind,
                message,
            });
        }

        let message = response.json::<MessageResponse>().await?;
        debug!(message_id = %message.id, stop_reason = ?message.stop_reason, "received Anthropic reply");
        Ok(message)
    }
}

/// Pull `type` and `message` out of an Anthropic error body, falling back to
/// the raw body when it is not the documented JSON shape.
fn parse_error_body(body: &str) -> (String, String) {
    #[derive(Deserialize)]
    struct ErrorResponse {
        error: Option<ErrorDetail>,
    }

    #[derive(Deserialize)]
    struct ErrorDetail {
        #[serde(rename = "type")]
        kind: Option<String>,
        message: Option<String>,
    }

    let parsed = serde_json::from_str::<ErrorResponse>(body).ok();
    let detail = parsed.and_then(|e| e.error);
    let kind = detail
        .as_ref()
        .and_then(|d| d.kind.clone())
        .unwrap_or_else(|| "api_error".to_string());
    let message = detail
        .and_then(|d| d.message)
        .unwrap_or_else(|| body.to_string());
    (kind, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::Role;
    use serde_json::{json, to_value};

    #[test]
    fn request_serializes_to_the_messages_wire_shape() {
        let turns = vec![
            Turn::new(Role::User, "Hello"),
            Turn::new(Role::Assistant, "Hi! What draws you to gardening?"),
        ];
        let request = MessagesRequest {
            model: "claude-3-5-sonnet-20241022",
            max_tokens: 1024,
            system: "You are a garden design consultant.",
            messages: &turns,
        };

        let json = to_value(&request).unwrap();
        assert_eq!(
            json,
            json!({
                "model": "claude-3-5-sonnet-20241022",
                "max_tokens": 1024,
                "system": "You are a garden design consultant.",
                "messages": [
                    { "role": "user", "content": "Hello" },
                    { "role": "assistant", "content": "Hi! What draws you to gardening?" },
                ],
            })
        );
    }

    #[test]
    fn response_with_text_block_yields_leading_text() {
        let json = json!({
            "id": "msg_01",
            "type": "message",
            "role": "assistant",
            "content": [{ "type": "text", "text": "What style appeals to you?" }],
            "model": "claude-3-5-sonnet-20241022",
            "stop_reason": "end_turn",
        });
        let response: MessageResponse = serde_json::from_value(json).unwrap();
        assert_eq!(response.leading_text(), "What style appeals to you?");
        assert_eq!(response.stop_reason.as_deref(), Some("end_turn"));
    }

    #[test]
    fn non_text_first_block_yields_empty_text() {
        let json = json!({
            "id": "msg_02",
            "content": [
                { "type": "tool_use", "id": "tu_01", "name": "lookup", "input": {} },
                { "type": "text", "text": "ignored: not the first block" },
            ],
            "stop_reason": null,
        });
        let response: MessageResponse = serde_json::from_value(json).unwrap();
        assert_eq!(response.leading_text(), "");
    }

    #[test]
    fn empty_content_yields_empty_text() {
        let json = json!({ "id": "msg_03", "content": [], "stop_reason": null });
        let response: MessageResponse = serde_json::from_value(json).unwrap();
        assert_eq!(response.leading_text(), "");
    }

    #[test]
    fn error_body_parses_documented_shape() {
        let body = r#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#;
        let (kind, message) = parse_error_body(body);
        assert_eq!(kind, "authentication_error");
        assert_eq!(message, "invalid x-api-key");
    }

    #[test]
    fn error_body_falls_back_to_raw_text() {
        let (kind, message) = parse_error_body("upstream proxy exploded");
        assert_eq!(kind, "api_error");
        assert_eq!(message, "upstream proxy exploded");
    }

    #[test]
    fn from_env_requires_the_api_key() {
        // Only this test touches the variable within the unit-test binary.
        std::env::remove_var("ANTHROPIC_API_KEY");
        let result = AnthropicClient::from_env();
        assert!(matches!(result, Err(AnthropicError::MissingApiKey)));
    }
}
