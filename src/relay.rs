use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::constants::{
    COMPLETION_MARKER, MAX_REPLY_TOKENS, OPENING_USER_MESSAGE, RELAY_FAILURE_MESSAGE, SYSTEM_PROMPT,
};
use crate::server::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in the conversation, tagged with its speaker. The same shape
/// travels on both wires: browser to relay and relay to the model service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Request body for `POST /api/chat`: the full conversation so far.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<Turn>,
}

/// Success body for `POST /api/chat`.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub message: String,
    pub is_complete: bool,
}

/// Failure body for `POST /api/chat`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Turn a raw model reply into the text shown to the user plus the
/// completion flag. The questionnaire is finished when the reply contains
/// the completion marker; every occurrence of the marker is removed and the
/// surrounding whitespace trimmed before the text leaves the server.
pub fn resolve_reply(raw: &str) -> (String, bool) {
    let is_complete = raw.contains(COMPLETION_MARKER);
    let message = raw.replace(COMPLETION_MARKER, "").trim().to_string();
    (message, is_complete)
}

/// `POST /api/chat`. Forwards the conversation to the model service exactly
/// once and normalizes its reply. An empty conversation is the start signal:
/// the relay substitutes a single synthetic opening turn so the model greets
/// the user and asks the first question.
#[instrument(skip_all, fields(turns = request.messages.len()))]
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatReply>, (StatusCode, Json<ErrorBody>)> {
    let mut turns = request.messages;
    if turns.is_empty() {
        turns.push(Turn::user(OPENING_USER_MESSAGE));
    }

    let response = state
        .anthropic
        .complete(SYSTEM_PROMPT, &turns, MAX_REPLY_TOKENS)
        .await
        .map_err(|err| {
            error!(error = %err, "relay call to the model service failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: RELAY_FAILURE_MESSAGE.to_string(),
                }),
            )
        })?;

    let (message, is_complete) = resolve_reply(response.leading_text());
    if is_complete {
        info!("questionnaire reached its final summary");
    }

    Ok(Json(ChatReply {
        message,
        is_complete,
    }))
}
