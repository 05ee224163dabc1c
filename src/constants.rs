// Fixed questionnaire text plus environment-tunable defaults for the
// Anthropic client. The completion contract (prompt + marker) lives here so
// the relay and its tests share one definition.

use std::env;

/// Instructional preamble sent as the `system` field of every model call.
/// The questionnaire ends when the model emits [`COMPLETION_MARKER`].
pub const SYSTEM_PROMPT: &str = r#"You are a knowledgeable and friendly garden design consultant conducting an interactive questionnaire. Your goal is to understand the client's garden preferences through natural conversation.

You need to gather information about:
1. Garden style preferences (modern, cottage, formal, wild, Mediterranean, Japanese, etc.)
2. Plant preferences (flowers, vegetables, herbs, trees, shrubs, etc.)
3. How they use their garden (entertaining, relaxation, growing food, children's play, wildlife, etc.)
4. The feelings and atmosphere they want to create (peaceful, vibrant, romantic, productive, etc.)

Guidelines:
- Ask ONE question at a time to keep the conversation natural and engaging
- Build upon their previous answers to ask relevant follow-up questions
- Show enthusiasm for their preferences
- Ask open-ended questions that encourage detailed responses
- Occasionally reflect back what you've learned to ensure understanding
- Use specific examples to help them articulate their vision
- After gathering comprehensive information (typically 8-12 exchanges), create a detailed summary

When you have enough information, provide a comprehensive summary that includes:
- Their preferred garden style(s)
- Specific plants they mentioned or that would suit them
- How they plan to use the garden
- The atmosphere and feelings they want to create
- Recommendations based on their answers

Start the questionnaire at the beginning, then end with "QUESTIONNAIRE_COMPLETE" on a new line when you've provided the final summary."#;

/// Literal token the model emits once the final summary has been delivered.
/// Stripped from every reply before it reaches the user.
pub const COMPLETION_MARKER: &str = "QUESTIONNAIRE_COMPLETE";

/// Synthetic user turn substituted when the relay receives an empty
/// conversation, so the model always sees at least one turn.
pub const OPENING_USER_MESSAGE: &str = "Hello, I'd like to start the garden questionnaire.";

/// Apology shown in place of a reply when the very first relay call cannot
/// be reached at all.
pub const START_FAILURE_APOLOGY: &str =
    "Sorry, there was an error starting the questionnaire. Please refresh and try again.";

/// Apology appended when a later relay call cannot be reached; earlier turns
/// are kept so the user can simply send again.
pub const SEND_FAILURE_APOLOGY: &str =
    "Sorry, there was an error processing your response. Please try again.";

/// Error text returned to the browser when the upstream model call fails.
/// Deliberately generic; the cause is only ever logged server-side.
pub const RELAY_FAILURE_MESSAGE: &str = "Failed to process request";

/// Upper bound on the model's reply length, in tokens.
pub const MAX_REPLY_TOKENS: u32 = 1024;

// Use lazy_static to initialize env-backed defaults safely.
lazy_static::lazy_static! {
    pub static ref ANTHROPIC_API_URL: String = env::var("ANTHROPIC_API_URL")
        .unwrap_or_else(|_| "https://api.anthropic.com".to_string());
    pub static ref TRELLIS_CHAT_MODEL: String = env::var("TRELLIS_CHAT_MODEL")
        .unwrap_or_else(|_| "claude-3-5-sonnet-20241022".to_string());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_instructs_the_completion_marker() {
        // The prompt inlines the marker for the model's benefit; the two
        // definitions must stay in sync.
        assert!(SYSTEM_PROMPT.contains(COMPLETION_MARKER));
    }

    #[test]
    fn marker_has_no_surrounding_whitespace() {
        assert_eq!(COMPLETION_MARKER, COMPLETION_MARKER.trim());
    }
}
