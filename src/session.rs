use thiserror::Error;

use crate::constants::{SEND_FAILURE_APOLOGY, START_FAILURE_APOLOGY};
use crate::relay::{ChatReply, Turn};

/// Where the session is in its lifecycle. Exactly one relay call may be
/// outstanding, and only while the session is `AwaitingReply`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    NotStarted,
    AwaitingReply,
    AwaitingInput,
    Complete,
}

impl Default for SessionPhase {
    fn default() -> Self {
        SessionPhase::NotStarted
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("the questionnaire is already underway")]
    AlreadyStarted,
    #[error("the questionnaire has not started yet")]
    NotStarted,
    #[error("a reply is still pending")]
    ReplyPending,
    #[error("the questionnaire is complete; restart to begin again")]
    QuestionnaireComplete,
    #[error("nothing to send")]
    EmptyInput,
    #[error("no reply is pending")]
    NoPendingReply,
}

/// The conversation as the user sees it: an ordered list of turns plus the
/// session phase. `start` and `submit` yield the payload to send to the
/// relay; the caller reports the outcome back through `reply_received` or
/// `reply_failed`. The browser view follows this same machine.
#[derive(Debug, Default)]
pub struct ChatSession {
    turns: Vec<Turn>,
    phase: SessionPhase,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn is_complete(&self) -> bool {
        self.phase == SessionPhase::Complete
    }

    /// Whether the user may type and send right now. Drives the enabled
    /// state of the send control.
    pub fn can_submit(&self) -> bool {
        self.phase == SessionPhase::AwaitingInput
    }

    /// Begin the questionnaire. Returns the conversation to send to the
    /// relay, which is empty by definition: the relay substitutes the
    /// opening turn itself.
    pub fn start(&mut self) -> Result<Vec<Turn>, SessionError> {
        if self.phase != SessionPhase::NotStarted {
            return Err(SessionError::AlreadyStarted);
        }
        self.phase = SessionPhase::AwaitingReply;
        Ok(Vec::new())
    }

    /// Append the user's text as a turn and return the full conversation to
    /// send to the relay. Empty or whitespace-only input is rejected without
    /// touching the conversation.
    pub fn submit(&mut self, input: &str) -> Result<Vec<Turn>, SessionError> {
        match self.phase {
            SessionPhase::NotStarted => return Err(SessionError::NotStarted),
            SessionPhase::AwaitingReply => return Err(SessionError::ReplyPending),
            SessionPhase::Complete => return Err(SessionError::QuestionnaireComplete),
            SessionPhase::AwaitingInput => {}
        }
        let text = input.trim();
        if text.is_empty() {
            return Err(SessionError::EmptyInput);
        }
        self.turns.push(Turn::user(text));
        self.phase = SessionPhase::AwaitingReply;
        Ok(self.turns.clone())
    }

    /// Record the relay's reply. The assistant turn is appended even when
    /// the cleaned text is empty, and a completed reply closes the session.
    pub fn reply_received(&mut self, reply: &ChatReply) -> Result<(), SessionError> {
        if self.phase != SessionPhase::AwaitingReply {
            return Err(SessionError::NoPendingReply);
        }
        self.turns.push(Turn::assistant(reply.message.clone()));
        self.phase = if reply.is_complete {
            SessionPhase::Complete
        } else {
            SessionPhase::AwaitingInput
        };
        Ok(())
    }

    /// Record that the pending relay call failed. Prior turns are kept and a
    /// single apology turn is appended, so the user can read what happened
    /// and simply send again. A failure before any turn exists means the
    /// opening call itself never came back.
    pub fn reply_failed(&mut self) -> Result<(), SessionError> {
        if self.phase != SessionPhase::AwaitingReply {
            return Err(SessionError::NoPendingReply);
        }
        let apology = if self.turns.is_empty() {
            START_FAILURE_APOLOGY
        } else {
            SEND_FAILURE_APOLOGY
        };
        self.turns.push(Turn::assistant(apology));
        self.phase = SessionPhase::AwaitingInput;
        Ok(())
    }

    /// Drop every turn and return to the initial phase, as a fresh page
    /// load would. Available at any point in the lifecycle.
    pub fn restart(&mut self) {
        self.turns.clear();
        self.phase = SessionPhase::NotStarted;
    }
}
