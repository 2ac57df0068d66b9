//! Chat session: transcript management and request/response pairing.

use std::sync::{Arc, Mutex};

use plandeck_api::PlanningBackend;
use plandeck_core::{ChatTurn, ErrorSlot, PlandeckError, Result};

/// Assistant turn the transcript is reset to when a bundle is selected.
pub const INTRO_MESSAGE: &str =
    "Ask me about this site's planning history: approvals, amendments, conditions, \
     or what changed most recently.";

/// Assistant turn appended when the backend request fails.
pub const FALLBACK_MESSAGE: &str =
    "The assistant is unavailable right now. Please try again in a moment.";

#[derive(Debug)]
struct ChatState {
    transcript: Vec<ChatTurn>,
    /// Number of asks currently in flight; the UI shows a waiting
    /// indicator while this is non-zero.
    pending: usize,
    /// Question text typed but not yet submitted.
    input: String,
    /// Bumped by `reset`; completions carrying an older epoch are
    /// discarded so a previous selection's answer never lands in a fresh
    /// transcript.
    epoch: u64,
}

/// A conversation scoped to one selected bundle.
///
/// All mutation happens under one mutex; the lock is never held across an
/// await, so interleaved asks observe a consistent transcript.
pub struct ChatSession {
    backend: Arc<dyn PlanningBackend>,
    errors: Arc<ErrorSlot>,
    state: Mutex<ChatState>,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn PlanningBackend>, errors: Arc<ErrorSlot>) -> Self {
        Self {
            backend,
            errors,
            state: Mutex::new(ChatState {
                transcript: vec![ChatTurn::assistant(INTRO_MESSAGE, Vec::new())],
                pending: 0,
                input: String::new(),
                epoch: 0,
            }),
        }
    }

    /// Replace the transcript with the introductory turn and clear the
    /// pending input. In-flight asks from before the reset will complete
    /// without touching the new transcript.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.epoch += 1;
        state.transcript = vec![ChatTurn::assistant(INTRO_MESSAGE, Vec::new())];
        state.input.clear();
        tracing::debug!(epoch = state.epoch, "Chat session reset");
    }

    /// Ask the assistant a question about `bundle_id`.
    ///
    /// The user turn is appended before any network round trip, so the
    /// caller's message is visible even if the request never returns. A
    /// failed request appends the fixed fallback turn and reports the
    /// diagnostic on the error slot; in that case `ask` still returns
    /// `Ok(())`. Only a precondition violation (empty question) errors.
    pub async fn ask(&self, bundle_id: &str, text: &str) -> Result<()> {
        let question = text.trim().to_string();
        if question.is_empty() {
            return Err(PlandeckError::Chat("question cannot be empty".to_string()));
        }

        let issued_epoch = {
            let mut state = self.lock();
            state.transcript.push(ChatTurn::user(question.clone()));
            state.pending += 1;
            state.epoch
        };

        let result = self.backend.ask_assistant(bundle_id, &question).await;

        let mut state = self.lock();
        state.pending -= 1;
        if state.epoch != issued_epoch {
            tracing::debug!(question = %question, "Discarding answer from a previous session");
            return Ok(());
        }
        match result {
            Ok(answer) => {
                state
                    .transcript
                    .push(ChatTurn::assistant(answer.answer, answer.citations));
            }
            Err(e) => {
                state
                    .transcript
                    .push(ChatTurn::assistant(FALLBACK_MESSAGE, Vec::new()));
                self.errors.report(&PlandeckError::Chat(e.to_string()));
            }
        }
        Ok(())
    }

    /// Snapshot of the transcript in order.
    pub fn transcript(&self) -> Vec<ChatTurn> {
        self.lock().transcript.clone()
    }

    /// Whether any ask is currently awaiting a response.
    pub fn is_pending(&self) -> bool {
        self.lock().pending > 0
    }

    pub fn input(&self) -> String {
        self.lock().input.clone()
    }

    pub fn set_input(&self, text: &str) {
        self.lock().input = text.to_string();
    }

    /// Take the pending input, leaving it empty.
    pub fn take_input(&self) -> String {
        std::mem::take(&mut self.lock().input)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ChatState> {
        self.state.lock().expect("chat state mutex poisoned")
    }
}

// =============================================================================
// Tests
// =============================================================================
