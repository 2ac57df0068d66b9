//! Voice input bridge: one utterance in, one transcribed string out.

use std::sync::Arc;

use plandeck_core::{ErrorSlot, PlandeckError, Result};

use crate::SpeechRecognizer;

/// Adapts an optional speech-recognition capability into the question
/// pipeline. When the capability is absent the bridge fails immediately
/// and performs no further action.
pub struct VoiceInputBridge {
    recognizer: Option<Arc<dyn SpeechRecognizer>>,
    locale: String,
    errors: Arc<ErrorSlot>,
}

impl VoiceInputBridge {
    pub fn new(
        recognizer: Option<Arc<dyn SpeechRecognizer>>,
        locale: &str,
        errors: Arc<ErrorSlot>,
    ) -> Self {
        Self {
            recognizer,
            locale: locale.to_string(),
            errors,
        }
    }

    /// Whether a recognition capability is wired up at all.
    pub fn is_supported(&self) -> bool {
        self.recognizer.is_some()
    }

    /// Capture one utterance and return its final transcript.
    ///
    /// One invocation is one single-shot recognition session: no retry,
    /// no multi-utterance capture. Errors are reported on the slot and
    /// returned to the caller, who must not issue an ask for them.
    pub async fn capture_utterance(&self) -> Result<String> {
        let Some(recognizer) = &self.recognizer else {
            self.errors.report(&PlandeckError::VoiceUnsupported);
            return Err(PlandeckError::VoiceUnsupported);
        };
        match recognizer.recognize_once(&self.locale).await {
            Ok(transcript) => {
                tracing::debug!(locale = %self.locale, "Utterance captured");
                Ok(transcript)
            }
            Err(e) => {
                self.errors.report(&e);
                Err(e)
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
