use std::sync::Mutex;

use thiserror::Error;

/// Top-level error type for the Plandeck client core.
///
/// Each variant corresponds to one user-visible failure kind. All of them
/// are non-fatal: callers convert the error into a short message on the
/// shared [`ErrorSlot`] and the application keeps running. Subsystem crates
/// (e.g. the HTTP backend) define their own error types and are converted
/// at the call site, where the failure kind is known.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PlandeckError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bundle list fetch failed: {0}")]
    ListFetch(String),

    #[error("Detail fetch failed: {0}")]
    DetailFetch(String),

    #[error("Assistant request failed: {0}")]
    Chat(String),

    #[error("Speech recognition is not available in this environment")]
    VoiceUnsupported,

    #[error("Speech recognition failed: {0}")]
    Recognition(String),

    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),

    #[error("Audio playback failed: {0}")]
    Playback(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for PlandeckError {
    fn from(err: toml::de::Error) -> Self {
        PlandeckError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for PlandeckError {
    fn from(err: toml::ser::Error) -> Self {
        PlandeckError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for PlandeckError {
    fn from(err: serde_json::Error) -> Self {
        PlandeckError::Serialization(err.to_string())
    }
}

/// Convenience Result alias used across all Plandeck crates.
pub type Result<T> = std::result::Result<T, PlandeckError>;

/// Single "last error" cell shared by every component.
///
/// The presentation layer displays at most one error at a time; a new
/// report overwrites the previous one. Components never read each other's
/// errors, they only write here.
#[derive(Debug, Default)]
pub struct ErrorSlot {
    last: Mutex<Option<String>>,
}

impl ErrorSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error, replacing whatever was there before.
    pub fn report(&self, err: &PlandeckError) {
        let message = err.to_string();
        tracing::warn!(error = %message, "Surfaced to error slot");
        *self.last.lock().expect("error slot mutex poisoned") = Some(message);
    }

    /// The most recently reported error message, if any.
    pub fn current(&self) -> Option<String> {
        self.last.lock().expect("error slot mutex poisoned").clone()
    }

    /// Dismiss the current error.
    pub fn clear(&self) {
        *self.last.lock().expect("error slot mutex poisoned") = None;
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PlandeckError::ListFetch("HTTP 502".to_string());
        assert_eq!(err.to_string(), "Bundle list fetch failed: HTTP 502");

        let err = PlandeckError::DetailFetch("history: timed out".to_string());
        assert_eq!(err.to_string(), "Detail fetch failed: history: timed out");

        let err = PlandeckError::Chat("HTTP 500".to_string());
        assert_eq!(err.to_string(), "Assistant request failed: HTTP 500");

        let err = PlandeckError::VoiceUnsupported;
        assert_eq!(
            err.to_string(),
            "Speech recognition is not available in this environment"
        );

        let err = PlandeckError::Synthesis("no voice configured".to_string());
        assert_eq!(err.to_string(), "Speech synthesis failed: no voice configured");

        let err = PlandeckError::Playback("device busy".to_string());
        assert_eq!(err.to_string(), "Audio playback failed: device busy");
    }

    #[test]
    fn test_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: PlandeckError = io.into();
        assert!(matches!(err, PlandeckError::Io(_)));
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let bad: std::result::Result<u32, _> = serde_json::from_str("not json");
        let err: PlandeckError = bad.unwrap_err().into();
        assert!(matches!(err, PlandeckError::Serialization(_)));
    }

    #[test]
    fn test_error_from_toml() {
        let bad: std::result::Result<toml::Value, _> = toml::from_str("= broken");
        let err: PlandeckError = bad.unwrap_err().into();
        assert!(matches!(err, PlandeckError::Config(_)));
    }

    #[test]
    fn test_slot_starts_empty() {
        let slot = ErrorSlot::new();
        assert!(slot.current().is_none());
    }

    #[test]
    fn test_slot_report_and_read() {
        let slot = ErrorSlot::new();
        slot.report(&PlandeckError::ListFetch("boom".to_string()));
        assert_eq!(
            slot.current().unwrap(),
            "Bundle list fetch failed: boom"
        );
    }

    #[test]
    fn test_slot_overwrites_previous() {
        let slot = ErrorSlot::new();
        slot.report(&PlandeckError::ListFetch("first".to_string()));
        slot.report(&PlandeckError::Chat("second".to_string()));
        assert_eq!(
            slot.current().unwrap(),
            "Assistant request failed: second"
        );
    }

    #[test]
    fn test_slot_clear() {
        let slot = ErrorSlot::new();
        slot.report(&PlandeckError::VoiceUnsupported);
        slot.clear();
        assert!(slot.current().is_none());
    }

    #[test]
    fn test_slot_shared_across_threads() {
        use std::sync::Arc;
        use std::thread;

        let slot = Arc::new(ErrorSlot::new());
        let mut handles = Vec::new();
        for i in 0..8 {
            let slot = Arc::clone(&slot);
            handles.push(thread::spawn(move || {
                slot.report(&PlandeckError::Chat(format!("worker {}", i)));
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        // One of the reports won; the slot holds exactly one message.
        assert!(slot.current().unwrap().starts_with("Assistant request failed: worker"));
    }
}
