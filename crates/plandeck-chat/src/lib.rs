//! Conversational session scoped to the currently selected bundle.
//!
//! Owns the transcript, the pending-request indicator, and the pending
//! question-input text. The transcript is a log of completed exchanges:
//! user turns append synchronously at ask time, assistant turns append in
//! response-arrival order.

pub mod session;

pub use session::{ChatSession, FALLBACK_MESSAGE, INTRO_MESSAGE};
