//! Backend boundary for the Plandeck client.
//!
//! Defines the [`PlanningBackend`] trait the orchestration layer depends
//! on, the reqwest-based [`HttpBackend`] that talks to the real planning
//! backend, and a programmable [`MockBackend`] for tests.

pub mod http;
pub mod mock;

use async_trait::async_trait;
use thiserror::Error;

use plandeck_core::{AudioClip, Bundle, ChatAnswer, Commit, Overview};

/// Errors from backend requests.
///
/// Callers convert these into the user-visible failure kind at the call
/// site, where they know whether the request was a list fetch, a detail
/// fetch, a chat request, or a synthesis request.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    /// Non-2xx response; `body` carries the diagnostic text, already
    /// truncated for display.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Network(err.to_string())
    }
}

/// Query parameters for a bundle list request.
///
/// `council` and `q` are sent only when non-empty; `min_apps` and `limit`
/// are always sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleQuery {
    pub council: String,
    pub q: String,
    pub min_apps: u32,
    pub limit: u32,
}

impl BundleQuery {
    /// The query pairs to put on the request URL, in a fixed order.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(4);
        if !self.council.is_empty() {
            pairs.push(("council", self.council.clone()));
        }
        if !self.q.is_empty() {
            pairs.push(("q", self.q.clone()));
        }
        pairs.push(("min_apps", self.min_apps.to_string()));
        pairs.push(("limit", self.limit.to_string()));
        pairs
    }
}

/// The five operations the orchestration layer needs from the backend.
///
/// Injected as `Arc<dyn PlanningBackend>` so tests can substitute the
/// mock implementation.
#[async_trait]
pub trait PlanningBackend: Send + Sync {
    /// `GET /bundles` with the given filters.
    async fn list_bundles(&self, query: &BundleQuery) -> Result<Vec<Bundle>, ApiError>;

    /// `GET /repo/{id}` — the bundle's commit history, server order.
    async fn bundle_history(&self, bundle_id: &str) -> Result<Vec<Commit>, ApiError>;

    /// `GET /repo/{id}/overview` — the derived summary.
    async fn bundle_overview(&self, bundle_id: &str) -> Result<Overview, ApiError>;

    /// `POST /chat` — ask the assistant a question scoped to a bundle.
    async fn ask_assistant(&self, bundle_id: &str, question: &str)
        -> Result<ChatAnswer, ApiError>;

    /// `POST /tts` — synthesize speech for the given text.
    async fn synthesize_speech(&self, text: &str) -> Result<AudioClip, ApiError>;
}

pub use http::HttpBackend;
pub use mock::{Gate, MockBackend};

// =============================================================================
// Tests
// =============================================================================
