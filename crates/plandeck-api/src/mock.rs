//! Programmable in-memory backend for tests.
//!
//! Downstream crates exercise their race-condition guards against this
//! mock: responses can be parked behind a [`Gate`] so a test controls
//! exactly when each request "arrives", and every request is recorded so
//! tests can assert what was sent.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use plandeck_core::{AudioClip, Bundle, ChatAnswer, Commit, Overview};

use crate::{ApiError, BundleQuery, PlanningBackend};

/// A one-shot latch parking a single mock request.
///
/// The request signals `entered` when it starts waiting; the test releases
/// it with [`Gate::open`]. Both sides tolerate either order thanks to
/// `Notify`'s stored permit.
#[derive(Debug, Default)]
pub struct Gate {
    entered: Notify,
    release: Notify,
}

impl Gate {
    /// Wait until the gated request has been issued.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Let the gated request complete.
    pub fn open(&self) {
        self.release.notify_one();
    }

    async fn pass(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

#[derive(Debug, Default)]
struct MockData {
    bundles: Vec<Bundle>,
    histories: HashMap<String, Vec<Commit>>,
    overviews: HashMap<String, Overview>,
    answers: HashMap<String, ChatAnswer>,
    default_answer: ChatAnswer,
    fail_list: bool,
    fail_history: bool,
    fail_overview: bool,
    fail_chat: bool,
    fail_tts: bool,
    list_queries: Vec<BundleQuery>,
    history_calls: Vec<String>,
    overview_calls: Vec<String>,
    chat_requests: Vec<(String, String)>,
    tts_requests: Vec<String>,
}

/// In-memory [`PlanningBackend`] with programmable data, failures, and
/// per-request gates.
#[derive(Debug, Default)]
pub struct MockBackend {
    data: Mutex<MockData>,
    gates: Mutex<HashMap<String, Arc<Gate>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- Data setup ----

    pub fn set_bundles(&self, bundles: Vec<Bundle>) {
        self.lock_data().bundles = bundles;
    }

    pub fn set_history(&self, bundle_id: &str, commits: Vec<Commit>) {
        self.lock_data().histories.insert(bundle_id.to_string(), commits);
    }

    pub fn set_overview(&self, bundle_id: &str, overview: Overview) {
        self.lock_data().overviews.insert(bundle_id.to_string(), overview);
    }

    /// Answer returned for one specific question.
    pub fn set_answer(&self, question: &str, answer: ChatAnswer) {
        self.lock_data().answers.insert(question.to_string(), answer);
    }

    /// Answer returned when no question-specific answer is registered.
    pub fn set_default_answer(&self, answer: ChatAnswer) {
        self.lock_data().default_answer = answer;
    }

    // ---- Failure injection ----

    pub fn fail_list(&self, fail: bool) {
        self.lock_data().fail_list = fail;
    }

    pub fn fail_history(&self, fail: bool) {
        self.lock_data().fail_history = fail;
    }

    pub fn fail_overview(&self, fail: bool) {
        self.lock_data().fail_overview = fail;
    }

    pub fn fail_chat(&self, fail: bool) {
        self.lock_data().fail_chat = fail;
    }

    pub fn fail_tts(&self, fail: bool) {
        self.lock_data().fail_tts = fail;
    }

    // ---- Gating ----

    /// Install a one-shot gate for the next request with this key. Keys:
    /// `"list"`, `"history/{id}"`, `"overview/{id}"`, `"chat/{question}"`,
    /// `"tts/{text}"`. The gate is consumed by the first matching request;
    /// later requests with the same key pass through.
    pub fn gate(&self, key: &str) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        self.gates
            .lock()
            .expect("mock gates mutex poisoned")
            .insert(key.to_string(), Arc::clone(&gate));
        gate
    }

    async fn wait_gate(&self, key: &str) {
        let gate = {
            let mut gates = self.gates.lock().expect("mock gates mutex poisoned");
            gates.remove(key)
        };
        if let Some(gate) = gate {
            gate.pass().await;
        }
    }

    // ---- Recorded traffic ----

    pub fn list_queries(&self) -> Vec<BundleQuery> {
        self.lock_data().list_queries.clone()
    }

    pub fn history_calls(&self) -> Vec<String> {
        self.lock_data().history_calls.clone()
    }

    pub fn overview_calls(&self) -> Vec<String> {
        self.lock_data().overview_calls.clone()
    }

    pub fn chat_requests(&self) -> Vec<(String, String)> {
        self.lock_data().chat_requests.clone()
    }

    pub fn tts_requests(&self) -> Vec<String> {
        self.lock_data().tts_requests.clone()
    }

    fn lock_data(&self) -> std::sync::MutexGuard<'_, MockData> {
        self.data.lock().expect("mock data mutex poisoned")
    }

    fn failure() -> ApiError {
        ApiError::Status {
            status: 500,
            body: "mock failure".to_string(),
        }
    }
}

#[async_trait]
impl PlanningBackend for MockBackend {
    async fn list_bundles(&self, query: &BundleQuery) -> Result<Vec<Bundle>, ApiError> {
        let (fail, bundles) = {
            let mut data = self.lock_data();
            data.list_queries.push(query.clone());
            (data.fail_list, data.bundles.clone())
        };
        self.wait_gate("list").await;
        if fail {
            return Err(Self::failure());
        }
        Ok(bundles)
    }

    async fn bundle_history(&self, bundle_id: &str) -> Result<Vec<Commit>, ApiError> {
        let (fail, commits) = {
            let mut data = self.lock_data();
            data.history_calls.push(bundle_id.to_string());
            (
                data.fail_history,
                data.histories.get(bundle_id).cloned().unwrap_or_default(),
            )
        };
        self.wait_gate(&format!("history/{}", bundle_id)).await;
        if fail {
            return Err(Self::failure());
        }
        Ok(commits)
    }

    async fn bundle_overview(&self, bundle_id: &str) -> Result<Overview, ApiError> {
        let (fail, overview) = {
            let mut data = self.lock_data();
            data.overview_calls.push(bundle_id.to_string());
            (
                data.fail_overview,
                data.overviews.get(bundle_id).cloned().unwrap_or_default(),
            )
        };
        self.wait_gate(&format!("overview/{}", bundle_id)).await;
        if fail {
            return Err(Self::failure());
        }
        Ok(overview)
    }

    async fn ask_assistant(
        &self,
        bundle_id: &str,
        question: &str,
    ) -> Result<ChatAnswer, ApiError> {
        let (fail, answer) = {
            let mut data = self.lock_data();
            data.chat_requests
                .push((bundle_id.to_string(), question.to_string()));
            (
                data.fail_chat,
                data.answers
                    .get(question)
                    .cloned()
                    .unwrap_or_else(|| data.default_answer.clone()),
            )
        };
        self.wait_gate(&format!("chat/{}", question)).await;
        if fail {
            return Err(Self::failure());
        }
        Ok(answer)
    }

    async fn synthesize_speech(&self, text: &str) -> Result<AudioClip, ApiError> {
        let fail = {
            let mut data = self.lock_data();
            data.tts_requests.push(text.to_string());
            data.fail_tts
        };
        self.wait_gate(&format!("tts/{}", text)).await;
        if fail {
            return Err(Self::failure());
        }
        Ok(AudioClip::mpeg(text.as_bytes().to_vec()))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> BundleQuery {
        BundleQuery {
            council: String::new(),
            q: String::new(),
            min_apps: 5,
            limit: 200,
        }
    }

    #[tokio::test]
    async fn test_mock_returns_configured_bundles() {
        let backend = MockBackend::new();
        backend.set_bundles(vec![Bundle {
            id: "b1".to_string(),
            ..Bundle::default()
        }]);
        let bundles = backend.list_bundles(&query()).await.unwrap();
        assert_eq!(bundles.len(), 1);
        assert_eq!(bundles[0].id, "b1");
    }

    #[tokio::test]
    async fn test_mock_records_queries() {
        let backend = MockBackend::new();
        backend.list_bundles(&query()).await.unwrap();
        let recorded = backend.list_queries();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].min_apps, 5);
    }

    #[tokio::test]
    async fn test_mock_failure_injection() {
        let backend = MockBackend::new();
        backend.fail_chat(true);
        let result = backend.ask_assistant("b1", "anything").await;
        assert!(matches!(result, Err(ApiError::Status { status: 500, .. })));
        // The request was still recorded.
        assert_eq!(backend.chat_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_mock_unknown_history_is_empty() {
        let backend = MockBackend::new();
        let commits = backend.bundle_history("missing").await.unwrap();
        assert!(commits.is_empty());
        assert_eq!(backend.history_calls(), vec!["missing".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_answer_routing() {
        let backend = MockBackend::new();
        backend.set_answer(
            "what happened?",
            ChatAnswer {
                answer: "an approval".to_string(),
                citations: Vec::new(),
            },
        );
        backend.set_default_answer(ChatAnswer {
            answer: "default".to_string(),
            citations: Vec::new(),
        });

        let specific = backend.ask_assistant("b1", "what happened?").await.unwrap();
        assert_eq!(specific.answer, "an approval");
        let fallback = backend.ask_assistant("b1", "something else").await.unwrap();
        assert_eq!(fallback.answer, "default");
    }

    #[tokio::test]
    async fn test_mock_tts_echoes_text_bytes() {
        let backend = MockBackend::new();
        let clip = backend.synthesize_speech("hello").await.unwrap();
        assert_eq!(clip.bytes, b"hello".to_vec());
        assert_eq!(clip.media_type, "audio/mpeg");
        assert_eq!(backend.tts_requests(), vec!["hello".to_string()]);
    }

    #[tokio::test]
    async fn test_gate_parks_and_releases_request() {
        let backend = Arc::new(MockBackend::new());
        backend.set_history("b1", vec![Commit::default()]);
        let gate = backend.gate("history/b1");

        let task = {
            let backend = Arc::clone(&backend);
            tokio::spawn(async move { backend.bundle_history("b1").await })
        };

        gate.entered().await;
        // Request is parked; the call log already has it.
        assert_eq!(backend.history_calls().len(), 1);
        gate.open();
        let commits = task.await.unwrap().unwrap();
        assert_eq!(commits.len(), 1);
    }

    #[tokio::test]
    async fn test_gate_open_before_entered_still_releases() {
        let backend = MockBackend::new();
        let gate = backend.gate("list");
        gate.open();
        // Permit is stored; the request passes straight through.
        let bundles = backend.list_bundles(&query()).await.unwrap();
        assert!(bundles.is_empty());
    }
}
