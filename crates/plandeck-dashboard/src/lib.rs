//! Orchestration layer for the planning-history dashboard.
//!
//! The [`Dashboard`] facade owns the filter state, the bundle list, the
//! selection with its detail panes, the chat session, and the optional
//! voice bridges, and sequences them: a filter change reloads the list, a
//! reload may pick a default selection, a selection change loads the detail
//! panes, and an applied detail load resets the chat session.
//!
//! All state lives behind synchronous locks that are never held across an
//! await; every network suspension re-validates against current state
//! before applying its result.

pub mod filter;
pub mod list;
pub mod selection;

use std::sync::Arc;

use plandeck_api::PlanningBackend;
use plandeck_chat::ChatSession;
use plandeck_core::{
    Bundle, ChatTurn, Commit, ErrorSlot, Overview, PlandeckConfig, PlandeckError, Result, Role,
};
use plandeck_voice::{AudioPlaybackBridge, AudioPlayer, SpeechRecognizer, VoiceInputBridge};

pub use filter::{FilterSnapshot, FilterState, DEFAULT_MIN_ACTIVITY};
pub use list::{BundleListLoader, ReloadOutcome};
pub use selection::{DetailLoader, DetailOutcome, SelectionController};

/// The dashboard's client-side state, wired together.
pub struct Dashboard {
    backend: Arc<dyn PlanningBackend>,
    filters: FilterState,
    selection: Arc<SelectionController>,
    list: BundleListLoader,
    detail: DetailLoader,
    chat: ChatSession,
    voice: Option<VoiceInputBridge>,
    playback: Option<AudioPlaybackBridge>,
    voice_locale: String,
    errors: Arc<ErrorSlot>,
}

impl Dashboard {
    /// Build a dashboard without voice capabilities; attach them with
    /// [`Dashboard::with_voice`] when the environment provides them.
    pub fn new(backend: Arc<dyn PlanningBackend>, config: &PlandeckConfig) -> Self {
        let errors = Arc::new(ErrorSlot::new());
        let selection = Arc::new(SelectionController::new());
        Self {
            filters: FilterState::new(config.filters.min_activity),
            list: BundleListLoader::new(
                Arc::clone(&backend),
                Arc::clone(&selection),
                Arc::clone(&errors),
                config.filters.page_size,
            ),
            detail: DetailLoader::new(
                Arc::clone(&backend),
                Arc::clone(&selection),
                Arc::clone(&errors),
            ),
            chat: ChatSession::new(Arc::clone(&backend), Arc::clone(&errors)),
            voice: None,
            playback: None,
            voice_locale: config.voice.locale.clone(),
            selection,
            errors,
            backend,
        }
    }

    /// Attach the voice bridges. A `None` recognizer still wires the input
    /// bridge, which then reports the unsupported-environment error on use.
    pub fn with_voice(
        mut self,
        recognizer: Option<Arc<dyn SpeechRecognizer>>,
        player: Arc<dyn AudioPlayer>,
    ) -> Self {
        self.voice = Some(VoiceInputBridge::new(
            recognizer,
            &self.voice_locale,
            Arc::clone(&self.errors),
        ));
        self.playback = Some(AudioPlaybackBridge::new(
            Arc::clone(&self.backend),
            player,
            Arc::clone(&self.errors),
        ));
        self
    }

    // ---- Control flow ----

    /// Reload the bundle list for the current filters.
    ///
    /// When the reload lands and nothing was selected, the first entry of
    /// the new list is selected, which in turn loads its detail panes and
    /// resets the chat session.
    pub async fn reload_bundles(&self) -> Result<()> {
        let snapshot = self.filters.snapshot();
        match self.list.reload(&snapshot).await? {
            ReloadOutcome::Applied {
                default_selection: Some(id),
            } => self.select(&id).await,
            _ => Ok(()),
        }
    }

    /// Select a bundle and load its detail panes.
    ///
    /// The chat session is reset only when the detail load actually
    /// applied; a load superseded by an even newer selection leaves the
    /// newer selection's state alone.
    pub async fn select(&self, bundle_id: &str) -> Result<()> {
        self.selection.select(bundle_id);
        if self.detail.load().await? == DetailOutcome::Applied {
            self.chat.reset();
        }
        Ok(())
    }

    /// Spawn the refetch loop: every filter mutation triggers a reload.
    ///
    /// The task runs until aborted; reload failures are already reported on
    /// the error slot, so the loop just logs and keeps watching.
    pub fn spawn_filter_watcher(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let dashboard = Arc::clone(self);
        let mut rx = dashboard.filters.subscribe();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                if let Err(e) = dashboard.reload_bundles().await {
                    tracing::warn!("Reload after filter change failed: {}", e);
                }
            }
        })
    }

    // ---- Chat entry points ----

    /// Ask the assistant about the selected bundle.
    pub async fn ask(&self, text: &str) -> Result<()> {
        let Some(bundle_id) = self.selection.current() else {
            return Err(PlandeckError::Chat("no bundle is selected".to_string()));
        };
        self.chat.ask(&bundle_id, text).await
    }

    /// Submit the typed input as a question, clearing the input field.
    pub async fn submit_input(&self) -> Result<()> {
        let text = self.chat.take_input();
        self.ask(&text).await
    }

    /// Capture one spoken utterance and ask it.
    ///
    /// Fails without touching the transcript when voice is not wired up or
    /// recognition fails; the transcript is asked verbatim otherwise.
    pub async fn ask_by_voice(&self) -> Result<()> {
        let Some(voice) = &self.voice else {
            let err = PlandeckError::VoiceUnsupported;
            self.errors.report(&err);
            return Err(err);
        };
        let transcript = voice.capture_utterance().await?;
        self.ask(&transcript).await
    }

    // ---- Speech output ----

    /// Synthesize and play the given text.
    pub async fn speak(&self, text: &str) -> Result<()> {
        let Some(playback) = &self.playback else {
            let err = PlandeckError::Playback("audio output is not available".to_string());
            self.errors.report(&err);
            return Err(err);
        };
        playback.speak(text).await
    }

    /// Read the most recent assistant turn aloud.
    pub async fn speak_last_answer(&self) -> Result<()> {
        let last = self
            .chat
            .transcript()
            .into_iter()
            .rev()
            .find(|turn| turn.role == Role::Assistant);
        match last {
            Some(turn) => self.speak(&turn.text).await,
            None => Ok(()),
        }
    }

    // ---- Read-only snapshots ----

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn bundles(&self) -> Vec<Bundle> {
        self.list.bundles()
    }

    pub fn selected(&self) -> Option<String> {
        self.selection.current()
    }

    pub fn history(&self) -> Vec<Commit> {
        self.detail.history()
    }

    pub fn overview(&self) -> Option<Overview> {
        self.detail.overview()
    }

    pub fn transcript(&self) -> Vec<ChatTurn> {
        self.chat.transcript()
    }

    pub fn is_chat_pending(&self) -> bool {
        self.chat.is_pending()
    }

    pub fn chat_input(&self) -> String {
        self.chat.input()
    }

    pub fn set_chat_input(&self, text: &str) {
        self.chat.set_input(text);
    }

    pub fn is_voice_supported(&self) -> bool {
        self.voice.as_ref().is_some_and(|v| v.is_supported())
    }

    /// The most recent surfaced error, if any.
    pub fn last_error(&self) -> Option<String> {
        self.errors.current()
    }

    pub fn clear_error(&self) {
        self.errors.clear();
    }
}

// =============================================================================
// Tests
// =============================================================================
