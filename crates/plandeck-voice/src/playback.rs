//! Audio playback bridge: synthesized speech bytes to a live playback
//! resource.

use std::sync::{Arc, Mutex};

use plandeck_api::PlanningBackend;
use plandeck_core::{ErrorSlot, PlandeckError, Result};

use crate::{AudioPlayer, PlaybackHandle};

/// Requests synthesized audio for a piece of text and plays it.
///
/// The bridge exclusively owns the playback resource: the latest
/// [`PlaybackHandle`] is retained so the clip stays valid while it plays,
/// and a newer `speak` supersedes (drops) the previous one. Failures never
/// touch chat state.
pub struct AudioPlaybackBridge {
    backend: Arc<dyn PlanningBackend>,
    player: Arc<dyn AudioPlayer>,
    errors: Arc<ErrorSlot>,
    current: Mutex<Option<PlaybackHandle>>,
}

impl AudioPlaybackBridge {
    pub fn new(
        backend: Arc<dyn PlanningBackend>,
        player: Arc<dyn AudioPlayer>,
        errors: Arc<ErrorSlot>,
    ) -> Self {
        Self {
            backend,
            player,
            errors,
            current: Mutex::new(None),
        }
    }

    /// Synthesize `text` and begin playback immediately.
    pub async fn speak(&self, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            return Err(PlandeckError::Synthesis("text cannot be empty".to_string()));
        }

        let clip = match self.backend.synthesize_speech(text).await {
            Ok(clip) => clip,
            Err(e) => {
                let err = PlandeckError::Synthesis(e.to_string());
                self.errors.report(&err);
                return Err(err);
            }
        };

        match self.player.play(clip).await {
            Ok(handle) => {
                // Supersedes (and thereby releases) any previous clip.
                *self.lock_current() = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.errors.report(&e);
                Err(e)
            }
        }
    }

    /// Whether a clip is currently being retained for playback.
    pub fn has_active_clip(&self) -> bool {
        self.lock_current().is_some()
    }

    /// Release the current playback resource, if any.
    pub fn release(&self) {
        *self.lock_current() = None;
    }

    fn lock_current(&self) -> std::sync::MutexGuard<'_, Option<PlaybackHandle>> {
        self.current.lock().expect("playback handle mutex poisoned")
    }
}

// =============================================================================
// Tests
// =============================================================================
