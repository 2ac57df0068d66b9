//! Voice capability boundary: speech-to-text input and synthesized-speech
//! playback.
//!
//! The browser-style capabilities are abstracted behind small injected
//! traits so the bridges can be exercised with fakes. Mock implementations
//! ship here for use by downstream tests.

pub mod input;
pub mod playback;

use std::sync::{Arc, Mutex, Weak};

use async_trait::async_trait;

use plandeck_core::{AudioClip, PlandeckError};

pub use input::VoiceInputBridge;
pub use playback::AudioPlaybackBridge;

// =============================================================================
// Capability traits
// =============================================================================

/// A speech-recognition capability keyed by a BCP-47 locale tag.
///
/// One call is one single-shot, non-interim recognition session resolving
/// with the first final transcript.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn recognize_once(&self, locale: &str) -> Result<String, PlandeckError>;
}

/// An audio-playback capability accepting a synthesized clip.
///
/// Playback begins immediately; the returned handle keeps the clip alive
/// for the duration of playback.
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    async fn play(&self, clip: AudioClip) -> Result<PlaybackHandle, PlandeckError>;
}

/// Ownership token for a clip that is (or was) being played.
///
/// The playback bridge retains the latest handle; dropping it releases the
/// underlying clip. A new `speak` supersedes and drops the previous handle.
#[derive(Debug)]
pub struct PlaybackHandle {
    clip: Arc<AudioClip>,
}

impl PlaybackHandle {
    pub fn new(clip: Arc<AudioClip>) -> Self {
        Self { clip }
    }

    pub fn clip(&self) -> &AudioClip {
        &self.clip
    }
}

// =============================================================================
// Mock implementations
// =============================================================================

/// Mock recognizer returning a fixed transcript and recording the locales
/// it was asked for.
#[derive(Debug, Default)]
pub struct MockSpeechRecognizer {
    transcript: String,
    fail: bool,
    locales: Mutex<Vec<String>>,
}

impl MockSpeechRecognizer {
    pub fn with_transcript(transcript: &str) -> Self {
        Self {
            transcript: transcript.to_string(),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Locales of every recognition session started so far.
    pub fn locales(&self) -> Vec<String> {
        self.locales.lock().expect("mock locales mutex poisoned").clone()
    }
}

#[async_trait]
impl SpeechRecognizer for MockSpeechRecognizer {
    async fn recognize_once(&self, locale: &str) -> Result<String, PlandeckError> {
        self.locales
            .lock()
            .expect("mock locales mutex poisoned")
            .push(locale.to_string());
        if self.fail {
            return Err(PlandeckError::Recognition(
                "recognition aborted".to_string(),
            ));
        }
        Ok(self.transcript.clone())
    }
}

/// Mock player that keeps weak references to played clips, so tests can
/// observe when a superseded clip is actually released.
#[derive(Debug, Default)]
pub struct MockAudioPlayer {
    fail: bool,
    played: Mutex<Vec<Weak<AudioClip>>>,
}

impl MockAudioPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Weak handles to every clip handed to `play`, in order.
    pub fn played(&self) -> Vec<Weak<AudioClip>> {
        self.played.lock().expect("mock played mutex poisoned").clone()
    }
}

#[async_trait]
impl AudioPlayer for MockAudioPlayer {
    async fn play(&self, clip: AudioClip) -> Result<PlaybackHandle, PlandeckError> {
        if self.fail {
            return Err(PlandeckError::Playback("no output device".to_string()));
        }
        let clip = Arc::new(clip);
        self.played
            .lock()
            .expect("mock played mutex poisoned")
            .push(Arc::downgrade(&clip));
        tracing::debug!(bytes = clip.bytes.len(), "Mock playback started");
        Ok(PlaybackHandle::new(clip))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_recognizer_returns_transcript() {
        let recognizer = MockSpeechRecognizer::with_transcript("what happened last year");
        let text = recognizer.recognize_once("en-GB").await.unwrap();
        assert_eq!(text, "what happened last year");
        assert_eq!(recognizer.locales(), vec!["en-GB".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_recognizer_failure() {
        let recognizer = MockSpeechRecognizer::failing();
        assert!(recognizer.recognize_once("en-GB").await.is_err());
    }

    #[tokio::test]
    async fn test_mock_player_returns_live_handle() {
        let player = MockAudioPlayer::new();
        let handle = player.play(AudioClip::mpeg(vec![1, 2, 3])).await.unwrap();
        assert_eq!(handle.clip().bytes, vec![1, 2, 3]);
        assert!(player.played()[0].upgrade().is_some());
    }

    #[tokio::test]
    async fn test_dropping_handle_releases_clip() {
        let player = MockAudioPlayer::new();
        let handle = player.play(AudioClip::mpeg(vec![9])).await.unwrap();
        drop(handle);
        assert!(player.played()[0].upgrade().is_none());
    }

    #[tokio::test]
    async fn test_mock_player_failure() {
        let player = MockAudioPlayer::failing();
        let result = player.play(AudioClip::mpeg(vec![0])).await;
        assert!(matches!(result, Err(PlandeckError::Playback(_))));
        assert!(player.played().is_empty());
    }
}
