//! Playback state machine: `Idle → Speaking → Idle`.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::SpeechSynthesizer;
use super::sanitize::sanitize_for_speech;
use crate::config::PlaybackConfig;
use crate::conversation::MessageId;
use crate::error::Result;

/// Identifier of one spoken utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UtteranceId(pub u64);

/// A sanitized utterance handed to the synthesizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    pub id: UtteranceId,
    pub text: String,
    pub language: String,
    pub rate: f32,
    pub pitch: f32,
    pub voice: Option<String>,
}

/// Playback state. `Speaking` records which message is being read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PlaybackState {
    #[default]
    Idle,
    Speaking {
        message: MessageId,
        utterance: UtteranceId,
    },
}

/// Event reported by a synthesizer backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlaybackEvent {
    Finished { utterance: UtteranceId },
    Error { utterance: UtteranceId, message: String },
}

impl PlaybackEvent {
    fn utterance(&self) -> UtteranceId {
        match self {
            Self::Finished { utterance } | Self::Error { utterance, .. } => *utterance,
        }
    }
}

/// Single-slot playback machine.
#[derive(Debug, Default)]
pub struct Playback {
    state: PlaybackState,
    next_utterance: u64,
}

impl Playback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Speak `text` for `message`, or stop if that message is already playing.
    ///
    /// Any other active utterance is cancelled first.
    ///
    /// # Errors
    ///
    /// Returns the backend error if cancelling or speaking fails; the machine
    /// is left in `Idle`.
    pub fn toggle(
        &mut self,
        message: MessageId,
        text: &str,
        synthesizer: &mut dyn SpeechSynthesizer,
        config: &PlaybackConfig,
    ) -> Result<PlaybackState> {
        if let PlaybackState::Speaking { message: current, .. } = self.state {
            self.state = PlaybackState::Idle;
            synthesizer.cancel()?;
            if current == message {
                debug!(%message, "playback stopped");
                return Ok(self.state);
            }
        }

        self.next_utterance += 1;
        let utterance = Utterance {
            id: UtteranceId(self.next_utterance),
            text: sanitize_for_speech(text, &config.code_block_phrase),
            language: config.language.clone(),
            rate: config.rate,
            pitch: config.pitch,
            voice: config.voice.clone(),
        };
        synthesizer.speak(&utterance)?;
        self.state = PlaybackState::Speaking {
            message,
            utterance: utterance.id,
        };
        debug!(%message, utterance = utterance.id.0, "playback started");
        Ok(self.state)
    }

    /// Apply a backend event. Events for anything but the active utterance
    /// are ignored. Returns whether the state changed.
    pub fn handle(&mut self, event: &PlaybackEvent) -> bool {
        let PlaybackState::Speaking { utterance, .. } = self.state else {
            return false;
        };
        if event.utterance() != utterance {
            debug!(stale = event.utterance().0, "ignoring stale playback event");
            return false;
        }
        if let PlaybackEvent::Error { message, .. } = event {
            warn!(error = %message, "playback failed");
        }
        self.state = PlaybackState::Idle;
        true
    }
}
