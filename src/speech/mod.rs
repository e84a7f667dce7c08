//! Speech bridge: dictation (speech → text) and playback (text → speech).
//!
//! The two machines are independent single-slot state machines. Platform
//! backends sit behind [`SpeechRecognizer`] and [`SpeechSynthesizer`] and
//! report asynchronously through [`DictationEvent`] and [`PlaybackEvent`].
//! Backend faults are logged and reset the affected machine; they never
//! reach the conversation.

pub mod dictation;
pub mod playback;
pub mod sanitize;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub use dictation::{CaptureId, Dictation, DictationEvent, DictationState};
pub use playback::{Playback, PlaybackEvent, PlaybackState, Utterance, UtteranceId};
pub use sanitize::sanitize_for_speech;

use crate::config::{DictationConfig, PlaybackConfig};
use crate::conversation::MessageId;
use crate::error::Result;

/// Speech-to-text capture backend.
pub trait SpeechRecognizer: Send {
    /// Begin capturing audio. Events for this capture must carry `capture`.
    ///
    /// # Errors
    ///
    /// Returns an error if capture cannot start.
    fn start(&mut self, capture: CaptureId, config: &DictationConfig) -> Result<()>;

    /// Stop capturing.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to stop cleanly.
    fn stop(&mut self) -> Result<()>;
}

/// Text-to-speech backend.
pub trait SpeechSynthesizer: Send {
    /// Begin speaking. Completion is reported with [`PlaybackEvent`].
    ///
    /// # Errors
    ///
    /// Returns an error if the utterance cannot be queued.
    fn speak(&mut self, utterance: &Utterance) -> Result<()>;

    /// Cancel whatever is currently being spoken.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to cancel.
    fn cancel(&mut self) -> Result<()>;
}

/// Recognizer for hosts without audio capture.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRecognizer;

impl SpeechRecognizer for NoopRecognizer {
    fn start(&mut self, _capture: CaptureId, _config: &DictationConfig) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Synthesizer for hosts without audio output.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSynthesizer;

impl SpeechSynthesizer for NoopSynthesizer {
    fn speak(&mut self, _utterance: &Utterance) -> Result<()> {
        Ok(())
    }

    fn cancel(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Observable speech state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechStatus {
    pub dictation: DictationState,
    pub interim: String,
    pub playback: PlaybackState,
    /// Most recent backend fault, cleared by the next successful toggle.
    pub last_error: Option<String>,
}

/// Owns both machines and their backends.
pub struct SpeechBridge {
    dictation: Dictation,
    playback: Playback,
    recognizer: Box<dyn SpeechRecognizer>,
    synthesizer: Box<dyn SpeechSynthesizer>,
    dictation_config: DictationConfig,
    playback_config: PlaybackConfig,
    last_error: Option<String>,
}

impl SpeechBridge {
    pub fn new(
        recognizer: Box<dyn SpeechRecognizer>,
        synthesizer: Box<dyn SpeechSynthesizer>,
        dictation_config: DictationConfig,
        playback_config: PlaybackConfig,
    ) -> Self {
        Self {
            dictation: Dictation::new(),
            playback: Playback::new(),
            recognizer,
            synthesizer,
            dictation_config,
            playback_config,
            last_error: None,
        }
    }

    pub fn status(&self) -> SpeechStatus {
        SpeechStatus {
            dictation: self.dictation.state(),
            interim: self.dictation.interim().to_owned(),
            playback: self.playback.state(),
            last_error: self.last_error.clone(),
        }
    }

    pub fn toggle_dictation(&mut self) -> SpeechStatus {
        let result = self
            .dictation
            .toggle(self.recognizer.as_mut(), &self.dictation_config);
        self.record(result.map(|_| ()));
        self.status()
    }

    /// Apply a recognizer event; final segments are appended to `draft`.
    pub fn dictation_event(&mut self, event: DictationEvent, draft: &mut String) -> bool {
        let error = match &event {
            DictationEvent::Error { message, .. } => Some(message.clone()),
            _ => None,
        };
        let accepted = self.dictation.handle(event, draft);
        if accepted && error.is_some() {
            self.last_error = error;
        }
        accepted
    }

    pub fn toggle_playback(&mut self, message: MessageId, text: &str) -> SpeechStatus {
        let result = self.playback.toggle(
            message,
            text,
            self.synthesizer.as_mut(),
            &self.playback_config,
        );
        self.record(result.map(|_| ()));
        self.status()
    }

    pub fn playback_event(&mut self, event: &PlaybackEvent) -> bool {
        let changed = self.playback.handle(event);
        if changed && let PlaybackEvent::Error { message, .. } = event {
            self.last_error = Some(message.clone());
        }
        changed
    }

    fn record(&mut self, result: Result<()>) {
        match result {
            Ok(()) => self.last_error = None,
            Err(e) => {
                warn!(error = %e, "speech backend failed");
                self.last_error = Some(e.to_string());
            }
        }
    }
}

impl Default for SpeechBridge {
    fn default() -> Self {
        Self::new(
            Box::new(NoopRecognizer),
            Box::new(NoopSynthesizer),
            DictationConfig::default(),
            PlaybackConfig::default(),
        )
    }
}
