//! Dictation state machine: `Idle → Listening → Idle`.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::SpeechRecognizer;
use crate::config::DictationConfig;
use crate::error::Result;

/// Identifier of one capture session, from start to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaptureId(pub u64);

/// Dictation capture state. `Listening` records the active capture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DictationState {
    #[default]
    Idle,
    Listening { capture: CaptureId },
}

/// Event reported by a recognizer backend, tagged with its capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DictationEvent {
    /// Provisional transcript; may still change.
    Interim { capture: CaptureId, text: String },
    /// Finalised transcript segment.
    Final { capture: CaptureId, text: String },
    /// Capture fault.
    Error { capture: CaptureId, message: String },
    /// The backend stopped on its own.
    Ended { capture: CaptureId },
}

impl DictationEvent {
    fn capture(&self) -> CaptureId {
        match self {
            Self::Interim { capture, .. }
            | Self::Final { capture, .. }
            | Self::Error { capture, .. }
            | Self::Ended { capture } => *capture,
        }
    }
}

/// Single-slot dictation machine.
///
/// Interim text is tracked separately and never touches the input buffer;
/// only final segments are appended, each followed by one space.
#[derive(Debug, Default)]
pub struct Dictation {
    state: DictationState,
    interim: String,
    next_capture: u64,
}

impl Dictation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DictationState {
        self.state
    }

    /// Current provisional transcript.
    pub fn interim(&self) -> &str {
        &self.interim
    }

    /// Start or stop capture.
    ///
    /// # Errors
    ///
    /// Returns the backend error if capture cannot start or stop; the machine
    /// is left in `Idle` either way.
    pub fn toggle(
        &mut self,
        recognizer: &mut dyn SpeechRecognizer,
        config: &DictationConfig,
    ) -> Result<DictationState> {
        match self.state {
            DictationState::Listening { capture } => {
                self.reset();
                recognizer.stop()?;
                debug!(capture = capture.0, "dictation stopped");
            }
            DictationState::Idle => {
                self.next_capture += 1;
                let capture = CaptureId(self.next_capture);
                recognizer.start(capture, config)?;
                self.state = DictationState::Listening { capture };
                debug!(capture = capture.0, language = %config.language, "dictation started");
            }
        }
        Ok(self.state)
    }

    /// Apply a backend event, appending final segments to `draft`.
    ///
    /// Events for anything but the active capture are stale and ignored.
    /// Returns whether the event was accepted.
    pub fn handle(&mut self, event: DictationEvent, draft: &mut String) -> bool {
        let DictationState::Listening { capture } = self.state else {
            debug!(?event, "ignoring dictation event while idle");
            return false;
        };
        if event.capture() != capture {
            debug!(?event, active = capture.0, "ignoring stale dictation event");
            return false;
        }
        match event {
            DictationEvent::Interim { text, .. } => {
                self.interim = text;
            }
            DictationEvent::Final { text, .. } => {
                self.interim.clear();
                let segment = text.trim();
                if segment.is_empty() {
                    return false;
                }
                draft.push_str(segment);
                draft.push(' ');
            }
            DictationEvent::Error { message, .. } => {
                warn!(error = %message, "dictation failed");
                self.reset();
            }
            DictationEvent::Ended { .. } => self.reset(),
        }
        true
    }

    fn reset(&mut self) {
        self.state = DictationState::Idle;
        self.interim.clear();
    }
}
