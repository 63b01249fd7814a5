// src/speech/device.rs
// =============================================================================
// The speech-synthesis device as the narration controller sees it.
//
// A device speaks one utterance at a time. Calls are fire-and-forget; what
// happens afterwards (the utterance finished, failed, or was interrupted by
// a cancel) comes back as `DeviceEvent`s on a channel the owner of the
// device drains and feeds into `NarrationController::handle_event`.
//
// Every event names the utterance it belongs to, so a late "interrupted"
// from a cancelled utterance can never be mistaken for the end of the one
// that replaced it.
// =============================================================================

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Identifies one submitted utterance. Ids are never reused by a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UtteranceId(pub u64);

impl fmt::Display for UtteranceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A voice the device can speak with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Voice {
    /// What the device needs to select this voice
    pub id: String,
    pub name: String,
    pub lang: String,
    pub default: bool,
}

/// Rate, pitch and volume of an utterance. 1.0 is the device's normal
/// rate/pitch; volume goes from 0.0 (silent) to 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prosody {
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Default for Prosody {
    fn default() -> Self {
        Prosody { rate: 1.0, pitch: 1.0, volume: 1.0 }
    }
}

/// One synthesis request.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    /// None means the device's own default voice
    pub voice: Option<Voice>,
    pub prosody: Prosody,
}

/// Why an utterance stopped before its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechErrorKind {
    /// The utterance was cancelled on purpose (stop, voice change)
    Interrupted,
    /// The synthesizer ran and failed
    SynthesisFailed,
}

impl fmt::Display for SpeechErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SpeechErrorKind::Interrupted => "interrupted",
            SpeechErrorKind::SynthesisFailed => "synthesis failed",
        };
        f.write_str(text)
    }
}

/// Completion signals delivered asynchronously by a device.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    End(UtteranceId),
    Error(UtteranceId, SpeechErrorKind),
    /// The voice list finished (re)loading
    VoicesChanged,
}

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("speech synthesis is not available: {0}")]
    Unavailable(String),

    #[error("failed to start speech synthesis: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("no voice number {0}")]
    UnknownVoice(usize),
}

/// A speech-synthesis device. There is one per process and the active
/// narration controller borrows it exclusively.
pub trait SpeechDevice {
    /// Voices known so far. May be empty until `VoicesChanged` fires.
    fn voices(&self) -> Vec<Voice>;

    /// Starts speaking, replacing nothing: callers cancel first.
    fn speak(&mut self, utterance: Utterance) -> Result<UtteranceId, SpeechError>;

    fn pause(&mut self);

    fn resume(&mut self);

    /// Drops the active utterance; it reports `Interrupted`.
    fn cancel(&mut self);
}
