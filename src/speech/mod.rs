// src/speech/mod.rs
// =============================================================================
// README narration.
//
// Submodules:
// - device: the `SpeechDevice` trait, utterances, voices, device events
// - controller: the Idle / Speaking / Paused state machine
// - voices: voice picker grouping
// - espeak: espeak-ng process implementation of `SpeechDevice`
// =============================================================================

mod controller;
mod device;
mod espeak;
mod voices;

pub use controller::{EventOutcome, NarrationController, NarrationState};
pub use device::{DeviceEvent, Prosody, SpeechDevice, Voice};
pub use espeak::EspeakDevice;
pub use voices::{group_voices, option_label};

#[cfg(test)]
pub(crate) use controller::tests::{Call as SpeechCall, FakeDevice};
