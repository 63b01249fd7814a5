// src/speech/controller.rs
// =============================================================================
// Narration controller: reads a text aloud through a `SpeechDevice`.
//
// States:
//
//        toggle             toggle
//   Idle ------> Speaking ---------> Paused
//    ^  <------     |  ^  <---------   |
//    |    stop,     |  |    toggle     |
//    |  end/error   |  +-- voice ------+
//    +--------------+      change
//
// - Speaking and Paused both carry the id of the one utterance in flight.
// - Pausing and resuming keep that utterance; only Idle -> Speaking and a
//   voice change create a new one.
// - Device events for any other utterance id are stale and ignored, and an
//   "interrupted" error never ends narration (it is what our own cancel
//   produces when switching voices).
// - Dropping the controller stops the device, so audio never outlives the
//   view that started it. The controller holds the device by `&mut`, which
//   makes it the only narrator while it exists.
// =============================================================================

use tracing::{debug, warn};

use super::device::{
    DeviceEvent, Prosody, SpeechDevice, SpeechError, SpeechErrorKind, Utterance, UtteranceId, Voice,
};

pub const RATE_RANGE: (f32, f32) = (0.5, 2.0);
pub const PITCH_RANGE: (f32, f32) = (0.5, 2.0);
pub const VOLUME_RANGE: (f32, f32) = (0.0, 1.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarrationState {
    Idle,
    Speaking(UtteranceId),
    Paused(UtteranceId),
}

impl NarrationState {
    pub fn is_active(&self) -> bool {
        !matches!(self, NarrationState::Idle)
    }
}

/// What a device event did to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Stale, interrupted, or otherwise irrelevant
    Ignored,
    /// The current utterance reached its end
    Finished,
    /// The current utterance failed
    Failed(SpeechErrorKind),
    VoicesRefreshed,
}

pub struct NarrationController<'d, D: SpeechDevice> {
    device: &'d mut D,
    text: String,
    voices: Vec<Voice>,
    selected: Option<usize>,
    prosody: Prosody,
    state: NarrationState,
}

impl<'d, D: SpeechDevice> NarrationController<'d, D> {
    pub fn new(device: &'d mut D, text: impl Into<String>, prosody: Prosody) -> Self {
        let voices = device.voices();
        let selected = default_voice_index(&voices);
        let mut controller = NarrationController {
            device,
            text: text.into(),
            voices,
            selected,
            prosody: Prosody::default(),
            state: NarrationState::Idle,
        };
        controller.set_rate(prosody.rate);
        controller.set_pitch(prosody.pitch);
        controller.set_volume(prosody.volume);
        controller
    }

    pub fn state(&self) -> NarrationState {
        self.state
    }

    pub fn prosody(&self) -> Prosody {
        self.prosody
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_voice(&self) -> Option<&Voice> {
        self.selected.and_then(|i| self.voices.get(i))
    }

    /// Speak / pause / resume, depending on the current state.
    ///
    /// With no text to read this does nothing.
    pub fn toggle(&mut self) -> Result<NarrationState, SpeechError> {
        if self.text.trim().is_empty() {
            return Ok(self.state);
        }

        match self.state {
            NarrationState::Idle => self.start()?,
            NarrationState::Speaking(_) => self.pause(),
            NarrationState::Paused(_) => self.resume(),
        }
        Ok(self.state)
    }

    pub fn pause(&mut self) {
        if let NarrationState::Speaking(id) = self.state {
            self.device.pause();
            self.state = NarrationState::Paused(id);
            debug!(utterance = %id, "narration paused");
        }
    }

    pub fn resume(&mut self) {
        if let NarrationState::Paused(id) = self.state {
            self.device.resume();
            self.state = NarrationState::Speaking(id);
            debug!(utterance = %id, "narration resumed");
        }
    }

    /// Cancels narration. No-op while idle.
    pub fn stop(&mut self) {
        if self.state.is_active() {
            self.device.cancel();
            self.state = NarrationState::Idle;
            debug!("narration stopped");
        }
    }

    /// Picks voice `index` from `voices()`. While narrating, the current
    /// utterance is cancelled and a new one starts with the new voice.
    pub fn select_voice(&mut self, index: usize) -> Result<(), SpeechError> {
        if index >= self.voices.len() {
            return Err(SpeechError::UnknownVoice(index));
        }
        self.selected = Some(index);

        if self.state.is_active() {
            self.device.cancel();
            self.state = NarrationState::Idle;
            self.start()?;
        }
        Ok(())
    }

    /// Rate applies from the next utterance on.
    pub fn set_rate(&mut self, rate: f32) {
        self.prosody.rate = clamp(rate, RATE_RANGE);
    }

    /// Pitch applies from the next utterance on.
    pub fn set_pitch(&mut self, pitch: f32) {
        self.prosody.pitch = clamp(pitch, PITCH_RANGE);
    }

    /// Volume is locked while narrating; returns false when the change was
    /// refused.
    pub fn set_volume(&mut self, volume: f32) -> bool {
        if self.state.is_active() {
            return false;
        }
        self.prosody.volume = clamp(volume, VOLUME_RANGE);
        true
    }

    /// Feeds one asynchronous device signal into the state machine.
    pub fn handle_event(&mut self, event: DeviceEvent) -> EventOutcome {
        match event {
            DeviceEvent::VoicesChanged => {
                self.refresh_voices();
                EventOutcome::VoicesRefreshed
            }
            DeviceEvent::End(id) if self.is_current(id) => {
                self.state = NarrationState::Idle;
                EventOutcome::Finished
            }
            DeviceEvent::Error(_, SpeechErrorKind::Interrupted) => EventOutcome::Ignored,
            DeviceEvent::Error(id, kind) if self.is_current(id) => {
                warn!(utterance = %id, "narration failed: {kind}");
                self.state = NarrationState::Idle;
                EventOutcome::Failed(kind)
            }
            DeviceEvent::End(_) | DeviceEvent::Error(..) => EventOutcome::Ignored,
        }
    }

    fn start(&mut self) -> Result<(), SpeechError> {
        let utterance = Utterance {
            text: self.text.clone(),
            voice: self.selected_voice().cloned(),
            prosody: self.prosody,
        };
        let id = self.device.speak(utterance)?;
        debug!(utterance = %id, "narration started");
        self.state = NarrationState::Speaking(id);
        Ok(())
    }

    fn is_current(&self, id: UtteranceId) -> bool {
        match self.state {
            NarrationState::Speaking(current) | NarrationState::Paused(current) => current == id,
            NarrationState::Idle => false,
        }
    }

    // Keeps the selected voice (by id) when it is still offered
    fn refresh_voices(&mut self) {
        let previous = self.selected_voice().map(|v| v.id.clone());
        self.voices = self.device.voices();
        self.selected = previous
            .and_then(|id| self.voices.iter().position(|v| v.id == id))
            .or_else(|| default_voice_index(&self.voices));
    }
}

impl<D: SpeechDevice> Drop for NarrationController<'_, D> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn default_voice_index(voices: &[Voice]) -> Option<usize> {
    if voices.is_empty() {
        return None;
    }
    Some(voices.iter().position(|v| v.default).unwrap_or(0))
}

fn clamp(value: f32, (min, max): (f32, f32)) -> f32 {
    if value.is_nan() {
        return max.min(1.0);
    }
    value.clamp(min, max)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum Call {
        Speak(UtteranceId, Option<String>),
        Pause,
        Resume,
        Cancel,
    }

    #[derive(Default)]
    pub(crate) struct FakeDevice {
        pub voices: Vec<Voice>,
        pub calls: Vec<Call>,
        pub utterances: Vec<Utterance>,
        pub fail_speak: bool,
        next_id: u64,
    }

    impl SpeechDevice for FakeDevice {
        fn voices(&self) -> Vec<Voice> {
            self.voices.clone()
        }

        fn speak(&mut self, utterance: Utterance) -> Result<UtteranceId, SpeechError> {
            if self.fail_speak {
                return Err(SpeechError::Unavailable("no synthesizer".into()));
            }
            self.next_id += 1;
            let id = UtteranceId(self.next_id);
            self.calls.push(Call::Speak(id, utterance.voice.as_ref().map(|v| v.id.clone())));
            self.utterances.push(utterance);
            Ok(id)
        }

        fn pause(&mut self) {
            self.calls.push(Call::Pause);
        }

        fn resume(&mut self) {
            self.calls.push(Call::Resume);
        }

        fn cancel(&mut self) {
            self.calls.push(Call::Cancel);
        }
    }

    pub(crate) fn voice(id: &str, lang: &str, default: bool) -> Voice {
        Voice { id: id.into(), name: id.to_uppercase(), lang: lang.into(), default }
    }

    fn device_with_voices() -> FakeDevice {
        FakeDevice {
            voices: vec![voice("en-us", "en-us", true), voice("de", "de", false)],
            ..FakeDevice::default()
        }
    }

    #[test]
    fn test_start_pause_resume_reuses_utterance() {
        let mut device = device_with_voices();
        {
            let mut narrator = NarrationController::new(&mut device, "Hello world", Prosody::default());

            let speaking = narrator.toggle().unwrap();
            let NarrationState::Speaking(id) = speaking else { panic!("expected speaking") };

            assert_eq!(narrator.toggle().unwrap(), NarrationState::Paused(id));
            assert_eq!(narrator.toggle().unwrap(), NarrationState::Speaking(id));
            narrator.stop();
        }

        let speaks = device.calls.iter().filter(|c| matches!(c, Call::Speak(..))).count();
        assert_eq!(speaks, 1);
        assert_eq!(
            device.calls,
            vec![
                Call::Speak(UtteranceId(1), Some("en-us".into())),
                Call::Pause,
                Call::Resume,
                Call::Cancel,
            ]
        );
    }

    #[test]
    fn test_voice_change_restarts_without_error() {
        let mut device = device_with_voices();
        let mut narrator = NarrationController::new(&mut device, "Hello", Prosody::default());

        narrator.toggle().unwrap();
        narrator.select_voice(1).unwrap();
        assert_eq!(narrator.state(), NarrationState::Speaking(UtteranceId(2)));

        // the cancelled utterance reports "interrupted" after the restart
        let outcome = narrator.handle_event(DeviceEvent::Error(UtteranceId(1), SpeechErrorKind::Interrupted));
        assert_eq!(outcome, EventOutcome::Ignored);
        assert_eq!(narrator.state(), NarrationState::Speaking(UtteranceId(2)));

        drop(narrator);
        assert_eq!(
            device.calls[..3],
            [
                Call::Speak(UtteranceId(1), Some("en-us".into())),
                Call::Cancel,
                Call::Speak(UtteranceId(2), Some("de".into())),
            ]
        );
    }

    #[test]
    fn test_voice_change_while_paused_speaks_again() {
        let mut device = device_with_voices();
        let mut narrator = NarrationController::new(&mut device, "Hello", Prosody::default());

        narrator.toggle().unwrap();
        narrator.toggle().unwrap();
        narrator.select_voice(1).unwrap();
        assert_eq!(narrator.state(), NarrationState::Speaking(UtteranceId(2)));
    }

    #[test]
    fn test_voice_change_while_idle_only_selects() {
        let mut device = device_with_voices();
        let mut narrator = NarrationController::new(&mut device, "Hello", Prosody::default());

        narrator.select_voice(1).unwrap();
        assert_eq!(narrator.state(), NarrationState::Idle);
        assert_eq!(narrator.selected_voice().map(|v| v.id.as_str()), Some("de"));
        assert!(matches!(narrator.select_voice(9), Err(SpeechError::UnknownVoice(9))));
        drop(narrator);
        assert!(device.calls.is_empty());
    }

    #[test]
    fn test_stop_and_pause_while_idle_are_noops() {
        let mut device = device_with_voices();
        let mut narrator = NarrationController::new(&mut device, "Hello", Prosody::default());

        narrator.stop();
        narrator.pause();
        narrator.resume();
        assert_eq!(narrator.state(), NarrationState::Idle);
        drop(narrator);
        assert!(device.calls.is_empty());
    }

    #[test]
    fn test_empty_text_does_not_speak() {
        let mut device = device_with_voices();
        let mut narrator = NarrationController::new(&mut device, "  ", Prosody::default());

        assert_eq!(narrator.toggle().unwrap(), NarrationState::Idle);
        drop(narrator);
        assert!(device.calls.is_empty());
    }

    #[test]
    fn test_end_and_error_return_to_idle() {
        let mut device = device_with_voices();
        let mut narrator = NarrationController::new(&mut device, "Hello", Prosody::default());

        narrator.toggle().unwrap();
        assert_eq!(narrator.handle_event(DeviceEvent::End(UtteranceId(1))), EventOutcome::Finished);
        assert_eq!(narrator.state(), NarrationState::Idle);

        narrator.toggle().unwrap();
        narrator.toggle().unwrap(); // paused
        let outcome = narrator.handle_event(DeviceEvent::Error(UtteranceId(2), SpeechErrorKind::SynthesisFailed));
        assert_eq!(outcome, EventOutcome::Failed(SpeechErrorKind::SynthesisFailed));
        assert_eq!(narrator.state(), NarrationState::Idle);
    }

    #[test]
    fn test_stale_end_is_ignored() {
        let mut device = device_with_voices();
        let mut narrator = NarrationController::new(&mut device, "Hello", Prosody::default());

        narrator.toggle().unwrap();
        narrator.select_voice(1).unwrap();
        assert_eq!(narrator.handle_event(DeviceEvent::End(UtteranceId(1))), EventOutcome::Ignored);
        assert_eq!(narrator.state(), NarrationState::Speaking(UtteranceId(2)));
    }

    #[test]
    fn test_drop_stops_active_narration() {
        let mut device = device_with_voices();
        {
            let mut narrator = NarrationController::new(&mut device, "Hello", Prosody::default());
            narrator.toggle().unwrap();
        }
        assert_eq!(device.calls.last(), Some(&Call::Cancel));
    }

    #[test]
    fn test_voices_arrive_later() {
        let mut device = FakeDevice::default();
        let mut narrator = NarrationController::new(&mut device, "Hello", Prosody::default());
        assert!(narrator.voices().is_empty());
        assert_eq!(narrator.selected_voice(), None);

        // speaking without voices uses the device default
        narrator.toggle().unwrap();
        narrator.stop();
        narrator.device.voices = vec![voice("fr", "fr", false), voice("en-us", "en-us", true)];

        assert_eq!(narrator.handle_event(DeviceEvent::VoicesChanged), EventOutcome::VoicesRefreshed);
        assert_eq!(narrator.voices().len(), 2);
        assert_eq!(narrator.selected_voice().map(|v| v.id.as_str()), Some("en-us"));
        drop(narrator);
        assert_eq!(device.calls[0], Call::Speak(UtteranceId(1), None));
    }

    #[test]
    fn test_refresh_keeps_selected_voice() {
        let mut device = device_with_voices();
        let mut narrator = NarrationController::new(&mut device, "Hello", Prosody::default());
        narrator.select_voice(1).unwrap();

        narrator.device.voices.insert(0, voice("af", "af", false));
        narrator.handle_event(DeviceEvent::VoicesChanged);
        assert_eq!(narrator.selected_voice().map(|v| v.id.as_str()), Some("de"));
    }

    #[test]
    fn test_prosody_clamped_and_volume_locked() {
        let mut device = device_with_voices();
        let prosody = Prosody { rate: 3.0, pitch: 0.1, volume: 0.4 };
        let mut narrator = NarrationController::new(&mut device, "Hello", prosody);
        assert_eq!(narrator.prosody(), Prosody { rate: 2.0, pitch: 0.5, volume: 0.4 });

        narrator.toggle().unwrap();
        assert!(!narrator.set_volume(1.0));
        assert_eq!(narrator.prosody().volume, 0.4);

        narrator.stop();
        assert!(narrator.set_volume(1.5));
        assert_eq!(narrator.prosody().volume, 1.0);
    }

    #[test]
    fn test_speak_failure_stays_idle() {
        let mut device = FakeDevice { fail_speak: true, ..FakeDevice::default() };
        let mut narrator = NarrationController::new(&mut device, "Hello", Prosody::default());
        assert!(narrator.toggle().is_err());
        assert_eq!(narrator.state(), NarrationState::Idle);
    }
}
