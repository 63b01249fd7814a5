// src/speech/espeak.rs
// =============================================================================
// A `SpeechDevice` backed by the espeak-ng command line synthesizer.
//
// - Voices: `espeak-ng --voices` runs in a background task when the device
//   is created; the list is empty until it finishes, then `VoicesChanged`
//   is sent.
// - Speaking: one espeak-ng child per utterance, text written to its stdin
//   (README files can be longer than a single argv entry may be).
// - Pause / resume: SIGSTOP / SIGCONT to the child (Unix only).
// - Cancel: the child is killed right away, before `cancel` returns, so
//   audio stops even if the runtime shuts down next. The utterance then
//   reports `Interrupted`.
//
// Each child is watched by its own task, which polls its exit status and
// sends exactly one `End` or `Error` event for its utterance. The child sits
// behind a std mutex that is never held across an await.
// =============================================================================

use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::device::{
    DeviceEvent, SpeechDevice, SpeechError, SpeechErrorKind, Utterance, UtteranceId, Voice,
};

// espeak-ng defaults: 175 words per minute, pitch 50 (0-99), amplitude 100 (0-200)
const BASE_WPM: f32 = 175.0;
const BASE_PITCH: f32 = 50.0;
const BASE_AMPLITUDE: f32 = 100.0;

// How often a watcher checks whether its synthesizer exited
const EXIT_POLL: Duration = Duration::from_millis(50);

/// The running synthesizer; None once it was killed by `cancel`.
type ChildSlot = Arc<Mutex<Option<Child>>>;

enum ChildStatus {
    Running,
    Exited(std::process::ExitStatus),
    Failed(std::io::Error),
    Cancelled,
}

fn poll_child(slot: &Mutex<Option<Child>>) -> ChildStatus {
    let Ok(mut guard) = slot.lock() else {
        return ChildStatus::Cancelled;
    };
    match guard.as_mut().map(Child::try_wait) {
        None => ChildStatus::Cancelled,
        Some(Ok(None)) => ChildStatus::Running,
        Some(Ok(Some(status))) => ChildStatus::Exited(status),
        Some(Err(e)) => ChildStatus::Failed(e),
    }
}

struct ActiveUtterance {
    id: UtteranceId,
    pid: Option<u32>,
    child: ChildSlot,
    done: Arc<AtomicBool>,
    paused: bool,
}

impl ActiveUtterance {
    fn is_running(&self) -> bool {
        !self.done.load(Ordering::Acquire)
    }
}

pub struct EspeakDevice {
    binary: String,
    voices: Arc<RwLock<Vec<Voice>>>,
    events: mpsc::UnboundedSender<DeviceEvent>,
    next_id: u64,
    active: Option<ActiveUtterance>,
}

impl EspeakDevice {
    /// Creates the device and starts loading voices in the background.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(
        binary: impl Into<String>,
        default_language: impl Into<String>,
        events: mpsc::UnboundedSender<DeviceEvent>,
    ) -> Self {
        let device = EspeakDevice {
            binary: binary.into(),
            voices: Arc::new(RwLock::new(Vec::new())),
            events,
            next_id: 0,
            active: None,
        };
        device.load_voices(default_language.into());
        device
    }

    fn load_voices(&self, default_language: String) {
        let binary = self.binary.clone();
        let voices = Arc::clone(&self.voices);
        let events = self.events.clone();

        tokio::spawn(async move {
            match Command::new(&binary).arg("--voices").output().await {
                Ok(output) if output.status.success() => {
                    let listing = String::from_utf8_lossy(&output.stdout);
                    let parsed = parse_voice_list(&listing, &default_language);
                    info!("Loaded {} voices from {binary}", parsed.len());
                    if let Ok(mut slot) = voices.write() {
                        *slot = parsed;
                    }
                    let _ = events.send(DeviceEvent::VoicesChanged);
                }
                Ok(output) => warn!("{binary} --voices exited with {}", output.status),
                Err(e) => warn!("Could not list voices with {binary}: {e}"),
            }
        });
    }

    fn signal_active(&mut self, signal: &str) -> bool {
        let Some(active) = self.active.as_ref().filter(|a| a.is_running()) else {
            return false;
        };
        match active.pid {
            Some(pid) => send_signal(pid, signal),
            None => false,
        }
    }
}

impl SpeechDevice for EspeakDevice {
    fn voices(&self) -> Vec<Voice> {
        self.voices.read().map(|v| v.clone()).unwrap_or_default()
    }

    fn speak(&mut self, utterance: Utterance) -> Result<UtteranceId, SpeechError> {
        // one utterance at a time
        self.cancel();

        self.next_id += 1;
        let id = UtteranceId(self.next_id);

        let mut child = Command::new(&self.binary)
            .args(synth_args(&utterance))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    SpeechError::Unavailable(format!("{} not found", self.binary))
                } else {
                    SpeechError::Spawn(e)
                }
            })?;

        let pid = child.id();
        let stdin = child.stdin.take();
        let child: ChildSlot = Arc::new(Mutex::new(Some(child)));
        let done = Arc::new(AtomicBool::new(false));

        if let Some(mut stdin) = stdin {
            let text = utterance.text;
            tokio::spawn(async move {
                // a synthesizer that dies early closes the pipe; its exit
                // status reports the failure
                let _ = stdin.write_all(text.as_bytes()).await;
            });
        }

        let slot = Arc::clone(&child);
        let watcher_done = Arc::clone(&done);
        let events = self.events.clone();
        tokio::spawn(async move {
            let event = loop {
                match poll_child(&slot) {
                    ChildStatus::Running => tokio::time::sleep(EXIT_POLL).await,
                    ChildStatus::Exited(status) if status.success() => break DeviceEvent::End(id),
                    ChildStatus::Exited(status) => {
                        warn!(utterance = %id, "synthesizer exited with {status}");
                        break DeviceEvent::Error(id, SpeechErrorKind::SynthesisFailed);
                    }
                    ChildStatus::Failed(e) => {
                        warn!(utterance = %id, "waiting for synthesizer failed: {e}");
                        break DeviceEvent::Error(id, SpeechErrorKind::SynthesisFailed);
                    }
                    ChildStatus::Cancelled => break DeviceEvent::Error(id, SpeechErrorKind::Interrupted),
                }
            };

            watcher_done.store(true, Ordering::Release);
            let _ = events.send(event);
        });

        debug!(utterance = %id, ?pid, "synthesizer started");
        self.active = Some(ActiveUtterance {
            id,
            pid,
            child,
            done,
            paused: false,
        });
        Ok(id)
    }

    fn pause(&mut self) {
        let paused = self.active.as_ref().map_or(true, |a| a.paused);
        if !paused && self.signal_active("-STOP") {
            if let Some(active) = self.active.as_mut() {
                active.paused = true;
            }
        }
    }

    fn resume(&mut self) {
        let paused = self.active.as_ref().map_or(false, |a| a.paused);
        if paused && self.signal_active("-CONT") {
            if let Some(active) = self.active.as_mut() {
                active.paused = false;
            }
        }
    }

    fn cancel(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        let child = match active.child.lock() {
            Ok(mut guard) => guard.take(),
            Err(_) => None,
        };
        if let Some(mut child) = child {
            debug!(utterance = %active.id, "cancelling");
            // SIGKILL is sent before this returns; tokio reaps the process later
            if let Err(e) = child.start_kill() {
                debug!(utterance = %active.id, "kill after cancel: {e}");
            }
        }
    }
}

impl Drop for EspeakDevice {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Command line for one utterance; the text itself goes to stdin.
fn synth_args(utterance: &Utterance) -> Vec<String> {
    let prosody = utterance.prosody;
    let mut args = Vec::new();

    if let Some(voice) = &utterance.voice {
        args.push("-v".to_string());
        args.push(voice.id.clone());
    }

    let wpm = (BASE_WPM * prosody.rate).round().clamp(80.0, 450.0) as u32;
    let pitch = (BASE_PITCH * prosody.pitch).round().clamp(0.0, 99.0) as u32;
    let amplitude = (BASE_AMPLITUDE * prosody.volume).round().clamp(0.0, 200.0) as u32;

    args.extend([
        "-s".to_string(),
        wpm.to_string(),
        "-p".to_string(),
        pitch.to_string(),
        "-a".to_string(),
        amplitude.to_string(),
        "--stdin".to_string(),
    ]);
    args
}

// Spawns `kill` without waiting for it; the dropped child is reaped by tokio.
#[cfg(unix)]
fn send_signal(pid: u32, signal: &str) -> bool {
    match Command::new("kill")
        .arg(signal)
        .arg(pid.to_string())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(_) => true,
        Err(e) => {
            warn!("Failed to send {signal} to {pid}: {e}");
            false
        }
    }
}

#[cfg(not(unix))]
fn send_signal(_pid: u32, signal: &str) -> bool {
    warn!("{signal} is not supported on this platform, narration keeps playing");
    false
}

/// Parses the table printed by `espeak-ng --voices`:
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  af              --/M      Afrikaans          gmw/af
///  2  en-us           --/M      English_(America)  gmw/en-US            (en 3)
/// ```
pub fn parse_voice_list(listing: &str, default_language: &str) -> Vec<Voice> {
    listing
        .lines()
        .filter(|line| !line.trim_start().starts_with("Pty"))
        .filter_map(|line| {
            let columns: Vec<&str> = line.split_whitespace().collect();
            if columns.len() < 4 {
                return None;
            }
            let lang = columns[1];
            Some(Voice {
                id: lang.to_string(),
                name: columns[3].replace('_', " "),
                lang: lang.to_string(),
                default: lang.eq_ignore_ascii_case(default_language),
            })
        })
        .collect()
}
