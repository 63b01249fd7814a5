// src/narrate.rs
// =============================================================================
// Interactive narration: the speech bar of the repo page, driven from stdin.
//
// The loop waits on three things at once:
// - a command line typed by the user (play/pause, stop, voice, rate, ...)
// - a completion signal from the speech device
// - Ctrl-C, which stops the audio before leaving (like closing the tab)
//
// Leaving the loop drops the controller, which stops any narration still
// playing.
// =============================================================================

use std::future::Future;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::capabilities;
use crate::config::SpeechConfig;
use crate::speech::{
    DeviceEvent, EspeakDevice, EventOutcome, NarrationController, NarrationState, Prosody,
    SpeechDevice,
};
use crate::view;

/// Settings picked on the command line; unset values come from the config.
#[derive(Debug, Clone, Default)]
pub struct NarrateOptions {
    pub voice: Option<usize>,
    pub rate: Option<f32>,
    pub pitch: Option<f32>,
    pub volume: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
enum NarrateCommand {
    Toggle,
    Stop,
    Voice(usize),
    Voices,
    Rate(f32),
    Pitch(f32),
    Volume(f32),
    Status,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<NarrateCommand, String> {
    let mut words = line.split_whitespace();
    let command = words.next().unwrap_or("").to_lowercase();
    let argument = words.next();

    let number = |name: &str| -> Result<f32, String> {
        argument
            .ok_or_else(|| format!("usage: {name} <value>"))?
            .parse::<f32>()
            .map_err(|_| format!("{name} needs a number"))
    };

    match command.as_str() {
        "" | "p" | "play" | "pause" | "resume" => Ok(NarrateCommand::Toggle),
        "s" | "stop" => Ok(NarrateCommand::Stop),
        "v" | "voice" => argument
            .and_then(|a| a.parse().ok())
            .map(NarrateCommand::Voice)
            .ok_or_else(|| "usage: voice <number>".to_string()),
        "voices" => Ok(NarrateCommand::Voices),
        "rate" => number("rate").map(NarrateCommand::Rate),
        "pitch" => number("pitch").map(NarrateCommand::Pitch),
        "volume" | "vol" => number("volume").map(NarrateCommand::Volume),
        "status" => Ok(NarrateCommand::Status),
        "h" | "help" | "?" => Ok(NarrateCommand::Help),
        "q" | "quit" | "exit" => Ok(NarrateCommand::Quit),
        other => Err(format!("unknown command '{other}', type 'help'")),
    }
}

fn print_help() {
    println!("Commands:");
    println!("  <enter> | p      speak / pause / resume");
    println!("  s                stop");
    println!("  voice <n>        switch voice (see 'voices')");
    println!("  rate <0.5-2>     speech rate");
    println!("  pitch <0.5-2>    speech pitch");
    println!("  volume <0-1>     volume (only while stopped)");
    println!("  status           show current settings");
    println!("  q                quit");
}

fn print_status<D: SpeechDevice>(narrator: &NarrationController<'_, D>) {
    let state = match narrator.state() {
        NarrationState::Idle => "stopped",
        NarrationState::Speaking(_) => "speaking",
        NarrationState::Paused(_) => "paused",
    };
    let prosody = narrator.prosody();
    let voice = narrator
        .selected_voice()
        .map(|v| v.name.as_str())
        .unwrap_or("default");
    println!(
        "🔊 {state} | voice: {voice} | rate {:.1} | pitch {:.1} | volume {:.2}",
        prosody.rate, prosody.pitch, prosody.volume
    );
}

/// Runs one command; returns false when the user wants to leave.
fn execute<D: SpeechDevice>(narrator: &mut NarrationController<'_, D>, command: NarrateCommand) -> bool {
    match command {
        NarrateCommand::Toggle => match narrator.toggle() {
            Ok(_) => print_status(narrator),
            Err(e) => println!("⚠️  {e}"),
        },
        NarrateCommand::Stop => {
            narrator.stop();
            print_status(narrator);
        }
        NarrateCommand::Voice(index) => match narrator.select_voice(index) {
            Ok(()) => print_status(narrator),
            Err(e) => println!("⚠️  {e}"),
        },
        NarrateCommand::Voices => view::print_voice_groups(narrator.voices(), narrator.selected_index()),
        NarrateCommand::Rate(rate) => {
            narrator.set_rate(rate);
            print_status(narrator);
        }
        NarrateCommand::Pitch(pitch) => {
            narrator.set_pitch(pitch);
            print_status(narrator);
        }
        NarrateCommand::Volume(volume) => {
            if narrator.set_volume(volume) {
                print_status(narrator);
            } else {
                println!("Volume can only be changed while narration is stopped");
            }
        }
        NarrateCommand::Status => print_status(narrator),
        NarrateCommand::Help => print_help(),
        NarrateCommand::Quit => return false,
    }
    true
}

/// Reads `text` aloud under interactive control until the user quits.
///
/// A missing synthesizer is reported and narration is skipped; it is not an
/// error for the caller.
pub async fn run(config: &SpeechConfig, text: String, options: NarrateOptions) -> Result<()> {
    if let Some(notice) = capabilities::check_synthesis(&config.binary) {
        eprintln!("⚠️  {notice}");
        return Ok(());
    }

    let (events_tx, mut events) = mpsc::unbounded_channel();
    let mut device = EspeakDevice::new(config.binary.as_str(), config.default_language.as_str(), events_tx);

    let prosody = Prosody {
        rate: options.rate.unwrap_or(config.rate),
        pitch: options.pitch.unwrap_or(config.pitch),
        volume: options.volume.unwrap_or(config.volume),
    };
    let mut narrator = NarrationController::new(&mut device, text, prosody);

    // a Ctrl-C handler that cannot be installed never fires
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    print_help();
    let stdin = BufReader::new(tokio::io::stdin());
    drive(&mut narrator, stdin, &mut events, options.voice, ctrl_c).await
}

/// The command loop: input lines, device events and `shutdown`, whichever
/// comes first. `shutdown` stops narration and ends the loop.
async fn drive<D, R, S>(
    narrator: &mut NarrationController<'_, D>,
    input: R,
    events: &mut mpsc::UnboundedReceiver<DeviceEvent>,
    mut pending_voice: Option<usize>,
    shutdown: S,
) -> Result<()>
where
    D: SpeechDevice,
    R: AsyncBufRead + Unpin,
    S: Future<Output = ()>,
{
    let mut lines = input.lines();
    // polled across iterations, so a signal delivered mid-command is kept
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                narrator.stop();
                println!();
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_command(&line) {
                    Ok(command) => {
                        if !execute(narrator, command) {
                            break;
                        }
                    }
                    Err(message) => println!("{message}"),
                }
            }
            Some(event) = events.recv() => match narrator.handle_event(event) {
                EventOutcome::Finished => println!("✅ Finished reading"),
                EventOutcome::Failed(kind) => println!("❌ Narration stopped: {kind}"),
                EventOutcome::VoicesRefreshed => {
                    println!("{} voices available, type 'voices' to list them", narrator.voices().len());
                    // a voice requested up front is applied once the list arrives
                    if let Some(index) = pending_voice.take() {
                        if let Err(e) = narrator.select_voice(index) {
                            println!("⚠️  {e}");
                        }
                    }
                }
                EventOutcome::Ignored => {}
            },
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::{FakeDevice, SpeechCall};

    #[test]
    fn test_parse_toggle_variants() {
        assert_eq!(parse_command(""), Ok(NarrateCommand::Toggle));
        assert_eq!(parse_command("  p "), Ok(NarrateCommand::Toggle));
        assert_eq!(parse_command("Pause"), Ok(NarrateCommand::Toggle));
    }

    #[test]
    fn test_parse_arguments() {
        assert_eq!(parse_command("voice 3"), Ok(NarrateCommand::Voice(3)));
        assert_eq!(parse_command("rate 1.5"), Ok(NarrateCommand::Rate(1.5)));
        assert_eq!(parse_command("vol 0.25"), Ok(NarrateCommand::Volume(0.25)));
        assert!(parse_command("voice").is_err());
        assert!(parse_command("pitch high").is_err());
        assert!(parse_command("dance").is_err());
    }

    #[tokio::test]
    async fn test_shutdown_delivered_earlier_stops_narration() {
        let mut device = FakeDevice::default();
        let (_events_tx, mut events) = mpsc::unbounded_channel();
        // input that never produces a line
        let (_keyboard, input) = tokio::io::duplex(64);
        let (signal_tx, signal_rx) = tokio::sync::oneshot::channel::<()>();

        {
            let mut narrator = NarrationController::new(&mut device, "Hello", Prosody::default());
            narrator.toggle().unwrap();
            signal_tx.send(()).unwrap();

            let shutdown = async {
                let _ = signal_rx.await;
            };
            drive(&mut narrator, BufReader::new(input), &mut events, None, shutdown)
                .await
                .unwrap();
            assert_eq!(narrator.state(), NarrationState::Idle);
        }

        assert_eq!(device.calls.last(), Some(&SpeechCall::Cancel));
    }

    #[tokio::test]
    async fn test_commands_from_input_until_quit() {
        let mut device = FakeDevice::default();
        let (_events_tx, mut events) = mpsc::unbounded_channel();
        let input: &[u8] = b"p\nrate 1.5\nq\nthis line is never read\n";

        {
            let mut narrator = NarrationController::new(&mut device, "Hello", Prosody::default());
            drive(&mut narrator, input, &mut events, None, std::future::pending())
                .await
                .unwrap();
            assert!(narrator.state().is_active());
            assert_eq!(narrator.prosody().rate, 1.5);
        }

        assert_eq!(device.utterances.len(), 1);
    }

    #[tokio::test]
    async fn test_end_event_returns_to_idle_before_input() {
        let mut device = FakeDevice::default();
        let (events_tx, mut events) = mpsc::unbounded_channel();
        let (mut keyboard, input) = tokio::io::duplex(64);

        let mut narrator = NarrationController::new(&mut device, "Hello", Prosody::default());
        let NarrationState::Speaking(id) = narrator.toggle().unwrap() else {
            panic!("expected speaking")
        };
        events_tx.send(DeviceEvent::End(id)).unwrap();

        let quit = async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            tokio::io::AsyncWriteExt::write_all(&mut keyboard, b"q\n").await.unwrap();
            keyboard
        };
        let (result, _keyboard) = tokio::join!(
            drive(&mut narrator, BufReader::new(input), &mut events, None, std::future::pending()),
            quit
        );
        result.unwrap();
        assert_eq!(narrator.state(), NarrationState::Idle);
    }
}
