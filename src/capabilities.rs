// src/capabilities.rs
// =============================================================================
// Which optional host features can we use?
//
// - Speech synthesis: needs the configured synthesizer binary on PATH.
// - Speech recognition (dictating a search query): a terminal has no
//   recognizer, so asking for it always yields a notice.
//
// A missing capability is never fatal: the caller prints the notice and
// carries on without the feature.
// =============================================================================

use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability {
    SpeechSynthesis,
    SpeechRecognition,
}

impl Capability {
    /// The notice shown when the capability is missing.
    pub fn unavailable_notice(&self) -> &'static str {
        match self {
            Capability::SpeechSynthesis => {
                "Speech synthesis is not available (install espeak-ng or set speech.binary)"
            }
            Capability::SpeechRecognition => {
                "Speech recognition is not available in the terminal, type your query instead"
            }
        }
    }
}

/// Returns None when the synthesizer can be used, or the notice to show.
pub fn check_synthesis(binary: &str) -> Option<&'static str> {
    if find_executable(binary).is_some() {
        None
    } else {
        Some(Capability::SpeechSynthesis.unavailable_notice())
    }
}

pub fn check_recognition() -> Option<&'static str> {
    Some(Capability::SpeechRecognition.unavailable_notice())
}

/// Looks `name` up the way a shell would: paths are taken as is, bare names
/// are searched on PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    let candidate = Path::new(name);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let path = env::var_os("PATH")?;
    env::split_paths(&path)
        .map(|dir| dir.join(name))
        .find(|full| full.is_file())
}
