// src/speech/voices.rs
// =============================================================================
// Voice picker options: voices grouped by language.
//
// Groups are ordered by their language key compared case-insensitively.
// Two keys that differ only in case ("en-US" / "en-us") compare equal and
// keep the order in which they first appeared; nothing beyond that is
// promised. Inside a group, voices keep device order.
// =============================================================================

use super::device::Voice;

#[derive(Debug, Clone, PartialEq)]
pub struct VoiceGroup<'a> {
    pub lang: &'a str,
    /// (index into the device voice list, voice)
    pub voices: Vec<(usize, &'a Voice)>,
}

pub fn group_voices(voices: &[Voice]) -> Vec<VoiceGroup<'_>> {
    let mut groups: Vec<VoiceGroup<'_>> = Vec::new();

    for (index, voice) in voices.iter().enumerate() {
        match groups.iter_mut().find(|g| g.lang == voice.lang) {
            Some(group) => group.voices.push((index, voice)),
            None => groups.push(VoiceGroup {
                lang: &voice.lang,
                voices: vec![(index, voice)],
            }),
        }
    }

    // sort_by_key is stable
    groups.sort_by_key(|g| g.lang.to_uppercase());
    groups
}

/// Label of one option in the picker.
pub fn option_label(voice: &Voice) -> String {
    if voice.default {
        format!("{} -- DEFAULT", voice.name)
    } else {
        voice.name.clone()
    }
}
