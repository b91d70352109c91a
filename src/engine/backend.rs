//! Playback device interface
//!
//! The engine never mixes audio itself. It drives an [`AudioBackend`] with
//! [`VoiceCommand`]s and asks it whether a voice is still playing.

use super::air::AirSimFilter;
use crate::config::Channel;
use crate::host::EmitterFrame;
use serde::Serialize;
use std::collections::HashMap;

/// Backend handle for a voice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct VoiceId(pub u64);

/// Commands sent to a voice
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum VoiceCommand {
    /// Update gain and pitch
    SetParams { volume: f32, pitch: f32 },
    /// Start the layer's loop (or single play) if not already playing
    Play {
        channel: Channel,
        clip: String,
        looped: bool,
        loop_at_random: bool,
    },
    /// Fire a clip once
    PlayOneShot {
        channel: Channel,
        clip: String,
        volume_scale: f32,
    },
    Stop,
    /// Pause, keeping the playback position
    Pause,
    Resume,
    /// Attach or refresh the air-simulation filter inputs
    SetAirFilter(AirSimFilter),
    ClearAirFilter,
}

/// A playback device
pub trait AudioBackend {
    /// Allocate a voice attached at `frame`
    fn spawn(&mut self, key: &str, frame: &EmitterFrame, channel: Channel) -> VoiceId;

    /// Send a command to a voice
    fn apply(&mut self, id: VoiceId, command: VoiceCommand);

    /// Whether the voice is playing. A paused voice counts as playing.
    fn is_playing(&self, id: VoiceId) -> bool;

    /// Free the voice
    fn release(&mut self, id: VoiceId);
}

/// State of one voice inside [`RecordingBackend`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedVoice {
    pub key: String,
    pub channel: Channel,
    pub frame_position: [f32; 3],
    pub playing: bool,
    pub paused: bool,
    pub looped: bool,
    pub volume: f32,
    pub pitch: f32,
    pub air_filter: Option<AirSimFilter>,
    pub one_shots: Vec<String>,
}

/// In-memory backend that records every command
///
/// Looped voices play until stopped. Non-looped plays and one-shots keep
/// playing until [`RecordingBackend::finish`] is called, standing in for
/// the clip reaching its end.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    next_id: u64,
    voices: HashMap<VoiceId, RecordedVoice>,
    log: Vec<(VoiceId, VoiceCommand)>,
    released: Vec<String>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Voice state by key
    pub fn voice(&self, key: &str) -> Option<&RecordedVoice> {
        self.voices.values().find(|v| v.key == key)
    }

    /// All live voices
    pub fn voices(&self) -> impl Iterator<Item = &RecordedVoice> {
        self.voices.values()
    }

    /// Number of allocated voices
    pub fn live_count(&self) -> usize {
        self.voices.len()
    }

    /// Every command received, in order
    pub fn log(&self) -> &[(VoiceId, VoiceCommand)] {
        &self.log
    }

    /// Keys of released voices, in release order
    pub fn released(&self) -> &[String] {
        &self.released
    }

    /// Count logged commands matching `pred`
    pub fn count(&self, pred: impl Fn(&VoiceCommand) -> bool) -> usize {
        self.log.iter().filter(|(_, c)| pred(c)).count()
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    /// End playback of every non-looped voice with this key
    pub fn finish(&mut self, key: &str) {
        for voice in self.voices.values_mut() {
            if voice.key == key && !voice.looped {
                voice.playing = false;
            }
        }
    }
}

impl AudioBackend for RecordingBackend {
    fn spawn(&mut self, key: &str, frame: &EmitterFrame, channel: Channel) -> VoiceId {
        let id = VoiceId(self.next_id);
        self.next_id += 1;
        self.voices.insert(
            id,
            RecordedVoice {
                key: key.to_string(),
                channel,
                frame_position: frame.position.to_array(),
                playing: false,
                paused: false,
                looped: false,
                volume: 0.0,
                pitch: 1.0,
                air_filter: None,
                one_shots: Vec::new(),
            },
        );
        id
    }

    fn apply(&mut self, id: VoiceId, command: VoiceCommand) {
        if let Some(voice) = self.voices.get_mut(&id) {
            match &command {
                VoiceCommand::SetParams { volume, pitch } => {
                    voice.volume = *volume;
                    voice.pitch = *pitch;
                }
                VoiceCommand::Play { looped, .. } => {
                    if !voice.playing {
                        voice.playing = true;
                        voice.looped = *looped;
                    }
                }
                VoiceCommand::PlayOneShot { clip, .. } => {
                    voice.playing = true;
                    voice.looped = false;
                    voice.one_shots.push(clip.clone());
                }
                VoiceCommand::Stop => {
                    voice.playing = false;
                    voice.paused = false;
                }
                VoiceCommand::Pause => voice.paused = voice.playing,
                VoiceCommand::Resume => voice.paused = false,
                VoiceCommand::SetAirFilter(filter) => voice.air_filter = Some(filter.clone()),
                VoiceCommand::ClearAirFilter => voice.air_filter = None,
            }
        }
        self.log.push((id, command));
    }

    fn is_playing(&self, id: VoiceId) -> bool {
        self.voices.get(&id).is_some_and(|v| v.playing)
    }

    fn release(&mut self, id: VoiceId) {
        if let Some(voice) = self.voices.remove(&id) {
            self.released.push(voice.key);
        }
    }
}
