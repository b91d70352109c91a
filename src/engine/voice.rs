//! Voices and their lifecycle
//!
//! [`VoiceManager`] is the only owner of voice existence. Voices live in a
//! dense list with a key index; teardown swap-removes, so the per-frame scan
//! never leaves tombstones behind.

use super::air::AirSimFilter;
use super::backend::{AudioBackend, VoiceCommand, VoiceId};
use crate::config::Channel;
use crate::host::EmitterFrame;
use std::collections::HashMap;
use tracing::{debug, info};

/// One live playback unit bound to a layer key
#[derive(Debug, Clone, PartialEq)]
pub struct Voice {
    key: String,
    id: VoiceId,
    channel: Channel,
    /// Emitter frame captured when the voice was created
    origin: EmitterFrame,
    /// Per-voice pitch multiplier, 1.0 unless the layer varies pitch
    pub pitch_variation: f32,
    pub volume: f32,
    pub pitch: f32,
    pub air_filter: Option<AirSimFilter>,
}

impl Voice {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn id(&self) -> VoiceId {
        self.id
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn origin(&self) -> &EmitterFrame {
        &self.origin
    }
}

/// Owns the mapping from layer key to live voice
#[derive(Debug, Default)]
pub struct VoiceManager {
    voices: Vec<Voice>,
    slots: HashMap<String, usize>,
}

impl VoiceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the voice for `key`, creating it at `frame` if there is none.
    ///
    /// The flag is true when the voice was created by this call.
    pub fn ensure_voice<B: AudioBackend>(
        &mut self,
        backend: &mut B,
        key: &str,
        frame: &EmitterFrame,
        channel: Channel,
    ) -> (&mut Voice, bool) {
        if let Some(&slot) = self.slots.get(key) {
            return (&mut self.voices[slot], false);
        }

        let id = backend.spawn(key, frame, channel);
        debug!(key, id = id.0, "voice created");

        let slot = self.voices.len();
        self.voices.push(Voice {
            key: key.to_string(),
            id,
            channel,
            origin: *frame,
            pitch_variation: 1.0,
            volume: 0.0,
            pitch: 1.0,
            air_filter: None,
        });
        self.slots.insert(key.to_string(), slot);
        (&mut self.voices[slot], true)
    }

    /// Stop the voice for `key`. Returns false if there is none.
    ///
    /// The voice stays allocated until the next [`VoiceManager::reap`].
    pub fn stop<B: AudioBackend>(&mut self, backend: &mut B, key: &str) -> bool {
        match self.slots.get(key) {
            Some(&slot) => {
                backend.apply(self.voices[slot].id, VoiceCommand::Stop);
                true
            }
            None => false,
        }
    }

    /// Destroy every voice that is no longer playing.
    ///
    /// `on_destroy` runs once per destroyed key, so callers can drop any
    /// state they keep under the same key. Returns the number destroyed.
    pub fn reap<B: AudioBackend>(&mut self, backend: &mut B, mut on_destroy: impl FnMut(&str)) -> usize {
        let mut destroyed = 0;
        let mut i = self.voices.len();
        while i > 0 {
            i -= 1;
            if backend.is_playing(self.voices[i].id) {
                continue;
            }

            let voice = self.voices.swap_remove(i);
            if let Some(moved) = self.voices.get(i) {
                if let Some(slot) = self.slots.get_mut(&moved.key) {
                    *slot = i;
                }
            }
            self.slots.remove(&voice.key);

            if voice.air_filter.is_some() {
                backend.apply(voice.id, VoiceCommand::ClearAirFilter);
            }
            backend.release(voice.id);
            debug!(key = %voice.key, "voice destroyed");
            on_destroy(voice.key.as_str());
            destroyed += 1;
        }
        destroyed
    }

    /// Pause every voice, keeping playback positions
    pub fn pause_all<B: AudioBackend>(&mut self, backend: &mut B) {
        for voice in &self.voices {
            backend.apply(voice.id, VoiceCommand::Pause);
        }
    }

    /// Resume every paused voice
    pub fn resume_all<B: AudioBackend>(&mut self, backend: &mut B) {
        for voice in &self.voices {
            backend.apply(voice.id, VoiceCommand::Resume);
        }
    }

    /// Stop and release every voice
    pub fn dispose<B: AudioBackend>(&mut self, backend: &mut B) {
        let count = self.voices.len();
        for voice in self.voices.drain(..) {
            backend.apply(voice.id, VoiceCommand::Stop);
            backend.release(voice.id);
        }
        self.slots.clear();
        if count > 0 {
            info!(count, "voices disposed");
        }
    }

    pub fn get(&self, key: &str) -> Option<&Voice> {
        self.slots.get(key).map(|&slot| &self.voices[slot])
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Voice> {
        match self.slots.get(key) {
            Some(&slot) => Some(&mut self.voices[slot]),
            None => None,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.slots.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Voice> {
        self.voices.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Voice> {
        self.voices.iter_mut()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.voices.iter().map(|v| v.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }
}
