//! Layer rendering
//!
//! Evaluates a layer's curves against its smoothed control and turns the
//! result into voice commands. This is also where idle looped layers are
//! torn down: a control that rounds to silence stops the voice.

use super::backend::{AudioBackend, VoiceCommand};
use super::smoother::quantize;
use super::voice::VoiceManager;
use crate::host::EmitterFrame;
use crate::layer::SoundLayer;
use crate::mapping::Curve;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Controls below this are silent
pub const SILENCE_EPSILON: f32 = f32::EPSILON;

/// Per-voice pitch variation band
pub const PITCH_VARIATION_MIN: f32 = 0.95;
pub const PITCH_VARIATION_MAX: f32 = 1.05;

/// Randomized one-shot volume band
pub const ONE_SHOT_VOLUME_MIN: f32 = 0.9;
pub const ONE_SHOT_VOLUME_MAX: f32 = 1.0;

/// Inputs for one render of one layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderInput {
    /// Smoothed control
    pub control: f32,
    /// Global and category volume
    pub gain: f32,
    /// Caller-side volume scale, e.g. off-load attenuation
    pub volume_scale: f32,
    /// Physics mass of the emitting part
    pub mass: f32,
    /// Doppler pitch factor, 1.0 when air simulation is off
    pub doppler: f32,
}

impl RenderInput {
    pub fn new(control: f32) -> Self {
        Self {
            control,
            gain: 1.0,
            volume_scale: 1.0,
            mass: 1.0,
            doppler: 1.0,
        }
    }
}

/// How a layer should be played
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayMode {
    /// Continuous playback following the layer's loop flags
    #[default]
    Looped,
    /// Fire-and-forget, optionally with a randomized volume
    OneShot { randomize_volume: bool },
}

/// Final parameters for a layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rendered {
    pub volume: f32,
    pub pitch: f32,
    /// Index into the layer's clips
    pub clip: usize,
}

/// Evaluates layers and issues playback commands
#[derive(Debug, Clone)]
pub struct SoundLayerRenderer {
    rng: SmallRng,
}

impl SoundLayerRenderer {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_rng(&mut rand::rng()),
        }
    }

    /// Deterministic renderer for reproducible runs
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Evaluate volume and pitch for `layer`.
    ///
    /// `pitch_variation` is the voice's random pitch factor; it is ignored
    /// for layers that loop at random positions.
    pub fn render(&mut self, layer: &SoundLayer, input: &RenderInput, pitch_variation: f32, one_shot: bool) -> Rendered {
        let control = input.control;

        let mut volume = layer.curves.volume(control) * input.gain * input.volume_scale;
        let mut pitch = layer.curves.pitch(control);

        if let Some(curve) = &layer.mass_to_volume {
            volume *= curve.evaluate(input.mass);
        }
        if let Some(curve) = &layer.mass_to_pitch {
            pitch *= curve.evaluate(input.mass);
        }
        if layer.pitch_variation && !layer.loop_at_random {
            pitch *= pitch_variation;
        }
        pitch *= input.doppler;

        let clip = if one_shot && layer.clips.len() > 1 {
            self.rng.random_range(0..layer.clips.len())
        } else {
            0
        };

        Rendered { volume, pitch, clip }
    }

    /// Render `layer` and realize it on the voice for `key`.
    ///
    /// Returns `None` when the control is silent. For looped playback that
    /// stops the existing voice, and no voice is created.
    #[allow(clippy::too_many_arguments)]
    pub fn play<B: AudioBackend>(
        &mut self,
        voices: &mut VoiceManager,
        backend: &mut B,
        frame: &EmitterFrame,
        key: &str,
        layer: &SoundLayer,
        input: RenderInput,
        mode: PlayMode,
    ) -> Option<Rendered> {
        let input = RenderInput {
            control: quantize(input.control),
            ..input
        };

        if input.control < SILENCE_EPSILON {
            if mode == PlayMode::Looped {
                voices.stop(backend, key);
            }
            return None;
        }

        let (voice, created) = voices.ensure_voice(backend, key, frame, layer.channel);
        let one_shot = matches!(mode, PlayMode::OneShot { .. });

        let pitch_variation = if one_shot && layer.pitch_variation {
            self.rng.random_range(PITCH_VARIATION_MIN..=PITCH_VARIATION_MAX)
        } else {
            if created && layer.pitch_variation {
                voice.pitch_variation = self.rng.random_range(PITCH_VARIATION_MIN..=PITCH_VARIATION_MAX);
            }
            voice.pitch_variation
        };

        let rendered = self.render(layer, &input, pitch_variation, one_shot);
        voice.volume = rendered.volume;
        voice.pitch = rendered.pitch;
        let id = voice.id();

        backend.apply(
            id,
            VoiceCommand::SetParams {
                volume: rendered.volume,
                pitch: rendered.pitch,
            },
        );

        match mode {
            PlayMode::OneShot { randomize_volume } => {
                let volume_scale = if randomize_volume {
                    self.rng.random_range(ONE_SHOT_VOLUME_MIN..=ONE_SHOT_VOLUME_MAX)
                } else {
                    1.0
                };
                backend.apply(
                    id,
                    VoiceCommand::PlayOneShot {
                        channel: layer.channel,
                        clip: layer.clips[rendered.clip].clone(),
                        volume_scale,
                    },
                );
            }
            PlayMode::Looped => {
                if !backend.is_playing(id) {
                    backend.apply(
                        id,
                        VoiceCommand::Play {
                            channel: layer.channel,
                            clip: layer.clips[rendered.clip].clone(),
                            looped: layer.looped,
                            loop_at_random: layer.loop_at_random,
                        },
                    );
                }
            }
        }

        Some(rendered)
    }
}

impl Default for SoundLayerRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayerConfig;
    use crate::engine::backend::RecordingBackend;
    use approx::assert_abs_diff_eq;

    fn layer(yaml: &str) -> SoundLayer {
        let config: LayerConfig = serde_yaml::from_str(yaml).unwrap();
        SoundLayer::from_config(&config).unwrap()
    }

    fn roll() -> SoundLayer {
        layer(
            r#"
name: roll
clips: [roll]
volume: [[0, 0], [1, 1]]
pitch: [[0, 0.5], [1, 1.5]]
loop: true
"#,
        )
    }

    #[test]
    fn test_render_volume_and_pitch() {
        let mut renderer = SoundLayerRenderer::seeded(1);
        let input = RenderInput {
            gain: 0.5,
            volume_scale: 0.8,
            ..RenderInput::new(0.5)
        };
        let rendered = renderer.render(&roll(), &input, 1.0, false);

        assert_abs_diff_eq!(rendered.volume, 0.5 * 0.5 * 0.8, epsilon = 1e-6);
        assert_abs_diff_eq!(rendered.pitch, 1.0, epsilon = 1e-6);
        assert_eq!(rendered.clip, 0);
    }

    #[test]
    fn test_render_mass_and_doppler() {
        let mut renderer = SoundLayerRenderer::seeded(1);
        let layer = layer(
            r#"
name: hum
clips: [hum]
volume: 1
pitch: 1
mass_to_volume: [[0, 1], [10, 0.5]]
mass_to_pitch: [[0, 1], [10, 0.8]]
"#,
        );
        let input = RenderInput {
            mass: 10.0,
            doppler: 1.2,
            ..RenderInput::new(1.0)
        };
        let rendered = renderer.render(&layer, &input, 1.0, false);

        assert_abs_diff_eq!(rendered.volume, 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(rendered.pitch, 0.8 * 1.2, epsilon = 1e-6);
    }

    #[test]
    fn test_pitch_variation_skipped_for_random_loops() {
        let mut renderer = SoundLayerRenderer::seeded(1);
        let mut varied = roll();
        varied.pitch_variation = true;
        let input = RenderInput::new(0.5);

        assert_abs_diff_eq!(renderer.render(&varied, &input, 1.04, false).pitch, 1.04, epsilon = 1e-6);

        varied.loop_at_random = true;
        assert_abs_diff_eq!(renderer.render(&varied, &input, 1.04, false).pitch, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_silent_looped_layer_stops_without_allocating() {
        let mut renderer = SoundLayerRenderer::seeded(1);
        let mut backend = RecordingBackend::new();
        let mut voices = VoiceManager::new();
        let frame = EmitterFrame::default();

        let result = renderer.play(&mut voices, &mut backend, &frame, "Speed_roll", &roll(), RenderInput::new(0.0), PlayMode::Looped);
        assert!(result.is_none());
        assert!(voices.is_empty());
        assert_eq!(backend.live_count(), 0);

        // Existing voice receives a stop
        renderer.play(&mut voices, &mut backend, &frame, "Speed_roll", &roll(), RenderInput::new(0.5), PlayMode::Looped);
        backend.clear_log();
        let result = renderer.play(&mut voices, &mut backend, &frame, "Speed_roll", &roll(), RenderInput::new(0.0004), PlayMode::Looped);
        assert!(result.is_none());
        assert_eq!(backend.count(|c| *c == VoiceCommand::Stop), 1);
        assert_eq!(voices.len(), 1);
    }

    #[test]
    fn test_looped_play_starts_once() {
        let mut renderer = SoundLayerRenderer::seeded(1);
        let mut backend = RecordingBackend::new();
        let mut voices = VoiceManager::new();
        let frame = EmitterFrame::default();

        for control in [0.2, 0.4, 0.6] {
            renderer.play(&mut voices, &mut backend, &frame, "Speed_roll", &roll(), RenderInput::new(control), PlayMode::Looped);
        }

        assert_eq!(backend.count(|c| matches!(c, VoiceCommand::Play { .. })), 1);
        assert_eq!(backend.count(|c| matches!(c, VoiceCommand::SetParams { .. })), 3);
        let voice = backend.voice("Speed_roll").unwrap();
        assert!(voice.playing);
        assert_abs_diff_eq!(voice.volume, 0.6, epsilon = 1e-6);
    }

    #[test]
    fn test_pitch_variation_drawn_once_per_voice() {
        let mut renderer = SoundLayerRenderer::seeded(7);
        let mut backend = RecordingBackend::new();
        let mut voices = VoiceManager::new();
        let frame = EmitterFrame::default();
        let mut varied = roll();
        varied.pitch_variation = true;

        let first = renderer
            .play(&mut voices, &mut backend, &frame, "k", &varied, RenderInput::new(0.5), PlayMode::Looped)
            .unwrap();
        let second = renderer
            .play(&mut voices, &mut backend, &frame, "k", &varied, RenderInput::new(0.5), PlayMode::Looped)
            .unwrap();

        assert_eq!(first.pitch, second.pitch);
        let factor = voices.get("k").unwrap().pitch_variation;
        assert!((PITCH_VARIATION_MIN..=PITCH_VARIATION_MAX).contains(&factor));
    }

    #[test]
    fn test_one_shot_picks_clip_and_volume() {
        let mut renderer = SoundLayerRenderer::seeded(3);
        let mut backend = RecordingBackend::new();
        let mut voices = VoiceManager::new();
        let frame = EmitterFrame::default();
        let thud = layer(
            r#"
name: thud
clips: [thud_a, thud_b, thud_c]
volume: 1
pitch: 1
"#,
        );

        for _ in 0..20 {
            renderer.play(
                &mut voices,
                &mut backend,
                &frame,
                "Ground_thud",
                &thud,
                RenderInput::new(1.0),
                PlayMode::OneShot { randomize_volume: true },
            );
        }

        for (_, command) in backend.log() {
            if let VoiceCommand::PlayOneShot { clip, volume_scale, .. } = command {
                assert!(thud.clips.contains(clip));
                assert!((ONE_SHOT_VOLUME_MIN..=ONE_SHOT_VOLUME_MAX).contains(volume_scale));
            }
        }
        assert_eq!(backend.voice("Ground_thud").unwrap().one_shots.len(), 20);
    }

    #[test]
    fn test_silent_one_shot_does_not_stop() {
        let mut renderer = SoundLayerRenderer::seeded(3);
        let mut backend = RecordingBackend::new();
        let mut voices = VoiceManager::new();
        let frame = EmitterFrame::default();
        let mode = PlayMode::OneShot { randomize_volume: false };

        renderer.play(&mut voices, &mut backend, &frame, "k", &roll(), RenderInput::new(1.0), mode);
        renderer.play(&mut voices, &mut backend, &frame, "k", &roll(), RenderInput::new(0.0), mode);

        assert_eq!(backend.count(|c| *c == VoiceCommand::Stop), 0);
        assert!(backend.voice("k").unwrap().playing);
    }
}
