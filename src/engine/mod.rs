//! Per-emitter audio engine
//!
//! An [`Emitter`] owns everything one sound-emitting object needs: its
//! voices, their smoothed controls, the layer renderer and the air
//! simulation. Domain controllers feed it raw signals once per frame and
//! drive the fixed-cadence pass once per physics step.

mod air;
mod backend;
mod renderer;
mod smoother;
mod voice;

pub use air::{AirSimFilter, AirSimulationEngine, DopplerState, DOPPLER_MAX, DOPPLER_MAX_RATE, DOPPLER_MIN};
pub use backend::{AudioBackend, RecordedVoice, RecordingBackend, VoiceCommand, VoiceId};
pub use renderer::{
    PlayMode, RenderInput, Rendered, SoundLayerRenderer, ONE_SHOT_VOLUME_MAX, ONE_SHOT_VOLUME_MIN,
    PITCH_VARIATION_MAX, PITCH_VARIATION_MIN, SILENCE_EPSILON,
};
pub use smoother::{move_towards, quantize, ControlDomain, ControlSmoother, Smoothing, SNAP_FREE_TICK_RATE};
pub use voice::{Voice, VoiceManager};

use crate::config::{FilterToggles, Settings};
use crate::host::HostState;
use crate::layer::SoundLayer;

/// Audio state of one moving emitter
pub struct Emitter<B: AudioBackend> {
    backend: B,
    voices: VoiceManager,
    smoother: ControlSmoother,
    renderer: SoundLayerRenderer,
    air: AirSimulationEngine,
    running: bool,
    paused: bool,
}

impl<B: AudioBackend> Emitter<B> {
    /// Create an emitter that wants the given air-simulation filter stages
    pub fn new(backend: B, filters: FilterToggles) -> Self {
        Self {
            backend,
            voices: VoiceManager::new(),
            smoother: ControlSmoother::new(),
            renderer: SoundLayerRenderer::new(),
            air: AirSimulationEngine::new(filters),
            running: false,
            paused: false,
        }
    }

    /// Replace the renderer, e.g. with a seeded one
    pub fn with_renderer(mut self, renderer: SoundLayerRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Replace the smoother, e.g. with a custom snap-free shape
    pub fn with_smoother(mut self, smoother: ControlSmoother) -> Self {
        self.smoother = smoother;
        self
    }

    /// Start the emitter; updates are ignored until then
    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Pause every voice and freeze control updates
    pub fn pause(&mut self) {
        self.voices.pause_all(&mut self.backend);
        self.paused = true;
    }

    /// Resume voices; controls continue from their last values
    pub fn resume(&mut self) {
        self.voices.resume_all(&mut self.backend);
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether per-tick updates should run
    pub fn is_active(&self) -> bool {
        self.running && !self.paused
    }

    /// Stop and release every voice. A no-op if the emitter never started.
    pub fn dispose(&mut self) {
        if !self.running {
            return;
        }
        self.voices.dispose(&mut self.backend);
        self.smoother.clear();
        self.running = false;
        self.paused = false;
    }

    /// Advance the smoothed control for `key`
    pub fn smooth(&mut self, key: &str, target: f32, dt: f32, mode: Smoothing, domain: ControlDomain) -> f32 {
        self.smoother.advance(key, target, dt, mode, domain)
    }

    /// Advance the auxiliary volume scale for `key`
    pub fn smooth_aux(&mut self, key: &str, target: f32, dt: f32, rate: f32) -> f32 {
        self.smoother.advance_aux(key, target, dt, rate)
    }

    /// Render an already-smoothed control for `layer` onto the voice `key`
    #[allow(clippy::too_many_arguments)]
    pub fn play_layer(
        &mut self,
        settings: &Settings,
        host: &HostState,
        key: &str,
        layer: &SoundLayer,
        control: f32,
        volume_scale: f32,
        mode: PlayMode,
    ) -> Option<Rendered> {
        let input = RenderInput {
            control,
            gain: settings.layer_gain(),
            volume_scale,
            mass: host.vessel.part_mass,
            doppler: self.air.pitch_factor(settings),
        };
        self.renderer.play(
            &mut self.voices,
            &mut self.backend,
            &host.frame,
            key,
            layer,
            input,
            mode,
        )
    }

    /// Smooth a raw 0..1 control with the layer's own regime, then render it
    #[allow(clippy::too_many_arguments)]
    pub fn play_layer_raw(
        &mut self,
        settings: &Settings,
        host: &HostState,
        key: &str,
        layer: &SoundLayer,
        raw_control: f32,
        volume_scale: f32,
        dt: f32,
    ) -> Option<Rendered> {
        let mode = if layer.spool {
            Smoothing::Spool { rate: layer.spool_speed }
        } else {
            Smoothing::SnapFree
        };
        let control = self.smoother.advance(key, raw_control, dt, mode, ControlDomain::UNIT);
        self.play_layer(settings, host, key, layer, control, volume_scale, PlayMode::Looped)
    }

    /// Fire a one-shot of `layer` at `control`
    pub fn play_one_shot(
        &mut self,
        settings: &Settings,
        host: &HostState,
        key: &str,
        layer: &SoundLayer,
        control: f32,
        randomize_volume: bool,
    ) -> Option<Rendered> {
        self.play_layer(
            settings,
            host,
            key,
            layer,
            control,
            1.0,
            PlayMode::OneShot { randomize_volume },
        )
    }

    /// Render-cadence cleanup: expire stale filters, then destroy voices
    /// that stopped along with their controls. Controls resting at zero
    /// without a voice are dropped too.
    pub fn update(&mut self, settings: &Settings) {
        if !self.is_active() {
            return;
        }
        self.air.expire(&mut self.voices, &mut self.backend, settings);

        let smoother = &mut self.smoother;
        self.voices.reap(&mut self.backend, |key| smoother.forget(key));

        let voices = &self.voices;
        self.smoother.prune_idle(|key| voices.contains(key));
    }

    /// Fixed-cadence pass: Doppler and air-simulation filters
    pub fn fixed_update(&mut self, settings: &Settings, host: &HostState, dt: f32) {
        if !self.is_active() {
            return;
        }
        self.air
            .fixed_update(settings, host, &mut self.voices, &mut self.backend, dt);
    }

    pub fn voices(&self) -> &VoiceManager {
        &self.voices
    }

    pub fn smoother(&self) -> &ControlSmoother {
        &self.smoother
    }

    pub fn air(&self) -> &AirSimulationEngine {
        &self.air
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}
