//! Wheel audio controller
//!
//! Turns one wheel's physics into four raw signals (motor, speed, ground
//! contact, slip), shapes them per layer and renders every layer through
//! an [`Emitter`]. Kinematics are sampled on the physics tick; signals are
//! smoothed and rendered on the frame tick.

use super::group::{LayerGroup, WheelSignals};
use super::state::WheelState;
use super::surface::{SurfaceClassifier, SurfaceKind};
use crate::config::{EngineConfig, FilterToggles, Settings};
use crate::engine::{
    AudioBackend, ControlDomain, Emitter, PlayMode, SoundLayerRenderer, Smoothing,
};
use crate::host::HostState;
use crate::layer::SoundLayer;
use tracing::{debug, info};

/// A layer bound to its group and voice key
#[derive(Debug, Clone)]
struct WheelLayer {
    group: LayerGroup,
    key: String,
    layer: SoundLayer,
    /// Volume scale while the motor is off-load
    off_load_scale: Option<f32>,
}

impl WheelLayer {
    fn domain(&self) -> ControlDomain {
        match self.group {
            LayerGroup::Motor => ControlDomain::OVERDRIVE,
            _ => ControlDomain {
                min: 0.0,
                max: self.layer.control_max(),
            },
        }
    }
}

/// Audio for one wheel
pub struct WheelAudioController<B: AudioBackend> {
    emitter: Emitter<B>,
    layers: Vec<WheelLayer>,
    classifier: SurfaceClassifier,
    volume: f32,

    // Physics tick
    wheel_speed: f32,
    slip: f32,
    surface: SurfaceKind,

    // Frame tick
    motor_running: bool,
    motor_loaded: bool,
    motor_output: f32,
    retracted: bool,
    signals: WheelSignals,
}

impl<B: AudioBackend> WheelAudioController<B> {
    /// Build the controller from a validated configuration. Defective layers
    /// are logged and left out.
    pub fn new(config: &EngineConfig, backend: B) -> Self {
        let mut layers = Vec::new();
        for (group, configs) in &config.wheel.groups {
            for layer in SoundLayer::load_all(configs) {
                let off_load_scale = match group {
                    LayerGroup::Motor => config.wheel.off_load_volume_scale.get(&layer.name).copied(),
                    _ => None,
                };
                layers.push(WheelLayer {
                    group: *group,
                    key: group.layer_key(&layer.name),
                    layer,
                    off_load_scale,
                });
            }
        }
        info!(layers = layers.len(), "wheel audio loaded");

        let filters = FilterToggles {
            lowpass: true,
            ..FilterToggles::none()
        };

        Self {
            emitter: Emitter::new(backend, filters),
            layers,
            classifier: SurfaceClassifier::new(config.colliders.clone()),
            volume: config.wheel.volume,
            wheel_speed: 0.0,
            slip: 0.0,
            surface: SurfaceKind::Default,
            motor_running: false,
            motor_loaded: false,
            motor_output: 0.0,
            retracted: false,
            signals: WheelSignals::silent(),
        }
    }

    /// Use a specific renderer, e.g. a seeded one
    pub fn with_renderer(mut self, renderer: SoundLayerRenderer) -> Self {
        self.emitter = self.emitter.with_renderer(renderer);
        self
    }

    pub fn start(&mut self) {
        self.emitter.start();
    }

    pub fn pause(&mut self) {
        self.emitter.pause();
    }

    pub fn resume(&mut self) {
        self.emitter.resume();
    }

    pub fn dispose(&mut self) {
        self.emitter.dispose();
    }

    /// Frame tick: derive signals, smooth and render every layer, then let
    /// the emitter clean up stopped voices
    pub fn update(&mut self, settings: &Settings, host: &HostState, wheel: &WheelState, dt: f32) {
        if !self.emitter.is_active() {
            return;
        }

        if let Some(motor) = &wheel.motor {
            self.motor_running = motor.is_running();
            self.motor_output = motor.output(self.wheel_speed);
        }
        self.motor_loaded = wheel.motor.as_ref().is_some_and(|m| m.is_loaded());
        if wheel.deployment.is_some() {
            self.retracted = wheel.is_retracted();
        }

        self.signals = if self.retracted {
            WheelSignals::silent()
        } else {
            WheelSignals::derive(self.motor_output, self.wheel_speed, self.slip, wheel.grounded)
        };

        for entry in &self.layers {
            let mut target = entry.group.signal(&self.signals);
            if entry.group.terrain_gated() && !self.surface.admits(&entry.layer.data) {
                target = 0.0;
            }

            let control = smooth(
                &mut self.emitter,
                entry,
                target,
                self.motor_running,
                wheel.braking,
                dt,
            );

            let mut volume_scale = 1.0;
            if let Some(scale) = entry.off_load_scale {
                let target = if self.motor_loaded { 1.0 } else { scale };
                volume_scale = if entry.layer.spool {
                    self.emitter
                        .smooth_aux(&entry.key, target, dt, entry.layer.spool_speed)
                } else {
                    target
                };
            }

            self.emitter.play_layer(
                settings,
                host,
                &entry.key,
                &entry.layer,
                control,
                self.volume * volume_scale,
                PlayMode::Looped,
            );
        }

        self.emitter.update(settings);
    }

    /// Physics tick: air simulation, surface contact and wheel kinematics
    pub fn fixed_update(&mut self, settings: &Settings, host: &HostState, wheel: &WheelState, dt: f32) {
        if !self.emitter.is_active() {
            return;
        }
        self.emitter.fixed_update(settings, host, dt);

        if wheel.damaged {
            self.wheel_speed = 0.0;
            self.slip = 0.0;
            return;
        }

        let surface = self.classifier.classify(wheel.contact.as_deref());
        if surface != self.surface {
            debug!(from = %self.surface, to = %surface, "wheel surface changed");
            self.surface = surface;
        }

        self.wheel_speed = wheel.rolling_speed().abs();
        self.slip = wheel.slip();
    }

    /// Raw signals of the last frame tick
    pub fn signals(&self) -> WheelSignals {
        self.signals
    }

    pub fn wheel_speed(&self) -> f32 {
        self.wheel_speed
    }

    pub fn slip(&self) -> f32 {
        self.slip
    }

    pub fn surface(&self) -> SurfaceKind {
        self.surface
    }

    pub fn motor_output(&self) -> f32 {
        self.motor_output
    }

    pub fn is_retracted(&self) -> bool {
        self.retracted
    }

    /// Voice keys of every loaded layer, grouped in group order
    pub fn layer_keys(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().map(|l| l.key.as_str())
    }

    /// Smoothed control of a layer, if it has any state
    pub fn control(&self, key: &str) -> Option<f32> {
        self.emitter.smoother().current(key)
    }

    pub fn emitter(&self) -> &Emitter<B> {
        &self.emitter
    }

    pub fn emitter_mut(&mut self) -> &mut Emitter<B> {
        &mut self.emitter
    }
}

/// Advance one layer's control toward `target`
fn smooth<B: AudioBackend>(
    emitter: &mut Emitter<B>,
    entry: &WheelLayer,
    target: f32,
    motor_running: bool,
    braking: bool,
    dt: f32,
) -> f32 {
    let layer = &entry.layer;
    let domain = entry.domain();

    if !layer.spool {
        return emitter.smooth(&entry.key, target, dt, Smoothing::SnapFreeHeld, domain);
    }

    let (target, rate) = if entry.group == LayerGroup::Motor {
        let floor = if motor_running { layer.spool_idle } else { 0.0 };
        let spooled = lerp(floor, 1.0, target.clamp(0.0, 1.0));
        let current = emitter.smoother().current(&entry.key).unwrap_or(0.0);
        // Output boosts the rate, except when braking toward a lower level
        let rate = if braking && current > spooled {
            layer.spool_speed
        } else {
            layer.spool_speed.max(target * 0.5)
        };
        (spooled, rate)
    } else {
        (target, layer.spool_speed)
    };

    emitter.smooth(&entry.key, target, dt, Smoothing::Spool { rate }, domain)
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
