//! Air simulation: Doppler shift and distance/atmosphere filter inputs
//!
//! Runs at the fixed physics cadence. The Doppler state (`last_distance`,
//! the rate-limited ratio) is only ever mutated from [`AirSimulationEngine::fixed_update`]
//! so a variable render rate cannot integrate it twice.

use super::backend::{AudioBackend, VoiceCommand};
use super::smoother::move_towards;
use super::voice::VoiceManager;
use crate::config::{FilterToggles, Settings};
use crate::host::HostState;
use glam::Vec3;
use serde::Serialize;
use tracing::debug;

/// Lowest Doppler pitch ratio
pub const DOPPLER_MIN: f32 = 0.5;
/// Highest Doppler pitch ratio
pub const DOPPLER_MAX: f32 = 1.5;
/// Fastest the applied Doppler ratio may change, per second
pub const DOPPLER_MAX_RATE: f32 = 0.5;

/// Inputs for the per-voice comb/lowpass/waveshaper stages
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirSimFilter {
    /// Listener distance in metres
    pub distance: f32,
    /// Surface speed of the vessel in m/s
    pub velocity: f32,
    /// Dot of the shock-origin normal and the direction of motion
    pub angle: f32,
    /// Vessel bounding size
    pub vessel_size: f32,
    pub speed_of_sound: f32,
    pub atmospheric_pressure_pa: f32,
    /// Listener is inside this (active) vessel
    pub active_internal_vessel: bool,
    /// Multiplier on the lowpass cutoff
    pub lowpass_scale: f32,
    pub comb: bool,
    pub lowpass: bool,
    pub waveshaper: bool,
}

/// Per-emitter Doppler state
#[derive(Debug, Clone, PartialEq)]
pub struct DopplerState {
    /// Closing speed in m/s, positive when approaching
    pub relative_speed: f32,
    /// Unsmoothed ratio, clamped to the legal range
    pub raw: f32,
    /// Rate-limited ratio applied to pitch
    pub value: f32,
    last_distance: Option<f32>,
}

impl DopplerState {
    pub fn new() -> Self {
        Self {
            relative_speed: 0.0,
            raw: 1.0,
            value: 1.0,
            last_distance: None,
        }
    }

    /// Advance one fixed tick. The first tick only records the distance.
    pub fn update(&mut self, distance: f32, speed_of_sound: f32, gain: f32, dt: f32) -> f32 {
        self.relative_speed = match self.last_distance {
            Some(last) => (last - distance) / dt,
            None => 0.0,
        };
        self.last_distance = Some(distance);

        self.raw = ((speed_of_sound + self.relative_speed * gain) / speed_of_sound)
            .clamp(DOPPLER_MIN, DOPPLER_MAX);
        self.value = move_towards(self.value, self.raw, DOPPLER_MAX_RATE * dt);
        self.value
    }
}

impl Default for DopplerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Geometry sampled on the last fixed tick
#[derive(Debug, Clone, Copy, PartialEq)]
struct AirSample {
    distance: f32,
    mach_origin_normal: Vec3,
    speed_of_sound: f32,
}

/// Computes Doppler and filter inputs for one moving emitter
#[derive(Debug, Clone)]
pub struct AirSimulationEngine {
    doppler: DopplerState,
    sample: Option<AirSample>,
    filters: FilterToggles,
}

impl AirSimulationEngine {
    /// Create an engine with the filter stages this emitter wants
    pub fn new(filters: FilterToggles) -> Self {
        Self {
            doppler: DopplerState::new(),
            sample: None,
            filters,
        }
    }

    pub fn doppler(&self) -> &DopplerState {
        &self.doppler
    }

    /// Doppler pitch factor, 1.0 when air simulation is off
    pub fn pitch_factor(&self, settings: &Settings) -> f32 {
        if settings.air_simulation() {
            self.doppler.value
        } else {
            1.0
        }
    }

    pub fn distance(&self) -> Option<f32> {
        self.sample.map(|s| s.distance)
    }

    /// Direction used for the filter angle on the last tick
    pub fn mach_origin_normal(&self) -> Option<Vec3> {
        self.sample.map(|s| s.mach_origin_normal)
    }

    /// Run one fixed tick: sample geometry, update Doppler, then attach or
    /// refresh the filter on every playing voice. With air simulation off,
    /// every attached filter is removed instead.
    pub fn fixed_update<B: AudioBackend>(
        &mut self,
        settings: &Settings,
        host: &HostState,
        voices: &mut VoiceManager,
        backend: &mut B,
        dt: f32,
    ) {
        if !settings.air_simulation() {
            self.expire(voices, backend, settings);
            return;
        }
        if dt <= 0.0 {
            return;
        }

        let HostState {
            frame,
            vessel,
            listener,
        } = host;
        let distance = listener.position.distance(frame.position);
        let mach_origin_normal = vessel
            .mach_origin_normal
            .unwrap_or_else(|| (listener.position - frame.position).normalize_or_zero());
        let speed_of_sound = vessel.speed_of_sound();

        self.doppler
            .update(distance, speed_of_sound, settings.doppler_factor, dt);
        let sample = AirSample {
            distance,
            mach_origin_normal,
            speed_of_sound,
        };
        self.sample = Some(sample);

        let filters = self.filters.intersect(settings.filters);
        let angle = mach_origin_normal.dot((frame.up() + vessel.velocity).normalize_or_zero());
        let lowpass_scale = if !settings.muffler.vacuum_muffling && !vessel.is_active {
            vessel.atmospheric_density.clamp(0.0, 1.0)
        } else {
            1.0
        };

        for voice in voices.iter_mut() {
            if !backend.is_playing(voice.id()) {
                continue;
            }
            if voice.air_filter.is_none() {
                debug!(key = voice.key(), "air filter attached");
            }

            let filter = AirSimFilter {
                distance: sample.distance,
                velocity: vessel.surface_speed,
                angle,
                vessel_size: vessel.size.length(),
                speed_of_sound: sample.speed_of_sound,
                atmospheric_pressure_pa: vessel.static_pressure_kpa * 1000.0,
                active_internal_vessel: vessel.is_active && listener.internal_camera,
                lowpass_scale,
                comb: filters.comb,
                lowpass: filters.lowpass,
                waveshaper: filters.waveshaper,
            };
            backend.apply(voice.id(), VoiceCommand::SetAirFilter(filter.clone()));
            voice.air_filter = Some(filter);
        }
    }

    /// Drop filters from voices that stopped, or from all voices when air
    /// simulation is off. Safe to call at any cadence.
    pub fn expire<B: AudioBackend>(&self, voices: &mut VoiceManager, backend: &mut B, settings: &Settings) {
        let enabled = settings.air_simulation();
        for voice in voices.iter_mut() {
            if voice.air_filter.is_none() {
                continue;
            }
            if !enabled || !backend.is_playing(voice.id()) {
                backend.apply(voice.id(), VoiceCommand::ClearAirFilter);
                voice.air_filter = None;
                debug!(key = voice.key(), "air filter removed");
            }
        }
    }
}
