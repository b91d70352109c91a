//! Values consumed from the host simulation
//!
//! These are plain snapshots, read once per tick. The host is responsible
//! for sanitizing them (no NaN, no negative distances) before handing them
//! over.

use glam::{Quat, Vec3};

/// Sea-level speed of sound in m/s, used when the host has no valid value
pub const DEFAULT_SPEED_OF_SOUND: f32 = 340.29;

/// Position and orientation of the object a voice is attached to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmitterFrame {
    pub position: Vec3,
    pub rotation: Quat,
}

impl EmitterFrame {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Local up axis in world space
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }
}

impl Default for EmitterFrame {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Quat::IDENTITY)
    }
}

/// Kinematic and atmospheric state of the vessel owning an emitter
#[derive(Debug, Clone, PartialEq)]
pub struct VesselState {
    /// World-space velocity
    pub velocity: Vec3,
    /// Surface-relative speed in m/s
    pub surface_speed: f32,
    /// Static pressure in kPa
    pub static_pressure_kpa: f32,
    /// Atmospheric density in kg/m^3
    pub atmospheric_density: f32,
    /// Local speed of sound; non-positive when unknown
    pub speed_of_sound: f32,
    /// Bounding size of the vessel
    pub size: Vec3,
    /// Physics mass of the emitting part
    pub part_mass: f32,
    /// Whether this is the vessel the player is controlling
    pub is_active: bool,
    /// Vessel-wide shock-origin direction, when the host computes one
    pub mach_origin_normal: Option<Vec3>,
}

impl VesselState {
    /// Host speed of sound, or the sea-level default when invalid
    pub fn speed_of_sound(&self) -> f32 {
        if self.speed_of_sound > 0.0 {
            self.speed_of_sound
        } else {
            DEFAULT_SPEED_OF_SOUND
        }
    }
}

impl Default for VesselState {
    fn default() -> Self {
        Self {
            velocity: Vec3::ZERO,
            surface_speed: 0.0,
            static_pressure_kpa: 101.325,
            atmospheric_density: 1.225,
            speed_of_sound: DEFAULT_SPEED_OF_SOUND,
            size: Vec3::ONE,
            part_mass: 1.0,
            is_active: true,
            mach_origin_normal: None,
        }
    }
}

/// Camera/listener state
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ListenerState {
    pub position: Vec3,
    /// The interior (cockpit) camera is active
    pub internal_camera: bool,
}

/// Everything the host hands over for one tick
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HostState {
    pub frame: EmitterFrame,
    pub vessel: VesselState,
    pub listener: ListenerState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_of_sound_fallback() {
        let mut vessel = VesselState::default();
        vessel.speed_of_sound = 0.0;
        assert_eq!(vessel.speed_of_sound(), DEFAULT_SPEED_OF_SOUND);

        vessel.speed_of_sound = -5.0;
        assert_eq!(vessel.speed_of_sound(), DEFAULT_SPEED_OF_SOUND);

        vessel.speed_of_sound = 295.0;
        assert_eq!(vessel.speed_of_sound(), 295.0);
    }

    #[test]
    fn test_frame_up_axis() {
        let frame = EmitterFrame::new(Vec3::ZERO, Quat::from_rotation_z(std::f32::consts::FRAC_PI_2));
        let up = frame.up();
        assert!((up - Vec3::new(-1.0, 0.0, 0.0)).length() < 1e-5);
    }
}
