//! Scripted wheel run for the simulate command
//!
//! The run is split into four phases by fraction of its length: throttle
//! up, hold speed, brake to a stop with the wheel partly locked, then
//! retract the gear with the wheel still spinning.

use glam::{Vec2, Vec3};
use serde::Serialize;
use std::fmt;
use vessel_audio::host::{EmitterFrame, HostState, ListenerState, VesselState};
use vessel_audio::wheels::{Deployment, MotorMode, MotorState, WheelState};

const WHEEL_RADIUS: f32 = 0.4;
const TOP_SPEED: f32 = 12.0;
/// Listener offset from the track, metres
const LISTENER_OFFSET: f32 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Accelerate,
    Cruise,
    Brake,
    Retract,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Accelerate => "accelerate",
            Phase::Cruise => "cruise",
            Phase::Brake => "brake",
            Phase::Retract => "retract",
        };
        f.write_str(name)
    }
}

/// A scripted run of a single motorized wheel
#[derive(Debug, Clone)]
pub struct Drive {
    seconds: f32,
    contact: String,
    position: f32,
}

impl Drive {
    pub fn new(seconds: f32, contact: impl Into<String>) -> Self {
        Self {
            seconds: seconds.max(f32::EPSILON),
            contact: contact.into(),
            position: 0.0,
        }
    }

    pub fn phase(&self, time: f32) -> Phase {
        match time / self.seconds {
            p if p < 0.4 => Phase::Accelerate,
            p if p < 0.6 => Phase::Cruise,
            p if p < 0.85 => Phase::Brake,
            _ => Phase::Retract,
        }
    }

    /// Ground speed at `time`
    pub fn speed(&self, time: f32) -> f32 {
        let progress = (time / self.seconds).clamp(0.0, 1.0);
        let speed = match self.phase(time) {
            Phase::Accelerate => TOP_SPEED * progress / 0.4,
            Phase::Cruise => TOP_SPEED,
            Phase::Brake => TOP_SPEED * (1.0 - (progress - 0.6) / 0.25),
            Phase::Retract => 0.0,
        };
        speed.max(0.0)
    }

    /// Wheel physics at `time`
    pub fn wheel(&self, time: f32) -> WheelState {
        let speed = self.speed(time);
        let motor = |mode| {
            Some(MotorState {
                enabled: true,
                mode,
                wheel_speed_max: TOP_SPEED,
            })
        };
        let base = WheelState {
            radius: WHEEL_RADIUS,
            local_velocity: Vec2::new(0.0, speed),
            contact: Some(self.contact.clone()),
            deployment: Some(Deployment::Deployed),
            ..WheelState::default()
        };

        match self.phase(time) {
            // Slight wheelspin under throttle
            Phase::Accelerate => WheelState {
                motor: motor(MotorMode::Running),
                angular_velocity: speed * 1.05 / WHEEL_RADIUS,
                ..base
            },
            Phase::Cruise => WheelState {
                motor: motor(MotorMode::Running),
                angular_velocity: speed / WHEEL_RADIUS,
                ..base
            },
            Phase::Brake => WheelState {
                motor: motor(MotorMode::Idle),
                braking: true,
                angular_velocity: speed * 0.7 / WHEEL_RADIUS,
                local_velocity: Vec2::new(0.5, speed),
                ..base
            },
            Phase::Retract => WheelState {
                motor: motor(MotorMode::Idle),
                deployment: Some(Deployment::Retracted),
                grounded: false,
                angular_velocity: TOP_SPEED * 0.5 / WHEEL_RADIUS,
                contact: None,
                ..base
            },
        }
    }

    /// Move the vehicle along the track by one physics step
    pub fn advance(&mut self, time: f32, dt: f32) {
        self.position += self.speed(time) * dt;
    }

    /// Host snapshot at `time`, with the listener beside the track midway
    pub fn host(&self, time: f32) -> HostState {
        let speed = self.speed(time);
        HostState {
            frame: EmitterFrame {
                position: Vec3::new(0.0, 0.0, self.position),
                ..EmitterFrame::default()
            },
            vessel: VesselState {
                velocity: Vec3::new(0.0, 0.0, speed),
                surface_speed: speed,
                ..VesselState::default()
            },
            listener: ListenerState {
                position: Vec3::new(LISTENER_OFFSET, 0.0, TOP_SPEED * self.seconds * 0.3),
                internal_camera: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phases() {
        let drive = Drive::new(10.0, "runway");
        assert_eq!(drive.phase(0.0), Phase::Accelerate);
        assert_eq!(drive.phase(5.0), Phase::Cruise);
        assert_eq!(drive.phase(7.0), Phase::Brake);
        assert_eq!(drive.phase(9.0), Phase::Retract);
    }

    #[test]
    fn test_speed_profile() {
        let drive = Drive::new(10.0, "runway");
        assert_eq!(drive.speed(0.0), 0.0);
        assert_eq!(drive.speed(5.0), TOP_SPEED);
        assert!(drive.speed(8.4) < 1.0);
        assert_eq!(drive.speed(9.5), 0.0);
    }

    #[test]
    fn test_retract_keeps_wheel_spinning() {
        let wheel = Drive::new(10.0, "runway").wheel(9.5);
        assert!(wheel.is_retracted());
        assert!(wheel.angular_velocity > 0.0);
        assert!(wheel.contact.is_none());
    }

    #[test]
    fn test_vehicle_moves() {
        let mut drive = Drive::new(10.0, "runway");
        drive.advance(5.0, 1.0);
        assert_eq!(drive.host(5.0).frame.position.z, TOP_SPEED);
    }
}
