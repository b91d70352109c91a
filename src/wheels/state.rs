//! Wheel subsystem state read from the host each tick

use glam::Vec2;
use std::str::FromStr;

/// Motor state machine of a driven wheel
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum MotorMode {
    #[default]
    Disabled,
    Idle,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotorState {
    pub enabled: bool,
    pub mode: MotorMode,
    /// Rolling speed at full motor output, m/s
    pub wheel_speed_max: f32,
}

impl MotorState {
    /// Motor is switched on and not disabled
    pub fn is_running(&self) -> bool {
        self.enabled && self.mode > MotorMode::Disabled
    }

    /// Delivering torque to the contact
    pub fn is_loaded(&self) -> bool {
        self.mode == MotorMode::Running
    }

    /// Output normalized by the rated speed, 0..2
    pub fn output(&self, wheel_speed: f32) -> f32 {
        if !self.is_running() || self.wheel_speed_max <= 0.0 {
            return 0.0;
        }
        (wheel_speed / self.wheel_speed_max).clamp(0.0, 2.0)
    }
}

/// Landing-gear deployment as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Deployment {
    #[default]
    Deployed,
    Retracted,
    /// Any transitional or unknown state
    Moving,
}

impl FromStr for Deployment {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "Deployed" => Deployment::Deployed,
            "Retracted" => Deployment::Retracted,
            _ => Deployment::Moving,
        })
    }
}

/// One wheel's physics snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct WheelState {
    /// Absent on undriven wheels
    pub motor: Option<MotorState>,
    /// Absent on fixed gear
    pub deployment: Option<Deployment>,
    pub grounded: bool,
    pub braking: bool,
    pub damaged: bool,
    pub radius: f32,
    /// rad/s
    pub angular_velocity: f32,
    /// Wheel-local velocity: x lateral, y longitudinal
    pub local_velocity: Vec2,
    /// Name of the collider under the wheel, if the ground probe hit one
    pub contact: Option<String>,
}

impl WheelState {
    pub fn is_retracted(&self) -> bool {
        self.deployment == Some(Deployment::Retracted)
    }

    /// Speed the wheel surface is turning at
    pub fn rolling_speed(&self) -> f32 {
        self.radius * self.angular_velocity
    }

    /// Magnitude of the contact patch sliding over the ground
    pub fn slip(&self) -> f32 {
        let x = self.local_velocity.x;
        let y = self.rolling_speed() - self.local_velocity.y;
        (x * x + y * y).sqrt()
    }
}

impl Default for WheelState {
    fn default() -> Self {
        Self {
            motor: None,
            deployment: None,
            grounded: true,
            braking: false,
            damaged: false,
            radius: 0.5,
            angular_velocity: 0.0,
            local_velocity: Vec2::ZERO,
            contact: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_motor_output() {
        let motor = MotorState {
            enabled: true,
            mode: MotorMode::Running,
            wheel_speed_max: 10.0,
        };
        assert_eq!(motor.output(5.0), 0.5);
        assert_eq!(motor.output(50.0), 2.0);

        let idle = MotorState { mode: MotorMode::Idle, ..motor };
        assert!(idle.is_running());
        assert!(!idle.is_loaded());

        let off = MotorState { enabled: false, ..motor };
        assert_eq!(off.output(5.0), 0.0);
    }

    #[test]
    fn test_deployment_strings() {
        assert_eq!("Retracted".parse::<Deployment>(), Ok(Deployment::Retracted));
        assert_eq!("Deployed".parse::<Deployment>(), Ok(Deployment::Deployed));
        assert_eq!("Retracting".parse::<Deployment>(), Ok(Deployment::Moving));
    }

    #[test]
    fn test_slip() {
        let wheel = WheelState {
            radius: 0.5,
            angular_velocity: 20.0,
            local_velocity: Vec2::new(3.0, 6.0),
            ..WheelState::default()
        };
        // Rolling 10 m/s over ground moving 6 m/s, sliding 3 m/s sideways
        assert_abs_diff_eq!(wheel.slip(), 5.0, epsilon = 1e-6);
    }
}
