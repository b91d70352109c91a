//! Wheel layer groups and their raw signals

use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw per-frame signals of one wheel, before smoothing
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelSignals {
    /// Normalized motor output, 0..2
    pub motor: f32,
    /// Rolling speed in m/s
    pub speed: f32,
    /// Contact noise: max of rolling speed and slip while grounded
    pub ground: f32,
    /// Slip displacement while grounded
    pub slip: f32,
}

impl WheelSignals {
    /// Derive the four signals from wheel kinematics
    pub fn derive(motor_output: f32, wheel_speed: f32, slip: f32, grounded: bool) -> Self {
        Self {
            motor: motor_output,
            speed: wheel_speed,
            ground: if grounded { wheel_speed.max(slip) } else { 0.0 },
            slip: if grounded { slip } else { 0.0 },
        }
    }

    /// Signals of a stowed wheel
    pub fn silent() -> Self {
        Self::default()
    }
}

/// A named acoustic component of a wheel; each layer in a group shares
/// the group's raw signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerGroup {
    Motor,
    Speed,
    Ground,
    Slip,
}

impl LayerGroup {
    pub const ALL: [LayerGroup; 4] = [
        LayerGroup::Motor,
        LayerGroup::Speed,
        LayerGroup::Ground,
        LayerGroup::Slip,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LayerGroup::Motor => "Motor",
            LayerGroup::Speed => "Speed",
            LayerGroup::Ground => "Ground",
            LayerGroup::Slip => "Slip",
        }
    }

    /// The group's raw signal
    pub fn signal(&self, signals: &WheelSignals) -> f32 {
        match self {
            LayerGroup::Motor => signals.motor,
            LayerGroup::Speed => signals.speed,
            LayerGroup::Ground => signals.ground,
            LayerGroup::Slip => signals.slip,
        }
    }

    /// Whether layers of this group are silenced on non-matching terrain
    pub fn terrain_gated(&self) -> bool {
        matches!(self, LayerGroup::Ground | LayerGroup::Slip)
    }

    /// Voice and control key for a layer of this group
    pub fn layer_key(&self, layer: &str) -> String {
        format!("{}_{}", self.name(), layer)
    }
}

impl fmt::Display for LayerGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grounded_signals() {
        let signals = WheelSignals::derive(0.5, 10.0, 3.0, true);
        assert_eq!(LayerGroup::Motor.signal(&signals), 0.5);
        assert_eq!(LayerGroup::Speed.signal(&signals), 10.0);
        assert_eq!(LayerGroup::Ground.signal(&signals), 10.0);
        assert_eq!(LayerGroup::Slip.signal(&signals), 3.0);

        let skidding = WheelSignals::derive(0.0, 1.0, 6.0, true);
        assert_eq!(LayerGroup::Ground.signal(&skidding), 6.0);
    }

    #[test]
    fn test_airborne_signals() {
        let signals = WheelSignals::derive(0.5, 10.0, 3.0, false);
        assert_eq!(LayerGroup::Speed.signal(&signals), 10.0);
        assert_eq!(LayerGroup::Ground.signal(&signals), 0.0);
        assert_eq!(LayerGroup::Slip.signal(&signals), 0.0);
    }

    #[test]
    fn test_silent_signals() {
        let signals = WheelSignals::silent();
        assert!(LayerGroup::ALL.iter().all(|g| g.signal(&signals) == 0.0));
    }

    #[test]
    fn test_layer_key() {
        assert_eq!(LayerGroup::Motor.layer_key("whine"), "Motor_whine");
        assert!(LayerGroup::Slip.terrain_gated());
        assert!(!LayerGroup::Speed.terrain_gated());
    }

    #[test]
    fn test_group_names_parse() {
        let group: LayerGroup = serde_yaml::from_str("ground").unwrap();
        assert_eq!(group, LayerGroup::Ground);
        assert!(serde_yaml::from_str::<LayerGroup>("hover").is_err());
    }
}
