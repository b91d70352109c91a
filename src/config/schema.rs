//! Configuration schema definitions

use crate::wheels::{LayerGroup, SurfaceKind};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Main configuration: the settings snapshot plus the wheel sound set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Global toggles and volumes
    #[serde(default)]
    pub settings: Settings,

    /// Collider name -> surface classification
    #[serde(default = "default_colliders")]
    pub colliders: HashMap<String, SurfaceKind>,

    /// Wheel sound layers
    #[serde(default)]
    pub wheel: WheelConfig,
}

fn default_colliders() -> HashMap<String, SurfaceKind> {
    HashMap::from([("default".to_string(), SurfaceKind::Concrete)])
}

impl EngineConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.settings.validate()?;

        if self.wheel.volume < 0.0 || self.wheel.volume > 2.0 {
            bail!("Wheel volume must be between 0.0 and 2.0");
        }

        for (layer, scale) in &self.wheel.off_load_volume_scale {
            if !(0.0..=1.0).contains(scale) {
                bail!("Off-load volume scale for '{}' must be between 0.0 and 1.0", layer);
            }
        }

        for (group, layers) in &self.wheel.groups {
            for layer in layers {
                if layer.name.is_empty() {
                    bail!("Layer in group '{}' has no name", group);
                }
            }
        }

        Ok(())
    }
}

/// Snapshot of global settings, read-only during a tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Game-wide ship volume 0.0-1.0 (default: 1.0)
    #[serde(default = "default_volume")]
    pub ship_volume: f32,

    /// Exterior sound category volume 0.0-1.0 (default: 1.0)
    #[serde(default = "default_volume")]
    pub exterior_volume: f32,

    /// Gain applied to relative speed in the Doppler ratio (default: 0.5)
    #[serde(default = "default_doppler_factor")]
    pub doppler_factor: f32,

    /// Muffling settings
    #[serde(default)]
    pub muffler: MufflerSettings,

    /// Global per-filter-type enables
    #[serde(default)]
    pub filters: FilterToggles,
}

fn default_volume() -> f32 { 1.0 }
fn default_doppler_factor() -> f32 { 0.5 }

impl Default for Settings {
    fn default() -> Self {
        Self {
            ship_volume: default_volume(),
            exterior_volume: default_volume(),
            doppler_factor: default_doppler_factor(),
            muffler: MufflerSettings::default(),
            filters: FilterToggles::default(),
        }
    }
}

impl Settings {
    /// Air simulation runs only with muffling on at the air-sim quality tier
    pub fn air_simulation(&self) -> bool {
        self.muffler.enabled && self.muffler.quality == MufflerQuality::AirSim
    }

    /// Global and category volume combined
    pub fn layer_gain(&self) -> f32 {
        self.ship_volume * self.exterior_volume
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.ship_volume) {
            bail!("Ship volume must be between 0.0 and 1.0");
        }
        if !(0.0..=1.0).contains(&self.exterior_volume) {
            bail!("Exterior volume must be between 0.0 and 1.0");
        }
        if self.doppler_factor.is_nan() || self.doppler_factor < 0.0 {
            bail!("Doppler factor must be non-negative");
        }
        Ok(())
    }
}

/// Muffling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MufflerSettings {
    /// Whether muffling is enabled (default: true)
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Quality tier (default: air_sim)
    #[serde(default)]
    pub quality: MufflerQuality,

    /// Muffle other craft by atmospheric density when they are in vacuum
    /// (default: false)
    #[serde(default)]
    pub vacuum_muffling: bool,
}

fn default_enabled() -> bool { true }

impl Default for MufflerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            quality: MufflerQuality::default(),
            vacuum_muffling: false,
        }
    }
}

/// Muffling quality tiers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MufflerQuality {
    /// Single lowpass on the mix
    Lite,
    /// Per-channel lowpass
    Full,
    /// Per-voice distance/velocity simulation with Doppler
    #[default]
    AirSim,
}

/// Global enables for the air-simulation filter stages
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilterToggles {
    #[serde(default = "default_enabled")]
    pub comb: bool,
    #[serde(default = "default_enabled")]
    pub lowpass: bool,
    #[serde(default = "default_enabled")]
    pub waveshaper: bool,
}

impl Default for FilterToggles {
    fn default() -> Self {
        Self {
            comb: true,
            lowpass: true,
            waveshaper: true,
        }
    }
}

impl FilterToggles {
    /// Stages enabled both here and in `other`
    pub fn intersect(self, other: FilterToggles) -> FilterToggles {
        FilterToggles {
            comb: self.comb && other.comb,
            lowpass: self.lowpass && other.lowpass,
            waveshaper: self.waveshaper && other.waveshaper,
        }
    }

    /// All stages off
    pub fn none() -> Self {
        Self {
            comb: false,
            lowpass: false,
            waveshaper: false,
        }
    }
}

/// Wheel sound configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WheelConfig {
    /// Wheel category volume (default: 1.0)
    #[serde(default = "default_volume")]
    pub volume: f32,

    /// Motor layer name -> volume scale while the motor is off-load
    #[serde(default)]
    pub off_load_volume_scale: HashMap<String, f32>,

    /// Layers per group
    #[serde(default)]
    pub groups: BTreeMap<LayerGroup, Vec<LayerConfig>>,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            off_load_volume_scale: HashMap::new(),
            groups: BTreeMap::new(),
        }
    }
}

/// Sound layer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerConfig {
    /// Layer name, unique within its group
    pub name: String,

    /// Playback bus (default: ship)
    #[serde(default)]
    pub channel: Channel,

    /// Clip identifiers
    #[serde(default)]
    pub clips: Vec<String>,

    /// Simple volume curve
    pub volume: Option<CurveConfig>,

    /// Simple pitch curve
    pub pitch: Option<CurveConfig>,

    /// Float volume curve
    pub volume_fc: Option<Vec<Vec<f32>>>,

    /// Float pitch curve
    pub pitch_fc: Option<Vec<Vec<f32>>>,

    /// Use the float curves instead of the simple ones (default: false)
    #[serde(default)]
    pub use_float_curve: bool,

    /// Emitter mass -> volume multiplier
    pub mass_to_volume: Option<CurveConfig>,

    /// Emitter mass -> pitch multiplier
    pub mass_to_pitch: Option<CurveConfig>,

    /// Rate-limit the control (default: false)
    #[serde(default)]
    pub spool: bool,

    /// Spool rate in control units per second (default: 1.0)
    #[serde(default = "default_spool_speed")]
    pub spool_speed: f32,

    /// Idle floor for motor spool targets (default: 0.0)
    #[serde(default)]
    pub spool_idle: f32,

    /// Loop playback (default: false)
    #[serde(default, rename = "loop")]
    pub looped: bool,

    /// Start loops at a random position (default: false)
    #[serde(default)]
    pub loop_at_random: bool,

    /// Randomize pitch per voice (default: false)
    #[serde(default)]
    pub pitch_variation: bool,

    /// Free-form tag, e.g. terrain mask
    #[serde(default)]
    pub data: String,
}

fn default_spool_speed() -> f32 { 1.0 }

/// Simple curve: a constant or `[[x, y], ...]` keys
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CurveConfig {
    Constant(f32),
    Keys(Vec<[f32; 2]>),
}

/// Playback buses
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Vessel sounds
    #[default]
    Ship,
    /// Crew chatter
    Voice,
    Music,
    Ambient,
    Ui,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings: Settings = serde_yaml::from_str("ship_volume: 0.8").unwrap();
        assert_eq!(settings.ship_volume, 0.8);
        assert_eq!(settings.exterior_volume, 1.0);
        assert_eq!(settings.doppler_factor, 0.5);
        assert!(settings.air_simulation());
    }

    #[test]
    fn test_air_simulation_needs_quality_tier() {
        let yaml = r#"
muffler:
  enabled: true
  quality: full
"#;
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert!(!settings.air_simulation());

        let yaml = r#"
muffler:
  enabled: false
  quality: air_sim
"#;
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert!(!settings.air_simulation());
    }

    #[test]
    fn test_layer_config() {
        let yaml = r#"
name: tyre_roll
clips: [wheels/roll_a, wheels/roll_b]
volume: [[0, 0], [1, 1]]
pitch: 1.0
spool: true
spool_speed: 2.5
loop: true
data: dirt
"#;
        let config: LayerConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.name, "tyre_roll");
        assert_eq!(config.channel, Channel::Ship);
        assert_eq!(config.clips.len(), 2);
        assert_eq!(config.volume, Some(CurveConfig::Keys(vec![[0.0, 0.0], [1.0, 1.0]])));
        assert_eq!(config.pitch, Some(CurveConfig::Constant(1.0)));
        assert!(config.spool);
        assert!(config.looped);
        assert!(!config.use_float_curve);
        assert_eq!(config.data, "dirt");
    }

    #[test]
    fn test_wheel_groups() {
        let yaml = r#"
volume: 0.9
off_load_volume_scale:
  whine: 0.4
groups:
  motor:
    - name: whine
      clips: [motor]
  slip:
    - name: skid
      clips: [skid]
"#;
        let config: WheelConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.groups.len(), 2);
        assert!(config.groups.contains_key(&LayerGroup::Motor));
        assert_eq!(config.off_load_volume_scale.get("whine"), Some(&0.4));
    }

    #[test]
    fn test_unknown_group_rejected() {
        let yaml = r#"
groups:
  hover:
    - name: hum
"#;
        assert!(serde_yaml::from_str::<WheelConfig>(yaml).is_err());
    }

    #[test]
    fn test_config_validation() {
        let mut config = EngineConfig {
            settings: Settings::default(),
            colliders: default_colliders(),
            wheel: WheelConfig::default(),
        };
        assert!(config.validate().is_ok());

        config.wheel.off_load_volume_scale.insert("whine".to_string(), 1.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_doppler_factor() {
        let settings = Settings {
            doppler_factor: -1.0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }
}
