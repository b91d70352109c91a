//! Sound layers
//!
//! A [`SoundLayer`] is the validated, immutable form of a [`LayerConfig`].
//! Curve tables are parsed once here; a layer that fails to parse is
//! reported and skipped so the render path never sees a defect.

use crate::config::{Channel, CurveConfig, LayerConfig};
use crate::mapping::{Curve, FloatCurve, FloatKey, KeyCurve};
use thiserror::Error;
use tracing::warn;

/// Configuration defects found while building a layer
#[derive(Debug, Error, PartialEq)]
pub enum LayerError {
    #[error("layer '{layer}' has no audio clips")]
    NoClips { layer: String },

    #[error("layer '{layer}' is missing its {curve} curve")]
    MissingCurve { layer: String, curve: &'static str },

    #[error("layer '{layer}' {curve} curve key {index} has {len} values, expected 2 or 4")]
    MalformedKey {
        layer: String,
        curve: &'static str,
        index: usize,
        len: usize,
    },

    #[error("layer '{layer}' {curve} curve keys are not sorted by input")]
    UnsortedKeys { layer: String, curve: &'static str },

    #[error("layer '{layer}' has an invalid spool speed {speed}")]
    InvalidSpool { layer: String, speed: f32 },
}

/// The volume/pitch curve pair of a layer. Exactly one representation is
/// active per layer.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerCurves {
    Simple { volume: KeyCurve, pitch: KeyCurve },
    Float { volume: FloatCurve, pitch: FloatCurve },
}

impl LayerCurves {
    pub fn volume(&self, control: f32) -> f32 {
        match self {
            LayerCurves::Simple { volume, .. } => volume.evaluate(control),
            LayerCurves::Float { volume, .. } => volume.evaluate(control),
        }
    }

    pub fn pitch(&self, control: f32) -> f32 {
        match self {
            LayerCurves::Simple { pitch, .. } => pitch.evaluate(control),
            LayerCurves::Float { pitch, .. } => pitch.evaluate(control),
        }
    }

    /// Input range covered by both curves
    pub fn domain(&self) -> (f32, f32) {
        let (volume, pitch) = match self {
            LayerCurves::Simple { volume, pitch } => (volume.domain(), pitch.domain()),
            LayerCurves::Float { volume, pitch } => (volume.domain(), pitch.domain()),
        };
        (volume.0.min(pitch.0), volume.1.max(pitch.1))
    }
}

/// Declarative description of one acoustic layer
#[derive(Debug, Clone, PartialEq)]
pub struct SoundLayer {
    pub name: String,
    pub channel: Channel,
    pub clips: Vec<String>,
    pub curves: LayerCurves,
    pub mass_to_volume: Option<KeyCurve>,
    pub mass_to_pitch: Option<KeyCurve>,
    pub spool: bool,
    pub spool_speed: f32,
    pub spool_idle: f32,
    pub looped: bool,
    pub loop_at_random: bool,
    pub pitch_variation: bool,
    pub data: String,
}

impl SoundLayer {
    /// Build a layer from its configuration
    pub fn from_config(config: &LayerConfig) -> Result<Self, LayerError> {
        let layer = config.name.as_str();

        if config.clips.is_empty() {
            return Err(LayerError::NoClips { layer: layer.to_string() });
        }
        if !config.spool_speed.is_finite() || config.spool_speed < 0.0 {
            return Err(LayerError::InvalidSpool {
                layer: layer.to_string(),
                speed: config.spool_speed,
            });
        }

        let curves = if config.use_float_curve {
            LayerCurves::Float {
                volume: float_curve(layer, "volume", config.volume_fc.as_deref())?,
                pitch: float_curve(layer, "pitch", config.pitch_fc.as_deref())?,
            }
        } else {
            LayerCurves::Simple {
                volume: key_curve(layer, "volume", config.volume.as_ref())?,
                pitch: key_curve(layer, "pitch", config.pitch.as_ref())?,
            }
        };

        let mass_to_volume = config
            .mass_to_volume
            .as_ref()
            .map(|c| key_curve(layer, "mass_to_volume", Some(c)))
            .transpose()?;
        let mass_to_pitch = config
            .mass_to_pitch
            .as_ref()
            .map(|c| key_curve(layer, "mass_to_pitch", Some(c)))
            .transpose()?;

        Ok(Self {
            name: config.name.clone(),
            channel: config.channel,
            clips: config.clips.clone(),
            curves,
            mass_to_volume,
            mass_to_pitch,
            spool: config.spool,
            spool_speed: config.spool_speed,
            spool_idle: config.spool_idle.clamp(0.0, 1.0),
            looped: config.looped,
            loop_at_random: config.loop_at_random,
            pitch_variation: config.pitch_variation,
            data: config.data.clone(),
        })
    }

    /// Largest control the layer's curves distinguish, never below 1.0
    pub fn control_max(&self) -> f32 {
        self.curves.domain().1.max(1.0)
    }

    /// Build every valid layer, logging and skipping defective ones
    pub fn load_all(configs: &[LayerConfig]) -> Vec<SoundLayer> {
        configs
            .iter()
            .filter_map(|config| match SoundLayer::from_config(config) {
                Ok(layer) => Some(layer),
                Err(err) => {
                    warn!(%err, "skipping sound layer");
                    None
                }
            })
            .collect()
    }
}

fn key_curve(
    layer: &str,
    curve: &'static str,
    config: Option<&CurveConfig>,
) -> Result<KeyCurve, LayerError> {
    match config {
        None => Err(LayerError::MissingCurve {
            layer: layer.to_string(),
            curve,
        }),
        Some(CurveConfig::Constant(value)) => Ok(KeyCurve::constant(*value)),
        Some(CurveConfig::Keys(keys)) if keys.is_empty() => Err(LayerError::MissingCurve {
            layer: layer.to_string(),
            curve,
        }),
        Some(CurveConfig::Keys(keys)) => {
            if keys.windows(2).any(|w| w[1][0] < w[0][0]) {
                return Err(LayerError::UnsortedKeys {
                    layer: layer.to_string(),
                    curve,
                });
            }
            Ok(KeyCurve::new(keys.iter().map(|k| (k[0], k[1])).collect()))
        }
    }
}

fn float_curve(
    layer: &str,
    curve: &'static str,
    config: Option<&[Vec<f32>]>,
) -> Result<FloatCurve, LayerError> {
    let rows = match config {
        Some(rows) if !rows.is_empty() => rows,
        _ => {
            return Err(LayerError::MissingCurve {
                layer: layer.to_string(),
                curve,
            })
        }
    };

    let mut keys = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        let key = match row.as_slice() {
            [time, value] => FloatKey::new(*time, *value),
            [time, value, in_tangent, out_tangent] => {
                FloatKey::with_tangents(*time, *value, *in_tangent, *out_tangent)
            }
            _ => {
                return Err(LayerError::MalformedKey {
                    layer: layer.to_string(),
                    curve,
                    index,
                    len: row.len(),
                })
            }
        };
        keys.push(key);
    }

    if keys.windows(2).any(|w| w[1].time < w[0].time) {
        return Err(LayerError::UnsortedKeys {
            layer: layer.to_string(),
            curve,
        });
    }

    Ok(FloatCurve::new(keys))
}
