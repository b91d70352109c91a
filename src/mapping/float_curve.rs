//! Hermite float curve
//!
//! Keys carry an in-tangent and an out-tangent, and each segment is a cubic
//! Hermite spline between its two keys. Keys given without tangents get
//! flat (zero) tangents, which eases into and out of every key.

use super::curve::{segment, Curve};

/// A single key of a [`FloatCurve`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatKey {
    pub time: f32,
    pub value: f32,
    pub in_tangent: f32,
    pub out_tangent: f32,
}

impl FloatKey {
    /// Key with flat tangents
    pub fn new(time: f32, value: f32) -> Self {
        Self::with_tangents(time, value, 0.0, 0.0)
    }

    pub fn with_tangents(time: f32, value: f32, in_tangent: f32, out_tangent: f32) -> Self {
        Self {
            time,
            value,
            in_tangent,
            out_tangent,
        }
    }
}

/// Cubic Hermite curve
#[derive(Debug, Clone, PartialEq)]
pub struct FloatCurve {
    keys: Vec<FloatKey>,
}

impl FloatCurve {
    /// Create a curve from keys sorted by time
    pub fn new(keys: Vec<FloatKey>) -> Self {
        Self { keys }
    }

    /// Build a curve whose tangents follow the straight line between keys
    pub fn linear(points: &[(f32, f32)]) -> Self {
        let mut keys: Vec<FloatKey> = points.iter().map(|&(t, v)| FloatKey::new(t, v)).collect();
        for i in 0..keys.len().saturating_sub(1) {
            let dt = keys[i + 1].time - keys[i].time;
            let slope = if dt.abs() < f32::EPSILON {
                0.0
            } else {
                (keys[i + 1].value - keys[i].value) / dt
            };
            keys[i].out_tangent = slope;
            keys[i + 1].in_tangent = slope;
        }
        Self { keys }
    }

    pub fn keys(&self) -> &[FloatKey] {
        &self.keys
    }
}

impl Curve for FloatCurve {
    fn evaluate(&self, x: f32) -> f32 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return 0.0,
        };
        if self.keys.len() == 1 || x <= first.time {
            return first.value;
        }
        if x >= last.time {
            return last.value;
        }

        let Some(i) = segment(self.keys.iter().map(|k| k.time), x) else {
            return last.value;
        };
        let k0 = &self.keys[i];
        let k1 = &self.keys[i + 1];
        let dt = k1.time - k0.time;
        if dt.abs() < f32::EPSILON {
            return k1.value;
        }

        let s = (x - k0.time) / dt;
        let s2 = s * s;
        let s3 = s2 * s;
        let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
        let h10 = s3 - 2.0 * s2 + s;
        let h01 = -2.0 * s3 + 3.0 * s2;
        let h11 = s3 - s2;

        h00 * k0.value + h10 * dt * k0.out_tangent + h01 * k1.value + h11 * dt * k1.in_tangent
    }

    fn domain(&self) -> (f32, f32) {
        match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first.time, last.time),
            _ => (0.0, 0.0),
        }
    }
}
