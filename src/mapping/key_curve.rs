//! Simple piecewise-linear curve

use super::curve::{segment, Curve};

/// Piecewise-linear curve over `(x, y)` keys.
///
/// A curve with a single key is a constant.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyCurve {
    keys: Vec<(f32, f32)>,
}

impl KeyCurve {
    /// Create a curve from keys sorted by `x`
    pub fn new(keys: Vec<(f32, f32)>) -> Self {
        Self { keys }
    }

    /// Create a curve that always returns `value`
    pub fn constant(value: f32) -> Self {
        Self { keys: vec![(0.0, value)] }
    }

    /// Straight line from `(0, from)` to `(1, to)`
    pub fn linear(from: f32, to: f32) -> Self {
        Self::new(vec![(0.0, from), (1.0, to)])
    }

    pub fn keys(&self) -> &[(f32, f32)] {
        &self.keys
    }
}

impl Curve for KeyCurve {
    fn evaluate(&self, x: f32) -> f32 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return 0.0,
        };
        if self.keys.len() == 1 || x <= first.0 {
            return first.1;
        }
        if x >= last.0 {
            return last.1;
        }

        match segment(self.keys.iter().map(|k| k.0), x) {
            Some(i) => {
                let (x0, y0) = self.keys[i];
                let (x1, y1) = self.keys[i + 1];
                let span = x1 - x0;
                if span.abs() < f32::EPSILON {
                    y1
                } else {
                    y0 + (x - x0) / span * (y1 - y0)
                }
            }
            None => last.1,
        }
    }

    fn domain(&self) -> (f32, f32) {
        match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first.0, last.0),
            _ => (0.0, 0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_curve_basic() {
        let curve = KeyCurve::linear(0.0, 1.0);

        assert_eq!(curve.evaluate(0.0), 0.0);
        assert_eq!(curve.evaluate(0.5), 0.5);
        assert_eq!(curve.evaluate(1.0), 1.0);
    }

    #[test]
    fn test_key_curve_holds_endpoints() {
        let curve = KeyCurve::new(vec![(0.2, 0.1), (0.8, 0.9)]);

        assert_eq!(curve.evaluate(-1.0), 0.1);
        assert_eq!(curve.evaluate(0.0), 0.1);
        assert_eq!(curve.evaluate(1.0), 0.9);
        assert_eq!(curve.evaluate(2.0), 0.9);
    }

    #[test]
    fn test_key_curve_multiple_segments() {
        // Volume rises quickly then flattens
        let curve = KeyCurve::new(vec![(0.0, 0.0), (0.25, 0.8), (1.0, 1.0)]);

        assert!((curve.evaluate(0.125) - 0.4).abs() < 1e-6);
        assert!((curve.evaluate(0.625) - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_key_curve_constant() {
        let curve = KeyCurve::constant(0.7);

        assert_eq!(curve.evaluate(0.0), 0.7);
        assert_eq!(curve.evaluate(5.0), 0.7);
        assert_eq!(curve.domain(), (0.0, 0.0));
    }

    #[test]
    fn test_key_curve_mass_scale() {
        // Heavier parts sound lower
        let curve = KeyCurve::new(vec![(0.5, 1.2), (10.0, 0.6)]);

        assert_eq!(curve.evaluate(0.1), 1.2);
        assert!(curve.evaluate(5.0) < 1.2);
        assert_eq!(curve.evaluate(50.0), 0.6);
    }
}
