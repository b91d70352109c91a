//! Control smoothing
//!
//! Raw 0..1 signals from the simulation jump around from tick to tick.
//! [`ControlSmoother`] turns them into per-key controls that move at a
//! bounded rate, so curves evaluated against them never click.

use crate::mapping::{Curve, FloatCurve};
use std::collections::HashMap;

/// Nominal frame rate the snap-free shaping curve was tuned for
pub const SNAP_FREE_TICK_RATE: f32 = 60.0;

/// Smoothing regime for one layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Smoothing {
    /// Linear approach at `rate` control units per second
    Spool { rate: f32 },
    /// Approach rate taken from the shaping curve at the target
    SnapFree,
    /// Approach rate taken from the shaping curve at `max(current, target)`,
    /// so a falling control decays at the rate of the level it falls from
    SnapFreeHeld,
}

/// Legal range of a control value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlDomain {
    pub min: f32,
    pub max: f32,
}

impl ControlDomain {
    /// 0..1, the range of ordinary layer curves
    pub const UNIT: ControlDomain = ControlDomain { min: 0.0, max: 1.0 };
    /// 0..2, for signals that may run past their nominal maximum
    pub const OVERDRIVE: ControlDomain = ControlDomain { min: 0.0, max: 2.0 };

    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }
}

/// Move `current` toward `target` by at most `max_delta`, never past it
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}

/// Round to three decimal places
pub fn quantize(control: f32) -> f32 {
    (control * 1000.0).round() * 0.001
}

/// Default snap-free shaping curve: fast near silence, slow near full
pub fn default_shape() -> FloatCurve {
    FloatCurve::linear(&[(0.0, 0.04), (1.0, 0.01)])
}

/// Per-key smoothed controls
#[derive(Debug, Clone)]
pub struct ControlSmoother {
    controls: HashMap<String, f32>,
    aux: HashMap<String, f32>,
    shape: FloatCurve,
}

impl ControlSmoother {
    pub fn new() -> Self {
        Self::with_shape(default_shape())
    }

    /// Use a custom snap-free shaping curve
    pub fn with_shape(shape: FloatCurve) -> Self {
        Self {
            controls: HashMap::new(),
            aux: HashMap::new(),
            shape,
        }
    }

    /// Advance the control for `key` toward `target` and return it.
    ///
    /// An unseen key starts at 0. `target` must not be NaN.
    pub fn advance(
        &mut self,
        key: &str,
        target: f32,
        dt: f32,
        mode: Smoothing,
        domain: ControlDomain,
    ) -> f32 {
        let target = domain.clamp(target);
        let current = self.current(key).unwrap_or(0.0);
        let dt = dt.max(0.0);

        let max_delta = match mode {
            Smoothing::Spool { rate } => rate.max(0.0) * dt,
            Smoothing::SnapFree => self.shape.evaluate(target) * SNAP_FREE_TICK_RATE * dt,
            Smoothing::SnapFreeHeld => {
                self.shape.evaluate(current.max(target)) * SNAP_FREE_TICK_RATE * dt
            }
        };

        let next = domain.clamp(move_towards(current, target, max_delta.max(0.0)));
        store(&mut self.controls, key, next);
        next
    }

    /// Advance the auxiliary volume scale for `key` at `rate` per second.
    /// An unseen key starts at 0.
    pub fn advance_aux(&mut self, key: &str, target: f32, dt: f32, rate: f32) -> f32 {
        let current = self.aux.get(key).copied().unwrap_or(0.0);
        let next = move_towards(current, target, rate.max(0.0) * dt.max(0.0));
        store(&mut self.aux, key, next);
        next
    }

    /// Current control for `key`
    pub fn current(&self, key: &str) -> Option<f32> {
        self.controls.get(key).copied()
    }

    /// Current auxiliary scale for `key`
    pub fn aux(&self, key: &str) -> Option<f32> {
        self.aux.get(key).copied()
    }

    /// Drop all state for `key`, so a later trigger starts from silence
    pub fn forget(&mut self, key: &str) {
        self.controls.remove(key);
        self.aux.remove(key);
    }

    /// Drop keys whose control rests at exactly zero, unless `keep`
    /// claims them. Returns the number dropped.
    pub fn prune_idle(&mut self, keep: impl Fn(&str) -> bool) -> usize {
        let aux = &mut self.aux;
        let before = self.controls.len();
        self.controls.retain(|key, value| {
            if *value == 0.0 && !keep(key.as_str()) {
                aux.remove(key);
                false
            } else {
                true
            }
        });
        before - self.controls.len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.controls.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.controls.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    pub fn clear(&mut self) {
        self.controls.clear();
        self.aux.clear();
    }
}

impl Default for ControlSmoother {
    fn default() -> Self {
        Self::new()
    }
}

fn store(map: &mut HashMap<String, f32>, key: &str, value: f32) {
    match map.get_mut(key) {
        Some(slot) => *slot = value,
        None => {
            map.insert(key.to_string(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn test_move_towards() {
        assert_eq!(move_towards(0.0, 1.0, 0.25), 0.25);
        assert_eq!(move_towards(0.9, 1.0, 0.25), 1.0);
        assert_eq!(move_towards(1.0, 0.0, 0.25), 0.75);
        assert_eq!(move_towards(0.5, 0.5, 0.0), 0.5);
    }

    #[test]
    fn test_quantize() {
        assert_abs_diff_eq!(quantize(0.12345), 0.123, epsilon = 1e-6);
        assert_abs_diff_eq!(quantize(0.0004), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(quantize(0.9996), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_unseen_key_starts_at_zero() {
        let mut smoother = ControlSmoother::new();
        let value = smoother.advance("Speed_roll", 1.0, DT, Smoothing::Spool { rate: 1.0 }, ControlDomain::UNIT);

        assert_abs_diff_eq!(value, DT, epsilon = 1e-6);
        assert!(smoother.contains("Speed_roll"));
    }

    #[test]
    fn test_spool_is_linear() {
        let mut smoother = ControlSmoother::new();
        let mode = Smoothing::Spool { rate: 0.5 };
        let mut value = 0.0;
        for _ in 0..60 {
            value = smoother.advance("Motor_whine", 1.0, DT, mode, ControlDomain::UNIT);
        }
        assert_abs_diff_eq!(value, 0.5, epsilon = 1e-4);

        for _ in 0..60 {
            value = smoother.advance("Motor_whine", 1.0, DT, mode, ControlDomain::UNIT);
        }
        assert_abs_diff_eq!(value, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_no_overshoot_either_mode() {
        for mode in [
            Smoothing::Spool { rate: 3.0 },
            Smoothing::SnapFree,
            Smoothing::SnapFreeHeld,
        ] {
            let mut smoother = ControlSmoother::new();
            let target = 0.37;
            let mut last = 0.0;
            for _ in 0..500 {
                let value = smoother.advance("k", target, DT, mode, ControlDomain::UNIT);
                assert!(value >= last, "{mode:?} went backwards");
                assert!(value <= target, "{mode:?} overshot: {value}");
                last = value;
            }
            assert_eq!(last, target);

            // And back down
            for _ in 0..500 {
                let value = smoother.advance("k", 0.0, DT, mode, ControlDomain::UNIT);
                assert!(value <= last);
                assert!(value >= 0.0);
                last = value;
            }
            assert_eq!(last, 0.0);
        }
    }

    #[test]
    fn test_output_clamped_to_domain() {
        let mut smoother = ControlSmoother::new();
        let mode = Smoothing::Spool { rate: 100.0 };

        assert_eq!(smoother.advance("a", 5.0, DT, mode, ControlDomain::UNIT), 1.0);
        assert_eq!(smoother.advance("b", 5.0, DT, mode, ControlDomain::OVERDRIVE), 2.0);
        assert_eq!(smoother.advance("a", -3.0, DT, mode, ControlDomain::UNIT), 0.0);
    }

    #[test]
    fn test_snap_free_slows_near_full() {
        let mut smoother = ControlSmoother::new();

        // Rising toward 1.0 uses the slow end of the shape
        let up = smoother.advance("up", 1.0, DT, Smoothing::SnapFree, ControlDomain::UNIT);
        assert_abs_diff_eq!(up, 0.01, epsilon = 1e-6);

        // Cutting to 0.0 uses the fast end
        smoother.advance("down", 1.0, 100.0, Smoothing::Spool { rate: 1.0 }, ControlDomain::UNIT);
        let down = smoother.advance("down", 0.0, DT, Smoothing::SnapFree, ControlDomain::UNIT);
        assert_abs_diff_eq!(down, 0.96, epsilon = 1e-6);
    }

    #[test]
    fn test_snap_free_held_uses_current_level() {
        let mut smoother = ControlSmoother::new();
        smoother.advance("k", 1.0, 100.0, Smoothing::Spool { rate: 1.0 }, ControlDomain::UNIT);

        let down = smoother.advance("k", 0.0, DT, Smoothing::SnapFreeHeld, ControlDomain::UNIT);
        assert_abs_diff_eq!(down, 0.99, epsilon = 1e-6);
    }

    #[test]
    fn test_aux_and_forget() {
        let mut smoother = ControlSmoother::new();
        smoother.advance("Motor_whine", 0.5, DT, Smoothing::SnapFree, ControlDomain::UNIT);
        let scale = smoother.advance_aux("Motor_whine", 0.4, 1.0, 0.25);
        assert_abs_diff_eq!(scale, 0.25, epsilon = 1e-6);

        smoother.forget("Motor_whine");
        assert!(smoother.current("Motor_whine").is_none());
        assert!(smoother.aux("Motor_whine").is_none());
        assert!(smoother.is_empty());
    }

    #[test]
    fn test_prune_idle() {
        let mut smoother = ControlSmoother::new();
        let spool = Smoothing::Spool { rate: 1.0 };
        smoother.advance("silent", 0.0, DT, spool, ControlDomain::UNIT);
        smoother.advance_aux("silent", 0.5, 1.0, 1.0);
        smoother.advance("rising", 1.0, DT, spool, ControlDomain::UNIT);
        smoother.advance("held", 0.0, DT, spool, ControlDomain::UNIT);

        let dropped = smoother.prune_idle(|key| key == "held");
        assert_eq!(dropped, 1);
        assert!(!smoother.contains("silent"));
        assert!(smoother.aux("silent").is_none());
        assert!(smoother.contains("rising"));
        assert!(smoother.contains("held"));
    }
}
