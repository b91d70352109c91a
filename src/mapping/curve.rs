//! Curve trait

/// A function from a control value to an output value.
///
/// Curves hold their input at the first and last key: evaluating outside
/// the keyed range returns the nearest endpoint value.
pub trait Curve: Send + Sync {
    /// Evaluate the curve at `x`
    fn evaluate(&self, x: f32) -> f32;

    /// Input range covered by the keys
    fn domain(&self) -> (f32, f32);
}

/// Find the segment containing `x` in a sorted slice of key times.
///
/// Returns `None` when `x` lies outside the first or last key.
pub(crate) fn segment(times: impl ExactSizeIterator<Item = f32> + Clone, x: f32) -> Option<usize> {
    let len = times.len();
    if len < 2 {
        return None;
    }
    let mut prev = None;
    for (i, t) in times.enumerate() {
        if let Some(p) = prev {
            if x >= p && x <= t {
                return Some(i - 1);
            }
        }
        prev = Some(t);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_lookup() {
        let times = [0.0f32, 0.5, 1.0];
        assert_eq!(segment(times.iter().copied(), 0.25), Some(0));
        assert_eq!(segment(times.iter().copied(), 0.75), Some(1));
        assert_eq!(segment(times.iter().copied(), 0.5), Some(0));
        assert_eq!(segment(times.iter().copied(), 1.5), None);
        assert_eq!(segment(times.iter().copied(), -0.1), None);
    }

    #[test]
    fn test_segment_single_key() {
        let times = [0.3f32];
        assert_eq!(segment(times.iter().copied(), 0.3), None);
    }
}
