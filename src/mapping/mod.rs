//! Curves for turning control values into audio parameters
//!
//! Every layer maps its smoothed control through a volume curve and a pitch
//! curve. Two representations exist: simple piecewise-linear key curves and
//! Hermite float curves with per-key tangents.

mod curve;
mod float_curve;
mod key_curve;

pub use curve::Curve;
pub use float_curve::{FloatCurve, FloatKey};
pub use key_curve::KeyCurve;
