//! Wheel sounds: motor whine, rolling, ground contact and tyre slip

mod controller;
mod group;
mod state;
mod surface;

pub use controller::WheelAudioController;
pub use group::{LayerGroup, WheelSignals};
pub use state::{Deployment, MotorMode, MotorState, WheelState};
pub use surface::{SurfaceClassifier, SurfaceKind, DEFAULT_COLLIDER};
