//! Vessel Audio - Procedural sound for simulated vehicles
//!
//! Maps vehicle physics onto layered, looping sound voices. Raw signals
//! are smoothed per layer, shaped by curves and sent to a playback device,
//! with distance filtering and Doppler handled per emitter.

pub mod config;
pub mod engine;
pub mod host;
pub mod layer;
pub mod mapping;
pub mod wheels;

pub use config::EngineConfig;
pub use engine::Emitter;
pub use wheels::WheelAudioController;
