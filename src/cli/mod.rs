//! CLI interface for Vessel Audio

pub mod drive;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Procedural vehicle sound control driven by simulation state
#[derive(Parser)]
#[command(name = "vessel-audio")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a configuration file
    Check {
        /// Configuration file path
        #[arg(short, long, default_value = "vessel-audio.yaml")]
        config: PathBuf,
    },

    /// Drive a scripted wheel run against an in-memory playback device
    Simulate {
        /// Configuration file path
        #[arg(short, long, default_value = "vessel-audio.yaml")]
        config: PathBuf,

        /// Length of the run in seconds
        #[arg(short, long, default_value = "20")]
        seconds: f32,

        /// Frame rate of the render tick
        #[arg(long, default_value = "60")]
        fps: f32,

        /// Rate of the physics tick
        #[arg(long, default_value = "50")]
        physics_hz: f32,

        /// Collider name under the wheel
        #[arg(long, default_value = "default")]
        surface: String,

        /// Print one JSON object per second instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Generate an example configuration file
    Init,
}
