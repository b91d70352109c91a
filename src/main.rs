//! Vessel Audio - Procedural sound for simulated vehicles

use anyhow::{bail, Result};
use clap::Parser;
use serde::Serialize;
use std::path::Path;
use tracing::info;
use vessel_audio::config::{self, EngineConfig};
use vessel_audio::engine::{RecordedVoice, RecordingBackend, SoundLayerRenderer};
use vessel_audio::layer::SoundLayer;
use vessel_audio::wheels::{LayerGroup, SurfaceKind, WheelAudioController};

mod cli;

use cli::drive::{Drive, Phase};
use cli::{Cli, Commands};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check { config: config_path } => {
            println!("Checking configuration at {:?}...", config_path);

            match config::load_config(&config_path) {
                Ok(cfg) => {
                    println!("Configuration is valid!");
                    print_summary(&cfg);
                }
                Err(e) => {
                    println!("Configuration is invalid: {:#}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Simulate {
            config: config_path,
            seconds,
            fps,
            physics_hz,
            surface,
            json,
        } => {
            if !(seconds > 0.0 && fps > 0.0 && physics_hz > 0.0) {
                bail!("seconds, fps and physics-hz must all be positive");
            }
            let cfg = config::load_config(&config_path)?;
            simulate(&cfg, seconds, fps, physics_hz, &surface, json);
        }

        Commands::Init => {
            let example_config = include_str!("../vessel-audio.example.yaml");

            let path = "vessel-audio.yaml";
            if Path::new(path).exists() {
                println!("vessel-audio.yaml already exists. Not overwriting.");
            } else {
                std::fs::write(path, example_config)?;
                println!("Created vessel-audio.yaml with example configuration.");
            }
        }
    }

    Ok(())
}

fn print_summary(cfg: &EngineConfig) {
    let settings = &cfg.settings;
    println!("  Ship volume: {:.0}%", settings.ship_volume * 100.0);
    println!("  Exterior volume: {:.0}%", settings.exterior_volume * 100.0);
    println!(
        "  Air simulation: {}",
        if settings.air_simulation() { "on" } else { "off" }
    );
    println!("  Doppler factor: {}", settings.doppler_factor);
    println!("  Colliders: {}", cfg.colliders.len());
    println!("  Wheel volume: {:.0}%", cfg.wheel.volume * 100.0);

    for group in LayerGroup::ALL {
        let Some(configs) = cfg.wheel.groups.get(&group) else {
            continue;
        };
        println!("  {}: {} layers", group, configs.len());
        for layer in configs {
            match SoundLayer::from_config(layer) {
                Ok(layer) => println!(
                    "    - {} ({} clips){}",
                    layer.name,
                    layer.clips.len(),
                    if layer.spool { " [spool]" } else { "" }
                ),
                Err(e) => println!("    - {} SKIPPED: {}", layer.name, e),
            }
        }
    }
}

/// One per-second report of the simulated run
#[derive(Serialize)]
struct Snapshot<'a> {
    time: f32,
    phase: Phase,
    wheel_speed: f32,
    slip: f32,
    surface: SurfaceKind,
    voices: Vec<&'a RecordedVoice>,
}

fn simulate(cfg: &EngineConfig, seconds: f32, fps: f32, physics_hz: f32, contact: &str, json: bool) {
    let settings = &cfg.settings;
    let mut controller = WheelAudioController::new(cfg, RecordingBackend::new())
        .with_renderer(SoundLayerRenderer::seeded(0));
    controller.start();

    let mut drive = Drive::new(seconds, contact);
    let frame_dt = 1.0 / fps;
    let physics_dt = 1.0 / physics_hz;
    let frames = (seconds * fps).ceil() as u64;
    let mut physics_steps = 0u64;
    let mut next_report = 1u64;

    info!(seconds, fps, physics_hz, contact, "simulation started");

    for frame in 1..=frames {
        let time = frame as f32 * frame_dt;

        // Physics steps due by this frame, zero or more of them
        let due = (time * physics_hz).floor() as u64;
        while physics_steps < due {
            physics_steps += 1;
            let physics_time = physics_steps as f32 * physics_dt;
            drive.advance(physics_time, physics_dt);
            controller.fixed_update(
                settings,
                &drive.host(physics_time),
                &drive.wheel(physics_time),
                physics_dt,
            );
        }

        controller.update(settings, &drive.host(time), &drive.wheel(time), frame_dt);

        if time + frame_dt * 0.5 >= next_report as f32 || frame == frames {
            let mut voices: Vec<&RecordedVoice> = controller.emitter().backend().voices().collect();
            voices.sort_by(|a, b| a.key.cmp(&b.key));

            let snapshot = Snapshot {
                time,
                phase: drive.phase(time),
                wheel_speed: controller.wheel_speed(),
                slip: controller.slip(),
                surface: controller.surface(),
                voices,
            };
            report(&snapshot, json);
            next_report += 1;
        }
    }

    controller.dispose();
    let backend = controller.emitter().backend();
    info!(
        commands = backend.log().len(),
        released = backend.released().len(),
        "simulation finished"
    );
}

fn report(snapshot: &Snapshot, json: bool) {
    if json {
        match serde_json::to_string(snapshot) {
            Ok(line) => println!("{}", line),
            Err(e) => tracing::error!(%e, "failed to serialize snapshot"),
        }
        return;
    }

    println!(
        "{:>6.2}s  {:<10} speed {:>5.2} m/s  slip {:>5.2} m/s  surface {:<8} voices {}",
        snapshot.time,
        snapshot.phase.to_string(),
        snapshot.wheel_speed,
        snapshot.slip,
        snapshot.surface.to_string(),
        snapshot.voices.len()
    );
    for voice in &snapshot.voices {
        println!(
            "          {:<20} vol {:.3}  pitch {:.3}{}",
            voice.key,
            voice.volume,
            voice.pitch,
            if voice.playing { "" } else { "  (stopped)" }
        );
    }
}
