//! Nimbus - A generative ambient synthesizer

use anyhow::{Context, Result};
use clap::Parser;
use cpal::traits::{DeviceTrait, HostTrait};
use nimbus::config::{self, Sequence};
use nimbus::engine::{default_device_name, default_sequence, Engine, Player, Recorder};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

mod cli;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Play { config: config_path } => {
            let cfg = config::load_or_default(&config_path)?;
            let device = cfg.audio.device.clone();

            println!("Starting Nimbus...");
            println!("  Master volume: {:.0}%", cfg.master.volume * 100.0);
            println!("  Fade-in: {:.1}s", cfg.master.fade_in);

            let engine = Engine::new(cfg);
            let mut player = Player::new();
            player.start(engine, device.as_deref())?;

            let stop = Arc::new(AtomicBool::new(false));
            let handler_stop = stop.clone();
            ctrlc::set_handler(move || handler_stop.store(true, Ordering::SeqCst))
                .context("failed to install the Ctrl+C handler")?;

            println!("Playing. Press Ctrl+C to stop.");
            while !stop.load(Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(100));
            }

            player.stop();
            println!("\nStopped.");
        }

        Commands::Render {
            config: config_path,
            output,
            duration,
        } => {
            let cfg = config::load_or_default(&config_path)?;
            let sample_rate = cfg.audio.sample_rate;
            let block_size = cfg.audio.buffer_size.max(1);

            println!("Rendering {} seconds to {:?}...", duration, output);

            let mut engine = Engine::new(cfg);
            let mut recorder = Recorder::new(&output, sample_rate)?;

            let total_frames = sample_rate as u64 * duration;
            let mut left = vec![0.0f32; block_size];
            let mut right = vec![0.0f32; block_size];
            let mut last_second = None;

            while recorder.frames_written() < total_frames {
                let frames = (total_frames - recorder.frames_written()).min(block_size as u64) as usize;
                engine.render_block(&mut left[..frames], &mut right[..frames]);
                recorder.write_block(&left[..frames], &right[..frames])?;

                // Progress update every second
                let second = recorder.frames_written() / sample_rate as u64;
                if last_second != Some(second) {
                    last_second = Some(second);
                    print!("\r  Progress: {}s / {}s", second, duration);
                    std::io::stdout().flush()?;
                }
            }

            recorder.finalize()?;
            println!("\nRendered to {:?}", output);
        }

        Commands::Devices => {
            let host = cpal::default_host();
            println!("Available output devices ({}):\n", host.id().name());

            if let Some(name) = default_device_name() {
                println!("Default output: {}", name);
                if let Some(config) = host
                    .default_output_device()
                    .and_then(|d| d.default_output_config().ok())
                {
                    println!(
                        "  Sample rate: {} Hz, Channels: {}",
                        config.sample_rate().0,
                        config.channels()
                    );
                }
                println!();
            }

            println!("Output devices:");
            let devices = nimbus::engine::list_output_devices();
            if devices.is_empty() {
                println!("  (none found)");
            }
            for (name, config) in devices {
                println!(
                    "  - {} ({} Hz, {} ch)",
                    name, config.sample_rate.0, config.channels
                );
            }
        }

        Commands::Check { config: config_path } => {
            println!("Checking configuration at {:?}...", config_path);

            match config::load_config(&config_path) {
                Ok(cfg) => {
                    println!("Configuration is valid!");
                    println!("  Sample rate: {} Hz", cfg.audio.sample_rate);
                    println!("  Buffer size: {}", cfg.audio.buffer_size);
                    println!(
                        "  Device: {}",
                        cfg.audio.device.as_deref().unwrap_or("(default)")
                    );
                    println!("  Master volume: {:.0}%", cfg.master.volume * 100.0);
                    println!("  Fade-in: {:.1}s", cfg.master.fade_in);
                    println!("  LFO draw: {:?}", cfg.modulation.draw);
                    match cfg.modulation.seed {
                        Some(seed) => println!("  Seed: {}", seed),
                        None => println!("  Seed: (random)"),
                    }
                    println!("  Sequences:");
                    for sequence in Sequence::ALL {
                        let (source, seq) = match cfg.sequences.get(&sequence) {
                            Some(seq) => ("custom", seq.clone()),
                            None => ("built-in", default_sequence(sequence)),
                        };
                        println!(
                            "    - {} [{}] {} notes, hold {}s, {:?}",
                            sequence,
                            source,
                            seq.frequencies.len(),
                            seq.hold,
                            seq.mode
                        );
                    }
                }
                Err(e) => {
                    println!("Configuration is invalid: {:#}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Init => {
            let example_config = include_str!("../nimbus.example.yaml");

            let path = "nimbus.yaml";
            if std::path::Path::new(path).exists() {
                println!("nimbus.yaml already exists. Not overwriting.");
            } else {
                std::fs::write(path, example_config)?;
                println!("Created nimbus.yaml with example configuration.");
            }
        }
    }

    Ok(())
}
