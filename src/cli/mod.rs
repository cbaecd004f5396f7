//! CLI interface for Nimbus

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Generative ambient synthesizer
#[derive(Parser)]
#[command(name = "nimbus")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Play through the audio device until Ctrl+C
    Play {
        /// Configuration file path (defaults are used if it is missing)
        #[arg(short, long, default_value = "nimbus.yaml")]
        config: PathBuf,
    },

    /// Render to a stereo WAV file
    Render {
        /// Configuration file path (defaults are used if it is missing)
        #[arg(short, long, default_value = "nimbus.yaml")]
        config: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Duration in seconds
        #[arg(short, long, default_value = "60")]
        duration: u64,
    },

    /// List available output devices
    Devices,

    /// Validate a configuration file
    Check {
        /// Configuration file path
        #[arg(short, long, default_value = "nimbus.yaml")]
        config: PathBuf,
    },

    /// Generate an example configuration file
    Init,
}
