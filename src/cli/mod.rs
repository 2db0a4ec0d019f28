//! CLI Module
//!
//! Command-line interface for running WAV files through a band-split
//! network and inspecting its parameters and wiring.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::engine::ExportFormat;

/// Multiband compressor - split, compress, and recombine audio by frequency band
#[derive(Parser, Debug)]
#[command(name = "multiband-cli")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compress a WAV file
    #[command(name = "process")]
    Process {
        /// Input WAV file (mono or stereo)
        input: PathBuf,

        /// Output WAV file
        output: PathBuf,

        /// Number of frequency bands
        #[arg(short, long, default_value_t = 3)]
        bands: usize,

        /// Frames handed to the network per call
        #[arg(long, default_value_t = 512)]
        block_size: usize,

        /// JSON preset to apply before processing
        #[arg(short, long)]
        preset: Option<PathBuf>,

        /// Parameter override, e.g. `band_1_ratio=4` (repeatable)
        #[arg(short = 's', long = "set", value_name = "ID=VALUE")]
        set: Vec<String>,

        /// Output bit depth: 16, 24, or 32 (float)
        #[arg(long, default_value_t = 24, value_parser = parse_bit_depth)]
        bit_depth: u16,
    },

    /// List every parameter of an N-band network
    #[command(name = "params")]
    Params {
        /// Number of frequency bands
        #[arg(short, long, default_value_t = 3)]
        bands: usize,
    },

    /// Write the default preset for an N-band network
    #[command(name = "preset")]
    Preset {
        /// Number of frequency bands
        #[arg(short, long, default_value_t = 3)]
        bands: usize,

        /// Destination file; printed to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the connection list and execution order
    #[command(name = "topology")]
    Topology {
        /// Number of frequency bands
        #[arg(short, long, default_value_t = 3)]
        bands: usize,
    },
}

/// Accept only bit depths the WAV writer supports
pub fn parse_bit_depth(arg: &str) -> Result<u16, String> {
    let depth: u16 = arg
        .parse()
        .map_err(|_| format!("'{}' is not a bit depth", arg))?;
    ExportFormat::new(depth)
        .validate()
        .map(|_| depth)
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_depth_argument() {
        assert_eq!(parse_bit_depth("16"), Ok(16));
        assert_eq!(parse_bit_depth("32"), Ok(32));
        assert!(parse_bit_depth("12").is_err());
        assert!(parse_bit_depth("deep").is_err());
    }

    #[test]
    fn test_process_rejects_bad_bit_depth() {
        let parsed = Cli::try_parse_from(["multiband-cli", "process", "in.wav", "out.wav", "--bit-depth", "12"]);
        assert!(parsed.is_err());

        let parsed = Cli::try_parse_from(["multiband-cli", "process", "in.wav", "out.wav", "--bit-depth", "16"])
            .unwrap();
        assert!(matches!(parsed.command, Some(Commands::Process { bit_depth: 16, .. })));
    }
}
