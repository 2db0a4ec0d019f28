//! Multiband CLI
//!
//! Command-line front end for the multiband compressor.

use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use log::info;

use multiband::cli::commands::{self, ProcessOptions};
use multiband::cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("Multiband v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(cmd) => handle_command(cmd),
        None => {
            println!("Multiband v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Process {
            input,
            output,
            bands,
            block_size,
            preset,
            set,
            bit_depth,
        } => {
            let options = ProcessOptions {
                bands,
                block_size,
                preset: preset.as_deref(),
                overrides: &set,
                bit_depth,
            };
            commands::process_file(&input, &output, &options)
        }
        Commands::Params { bands } => commands::list_params(bands),
        Commands::Preset { bands, output } => commands::write_default_preset(bands, output.as_deref()),
        Commands::Topology { bands } => commands::show_topology(bands),
    }
}
