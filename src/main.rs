//! Unique Device ID CLI
//!
//! Host-side demonstration of the identifier lifecycle. A directory on the
//! host stands in for the device filesystem and a simulated floating pin
//! stands in for the ADC.

use clap::{Parser, Subcommand};
use embedded_hal::delay::DelayNs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};
use unique_device_id::{
    config::FileConfig,
    hal::{NoDelay, NoIndicator, Ports, SimulatedAdc, StdDelay},
    storage::FsStorage,
    IdentityManager,
};

#[derive(Debug, Parser)]
#[command(name = "unique-device-id", version, about)]
struct Cli {
    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory used as the device filesystem (overrides the config file).
    #[arg(long)]
    root: Option<PathBuf>,

    /// Skip the 1 ms inter-sample delay.
    #[arg(long)]
    fast: bool,

    /// Disable library diagnostics.
    #[arg(long)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the stored identifier, if any.
    Show,
    /// Generate and persist a new identifier, replacing any existing one.
    Generate,
    /// Load the identifier, generating one on first use.
    Ensure,
    /// Delete the stored identifier.
    Remove,
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let mut file_config = match &cli.config {
        Some(path) => match FileConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => FileConfig::default(),
    };
    if let Some(root) = &cli.root {
        file_config.storage.root = root.clone();
    }
    if cli.quiet {
        file_config.identity.diagnostics = false;
    }

    info!("Unique Device ID v{}", unique_device_id::VERSION);

    if cli.fast {
        run(&cli.command, file_config, NoDelay::new())
    } else {
        run(&cli.command, file_config, StdDelay)
    }
}

fn run<D: DelayNs>(command: &Command, config: FileConfig, delay: D) -> ExitCode {
    info!(root = %config.storage.root.display(), "Using host directory as device storage");

    let storage = FsStorage::new(config.storage.root);
    let ports = Ports::new(SimulatedAdc::from_os_entropy(), NoIndicator, delay);
    let mut manager = IdentityManager::new(config.identity, storage, ports);

    match command {
        Command::Show => match manager.id() {
            Some(id) => {
                println!("{id}");
                ExitCode::SUCCESS
            }
            None => {
                warn!("No device ID stored");
                ExitCode::FAILURE
            }
        },
        Command::Generate | Command::Ensure => {
            let result = if matches!(command, Command::Generate) {
                manager.generate_new_id()
            } else {
                manager.ensure_id()
            };
            match result {
                Ok(id) => {
                    println!("{id}");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("Failed to create device ID: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
        Command::Remove => {
            if manager.remove_id() {
                info!("Device ID removed");
            } else {
                info!("No device ID to remove");
            }
            ExitCode::SUCCESS
        }
    }
}
