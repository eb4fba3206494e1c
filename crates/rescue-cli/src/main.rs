//! Command-line inspector for Rescue
//!
//! Loads an exported chain snapshot and prints what the rescuer, friend and
//! owner screens would show for it.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::{
    common,
    friend::{self, FriendArgs},
    owner::{self, OwnerArgs},
    rescuer::{self, RescuerArgs},
};

#[derive(Parser)]
#[command(name = "rescue")]
#[command(about = "Rescue - social recovery state inspector", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path
    #[arg(short, long, global = true, default_value = ".rescue/config.toml")]
    config: PathBuf,

    /// Print views as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Rescuer progress for a lost account
    Rescuer(RescuerArgs),

    /// Whether a friend can vouch for a rescue
    Friend(FriendArgs),

    /// Validate a recovery setup for an owner
    Owner(OwnerArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = common::load_config(&cli.config)?;
    common::init_logging(cli.verbose, &config);

    let output = common::Output::new(cli.json);
    match cli.command {
        Commands::Rescuer(args) => rescuer::run(args, &config, &output).await?,
        Commands::Friend(args) => friend::run(args, &config, &output).await?,
        Commands::Owner(args) => owner::run(args, &config, &output).await?,
    }

    Ok(())
}
