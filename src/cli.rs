// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "molt")]
#[command(about = "Keeps running containers on their latest image")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new molt.yml configuration file
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Watch endpoints and replace stale containers on a schedule
    Run {
        /// Run a single pass per endpoint and exit
        #[arg(long)]
        once: bool,
    },

    /// Report which containers are stale without touching them
    Status,
}
