use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Move layouts and built trains between TrainPlayer and the host.
#[derive(Debug, Parser)]
#[command(name = "o2o", version, about)]
pub struct Cli {
    /// Config file to use instead of the default location.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Import the TrainPlayer reports into the railroad data document.
    Import,
    /// Export a built train's manifest as work events.
    Export {
        /// Train to export; the most recently built train when omitted.
        #[arg(long)]
        train: Option<String>,
    },
    /// Export every train as soon as the host builds it.
    Watch,
    /// List the trains the host has built.
    Trains,
    /// Write placeholder work events for a train.
    Reset {
        #[arg(long)]
        train: String,
    },
}
