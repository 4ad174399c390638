//! Command-line surface: subcommands map onto [`crate::types::Mode`], the
//! rest of the run's shape comes from the config file (see [`crate::config`]).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::types::Mode;

struct DefaultArgs;

impl DefaultArgs {
    pub const CONFIG_PATH: &'static str = "/etc/ffc.conf";
}

/// Populate, verify, or reconcile file fingerprints against the store.
#[derive(Clone, Parser)]
#[command(name = "ffc", disable_version_flag = true)]
#[command(about = "Populate, verify, or reconcile file fingerprints against the store.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to the configuration file.
    #[arg(long, short = 'c', global = true, default_value = DefaultArgs::CONFIG_PATH)]
    pub config: PathBuf,

    /// Verbose output (debug-level logging for this crate).
    #[arg(long, short = 'V', global = true)]
    pub verbose: bool,

    /// Print version and exit.
    #[arg(long, short = 'v', action = clap::ArgAction::Version)]
    pub version: (),
}

#[derive(Clone, Subcommand)]
pub enum Command {
    /// Write every file's record unconditionally (Populate).
    Add,
    /// Compare every file's record to the store; never write (Verify).
    Check,
    /// Compare every file's record to the store; write back on mismatch (Reconcile).
    Update,
}

impl Command {
    pub fn mode(&self) -> Mode {
        match self {
            Command::Add => Mode::Populate,
            Command::Check => Mode::Verify,
            Command::Update => Mode::Reconcile,
        }
    }
}
