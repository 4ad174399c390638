//! ffc CLI: populate, verify, or reconcile file fingerprints against the store.

use clap::Parser;

use ffc::cli::Cli;
use ffc::config::{self, CliOverrides};
use ffc::error::FfcError;
use ffc::logging;
use ffc::run;

fn main() {
    let cli = Cli::parse();

    let run_config = match config::load(
        &cli.config,
        CliOverrides {
            mode: cli.command.mode(),
            verbose: cli.verbose,
        },
    ) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(1);
        }
    };

    logging::setup_logging(run_config.verbose, &run_config.logging);

    let cancel_requested = match run::install_cancel_handler() {
        Ok(flag) => flag,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run::run(&run_config, &cancel_requested) {
        log::error!("{e}");
        std::process::exit(exit_code_for(&e));
    }
}

fn exit_code_for(err: &FfcError) -> i32 {
    if err.is_fatal_setup_error() {
        1
    } else {
        2
    }
}
