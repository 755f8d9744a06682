use clap::Parser;
use tdash_core::logging;

mod cli;

use crate::cli::Cli;

fn main() {
    let cli = Cli::parse();

    // The dashboard owns the terminal during a copy, so stderr is only a
    // fallback for commands that print plain output.
    if logging::init_logging().is_err() && !cli.command.takes_over_terminal() {
        logging::init_logging_stderr();
    }

    if let Err(err) = cli.run() {
        eprintln!("tdash error: {:#}", err);
        std::process::exit(1);
    }
}
