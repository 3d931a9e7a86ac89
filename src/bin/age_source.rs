//! `age-source`: source an age encrypted env file in a subshell

use clap::Parser;
use filetools::cli::age_source::{run, Args};
use filetools::cli::output::exit;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = Args::parse();
    filetools::init_tracing(args.verbosity().log_level());
    exit(run(args))
}
