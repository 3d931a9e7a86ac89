//! `virenamer`: rename files in a text editor

use clap::Parser;
use filetools::cli::virenamer::{run, Args};
use filetools::cli::output::exit;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = Args::parse();
    filetools::init_tracing(args.verbosity.log_level());
    exit(run(args))
}
