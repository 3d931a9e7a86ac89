//! `remote-borg`: run borg remotely through a reverse ssh tunnel

use clap::Parser;
use filetools::cli::remote_borg::{run, Args};
use filetools::cli::output::exit;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = Args::parse();
    filetools::init_tracing(args.verbosity.log_level());
    exit(run(args))
}
