//! `images2video`: encode a folder of images into a video

use clap::Parser;
use filetools::cli::images_to_video::{run, Args};
use filetools::cli::output::exit;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = Args::parse();
    filetools::init_tracing(args.verbosity.log_level());
    exit(run(args))
}
