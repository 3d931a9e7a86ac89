//! # images2video
//!
//! Encode a folder of images into a video, in file name order.

use super::output::{spinner, Console, Icon, Label, Verbosity};
use crate::core::external::catalog;
use crate::core::media::{create_video, FilterSpec, VideoCreation};
use crate::error::{Result, ToolError};
use clap::Parser;
use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Create a video from a folder of images
#[derive(Parser, Debug)]
#[command(name = "images2video", version, about)]
pub struct Args {
    #[command(flatten)]
    pub verbosity: Verbosity,

    /// Output video, default is "<folder name>.mp4" in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Frames per second
    #[arg(long, default_value_t = 30.0)]
    pub fps: f64,

    /// ffmpeg filter as name=key=value:key2=value2 (repeatable)
    #[arg(short, long = "filter", value_name = "FILTER")]
    pub filters: Vec<FilterSpec>,

    /// Folder containing the images
    pub folder: PathBuf,
}

/// `<cwd>/<folder name>.mp4`
pub fn default_output(cwd: &Path, folder: &Path) -> PathBuf {
    let name = folder
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    cwd.join(format!("{}.mp4", name))
}

pub fn run(args: Args) -> Result<ExitCode> {
    let console = Console::new(args.verbosity);

    if !args.folder.is_dir() {
        return Err(ToolError::Config(format!(
            "{} is not a folder",
            args.folder.display()
        )));
    }
    let output = match &args.output {
        Some(output) => output.clone(),
        None => {
            let cwd = env::current_dir().map_err(|e| ToolError::io(".", e))?;
            default_output(&cwd, &args.folder)
        }
    };
    if output.exists() {
        return Err(ToolError::Config(format!(
            "{} already exists",
            output.display()
        )));
    }

    let ffmpeg = catalog::ffmpeg();
    ffmpeg.resolve()?;

    for filter in &args.filters {
        console.say(Icon::Hint, format!("Using filter {}", Label::command(filter)));
    }

    let settings = VideoCreation {
        fps: args.fps,
        filters: args.filters.clone(),
        ..Default::default()
    };
    let progress = spinner(
        format!("Creating {}", Label::file(&output)),
        console.quiet(),
    );
    let created = create_video(&ffmpeg, &args.folder, &output, &settings);
    progress.finish_and_clear();
    let created = created?;

    console.say(Icon::Ok, format!("Created {}", Label::file(&created)));
    Ok(ExitCode::SUCCESS)
}
