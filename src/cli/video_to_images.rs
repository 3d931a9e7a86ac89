//! # video2images
//!
//! Extract the frames of a video as numbered images.
//!
//! ```bash
//! video2images --fps 2 --start 10% --end -0:30 --resize 640 holidays.mp4
//! ```

use super::output::{plural, spinner, Console, Icon, Label, Verbosity};
use crate::core::external::catalog;
use crate::core::images::{parse_resolution, ImageFilter};
use crate::core::interrupt::{self, CancellationToken};
use crate::core::media::{extract_frames, probe_video, FrameExtraction, Position};
use crate::core::mime::mime_type;
use crate::core::pool::WorkerPool;
use crate::error::{MediaError, Result, ToolError};
use clap::{ArgGroup, Parser};
use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Extract frames of a video
#[derive(Parser, Debug)]
#[command(name = "video2images", version, about)]
#[command(group(ArgGroup::new("filter").args(["resize", "crop"])))]
pub struct Args {
    #[command(flatten)]
    pub verbosity: Verbosity,

    /// Output folder, default is "<video name> (<fps>fps)"
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Resize frames to fit WIDTHxHEIGHT
    #[arg(long, value_name = "WxH", value_parser = parse_resolution)]
    pub resize: Option<(u32, u32)>,

    /// Resize and crop frames to fill WIDTHxHEIGHT
    #[arg(long, value_name = "WxH", value_parser = parse_resolution)]
    pub crop: Option<(u32, u32)>,

    /// Frames per second to extract, default is the video frame rate
    #[arg(long)]
    pub fps: Option<f64>,

    /// Start position: seconds, [HH:]MM:SS, percentage, negative from the end
    #[arg(long, allow_hyphen_values = true)]
    pub start: Option<Position>,

    /// End position, same format as --start
    #[arg(long, allow_hyphen_values = true)]
    pub end: Option<Position>,

    /// Parallel jobs used to resize frames
    #[arg(short, long, value_name = "THREADS")]
    pub jobs: Option<usize>,

    /// Video file
    pub video: PathBuf,
}

impl Args {
    pub fn image_filter(&self) -> Option<ImageFilter> {
        match (self.resize, self.crop) {
            (Some((width, height)), _) => Some(ImageFilter::Resize { width, height }),
            (None, Some((width, height))) => Some(ImageFilter::CropFill { width, height }),
            (None, None) => None,
        }
    }
}

/// `holidays (29.97fps)`
pub fn default_folder_name(video: &Path, fps: f64) -> String {
    let stem = video
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frames".to_string());
    format!("{} ({:.2}fps)", stem, fps)
}

pub fn run(args: Args) -> Result<ExitCode> {
    let console = Console::new(args.verbosity);
    let cancel = CancellationToken::new();
    interrupt::install(&cancel)?;

    let (file_tool, ffmpeg, ffprobe) = (catalog::file(), catalog::ffmpeg(), catalog::ffprobe());
    ffmpeg.resolve()?;
    ffprobe.resolve()?;

    let mime = mime_type(&file_tool, &args.video)?;
    if !mime.starts_with("video/") {
        return Err(MediaError::NotAVideo {
            path: args.video.clone(),
            mime,
        }
        .into());
    }

    let fps = match args.fps {
        Some(fps) => fps,
        None => probe_video(&ffprobe, &args.video)?
            .fps
            .ok_or_else(|| ToolError::Config("cannot read the frame rate, use --fps".to_string()))?,
    };
    let folder = match &args.output {
        Some(folder) => folder.clone(),
        None => env::current_dir()
            .map_err(|e| ToolError::io(".", e))?
            .join(default_folder_name(&args.video, fps)),
    };

    let settings = FrameExtraction {
        start: args.start.clone(),
        end: args.end.clone(),
        fps: Some(fps),
        ..Default::default()
    };
    let progress = spinner(
        format!("Extracting frames of {}", Label::file(&args.video)),
        console.quiet(),
    );
    let frames = extract_frames(&ffmpeg, &ffprobe, &args.video, &folder, &settings);
    progress.finish_and_clear();
    let frames = frames?;

    let mut failures = 0;
    let mut interrupted = false;
    if let Some(filter) = args.image_filter() {
        let pool = WorkerPool::new(args.jobs, cancel)?;
        let mut completions = pool.run(frames.clone(), move |path| filter.apply_to_file(path));
        for result in completions.by_ref() {
            if let Err(error) = result.outcome {
                failures += 1;
                console.error(Icon::Boom, Label::error(&error));
            }
        }
        interrupted = completions.interrupted();
    }

    console.say(
        Icon::Ok,
        format!(
            "{} {} extracted to {}",
            frames.len(),
            plural("frame", frames.len()),
            Label::folder(&folder)
        ),
    );
    if interrupted {
        return Err(ToolError::Interrupted);
    }
    if failures > 0 {
        return Err(ToolError::BatchFailed { failures });
    }
    Ok(ExitCode::SUCCESS)
}
