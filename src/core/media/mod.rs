//! # Media Module
//!
//! Thin wrappers around ffmpeg and ffprobe.
//!
//! - `probe` - resolution, frame rate and duration of a video
//! - `position` - `--start`/`--end` expressions
//! - frame extraction and video creation from a folder of frames

mod position;
mod probe;

pub use position::Position;
pub use probe::{parse_frame_rate, parse_probe, probe_video, VideoInfo};

use crate::core::external::ExternalTool;
use crate::error::{MediaError, Result, ToolError};
use regex::Regex;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Settings for [`extract_frames`]
#[derive(Debug, Clone)]
pub struct FrameExtraction {
    pub start: Option<Position>,
    pub end: Option<Position>,
    pub fps: Option<f64>,
    /// Image extension without the dot
    pub extension: String,
}

impl Default for FrameExtraction {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
            fps: None,
            extension: "jpg".to_string(),
        }
    }
}

/// Names ffmpeg gives to extracted frames: `00000001.jpg`...
fn frame_pattern(extension: &str) -> Result<Regex> {
    Regex::new(&format!(r"^[0-9]{{8}}\.{}$", regex::escape(extension)))
        .map_err(|e| ToolError::Config(e.to_string()))
}

/// Frames already present in `folder`, sorted
pub fn list_frames(folder: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let pattern = frame_pattern(extension)?;
    let mut frames = Vec::new();
    if !folder.is_dir() {
        return Ok(frames);
    }
    for entry in fs::read_dir(folder).map_err(|e| ToolError::io(folder, e))? {
        let entry = entry.map_err(|e| ToolError::io(folder, e))?;
        let path = entry.path();
        if path.is_file() && pattern.is_match(&entry.file_name().to_string_lossy()) {
            frames.push(path);
        }
    }
    frames.sort();
    Ok(frames)
}

/// Resolve a position, probing the duration only when required
fn resolve_position(
    position: &Position,
    duration: &mut Option<f64>,
    ffprobe: &ExternalTool,
    video: &Path,
) -> Result<f64> {
    if !position.needs_duration() {
        return Ok(position.seconds(f64::INFINITY)?);
    }
    let total = match *duration {
        Some(total) => total,
        None => {
            let total = probe_video(ffprobe, video)?.duration.ok_or_else(|| {
                MediaError::NoVideoStream {
                    path: video.to_path_buf(),
                }
            })?;
            *duration = Some(total);
            total
        }
    };
    Ok(position.seconds(total)?)
}

/// Extract frames of `video` into `folder` as `%08d.EXT`.
///
/// Refuses to run when the folder already holds frames.
pub fn extract_frames(
    ffmpeg: &ExternalTool,
    ffprobe: &ExternalTool,
    video: &Path,
    folder: &Path,
    settings: &FrameExtraction,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(folder).map_err(|e| ToolError::io(folder, e))?;
    if let Some(existing) = list_frames(folder, &settings.extension)?.into_iter().next() {
        return Err(MediaError::FramesExist { path: existing }.into());
    }

    let mut duration = None;
    let mut args: Vec<String> = Vec::new();
    if let Some(start) = &settings.start {
        let seconds = resolve_position(start, &mut duration, ffprobe, video)?;
        args.extend(["-ss".to_string(), format_seconds(seconds)]);
    }
    if let Some(end) = &settings.end {
        let seconds = resolve_position(end, &mut duration, ffprobe, video)?;
        args.extend(["-to".to_string(), format_seconds(seconds)]);
    }

    let output = folder.join(format!("%08d.{}", settings.extension));
    ffmpeg
        .command(&args)?
        .arg("-i")
        .arg(video)
        .args_if(
            settings.fps.is_some(),
            ["-vf".to_string(), format!("fps={}", settings.fps.unwrap_or_default())],
        )
        .arg(&output)
        .output()?;

    list_frames(folder, &settings.extension)
}

/// An ffmpeg filter given as `name=key=value:key2=value2`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub name: String,
    pub args: Vec<(String, String)>,
}

impl FromStr for FilterSpec {
    type Err = MediaError;

    fn from_str(text: &str) -> std::result::Result<Self, Self::Err> {
        let (name, rest) = match text.split_once('=') {
            Some((name, rest)) => (name.trim(), Some(rest)),
            None => (text.trim(), None),
        };
        let valid_name = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid_name {
            return Err(MediaError::InvalidFilter(text.to_string()));
        }

        // Parts without a value are ignored
        let args = rest
            .into_iter()
            .flat_map(|rest| rest.split(':'))
            .filter_map(|part| part.split_once('='))
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();

        Ok(Self {
            name: name.to_string(),
            args,
        })
    }
}

impl fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for (index, (key, value)) in self.args.iter().enumerate() {
            let separator = if index == 0 { '=' } else { ':' };
            write!(f, "{}{}={}", separator, key, value)?;
        }
        Ok(())
    }
}

/// Settings for [`create_video`]
#[derive(Debug, Clone)]
pub struct VideoCreation {
    pub fps: f64,
    /// Frame extension without the dot
    pub extension: String,
    pub filters: Vec<FilterSpec>,
}

impl Default for VideoCreation {
    fn default() -> Self {
        Self {
            fps: 30.0,
            extension: "jpg".to_string(),
            filters: Vec::new(),
        }
    }
}

/// Encode every `*.EXT` frame of `folder`, in glob order, into `output`
pub fn create_video(
    ffmpeg: &ExternalTool,
    folder: &Path,
    output: &Path,
    settings: &VideoCreation,
) -> Result<PathBuf> {
    let filters = settings
        .filters
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");
    let input = folder.join(format!("*.{}", settings.extension));

    ffmpeg
        .command(["-framerate".to_string(), settings.fps.to_string()])?
        .args(["-pattern_type", "glob", "-i"])
        .arg(&input)
        .args_if(!filters.is_empty(), ["-vf".to_string(), filters])
        .arg(output)
        .output()?;
    Ok(output.to_path_buf())
}

fn format_seconds(seconds: f64) -> String {
    format!("{:.3}", seconds)
}
