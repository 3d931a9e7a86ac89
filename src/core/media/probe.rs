//! Video properties read with ffprobe.

use crate::core::external::ExternalTool;
use crate::error::{ExternalError, MediaError, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<Stream>,
}

#[derive(Debug, Deserialize)]
struct Stream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    duration: Option<String>,
}

/// Properties of the first video stream
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VideoInfo {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<f64>,
    pub duration: Option<f64>,
}

impl VideoInfo {
    pub fn resolution(&self) -> Option<(u32, u32)> {
        self.width.zip(self.height)
    }
}

/// Run ffprobe on `video`
pub fn probe_video(ffprobe: &ExternalTool, video: &Path) -> Result<VideoInfo> {
    let command = ffprobe.command([video])?;
    let stdout = command.output()?;
    let info = parse_probe(&stdout).map_err(|reason| ExternalError::InvalidOutput {
        command: command.to_string(),
        reason,
    })?;
    info.ok_or_else(|| {
        MediaError::NoVideoStream {
            path: video.to_path_buf(),
        }
        .into()
    })
}

/// Parse ffprobe JSON, `None` when there is no video stream
pub fn parse_probe(json: &str) -> std::result::Result<Option<VideoInfo>, String> {
    let output: ProbeOutput = serde_json::from_str(json).map_err(|e| e.to_string())?;
    let video = output
        .streams
        .into_iter()
        .find(|stream| stream.codec_type.as_deref() == Some("video"));

    Ok(video.map(|stream| VideoInfo {
        width: stream.width,
        height: stream.height,
        fps: stream.r_frame_rate.as_deref().and_then(parse_frame_rate),
        duration: stream.duration.and_then(|d| d.parse().ok()),
    }))
}

/// `30`, `30000/1001`
pub fn parse_frame_rate(text: &str) -> Option<f64> {
    match text.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            (den != 0.0).then(|| num / den)
        }
        None => text.trim().parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "streams": [
            { "index": 0, "codec_type": "audio", "duration": "9.5" },
            {
                "index": 1,
                "codec_type": "video",
                "width": 1920,
                "height": 1080,
                "r_frame_rate": "30000/1001",
                "duration": "12.480000"
            }
        ]
    }"#;

    #[test]
    fn first_video_stream_is_used() {
        let info = parse_probe(SAMPLE).unwrap().unwrap();

        assert_eq!(info.resolution(), Some((1920, 1080)));
        assert_eq!(info.duration, Some(12.48));
        let fps = info.fps.unwrap();
        assert!((fps - 29.97).abs() < 0.01);
    }

    #[test]
    fn no_video_stream() {
        let json = r#"{ "streams": [ { "codec_type": "audio" } ] }"#;
        assert_eq!(parse_probe(json).unwrap(), None);
        assert_eq!(parse_probe("{}").unwrap(), None);
    }

    #[test]
    fn invalid_json() {
        assert!(parse_probe("not json").is_err());
    }

    #[test]
    fn frame_rates() {
        assert_eq!(parse_frame_rate("25"), Some(25.0));
        assert_eq!(parse_frame_rate("50/2"), Some(25.0));
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("abc"), None);
    }
}
