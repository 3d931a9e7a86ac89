//! # Error Module
//!
//! Error types shared by every tool.
//!
//! ## Taxonomy
//! - **Configuration** - missing flag, binary not found: fatal before any work
//! - **Per-item** - one file failed: counted and printed, the batch goes on
//! - **Interrupted** - the user pressed Ctrl-C: partial state is kept
//! - **Invariant** - continuing would corrupt results: the run is aborted

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;

/// Top-level error for all tools
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    External(#[from] ExternalError),

    #[error(transparent)]
    Apply(#[from] ApplyError),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Worker panicked: {0}")]
    Panicked(String),

    #[error("Invariant violated: {0}")]
    Invariant(String),

    #[error("Interrupted")]
    Interrupted,

    #[error("{failures} item(s) failed")]
    BatchFailed { failures: usize },
}

impl ToolError {
    /// Wrap an io error with the path it happened on
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        ToolError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            ToolError::Config(_) => 2,
            ToolError::External(ExternalError::NotFound { .. })
            | ToolError::External(ExternalError::ProbeFailed { .. }) => 2,
            ToolError::Invariant(_) => 3,
            ToolError::Interrupted => 130,
            _ => 1,
        }
    }
}

impl From<ToolError> for ExitCode {
    fn from(error: ToolError) -> Self {
        ExitCode::from(error.exit_code())
    }
}

/// Errors raised while locating or running an external binary
#[derive(Error, Debug)]
pub enum ExternalError {
    #[error("Cannot find executable '{name}': {reason}")]
    NotFound { name: String, reason: String },

    #[error("{binary} does not answer to '{arg}', is it installed correctly?")]
    ProbeFailed { binary: PathBuf, arg: String },

    #[error("Failed to execute {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with {}: {stderr}", describe_code(.code))]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{command} printed invalid output: {reason}")]
    InvalidOutput { command: String, reason: String },
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {code}"),
        None => "a signal".to_string(),
    }
}

/// Errors raised while renaming, copying, linking or deleting files
#[derive(Error, Debug)]
pub enum ApplyError {
    #[error("Cannot find a free name {prefix}NNN{suffix} in {folder} (tried up to {bound})")]
    NoFreeName {
        folder: PathBuf,
        prefix: String,
        suffix: String,
        bound: u32,
    },

    #[error("Source file vanished: {path}")]
    SourceMissing { path: PathBuf },

    #[error("Copy verification failed for {path}: source {expected} bytes, destination {actual} bytes")]
    CopyMismatch {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },
}

/// Errors from ffmpeg/ffprobe helpers and image processing
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Cannot parse position '{expression}'")]
    InvalidPosition { expression: String },

    #[error("Invalid position '{expression}': {seconds}s is outside of [0, {duration}]")]
    PositionOutOfRange {
        expression: String,
        seconds: f64,
        duration: f64,
    },

    #[error("Invalid resolution '{0}', expected WIDTH or WIDTHxHEIGHT")]
    InvalidResolution(String),

    #[error("Invalid ffmpeg filter '{0}'")]
    InvalidFilter(String),

    #[error("No video stream in {path}")]
    NoVideoStream { path: PathBuf },

    #[error("{path} is not a video ({mime})")]
    NotAVideo { path: PathBuf, mime: String },

    #[error("Frame {path} already exists")]
    FramesExist { path: PathBuf },

    #[error("Failed to process image {path}: {reason}")]
    Image { path: PathBuf, reason: String },
}

/// Errors raised while reading creation dates with exiftool
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Cannot find {path}")]
    Missing { path: PathBuf },

    #[error("Invalid date '{text}'")]
    InvalidDate { text: String },

    #[error("Cannot find date for {path}")]
    NoDate { path: PathBuf },

    #[error("Unsupported file type {mime} for {path}")]
    UnsupportedType { mime: String, path: PathBuf },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, ToolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_command_includes_stderr() {
        let error = ExternalError::Failed {
            command: "age -d secret.env".to_string(),
            code: Some(1),
            stderr: "no identity matched".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("code 1"));
        assert!(message.contains("no identity matched"));
    }

    #[test]
    fn exhausted_suffix_range_names_the_folder() {
        let error = ApplyError::NoFreeName {
            folder: PathBuf::from("/photos/2023"),
            prefix: "2023-07-04_".to_string(),
            suffix: ".jpg".to_string(),
            bound: 999,
        };
        let message = error.to_string();
        assert!(message.contains("/photos/2023"));
        assert!(message.contains("999"));
    }

    #[test]
    fn exit_codes_follow_taxonomy() {
        assert_eq!(ToolError::Config("missing -t".into()).exit_code(), 2);
        assert_eq!(ToolError::Interrupted.exit_code(), 130);
        assert_eq!(ToolError::Invariant("count changed".into()).exit_code(), 3);
        assert_eq!(ToolError::BatchFailed { failures: 1 }.exit_code(), 1);
        let missing = ToolError::External(ExternalError::NotFound {
            name: "fdupes".into(),
            reason: "not in PATH".into(),
        });
        assert_eq!(missing.exit_code(), 2);
    }
}
