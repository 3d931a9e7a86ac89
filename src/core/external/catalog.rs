//! The external binaries used across the tools, with their fixed settings.

use super::ExternalTool;

/// `file --brief`, MIME and extension detection
pub fn file() -> ExternalTool {
    ExternalTool::new("file").common_args(["--brief"]).probe("--version")
}

/// `exiftool -G -j`, grouped tags as JSON
pub fn exiftool() -> ExternalTool {
    ExternalTool::new("exiftool").common_args(["-G", "-j"])
}

pub fn ffmpeg() -> ExternalTool {
    ExternalTool::new("ffmpeg")
        .common_args(["-hide_banner", "-loglevel", "error", "-y"])
        .probe("-version")
}

/// `ffprobe` printing streams as JSON
pub fn ffprobe() -> ExternalTool {
    ExternalTool::new("ffprobe")
        .common_args(["-v", "error", "-print_format", "json", "-show_streams"])
        .probe("-version")
}

pub fn fdupes() -> ExternalTool {
    ExternalTool::new("fdupes")
        .common_args(["--recurse", "--noempty"])
        .probe("--version")
}

pub fn age() -> ExternalTool {
    ExternalTool::new("age").probe("--version")
}

/// The user's editor, `$EDITOR` first
pub fn editor(default: &str) -> ExternalTool {
    ExternalTool::new(default).env_override("EDITOR")
}

/// `ssh`, overridable with `$SSH_BIN`
pub fn ssh() -> ExternalTool {
    ExternalTool::new("ssh").env_override("SSH_BIN").probe("-V")
}

pub fn fusermount() -> ExternalTool {
    ExternalTool::new("fusermount")
}

pub fn xdg_open() -> ExternalTool {
    ExternalTool::new("xdg-open")
}

/// `ps`, used to find which shell started us
pub fn ps() -> ExternalTool {
    ExternalTool::new("ps")
}
