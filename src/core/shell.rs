//! The user's interactive shell and how it sources a file.

use crate::core::external::{quote, ExternalTool};
use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Shell families, by the way they load a file into the running session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Csh,
    Tcsh,
    Nu,
    /// sh, dash, ksh and friends
    Posix,
}

impl Shell {
    /// Shell for a program name such as `bash`, `-zsh` or `/usr/bin/fish`
    pub fn from_name(name: &str) -> Option<Self> {
        let base = name.rsplit('/').next().unwrap_or(name);
        let base = base.trim_start_matches('-');
        match base {
            "bash" => Some(Shell::Bash),
            "zsh" => Some(Shell::Zsh),
            "fish" => Some(Shell::Fish),
            "csh" => Some(Shell::Csh),
            "tcsh" => Some(Shell::Tcsh),
            "nu" => Some(Shell::Nu),
            "sh" | "dash" | "ash" | "ksh" | "mksh" => Some(Shell::Posix),
            _ => None,
        }
    }

    /// Line that loads `file` into an interactive session of this shell
    pub fn source_line(&self, file: &Path) -> String {
        let quoted = quote(file.as_os_str());
        match self {
            Shell::Fish | Shell::Csh | Shell::Tcsh | Shell::Nu => format!("source {}", quoted),
            // zsh reads the bash-style file in bash emulation
            Shell::Zsh => format!("emulate bash -c {}", quote(OsStr::new(&format!(". {}", quoted)))),
            Shell::Bash | Shell::Posix => format!(". {}", quoted),
        }
    }
}

/// A shell binary and its family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedShell {
    pub kind: Shell,
    pub path: PathBuf,
}

/// Find the shell that started this process.
///
/// Asks `ps` for the parent command name, then falls back to `$SHELL`, then
/// to `sh`.
pub fn detect(ps: &ExternalTool) -> DetectedShell {
    if let Some(shell) = parent_shell(ps) {
        debug!(shell = %shell.path.display(), "shell detected from parent process");
        return shell;
    }
    if let Some(shell) = env::var("SHELL").ok().filter(|s| !s.is_empty()) {
        debug!(shell = %shell, "shell detected from $SHELL");
        return DetectedShell {
            kind: Shell::from_name(&shell).unwrap_or(Shell::Posix),
            path: PathBuf::from(shell),
        };
    }
    DetectedShell {
        kind: Shell::Posix,
        path: PathBuf::from("sh"),
    }
}

#[cfg(unix)]
fn parent_shell(ps: &ExternalTool) -> Option<DetectedShell> {
    let ppid = std::os::unix::process::parent_id().to_string();
    let name = ps
        .command(["-o", "comm=", "-p", ppid.as_str()])
        .ok()?
        .output()
        .ok()?;
    let name = name.trim();
    let kind = Shell::from_name(name)?;
    let program = name.trim_start_matches('-');
    let path = which::which(program).ok()?;
    Some(DetectedShell { kind, path })
}

#[cfg(not(unix))]
fn parent_shell(_ps: &ExternalTool) -> Option<DetectedShell> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names() {
        assert_eq!(Shell::from_name("bash"), Some(Shell::Bash));
        assert_eq!(Shell::from_name("-zsh"), Some(Shell::Zsh));
        assert_eq!(Shell::from_name("/usr/bin/fish"), Some(Shell::Fish));
        assert_eq!(Shell::from_name("dash"), Some(Shell::Posix));
        assert_eq!(Shell::from_name("cargo"), None);
    }

    #[test]
    fn source_lines() {
        let file = Path::new("/tmp/age.env");
        assert_eq!(Shell::Bash.source_line(file), ". /tmp/age.env");
        assert_eq!(Shell::Fish.source_line(file), "source /tmp/age.env");
        assert_eq!(Shell::Nu.source_line(file), "source /tmp/age.env");
        assert_eq!(
            Shell::Zsh.source_line(file),
            "emulate bash -c '. /tmp/age.env'"
        );
    }

    #[test]
    fn paths_with_spaces_are_quoted() {
        let file = Path::new("/tmp/my dir/age.env");
        assert_eq!(Shell::Posix.source_line(file), ". '/tmp/my dir/age.env'");
    }

    #[test]
    fn detection_always_finds_something() {
        let missing = ExternalTool::new("ps-that-does-not-exist");
        let shell = detect(&missing);
        assert!(!shell.path.as_os_str().is_empty());
    }
}
