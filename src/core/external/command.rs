//! Argument-vector commands and the ways to run them.

use crate::error::ExternalError;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Output, Stdio};
use tracing::debug;

/// A fully built command line
#[derive(Debug, Clone)]
pub struct ToolCommand {
    argv: Vec<OsString>,
    envs: Vec<(OsString, OsString)>,
    cwd: Option<PathBuf>,
}

impl ToolCommand {
    /// Start a command with the given program
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            argv: vec![program.as_ref().to_os_string()],
            envs: Vec::new(),
            cwd: None,
        }
    }

    /// Run `script` through `sh -c`.
    ///
    /// The script IS interpreted by the shell: only use it for command
    /// templates written by the user.
    pub fn shell(script: impl AsRef<OsStr>) -> Self {
        Self::new("sh").arg("-c").arg(script)
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.argv.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.argv
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Append `args` only when `condition` holds
    pub fn args_if<I, S>(self, condition: bool, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        if condition {
            self.args(args)
        } else {
            self
        }
    }

    pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.envs
            .push((key.as_ref().to_os_string(), value.as_ref().to_os_string()));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// The argument vector, program first
    pub fn argv(&self) -> &[OsString] {
        &self.argv
    }

    /// Extra environment variables
    pub fn envs(&self) -> &[(OsString, OsString)] {
        &self.envs
    }

    pub fn cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Run and capture stdout; a non-zero exit is an error carrying stderr
    pub fn output(&self) -> Result<String, ExternalError> {
        let output = self.capture(Stdio::piped())?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Like [`output`](Self::output) but stderr goes straight to the terminal
    pub fn output_inherit_stderr(&self) -> Result<String, ExternalError> {
        let output = self.capture(Stdio::inherit())?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Run attached to the current terminal and return the exit status
    pub fn stream(&self) -> Result<ExitStatus, ExternalError> {
        debug!(command = %self, "streaming command");
        self.build()
            .status()
            .map_err(|source| ExternalError::Spawn {
                command: self.to_string(),
                source,
            })
    }

    /// Like [`stream`](Self::stream) but a non-zero exit is an error
    pub fn stream_checked(&self) -> Result<(), ExternalError> {
        let status = self.stream()?;
        if status.success() {
            Ok(())
        } else {
            Err(ExternalError::Failed {
                command: self.to_string(),
                code: status.code(),
                stderr: String::new(),
            })
        }
    }

    /// Run attached to the terminal, only report whether it succeeded
    pub fn succeeded(&self) -> bool {
        self.stream().is_ok_and(|status| status.success())
    }

    fn capture(&self, stderr: Stdio) -> Result<Output, ExternalError> {
        debug!(command = %self, "running command");
        let output = self
            .build()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(stderr)
            .output()
            .map_err(|source| ExternalError::Spawn {
                command: self.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(ExternalError::Failed {
                command: self.to_string(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }

    fn build(&self) -> Command {
        let mut command = Command::new(&self.argv[0]);
        command.args(&self.argv[1..]);
        for (key, value) in &self.envs {
            command.env(key, value);
        }
        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }
        command
    }
}

/// Quote one argument the way a POSIX shell would need it
pub fn quote(arg: &OsStr) -> String {
    let text = arg.to_string_lossy();
    let safe = !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "@%+=:,./-_".contains(c));
    if safe {
        text.into_owned()
    } else {
        format!("'{}'", text.replace('\'', r#"'"'"'"#))
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let quoted: Vec<String> = self.argv.iter().map(|a| quote(a)).collect();
        write!(f, "{}", quoted.join(" "))
    }
}
