//! Memoized binary resolution.

use super::ToolCommand;
use crate::error::ExternalError;
use std::env;
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::OnceLock;
use tracing::debug;

#[derive(Debug, Clone)]
enum Resolution {
    Found(PathBuf),
    NotFound { name: String, reason: String },
    ProbeFailed { binary: PathBuf, arg: String },
}

/// An external binary, resolved lazily and at most once
#[derive(Debug)]
pub struct ExternalTool {
    name: String,
    common_args: Vec<OsString>,
    env_override: Option<String>,
    probe_arg: Option<String>,
    resolved: OnceLock<Resolution>,
}

impl ExternalTool {
    /// Create a tool for the given binary name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            common_args: Vec::new(),
            env_override: None,
            probe_arg: None,
            resolved: OnceLock::new(),
        }
    }

    /// Arguments prepended to every command
    pub fn common_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.common_args = args.into_iter().map(|a| a.as_ref().to_os_string()).collect();
        self
    }

    /// Environment variable that overrides the binary
    pub fn env_override(mut self, var: impl Into<String>) -> Self {
        self.env_override = Some(var.into());
        self
    }

    /// Argument used to check the binary works before first use
    pub fn probe(mut self, arg: impl Into<String>) -> Self {
        self.probe_arg = Some(arg.into());
        self
    }

    /// Name of the binary before resolution
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolve the binary path, running the probe the first time
    pub fn resolve(&self) -> Result<PathBuf, ExternalError> {
        match self.resolved.get_or_init(|| self.locate()) {
            Resolution::Found(path) => Ok(path.clone()),
            Resolution::NotFound { name, reason } => Err(ExternalError::NotFound {
                name: name.clone(),
                reason: reason.clone(),
            }),
            Resolution::ProbeFailed { binary, arg } => Err(ExternalError::ProbeFailed {
                binary: binary.clone(),
                arg: arg.clone(),
            }),
        }
    }

    /// Build a command: binary, common arguments, then `args`
    pub fn command<I, S>(&self, args: I) -> Result<ToolCommand, ExternalError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let binary = self.resolve()?;
        Ok(ToolCommand::new(binary).args(&self.common_args).args(args))
    }

    fn locate(&self) -> Resolution {
        let candidate = self
            .env_override
            .as_ref()
            .and_then(|var| env::var(var).ok())
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| self.name.clone());

        let binary = match which::which(&candidate) {
            Ok(path) => path,
            Err(e) => {
                return Resolution::NotFound {
                    name: candidate,
                    reason: e.to_string(),
                }
            }
        };

        if let Some(arg) = &self.probe_arg {
            let healthy = Command::new(&binary)
                .arg(arg)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .is_ok_and(|status| status.success());
            if !healthy {
                return Resolution::ProbeFailed {
                    binary,
                    arg: arg.clone(),
                };
            }
        }

        debug!(tool = %self.name, binary = %binary.display(), "resolved external tool");
        Resolution::Found(binary)
    }
}
