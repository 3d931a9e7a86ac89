//! # remote-borg
//!
//! Back up a remote host into a local borg repository. borg runs on the
//! remote host and reaches the repository back through a reverse ssh tunnel.
//!
//! ```bash
//! remote-borg -d /backup/borg server.example.org -- create --stats ::{now} /etc
//! ```

use super::output::{Console, Icon, Label, Verbosity};
use super::prompt::Prompt;
use crate::core::donelist::filter_comments;
use crate::core::external::{catalog, ExternalTool, ToolCommand};
use crate::error::{Result, ToolError};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Run borg on a remote host against a local repository
#[derive(Parser, Debug)]
#[command(name = "remote-borg", version, about)]
pub struct Args {
    #[command(flatten)]
    pub verbosity: Verbosity,

    /// Path to the borg repository
    #[arg(short = 'd', long = "repodir", env = "BORG_REPO", value_name = "DIR")]
    pub repo_dir: Option<PathBuf>,

    /// Force pseudo-terminal allocation for the ssh connection
    #[arg(short, long)]
    pub tty: bool,

    /// Do not ask confirmation before executing the command
    #[arg(short, long)]
    pub yes: bool,

    /// Read borg arguments from a file
    #[arg(long = "args", value_name = "FILE", conflicts_with = "borg_args")]
    pub args_file: Option<PathBuf>,

    /// Remote server ssh port
    #[arg(short = 'p', long, value_name = "PORT")]
    pub remote_port: Option<u16>,

    /// Local ssh user who can access the borg repository
    #[arg(long, env = "USER", value_name = "USER")]
    pub local_user: String,

    /// Local ssh port
    #[arg(long, default_value_t = 22, value_name = "PORT")]
    pub local_port: u16,

    /// Local ssh host
    #[arg(long, default_value = "localhost", value_name = "HOST")]
    pub local_host: String,

    /// Port of the reverse tunnel, change it if 47022 is already taken
    #[arg(long = "tunnel", default_value_t = 47022, value_name = "PORT")]
    pub tunnel_port: u16,

    /// Remote ssh host
    pub remote_host: String,

    /// borg arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub borg_args: Vec<String>,
}

/// The reverse tunnel set up by ssh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tunnel {
    pub local_user: String,
    pub local_host: String,
    pub local_port: u16,
    pub port: u16,
}

impl Tunnel {
    /// `-R` forwarding specification
    pub fn forward(&self) -> String {
        format!("{}:{}:{}", self.port, self.local_host, self.local_port)
    }

    /// Repository URL as seen from the remote host
    pub fn borg_repo(&self, repo_dir: &Path) -> String {
        format!(
            "ssh://{}@{}:{}{}",
            self.local_user,
            self.local_host,
            self.port,
            repo_dir.display()
        )
    }
}

impl From<&Args> for Tunnel {
    fn from(args: &Args) -> Self {
        Self {
            local_user: args.local_user.clone(),
            local_host: args.local_host.clone(),
            local_port: args.local_port,
            port: args.tunnel_port,
        }
    }
}

/// borg arguments from a file, one per line, comments ignored
pub fn read_borg_args(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path).map_err(|e| ToolError::io(path, e))?;
    Ok(filter_comments(content.lines()).map(str::to_string).collect())
}

/// `ssh -A [-p PORT] [-t] -R FORWARD HOST BORG_REPO=URL borg ARGS...`
pub fn build_command(
    ssh: &ExternalTool,
    tunnel: &Tunnel,
    remote_host: &str,
    remote_port: Option<u16>,
    tty: bool,
    repo_dir: &Path,
    borg_args: &[String],
) -> Result<ToolCommand> {
    let port = remote_port.map(|p| p.to_string());
    Ok(ssh
        .command(["-A"])?
        .args_if(port.is_some(), ["-p", port.as_deref().unwrap_or_default()])
        .args_if(tty, ["-t"])
        .args(["-R", tunnel.forward().as_str()])
        .arg(remote_host)
        .arg(format!("BORG_REPO={}", tunnel.borg_repo(repo_dir)))
        .arg("borg")
        .args(borg_args))
}

pub fn run(args: Args) -> Result<ExitCode> {
    let console = Console::new(args.verbosity);

    let repo_dir = args.repo_dir.as_deref().ok_or_else(|| {
        ToolError::Config("No BORG_REPO set in environment nor given using --repodir/-d".to_string())
    })?;
    let repo_dir = std::path::absolute(repo_dir).map_err(|e| ToolError::io(repo_dir, e))?;
    let borg_args = match &args.args_file {
        Some(file) => read_borg_args(file)?,
        None => args.borg_args.clone(),
    };

    let ssh = catalog::ssh();
    let command = build_command(
        &ssh,
        &Tunnel::from(&args),
        &args.remote_host,
        args.remote_port,
        args.tty,
        &repo_dir,
        &borg_args,
    )?;

    console.say(Icon::Exec, format!("Command: {}", Label::command(&command)));
    if !args.yes && !Prompt::stdin().confirm("Execute command? (y/N) ") {
        return Ok(ExitCode::SUCCESS);
    }
    println!("{}", "-".repeat(40));

    let status = command.stream()?;
    let code = status.code().unwrap_or(1);
    Ok(ExitCode::from(u8::try_from(code).unwrap_or(u8::MAX)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use clap::CommandFactory;

    fn tunnel() -> Tunnel {
        Tunnel {
            local_user: "me".into(),
            local_host: "localhost".into(),
            local_port: 22,
            port: 47022,
        }
    }

    fn tail(command: &ToolCommand) -> Vec<String> {
        command.argv()[1..]
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn args_file_and_trailing_args_conflict() {
        let parsed = Args::try_parse_from([
            "remote-borg", "--local-user", "me", "--args", "f", "host", "list",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["remote-borg", "--local-user", "me", "host", "list", "--short"])
            .unwrap();
        assert_eq!(args.tunnel_port, 47022);
        assert_eq!(args.local_port, 22);
        assert_eq!(args.local_host, "localhost");
        assert_eq!(args.borg_args, ["list", "--short"]);
        assert_eq!(Tunnel::from(&args), tunnel());
    }

    #[test]
    fn options_before_the_host_are_ours() {
        let args = Args::try_parse_from([
            "remote-borg", "-y", "-t", "--local-user", "me", "host", "--progress", "-y",
        ])
        .unwrap();
        assert!(args.yes && args.tty);
        assert_eq!(args.remote_host, "host");
        assert_eq!(args.borg_args, ["--progress", "-y"]);
    }

    #[test]
    fn command_line() {
        let sh = ExternalTool::new("sh");
        let command = build_command(
            &sh,
            &tunnel(),
            "server",
            Some(2222),
            true,
            Path::new("/backup/borg"),
            &["list".to_string()],
        )
        .unwrap();

        assert_eq!(
            tail(&command),
            [
                "-A",
                "-p",
                "2222",
                "-t",
                "-R",
                "47022:localhost:22",
                "server",
                "BORG_REPO=ssh://me@localhost:47022/backup/borg",
                "borg",
                "list",
            ]
        );
    }

    #[test]
    fn optional_flags_are_omitted() {
        let sh = ExternalTool::new("sh");
        let command =
            build_command(&sh, &tunnel(), "server", None, false, Path::new("/r"), &[]).unwrap();

        assert_eq!(
            tail(&command),
            ["-A", "-R", "47022:localhost:22", "server", "BORG_REPO=ssh://me@localhost:47022/r", "borg"]
        );
    }

    #[test]
    fn args_file_skips_comments() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("args");
        file.write_str("# weekly\ncreate\n\n  --stats\n::{now}\n").unwrap();

        let args = read_borg_args(file.path()).unwrap();

        assert_eq!(args, ["create", "--stats", "::{now}"]);
    }
}
