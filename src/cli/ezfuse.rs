//! # ezfuse
//!
//! Mount a FUSE filesystem in a temporary folder and drive it from a small
//! menu. Installed as `ez<type>` (`ezsshfs`, `ezarchivemount`...), the
//! filesystem type comes from the program name.
//!
//! ```bash
//! ezfuse -t sshfs -- me@server:/data
//! ```

use super::output::{Console, Icon, Label, Verbosity};
use super::prompt::{Answer, Prompt};
use crate::core::external::{catalog, ExternalTool, ToolCommand};
use crate::error::{Result, ToolError};
use clap::Parser;
use console::style;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;

/// Quickly mount fuse filesystems in temporary directories
#[derive(Parser, Debug)]
#[command(name = "ezfuse", version, about)]
pub struct Args {
    #[command(flatten)]
    pub verbosity: Verbosity,

    /// Type of filesystem, which is also the binary used to mount it
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    pub fuse_type: Option<String>,

    /// Use the binary without testing it first
    #[arg(long)]
    pub force: bool,

    /// Create the mountpoint in the current directory, default is the home folder
    #[arg(long)]
    pub pwd: bool,

    /// Arguments passed to the mount command, options after the first one are kept
    #[arg(trailing_var_arg = true)]
    pub extra_args: Vec<String>,
}

/// Menu entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Quit,
    Exit,
    Open,
    Shell,
    Mount,
    Umount,
}

impl MenuAction {
    pub const ALL: [MenuAction; 6] = [
        MenuAction::Quit,
        MenuAction::Exit,
        MenuAction::Open,
        MenuAction::Shell,
        MenuAction::Mount,
        MenuAction::Umount,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            MenuAction::Quit => "q",
            MenuAction::Exit => "x",
            MenuAction::Open => "o",
            MenuAction::Shell => "s",
            MenuAction::Mount => "m",
            MenuAction::Umount => "u",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            MenuAction::Quit => "umount and exit",
            MenuAction::Exit => "exit (and keep mountpoint)",
            MenuAction::Open => "xdg-open",
            MenuAction::Shell => "shell",
            MenuAction::Mount => "mount",
            MenuAction::Umount => "umount",
        }
    }

    /// Whether the filesystem must be mounted for this action
    pub fn needs_mount(&self) -> bool {
        matches!(self, MenuAction::Open | MenuAction::Shell | MenuAction::Mount)
    }
}

impl FromStr for MenuAction {
    type Err = ();

    fn from_str(text: &str) -> std::result::Result<Self, Self::Err> {
        let text = text.trim().to_lowercase();
        MenuAction::ALL
            .into_iter()
            .find(|action| action.key() == text)
            .ok_or(())
    }
}

/// Filesystem type from `-t`, or from an `ez<type>` program name
pub fn fuse_type(explicit: Option<&str>, program: &str) -> Result<String> {
    if let Some(fuse_type) = explicit {
        return Ok(fuse_type.to_string());
    }
    let name = Path::new(program)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.strip_prefix("ez") {
        _ if name == "ezfuse" => Err(ToolError::Config("missing -t|--type argument".to_string())),
        Some(fuse_type) if !fuse_type.is_empty() => Ok(fuse_type.to_string()),
        _ => Err(ToolError::Config(format!(
            "cannot infer fuse type from {}",
            name
        ))),
    }
}

/// A mounted, or mountable, temporary folder
struct Session<'a> {
    console: &'a Console,
    mount: ToolCommand,
    mountpoint: PathBuf,
    mounted: bool,
}

impl Session<'_> {
    fn execute(&self, command: &ToolCommand) -> Result<()> {
        self.console.say(
            Icon::Exec,
            format!("Execute: {}", Label::command(command)),
        );
        Ok(command.stream_checked()?)
    }

    fn mount(&mut self) -> Result<()> {
        if !self.mounted {
            self.execute(&self.mount)?;
            self.mounted = true;
        }
        Ok(())
    }

    fn umount(&mut self) -> Result<()> {
        if self.mounted {
            let command = catalog::fusermount()
                .command(["-u", "-z"])?
                .arg(&self.mountpoint);
            self.execute(&command)?;
            self.mounted = false;
        }
        Ok(())
    }

    fn handle(&mut self, action: MenuAction) -> Result<()> {
        match action {
            MenuAction::Quit | MenuAction::Umount => self.umount()?,
            _ if action.needs_mount() => self.mount()?,
            _ => {}
        }
        match action {
            MenuAction::Open => {
                let command = catalog::xdg_open().command([&self.mountpoint])?;
                self.execute(&command)?;
            }
            MenuAction::Shell => {
                let shell = env::var("SHELL").unwrap_or_else(|_| "bash".to_string());
                let command = ToolCommand::new(shell)
                    .current_dir(&self.mountpoint)
                    .env("EZMNT", &self.mountpoint);
                self.console.say(
                    Icon::Exec,
                    format!("Execute: {}", Label::command(&command)),
                );
                // The exit status of an interactive shell is not an error
                command.stream()?;
            }
            _ => {}
        }
        Ok(())
    }

    fn leave(&self) -> Result<()> {
        let folder = Label::folder(&self.mountpoint);
        if self.mounted {
            self.console.say(Icon::Hint, format!("Keeping mountpoint {}", folder));
            let hint = format!(
                "fusermount -u -z {0}; rmdir {0}",
                self.mountpoint.display()
            );
            self.console.say(
                Icon::Hint,
                format!("To umount it run: {}", Label::command(&hint)),
            );
        } else {
            self.console.say(Icon::Hint, format!("Remove mountpoint {}", folder));
            fs::remove_dir(&self.mountpoint).map_err(|e| ToolError::io(&self.mountpoint, e))?;
        }
        Ok(())
    }
}

fn show_menu(console: &Console) {
    console.blank();
    for action in MenuAction::ALL {
        console.say(
            Icon::Question,
            format!("{} {}", style(format!("{}:", action.key())).bold(), style(action.description()).dim()),
        );
    }
}

fn ask(prompt: &Prompt) -> MenuAction {
    let keys: Vec<&str> = MenuAction::ALL.iter().map(MenuAction::key).collect();
    let question = format!("[{}] ", keys.join("/"));
    loop {
        match prompt.ask(&question) {
            Answer::Line(line) => {
                if let Ok(action) = line.parse() {
                    return action;
                }
            }
            Answer::Closed | Answer::Cancelled | Answer::TimedOut => return MenuAction::Exit,
        }
    }
}

pub fn run(args: Args) -> Result<ExitCode> {
    let console = Console::new(args.verbosity);
    let program = env::args().next().unwrap_or_default();
    let fuse_type = fuse_type(args.fuse_type.as_deref(), &program)?;

    let tool = if args.force {
        ExternalTool::new(&fuse_type)
    } else {
        ExternalTool::new(&fuse_type).probe("--version")
    };
    let parent = if args.pwd {
        env::current_dir().map_err(|e| ToolError::io(".", e))?
    } else {
        dirs::home_dir().ok_or_else(|| ToolError::Config("cannot find home folder".to_string()))?
    };
    let mountpoint = tempfile::Builder::new()
        .prefix(&format!("ezmount-{}-", fuse_type))
        .tempdir_in(&parent)
        .map_err(|e| ToolError::io(&parent, e))?
        .keep();
    console.say(Icon::Hint, format!("Using mountpoint {}", Label::folder(&mountpoint)));

    let mut session = Session {
        console: &console,
        mount: tool.command(&args.extra_args)?.arg(&mountpoint),
        mountpoint,
        mounted: false,
    };

    if let Err(error) = session.mount() {
        console.error(Icon::Boom, format!("Error while mounting: {}", Label::error(&error)));
        session.leave()?;
        return Ok(ExitCode::from(2));
    }

    let prompt = Prompt::stdin();
    loop {
        show_menu(&console);
        let action = ask(&prompt);
        console.blank();
        if let Err(error) = session.handle(action) {
            console.error(Icon::Boom, Label::error(&error));
        }
        if matches!(action, MenuAction::Quit | MenuAction::Exit) {
            session.leave()?;
            return Ok(ExitCode::SUCCESS);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn extra_args_are_kept_verbatim() {
        let args = Args::try_parse_from(["ezfuse", "-t", "sshfs", "me@host:/data", "-o", "ro"]).unwrap();
        assert_eq!(args.fuse_type.as_deref(), Some("sshfs"));
        assert_eq!(args.extra_args, ["me@host:/data", "-o", "ro"]);
    }

    #[test]
    fn options_before_the_source_are_parsed() {
        let args =
            Args::try_parse_from(["ezfuse", "--pwd", "--force", "-t", "sshfs", "host:", "-o", "ro"])
                .unwrap();
        assert!(args.pwd && args.force);
        assert_eq!(args.fuse_type.as_deref(), Some("sshfs"));
        assert_eq!(args.extra_args, ["host:", "-o", "ro"]);

        let args = Args::try_parse_from(["ezsshfs", "--pwd", "host:"]).unwrap();
        assert!(args.pwd && !args.force);
        assert_eq!(args.fuse_type, None);
        assert_eq!(args.extra_args, ["host:"]);
    }

    #[test]
    fn double_dash_allows_leading_options() {
        let args = Args::try_parse_from(["ezfuse", "-t", "sshfs", "--", "-C", "me@host:/data"]).unwrap();
        assert_eq!(args.fuse_type.as_deref(), Some("sshfs"));
        assert_eq!(args.extra_args, ["-C", "me@host:/data"]);
    }

    #[test]
    fn type_from_program_name() {
        assert_eq!(fuse_type(None, "/usr/bin/ezsshfs").unwrap(), "sshfs");
        assert_eq!(fuse_type(Some("archivemount"), "ezsshfs").unwrap(), "archivemount");
        assert!(matches!(fuse_type(None, "ezfuse"), Err(ToolError::Config(_))));
        assert!(matches!(fuse_type(None, "mounter"), Err(ToolError::Config(_))));
        assert!(matches!(fuse_type(None, "ez"), Err(ToolError::Config(_))));
    }

    #[test]
    fn menu_keys() {
        assert_eq!("q".parse::<MenuAction>(), Ok(MenuAction::Quit));
        assert_eq!(" U \n".parse::<MenuAction>(), Ok(MenuAction::Umount));
        assert_eq!("z".parse::<MenuAction>(), Err(()));
    }

    #[test]
    fn only_mount_actions_need_the_filesystem() {
        assert!(MenuAction::Open.needs_mount());
        assert!(MenuAction::Shell.needs_mount());
        assert!(!MenuAction::Exit.needs_mount());
        assert!(!MenuAction::Umount.needs_mount());
    }

    #[test]
    fn eof_exits_and_keeps_the_mountpoint() {
        let prompt = Prompt::from_reader(std::io::Cursor::new("nope\n"));
        assert_eq!(ask(&prompt), MenuAction::Exit);
    }

    #[test]
    fn failed_mount_removes_the_mountpoint() {
        let temp = tempfile::tempdir().unwrap();
        let mountpoint = temp.path().join("ezmount-false-x");
        fs::create_dir(&mountpoint).unwrap();
        let console = Console::new(Verbosity {
            verbose: false,
            quiet: true,
        });

        let mut session = Session {
            console: &console,
            mount: ToolCommand::new("false").arg(&mountpoint),
            mountpoint: mountpoint.clone(),
            mounted: false,
        };

        assert!(session.mount().is_err());
        session.leave().unwrap();
        assert!(!mountpoint.exists());
    }
}
