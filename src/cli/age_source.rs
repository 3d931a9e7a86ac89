//! # age-source
//!
//! Source an age encrypted env file in an interactive subshell, or edit it.
//!
//! ```bash
//! age-source ~/.secrets/aws.env      # subshell with the variables loaded
//! age-source -e ~/.secrets/aws.env   # decrypt, edit, encrypt
//! ```

use super::output::{Console, Icon, Label, Verbosity};
use crate::core::apply::backup_path;
use crate::core::external::{catalog, ExternalTool, ToolCommand};
use crate::core::pty::PtyBridge;
use crate::core::shell;
use crate::error::{Result, ToolError};
use chrono::{Local, NaiveDateTime};
use clap::Parser;
use console::style;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Source an age encrypted file in a new shell
#[derive(Parser, Debug)]
#[command(name = "age-source", version, about)]
pub struct Args {
    /// Print more information
    #[arg(short, long)]
    pub verbose: bool,

    /// Do not print the first comment of the file
    #[arg(short, long)]
    pub quiet: bool,

    /// Edit file with $EDITOR
    #[arg(short, long)]
    pub edit: bool,

    /// Do not create a .bak file when the encrypted file is edited
    #[arg(short, long)]
    pub force: bool,

    /// age key file, default is ~/.age/key.txt
    #[arg(short, long, value_name = "KEY")]
    pub identity: Option<PathBuf>,

    /// Encrypted env file
    pub env_file: PathBuf,
}

impl Args {
    /// `-q` only hides the comment, every other line stays
    pub fn verbosity(&self) -> Verbosity {
        Verbosity {
            verbose: self.verbose,
            quiet: false,
        }
    }
}

/// The key given with `-i`, or `~/.age/key.txt` when it exists
pub fn resolve_identity(identity: Option<&Path>) -> Result<PathBuf> {
    if let Some(identity) = identity {
        return Ok(identity.to_path_buf());
    }
    dirs::home_dir()
        .map(|home| home.join(".age").join("key.txt"))
        .filter(|key| key.is_file())
        .ok_or_else(|| {
            ToolError::Config("no default key in ~/.age/key.txt, use --identity".to_string())
        })
}

/// Content of a file that does not exist yet
pub fn template(now: NaiveDateTime) -> String {
    format!(
        "# Age encrypted file created on {}\nexport FOO='bar'\n",
        now.format("%Y-%m-%d %H:%M:%S")
    )
}

/// Clear text followed by the prompt marker
pub fn sourced_content(clear_text: &str, env_file: &Path) -> String {
    let name = env_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}\nPS1=\"({} AGE:{}) $PS1\"\n", clear_text, Icon::Unlocked, name)
}

/// First line when it is a comment
pub fn first_comment(clear_text: &str) -> Option<&str> {
    clear_text.lines().next().filter(|line| line.starts_with('#'))
}

/// Comment printed before opening the subshell
pub fn banner(clear_text: &str, hide_comment: bool) -> Option<&str> {
    first_comment(clear_text).filter(|_| !hide_comment)
}

fn decrypt(console: &Console, age: &ExternalTool, identity: &Path, file: &Path) -> Result<String> {
    let command = age.command(["-d", "-i"])?.arg(identity).arg(file);
    console.say(
        Icon::LockAndKey,
        format!("Decrypt {}: {}", Label::file(file), Label::command(&command)),
    );
    Ok(command.output()?)
}

fn encrypt(console: &Console, age: &ExternalTool, identity: &Path, file: &Path) -> Result<String> {
    let command = age.command(["-e", "-a", "-i"])?.arg(identity).arg(file);
    console.say(
        Icon::LockAndKey,
        format!("Encrypt {}: {}", Label::file(file), Label::command(&command)),
    );
    Ok(command.output()?)
}

fn clear_text_file(content: &str) -> Result<tempfile::NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("age-")
        .suffix(".env")
        .tempfile()
        .map_err(|e| ToolError::io(std::env::temp_dir(), e))?;
    file.write_all(content.as_bytes())
        .and_then(|_| file.flush())
        .map_err(|e| ToolError::io(file.path(), e))?;
    Ok(file)
}

/// Decrypt, edit then encrypt `env_file`, keeping a `.bak` unless `force`
pub fn edit(
    console: &Console,
    age: &ExternalTool,
    editor: &ExternalTool,
    identity: &Path,
    env_file: &Path,
    force: bool,
) -> Result<()> {
    let clear_text = if env_file.exists() {
        decrypt(console, age, identity, env_file)?
    } else {
        template(Local::now().naive_local())
    };
    let buffer = clear_text_file(&clear_text)?;

    editor.command([buffer.path()])?.stream_checked()?;
    let encrypted = encrypt(console, age, identity, buffer.path())?;

    if env_file.exists() && !force {
        let backup = backup_path(env_file);
        fs::rename(env_file, &backup).map_err(|e| ToolError::io(env_file, e))?;
        console.say(Icon::Hint, format!("Backup file: {}", Label::file(&backup)));
    }
    fs::write(env_file, encrypted).map_err(|e| ToolError::io(env_file, e))?;
    Ok(())
}

/// Open a subshell that sources the decrypted file, return its exit code
pub fn source(
    console: &Console,
    age: &ExternalTool,
    identity: &Path,
    env_file: &Path,
    hide_comment: bool,
) -> Result<u32> {
    let clear_text = decrypt(console, age, identity, env_file)?;
    if let Some(comment) = banner(&clear_text, hide_comment) {
        console.say(Icon::Hint, style(comment).cyan());
    }
    let script = clear_text_file(&sourced_content(&clear_text, env_file))?;

    let detected = shell::detect(&catalog::ps());
    let bridge = PtyBridge::spawn(&ToolCommand::new(&detected.path).arg("-i"))?;
    bridge.send_line(&detected.kind.source_line(script.path()))?;
    let code = bridge.interact()?;

    // The clear text is removed as soon as the shell ends
    drop(script);
    Ok(code)
}

pub fn run(args: Args) -> Result<ExitCode> {
    let console = Console::new(args.verbosity());
    let identity = resolve_identity(args.identity.as_deref())?;
    let age = catalog::age();
    age.resolve()?;

    if args.edit {
        edit(
            &console,
            &age,
            &catalog::editor("vim"),
            &identity,
            &args.env_file,
            args.force,
        )?;
        return Ok(ExitCode::SUCCESS);
    }

    let code = source(&console, &age, &identity, &args.env_file, args.quiet)?;
    Ok(ExitCode::from(u8::try_from(code).unwrap_or(u8::MAX)))
}
