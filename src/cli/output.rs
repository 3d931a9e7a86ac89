//! Colored console output shared by the tools.

use crate::core::apply::{Operation, Outcome, Summary};
use crate::core::collector::SkippedEntry;
use crate::error::{Result, ToolError};
use clap::Args;
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

/// Emoji prefixes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    Ok,
    Error,
    RedFlag,
    Boom,
    Question,
    DryRun,
    Hint,
    Trash,
    Fire,
    LockAndKey,
    Locked,
    Unlocked,
    Exec,
}

impl fmt::Display for Icon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let icon = match self {
            Icon::Ok => "✅",
            Icon::Error => "❌",
            Icon::RedFlag => "🚩",
            Icon::Boom => "💥",
            Icon::Question => "❓",
            Icon::DryRun => "🙈",
            Icon::Hint => "💡",
            Icon::Trash => "🗑",
            Icon::Fire => "🔥",
            Icon::LockAndKey => "🔐",
            Icon::Locked => "🔒",
            Icon::Unlocked => "🔓",
            Icon::Exec => "⚡",
        };
        write!(f, "{}", icon)
    }
}

/// Styled renderings of common values
pub struct Label;

impl Label {
    pub fn folder(path: &Path) -> String {
        style(format!("{}/", path.display())).blue().bright().to_string()
    }

    /// Parent folder in blue, file name in magenta
    pub fn file(path: &Path) -> String {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => Self::folder(parent),
            _ => String::new(),
        };
        format!("{}{}", parent, style(name).magenta().bright())
    }

    pub fn command(command: &dyn fmt::Display) -> String {
        style(command.to_string()).yellow().to_string()
    }

    pub fn error(error: &dyn fmt::Display) -> String {
        style(error.to_string()).red().to_string()
    }
}

/// `file` or `files`
pub fn plural(word: &str, count: usize) -> String {
    if count > 1 {
        format!("{}s", word)
    } else {
        word.to_string()
    }
}

/// `-v` / `-q`, shared by the tools
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct Verbosity {
    /// Print more information
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Print less information
    #[arg(short, long)]
    pub quiet: bool,
}

impl Verbosity {
    /// Default log filter when `RUST_LOG` is not set
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        }
    }
}

/// Line printer honoring the verbosity
pub struct Console {
    out: Term,
    err: Term,
    verbosity: Verbosity,
}

impl Console {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            out: Term::stdout(),
            err: Term::stderr(),
            verbosity,
        }
    }

    pub fn verbose(&self) -> bool {
        self.verbosity.verbose
    }

    pub fn quiet(&self) -> bool {
        self.verbosity.quiet
    }

    /// Regular line, hidden with `-q`
    pub fn say(&self, icon: Icon, message: impl fmt::Display) {
        if !self.verbosity.quiet {
            self.out.write_line(&format!("{} {}", icon, message)).ok();
        }
    }

    /// Line without icon, hidden with `-q`
    pub fn line(&self, message: impl fmt::Display) {
        if !self.verbosity.quiet {
            self.out.write_line(&message.to_string()).ok();
        }
    }

    /// Line only shown with `-v`
    pub fn detail(&self, icon: Icon, message: impl fmt::Display) {
        if self.verbosity.verbose {
            self.out.write_line(&format!("{} {}", icon, message)).ok();
        }
    }

    /// Indented line without icon, only shown with `-v`
    pub fn detail_item(&self, message: impl fmt::Display) {
        if self.verbosity.verbose {
            self.out.write_line(&format!("  {}", message)).ok();
        }
    }

    /// Always shown, on stderr
    pub fn error(&self, icon: Icon, message: impl fmt::Display) {
        self.err.write_line(&format!("{} {}", icon, message)).ok();
    }

    /// Summary line, always shown
    pub fn total(&self, icon: Icon, message: impl fmt::Display) {
        self.out.write_line(&format!("    {} {}", icon, message)).ok();
    }

    pub fn blank(&self) {
        if !self.verbosity.quiet {
            self.out.write_line("").ok();
        }
    }

    /// Report inputs the collector left out
    pub fn skipped(&self, skipped: &[SkippedEntry]) {
        for entry in skipped {
            tracing::warn!(path = %entry.path.display(), reason = %entry.reason, "skipped");
            self.detail(
                Icon::Hint,
                format!("{} {}", Label::file(&entry.path), entry.reason),
            );
        }
    }

    /// One line per action
    pub fn outcome(&self, verb: &str, source: &Path, target: &Path, outcome: &Outcome) {
        let (source, target) = (Label::file(source), Label::file(target));
        match outcome {
            Outcome::Applied => self.say(Icon::Ok, format!("{} was {} to {}", source, verb, target)),
            Outcome::Simulated => self.say(
                Icon::DryRun,
                format!(
                    "{} would be {} to {} {}",
                    source,
                    verb,
                    target,
                    style("(dryrun)").cyan()
                ),
            ),
            Outcome::AlreadyCorrect => {
                self.detail(Icon::Ok, format!("{} is already {}", source, verb))
            }
            Outcome::Collision => self.error(
                Icon::RedFlag,
                format!(
                    "{} cannot be {} to {}: {}",
                    source,
                    verb,
                    target,
                    Label::error(&"destination already exists")
                ),
            ),
            Outcome::Failed(error) => self.error(
                Icon::Boom,
                format!("{} cannot be {} to {}: {}", source, verb, target, Label::error(error)),
            ),
        }
    }

    /// Counters of a batch, one line per non-zero category
    pub fn summary(&self, summary: &Summary, verb: &str) {
        let files = |count: usize| format!("{} {}", count, plural("file", count));
        if summary.applied > 0 {
            self.total(Icon::Ok, format!("{} {}", files(summary.applied), verb));
        }
        if summary.simulated > 0 {
            self.total(
                Icon::DryRun,
                format!("{} would be {}", files(summary.simulated), verb),
            );
        }
        if summary.already_correct > 0 {
            self.total(
                Icon::Ok,
                format!("{} already {}", files(summary.already_correct), verb),
            );
        }
        if summary.collisions > 0 {
            self.total(
                Icon::RedFlag,
                format!(
                    "{} {}",
                    summary.collisions,
                    plural("collision", summary.collisions)
                ),
            );
        }
        if summary.failed > 0 {
            self.total(
                Icon::Boom,
                format!("{} {}", summary.failed, plural("error", summary.failed)),
            );
        }
    }
}

/// Past participle used in messages
pub fn operation_verb(operation: Operation) -> &'static str {
    match operation {
        Operation::Move => "moved",
        Operation::Copy => "copied",
        Operation::Link => "linked",
    }
}

/// Spinner for a long external run
pub fn spinner(message: impl Into<String>, hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Turn a batch summary into the run result
pub fn batch_result(summary: &Summary, interrupted: bool) -> Result<ExitCode> {
    if interrupted {
        return Err(ToolError::Interrupted);
    }
    match summary.errors() {
        0 => Ok(ExitCode::SUCCESS),
        failures => Err(ToolError::BatchFailed { failures }),
    }
}

/// Print the error of a failed run and pick the exit code
pub fn exit(result: Result<ExitCode>) -> ExitCode {
    match result {
        Ok(code) => code,
        Err(error) => {
            let err = Term::stderr();
            let icon = match error {
                ToolError::Interrupted | ToolError::Config(_) => Icon::Error,
                _ => Icon::Boom,
            };
            let message = match &error {
                ToolError::Interrupted => "Process interrupted".to_string(),
                other => other.to_string(),
            };
            err.write_line(&format!("{} {}", icon, Label::error(&message))).ok();
            error.into()
        }
    }
}
