//! # batxaran
//!
//! Run a command for every line of a file, remembering what was done.
//!
//! ```bash
//! batxaran --done seen.txt --sleep 5 -x 'mpv "{}"' playlist.txt
//! ```

use super::output::{plural, Console, Icon, Label, Verbosity};
use super::prompt::{Answer, Prompt};
use crate::core::donelist::{filter_comments, DoneList};
use crate::core::external::ToolCommand;
use crate::core::interrupt::{self, CancellationToken};
use crate::error::{Result, ToolError};
use clap::Parser;
use console::style;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

pub const DEFAULT_COMMAND: &str = r#"xdg-open "{}""#;

const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Execute a command for each line of a file
#[derive(Parser, Debug)]
#[command(name = "batxaran", version, about)]
pub struct Args {
    #[command(flatten)]
    pub verbosity: Verbosity,

    /// Do not ask confirmation before executing the command
    #[arg(short, long)]
    pub yes: bool,

    /// Read the file line by line, useful with a fifo
    #[arg(short, long)]
    pub follow: bool,

    /// Command to execute, {} is replaced by the item
    #[arg(short = 'x', long = "execute", value_name = "COMMAND", default_value = DEFAULT_COMMAND)]
    pub command: String,

    /// File containing items already processed
    #[arg(long = "done", value_name = "FILE")]
    pub done_file: Option<PathBuf>,

    /// Delay between commands
    #[arg(long = "sleep", value_name = "SECONDS", default_value_t = 0)]
    pub delay: u64,

    /// Skip N first items
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub skip: usize,

    /// Retry N times in case of error
    #[arg(long, value_name = "N", default_value_t = 3)]
    pub retry: u32,

    /// File containing the items
    #[arg(value_name = "FILE")]
    pub items: PathBuf,
}

/// `{}` replaced by the item
pub fn render(template: &str, item: &str) -> String {
    template.replace("{}", item)
}

/// Counters of a run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub executed: usize,
    pub skipped: usize,
    pub ignored: usize,
    pub failed: usize,
}

/// How each item is handled
pub struct Batch<'a> {
    pub console: &'a Console,
    /// Only needed to ask, absent with `--yes` and no delay
    pub prompt: Option<&'a Prompt>,
    pub cancel: &'a CancellationToken,
    pub template: &'a str,
    pub interactive: bool,
    pub delay: Option<Duration>,
    pub skip: usize,
    pub retry: u32,
}

impl Batch<'_> {
    /// Process `items`, `total` is known unless following a stream
    pub fn process(
        &mut self,
        items: impl Iterator<Item = String>,
        total: Option<usize>,
        done: &mut DoneList,
    ) -> Result<Progress> {
        let mut progress = Progress::default();
        for (index, item) in items.enumerate() {
            if self.cancel.is_cancelled() {
                break;
            }
            let count = index + 1;
            let prefix = match total {
                Some(total) => format!("[{}/{}]", count, total),
                None => format!("[{}]", count),
            };
            let command = render(self.template, &item);

            if self.skip > 0 {
                self.skip -= 1;
                progress.skipped += 1;
                self.console
                    .line(format!("{} {} {}", prefix, style("SKIP").cyan(), command));
                continue;
            }
            if done.contains(&item) {
                progress.ignored += 1;
                self.console
                    .line(format!("{} {} {}", prefix, style("IGNORE").cyan(), command));
                continue;
            }

            // No delay before the very first item
            let delay = self.delay.filter(|_| count > 1);
            if !self.transition(&prefix, &command, delay)? {
                break;
            }
            if self.execute(&command) {
                progress.executed += 1;
                done.insert(item);
            } else {
                progress.failed += 1;
            }
        }
        Ok(progress)
    }

    /// Wait before running `command`, false when interrupted
    fn transition(&self, prefix: &str, command: &str, delay: Option<Duration>) -> Result<bool> {
        let command_label = Label::command(&command);
        let answer = match delay {
            Some(delay) => {
                let question = format!(
                    "{} Press ENTER or wait {} seconds to execute: {} ",
                    prefix,
                    delay.as_secs(),
                    command_label
                );
                match self.ask(&question, Some(delay)) {
                    Answer::TimedOut => {
                        println!();
                        Answer::TimedOut
                    }
                    // Nothing to read, still honor the delay
                    Answer::Closed => {
                        thread::sleep(delay);
                        println!();
                        Answer::TimedOut
                    }
                    other => other,
                }
            }
            None if self.interactive => {
                let question = format!("{} Press ENTER to execute: {} ", prefix, command_label);
                self.ask(&question, None)
            }
            None => {
                self.console
                    .line(format!("{} Execute: {}", prefix, command_label));
                return Ok(true);
            }
        };
        match answer {
            Answer::Line(_) | Answer::TimedOut => Ok(true),
            Answer::Cancelled => Ok(false),
            Answer::Closed => Err(ToolError::Config(
                "stdin is closed, use --yes to run without confirmation".to_string(),
            )),
        }
    }

    fn ask(&self, question: &str, timeout: Option<Duration>) -> Answer {
        match self.prompt {
            Some(prompt) => prompt.ask_within(question, timeout, self.cancel),
            None => Answer::Closed,
        }
    }

    /// Run through `sh -c`, retrying on failure
    fn execute(&self, command: &str) -> bool {
        let shell = ToolCommand::shell(command);
        for attempt in 0..=self.retry {
            if attempt > 0 {
                if self.cancel.is_cancelled() {
                    return false;
                }
                thread::sleep(RETRY_DELAY);
            }
            if shell.succeeded() {
                self.console
                    .line(format!("{} {}", style("OK").green(), Label::command(&command)));
                return true;
            }
            self.console
                .error(Icon::Boom, format!("{} {}", style("ERROR").red(), Label::command(&command)));
        }
        false
    }
}

fn item(line: &str) -> Option<String> {
    filter_comments([line]).next().map(str::to_string)
}

pub fn run(args: Args) -> Result<ExitCode> {
    let console = Console::new(args.verbosity);
    let cancel = CancellationToken::new();
    interrupt::install(&cancel)?;

    let mut done = match &args.done_file {
        Some(path) => {
            let list = DoneList::load(path)?;
            if !list.is_empty() {
                console.line(format!(
                    "Load {} {} from {}",
                    list.len(),
                    plural("item", list.len()),
                    Label::file(path)
                ));
            }
            list
        }
        None => DoneList::in_memory(),
    };

    if !args.items.exists() {
        return Err(ToolError::Config(format!(
            "Cannot find file {}",
            args.items.display()
        )));
    }
    let file = File::open(&args.items).map_err(|e| ToolError::io(&args.items, e))?;
    let lines = BufReader::new(file).lines().map_while(std::result::Result::ok);
    let (items, total): (Box<dyn Iterator<Item = String>>, Option<usize>) = if args.follow {
        (Box::new(lines.filter_map(|line| item(&line))), None)
    } else {
        let items: Vec<String> = lines.filter_map(|line| item(&line)).collect();
        let total = items.len();
        (Box::new(items.into_iter()), Some(total))
    };

    let interactive = !args.yes;
    let delay = (args.delay > 0).then(|| Duration::from_secs(args.delay));
    let prompt = (interactive || delay.is_some()).then(Prompt::stdin);
    let mut batch = Batch {
        console: &console,
        prompt: prompt.as_ref(),
        cancel: &cancel,
        template: &args.command,
        interactive,
        delay,
        skip: args.skip,
        retry: args.retry,
    };
    let result = batch.process(items, total, &mut done);

    // Saved whatever happened, interrupts included
    if !done.is_empty() {
        if let Some(path) = done.path() {
            let saved = done.save()?;
            console.line(format!(
                "Save {} {} in {}",
                saved,
                plural("item", saved),
                Label::file(path)
            ));
        }
    }

    let progress = result?;
    if cancel.is_cancelled() {
        return Err(ToolError::Interrupted);
    }
    match progress.failed {
        0 => Ok(ExitCode::SUCCESS),
        failures => Err(ToolError::BatchFailed { failures }),
    }
}
