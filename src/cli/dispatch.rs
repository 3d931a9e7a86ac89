//! # dispatch
//!
//! Move, copy or link files into the subfolder whose name is the longest
//! prefix of the file name.

use super::output::{batch_result, operation_verb, Console, Icon, Label, Verbosity};
use crate::core::apply::{Applier, ApplyOptions, Operation, Summary};
use crate::core::collector::{CollectConfig, FileCollector};
use crate::core::interrupt::{self, CancellationToken};
use crate::error::{Result, ToolError};
use clap::{ArgGroup, Parser};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Dispatch files in subfolders matching their name
#[derive(Parser, Debug)]
#[command(name = "dispatch", version, about)]
#[command(group(ArgGroup::new("operation").args(["move_files", "copy", "link"])))]
pub struct Args {
    #[command(flatten)]
    pub verbosity: Verbosity,

    /// Dry-run mode, do not change anything
    #[arg(short = 'n', long = "dryrun")]
    pub dry_run: bool,

    /// Dispatch files in given folder, default is the current directory
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Move files (default)
    #[arg(short = 'm', long = "move")]
    pub move_files: bool,

    /// Copy files instead of moving them
    #[arg(short, long)]
    pub copy: bool,

    /// Do symbolic links instead of moving files
    #[arg(short, long)]
    pub link: bool,

    /// Files to move/copy/link
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,
}

impl Args {
    pub fn operation(&self) -> Operation {
        if self.copy {
            Operation::Copy
        } else if self.link {
            Operation::Link
        } else {
            Operation::Move
        }
    }
}

/// Subfolders of `folder`
pub fn subfolders(folder: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(folder).map_err(|e| ToolError::io(folder, e))? {
        let path = entry.map_err(|e| ToolError::io(folder, e))?.path();
        if path.is_dir() {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}

/// Subfolder with the longest name that prefixes the file name
pub fn find_destination<'a>(file: &Path, folders: &'a [PathBuf]) -> Option<&'a PathBuf> {
    let name = file.file_name()?.to_string_lossy();
    folders
        .iter()
        .filter_map(|folder| {
            let folder_name = folder.file_name()?.to_string_lossy();
            name.starts_with(folder_name.as_ref())
                .then_some((folder_name.len(), folder))
        })
        .max_by_key(|(len, _)| *len)
        .map(|(_, folder)| folder)
}

pub fn run(args: Args) -> Result<ExitCode> {
    let console = Console::new(args.verbosity);
    let cancel = CancellationToken::new();
    interrupt::install(&cancel)?;

    let output = match &args.output {
        Some(output) => output.clone(),
        None => env::current_dir().map_err(|e| ToolError::io(".", e))?,
    };
    let folders = subfolders(&output)?;
    let operation = args.operation();
    let verb = operation_verb(operation);

    let collection = FileCollector::new(CollectConfig { recursive: false }).collect(&args.files);
    console.skipped(&collection.skipped);

    let mut applier = Applier::new(ApplyOptions {
        dry_run: args.dry_run,
        ..Default::default()
    });
    let mut summary = Summary::default();
    let mut without_folder = 0;

    for source in &collection.files {
        if cancel.is_cancelled() {
            break;
        }
        let Some(folder) = find_destination(source, &folders) else {
            without_folder += 1;
            console.say(
                Icon::Question,
                format!("no subfolder for {} in {}", Label::file(source), Label::folder(&output)),
            );
            continue;
        };
        let Some(name) = source.file_name() else {
            continue;
        };
        let target = folder.join(name);
        let outcome = applier.apply(source, &target, operation);
        console.outcome(verb, source, &target, &outcome);
        summary.record(&outcome);
    }

    console.blank();
    console.summary(&summary, verb);
    if without_folder > 0 {
        console.total(
            Icon::Question,
            format!(
                "{} {} without subfolder",
                without_folder,
                super::output::plural("file", without_folder)
            ),
        );
    }
    batch_result(&summary, cancel.is_cancelled())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use clap::CommandFactory;
    use predicates::prelude::*;

    #[test]
    fn command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn operations_are_exclusive() {
        assert!(Args::try_parse_from(["dispatch", "-c", "-l", "f"]).is_err());
        let args = Args::try_parse_from(["dispatch", "-l", "f"]).unwrap();
        assert_eq!(args.operation(), Operation::Link);
        let args = Args::try_parse_from(["dispatch", "f"]).unwrap();
        assert_eq!(args.operation(), Operation::Move);
    }

    #[test]
    fn longest_prefix_wins() {
        let folders = vec![
            PathBuf::from("out/photo"),
            PathBuf::from("out/photo-2023"),
            PathBuf::from("out/video"),
        ];

        let found = find_destination(Path::new("in/photo-2023-01.jpg"), &folders);
        assert_eq!(found, Some(&PathBuf::from("out/photo-2023")));

        let found = find_destination(Path::new("in/photo-1999.jpg"), &folders);
        assert_eq!(found, Some(&PathBuf::from("out/photo")));

        assert_eq!(find_destination(Path::new("in/music.mp3"), &folders), None);
    }

    #[test]
    fn files_are_dispatched() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("out/invoice").create_dir_all().unwrap();
        temp.child("in/invoice-42.pdf").write_str("pdf").unwrap();
        temp.child("in/random.txt").write_str("txt").unwrap();

        let args = Args::try_parse_from([
            "dispatch".to_string(),
            "-q".to_string(),
            "-c".to_string(),
            "-o".to_string(),
            temp.child("out").path().display().to_string(),
            temp.child("in/invoice-42.pdf").path().display().to_string(),
            temp.child("in/random.txt").path().display().to_string(),
        ])
        .unwrap();

        run(args).unwrap();

        temp.child("out/invoice/invoice-42.pdf").assert("pdf");
        temp.child("in/invoice-42.pdf").assert(predicate::path::exists());
        temp.child("out/random.txt").assert(predicate::path::missing());
    }
}
