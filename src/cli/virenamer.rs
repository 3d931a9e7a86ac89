//! # virenamer
//!
//! Bulk rename files by editing their paths in a text editor. Each line of
//! the buffer is the new path of the file on the same line; an empty line
//! deletes the file.

use super::output::{batch_result, Console, Icon, Label, Verbosity};
use crate::core::apply::{Applier, ApplyOptions, Operation, Outcome, Summary};
use crate::core::external::ExternalTool;
use crate::error::{Result, ToolError};
use clap::Parser;
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

/// Rename files using a text editor
#[derive(Parser, Debug)]
#[command(name = "virenamer", version, about)]
pub struct Args {
    #[command(flatten)]
    pub verbosity: Verbosity,

    /// Editor used to edit the file list
    #[arg(short, long, env = "EDITOR", default_value = "vim")]
    pub editor: String,

    /// Overwrite if target file already exists
    #[arg(short, long)]
    pub force: bool,

    /// Delete file if line is empty
    #[arg(short, long)]
    pub delete: bool,

    /// Dry-run mode, don't rename any file
    #[arg(short = 'n', long = "dryrun")]
    pub dry_run: bool,

    /// Files to rename
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

/// Existing inputs, first occurrence kept
pub fn existing_inputs(files: &[PathBuf]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    files
        .iter()
        .filter(|file| file.symlink_metadata().is_ok())
        .filter(|file| seen.insert(file.as_path()))
        .cloned()
        .collect()
}

/// Edited buffer back to targets, `None` for empty lines
pub fn parse_targets(content: &str) -> Vec<Option<PathBuf>> {
    content
        .lines()
        .map(|line| (!line.trim().is_empty()).then(|| PathBuf::from(line)))
        .collect()
}

/// Apply the edited list, the line count must not change
pub fn bulk_rename(
    console: &Console,
    applier: &mut Applier,
    sources: &[PathBuf],
    targets: &[Option<PathBuf>],
    delete: bool,
) -> Result<Summary> {
    if sources.len() != targets.len() {
        return Err(ToolError::Invariant(format!(
            "file count has changed ({} before, {} after), cannot rename any file",
            sources.len(),
            targets.len()
        )));
    }

    let mut summary = Summary::default();
    for (source, target) in sources.iter().zip(targets) {
        match target {
            None if !delete => {
                console.error(
                    Icon::RedFlag,
                    format!(
                        "{} won't be deleted, use --delete to enable file deletion",
                        Label::file(source)
                    ),
                );
            }
            None => {
                let outcome = applier.delete(source);
                match &outcome {
                    Outcome::Applied => console.say(Icon::Trash, format!("Delete {}", Label::file(source))),
                    Outcome::Simulated => {
                        console.say(Icon::DryRun, format!("Delete {} (dryrun)", Label::file(source)))
                    }
                    Outcome::Failed(error) => console.error(
                        Icon::Boom,
                        format!("Cannot delete {}: {}", Label::file(source), Label::error(error)),
                    ),
                    _ => {}
                }
                summary.record(&outcome);
            }
            Some(target) => {
                let outcome = applier.apply(source, target, Operation::Move);
                console.outcome("renamed", source, target, &outcome);
                summary.record(&outcome);
            }
        }
    }
    Ok(summary)
}

pub fn run(args: Args) -> Result<ExitCode> {
    let editor = ExternalTool::new(&args.editor);
    rename_with(&editor, &args)
}

/// Edit the list of `args.files` with `editor` and apply the result
pub fn rename_with(editor: &ExternalTool, args: &Args) -> Result<ExitCode> {
    let console = Console::new(args.verbosity);
    let sources = existing_inputs(&args.files);
    if sources.is_empty() {
        return Err(ToolError::Config("No valid file to rename".to_string()));
    }

    let mut buffer = tempfile::Builder::new()
        .prefix("virenamer-")
        .suffix(".txt")
        .tempfile()
        .map_err(|e| ToolError::io(std::env::temp_dir(), e))?;
    for source in &sources {
        writeln!(buffer, "{}", source.display()).map_err(|e| ToolError::io(buffer.path(), e))?;
    }
    buffer
        .flush()
        .map_err(|e| ToolError::io(buffer.path(), e))?;

    editor.command([buffer.path()])?.stream_checked()?;

    let content = fs::read_to_string(buffer.path()).map_err(|e| ToolError::io(buffer.path(), e))?;
    let targets = parse_targets(&content);

    let mut applier = Applier::new(ApplyOptions {
        dry_run: args.dry_run,
        force: args.force,
        backup: false,
    });
    let summary = bulk_rename(&console, &mut applier, &sources, &targets, args.delete)?;

    console.summary(&summary, "renamed");
    batch_result(&summary, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use predicates::prelude::*;

    fn quiet_console() -> Console {
        Console::new(Verbosity {
            verbose: false,
            quiet: true,
        })
    }

    #[test]
    fn inputs_are_deduplicated_and_must_exist() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("a").touch().unwrap();
        let a = temp.child("a").to_path_buf();
        let missing = temp.child("missing").to_path_buf();

        let inputs = existing_inputs(&[a.clone(), missing, a.clone()]);

        assert_eq!(inputs, vec![a]);
    }

    #[test]
    fn empty_lines_mean_delete() {
        let targets = parse_targets("x\n\n  \ny\n");
        assert_eq!(
            targets,
            vec![Some(PathBuf::from("x")), None, None, Some(PathBuf::from("y"))]
        );
    }

    #[test]
    fn line_count_must_not_change() {
        let mut applier = Applier::new(ApplyOptions::default());
        let result = bulk_rename(
            &quiet_console(),
            &mut applier,
            &[PathBuf::from("a"), PathBuf::from("b")],
            &[Some(PathBuf::from("c"))],
            false,
        );
        assert!(matches!(result, Err(ToolError::Invariant(_))));
    }

    #[test]
    fn rename_delete_and_collision() {
        let temp = assert_fs::TempDir::new().unwrap();
        for name in ["a", "b", "c", "taken"] {
            temp.child(name).touch().unwrap();
        }
        let path = |name: &str| temp.child(name).to_path_buf();

        let mut applier = Applier::new(ApplyOptions::default());
        let summary = bulk_rename(
            &quiet_console(),
            &mut applier,
            &[path("a"), path("b"), path("c")],
            &[Some(path("renamed")), None, Some(path("taken"))],
            true,
        )
        .unwrap();

        assert_eq!(summary.applied, 2);
        assert_eq!(summary.collisions, 1);
        temp.child("renamed").assert(predicate::path::exists());
        temp.child("a").assert(predicate::path::missing());
        temp.child("b").assert(predicate::path::missing());
        temp.child("c").assert(predicate::path::exists());
    }

    #[test]
    fn deletion_requires_the_flag() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("a").touch().unwrap();

        let mut applier = Applier::new(ApplyOptions::default());
        let summary = bulk_rename(
            &quiet_console(),
            &mut applier,
            &[temp.child("a").to_path_buf()],
            &[None],
            false,
        )
        .unwrap();

        assert_eq!(summary.total(), 0);
        temp.child("a").assert(predicate::path::exists());
    }

    #[cfg(unix)]
    #[test]
    fn editor_round_trip() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("old.txt").write_str("content").unwrap();

        // An "editor" that rewrites the buffer in place, run through sh
        let script = temp.child("editor.sh");
        script
            .write_str("sed -i 's/old.txt/new.txt/' \"$1\"\n")
            .unwrap();
        let editor = ExternalTool::new("sh").common_args([script.path()]);

        let args = Args::try_parse_from([
            "virenamer".to_string(),
            "-q".to_string(),
            temp.child("old.txt").path().display().to_string(),
        ])
        .unwrap();

        rename_with(&editor, &args).unwrap();

        temp.child("new.txt").assert("content");
        temp.child("old.txt").assert(predicate::path::missing());
    }
}
