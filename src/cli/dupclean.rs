//! # dupclean
//!
//! Remove duplicate files found by fdupes, keeping the copies that live in
//! protected folders.
//!
//! ```bash
//! dupclean --keep ~/Pictures/sorted ~/Downloads ~/Desktop        # report
//! dupclean --keep ~/Pictures/sorted ~/Downloads ~/Desktop --rm   # delete
//! ```

use super::output::{batch_result, spinner, Console, Icon, Label, Verbosity};
use crate::core::apply::{Applier, ApplyOptions, Outcome, Summary};
use crate::core::duplicates::{find_duplicates, plan_group, GroupPlan};
use crate::core::external::catalog;
use crate::core::interrupt::{self, CancellationToken};
use crate::error::{Result, ToolError};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Delete duplicate files, keeping the ones in protected folders
#[derive(Parser, Debug)]
#[command(name = "dupclean", version, about)]
pub struct Args {
    #[command(flatten)]
    pub verbosity: Verbosity,

    /// Really delete duplicates, otherwise only report them
    #[arg(long)]
    pub rm: bool,

    /// When every copy is protected, keep only the first one
    #[arg(short = '1', long = "keep-first")]
    pub keep_first: bool,

    /// Protected folder, also scanned (repeatable)
    #[arg(short, long = "keep", value_name = "DIR")]
    pub keep: Vec<PathBuf>,

    /// Folders to scan
    #[arg(value_name = "DIR")]
    pub folders: Vec<PathBuf>,
}

/// Deletions of one batch of groups
pub fn clean(
    console: &Console,
    applier: &mut Applier,
    groups: &[Vec<PathBuf>],
    keep: &[PathBuf],
    keep_first: bool,
    cancel: &CancellationToken,
) -> Summary {
    let mut summary = Summary::default();
    for group in groups {
        if cancel.is_cancelled() {
            break;
        }
        match plan_group(group, keep, keep_first) {
            GroupPlan::Unprotected { files } => {
                console.detail(Icon::Fire, "No protected copy, nothing deleted:");
                files.iter().for_each(|f| console.detail_item(Label::file(f)));
            }
            GroupPlan::AllKept { files } => {
                console.detail(Icon::Locked, "Every copy is protected, nothing deleted:");
                files.iter().for_each(|f| console.detail_item(Label::file(f)));
            }
            GroupPlan::Delete {
                original,
                duplicates,
            } => {
                for duplicate in &duplicates {
                    let outcome = applier.delete(duplicate);
                    report_deletion(console, duplicate, &original, &outcome);
                    summary.record(&outcome);
                }
            }
        }
    }
    summary
}

fn report_deletion(console: &Console, duplicate: &Path, original: &Path, outcome: &Outcome) {
    let (duplicate, original) = (Label::file(duplicate), Label::file(original));
    match outcome {
        Outcome::Applied => console.say(
            Icon::Trash,
            format!("Delete {} duplicate of {}", duplicate, original),
        ),
        Outcome::Simulated => console.say(
            Icon::DryRun,
            format!("{} would be deleted, duplicate of {}", duplicate, original),
        ),
        Outcome::Failed(error) => console.error(
            Icon::Boom,
            format!("Cannot delete {}: {}", duplicate, Label::error(error)),
        ),
        Outcome::AlreadyCorrect | Outcome::Collision => {}
    }
}

pub fn run(args: Args) -> Result<ExitCode> {
    let console = Console::new(args.verbosity);
    let cancel = CancellationToken::new();
    interrupt::install(&cancel)?;

    let scanned: Vec<PathBuf> = args.folders.iter().chain(&args.keep).cloned().collect();
    if scanned.is_empty() {
        return Err(ToolError::Config("No folder to scan".to_string()));
    }

    let fdupes = catalog::fdupes();
    fdupes.resolve()?;

    let progress = spinner("Looking for duplicates", console.quiet());
    let groups = find_duplicates(&fdupes, &scanned, console.quiet());
    progress.finish_and_clear();
    let groups = groups?;
    console.detail(
        Icon::Hint,
        format!("{} duplicate {}", groups.len(), super::output::plural("group", groups.len())),
    );

    let mut applier = Applier::new(ApplyOptions {
        dry_run: !args.rm,
        ..Default::default()
    });
    let summary = clean(&console, &mut applier, &groups, &args.keep, args.keep_first, &cancel);

    console.blank();
    console.summary(&summary, "deleted");
    if !args.rm && summary.simulated > 0 {
        console.total(Icon::Hint, "use --rm to delete them");
    }
    batch_result(&summary, cancel.is_cancelled())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use clap::CommandFactory;
    use predicates::prelude::*;

    fn quiet_console() -> Console {
        Console::new(Verbosity {
            verbose: false,
            quiet: true,
        })
    }

    #[test]
    fn command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn keep_is_repeatable() {
        let args = Args::try_parse_from(["dupclean", "-k", "a", "--keep", "b", "-1", "c"]).unwrap();
        assert_eq!(args.keep, [PathBuf::from("a"), PathBuf::from("b")]);
        assert_eq!(args.folders, [PathBuf::from("c")]);
        assert!(args.keep_first);
        assert!(!args.rm);
    }

    #[test]
    fn nothing_to_scan_is_a_config_error() {
        let args = Args::try_parse_from(["dupclean", "-q"]).unwrap();
        assert!(matches!(run(args), Err(ToolError::Config(_))));
    }

    #[test]
    fn only_unprotected_copies_are_deleted() {
        let temp = assert_fs::TempDir::new().unwrap();
        for name in ["keep/a.jpg", "inbox/a.jpg", "inbox/b.jpg", "inbox/c.jpg"] {
            temp.child(name).write_str("same").unwrap();
        }
        let path = |name: &str| temp.child(name).to_path_buf();
        let groups = vec![
            vec![path("inbox/a.jpg"), path("keep/a.jpg")],
            vec![path("inbox/b.jpg"), path("inbox/c.jpg")],
        ];

        let mut applier = Applier::new(ApplyOptions::default());
        let summary = clean(
            &quiet_console(),
            &mut applier,
            &groups,
            &[path("keep")],
            false,
            &CancellationToken::new(),
        );

        assert_eq!(summary.applied, 1);
        temp.child("inbox/a.jpg").assert(predicate::path::missing());
        temp.child("keep/a.jpg").assert(predicate::path::exists());
        temp.child("inbox/b.jpg").assert(predicate::path::exists());
        temp.child("inbox/c.jpg").assert(predicate::path::exists());
    }

    #[test]
    fn report_mode_touches_nothing() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("keep/a").write_str("same").unwrap();
        temp.child("tmp/a").write_str("same").unwrap();
        let groups = vec![vec![temp.child("keep/a").to_path_buf(), temp.child("tmp/a").to_path_buf()]];

        let mut applier = Applier::new(ApplyOptions {
            dry_run: true,
            ..Default::default()
        });
        let summary = clean(
            &quiet_console(),
            &mut applier,
            &groups,
            &[temp.child("keep").to_path_buf()],
            false,
            &CancellationToken::new(),
        );

        assert_eq!(summary.simulated, 1);
        temp.child("tmp/a").assert(predicate::path::exists());
    }
}
