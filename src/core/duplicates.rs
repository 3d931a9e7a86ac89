//! Duplicate groups found by fdupes, and what to delete in each of them.

use crate::core::external::ExternalTool;
use crate::error::{Result, ToolError};
use std::path::{Path, PathBuf};

/// Parse fdupes output: one file per line, groups separated by a blank line.
///
/// Each group is sorted. A group with a single file means the output is not
/// what we expect and nothing should be deleted from it.
pub fn parse_fdupes(stdout: &str) -> Result<Vec<Vec<PathBuf>>> {
    let mut groups = Vec::new();
    let mut current: Vec<PathBuf> = Vec::new();

    let mut close = |current: &mut Vec<PathBuf>| -> Result<()> {
        if current.len() < 2 {
            return Err(ToolError::Invariant(format!(
                "fdupes group with {} file(s): {:?}",
                current.len(),
                current
            )));
        }
        let mut group = std::mem::take(current);
        group.sort();
        groups.push(group);
        Ok(())
    };

    for line in stdout.lines() {
        if line.is_empty() {
            close(&mut current)?;
        } else {
            current.push(PathBuf::from(line));
        }
    }
    // Last group may miss its trailing blank line
    if !current.is_empty() {
        close(&mut current)?;
    }
    Ok(groups)
}

/// Run fdupes on `folders`; stderr is shown unless `quiet`
pub fn find_duplicates(
    fdupes: &ExternalTool,
    folders: &[PathBuf],
    quiet: bool,
) -> Result<Vec<Vec<PathBuf>>> {
    let command = fdupes
        .command(folders)?
        .args_if(quiet, ["--quiet"]);
    let stdout = if quiet {
        command.output()?
    } else {
        command.output_inherit_stderr()?
    };
    parse_fdupes(&stdout)
}

/// Decision for one duplicate group
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupPlan {
    /// No copy lives in a keep folder, nothing is touched
    Unprotected { files: Vec<PathBuf> },
    /// Every copy lives in a keep folder, nothing is touched
    AllKept { files: Vec<PathBuf> },
    /// Delete `duplicates`, `original` stays
    Delete {
        original: PathBuf,
        duplicates: Vec<PathBuf>,
    },
}

pub fn is_in_folder(file: &Path, folders: &[PathBuf]) -> bool {
    folders.iter().any(|folder| file.starts_with(folder))
}

/// Plan a sorted group against the keep folders.
///
/// With `keep_first`, a group entirely inside keep folders keeps only its
/// first file in lexicographic order.
pub fn plan_group(group: &[PathBuf], keep_folders: &[PathBuf], keep_first: bool) -> GroupPlan {
    let (kept, others): (Vec<PathBuf>, Vec<PathBuf>) = group
        .iter()
        .cloned()
        .partition(|file| is_in_folder(file, keep_folders));

    match (kept.split_first(), others.is_empty()) {
        (None, _) => GroupPlan::Unprotected { files: others },
        (Some((first, rest)), true) if keep_first && !rest.is_empty() => GroupPlan::Delete {
            original: first.clone(),
            duplicates: rest.to_vec(),
        },
        (Some(_), true) => GroupPlan::AllKept { files: kept },
        (Some((first, _)), false) => GroupPlan::Delete {
            original: first.clone(),
            duplicates: others,
        },
    }
}
