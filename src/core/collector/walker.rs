//! Directory walking implementation using walkdir.

use super::{Collection, SkipReason, SkippedEntry};
use std::collections::HashSet;
use std::fs;
use std::path::{self, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Configuration for the file collector
#[derive(Debug, Clone, Default)]
pub struct CollectConfig {
    /// Whether directories given as input are expanded
    pub recursive: bool,
}

/// Collector implementation using the walkdir crate
pub struct FileCollector {
    config: CollectConfig,
}

impl FileCollector {
    /// Create a new collector with the given configuration
    pub fn new(config: CollectConfig) -> Self {
        Self { config }
    }

    /// Collect files from the given inputs
    pub fn collect(&self, inputs: &[PathBuf]) -> Collection {
        let mut files = Vec::new();
        let mut skipped = Vec::new();

        for input in inputs {
            // fs::metadata follows symlinks: a link to a file is a file
            match fs::metadata(input) {
                Ok(metadata) if metadata.is_file() => files.push(input.clone()),
                Ok(metadata) if metadata.is_dir() => {
                    if self.config.recursive {
                        self.walk_directory(input, &mut files, &mut skipped);
                    } else {
                        skipped.push(SkippedEntry {
                            path: input.clone(),
                            reason: SkipReason::DirectoryNotRecursed,
                        });
                    }
                }
                Ok(_) => skipped.push(SkippedEntry {
                    path: input.clone(),
                    reason: SkipReason::NotAFile,
                }),
                Err(e) => skipped.push(SkippedEntry {
                    path: input.clone(),
                    reason: SkipReason::Unreadable(e.to_string()),
                }),
            }
        }

        // First spelling wins: `./a`, `a` and `$PWD/a` are one file
        let mut seen = HashSet::new();
        files.retain(|file| seen.insert(identity(file)));
        files.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
        skipped.sort_by(|a, b| a.path.as_os_str().cmp(b.path.as_os_str()));

        debug!(files = files.len(), skipped = skipped.len(), "collection done");

        Collection { files, skipped }
    }

    fn walk_directory(
        &self,
        root: &Path,
        files: &mut Vec<PathBuf>,
        skipped: &mut Vec<SkippedEntry>,
    ) {
        let walker = WalkDir::new(root).follow_links(true).min_depth(1);

        for entry_result in walker {
            match entry_result {
                Ok(entry) => {
                    let file_type = entry.file_type();
                    if file_type.is_dir() {
                        continue;
                    }
                    if file_type.is_file() {
                        files.push(entry.into_path());
                    } else {
                        skipped.push(SkippedEntry {
                            path: entry.into_path(),
                            reason: SkipReason::NotAFile,
                        });
                    }
                }
                Err(e) => {
                    let path = e.path().map(|p| p.to_path_buf()).unwrap_or_default();
                    let reason = match e.io_error() {
                        Some(io) => io.to_string(),
                        None => e.to_string(),
                    };
                    skipped.push(SkippedEntry {
                        path,
                        reason: SkipReason::Unreadable(reason),
                    });
                }
            }
        }
    }
}

/// Absolute form without `.` components, links are not resolved
fn identity(file: &Path) -> PathBuf {
    path::absolute(file).unwrap_or_else(|_| file.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn create_file(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let mut file = File::create(&path).unwrap();
        file.write_all(name.as_bytes()).unwrap();
        path
    }

    fn collector(recursive: bool) -> FileCollector {
        FileCollector::new(CollectConfig { recursive })
    }

    #[test]
    fn files_are_sorted_and_unique() {
        let temp_dir = TempDir::new().unwrap();
        let b = create_file(temp_dir.path(), "b.txt");
        let a = create_file(temp_dir.path(), "a.txt");

        let result = collector(false).collect(&[b.clone(), a.clone(), b.clone()]);

        assert_eq!(result.files, vec![a, b]);
        assert!(result.skipped.is_empty());
    }

    #[test]
    fn directory_is_skipped_without_recursion() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "sub/photo.jpg");
        let sub = temp_dir.path().join("sub");

        let result = collector(false).collect(&[sub.clone()]);

        assert!(result.files.is_empty());
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].path, sub);
        assert_eq!(result.skipped[0].reason, SkipReason::DirectoryNotRecursed);
    }

    #[test]
    fn recursion_expands_nested_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = create_file(temp_dir.path(), "root.txt");
        let nested = create_file(temp_dir.path(), "a/b/nested.txt");

        let result = collector(true).collect(&[temp_dir.path().to_path_buf()]);

        assert_eq!(result.files.len(), 2);
        assert!(result.files.contains(&root));
        assert!(result.files.contains(&nested));
        assert!(result.files.iter().all(|f| f.is_file()));
    }

    #[test]
    fn overlapping_inputs_never_yield_twice() {
        let temp_dir = TempDir::new().unwrap();
        let nested = create_file(temp_dir.path(), "sub/file.txt");

        let result = collector(true).collect(&[
            temp_dir.path().to_path_buf(),
            temp_dir.path().join("sub"),
            nested.clone(),
        ]);

        let unique: HashSet<_> = result.files.iter().collect();
        assert_eq!(unique.len(), result.files.len());
        assert_eq!(result.files, vec![nested]);
    }

    #[test]
    fn different_spellings_of_a_file_are_one_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = create_file(temp_dir.path(), "a.txt");
        let dotted = temp_dir.path().join(".").join("a.txt");

        let result = collector(false).collect(&[dotted.clone(), file.clone()]);

        assert_eq!(result.files, vec![dotted]);
        assert_eq!(identity(&file), identity(&temp_dir.path().join("./a.txt")));
    }

    #[test]
    fn relative_and_absolute_spellings_share_an_identity() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(identity(Path::new("./a")), cwd.join("a"));
        assert_eq!(identity(Path::new("a")), cwd.join("a"));
    }

    #[test]
    fn missing_path_is_reported_not_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let present = create_file(temp_dir.path(), "present.txt");
        let missing = temp_dir.path().join("missing.txt");

        let result = collector(false).collect(&[missing.clone(), present.clone()]);

        assert_eq!(result.files, vec![present]);
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].path, missing);
        assert!(matches!(result.skipped[0].reason, SkipReason::Unreadable(_)));
    }

    #[cfg(unix)]
    #[test]
    fn broken_symlink_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let link = temp_dir.path().join("dangling");
        std::os::unix::fs::symlink(temp_dir.path().join("nowhere"), &link).unwrap();

        let result = collector(true).collect(&[temp_dir.path().to_path_buf()]);

        assert!(result.files.is_empty());
        assert_eq!(result.skipped.len(), 1);
    }

    #[test]
    fn order_is_lexicographic_on_path_string() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "b/z.txt");
        create_file(temp_dir.path(), "a.txt");
        create_file(temp_dir.path(), "b.txt");

        let result = collector(true).collect(&[temp_dir.path().to_path_buf()]);

        let names: Vec<_> = result
            .files
            .iter()
            .map(|f| f.strip_prefix(temp_dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("a.txt"),
                PathBuf::from("b.txt"),
                PathBuf::from("b/z.txt")
            ]
        );
    }
}
