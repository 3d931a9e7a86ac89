//! Persisted list of already processed items.
//!
//! One item per line; blank lines and lines starting with `#` are ignored on
//! load. The file is rewritten as a whole when saved.

use crate::error::{Result, ToolError};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Ordered, de-duplicated set of processed items
#[derive(Debug, Default)]
pub struct DoneList {
    path: Option<PathBuf>,
    items: Vec<String>,
    index: HashSet<String>,
}

impl DoneList {
    /// An in-memory list that is never saved
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the list backed by `path`, empty when the file does not exist
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut list = Self {
            path: Some(path.clone()),
            ..Default::default()
        };
        if path.is_file() {
            let content = fs::read_to_string(&path).map_err(|e| ToolError::io(&path, e))?;
            for item in filter_comments(content.lines()) {
                list.insert(item);
            }
        }
        Ok(list)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn contains(&self, item: &str) -> bool {
        self.index.contains(item)
    }

    /// Add an item, returns false if it was already there
    pub fn insert(&mut self, item: impl Into<String>) -> bool {
        let item = item.into();
        if self.index.contains(&item) {
            return false;
        }
        self.index.insert(item.clone());
        self.items.push(item);
        true
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Rewrite the backing file; returns the number of saved items
    pub fn save(&self) -> Result<usize> {
        let Some(path) = &self.path else {
            return Ok(0);
        };
        fs::write(path, self.items.join("\n")).map_err(|e| ToolError::io(path, e))?;
        Ok(self.items.len())
    }
}

/// Trimmed lines without blanks and `#` comments
pub fn filter_comments<'a, I>(lines: I) -> impl Iterator<Item = &'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    lines
        .into_iter()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}
