//! File type detection through `file(1)`.

use crate::core::external::ExternalTool;
use crate::error::Result;
use std::path::Path;

/// MIME type such as `video/mp4`
pub fn mime_type(file_tool: &ExternalTool, path: &Path) -> Result<String> {
    let out = file_tool
        .command([std::ffi::OsStr::new("--mime-type"), path.as_os_str()])?
        .output()?;
    Ok(out.trim().to_string())
}

/// Extension guessed from the content, with its leading dot
pub fn guess_extension(file_tool: &ExternalTool, path: &Path) -> Result<Option<String>> {
    let out = file_tool
        .command([std::ffi::OsStr::new("--extension"), path.as_os_str()])?
        .output()?;
    Ok(pick_extension(&out))
}

/// `file --extension` prints candidates separated by `/`, `???` when unknown
pub fn pick_extension(output: &str) -> Option<String> {
    let candidates: Vec<&str> = output
        .trim()
        .split('/')
        .map(str::trim)
        .filter(|ext| !ext.is_empty() && *ext != "???")
        .collect();
    if candidates.contains(&"jpg") {
        return Some(".jpg".to_string());
    }
    candidates.first().map(|ext| format!(".{}", ext))
}
