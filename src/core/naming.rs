//! Target file names derived from fingerprints and dates.

use chrono::NaiveDateTime;
use std::path::Path;

/// Options applied around a fingerprint
#[derive(Debug, Clone, Default)]
pub struct NameOptions {
    /// Keep only the first N characters, 0 keeps everything
    pub length: usize,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    /// Extension with its leading dot
    pub extension: Option<String>,
}

/// `prefix + fingerprint[..length] + suffix + extension`
pub fn compute_filename(fingerprint: &str, options: &NameOptions) -> String {
    let truncated = if options.length == 0 {
        fingerprint
    } else {
        // Hex digests are ASCII, char boundaries are byte boundaries
        &fingerprint[..options.length.min(fingerprint.len())]
    };
    format!(
        "{}{}{}{}",
        options.prefix.as_deref().unwrap_or_default(),
        truncated,
        options.suffix.as_deref().unwrap_or_default(),
        options.extension.as_deref().unwrap_or_default(),
    )
}

/// Reject name parts that would create directories
pub fn validate_name_part(text: &str) -> Result<String, String> {
    if text.contains('/') {
        Err(format!("Path delimiter '/' cannot be used in '{}'", text))
    } else {
        Ok(text.to_string())
    }
}

/// `2023-07-04_10h20m30s_`
pub fn date_prefix(date: &NaiveDateTime) -> String {
    date.format("%Y-%m-%d_%Hh%Mm%Ss_").to_string()
}

/// Current extension with its dot, as is
pub fn current_extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
}

/// Current extension with its dot, lowercased, empty when there is none
pub fn lowercase_extension(path: &Path) -> String {
    current_extension(path)
        .map(|ext| ext.to_lowercase())
        .unwrap_or_default()
}
