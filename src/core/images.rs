//! Image resizing applied to extracted frames.

use crate::error::{MediaError, Result};
use image::imageops::FilterType;
use std::path::Path;

/// `W` (square) or `WxH`, both strictly positive
pub fn parse_resolution(value: &str) -> std::result::Result<(u32, u32), MediaError> {
    let invalid = || MediaError::InvalidResolution(value.to_string());
    let (width, height) = match value.split_once('x') {
        Some((width, height)) => (width, Some(height)),
        None => (value, None),
    };
    let parse = |text: &str| -> std::result::Result<u32, MediaError> {
        if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        match text.parse::<u32>() {
            Ok(0) | Err(_) => Err(invalid()),
            Ok(n) => Ok(n),
        }
    };
    let width = parse(width)?;
    let height = height.map(parse).transpose()?.unwrap_or(width);
    Ok((width, height))
}

/// A transformation applied to an image file in place
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFilter {
    /// Fit within the box, keeping the aspect ratio
    Resize { width: u32, height: u32 },
    /// Scale then crop to exactly fill the box
    CropFill { width: u32, height: u32 },
}

impl ImageFilter {
    pub fn apply(&self, image: &image::DynamicImage) -> image::DynamicImage {
        match *self {
            ImageFilter::Resize { width, height } => image.thumbnail(width, height),
            ImageFilter::CropFill { width, height } => {
                image.resize_to_fill(width, height, FilterType::Lanczos3)
            }
        }
    }

    /// Load, transform and overwrite `path`
    pub fn apply_to_file(&self, path: &Path) -> Result<()> {
        let failure = |e: image::ImageError| MediaError::Image {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };
        let image = image::open(path).map_err(failure)?;
        self.apply(&image).save(path).map_err(failure)?;
        Ok(())
    }
}
