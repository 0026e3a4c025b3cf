//! Thumbnail derivation for rendered snapshot images

use crate::error::{MetadataError, Result};
use image::{imageops::FilterType, ImageFormat};
use std::path::Path;
use tracing::debug;

/// Dimensions of `(width, height)` scaled to fit inside `max` x `max`.
///
/// Aspect ratio is preserved and images that already fit are left as is.
/// Neither side is reduced below one pixel.
pub fn bounded_dimensions(width: u32, height: u32, max: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max || longest == 0 {
        return (width, height);
    }

    let scale = |side: u32| -> u32 {
        let scaled = (u64::from(side) * u64::from(max)) / u64::from(longest);
        (scaled as u32).max(1)
    };
    (scale(width), scale(height))
}

/// Write a PNG thumbnail of `source` to `destination`.
///
/// Blocking; run it on a blocking thread from async code. Returns the
/// thumbnail dimensions.
pub fn write_thumbnail(source: &Path, destination: &Path, max_dimension: u32) -> Result<(u32, u32)> {
    let img = image::open(source).map_err(|e| {
        MetadataError::ImageError(format!("Failed to open {}: {}", source.display(), e))
    })?;

    let (width, height) = bounded_dimensions(img.width(), img.height(), max_dimension);
    let thumbnail = if (width, height) == (img.width(), img.height()) {
        img
    } else {
        img.resize_exact(width, height, FilterType::Lanczos3)
    };

    thumbnail
        .save_with_format(destination, ImageFormat::Png)
        .map_err(|e| {
            MetadataError::ImageError(format!(
                "Failed to write thumbnail {}: {}",
                destination.display(),
                e
            ))
        })?;

    debug!(width, height, "Wrote thumbnail");
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};
    use tempfile::TempDir;

    #[test]
    fn test_bounded_dimensions() {
        assert_eq!(bounded_dimensions(1000, 1000, 300), (300, 300));
        assert_eq!(bounded_dimensions(1200, 600, 300), (300, 150));
        assert_eq!(bounded_dimensions(400, 1600, 300), (75, 300));
        assert_eq!(bounded_dimensions(3000, 2, 300), (300, 1));
    }

    #[test]
    fn test_bounded_dimensions_never_upscales() {
        assert_eq!(bounded_dimensions(120, 80, 300), (120, 80));
        assert_eq!(bounded_dimensions(300, 300, 300), (300, 300));
        assert_eq!(bounded_dimensions(0, 0, 300), (0, 0));
    }

    #[test]
    fn test_write_thumbnail() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("montage.png");
        let destination = dir.path().join("montage_t.png");

        DynamicImage::ImageRgb8(RgbImage::new(900, 450))
            .save_with_format(&source, ImageFormat::Png)
            .unwrap();

        let dims = write_thumbnail(&source, &destination, 300).unwrap();
        assert_eq!(dims, (300, 150));

        let written = image::open(&destination).unwrap();
        assert_eq!((written.width(), written.height()), (300, 150));
    }

    #[test]
    fn test_write_thumbnail_small_source() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("small.png");
        let destination = dir.path().join("small_t.png");

        DynamicImage::ImageRgb8(RgbImage::new(64, 32))
            .save_with_format(&source, ImageFormat::Png)
            .unwrap();

        assert_eq!(write_thumbnail(&source, &destination, 300).unwrap(), (64, 32));
    }

    #[test]
    fn test_write_thumbnail_missing_source() {
        let dir = TempDir::new().unwrap();
        let result = write_thumbnail(
            &dir.path().join("absent.png"),
            &dir.path().join("absent_t.png"),
            300,
        );

        assert!(matches!(result, Err(MetadataError::ImageError(_))));
    }
}
