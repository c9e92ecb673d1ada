// Left-to-right composition of selected images onto one transparent canvas.

use image::{ImageFormat, RgbaImage, imageops};
use std::path::Path;
use tempfile::NamedTempFile;

use crate::error::Error;

/// Most slots shown in one thumbnail; extra selections are dropped in
/// declaration order.
const MAX_SLOTS: usize = 9;

/// Compose `images` onto a transparent canvas sized for `scale`.
///
/// Canvas width is driven entirely by content: `base_width` is accepted for
/// interface compatibility but superseded by the per-slot metrics. The
/// horizontal advance between slots stays unscaled while the offsets scale,
/// reproducing the historical layout at non-unit factors.
pub fn composite(
    images: &[RgbaImage],
    base_width: u32,
    base_height: u32,
    icon_size: u32,
    padding: u32,
    scale: f64,
) -> Option<RgbaImage> {
    if images.is_empty() {
        return None;
    }
    let images = &images[..images.len().min(MAX_SLOTS)];
    let count = images.len() as u32;

    let width = ((icon_size * count + padding * (count - 1)) as f64 * scale) as u32;
    let height = (base_height as f64 * scale) as u32;
    tracing::debug!(base_width, width, height, count, "canvas sized by content");

    let mut canvas = RgbaImage::new(width, height);

    let space_w = width as f64 - icon_size as f64 * count as f64 * scale;
    let mut x = (space_w - (count - 1) as f64 * padding as f64 * scale) / 2.0;
    let y = (height as f64 - icon_size as f64 * scale) / 2.0;

    for image in images {
        imageops::overlay(&mut canvas, image, x as i64, y as i64);
        x += (icon_size + padding) as f64;
    }

    Some(canvas)
}

/// Encode to PNG through a temporary file in the destination directory,
/// then atomically rename over `path`. Readers never observe a partially
/// written thumbnail.
pub fn write_png(image: &RgbaImage, path: &Path) -> Result<(), Error> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(|source| Error::Write {
        path: path.to_path_buf(),
        source,
    })?;

    image
        .write_to(&mut tmp, ImageFormat::Png)
        .map_err(|source| Error::Encode {
            path: path.to_path_buf(),
            source,
        })?;

    tmp.persist(path).map_err(|err| Error::Write {
        path: path.to_path_buf(),
        source: err.error,
    })?;
    Ok(())
}
