//! Composite image built from a window's frame bundle.
//!
//! Frames are laid out left to right, oldest first, separated by a solid
//! opaque black column. The canvas is as tall as the tallest frame and
//! filled opaque black, so shorter frames leave a black band below them.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{imageops, ImageFormat, Rgba, RgbaImage};
use tracing::debug;

use crate::{AppError, Result};

/// Opaque black, used for both background and separators.
const FILL: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Merge encoded frames horizontally.
///
/// A single frame comes back unchanged (converted to RGBA).
///
/// # Errors
///
/// Returns `AppError::Frame` if `frames` is empty, any frame cannot be
/// decoded, or the composite would not fit in `u32` dimensions.
pub fn merge_horizontally<B>(frames: &[B], separator_width: u32) -> Result<RgbaImage>
where
    B: AsRef<[u8]>,
{
    if frames.is_empty() {
        return Err(AppError::Frame("frame bundle is empty".into()));
    }

    let decoded = frames
        .iter()
        .map(|bytes| image::load_from_memory(bytes.as_ref()).map(|img| img.to_rgba8()))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let separators = u32::try_from(decoded.len() - 1)
        .ok()
        .and_then(|n| n.checked_mul(separator_width))
        .ok_or_else(|| AppError::Frame("too many frames".into()))?;
    let width = decoded
        .iter()
        .try_fold(separators, |acc, img| acc.checked_add(img.width()))
        .ok_or_else(|| AppError::Frame("composite too wide".into()))?;
    let height = decoded.iter().map(RgbaImage::height).max().unwrap_or(0);

    let mut canvas = RgbaImage::from_pixel(width, height, FILL);
    let mut x: i64 = 0;
    for img in &decoded {
        imageops::replace(&mut canvas, img, x, 0);
        // The gap left after each frame is already background-coloured,
        // which is the separator.
        x += i64::from(img.width()) + i64::from(separator_width);
    }

    Ok(canvas)
}

/// PNG-encode an image.
///
/// # Errors
///
/// Returns `AppError::Frame` if encoding fails.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

/// Writes each window's composite to a fixed per-game path.
#[derive(Debug, Clone)]
pub struct FrameAggregator {
    output_path: PathBuf,
    separator_width: u32,
}

impl FrameAggregator {
    /// Aggregator overwriting `output_path` every window.
    #[must_use]
    pub fn new(output_path: PathBuf, separator_width: u32) -> Self {
        Self {
            output_path,
            separator_width,
        }
    }

    /// Where the composite is written.
    #[must_use]
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Merge `bundle`, write the PNG, and return its path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Frame` for decode/encode failures and
    /// `AppError::Io` if the file cannot be written.
    pub async fn compose<B>(&self, bundle: &[B]) -> Result<PathBuf>
    where
        B: AsRef<[u8]>,
    {
        let composite = merge_horizontally(bundle, self.separator_width)?;
        let png = encode_png(&composite)?;

        if let Some(parent) = self.output_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|err| {
                AppError::Io(format!("failed to create {}: {err}", parent.display()))
            })?;
        }
        tokio::fs::write(&self.output_path, &png).await.map_err(|err| {
            AppError::Io(format!(
                "failed to write composite {}: {err}",
                self.output_path.display()
            ))
        })?;

        debug!(
            frames = bundle.len(),
            width = composite.width(),
            height = composite.height(),
            "composite written"
        );
        Ok(self.output_path.clone())
    }
}
