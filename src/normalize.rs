//! Fixed-size square rasters from arbitrary source images.

use crate::error::{Error, Result};
use crate::types::RasterImage;
use whereat::*;

/// Decodes a source image and letterboxes it into a square canvas.
///
/// Implementations must return a `size` x `size` raster with the source
/// scaled to fit (aspect preserved, never cropped) and centered on a
/// transparent background, or [`Error::Decode`] for unreadable input.
pub trait RasterReader {
    /// Read `data` and contain it in a `size` x `size` canvas.
    fn read_and_contain(&mut self, data: &[u8], size: u32) -> Result<RasterImage>;
}

impl<F> RasterReader for F
where
    F: FnMut(&[u8], u32) -> Result<RasterImage>,
{
    fn read_and_contain(&mut self, data: &[u8], size: u32) -> Result<RasterImage> {
        self(data, size)
    }
}

/// Thin wrapper around a [`RasterReader`] that enforces the output shape.
#[derive(Debug, Clone)]
pub struct Normalizer<R> {
    reader: R,
}

impl<R: RasterReader> Normalizer<R> {
    /// Wrap a reader.
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Produce a `size` x `size` raster from encoded source bytes.
    pub fn normalize(&mut self, data: &[u8], size: u32) -> Result<RasterImage> {
        if size == 0 {
            return Err(at!(Error::InvalidInput("target size must be non-zero".into())));
        }
        let raster = self.reader.read_and_contain(data, size)?;
        if raster.width() != size || raster.height() != size {
            return Err(at!(Error::Decode(format!(
                "reader produced {}x{}, expected {}x{}",
                raster.width(),
                raster.height(),
                size,
                size
            ))));
        }
        Ok(raster)
    }

    /// The wrapped reader.
    pub fn reader_mut(&mut self) -> &mut R {
        &mut self.reader
    }
}

/// [`RasterReader`] backed by the `image` crate.
///
/// Reads any format `image` was built with, resizes with the configured
/// filter, and centers the result on a transparent canvas.
#[cfg(feature = "image")]
#[derive(Debug, Clone, Copy)]
pub struct ImageContain {
    filter: image::imageops::FilterType,
}

#[cfg(feature = "image")]
impl ImageContain {
    /// Lanczos3 resampling.
    pub fn new() -> Self {
        Self {
            filter: image::imageops::FilterType::Lanczos3,
        }
    }

    /// Use a different resampling filter.
    #[must_use]
    pub fn filter(mut self, filter: image::imageops::FilterType) -> Self {
        self.filter = filter;
        self
    }
}

#[cfg(feature = "image")]
impl Default for ImageContain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "image")]
impl RasterReader for ImageContain {
    fn read_and_contain(&mut self, data: &[u8], size: u32) -> Result<RasterImage> {
        let source =
            image::load_from_memory(data).map_err(|e| at!(Error::Decode(e.to_string())))?;
        if source.width() == 0 || source.height() == 0 {
            return Err(at!(Error::Decode("source image is empty".into())));
        }

        let scaled = source.resize(size, size, self.filter).to_rgba8();

        let mut canvas = image::RgbaImage::new(size, size);
        let x = size.saturating_sub(scaled.width()) / 2;
        let y = size.saturating_sub(scaled.height()) / 2;
        image::imageops::replace(&mut canvas, &scaled, i64::from(x), i64::from(y));

        RasterImage::from_rgba(canvas.as_raw(), size, size)
    }
}

#[cfg(feature = "image")]
impl Default for Normalizer<ImageContain> {
    fn default() -> Self {
        Self::new(ImageContain::new())
    }
}
