//! Core types for raster, encoded and packed images.

use crate::error::{Error, Result};
use imgref::{ImgRef, ImgVec};
use rgb::RGBA8;
use whereat::*;

/// An RGBA raster, 8 bits per channel, row-major with no row padding.
///
/// The pixel buffer always holds exactly `width * height` pixels; the only
/// constructors validate this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    img: ImgVec<RGBA8>,
}

impl RasterImage {
    /// Create a raster from typed pixels.
    pub fn new(pixels: Vec<RGBA8>, width: u32, height: u32) -> Result<Self> {
        validate_dimensions(width, height)?;
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(at!(Error::InvalidInput(format!(
                "pixel count mismatch: got {}, expected {} ({}x{})",
                pixels.len(),
                expected,
                width,
                height
            ))));
        }
        Ok(Self {
            img: ImgVec::new(pixels, width as usize, height as usize),
        })
    }

    /// Create a raster from packed RGBA bytes.
    pub fn from_rgba(data: &[u8], width: u32, height: u32) -> Result<Self> {
        validate_dimensions(width, height)?;
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(at!(Error::InvalidInput(format!(
                "buffer size mismatch: got {}, expected {}",
                data.len(),
                expected
            ))));
        }
        let pixels = data
            .chunks_exact(4)
            .map(|p| RGBA8::new(p[0], p[1], p[2], p[3]))
            .collect();
        Self::new(pixels, width, height)
    }

    /// A raster filled with a single color.
    pub fn filled(width: u32, height: u32, color: RGBA8) -> Result<Self> {
        validate_dimensions(width, height)?;
        Self::new(
            vec![color; width as usize * height as usize],
            width,
            height,
        )
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.img.width() as u32
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.img.height() as u32
    }

    /// Pixels in row-major order.
    pub fn pixels(&self) -> &[RGBA8] {
        self.img.buf()
    }

    /// Mutable pixels in row-major order.
    pub fn pixels_mut(&mut self) -> &mut [RGBA8] {
        self.img.buf_mut()
    }

    /// Borrow as an imgref image.
    pub fn as_img(&self) -> ImgRef<'_, RGBA8> {
        self.img.as_ref()
    }

    /// Packed RGBA bytes, `width * height * 4` long.
    pub fn as_bytes(&self) -> &[u8] {
        let buf = self.img.buf();
        // SAFETY: RGBA8 is repr(C) and has the same layout as [u8; 4]
        unsafe { core::slice::from_raw_parts(buf.as_ptr() as *const u8, buf.len() * 4) }
    }

    /// Consume into the underlying imgref buffer.
    pub fn into_img(self) -> ImgVec<RGBA8> {
        self.img
    }
}

/// WebP bytes produced by the quality-constrained encoder.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedImage {
    data: Vec<u8>,
    quality: f32,
}

impl EncodedImage {
    pub(crate) fn new(data: Vec<u8>, quality: f32) -> Self {
        Self { data, quality }
    }

    /// The WebP bitstream.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Normalized quality (0.0 to 1.0) that produced this image.
    pub fn quality(&self) -> f32 {
        self.quality
    }

    /// Encoded length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the bitstream is empty. Never true for images made by the bridge.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Consume into the raw bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

impl AsRef<[u8]> for EncodedImage {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

/// One finished sticker pack: a tray icon plus 3 to 30 stickers in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct StickerPack {
    pub(crate) index: usize,
    pub(crate) tray: EncodedImage,
    pub(crate) stickers: Vec<EncodedImage>,
}

impl StickerPack {
    /// 1-based position of this pack in the run.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The tray icon.
    pub fn tray(&self) -> &EncodedImage {
        &self.tray
    }

    /// Stickers in input order.
    pub fn stickers(&self) -> &[EncodedImage] {
        &self.stickers
    }

    /// Tray first, then every sticker.
    pub fn images(&self) -> impl Iterator<Item = &EncodedImage> {
        core::iter::once(&self.tray).chain(self.stickers.iter())
    }

    /// Total encoded size of the tray and all stickers.
    pub fn total_bytes(&self) -> usize {
        self.images().map(EncodedImage::len).sum()
    }
}

pub(crate) fn validate_dimensions(width: u32, height: u32) -> Result<()> {
    const MAX_DIMENSION: u32 = 16383;

    if width == 0 || height == 0 {
        return Err(at!(Error::InvalidInput(
            "width and height must be non-zero".into(),
        )));
    }
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(at!(Error::InvalidInput(format!(
            "dimensions exceed maximum ({} x {})",
            MAX_DIMENSION, MAX_DIMENSION
        ))));
    }
    Ok(())
}
