//! WebP encoding: the raw bridge call and the size-capped quality search.

use crate::config::MAX_ENCODED_SIZE;
use crate::error::{CodecFailure, Error, Result};
use crate::native::{Codec, NativeBuffer, NativeModule};
use crate::types::{EncodedImage, RasterImage};
use core::ptr;
use whereat::*;

/// First quality tried by the size-capped encoder, in percent.
pub const QUALITY_START: u8 = 100;

/// Quality decrement between attempts, in percent.
pub const QUALITY_STEP: u8 = 8;

/// Attempts stop once the next quality would be at or below this, in percent.
pub const QUALITY_FLOOR: u8 = 7;

/// The qualities tried by [`Codec::encode_capped`], in order.
///
/// Percent values 100, 92, 84, ... 12. Kept in integer hundredths so the
/// sequence never drifts.
///
/// ```rust
/// let ladder: Vec<u8> = stickerpack::QualityLadder::new().collect();
/// assert_eq!(ladder.first(), Some(&100));
/// assert_eq!(ladder.last(), Some(&12));
/// assert_eq!(ladder.len(), 12);
/// ```
#[derive(Debug, Clone)]
pub struct QualityLadder {
    next: Option<u8>,
}

impl QualityLadder {
    /// Start a fresh ladder at [`QUALITY_START`].
    pub fn new() -> Self {
        Self {
            next: Some(QUALITY_START),
        }
    }
}

impl Default for QualityLadder {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for QualityLadder {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        let quality = self.next?;
        self.next = quality
            .checked_sub(QUALITY_STEP)
            .filter(|&q| q > QUALITY_FLOOR);
        Some(quality)
    }
}

impl core::iter::FusedIterator for QualityLadder {}

impl<M: NativeModule> Codec<M> {
    /// Encode a raster to WebP at a fixed quality (0 = smallest, 100 = best).
    ///
    /// Pixels are copied into module memory, encoded there, and the result
    /// copied back out. Both module regions are released before returning,
    /// on success and on every error path.
    pub fn encode(&mut self, raster: &RasterImage, quality: u8) -> Result<EncodedImage> {
        if quality > 100 {
            return Err(at!(Error::InvalidInput(format!(
                "quality {} out of range 0-100",
                quality
            ))));
        }

        let module = &self.module;
        let pixels = raster.as_bytes();

        let mut input = NativeBuffer::alloc(module, pixels.len())?;
        input.as_mut_slice().copy_from_slice(pixels);

        let mut output: *mut u8 = ptr::null_mut();
        let size = unsafe {
            module.encode_rgba(
                input.as_ptr(),
                raster.width(),
                raster.height(),
                raster.width() * 4, // stride
                f32::from(quality),
                &mut output,
            )
        };

        // SAFETY: a non-null output came from the module and spans `size` bytes
        let result = unsafe { NativeBuffer::adopt(module, output, size) };
        let result = match result {
            Some(result) if result.len() > 0 => result,
            Some(_) => return Err(at!(Error::Codec(CodecFailure::EmptyOutput))),
            None => return Err(at!(Error::Codec(CodecFailure::EncodeFailed))),
        };

        let data = result.as_slice().to_vec();
        drop(result);
        drop(input);

        Ok(EncodedImage::new(data, f32::from(quality) / 100.0))
    }

    /// Encode a raster so the result fits in [`MAX_ENCODED_SIZE`] bytes.
    ///
    /// Walks the [`QualityLadder`] from best to worst, re-encoding from
    /// scratch each time, and returns the first result under the ceiling.
    /// Fails with [`Error::SizeConstraintUnsatisfiable`] once the ladder is
    /// exhausted.
    pub fn encode_capped(&mut self, raster: &RasterImage) -> Result<EncodedImage> {
        self.encode_within(raster, MAX_ENCODED_SIZE)
    }

    pub(crate) fn encode_within(
        &mut self,
        raster: &RasterImage,
        max_size: usize,
    ) -> Result<EncodedImage> {
        let mut smallest = usize::MAX;
        let mut attempts = 0u32;

        for quality in QualityLadder::new() {
            attempts += 1;
            let encoded = self.encode(raster, quality)?;
            log::debug!(
                "{}x{} at q{}: {} bytes (limit {})",
                raster.width(),
                raster.height(),
                quality,
                encoded.len(),
                max_size
            );
            if encoded.len() <= max_size {
                return Ok(encoded);
            }
            smallest = smallest.min(encoded.len());
        }

        log::warn!(
            "quality floor reached for {}x{} raster, smallest result {} bytes",
            raster.width(),
            raster.height(),
            smallest
        );
        Err(at!(Error::SizeConstraintUnsatisfiable { smallest, attempts }))
    }
}
