//! WebP decoding through the native module.

use crate::error::{CodecFailure, Error, Result};
use crate::native::{Codec, NativeBuffer, NativeModule};
use crate::types::{validate_dimensions, RasterImage};
use whereat::*;

impl<M: NativeModule> Codec<M> {
    /// Decode a WebP bitstream to an RGBA raster.
    ///
    /// Follows the same ownership protocol as [`Codec::encode`]: the input is
    /// copied into module memory, the decoded pixels are copied out into an
    /// owned raster, then the result region and the input region are released
    /// in that order, whether or not the copy-out succeeded.
    ///
    /// # Example
    ///
    /// ```rust
    /// use stickerpack::{Codec, RasterImage, DEFAULT_LOAD_TIMEOUT};
    /// use rgb::RGBA8;
    ///
    /// let mut codec = Codec::load(DEFAULT_LOAD_TIMEOUT)?;
    /// let raster = RasterImage::filled(2, 2, RGBA8::new(255, 0, 0, 255))?;
    /// let webp = codec.encode(&raster, 85)?;
    /// let decoded = codec.decode(webp.data())?;
    /// assert_eq!((decoded.width(), decoded.height()), (2, 2));
    /// # Ok::<(), stickerpack::At<stickerpack::Error>>(())
    /// ```
    pub fn decode(&mut self, data: &[u8]) -> Result<RasterImage> {
        if data.is_empty() {
            return Err(at!(Error::Codec(CodecFailure::DecodeFailed)));
        }

        let module = &self.module;

        let mut input = NativeBuffer::alloc(module, data.len())?;
        input.as_mut_slice().copy_from_slice(data);

        let mut width: i32 = 0;
        let mut height: i32 = 0;
        let output = unsafe {
            module.decode_rgba(input.as_ptr(), input.len(), &mut width, &mut height)
        };

        // The region is adopted before the dimensions are trusted so that a
        // bogus size still releases it.
        let size = pixel_bytes(width, height).unwrap_or(0);
        // SAFETY: a non-null output came from the module; `size` is only
        // read after the dimensions are validated below
        let result = unsafe { NativeBuffer::adopt(module, output, size) }
            .ok_or_else(|| at!(Error::Codec(CodecFailure::DecodeFailed)))?;

        let raster = copy_out(&result, width, height);
        drop(result);
        drop(input);

        raster
    }
}

fn pixel_bytes(width: i32, height: i32) -> Option<usize> {
    let width = u32::try_from(width).ok()?;
    let height = u32::try_from(height).ok()?;
    validate_dimensions(width, height).ok()?;
    (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(4)
}

fn copy_out<M: NativeModule>(
    result: &NativeBuffer<'_, M>,
    width: i32,
    height: i32,
) -> Result<RasterImage> {
    if pixel_bytes(width, height).is_none() {
        return Err(at!(Error::Codec(CodecFailure::BadDimensions)));
    }
    RasterImage::from_rgba(result.as_slice(), width as u32, height as u32)
}
