//! # stickerpack
//!
//! Turn a folder of images into WhatsApp-style sticker packs.
//!
//! Each image is letterboxed into a square, encoded to WebP through libwebp,
//! and re-encoded at falling quality until it fits in 100,000 bytes. The
//! encoded stickers are then grouped into packs of 3 to 30, each with its own
//! tray icon.
//!
//! - [`Codec`]: explicit handle on the native WebP module, with
//!   [`Codec::encode`], [`Codec::decode`] and the size-capped
//!   [`Codec::encode_capped`]
//! - [`Normalizer`]: fixed-size square rasters from arbitrary sources
//! - [`partition`] and [`PackAssembler`]: pack grouping and tray numbering
//! - [`Conversion`]: the whole run as an iterator of [`Event`]s
//!
//! ## Quick Start
//!
//! ```rust
//! use rgb::RGBA8;
//! use stickerpack::{Codec, RasterImage, DEFAULT_LOAD_TIMEOUT, MAX_ENCODED_SIZE};
//!
//! let mut codec = Codec::load(DEFAULT_LOAD_TIMEOUT)?;
//! let raster = RasterImage::filled(512, 512, RGBA8::new(255, 128, 0, 255))?;
//!
//! let sticker = codec.encode_capped(&raster)?;
//! assert!(sticker.len() <= MAX_ENCODED_SIZE);
//!
//! let decoded = codec.decode(sticker.data())?;
//! assert_eq!((decoded.width(), decoded.height()), (512, 512));
//! # Ok::<(), stickerpack::At<stickerpack::Error>>(())
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

mod config;
mod convert;
mod encode;
mod error;
mod native;
mod normalize;
mod pack;
mod source;
mod types;

#[cfg(feature = "decode")]
mod decode;

// Re-exports
pub use config::{
    ConvertConfig, TraySource, MAX_ENCODED_SIZE, MAX_STICKERS_PER_PACK, MIN_STICKERS_PER_PACK,
    STICKER_SIZE, TRAY_SIZE,
};
pub use convert::{Conversion, Event};
pub use encode::{QualityLadder, QUALITY_FLOOR, QUALITY_START, QUALITY_STEP};
pub use error::{CodecFailure, Error, Result};
pub use native::{Codec, LibWebp, NativeModule, DEFAULT_LOAD_TIMEOUT};
pub use normalize::{Normalizer, RasterReader};
pub use pack::{partition, split_into_packs, write_packs, IndexOverlay, PackAssembler};
pub use source::{
    is_image_entry, DirectorySource, ImageSource, MemorySource, SourceImage, IMAGE_EXTENSIONS,
};
pub use types::{EncodedImage, RasterImage, StickerPack};

#[cfg(feature = "image")]
pub use normalize::ImageContain;

pub use whereat::At;

whereat::define_at_crate_info!();
