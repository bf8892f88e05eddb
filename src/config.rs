//! Conversion configuration and fixed limits.

use crate::error::{Error, Result};
use whereat::*;

/// Largest accepted encoded size for any tray or sticker, in bytes.
pub const MAX_ENCODED_SIZE: usize = 100_000;

/// Most stickers a single pack may hold.
pub const MAX_STICKERS_PER_PACK: usize = 30;

/// Fewest stickers a single pack may hold.
pub const MIN_STICKERS_PER_PACK: usize = 3;

/// Edge length of a tray icon, in pixels.
pub const TRAY_SIZE: u32 = 96;

/// Edge length of a sticker, in pixels.
pub const STICKER_SIZE: u32 = 512;

/// Which image becomes the tray icon.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum TraySource {
    /// Use the first source image. It still appears as a sticker too.
    #[default]
    FirstImage,
    /// Use a separate image, given as encoded bytes in any readable format.
    Bytes(Vec<u8>),
}

/// Conversion configuration. Reusable across runs.
///
/// # Example
///
/// ```rust
/// use stickerpack::{ConvertConfig, TraySource};
///
/// let config = ConvertConfig::new()
///     .sticker_size(256)
///     .tray(TraySource::FirstImage);
/// assert_eq!(config.get_sticker_size(), 256);
/// assert_eq!(config.get_tray_size(), 96);
/// ```
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    pub(crate) tray_size: u32,
    pub(crate) sticker_size: u32,
    pub(crate) tray: TraySource,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            tray_size: TRAY_SIZE,
            sticker_size: STICKER_SIZE,
            tray: TraySource::FirstImage,
        }
    }
}

impl ConvertConfig {
    /// Create a configuration with the standard 96px tray and 512px stickers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tray edge length in pixels.
    #[must_use]
    pub fn tray_size(mut self, size: u32) -> Self {
        self.tray_size = size;
        self
    }

    /// Set the sticker edge length in pixels.
    #[must_use]
    pub fn sticker_size(mut self, size: u32) -> Self {
        self.sticker_size = size;
        self
    }

    /// Choose the tray image.
    #[must_use]
    pub fn tray(mut self, tray: TraySource) -> Self {
        self.tray = tray;
        self
    }

    /// Tray edge length in pixels.
    pub fn get_tray_size(&self) -> u32 {
        self.tray_size
    }

    /// Sticker edge length in pixels.
    pub fn get_sticker_size(&self) -> u32 {
        self.sticker_size
    }

    /// Tray image choice.
    pub fn get_tray(&self) -> &TraySource {
        &self.tray
    }

    /// Check the configuration before a run.
    pub fn validate(&self) -> Result<()> {
        if self.tray_size == 0 || self.sticker_size == 0 {
            return Err(at!(Error::InvalidInput(
                "tray and sticker sizes must be non-zero".into()
            )));
        }
        Ok(())
    }
}
