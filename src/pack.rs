//! Grouping encoded stickers into packs with per-pack tray icons.

use crate::config::{MAX_STICKERS_PER_PACK, MIN_STICKERS_PER_PACK};
use crate::error::{Error, Result};
use crate::native::{Codec, NativeModule};
use crate::types::{EncodedImage, RasterImage, StickerPack};
use core::ops::Range;
use std::fs;
use std::path::{Path, PathBuf};
use whereat::*;

/// Draws a pack number onto a copy of the tray icon.
///
/// Called once per pack, with 1-based indices in pack order, and only when
/// a run produces more than one pack.
pub trait IndexOverlay {
    /// Return `tray` with `index` drawn as a badge near its bottom-right corner.
    fn overlay_index(&mut self, tray: RasterImage, index: usize) -> Result<RasterImage>;
}

impl<F> IndexOverlay for F
where
    F: FnMut(RasterImage, usize) -> Result<RasterImage>,
{
    fn overlay_index(&mut self, tray: RasterImage, index: usize) -> Result<RasterImage> {
        self(tray, index)
    }
}

/// Split `count` stickers into contiguous pack ranges.
///
/// Chunks hold at most [`MAX_STICKERS_PER_PACK`]. When there is more than
/// one chunk and the last is shorter than [`MIN_STICKERS_PER_PACK`], the
/// missing stickers are taken from the end of the second-to-last chunk.
/// Earlier chunks are always full and are never touched.
///
/// ```rust
/// let ranges = stickerpack::partition(31)?;
/// assert_eq!(ranges, vec![0..28, 28..31]);
/// # Ok::<(), stickerpack::At<stickerpack::Error>>(())
/// ```
pub fn partition(count: usize) -> Result<Vec<Range<usize>>> {
    if count < MIN_STICKERS_PER_PACK {
        return Err(at!(Error::InvalidInput(format!(
            "need at least {} stickers, got {}",
            MIN_STICKERS_PER_PACK, count
        ))));
    }

    let packs = count.div_ceil(MAX_STICKERS_PER_PACK);
    let mut ranges: Vec<Range<usize>> = (0..packs)
        .map(|i| i * MAX_STICKERS_PER_PACK..((i + 1) * MAX_STICKERS_PER_PACK).min(count))
        .collect();

    if packs > 1 {
        let last = packs - 1;
        let short = MIN_STICKERS_PER_PACK.saturating_sub(ranges[last].len());
        if short > 0 {
            ranges[last - 1].end -= short;
            ranges[last].start -= short;
            log::debug!(
                "moved {} stickers from pack {} to pack {}",
                short,
                last,
                last + 1
            );
        }
    }

    Ok(ranges)
}

/// Split owned items along [`partition`], preserving order.
pub fn split_into_packs<T>(items: Vec<T>) -> Result<Vec<Vec<T>>> {
    let ranges = partition(items.len())?;
    let mut items = items.into_iter();
    Ok(ranges
        .into_iter()
        .map(|range| items.by_ref().take(range.len()).collect())
        .collect())
}

/// Builds finished packs from a tray raster and stickers.
///
/// Every tray and sticker goes through [`Codec::encode_capped`], so every
/// image in a returned pack is within the size ceiling.
pub struct PackAssembler<'c, M, O> {
    codec: &'c mut Codec<M>,
    overlay: O,
}

impl<'c, M: NativeModule, O: IndexOverlay> PackAssembler<'c, M, O> {
    /// Assemble with `codec`, numbering trays with `overlay` when needed.
    pub fn new(codec: &'c mut Codec<M>, overlay: O) -> Self {
        Self { codec, overlay }
    }

    /// Encode raster stickers in order, then assemble them.
    pub fn assemble_rasters(
        &mut self,
        tray: &RasterImage,
        stickers: Vec<RasterImage>,
    ) -> Result<Vec<StickerPack>> {
        partition(stickers.len())?;
        let encoded = stickers
            .into_iter()
            .map(|sticker| self.codec.encode_capped(&sticker))
            .collect::<Result<Vec<_>>>()?;
        self.assemble(tray, encoded)
    }

    /// Group already-encoded stickers into packs and encode their trays.
    pub fn assemble(
        &mut self,
        tray: &RasterImage,
        stickers: Vec<EncodedImage>,
    ) -> Result<Vec<StickerPack>> {
        let groups = split_into_packs(stickers)?;
        let trays = self.trays(tray, groups.len())?;

        let packs: Vec<StickerPack> = groups
            .into_iter()
            .zip(trays)
            .enumerate()
            .map(|(i, (stickers, tray))| StickerPack {
                index: i + 1,
                tray,
                stickers,
            })
            .collect();

        for pack in &packs {
            log::info!(
                "pack {}: {} stickers, {} bytes",
                pack.index,
                pack.stickers.len(),
                pack.total_bytes()
            );
        }
        Ok(packs)
    }

    fn trays(&mut self, base: &RasterImage, count: usize) -> Result<Vec<EncodedImage>> {
        if count == 1 {
            return Ok(vec![self.codec.encode_capped(base)?]);
        }
        (1..=count)
            .map(|index| {
                let numbered = self.overlay.overlay_index(base.clone(), index)?;
                self.codec.encode_capped(&numbered)
            })
            .collect()
    }
}

impl StickerPack {
    /// Write `tray.webp` and `01.webp`, `02.webp`, ... into `dir`, creating it.
    ///
    /// Returns the paths written, tray first.
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| at!(Error::Io(e)))?;

        let mut written = Vec::with_capacity(self.stickers.len() + 1);
        let tray_path = dir.join("tray.webp");
        fs::write(&tray_path, self.tray.data()).map_err(|e| at!(Error::Io(e)))?;
        written.push(tray_path);

        for (i, sticker) in self.stickers.iter().enumerate() {
            let path = dir.join(format!("{:02}.webp", i + 1));
            fs::write(&path, sticker.data()).map_err(|e| at!(Error::Io(e)))?;
            written.push(path);
        }
        Ok(written)
    }
}

/// Write each pack to `dir/pack_<index>/`. Returns the pack directories.
pub fn write_packs(packs: &[StickerPack], dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    packs
        .iter()
        .map(|pack| {
            let pack_dir = dir.join(format!("pack_{}", pack.index()));
            pack.write_to_dir(&pack_dir)?;
            Ok(pack_dir)
        })
        .collect()
}
