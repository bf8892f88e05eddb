//! A full conversion run as a lazy sequence of events.

use crate::config::{ConvertConfig, TraySource};
use crate::error::{Error, Result};
use crate::native::{Codec, NativeModule};
use crate::normalize::{Normalizer, RasterReader};
use crate::pack::{partition, IndexOverlay, PackAssembler};
use crate::source::{ImageSource, SourceImage};
use crate::types::{EncodedImage, RasterImage, StickerPack};
use whereat::*;

/// Something that happened during a [`Conversion`].
#[derive(Debug)]
#[non_exhaustive]
pub enum Event {
    /// A sticker was normalized and encoded within the size ceiling.
    StickerProcessed {
        /// Position in input order, starting at 0.
        index: usize,
        /// Number of stickers in the run.
        total: usize,
        /// Source entry name.
        name: String,
        /// Encoded size in bytes.
        bytes: usize,
        /// Normalized quality the encoder settled on.
        quality: f32,
    },
    /// Every sticker is encoded and grouped. Terminal.
    PacksReady(Vec<StickerPack>),
    /// The run aborted. Terminal.
    Failed(At<Error>),
}

impl Event {
    /// Whether this event ends the run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Event::PacksReady(_) | Event::Failed(_))
    }
}

enum State {
    Start,
    Encoding {
        pending: std::vec::IntoIter<SourceImage>,
        tray: RasterImage,
        encoded: Vec<EncodedImage>,
        total: usize,
    },
    Done,
}

/// One conversion run, driven by iteration.
///
/// Yields one [`Event::StickerProcessed`] per source image, in input order,
/// then exactly one [`Event::PacksReady`] or [`Event::Failed`], then `None`
/// forever. Nothing happens until the first call to `next`; each call does
/// at most one sticker's worth of work. A run cannot be restarted.
///
/// # Example
///
/// ```rust,no_run
/// use stickerpack::{
///     Codec, Conversion, DirectorySource, Event, ImageContain, Normalizer, RasterImage,
/// };
///
/// let mut codec = Codec::load(stickerpack::DEFAULT_LOAD_TIMEOUT)?;
/// // Real callers draw the pack number here.
/// let badge = |tray: RasterImage, _index: usize| -> stickerpack::Result<RasterImage> { Ok(tray) };
/// let run = Conversion::new(
///     &mut codec,
///     DirectorySource::new("my_stickers"),
///     Normalizer::new(ImageContain::new()),
///     badge,
/// );
/// for event in run {
///     match event {
///         Event::StickerProcessed { index, total, .. } => println!("{}/{}", index + 1, total),
///         Event::PacksReady(packs) => println!("{} packs", packs.len()),
///         Event::Failed(err) => eprintln!("{:?}", err),
///         _ => {}
///     }
/// }
/// # Ok::<(), stickerpack::At<stickerpack::Error>>(())
/// ```
pub struct Conversion<'c, M, S, R, O> {
    codec: &'c mut Codec<M>,
    source: S,
    normalizer: Normalizer<R>,
    overlay: O,
    config: ConvertConfig,
    state: State,
}

impl<'c, M, S, R, O> Conversion<'c, M, S, R, O>
where
    M: NativeModule,
    S: ImageSource,
    R: RasterReader,
    O: IndexOverlay,
{
    /// Prepare a run. No work happens until the first event is pulled.
    pub fn new(codec: &'c mut Codec<M>, source: S, normalizer: Normalizer<R>, overlay: O) -> Self {
        Self {
            codec,
            source,
            normalizer,
            overlay,
            config: ConvertConfig::default(),
            state: State::Start,
        }
    }

    /// Replace the default configuration.
    #[must_use]
    pub fn config(mut self, config: ConvertConfig) -> Self {
        self.config = config;
        self
    }

    /// Drive the run to completion and return its outcome.
    pub fn run(mut self) -> Result<Vec<StickerPack>> {
        while let Some(event) = self.next() {
            match event {
                Event::PacksReady(packs) => return Ok(packs),
                Event::Failed(err) => return Err(err),
                Event::StickerProcessed { .. } => {}
            }
        }
        Err(at!(Error::InvalidInput("conversion already finished".into())))
    }

    fn start(&mut self) -> Result<State> {
        self.config.validate()?;
        let images = self.source.load()?;
        partition(images.len())?;

        let tray = match &self.config.tray {
            TraySource::FirstImage => self
                .normalizer
                .normalize(&images[0].data, self.config.tray_size)?,
            TraySource::Bytes(data) => self.normalizer.normalize(data, self.config.tray_size)?,
        };

        let total = images.len();
        log::info!("converting {} images", total);
        Ok(State::Encoding {
            pending: images.into_iter(),
            tray,
            encoded: Vec::with_capacity(total),
            total,
        })
    }

    fn step(&mut self) -> Result<Option<Event>> {
        loop {
            match core::mem::replace(&mut self.state, State::Done) {
                State::Start => self.state = self.start()?,
                State::Encoding {
                    mut pending,
                    tray,
                    mut encoded,
                    total,
                } => {
                    let Some(image) = pending.next() else {
                        let overlay = &mut self.overlay;
                        let packs = PackAssembler::new(
                            &mut *self.codec,
                            |tray: RasterImage, index: usize| overlay.overlay_index(tray, index),
                        )
                        .assemble(&tray, encoded)?;
                        return Ok(Some(Event::PacksReady(packs)));
                    };

                    let raster = self
                        .normalizer
                        .normalize(&image.data, self.config.sticker_size)?;
                    let sticker = self.codec.encode_capped(&raster)?;
                    drop(raster);

                    let event = Event::StickerProcessed {
                        index: encoded.len(),
                        total,
                        name: image.name,
                        bytes: sticker.len(),
                        quality: sticker.quality(),
                    };
                    log::info!(
                        "sticker {}/{} encoded: {} bytes",
                        encoded.len() + 1,
                        total,
                        sticker.len()
                    );
                    encoded.push(sticker);
                    self.state = State::Encoding {
                        pending,
                        tray,
                        encoded,
                        total,
                    };
                    return Ok(Some(event));
                }
                State::Done => return Ok(None),
            }
        }
    }
}

impl<M, S, R, O> Iterator for Conversion<'_, M, S, R, O>
where
    M: NativeModule,
    S: ImageSource,
    R: RasterReader,
    O: IndexOverlay,
{
    type Item = Event;

    fn next(&mut self) -> Option<Event> {
        match self.step() {
            Ok(event) => event,
            Err(err) => {
                log::warn!("conversion failed: {:?}", err);
                self.state = State::Done;
                Some(Event::Failed(err))
            }
        }
    }
}

impl<M, S, R, O> core::iter::FusedIterator for Conversion<'_, M, S, R, O>
where
    M: NativeModule,
    S: ImageSource,
    R: RasterReader,
    O: IndexOverlay,
{
}
