//! Error types for sticker conversion.

use core::fmt;
use thiserror::Error;
use whereat::At;

/// Result type for stickerpack operations.
///
/// Errors are wrapped in [`At`] so they carry the file and line they were raised at.
pub type Result<T> = core::result::Result<T, At<Error>>;

/// Error type for stickerpack operations.
///
/// Every variant is fatal for a conversion run; nothing is retried locally.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The native codec module did not load in time or lacks a required capability.
    #[error("codec unavailable: {0}")]
    CodecUnavailable(String),
    /// A source image could not be read.
    #[error("decode error: {0}")]
    Decode(String),
    /// The native encode/decode primitive failed.
    #[error("codec error: {0}")]
    Codec(CodecFailure),
    /// The quality floor was reached without meeting the byte ceiling.
    #[error(
        "size constraint unsatisfiable: smallest result was {smallest} bytes after {attempts} attempts"
    )]
    SizeConstraintUnsatisfiable {
        /// Smallest encoded length seen across all attempts.
        smallest: usize,
        /// Number of encode attempts made.
        attempts: u32,
    },
    /// The image source was unreadable or held too few images.
    #[error("archive error: {0}")]
    Archive(String),
    /// Invalid input parameters (dimensions, buffer size, pack counts).
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Writing finished packs failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure reported by the native codec module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum CodecFailure {
    /// The module could not allocate an input buffer.
    OutOfMemory,
    /// The encoder reported failure.
    EncodeFailed,
    /// The encoder succeeded but produced no bytes.
    EmptyOutput,
    /// The decoder rejected the bitstream.
    DecodeFailed,
    /// The decoder reported dimensions that cannot describe a raster.
    BadDimensions,
}

impl fmt::Display for CodecFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            CodecFailure::OutOfMemory => "out of memory",
            CodecFailure::EncodeFailed => "encode failed",
            CodecFailure::EmptyOutput => "empty output",
            CodecFailure::DecodeFailed => "decode failed",
            CodecFailure::BadDimensions => "bad dimensions",
        };
        f.write_str(msg)
    }
}
