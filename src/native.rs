//! Native codec module boundary and buffer ownership.
//!
//! The codec module owns a heap separate from Rust's allocator. Every region
//! the bridge obtains from it, whether allocated for input or handed back as
//! a result, is wrapped in a [`NativeBuffer`] guard that releases it exactly
//! once when dropped.

use crate::error::{CodecFailure, Error, Result};
use core::ptr::NonNull;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use whereat::*;

/// How long [`Codec::load`] waits for the module by default.
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Raw primitives of a WebP codec module.
///
/// # Safety
///
/// Implementors must guarantee that:
/// - `alloc` returns either null or a region of at least `len` writable bytes;
/// - `encode_rgba` stores in `output` either null or a region of at least the
///   returned number of bytes, and `decode_rgba` returns either null or a
///   region of at least `width * height * 4` bytes;
/// - every non-null region from these three functions may be passed to
///   `release` exactly once, and is not touched by the module afterwards
///   except through `release`.
pub unsafe trait NativeModule {
    /// Module version packed as `0x00MMmmpp`, or `None` if the module is unusable.
    fn version(&self) -> Option<u32>;

    /// Allocate `len` bytes of module memory. Null on failure.
    fn alloc(&self, len: usize) -> *mut u8;

    /// Release a region previously returned by this module.
    ///
    /// # Safety
    ///
    /// `ptr` must come from this module and must not have been released yet.
    unsafe fn release(&self, ptr: *mut u8);

    /// Encode packed RGBA into a module-owned WebP bitstream.
    ///
    /// Returns the output length; the region is stored in `output`.
    ///
    /// # Safety
    ///
    /// `rgba` must point to `stride * height` readable bytes.
    unsafe fn encode_rgba(
        &self,
        rgba: *const u8,
        width: u32,
        height: u32,
        stride: u32,
        quality: f32,
        output: &mut *mut u8,
    ) -> usize;

    /// Decode a WebP bitstream into module-owned packed RGBA.
    ///
    /// # Safety
    ///
    /// `data` must point to `len` readable bytes.
    unsafe fn decode_rgba(
        &self,
        data: *const u8,
        len: usize,
        width: &mut i32,
        height: &mut i32,
    ) -> *mut u8;
}

/// libwebp, statically linked through `libwebp-sys`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LibWebp;

unsafe impl NativeModule for LibWebp {
    fn version(&self) -> Option<u32> {
        let enc = unsafe { libwebp_sys::WebPGetEncoderVersion() };
        let dec = unsafe { libwebp_sys::WebPGetDecoderVersion() };
        if enc <= 0 || dec <= 0 {
            return None;
        }
        Some(enc as u32)
    }

    fn alloc(&self, len: usize) -> *mut u8 {
        unsafe { libwebp_sys::WebPMalloc(len) as *mut u8 }
    }

    unsafe fn release(&self, ptr: *mut u8) {
        unsafe { libwebp_sys::WebPFree(ptr as *mut _) }
    }

    unsafe fn encode_rgba(
        &self,
        rgba: *const u8,
        width: u32,
        height: u32,
        stride: u32,
        quality: f32,
        output: &mut *mut u8,
    ) -> usize {
        unsafe {
            libwebp_sys::WebPEncodeRGBA(
                rgba,
                width as i32,
                height as i32,
                stride as i32,
                quality,
                output,
            )
        }
    }

    unsafe fn decode_rgba(
        &self,
        data: *const u8,
        len: usize,
        width: &mut i32,
        height: &mut i32,
    ) -> *mut u8 {
        unsafe { libwebp_sys::WebPDecodeRGBA(data, len, width, height) }
    }
}

/// A region of module memory with a single owner.
///
/// Dropping the guard hands the region back to the module. Declaring the
/// input guard before the result guard makes the result release first.
pub(crate) struct NativeBuffer<'m, M: NativeModule + ?Sized> {
    module: &'m M,
    ptr: NonNull<u8>,
    len: usize,
}

impl<'m, M: NativeModule + ?Sized> NativeBuffer<'m, M> {
    /// Allocate a fresh region for caller data.
    pub(crate) fn alloc(module: &'m M, len: usize) -> Result<Self> {
        let ptr = NonNull::new(module.alloc(len))
            .ok_or_else(|| at!(Error::Codec(CodecFailure::OutOfMemory)))?;
        Ok(Self { module, ptr, len })
    }

    /// Take ownership of a region the module handed back as a result.
    ///
    /// Returns `None` for a null pointer; there is nothing to release then.
    ///
    /// # Safety
    ///
    /// A non-null `ptr` must come from `module`, be unreleased, and span at
    /// least `len` readable bytes.
    pub(crate) unsafe fn adopt(module: &'m M, ptr: *mut u8, len: usize) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Self { module, ptr, len })
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    pub(crate) fn as_slice(&self) -> &[u8] {
        // SAFETY: the region spans `len` bytes for as long as the guard lives
        unsafe { core::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: the guard is the sole owner of the region
        unsafe { core::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl<M: NativeModule + ?Sized> Drop for NativeBuffer<'_, M> {
    fn drop(&mut self) {
        unsafe { self.module.release(self.ptr.as_ptr()) };
    }
}

/// An initialized codec module.
///
/// Construct one with [`Codec::load`] and keep it for the whole run. Encode
/// and decode take `&mut self`: the module's heap is one shared arena, so
/// calls on a handle are serialized by the borrow checker.
#[derive(Debug)]
pub struct Codec<M = LibWebp> {
    pub(crate) module: M,
    version: u32,
}

impl Codec<LibWebp> {
    /// Load libwebp, failing with [`Error::CodecUnavailable`] if it is not
    /// ready within `timeout`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use stickerpack::{Codec, DEFAULT_LOAD_TIMEOUT};
    ///
    /// let codec = Codec::load(DEFAULT_LOAD_TIMEOUT)?;
    /// let (major, _, _) = codec.version();
    /// assert!(major >= 1);
    /// # Ok::<(), stickerpack::At<stickerpack::Error>>(())
    /// ```
    pub fn load(timeout: Duration) -> Result<Self> {
        Self::load_with(timeout, || Some(LibWebp))
    }
}

impl<M: NativeModule> Codec<M> {
    /// Initialize an arbitrary module on a worker thread, bounded by `timeout`.
    ///
    /// `init` returning `None`, panicking, or producing a module without a
    /// usable version all yield [`Error::CodecUnavailable`].
    pub fn load_with<F>(timeout: Duration, init: F) -> Result<Self>
    where
        F: FnOnce() -> Option<M> + Send + 'static,
        M: Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("codec-load".into())
            .spawn(move || {
                let loaded = init().and_then(|module| {
                    let version = module.version()?;
                    Some((module, version))
                });
                // The receiver is gone if we already timed out.
                let _ = tx.send(loaded);
            })
            .map_err(|e| at!(Error::CodecUnavailable(format!("cannot spawn loader: {}", e))))?;

        match rx.recv_timeout(timeout) {
            Ok(Some((module, version))) => {
                let codec = Self { module, version };
                let (major, minor, patch) = codec.version();
                log::debug!("codec module loaded: {}.{}.{}", major, minor, patch);
                Ok(codec)
            }
            Ok(None) => Err(at!(Error::CodecUnavailable(
                "module reports no usable version".into()
            ))),
            Err(mpsc::RecvTimeoutError::Timeout) => Err(at!(Error::CodecUnavailable(format!(
                "module not ready after {:?}",
                timeout
            )))),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(at!(Error::CodecUnavailable(
                "module initialization panicked".into()
            ))),
        }
    }

    /// Wrap an already initialized module.
    pub fn from_module(module: M) -> Result<Self> {
        let version = module.version().ok_or_else(|| {
            at!(Error::CodecUnavailable(
                "module reports no usable version".into()
            ))
        })?;
        Ok(Self { module, version })
    }

    /// Module version as (major, minor, patch).
    pub fn version(&self) -> (u32, u32, u32) {
        let v = self.version;
        ((v >> 16) & 0xff, (v >> 8) & 0xff, v & 0xff)
    }

    /// The wrapped module.
    pub fn module(&self) -> &M {
        &self.module
    }
}
