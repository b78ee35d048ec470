//! Scoped, zero-copy access to caller-owned buffers.
//!
//! Every native call in this crate sees caller memory only through a pin
//! guard. A guard is acquired right before the call and released when it is
//! dropped, which covers every exit path: the native call failing, an early
//! `?` return, or a second buffer of the same call failing to pin after the
//! first one succeeded.
//!
//! Plain Rust buffers (`[T]`, `[T; N]`, `Vec<T>`) pin for free and never
//! fail. A host runtime that keeps its arrays in movable memory implements
//! [`PinSource`] / [`PinSink`] on top of its own pinning primitive; when that
//! primitive refuses, the operation reports [`Error::AllocationFailure`]
//! without calling into the codec.
//!
//! ```
//! use giztoy_vocodec::pin;
//!
//! let samples = vec![1i16, 2, 3];
//! let sum = pin::with_pinned(&samples[..], |view| {
//!     view.as_slice().iter().map(|&s| s as i32).sum::<i32>()
//! }).unwrap();
//! assert_eq!(sum, 6);
//! ```

use std::ptr::{self, NonNull};

use crate::error::{Error, Result};

/// What happens to the pinned contents on release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseMode {
    /// Keep writes made through the view (output buffers).
    Commit,
    /// Discard the view without copy-back (input buffers).
    Abort,
}

/// A caller-owned buffer the native layer may read.
///
/// # Safety
///
/// A pointer returned by `acquire` must be valid for reads of
/// `source_len()` elements and must not be written by anyone until the
/// matching `release`.
pub unsafe trait PinSource<T> {
    /// Number of elements the pin exposes.
    fn source_len(&self) -> usize;

    /// Pins the storage. `None` means the host could not pin it.
    fn acquire(&self) -> Option<NonNull<T>>;

    /// Unpins storage previously returned by `acquire`.
    fn release(&self, _ptr: NonNull<T>, _mode: ReleaseMode) {}
}

/// A caller-owned buffer the native layer may write.
///
/// # Safety
///
/// A pointer returned by `acquire_mut` must be valid for reads and writes of
/// `sink_len()` elements, exclusively, until the matching `release_mut`.
pub unsafe trait PinSink<T> {
    /// Number of elements the pin exposes.
    fn sink_len(&self) -> usize;

    /// Pins the storage for writing. `None` means the host could not pin it.
    fn acquire_mut(&mut self) -> Option<NonNull<T>>;

    /// Unpins storage previously returned by `acquire_mut`.
    fn release_mut(&mut self, _ptr: NonNull<T>, _mode: ReleaseMode) {}
}

unsafe impl<T> PinSource<T> for [T] {
    fn source_len(&self) -> usize {
        self.len()
    }

    fn acquire(&self) -> Option<NonNull<T>> {
        NonNull::new(self.as_ptr() as *mut T)
    }
}

unsafe impl<T> PinSink<T> for [T] {
    fn sink_len(&self) -> usize {
        self.len()
    }

    fn acquire_mut(&mut self) -> Option<NonNull<T>> {
        NonNull::new(self.as_mut_ptr())
    }
}

unsafe impl<T> PinSource<T> for Vec<T> {
    fn source_len(&self) -> usize {
        self.len()
    }

    fn acquire(&self) -> Option<NonNull<T>> {
        self.as_slice().acquire()
    }
}

unsafe impl<T> PinSink<T> for Vec<T> {
    fn sink_len(&self) -> usize {
        self.len()
    }

    fn acquire_mut(&mut self) -> Option<NonNull<T>> {
        self.as_mut_slice().acquire_mut()
    }
}

unsafe impl<T, const N: usize> PinSource<T> for [T; N] {
    fn source_len(&self) -> usize {
        N
    }

    fn acquire(&self) -> Option<NonNull<T>> {
        self.as_slice().acquire()
    }
}

unsafe impl<T, const N: usize> PinSink<T> for [T; N] {
    fn sink_len(&self) -> usize {
        N
    }

    fn acquire_mut(&mut self) -> Option<NonNull<T>> {
        self.as_mut_slice().acquire_mut()
    }
}

/// Read-only pinned view. Released with [`ReleaseMode::Abort`] on drop.
pub struct Pinned<'a, T, B: PinSource<T> + ?Sized> {
    buf: &'a B,
    ptr: NonNull<T>,
    len: usize,
}

impl<T, B: PinSource<T> + ?Sized> Pinned<'_, T, B> {
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[T] {
        // Safety: PinSource guarantees `len` readable elements while pinned.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl<T, B: PinSource<T> + ?Sized> Drop for Pinned<'_, T, B> {
    fn drop(&mut self) {
        self.buf.release(self.ptr, ReleaseMode::Abort);
    }
}

/// Writable pinned view. Released with [`ReleaseMode::Commit`] on drop.
pub struct PinnedMut<'a, T, B: PinSink<T> + ?Sized> {
    buf: &'a mut B,
    ptr: NonNull<T>,
    len: usize,
}

impl<T, B: PinSink<T> + ?Sized> PinnedMut<'_, T, B> {
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // Safety: PinSink guarantees `len` exclusive elements while pinned.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl<T, B: PinSink<T> + ?Sized> Drop for PinnedMut<'_, T, B> {
    fn drop(&mut self) {
        self.buf.release_mut(self.ptr, ReleaseMode::Commit);
    }
}

/// A pin of a buffer that may be absent. An absent buffer is never pinned
/// and shows up as a null pointer of length zero.
pub struct MaybePinned<'a, T, B: PinSource<T> + ?Sized> {
    inner: Option<Pinned<'a, T, B>>,
}

impl<T, B: PinSource<T> + ?Sized> MaybePinned<'_, T, B> {
    pub fn as_ptr(&self) -> *const T {
        match &self.inner {
            Some(p) => p.as_ptr(),
            None => ptr::null(),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.as_ref().map_or(0, |p| p.len())
    }

    pub fn is_absent(&self) -> bool {
        self.inner.is_none()
    }
}

/// Pins `buf` for reading.
pub fn pin<T, B: PinSource<T> + ?Sized>(buf: &B) -> Result<Pinned<'_, T, B>> {
    let len = buf.source_len();
    let ptr = buf.acquire().ok_or(Error::AllocationFailure)?;
    Ok(Pinned { buf, ptr, len })
}

/// Pins `buf` for writing.
pub fn pin_mut<T, B: PinSink<T> + ?Sized>(buf: &mut B) -> Result<PinnedMut<'_, T, B>> {
    let len = buf.sink_len();
    let ptr = buf.acquire_mut().ok_or(Error::AllocationFailure)?;
    Ok(PinnedMut { buf, ptr, len })
}

/// Pins `buf` if present. `None` bypasses pinning entirely.
pub fn pin_optional<T, B: PinSource<T> + ?Sized>(buf: Option<&B>) -> Result<MaybePinned<'_, T, B>> {
    let inner = match buf {
        Some(b) => Some(pin(b)?),
        None => None,
    };
    Ok(MaybePinned { inner })
}

/// Runs `f` with a read-only view of `buf`, releasing it afterwards.
pub fn with_pinned<T, B, R, F>(buf: &B, f: F) -> Result<R>
where
    B: PinSource<T> + ?Sized,
    F: FnOnce(&Pinned<'_, T, B>) -> R,
{
    let view = pin(buf)?;
    Ok(f(&view))
}

/// Runs `f` with a writable view of `buf`, releasing it afterwards.
pub fn with_pinned_mut<T, B, R, F>(buf: &mut B, f: F) -> Result<R>
where
    B: PinSink<T> + ?Sized,
    F: FnOnce(&mut PinnedMut<'_, T, B>) -> R,
{
    let mut view = pin_mut(buf)?;
    Ok(f(&mut view))
}

#[cfg(test)]
pub(crate) mod testing {
    //! A host-array double that counts pins and can refuse them.

    use super::*;
    use std::cell::Cell;

    pub(crate) struct HostArray<T> {
        data: Vec<T>,
        refuse: bool,
        pins: Cell<usize>,
        releases: Cell<usize>,
        last_mode: Cell<Option<ReleaseMode>>,
    }

    impl<T> HostArray<T> {
        pub(crate) fn new(data: Vec<T>) -> Self {
            Self {
                data,
                refuse: false,
                pins: Cell::new(0),
                releases: Cell::new(0),
                last_mode: Cell::new(None),
            }
        }

        pub(crate) fn refusing(data: Vec<T>) -> Self {
            Self { refuse: true, ..Self::new(data) }
        }

        pub(crate) fn pins(&self) -> usize {
            self.pins.get()
        }

        pub(crate) fn releases(&self) -> usize {
            self.releases.get()
        }

        pub(crate) fn last_mode(&self) -> Option<ReleaseMode> {
            self.last_mode.get()
        }

        pub(crate) fn data(&self) -> &[T] {
            &self.data
        }

        fn record_release(&self, mode: ReleaseMode) {
            self.releases.set(self.releases.get() + 1);
            self.last_mode.set(Some(mode));
        }
    }

    unsafe impl<T> PinSource<T> for HostArray<T> {
        fn source_len(&self) -> usize {
            self.data.len()
        }

        fn acquire(&self) -> Option<NonNull<T>> {
            if self.refuse {
                return None;
            }
            self.pins.set(self.pins.get() + 1);
            self.data.acquire()
        }

        fn release(&self, _ptr: NonNull<T>, mode: ReleaseMode) {
            self.record_release(mode);
        }
    }

    unsafe impl<T> PinSink<T> for HostArray<T> {
        fn sink_len(&self) -> usize {
            self.data.len()
        }

        fn acquire_mut(&mut self) -> Option<NonNull<T>> {
            if self.refuse {
                return None;
            }
            self.pins.set(self.pins.get() + 1);
            self.data.acquire_mut()
        }

        fn release_mut(&mut self, _ptr: NonNull<T>, mode: ReleaseMode) {
            self.record_release(mode);
        }
    }
}
