//! Allocator primitive: the single choke point for dynamic memory.
//!
//! Every buffer the runtime owns is obtained, resized and released through
//! [`reallocate`]. Failure is fatal: the process aborts, there is no
//! recoverable path. A per-thread byte counter tracks the net number of
//! bytes handed out so a collector can pace itself off it.

use core::cell::Cell;
use core::fmt;
use core::marker::PhantomData;
use core::mem;
use core::ptr::NonNull;
use std::alloc::{self, Layout};

thread_local! {
    static BYTES_ALLOCATED: Cell<usize> = const { Cell::new(0) };
}

/// Net bytes currently allocated through [`reallocate`] on this thread.
pub fn bytes_allocated() -> usize {
    BYTES_ALLOCATED.with(|b| b.get())
}

/// Reasons the allocator gives up. Only ever used to describe the abort.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MemoryError {
    /// The requested size does not form a valid layout.
    CapacityOverflow,
    /// The system allocator returned null.
    OutOfMemory { size: usize },
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryError::CapacityOverflow => f.write_str("capacity overflow"),
            MemoryError::OutOfMemory { size } => {
                write!(f, "out of memory allocating {} bytes", size)
            }
        }
    }
}

#[cold]
#[inline(never)]
fn fatal(err: MemoryError) -> ! {
    log::error!("allocator: {}, aborting", err);
    std::process::abort();
}

/// Allocate, grow, shrink or free a raw buffer.
///
/// - `new_size == 0` frees `ptr` (if any) and returns `None`.
/// - otherwise returns a block of `new_size` bytes whose first
///   `min(old_size, new_size)` bytes match the old block.
///
/// Aborts the process if the request cannot be satisfied.
///
/// # Safety
///
/// `ptr` must be `None`, or a block previously returned by this function
/// with the same `align` and a size of exactly `old_size`. `align` must be
/// a power of two.
pub unsafe fn reallocate(
    ptr: Option<NonNull<u8>>,
    align: usize,
    old_size: usize,
    new_size: usize,
) -> Option<NonNull<u8>> {
    if new_size == 0 {
        if let Some(p) = ptr {
            if old_size != 0 {
                alloc::dealloc(p.as_ptr(), Layout::from_size_align_unchecked(old_size, align));
            }
        }
        account(old_size, 0);
        return None;
    }

    let layout = match Layout::from_size_align(new_size, align) {
        Ok(layout) => layout,
        Err(_) => fatal(MemoryError::CapacityOverflow),
    };

    let raw = match ptr {
        Some(p) if old_size != 0 => alloc::realloc(
            p.as_ptr(),
            Layout::from_size_align_unchecked(old_size, align),
            new_size,
        ),
        _ => alloc::alloc(layout),
    };

    match NonNull::new(raw) {
        Some(p) => {
            account(old_size, new_size);
            Some(p)
        }
        None => fatal(MemoryError::OutOfMemory { size: new_size }),
    }
}

fn account(old_size: usize, new_size: usize) {
    BYTES_ALLOCATED.with(|b| {
        let current = b.get();
        b.set(current.saturating_sub(old_size).saturating_add(new_size));
    });
}

/// Fixed-length array of `T` whose storage comes from [`reallocate`].
///
/// The array exclusively owns its storage and releases it on drop, so every
/// path that discards the array (including replacement during a rehash)
/// returns the bytes to the allocator.
///
/// Zero-sized element types are rejected at compile time:
///
/// ```compile_fail
/// let _ = intern_table::RawArray::<()>::filled(3, ());
/// ```
pub struct RawArray<T> {
    ptr: Option<NonNull<T>>,
    len: usize,
    // !Send + !Sync: the byte counter is per-thread.
    _marker: PhantomData<*mut T>,
}

impl<T: Copy> RawArray<T> {
    const NOT_ZERO_SIZED: () = assert!(
        mem::size_of::<T>() != 0,
        "zero-sized elements are not supported"
    );

    /// An array with no storage.
    pub const fn new() -> Self {
        let () = Self::NOT_ZERO_SIZED;
        Self {
            ptr: None,
            len: 0,
            _marker: PhantomData,
        }
    }

    /// An array of `len` copies of `value`.
    pub fn filled(len: usize, value: T) -> Self {
        let mut array = Self::new();
        array.resize(len, value);
        array
    }

    pub fn from_slice(items: &[T]) -> Self {
        let mut array = Self::new();
        if let Some(first) = items.first() {
            array.resize(items.len(), *first);
            array.as_mut_slice().copy_from_slice(items);
        }
        array
    }

    fn byte_size(len: usize) -> usize {
        match mem::size_of::<T>().checked_mul(len) {
            Some(bytes) => bytes,
            None => fatal(MemoryError::CapacityOverflow),
        }
    }

    /// Grow or shrink to `new_len`, keeping the common prefix and filling
    /// any new tail with `fill`.
    pub fn resize(&mut self, new_len: usize, fill: T) {
        let () = Self::NOT_ZERO_SIZED;
        if new_len == self.len {
            return;
        }
        let old_len = self.len;
        let ptr = unsafe {
            reallocate(
                self.ptr.map(NonNull::cast),
                mem::align_of::<T>(),
                Self::byte_size(old_len),
                Self::byte_size(new_len),
            )
        };
        self.ptr = ptr.map(NonNull::cast);
        self.len = new_len;
        if let Some(p) = self.ptr {
            for i in old_len..new_len {
                // SAFETY: i < new_len and the block holds new_len elements.
                unsafe { p.as_ptr().add(i).write(fill) };
            }
        }
    }

    /// Release the storage and become empty.
    pub fn release(&mut self) {
        if self.ptr.is_none() {
            return;
        }
        log::trace!("releasing {} bytes", Self::byte_size(self.len));
        unsafe {
            reallocate(
                self.ptr.take().map(NonNull::cast),
                mem::align_of::<T>(),
                Self::byte_size(self.len),
                0,
            );
        }
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[T] {
        match self.ptr {
            // SAFETY: the block holds `len` initialised elements.
            Some(p) => unsafe { core::slice::from_raw_parts(p.as_ptr(), self.len) },
            None => &[],
        }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        match self.ptr {
            // SAFETY: as above; `&mut self` guarantees exclusivity.
            Some(p) => unsafe { core::slice::from_raw_parts_mut(p.as_ptr(), self.len) },
            None => &mut [],
        }
    }
}

impl<T: Copy> Default for RawArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for RawArray<T> {
    fn drop(&mut self) {
        if let Some(p) = self.ptr.take() {
            let bytes = mem::size_of::<T>() * self.len;
            log::trace!("releasing {} bytes", bytes);
            unsafe {
                reallocate(Some(p.cast()), mem::align_of::<T>(), bytes, 0);
            }
            self.len = 0;
        }
    }
}

impl<T: Copy + fmt::Debug> fmt::Debug for RawArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}
