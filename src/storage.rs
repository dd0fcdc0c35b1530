//! Provides raw, aligned memory storage [`Storage`] for tensor data.
//! Handles allocation, deallocation, and basic access, with memory alignment.

use std::fmt;

use crate::memory::buffer::{Buffer, BufferBuilder};

/// `Storage<T>` is a partially-initialized memory container.
///
/// It wraps [`Buffer<T>`], which handles allocation and layout.
/// - The uninitialized tail (if any) of the `Buffer` is never exposed directly.
pub struct Storage<T> {
    /// See [`crate::memory::buffer::Buffer`].
    buffer: Buffer<T>,
    /// The number of elements guaranteed to be initialized.
    init: usize,
}

impl<T> Storage<T> {
    /// Creates a new storage buffer for `numel` elements.
    ///
    /// Allocated memory is uninitialized. no elements are considered initialized yet.
    pub fn new(numel: usize) -> Self {
        let buffer: Buffer<T> = BufferBuilder::new(numel).build();
        Self { buffer, init: 0 }
    }

    /// Creates a fully initialized storage from an iterator of known length.
    ///
    /// If the iterator under-reports its length, the surplus items are ignored;
    /// if it over-reports, only the yielded prefix is initialized.
    pub fn from_exact_iter(iter: impl ExactSizeIterator<Item = T>) -> Self {
        let mut storage = Self::new(iter.len());
        for value in iter {
            if storage.init == storage.allocated_len() {
                break;
            }
            // SAFETY:
            // - `init < allocated_len()` was checked right above.
            unsafe { storage.write_unchecked(value) };
        }
        storage
    }

    /// writes a value to the next uninitialized slot, extending `init` by 1.
    ///
    /// # Safety
    ///
    /// - `init < allocated_len()` must hold.
    /// - caller must not use old pointers that alias the written memory.
    pub unsafe fn write_unchecked(&mut self, value: T) {
        debug_assert!(self.init < self.allocated_len());
        // SAFETY:
        // - `self.as_mut_ptr()` is a valid, non-null, aligned pointer.
        // - `self.init` < `self.allocated_len()`
        unsafe {
            std::ptr::write(self.as_mut_ptr().add(self.init), value);
        }
        self.init += 1;
    }

    /// Unsafely sets `init = len`.
    /// Caller must ensure elements `[0..len)` are valid.
    ///
    /// # Safety
    ///
    /// - `len <= allocated_len()`
    /// - Elements in `[0, len)` must be initialized.
    pub unsafe fn assume_init(&mut self, len: usize) {
        debug_assert!(len <= self.allocated_len());
        self.init = len;
    }

    /// Returns the number of initialized elements.
    ///
    /// Only elements in `[0, len())` are safe to access.
    pub fn len(&self) -> usize {
        self.init
    }

    /// Returns the number of elements the buffer was originally allocated for.
    pub fn allocated_len(&self) -> usize {
        self.buffer.numel()
    }

    /// Returns a raw const pointer to the start of the buffer.
    ///
    /// Only valid for reads within `[0, init)`.
    pub fn as_ptr(&self) -> *const T {
        self.buffer.as_ptr()
    }

    /// Returns a raw mut pointer to the start of the buffer.
    ///
    /// Only valid for writes within `[0, init)` or for manual initialization.
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.buffer.as_mut_ptr()
    }

    /// Returns a shared slice of all initialized elements `[0, init)`.
    pub fn as_slice(&self) -> &[T] {
        // SAFETY:
        // - `self.as_ptr()` is a valid non-null, aligned pointer to
        //   allocated memory (dangling but aligned when `init == 0`).
        // - `self.init` is a valid number of initialized elements
        //   within the allocated region.
        unsafe { std::slice::from_raw_parts(self.as_ptr(), self.init) }
    }

    /// Returns a mutable slice of all initialized elements `[0, init)`.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY:
        // - `self.as_mut_ptr()` is a valid non-null, aligned pointer to
        //   allocated memory (dangling but aligned when `init == 0`).
        // - `self.init` is a valid number of initialized elements
        //   within the allocated region.
        unsafe { std::slice::from_raw_parts_mut(self.as_mut_ptr(), self.init) }
    }

    /// Applies `f` to every element, producing a new storage of the same length.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Storage<U> {
        Storage::from_exact_iter(self.as_slice().iter().map(f))
    }
}

impl<T: Clone> Storage<T> {
    /// Creates a new storage buffer and clones each element from the given slice.
    ///
    /// All elements are immediately initialized.
    pub fn from_slice(slice: &[T]) -> Self {
        Self::from_exact_iter(slice.iter().cloned())
    }

    /// Creates a new storage buffer of `numel` elements, each cloned from `value`.
    ///
    /// All elements are immediately initialized.
    pub fn filled_with(numel: usize, value: T) -> Self {
        Self::from_exact_iter(std::iter::repeat_n(value, numel))
    }
}

impl Storage<f64> {
    /// Creates a storage of `numel` zeros straight from zeroed memory.
    pub fn zeros(numel: usize) -> Self {
        let buffer: Buffer<f64> = BufferBuilder::new(numel).zeroed().build();
        let mut storage = Self { buffer, init: 0 };
        // SAFETY:
        // - the buffer holds exactly `numel` zero-initialized `f64`s and the
        //   all-zero bit pattern is `0.0`.
        unsafe { storage.assume_init(numel) };
        storage
    }

    /// Adds `other` into `self` elementwise.
    ///
    /// # Panics
    ///
    /// Panics if lengths differ; callers check shapes first.
    pub fn accumulate(&mut self, other: &Storage<f64>) {
        assert_eq!(self.len(), other.len(), "accumulate length mismatch");
        for (dst, src) in self.as_mut_slice().iter_mut().zip(other.as_slice()) {
            *dst += *src;
        }
    }

    /// Sum of every element. `0.0` for an empty storage.
    pub fn sum(&self) -> f64 {
        self.as_slice().iter().sum()
    }
}

impl<T: Clone> Clone for Storage<T> {
    fn clone(&self) -> Self {
        Self::from_slice(self.as_slice())
    }
}

impl<T: fmt::Debug> fmt::Debug for Storage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl<T: PartialEq> PartialEq for Storage<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T> Drop for Storage<T> {
    fn drop(&mut self) {
        // Drop all initialized elements
        for i in 0..self.init {
            // SAFETY:
            // - `buffer.as_mut_ptr()` is a valid, aligned non-null pointer.
            // - `ptr + i` is valid within initialized elements.
            // - `T` at `ptr + i` is initialized.
            unsafe {
                std::ptr::drop_in_place(self.buffer.as_mut_ptr().add(i));
            }
        }
    }
}
