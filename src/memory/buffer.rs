use std::{alloc::Layout, marker::PhantomData, ptr::NonNull};

use crate::memory::{
    buffer::utils::zero_trailing_bytes,
    policy::{AlignmentStrategy, InitStrategy, SimdAlignment, Uninitialized, Zeroed},
};

/// Raw, aligned heap storage for elements of type `T`.
///
/// Owns the allocated memory and handles deallocation.
///
/// Ensures specific memory alignment with AVX and NEON requirements.
/// defaulting to 32 bytes for `x86_64` when AVX2 is enabled.
/// and 16 bytes for `aarch64` when NEON is enabled.
/// Defaults to `std::mem::align_of::<T>()` otherwise.
///
/// A buffer of zero elements owns no allocation and holds a dangling pointer.
///
/// # Note
///
/// `Buffer` only drops the underlying allocation.
/// It will **NOT** drop the `T` present in the allocated memory.
/// This storage is intended to be a low-surface-area unsafe pool
/// of aligned memory that can later be layered on with a safe abstraction
#[derive(Debug)]
pub struct Buffer<T> {
    /// Pointer to start of allocation.
    ptr: NonNull<T>,
    /// Number of elements originally requested (`numel`).
    numel: usize,
    /// Full layout used during allocation (includes padding).
    /// `None` when nothing was allocated.
    layout: Option<Layout>,
    _marker: PhantomData<T>,
}

/// Builder for constructing a [`Buffer`] with custom settings.
///
/// This allows customizing number of elements, memory alignment,
/// and whether the memory should be zero-initialized.
pub struct BufferBuilder<I, A>
where
    A: AlignmentStrategy,
    I: InitStrategy,
{
    numel: usize,
    _marker: PhantomData<(A, I)>,
}

// The default constructor sets default policies.
// The return type is explicit: BufferBuilder<Uninitialized, SimdAlignment>
impl BufferBuilder<Uninitialized, SimdAlignment> {
    pub fn new(numel: usize) -> Self {
        Self {
            numel,
            _marker: PhantomData,
        }
    }
}

impl<I: InitStrategy, A: AlignmentStrategy> BufferBuilder<I, A> {
    /// The buffer will be allocated with all bytes set to zero.
    #[must_use]
    pub fn zeroed(self) -> BufferBuilder<Zeroed, A> {
        BufferBuilder::<Zeroed, A> {
            numel: self.numel,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn build<T>(self) -> Buffer<T> {
        Buffer::with_alignment::<I, A>(self.numel)
    }
}

impl<T> Buffer<T> {
    /// Returns a `Buffer` with the given init and alignment policies.
    ///
    /// # Panics
    ///
    /// Panics if `T` is a Zero-Sized Type or the byte size overflows.
    /// Allocation failure is routed to [`std::alloc::handle_alloc_error`].
    fn with_alignment<I: InitStrategy, Align: AlignmentStrategy>(numel: usize) -> Self {
        assert!((std::mem::size_of::<T>() != 0), "ZSTs are not supported.");

        if numel == 0 {
            return Buffer {
                ptr: NonNull::dangling(),
                numel,
                layout: None,
                _marker: PhantomData,
            };
        }

        let align = Align::alignment::<T>();
        let size = self::utils::align_to::<T>(numel, align);
        let layout = Layout::from_size_align(size, align).unwrap_or_else(|_| {
            panic!("layout creation should have valid alignment: {align} and length: {numel}")
        });

        // SAFETY:
        // - `numel != 0` and `T` is not a ZST, so `size > 0`.
        let ptr = unsafe { I::allocate(layout) }
            .unwrap_or_else(|| std::alloc::handle_alloc_error(layout));

        #[cfg(debug_assertions)]
        if !I::ZEROED {
            // SAFETY:
            // - this code is only ran in debug builds.
            // - `ptr.as_ptr()` is a valid non-null aligned pointer to allocated memory.
            // - `size` is the number of *bytes* in the allocation.
            unsafe {
                // poison buffer
                std::ptr::write_bytes(ptr.as_ptr(), 0xAB, size);
            }
        }

        zero_trailing_bytes::<T>(ptr.as_ptr(), numel, size);

        Buffer {
            ptr: ptr.cast(),
            numel,
            layout: Some(layout),
            _marker: PhantomData,
        }
    }

    /// Returns the internal pointer to the underlying memory.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    /// Returns a mutable internal pointer to the underlying memory
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// Return the underlying layout, if anything was allocated.
    #[inline]
    pub fn layout(&self) -> Option<Layout> {
        self.layout
    }

    /// Returns the number of elements originally requested (logical length).
    #[inline]
    pub fn numel(&self) -> usize {
        self.numel
    }
}

impl<T> Drop for Buffer<T> {
    /// Deallocates the buffer. Does **not** drop any `T`s.
    fn drop(&mut self) {
        if let Some(layout) = self.layout() {
            // SAFETY:
            // - `self.ptr` is not modified from the original allocation
            // - `layout` is the same layout used for the original allocation
            unsafe {
                std::alloc::dealloc(self.ptr.as_ptr().cast(), layout);
            }
        }
    }
}

mod utils {
    /// Returns allocation size (in bytes) for `numel` elements of `T`,
    /// rounded up to the nearest multiple of `align`.
    #[inline]
    pub fn align_to<T>(numel: usize, align: usize) -> usize {
        let tsize = std::mem::size_of::<T>();

        let size_in_bytes = numel
            .checked_mul(tsize)
            .unwrap_or_else(|| panic!("numel {numel} * tsize {tsize} overflowed."));

        (size_in_bytes + align - 1) & !(align - 1)
    }

    /// Fills trailing padding bytes with zeroes (if any).
    ///
    /// This is useful when SIMD loads might read past initialized data.
    /// Does nothing if `length * size_of::<T>() >= size`.
    #[inline]
    pub fn zero_trailing_bytes<T>(ptr: *mut u8, length: usize, size: usize) {
        let start_offset = length * std::mem::size_of::<T>();
        if start_offset >= size {
            return;
        }

        let pad_bytes = size - start_offset;

        // SAFETY:
        // - `base.add(start_offset)` is within allocation of `size` bytes
        unsafe {
            std::ptr::write_bytes(ptr.add(start_offset), 0, pad_bytes);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_is_aligned_and_padded() {
        let buf: Buffer<f64> = BufferBuilder::new(3).build();
        let align = SimdAlignment::alignment::<f64>();
        assert_eq!(buf.as_ptr() as usize % align, 0);
        assert_eq!(buf.numel(), 3);
        let layout = buf.layout().unwrap();
        assert_eq!(layout.size() % align, 0);
        assert!(layout.size() >= 3 * std::mem::size_of::<f64>());
    }

    #[test]
    fn empty_buffer_does_not_allocate() {
        let buf: Buffer<f64> = BufferBuilder::new(0).build();
        assert_eq!(buf.numel(), 0);
        assert!(buf.layout().is_none());
    }

    #[test]
    fn zeroed_buffer_reads_as_zero() {
        let buf: Buffer<f64> = BufferBuilder::new(5).zeroed().build();
        // SAFETY: the buffer was zero-allocated for 5 elements and 0 bits is a valid `f64`.
        let values = unsafe { std::slice::from_raw_parts(buf.as_ptr(), buf.numel()) };
        assert!(values.iter().all(|v| *v == 0.0));
    }
}
