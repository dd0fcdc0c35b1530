//! Memory allocation policies for buffers.
//!
//! This module provides strategy traits that control how memory is allocated and aligned.

use std::{alloc::Layout, ptr::NonNull};

/// Strategy for initializing allocated memory.
pub trait InitStrategy {
    /// Whether freshly allocated bytes are guaranteed to be zero.
    const ZEROED: bool;

    /// Allocates `layout` from the global allocator according to the
    /// strategy's initialization policy.
    ///
    /// Returns `None` if the allocator reports failure.
    ///
    /// # Safety
    ///
    /// `layout` must have a non-zero size.
    unsafe fn allocate(layout: Layout) -> Option<NonNull<u8>>;
}

/// Strategy for determining memory alignment requirements.
///
/// Implementations define alignment based on target architecture, SIMD capabilities,
/// or custom requirements.
pub trait AlignmentStrategy {
    /// Returns the required memory alignment for type `T`.
    ///
    /// # Returns
    ///
    /// Memory alignment in bytes, always a power of two.
    fn alignment<T>() -> usize;
}

/// SIMD-optimized alignment strategy.
///
/// Automatically selects optimal alignment based on target architecture and available
/// SIMD instruction sets (or the matching cargo feature):
/// - **`ARM64 with NEON`**: 16-byte alignment
/// - **`x86/x86_64 with AVX2`**: 32-byte alignment
/// - **Fallback**: Uses `align_of::<T>()`
///
/// Alignment never drops below `align_of::<T>()`.
pub struct SimdAlignment;

/// 16-byte alignment for ARM NEON SIMD operations.
const NEON_ALIGN: usize = 16;

/// 32-byte alignment for x86 AVX2 SIMD operations.
const AVX2_ALIGN: usize = 32;

impl AlignmentStrategy for SimdAlignment {
    fn alignment<T>() -> usize {
        let simd = if cfg!(any(
            feature = "neon",
            all(target_feature = "neon", target_arch = "aarch64")
        )) {
            NEON_ALIGN
        } else if cfg!(any(
            feature = "avx2",
            all(
                target_feature = "avx2",
                any(target_arch = "x86", target_arch = "x86_64")
            )
        )) {
            AVX2_ALIGN
        } else {
            1
        };
        let ret = simd.max(std::mem::align_of::<T>());
        debug_assert!(ret.is_power_of_two());
        ret
    }
}

/// Uninitialized memory allocation strategy.
///
/// Memory allocated with this strategy contains undefined values. Users must
/// initialize all memory before reading from it.
pub struct Uninitialized;

impl InitStrategy for Uninitialized {
    const ZEROED: bool = false;

    unsafe fn allocate(layout: Layout) -> Option<NonNull<u8>> {
        // SAFETY: caller guarantees `layout` has a non-zero size.
        NonNull::new(unsafe { std::alloc::alloc(layout) })
    }
}

/// Zero-initialized memory allocation strategy.
///
/// Every byte is zero, which is a valid `0.0` for floating point element types.
pub struct Zeroed;

impl InitStrategy for Zeroed {
    const ZEROED: bool = true;

    unsafe fn allocate(layout: Layout) -> Option<NonNull<u8>> {
        // SAFETY: caller guarantees `layout` has a non-zero size.
        NonNull::new(unsafe { std::alloc::alloc_zeroed(layout) })
    }
}
