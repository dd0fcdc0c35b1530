//! Aligned raw memory used as backing store for tensor values and gradients.

pub mod buffer;
pub mod policy;
