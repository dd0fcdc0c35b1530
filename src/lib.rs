//! # autograd
//!
//! A minimal reverse-mode automatic differentiation (autodiff) engine in Rust.
//!
//! ## Features
//!
//! - Tensors live in a [`Graph`] arena and are addressed by [`TensorId`], so
//!   identity is construction identity and cycles cannot be built.
//! - Forward operations run eagerly; every result records the [`Op`] that
//!   produced it, which doubles as its local backward rule.
//! - [`Graph::backward`] orders the ancestors of a root with an explicit DFS
//!   stack and accumulates gradients, summing over reused operands.
//! - Values and gradients use aligned memory suitable for AVX2/NEON loads.
//!
//! ```
//! use autograd::Graph;
//!
//! let mut g = Graph::new();
//! let x = g.tensor(3.0, true)?;
//! let xx = g.mul(x, x)?;
//! let z = g.add(xx, x)?;
//! g.backward(z)?;
//! assert_eq!(g.grad(x)?, Some(&[7.0][..]));
//! # Ok::<(), autograd::TensorError>(())
//! ```
//!
//! Gradients are never reset implicitly; call [`Graph::zero_grad`] before
//! reusing a graph for another backward pass.

#![warn(
    clippy::perf,
    clippy::correctness,
    clippy::complexity,
    clippy::style,
    clippy::suspicious,
    // clippy::pedantic
)]
#![deny(clippy::undocumented_unsafe_blocks, clippy::cast_possible_truncation)]
#![allow(clippy::float_cmp)]

pub mod approx;
mod backward;
mod error;
mod graph;
mod memory;
mod op;
mod shape;
mod storage;
mod tensor;
mod tensorizable;

// Re-export core types for convenience.
pub use error::{Result, TensorError};
pub use graph::{GradPolicy, Graph, GraphConfig, Operand};
pub use op::Op;
pub use shape::Shape;
pub use tensor::{DType, Tensor, TensorId};
pub use tensorizable::{Element, Tensorizable};
