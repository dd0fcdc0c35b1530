use thiserror::Error;

use crate::{shape::Shape, tensor::TensorId};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TensorError {
    /// Input data cannot be turned into an `f64` tensor.
    #[error("failed to construct tensor: {why}")]
    Construction { why: String },

    /// Nested input rows disagree on their length.
    #[error("inconsistent dimensions. expected: {expected}, received: {received}")]
    InconsistentDimensions { expected: Shape, received: Shape },

    /// Two array operands whose shapes are neither equal nor scalar-vs-array.
    #[error("failed to perform {op}: shapes {lhs} and {rhs} cannot be combined")]
    ShapeMismatch {
        op: &'static str,
        lhs: Shape,
        rhs: Shape,
    },

    /// Missing or incompatible seed for a backward pass.
    #[error("backward failed: {why}")]
    Backward { why: String },

    /// Traversal reached a tensor that is still being expanded.
    #[error("cycle detected at tensor {id}")]
    CycleDetected { id: TensorId },

    /// The id was not issued by this graph.
    #[error("tensor {id} does not belong to this graph")]
    UnknownTensor { id: TensorId },
}

impl TensorError {
    pub fn construction(why: impl Into<String>) -> Self {
        TensorError::Construction { why: why.into() }
    }

    pub fn backward(why: impl Into<String>) -> Self {
        TensorError::Backward { why: why.into() }
    }

    /// Whether the error was raised while turning raw data into a tensor.
    pub fn is_construction(&self) -> bool {
        matches!(
            self,
            TensorError::Construction { .. } | TensorError::InconsistentDimensions { .. }
        )
    }
}

pub type Result<T, E = TensorError> = std::result::Result<T, E>;
