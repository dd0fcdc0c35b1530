//! The tensor arena and the public operation surface.

use log::trace;

use crate::{Tensor, error::TensorError, op::Op, tensor::TensorId, tensorizable::Tensorizable};

/// Which tensors receive gradient during a backward pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GradPolicy {
    /// Every ancestor of the root accumulates gradient; `requires_grad` is
    /// informational only.
    #[default]
    All,
    /// Only tensors created with `requires_grad`, and tensors computed from
    /// at least one of them, accumulate gradient.
    RequiresGrad,
}

#[derive(Debug, Clone, Default)]
pub struct GraphConfig {
    pub grad_policy: GradPolicy,
}

impl GraphConfig {
    #[must_use]
    pub fn with_grad_policy(mut self, grad_policy: GradPolicy) -> Self {
        self.grad_policy = grad_policy;
        self
    }
}

/// Either side of an arithmetic operation: an existing tensor or a bare
/// number that gets promoted to a fresh scalar leaf.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    Tensor(TensorId),
    Scalar(f64),
}

impl From<TensorId> for Operand {
    fn from(id: TensorId) -> Self {
        Operand::Tensor(id)
    }
}

impl From<&TensorId> for Operand {
    fn from(id: &TensorId) -> Self {
        Operand::Tensor(*id)
    }
}

impl From<f64> for Operand {
    fn from(value: f64) -> Self {
        Operand::Scalar(value)
    }
}

impl From<f32> for Operand {
    fn from(value: f32) -> Self {
        Operand::Scalar(f64::from(value))
    }
}

impl From<i32> for Operand {
    fn from(value: i32) -> Self {
        Operand::Scalar(f64::from(value))
    }
}

/// Arena owning every tensor of one computation graph.
///
/// Tensors are appended by [`Graph::tensor`] and by the arithmetic operations
/// and are never removed; dropping the graph releases all of them. Tensor ids
/// from one graph are meaningless in another.
#[derive(Debug, Default)]
pub struct Graph {
    tensors: Vec<Tensor>,
    config: GraphConfig,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: GraphConfig) -> Self {
        Self {
            tensors: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Number of tensors in the arena.
    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    /// Creates a leaf tensor from raw data, normalized to `f64`.
    ///
    /// # Errors
    ///
    /// Fails if the data is ragged or contains values that are not finite `f64`s.
    pub fn tensor(
        &mut self,
        data: impl Tensorizable,
        requires_grad: bool,
    ) -> Result<TensorId, TensorError> {
        let mut tensor = data.to_tensor()?;
        tensor.set_requires_grad(requires_grad);
        Ok(self.push(tensor))
    }

    pub fn get(&self, id: TensorId) -> Result<&Tensor, TensorError> {
        self.tensors
            .get(id.index())
            .ok_or(TensorError::UnknownTensor { id })
    }

    pub(crate) fn tensors(&self) -> &[Tensor] {
        &self.tensors
    }

    pub(crate) fn tensors_mut(&mut self) -> &mut [Tensor] {
        &mut self.tensors
    }

    /// Value of a tensor as a row-major slice.
    pub fn value(&self, id: TensorId) -> Result<&[f64], TensorError> {
        Ok(self.get(id)?.value())
    }

    /// Accumulated gradient of a tensor, `None` until a backward pass reaches it.
    pub fn grad(&self, id: TensorId) -> Result<Option<&[f64]>, TensorError> {
        Ok(self.get(id)?.grad())
    }

    pub(crate) fn push(&mut self, tensor: Tensor) -> TensorId {
        let id = TensorId::new(self.tensors.len());
        trace!("new tensor {id}: op='{}' shape={}", tensor.op_label(), tensor.shape());
        self.tensors.push(tensor);
        id
    }

    /// Resolves an operand to a tensor id, materializing scalars as leaves.
    fn coerce(&mut self, operand: Operand) -> Result<TensorId, TensorError> {
        match operand {
            Operand::Tensor(id) => self.get(id).map(|_| id),
            Operand::Scalar(value) => self.tensor(value, false),
        }
    }

    fn apply(&mut self, op: Op) -> Result<TensorId, TensorError> {
        let (storage, shape) = op.forward(&self.tensors)?;
        let tracks_grad = match self.config.grad_policy {
            GradPolicy::All => true,
            GradPolicy::RequiresGrad => op
                .operands()
                .iter()
                .any(|id| self.tensors[id.index()].tracks_grad()),
        };
        Ok(self.push(Tensor::from_op(storage, shape, op, tracks_grad)))
    }

    fn binary(
        &mut self,
        lhs: impl Into<Operand>,
        rhs: impl Into<Operand>,
        make: fn(TensorId, TensorId) -> Op,
    ) -> Result<TensorId, TensorError> {
        let (lhs, rhs) = (lhs.into(), rhs.into());
        // validate tensor operands before materializing any scalar leaf
        for operand in [lhs, rhs] {
            if let Operand::Tensor(id) = operand {
                self.get(id)?;
            }
        }
        let a = self.coerce(lhs)?;
        let b = self.coerce(rhs)?;
        self.apply(make(a, b))
    }

    fn unary(&mut self, x: TensorId, op: Op) -> Result<TensorId, TensorError> {
        self.get(x)?;
        self.apply(op)
    }

    /// `lhs + rhs`, elementwise with scalar promotion.
    pub fn add(
        &mut self,
        lhs: impl Into<Operand>,
        rhs: impl Into<Operand>,
    ) -> Result<TensorId, TensorError> {
        self.binary(lhs, rhs, Op::Add)
    }

    /// `lhs - rhs`, elementwise with scalar promotion.
    pub fn sub(
        &mut self,
        lhs: impl Into<Operand>,
        rhs: impl Into<Operand>,
    ) -> Result<TensorId, TensorError> {
        self.binary(lhs, rhs, Op::Sub)
    }

    /// Reverse subtraction `c - x`.
    pub fn rsub(&mut self, x: TensorId, c: impl Into<Operand>) -> Result<TensorId, TensorError> {
        self.binary(c, x, Op::Sub)
    }

    pub fn neg(&mut self, x: TensorId) -> Result<TensorId, TensorError> {
        self.unary(x, Op::Neg(x))
    }

    /// `lhs * rhs`, elementwise with scalar promotion.
    pub fn mul(
        &mut self,
        lhs: impl Into<Operand>,
        rhs: impl Into<Operand>,
    ) -> Result<TensorId, TensorError> {
        self.binary(lhs, rhs, Op::Mul)
    }

    /// `x` raised to a constant exponent.
    pub fn pow(&mut self, x: TensorId, exponent: f64) -> Result<TensorId, TensorError> {
        self.unary(x, Op::Pow(x, exponent))
    }

    /// Sum of all elements, as a scalar tensor.
    pub fn sum(&mut self, x: TensorId) -> Result<TensorId, TensorError> {
        self.unary(x, Op::Sum(x))
    }

    /// Mean of all elements, as a scalar tensor.
    pub fn mean(&mut self, x: TensorId) -> Result<TensorId, TensorError> {
        self.unary(x, Op::Mean(x))
    }
}
