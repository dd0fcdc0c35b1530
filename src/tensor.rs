use std::{fmt, ops::Index};

use crate::{op::Op, shape::Shape, storage::Storage};

/// Construction identity of a tensor inside its [`crate::Graph`].
///
/// Ids are handed out in creation order, so a tensor's parents always carry
/// smaller ids than the tensor itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TensorId(usize);

impl TensorId {
    pub(crate) fn new(index: usize) -> Self {
        TensorId(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Element type of every tensor value. Inputs are normalized to `f64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DType {
    #[default]
    F64,
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DType::F64 => write!(f, "float64"),
        }
    }
}

/// A vertex of the computation graph: an immutable value plus its provenance
/// and an optional accumulated gradient.
pub struct Tensor {
    storage: Storage<f64>,
    shape: Shape,
    requires_grad: bool,
    grad: Option<Storage<f64>>,
    parents: Vec<TensorId>,
    op: Op,
    // whether backward writes into this tensor under the graph's policy
    tracks_grad: bool,
}

impl Tensor {
    /// Builds a detached leaf. Only the graph hands out ids for it.
    pub(crate) fn from_raw(storage: Storage<f64>, shape: Shape, requires_grad: bool) -> Self {
        debug_assert_eq!(storage.len(), shape.numel());
        Self {
            storage,
            shape,
            requires_grad,
            grad: None,
            parents: Vec::new(),
            op: Op::Leaf,
            tracks_grad: requires_grad,
        }
    }

    pub(crate) fn from_op(storage: Storage<f64>, shape: Shape, op: Op, tracks_grad: bool) -> Self {
        debug_assert_eq!(storage.len(), shape.numel());
        Self {
            storage,
            shape,
            requires_grad: false,
            grad: None,
            parents: op.operands(),
            op,
            tracks_grad,
        }
    }

    pub(crate) fn set_requires_grad(&mut self, requires_grad: bool) {
        self.requires_grad = requires_grad;
        self.tracks_grad = requires_grad;
    }

    pub(crate) fn tracks_grad(&self) -> bool {
        self.tracks_grad
    }

    pub(crate) fn storage(&self) -> &Storage<f64> {
        &self.storage
    }

    pub(crate) fn into_parts(self) -> (Storage<f64>, Shape) {
        (self.storage, self.shape)
    }

    pub(crate) fn grad_storage(&self) -> Option<&Storage<f64>> {
        self.grad.as_ref()
    }

    /// Adds `contribution` into the gradient, allocating zeros on first write.
    pub(crate) fn accumulate_grad(&mut self, contribution: &Storage<f64>) {
        let numel = self.shape.numel();
        self.grad
            .get_or_insert_with(|| Storage::zeros(numel))
            .accumulate(contribution);
    }

    pub(crate) fn clear_grad(&mut self) {
        self.grad = None;
    }

    /// Row-major values.
    pub fn value(&self) -> &[f64] {
        self.storage.as_slice()
    }

    /// The single value of a one-element tensor.
    pub fn item(&self) -> Option<f64> {
        match self.storage.as_slice() {
            [v] => Some(*v),
            _ => None,
        }
    }

    /// Accumulated gradient; `None` until a backward pass writes to it.
    pub fn grad(&self) -> Option<&[f64]> {
        self.grad.as_ref().map(Storage::as_slice)
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn numel(&self) -> usize {
        self.storage.len()
    }

    pub fn dtype(&self) -> DType {
        DType::F64
    }

    pub fn requires_grad(&self) -> bool {
        self.requires_grad
    }

    /// Tensors this one was computed from, in operand order.
    pub fn parents(&self) -> &[TensorId] {
        &self.parents
    }

    pub fn op(&self) -> &Op {
        &self.op
    }

    /// `""` for leaves, otherwise the primitive's name.
    pub fn op_label(&self) -> &'static str {
        self.op.label()
    }

    pub fn is_leaf(&self) -> bool {
        self.parents.is_empty()
    }
}

impl<const D: usize> Index<[usize; D]> for Tensor {
    type Output = f64;

    fn index(&self, index: [usize; D]) -> &Self::Output {
        &self.storage.as_slice()[self.shape.linear_index(index)]
    }
}

fn fmt_nested(f: &mut fmt::Formatter<'_>, dims: &[usize], values: &[f64]) -> fmt::Result {
    match dims {
        [] => write!(f, "{:?}", values.first().copied().unwrap_or(f64::NAN)),
        [_, inner @ ..] => {
            let stride: usize = inner.iter().product();
            write!(f, "[")?;
            for (i, chunk) in values.chunks(stride.max(1)).enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                fmt_nested(f, inner, chunk)?;
            }
            write!(f, "]")
        }
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tensor(data=")?;
        fmt_nested(f, self.shape.dims(), self.value())?;
        write!(
            f,
            ", requires_grad={}, op='{}')",
            self.requires_grad,
            self.op_label()
        )
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("value", &self.storage)
            .field("shape", &self.shape)
            .field("requires_grad", &self.requires_grad)
            .field("grad", &self.grad)
            .field("op", &self.op)
            .finish()
    }
}
