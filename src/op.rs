//! Primitive operations: eager forward kernels and local derivative rules.
//!
//! Every non-leaf [`Tensor`] carries the [`Op`] that produced it. The variant
//! holds the operand ids and any parameter fixed at call time, and is all the
//! backward engine needs to compute the tensor's vector-Jacobian product.

use crate::{Tensor, error::TensorError, shape::Shape, storage::Storage, tensor::TensorId};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Op {
    /// Created directly from data.
    Leaf,
    Add(TensorId, TensorId),
    Sub(TensorId, TensorId),
    Neg(TensorId),
    Mul(TensorId, TensorId),
    /// Exponent is a plain scalar and receives no gradient.
    Pow(TensorId, f64),
    Sum(TensorId),
    Mean(TensorId),
}

impl Op {
    pub fn label(&self) -> &'static str {
        match self {
            Op::Leaf => "",
            Op::Add(..) => "add",
            Op::Sub(..) => "sub",
            Op::Neg(_) => "neg",
            Op::Mul(..) => "mul",
            Op::Pow(..) => "pow",
            Op::Sum(_) => "sum",
            Op::Mean(_) => "mean",
        }
    }

    /// Operand ids in call order. Reused operands appear once per use.
    pub fn operands(&self) -> Vec<TensorId> {
        match *self {
            Op::Leaf => Vec::new(),
            Op::Add(a, b) | Op::Sub(a, b) | Op::Mul(a, b) => vec![a, b],
            Op::Neg(a) | Op::Pow(a, _) | Op::Sum(a) | Op::Mean(a) => vec![a],
        }
    }

    /// Evaluates the operation on already materialized operands.
    ///
    /// `tensors` is the arena the operand ids index into.
    pub(crate) fn forward(
        &self,
        tensors: &[Tensor],
    ) -> Result<(Storage<f64>, Shape), TensorError> {
        let get = |id: TensorId| &tensors[id.index()];
        match *self {
            Op::Leaf => Err(TensorError::construction("a leaf has no forward computation")),
            Op::Add(a, b) => elementwise("add", get(a), get(b), |x, y| x + y),
            Op::Sub(a, b) => elementwise("sub", get(a), get(b), |x, y| x - y),
            Op::Mul(a, b) => elementwise("mul", get(a), get(b), |x, y| x * y),
            Op::Neg(a) => {
                let x = get(a);
                Ok((x.storage().map(|v| -v), x.shape().clone()))
            }
            Op::Pow(a, c) => {
                let x = get(a);
                Ok((x.storage().map(|v| v.powf(c)), x.shape().clone()))
            }
            Op::Sum(a) => {
                let total = get(a).storage().sum();
                Ok((Storage::from_slice(&[total]), Shape::scalar()))
            }
            Op::Mean(a) => {
                let x = get(a);
                let mean = x.storage().sum() / x.numel() as f64;
                Ok((Storage::from_slice(&[mean]), Shape::scalar()))
            }
        }
    }

    /// Local backward rule: given the upstream gradient `g` of the tensor this
    /// op produced (shape `out`), returns one contribution per operand use,
    /// each already shaped like its operand.
    pub(crate) fn backward(
        &self,
        g: &Storage<f64>,
        out: &Shape,
        tensors: &[Tensor],
    ) -> Vec<(TensorId, Storage<f64>)> {
        let get = |id: TensorId| &tensors[id.index()];
        match *self {
            Op::Leaf => Vec::new(),
            Op::Add(a, b) => vec![
                (a, reduce_to(g.clone(), out, get(a).shape())),
                (b, reduce_to(g.clone(), out, get(b).shape())),
            ],
            Op::Sub(a, b) => vec![
                (a, reduce_to(g.clone(), out, get(a).shape())),
                (b, reduce_to(g.map(|v| -v), out, get(b).shape())),
            ],
            Op::Neg(a) => vec![(a, g.map(|v| -v))],
            Op::Mul(a, b) => {
                let (x, y) = (get(a), get(b));
                let dx = broadcast_zip(g, out, y.storage(), y.shape(), |gv, yv| gv * yv);
                let dy = broadcast_zip(g, out, x.storage(), x.shape(), |gv, xv| gv * xv);
                vec![
                    (a, reduce_to(dx, out, x.shape())),
                    (b, reduce_to(dy, out, y.shape())),
                ]
            }
            Op::Pow(a, c) => {
                let x = get(a);
                let dx = Storage::from_exact_iter(
                    g.as_slice()
                        .iter()
                        .zip(x.value())
                        .map(|(gv, xv)| gv * c * xv.powf(c - 1.0)),
                );
                vec![(a, dx)]
            }
            Op::Sum(a) => {
                let seed = g.as_slice().first().copied().unwrap_or(0.0);
                vec![(a, Storage::filled_with(get(a).numel(), seed))]
            }
            Op::Mean(a) => {
                let x = get(a);
                let seed = g.as_slice().first().copied().unwrap_or(0.0);
                let n = x.numel() as f64;
                vec![(a, Storage::filled_with(x.numel(), seed / n))]
            }
        }
    }
}

/// Output shape of a binary elementwise op. Only scalar promotion is supported.
pub(crate) fn broadcast_shape(
    op: &'static str,
    lhs: &Shape,
    rhs: &Shape,
) -> Result<Shape, TensorError> {
    if lhs == rhs || rhs.is_scalar() {
        Ok(lhs.clone())
    } else if lhs.is_scalar() {
        Ok(rhs.clone())
    } else {
        Err(TensorError::ShapeMismatch {
            op,
            lhs: lhs.clone(),
            rhs: rhs.clone(),
        })
    }
}

fn elementwise(
    op: &'static str,
    lhs: &Tensor,
    rhs: &Tensor,
    f: impl Fn(f64, f64) -> f64,
) -> Result<(Storage<f64>, Shape), TensorError> {
    let shape = broadcast_shape(op, lhs.shape(), rhs.shape())?;
    let out = Storage::from_exact_iter((0..shape.numel()).map(|i| {
        f(
            at(lhs.storage(), lhs.shape(), i),
            at(rhs.storage(), rhs.shape(), i),
        )
    }));
    Ok((out, shape))
}

// element `i` of a tensor broadcast to a larger output
#[inline]
fn at(storage: &Storage<f64>, shape: &Shape, i: usize) -> f64 {
    let values = storage.as_slice();
    if shape.is_scalar() { values[0] } else { values[i] }
}

fn broadcast_zip(
    g: &Storage<f64>,
    out: &Shape,
    other: &Storage<f64>,
    other_shape: &Shape,
    f: impl Fn(f64, f64) -> f64,
) -> Storage<f64> {
    let g = g.as_slice();
    Storage::from_exact_iter((0..out.numel()).map(|i| f(g[i], at(other, other_shape, i))))
}

/// Sums a contribution computed at the output shape down to a scalar operand
/// that was broadcast in the forward pass.
fn reduce_to(contribution: Storage<f64>, out: &Shape, target: &Shape) -> Storage<f64> {
    if target.is_scalar() && !out.is_scalar() {
        Storage::from_slice(&[contribution.sum()])
    } else {
        contribution
    }
}
