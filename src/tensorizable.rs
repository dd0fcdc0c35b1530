use ndarray::{ArrayBase, Data, Dimension};
use num_traits::ToPrimitive;

use crate::{Tensor, error::TensorError, shape::Shape, storage::Storage};

/// Primitive numeric element accepted as tensor input. Every element is
/// normalized to `f64` on construction.
pub trait Element: Copy + ToPrimitive {}

macro_rules! impl_element {
    ($($t:ty),* $(,)?) => {
        $(impl Element for $t {})*
    };
}

impl_element!(f32, f64, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

pub trait Tensorizable {
    /// Trait to convert and arbitrary data into a leaf tensor.
    ///
    /// # Errors
    /// Returns an error if conversion fails.
    fn to_tensor(self) -> Result<Tensor, TensorError>;
}

fn to_f64<T: Element>(value: T) -> Result<f64, TensorError> {
    let v = value
        .to_f64()
        .ok_or_else(|| TensorError::construction("element is not representable as f64"))?;
    if !v.is_finite() {
        return Err(TensorError::construction(format!(
            "non-finite element {v} is not accepted"
        )));
    }
    Ok(v)
}

fn build<T: Element>(
    shape: Shape,
    values: impl ExactSizeIterator<Item = T>,
) -> Result<Tensor, TensorError> {
    let mut buf = Vec::with_capacity(values.len());
    for v in values {
        buf.push(to_f64(v)?);
    }
    debug_assert_eq!(buf.len(), shape.numel());
    Ok(Tensor::from_raw(Storage::from_slice(&buf), shape, false))
}

macro_rules! impl_scalar {
    ($($t:ty),* $(,)?) => {
        $(
            impl Tensorizable for $t {
                fn to_tensor(self) -> Result<Tensor, TensorError> {
                    build(Shape::scalar(), std::iter::once(self))
                }
            }
        )*
    };
}

impl_scalar!(f32, f64, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl<T: Element> Tensorizable for Vec<T> {
    fn to_tensor(self) -> Result<Tensor, TensorError> {
        build(Shape::from(self.len()), self.into_iter())
    }
}

impl<T: Element> Tensorizable for &[T] {
    fn to_tensor(self) -> Result<Tensor, TensorError> {
        build(Shape::from(self.len()), self.iter().copied())
    }
}

impl<T: Element> Tensorizable for Vec<Vec<T>> {
    fn to_tensor(self) -> Result<Tensor, TensorError> {
        let (dim0, dim1) = (self.len(), self.first().map_or(0, Vec::len));
        if let Some(row) = self.iter().find(|x| x.len() != dim1) {
            let expected = (self.len(), dim1).into();
            let received = (self.len(), row.len()).into();
            return Err(TensorError::InconsistentDimensions { expected, received });
        }

        let buf: Vec<T> = self.into_iter().flatten().collect();
        build((dim0, dim1).into(), buf.into_iter())
    }
}

fn check_vec_3d<T>(data: &[Vec<Vec<T>>]) -> Result<Shape, TensorError> {
    if data.is_empty() {
        return Ok((0, 0, 0).into());
    }
    let planes = data.len();

    let expected_rows = data[0].len();
    let expected_columns = data[0].first().map_or(0, Vec::len);

    for plane in data {
        let actual_rows = plane.len();
        if actual_rows != expected_rows {
            return Err(TensorError::InconsistentDimensions {
                expected: (planes, expected_rows, expected_columns).into(),
                received: (planes, actual_rows, expected_columns).into(),
            });
        }

        for row in plane {
            let actual_columns = row.len();
            if actual_columns != expected_columns {
                return Err(TensorError::InconsistentDimensions {
                    expected: (planes, expected_rows, expected_columns).into(),
                    received: (planes, actual_rows, actual_columns).into(),
                });
            }
        }
    }

    Ok((planes, expected_rows, expected_columns).into())
}

impl<T: Element> Tensorizable for Vec<Vec<Vec<T>>> {
    fn to_tensor(self) -> Result<Tensor, TensorError> {
        let shape = check_vec_3d(&self)?;

        let buf: Vec<_> = self
            .into_iter()
            .flat_map(|v| v.into_iter().flatten())
            .collect();

        build(shape, buf.into_iter())
    }
}

impl<T: Element, const N: usize> Tensorizable for [T; N] {
    fn to_tensor(self) -> Result<Tensor, TensorError> {
        build(Shape::from(N), self.into_iter())
    }
}

impl<T: Element, const N0: usize, const N1: usize> Tensorizable for [[T; N1]; N0] {
    fn to_tensor(self) -> Result<Tensor, TensorError> {
        let buf: Vec<T> = self.into_iter().flatten().collect();
        build((N0, N1).into(), buf.into_iter())
    }
}

impl<T: Element, const N0: usize, const N1: usize, const N2: usize> Tensorizable
    for [[[T; N2]; N1]; N0]
{
    fn to_tensor(self) -> Result<Tensor, TensorError> {
        let buf: Vec<_> = self
            .into_iter()
            .flat_map(|v| v.into_iter().flatten())
            .collect();

        build((N0, N1, N2).into(), buf.into_iter())
    }
}

/// Existing `ndarray` arrays of any rank and numeric element type.
impl<S, D> Tensorizable for &ArrayBase<S, D>
where
    S: Data,
    S::Elem: Element,
    D: Dimension,
{
    fn to_tensor(self) -> Result<Tensor, TensorError> {
        build(Shape::from(self.shape()), self.iter().copied())
    }
}

/// Copies the value of another tensor into a fresh, unconnected leaf.
impl Tensorizable for &Tensor {
    fn to_tensor(self) -> Result<Tensor, TensorError> {
        Ok(Tensor::from_raw(
            self.storage().clone(),
            self.shape().clone(),
            false,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_inputs_become_rank_zero() {
        let t = 3i32.to_tensor().unwrap();
        assert!(t.shape().is_scalar());
        assert_eq!(t.value(), &[3.0]);
    }

    #[test]
    fn nested_vectors_keep_their_shape() {
        let t = vec![vec![1u8, 2, 3], vec![4, 5, 6]].to_tensor().unwrap();
        assert_eq!(t.shape().dims(), &[2, 3]);
        assert_eq!(t.value(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        let t = [[[1.0f32; 2]; 3]; 4].to_tensor().unwrap();
        assert_eq!(t.shape().dims(), &[4, 3, 2]);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = vec![vec![1.0, 2.0], vec![3.0]].to_tensor().unwrap_err();
        assert_eq!(
            err,
            TensorError::InconsistentDimensions {
                expected: (2, 2).into(),
                received: (2, 1).into(),
            }
        );
        assert!(err.is_construction());

        let err = vec![vec![vec![1.0], vec![2.0]], vec![vec![3.0]]]
            .to_tensor()
            .unwrap_err();
        assert!(matches!(err, TensorError::InconsistentDimensions { .. }));
    }

    #[test]
    fn non_finite_values_are_rejected() {
        assert!(matches!(
            f64::NAN.to_tensor(),
            Err(TensorError::Construction { .. })
        ));
        assert!(vec![1.0, f64::INFINITY].to_tensor().is_err());
        assert!(vec![1.0f32, f32::NEG_INFINITY].to_tensor().is_err());
    }

    #[test]
    fn ndarray_input_of_any_element_type() {
        let arr = ndarray::array![[1.0f32, 2.0], [3.0, 4.0]];
        let t = (&arr).to_tensor().unwrap();
        assert_eq!(t.shape().dims(), &[2, 2]);
        assert_eq!(t.value(), &[1.0, 2.0, 3.0, 4.0]);

        let scalar = ndarray::arr0(5i64);
        assert!((&scalar).to_tensor().unwrap().shape().is_scalar());
    }

    #[test]
    fn empty_vector_is_allowed() {
        let t = Vec::<f64>::new().to_tensor().unwrap();
        assert_eq!(t.shape().dims(), &[0]);
        assert_eq!(t.numel(), 0);
    }
}
