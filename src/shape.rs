use std::fmt::Display;

/// Dimensions of a tensor. An empty dimension list is a scalar.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Shape(Vec<usize>);

impl From<()> for Shape {
    fn from((): ()) -> Self {
        Shape::scalar()
    }
}

impl From<(usize, usize, usize)> for Shape {
    fn from(value: (usize, usize, usize)) -> Self {
        Shape(vec![value.0, value.1, value.2])
    }
}

impl From<(usize, usize)> for Shape {
    fn from(value: (usize, usize)) -> Self {
        Shape(vec![value.0, value.1])
    }
}

impl From<usize> for Shape {
    fn from(value: usize) -> Self {
        Shape(vec![value])
    }
}

impl From<Vec<usize>> for Shape {
    fn from(value: Vec<usize>) -> Self {
        Shape(value)
    }
}

impl From<&[usize]> for Shape {
    fn from(value: &[usize]) -> Self {
        Shape(value.to_vec())
    }
}

impl Shape {
    pub fn scalar() -> Self {
        Shape(Vec::new())
    }

    #[inline]
    pub fn is_scalar(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn ndims(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    /// Number of elements described by this shape; `1` for a scalar.
    #[inline]
    pub fn numel(&self) -> usize {
        self.0.iter().product()
    }

    /// Row-major offset of a multi-index.
    ///
    /// # Panics
    ///
    /// Panics if the index rank differs from `ndims()` or any coordinate is out of bounds.
    pub fn linear_index<const D: usize>(&self, index: [usize; D]) -> usize {
        assert_eq!(
            D,
            self.ndims(),
            "index of rank {D} used on {self} with rank {}",
            self.ndims()
        );
        index
            .iter()
            .zip(&self.0)
            .fold(0, |offset, (&i, &dim)| {
                assert!(i < dim, "index {i} out of bounds for dimension of size {dim}");
                offset * dim + i
            })
    }
}

impl Display for Shape {
    /// Tuple notation: `()`, `(3,)`, `(2, 3)`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.as_slice() {
            [] => write!(f, "()"),
            [d] => write!(f, "({d},)"),
            [first, rest @ ..] => {
                write!(f, "({first}")?;
                for d in rest {
                    write!(f, ", {d}")?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_shape() {
        let s = Shape::scalar();
        assert!(s.is_scalar());
        assert_eq!(s.numel(), 1);
        assert_eq!(s.to_string(), "()");
        assert_eq!(s.linear_index::<0>([]), 0);
    }

    #[test]
    fn display_uses_tuple_notation() {
        assert_eq!(Shape::from(3).to_string(), "(3,)");
        assert_eq!(Shape::from((2, 3)).to_string(), "(2, 3)");
        assert_eq!(Shape::from((2, 3, 4)).to_string(), "(2, 3, 4)");
    }

    #[test]
    fn linear_index_is_row_major() {
        let s = Shape::from((2, 3, 4));
        assert_eq!(s.linear_index([0, 0, 0]), 0);
        assert_eq!(s.linear_index([0, 1, 0]), 4);
        assert_eq!(s.linear_index([1, 2, 3]), 23);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn linear_index_checks_bounds() {
        Shape::from((2, 3)).linear_index([2, 0]);
    }

    #[test]
    fn empty_dimension_has_no_elements() {
        assert_eq!(Shape::from(0).numel(), 0);
    }
}
