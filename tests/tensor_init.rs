use autograd::{DType, Graph, TensorError};

#[test]
fn scalar_input() {
    let mut g = Graph::new();
    let t0 = g.tensor(2.5, false).unwrap();
    let t0 = g.get(t0).unwrap();
    assert_eq!(t0.dtype(), DType::F64);
    assert!(t0.shape().is_scalar());
    assert!(t0.grad().is_none());
    assert!(t0.parents().is_empty());
    assert_eq!(t0.op_label(), "");
    assert_eq!(t0.item(), Some(2.5));
}

#[test]
fn integer_list_input() {
    let mut g = Graph::new();
    let t1 = g.tensor(vec![1, 2, 3], true).unwrap();
    let t1 = g.get(t1).unwrap();
    assert_eq!(t1.dtype(), DType::F64);
    assert_eq!(t1.shape().dims(), &[3]);
    assert!(t1.requires_grad());
    assert!(t1.grad().is_none());
    assert!(t1.parents().is_empty());
    assert_eq!(t1.value(), &[1.0, 2.0, 3.0]);
}

#[test]
fn existing_f32_array_input() {
    let mut g = Graph::new();
    let arr = ndarray::Array1::<f32>::from(vec![1.0, 2.0]);
    let t2 = g.tensor(&arr, false).unwrap();
    let t2 = g.get(t2).unwrap();
    assert_eq!(t2.dtype(), DType::F64);
    assert!(!t2.requires_grad());
    assert_eq!(t2.value(), &[1.0, 2.0]);
}

#[test]
fn existing_tensor_input_is_copied_as_leaf() {
    let mut g = Graph::new();
    let a = g.tensor([1.0, 2.0], false).unwrap();
    let b = g.mul(a, 2.0).unwrap();

    let mut other = Graph::new();
    let copy = other.tensor(g.get(b).unwrap(), true).unwrap();
    let copy = other.get(copy).unwrap();
    assert_eq!(copy.value(), &[2.0, 4.0]);
    assert_eq!(copy.op_label(), "");
    assert!(copy.parents().is_empty());
    assert!(copy.requires_grad());
}

#[test]
fn invalid_input_is_rejected() {
    let mut g = Graph::new();
    let err = g.tensor(vec![vec![1.0, 2.0], vec![3.0]], false).unwrap_err();
    assert!(err.is_construction());
    assert!(matches!(
        g.tensor(f64::INFINITY, false),
        Err(TensorError::Construction { .. })
    ));
    assert!(g.is_empty());
}

#[test]
fn display_mirrors_repr() {
    let mut g = Graph::new();
    let x = g.tensor([1, 2], true).unwrap();
    let y = g.neg(x).unwrap();
    assert_eq!(
        g.get(x).unwrap().to_string(),
        "Tensor(data=[1.0, 2.0], requires_grad=true, op='')"
    );
    assert_eq!(
        g.get(y).unwrap().to_string(),
        "Tensor(data=[-1.0, -2.0], requires_grad=false, op='neg')"
    );
}
