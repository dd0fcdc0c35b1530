use autograd::{Graph, TensorError, TensorId, approx::allclose};

fn setup() -> (Graph, TensorId, TensorId) {
    let mut g = Graph::new();
    let a = g.tensor([1.0, 2.0, 3.0], false).unwrap();
    let b = g.tensor([4.0, 5.0, 6.0], false).unwrap();
    (g, a, b)
}

fn check_close(g: &Graph, id: TensorId, expected: &[f64]) {
    let actual = g.value(id).unwrap();
    assert!(
        allclose(actual, expected),
        "actual={actual:?} expected={expected:?}"
    );
}

#[test]
fn add_and_radd() {
    let (mut g, a, b) = setup();
    let c = g.add(a, b).unwrap();
    let t = g.get(c).unwrap();
    assert_eq!(t.op_label(), "add");
    assert_eq!(t.parents(), &[a, b]);
    check_close(&g, c, &[5.0, 7.0, 9.0]);

    let c2 = g.add(2.0, a).unwrap();
    assert_eq!(g.get(c2).unwrap().op_label(), "add");
    check_close(&g, c2, &[3.0, 4.0, 5.0]);
}

#[test]
fn neg() {
    let (mut g, a, _) = setup();
    let n = g.neg(a).unwrap();
    let t = g.get(n).unwrap();
    assert_eq!(t.op_label(), "neg");
    assert_eq!(t.parents(), &[a]);
    check_close(&g, n, &[-1.0, -2.0, -3.0]);
}

#[test]
fn sub_and_rsub() {
    let (mut g, a, _) = setup();
    let s = g.sub(a, 1.5).unwrap();
    assert_eq!(g.get(s).unwrap().op_label(), "sub");
    check_close(&g, s, &[-0.5, 0.5, 1.5]);

    let s2 = g.rsub(a, 10.0).unwrap();
    assert_eq!(g.get(s2).unwrap().op_label(), "sub");
    check_close(&g, s2, &[9.0, 8.0, 7.0]);

    let s3 = g.sub(10.0, a).unwrap();
    check_close(&g, s3, &[9.0, 8.0, 7.0]);
}

#[test]
fn mul_and_rmul() {
    let (mut g, a, b) = setup();
    let m = g.mul(a, b).unwrap();
    let t = g.get(m).unwrap();
    assert_eq!(t.op_label(), "mul");
    assert_eq!(t.parents().len(), 2);
    check_close(&g, m, &[4.0, 10.0, 18.0]);

    let m2 = g.mul(3.0, a).unwrap();
    assert_eq!(g.get(m2).unwrap().op_label(), "mul");
    check_close(&g, m2, &[3.0, 6.0, 9.0]);
}

#[test]
fn self_operand_is_listed_twice() {
    let (mut g, a, _) = setup();
    let sq = g.mul(a, a).unwrap();
    assert_eq!(g.get(sq).unwrap().parents(), &[a, a]);
}

#[test]
fn pow() {
    let (mut g, a, _) = setup();
    let p = g.pow(a, 2.0).unwrap();
    let t = g.get(p).unwrap();
    assert_eq!(t.op_label(), "pow");
    assert_eq!(t.parents(), &[a]);
    check_close(&g, p, &[1.0, 4.0, 9.0]);
}

#[test]
fn reductions_are_scalar() {
    let (mut g, a, _) = setup();
    let su = g.sum(a).unwrap();
    assert_eq!(g.get(su).unwrap().op_label(), "sum");
    assert!(g.get(su).unwrap().shape().is_scalar());
    check_close(&g, su, &[6.0]);

    let me = g.mean(a).unwrap();
    assert_eq!(g.get(me).unwrap().op_label(), "mean");
    assert!(g.get(me).unwrap().shape().is_scalar());
    check_close(&g, me, &[2.0]);
}

#[test]
fn inputs_are_not_mutated() {
    let (mut g, a, b) = setup();
    let c = g.add(a, b).unwrap();
    let d = g.mul(c, a).unwrap();
    let e = g.pow(d, 3.0).unwrap();
    let f = g.sub(e, b).unwrap();
    g.mean(f).unwrap();
    check_close(&g, a, &[1.0, 2.0, 3.0]);
    check_close(&g, b, &[4.0, 5.0, 6.0]);
}

#[test]
fn mismatched_arrays_fail() {
    let mut g = Graph::new();
    let a = g.tensor([1.0, 2.0, 3.0], false).unwrap();
    let m = g.tensor([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]], false).unwrap();
    let err = g.mul(a, m).unwrap_err();
    assert!(matches!(err, TensorError::ShapeMismatch { op: "mul", .. }));
    assert_eq!(
        err.to_string(),
        "failed to perform mul: shapes (3,) and (2, 3) cannot be combined"
    );
}
