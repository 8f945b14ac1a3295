use diagconv::prelude::*;
use ndarray::{Array, ArrayD, Axis, IxDyn, array};
use rand::{Rng, SeedableRng, rngs::StdRng};

fn arange(shape: &[usize]) -> ArrayD<i64> {
    let len = shape.iter().product::<usize>() as i64;
    Array::from_iter(0..len)
        .into_shape_with_order(IxDyn(shape))
        .unwrap()
}

fn random(rng: &mut StdRng, shape: &[usize]) -> ArrayD<f64> {
    ArrayD::from_shape_simple_fn(IxDyn(shape), || rng.gen_range(-1.0..1.0))
}

#[test]
fn matrix_stripe() {
    let x = arange(&[5, 4]);
    assert_eq!(
        diagonal_subtensor(&x, 0, 1).unwrap(),
        array![[12, 9, 6, 3], [16, 13, 10, 7]].into_dyn()
    );
}

#[test]
fn stripes_of_3d_tensor() {
    let x = arange(&[4, 3, 2]);

    let v01 = diagonal_view(&x, 0, 1).unwrap();
    assert_eq!(
        v01.to_owned().unwrap(),
        array![[[12, 13], [8, 9], [4, 5]], [[18, 19], [14, 15], [10, 11]]].into_dyn()
    );

    let v02 = diagonal_view(&x, 0, 2).unwrap();
    assert_eq!(
        v02.to_owned().unwrap(),
        array![
            [[6, 1], [8, 3], [10, 5]],
            [[12, 7], [14, 9], [16, 11]],
            [[18, 13], [20, 15], [22, 17]]
        ]
        .into_dyn()
    );

    // slicing the leading axis commutes with taking the stripe over the others
    let v12 = diagonal_subtensor(&x, 1, 2).unwrap();
    for (xi, vi) in x.outer_iter().zip(v12.outer_iter()) {
        assert_eq!(diagonal_subtensor(&xi, 0, 1).unwrap(), vi.to_owned());
    }
}

#[test]
fn adjoint_round_trip() {
    let mut rng = StdRng::seed_from_u64(7);
    for (shape, row, col) in [
        (vec![6, 3], 0, 1),
        (vec![3, 5], 1, 0),
        (vec![2, 7, 3, 4], 1, 3),
        (vec![4, 2, 4], 2, 0),
        (vec![5, 1, 2], 0, 1),
    ] {
        let x = random(&mut rng, &shape);
        let stripe = diagonal_subtensor(&x, row, col).unwrap();
        let y = random(&mut rng, stripe.shape());

        let [gx, ..] = diagonal_subtensor_grad(&shape, row, col, &y).unwrap();
        let gx = gx.connected().unwrap();
        let lhs = (&stripe * &y).sum();
        let rhs = (&x * &gx).sum();
        assert!((lhs - rhs).abs() < 1e-12, "{shape:?} ({row}, {col})");

        // accumulating into zeros is the same scatter
        let zeros = ArrayD::<f64>::zeros(IxDyn(&shape));
        assert_eq!(accumulate_diagonal(&zeros, row, col, &y).unwrap(), gx);
    }
}

#[test]
fn degenerate_column_axis() {
    let x = arange(&[4, 1, 3]);
    let v = diagonal_view(&x, 0, 1).unwrap();
    assert_eq!(v.shape(), x.shape());
    assert_eq!(v.strides(), &[3, 3, 1]);
    assert_eq!(v.to_owned().unwrap(), x);
}

#[test]
fn stripe_too_short() {
    let x = arange(&[2, 3]);
    let err = diagonal_view(&x, 0, 1).unwrap_err();
    assert_eq!(
        err,
        Error::StripeTooShort {
            row: 0,
            row_len: 2,
            col: 1,
            col_len: 3
        }
    );
    assert_eq!(err.kind(), ErrorKind::Shape);
    assert!(matches!(
        diagonal_view(&x, 0, 2),
        Err(Error::AxisOutOfRange { axis: 2, ndim: 2 })
    ));
}

#[test]
fn accumulate_in_place_through_view() {
    let mut x = ArrayD::<f64>::zeros(IxDyn(&[4, 2, 3]));
    let delta = array![1.0, 2.0, 3.0];
    accumulate_diagonal_inplace(&mut x, 0, 1, &delta).unwrap();
    // every stripe element got the broadcast delta exactly once
    assert_eq!(x.sum(), 3.0 * 2.0 * 6.0);
    assert_eq!(x.sum_axis(Axis(0)).sum_axis(Axis(0)), array![6.0, 12.0, 18.0].into_dyn());

    let mut v = diagonal_view_mut(&mut x, 0, 1).unwrap();
    *v.get_mut(&[0, 0, 0]).unwrap() += 10.0;
    // stripe[0][0] is x[1][0]
    assert_eq!(x[[1, 0, 0]], 11.0);
}
