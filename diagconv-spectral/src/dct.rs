use core::f64::consts::{FRAC_1_SQRT_2, PI};

use ndarray::Array2;

/// `rows x cols` matrix of DCT-II basis vectors.
///
/// `m[[i, j]] = sqrt(2 / cols) * cos(i * (2j + 1) * pi / (2 * cols))`. With `unitary`
/// the first row is further scaled by `sqrt(1/2)`, which makes the square matrix
/// orthonormal. Multiplying a column vector of `cols` samples gives its first `rows`
/// cepstral coefficients.
pub fn dct_matrix(rows: usize, cols: usize, unitary: bool) -> Array2<f64> {
    let scale = (2.0 / cols as f64).sqrt();
    Array2::from_shape_fn((rows, cols), |(i, j)| {
        let v = (i as f64 * (2 * j + 1) as f64 / (2.0 * cols as f64) * PI).cos() * scale;
        if unitary && i == 0 { v * FRAC_1_SQRT_2 } else { v }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_unitary_is_orthonormal() {
        for n in [1, 2, 5, 8] {
            let m = dct_matrix(n, n, true);
            let gram = m.dot(&m.t());
            let eye = Array2::<f64>::eye(n);
            assert!(
                gram.iter().zip(eye.iter()).all(|(a, b)| (a - b).abs() < 1e-12),
                "{n}: {gram}"
            );
        }
    }

    #[test]
    fn first_row_is_flat() {
        let m = dct_matrix(3, 4, false);
        assert_eq!(m.dim(), (3, 4));
        let flat = (2.0f64 / 4.0).sqrt();
        assert!(m.row(0).iter().all(|v| (v - flat).abs() < 1e-12));

        let u = dct_matrix(3, 4, true);
        assert!(u.row(0).iter().all(|v| (v - 0.5).abs() < 1e-12));
        // rows past the first are untouched by the unitary scaling
        assert_eq!(m.row(2), u.row(2));
    }

    #[test]
    fn empty() {
        assert_eq!(dct_matrix(0, 3, true).dim(), (0, 3));
        assert_eq!(dct_matrix(2, 0, true).dim(), (2, 0));
    }
}
