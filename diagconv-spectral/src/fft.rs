//! `n`-point FFTs along one axis of a matrix.
//!
//! Input lanes are truncated or zero-padded to `n` points. Forward transforms are
//! unnormalized and inverse transforms are scaled by `1/n`, so an inverse after a
//! forward transform of the same length gives back the input.

use core::fmt;

use diagconv_core::{Error, Result};
use ndarray::{Array2, ArrayBase, Axis, Data, Ix2};
use num_complex::{Complex32, Complex64};
use rustfft::FftPlanner;

/// Element types accepted by [`fft`].
pub trait FftSample: Copy {
    /// Whether the type carries an imaginary part.
    const IS_COMPLEX: bool;

    /// Widens to a double precision complex number.
    fn to_c64(self) -> Complex64;
}

impl FftSample for f32 {
    const IS_COMPLEX: bool = false;

    fn to_c64(self) -> Complex64 {
        Complex64::new(f64::from(self), 0.0)
    }
}

impl FftSample for f64 {
    const IS_COMPLEX: bool = false;

    fn to_c64(self) -> Complex64 {
        Complex64::new(self, 0.0)
    }
}

impl FftSample for Complex32 {
    const IS_COMPLEX: bool = true;

    fn to_c64(self) -> Complex64 {
        Complex64::new(f64::from(self.re), f64::from(self.im))
    }
}

impl FftSample for Complex64 {
    const IS_COMPLEX: bool = true;

    fn to_c64(self) -> Complex64 {
        self
    }
}

/// Direction and output extent of a transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FftKind {
    /// Forward transform, all `n` bins.
    #[default]
    Fft,
    /// Forward transform of real input, bins `0..n/2`.
    HalfFft,
    /// Inverse transform, all `n` bins.
    Ifft,
    /// Inverse transform of real input, bins `0..n/2`.
    HalfIfft,
}

impl FftKind {
    /// Whether only the first half of the output is kept.
    pub fn is_half(self) -> bool {
        matches!(self, FftKind::HalfFft | FftKind::HalfIfft)
    }

    /// Whether this is an inverse transform.
    pub fn is_inverse(self) -> bool {
        matches!(self, FftKind::Ifft | FftKind::HalfIfft)
    }

    /// Lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            FftKind::Fft => "fft",
            FftKind::HalfFft => "half_fft",
            FftKind::Ifft => "ifft",
            FftKind::HalfIfft => "half_ifft",
        }
    }

    fn check(self, complex_input: bool, n: usize, axis: usize) -> Result<()> {
        if self.is_half() && complex_input {
            return Err(Error::ComplexHalfSpectrum);
        }
        if axis > 1 {
            return Err(Error::FftAxis(axis));
        }
        if n == 0 {
            return Err(Error::EmptyTransform);
        }
        if self.is_half() && n % 2 != 0 {
            return Err(Error::OddHalfSpectrum(n));
        }
        Ok(())
    }
}

impl fmt::Display for FftKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reusable FFT planner.
///
/// Plans are kept per length and direction, so repeated transforms of one size only
/// pay for planning once.
pub struct FftPlanCache {
    planner: FftPlanner<f64>,
}

impl Default for FftPlanCache {
    fn default() -> Self {
        Self {
            planner: FftPlanner::new(),
        }
    }
}

impl fmt::Debug for FftPlanCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FftPlanCache").finish_non_exhaustive()
    }
}

impl FftPlanCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// `n`-point transform of `frames` along `axis` (`0` for columns, `1` for rows).
    ///
    /// The output has `n` entries along `axis`, or `n / 2` for half kinds.
    pub fn transform<A, S>(
        &mut self,
        frames: &ArrayBase<S, Ix2>,
        n: usize,
        axis: usize,
        kind: FftKind,
    ) -> Result<Array2<Complex64>>
    where
        A: FftSample,
        S: Data<Elem = A>,
    {
        kind.check(A::IS_COMPLEX, n, axis)?;
        let plan = if kind.is_inverse() {
            self.planner.plan_fft_inverse(n)
        } else {
            self.planner.plan_fft_forward(n)
        };
        log::debug!("{kind}: {n} points along axis {axis} of {:?}", frames.shape());

        let mut shape = [frames.nrows(), frames.ncols()];
        shape[axis] = if kind.is_half() { n / 2 } else { n };
        let mut out = Array2::<Complex64>::zeros(shape);
        let scale = if kind.is_inverse() { 1.0 / n as f64 } else { 1.0 };

        let mut buf = vec![Complex64::new(0.0, 0.0); n];
        for (lane, mut out_lane) in frames
            .lanes(Axis(axis))
            .into_iter()
            .zip(out.lanes_mut(Axis(axis)))
        {
            buf.fill(Complex64::new(0.0, 0.0));
            for (slot, &x) in buf.iter_mut().zip(lane.iter()) {
                *slot = x.to_c64();
            }
            plan.process(&mut buf);
            for (o, &b) in out_lane.iter_mut().zip(&buf) {
                *o = b * scale;
            }
        }
        Ok(out)
    }
}

/// `n`-point transform of `frames` along `axis`, planned from scratch.
///
/// See [`FftPlanCache::transform`].
pub fn fft<A, S>(
    frames: &ArrayBase<S, Ix2>,
    n: usize,
    axis: usize,
    kind: FftKind,
) -> Result<Array2<Complex64>>
where
    A: FftSample,
    S: Data<Elem = A>,
{
    FftPlanCache::new().transform(frames, n, axis, kind)
}

/// Gradient of [`fft`] with respect to `frames`.
///
/// Not available: always [`Error::NotImplemented`].
pub fn fft_grad<S, S2>(
    _frames: &ArrayBase<S, Ix2>,
    _grad_output: &ArrayBase<S2, Ix2>,
    _kind: FftKind,
) -> Result<Array2<Complex64>>
where
    S: Data,
    S2: Data<Elem = Complex64>,
{
    Err(Error::NotImplemented {
        op: "fft gradient",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f64::consts::PI;
    use ndarray::{Array, array};

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn dft(x: &[Complex64], inverse: bool) -> Vec<Complex64> {
        let n = x.len();
        let sign = if inverse { 1.0 } else { -1.0 };
        (0..n)
            .map(|k| {
                x.iter()
                    .enumerate()
                    .map(|(j, &v)| {
                        v * Complex64::from_polar(1.0, sign * 2.0 * PI * (j * k) as f64 / n as f64)
                    })
                    .sum::<Complex64>()
            })
            .collect()
    }

    fn close(a: Complex64, b: Complex64) -> bool {
        (a - b).norm() < 1e-9
    }

    #[test]
    fn rows_match_direct_dft() {
        init();
        let x = Array::from_iter((0..12).map(|v| f64::from(v * v % 5)))
            .into_shape_with_order((3, 4))
            .unwrap();
        let y = fft(&x, 4, 1, FftKind::Fft).unwrap();
        assert_eq!(y.dim(), (3, 4));
        for (row, out) in x.rows().into_iter().zip(y.rows()) {
            let input: Vec<_> = row.iter().map(|&v| v.to_c64()).collect();
            for (&a, b) in out.iter().zip(dft(&input, false)) {
                assert!(close(a, b), "{a} != {b}");
            }
        }
    }

    #[test]
    fn columns_pad_and_truncate() {
        let x = array![[1.0f32, 2.0], [3.0, 4.0]];
        // zero-padded to 4 points along axis 0
        let y = fft(&x, 4, 0, FftKind::Fft).unwrap();
        assert_eq!(y.dim(), (4, 2));
        let col0 = dft(
            &[1.0, 3.0, 0.0, 0.0].map(|v: f64| v.to_c64()),
            false,
        );
        for (a, b) in y.column(0).iter().zip(col0) {
            assert!(close(*a, b));
        }
        // truncated to the first point: the transform is the sample itself
        let y = fft(&x, 1, 0, FftKind::Fft).unwrap();
        assert_eq!(y, array![[Complex64::new(1.0, 0.0), Complex64::new(2.0, 0.0)]]);
    }

    #[test]
    fn inverse_round_trip() {
        let x = array![
            [Complex64::new(1.0, -1.0), Complex64::new(0.5, 2.0), Complex64::new(-3.0, 0.0)],
            [Complex64::new(0.0, 1.0), Complex64::new(2.0, 2.0), Complex64::new(1.0, -0.5)],
        ];
        let mut cache = FftPlanCache::new();
        let y = cache.transform(&x, 3, 1, FftKind::Fft).unwrap();
        let back = cache.transform(&y, 3, 1, FftKind::Ifft).unwrap();
        for (a, b) in x.iter().zip(back.iter()) {
            assert!(close(*a, *b), "{a} != {b}");
        }
    }

    #[test]
    fn half_keeps_leading_bins() {
        let x = array![[1.0, 0.0, -1.0, 0.0, 2.0, 1.0]];
        let full = fft(&x, 6, 1, FftKind::Fft).unwrap();
        let half = fft(&x, 6, 1, FftKind::HalfFft).unwrap();
        assert_eq!(half.dim(), (1, 3));
        for (a, b) in half.iter().zip(full.iter().take(3)) {
            assert!(close(*a, *b));
        }

        let half = fft(&x.t(), 6, 0, FftKind::HalfIfft).unwrap();
        assert_eq!(half.dim(), (3, 1));
    }

    #[test]
    fn eager_errors() {
        let real = array![[1.0, 2.0, 3.0]];
        let complex = real.mapv(|v: f64| v.to_c64());
        assert_eq!(
            fft(&complex, 4, 1, FftKind::HalfFft),
            Err(Error::ComplexHalfSpectrum)
        );
        assert_eq!(fft(&real, 4, 2, FftKind::Fft), Err(Error::FftAxis(2)));
        assert_eq!(fft(&real, 0, 1, FftKind::Ifft), Err(Error::EmptyTransform));
        let err = fft(&real, 3, 1, FftKind::HalfIfft).unwrap_err();
        assert_eq!(err, Error::OddHalfSpectrum(3));
        assert!(err.to_string().contains("odd-length"));
        // complex input is fine for full transforms
        assert!(fft(&complex, 3, 1, FftKind::Ifft).is_ok());
    }

    #[test]
    fn grad_is_not_implemented() {
        let x = array![[1.0, 2.0]];
        let g = Array2::<Complex64>::zeros((1, 2));
        assert_eq!(
            fft_grad(&x, &g, FftKind::Fft),
            Err(Error::NotImplemented {
                op: "fft gradient"
            })
        );
    }
}
