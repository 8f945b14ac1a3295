//! The 2D convolution the 3D orchestrator is built on.

use diagconv_core::border::BorderMode;
use diagconv_core::{Error, Result};
use ndarray::{Array4, ArrayView4, LinalgScalar};

/// Raw context of a batched, multi-channel 2D convolution and its adjoints.
///
/// Operands are `(batch, channels, height, width)` signals and
/// `(out_channels, channels, height, width)` filters. The convolution flips the
/// filters and zero-pads according to a [`BorderMode`]
/// (`valid`, `full` or `half`).
///
/// The unit context `()` implements it with direct loops.
pub trait Conv2dCtx<A> {
    /// Convolves `signals` with `filters`.
    fn conv2d(
        &self,
        signals: ArrayView4<'_, A>,
        filters: ArrayView4<'_, A>,
        mode: BorderMode,
    ) -> Result<Array4<A>>;

    /// Gradient of [`Conv2dCtx::conv2d`] with respect to signals of spatial extent
    /// `signal_hw`, given the gradient of its output.
    fn conv2d_grad_signals(
        &self,
        grad_output: ArrayView4<'_, A>,
        filters: ArrayView4<'_, A>,
        signal_hw: [usize; 2],
        mode: BorderMode,
    ) -> Result<Array4<A>>;

    /// Gradient of [`Conv2dCtx::conv2d`] with respect to filters of spatial extent
    /// `filter_hw`, given the gradient of its output.
    fn conv2d_grad_filters(
        &self,
        signals: ArrayView4<'_, A>,
        grad_output: ArrayView4<'_, A>,
        filter_hw: [usize; 2],
        mode: BorderMode,
    ) -> Result<Array4<A>>;
}

/// Index into the unpadded input touched by output `i` and kernel tap `a`.
fn source(i: usize, a: usize, pad: usize, len: usize) -> Option<usize> {
    (i + a).checked_sub(pad).filter(|&y| y < len)
}

struct Taps {
    pad: [usize; 2],
    out: [usize; 2],
}

impl Taps {
    fn new(mode: BorderMode, input: [usize; 2], kernel: [usize; 2]) -> Result<Self> {
        Ok(Self {
            pad: [
                mode.padding(kernel[0], "height")?,
                mode.padding(kernel[1], "width")?,
            ],
            out: [
                mode.output_len(input[0], kernel[0], "height")?,
                mode.output_len(input[1], kernel[1], "width")?,
            ],
        })
    }

    fn check_output(&self, got: [usize; 2]) -> Result<()> {
        if got != self.out {
            return Err(Error::shape_mismatch(&self.out, &got));
        }
        Ok(())
    }
}

fn check_channels(signals: usize, filters: usize) -> Result<()> {
    if signals != filters {
        return Err(Error::ChannelMismatch { signals, filters });
    }
    Ok(())
}

impl<A: LinalgScalar> Conv2dCtx<A> for () {
    fn conv2d(
        &self,
        signals: ArrayView4<'_, A>,
        filters: ArrayView4<'_, A>,
        mode: BorderMode,
    ) -> Result<Array4<A>> {
        let (n, c, h, w) = signals.dim();
        let (f, fc, kh, kw) = filters.dim();
        check_channels(c, fc)?;
        let taps = Taps::new(mode, [h, w], [kh, kw])?;

        let mut out = Array4::<A>::zeros((n, f, taps.out[0], taps.out[1]));
        for ((b, o, i, j), slot) in out.indexed_iter_mut() {
            let mut acc = A::zero();
            for ci in 0..c {
                for a in 0..kh {
                    let Some(y) = source(i, a, taps.pad[0], h) else {
                        continue;
                    };
                    for e in 0..kw {
                        let Some(x) = source(j, e, taps.pad[1], w) else {
                            continue;
                        };
                        acc = acc
                            + signals[[b, ci, y, x]] * filters[[o, ci, kh - 1 - a, kw - 1 - e]];
                    }
                }
            }
            *slot = acc;
        }
        Ok(out)
    }

    fn conv2d_grad_signals(
        &self,
        grad_output: ArrayView4<'_, A>,
        filters: ArrayView4<'_, A>,
        signal_hw: [usize; 2],
        mode: BorderMode,
    ) -> Result<Array4<A>> {
        let (n, f, oh, ow) = grad_output.dim();
        let (ff, c, kh, kw) = filters.dim();
        if f != ff {
            return Err(Error::shape_mismatch(&[n, ff, oh, ow], grad_output.shape()));
        }
        let [h, w] = signal_hw;
        let taps = Taps::new(mode, [h, w], [kh, kw])?;
        taps.check_output([oh, ow])?;

        let mut grad = Array4::<A>::zeros((n, c, h, w));
        for ((b, o, i, j), &g) in grad_output.indexed_iter() {
            for ci in 0..c {
                for a in 0..kh {
                    let Some(y) = source(i, a, taps.pad[0], h) else {
                        continue;
                    };
                    for e in 0..kw {
                        let Some(x) = source(j, e, taps.pad[1], w) else {
                            continue;
                        };
                        let slot = &mut grad[[b, ci, y, x]];
                        *slot = *slot + g * filters[[o, ci, kh - 1 - a, kw - 1 - e]];
                    }
                }
            }
        }
        Ok(grad)
    }

    fn conv2d_grad_filters(
        &self,
        signals: ArrayView4<'_, A>,
        grad_output: ArrayView4<'_, A>,
        filter_hw: [usize; 2],
        mode: BorderMode,
    ) -> Result<Array4<A>> {
        let (n, c, h, w) = signals.dim();
        let (gn, f, oh, ow) = grad_output.dim();
        if n != gn {
            return Err(Error::shape_mismatch(&[n, f, oh, ow], grad_output.shape()));
        }
        let [kh, kw] = filter_hw;
        let taps = Taps::new(mode, [h, w], [kh, kw])?;
        taps.check_output([oh, ow])?;

        let mut grad = Array4::<A>::zeros((f, c, kh, kw));
        for ((b, o, i, j), &g) in grad_output.indexed_iter() {
            for ci in 0..c {
                for a in 0..kh {
                    let Some(y) = source(i, a, taps.pad[0], h) else {
                        continue;
                    };
                    for e in 0..kw {
                        let Some(x) = source(j, e, taps.pad[1], w) else {
                            continue;
                        };
                        let slot = &mut grad[[o, ci, kh - 1 - a, kw - 1 - e]];
                        *slot = *slot + g * signals[[b, ci, y, x]];
                    }
                }
            }
        }
        Ok(grad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array, array};

    fn ctx() -> &'static dyn Conv2dCtx<f64> {
        &()
    }

    #[test]
    fn valid_flips_filter() {
        let x = Array::from_iter((0..9).map(f64::from))
            .into_shape_with_order((1, 1, 3, 3))
            .unwrap();
        // flipped, the filter is [[1, 0], [0, 0]]: each output copies its top-left input
        let w = array![[[[0.0, 0.0], [0.0, 1.0]]]];
        let out = ctx().conv2d(x.view(), w.view(), BorderMode::Valid).unwrap();
        assert_eq!(out, array![[[[0.0, 1.0], [3.0, 4.0]]]]);
    }

    #[test]
    fn full_and_half_shapes() {
        let x = Array4::<f64>::ones((2, 3, 5, 4));
        let w = Array4::<f64>::ones((4, 3, 3, 2));
        let full = ctx().conv2d(x.view(), w.view(), BorderMode::Full).unwrap();
        assert_eq!(full.dim(), (2, 4, 7, 5));
        // corner sees a single tap per channel
        assert_eq!(full[[0, 0, 0, 0]], 3.0);
        let half = ctx().conv2d(x.view(), w.view(), BorderMode::Half).unwrap();
        assert_eq!(half.dim(), (2, 4, 5, 5));
        // interior sees the whole kernel
        assert_eq!(half[[1, 3, 2, 1]], 18.0);
    }

    #[test]
    fn adjoint_identity() {
        // <conv(x, w), g> == <x, grad_signals(g, w)> == <w, grad_filters(x, g)>
        let x = Array::from_iter((0..2 * 2 * 4 * 3).map(|v| f64::from(v % 7) - 3.0))
            .into_shape_with_order((2, 2, 4, 3))
            .unwrap();
        let w = Array::from_iter((0..3 * 2 * 2 * 2).map(|v| f64::from(v % 5) - 2.0))
            .into_shape_with_order((3, 2, 2, 2))
            .unwrap();
        for mode in [BorderMode::Valid, BorderMode::Full, BorderMode::Half] {
            let y = ctx().conv2d(x.view(), w.view(), mode).unwrap();
            let g = y.mapv(|v| 0.5 * v + 1.0);
            let lhs = (&y * &g).sum();
            let gx = ctx()
                .conv2d_grad_signals(g.view(), w.view(), [4, 3], mode)
                .unwrap();
            let gw = ctx()
                .conv2d_grad_filters(x.view(), g.view(), [2, 2], mode)
                .unwrap();
            assert!((lhs - (&x * &gx).sum()).abs() < 1e-9, "{mode}");
            assert!((lhs - (&w * &gw).sum()).abs() < 1e-9, "{mode}");
        }
    }

    #[test]
    fn rejects_channel_mismatch() {
        let x = Array4::<f64>::zeros((1, 2, 3, 3));
        let w = Array4::<f64>::zeros((1, 3, 2, 2));
        assert_eq!(
            ctx().conv2d(x.view(), w.view(), BorderMode::Valid),
            Err(Error::ChannelMismatch {
                signals: 2,
                filters: 3
            })
        );
    }
}
