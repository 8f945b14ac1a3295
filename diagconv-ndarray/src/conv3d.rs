//! Spatio-temporal (3D) convolution as a sum of per-frame 2D convolutions.
//!
//! Signals `(Ns, Ts, C, Hs, Ws)` and filters `(Nf, Tf, C, Hf, Wf)` are flattened to
//! `(Ns*Ts, C, Hs, Ws)` and `(Nf*Tf, C, Hf, Wf)`, every frame pair is convolved by a
//! [`Conv2dCtx`], and the result `(Ns, Ts, Nf, Tf, Hout, Wout)` is reduced along time by
//! summing the diagonal stripe over axes `(1, 3)`:
//!
//! ```text
//! out[t] = Σ_k frames[t + Tf - 1 - k][k]
//! ```
//!
//! which is a convolution along time. `full` and `half` time modes zero-pad the time
//! axis by `Tf - 1` and `Tf / 2` before the reduction. Filters are flipped along every
//! axis, like the 2D convolution.

use diagconv_core::border::BorderModes;
use diagconv_core::geometry::{Conv3dGeometry, ConvShape5d};
use diagconv_core::{Error, Result};
use ndarray::{
    Array5, ArrayBase, ArrayD, ArrayViewD, Axis, Data, Ix5, IxDyn, LinalgScalar, Slice,
};

use crate::conv2d::Conv2dCtx;
use crate::error::layout_error;
use crate::view::{accumulate_diagonal_inplace, diagonal_view};

/// Options of [`conv3d`] and [`conv3d_grad`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Conv3dConfig {
    /// Border modes along `(time, height, width)`.
    pub border: BorderModes,
    /// Declared signal shape; must agree with the signals when set.
    pub signals_shape: Option<ConvShape5d>,
    /// Declared filter shape; must agree with the filters when set.
    pub filters_shape: Option<ConvShape5d>,
}

impl Conv3dConfig {
    /// Config with the given border modes and inferred shapes.
    pub fn new(border: impl Into<BorderModes>) -> Self {
        Self {
            border: border.into(),
            ..Self::default()
        }
    }

    /// Declares the signal shape.
    pub fn with_signals_shape(mut self, shape: impl Into<ConvShape5d>) -> Self {
        self.signals_shape = Some(shape.into());
        self
    }

    /// Declares the filter shape.
    pub fn with_filters_shape(mut self, shape: impl Into<ConvShape5d>) -> Self {
        self.filters_shape = Some(shape.into());
        self
    }

    /// Geometry of convolving operands of the given shapes.
    pub fn geometry(&self, signals: &[usize], filters: &[usize]) -> Result<Conv3dGeometry> {
        Conv3dGeometry::new(
            resolve(self.signals_shape, signals)?,
            resolve(self.filters_shape, filters)?,
            self.border,
        )
    }
}

fn resolve(declared: Option<ConvShape5d>, actual: &[usize]) -> Result<ConvShape5d> {
    let shape = ConvShape5d::from_slice(actual)?;
    match declared {
        Some(declared) if declared != shape => {
            Err(Error::shape_mismatch(&declared.to_array(), actual))
        }
        _ => Ok(shape),
    }
}

/// Gradients of [`conv3d`] with respect to its data inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct Conv3dGrad<A> {
    /// Gradient with respect to the signals.
    pub signals: Array5<A>,
    /// Gradient with respect to the filters.
    pub filters: Array5<A>,
}

/// Convolves `signals` `(Ns, Ts, C, Hs, Ws)` with `filters` `(Nf, Tf, C, Hf, Wf)`.
///
/// Returns `(Ns, Ts', Nf, Hout, Wout)` where each output extent follows the border mode
/// of its axis. Height and width modes must match and `same` is rejected.
pub fn conv3d<A, S1, S2, C>(
    ctx: &C,
    signals: &ArrayBase<S1, Ix5>,
    filters: &ArrayBase<S2, Ix5>,
    config: &Conv3dConfig,
) -> Result<Array5<A>>
where
    A: LinalgScalar,
    S1: Data<Elem = A>,
    S2: Data<Elem = A>,
    C: Conv2dCtx<A> + ?Sized,
{
    let geometry = config.geometry(signals.shape(), filters.shape())?;
    log::debug!(
        "conv3d: signals {:?} * filters {:?} ({:?}) -> {:?}",
        signals.shape(),
        filters.shape(),
        geometry.modes(),
        geometry.output()
    );

    let signals_4d = signals
        .to_shape(geometry.signals_4d())
        .map_err(layout_error)?;
    let filters_4d = filters
        .to_shape(geometry.filters_4d())
        .map_err(layout_error)?;
    let frames = ctx.conv2d(
        signals_4d.view(),
        filters_4d.view(),
        geometry.spatial_mode(),
    )?;
    if frames.shape() != &geometry.conv2d_output()[..] {
        return Err(Error::shape_mismatch(
            &geometry.conv2d_output(),
            frames.shape(),
        ));
    }

    let frames = frames
        .to_shape(&geometry.intermediate()[..])
        .map_err(layout_error)?;
    log::trace!("conv3d: per-frame output {:?}", frames.shape());
    reduce_time(&geometry, frames.view())?
        .into_dimensionality::<Ix5>()
        .map_err(layout_error)
}

/// Sums the frame pairs `(Ns, Ts, Nf, Tf, H, W)` along the time diagonal.
fn reduce_time<A: LinalgScalar>(
    geometry: &Conv3dGeometry,
    frames: ArrayViewD<'_, A>,
) -> Result<ArrayD<A>> {
    if !geometry.reduces_time() {
        return Ok(frames
            .to_shape(&geometry.output()[..])
            .map_err(layout_error)?
            .into_owned());
    }

    let time_pad = geometry.time_pad();
    let stripe = if time_pad == 0 {
        let frames = frames.as_standard_layout();
        diagonal_view(&frames, 1, 3)?.to_owned()?
    } else {
        let mut padded = ArrayD::<A>::zeros(IxDyn(&geometry.padded_intermediate()));
        let time = geometry.signals().time;
        padded
            .slice_axis_mut(Axis(1), Slice::from(time_pad..time_pad + time))
            .assign(&frames);
        diagonal_view(&padded, 1, 3)?.to_owned()?
    };
    Ok(stripe.sum_axis(Axis(3)))
}

/// Adjoint of [`reduce_time`]: spreads the output gradient back over frame pairs.
fn expand_time<A: LinalgScalar>(
    geometry: &Conv3dGeometry,
    grad_output: ArrayViewD<'_, A>,
) -> Result<ArrayD<A>> {
    if !geometry.reduces_time() {
        return Ok(grad_output
            .to_shape(&geometry.intermediate()[..])
            .map_err(layout_error)?
            .into_owned());
    }

    // broadcast along the summed filter-time axis, scatter into the stripe
    let upstream = grad_output.insert_axis(Axis(3));
    let mut padded = ArrayD::<A>::zeros(IxDyn(&geometry.padded_intermediate()));
    accumulate_diagonal_inplace(&mut padded, 1, 3, &upstream)?;

    let time_pad = geometry.time_pad();
    if time_pad == 0 {
        return Ok(padded);
    }
    let time = geometry.signals().time;
    Ok(padded
        .slice_axis(Axis(1), Slice::from(time_pad..time_pad + time))
        .to_owned())
}

/// Gradients of [`conv3d`] given the gradient `grad_output` of its output.
pub fn conv3d_grad<A, S1, S2, S3, C>(
    ctx: &C,
    signals: &ArrayBase<S1, Ix5>,
    filters: &ArrayBase<S2, Ix5>,
    grad_output: &ArrayBase<S3, Ix5>,
    config: &Conv3dConfig,
) -> Result<Conv3dGrad<A>>
where
    A: LinalgScalar,
    S1: Data<Elem = A>,
    S2: Data<Elem = A>,
    S3: Data<Elem = A>,
    C: Conv2dCtx<A> + ?Sized,
{
    let geometry = config.geometry(signals.shape(), filters.shape())?;
    if grad_output.shape() != &geometry.output()[..] {
        return Err(Error::shape_mismatch(
            &geometry.output(),
            grad_output.shape(),
        ));
    }
    log::debug!(
        "conv3d_grad: signals {:?}, filters {:?} ({:?})",
        signals.shape(),
        filters.shape(),
        geometry.modes()
    );

    let grad_frames = expand_time(&geometry, grad_output.view().into_dyn())?;
    let grad_frames = grad_frames
        .to_shape(geometry.conv2d_output())
        .map_err(layout_error)?;

    let (signal_shape, filter_shape) = (geometry.signals(), geometry.filters());
    let signals_4d = signals
        .to_shape(geometry.signals_4d())
        .map_err(layout_error)?;
    let filters_4d = filters
        .to_shape(geometry.filters_4d())
        .map_err(layout_error)?;

    let grad_signals = ctx.conv2d_grad_signals(
        grad_frames.view(),
        filters_4d.view(),
        [signal_shape.height, signal_shape.width],
        geometry.spatial_mode(),
    )?;
    let grad_filters = ctx.conv2d_grad_filters(
        signals_4d.view(),
        grad_frames.view(),
        [filter_shape.height, filter_shape.width],
        geometry.spatial_mode(),
    )?;

    Ok(Conv3dGrad {
        signals: grad_signals
            .to_shape(signal_shape.to_array())
            .map_err(layout_error)?
            .into_owned(),
        filters: grad_filters
            .to_shape(filter_shape.to_array())
            .map_err(layout_error)?
            .into_owned(),
    })
}
