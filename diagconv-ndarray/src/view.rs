//! Diagonal subtensor views and their accumulate-into counterparts.
//!
//! [`diagonal_view`] borrows an array and exposes the thick diagonal stripe across two
//! of its axes without copying (see [`diagconv_core::layout`] for the stripe
//! geometry). [`DiagonalViewMut`] does the same through an exclusive borrow and
//! supports scatter-adding into the stripe, which is the adjoint of extracting it.
//!
//! The copying operations ([`diagonal_subtensor`], [`accumulate_diagonal`]) are the
//! default; the aliasing ones need the source to be in standard layout.

use core::ops::Add;

use diagconv_core::grad::Grad;
use diagconv_core::layout::StridedLayout;
use diagconv_core::{Error, Result};
use ndarray::{ArrayBase, ArrayD, Data, DataMut, Dimension, IxDyn};
use num_traits::Zero;

use crate::error::layout_error;

/// Read-only diagonal stripe of a borrowed array.
#[derive(Debug, Clone)]
pub struct DiagonalView<'a, A> {
    data: &'a [A],
    layout: StridedLayout,
}

impl<'a, A> DiagonalView<'a, A> {
    /// Extents of the stripe.
    pub fn shape(&self) -> &[usize] {
        self.layout.shape()
    }

    /// Strides of the stripe, in elements of the source storage.
    pub fn strides(&self) -> &[isize] {
        self.layout.strides()
    }

    /// Layout of the stripe over the source storage.
    pub fn layout(&self) -> &StridedLayout {
        &self.layout
    }

    /// Element at `index`, or `None` when out of bounds.
    pub fn get(&self, index: &[usize]) -> Option<&'a A> {
        let data = self.data;
        self.layout.location(index).and_then(|loc| data.get(loc))
    }

    /// Elements in row-major order of the stripe.
    pub fn iter(&self) -> impl Iterator<Item = &'a A> + '_ {
        let data = self.data;
        self.layout.locations().map(move |loc| &data[loc])
    }

    /// Copies the stripe into a new standard-layout array.
    pub fn to_owned(&self) -> Result<ArrayD<A>>
    where
        A: Clone,
    {
        ArrayD::from_shape_vec(IxDyn(self.shape()), self.iter().cloned().collect())
            .map_err(layout_error)
    }
}

/// Mutable diagonal stripe of an exclusively borrowed array.
///
/// Writes go straight to the source storage.
#[derive(Debug)]
pub struct DiagonalViewMut<'a, A> {
    data: &'a mut [A],
    layout: StridedLayout,
}

impl<A> DiagonalViewMut<'_, A> {
    /// Extents of the stripe.
    pub fn shape(&self) -> &[usize] {
        self.layout.shape()
    }

    /// Strides of the stripe, in elements of the source storage.
    pub fn strides(&self) -> &[isize] {
        self.layout.strides()
    }

    /// Layout of the stripe over the source storage.
    pub fn layout(&self) -> &StridedLayout {
        &self.layout
    }

    /// Mutable element at `index`, or `None` when out of bounds.
    pub fn get_mut(&mut self, index: &[usize]) -> Option<&mut A> {
        let loc = self.layout.location(index)?;
        self.data.get_mut(loc)
    }

    /// Adds `delta`, broadcast to the stripe shape, element-wise into the stripe.
    pub fn scatter_add<S, D>(&mut self, delta: &ArrayBase<S, D>) -> Result<()>
    where
        A: Clone + Add<Output = A>,
        S: Data<Elem = A>,
        D: Dimension,
    {
        let delta = delta
            .broadcast(IxDyn(self.layout.shape()))
            .ok_or_else(|| Error::BroadcastMismatch {
                from: delta.shape().to_vec(),
                to: self.layout.shape().to_vec(),
            })?;
        for (loc, d) in self.layout.locations().zip(delta.iter()) {
            let slot = &mut self.data[loc];
            *slot = slot.clone() + d.clone();
        }
        Ok(())
    }
}

/// Diagonal stripe of `x` across axes `row` and `col`, aliasing the storage of `x`.
///
/// Fails with [`Error::StripeTooShort`] when `x.shape()[row] < x.shape()[col]` and with
/// [`Error::NonContiguous`] when `x` is not in standard layout.
pub fn diagonal_view<S, D>(
    x: &ArrayBase<S, D>,
    row: usize,
    col: usize,
) -> Result<DiagonalView<'_, S::Elem>>
where
    S: Data,
    D: Dimension,
{
    let layout = StridedLayout::row_major(x.shape()).diagonal(row, col)?;
    let data = x.as_slice().ok_or(Error::NonContiguous)?;
    debug_assert!(layout.fits(data.len()));
    Ok(DiagonalView { data, layout })
}

/// Mutable diagonal stripe of `x` across axes `row` and `col`.
pub fn diagonal_view_mut<S, D>(
    x: &mut ArrayBase<S, D>,
    row: usize,
    col: usize,
) -> Result<DiagonalViewMut<'_, S::Elem>>
where
    S: DataMut,
    D: Dimension,
{
    let layout = StridedLayout::row_major(x.shape()).diagonal(row, col)?;
    let data = x.as_slice_mut().ok_or(Error::NonContiguous)?;
    debug_assert!(layout.fits(data.len()));
    Ok(DiagonalViewMut { data, layout })
}

/// Copy of the diagonal stripe of `x` across axes `row` and `col`.
pub fn diagonal_subtensor<S, D>(
    x: &ArrayBase<S, D>,
    row: usize,
    col: usize,
) -> Result<ArrayD<S::Elem>>
where
    S: Data,
    S::Elem: Clone,
    D: Dimension,
{
    let x = x.as_standard_layout();
    diagonal_view(&x, row, col)?.to_owned()
}

/// Copies `x` and adds `delta` into the diagonal stripe of the copy.
pub fn accumulate_diagonal<A, S, D, S2, D2>(
    x: &ArrayBase<S, D>,
    row: usize,
    col: usize,
    delta: &ArrayBase<S2, D2>,
) -> Result<ArrayD<A>>
where
    A: Clone + Add<Output = A>,
    S: Data<Elem = A>,
    D: Dimension,
    S2: Data<Elem = A>,
    D2: Dimension,
{
    let mut out = x.view().into_dyn().as_standard_layout().into_owned();
    accumulate_diagonal_inplace(&mut out, row, col, delta)?;
    Ok(out)
}

/// Adds `delta` into the diagonal stripe of `x` in place.
///
/// The in-place twin of [`accumulate_diagonal`]: the exclusive access it requires is
/// the `&mut` borrow. `x` must be in standard layout.
pub fn accumulate_diagonal_inplace<A, S, D, S2, D2>(
    x: &mut ArrayBase<S, D>,
    row: usize,
    col: usize,
    delta: &ArrayBase<S2, D2>,
) -> Result<()>
where
    A: Clone + Add<Output = A>,
    S: DataMut<Elem = A>,
    D: Dimension,
    S2: Data<Elem = A>,
    D2: Dimension,
{
    diagonal_view_mut(x, row, col)?.scatter_add(delta)
}

/// Gradients of [`diagonal_subtensor`] with respect to `(x, row, col)`.
///
/// `gy` is the upstream gradient, shaped like the stripe.
pub fn diagonal_subtensor_grad<A, S, D>(
    x_shape: &[usize],
    row: usize,
    col: usize,
    gy: &ArrayBase<S, D>,
) -> Result<[Grad<ArrayD<A>>; 3]>
where
    A: Clone + Zero + Add<Output = A>,
    S: Data<Elem = A>,
    D: Dimension,
{
    let mut gx = ArrayD::<A>::zeros(IxDyn(x_shape));
    accumulate_diagonal_inplace(&mut gx, row, col, gy)?;
    Ok([Grad::Connected(gx), Grad::Disconnected, Grad::Disconnected])
}

/// Gradients of [`accumulate_diagonal`] with respect to `(x, row, col, delta)`.
///
/// The `delta` gradient has the stripe shape; a caller that broadcast `delta` sums it
/// back down.
pub fn accumulate_diagonal_grad<A, S, D>(
    row: usize,
    col: usize,
    gy: &ArrayBase<S, D>,
) -> Result<[Grad<ArrayD<A>>; 4]>
where
    A: Clone,
    S: Data<Elem = A>,
    D: Dimension,
{
    let g_delta = diagonal_subtensor(gy, row, col)?;
    Ok([
        Grad::Connected(gy.view().into_dyn().to_owned()),
        Grad::Disconnected,
        Grad::Disconnected,
        Grad::Connected(g_delta),
    ])
}
