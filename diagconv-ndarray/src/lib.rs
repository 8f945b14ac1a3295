//! ndarray backend of diagconv.
//!
//! Diagonal subtensor views over ndarray storage, a direct 2D convolution context and
//! the diagonal-sum 3D convolution built from them.

mod error;

pub mod view;

pub mod conv2d;

pub mod conv3d;

pub use conv2d::Conv2dCtx;
pub use conv3d::{Conv3dConfig, Conv3dGrad, conv3d, conv3d_grad};
pub use view::{
    DiagonalView, DiagonalViewMut, accumulate_diagonal, accumulate_diagonal_grad,
    accumulate_diagonal_inplace, diagonal_subtensor, diagonal_subtensor_grad, diagonal_view,
    diagonal_view_mut,
};
