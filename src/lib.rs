/// layout arithmetic, border modes, shape inference and errors
pub use diagconv_core::{Error, ErrorKind, Result, border, error, geometry, grad, layout};

/// diagonal views and the diagonal-sum 3D convolution over ndarray
pub use diagconv_ndarray as nd;

/// FFT and DCT helpers
pub use diagconv_spectral as spectral;

pub mod prelude {
    //! Everything needed to run and differentiate a 3D convolution.

    pub use diagconv_core::prelude::*;
    pub use diagconv_ndarray::{
        Conv2dCtx, Conv3dConfig, Conv3dGrad, DiagonalView, DiagonalViewMut,
        accumulate_diagonal, accumulate_diagonal_grad, accumulate_diagonal_inplace, conv3d,
        conv3d_grad, diagonal_subtensor, diagonal_subtensor_grad, diagonal_view,
        diagonal_view_mut,
    };
    pub use diagconv_spectral::{FftKind, FftPlanCache, FftSample, dct_matrix, fft, fft_grad};
}
