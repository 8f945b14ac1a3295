//! Spectral transforms of diagconv: 1D FFTs over the rows or columns of a matrix and
//! discrete cosine transform matrices.

pub mod fft;

pub mod dct;

pub use dct::dct_matrix;
pub use fft::{FftKind, FftPlanCache, FftSample, fft, fft_grad};
