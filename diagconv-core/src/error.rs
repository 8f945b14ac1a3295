//! Error taxonomy shared by every diagconv crate.

use alloc::string::String;
use alloc::vec::Vec;
use thiserror::Error;

/// Result alias used throughout diagconv.
pub type Result<T> = core::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Operand shapes, axes or layouts are inconsistent.
    Shape,
    /// The request is well-formed but the combination is not supported.
    Unsupported,
    /// An argument has a value outside the domain of the operation.
    Value,
    /// The operation exists but has no implementation yet.
    NotImplemented,
}

/// Errors raised by diagonal views, the 3D convolution orchestrator and the spectral wrappers.
///
/// Every variant aborts the operation that raised it; there is no partial result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Diagonal stripe requested with `shape[row] < shape[col]`.
    #[error(
        "diagonal stripe undefined when the row axis is shorter than the column axis \
         (axis {row} has {row_len}, axis {col} has {col_len})"
    )]
    StripeTooShort {
        /// Row axis.
        row: usize,
        /// Extent of the row axis.
        row_len: usize,
        /// Column axis.
        col: usize,
        /// Extent of the column axis.
        col_len: usize,
    },
    /// Axis index not smaller than the rank.
    #[error("axis {axis} out of range for rank {ndim}")]
    AxisOutOfRange {
        /// Offending axis.
        axis: usize,
        /// Rank of the operand.
        ndim: usize,
    },
    /// The two axes of a diagonal stripe coincide.
    #[error("diagonal stripe needs two distinct axes, got {axis} twice")]
    RepeatedAxis {
        /// The repeated axis.
        axis: usize,
    },
    /// Operand has the wrong number of dimensions.
    #[error("expected {expected} dimensions, got {got}")]
    RankMismatch {
        /// Expected rank.
        expected: usize,
        /// Actual rank.
        got: usize,
    },
    /// Operand shape differs from the declared or inferred one.
    #[error("shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Expected shape.
        expected: Vec<usize>,
        /// Actual shape.
        got: Vec<usize>,
    },
    /// Signals and filters disagree on the channel count.
    #[error("channel mismatch: signals have {signals} channels, filters have {filters}")]
    ChannelMismatch {
        /// Channels of the signals.
        signals: usize,
        /// Channels of the filters.
        filters: usize,
    },
    /// Kernel extent does not fit into the (padded) input along an axis.
    #[error("kernel of extent {kernel} does not fit input of extent {input} along the {axis} axis")]
    KernelTooLarge {
        /// Axis name (`time`, `height`, `width`).
        axis: &'static str,
        /// Input extent after padding.
        input: usize,
        /// Kernel extent.
        kernel: usize,
    },
    /// Kernel with a zero extent.
    #[error("kernel has zero extent along the {axis} axis")]
    EmptyKernel {
        /// Axis name.
        axis: &'static str,
    },
    /// Increment cannot be broadcast onto the stripe.
    #[error("cannot broadcast shape {from:?} to {to:?}")]
    BroadcastMismatch {
        /// Shape of the increment.
        from: Vec<usize>,
        /// Shape of the stripe.
        to: Vec<usize>,
    },
    /// Storage is not in standard (row-major contiguous) layout.
    #[error("operand storage is not in standard layout")]
    NonContiguous,
    /// Layout or reshape failure reported by the array backend.
    #[error("incompatible layout: {reason}")]
    Layout {
        /// Backend message.
        reason: String,
    },
    /// Height and width border modes differ.
    #[error("height and width border modes must match, got {height} and {width}")]
    MismatchedSpatialModes {
        /// Height mode name.
        height: &'static str,
        /// Width mode name.
        width: &'static str,
    },
    /// The `same` border mode was requested.
    #[error("border mode 'same' is not supported (requested for the {axis} axis)")]
    SameBorderMode {
        /// Axis name.
        axis: &'static str,
    },
    /// Unknown border mode name.
    #[error("invalid border mode {0:?}")]
    InvalidBorderMode(String),
    /// Half spectrum requested on complex input.
    #[error("half transform requires real input")]
    ComplexHalfSpectrum,
    /// FFT axis outside `{0, 1}`.
    #[error("fft axis must be 0 or 1, got {0}")]
    FftAxis(usize),
    /// Half spectrum requested on an odd number of points.
    #[error("half transform on odd-length vectors is undefined (length {0})")]
    OddHalfSpectrum(usize),
    /// Transform with zero points.
    #[error("invalid number of transform points (0)")]
    EmptyTransform,
    /// Operation with no implementation yet.
    #[error("{op} is not yet implemented")]
    NotImplemented {
        /// Operation name.
        op: &'static str,
    },
}

impl Error {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::StripeTooShort { .. }
            | Error::AxisOutOfRange { .. }
            | Error::RepeatedAxis { .. }
            | Error::RankMismatch { .. }
            | Error::ShapeMismatch { .. }
            | Error::ChannelMismatch { .. }
            | Error::KernelTooLarge { .. }
            | Error::EmptyKernel { .. }
            | Error::BroadcastMismatch { .. }
            | Error::NonContiguous
            | Error::Layout { .. } => ErrorKind::Shape,
            Error::MismatchedSpatialModes { .. }
            | Error::SameBorderMode { .. }
            | Error::ComplexHalfSpectrum
            | Error::FftAxis(_) => ErrorKind::Unsupported,
            Error::OddHalfSpectrum(_) | Error::EmptyTransform | Error::InvalidBorderMode(_) => {
                ErrorKind::Value
            }
            Error::NotImplemented { .. } => ErrorKind::NotImplemented,
        }
    }

    /// Builds a [`Error::ShapeMismatch`] from two shapes.
    pub fn shape_mismatch(expected: &[usize], got: &[usize]) -> Self {
        Error::ShapeMismatch {
            expected: expected.to_vec(),
            got: got.to_vec(),
        }
    }
}
