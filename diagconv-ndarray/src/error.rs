use diagconv_core::Error;
use ndarray::ShapeError;

/// Converts an ndarray reshape/layout failure into a diagconv error.
pub(crate) fn layout_error(e: ShapeError) -> Error {
    Error::Layout {
        reason: e.to_string(),
    }
}
