//! Strided layouts: affine maps from logical multi-indices to storage locations.
//!
//! A [`StridedLayout`] describes how an n-dimensional array is laid out in a flat
//! buffer: `location(ix) = offset + Σ ix[d] * strides[d]`. Strides are signed so
//! that skewed layouts such as the diagonal stripe can be expressed.
//!
//! # Diagonal stripe
//!
//! Consider the matrix spanned by a `row` axis of extent `R` and a `col` axis of
//! extent `K` (`R >= K`). The stripe discards the lower-left and upper-right
//! triangles and keeps the thick band in between:
//!
//! ```text
//! [ x . . . ]
//! [ x x . . ]
//! [ x x x . ]        stripe[t][k] = u[t + K - 1 - k][k]
//! [ . x x x ]
//! [ . . x x ]
//! [ . . . x ]
//! ```
//!
//! It is obtained without copying by starting `K - 1` steps into the `row` axis and
//! replacing the `col` stride with `stride[col] - stride[row]`: one step along `col`
//! moves one column right and one row up. The resulting `row` extent is `R - K + 1`.

use alloc::vec;
use alloc::vec::Vec;

use crate::error::{Error, Result};

/// Affine layout of an n-dimensional array over a flat buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StridedLayout {
    offset: usize,
    shape: Vec<usize>,
    strides: Vec<isize>,
}

impl StridedLayout {
    /// Builds a layout from its parts. Shape and strides must have the same length.
    pub fn new(offset: usize, shape: Vec<usize>, strides: Vec<isize>) -> Result<Self> {
        if shape.len() != strides.len() {
            return Err(Error::RankMismatch {
                expected: shape.len(),
                got: strides.len(),
            });
        }
        Ok(Self {
            offset,
            shape,
            strides,
        })
    }

    /// Row-major (C order) layout of `shape` starting at location 0.
    pub fn row_major(shape: &[usize]) -> Self {
        let mut strides = vec![0isize; shape.len()];
        let mut step = 1isize;
        for (stride, &len) in strides.iter_mut().zip(shape).rev() {
            *stride = step;
            step *= len.max(1) as isize;
        }
        Self {
            offset: 0,
            shape: shape.to_vec(),
            strides,
        }
    }

    /// Location of the logical origin.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Logical extents.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Per-axis steps, in elements.
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    /// Number of axes.
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Number of addressable elements.
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    /// Whether the layout addresses no element.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Storage location of a logical index, or `None` when out of bounds.
    pub fn location(&self, index: &[usize]) -> Option<usize> {
        if index.len() != self.ndim() {
            return None;
        }
        let mut loc = self.offset as isize;
        for ((&i, &len), &stride) in index.iter().zip(&self.shape).zip(&self.strides) {
            if i >= len {
                return None;
            }
            loc += i as isize * stride;
        }
        usize::try_from(loc).ok()
    }

    /// Storage locations of every element, in row-major logical order.
    pub fn locations(&self) -> Locations<'_> {
        Locations {
            layout: self,
            index: vec![0; self.ndim()],
            remaining: self.len(),
        }
    }

    /// Largest location addressed by the layout, `None` if it addresses nothing.
    pub fn max_location(&self) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        let mut loc = self.offset as isize;
        for (&len, &stride) in self.shape.iter().zip(&self.strides) {
            if stride > 0 {
                loc += (len as isize - 1) * stride;
            }
        }
        usize::try_from(loc).ok()
    }

    /// Checks that every addressed location lies in a buffer of `len` elements.
    pub fn fits(&self, len: usize) -> bool {
        if self.is_empty() {
            return true;
        }
        let mut lowest = self.offset as isize;
        for (&extent, &stride) in self.shape.iter().zip(&self.strides) {
            if stride < 0 {
                lowest += (extent as isize - 1) * stride;
            }
        }
        lowest >= 0 && self.max_location().is_some_and(|max| max < len)
    }

    /// Layout of the diagonal stripe across axes `row` and `col`.
    ///
    /// Requires `shape[row] >= shape[col]`. The result has the same rank; its `row`
    /// extent shrinks by `shape[col] - 1`. When `shape[col] == 1` the stripe is a plain
    /// slice and the `col` stride is left untouched.
    pub fn diagonal(&self, row: usize, col: usize) -> Result<Self> {
        let ndim = self.ndim();
        for axis in [row, col] {
            if axis >= ndim {
                return Err(Error::AxisOutOfRange { axis, ndim });
            }
        }
        if row == col {
            return Err(Error::RepeatedAxis { axis: row });
        }
        let (row_len, col_len) = (self.shape[row], self.shape[col]);
        if row_len < col_len {
            return Err(Error::StripeTooShort {
                row,
                row_len,
                col,
                col_len,
            });
        }

        let skip = col_len.saturating_sub(1);
        let offset = self.offset as isize + skip as isize * self.strides[row];
        let mut shape = self.shape.clone();
        let mut strides = self.strides.clone();
        shape[row] = row_len - skip;
        if col_len != 1 {
            strides[col] -= strides[row];
        }
        log::trace!(
            "diagonal stripe over axes ({row}, {col}): {:?} -> {:?}, strides {:?}",
            self.shape,
            shape,
            strides
        );
        Ok(Self {
            offset: usize::try_from(offset).map_err(|_| Error::Layout {
                reason: alloc::format!("stripe origin {offset} precedes the buffer"),
            })?,
            shape,
            strides,
        })
    }
}

/// Iterator over storage locations of a [`StridedLayout`] in row-major logical order.
#[derive(Debug, Clone)]
pub struct Locations<'a> {
    layout: &'a StridedLayout,
    index: Vec<usize>,
    remaining: usize,
}

impl Iterator for Locations<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let loc = self.layout.location(&self.index)?;
        self.remaining -= 1;
        for (i, &len) in self.index.iter_mut().zip(&self.layout.shape).rev() {
            *i += 1;
            if *i < len {
                break;
            }
            *i = 0;
        }
        Some(loc)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Locations<'_> {}
