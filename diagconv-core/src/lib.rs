//! Core crate of diagconv.

#![warn(missing_docs)]
#![no_std]
extern crate alloc;
#[cfg(test)]
extern crate std;

// core concepts

pub mod layout;

pub mod border;

pub mod geometry;

// common

pub mod error;

pub mod grad;

pub use error::{Error, ErrorKind, Result};

pub mod prelude {
    //! A prelude module re-exporting commonly used items.

    pub use crate::border::*;
    pub use crate::error::{Error, ErrorKind, Result};
    pub use crate::geometry::*;
    pub use crate::grad::*;
    pub use crate::layout::*;
}
