//! Border (padding) policies of a convolution.

use alloc::string::ToString;
use core::fmt::Display;
use core::str::FromStr;

use crate::error::{Error, Result};

/// Padding policy along one axis of a convolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BorderMode {
    /// No padding; the output shrinks to `input - kernel + 1`.
    #[default]
    Valid,
    /// Maximal padding `kernel - 1`; the output grows to `input + kernel - 1`.
    Full,
    /// Padding `kernel / 2`; the output is `input - (kernel % 2) + 1`.
    Half,
    /// Output the size of the input. Recognised but never supported.
    Same,
}

impl BorderMode {
    /// Lower-case name of the mode.
    pub fn name(self) -> &'static str {
        match self {
            BorderMode::Valid => "valid",
            BorderMode::Full => "full",
            BorderMode::Half => "half",
            BorderMode::Same => "same",
        }
    }

    /// Zero padding added on each side of an axis for a kernel of extent `kernel`.
    pub fn padding(self, kernel: usize, axis: &'static str) -> Result<usize> {
        match self {
            BorderMode::Valid => Ok(0),
            BorderMode::Full => Ok(kernel.saturating_sub(1)),
            BorderMode::Half => Ok(kernel / 2),
            BorderMode::Same => Err(Error::SameBorderMode { axis }),
        }
    }

    /// Output extent for an input of extent `input` and a kernel of extent `kernel`.
    ///
    /// Equivalent to `input + 2 * padding - kernel + 1`, failing when the kernel does not fit.
    pub fn output_len(self, input: usize, kernel: usize, axis: &'static str) -> Result<usize> {
        if kernel == 0 {
            return Err(Error::EmptyKernel { axis });
        }
        let padded = input + 2 * self.padding(kernel, axis)?;
        if padded < kernel {
            return Err(Error::KernelTooLarge {
                axis,
                input: padded,
                kernel,
            });
        }
        Ok(padded - kernel + 1)
    }
}

impl Display for BorderMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BorderMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "valid" => Ok(BorderMode::Valid),
            "full" => Ok(BorderMode::Full),
            "half" => Ok(BorderMode::Half),
            "same" => Ok(BorderMode::Same),
            _ => Err(Error::InvalidBorderMode(s.to_string())),
        }
    }
}

/// Border modes of a 3D convolution, one per `(time, height, width)` axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BorderModes {
    /// Mode along time.
    pub time: BorderMode,
    /// Mode along height.
    pub height: BorderMode,
    /// Mode along width.
    pub width: BorderMode,
}

impl BorderModes {
    /// Builds the triple.
    pub fn new(time: BorderMode, height: BorderMode, width: BorderMode) -> Self {
        Self {
            time,
            height,
            width,
        }
    }

    /// Checks the combination is supported and returns the shared spatial mode.
    ///
    /// `same` is rejected on every axis, and height and width must agree.
    pub fn spatial(&self) -> Result<BorderMode> {
        for (axis, mode) in [
            ("time", self.time),
            ("height", self.height),
            ("width", self.width),
        ] {
            if mode == BorderMode::Same {
                return Err(Error::SameBorderMode { axis });
            }
        }
        if self.height != self.width {
            return Err(Error::MismatchedSpatialModes {
                height: self.height.name(),
                width: self.width.name(),
            });
        }
        Ok(self.height)
    }
}

impl From<BorderMode> for BorderModes {
    fn from(mode: BorderMode) -> Self {
        Self::new(mode, mode, mode)
    }
}

impl From<(BorderMode, BorderMode, BorderMode)> for BorderModes {
    fn from((time, height, width): (BorderMode, BorderMode, BorderMode)) -> Self {
        Self::new(time, height, width)
    }
}

impl From<[BorderMode; 3]> for BorderModes {
    fn from([time, height, width]: [BorderMode; 3]) -> Self {
        Self::new(time, height, width)
    }
}

impl FromStr for BorderModes {
    type Err = Error;

    /// Parses either a single mode (`"full"`) or a comma separated triple (`"valid,half,half"`).
    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split(',');
        let first: BorderMode = parts.next().unwrap_or_default().parse()?;
        match (parts.next(), parts.next(), parts.next()) {
            (None, None, None) => Ok(first.into()),
            (Some(h), Some(w), None) => Ok(Self::new(first, h.parse()?, w.parse()?)),
            _ => Err(Error::InvalidBorderMode(s.to_string())),
        }
    }
}
