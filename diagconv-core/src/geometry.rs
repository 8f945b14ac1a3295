//! Shape inference for the diagonal-sum 3D convolution.

use crate::border::{BorderMode, BorderModes};
use crate::error::{Error, Result};

/// Shape of a 5D convolution operand: `(batch, time, channels, height, width)`.
///
/// For signals the batch is the number of movies; for filters it is the number of
/// output channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConvShape5d {
    /// Leading batch axis.
    pub batch: usize,
    /// Time axis.
    pub time: usize,
    /// Channel axis.
    pub channels: usize,
    /// Height axis.
    pub height: usize,
    /// Width axis.
    pub width: usize,
}

impl ConvShape5d {
    /// Builds a shape from its extents.
    pub fn new(batch: usize, time: usize, channels: usize, height: usize, width: usize) -> Self {
        Self {
            batch,
            time,
            channels,
            height,
            width,
        }
    }

    /// Reads a shape from a slice of five extents.
    pub fn from_slice(shape: &[usize]) -> Result<Self> {
        match *shape {
            [batch, time, channels, height, width] => {
                Ok(Self::new(batch, time, channels, height, width))
            }
            _ => Err(Error::RankMismatch {
                expected: 5,
                got: shape.len(),
            }),
        }
    }

    /// Extents in axis order.
    pub fn to_array(self) -> [usize; 5] {
        [self.batch, self.time, self.channels, self.height, self.width]
    }

    /// Shape with batch and time merged: `(batch * time, channels, height, width)`.
    pub fn flatten_time(self) -> [usize; 4] {
        [
            self.batch * self.time,
            self.channels,
            self.height,
            self.width,
        ]
    }
}

impl From<[usize; 5]> for ConvShape5d {
    fn from([batch, time, channels, height, width]: [usize; 5]) -> Self {
        Self::new(batch, time, channels, height, width)
    }
}

/// Every shape involved in one diagonal-sum 3D convolution.
///
/// Built once before any numeric work; all shape errors surface here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Conv3dGeometry {
    signals: ConvShape5d,
    filters: ConvShape5d,
    modes: BorderModes,
    spatial: BorderMode,
    out_height: usize,
    out_width: usize,
    time_pad: usize,
    out_time: usize,
}

impl Conv3dGeometry {
    /// Infers the geometry of convolving `signals` with `filters` under `modes`.
    pub fn new(signals: ConvShape5d, filters: ConvShape5d, modes: BorderModes) -> Result<Self> {
        if signals.channels != filters.channels {
            return Err(Error::ChannelMismatch {
                signals: signals.channels,
                filters: filters.channels,
            });
        }
        let spatial = modes.spatial()?;
        let out_height = spatial.output_len(signals.height, filters.height, "height")?;
        let out_width = spatial.output_len(signals.width, filters.width, "width")?;

        let (time_pad, out_time) = if filters.time == 1 {
            // single filter frame: no reduction along time
            (0, signals.time)
        } else {
            (
                modes.time.padding(filters.time, "time")?,
                modes.time.output_len(signals.time, filters.time, "time")?,
            )
        };

        let geometry = Self {
            signals,
            filters,
            modes,
            spatial,
            out_height,
            out_width,
            time_pad,
            out_time,
        };
        log::trace!("{geometry:?}");
        Ok(geometry)
    }

    /// Signal shape.
    pub fn signals(&self) -> ConvShape5d {
        self.signals
    }

    /// Filter shape.
    pub fn filters(&self) -> ConvShape5d {
        self.filters
    }

    /// Border modes the geometry was built with.
    pub fn modes(&self) -> BorderModes {
        self.modes
    }

    /// Border mode shared by height and width.
    pub fn spatial_mode(&self) -> BorderMode {
        self.spatial
    }

    /// Signals reshaped for the 2D convolution: `(Ns*Ts, C, Hs, Ws)`.
    pub fn signals_4d(&self) -> [usize; 4] {
        self.signals.flatten_time()
    }

    /// Filters reshaped for the 2D convolution: `(Nf*Tf, C, Hf, Wf)`.
    pub fn filters_4d(&self) -> [usize; 4] {
        self.filters.flatten_time()
    }

    /// Output of the 2D convolution: `(Ns*Ts, Nf*Tf, Hout, Wout)`.
    pub fn conv2d_output(&self) -> [usize; 4] {
        [
            self.signals.batch * self.signals.time,
            self.filters.batch * self.filters.time,
            self.out_height,
            self.out_width,
        ]
    }

    /// 2D output viewed per frame pair: `(Ns, Ts, Nf, Tf, Hout, Wout)`.
    pub fn intermediate(&self) -> [usize; 6] {
        [
            self.signals.batch,
            self.signals.time,
            self.filters.batch,
            self.filters.time,
            self.out_height,
            self.out_width,
        ]
    }

    /// Zero padding added on each end of the time axis before the diagonal reduction.
    pub fn time_pad(&self) -> usize {
        self.time_pad
    }

    /// Padded intermediate: `(Ns, Ts + 2*Tpad, Nf, Tf, Hout, Wout)`.
    pub fn padded_intermediate(&self) -> [usize; 6] {
        let mut shape = self.intermediate();
        shape[1] += 2 * self.time_pad;
        shape
    }

    /// Whether the time axis needs the diagonal reduction (`Tf > 1`).
    pub fn reduces_time(&self) -> bool {
        self.filters.time != 1
    }

    /// Final output: `(Ns, Ts', Nf, Hout, Wout)`.
    pub fn output(&self) -> [usize; 5] {
        [
            self.signals.batch,
            self.out_time,
            self.filters.batch,
            self.out_height,
            self.out_width,
        ]
    }
}
