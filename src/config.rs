//! Bus settings and timing for the MA735.

use embedded_hal::spi::{MODE_0, Mode};

/// SPI mode expected by the sensor (CPOL=0, CPHA=0, MSB first)
pub const MODE: Mode = MODE_0;

/// Highest SPI clock the sensor accepts
pub const MAX_FREQUENCY_HZ: u32 = 10_000_000;

/// Settle times between the two frames of a register access
///
/// Every register access blocks the caller for its settle time, so a write
/// stalls the whole control loop for `write_settle_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timing {
    /// Wait after a read command before fetching the data frame
    pub read_settle_us: u32,
    /// Wait after a write command before fetching the readback frame
    pub write_settle_ms: u32,
}

impl Timing {
    /// Datasheet settle times: 100 µs after a read, 20 ms after a write
    pub const DEFAULT: Self = Self {
        read_settle_us: 100,
        write_settle_ms: 20,
    };
}

impl Default for Timing {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Input level that marks the cam pulse as present
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CamPolarity {
    /// Pulse present while the input reads high
    #[default]
    ActiveHigh,
    /// Pulse present while the input reads low
    ActiveLow,
}

impl CamPolarity {
    /// Map a sampled pin level to "pulse present"
    #[must_use]
    pub const fn is_active(self, high: bool) -> bool {
        match self {
            CamPolarity::ActiveHigh => high,
            CamPolarity::ActiveLow => !high,
        }
    }
}
