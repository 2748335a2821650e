use core::fmt;

/// Error type for MA735 operations
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Communication error with the sensor
    Communication(E),
    /// Register address does not fit in the 5-bit address field
    InvalidAddress(u8),
    /// Pulses per turn must lie in `1..=1024`
    InvalidPulseCount(u16),
    /// The readback after a write did not match the written value
    VerifyFailed {
        /// Register address that was written
        address: u8,
        /// Value that was written
        expected: u8,
        /// Value the sensor reported back
        actual: u8,
    },
    /// The cam pulse input could not be sampled
    Pin,
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Communication(e) => write!(f, "SPI error: {e:?}"),
            Error::InvalidAddress(address) => {
                write!(f, "register address 0x{address:02X} out of range (max 0x1F)")
            }
            Error::InvalidPulseCount(count) => {
                write!(f, "pulses per turn {count} out of range (1-1024)")
            }
            Error::VerifyFailed {
                address,
                expected,
                actual,
            } => write!(
                f,
                "write to 0x{address:02X} not applied: wrote 0x{expected:02X}, read back 0x{actual:02X}"
            ),
            Error::Pin => f.write_str("cam pulse input error"),
        }
    }
}
