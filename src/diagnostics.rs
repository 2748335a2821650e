//! Magnetic field diagnostics for MA735

use crate::register::{FieldAlarmRegister, ThresholdsRegister};

/// Alarm flags from the `MGH`/`MGL` register (0x1B)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FieldStatus {
    raw: u8,
}

impl FieldStatus {
    /// Create a field status from the raw register value
    #[must_use]
    pub const fn new(raw: u8) -> Self {
        Self { raw }
    }

    /// Get the raw register value
    #[must_use]
    pub const fn raw(&self) -> u8 {
        self.raw
    }

    /// MGH: field strength above the high threshold
    ///
    /// The magnet is too close; the angle stays usable but
    /// nonlinearity grows
    #[must_use]
    pub fn too_strong(&self) -> bool {
        FieldAlarmRegister(self.raw).mgh()
    }

    /// MGL: field strength below the low threshold
    #[must_use]
    pub fn too_weak(&self) -> bool {
        FieldAlarmRegister(self.raw).mgl()
    }

    /// Neither alarm is raised
    #[must_use]
    pub fn magnetic_field_ok(&self) -> bool {
        !self.too_strong() && !self.too_weak()
    }
}

impl From<u8> for FieldStatus {
    fn from(raw: u8) -> Self {
        Self::new(raw)
    }
}

/// Alarm thresholds from the `MGLT`/`MGHT` register (0x06)
///
/// Both fields are 3-bit codes; the datasheet maps them to millitesla
/// levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FieldThresholds {
    /// Low field threshold code
    pub low: u8,
    /// High field threshold code
    pub high: u8,
}

impl From<u8> for FieldThresholds {
    fn from(raw: u8) -> Self {
        let reg = ThresholdsRegister(raw);
        Self {
            low: reg.mglt(),
            high: reg.mght(),
        }
    }
}
