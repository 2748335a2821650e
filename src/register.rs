//! Register addresses for the MA735 sensor.

/// Highest register address reachable through the 5-bit address field
pub const ADDRESS_MAX: u8 = 0x1F;

/// Register addresses for MA735
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
#[repr(u8)]
pub enum Register {
    /// Zero position, bits 7:0
    ZeroLow = 0x00,
    /// Zero position, bits 15:8
    ZeroHigh = 0x01,
    /// Bias current trimming
    Bct = 0x02,
    /// Bias current trimming axis enable
    TrimAxis = 0x03,
    /// Pulses per turn bits 1:0 and index length
    PptLowIlip = 0x04,
    /// Pulses per turn bits 9:2
    PptHigh = 0x05,
    /// Magnetic field thresholds
    Thresholds = 0x06,
    /// Rotation direction
    Direction = 0x09,
    /// Filter window
    FilterWindow = 0x0E,
    /// Hysteresis
    Hysteresis = 0x10,
    /// Magnetic field alarm flags
    FieldAlarm = 0x1B,
}

impl Register {
    /// Registers printed by the console dump, in address order
    pub const DUMP: [Register; 11] = [
        Register::ZeroLow,
        Register::ZeroHigh,
        Register::Bct,
        Register::TrimAxis,
        Register::PptLowIlip,
        Register::PptHigh,
        Register::Thresholds,
        Register::Direction,
        Register::FilterWindow,
        Register::Hysteresis,
        Register::FieldAlarm,
    ];

    /// Raw 5-bit address of the register
    #[must_use]
    pub const fn address(self) -> u8 {
        self as u8
    }

    /// Address followed by the bit fields the register holds
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Register::ZeroLow => "0x00 Z[7:0]",
            Register::ZeroHigh => "0x01 Z[15:8]",
            Register::Bct => "0x02 BCT[7:0]",
            Register::TrimAxis => "0x03 ETY:1 ETX:0",
            Register::PptLowIlip => "0x04 PPT[1:0]:6 ILIP[3:0]:2",
            Register::PptHigh => "0x05 PPT[9:2]",
            Register::Thresholds => "0x06 MGLT[2:0]:5 MGHT[2:0]:2",
            Register::Direction => "0x09 RD:7",
            Register::FilterWindow => "0x0E FW[7:0]",
            Register::Hysteresis => "0x10 HYS[7:0]",
            Register::FieldAlarm => "0x1B MGH:7 MGL:6",
        }
    }
}

impl From<Register> for u8 {
    fn from(reg: Register) -> u8 {
        reg as u8
    }
}

bitfield::bitfield! {
    /// ETX/ETY
    ///
    /// Enables bias current trimming on the X or Y axis
    pub struct TrimAxisRegister(u8);
    impl Debug;
    /// Trim the Y axis
    pub ety, set_ety: 1;
    /// Trim the X axis
    pub etx, set_etx: 0;
}

bitfield::bitfield! {
    /// PPT[1:0] / ILIP
    pub struct PptLowIlipRegister(u8);
    impl Debug;
    u8;
    /// Two least significant bits of the stored pulses-per-turn value
    pub ppt_low, set_ppt_low: 7, 6;
    /// Index pulse length and position
    pub ilip, set_ilip: 5, 2;
}

bitfield::bitfield! {
    /// RD
    pub struct DirectionRegister(u8);
    impl Debug;
    /// Rotation direction
    ///
    /// - `0` = clockwise
    /// - `1` = counterclockwise
    pub rd, set_rd: 7;
}

bitfield::bitfield! {
    /// MGLT / MGHT
    pub struct ThresholdsRegister(u8);
    impl Debug;
    u8;
    /// Low magnetic field threshold
    pub mglt, set_mglt: 7, 5;
    /// High magnetic field threshold
    pub mght, set_mght: 4, 2;
}

bitfield::bitfield! {
    /// MGH / MGL
    pub struct FieldAlarmRegister(u8);
    impl Debug;
    /// Magnetic field above the high threshold
    pub mgh, _: 7;
    /// Magnetic field below the low threshold
    pub mgl, _: 6;
}
