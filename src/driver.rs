//! Blocking driver for the MA735 magnetic angle sensor

use embedded_hal::{delay::DelayNs, spi::SpiDevice};

use crate::{
    config::Timing,
    diagnostics::{FieldStatus, FieldThresholds},
    error::Error,
    register::{ADDRESS_MAX, DirectionRegister, PptLowIlipRegister, Register},
    utils,
};

const READ_COMMAND: u16 = 0x4000;
const WRITE_COMMAND: u16 = 0x8000;
const NOP_COMMAND: u16 = 0x0000;

/// Rotation direction that counts as increasing angle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Clockwise,
    CounterClockwise,
}

/// Result of [`Ma735::set_pulses_per_turn`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PulsesPerTurnUpdate {
    /// Setting before the write
    pub previous: u16,
    /// Readback of the `PPT[1:0]`/`ILIP` register (0x04)
    pub ppt_low_ilip: u8,
    /// Readback of the `PPT[9:2]` register (0x05)
    pub ppt_high: u8,
}

/// MA735 driver instance
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ma735<SPI, D> {
    spi: SPI,
    delay: D,
    timing: Timing,
}

impl<SPI, D, E> Ma735<SPI, D>
where
    SPI: SpiDevice<u8, Error = E>,
    D: DelayNs,
{
    /// Create a new MA735 driver instance with the datasheet settle times
    pub fn new(spi: SPI, delay: D) -> Self {
        Self::with_timing(spi, delay, Timing::DEFAULT)
    }

    /// Create a new MA735 driver instance with custom settle times
    pub fn with_timing(spi: SPI, delay: D, timing: Timing) -> Self {
        Self { spi, delay, timing }
    }

    /// Release the SPI device and delay, consuming the driver
    pub fn release(self) -> (SPI, D) {
        (self.spi, self.delay)
    }

    /// Shift one 16-bit frame through the sensor in its own chip-select window
    fn transfer_frame(&mut self, frame: u16) -> Result<u16, Error<E>> {
        let tx = frame.to_be_bytes();
        let mut rx = [0u8; 2];
        self.spi
            .transfer(&mut rx, &tx)
            .map_err(Error::Communication)?;
        Ok(u16::from_be_bytes(rx))
    }

    fn address_bits(address: u8) -> Result<u16, Error<E>> {
        if address > ADDRESS_MAX {
            #[cfg(feature = "defmt")]
            defmt::warn!("Register address 0x{:02X} out of range", address);
            return Err(Error::InvalidAddress(address));
        }
        Ok(u16::from(address) << 8)
    }

    /// Read a register from the MA735
    ///
    /// The sensor latches the address from the first frame and answers on
    /// the second one:
    /// - Frame 1: send read command, ignore response
    /// - wait the read settle time
    /// - Frame 2: send NOP, register value in the high byte
    ///
    /// # Errors
    ///
    /// Returns an error if the address is above `0x1F` or SPI communication fails
    pub fn read_register(&mut self, address: u8) -> Result<u8, Error<E>> {
        let command = READ_COMMAND | Self::address_bits(address)?;

        #[cfg(feature = "defmt")]
        defmt::trace!("Reading register 0x{:02X}, command: 0x{:04X}", address, command);

        self.transfer_frame(command)?;
        self.delay.delay_us(self.timing.read_settle_us);
        let [value, _] = self.transfer_frame(NOP_COMMAND)?.to_be_bytes();

        #[cfg(feature = "defmt")]
        defmt::debug!("Register 0x{:02X} value: 0x{:02X}", address, value);

        Ok(value)
    }

    /// Write a register and return the sensor's readback
    ///
    /// - Frame 1: send write command with the new value
    /// - wait the write settle time while the sensor commits it
    /// - Frame 2: send NOP, readback in the high byte
    ///
    /// The readback is returned as-is; use it to confirm the write.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is above `0x1F` or SPI communication fails
    pub fn write_register(&mut self, address: u8, value: u8) -> Result<u8, Error<E>> {
        let command = WRITE_COMMAND | Self::address_bits(address)? | u16::from(value);

        #[cfg(feature = "defmt")]
        defmt::debug!("Writing 0x{:02X} to register 0x{:02X}", value, address);

        self.transfer_frame(command)?;
        self.delay.delay_ms(self.timing.write_settle_ms);
        let [readback, _] = self.transfer_frame(NOP_COMMAND)?.to_be_bytes();

        #[cfg(feature = "defmt")]
        defmt::trace!("Register 0x{:02X} readback: 0x{:02X}", address, readback);

        Ok(readback)
    }

    fn write_verified(&mut self, register: Register, value: u8) -> Result<u8, Error<E>> {
        let address = register.address();
        let readback = self.write_register(address, value)?;
        if readback != value {
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "Write to 0x{:02X} not applied: wrote 0x{:02X}, read 0x{:02X}",
                address,
                value,
                readback
            );
            return Err(Error::VerifyFailed {
                address,
                expected: value,
                actual: readback,
            });
        }
        Ok(readback)
    }

    fn modify_register(
        &mut self,
        register: Register,
        f: impl FnOnce(&mut u8),
    ) -> Result<u8, Error<E>> {
        let mut data = self.read_register(register.address())?;

        f(&mut data);

        self.write_verified(register, data)
    }

    /// Get the raw 16-bit angle
    ///
    /// Value ranges from 0 to 65535 over one turn. This is a single frame
    /// with no command, the fast path for streaming.
    ///
    /// # Errors
    ///
    /// Returns an error if SPI communication fails
    pub fn angle(&mut self) -> Result<u16, Error<E>> {
        let angle = self.transfer_frame(NOP_COMMAND)?;

        #[cfg(feature = "defmt")]
        defmt::trace!("Angle: {}", angle);

        Ok(angle)
    }

    /// Get the angular position in degrees (0.0-360.0)
    ///
    /// # Errors
    ///
    /// Returns an error if SPI communication fails
    pub fn angle_degrees(&mut self) -> Result<f32, Error<E>> {
        self.angle().map(utils::raw_to_degrees)
    }

    /// Read the zero position from `Z[15:8]` and `Z[7:0]`
    ///
    /// # Errors
    ///
    /// Returns an error if SPI communication fails
    pub fn zero_position(&mut self) -> Result<u16, Error<E>> {
        let high = self.read_register(Register::ZeroHigh.address())?;
        let low = self.read_register(Register::ZeroLow.address())?;

        Ok(utils::join_zero_position(high, low))
    }

    /// Store `value` as the raw reading reported as zero
    ///
    /// Writes `Z[15:8]` then `Z[7:0]` and returns both readbacks in that
    /// order.
    ///
    /// # Errors
    ///
    /// Returns an error if SPI communication fails or a readback does not
    /// match the written byte
    pub fn set_zero_position(&mut self, value: u16) -> Result<[u8; 2], Error<E>> {
        let (high, low) = utils::split_zero_position(value);

        let high = self.write_verified(Register::ZeroHigh, high)?;
        let low = self.write_verified(Register::ZeroLow, low)?;

        Ok([high, low])
    }

    /// Read the configured pulses per turn
    ///
    /// # Errors
    ///
    /// Returns an error if SPI communication fails
    pub fn pulses_per_turn(&mut self) -> Result<u16, Error<E>> {
        let high = self.read_register(Register::PptHigh.address())?;
        let low = PptLowIlipRegister(self.read_register(Register::PptLowIlip.address())?);

        Ok(utils::decode_pulses_per_turn(high, low.ppt_low()))
    }

    /// Set the number of pulses per turn (1-1024)
    ///
    /// `PPT[1:0]` shares its register with `ILIP`, which is preserved.
    ///
    /// # Errors
    ///
    /// Returns an error if `count` is out of range, SPI communication fails
    /// or a readback does not match the written byte
    pub fn set_pulses_per_turn(&mut self, count: u16) -> Result<PulsesPerTurnUpdate, Error<E>> {
        let (high, low) =
            utils::encode_pulses_per_turn(count).ok_or(Error::InvalidPulseCount(count))?;

        let previous_high = self.read_register(Register::PptHigh.address())?;
        let mut low_ilip = PptLowIlipRegister(self.read_register(Register::PptLowIlip.address())?);
        let previous = utils::decode_pulses_per_turn(previous_high, low_ilip.ppt_low());

        #[cfg(feature = "defmt")]
        defmt::debug!("Pulses per turn {} -> {}", previous, count);

        low_ilip.set_ppt_low(low);
        let ppt_low_ilip = self.write_verified(Register::PptLowIlip, low_ilip.0)?;
        let ppt_high = self.write_verified(Register::PptHigh, high)?;

        Ok(PulsesPerTurnUpdate {
            previous,
            ppt_low_ilip,
            ppt_high,
        })
    }

    /// Read the rotation direction
    ///
    /// # Errors
    ///
    /// Returns an error if SPI communication fails
    pub fn direction(&mut self) -> Result<Direction, Error<E>> {
        let reg = DirectionRegister(self.read_register(Register::Direction.address())?);
        Ok(if reg.rd() {
            Direction::CounterClockwise
        } else {
            Direction::Clockwise
        })
    }

    /// Set the rotation direction, returning the register readback
    ///
    /// # Errors
    ///
    /// Returns an error if SPI communication fails or the readback does not
    /// match the written byte
    pub fn set_direction(&mut self, direction: Direction) -> Result<u8, Error<E>> {
        self.modify_register(Register::Direction, |v| {
            let mut reg = DirectionRegister(*v);
            reg.set_rd(direction == Direction::CounterClockwise);
            *v = reg.0;
        })
    }

    /// Get the magnetic field alarm flags
    ///
    /// # Errors
    ///
    /// Returns an error if SPI communication fails
    pub fn field_status(&mut self) -> Result<FieldStatus, Error<E>> {
        self.read_register(Register::FieldAlarm.address())
            .map(FieldStatus::new)
    }

    /// Get the magnetic field alarm thresholds
    ///
    /// # Errors
    ///
    /// Returns an error if SPI communication fails
    pub fn field_thresholds(&mut self) -> Result<FieldThresholds, Error<E>> {
        self.read_register(Register::Thresholds.address())
            .map(FieldThresholds::from)
    }
}
