//! Polling control loop tying the console, sensor and cam input together.
//!
//! The board binary calls [`Controller::feed`] for every received serial
//! byte and [`Controller::poll`] once per loop pass with a millisecond
//! timestamp. Everything runs on the caller's thread; a register write
//! blocks the loop for the write settle time, during which streaming and
//! cam sampling stall.

use core::fmt::{self, Write};

use embedded_hal::{delay::DelayNs, digital::InputPin, spi::SpiDevice};

use crate::{
    config::CamPolarity,
    console::{self, Command, ConsoleError, LineBuffer, MAX_LINE_LENGTH},
    crank::{CrankState, Edge},
    driver::Ma735,
    error::Error,
    register::Register,
};

/// Elapsed-time gate over a wrapping millisecond clock
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Interval {
    period_ms: u32,
    last_ms: u32,
}

impl Interval {
    /// Set the period; 0 disables the gate
    pub fn set(&mut self, period_ms: u32) {
        self.period_ms = period_ms;
    }

    #[must_use]
    pub const fn period_ms(&self) -> u32 {
        self.period_ms
    }

    /// Returns `true` and restarts the period once it has elapsed
    ///
    /// Missed periods are not made up; a slow loop just emits less often.
    pub fn due(&mut self, now_ms: u32) -> bool {
        if self.period_ms == 0 || now_ms.wrapping_sub(self.last_ms) < self.period_ms {
            return false;
        }
        self.last_ms = now_ms;
        true
    }
}

enum Failure<E> {
    Sensor(Error<E>),
    Output(fmt::Error),
}

impl<E> From<Error<E>> for Failure<E> {
    fn from(error: Error<E>) -> Self {
        Failure::Sensor(error)
    }
}

impl<E> From<fmt::Error> for Failure<E> {
    fn from(error: fmt::Error) -> Self {
        Failure::Output(error)
    }
}

/// Console, streaming and crank tracking for one MA735
pub struct Controller<SPI, D, CAM> {
    sensor: Ma735<SPI, D>,
    cam: CAM,
    polarity: CamPolarity,
    crank: CrankState,
    angle_interval: Interval,
    crank_interval: Interval,
    line: LineBuffer<MAX_LINE_LENGTH>,
}

impl<SPI, D, CAM, E> Controller<SPI, D, CAM>
where
    SPI: SpiDevice<u8, Error = E>,
    D: DelayNs,
    CAM: InputPin,
    E: fmt::Debug,
{
    pub fn new(sensor: Ma735<SPI, D>, cam: CAM, polarity: CamPolarity) -> Self {
        Self {
            sensor,
            cam,
            polarity,
            crank: CrankState::new(),
            angle_interval: Interval::default(),
            crank_interval: Interval::default(),
            line: LineBuffer::new(),
        }
    }

    /// Release the SPI device, delay and cam input
    pub fn release(self) -> (SPI, D, CAM) {
        let (spi, delay) = self.sensor.release();
        (spi, delay, self.cam)
    }

    #[must_use]
    pub fn crank(&self) -> &CrankState {
        &self.crank
    }

    /// Print the command summary
    ///
    /// # Errors
    ///
    /// Returns an error if the output sink fails
    pub fn startup<W: Write>(&mut self, out: &mut W) -> fmt::Result {
        console::print_help(out)
    }

    /// Feed one received serial byte, running the command once a line completes
    ///
    /// # Errors
    ///
    /// Returns an error only if the output sink fails; command errors are
    /// printed
    pub fn feed<W: Write>(&mut self, byte: u8, out: &mut W) -> fmt::Result {
        let parsed = match self.line.push(byte) {
            None => return Ok(()),
            Some(line) => line.and_then(Command::parse),
        };
        self.run(parsed, out)
    }

    /// Parse and run one console line
    ///
    /// # Errors
    ///
    /// Returns an error only if the output sink fails; command errors are
    /// printed
    pub fn handle_line<W: Write>(&mut self, line: &str, out: &mut W) -> fmt::Result {
        self.run(Command::parse(line), out)
    }

    fn run<W: Write>(
        &mut self,
        parsed: Result<Command, ConsoleError>,
        out: &mut W,
    ) -> fmt::Result {
        let command = match parsed {
            Ok(command) => command,
            Err(e) => return writeln!(out, "error: {e}\r"),
        };

        #[cfg(feature = "defmt")]
        defmt::debug!("Console command: {}", command);

        let result = self.execute(command, out);
        Self::report(result, out)
    }

    fn execute<W: Write>(&mut self, command: Command, out: &mut W) -> Result<(), Failure<E>> {
        match command {
            Command::Dump => {
                for register in Register::DUMP {
                    writeln!(out, "{}\r", register.label())?;
                    let value = self.sensor.read_register(register.address())?;
                    console::print_register_byte(out, value)?;
                }
            }
            Command::AngleInterval(ms) => self.angle_interval.set(ms),
            #[cfg(feature = "crank")]
            Command::CrankInterval(ms) => self.crank_interval.set(ms),
            Command::Read(address) => {
                let value = self.sensor.read_register(address)?;
                console::print_register_byte(out, value)?;
            }
            Command::Write(address, value) => {
                let readback = self.sensor.write_register(address, value)?;
                console::print_register_byte(out, readback)?;
            }
            Command::Zero => {
                let angle = self.sensor.angle()?;
                writeln!(out, "angle: {angle} -> 0\r")?;
                let [high, low] = self.sensor.set_zero_position(angle)?;
                writeln!(out, "{}\r", Register::ZeroHigh.label())?;
                console::print_register_byte(out, high)?;
                writeln!(out, "{}\r", Register::ZeroLow.label())?;
                console::print_register_byte(out, low)?;
            }
            Command::Direction(direction) => {
                let readback = self.sensor.set_direction(direction)?;
                writeln!(out, "{}\r", Register::Direction.label())?;
                console::print_register_byte(out, readback)?;
            }
            Command::PulsesPerTurn(count) => {
                let update = self.sensor.set_pulses_per_turn(count)?;
                writeln!(out, "ppt : {} -> {count}\r", update.previous)?;
                writeln!(out, "{}\r", Register::PptLowIlip.label())?;
                console::print_register_byte(out, update.ppt_low_ilip)?;
                writeln!(out, "{}\r", Register::PptHigh.label())?;
                console::print_register_byte(out, update.ppt_high)?;
            }
            Command::Help => console::print_help(out)?,
        }
        Ok(())
    }

    /// Run one pass of the streaming outputs and cam pulse detection
    ///
    /// The cam input is sampled on every pass, even when a streaming read
    /// failed.
    ///
    /// # Errors
    ///
    /// Returns an error only if the output sink fails; sensor and pin errors
    /// are printed
    pub fn poll<W: Write>(&mut self, now_ms: u32, out: &mut W) -> fmt::Result {
        let streamed = self.stream(now_ms, out);
        Self::report(streamed, out)?;
        let sampled = self.sample_cam(out);
        Self::report(sampled, out)
    }

    fn report<W: Write>(result: Result<(), Failure<E>>, out: &mut W) -> fmt::Result {
        match result {
            Ok(()) => Ok(()),
            Err(Failure::Sensor(e)) => writeln!(out, "error: {e}\r"),
            Err(Failure::Output(e)) => Err(e),
        }
    }

    fn stream<W: Write>(&mut self, now_ms: u32, out: &mut W) -> Result<(), Failure<E>> {
        if self.angle_interval.due(now_ms) {
            let angle = self.sensor.angle()?;
            writeln!(out, "{angle}\r")?;
        }

        if self.crank_interval.due(now_ms) {
            let sample = self.crank.observe(self.sensor.angle()?);
            if sample.synchronized {
                writeln!(out, "cam: synced\r")?;
            }
            writeln!(out, "{:.1}\r", sample.degrees)?;
        }

        Ok(())
    }

    fn sample_cam<W: Write>(&mut self, out: &mut W) -> Result<(), Failure<E>> {
        let high = self.cam.is_high().map_err(|_| Error::<E>::Pin)?;
        if self.crank.update_cam(self.polarity.is_active(high)) == Some(Edge::Rising) {
            #[cfg(feature = "defmt")]
            defmt::debug!("Cam pulse armed");
            writeln!(out, "cam: armed\r")?;
        }
        Ok(())
    }
}
