//! Line-based serial console.
//!
//! Commands are one line of space-separated tokens: a command word and up
//! to two numeric arguments. Numbers may be decimal, `0x` hexadecimal or
//! `0b` binary.
//!
//! | Line | Action |
//! | ---- | ------ |
//! | `d` | dump all known registers |
//! | `m <ms>` | stream the raw angle every `ms` (0 stops) |
//! | `ne <ms>` | stream the crank angle every `ms` (0 stops), `crank` feature |
//! | `r <reg>` | read a register |
//! | `w <reg> <val>` | write a register and print the readback |
//! | `z` | make the current angle the zero position |
//! | `cw` / `ccw` | set the rotation direction |
//! | `ppt <count>` | set pulses per turn |
//!
//! Anything else prints the help text.
//!
//! Note: output lines end in `\r\n` so plain serial terminals render them.

use core::fmt::{self, Write};

use heapless::Vec;

use crate::driver::Direction;

/// Longest accepted input line, excluding the newline
pub const MAX_LINE_LENGTH: usize = 64;

const HELP: &str = "\
MA735 register console commands:\r
d\r
  Print all registers.\r
m interval\r
  Print the raw angle every 'interval' ms (0 stops).\r
";

#[cfg(feature = "crank")]
const HELP_CRANK: &str = "\
ne interval\r
  Print the crank angle every 'interval' ms (0 stops).\r
";

const HELP_REGISTERS: &str = "\
r reg\r
  Read the register at address 'reg'.\r
w reg val\r
  Write 'val' to the register at address 'reg'.\r
z\r
  Make the current angle the zero position.\r
cw\r
  Set the rotation direction to clockwise.\r
ccw\r
  Set the rotation direction to counterclockwise.\r
ppt count\r
  Set the number of pulses per turn (1-1024).\r
Numbers may be decimal, 0x hex or 0b binary.\r
";

/// Console input errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConsoleError {
    /// A numeric argument could not be parsed
    InvalidNumber,
    /// A required argument was not given
    MissingArgument,
    /// A numeric argument does not fit the field it is meant for
    OutOfRange(u32),
    /// The line did not fit in the input buffer and was dropped
    LineTooLong,
    /// The line is not valid UTF-8
    InvalidUtf8,
}

impl fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsoleError::InvalidNumber => f.write_str("invalid number"),
            ConsoleError::MissingArgument => f.write_str("missing argument"),
            ConsoleError::OutOfRange(value) => write!(f, "value {value} out of range"),
            ConsoleError::LineTooLong => {
                write!(f, "line longer than {MAX_LINE_LENGTH} characters")
            }
            ConsoleError::InvalidUtf8 => f.write_str("line is not valid UTF-8"),
        }
    }
}

/// A parsed console command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// `d`
    Dump,
    /// `m <ms>`
    AngleInterval(u32),
    /// `ne <ms>`
    #[cfg(feature = "crank")]
    CrankInterval(u32),
    /// `r <reg>`
    Read(u8),
    /// `w <reg> <val>`
    Write(u8, u8),
    /// `z`
    Zero,
    /// `cw` / `ccw`
    Direction(Direction),
    /// `ppt <count>`
    PulsesPerTurn(u16),
    /// Anything unrecognised
    Help,
}

impl Command {
    /// Parse one input line
    ///
    /// # Errors
    ///
    /// Returns an error if an argument is missing, malformed or too wide
    pub fn parse(line: &str) -> Result<Self, ConsoleError> {
        let mut tokens = line.split_whitespace();
        let command = tokens.next().unwrap_or("");
        let mut arg = || tokens.next().ok_or(ConsoleError::MissingArgument);

        let command = match command {
            "d" => Command::Dump,
            "m" => Command::AngleInterval(parse_number(arg()?)?),
            #[cfg(feature = "crank")]
            "ne" => Command::CrankInterval(parse_number(arg()?)?),
            "r" => Command::Read(narrow(parse_number(arg()?)?)?),
            "w" => {
                let address = narrow(parse_number(arg()?)?)?;
                let value = narrow(parse_number(arg()?)?)?;
                Command::Write(address, value)
            }
            "z" => Command::Zero,
            "cw" => Command::Direction(Direction::Clockwise),
            "ccw" => Command::Direction(Direction::CounterClockwise),
            "ppt" => Command::PulsesPerTurn(narrow(parse_number(arg()?)?)?),
            _ => Command::Help,
        };

        Ok(command)
    }
}

fn narrow<T: TryFrom<u32>>(value: u32) -> Result<T, ConsoleError> {
    T::try_from(value).map_err(|_| ConsoleError::OutOfRange(value))
}

/// Parse a decimal, `0x` hexadecimal or `0b` binary number
///
/// # Errors
///
/// Returns [`ConsoleError::InvalidNumber`] if the token is empty, has no
/// digits after its prefix, contains an invalid digit or overflows `u32`
pub fn parse_number(token: &str) -> Result<u32, ConsoleError> {
    let (digits, radix) = if let Some(hex) = token.strip_prefix("0x") {
        (hex, 16)
    } else if let Some(bin) = token.strip_prefix("0b") {
        (bin, 2)
    } else {
        (token, 10)
    };

    // from_str_radix accepts a leading '+', the console does not
    if digits.starts_with('+') {
        return Err(ConsoleError::InvalidNumber);
    }

    u32::from_str_radix(digits, radix).map_err(|_| ConsoleError::InvalidNumber)
}

/// Accumulates serial input bytes into lines
#[derive(Debug, Default)]
pub struct LineBuffer<const N: usize> {
    buffer: Vec<u8, N>,
    overflowed: bool,
    complete: bool,
}

impl<const N: usize> LineBuffer<N> {
    /// Empty buffer holding up to `N` bytes per line
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: Vec::new(),
            overflowed: false,
            complete: false,
        }
    }

    /// Feed one received byte
    ///
    /// Returns the finished line when `byte` is a newline. Carriage returns
    /// are dropped. If the line outgrows the buffer the rest of it is
    /// discarded and the newline yields [`ConsoleError::LineTooLong`].
    pub fn push(&mut self, byte: u8) -> Option<Result<&str, ConsoleError>> {
        if self.complete {
            self.buffer.clear();
            self.complete = false;
        }

        match byte {
            b'\n' => {
                self.complete = true;
                if core::mem::take(&mut self.overflowed) {
                    return Some(Err(ConsoleError::LineTooLong));
                }
                Some(core::str::from_utf8(&self.buffer).map_err(|_| ConsoleError::InvalidUtf8))
            }
            b'\r' => None,
            _ => {
                if !self.overflowed && self.buffer.push(byte).is_err() {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("Console line overflow, discarding until newline");
                    self.overflowed = true;
                }
                None
            }
        }
    }
}

/// Print a register byte as ` 0b<bits> 0x<hex>`
///
/// # Errors
///
/// Returns an error if the output sink fails
pub fn print_register_byte<W: Write>(out: &mut W, value: u8) -> fmt::Result {
    writeln!(out, " 0b{value:08b} 0x{value:X}\r")
}

/// Print the command summary
///
/// # Errors
///
/// Returns an error if the output sink fails
pub fn print_help<W: Write>(out: &mut W) -> fmt::Result {
    out.write_str(HELP)?;
    #[cfg(feature = "crank")]
    out.write_str(HELP_CRANK)?;
    out.write_str(HELP_REGISTERS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_number_encodings() {
        assert_eq!(parse_number("42"), Ok(42));
        assert_eq!(parse_number("0x1B"), Ok(0x1B));
        assert_eq!(parse_number("0x9"), Ok(9));
        assert_eq!(parse_number("0b1000_0000"), Err(ConsoleError::InvalidNumber));
        assert_eq!(parse_number("0b10000000"), Ok(0x80));
        assert_eq!(parse_number("0"), Ok(0));
    }

    #[test]
    fn rejects_malformed_numbers() {
        for token in ["", "0x", "0b", "0b102", "12a", "-1", "+5", "0x+5", "99999999999"] {
            assert_eq!(parse_number(token), Err(ConsoleError::InvalidNumber), "{token}");
        }
    }

    #[test]
    fn parses_commands() {
        assert_eq!(Command::parse("d"), Ok(Command::Dump));
        assert_eq!(Command::parse("  r 0x9  "), Ok(Command::Read(9)));
        assert_eq!(Command::parse("w 9 0x80"), Ok(Command::Write(9, 0x80)));
        assert_eq!(Command::parse("m 100"), Ok(Command::AngleInterval(100)));
        assert_eq!(Command::parse("z"), Ok(Command::Zero));
        assert_eq!(
            Command::parse("ccw"),
            Ok(Command::Direction(Direction::CounterClockwise))
        );
        assert_eq!(Command::parse("ppt 400"), Ok(Command::PulsesPerTurn(400)));
    }

    #[cfg(feature = "crank")]
    #[test]
    fn parses_crank_interval() {
        assert_eq!(Command::parse("ne 10"), Ok(Command::CrankInterval(10)));
    }

    #[test]
    fn unknown_or_empty_lines_ask_for_help() {
        assert_eq!(Command::parse(""), Ok(Command::Help));
        assert_eq!(Command::parse("hello"), Ok(Command::Help));
        assert_eq!(Command::parse("D"), Ok(Command::Help));
    }

    #[test]
    fn reports_argument_errors() {
        assert_eq!(Command::parse("r"), Err(ConsoleError::MissingArgument));
        assert_eq!(Command::parse("w 1"), Err(ConsoleError::MissingArgument));
        assert_eq!(Command::parse("r zz"), Err(ConsoleError::InvalidNumber));
        assert_eq!(Command::parse("w 1 256"), Err(ConsoleError::OutOfRange(256)));
        assert_eq!(Command::parse("ppt 70000"), Err(ConsoleError::OutOfRange(70000)));
    }

    #[test]
    fn assembles_lines() {
        let mut line = LineBuffer::<16>::new();
        for &b in b"r 0x9\r" {
            assert_eq!(line.push(b), None);
        }
        assert_eq!(line.push(b'\n'), Some(Ok("r 0x9")));
        for &b in b"d" {
            assert_eq!(line.push(b), None);
        }
        assert_eq!(line.push(b'\n'), Some(Ok("d")));
    }

    #[test]
    fn drops_overlong_lines() {
        let mut line = LineBuffer::<4>::new();
        for &b in b"w 27 255" {
            assert_eq!(line.push(b), None);
        }
        assert_eq!(line.push(b'\n'), Some(Err(ConsoleError::LineTooLong)));
        for &b in b"z" {
            line.push(b);
        }
        assert_eq!(line.push(b'\n'), Some(Ok("z")));
    }

    #[test]
    fn formats_register_byte() {
        let mut out = heapless::String::<32>::new();
        print_register_byte(&mut out, 0x0A).unwrap();
        assert_eq!(out.as_str(), " 0b00001010 0xA\r\n");
    }
}
