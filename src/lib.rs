#![no_std]
#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]

mod config;
mod console;
mod controller;
mod crank;
mod diagnostics;
mod driver;
mod error;
mod register;
mod utils;

pub use config::{CamPolarity, MAX_FREQUENCY_HZ, MODE, Timing};
pub use console::{
    Command, ConsoleError, LineBuffer, MAX_LINE_LENGTH, parse_number, print_help,
    print_register_byte,
};
pub use controller::{Controller, Interval};
pub use crank::{CrankSample, CrankState, Edge};
pub use diagnostics::{FieldStatus, FieldThresholds};
pub use driver::{Direction, Ma735, PulsesPerTurnUpdate};
pub use error::Error;
pub use register::{
    ADDRESS_MAX, DirectionRegister, FieldAlarmRegister, PptLowIlipRegister, Register,
    ThresholdsRegister, TrimAxisRegister,
};
pub use utils::{
    ANGLE_FULL_SCALE, PPT_MAX, decode_pulses_per_turn, encode_pulses_per_turn,
    join_zero_position, raw_to_degrees, split_zero_position,
};
