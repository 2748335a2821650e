//! Shared helpers for the MA735 integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::spi::{ErrorKind, ErrorType, Operation, SpiDevice};
use embedded_hal_mock::eh1::spi::Transaction as SpiTransaction;

/// Expected frames for a register read returning `value`.
pub fn read_frames(address: u8, value: u8) -> Vec<SpiTransaction<u8>> {
    vec![
        SpiTransaction::transaction_start(),
        SpiTransaction::transfer(vec![0x40 | address, 0x00], vec![0x00, 0x00]),
        SpiTransaction::transaction_end(),
        SpiTransaction::transaction_start(),
        SpiTransaction::transfer(vec![0x00, 0x00], vec![value, 0x00]),
        SpiTransaction::transaction_end(),
    ]
}

/// Expected frames for a register write answered with `readback`.
pub fn write_frames(address: u8, value: u8, readback: u8) -> Vec<SpiTransaction<u8>> {
    vec![
        SpiTransaction::transaction_start(),
        SpiTransaction::transfer(vec![0x80 | address, value], vec![0x00, 0x00]),
        SpiTransaction::transaction_end(),
        SpiTransaction::transaction_start(),
        SpiTransaction::transfer(vec![0x00, 0x00], vec![readback, 0x00]),
        SpiTransaction::transaction_end(),
    ]
}

/// Expected frame for a raw angle read.
pub fn angle_frames(angle: u16) -> Vec<SpiTransaction<u8>> {
    vec![
        SpiTransaction::transaction_start(),
        SpiTransaction::transfer(vec![0x00, 0x00], angle.to_be_bytes().to_vec()),
        SpiTransaction::transaction_end(),
    ]
}

/// Delay that only adds up how long it was asked to wait.
#[derive(Debug, Default)]
pub struct RecordingDelay {
    pub total_ns: u64,
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}

enum Pending {
    Read(u8),
    Write(u8),
}

/// Register-level model of the sensor for end-to-end console tests.
///
/// Registers are plain memory; writes read back what was written.
/// Unframed reads pop the next queued angle, repeating the last one.
pub struct FakeMa735 {
    pub registers: [u8; 32],
    angles: VecDeque<u16>,
    last_angle: u16,
    pending: Option<Pending>,
}

impl FakeMa735 {
    pub fn new() -> Self {
        Self {
            registers: [0; 32],
            angles: VecDeque::new(),
            last_angle: 0,
            pending: None,
        }
    }

    pub fn with_register(mut self, address: u8, value: u8) -> Self {
        self.registers[usize::from(address)] = value;
        self
    }

    pub fn with_angles(mut self, angles: &[u16]) -> Self {
        self.angles.extend(angles);
        self
    }

    fn frame(&mut self, frame: u16) -> u16 {
        let address = ((frame >> 8) & 0x1F) as u8;
        match self.pending.take() {
            Some(Pending::Read(a)) | Some(Pending::Write(a)) => {
                assert_eq!(frame, 0, "second frame of a register access must be a NOP");
                u16::from(self.registers[usize::from(a)]) << 8
            }
            None if frame & 0x8000 != 0 => {
                self.registers[usize::from(address)] = frame as u8;
                self.pending = Some(Pending::Write(address));
                0
            }
            None if frame & 0x4000 != 0 => {
                self.pending = Some(Pending::Read(address));
                0
            }
            None => {
                if let Some(angle) = self.angles.pop_front() {
                    self.last_angle = angle;
                }
                self.last_angle
            }
        }
    }
}

impl ErrorType for FakeMa735 {
    type Error = Infallible;
}

impl SpiDevice<u8> for FakeMa735 {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Infallible> {
        for op in operations {
            match op {
                Operation::Transfer(read, write) => {
                    let frame = u16::from_be_bytes([write[0], write[1]]);
                    read.copy_from_slice(&self.frame(frame).to_be_bytes());
                }
                _ => panic!("unexpected SPI operation"),
            }
        }
        Ok(())
    }
}

/// SPI device whose every transaction fails, counting the attempts.
#[derive(Debug, Default)]
pub struct FailingSpi {
    pub attempts: usize,
}

impl ErrorType for FailingSpi {
    type Error = ErrorKind;
}

impl SpiDevice<u8> for FailingSpi {
    fn transaction(&mut self, _operations: &mut [Operation<'_, u8>]) -> Result<(), ErrorKind> {
        self.attempts += 1;
        Err(ErrorKind::Other)
    }
}
