//! Provides a driver for a Linear Technology LTC2485 24-bit delta-sigma ADC via the `embedded-hal` ecosystem.
//!
//! A conversion is a single command byte written to the device, followed by polling reads
//! until the device stops NACKing its address, followed by decoding the 4 byte result.
//!
//! ```ignore
//! use ltc2485::{Command, ConversionRequest, Ltc2485, Rejection, Speed, DEFAULT_ADDRESS};
//!
//! let mut adc = Ltc2485::new(i2c, delay);
//!
//! let command = Command::new().rejection(Rejection::Hz60).speed(Speed::X1);
//! let request = ConversionRequest::new(DEFAULT_ADDRESS, command, 150);
//!
//! let sample = adc.read(&request)?;
//! ```

#![cfg_attr(not(test), no_std)]
#![forbid(unsafe_code)]

pub mod command;
pub mod reader;
pub mod sample;
pub mod transport;

pub use command::{Command, Input, Rejection, Speed};
pub use reader::{ConversionRequest, Error, Ltc2485, State};
pub use sample::{DecodedSample, Overflow, RawSample};
pub use transport::BusStatus;

/// Address used when CA0/F0 and CA1 are strapped as on the reference board.
pub const DEFAULT_ADDRESS: Address = Address(0x24);

/// 7-bit I²C address of an LTC2485.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Address(u8);

impl Address {
    /// Highest address that fits in 7 bits.
    pub const MAX: u8 = 0x7F;

    /// Creates an address, returning [`None`] if `address` does not fit in 7 bits.
    pub const fn new(address: u8) -> Option<Self> {
        if address <= Self::MAX {
            Some(Self(address))
        } else {
            None
        }
    }

    /// Right-aligned 7-bit address as used by [`embedded_hal::i2c::I2c`].
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl From<Address> for u8 {
    fn from(address: Address) -> Self {
        address.0
    }
}

#[cfg(test)]
mod mock;
