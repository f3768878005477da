//! Primitive transactions on the shared I²C bus.
//!
//! Nothing here retries. Failures are reduced to the conventional two-wire status codes so
//! callers can report them without knowing the HAL's error type.

use core::fmt;

use embedded_hal::i2c::{Error as _, ErrorKind, I2c, NoAcknowledgeSource};

/// Longest payload accepted by [`write`].
pub const MAX_WRITE_LEN: usize = 32;

/// Outcome of a bus transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum BusStatus {
    Success = 0,
    /// Payload longer than [`MAX_WRITE_LEN`].
    DataTooLong = 1,
    /// The device did not acknowledge its address.
    AddressNack = 2,
    /// The device did not acknowledge a data byte.
    DataNack = 3,
    Other = 4,
}

impl BusStatus {
    /// Numeric status code, `0` for success.
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl From<ErrorKind> for BusStatus {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address) => Self::AddressNack,
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data) => Self::DataNack,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for BusStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Success => "success",
            Self::DataTooLong => "data too long",
            Self::AddressNack => "address not acknowledged",
            Self::DataNack => "data not acknowledged",
            Self::Other => "bus error",
        };

        write!(f, "{text} (status {})", self.code())
    }
}

/// A read that produced no data. While converting, the LTC2485 NACKs its address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NoData(pub BusStatus);

/// Writes `bytes` to `address` in a single transaction.
pub fn write<I: I2c>(i2c: &mut I, address: u8, bytes: &[u8]) -> BusStatus {
    if bytes.len() > MAX_WRITE_LEN {
        return BusStatus::DataTooLong;
    }

    match i2c.write(address, bytes) {
        Ok(()) => BusStatus::Success,
        Err(error) => error.kind().into(),
    }
}

/// Fills `buffer` from `address`.
///
/// The device sends the most significant byte first. On return `buffer` is in host
/// significance order, so the last element holds the most significant byte.
pub fn read<I: I2c>(i2c: &mut I, address: u8, buffer: &mut [u8]) -> Result<(), NoData> {
    i2c.read(address, buffer)
        .map_err(|error| NoData(error.kind().into()))?;

    buffer.reverse();

    Ok(())
}

/// Addresses `address` with an empty write. [`BusStatus::Success`] means a device answered.
pub fn probe<I: I2c>(i2c: &mut I, address: u8) -> BusStatus {
    write(i2c, address, &[])
}
