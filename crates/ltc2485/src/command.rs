//! The single configuration byte accepted by the LTC2485.
//!
//! | Bit | Meaning                                    |
//! | :-- | :----------------------------------------- |
//! | 3   | `1` = internal temperature sensor          |
//! | 2   | `1` = reject 60Hz only                     |
//! | 1   | `1` = reject 50Hz only                     |
//! | 0   | `1` = 2x speed (auto-calibration disabled) |
//!
//! Bits 1 and 2 both clear rejects 50Hz and 60Hz simultaneously. Both set is undefined.

const INTERNAL_TEMP: u8 = 0b0000_1000;
const REJECTION_MASK: u8 = 0b0000_0110;
const SPEED_MASK: u8 = 0b0000_0001;

/// Line frequency rejected by the digital filter.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Rejection {
    /// Reject 50Hz and 60Hz simultaneously.
    #[default]
    Hz50And60 = 0b0000_0000,
    /// Reject 50Hz only.
    Hz50 = 0b0000_0010,
    /// Reject 60Hz only.
    Hz60 = 0b0000_0100,
}

/// Output rate multiplier.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Speed {
    /// Normal rate with continuous offset calibration.
    #[default]
    X1 = 0b0000_0000,
    /// Double rate, offset calibration is skipped.
    X2 = 0b0000_0001,
}

/// What the modulator samples.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Input {
    /// The differential external input.
    #[default]
    External,
    /// The on-chip PTAT temperature sensor.
    InternalTemperature,
}

/// A complete command byte.
///
/// ```
/// use ltc2485::{Command, Rejection, Speed};
///
/// let command = Command::new().rejection(Rejection::Hz60).speed(Speed::X1);
/// assert_eq!(command.bits(), 0x04);
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Command {
    input: Input,
    rejection: Rejection,
    speed: Speed,
}

impl Command {
    /// External input, 50/60Hz rejection, 1x speed. Encodes to `0x00`.
    pub const fn new() -> Self {
        Self {
            input: Input::External,
            rejection: Rejection::Hz50And60,
            speed: Speed::X1,
        }
    }

    pub const fn input(mut self, input: Input) -> Self {
        self.input = input;
        self
    }

    pub const fn rejection(mut self, rejection: Rejection) -> Self {
        self.rejection = rejection;
        self
    }

    pub const fn speed(mut self, speed: Speed) -> Self {
        self.speed = speed;
        self
    }

    pub const fn selected_input(&self) -> Input {
        self.input
    }

    pub const fn selected_rejection(&self) -> Rejection {
        self.rejection
    }

    pub const fn selected_speed(&self) -> Speed {
        self.speed
    }

    /// The byte written to the device.
    pub const fn bits(&self) -> u8 {
        let input = match self.input {
            Input::External => 0,
            Input::InternalTemperature => INTERNAL_TEMP,
        };

        input | self.rejection as u8 | self.speed as u8
    }

    /// Parses a command byte. Returns [`None`] for the undefined rejection setting
    /// or if any of the upper four bits are set.
    pub const fn from_bits(bits: u8) -> Option<Self> {
        if bits & !(INTERNAL_TEMP | REJECTION_MASK | SPEED_MASK) != 0 {
            return None;
        }

        let rejection = match bits & REJECTION_MASK {
            0b0000_0000 => Rejection::Hz50And60,
            0b0000_0010 => Rejection::Hz50,
            0b0000_0100 => Rejection::Hz60,
            _ => return None,
        };

        let speed = if bits & SPEED_MASK == 0 {
            Speed::X1
        } else {
            Speed::X2
        };

        let input = if bits & INTERNAL_TEMP == 0 {
            Input::External
        } else {
            Input::InternalTemperature
        };

        Some(Self {
            input,
            rejection,
            speed,
        })
    }
}

impl From<Command> for u8 {
    fn from(command: Command) -> Self {
        command.bits()
    }
}
