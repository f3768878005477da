//! Decoding of the 32 bit output word.
//!
//! The device shifts out `SIG`, `MSB`, 24 data bits, then 6 sub-LSBs. `SIG` is set for
//! positive inputs and is not part of the two's complement value, so the data is recovered
//! by dropping `SIG`, moving `MSB` into the sign position and discarding the low byte.
//! `SIG` and `MSB` both set, or both clear with the rest of the top byte set, mark an input
//! beyond full scale.

/// Top byte reported above positive full scale.
pub const POSITIVE_OVERFLOW: u8 = 0xC0;

/// Top byte reported below negative full scale.
pub const NEGATIVE_OVERFLOW: u8 = 0x3F;

/// Smallest code a conversion within range can produce.
pub const CODE_MIN: i32 = -(1 << 23);

/// Largest code a conversion within range can produce.
pub const CODE_MAX: i32 = (1 << 23) - 1;

const SIG: u32 = 1 << 31;

/// The 4 bytes of one conversion, least significant byte first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSample([u8; 4]);

impl RawSample {
    /// Wraps bytes already in host significance order, so `bytes[3]` is the top byte.
    pub const fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// Wraps bytes in the order the device shifts them out.
    pub const fn from_wire(wire: [u8; 4]) -> Self {
        Self([wire[3], wire[2], wire[1], wire[0]])
    }

    /// Produces the output word the device would report for `code`.
    ///
    /// Returns [`None`] if `code` is outside [`CODE_MIN`]..=[`CODE_MAX`]. Sub-LSBs are zero.
    pub const fn encode(code: i32) -> Option<Self> {
        if code < CODE_MIN || code > CODE_MAX {
            return None;
        }

        let data = ((code as u32) << 7) & !SIG;
        let sig = if code >= 0 { SIG } else { 0 };

        Some(Self((data | sig).to_le_bytes()))
    }

    pub const fn bytes(&self) -> [u8; 4] {
        self.0
    }

    /// Bytes in the order the device shifts them out.
    pub const fn to_wire(&self) -> [u8; 4] {
        let [b0, b1, b2, b3] = self.0;
        [b3, b2, b1, b0]
    }

    /// Top byte, holding `SIG`, `MSB` and the overflow pattern.
    pub const fn msb(&self) -> u8 {
        self.0[3]
    }

    pub const fn word(&self) -> u32 {
        u32::from_le_bytes(self.0)
    }

    pub const fn decode(self) -> DecodedSample {
        decode(self)
    }
}

/// Input beyond the converter's range.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Overflow {
    #[default]
    None,
    Positive,
    Negative,
}

/// A decoded conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DecodedSample {
    code: i32,
    overflow: Overflow,
}

impl DecodedSample {
    /// Signed code. Saturates to [`i32::MAX`] or [`i32::MIN`] on overflow.
    pub const fn code(&self) -> i32 {
        self.code
    }

    pub const fn overflow(&self) -> Overflow {
        self.overflow
    }

    pub const fn is_overflow(&self) -> bool {
        !matches!(self.overflow, Overflow::None)
    }

    /// The code, or [`None`] if the input was out of range.
    pub const fn in_range(&self) -> Option<i32> {
        match self.overflow {
            Overflow::None => Some(self.code),
            _ => None,
        }
    }
}

/// Converts a raw output word into a signed code.
pub const fn decode(raw: RawSample) -> DecodedSample {
    match raw.msb() {
        POSITIVE_OVERFLOW => DecodedSample {
            code: i32::MAX,
            overflow: Overflow::Positive,
        },
        NEGATIVE_OVERFLOW => DecodedSample {
            code: i32::MIN,
            overflow: Overflow::Negative,
        },
        _ => {
            let word = raw.word() & !SIG;

            // `MSB` becomes the sign bit, then an arithmetic shift drops the sub-LSBs
            let code = ((word << 1) as i32) >> 8;

            DecodedSample {
                code,
                overflow: Overflow::None,
            }
        }
    }
}
