//! An LTC2485 that lives in memory, for running without hardware.

use std::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};
use ltc2485::sample::RawSample;
use ltc2485::{Address, Command};

/// First and last input level of the test ramp, and its step.
const RAMP: (i32, i32, i32) = (1000, 4000, 100);

/// Converts a 12 bit ramp level into a code.
const RAMP_SCALE: i32 = 2048;

/// Transactions refused during a 1x speed, 50Hz rejection conversion polled every 1ms.
pub const SLOWEST_CONVERSION_READS: u32 = 163;

/// Single LTC2485 on an otherwise empty bus.
///
/// Each command starts one conversion, after which the device NACKs its address for the
/// next `busy_reads` transactions, writes included. The result can be read once. The input
/// ramps like a PWM test signal, one step per conversion. The input select bit is accepted
/// but ignored.
pub struct SimulatedLtc2485 {
    address: u8,
    busy_reads: u32,
    remaining: u32,
    level: i32,
    result: Option<RawSample>,
}

impl SimulatedLtc2485 {
    pub fn new(address: Address, busy_reads: u32) -> Self {
        Self {
            address: address.get(),
            busy_reads,
            remaining: 0,
            level: RAMP.0,
            result: None,
        }
    }

    /// Code the next conversion will produce.
    pub fn next_code(&self) -> i32 {
        self.level * RAMP_SCALE
    }

    fn convert(&mut self) {
        self.result = RawSample::encode(self.next_code());
        self.remaining = self.busy_reads;

        self.level += RAMP.2;
        if self.level > RAMP.1 {
            self.level = RAMP.0;
        }
    }
}

impl ErrorType for SimulatedLtc2485 {
    type Error = ErrorKind;
}

impl I2c for SimulatedLtc2485 {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if address != self.address {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }

        for operation in operations {
            match operation {
                Operation::Write(_) if self.remaining > 0 => {
                    self.remaining -= 1;
                    return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
                }
                // Probe
                Operation::Write([]) => {}
                Operation::Write([command]) => {
                    if Command::from_bits(*command).is_none() {
                        return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data));
                    }

                    self.convert();
                }
                Operation::Write(_) => {
                    return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data));
                }
                Operation::Read(buffer) => {
                    if self.remaining > 0 {
                        self.remaining -= 1;
                        return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
                    }

                    let Some(result) = self.result else {
                        return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
                    };

                    if buffer.len() != 4 {
                        return Err(ErrorKind::Other);
                    }

                    buffer.copy_from_slice(&result.to_wire());
                    self.result = None;
                }
            }
        }

        Ok(())
    }
}

/// Blocking delay on the current thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(u64::from(ns)));
    }
}
