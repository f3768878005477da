use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::command::Command;
use crate::sample::{DecodedSample, RawSample};
use crate::transport::{self, BusStatus, NoData};
use crate::Address;

/// Default time slept between polling reads, in microseconds.
pub const DEFAULT_TICK_US: u32 = 1_000;

/// Driver error type
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The command byte was not accepted. No read was attempted.
    #[error("command write failed: {0}")]
    BusWrite(BusStatus),
    /// The device was still converting after the whole timeout budget.
    #[error("conversion not ready after {attempts} reads")]
    ConversionTimeout { attempts: u32 },
    /// [`Ltc2485::start_conversion`] was called while a conversion was outstanding.
    #[error("a conversion is already in progress")]
    ConversionPending,
    /// [`Ltc2485::wait_for_result`] was called without a conversion outstanding.
    #[error("no conversion has been started")]
    NotStarted,
}

/// Where the driver is in a conversion cycle.
///
/// Between calls the driver is only ever `Idle`, `AwaitingConversion` or one of the final
/// states. `CommandSent` and `Reading` are held only while a call is on the bus, so
/// [`Ltc2485::state`] never returns them.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    #[default]
    Idle,
    /// Command byte being written.
    CommandSent,
    /// Command accepted, result not yet read.
    AwaitingConversion,
    /// Result bytes received and being decoded.
    Reading,
    Done,
    Timeout,
    /// The command write failed.
    Error,
}

impl State {
    /// `true` while a conversion has been commanded but not resolved.
    pub const fn is_pending(self) -> bool {
        matches!(
            self,
            Self::CommandSent | Self::AwaitingConversion | Self::Reading
        )
    }
}

/// Everything needed for one complete conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConversionRequest {
    pub address: Address,
    pub command: Command,
    /// Polling ticks to wait after the first read fails.
    pub timeout_ticks: u16,
}

impl ConversionRequest {
    pub const fn new(address: Address, command: Command, timeout_ticks: u16) -> Self {
        Self {
            address,
            command,
            timeout_ticks,
        }
    }
}

/// LTC2485 driver
///
/// Owns the bus it talks on, so only one conversion can be outstanding. Share the bus
/// with other devices through `embedded-hal-bus`.
pub struct Ltc2485<I2C, D> {
    i2c: I2C,
    delay: D,
    tick_us: u32,
    settle_us: u32,
    state: State,
    pending: Option<Address>,
}

impl<I2C: I2c, D: DelayNs> Ltc2485<I2C, D> {
    /// Creates a new driver polling every [`DEFAULT_TICK_US`].
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self {
            i2c,
            delay,
            tick_us: DEFAULT_TICK_US,
            settle_us: 0,
            state: State::Idle,
            pending: None,
        }
    }

    /// Sets the time slept between polling reads.
    pub fn with_tick_us(mut self, tick_us: u32) -> Self {
        self.tick_us = tick_us;
        self
    }

    /// Sleeps `settle_us` once after the command before polling starts.
    ///
    /// Saves bus traffic when the conversion time is known, at the cost of latency if the
    /// estimate is too long.
    pub fn with_settle_us(mut self, settle_us: u32) -> Self {
        self.settle_us = settle_us;
        self
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Writes `command`, starting a conversion on the device at `address`.
    ///
    /// Any finished but unread result on the device is discarded by the device.
    pub fn start_conversion(&mut self, address: Address, command: Command) -> Result<(), Error> {
        if self.state.is_pending() {
            return Err(Error::ConversionPending);
        }

        self.state = State::CommandSent;

        let status = transport::write(&mut self.i2c, address.get(), &[command.bits()]);

        if !status.is_success() {
            #[cfg(feature = "defmt")]
            defmt::debug!("LTC2485 0x{:02x}: command rejected, {}", address.get(), status);

            self.state = State::Error;
            self.pending = None;
            return Err(Error::BusWrite(status));
        }

        #[cfg(feature = "defmt")]
        defmt::trace!("LTC2485 0x{:02x}: command 0x{:02x}", address.get(), command.bits());

        self.state = State::AwaitingConversion;
        self.pending = Some(address);

        Ok(())
    }

    /// Polls the device until the outstanding conversion finishes.
    ///
    /// The device NACKs its address until the conversion is complete. Each NACK costs one
    /// tick, so at most `timeout_ticks + 1` reads are made. Overflow is reported through
    /// [`DecodedSample::overflow`], not as an error.
    pub fn wait_for_result(&mut self, timeout_ticks: u16) -> Result<DecodedSample, Error> {
        let address = match (self.state, self.pending) {
            (State::AwaitingConversion, Some(address)) => address,
            _ => return Err(Error::NotStarted),
        };

        if self.settle_us > 0 {
            self.delay.delay_us(self.settle_us);
        }

        let mut bytes = [0; 4];
        let mut ticks: u16 = 0;

        loop {
            let _status = match transport::read(&mut self.i2c, address.get(), &mut bytes) {
                Ok(()) => break,
                Err(NoData(status)) => status,
            };

            if ticks >= timeout_ticks {
                let attempts = u32::from(timeout_ticks) + 1;

                #[cfg(feature = "defmt")]
                defmt::warn!(
                    "LTC2485 0x{:02x}: no result after {} reads, last {}",
                    address.get(),
                    attempts,
                    _status
                );

                self.state = State::Timeout;
                self.pending = None;
                return Err(Error::ConversionTimeout { attempts });
            }

            ticks += 1;
            self.delay.delay_us(self.tick_us);
        }

        self.state = State::Reading;

        let sample = RawSample::new(bytes).decode();

        if sample.is_overflow() {
            #[cfg(feature = "defmt")]
            defmt::debug!("LTC2485 0x{:02x}: {}", address.get(), sample.overflow());
        }

        self.state = State::Done;
        self.pending = None;

        Ok(sample)
    }

    /// Runs a complete conversion cycle.
    pub fn read(&mut self, request: &ConversionRequest) -> Result<DecodedSample, Error> {
        self.start_conversion(request.address, request.command)?;
        self.wait_for_result(request.timeout_ticks)
    }

    /// Give back the bus and delay
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Rejection, Speed};
    use crate::mock::{Event, MockDelay, MockI2c};
    use crate::sample::Overflow;
    use crate::DEFAULT_ADDRESS;
    use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};

    fn hz60() -> Command {
        Command::new().rejection(Rejection::Hz60).speed(Speed::X1)
    }

    fn request(timeout_ticks: u16) -> ConversionRequest {
        ConversionRequest::new(DEFAULT_ADDRESS, hz60(), timeout_ticks)
    }

    #[test]
    fn silent_bus_times_out() {
        let mut adc = Ltc2485::new(MockI2c::new(0x24), MockDelay::default());

        assert_eq!(hz60().bits(), 0x04);
        assert_eq!(
            adc.read(&request(150)),
            Err(Error::ConversionTimeout { attempts: 151 })
        );
        assert_eq!(adc.state(), State::Timeout);

        let (i2c, delay) = adc.release();

        assert_eq!(i2c.written(), &[0x04_u8]);
        assert_eq!(i2c.reads(), 151);
        assert_eq!(delay.calls, 150);
        assert_eq!(delay.total_ns, 150 * u64::from(DEFAULT_TICK_US) * 1_000);
    }

    #[test]
    fn first_read_succeeds() {
        let i2c = MockI2c::new(0x24).ready_after(0, [0x80, 0x00, 0x01, 0x00]);
        let mut adc = Ltc2485::new(i2c, MockDelay::default());

        let sample = adc.read(&request(150)).unwrap();

        assert_eq!(sample.in_range(), Some(2));
        assert_eq!(adc.state(), State::Done);

        let (i2c, delay) = adc.release();

        assert_eq!(i2c.events(), &[Event::Write, Event::Read]);
        assert_eq!(delay.calls, 0);
    }

    #[test]
    fn polls_until_ready() {
        let i2c = MockI2c::new(0x24).ready_after(5, [0x7F, 0xFF, 0xFF, 0x80]);
        let mut adc = Ltc2485::new(i2c, MockDelay::default()).with_tick_us(250);

        assert_eq!(adc.read(&request(150)).map(|s| s.code()), Ok(-1));

        let (i2c, delay) = adc.release();

        assert_eq!(i2c.reads(), 6);
        assert_eq!(delay.calls, 5);
        assert_eq!(delay.total_ns, 5 * 250_000);
    }

    #[test]
    fn last_attempt_is_timeout_plus_one() {
        let i2c = MockI2c::new(0x24).ready_after(3, [0x80, 0x00, 0x00, 0x00]);
        let mut adc = Ltc2485::new(i2c, MockDelay::default());

        assert_eq!(adc.read(&request(3)).map(|s| s.code()), Ok(0));
        assert_eq!(adc.release().0.reads(), 4);

        let i2c = MockI2c::new(0x24).ready_after(4, [0x80, 0x00, 0x00, 0x00]);
        let mut adc = Ltc2485::new(i2c, MockDelay::default());

        assert_eq!(
            adc.read(&request(3)),
            Err(Error::ConversionTimeout { attempts: 4 })
        );
        assert_eq!(adc.release().0.reads(), 4);
    }

    #[test]
    fn zero_timeout_reads_once() {
        let mut adc = Ltc2485::new(MockI2c::new(0x24), MockDelay::default());

        assert_eq!(
            adc.read(&request(0)),
            Err(Error::ConversionTimeout { attempts: 1 })
        );

        let (i2c, delay) = adc.release();

        assert_eq!(i2c.reads(), 1);
        assert_eq!(delay.calls, 0);
    }

    #[test]
    fn absent_device_fails_without_reading() {
        let mut adc = Ltc2485::new(MockI2c::new(0x26), MockDelay::default());

        assert_eq!(
            adc.read(&request(150)),
            Err(Error::BusWrite(BusStatus::AddressNack))
        );
        assert_eq!(adc.state(), State::Error);
        assert_eq!(adc.release().0.reads(), 0);
    }

    #[test]
    fn rejected_command_fails_without_reading() {
        let i2c = MockI2c::new(0x24)
            .with_write_result(Some(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data)))
            .ready_after(0, [0x80, 0x00, 0x00, 0x00]);
        let mut adc = Ltc2485::new(i2c, MockDelay::default());

        assert_eq!(
            adc.read(&request(150)),
            Err(Error::BusWrite(BusStatus::DataNack))
        );

        let (i2c, delay) = adc.release();

        assert_eq!(i2c.events(), &[Event::Write]);
        assert_eq!(delay.calls, 0);
    }

    #[test]
    fn one_conversion_at_a_time() {
        let i2c = MockI2c::new(0x24).ready_after(0, [0x80, 0x00, 0x00, 0x00]);
        let mut adc = Ltc2485::new(i2c, MockDelay::default());

        assert_eq!(adc.start_conversion(DEFAULT_ADDRESS, hz60()), Ok(()));
        assert_eq!(adc.state(), State::AwaitingConversion);
        assert_eq!(
            adc.start_conversion(DEFAULT_ADDRESS, hz60()),
            Err(Error::ConversionPending)
        );
        assert_eq!(adc.state(), State::AwaitingConversion);

        assert!(adc.wait_for_result(10).is_ok());
        assert_eq!(adc.start_conversion(DEFAULT_ADDRESS, hz60()), Ok(()));

        assert_eq!(adc.release().0.writes(), 2);
    }

    #[test]
    fn wait_requires_a_command() {
        let mut adc = Ltc2485::new(MockI2c::new(0x24), MockDelay::default());

        assert_eq!(adc.wait_for_result(10), Err(Error::NotStarted));
        assert_eq!(adc.state(), State::Idle);
        assert!(adc.release().0.events().is_empty());
    }

    #[test]
    fn restart_after_timeout() {
        let mut adc = Ltc2485::new(MockI2c::new(0x24), MockDelay::default());

        assert!(adc.read(&request(2)).is_err());
        assert_eq!(adc.wait_for_result(2), Err(Error::NotStarted));
        assert!(adc.read(&request(2)).is_err());

        let (i2c, _) = adc.release();

        assert_eq!(i2c.written(), &[0x04_u8, 0x04]);
        assert_eq!(i2c.reads(), 6);
    }

    #[test]
    fn overflow_is_not_an_error() {
        let i2c = MockI2c::new(0x24)
            .ready_after(2, [0xC0, 0x00, 0x00, 0x00])
            .ready_after(0, [0x3F, 0xFF, 0xFF, 0xFF]);
        let mut adc = Ltc2485::new(i2c, MockDelay::default());

        let high = adc.read(&request(150)).unwrap();
        let low = adc.read(&request(150)).unwrap();

        assert_eq!((high.code(), high.overflow()), (i32::MAX, Overflow::Positive));
        assert_eq!((low.code(), low.overflow()), (i32::MIN, Overflow::Negative));
        assert_eq!(adc.state(), State::Done);
    }

    #[test]
    fn settle_delay_precedes_polling() {
        let i2c = MockI2c::new(0x24).ready_after(1, [0x80, 0x00, 0x00, 0x00]);
        let mut adc = Ltc2485::new(i2c, MockDelay::default())
            .with_tick_us(100)
            .with_settle_us(120_000);

        assert!(adc.read(&request(150)).is_ok());

        let (_, delay) = adc.release();

        assert_eq!(delay.calls, 2);
        assert_eq!(delay.total_ns, 120_100_000);
    }

    #[test]
    fn state_between_calls() {
        let i2c = MockI2c::new(0x24).ready_after(1, [0x80, 0x00, 0x00, 0x00]);
        let mut adc = Ltc2485::new(i2c, MockDelay::default());

        let mut seen = vec![adc.state()];

        adc.start_conversion(DEFAULT_ADDRESS, hz60()).unwrap();
        seen.push(adc.state());
        adc.wait_for_result(150).unwrap();
        seen.push(adc.state());

        let elsewhere = Address::new(0x26).unwrap();
        assert!(adc.start_conversion(elsewhere, hz60()).is_err());
        seen.push(adc.state());

        assert!(adc.read(&request(0)).is_err());
        seen.push(adc.state());

        assert_eq!(
            seen,
            [
                State::Idle,
                State::AwaitingConversion,
                State::Done,
                State::Error,
                State::Timeout,
            ]
        );
        assert!(!seen.contains(&State::CommandSent));
        assert!(!seen.contains(&State::Reading));
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            Error::BusWrite(BusStatus::AddressNack).to_string(),
            "command write failed: address not acknowledged (status 2)"
        );
        assert_eq!(
            Error::ConversionTimeout { attempts: 151 }.to_string(),
            "conversion not ready after 151 reads"
        );
    }
}
