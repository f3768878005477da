//! Scripted bus and delay used by the unit tests.

use std::collections::VecDeque;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

/// How the device answers one read.
#[derive(Debug, Clone, Copy)]
pub enum Response {
    /// Still converting, NACK the address.
    Busy,
    /// Conversion finished, wire order (most significant byte first).
    Data([u8; 4]),
}

/// Bus event, in the order the mock saw them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Write,
    Read,
}

/// A single device on an otherwise empty bus.
///
/// Reads are answered from the scripted responses, and once those run out the device
/// behaves as if it never finishes converting.
pub struct MockI2c {
    address: u8,
    write_result: Option<ErrorKind>,
    responses: VecDeque<Response>,
    written: Vec<u8>,
    events: Vec<Event>,
}

impl MockI2c {
    pub fn new(address: u8) -> Self {
        Self {
            address,
            write_result: None,
            responses: VecDeque::new(),
            written: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Makes every write to the device fail with `kind`.
    pub fn with_write_result(mut self, kind: Option<ErrorKind>) -> Self {
        self.write_result = kind;
        self
    }

    pub fn with_responses(mut self, responses: impl IntoIterator<Item = Response>) -> Self {
        self.responses.extend(responses);
        self
    }

    /// Busy for `busy` reads, then `data`.
    pub fn ready_after(self, busy: usize, data: [u8; 4]) -> Self {
        self.with_responses(
            core::iter::repeat(Response::Busy)
                .take(busy)
                .chain([Response::Data(data)]),
        )
    }

    /// Every byte the device accepted or was offered.
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn writes(&self) -> usize {
        self.count(Event::Write)
    }

    pub fn reads(&self) -> usize {
        self.count(Event::Read)
    }

    fn count(&self, event: Event) -> usize {
        self.events.iter().filter(|&&e| e == event).count()
    }
}

impl ErrorType for MockI2c {
    type Error = ErrorKind;
}

impl I2c for MockI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let nack = ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address);

        for operation in operations {
            match operation {
                Operation::Write(bytes) => {
                    self.events.push(Event::Write);

                    if address != self.address {
                        return Err(nack);
                    }

                    self.written.extend_from_slice(bytes);

                    if let Some(kind) = self.write_result {
                        return Err(kind);
                    }
                }
                Operation::Read(buffer) => {
                    self.events.push(Event::Read);

                    if address != self.address {
                        return Err(nack);
                    }

                    match self.responses.pop_front() {
                        Some(Response::Data(data)) => {
                            assert_eq!(buffer.len(), data.len(), "Unexpected read length");
                            buffer.copy_from_slice(&data);
                        }
                        Some(Response::Busy) | None => return Err(nack),
                    }
                }
            }
        }

        Ok(())
    }
}

/// Records requested delays instead of sleeping.
#[derive(Debug, Default)]
pub struct MockDelay {
    pub calls: usize,
    pub total_ns: u64,
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.calls += 1;
        self.total_ns += u64::from(ns);
    }

    fn delay_us(&mut self, us: u32) {
        self.calls += 1;
        self.total_ns += u64::from(us) * 1_000;
    }

    fn delay_ms(&mut self, ms: u32) {
        self.calls += 1;
        self.total_ns += u64::from(ms) * 1_000_000;
    }
}
