use embedded_hal::i2c::I2c;
use ltc2485::transport::{self, BusStatus};
use tracing::{info, warn};

/// Probes every 7-bit address, returning those that acknowledged.
///
/// The reserved ranges are not skipped, so 0x00..=0x07 and 0x78..=0x7F are probed as well.
///
/// Addresses that fail with anything other than a NACK are logged but not returned.
pub fn scan<I: I2c>(i2c: &mut I) -> Vec<u8> {
    let mut found = Vec::new();

    for address in 0..=ltc2485::Address::MAX {
        match transport::probe(i2c, address) {
            BusStatus::Success => {
                info!("device found: {address:#04x}");
                found.push(address);
            }
            BusStatus::Other => warn!("device error: {address:#04x}"),
            _ => {}
        }
    }

    found
}
