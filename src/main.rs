//! Read an LTC2485 over I²C, on a Raspberry Pi or against a simulated device.

use std::cell::RefCell;
use std::time::Duration;

use clap::Parser;
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use embedded_hal_bus::i2c::RefCellDevice;
use ltc2485::{ConversionRequest, DecodedSample, Error, Ltc2485, Overflow};
use tracing::{debug, info, warn};

mod config;
mod logging;
mod scan;
#[cfg_attr(feature = "raspberry_pi", allow(dead_code))]
mod sim;

use config::Args;

#[cfg(feature = "raspberry_pi")]
fn main() -> Result<(), anyhow::Error> {
    use rppal::hal::Delay;
    use rppal::i2c::I2c as PiI2c;

    let args = Args::parse();

    logging::init(&args.log_level)?;

    let i2c = PiI2c::with_bus(args.bus)?;

    info!(bus = args.bus, "opened I2C bus");

    run(&RefCell::new(i2c), Delay::new(), &args)?;

    Ok(())
}

#[cfg(not(feature = "raspberry_pi"))]
fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();

    logging::init(&args.log_level)?;

    warn!(
        bus = args.bus,
        "built without the raspberry_pi feature, using a simulated LTC2485 instead of the bus"
    );

    let sim = sim::SimulatedLtc2485::new(args.address, sim::SLOWEST_CONVERSION_READS);

    run(&RefCell::new(sim), sim::StdDelay, &args)?;

    Ok(())
}

/// Scans and converts until `args.count` cycles have run, returning how many produced a sample.
fn run<I: I2c, D: DelayNs>(bus: &RefCell<I>, delay: D, args: &Args) -> Result<u64, anyhow::Error> {
    let mut scanner = RefCellDevice::new(bus);

    let mut adc = Ltc2485::new(RefCellDevice::new(bus), delay)
        .with_tick_us(args.tick_us)
        .with_settle_us(args.settle_us);

    let request = args.request();

    info!(
        address = request.address.get(),
        command = request.command.bits(),
        timeout = request.timeout_ticks,
        "starting"
    );

    let mut cycles = 0;
    let mut samples = 0;

    loop {
        let scanner = (!args.no_scan).then_some(&mut scanner);

        match cycle(scanner, &mut adc, &request) {
            Some(Ok(sample)) => {
                report(&sample);
                samples += 1;
            }
            Some(Err(error)) => warn!(%error, "conversion failed"),
            None => debug!("LTC2485 not on the bus"),
        }

        cycles += 1;
        if args.count != 0 && cycles >= args.count {
            return Ok(samples);
        }

        std::thread::sleep(Duration::from_millis(args.interval_ms));
    }
}

/// One pass of the loop. Returns [`None`] if a scan was requested and the device did not answer.
fn cycle<S, I, D>(
    scanner: Option<&mut S>,
    adc: &mut Ltc2485<I, D>,
    request: &ConversionRequest,
) -> Option<Result<DecodedSample, Error>>
where
    S: I2c,
    I: I2c,
    D: DelayNs,
{
    if let Some(scanner) = scanner {
        info!("scanning bus");

        if !scan::scan(scanner).contains(&request.address.get()) {
            return None;
        }
    }

    Some(adc.read(request))
}

fn report(sample: &DecodedSample) {
    match sample.overflow() {
        Overflow::None => info!(code = sample.code(), "adc"),
        Overflow::Positive => warn!(code = sample.code(), "adc above positive full scale"),
        Overflow::Negative => warn!(code = sample.code(), "adc below negative full scale"),
    }
}
