//! Command line configuration.

use clap::{Parser, ValueEnum};
use ltc2485::reader::DEFAULT_TICK_US;
use ltc2485::{Address, Command, ConversionRequest, Input, Rejection, Speed};

/// Covers the slowest setting, 1x speed with 50Hz rejection (about 163ms), at the default tick.
pub const DEFAULT_TIMEOUT_TICKS: u16 = 300;

/// Periodically convert and log readings from an LTC2485 on a shared I²C bus
#[derive(Debug, Clone, Parser)]
#[command(author, version, about)]
pub struct Args {
    /// 7-bit device address, decimal or 0x-prefixed hex
    #[arg(short, long, default_value = "0x24", value_parser = parse_address, env = "LTC2485_ADDRESS")]
    pub address: Address,

    /// Line frequency rejected by the digital filter
    #[arg(short, long, value_enum, default_value_t = RejectionArg::Hz50)]
    pub rejection: RejectionArg,

    /// Output rate multiplier
    #[arg(short, long, value_enum, default_value_t = SpeedArg::X1)]
    pub speed: SpeedArg,

    /// Convert the internal temperature sensor instead of the external input
    #[arg(long)]
    pub temperature: bool,

    /// Polling ticks to wait for a conversion before giving up
    #[arg(short, long, default_value_t = DEFAULT_TIMEOUT_TICKS)]
    pub timeout: u16,

    /// Length of one polling tick in microseconds
    #[arg(long, default_value_t = DEFAULT_TICK_US)]
    pub tick_us: u32,

    /// Fixed delay before polling starts, in microseconds
    #[arg(long, default_value_t = 0)]
    pub settle_us: u32,

    /// Pause between conversions in milliseconds
    #[arg(short, long, default_value_t = 1000)]
    pub interval_ms: u64,

    /// Stop after this many cycles, 0 runs forever
    #[arg(short = 'n', long, default_value_t = 0)]
    pub count: u64,

    /// Skip scanning the bus before each conversion
    #[arg(long)]
    pub no_scan: bool,

    /// Raspberry Pi I²C bus number
    #[arg(short, long, default_value_t = 1)]
    pub bus: u8,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info", env = "RUST_LOG")]
    pub log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RejectionArg {
    #[value(name = "50-60")]
    Hz50And60,
    #[value(name = "50")]
    Hz50,
    #[value(name = "60")]
    Hz60,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SpeedArg {
    #[value(name = "1x")]
    X1,
    #[value(name = "2x")]
    X2,
}

impl From<RejectionArg> for Rejection {
    fn from(rejection: RejectionArg) -> Self {
        match rejection {
            RejectionArg::Hz50And60 => Rejection::Hz50And60,
            RejectionArg::Hz50 => Rejection::Hz50,
            RejectionArg::Hz60 => Rejection::Hz60,
        }
    }
}

impl From<SpeedArg> for Speed {
    fn from(speed: SpeedArg) -> Self {
        match speed {
            SpeedArg::X1 => Speed::X1,
            SpeedArg::X2 => Speed::X2,
        }
    }
}

impl Args {
    pub fn adc_command(&self) -> Command {
        let input = if self.temperature {
            Input::InternalTemperature
        } else {
            Input::External
        };

        Command::new()
            .input(input)
            .rejection(self.rejection.into())
            .speed(self.speed.into())
    }

    pub fn request(&self) -> ConversionRequest {
        ConversionRequest::new(self.address, self.adc_command(), self.timeout)
    }
}

fn parse_address(text: &str) -> Result<Address, String> {
    let value = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => text.parse(),
    }
    .map_err(|error| format!("invalid address `{text}`: {error}"))?;

    Address::new(value).ok_or_else(|| format!("address {value:#04x} does not fit in 7 bits"))
}
