use std::net::Ipv4Addr;
use std::time::Duration;

use clap::ValueEnum;

/// Which framing the scanner speaks, and therefore which transport
/// parameter group of [`ScanConfig`] is meaningful.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Modbus RTU over a serial line.
    Rtu,
    /// Modbus TCP over an IPv4 socket.
    Tcp,
}

/// What varies across candidates during a scan.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Vary the unit address 0..=255 on one shared medium.
    Addresses,
    /// Vary the register offset across the 16-bit space in strides of 5.
    Registers,
    /// Vary the last octet of the configured host 0..=255.
    Ips,
}

/// The four addressable Modbus data categories.
///
/// Holding and input registers decode as 16-bit words; coils and
/// discrete inputs decode as single bits.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterKind {
    Holding,
    Input,
    Coil,
    DiscreteInput,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Even,
    Odd,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataBits {
    #[value(name = "5")]
    Five,
    #[value(name = "6")]
    Six,
    #[value(name = "7")]
    Seven,
    #[value(name = "8")]
    Eight,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopBits {
    #[value(name = "1")]
    One,
    #[value(name = "2")]
    Two,
}

/// Serial line parameters, used when the transport kind is [`TransportKind::Rtu`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialParams {
    pub port: String,
    pub baud: u32,
    pub parity: Parity,
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
}

/// Network parameters, used when the transport kind is [`TransportKind::Tcp`].
///
/// In `Ips` mode `host` is the base address whose last octet the driver
/// rewrites per candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetParams {
    pub host: Ipv4Addr,
    pub port: u16,
}

/// Immutable-after-parse scan configuration.
///
/// Exactly one of `serial`/`net` is meaningful, selected by `transport`;
/// the other group keeps its defaults and is never consulted.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub transport: TransportKind,
    pub serial: SerialParams,
    pub net: NetParams,
    /// Per-request response timeout.
    pub timeout: Duration,
    /// Register offset probed by the modes that hold it fixed.
    pub register: u16,
    pub register_kind: RegisterKind,
    /// Quantity per read; scanning always probes a single register.
    pub count: u16,
    /// Unit address held fixed by the modes that do not vary it.
    pub unit: u8,
    pub mode: ScanMode,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::Rtu,
            serial: SerialParams {
                port: "/dev/ttyUSB0".to_string(),
                baud: 19_200,
                parity: Parity::Even,
                data_bits: DataBits::Eight,
                stop_bits: StopBits::One,
            },
            net: NetParams {
                host: Ipv4Addr::new(192, 168, 0, 1),
                port: 502,
            },
            timeout: Duration::from_millis(100),
            register: 1,
            register_kind: RegisterKind::Holding,
            count: 1,
            unit: 1,
            mode: ScanMode::Addresses,
        }
    }
}
