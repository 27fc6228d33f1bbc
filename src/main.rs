use std::fs::File;
use std::io;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;

use modbus_scan_rs::config::{
    DataBits, NetParams, Parity, RegisterKind, ScanConfig, ScanMode, SerialParams, StopBits,
    TransportKind,
};
use modbus_scan_rs::master::ModbusMasterSource;
use modbus_scan_rs::scan;
use modbus_scan_rs::types::ScanReport;

use anyhow::Result;
use clap::Parser;

/// modbus-scan-rs — Sequential Modbus RTU/TCP diagnostic scanner.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "modbus-scan-rs",
    version,
    about = "Sequential Modbus RTU/TCP diagnostic scanner for unit addresses, register offsets, and IPv4 subnets.",
    long_about = None
)]
struct Cli {
    /// Protocol framing: rtu (serial line) or tcp.
    #[arg(long, value_enum, default_value_t = TransportKind::Rtu)]
    transport: TransportKind,

    /// IPv4 host for tcp transport; base address for the ips scan.
    #[arg(long, default_value_t = Ipv4Addr::new(192, 168, 0, 1))]
    ip: Ipv4Addr,

    /// TCP port for tcp transport.
    #[arg(long = "tcp-port", default_value_t = 502)]
    tcp_port: u16,

    /// Serial port name for rtu transport.
    #[arg(long, short = 'p', default_value = "/dev/ttyUSB0")]
    port: String,

    /// Serial baud rate.
    #[arg(long, short = 'b', default_value_t = 19_200)]
    baud: u32,

    /// Serial parity.
    #[arg(long, value_enum, default_value_t = Parity::Even)]
    parity: Parity,

    /// Serial data bits per character.
    #[arg(long = "data-bits", value_enum, default_value_t = DataBits::Eight)]
    data_bits: DataBits,

    /// Serial stop bits.
    #[arg(long = "stop-bits", value_enum, default_value_t = StopBits::One)]
    stop_bits: StopBits,

    /// Response timeout per request, in milliseconds.
    #[arg(long = "timeout-ms", short = 't', default_value_t = 100)]
    timeout_ms: u64,

    /// Register offset probed by the addresses and ips scans.
    #[arg(long, short = 'r', default_value_t = 1)]
    register: u16,

    /// Unit address held fixed by the registers and ips scans.
    #[arg(long, short = 'a', default_value_t = 1)]
    address: u8,

    /// Which of the four register tables to read.
    #[arg(long = "register-type", value_enum, default_value_t = RegisterKind::Holding)]
    register_type: RegisterKind,

    /// What varies across candidates.
    #[arg(long = "scan", value_enum, default_value_t = ScanMode::Addresses)]
    scan: ScanMode,

    /// Write the final report as pretty JSON to this path (optional).
    #[arg(long)]
    output: Option<PathBuf>,
}

impl Cli {
    fn to_config(&self) -> ScanConfig {
        ScanConfig {
            transport: self.transport,
            serial: SerialParams {
                port: self.port.clone(),
                baud: self.baud,
                parity: self.parity,
                data_bits: self.data_bits,
                stop_bits: self.stop_bits,
            },
            net: NetParams {
                host: self.ip,
                port: self.tcp_port,
            },
            timeout: Duration::from_millis(self.timeout_ms),
            register: self.register,
            register_kind: self.register_type,
            count: 1,
            unit: self.address,
            mode: self.scan,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    println!("modbus-scan-rs configuration:");
    println!("  transport    : {:?}", cli.transport);
    println!("  ip           : {}", cli.ip);
    println!("  tcp_port     : {}", cli.tcp_port);
    println!("  port         : {}", cli.port);
    println!("  baud         : {}", cli.baud);
    println!("  parity       : {:?}", cli.parity);
    println!("  data_bits    : {:?}", cli.data_bits);
    println!("  stop_bits    : {:?}", cli.stop_bits);
    println!("  timeout_ms   : {}", cli.timeout_ms);
    println!("  register     : {}", cli.register);
    println!("  address      : {}", cli.address);
    println!("  register_type: {:?}", cli.register_type);
    println!("  scan         : {:?}", cli.scan);
    println!(
        "  output       : {}",
        cli.output
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<none>".to_string())
    );
    println!("--------------------------------");
    println!();

    let config = cli.to_config();
    let mut out = io::stdout();
    let report = scan::run_scan(&ModbusMasterSource, &config, &mut out).await?;

    println!(
        "Hits: {} (attempts: {}, any success: {})",
        report.hit_count, report.attempts, report.any_success
    );
    if let Some(path) = cli.output.as_deref() {
        if let Err(e) = write_report_json(path, &report) {
            eprintln!("Failed to write JSON to {}: {}", path.display(), e);
        } else {
            println!("Wrote JSON report to {}", path.display());
        }
    }

    Ok(())
}

fn write_report_json(path: &std::path::Path, report: &ScanReport) -> anyhow::Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, report)?;
    Ok(())
}
