use std::net::SocketAddr;
use std::time::Duration;

use log::debug;
use tokio::net::TcpStream;
use tokio::time;
use tokio_serial::{SerialPortBuilderExt, SerialStream};

use crate::config::{self, NetParams, SerialParams};
use crate::master::MasterError;

/// Bound on one TCP connection attempt. Deliberately tight and
/// independent of the request timeout so unreachable hosts are skipped
/// quickly during a subnet sweep.
pub const CONNECT_BUDGET: Duration = Duration::from_millis(100);

/// Open the configured serial line with the given response timeout as
/// its port timeout.
pub fn open_serial(serial: &SerialParams, timeout: Duration) -> Result<SerialStream, MasterError> {
    debug!("opening serial port {} at {} baud", serial.port, serial.baud);
    tokio_serial::new(&serial.port, serial.baud)
        .parity(parity(serial.parity))
        .data_bits(data_bits(serial.data_bits))
        .stop_bits(stop_bits(serial.stop_bits))
        .timeout(timeout)
        .open_native_async()
        .map_err(|e| MasterError::Connect(e.to_string()))
}

/// Connect a TCP socket to the configured host within [`CONNECT_BUDGET`].
pub async fn open_tcp(net: &NetParams) -> Result<TcpStream, MasterError> {
    let addr = SocketAddr::from((net.host, net.port));
    debug!("connecting to {addr}");
    match time::timeout(CONNECT_BUDGET, TcpStream::connect(addr)).await {
        Err(_) => Err(MasterError::Connect("client connection error".to_string())),
        Ok(Err(e)) => Err(MasterError::Connect(e.to_string())),
        Ok(Ok(stream)) => Ok(stream),
    }
}

fn parity(parity: config::Parity) -> tokio_serial::Parity {
    match parity {
        config::Parity::None => tokio_serial::Parity::None,
        config::Parity::Even => tokio_serial::Parity::Even,
        config::Parity::Odd => tokio_serial::Parity::Odd,
    }
}

fn data_bits(bits: config::DataBits) -> tokio_serial::DataBits {
    match bits {
        config::DataBits::Five => tokio_serial::DataBits::Five,
        config::DataBits::Six => tokio_serial::DataBits::Six,
        config::DataBits::Seven => tokio_serial::DataBits::Seven,
        config::DataBits::Eight => tokio_serial::DataBits::Eight,
    }
}

fn stop_bits(bits: config::StopBits) -> tokio_serial::StopBits {
    match bits {
        config::StopBits::One => tokio_serial::StopBits::One,
        config::StopBits::Two => tokio_serial::StopBits::Two,
    }
}
