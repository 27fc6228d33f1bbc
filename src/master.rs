use std::fmt::Display;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use thiserror::Error;
use tokio::time::{self, error::Elapsed};
use tokio_modbus::client::Context;
use tokio_modbus::prelude::*;

use crate::config::{ScanConfig, TransportKind};
use crate::transport;

/// Failure of one master acquisition or read attempt.
///
/// At the scan boundary only the `Timeout`/everything-else distinction
/// is observable; the finer variants keep the underlying message.
#[derive(Debug, Error)]
pub enum MasterError {
    #[error("no response within the configured timeout")]
    Timeout,
    #[error("{0}")]
    Connect(String),
    #[error("exception response: {0}")]
    Exception(String),
    #[error("transport error: {0}")]
    Transport(String),
}

/// The protocol master capability: the four Modbus read operations the
/// scanner probes with.
///
/// Word reads return 16-bit values, bit reads return booleans; the
/// register reader normalizes both into one shape. Implementations own
/// their channel; dropping a master closes it.
#[async_trait]
pub trait Master: Send {
    async fn read_holding(
        &mut self,
        unit: u8,
        offset: u16,
        count: u16,
    ) -> Result<Vec<u16>, MasterError>;

    async fn read_input(
        &mut self,
        unit: u8,
        offset: u16,
        count: u16,
    ) -> Result<Vec<u16>, MasterError>;

    async fn read_coils(
        &mut self,
        unit: u8,
        offset: u16,
        count: u16,
    ) -> Result<Vec<bool>, MasterError>;

    async fn read_discrete(
        &mut self,
        unit: u8,
        offset: u16,
        count: u16,
    ) -> Result<Vec<bool>, MasterError>;
}

/// Produces a ready master for a configuration. The driver is generic
/// over this so tests can script responders.
#[async_trait]
pub trait MasterSource: Send + Sync {
    async fn acquire(&self, config: &ScanConfig) -> Result<Box<dyn Master>, MasterError>;
}

/// Production source: provisions the configured transport and wraps it
/// in a tokio-modbus client context.
pub struct ModbusMasterSource;

#[async_trait]
impl MasterSource for ModbusMasterSource {
    async fn acquire(&self, config: &ScanConfig) -> Result<Box<dyn Master>, MasterError> {
        let ctx = match config.transport {
            TransportKind::Rtu => {
                let line = transport::open_serial(&config.serial, config.timeout)?;
                rtu::attach_slave(line, Slave(config.unit))
            }
            TransportKind::Tcp => {
                let socket = transport::open_tcp(&config.net).await?;
                tcp::attach_slave(socket, Slave(config.unit))
            }
        };
        debug!("master ready ({:?})", config.transport);
        Ok(Box::new(ModbusMaster {
            ctx,
            timeout: config.timeout,
        }))
    }
}

/// Master backed by a `tokio_modbus` context. Each read addresses the
/// given unit and is bounded by the configured response timeout.
pub struct ModbusMaster {
    ctx: Context,
    timeout: Duration,
}

#[async_trait]
impl Master for ModbusMaster {
    async fn read_holding(
        &mut self,
        unit: u8,
        offset: u16,
        count: u16,
    ) -> Result<Vec<u16>, MasterError> {
        self.ctx.set_slave(Slave(unit));
        classify(time::timeout(self.timeout, self.ctx.read_holding_registers(offset, count)).await)
    }

    async fn read_input(
        &mut self,
        unit: u8,
        offset: u16,
        count: u16,
    ) -> Result<Vec<u16>, MasterError> {
        self.ctx.set_slave(Slave(unit));
        classify(time::timeout(self.timeout, self.ctx.read_input_registers(offset, count)).await)
    }

    async fn read_coils(
        &mut self,
        unit: u8,
        offset: u16,
        count: u16,
    ) -> Result<Vec<bool>, MasterError> {
        self.ctx.set_slave(Slave(unit));
        classify(time::timeout(self.timeout, self.ctx.read_coils(offset, count)).await)
    }

    async fn read_discrete(
        &mut self,
        unit: u8,
        offset: u16,
        count: u16,
    ) -> Result<Vec<bool>, MasterError> {
        self.ctx.set_slave(Slave(unit));
        classify(time::timeout(self.timeout, self.ctx.read_discrete_inputs(offset, count)).await)
    }
}

/// Collapse the layered result of a timed tokio-modbus call: elapsed
/// timer, transport error, exception reply, or values.
fn classify<T, X, E>(res: Result<Result<Result<T, X>, E>, Elapsed>) -> Result<T, MasterError>
where
    X: Display,
    E: Display,
{
    match res {
        Err(_) => Err(MasterError::Timeout),
        Ok(Err(err)) => Err(MasterError::Transport(err.to_string())),
        Ok(Ok(Err(code))) => Err(MasterError::Exception(code.to_string())),
        Ok(Ok(Ok(values))) => Ok(values),
    }
}
