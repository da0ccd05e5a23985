// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serial line transport based on the [`serialport`] crate.

use std::{
    fmt,
    io::{self, Read as _, Write as _},
    time::{Duration, Instant},
};

use bytes::Bytes;
use log::{debug, warn};
use serialport::{ClearBuffer, SerialPort};

pub use serialport::{DataBits, Parity, StopBits};

use crate::error::TransportError;

use super::Transport;

/// Line parameters and timeouts of a serial Modbus RTU line.
///
/// The defaults are the conventional Modbus RTU settings: 19200 Bd,
/// 8 data bits, no parity, one stop bit, one-second timeouts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    port_name: String,
    baud_rate: u32,
    data_bits: DataBits,
    parity: Parity,
    stop_bits: StopBits,
    read_timeout: Duration,
    write_timeout: Duration,
}

impl SerialConfig {
    /// Creates a configuration for the port at `port_name` with the
    /// default line parameters.
    pub fn new(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate: 19_200,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            read_timeout: Duration::from_secs(1),
            write_timeout: Duration::from_secs(1),
        }
    }

    #[must_use]
    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    #[must_use]
    pub fn data_bits(mut self, data_bits: DataBits) -> Self {
        self.data_bits = data_bits;
        self
    }

    #[must_use]
    pub fn parity(mut self, parity: Parity) -> Self {
        self.parity = parity;
        self
    }

    #[must_use]
    pub fn stop_bits(mut self, stop_bits: StopBits) -> Self {
        self.stop_bits = stop_bits;
        self
    }

    /// Sets the aggregate deadline for exact-length reads.
    #[must_use]
    pub fn read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// Sets the deadline for writes.
    #[must_use]
    pub fn write_timeout(mut self, write_timeout: Duration) -> Self {
        self.write_timeout = write_timeout;
        self
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

/// An exclusively owned serial line.
///
/// The handle starts out closed; [`Transport::open`] acquires the
/// underlying port. Dropping the handle releases the port (best
/// effort), so the resource is freed on every exit path.
pub struct SerialTransport {
    config: SerialConfig,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialTransport {
    /// Creates a closed handle for the line described by `config`.
    ///
    /// Fails with [`TransportError::ZeroTimeout`] if either timeout is
    /// zero: unbounded blocking reads would hang forever on a silent
    /// device.
    pub fn new(config: SerialConfig) -> Result<Self, TransportError> {
        if config.read_timeout.is_zero() || config.write_timeout.is_zero() {
            return Err(TransportError::ZeroTimeout);
        }
        Ok(Self { config, port: None })
    }

    pub fn config(&self) -> &SerialConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    pub fn write_timeout(&self) -> Duration {
        self.config.write_timeout
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn SerialPort>, TransportError> {
        self.port.as_mut().ok_or(TransportError::NotOpen)
    }
}

impl Transport for SerialTransport {
    fn open(&mut self) -> Result<(), TransportError> {
        if self.port.is_some() {
            return Err(TransportError::AlreadyOpen);
        }
        let port = serialport::new(self.config.port_name.as_str(), self.config.baud_rate)
            .data_bits(self.config.data_bits)
            .parity(self.config.parity)
            .stop_bits(self.config.stop_bits)
            .timeout(self.config.read_timeout)
            .open()
            .map_err(|err| TransportError::Io(err.into()))?;
        self.port = Some(port);
        // Bytes left over from a previous session must not leak into
        // the first transaction.
        self.discard_buffers()?;
        debug!("opened serial port {}", self.config.port_name);
        Ok(())
    }

    fn close(&mut self) {
        if let Some(port) = self.port.take() {
            if let Err(err) = port.clear(ClearBuffer::All) {
                warn!(
                    "discarding buffers while closing {} failed: {err}",
                    self.config.port_name
                );
            }
            drop(port);
            debug!("closed serial port {}", self.config.port_name);
        }
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, TransportError> {
        if buf.is_empty() {
            return Err(TransportError::EmptyWrite);
        }
        let write_timeout = self.config.write_timeout;
        let read_timeout = self.config.read_timeout;
        let port = self.port_mut()?;

        port.set_timeout(write_timeout)
            .map_err(|err| TransportError::Io(err.into()))?;
        let result = match port.write_all(buf) {
            Ok(()) => Ok(buf.len()),
            Err(err) if err.kind() == io::ErrorKind::TimedOut => Err(TransportError::WriteTimeout {
                timeout: write_timeout,
            }),
            Err(err) => Err(TransportError::Io(err)),
        };
        // The handle timeout belongs to the read side between
        // transactions; restore it even when the write failed.
        if let Err(err) = port.set_timeout(read_timeout) {
            warn!("restoring the read timeout failed: {err}");
        }
        if result.is_ok() {
            debug!("wrote {} bytes to {}", buf.len(), self.config.port_name);
        }
        result
    }

    fn read_available(&mut self) -> Result<Bytes, TransportError> {
        let port = self.port_mut()?;
        let available = port
            .bytes_to_read()
            .map_err(|err| TransportError::Io(err.into()))? as usize;
        if available == 0 {
            return Ok(Bytes::new());
        }
        let mut buf = vec![0; available];
        let read = port.read(&mut buf).map_err(TransportError::Io)?;
        buf.truncate(read);
        Ok(buf.into())
    }

    fn read_exact(&mut self, len: usize) -> Result<Bytes, TransportError> {
        if len == 0 {
            return Err(TransportError::ZeroReadLength);
        }
        let timeout = self.config.read_timeout;
        if timeout.is_zero() {
            return Err(TransportError::ZeroTimeout);
        }
        let port = self.port.as_mut().ok_or(TransportError::NotOpen)?;

        let mut buf = vec![0; len];
        let mut received = 0;
        let start = Instant::now();
        while received < len {
            if start.elapsed() > timeout {
                return Err(TransportError::ReadTimeout {
                    expected: len,
                    received,
                    timeout,
                });
            }
            match port.read(&mut buf[received..]) {
                // A port that signals readiness but delivers nothing
                // would otherwise spin until the deadline.
                Ok(0) => return Err(TransportError::NoData),
                Ok(n) => received += n,
                Err(err) if err.kind() == io::ErrorKind::TimedOut => {
                    return Err(TransportError::ReadTimeout {
                        expected: len,
                        received,
                        timeout,
                    });
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
        debug!("read {len} bytes from {}", self.config.port_name);
        Ok(buf.into())
    }

    fn discard_buffers(&mut self) -> Result<(), TransportError> {
        let Some(port) = self.port.as_mut() else {
            return Ok(());
        };
        port.clear(ClearBuffer::All)
            .map_err(|err| TransportError::Io(err.into()))?;
        Ok(())
    }

    fn read_timeout(&self) -> Duration {
        self.config.read_timeout
    }

    fn set_read_timeout(&mut self, timeout: Duration) -> Result<(), TransportError> {
        if timeout.is_zero() {
            return Err(TransportError::ZeroTimeout);
        }
        self.config.read_timeout = timeout;
        if let Some(port) = self.port.as_mut() {
            port.set_timeout(timeout)
                .map_err(|err| TransportError::Io(err.into()))?;
        }
        Ok(())
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialTransport")
            .field("config", &self.config)
            .field("open", &self.is_open())
            .finish()
    }
}
