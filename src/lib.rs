// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A pure [Rust](https://www.rust-lang.org)
//! [Modbus](https://en.wikipedia.org/wiki/Modbus) RTU master for
//! serial lines.
//!
//! Modbus is based on a [master/slave](https://en.wikipedia.org/wiki/Master/slave_(technology))
//! model. This crate implements the master side of the RTU (serial)
//! flavor as a synchronous, blocking library: it assembles request
//! frames, guards them with the Modbus CRC-16, and validates responses
//! field by field, reading exactly as many bytes as the protocol
//! dictates under a wall-clock deadline.
//!
//! Two functions are spoken: "read input registers" (0x04) and "write
//! multiple registers" (0x10). Payloads are raw big-endian register
//! bytes; interpreting them is left to the caller.
//!
//! ## Installation
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! modbus-rtu-master = "*"
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use modbus_rtu_master::{
//!     transport::{SerialConfig, SerialTransport, Transport},
//!     Client, Slave,
//! };
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SerialConfig::new("/dev/ttyUSB0").baud_rate(19_200);
//!     let mut port = SerialTransport::new(config)?;
//!     port.open()?;
//!
//!     let mut master = Client::new(&mut port);
//!     let data = master.read_input_registers(Slave(1), 0x0000, 4)??;
//!     println!("input registers: {data:02X?}");
//!     Ok(())
//! }
//! ```

mod client;
mod codec;
mod error;
mod frame;
mod slave;

pub mod transport;

pub use self::{
    client::Client,
    codec::{crc16, MAX_READ_BYTE_COUNT, MAX_WRITE_PAYLOAD_LEN},
    error::{Error, ProtocolError, RequestError, TransportError},
    frame::{ExceptionCode, FunctionCode},
    slave::{Slave, SlaveId},
};

/// General result of a master transaction.
///
/// The outer result carries transaction failures, the inner one the
/// device's verdict: `Ok(Ok(data))` on success, `Ok(Err(exception))`
/// when the device refused the operation, `Err(error)` when the
/// transaction itself failed.
pub type Result<T> = std::result::Result<std::result::Result<T, ExceptionCode>, Error>;
