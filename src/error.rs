// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types.

use std::{io, time::Duration};

use thiserror::Error;

use crate::{frame::FunctionCode, slave::Slave};

/// Invalid request arguments.
///
/// Always reported before any I/O is attempted, so a rejected request
/// leaves the transport untouched.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RequestError {
    /// The device address is outside the single-device range `1..=247`.
    #[error("device address {0} is outside the range 1..=247")]
    InvalidSlave(u8),

    /// The write payload is empty.
    #[error("write payload is empty")]
    EmptyPayload,

    /// Registers are 2 bytes wide, so write payloads must have even length.
    #[error("write payload length {0} is not a multiple of 2")]
    OddPayloadLength(usize),

    /// The write payload exceeds 123 registers (246 bytes).
    #[error("write payload length {0} exceeds the maximum of 246 bytes (123 registers)")]
    PayloadTooLong(usize),

    /// The requested byte count is zero.
    #[error("requested byte count must be positive")]
    ZeroByteCount,

    /// Registers are 2 bytes wide, so requested byte counts must be even.
    #[error("requested byte count {0} is not a multiple of 2")]
    OddByteCount(usize),

    /// The requested byte count exceeds 125 registers (250 bytes).
    #[error("requested byte count {0} exceeds the maximum of 250 bytes (125 registers)")]
    ByteCountTooLarge(usize),
}

/// Failures of the byte channel, as opposed to failures of the
/// protocol layer on top of it.
///
/// Callers can tell "device unreachable" apart from "device responded
/// incorrectly" by matching on [`Error::Transport`] vs.
/// [`Error::Protocol`].
#[derive(Debug, Error)]
pub enum TransportError {
    /// The handle is not open.
    #[error("port is not open")]
    NotOpen,

    /// `open` was called on a handle that is already open.
    #[error("port is already open")]
    AlreadyOpen,

    /// `write` was called with an empty buffer.
    #[error("nothing to write: empty buffer")]
    EmptyWrite,

    /// `read_exact` was called with a zero length.
    #[error("exact read length must be positive")]
    ZeroReadLength,

    /// Timeouts must be positive to bound blocking operations.
    #[error("timeout must be greater than zero")]
    ZeroTimeout,

    /// The underlying channel claimed readiness but yielded no bytes.
    #[error("channel returned no data")]
    NoData,

    /// The write deadline elapsed before all bytes were accepted.
    #[error("write timed out after {timeout:?}")]
    WriteTimeout {
        /// The configured write deadline.
        timeout: Duration,
    },

    /// The aggregate read deadline elapsed before all requested bytes
    /// arrived.
    #[error("read timed out after {timeout:?}: received {received} of {expected} bytes")]
    ReadTimeout {
        /// How many bytes were requested.
        expected: usize,
        /// How many bytes had arrived when the deadline expired.
        received: usize,
        /// The configured read deadline.
        timeout: Duration,
    },

    /// Any other failure of the underlying channel.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Response validation failures.
///
/// Each condition is reported distinctly, in the order the response is
/// checked: length, device address, function code, structure, CRC.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// The response is shorter than the minimum for its function.
    #[error("response of {actual} bytes is shorter than the minimum of {min} bytes")]
    ResponseTooShort { actual: usize, min: usize },

    /// The responding device address differs from the requested one.
    #[error("device address mismatch: expected {expected}, got {actual}")]
    SlaveMismatch { expected: Slave, actual: Slave },

    /// The echoed function code differs from the requested one.
    #[error("function code mismatch: expected {expected}, got 0x{actual:02X}")]
    FunctionMismatch { expected: FunctionCode, actual: u8 },

    /// The declared data byte count differs from the requested one.
    #[error("byte count mismatch: expected {expected}, got {actual}")]
    ByteCountMismatch { expected: usize, actual: usize },

    /// The total response length is inconsistent with the declared
    /// byte count.
    #[error("response length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// The CRC-16 of the response does not match its contents.
    #[error("CRC mismatch: calculated 0x{calculated:04X}, received 0x{received:04X}")]
    CrcMismatch { calculated: u16, received: u16 },

    /// The echoed start register differs from the requested one.
    #[error("start register mismatch: expected 0x{expected:04X}, got 0x{actual:04X}")]
    StartRegisterMismatch { expected: u16, actual: u16 },
}

/// Error type for whole master transactions.
///
/// Device-reported exceptions are not errors; they are carried in the
/// inner result of [`crate::Result`].
#[derive(Debug, Error)]
pub enum Error {
    /// The request was rejected before any I/O was attempted.
    #[error("invalid request: {0}")]
    Request(#[from] RequestError),

    /// The transport failed or timed out.
    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    /// The device responded, but the response failed validation.
    #[error("protocol: {0}")]
    Protocol(#[from] ProtocolError),
}
