// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Byte-channel abstraction underneath the protocol engine.
//!
//! Modbus RTU runs over a half-duplex line that delivers bytes in
//! arbitrary chunks. The [`Transport`] trait captures exactly what the
//! master needs from such a line: an open/close lifecycle, writes with
//! a deadline, and exact-length reads that accumulate chunks under an
//! aggregate wall-clock deadline.

mod loopback;

#[cfg(feature = "serial")]
mod serial;

pub use self::loopback::LoopbackTransport;

#[cfg(feature = "serial")]
pub use self::serial::{DataBits, Parity, SerialConfig, SerialTransport, StopBits};

use std::time::Duration;

use bytes::Bytes;

use crate::error::TransportError;

/// Capability contract the master requires from a byte channel.
///
/// Implementations are stateful handles with an open/close lifecycle;
/// every operation except [`open`](Self::open), [`close`](Self::close)
/// and [`discard_buffers`](Self::discard_buffers) requires the handle
/// to be open.
///
/// Exclusive access is expressed through `&mut self`: one full
/// write-then-read transaction can never interleave with another
/// thread's transaction on the same handle. To share a handle between
/// threads, wrap it (or the whole client) in a `Mutex` and hold the
/// lock for a complete transaction.
pub trait Transport {
    /// Opens the channel.
    ///
    /// Fails with [`TransportError::AlreadyOpen`] on an open handle.
    /// On success, bytes buffered from a previous session are
    /// discarded.
    fn open(&mut self) -> Result<(), TransportError>;

    /// Closes the channel, discarding buffered bytes first.
    ///
    /// Idempotent: closing a closed (or never opened) handle is a
    /// no-op. Failures of the underlying release are swallowed so that
    /// cleanup always completes.
    fn close(&mut self);

    /// Writes all of `buf` and returns the number of bytes written.
    ///
    /// Fails with [`TransportError::EmptyWrite`] on an empty buffer and
    /// with [`TransportError::WriteTimeout`] when the write deadline
    /// expires.
    fn write(&mut self, buf: &[u8]) -> Result<usize, TransportError>;

    /// Returns the bytes that are buffered right now, possibly none,
    /// without waiting for more to arrive.
    fn read_available(&mut self) -> Result<Bytes, TransportError>;

    /// Reads exactly `len` bytes.
    ///
    /// Partial reads are accumulated until `len` bytes have arrived or
    /// the aggregate deadline given by [`read_timeout`](Self::read_timeout)
    /// expires, whichever comes first. A deadline expiry is reported as
    /// [`TransportError::ReadTimeout`] carrying the number of bytes
    /// collected so far. A channel that claims readiness but yields
    /// zero bytes is reported as [`TransportError::NoData`] instead of
    /// spinning forever.
    ///
    /// `len` must be positive.
    fn read_exact(&mut self, len: usize) -> Result<Bytes, TransportError>;

    /// Clears pending input and output buffers.
    ///
    /// A no-op (not an error) on a closed handle.
    fn discard_buffers(&mut self) -> Result<(), TransportError>;

    /// The aggregate deadline for [`read_exact`](Self::read_exact).
    /// Always positive.
    fn read_timeout(&self) -> Duration;

    /// Sets the read deadline. Fails on a zero duration.
    fn set_read_timeout(&mut self, timeout: Duration) -> Result<(), TransportError>;
}
