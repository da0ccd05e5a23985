// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Modbus RTU master.

use bytes::{Bytes, BytesMut};
use log::debug;

use crate::{
    codec,
    error::{Error, RequestError},
    frame::EXCEPTION_BIT,
    slave::Slave,
    transport::Transport,
    Result,
};

/// A Modbus RTU master bound to a borrowed transport.
///
/// The client drives strict request/response transactions over the
/// half-duplex line: each operation validates its arguments, writes
/// one request frame and reads back one response of a length that is
/// known in advance. Because the transport is borrowed mutably, no two
/// transactions can ever interleave on the same line; the caller must
/// not drive the transport directly while the client holds it.
///
/// Device-reported exceptions are not transaction failures: they are
/// returned through the inner result, see [`crate::Result`].
#[derive(Debug)]
pub struct Client<'a, T: Transport + ?Sized> {
    transport: &'a mut T,
}

impl<'a, T: Transport + ?Sized> Client<'a, T> {
    /// Creates a master on an already configured transport.
    ///
    /// The transport must be open before the first transaction.
    pub fn new(transport: &'a mut T) -> Self {
        Self { transport }
    }

    /// Reads `byte_count` bytes of input registers (0x04) starting at
    /// register `start` of device `slave`.
    ///
    /// `byte_count` must be positive, even and at most
    /// [`MAX_READ_BYTE_COUNT`](crate::MAX_READ_BYTE_COUNT) (125
    /// registers). On success the raw big-endian register bytes are
    /// returned.
    pub fn read_input_registers(
        &mut self,
        slave: Slave,
        start: u16,
        byte_count: usize,
    ) -> Result<Bytes> {
        validate_slave(slave)?;
        validate_read_byte_count(byte_count)?;
        let register_count = (byte_count / 2) as u16;

        let request = codec::read_input_registers_request(slave, start, register_count);
        let response = self.transact(&request, codec::read_response_len(byte_count))?;
        codec::decode_read_response(&response, slave, byte_count).map_err(Error::Protocol)
    }

    /// Writes `data` to the registers (0x10) starting at register
    /// `start` of device `slave`.
    ///
    /// `data` must be non-empty, of even length and at most
    /// [`MAX_WRITE_PAYLOAD_LEN`](crate::MAX_WRITE_PAYLOAD_LEN) bytes
    /// (123 registers). On success the acknowledgment's echo of the
    /// start register and register count is returned as raw bytes.
    pub fn write_multiple_registers(
        &mut self,
        slave: Slave,
        start: u16,
        data: &[u8],
    ) -> Result<Bytes> {
        validate_slave(slave)?;
        validate_write_payload(data)?;

        let request = codec::write_multiple_registers_request(slave, start, data);
        let response = self.transact(&request, codec::WRITE_RESPONSE_LEN)?;
        codec::decode_write_response(&response, slave, start).map_err(Error::Protocol)
    }

    /// One strict request/response round trip.
    ///
    /// An exception reply is shorter on the wire than the success
    /// frame whose length was computed up front, so the response is
    /// collected in two steps: first enough bytes to spot the
    /// exception bit, then the remainder of the success frame.
    fn transact(
        &mut self,
        request: &[u8],
        response_len: usize,
    ) -> std::result::Result<Bytes, Error> {
        debug_assert!(response_len > codec::EXCEPTION_RESPONSE_LEN);

        debug!("--> {request:02X?}");
        self.transport.write(request).map_err(Error::Transport)?;

        let head = self
            .transport
            .read_exact(codec::EXCEPTION_RESPONSE_LEN)
            .map_err(Error::Transport)?;
        if head[1] & EXCEPTION_BIT != 0 {
            debug!("<-- {:02X?}", &head[..]);
            return Ok(head);
        }

        let tail = self
            .transport
            .read_exact(response_len - codec::EXCEPTION_RESPONSE_LEN)
            .map_err(Error::Transport)?;
        let mut response = BytesMut::with_capacity(response_len);
        response.extend_from_slice(&head);
        response.extend_from_slice(&tail);
        let response = response.freeze();
        debug!("<-- {:02X?}", &response[..]);
        Ok(response)
    }
}

fn validate_slave(slave: Slave) -> std::result::Result<(), RequestError> {
    if !slave.is_single_device() {
        return Err(RequestError::InvalidSlave(slave.into()));
    }
    Ok(())
}

fn validate_write_payload(data: &[u8]) -> std::result::Result<(), RequestError> {
    if data.is_empty() {
        return Err(RequestError::EmptyPayload);
    }
    if data.len() % 2 != 0 {
        return Err(RequestError::OddPayloadLength(data.len()));
    }
    if data.len() > codec::MAX_WRITE_PAYLOAD_LEN {
        return Err(RequestError::PayloadTooLong(data.len()));
    }
    Ok(())
}

fn validate_read_byte_count(byte_count: usize) -> std::result::Result<(), RequestError> {
    if byte_count == 0 {
        return Err(RequestError::ZeroByteCount);
    }
    if byte_count % 2 != 0 {
        return Err(RequestError::OddByteCount(byte_count));
    }
    if byte_count > codec::MAX_READ_BYTE_COUNT {
        return Err(RequestError::ByteCountTooLarge(byte_count));
    }
    Ok(())
}
