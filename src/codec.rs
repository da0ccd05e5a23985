// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stateless assembly and validation of Modbus RTU frames.
//!
//! A request ADU is `[device address] [PDU] [CRC lo] [CRC hi]`; a
//! response carries the same framing with the function-specific
//! payload in between. All multi-byte register fields are big-endian,
//! while the trailing CRC-16 is transmitted low byte first.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use bytes::Bytes;
use smallvec::SmallVec;

use crate::{
    error::ProtocolError,
    frame::{ExceptionCode, FunctionCode, EXCEPTION_BIT},
    slave::Slave,
};

/// Largest possible RTU frame on the wire.
pub(crate) const MAX_ADU_LEN: usize = 256;

/// A write payload may cover at most 123 registers.
pub const MAX_WRITE_PAYLOAD_LEN: usize = 246;

/// A read may request at most 125 registers.
pub const MAX_READ_BYTE_COUNT: usize = 250;

/// Fixed size of a successful write acknowledgment: device address,
/// function code, start register, register count and CRC.
pub(crate) const WRITE_RESPONSE_LEN: usize = 8;

/// Minimum size of a read response: device address, function code,
/// byte-count field and CRC.
pub(crate) const MIN_READ_RESPONSE_LEN: usize = 5;

/// Size of an exception response: device address, function code with
/// the exception bit set, exception code and CRC.
pub(crate) const EXCEPTION_RESPONSE_LEN: usize = 5;

/// A request frame, assembled in place on the stack.
pub(crate) type RequestBuf = SmallVec<[u8; MAX_ADU_LEN]>;

/// Computes the Modbus CRC-16 over `data`.
///
/// Polynomial `0xA001` (reflected `0x8005`), initial value `0xFFFF`.
/// The result is appended to frames low byte first.
#[must_use]
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc = 0xFFFF_u16;
    for x in data {
        crc ^= u16::from(*x);
        for _ in 0..8 {
            if (crc & 0x0001) != 0 {
                crc >>= 1;
                crc ^= 0xA001;
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}

fn push_crc(frame: &mut RequestBuf) {
    let crc = crc16(frame);
    frame.push((crc & 0xFF) as u8);
    frame.push((crc >> 8) as u8);
}

/// Assembles the ADU of a "read input registers" (0x04) request.
pub(crate) fn read_input_registers_request(
    slave: Slave,
    start: u16,
    register_count: u16,
) -> RequestBuf {
    let mut frame = RequestBuf::new();
    frame.push(slave.into());
    frame.push(FunctionCode::ReadInputRegisters.value());
    frame.extend_from_slice(&start.to_be_bytes());
    frame.extend_from_slice(&register_count.to_be_bytes());
    push_crc(&mut frame);
    frame
}

/// Assembles the ADU of a "write multiple registers" (0x10) request.
///
/// `data` must already be validated: non-empty, even length, at most
/// [`MAX_WRITE_PAYLOAD_LEN`] bytes.
pub(crate) fn write_multiple_registers_request(slave: Slave, start: u16, data: &[u8]) -> RequestBuf {
    debug_assert!(!data.is_empty());
    debug_assert!(data.len() % 2 == 0);
    debug_assert!(data.len() <= MAX_WRITE_PAYLOAD_LEN);

    let register_count = (data.len() / 2) as u16;
    let mut frame = RequestBuf::new();
    frame.push(slave.into());
    frame.push(FunctionCode::WriteMultipleRegisters.value());
    frame.extend_from_slice(&start.to_be_bytes());
    frame.extend_from_slice(&register_count.to_be_bytes());
    frame.push(data.len() as u8);
    frame.extend_from_slice(data);
    push_crc(&mut frame);
    frame
}

/// Full length of a read response carrying `byte_count` data bytes.
pub(crate) const fn read_response_len(byte_count: usize) -> usize {
    3 + byte_count + 2
}

/// Checks the trailing CRC of `frame` against its contents.
pub(crate) fn check_crc(frame: &[u8]) -> Result<(), ProtocolError> {
    let (contents, crc) = frame.split_at(frame.len() - 2);
    let received = LittleEndian::read_u16(crc);
    let calculated = crc16(contents);
    if calculated != received {
        return Err(ProtocolError::CrcMismatch {
            calculated,
            received,
        });
    }
    Ok(())
}

/// Shared first validation steps of both response kinds: minimum
/// length, device address, exception bit.
///
/// An exception reply fits into [`EXCEPTION_RESPONSE_LEN`] bytes and is
/// detectable even when the success frame would be longer, so the
/// exception check only requires that much. Exception replies are
/// returned as they are, without any further structural checks.
fn response_prologue(
    frame: &[u8],
    slave: Slave,
    min_len: usize,
) -> Result<Option<ExceptionCode>, ProtocolError> {
    if frame.len() < EXCEPTION_RESPONSE_LEN {
        return Err(ProtocolError::ResponseTooShort {
            actual: frame.len(),
            min: min_len,
        });
    }
    if frame[0] != slave.into() {
        return Err(ProtocolError::SlaveMismatch {
            expected: slave,
            actual: Slave(frame[0]),
        });
    }
    if frame[1] & EXCEPTION_BIT != 0 {
        return Ok(Some(ExceptionCode::new(frame[2])));
    }
    if frame.len() < min_len {
        return Err(ProtocolError::ResponseTooShort {
            actual: frame.len(),
            min: min_len,
        });
    }
    Ok(None)
}

/// Validates a "read input registers" response and extracts the raw
/// register bytes.
///
/// Checks, in order: minimum length, device address, exception bit
/// (early return), function code, declared byte count, total length,
/// CRC.
pub(crate) fn decode_read_response(
    frame: &Bytes,
    slave: Slave,
    byte_count: usize,
) -> Result<Result<Bytes, ExceptionCode>, ProtocolError> {
    if let Some(exception) = response_prologue(frame, slave, MIN_READ_RESPONSE_LEN)? {
        return Ok(Err(exception));
    }
    let function = frame[1];
    if function != FunctionCode::ReadInputRegisters.value() {
        return Err(ProtocolError::FunctionMismatch {
            expected: FunctionCode::ReadInputRegisters,
            actual: function,
        });
    }
    let declared = frame[2] as usize;
    if declared != byte_count {
        return Err(ProtocolError::ByteCountMismatch {
            expected: byte_count,
            actual: declared,
        });
    }
    let expected_len = read_response_len(declared);
    if frame.len() != expected_len {
        return Err(ProtocolError::LengthMismatch {
            expected: expected_len,
            actual: frame.len(),
        });
    }
    check_crc(frame)?;
    Ok(Ok(frame.slice(3..3 + declared)))
}

/// Validates a "write multiple registers" acknowledgment and extracts
/// the echoed start register and register count bytes.
///
/// Checks, in order: minimum length, device address, exception bit
/// (early return), function code, CRC, echoed start register.
pub(crate) fn decode_write_response(
    frame: &Bytes,
    slave: Slave,
    start: u16,
) -> Result<Result<Bytes, ExceptionCode>, ProtocolError> {
    if let Some(exception) = response_prologue(frame, slave, WRITE_RESPONSE_LEN)? {
        return Ok(Err(exception));
    }
    let function = frame[1];
    if function != FunctionCode::WriteMultipleRegisters.value() {
        return Err(ProtocolError::FunctionMismatch {
            expected: FunctionCode::WriteMultipleRegisters,
            actual: function,
        });
    }
    check_crc(frame)?;
    let echoed = BigEndian::read_u16(&frame[2..4]);
    if echoed != start {
        return Err(ProtocolError::StartRegisterMismatch {
            expected: start,
            actual: echoed,
        });
    }
    Ok(Ok(frame.slice(2..6)))
}
