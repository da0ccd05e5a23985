// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Master transactions against the scripted loopback line.

use modbus_rtu_master::{
    crc16,
    transport::{LoopbackTransport, Transport},
    Client, Error, ExceptionCode, ProtocolError, RequestError, Slave, TransportError,
    MAX_READ_BYTE_COUNT, MAX_WRITE_PAYLOAD_LEN,
};

fn with_crc(body: &[u8]) -> Vec<u8> {
    let mut frame = body.to_vec();
    let crc = crc16(&frame);
    frame.push((crc & 0xFF) as u8);
    frame.push((crc >> 8) as u8);
    frame
}

fn open_loopback() -> LoopbackTransport {
    let mut line = LoopbackTransport::new();
    line.open().unwrap();
    line
}

#[test]
fn write_multiple_registers_round_trip() {
    let mut line = open_loopback();
    line.enqueue(with_crc(&[0x01, 0x10, 0x00, 0x10, 0x00, 0x02]));

    let mut master = Client::new(&mut line);
    let result = master
        .write_multiple_registers(Slave(1), 0x0010, &[0x00, 0x0A, 0x01, 0x02])
        .unwrap();
    assert_eq!(result.unwrap().as_ref(), [0x00, 0x10, 0x00, 0x02]);

    let written = line.take_written();
    assert_eq!(written.len(), 1);
    assert_eq!(
        written[0].as_ref(),
        with_crc(&[0x01, 0x10, 0x00, 0x10, 0x00, 0x02, 0x04, 0x00, 0x0A, 0x01, 0x02]).as_slice()
    );
}

#[test]
fn write_request_crc_round_trips() {
    let mut line = open_loopback();
    line.enqueue(with_crc(&[0x07, 0x10, 0x12, 0x34, 0x00, 0x03]));

    let mut master = Client::new(&mut line);
    master
        .write_multiple_registers(Slave(7), 0x1234, &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06])
        .unwrap()
        .unwrap();

    // Recomputing the CRC over everything except the trailing two
    // bytes must reproduce the embedded CRC.
    let written = line.take_written();
    let frame = &written[0];
    let crc = crc16(&frame[..frame.len() - 2]);
    assert_eq!(frame[frame.len() - 2], (crc & 0xFF) as u8);
    assert_eq!(frame[frame.len() - 1], (crc >> 8) as u8);
}

#[test]
fn read_input_registers_round_trip() {
    let mut line = open_loopback();
    line.enqueue(with_crc(&[0x01, 0x04, 0x04, 0x00, 0x01, 0x00, 0x02]));

    let mut master = Client::new(&mut line);
    let result = master.read_input_registers(Slave(1), 0x0000, 4).unwrap();
    assert_eq!(result.unwrap().as_ref(), [0x00, 0x01, 0x00, 0x02]);

    let written = line.take_written();
    assert_eq!(
        written[0].as_ref(),
        [0x01, 0x04, 0x00, 0x00, 0x00, 0x02, 0x71, 0xCB]
    );
}

#[test]
fn read_response_delivered_in_chunks() {
    let mut line = open_loopback();
    let response = with_crc(&[0x01, 0x04, 0x04, 0x00, 0x01, 0x00, 0x02]);
    for chunk in response.chunks(2) {
        line.enqueue(chunk.to_vec());
    }

    let mut master = Client::new(&mut line);
    let result = master.read_input_registers(Slave(1), 0x0000, 4).unwrap();
    assert_eq!(result.unwrap().as_ref(), [0x00, 0x01, 0x00, 0x02]);
}

#[test]
fn boundaries_are_rejected_before_any_io() {
    let mut line = open_loopback();
    let mut master = Client::new(&mut line);

    assert!(matches!(
        master.write_multiple_registers(Slave(0), 0x0000, &[0x00, 0x01]),
        Err(Error::Request(RequestError::InvalidSlave(0)))
    ));
    assert!(matches!(
        master.read_input_registers(Slave(248), 0x0000, 2),
        Err(Error::Request(RequestError::InvalidSlave(248)))
    ));
    assert!(matches!(
        master.write_multiple_registers(Slave(1), 0x0000, &[]),
        Err(Error::Request(RequestError::EmptyPayload))
    ));
    assert!(matches!(
        master.write_multiple_registers(Slave(1), 0x0000, &[0x00, 0x01, 0x02]),
        Err(Error::Request(RequestError::OddPayloadLength(3)))
    ));
    assert!(matches!(
        master.write_multiple_registers(Slave(1), 0x0000, &[0x00; 248]),
        Err(Error::Request(RequestError::PayloadTooLong(248)))
    ));
    assert!(matches!(
        master.read_input_registers(Slave(1), 0x0000, 0),
        Err(Error::Request(RequestError::ZeroByteCount))
    ));
    assert!(matches!(
        master.read_input_registers(Slave(1), 0x0000, 7),
        Err(Error::Request(RequestError::OddByteCount(7)))
    ));
    assert!(matches!(
        master.read_input_registers(Slave(1), 0x0000, 252),
        Err(Error::Request(RequestError::ByteCountTooLarge(252)))
    ));

    assert!(line.written().is_empty());
}

#[test]
fn maximum_write_payload_is_accepted() {
    let mut line = open_loopback();
    // 246 bytes = 123 registers = 0x7B.
    line.enqueue(with_crc(&[0x01, 0x10, 0x00, 0x00, 0x00, 0x7B]));

    let mut master = Client::new(&mut line);
    let payload = vec![0xAB; MAX_WRITE_PAYLOAD_LEN];
    let result = master
        .write_multiple_registers(Slave(1), 0x0000, &payload)
        .unwrap();
    assert!(result.is_ok());
}

#[test]
fn maximum_read_byte_count_is_accepted() {
    let mut line = open_loopback();
    // 250 bytes = 125 registers.
    let mut body = vec![0x01, 0x04, 0xFA];
    body.extend(std::iter::repeat(0x55).take(MAX_READ_BYTE_COUNT));
    line.enqueue(with_crc(&body));

    let mut master = Client::new(&mut line);
    let result = master
        .read_input_registers(Slave(1), 0x0000, MAX_READ_BYTE_COUNT)
        .unwrap();
    assert_eq!(result.unwrap().len(), MAX_READ_BYTE_COUNT);
}

#[test]
fn read_exception_reports_the_device_code() {
    let mut line = open_loopback();
    // 0x04 | 0x80 and a bogus CRC: neither a CRC nor a length verdict
    // may preempt the exception.
    line.enqueue(vec![0x01, 0x84, 0x02, 0xFF, 0xFF]);

    let mut master = Client::new(&mut line);
    let result = master.read_input_registers(Slave(1), 0x0000, 4).unwrap();
    assert_eq!(result.unwrap_err(), ExceptionCode::IllegalDataAddress);
}

#[test]
fn write_exception_reports_the_device_code() {
    let mut line = open_loopback();
    line.enqueue(with_crc(&[0x01, 0x90, 0x06]));

    let mut master = Client::new(&mut line);
    let result = master
        .write_multiple_registers(Slave(1), 0x0010, &[0x00, 0x0A])
        .unwrap();
    assert_eq!(result.unwrap_err(), ExceptionCode::ServerDeviceBusy);
}

#[test]
fn unrecognized_exception_code_is_carried_through() {
    let mut line = open_loopback();
    line.enqueue(vec![0x01, 0x84, 0x55, 0x00, 0x00]);

    let mut master = Client::new(&mut line);
    let result = master.read_input_registers(Slave(1), 0x0000, 2).unwrap();
    assert_eq!(result.unwrap_err(), ExceptionCode::Custom(0x55));
}

#[test]
fn address_mismatch_is_a_protocol_error() {
    let mut line = open_loopback();
    line.enqueue(with_crc(&[0x02, 0x04, 0x02, 0x00, 0x01]));

    let mut master = Client::new(&mut line);
    let err = master
        .read_input_registers(Slave(1), 0x0000, 2)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Protocol(ProtocolError::SlaveMismatch { .. })
    ));
}

#[test]
fn function_mismatch_is_a_protocol_error() {
    let mut line = open_loopback();
    line.enqueue(with_crc(&[0x01, 0x03, 0x02, 0x00, 0x01]));

    let mut master = Client::new(&mut line);
    let err = master
        .read_input_registers(Slave(1), 0x0000, 2)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Protocol(ProtocolError::FunctionMismatch { actual: 0x03, .. })
    ));
}

#[test]
fn byte_count_mismatch_is_a_protocol_error() {
    let mut line = open_loopback();
    // Requested 2 data bytes, device declares 4; the engine reads the
    // window sized for its own request.
    line.enqueue(with_crc(&[0x01, 0x04, 0x04, 0x00, 0x01]));

    let mut master = Client::new(&mut line);
    let err = master
        .read_input_registers(Slave(1), 0x0000, 2)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Protocol(ProtocolError::ByteCountMismatch {
            expected: 2,
            actual: 4,
        })
    ));
}

#[test]
fn corrupted_crc_is_a_protocol_error() {
    let mut line = open_loopback();
    let mut response = with_crc(&[0x01, 0x04, 0x02, 0x00, 0x01]);
    let last = response.len() - 1;
    response[last] ^= 0xFF;
    line.enqueue(response);

    let mut master = Client::new(&mut line);
    let err = master
        .read_input_registers(Slave(1), 0x0000, 2)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Protocol(ProtocolError::CrcMismatch { .. })
    ));
}

#[test]
fn echoed_start_register_is_verified() {
    let mut line = open_loopback();
    line.enqueue(with_crc(&[0x01, 0x10, 0x00, 0x11, 0x00, 0x01]));

    let mut master = Client::new(&mut line);
    let err = master
        .write_multiple_registers(Slave(1), 0x0010, &[0x00, 0x0A])
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Protocol(ProtocolError::StartRegisterMismatch {
            expected: 0x0010,
            actual: 0x0011,
        })
    ));
}

#[test]
fn slow_device_is_a_timeout_with_partial_count() {
    let mut line = open_loopback();
    line.set_read_timeout(std::time::Duration::from_millis(50))
        .unwrap();
    // Two bytes dribble in after the deadline; the rest never arrives.
    line.enqueue_delayed(std::time::Duration::from_millis(120), vec![0x01, 0x04]);
    line.enqueue_delayed(std::time::Duration::from_millis(120), vec![0x02]);

    let mut master = Client::new(&mut line);
    let err = master
        .read_input_registers(Slave(1), 0x0000, 2)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Transport(TransportError::ReadTimeout { received: 2, .. })
    ));
}

#[test]
fn exhausted_line_is_a_broken_channel() {
    let mut line = open_loopback();

    let mut master = Client::new(&mut line);
    let err = master
        .read_input_registers(Slave(1), 0x0000, 2)
        .unwrap_err();
    assert!(matches!(err, Error::Transport(TransportError::NoData)));
}

#[test]
fn transactions_work_through_a_trait_object() {
    let mut line = open_loopback();
    line.enqueue(with_crc(&[0x01, 0x04, 0x02, 0x00, 0x2A]));

    let transport: &mut dyn Transport = &mut line;
    let mut master = Client::new(transport);
    let result = master.read_input_registers(Slave(1), 0x0000, 2).unwrap();
    assert_eq!(result.unwrap().as_ref(), [0x00, 0x2A]);
}
