// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deadline behavior of exact-length reads.

use std::time::Duration;

use modbus_rtu_master::{
    transport::{LoopbackTransport, Transport},
    TransportError,
};

fn open_loopback() -> LoopbackTransport {
    let mut line = LoopbackTransport::new();
    line.open().unwrap();
    line
}

#[test]
fn chunked_delivery_within_the_deadline_succeeds() {
    let mut line = open_loopback();
    line.set_read_timeout(Duration::from_millis(500)).unwrap();

    // Three chunks, delays well under the aggregate deadline.
    line.enqueue_delayed(Duration::from_millis(20), vec![0x01, 0x02, 0x03]);
    line.enqueue_delayed(Duration::from_millis(20), vec![0x04, 0x05]);
    line.enqueue_delayed(Duration::from_millis(20), vec![0x06, 0x07, 0x08]);

    let data = line.read_exact(8).unwrap();
    assert_eq!(
        data.as_ref(),
        [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]
    );
}

#[test]
fn deadline_expiry_reports_the_partial_count() {
    let mut line = open_loopback();
    line.set_read_timeout(Duration::from_millis(50)).unwrap();

    // Two bytes arrive late; the rest never does.
    line.enqueue_delayed(Duration::from_millis(120), vec![0x01, 0x02]);
    line.enqueue_delayed(Duration::from_millis(120), vec![0x03, 0x04]);

    let err = line.read_exact(8).unwrap_err();
    match err {
        TransportError::ReadTimeout {
            expected,
            received,
            timeout,
        } => {
            assert_eq!(expected, 8);
            assert_eq!(received, 2);
            assert_eq!(timeout, Duration::from_millis(50));
        }
        other => panic!("expected a read timeout, got {other:?}"),
    }
}

#[test]
fn exact_read_requires_a_positive_length() {
    let mut line = open_loopback();
    assert!(matches!(
        line.read_exact(0),
        Err(TransportError::ZeroReadLength)
    ));
}

#[test]
fn exhausted_channel_is_distinct_from_a_timeout() {
    let mut line = open_loopback();
    line.enqueue(vec![0x01]);

    // One byte is there, then the channel yields nothing more.
    let err = line.read_exact(4).unwrap_err();
    assert!(matches!(err, TransportError::NoData));
}

#[test]
fn surplus_bytes_stay_buffered_between_reads() {
    let mut line = open_loopback();
    line.enqueue(vec![0x01, 0x02, 0x03, 0x04, 0x05]);

    assert_eq!(line.read_exact(2).unwrap().as_ref(), [0x01, 0x02]);
    assert_eq!(line.read_exact(3).unwrap().as_ref(), [0x03, 0x04, 0x05]);
}

#[test]
fn discard_buffers_drops_pending_input() {
    let mut line = open_loopback();
    line.enqueue(vec![0x01, 0x02]);
    line.discard_buffers().unwrap();
    assert!(line.read_available().unwrap().is_empty());
}
