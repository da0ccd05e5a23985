// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic in-memory transport for tests and demos.

use std::{
    collections::VecDeque,
    thread,
    time::{Duration, Instant},
};

use bytes::{Bytes, BytesMut};

use crate::error::TransportError;

use super::Transport;

#[derive(Debug)]
struct Chunk {
    delay: Duration,
    data: Vec<u8>,
}

/// A scripted loopback channel.
///
/// Written frames are recorded for inspection; responses are queued
/// ahead of time as chunks, each optionally preceded by a delivery
/// delay so that deadline behavior can be exercised. The handle
/// follows the same lifecycle rules as the serial implementation.
///
/// Queueing an empty chunk simulates a channel that claims readiness
/// but yields nothing.
#[derive(Debug)]
pub struct LoopbackTransport {
    open: bool,
    read_timeout: Duration,
    rx: VecDeque<Chunk>,
    written: Vec<Bytes>,
}

impl LoopbackTransport {
    /// Creates a closed loopback handle with a one-second read
    /// timeout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            open: false,
            read_timeout: Duration::from_secs(1),
            rx: VecDeque::new(),
            written: Vec::new(),
        }
    }

    /// Queues `data` for immediate delivery.
    pub fn enqueue(&mut self, data: impl Into<Vec<u8>>) {
        self.enqueue_delayed(Duration::ZERO, data);
    }

    /// Queues `data` for delivery after `delay` of simulated line
    /// time.
    pub fn enqueue_delayed(&mut self, delay: Duration, data: impl Into<Vec<u8>>) {
        self.rx.push_back(Chunk {
            delay,
            data: data.into(),
        });
    }

    /// The frames written so far, oldest first.
    pub fn written(&self) -> &[Bytes] {
        &self.written
    }

    /// Removes and returns the recorded frames.
    pub fn take_written(&mut self) -> Vec<Bytes> {
        std::mem::take(&mut self.written)
    }
}

impl Default for LoopbackTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for LoopbackTransport {
    fn open(&mut self) -> Result<(), TransportError> {
        if self.open {
            return Err(TransportError::AlreadyOpen);
        }
        self.open = true;
        // Whatever was queued before belongs to a previous session.
        self.rx.clear();
        Ok(())
    }

    fn close(&mut self) {
        self.rx.clear();
        self.open = false;
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, TransportError> {
        if buf.is_empty() {
            return Err(TransportError::EmptyWrite);
        }
        if !self.open {
            return Err(TransportError::NotOpen);
        }
        self.written.push(Bytes::copy_from_slice(buf));
        Ok(buf.len())
    }

    fn read_available(&mut self) -> Result<Bytes, TransportError> {
        if !self.open {
            return Err(TransportError::NotOpen);
        }
        let mut buf = BytesMut::new();
        while self.rx.front().map_or(false, |chunk| chunk.delay.is_zero()) {
            if let Some(chunk) = self.rx.pop_front() {
                buf.extend_from_slice(&chunk.data);
            }
        }
        Ok(buf.freeze())
    }

    fn read_exact(&mut self, len: usize) -> Result<Bytes, TransportError> {
        if len == 0 {
            return Err(TransportError::ZeroReadLength);
        }
        if self.read_timeout.is_zero() {
            return Err(TransportError::ZeroTimeout);
        }
        if !self.open {
            return Err(TransportError::NotOpen);
        }

        let mut buf = BytesMut::with_capacity(len);
        let start = Instant::now();
        while buf.len() < len {
            if start.elapsed() > self.read_timeout {
                return Err(TransportError::ReadTimeout {
                    expected: len,
                    received: buf.len(),
                    timeout: self.read_timeout,
                });
            }
            let Some(mut chunk) = self.rx.pop_front() else {
                // The script ran dry: the channel yields nothing more.
                return Err(TransportError::NoData);
            };
            if !chunk.delay.is_zero() {
                thread::sleep(chunk.delay);
            }
            if chunk.data.is_empty() {
                return Err(TransportError::NoData);
            }
            let need = len - buf.len();
            if chunk.data.len() > need {
                let rest = chunk.data.split_off(need);
                self.rx.push_front(Chunk {
                    delay: Duration::ZERO,
                    data: rest,
                });
            }
            buf.extend_from_slice(&chunk.data);
        }
        Ok(buf.freeze())
    }

    fn discard_buffers(&mut self) -> Result<(), TransportError> {
        if self.open {
            self.rx.clear();
        }
        Ok(())
    }

    fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    fn set_read_timeout(&mut self, timeout: Duration) -> Result<(), TransportError> {
        if timeout.is_zero() {
            return Err(TransportError::ZeroTimeout);
        }
        self.read_timeout = timeout;
        Ok(())
    }
}
