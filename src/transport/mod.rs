//! Byte-stream transports.
//!
//! The protocol only needs an ordered byte stream in each direction. The
//! [`Transport`] trait captures that; [`SerialTransport`] talks to real
//! hardware and [`ScriptedTransport`] replays recorded or synthetic input.

pub mod decode;
pub mod scripted;
pub mod serial;

pub use decode::Utf8Decoder;
pub use scripted::ScriptedTransport;
pub use serial::{DEFAULT_BAUD_RATE, PortSummary, SerialTransport, list_ports};

use crate::error::TransportError;

/// Result of a single read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// This many bytes were placed at the start of the buffer.
    Data(usize),
    /// Nothing arrived within the transport's poll interval.
    Idle,
    /// The stream ended; no more data will arrive.
    End,
}

/// A bidirectional byte stream to the device.
pub trait Transport {
    /// Reads the next available bytes into `buf`.
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<ReadOutcome, TransportError>;

    /// Writes all of `bytes`, in order.
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Releases the underlying resource. Later reads report [`ReadOutcome::End`].
    fn close(&mut self);

    /// Human-readable name for logs.
    fn describe(&self) -> String;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<ReadOutcome, TransportError> {
        (**self).read_chunk(buf)
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).write_all(bytes)
    }

    fn close(&mut self) {
        (**self).close();
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
