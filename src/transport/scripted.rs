//! In-memory transport fed from prepared chunks.

use super::{ReadOutcome, Transport};
use crate::error::TransportError;
use std::collections::VecDeque;

/// A transport that yields queued chunks and records what is written.
///
/// Used to replay captured device output and to drive sessions in tests.
/// Reads past the last queued chunk report [`ReadOutcome::End`].
///
/// # Examples
///
/// ```
/// use busnotify_config::transport::{ReadOutcome, ScriptedTransport, Transport};
///
/// let mut transport = ScriptedTransport::new(["BUSSTOP=1\n"]);
/// let mut buf = [0u8; 64];
/// assert_eq!(transport.read_chunk(&mut buf).unwrap(), ReadOutcome::Data(10));
/// assert_eq!(transport.read_chunk(&mut buf).unwrap(), ReadOutcome::End);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    incoming: VecDeque<Vec<u8>>,
    written: Vec<u8>,
    closed: bool,
    fail_writes: bool,
}

impl ScriptedTransport {
    /// Creates a transport that yields `chunks` in order.
    pub fn new<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[u8]>,
    {
        Self {
            incoming: chunks.into_iter().map(|c| c.as_ref().to_vec()).collect(),
            ..Self::default()
        }
    }

    /// Splits `data` into chunks of at most `chunk_size` bytes.
    ///
    /// A `chunk_size` of zero yields the whole input as one chunk.
    #[must_use]
    pub fn chunked(data: &[u8], chunk_size: usize) -> Self {
        if chunk_size == 0 {
            return Self::new([data]);
        }
        Self::new(data.chunks(chunk_size))
    }

    /// Queues another chunk.
    pub fn push_chunk(&mut self, chunk: impl AsRef<[u8]>) {
        self.incoming.push_back(chunk.as_ref().to_vec());
    }

    /// Makes every later write fail.
    #[must_use]
    pub const fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Everything written so far.
    #[must_use]
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// Written bytes split into lines.
    #[must_use]
    pub fn written_lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.written)
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Chunks not yet read.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.incoming.len()
    }

    /// Returns `true` once closed.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Transport for ScriptedTransport {
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<ReadOutcome, TransportError> {
        if self.closed || buf.is_empty() {
            return Ok(ReadOutcome::End);
        }
        let Some(mut chunk) = self.incoming.pop_front() else {
            return Ok(ReadOutcome::End);
        };
        if chunk.is_empty() {
            return Ok(ReadOutcome::Idle);
        }
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            self.incoming.push_front(chunk.split_off(n));
        }
        Ok(ReadOutcome::Data(n))
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::NotConnected);
        }
        if self.fail_writes {
            return Err(TransportError::WriteFailed("scripted failure".to_string()));
        }
        self.written.extend_from_slice(bytes);
        Ok(())
    }

    fn close(&mut self) {
        self.closed = true;
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_in_order_then_ends() {
        let mut t = ScriptedTransport::new(["ab", "cd"]);
        let mut buf = [0u8; 8];
        assert_eq!(t.read_chunk(&mut buf).unwrap(), ReadOutcome::Data(2));
        assert_eq!(&buf[..2], b"ab");
        assert_eq!(t.read_chunk(&mut buf).unwrap(), ReadOutcome::Data(2));
        assert_eq!(&buf[..2], b"cd");
        assert_eq!(t.read_chunk(&mut buf).unwrap(), ReadOutcome::End);
    }

    #[test]
    fn test_empty_chunk_is_idle() {
        let mut t = ScriptedTransport::new([""]);
        let mut buf = [0u8; 8];
        assert_eq!(t.read_chunk(&mut buf).unwrap(), ReadOutcome::Idle);
        t.push_chunk("late");
        assert_eq!(t.read_chunk(&mut buf).unwrap(), ReadOutcome::Data(4));
        assert_eq!(t.read_chunk(&mut buf).unwrap(), ReadOutcome::End);
    }

    #[test]
    fn test_oversized_chunk_split_across_reads() {
        let mut t = ScriptedTransport::new(["abcdef"]);
        let mut buf = [0u8; 4];
        assert_eq!(t.read_chunk(&mut buf).unwrap(), ReadOutcome::Data(4));
        assert_eq!(t.read_chunk(&mut buf).unwrap(), ReadOutcome::Data(2));
        assert_eq!(&buf[..2], b"ef");
    }

    #[test]
    fn test_chunked() {
        let t = ScriptedTransport::chunked(b"0123456789", 4);
        assert_eq!(t.remaining(), 3);
        let whole = ScriptedTransport::chunked(b"0123456789", 0);
        assert_eq!(whole.remaining(), 1);
    }

    #[test]
    fn test_writes_recorded_until_closed() {
        let mut t = ScriptedTransport::default();
        t.write_all(b"GET_PREFS\n").unwrap();
        assert_eq!(t.written_lines(), vec!["GET_PREFS"]);
        t.close();
        assert!(t.is_closed());
        assert!(matches!(t.write_all(b"x"), Err(TransportError::NotConnected)));
        let mut buf = [0u8; 4];
        assert_eq!(t.read_chunk(&mut buf).unwrap(), ReadOutcome::End);
    }

    #[test]
    fn test_failing_writes() {
        let mut t = ScriptedTransport::default().failing_writes();
        assert!(matches!(t.write_all(b"x"), Err(TransportError::WriteFailed(_))));
    }
}
