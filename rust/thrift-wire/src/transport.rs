use bytes::{Buf, Bytes, BytesMut};

use crate::TransportError;

/// Byte-level transport consumed by the protocols.
///
/// Writes accumulate into a pending frame; `flush` commits it and `reset`
/// throws it away, so a failed send never leaves a torn frame behind.
pub trait Transport {
    fn open(&mut self) -> Result<(), TransportError>;
    fn is_open(&self) -> bool;
    fn close(&mut self);

    /// Fill `buf` completely or fail without consuming anything.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), TransportError>;
    fn write(&mut self, buf: &[u8]) -> Result<(), TransportError>;
    fn flush(&mut self) -> Result<(), TransportError>;
    /// Discard everything written since the last flush.
    fn reset(&mut self);
}

/// In-memory transport: reads from a fixed input buffer, commits writes to an
/// output buffer on flush.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    open: bool,
    input: Bytes,
    pending: BytesMut,
    committed: BytesMut,
    write_limit: Option<usize>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self {
            open: true,
            ..Default::default()
        }
    }

    /// A transport whose reads drain `input`.
    pub fn with_input(input: impl Into<Bytes>) -> Self {
        Self {
            input: input.into(),
            ..Self::new()
        }
    }

    /// Append more readable bytes.
    pub fn push_input(&mut self, bytes: &[u8]) {
        let mut joined = BytesMut::with_capacity(self.input.len() + bytes.len());
        joined.extend_from_slice(&self.input);
        joined.extend_from_slice(bytes);
        self.input = joined.freeze();
    }

    /// Refuse writes once the pending frame would exceed `limit` bytes.
    pub fn set_write_limit(&mut self, limit: Option<usize>) {
        self.write_limit = limit;
    }

    pub fn remaining_input(&self) -> usize {
        self.input.len()
    }

    /// Bytes written but not yet flushed.
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    /// Take every flushed byte, leaving the output empty.
    pub fn take_flushed(&mut self) -> Bytes {
        self.committed.split().freeze()
    }
}

impl Transport for MemoryTransport {
    fn open(&mut self) -> Result<(), TransportError> {
        self.open = true;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), TransportError> {
        if !self.open {
            return Err(TransportError::NotOpen);
        }
        if self.input.len() < buf.len() {
            return Err(TransportError::UnexpectedEof {
                wanted: buf.len(),
                available: self.input.len(),
            });
        }
        self.input.copy_to_slice(buf);
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), TransportError> {
        if !self.open {
            return Err(TransportError::NotOpen);
        }
        if let Some(limit) = self.write_limit
            && self.pending.len() + buf.len() > limit
        {
            return Err(TransportError::WriteLimit { limit });
        }
        self.pending.extend_from_slice(buf);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        if !self.open {
            return Err(TransportError::NotOpen);
        }
        let frame = self.pending.split();
        self.committed.unsplit(frame);
        Ok(())
    }

    fn reset(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flush_commits_and_reset_discards() {
        let mut t = MemoryTransport::new();
        t.write(b"abc").unwrap();
        t.flush().unwrap();
        t.write(b"torn").unwrap();
        t.reset();
        t.write(b"def").unwrap();
        t.flush().unwrap();
        assert_eq!(&t.take_flushed()[..], b"abcdef");
        assert!(t.pending().is_empty());
    }

    #[test]
    fn short_reads_consume_nothing() {
        let mut t = MemoryTransport::with_input(&b"xy"[..]);
        let mut buf = [0u8; 3];
        assert_eq!(
            t.read_exact(&mut buf),
            Err(TransportError::UnexpectedEof {
                wanted: 3,
                available: 2
            })
        );
        assert_eq!(t.remaining_input(), 2);
    }

    #[test]
    fn write_limit_rejects_oversized_frames() {
        let mut t = MemoryTransport::new();
        t.set_write_limit(Some(4));
        t.write(b"1234").unwrap();
        assert_eq!(
            t.write(b"5"),
            Err(TransportError::WriteLimit { limit: 4 })
        );
    }

    #[test]
    fn closed_transport_refuses_io() {
        let mut t = MemoryTransport::new();
        t.close();
        assert!(!t.is_open());
        assert_eq!(t.write(b"x"), Err(TransportError::NotOpen));
        t.open().unwrap();
        assert!(t.write(b"x").is_ok());
    }
}
