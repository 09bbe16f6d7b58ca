//! Transport abstraction: any byte-oriented channel.
//!
//! Concrete implementations:
//! - UART serial to the host (the production link)
//! - [`WriterTransport`]: any `std::io::Write` (stdout, a capture file)
//! - [`MemoryTransport`]: an in-memory loopback for tests
//!
//! The telemetry publisher is generic over `Transport`, so adding a new
//! transport requires zero changes to the telemetry logic.

use std::collections::VecDeque;
use std::io::Write;

/// Byte-oriented transport channel.
pub trait Transport {
    /// Error type for this transport.
    type Error: core::fmt::Debug;

    /// Read up to `buf.len()` bytes into `buf`.
    /// Returns the number of bytes actually read.
    /// Returns 0 if no data is available (non-blocking).
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Write `data` to the transport.
    /// Returns the number of bytes actually written.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Flush any buffered output.
    fn flush(&mut self) -> Result<(), Self::Error>;

    /// Check if data is available for reading.
    fn available(&self) -> bool;
}

/// A null transport that discards all writes and never reads.
/// Useful when no host is attached.
pub struct NullTransport;

impl Transport for NullTransport {
    type Error = ();

    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, ()> {
        Ok(0)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), ()> {
        Ok(())
    }

    fn available(&self) -> bool {
        false
    }
}

/// Write-only transport over any [`std::io::Write`].
pub struct WriterTransport<W> {
    inner: W,
}

impl<W: Write> WriterTransport<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Transport for WriterTransport<W> {
    type Error = std::io::Error;

    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, Self::Error> {
        Ok(0)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        self.inner.write_all(data)?;
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.inner.flush()
    }

    fn available(&self) -> bool {
        false
    }
}

/// Loopback: bytes written are read back in order.
///
/// `capacity` bounds the buffered bytes; a write that does not fit is
/// truncated, like a full UART FIFO.
pub struct MemoryTransport {
    buf: VecDeque<u8>,
    capacity: usize,
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::with_capacity(usize::MAX)
    }
}

impl MemoryTransport {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: VecDeque::new(),
            capacity,
        }
    }

    /// Drain everything buffered.
    pub fn take_all(&mut self) -> Vec<u8> {
        self.buf.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl Transport for MemoryTransport {
    type Error = core::convert::Infallible;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let n = buf.len().min(self.buf.len());
        for (dst, src) in buf.iter_mut().zip(self.buf.drain(..n)) {
            *dst = src;
        }
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        let room = self.capacity.saturating_sub(self.buf.len());
        let n = data.len().min(room);
        self.buf.extend(&data[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn available(&self) -> bool {
        !self.buf.is_empty()
    }
}
