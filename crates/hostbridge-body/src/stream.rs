use std::io::{self, BufRead, Cursor, Read, Seek, SeekFrom, Write};

use bytes::Bytes;

use crate::chunk::ChunkedBytes;

/// Seekable in-memory request body.
///
/// The inbound collector writes received chunks at increasing offsets; the
/// host rewinds the stream to the start before handing it to the engine.
/// The capacity given at construction is only an allocation hint: writes
/// past it grow the buffer.
#[derive(Debug, Default)]
pub struct RequestStream {
    inner: Cursor<Vec<u8>>,
}

impl RequestStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Cursor::new(Vec::with_capacity(capacity)),
        }
    }

    /// A stream positioned at the start of `body`.
    pub fn from_bytes(body: impl Into<Vec<u8>>) -> Self {
        Self {
            inner: Cursor::new(body.into()),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.get_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.get_ref().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.get_ref().capacity()
    }

    pub fn position(&self) -> u64 {
        self.inner.position()
    }

    pub fn rewind(&mut self) {
        self.inner.set_position(0);
    }

    /// The whole buffer, regardless of the current position.
    pub fn as_slice(&self) -> &[u8] {
        self.inner.get_ref()
    }

    pub fn into_bytes(self) -> Bytes {
        Bytes::from(self.inner.into_inner())
    }

    /// Consume the stream as fixed-size chunks of the whole buffer.
    pub fn into_chunks(self, chunk_size: usize) -> ChunkedBytes {
        ChunkedBytes::new(self.into_bytes(), chunk_size)
    }
}

impl Read for RequestStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl BufRead for RequestStream {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.inner.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.inner.consume(amt)
    }
}

impl Write for RequestStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for RequestStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}
