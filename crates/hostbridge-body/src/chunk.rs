//! Zero-copy chunking of buffered bodies.

use bytes::Bytes;

/// Default chunk size when a buffered body is pushed through a producer (64 KB).
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Yields a `Bytes` buffer in fixed-size chunks without copying.
///
/// Each chunk is a `Bytes::slice()` of the original allocation, so the only
/// cost per chunk is a refcount increment.
#[derive(Debug, Clone)]
pub struct ChunkedBytes {
    buf: Bytes,
    chunk_size: usize,
    offset: usize,
}

impl ChunkedBytes {
    /// A `chunk_size` of zero is treated as one.
    pub fn new(buf: Bytes, chunk_size: usize) -> Self {
        Self {
            buf,
            chunk_size: chunk_size.max(1),
            offset: 0,
        }
    }

    /// Bytes not yet yielded.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.offset
    }
}

impl Iterator for ChunkedBytes {
    type Item = Bytes;

    fn next(&mut self) -> Option<Bytes> {
        if self.offset >= self.buf.len() {
            return None;
        }
        let end = std::cmp::min(self.offset + self.chunk_size, self.buf.len());
        let chunk = self.buf.slice(self.offset..end);
        self.offset = end;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining().div_ceil(self.chunk_size);
        (n, Some(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_division() {
        let chunks: Vec<_> = ChunkedBytes::new(Bytes::from(vec![0xAA; 4096]), 1024).collect();
        assert_eq!(chunks.len(), 4);
        assert!(chunks.iter().all(|c| c.len() == 1024));
    }

    #[test]
    fn remainder_chunk() {
        let chunks: Vec<_> = ChunkedBytes::new(Bytes::from(vec![0xBB; 3000]), 1024).collect();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].len(), 952);
    }

    #[test]
    fn empty_body_yields_nothing() {
        let mut chunks = ChunkedBytes::new(Bytes::new(), 16);
        assert_eq!(chunks.size_hint(), (0, Some(0)));
        assert!(chunks.next().is_none());
    }

    #[test]
    fn size_hint_counts_partial_chunk() {
        let chunks = ChunkedBytes::new(Bytes::from(vec![1; 10]), 4);
        assert_eq!(chunks.size_hint(), (3, Some(3)));
    }

    #[test]
    fn chunks_share_the_original_allocation() {
        let original = Bytes::from(vec![0xFF; 8192]);
        let ptr = original.as_ptr();
        let chunks: Vec<_> = ChunkedBytes::new(original, 4096).collect();

        assert_eq!(chunks[0].as_ptr(), ptr);
        assert_eq!(chunks[1].as_ptr(), ptr.wrapping_add(4096));
    }

    #[test]
    fn zero_chunk_size_yields_single_bytes() {
        let chunks: Vec<_> = ChunkedBytes::new(Bytes::from_static(b"abc"), 0).collect();
        assert_eq!(chunks, vec!["a", "b", "c"]);
    }
}
