//! The byte-stream capability abstraction (SPEC_FULL.md §3, §6, §9).
//!
//! The original passes a `uweb_data_stream*` carrying a `void*` user
//! pointer plus function pointers for `read`/`write`. We replace that with
//! a trait so the parser and response emitter stay polymorphic over
//! transports without any unsafe casting, per the "byte stream via
//! function pointers -> capability abstraction" redesign note.

use std::io;

/// Sentinel for "total size not known in advance" (`UWEB_UNKNONW_SZ` in
/// the original).
pub const UNKNOWN_SIZE: i64 = -1;

/// A bidirectional byte channel the core reads requests from and writes
/// responses to.
///
/// `read`/`write` never block past what is immediately available; the
/// parser suspends (returns control to its caller) rather than wait.
pub trait ByteStream {
    /// Declared total size of the stream's content, or [`UNKNOWN_SIZE`].
    /// For a response body this becomes the `Content-Length` header in
    /// non-chunked mode.
    fn total_size(&self) -> i64 {
        UNKNOWN_SIZE
    }

    /// Bytes immediately readable without blocking. The parser treats
    /// `0` as "no more data available right now" and suspends.
    fn avail(&self) -> usize;

    /// Reads up to `dst.len()` bytes. Returns the number of bytes
    /// actually read; a short read is not an error, but an `Err` is.
    fn read(&mut self, dst: &mut [u8]) -> io::Result<usize>;

    /// Writes all of `src`. Short writes are retried internally; only a
    /// genuine I/O failure is reported.
    fn write(&mut self, src: &[u8]) -> io::Result<()>;
}

/// An in-memory [`ByteStream`] backed by a fixed byte buffer, used by
/// tests and by applications producing a response body already fully in
/// memory.
pub struct MemoryStream {
    data: Vec<u8>,
    pos: usize,
}

impl MemoryStream {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        MemoryStream { data: data.into(), pos: 0 }
    }

    pub fn empty() -> Self {
        MemoryStream { data: Vec::new(), pos: 0 }
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    pub fn get_ref(&self) -> &[u8] {
        &self.data
    }
}

impl ByteStream for MemoryStream {
    fn total_size(&self) -> i64 {
        self.data.len() as i64
    }

    fn avail(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read(&mut self, dst: &mut [u8]) -> io::Result<usize> {
        let n = dst.len().min(self.avail());
        dst[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }

    fn write(&mut self, src: &[u8]) -> io::Result<()> {
        self.data.extend_from_slice(src);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn memory_stream_reads_what_was_written() {
        let mut s = MemoryStream::new(b"hello".to_vec());
        assert_eq!(s.avail(), 5);
        let mut buf = [0u8; 3];
        assert_eq!(s.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf, b"hel");
        assert_eq!(s.avail(), 2);
    }

    #[test]
    fn memory_stream_write_appends() {
        let mut s = MemoryStream::empty();
        s.write(b"abc").unwrap();
        s.write(b"def").unwrap();
        assert_eq!(s.into_inner(), b"abcdef");
    }
}
