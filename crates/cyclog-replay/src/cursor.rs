//! Forward-only byte cursor over a buffered reader.
//!
//! [`ByteCursor`] adapts any `BufRead` into a [`ByteSource`]. Peeking looks
//! into the reader's buffer, so it never consumes bytes and never needs to
//! seek.

use std::io::{self, BufRead};

use cyclog_core::{ByteSource, DecodeError};

/// Sequential reader that tracks how many bytes it has consumed.
///
/// Generic over `R: BufRead` so tests can use `&[u8]` and production
/// code can use `BufReader<File>`.
pub struct ByteCursor<R> {
    reader: R,
    offset: u64,
}

impl<R: BufRead> ByteCursor<R> {
    /// Wrap a buffered reader, starting at offset zero.
    pub fn new(reader: R) -> Self {
        Self { reader, offset: 0 }
    }

    /// Consume the cursor and return the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Copy as many bytes as the reader has buffered into `dst`, retrying
    /// interrupted reads. Returns the count copied; `0` means end of stream.
    fn fill_into(&mut self, dst: &mut [u8]) -> Result<usize, DecodeError> {
        loop {
            match self.reader.fill_buf() {
                Ok(avail) => {
                    let n = avail.len().min(dst.len());
                    dst[..n].copy_from_slice(&avail[..n]);
                    return Ok(n);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(DecodeError::Io(e)),
            }
        }
    }
}

impl<R: BufRead> ByteSource for ByteCursor<R> {
    fn peek(&mut self) -> Result<Option<u8>, DecodeError> {
        let mut byte = [0u8; 1];
        match self.fill_into(&mut byte)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }

    fn consume_exact(&mut self, buf: &mut [u8]) -> Result<(), DecodeError> {
        let start = self.offset;
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.fill_into(&mut buf[filled..])?;
            if n == 0 {
                return Err(DecodeError::TruncatedStream {
                    offset: start,
                    needed: buf.len(),
                    available: filled,
                });
            }
            self.reader.consume(n);
            self.offset += n as u64;
            filled += n;
        }
        Ok(())
    }

    fn offset(&self) -> u64 {
        self.offset
    }
}
