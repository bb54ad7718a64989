//! Buffered XML Reader
//!
//! Growable window over any source implementing `Read`. Consumed bytes are
//! dropped on the next fill; unconsumed bytes stay put so markup spanning a
//! read boundary can be completed by reading more.

use memchr::{memchr_iter, memmem};
use std::io::{self, Read};

use crate::error::Location;

/// Buffered XML reader for streaming input
pub struct BufferedReader<R: Read> {
    reader: R,
    buffer: Vec<u8>,
    pos: usize,
    chunk_size: usize,
    eof: bool,
    location: Location,
}

impl<R: Read> BufferedReader<R> {
    /// Create a reader that requests `chunk_size` bytes per read
    pub fn with_capacity(reader: R, chunk_size: usize) -> Self {
        BufferedReader {
            reader,
            buffer: Vec::with_capacity(chunk_size),
            pos: 0,
            chunk_size: chunk_size.max(1),
            eof: false,
            location: Location::default(),
        }
    }

    /// Read one more chunk, appending it to the window
    ///
    /// Returns `false` once the source is exhausted.
    pub fn fill(&mut self) -> io::Result<bool> {
        if self.eof {
            return Ok(false);
        }

        // Compact: drop consumed bytes
        if self.pos > 0 {
            self.buffer.drain(..self.pos);
            self.pos = 0;
        }

        let len = self.buffer.len();
        self.buffer.resize(len + self.chunk_size, 0);
        loop {
            match self.reader.read(&mut self.buffer[len..]) {
                Ok(read) => {
                    self.buffer.truncate(len + read);
                    if read == 0 {
                        self.eof = true;
                    }
                    return Ok(read > 0);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.buffer.truncate(len);
                    return Err(e);
                }
            }
        }
    }

    /// Unconsumed bytes currently in the window
    #[inline]
    pub fn buffered(&self) -> &[u8] {
        &self.buffer[self.pos..]
    }

    /// The source has reported end of input (bytes may still be buffered)
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.eof
    }

    /// Read until at least `n` bytes are buffered
    ///
    /// Returns `false` if the input ends first.
    pub fn ensure(&mut self, n: usize) -> io::Result<bool> {
        while self.buffered().len() < n {
            if !self.fill()? {
                return Ok(self.buffered().len() >= n);
            }
        }
        Ok(true)
    }

    /// Consume n bytes from the window, advancing the location
    pub fn consume(&mut self, n: usize) {
        let n = n.min(self.buffer.len() - self.pos);
        advance(&mut self.location, &self.buffer[self.pos..self.pos + n]);
        self.pos += n;
    }

    /// Location of the first unconsumed byte
    #[inline]
    pub fn location(&self) -> Location {
        self.location
    }

    /// Find `needle` at or after offset `from` of the window, reading more
    /// input as needed. Offsets are relative to [`buffered`](Self::buffered).
    pub fn find(&mut self, needle: &[u8], from: usize) -> io::Result<Option<usize>> {
        let mut start = from;
        loop {
            let window = self.buffered();
            if start <= window.len() {
                if let Some(i) = memmem::find(&window[start..], needle) {
                    return Ok(Some(start + i));
                }
                // A match may straddle the next read
                start = start.max(window.len().saturating_sub(needle.len().saturating_sub(1)));
            }
            if !self.fill()? {
                return Ok(None);
            }
        }
    }

    /// Find the first byte at or after `from` for which `pred` returns true
    ///
    /// Every byte is passed to `pred` exactly once, in order, so it may keep
    /// state (quote tracking and the like).
    pub fn find_by(
        &mut self,
        from: usize,
        mut pred: impl FnMut(u8) -> bool,
    ) -> io::Result<Option<usize>> {
        let mut i = from;
        loop {
            let window = self.buffered();
            while i < window.len() {
                if pred(window[i]) {
                    return Ok(Some(i));
                }
                i += 1;
            }
            if !self.fill()? {
                return Ok(None);
            }
        }
    }
}

/// Advance a location over consumed bytes. Columns count characters.
fn advance(location: &mut Location, bytes: &[u8]) {
    let mut tail = bytes;
    for nl in memchr_iter(b'\n', bytes) {
        location.line += 1;
        location.column = 1;
        tail = &bytes[nl + 1..];
    }
    location.column += tail.iter().filter(|&&b| b & 0xC0 != 0x80).count() as u32;
    location.byte_offset += bytes.len() as u64;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_fill_respects_chunk_size() {
        let mut reader = BufferedReader::with_capacity(Cursor::new(b"<root>content</root>".to_vec()), 8);

        assert!(reader.fill().unwrap());
        assert_eq!(reader.buffered(), b"<root>co");
        assert!(reader.fill().unwrap());
        assert_eq!(reader.buffered(), b"<root>content</r");
    }

    #[test]
    fn test_ensure_and_eof() {
        let mut reader = BufferedReader::with_capacity(Cursor::new(b"abc".to_vec()), 2);

        assert!(reader.ensure(3).unwrap());
        assert!(!reader.ensure(4).unwrap());
        assert!(reader.is_exhausted());
        assert_eq!(reader.buffered(), b"abc");
    }

    #[test]
    fn test_find_across_reads() {
        let mut reader =
            BufferedReader::with_capacity(Cursor::new(b"<!-- a long comment -->".to_vec()), 4);

        assert_eq!(reader.find(b"-->", 4).unwrap(), Some(20));
        assert_eq!(reader.find(b"??", 0).unwrap(), None);
    }

    #[test]
    fn test_find_by_keeps_state() {
        let mut reader = BufferedReader::with_capacity(Cursor::new(b"<a b='>'>".to_vec()), 3);
        let mut quote = None;
        let end = reader
            .find_by(1, |b| match quote {
                Some(q) => {
                    if b == q {
                        quote = None;
                    }
                    false
                }
                None if b == b'\'' => {
                    quote = Some(b);
                    false
                }
                None => b == b'>',
            })
            .unwrap();
        assert_eq!(end, Some(8));
    }

    #[test]
    fn test_location_tracking() {
        let mut reader = BufferedReader::with_capacity(Cursor::new("ab\ncdé<".as_bytes().to_vec()), 64);
        reader.fill().unwrap();

        reader.consume(2);
        assert_eq!(reader.location().column, 3);

        reader.consume(5);
        let location = reader.location();
        assert_eq!(location.line, 2);
        assert_eq!(location.column, 4);
        assert_eq!(location.byte_offset, 7);
    }

    #[test]
    fn test_interrupted_read_is_retried() {
        struct Flaky {
            interrupted: bool,
        }
        impl Read for Flaky {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                if !self.interrupted {
                    self.interrupted = true;
                    return Err(io::Error::from(io::ErrorKind::Interrupted));
                }
                buf[0] = b'x';
                Ok(1)
            }
        }

        let mut reader = BufferedReader::with_capacity(Flaky { interrupted: false }, 4);
        assert!(reader.fill().unwrap());
        assert_eq!(reader.buffered(), b"x");
    }
}
