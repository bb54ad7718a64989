//! Byte scanning over a complete markup slice using memchr
//!
//! The streaming reader first makes sure a whole tag or declaration is
//! buffered, then hands that slice to a `Scanner` to pick it apart.

use memchr::{memchr, memmem};

/// Cursor over a byte slice
pub struct Scanner<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    #[inline]
    pub fn new(input: &'a [u8]) -> Self {
        Scanner { input, pos: 0 }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos.min(self.input.len());
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    #[inline]
    pub fn remaining(&self) -> &'a [u8] {
        &self.input[self.pos..]
    }

    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    #[inline]
    pub fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.input.len());
    }

    /// Skip XML whitespace, returning how many bytes were skipped
    #[inline]
    pub fn skip_whitespace(&mut self) -> usize {
        let start = self.pos;
        while self.pos < self.input.len() && is_whitespace(self.input[self.pos]) {
            self.pos += 1;
        }
        self.pos - start
    }

    #[inline]
    pub fn starts_with(&self, needle: &[u8]) -> bool {
        self.input[self.pos..].starts_with(needle)
    }

    /// Find the next occurrence of a byte, as an absolute position
    #[inline]
    pub fn find_byte(&self, byte: u8) -> Option<usize> {
        memchr(byte, &self.input[self.pos..]).map(|i| self.pos + i)
    }

    /// Find the next occurrence of a byte sequence, as an absolute position
    #[inline]
    pub fn find(&self, needle: &[u8]) -> Option<usize> {
        memmem::find(&self.input[self.pos..], needle).map(|i| self.pos + i)
    }

    /// Read an XML name, leaving the cursor just past it
    pub fn read_name(&mut self) -> Option<&'a [u8]> {
        let start = self.pos;
        match self.input.get(start) {
            Some(&b) if is_name_start_char(b) => self.pos += 1,
            _ => return None,
        }
        while self.pos < self.input.len() && is_name_char(self.input[self.pos]) {
            self.pos += 1;
        }
        Some(&self.input[start..self.pos])
    }

    /// Read a quoted literal (single or double quotes), returning its content
    pub fn read_quoted(&mut self) -> Option<&'a [u8]> {
        let quote = self.peek()?;
        if quote != b'"' && quote != b'\'' {
            return None;
        }
        let start = self.pos + 1;
        let end = memchr(quote, &self.input[start..])? + start;
        self.pos = end + 1;
        Some(&self.input[start..end])
    }
}

/// XML whitespace: space, tab, newline, carriage return
#[inline]
pub fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

/// Name start byte. Non-ASCII bytes are accepted as part of UTF-8 names.
#[inline]
pub fn is_name_start_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

#[inline]
pub fn is_name_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' | b'.' | b':') || b >= 0x80
}

/// Check that a whole string is a valid XML name
pub fn is_valid_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    match bytes.first() {
        Some(&b) if is_name_start_char(b) => bytes[1..].iter().all(|&b| is_name_char(b)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_name() {
        let mut scanner = Scanner::new(b"element-name attr");
        assert_eq!(scanner.read_name(), Some(b"element-name" as &[u8]));
        assert_eq!(scanner.position(), 12);
    }

    #[test]
    fn test_read_name_rejects_digit_start() {
        let mut scanner = Scanner::new(b"1abc");
        assert_eq!(scanner.read_name(), None);
        assert_eq!(scanner.position(), 0);
    }

    #[test]
    fn test_skip_whitespace_counts() {
        let mut scanner = Scanner::new(b"  \t\n hello");
        assert_eq!(scanner.skip_whitespace(), 5);
        assert_eq!(scanner.skip_whitespace(), 0);
        assert_eq!(scanner.peek(), Some(b'h'));
    }

    #[test]
    fn test_read_quoted() {
        let mut scanner = Scanner::new(b"'a \"b\"' rest");
        assert_eq!(scanner.read_quoted(), Some(b"a \"b\"" as &[u8]));
        assert_eq!(scanner.remaining(), b" rest");

        let mut unterminated = Scanner::new(b"\"abc");
        assert_eq!(unterminated.read_quoted(), None);
    }

    #[test]
    fn test_find() {
        let mut scanner = Scanner::new(b"<!-- x -- y -->");
        scanner.advance(4);
        assert_eq!(scanner.find(b"-->"), Some(12));
        assert_eq!(scanner.find_byte(b'x'), Some(5));
    }

    #[test]
    fn test_is_valid_name() {
        assert!(is_valid_name("task"));
        assert!(is_valid_name("gantt:task-1"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("-task"));
        assert!(!is_valid_name("ta sk"));
    }
}
