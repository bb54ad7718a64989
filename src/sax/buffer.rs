//! Character Buffer
//!
//! Text accumulated for the innermost open element. Reset once per element
//! start and appended to verbatim; never trimmed or collapsed.

/// Text accumulator for the current element
#[derive(Debug, Default)]
pub struct CharacterBuffer {
    text: String,
}

impl CharacterBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard any accumulated text
    pub fn reset(&mut self) {
        self.text.clear();
    }

    pub fn append(&mut self, chunk: &str) {
        self.text.push_str(chunk);
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_keeps_whitespace() {
        let mut buffer = CharacterBuffer::new();
        buffer.append("  Design ");
        buffer.append("\n phase ");
        assert_eq!(buffer.as_str(), "  Design \n phase ");
        assert_eq!(buffer.len(), 17);
    }

    #[test]
    fn test_reset() {
        let mut buffer = CharacterBuffer::new();
        buffer.append("old");
        buffer.reset();
        assert!(buffer.is_empty());
        buffer.append("new");
        assert_eq!(buffer.as_str(), "new");
    }
}
