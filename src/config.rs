//! Parser Configuration
//!
//! Settings for the streaming reader built by each `parse` call. Values are
//! checked when the reader is constructed; a bad value is reported as a
//! configuration error rather than a panic.

use crate::error::ParseError;

/// Bytes requested from the input per read
pub const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Streaming reader settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserConfig {
    /// Bytes requested from the input per read. Text runs longer than the
    /// buffered window reach handlers as several chunks.
    pub buffer_size: usize,
    /// Resolve `xmlns` declarations and report namespace URIs and local names
    pub namespace_aware: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            buffer_size: DEFAULT_BUFFER_SIZE,
            namespace_aware: false,
        }
    }
}

impl ParserConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    pub fn namespace_aware(mut self, enabled: bool) -> Self {
        self.namespace_aware = enabled;
        self
    }

    /// Check that a reader can be built from these settings
    pub fn validate(&self) -> Result<(), ParseError> {
        if self.buffer_size == 0 {
            return Err(ParseError::Configuration(
                "buffer size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ParserConfig::new();
        assert_eq!(config.buffer_size, DEFAULT_BUFFER_SIZE);
        assert!(!config.namespace_aware);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = ParserConfig::new().buffer_size(16).namespace_aware(true);
        assert_eq!(config.buffer_size, 16);
        assert!(config.namespace_aware);
    }

    #[test]
    fn test_zero_buffer_rejected() {
        let err = ParserConfig::new().buffer_size(0).validate().unwrap_err();
        assert!(matches!(err, ParseError::Configuration(_)));
    }
}
