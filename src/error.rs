//! Error Types
//!
//! Fatal failures fall into three categories (configuration, syntax, fault)
//! and reach callers as one `std::io::Error` wrapping a [`ParseError`].
//! [`ValidationError`] is the single recoverable kind: it is returned by a
//! handler's `on_start` and contained by the dispatcher.

use std::fmt;
use std::io;

/// Position within the input document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// 1-based line number
    pub line: u32,
    /// 1-based column number (in characters, not bytes)
    pub column: u32,
    /// 0-based byte offset from the start of the input
    pub byte_offset: u64,
}

impl Default for Location {
    fn default() -> Self {
        Location {
            line: 1,
            column: 1,
            byte_offset: 0,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Document-semantics failure raised by a handler for one element
///
/// The dispatcher logs it and carries on with the next handler and the rest
/// of the document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        ValidationError {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// The input is not well-formed XML
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} ({location})")]
pub struct SyntaxError {
    pub message: String,
    pub location: Location,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, location: Location) -> Self {
        SyntaxError {
            message: message.into(),
            location,
        }
    }
}

/// Fatal failure of a parse
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The streaming reader could not be constructed
    #[error("{0}")]
    Configuration(String),

    /// Malformed document
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    /// Contract breach or panic inside the dispatcher, a handler or a listener
    #[error("{0}")]
    Fault(String),
}

impl ParseError {
    /// Short category name, used as a structured log field
    pub fn category(&self) -> &'static str {
        match self {
            ParseError::Configuration(_) => "configuration",
            ParseError::Syntax(_) => "syntax",
            ParseError::Fault(_) => "fault",
        }
    }

    /// Wrap into the single caller-facing failure shape
    pub fn into_io(self) -> io::Error {
        io::Error::other(self)
    }

    /// Recover the category from an error returned by `XmlParser::parse`
    ///
    /// Returns `None` for errors raised by the input stream itself.
    pub fn from_io(err: &io::Error) -> Option<&ParseError> {
        err.get_ref()?.downcast_ref::<ParseError>()
    }
}

/// Failure while pulling events from a stream
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// The input stream failed to deliver bytes
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl From<SyntaxError> for StreamError {
    fn from(err: SyntaxError) -> Self {
        StreamError::Parse(ParseError::Syntax(err))
    }
}
