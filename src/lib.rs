//! xml-dispatch - Single-pass XML parsing with ordered tag handlers
//!
//! A document is read once, as a stream. Every element start, element end
//! and text chunk is fanned out to the registered [`TagHandler`]s in
//! registration order; [`ParsingListener`]s hear about it once the whole
//! document has been parsed without failure.
//!
//! ```text
//! Read ---> BufferedReader ---> StreamReader ---> ParseSession ---> Dispatcher ---> TagHandler[]
//!                                  (events)           |            (stack, text)
//!                                                     +---> ListenerRegistry ---> ParsingListener[]
//! ```
//!
//! Failure handling:
//! - A handler rejecting one element returns a [`ValidationError`]; it is
//!   logged and parsing continues.
//! - Configuration, syntax and runtime faults end the parse. They are logged
//!   through `tracing` (or standard error without a subscriber) and reach the
//!   caller as one `std::io::Error` wrapping a [`ParseError`].

mod diagnostics;

pub mod config;
pub mod core;
pub mod error;
pub mod parser;
pub mod reader;
pub mod sax;

pub use crate::config::ParserConfig;
pub use crate::core::attributes::{Attribute, Attributes};
pub use crate::core::name::ElementName;
pub use crate::error::{Location, ParseError, SyntaxError, ValidationError};
pub use crate::parser::XmlParser;
pub use crate::sax::{ParsingListener, SessionState, TagHandler};
