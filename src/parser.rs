//! Stream Driver
//!
//! [`XmlParser`] owns the handler and listener registrations and exposes the
//! one-shot [`parse`](XmlParser::parse) call. Every fatal failure inside a
//! parse (bad configuration, malformed input, a broken dispatch contract or
//! a panicking callback) is logged and returned as a single `io::Error`.

use std::any::Any;
use std::io::{self, Read};
use std::panic::{self, AssertUnwindSafe};

use tracing::debug;

use crate::config::ParserConfig;
use crate::diagnostics;
use crate::error::{ParseError, StreamError};
use crate::reader::StreamReader;
use crate::sax::{HandlerRegistry, ListenerRegistry, ParseSession, ParsingListener, TagHandler};

/// Event-driven XML parser dispatching to registered handlers
///
/// ```
/// use xml_dispatch::{Attributes, TagHandler, ValidationError, XmlParser};
///
/// #[derive(Default)]
/// struct TaskNames(Vec<String>);
///
/// impl TagHandler for TaskNames {
///     fn on_start(&mut self, _: &str, local: &str, _: &str, attrs: &Attributes) -> Result<(), ValidationError> {
///         if local == "task" {
///             let name = attrs.get("name").ok_or_else(|| ValidationError::new("task without a name"))?;
///             self.0.push(name.to_string());
///         }
///         Ok(())
///     }
///
///     fn on_end(&mut self, _: &str, _: &str, _: &str) {}
/// }
///
/// let mut names = TaskNames::default();
/// let mut parser = XmlParser::new();
/// parser.register_handler(&mut names);
/// parser.parse(&b"<tasks><task name=\"Design\"/><task/></tasks>"[..]).unwrap();
/// drop(parser);
///
/// assert_eq!(names.0, ["Design"]);
/// ```
#[derive(Default)]
pub struct XmlParser<'h> {
    config: ParserConfig,
    handlers: HandlerRegistry<'h>,
    listeners: ListenerRegistry<'h>,
}

impl<'h> XmlParser<'h> {
    pub fn new() -> Self {
        Self::with_config(ParserConfig::default())
    }

    pub fn with_config(config: ParserConfig) -> Self {
        XmlParser {
            config,
            handlers: HandlerRegistry::new(),
            listeners: ListenerRegistry::new(),
        }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Add a handler after all previously registered ones
    pub fn register_handler(&mut self, handler: impl TagHandler + 'h) {
        self.handlers.register(handler);
    }

    /// Add a listener, notified once per successful parse
    pub fn register_listener(&mut self, listener: impl ParsingListener + 'h) {
        self.listeners.register(listener);
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Parse one complete document from `input`
    ///
    /// Errors raised by `input` itself are returned unchanged. Any other
    /// failure is logged and returned with kind `Other`, wrapping a
    /// [`ParseError`] that [`ParseError::from_io`] recovers. Listeners are
    /// only notified when this returns `Ok`.
    pub fn parse<R: Read>(&mut self, input: R) -> io::Result<()> {
        debug!(
            handlers = self.handlers.len(),
            listeners = self.listeners.len(),
            buffer_size = self.config.buffer_size,
            "parse started"
        );

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.drive(input)))
            .unwrap_or_else(|payload| Err(ParseError::Fault(panic_message(&*payload)).into()));

        match outcome {
            Ok(()) => Ok(()),
            Err(StreamError::Io(err)) => Err(err),
            Err(StreamError::Parse(err)) => {
                diagnostics::fatal(&err);
                Err(err.into_io())
            }
        }
    }

    fn drive<R: Read>(&mut self, input: R) -> Result<(), StreamError> {
        let mut reader = StreamReader::new(input, &self.config)?;
        let mut session = ParseSession::new(&mut self.handlers, &mut self.listeners);
        session.run(&mut reader)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload");
    format!("panic during event dispatch: {}", detail)
}
