//! Parse Session
//!
//! State for exactly one parse: the dispatcher (with its stack and buffer)
//! and the listener notification state machine. A session is built fresh
//! for every parse and dropped at the end of it.

use std::io::Read;

use tracing::debug;

use crate::error::{ParseError, StreamError};
use crate::reader::{StreamReader, XmlEvent};

use super::dispatcher::{Dispatcher, HandlerRegistry};
use super::listener::ListenerRegistry;

/// Listener notification state
///
/// `NotStarted -> InProgress -> Finished`. A failed parse stays
/// `InProgress` and is abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    InProgress,
    Finished,
}

pub struct ParseSession<'r, 'h> {
    dispatcher: Dispatcher<'r, 'h>,
    listeners: &'r mut ListenerRegistry<'h>,
    state: SessionState,
}

impl<'r, 'h> ParseSession<'r, 'h> {
    pub fn new(
        handlers: &'r mut HandlerRegistry<'h>,
        listeners: &'r mut ListenerRegistry<'h>,
    ) -> Self {
        ParseSession {
            dispatcher: Dispatcher::new(handlers),
            listeners,
            state: SessionState::NotStarted,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Mark the start of stream consumption
    pub fn begin(&mut self) -> Result<(), ParseError> {
        if self.state != SessionState::NotStarted {
            return Err(ParseError::Fault(format!(
                "parse session cannot begin in state {:?}",
                self.state
            )));
        }
        self.state = SessionState::InProgress;
        Ok(())
    }

    /// Route one event; returns `true` once the document has ended
    pub fn handle(&mut self, event: XmlEvent) -> Result<bool, ParseError> {
        match event {
            XmlEvent::StartElement { name, attributes } => {
                self.dispatcher.dispatch_start(
                    &name.namespace_uri,
                    &name.local_name,
                    &name.qualified_name,
                    &attributes,
                );
            }
            XmlEvent::EndElement(name) => {
                self.dispatcher
                    .dispatch_end(&name.namespace_uri, &name.local_name, &name.qualified_name)?;
            }
            XmlEvent::Characters(text) => self.dispatcher.dispatch_characters(&text)?,
            XmlEvent::EndDocument => {
                self.finish()?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Natural end of the document: notify listeners once
    pub fn finish(&mut self) -> Result<(), ParseError> {
        if self.state != SessionState::InProgress {
            return Err(ParseError::Fault(format!(
                "parse session cannot finish in state {:?}",
                self.state
            )));
        }
        let open = self.dispatcher.stack().depth();
        if open != 0 {
            return Err(ParseError::Fault(format!(
                "document ended with {} open element(s)",
                open
            )));
        }

        self.listeners.notify_all();
        self.state = SessionState::Finished;
        debug!(
            elements = self.dispatcher.elements_seen(),
            listeners = self.listeners.len(),
            "parsing finished"
        );
        Ok(())
    }

    /// Pull every event from `reader` through the dispatcher
    pub fn run<R: Read>(&mut self, reader: &mut StreamReader<R>) -> Result<(), StreamError> {
        self.begin()?;
        loop {
            let event = reader.next_event()?;
            if self.handle(event)? {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::attributes::Attributes;
    use crate::core::name::ElementName;
    use crate::error::ValidationError;
    use crate::sax::{ParsingListener, TagHandler};

    #[derive(Default)]
    struct Count(usize);

    impl ParsingListener for Count {
        fn on_parsing_finished(&mut self) {
            self.0 += 1;
        }
    }

    struct Nothing;

    impl TagHandler for Nothing {
        fn on_start(&mut self, _: &str, _: &str, _: &str, _: &Attributes) -> Result<(), ValidationError> {
            Ok(())
        }

        fn on_end(&mut self, _: &str, _: &str, _: &str) {}
    }

    fn start(name: &str) -> XmlEvent {
        XmlEvent::StartElement {
            name: ElementName::plain(name),
            attributes: Attributes::new(),
        }
    }

    #[test]
    fn test_state_machine() {
        let mut count = Count::default();
        {
            let mut handlers = HandlerRegistry::new();
            handlers.register(Nothing);
            let mut listeners = ListenerRegistry::new();
            listeners.register(&mut count);

            let mut session = ParseSession::new(&mut handlers, &mut listeners);
            assert_eq!(session.state(), SessionState::NotStarted);

            session.begin().unwrap();
            assert_eq!(session.state(), SessionState::InProgress);
            assert!(session.begin().is_err());

            assert!(!session.handle(start("a")).unwrap());
            assert!(!session.handle(XmlEvent::EndElement(ElementName::plain("a"))).unwrap());
            assert!(session.handle(XmlEvent::EndDocument).unwrap());
            assert_eq!(session.state(), SessionState::Finished);

            assert!(session.finish().is_err());
        }
        assert_eq!(count.0, 1);
    }

    #[test]
    fn test_finish_requires_begin() {
        let mut handlers = HandlerRegistry::new();
        let mut listeners = ListenerRegistry::new();
        let mut session = ParseSession::new(&mut handlers, &mut listeners);
        assert!(matches!(session.finish(), Err(ParseError::Fault(_))));
    }

    #[test]
    fn test_finish_with_open_elements_is_fault() {
        let mut count = Count::default();
        {
            let mut handlers = HandlerRegistry::new();
            let mut listeners = ListenerRegistry::new();
            listeners.register(&mut count);

            let mut session = ParseSession::new(&mut handlers, &mut listeners);
            session.begin().unwrap();
            session.handle(start("a")).unwrap();

            assert!(matches!(session.finish(), Err(ParseError::Fault(_))));
            assert_eq!(session.state(), SessionState::InProgress);
        }
        assert_eq!(count.0, 0);
    }
}
