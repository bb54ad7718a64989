//! Handler Registry & Dispatcher
//!
//! Delivers element events to every registered handler in registration
//! order, keeping the tag stack and the character buffer in step.

use tracing::trace;

use crate::core::attributes::Attributes;
use crate::diagnostics;
use crate::error::ParseError;

use super::buffer::CharacterBuffer;
use super::stack::TagStack;
use super::TagHandler;

/// Ordered list of handlers; no de-duplication, no reordering
#[derive(Default)]
pub struct HandlerRegistry<'h> {
    handlers: Vec<Box<dyn TagHandler + 'h>>,
}

impl<'h> HandlerRegistry<'h> {
    pub fn new() -> Self {
        HandlerRegistry {
            handlers: Vec::new(),
        }
    }

    /// Append a handler; it will be called after all earlier ones
    pub fn register(&mut self, handler: impl TagHandler + 'h) {
        self.handlers.push(Box::new(handler));
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Per-parse dispatch state over a borrowed handler list
pub struct Dispatcher<'r, 'h> {
    handlers: &'r mut [Box<dyn TagHandler + 'h>],
    stack: TagStack,
    buffer: CharacterBuffer,
    elements: usize,
}

impl<'r, 'h> Dispatcher<'r, 'h> {
    /// Start with an empty stack and buffer
    pub fn new(registry: &'r mut HandlerRegistry<'h>) -> Self {
        Dispatcher {
            handlers: &mut registry.handlers,
            stack: TagStack::new(),
            buffer: CharacterBuffer::new(),
            elements: 0,
        }
    }

    /// Open an element and tell every handler
    ///
    /// A `ValidationError` from one handler is logged and does not stop
    /// later handlers or the parse.
    pub fn dispatch_start(
        &mut self,
        namespace_uri: &str,
        local_name: &str,
        qualified_name: &str,
        attributes: &Attributes,
    ) {
        self.buffer.reset();
        self.stack.push(qualified_name);
        self.elements += 1;

        for handler in self.handlers.iter_mut() {
            if let Err(err) = handler.on_start(namespace_uri, local_name, qualified_name, attributes) {
                diagnostics::validation_error(qualified_name, &err);
            }
        }
    }

    /// Close the innermost element: every handler's `on_end`, then pop
    pub fn dispatch_end(
        &mut self,
        namespace_uri: &str,
        local_name: &str,
        qualified_name: &str,
    ) -> Result<(), ParseError> {
        match self.stack.peek() {
            Some(frame) if frame.name == qualified_name => {}
            Some(frame) => {
                return Err(ParseError::Fault(format!(
                    "end event for <{}> while <{}> is open (path: {})",
                    qualified_name,
                    frame.name,
                    self.stack.path().collect::<Vec<_>>().join("/")
                )))
            }
            None => {
                return Err(ParseError::Fault(format!(
                    "end event for <{}> with no open element",
                    qualified_name
                )))
            }
        }

        for handler in self.handlers.iter_mut() {
            handler.on_end(namespace_uri, local_name, qualified_name);
        }

        trace!(
            element = qualified_name,
            depth = self.stack.depth(),
            path = ?self.stack.path().collect::<Vec<_>>(),
            text_len = self.buffer.len(),
            "element closed"
        );
        self.stack.pop()?;
        Ok(())
    }

    /// Append a text chunk and hand it to the handlers that want text
    pub fn dispatch_characters(&mut self, chunk: &str) -> Result<(), ParseError> {
        if self.stack.is_empty() {
            return Err(ParseError::Fault(
                "character data outside of any element".to_string(),
            ));
        }

        self.buffer.append(chunk);
        for handler in self.handlers.iter_mut().filter(|h| h.has_cdata()) {
            handler.append_cdata(chunk);
        }
        Ok(())
    }

    /// Open element path
    pub fn stack(&self) -> &TagStack {
        &self.stack
    }

    /// Text gathered since the innermost element started
    pub fn text(&self) -> &str {
        self.buffer.as_str()
    }

    /// Number of elements opened so far
    pub fn elements_seen(&self) -> usize {
        self.elements
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    struct Recorder {
        id: &'static str,
        log: Log,
        cdata: bool,
        reject: Option<&'static str>,
    }

    impl Recorder {
        fn new(id: &'static str, log: &Log) -> Self {
            Recorder {
                id,
                log: Rc::clone(log),
                cdata: false,
                reject: None,
            }
        }
    }

    impl TagHandler for Recorder {
        fn on_start(
            &mut self,
            _namespace_uri: &str,
            _local_name: &str,
            qualified_name: &str,
            _attributes: &Attributes,
        ) -> Result<(), ValidationError> {
            self.log
                .borrow_mut()
                .push(format!("{}:start:{}", self.id, qualified_name));
            if self.reject == Some(qualified_name) {
                return Err(ValidationError::new(format!("bad <{}>", qualified_name)));
            }
            Ok(())
        }

        fn on_end(&mut self, _namespace_uri: &str, _local_name: &str, qualified_name: &str) {
            self.log
                .borrow_mut()
                .push(format!("{}:end:{}", self.id, qualified_name));
        }

        fn has_cdata(&self) -> bool {
            self.cdata
        }

        fn append_cdata(&mut self, chunk: &str) {
            self.log.borrow_mut().push(format!("{}:text:{}", self.id, chunk));
        }
    }

    #[test]
    fn test_registration_order() {
        let log = Log::default();
        let mut registry = HandlerRegistry::new();
        registry.register(Recorder::new("h1", &log));
        registry.register(Recorder::new("h2", &log));
        assert_eq!(registry.len(), 2);

        let mut dispatcher = Dispatcher::new(&mut registry);
        dispatcher.dispatch_start("", "task", "task", &Attributes::new());
        dispatcher.dispatch_end("", "task", "task").unwrap();

        assert_eq!(
            *log.borrow(),
            ["h1:start:task", "h2:start:task", "h1:end:task", "h2:end:task"]
        );
        assert_eq!(dispatcher.elements_seen(), 1);
        assert!(dispatcher.stack().is_empty());
    }

    #[test]
    fn test_validation_error_is_contained() {
        let log = Log::default();
        let mut registry = HandlerRegistry::new();
        registry.register(Recorder {
            reject: Some("task"),
            ..Recorder::new("h1", &log)
        });
        registry.register(Recorder::new("h2", &log));

        let mut dispatcher = Dispatcher::new(&mut registry);
        dispatcher.dispatch_start("", "task", "task", &Attributes::new());

        assert_eq!(*log.borrow(), ["h1:start:task", "h2:start:task"]);
        assert_eq!(dispatcher.stack().depth(), 1);
    }

    #[test]
    fn test_characters_only_reach_cdata_handlers() {
        let log = Log::default();
        let mut registry = HandlerRegistry::new();
        registry.register(Recorder::new("plain", &log));
        registry.register(Recorder {
            cdata: true,
            ..Recorder::new("text", &log)
        });

        let mut dispatcher = Dispatcher::new(&mut registry);
        dispatcher.dispatch_start("", "name", "name", &Attributes::new());
        dispatcher.dispatch_characters("Des").unwrap();
        dispatcher.dispatch_characters("ign").unwrap();

        assert_eq!(dispatcher.text(), "Design");
        assert_eq!(
            *log.borrow(),
            ["plain:start:name", "text:start:name", "text:text:Des", "text:text:ign"]
        );
    }

    #[test]
    fn test_buffer_reset_on_child_start() {
        let mut registry = HandlerRegistry::new();
        let mut dispatcher = Dispatcher::new(&mut registry);

        dispatcher.dispatch_start("", "a", "a", &Attributes::new());
        dispatcher.dispatch_characters("outer").unwrap();
        dispatcher.dispatch_start("", "b", "b", &Attributes::new());
        assert_eq!(dispatcher.text(), "");
        dispatcher.dispatch_characters("inner").unwrap();
        dispatcher.dispatch_end("", "b", "b").unwrap();
        dispatcher.dispatch_characters(" tail").unwrap();

        // Closing a child does not restore the parent's earlier text
        assert_eq!(dispatcher.text(), "inner tail");
    }

    #[test]
    fn test_contract_breaches_are_faults() {
        let mut registry = HandlerRegistry::new();
        let mut dispatcher = Dispatcher::new(&mut registry);

        assert!(matches!(
            dispatcher.dispatch_end("", "a", "a"),
            Err(ParseError::Fault(_))
        ));
        assert!(matches!(
            dispatcher.dispatch_characters("stray"),
            Err(ParseError::Fault(_))
        ));

        dispatcher.dispatch_start("", "a", "a", &Attributes::new());
        dispatcher.dispatch_start("", "b", "b", &Attributes::new());
        assert_eq!(
            dispatcher.dispatch_end("", "c", "c"),
            Err(ParseError::Fault(
                "end event for <c> while <b> is open (path: a/b)".to_string()
            ))
        );
        assert_eq!(dispatcher.stack().depth(), 2);
    }
}
