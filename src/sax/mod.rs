//! SAX-style Dispatch Module
//!
//! Fans streaming parse events out to an ordered set of handlers.
//!
//! ## Architecture
//!
//! ```text
//! StreamReader ---> ParseSession ---> Dispatcher ---> TagHandler[0..n]
//!                        |               |
//!                        |          TagStack + CharacterBuffer
//!                        v
//!                 ListenerRegistry ---> ParsingListener[0..n]  (success only)
//! ```
//!
//! ## Failure isolation
//!
//! - `on_start` may return a [`ValidationError`]; it is logged and the next
//!   handler still runs.
//! - `on_end` has no error channel. Every handler sees every end event.
//! - Anything else is fatal and abandons the session without notifying
//!   listeners.

pub mod buffer;
pub mod dispatcher;
pub mod listener;
pub mod session;
pub mod stack;

pub use buffer::CharacterBuffer;
pub use dispatcher::{Dispatcher, HandlerRegistry};
pub use listener::ListenerRegistry;
pub use session::{ParseSession, SessionState};
pub use stack::{ElementFrame, TagStack};

use crate::core::attributes::Attributes;
use crate::error::ValidationError;

/// Receives element events for one concern of the document
///
/// Handlers are called in registration order. Each one sees every element;
/// filtering by name is up to the implementation.
pub trait TagHandler {
    /// Called when an element starts
    ///
    /// # Arguments
    /// * `namespace_uri` - Resolved namespace, empty without namespace processing
    /// * `local_name` - Name without prefix (the qualified name without namespace processing)
    /// * `qualified_name` - Name as written in the document
    /// * `attributes` - Attributes in document order
    ///
    /// Returning an error skips the rest of this handler's work for the
    /// element only; the parse continues.
    fn on_start(
        &mut self,
        namespace_uri: &str,
        local_name: &str,
        qualified_name: &str,
        attributes: &Attributes,
    ) -> Result<(), ValidationError>;

    /// Called when an element ends, after all of its children have ended
    fn on_end(&mut self, namespace_uri: &str, local_name: &str, qualified_name: &str);

    /// Whether this handler wants text content (default: no)
    fn has_cdata(&self) -> bool {
        false
    }

    /// Called once per text chunk while an element is open, if
    /// [`has_cdata`](Self::has_cdata) is true
    ///
    /// A single text run may arrive as several chunks.
    fn append_cdata(&mut self, _chunk: &str) {}
}

/// Told once that a document was parsed to its end without failure
pub trait ParsingListener {
    fn on_parsing_finished(&mut self);
}

impl<T: TagHandler + ?Sized> TagHandler for &mut T {
    fn on_start(
        &mut self,
        namespace_uri: &str,
        local_name: &str,
        qualified_name: &str,
        attributes: &Attributes,
    ) -> Result<(), ValidationError> {
        (**self).on_start(namespace_uri, local_name, qualified_name, attributes)
    }

    fn on_end(&mut self, namespace_uri: &str, local_name: &str, qualified_name: &str) {
        (**self).on_end(namespace_uri, local_name, qualified_name)
    }

    fn has_cdata(&self) -> bool {
        (**self).has_cdata()
    }

    fn append_cdata(&mut self, chunk: &str) {
        (**self).append_cdata(chunk)
    }
}

impl<T: TagHandler + ?Sized> TagHandler for Box<T> {
    fn on_start(
        &mut self,
        namespace_uri: &str,
        local_name: &str,
        qualified_name: &str,
        attributes: &Attributes,
    ) -> Result<(), ValidationError> {
        (**self).on_start(namespace_uri, local_name, qualified_name, attributes)
    }

    fn on_end(&mut self, namespace_uri: &str, local_name: &str, qualified_name: &str) {
        (**self).on_end(namespace_uri, local_name, qualified_name)
    }

    fn has_cdata(&self) -> bool {
        (**self).has_cdata()
    }

    fn append_cdata(&mut self, chunk: &str) {
        (**self).append_cdata(chunk)
    }
}

impl<T: ParsingListener + ?Sized> ParsingListener for &mut T {
    fn on_parsing_finished(&mut self) {
        (**self).on_parsing_finished()
    }
}

impl<T: ParsingListener + ?Sized> ParsingListener for Box<T> {
    fn on_parsing_finished(&mut self) {
        (**self).on_parsing_finished()
    }
}
