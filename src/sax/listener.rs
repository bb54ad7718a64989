//! Listener Registry

use super::ParsingListener;

/// Listeners told once when a parse completes successfully
#[derive(Default)]
pub struct ListenerRegistry<'h> {
    listeners: Vec<Box<dyn ParsingListener + 'h>>,
}

impl<'h> ListenerRegistry<'h> {
    pub fn new() -> Self {
        ListenerRegistry {
            listeners: Vec::new(),
        }
    }

    pub fn register(&mut self, listener: impl ParsingListener + 'h) {
        self.listeners.push(Box::new(listener));
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Notify every listener, in registration order
    pub(crate) fn notify_all(&mut self) {
        for listener in self.listeners.iter_mut() {
            listener.on_parsing_finished();
        }
    }
}
