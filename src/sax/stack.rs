//! Tag Stack
//!
//! Explicit record of the open element path. Pushed on every start, popped
//! on the matching end; the dispatcher uses it to check that ends arrive in
//! reverse order of their starts.

use crate::error::ParseError;

/// One open element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementFrame {
    /// Qualified name of the element
    pub name: String,
    /// 1-based nesting depth; the root element is at depth 1
    pub depth: usize,
}

/// Stack of open elements, root first
#[derive(Debug, Default)]
pub struct TagStack {
    frames: Vec<ElementFrame>,
}

impl TagStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>) {
        let depth = self.frames.len() + 1;
        self.frames.push(ElementFrame {
            name: name.into(),
            depth,
        });
    }

    /// Pop the innermost frame
    ///
    /// An empty stack means start and end events went out of step, which is
    /// a fault rather than a document error.
    pub fn pop(&mut self) -> Result<ElementFrame, ParseError> {
        self.frames
            .pop()
            .ok_or_else(|| ParseError::Fault("tag stack underflow: end event with no open element".to_string()))
    }

    pub fn peek(&self) -> Option<&ElementFrame> {
        self.frames.last()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Names of the open elements, root first
    pub fn path(&self) -> impl Iterator<Item = &str> {
        self.frames.iter().map(|f| f.name.as_str())
    }
}
