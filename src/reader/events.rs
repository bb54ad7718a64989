//! XML Event Types
//!
//! Events produced by the streaming reader. Comments, processing
//! instructions, the XML declaration and the DOCTYPE are consumed by the
//! reader and never surface here.

use crate::core::attributes::Attributes;
use crate::core::name::ElementName;

/// XML parsing event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent {
    /// Start of an element: `<name attrs...>`, or the first half of `<name/>`
    StartElement {
        name: ElementName,
        attributes: Attributes,
    },
    /// End of an element: `</name>`, or the second half of `<name/>`
    EndElement(ElementName),
    /// One chunk of decoded character data or one CDATA section
    Characters(String),
    /// The root element closed and the input ended cleanly
    EndDocument,
}

impl XmlEvent {
    /// Whether this is the final event of a document
    pub fn is_end(&self) -> bool {
        matches!(self, XmlEvent::EndDocument)
    }
}
