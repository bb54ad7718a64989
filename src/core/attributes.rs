//! XML Attribute Parsing
//!
//! Parses the attribute list of a start tag into an ordered [`Attributes`]
//! mapping. Parsing is strict: every well-formedness problem is an error.

use std::slice;

use super::dtd::EntityTable;
use super::entities::decode_attribute;
use super::name::split_name;
use super::scanner::Scanner;

/// A parsed XML attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Name as written, possibly with a prefix
    pub qualified_name: String,
    /// Local part of the name; equal to `qualified_name` without namespace processing
    pub local_name: String,
    /// Resolved namespace URI; empty when unqualified or without namespace processing
    pub namespace_uri: String,
    /// Value with references decoded and whitespace normalized
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        let qualified_name = name.into();
        Attribute {
            local_name: qualified_name.clone(),
            qualified_name,
            namespace_uri: String::new(),
            value: value.into(),
        }
    }

    pub fn prefix(&self) -> Option<&str> {
        split_name(&self.qualified_name).0
    }
}

/// Attributes of one element, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    items: Vec<Attribute>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Value of the attribute with this qualified name
    pub fn get(&self, qualified_name: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|a| a.qualified_name == qualified_name)
            .map(|a| a.value.as_str())
    }

    /// Value of the attribute with this namespace URI and local name
    pub fn get_ns(&self, namespace_uri: &str, local_name: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|a| a.namespace_uri == namespace_uri && a.local_name == local_name)
            .map(|a| a.value.as_str())
    }

    /// Attribute at a position in document order
    pub fn get_index(&self, index: usize) -> Option<&Attribute> {
        self.items.get(index)
    }

    pub fn iter(&self) -> slice::Iter<'_, Attribute> {
        self.items.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> slice::IterMut<'_, Attribute> {
        self.items.iter_mut()
    }

    pub(crate) fn push(&mut self, attribute: Attribute) {
        self.items.push(attribute);
    }
}

impl<'a> IntoIterator for &'a Attributes {
    type Item = &'a Attribute;
    type IntoIter = slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Attributes {
            items: iter
                .into_iter()
                .map(|(name, value)| Attribute::new(name, value))
                .collect(),
        }
    }
}

/// Parse the attribute list of a start tag
///
/// Input is the tag content after the element name, up to (not including)
/// the closing `>` or `/>`.
pub fn parse_attributes(input: &[u8], entities: &EntityTable) -> Result<Attributes, String> {
    let mut attrs = Attributes::new();
    let mut scanner = Scanner::new(input);

    loop {
        let gap = scanner.skip_whitespace();
        if scanner.is_eof() {
            return Ok(attrs);
        }
        if gap == 0 {
            return Err("whitespace is required before an attribute".to_string());
        }

        let name = scanner
            .read_name()
            .ok_or_else(|| "attribute name expected".to_string())?;
        let name = std::str::from_utf8(name)
            .map_err(|_| "invalid UTF-8 in attribute name".to_string())?;

        scanner.skip_whitespace();
        if scanner.peek() != Some(b'=') {
            return Err(format!("attribute \"{}\" must be followed by '='", name));
        }
        scanner.advance(1);
        scanner.skip_whitespace();

        if !matches!(scanner.peek(), Some(b'"' | b'\'')) {
            return Err(format!("value of attribute \"{}\" must be quoted", name));
        }
        let raw = scanner
            .read_quoted()
            .ok_or_else(|| format!("value of attribute \"{}\" is not terminated", name))?;
        let value = decode_attribute(raw, entities)
            .map_err(|msg| format!("attribute \"{}\": {}", name, msg))?;

        if attrs.get(name).is_some() {
            return Err(format!("attribute \"{}\" was already specified", name));
        }
        attrs.push(Attribute::new(name, value.into_owned()));
    }
}
