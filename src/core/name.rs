//! Element names as delivered to handlers

use memchr::memchr;
use std::fmt;

/// The `(namespace URI, local name, qualified name)` triple of an element
///
/// When namespace processing is off the URI is empty and the local name is
/// the qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementName {
    pub namespace_uri: String,
    pub local_name: String,
    pub qualified_name: String,
}

impl ElementName {
    /// Name reported without namespace processing
    pub fn plain(qualified_name: impl Into<String>) -> Self {
        let qualified_name = qualified_name.into();
        ElementName {
            namespace_uri: String::new(),
            local_name: qualified_name.clone(),
            qualified_name,
        }
    }

    pub fn new(
        namespace_uri: impl Into<String>,
        local_name: impl Into<String>,
        qualified_name: impl Into<String>,
    ) -> Self {
        ElementName {
            namespace_uri: namespace_uri.into(),
            local_name: local_name.into(),
            qualified_name: qualified_name.into(),
        }
    }

    /// Namespace prefix of the qualified name, if any
    pub fn prefix(&self) -> Option<&str> {
        split_name(&self.qualified_name).0
    }
}

impl fmt::Display for ElementName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name)
    }
}

/// Split a qualified name into prefix and local part at the first colon
pub fn split_name(name: &str) -> (Option<&str>, &str) {
    match memchr(b':', name.as_bytes()) {
        Some(pos) => (Some(&name[..pos]), &name[pos + 1..]),
        None => (None, name),
    }
}
