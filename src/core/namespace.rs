//! Namespace Resolution
//!
//! Stack-based namespace resolver for XML namespace handling.

use super::attributes::Attributes;
use super::name::{split_name, ElementName};

/// Well-known namespace URIs
pub mod ns {
    pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
    pub const XMLNS: &str = "http://www.w3.org/2000/xmlns/";
}

/// Namespace binding (prefix -> URI); the empty prefix is the default namespace
#[derive(Debug, Clone)]
struct NsBinding {
    prefix: String,
    uri: String,
    depth: usize,
}

/// Stack-based namespace resolver
#[derive(Debug)]
pub struct NamespaceResolver {
    bindings: Vec<NsBinding>,
    depth: usize,
}

impl Default for NamespaceResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl NamespaceResolver {
    /// Create a resolver with the `xml` and `xmlns` prefixes pre-bound
    pub fn new() -> Self {
        NamespaceResolver {
            bindings: vec![
                NsBinding {
                    prefix: "xml".to_string(),
                    uri: ns::XML.to_string(),
                    depth: 0,
                },
                NsBinding {
                    prefix: "xmlns".to_string(),
                    uri: ns::XMLNS.to_string(),
                    depth: 0,
                },
            ],
            depth: 0,
        }
    }

    pub fn push_scope(&mut self) {
        self.depth += 1;
    }

    /// Leave an element scope, removing any bindings declared in it
    pub fn pop_scope(&mut self) {
        if self.depth == 0 {
            return;
        }
        while let Some(binding) = self.bindings.last() {
            if binding.depth < self.depth {
                break;
            }
            self.bindings.pop();
        }
        self.depth -= 1;
    }

    /// Declare a binding in the current scope. An empty prefix sets the
    /// default namespace; an empty URI there undeclares it.
    pub fn declare(&mut self, prefix: &str, uri: &str) -> Result<(), String> {
        match prefix {
            "xmlns" => return Err("the prefix \"xmlns\" cannot be declared".to_string()),
            "xml" if uri == ns::XML => return Ok(()),
            "xml" => return Err("the prefix \"xml\" cannot be bound to another URI".to_string()),
            _ => {}
        }
        if uri == ns::XML || uri == ns::XMLNS {
            return Err(format!("the namespace \"{}\" is reserved", uri));
        }
        if !prefix.is_empty() && uri.is_empty() {
            return Err(format!("the prefix \"{}\" cannot be undeclared", prefix));
        }

        self.bindings.push(NsBinding {
            prefix: prefix.to_string(),
            uri: uri.to_string(),
            depth: self.depth,
        });
        Ok(())
    }

    /// Resolve a prefix (empty for the default namespace)
    pub fn resolve(&self, prefix: &str) -> Option<&str> {
        self.bindings
            .iter()
            .rev()
            .find(|b| b.prefix == prefix)
            .map(|b| b.uri.as_str())
            .filter(|uri| !uri.is_empty())
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Open an element scope: apply its `xmlns` declarations, then resolve
    /// the element name and fill in the attributes' URIs and local names.
    pub fn enter_element(
        &mut self,
        qualified_name: &str,
        attributes: &mut Attributes,
    ) -> Result<ElementName, String> {
        self.push_scope();

        for attr in attributes.iter() {
            match split_name(&attr.qualified_name) {
                (None, "xmlns") => self.declare("", &attr.value)?,
                (Some("xmlns"), prefix) => self.declare(prefix, &attr.value)?,
                _ => {}
            }
        }

        let (uri, local) = self.resolve_name(qualified_name, true)?;
        for attr in attributes.iter_mut() {
            let (uri, local) = if attr.qualified_name == "xmlns" {
                (ns::XMLNS.to_string(), attr.qualified_name.clone())
            } else {
                self.resolve_name(&attr.qualified_name, false)?
            };
            attr.namespace_uri = uri;
            attr.local_name = local;
        }

        Ok(ElementName::new(uri, local, qualified_name))
    }

    /// Close the scope opened by the matching `enter_element`
    pub fn leave_element(&mut self) {
        self.pop_scope();
    }

    /// Unprefixed attributes never take the default namespace
    fn resolve_name(&self, name: &str, use_default: bool) -> Result<(String, String), String> {
        match split_name(name) {
            (Some(prefix), local) => {
                if prefix.is_empty() || local.is_empty() || local.contains(':') {
                    return Err(format!("\"{}\" is not a valid qualified name", name));
                }
                let uri = self
                    .resolve(prefix)
                    .ok_or_else(|| format!("the prefix \"{}\" of \"{}\" is not bound", prefix, name))?;
                Ok((uri.to_string(), local.to_string()))
            }
            (None, local) => {
                let uri = if use_default { self.resolve("").unwrap_or("") } else { "" };
                Ok((uri.to_string(), local.to_string()))
            }
        }
    }
}
