//! DOCTYPE internal subset: general entity declarations
//!
//! The parser is non-validating, so element, attribute-list and notation
//! declarations are skipped. Only general entities are kept, because their
//! replacement text is needed to decode references in content.

use std::collections::HashMap;

use super::entities::expand_char_refs;
use super::scanner::Scanner;

/// A declared general entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityDecl {
    /// Replacement text, with character references already expanded
    Internal(String),
    /// Declared with SYSTEM or PUBLIC; never fetched
    External { system_id: String },
}

/// General entities declared in the internal subset
#[derive(Debug, Clone, Default)]
pub struct EntityTable {
    entities: HashMap<String, EntityDecl>,
}

impl EntityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a declaration. The first declaration of a name wins.
    pub fn declare(&mut self, name: impl Into<String>, decl: EntityDecl) {
        self.entities.entry(name.into()).or_insert(decl);
    }

    pub fn get(&self, name: &str) -> Option<&EntityDecl> {
        self.entities.get(name)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Collect general entity declarations from an internal subset
/// (the text between `[` and `]` of a DOCTYPE)
pub fn parse_internal_subset(subset: &[u8]) -> Result<EntityTable, String> {
    let mut table = EntityTable::new();
    let mut scanner = Scanner::new(subset);

    loop {
        scanner.skip_whitespace();
        if scanner.is_eof() {
            return Ok(table);
        }

        if scanner.starts_with(b"<!--") {
            scanner.advance(4);
            let end = scanner
                .find(b"-->")
                .ok_or_else(|| "unterminated comment in DOCTYPE".to_string())?;
            scanner.set_position(end + 3);
        } else if scanner.starts_with(b"<?") {
            let end = scanner
                .find(b"?>")
                .ok_or_else(|| "unterminated processing instruction in DOCTYPE".to_string())?;
            scanner.set_position(end + 2);
        } else if scanner.starts_with(b"<!ENTITY") {
            scanner.advance(8);
            parse_entity_decl(&mut scanner, &mut table)?;
        } else if scanner.starts_with(b"<!") {
            skip_declaration(&mut scanner)?;
        } else if scanner.peek() == Some(b'%') {
            // Parameter entity reference; external subsets are never read
            let end = scanner
                .find_byte(b';')
                .ok_or_else(|| "parameter entity reference must end with ';'".to_string())?;
            scanner.set_position(end + 1);
        } else {
            return Err("malformed markup declaration in DOCTYPE".to_string());
        }
    }
}

fn parse_entity_decl(scanner: &mut Scanner<'_>, table: &mut EntityTable) -> Result<(), String> {
    if scanner.skip_whitespace() == 0 {
        return Err("whitespace is required after \"<!ENTITY\"".to_string());
    }

    let parameter = scanner.peek() == Some(b'%');
    if parameter {
        scanner.advance(1);
        scanner.skip_whitespace();
    }

    let name = scanner
        .read_name()
        .ok_or_else(|| "entity declaration has no name".to_string())?;
    let name = std::str::from_utf8(name)
        .map_err(|_| "invalid UTF-8 in entity name".to_string())?
        .to_string();

    if scanner.skip_whitespace() == 0 {
        return Err(format!("whitespace is required after entity name \"{}\"", name));
    }

    let decl = if let Some(value) = scanner.read_quoted() {
        let value = std::str::from_utf8(value)
            .map_err(|_| format!("invalid UTF-8 in value of entity \"{}\"", name))?;
        EntityDecl::Internal(expand_char_refs(value)?)
    } else if scanner.starts_with(b"SYSTEM") || scanner.starts_with(b"PUBLIC") {
        let public = scanner.starts_with(b"PUBLIC");
        scanner.advance(6);
        scanner.skip_whitespace();
        if public {
            scanner
                .read_quoted()
                .ok_or_else(|| format!("public identifier expected for entity \"{}\"", name))?;
            scanner.skip_whitespace();
        }
        let system_id = scanner
            .read_quoted()
            .ok_or_else(|| format!("system identifier expected for entity \"{}\"", name))?;
        EntityDecl::External {
            system_id: String::from_utf8_lossy(system_id).into_owned(),
        }
    } else {
        return Err(format!("entity \"{}\" has no value", name));
    };

    // Optional NDATA clause, then '>'
    let end = scanner
        .find_byte(b'>')
        .ok_or_else(|| format!("declaration of entity \"{}\" is not terminated", name))?;
    scanner.set_position(end + 1);

    if !parameter {
        table.declare(name, decl);
    }
    Ok(())
}

/// Skip an ELEMENT, ATTLIST or NOTATION declaration, honouring quoted literals
fn skip_declaration(scanner: &mut Scanner<'_>) -> Result<(), String> {
    let mut quote: Option<u8> = None;
    while let Some(b) = scanner.peek() {
        scanner.advance(1);
        match (quote, b) {
            (Some(q), _) if q == b => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(b),
            (None, b'>') => return Ok(()),
            _ => {}
        }
    }
    Err("unterminated markup declaration in DOCTYPE".to_string())
}
