//! XML Entity Decoding
//!
//! Turns raw character data and attribute values into the text handed to
//! handlers:
//! - Built-in entities: &lt; &gt; &amp; &quot; &apos;
//! - Numeric character references: &#123; &#x7B;
//! - General entities declared in the DOCTYPE internal subset
//! - Line-end normalization (CRLF and lone CR become LF)
//! - Attribute value whitespace normalization
//!
//! Uses Cow for zero-copy when nothing needs rewriting.

use memchr::{memchr, memmem};
use std::borrow::Cow;

use super::dtd::{EntityDecl, EntityTable};
use super::scanner::is_valid_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Text,
    Attribute,
}

/// Decode character data found between tags
pub fn decode_text<'a>(raw: &'a [u8], entities: &EntityTable) -> Result<Cow<'a, str>, String> {
    let text = as_str(raw)?;
    if memmem::find(raw, b"]]>").is_some() {
        return Err("the sequence \"]]>\" is not allowed in character data".to_string());
    }
    decode(text, Mode::Text, entities)
}

/// Decode a quoted attribute value (without the quotes)
pub fn decode_attribute<'a>(
    raw: &'a [u8],
    entities: &EntityTable,
) -> Result<Cow<'a, str>, String> {
    if memchr(b'<', raw).is_some() {
        return Err("'<' is not allowed in attribute values".to_string());
    }
    decode(as_str(raw)?, Mode::Attribute, entities)
}

/// Decode the content of a CDATA section: no references, only line ends
pub fn decode_cdata(raw: &[u8]) -> Result<Cow<'_, str>, String> {
    let text = as_str(raw)?;
    validate_chars(text)?;
    Ok(normalize_line_endings(text))
}

/// Expand character references only, leaving entity references untouched.
/// Used for entity values in the internal subset.
pub fn expand_char_refs(value: &str) -> Result<String, String> {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(pos) = rest.find("&#") {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos + 2..];
        let semi = tail
            .find(';')
            .ok_or_else(|| "character reference must end with ';'".to_string())?;
        out.push(decode_char_ref(&tail[..semi])?);
        rest = &tail[semi + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Replace CRLF and lone CR with LF
pub fn normalize_line_endings(text: &str) -> Cow<'_, str> {
    if memchr(b'\r', text.as_bytes()).is_none() {
        return Cow::Borrowed(text);
    }
    Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
}

fn as_str(raw: &[u8]) -> Result<&str, String> {
    std::str::from_utf8(raw)
        .map_err(|e| format!("invalid UTF-8 sequence at byte {} of character data", e.valid_up_to()))
}

fn decode<'a>(text: &'a str, mode: Mode, entities: &EntityTable) -> Result<Cow<'a, str>, String> {
    validate_chars(text)?;

    let special = |b: u8| {
        b == b'&' || b == b'\r' || (mode == Mode::Attribute && (b == b'\n' || b == b'\t'))
    };
    let bytes = text.as_bytes();
    if !bytes.iter().any(|&b| special(b)) {
        return Ok(Cow::Borrowed(text));
    }

    let mut out = String::with_capacity(text.len());
    // Every special byte is ASCII, so the slice points below stay on char boundaries
    let mut run_start = 0;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if !special(b) {
            i += 1;
            continue;
        }
        out.push_str(&text[run_start..i]);
        match b {
            b'&' => {
                let semi = memchr(b';', &bytes[i..])
                    .ok_or_else(|| "entity reference must end with ';'".to_string())?
                    + i;
                out.push_str(&resolve_reference(&text[i + 1..semi], entities)?);
                i = semi + 1;
            }
            b'\r' => {
                out.push(if mode == Mode::Attribute { ' ' } else { '\n' });
                i += if bytes.get(i + 1) == Some(&b'\n') { 2 } else { 1 };
            }
            _ => {
                out.push(' ');
                i += 1;
            }
        }
        run_start = i;
    }
    out.push_str(&text[run_start..]);
    Ok(Cow::Owned(out))
}

/// Resolve the text of one reference (between '&' and ';')
fn resolve_reference<'e>(name: &str, entities: &'e EntityTable) -> Result<Cow<'e, str>, String> {
    match name {
        "lt" => Ok(Cow::Borrowed("<")),
        "gt" => Ok(Cow::Borrowed(">")),
        "amp" => Ok(Cow::Borrowed("&")),
        "quot" => Ok(Cow::Borrowed("\"")),
        "apos" => Ok(Cow::Borrowed("'")),
        _ if name.starts_with('#') => decode_char_ref(&name[1..]).map(|c| Cow::Owned(c.to_string())),
        _ if !is_valid_name(name) => Err(format!("invalid entity reference \"&{};\"", name)),
        _ => match entities.get(name) {
            Some(EntityDecl::Internal(value)) if value.contains(['<', '&']) => Err(format!(
                "entity \"{}\" expands to markup, which is not supported",
                name
            )),
            Some(EntityDecl::Internal(value)) => Ok(Cow::Borrowed(value.as_str())),
            Some(EntityDecl::External { system_id }) => Err(format!(
                "external entity \"{}\" ({}) cannot be resolved",
                name, system_id
            )),
            None => Err(format!("entity \"{}\" was referenced, but not declared", name)),
        },
    }
}

/// Decode the digits of a character reference (text after "&#")
fn decode_char_ref(digits: &str) -> Result<char, String> {
    let codepoint = match digits.strip_prefix('x') {
        Some(hex) if !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()) => {
            u32::from_str_radix(hex, 16).ok()
        }
        None if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
            digits.parse::<u32>().ok()
        }
        _ => None,
    };

    codepoint
        .filter(|&cp| is_valid_xml_char(cp))
        .and_then(char::from_u32)
        .ok_or_else(|| format!("invalid character reference \"&#{};\"", digits))
}

fn validate_chars(text: &str) -> Result<(), String> {
    match text.chars().find(|&c| !is_valid_xml_char(c as u32)) {
        Some(c) => Err(format!("invalid XML character U+{:04X}", c as u32)),
        None => Ok(()),
    }
}

/// Check if a code point is a valid XML 1.0 Char
/// Char ::= #x9 | #xA | #xD | [#x20-#xD7FF] | [#xE000-#xFFFD] | [#x10000-#x10FFFF]
#[inline]
pub fn is_valid_xml_char(codepoint: u32) -> bool {
    matches!(codepoint,
        0x9 | 0xA | 0xD |
        0x20..=0xD7FF |
        0xE000..=0xFFFD |
        0x10000..=0x10FFFF
    )
}
