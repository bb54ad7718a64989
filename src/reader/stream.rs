//! Streaming XML Reader
//!
//! Pull reader over any `Read` source with bounded lookahead. Each call to
//! [`StreamReader::next_event`] reads just enough input to produce the next
//! event, checking well-formedness as it goes.
//!
//! ## Text chunking
//!
//! Text that is complete in the buffer (terminated by `<`) is one chunk. A
//! text run that outgrows the buffered window is delivered in pieces, cut so
//! that no piece ends inside an entity reference, a UTF-8 sequence, or
//! between the CR and LF of a line break. Each CDATA section is its own chunk.

use memchr::{memchr, memmem, memrchr};
use std::io::Read;
use std::mem;

use crate::config::ParserConfig;
use crate::core::attributes::parse_attributes;
use crate::core::dtd::{parse_internal_subset, EntityTable};
use crate::core::entities::{decode_cdata, decode_text};
use crate::core::name::ElementName;
use crate::core::namespace::NamespaceResolver;
use crate::core::scanner::{is_name_start_char, is_whitespace, Scanner};
use crate::error::{Location, ParseError, StreamError, SyntaxError};

use super::buffered::BufferedReader;
use super::events::XmlEvent;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Where the reader is relative to the root element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Before the root element
    Prolog,
    /// Inside the root element
    Content,
    /// After the root element closed
    Epilog,
    /// `EndDocument` has been returned
    Done,
}

/// Markup kinds, told apart by their first bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Markup {
    EndTag,
    Comment,
    CData,
    Doctype,
    ProcessingInstruction,
    StartTag,
    Invalid,
}

fn classify(head: &[u8]) -> Markup {
    if head.starts_with(b"</") {
        Markup::EndTag
    } else if head.starts_with(b"<!--") {
        Markup::Comment
    } else if head.starts_with(b"<![CDATA[") {
        Markup::CData
    } else if head.starts_with(b"<!DOCTYPE") {
        Markup::Doctype
    } else if head.starts_with(b"<?") {
        Markup::ProcessingInstruction
    } else if head.get(1).is_some_and(|&b| is_name_start_char(b)) {
        Markup::StartTag
    } else {
        Markup::Invalid
    }
}

/// Pull-based, well-formedness checking XML reader
pub struct StreamReader<R: Read> {
    input: BufferedReader<R>,
    /// Names of the open elements, root first
    open: Vec<ElementName>,
    namespaces: Option<NamespaceResolver>,
    entities: EntityTable,
    phase: Phase,
    /// A self-closing element still owes its end event
    pending_end: bool,
    started: bool,
    decl_allowed: bool,
    seen_doctype: bool,
}

impl<R: Read> StreamReader<R> {
    /// Build a reader over `input`
    ///
    /// Fails with a configuration error when `config` is unusable.
    pub fn new(input: R, config: &ParserConfig) -> Result<Self, ParseError> {
        config.validate()?;
        Ok(StreamReader {
            input: BufferedReader::with_capacity(input, config.buffer_size),
            open: Vec::new(),
            namespaces: config.namespace_aware.then(NamespaceResolver::new),
            entities: EntityTable::new(),
            phase: Phase::Prolog,
            pending_end: false,
            started: false,
            decl_allowed: false,
            seen_doctype: false,
        })
    }

    /// Read the next event
    ///
    /// After `EndDocument` every further call returns `EndDocument` again.
    pub fn next_event(&mut self) -> Result<XmlEvent, StreamError> {
        if mem::take(&mut self.pending_end) {
            if let Some(name) = self.open.pop() {
                return Ok(self.closed(name));
            }
        }

        if !self.started {
            self.started = true;
            self.skip_bom()?;
            self.decl_allowed = true;
        }

        loop {
            // Only the very first construct may be the XML declaration
            let decl_allowed = mem::replace(&mut self.decl_allowed, false);

            if self.phase == Phase::Done {
                return Ok(XmlEvent::EndDocument);
            }
            if !self.input.ensure(1)? {
                return self.end_of_input();
            }

            let event = if self.input.buffered()[0] == b'<' {
                self.read_markup(decl_allowed)?
            } else {
                self.read_text()?
            };
            if let Some(event) = event {
                return Ok(event);
            }
        }
    }

    fn skip_bom(&mut self) -> Result<(), StreamError> {
        self.input.ensure(3)?;
        let head = self.input.buffered();
        if head.starts_with(UTF8_BOM) {
            self.input.consume(UTF8_BOM.len());
        } else if head.starts_with(&[0xFE, 0xFF]) || head.starts_with(&[0xFF, 0xFE]) {
            return Err(self.syntax("UTF-16 input is not supported; only UTF-8 is accepted"));
        }
        Ok(())
    }

    fn end_of_input(&mut self) -> Result<XmlEvent, StreamError> {
        match self.phase {
            Phase::Prolog => {
                Err(self.syntax("premature end of file: the document has no root element"))
            }
            Phase::Content => {
                let name = self
                    .open
                    .last()
                    .map(|n| n.qualified_name.as_str())
                    .unwrap_or_default();
                Err(self.syntax(format!("element <{}> is not closed", name)))
            }
            Phase::Epilog | Phase::Done => {
                self.phase = Phase::Done;
                Ok(XmlEvent::EndDocument)
            }
        }
    }

    fn read_markup(&mut self, decl_allowed: bool) -> Result<Option<XmlEvent>, StreamError> {
        self.input.ensure(9)?;
        match classify(self.input.buffered()) {
            Markup::EndTag => self.read_end_tag().map(Some),
            Markup::Comment => self.skip_comment().map(|_| None),
            Markup::CData => self.read_cdata(),
            Markup::Doctype => self.read_doctype().map(|_| None),
            Markup::ProcessingInstruction => self.skip_pi(decl_allowed).map(|_| None),
            Markup::StartTag => self.read_start_tag().map(Some),
            Markup::Invalid => Err(self.syntax("markup is not well-formed")),
        }
    }

    fn read_start_tag(&mut self) -> Result<XmlEvent, StreamError> {
        let location = self.input.location();
        if self.phase == Phase::Epilog {
            return Err(error("only one root element is allowed", location));
        }

        let mut quote: Option<u8> = None;
        let end = self
            .input
            .find_by(1, |b| match quote {
                Some(q) => {
                    if b == q {
                        quote = None;
                    }
                    false
                }
                None if b == b'"' || b == b'\'' => {
                    quote = Some(b);
                    false
                }
                None => b == b'>' || b == b'<',
            })?
            .filter(|&end| self.input.buffered()[end] == b'>')
            .ok_or_else(|| error("start tag is not terminated", location))?;

        let tag = &self.input.buffered()[1..end];
        let (body, empty) = match tag.strip_suffix(b"/") {
            Some(body) => (body, true),
            None => (tag, false),
        };
        let mut scanner = Scanner::new(body);
        let qname = scanner
            .read_name()
            .and_then(|name| std::str::from_utf8(name).ok())
            .ok_or_else(|| error("element name expected", location))?
            .to_string();
        let mut attributes = parse_attributes(scanner.remaining(), &self.entities)
            .map_err(|msg| error(format!("element <{}>: {}", qname, msg), location))?;

        let name = match self.namespaces.as_mut() {
            Some(resolver) => resolver
                .enter_element(&qname, &mut attributes)
                .map_err(|msg| error(msg, location))?,
            None => ElementName::plain(qname),
        };

        self.input.consume(end + 1);
        self.phase = Phase::Content;
        self.open.push(name.clone());
        self.pending_end = empty;
        Ok(XmlEvent::StartElement { name, attributes })
    }

    fn read_end_tag(&mut self) -> Result<XmlEvent, StreamError> {
        let location = self.input.location();
        let end = self
            .input
            .find(b">", 2)?
            .ok_or_else(|| error("end tag is not terminated", location))?;

        let mut scanner = Scanner::new(&self.input.buffered()[2..end]);
        let name = scanner
            .read_name()
            .and_then(|name| std::str::from_utf8(name).ok())
            .ok_or_else(|| error("end tag must name an element", location))?
            .to_string();
        scanner.skip_whitespace();
        if !scanner.is_eof() {
            return Err(error(format!("end tag </{}> must end with '>'", name), location));
        }

        let open = match self.open.pop() {
            Some(open) if open.qualified_name == name => open,
            Some(open) => {
                return Err(error(
                    format!(
                        "element type \"{0}\" must be terminated by the matching end tag \"</{0}>\"",
                        open.qualified_name
                    ),
                    location,
                ))
            }
            None => return Err(error(format!("unexpected end tag </{}>", name), location)),
        };

        self.input.consume(end + 1);
        Ok(self.closed(open))
    }

    fn closed(&mut self, name: ElementName) -> XmlEvent {
        if let Some(resolver) = self.namespaces.as_mut() {
            resolver.leave_element();
        }
        if self.open.is_empty() {
            self.phase = Phase::Epilog;
        }
        XmlEvent::EndElement(name)
    }

    fn skip_comment(&mut self) -> Result<(), StreamError> {
        let location = self.input.location();
        let end = self
            .input
            .find(b"-->", 4)?
            .ok_or_else(|| error("comment is not terminated", location))?;

        let body = &self.input.buffered()[4..end];
        if memmem::find(body, b"--").is_some() || body.ends_with(b"-") {
            return Err(error("the string \"--\" is not permitted within comments", location));
        }
        self.input.consume(end + 3);
        Ok(())
    }

    fn read_cdata(&mut self) -> Result<Option<XmlEvent>, StreamError> {
        let location = self.input.location();
        if self.phase != Phase::Content {
            return Err(error("CDATA section is only allowed inside the root element", location));
        }
        let end = self
            .input
            .find(b"]]>", 9)?
            .ok_or_else(|| error("CDATA section is not terminated", location))?;

        let text = decode_cdata(&self.input.buffered()[9..end])
            .map_err(|msg| error(msg, location))?
            .into_owned();
        self.input.consume(end + 3);

        Ok((!text.is_empty()).then_some(XmlEvent::Characters(text)))
    }

    fn read_doctype(&mut self) -> Result<(), StreamError> {
        let location = self.input.location();
        if self.phase != Phase::Prolog || self.seen_doctype {
            return Err(error("DOCTYPE is only allowed once, before the root element", location));
        }
        self.seen_doctype = true;

        let mut scan = DoctypeScan::default();
        let end = self
            .input
            .find_by(9, |b| scan.step(b))?
            .ok_or_else(|| error("DOCTYPE is not terminated", location))?;

        let decl = &self.input.buffered()[9..end];
        let mut scanner = Scanner::new(decl);
        if scanner.skip_whitespace() == 0 || scanner.read_name().is_none() {
            return Err(error("DOCTYPE must name the root element", location));
        }
        if let (Some(start), Some(stop)) = (scan.subset_start, scan.subset_end) {
            self.entities = parse_internal_subset(&decl[start..stop])
                .map_err(|msg| error(msg, location))?;
        }

        self.input.consume(end + 1);
        Ok(())
    }

    fn skip_pi(&mut self, decl_allowed: bool) -> Result<(), StreamError> {
        let location = self.input.location();
        let end = self
            .input
            .find(b"?>", 2)?
            .ok_or_else(|| error("processing instruction is not terminated", location))?;

        let mut scanner = Scanner::new(&self.input.buffered()[2..end]);
        let target = scanner
            .read_name()
            .ok_or_else(|| error("processing instruction must start with a target name", location))?;

        if target.eq_ignore_ascii_case(b"xml") {
            if target != b"xml" || !decl_allowed {
                return Err(error(
                    "a processing instruction target matching \"[xX][mM][lL]\" is not allowed here",
                    location,
                ));
            }
            check_xml_declaration(scanner.remaining()).map_err(|msg| error(msg, location))?;
        } else if !scanner.is_eof() && !scanner.peek().is_some_and(is_whitespace) {
            return Err(error("whitespace is required after a processing instruction target", location));
        }

        self.input.consume(end + 2);
        Ok(())
    }

    fn read_text(&mut self) -> Result<Option<XmlEvent>, StreamError> {
        let location = self.input.location();
        let len = loop {
            let window = self.input.buffered();
            if let Some(lt) = memchr(b'<', window) {
                break lt;
            }
            if self.input.is_exhausted() {
                break window.len();
            }
            let safe = safe_text_len(window);
            if safe > 0 {
                break safe;
            }
            self.input.fill()?;
        };

        let raw = &self.input.buffered()[..len];
        if self.phase != Phase::Content {
            if !raw.iter().all(|&b| is_whitespace(b)) {
                let msg = match self.phase {
                    Phase::Prolog => "content is not allowed in prolog",
                    _ => "content is not allowed after the root element",
                };
                return Err(error(msg, location));
            }
            self.input.consume(len);
            return Ok(None);
        }

        let text = decode_text(raw, &self.entities)
            .map_err(|msg| error(msg, location))?
            .into_owned();
        self.input.consume(len);

        Ok((!text.is_empty()).then_some(XmlEvent::Characters(text)))
    }

    fn syntax(&self, message: impl Into<String>) -> StreamError {
        error(message, self.input.location())
    }
}

fn error(message: impl Into<String>, location: Location) -> StreamError {
    SyntaxError::new(message, location).into()
}

/// Longest prefix of a partial text run that can be decoded on its own
fn safe_text_len(bytes: &[u8]) -> usize {
    let mut end = bytes.len();
    if let Some(amp) = memrchr(b'&', bytes) {
        if memchr(b';', &bytes[amp..]).is_none() {
            end = amp;
        }
    }
    if end > 0 && bytes[end - 1] == b'\r' {
        end -= 1;
    }
    end -= incomplete_utf8_tail(&bytes[..end]);
    // A trailing "]" or "]]" may open a "]]>" that the next read completes
    for _ in 0..2 {
        if end > 0 && bytes[end - 1] == b']' {
            end -= 1;
        }
    }
    end
}

/// Number of trailing bytes that start a UTF-8 sequence without finishing it
fn incomplete_utf8_tail(bytes: &[u8]) -> usize {
    for back in 1..=bytes.len().min(4) {
        let b = bytes[bytes.len() - back];
        if b & 0xC0 == 0x80 {
            continue;
        }
        let width = match b {
            0xF0.. => 4,
            0xE0.. => 3,
            0xC0.. => 2,
            _ => 1,
        };
        return if width > back { back } else { 0 };
    }
    0
}

/// Validate the pseudo-attributes of `<?xml ...?>`
fn check_xml_declaration(rest: &[u8]) -> Result<(), String> {
    let attrs = parse_attributes(rest, &EntityTable::new())
        .map_err(|msg| format!("malformed XML declaration: {}", msg))?;

    match attrs.get("version") {
        Some(version) if version.starts_with("1.") => {}
        Some(version) => return Err(format!("XML version \"{}\" is not supported", version)),
        None => return Err("the XML declaration must specify a version".to_string()),
    }
    if let Some(encoding) = attrs.get("encoding") {
        let supported = ["UTF-8", "UTF8", "US-ASCII", "ASCII"]
            .iter()
            .any(|e| e.eq_ignore_ascii_case(encoding));
        if !supported {
            return Err(format!("encoding \"{}\" is not supported; only UTF-8 is accepted", encoding));
        }
    }
    if let Some(name) = attrs
        .iter()
        .map(|a| a.qualified_name.as_str())
        .find(|n| !matches!(*n, "version" | "encoding" | "standalone"))
    {
        return Err(format!("unexpected \"{}\" in the XML declaration", name));
    }
    Ok(())
}

/// Finds the `>` closing a DOCTYPE, skipping quoted literals, the internal
/// subset and comments inside it. Positions are relative to the first byte
/// passed to `step`.
#[derive(Debug, Default)]
struct DoctypeScan {
    pos: usize,
    /// Last four bytes seen
    recent: u32,
    quote: Option<u8>,
    in_subset: bool,
    in_comment: bool,
    subset_start: Option<usize>,
    subset_end: Option<usize>,
}

impl DoctypeScan {
    fn step(&mut self, b: u8) -> bool {
        let pos = self.pos;
        self.pos += 1;
        self.recent = (self.recent << 8) | u32::from(b);

        if self.in_comment {
            if self.recent & 0x00FF_FFFF == u32::from_be_bytes([0, b'-', b'-', b'>']) {
                self.in_comment = false;
            }
            return false;
        }
        if let Some(q) = self.quote {
            if b == q {
                self.quote = None;
            }
            return false;
        }

        match b {
            b'"' | b'\'' => self.quote = Some(b),
            b'[' if self.subset_start.is_none() => {
                self.subset_start = Some(pos + 1);
                self.in_subset = true;
            }
            b']' if self.in_subset => {
                self.subset_end = Some(pos);
                self.in_subset = false;
            }
            b'-' if self.in_subset && self.recent == u32::from_be_bytes(*b"<!--") => {
                self.in_comment = true;
            }
            b'>' => return !self.in_subset,
            _ => {}
        }
        false
    }
}
