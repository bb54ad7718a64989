//! Fatal failures: one `io::Error` shape, no listener notification.

use std::cell::Cell;
use std::io::{self, Read};

use pretty_assertions::assert_eq;
use xml_dispatch::{
    Attributes, ParseError, ParserConfig, ParsingListener, TagHandler, ValidationError, XmlParser,
};

/// Counts listener notifications
struct Counter<'a>(&'a Cell<usize>);

impl ParsingListener for Counter<'_> {
    fn on_parsing_finished(&mut self) {
        self.0.set(self.0.get() + 1);
    }
}

struct Quiet;

impl TagHandler for Quiet {
    fn on_start(&mut self, _: &str, _: &str, _: &str, _: &Attributes) -> Result<(), ValidationError> {
        Ok(())
    }

    fn on_end(&mut self, _: &str, _: &str, _: &str) {}
}

/// Panics on start of the named element
struct PanicOn(&'static str);

impl TagHandler for PanicOn {
    fn on_start(&mut self, _: &str, _: &str, qname: &str, _: &Attributes) -> Result<(), ValidationError> {
        if qname == self.0 {
            panic!("cannot handle <{}>", qname);
        }
        Ok(())
    }

    fn on_end(&mut self, _: &str, _: &str, _: &str) {}
}

fn parse_counting(parser: &mut XmlParser<'_>, xml: &str) -> io::Result<()> {
    parser.parse(xml.as_bytes())
}

#[test]
fn test_unclosed_element_fails_without_notification() {
    let finished = Cell::new(0);
    let mut parser = XmlParser::new();
    parser.register_handler(Quiet);
    parser.register_listener(Counter(&finished));

    let err = parse_counting(&mut parser, "<root><a></root>").unwrap_err();

    assert_eq!(err.kind(), io::ErrorKind::Other);
    assert!(matches!(ParseError::from_io(&err), Some(ParseError::Syntax(_))));
    assert!(err.to_string().contains("must be terminated by the matching end tag"));
    assert_eq!(finished.get(), 0);
}

#[test]
fn test_truncated_document_fails() {
    let finished = Cell::new(0);
    let mut parser = XmlParser::new();
    parser.register_listener(Counter(&finished));

    let err = parse_counting(&mut parser, "<root><task>").unwrap_err();
    match ParseError::from_io(&err) {
        Some(ParseError::Syntax(syntax)) => {
            assert_eq!(syntax.message, "element <task> is not closed");
            assert_eq!(syntax.location.line, 1);
        }
        other => panic!("expected a syntax error, got {:?}", other),
    }
    assert_eq!(finished.get(), 0);
}

#[test]
fn test_syntax_errors_are_categorised() {
    for xml in ["", "<a>", "<a></b>", "<a/><b/>", "<a x=1/>", "<a>&undefined;</a>", "text"] {
        let err = XmlParser::new().parse(xml.as_bytes()).unwrap_err();
        assert!(
            matches!(ParseError::from_io(&err), Some(ParseError::Syntax(_))),
            "{:?} gave {:?}",
            xml,
            err
        );
    }
}

#[test]
fn test_configuration_error() {
    let finished = Cell::new(0);
    let mut parser = XmlParser::with_config(ParserConfig::new().buffer_size(0));
    parser.register_listener(Counter(&finished));

    let err = parse_counting(&mut parser, "<a/>").unwrap_err();

    assert_eq!(err.kind(), io::ErrorKind::Other);
    assert_eq!(
        ParseError::from_io(&err),
        Some(&ParseError::Configuration("buffer size must be greater than zero".to_string()))
    );
    assert_eq!(err.to_string(), "buffer size must be greater than zero");
    assert_eq!(finished.get(), 0);
}

#[test]
fn test_panicking_handler_is_a_fault() {
    let finished = Cell::new(0);
    let mut parser = XmlParser::new();
    parser.register_handler(PanicOn("task"));
    parser.register_listener(Counter(&finished));

    let err = parse_counting(&mut parser, "<project><task/></project>").unwrap_err();

    match ParseError::from_io(&err) {
        Some(ParseError::Fault(message)) => assert!(message.contains("cannot handle <task>"), "{}", message),
        other => panic!("expected a fault, got {:?}", other),
    }
    assert_eq!(finished.get(), 0);
}

#[test]
fn test_panicking_listener_is_a_fault() {
    struct Explodes;

    impl ParsingListener for Explodes {
        fn on_parsing_finished(&mut self) {
            panic!("listener failed");
        }
    }

    let mut parser = XmlParser::new();
    parser.register_listener(Explodes);

    let err = parser.parse(&b"<a/>"[..]).unwrap_err();
    assert!(matches!(ParseError::from_io(&err), Some(ParseError::Fault(_))));
}

#[test]
fn test_failed_parse_does_not_leak_into_next() {
    let finished = Cell::new(0);
    let mut parser = XmlParser::new();
    parser.register_handler(Quiet);
    parser.register_listener(Counter(&finished));

    assert!(parse_counting(&mut parser, "<root><a>").is_err());
    parse_counting(&mut parser, "<root><a/></root>").unwrap();

    assert_eq!(finished.get(), 1);
}

/// Delivers its data, then fails
struct BrokenStream {
    data: &'static [u8],
}

impl Read for BrokenStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.data.is_empty() {
            return Err(io::Error::new(io::ErrorKind::ConnectionReset, "peer went away"));
        }
        let n = buf.len().min(self.data.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}

#[test]
fn test_stream_errors_pass_through() {
    let finished = Cell::new(0);
    let mut parser = XmlParser::new();
    parser.register_listener(Counter(&finished));

    let err = parser
        .parse(BrokenStream {
            data: b"<project><task>",
        })
        .unwrap_err();

    assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
    assert_eq!(err.to_string(), "peer went away");
    assert!(ParseError::from_io(&err).is_none());
    assert_eq!(finished.get(), 0);
}

#[test]
fn test_cdata_end_in_text_fails_at_every_buffer_size() {
    let xml = format!("<a>xxxxxx]]>{}</a>", "y".repeat(12));
    for size in 1..=12 {
        let finished = Cell::new(0);
        let mut parser = XmlParser::with_config(ParserConfig::new().buffer_size(size));
        parser.register_handler(Quiet);
        parser.register_listener(Counter(&finished));

        let err = parse_counting(&mut parser, &xml).unwrap_err();
        assert!(
            matches!(ParseError::from_io(&err), Some(ParseError::Syntax(_))),
            "buffer size {} gave {:?}",
            size,
            err
        );
        assert_eq!(finished.get(), 0, "buffer size {}", size);
    }
}
