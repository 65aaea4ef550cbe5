//! Strict markup reader.
//!
//! [`parse_document`] turns repaired text into a [`Document`]. It performs
//! no repair of its own: anything that is not well formed is reported as a
//! [`ParseError`] carrying diagnostics with byte spans into the input.

use std::str;

use log::{debug, trace};
use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};

use mxmend_core::{document::Document, markup::Element};

use crate::{
    error::{Diagnostic, ErrorCode, ParseError},
    span::Span,
};

/// Parses `source` into a document.
///
/// # Errors
///
/// Returns a [`ParseError`] when the text is not a single well-formed
/// element tree.
///
/// # Examples
///
/// ```
/// # use mxmend_parser::reader::parse_document;
/// let document = parse_document(r#"<mxGraphModel><root><mxCell id="0"/></root></mxGraphModel>"#)
///     .expect("well-formed input");
/// assert_eq!(document.nodes().len(), 1);
///
/// let err = parse_document("<mxGraphModel><root></mxGraphModel>").unwrap_err();
/// assert!(err.to_string().starts_with("error[E102]"));
/// ```
pub fn parse_document(source: &str) -> Result<Document, ParseError> {
    let mut reader = Reader::from_str(source);
    reader.trim_text(true);
    reader.check_end_names(false);

    let mut buf = Vec::new();
    let mut open: Vec<(Element, Span)> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let start = reader.buffer_position();
        let event = reader.read_event_into(&mut buf);
        let span = event_span(source, start, reader.buffer_position());

        match event {
            Ok(Event::Start(tag)) => {
                let element = read_element(&tag, &reader, span)?;
                if open.is_empty() && root.is_some() {
                    return Err(content_after_root(span).into());
                }
                open.push((element, span));
            }
            Ok(Event::Empty(tag)) => {
                let element = read_element(&tag, &reader, span)?;
                attach(&mut open, &mut root, element, span)?;
            }
            Ok(Event::End(tag)) => {
                let name = decode_name(tag.name().as_ref(), span)?;
                let Some((element, opened)) = open.pop() else {
                    return Err(Diagnostic::error(format!("closing tag `</{name}>` has no open element"))
                        .with_code(ErrorCode::E108)
                        .with_label(span, "unexpected closing tag")
                        .into());
                };
                if element.name() != name {
                    return Err(Diagnostic::error(format!(
                        "closing tag `</{name}>` does not match `<{}>`",
                        element.name()
                    ))
                    .with_code(ErrorCode::E102)
                    .with_label(span, "unexpected closing tag")
                    .with_secondary_label(opened, "element opened here")
                    .with_help(format!(
                        "close `<{}>` before closing its parent",
                        element.name()
                    ))
                    .into());
                }
                attach(&mut open, &mut root, element, opened.union(span))?;
            }
            Ok(Event::Text(text)) => {
                let text = text.unescape().map_err(|err| invalid_entity(&err, span))?;
                push_text(&mut open, root.is_some(), text.into_owned(), span)?;
            }
            Ok(Event::CData(data)) => {
                let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
                push_text(&mut open, root.is_some(), text, span)?;
            }
            Ok(Event::Eof) => break,
            Ok(other) => trace!(event:? = other; "Skipping markup event"),
            Err(err) => {
                return Err(Diagnostic::error(format!("malformed markup: {err}"))
                    .with_code(ErrorCode::E100)
                    .with_label(span, "cannot read past this point")
                    .into());
            }
        }
        buf.clear();
    }

    if !open.is_empty() {
        let diagnostics = open
            .iter()
            .map(|(element, opened)| {
                Diagnostic::error(format!("element `<{}>` is never closed", element.name()))
                    .with_code(ErrorCode::E101)
                    .with_label(*opened, "opened here")
                    .with_help(format!("add `</{}>`", element.name()))
            })
            .collect();
        return Err(ParseError::new(diagnostics));
    }

    let root = root.ok_or_else(|| {
        Diagnostic::error("the input contains no element")
            .with_code(ErrorCode::E105)
            .with_label(Span::new(0..source.len()), "no element found")
    })?;
    debug!(root = root.name(); "Parsed document");
    Ok(Document::new(root))
}

/// Returns the span of an event, without the whitespace preceding it.
fn event_span(source: &str, start: usize, end: usize) -> Span {
    let leading = source
        .get(start..end)
        .map(|slice| slice.len() - slice.trim_start().len())
        .unwrap_or_default();
    Span::new(start + leading..end)
}

fn read_element(
    tag: &BytesStart<'_>,
    reader: &Reader<&[u8]>,
    span: Span,
) -> Result<Element, Diagnostic> {
    let mut element = Element::new(decode_name(tag.name().as_ref(), span)?);

    for attribute in tag.attributes() {
        let attribute = attribute.map_err(|err| {
            Diagnostic::error(format!("malformed attribute in `<{}>`: {err}", element.name()))
                .with_code(ErrorCode::E103)
                .with_label(span, "in this tag")
                .with_help("give every attribute exactly once, with a quoted value")
        })?;
        let key = decode_name(attribute.key.as_ref(), span)?;
        let value = attribute
            .decode_and_unescape_value(reader)
            .map_err(|err| invalid_entity(&err, span))?;
        element.set_attribute(key, value.into_owned());
    }

    Ok(element)
}

fn decode_name(bytes: &[u8], span: Span) -> Result<String, Diagnostic> {
    str::from_utf8(bytes).map(str::to_string).map_err(|err| {
        Diagnostic::error(format!("name is not valid UTF-8: {err}"))
            .with_code(ErrorCode::E107)
            .with_label(span, "in this tag")
    })
}

fn invalid_entity(err: &quick_xml::Error, span: Span) -> Diagnostic {
    Diagnostic::error(format!("invalid entity reference: {err}"))
        .with_code(ErrorCode::E104)
        .with_label(span, "in this text")
        .with_help("write a literal `&` as `&amp;`")
}

fn content_after_root(span: Span) -> Diagnostic {
    Diagnostic::error("content after the root element")
        .with_code(ErrorCode::E106)
        .with_label(span, "unexpected content")
        .with_help("a document has exactly one root element")
}

/// Adds a completed element to its parent, or makes it the root.
fn attach(
    open: &mut [(Element, Span)],
    root: &mut Option<Element>,
    element: Element,
    span: Span,
) -> Result<(), Diagnostic> {
    match open.last_mut() {
        Some((parent, _)) => parent.push_element(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(content_after_root(span)),
    }
    Ok(())
}

fn push_text(
    open: &mut [(Element, Span)],
    after_root: bool,
    text: String,
    span: Span,
) -> Result<(), Diagnostic> {
    match open.last_mut() {
        Some((parent, _)) => {
            parent.push_text(text);
            Ok(())
        }
        None if after_root => Err(content_after_root(span)),
        None => Err(Diagnostic::error("text before the root element")
            .with_code(ErrorCode::E100)
            .with_label(span, "unexpected text")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_code(source: &str) -> Option<ErrorCode> {
        parse_document(source)
            .expect_err("input should be rejected")
            .diagnostics()
            .first()
            .and_then(Diagnostic::code)
    }

    #[test]
    fn test_parses_nested_cells() {
        let source = r#"<?xml version="1.0"?>
<mxGraphModel dx="800">
  <!-- generated -->
  <root>
    <mxCell id="0"/>
    <mxCell id="1" parent="0"/>
    <mxCell id="2" value="A &amp; B" parent="1" vertex="1">
      <mxGeometry x="10" y="20" width="30" height="40" as="geometry"/>
    </mxCell>
  </root>
</mxGraphModel>"#;
        let document = parse_document(source).expect("valid document");

        assert_eq!(document.root().name(), "mxGraphModel");
        assert_eq!(document.root().attribute("dx"), Some("800"));
        let nodes = document.nodes();
        assert_eq!(nodes.len(), 3);
        assert_eq!(document.renderable_nodes().len(), 1);
        let cell = document.root().descendants("mxCell")[2];
        assert_eq!(cell.attribute("value"), Some("A & B"));
    }

    #[test]
    fn test_text_content_is_kept() {
        let document = parse_document("<a><b>x &lt; y</b><c><![CDATA[raw & text]]></c></a>")
            .expect("valid document");
        assert_eq!(
            document.to_string(),
            "<a>\n  <b>x &lt; y</b>\n  <c>raw &amp; text</c>\n</a>\n"
        );
    }

    #[test]
    fn test_mismatched_closing_tag() {
        let source = "<a><b></a>";
        let err = parse_document(source).expect_err("mismatch");
        let diagnostic = &err.diagnostics()[0];

        assert_eq!(diagnostic.code(), Some(ErrorCode::E102));
        assert_eq!(diagnostic.labels().len(), 2);
        assert_eq!(diagnostic.labels()[0].span(), Span::new(6..10));
        assert_eq!(diagnostic.labels()[1].span(), Span::new(3..6));
    }

    #[test]
    fn test_unexpected_closing_tag() {
        assert_eq!(first_code("</a>"), Some(ErrorCode::E108));
    }

    #[test]
    fn test_unquoted_attribute_is_rejected() {
        assert_eq!(first_code("<a x=1/>"), Some(ErrorCode::E103));
    }

    #[test]
    fn test_duplicate_attribute_is_rejected() {
        assert_eq!(first_code(r#"<a x="1" x="2"/>"#), Some(ErrorCode::E103));
    }

    #[test]
    fn test_bare_ampersand_is_rejected() {
        assert_eq!(first_code(r#"<a v="R&D"/>"#), Some(ErrorCode::E104));
    }

    #[test]
    fn test_missing_root() {
        assert_eq!(first_code(""), Some(ErrorCode::E105));
        assert_eq!(first_code("<?xml version=\"1.0\"?>"), Some(ErrorCode::E105));
    }

    #[test]
    fn test_second_root_is_rejected() {
        assert_eq!(first_code("<a/><b/>"), Some(ErrorCode::E106));
        assert_eq!(first_code("<a/><b></b>"), Some(ErrorCode::E106));
        assert_eq!(first_code("<a/>tail"), Some(ErrorCode::E106));
    }

    #[test]
    fn test_unclosed_elements_are_rejected() {
        assert!(parse_document("<a><b>").is_err());
    }
}
