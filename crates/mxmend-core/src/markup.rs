//! Owned markup tree.
//!
//! [`Element`] is the in-memory form of a parsed document. Attribute order is
//! preserved so that a document survives a parse/serialize cycle without
//! spurious reordering, and serialization always produces well-formed markup
//! regardless of what the attribute values contain.

use std::{borrow::Cow, fmt};

use indexmap::IndexMap;
use quick_xml::escape::escape;

/// A child of an [`Element`].
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Element(Element),
    Text(String),
}

/// A markup element with ordered attributes and children.
///
/// # Examples
///
/// ```
/// # use mxmend_core::markup::Element;
/// let cell = Element::new("mxCell")
///     .with_attribute("id", "2")
///     .with_attribute("value", "a < b");
///
/// assert_eq!(cell.attribute("id"), Some("2"));
/// assert_eq!(cell.to_string(), "<mxCell id=\"2\" value=\"a &lt; b\"/>\n");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    name: String,
    attributes: IndexMap<String, String>,
    children: Vec<Content>,
}

impl Element {
    /// Creates an element with no attributes and no children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Adds an attribute (builder style).
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(key, value);
        self
    }

    /// Adds a child element (builder style).
    pub fn with_child(mut self, child: Element) -> Self {
        self.push_element(child);
        self
    }

    /// Returns the tag name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the value of an attribute, if present.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Returns `true` if the attribute is present.
    pub fn has_attribute(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    /// Iterates over attributes in document order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Sets an attribute, returning the previous value.
    ///
    /// An existing attribute keeps its position; a new one is appended.
    pub fn set_attribute(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Option<String> {
        self.attributes.insert(key.into(), value.into())
    }

    /// Returns all children.
    pub fn children(&self) -> &[Content] {
        &self.children
    }

    /// Appends a child.
    pub fn push_child(&mut self, child: Content) {
        self.children.push(child);
    }

    /// Appends a child element.
    pub fn push_element(&mut self, child: Element) {
        self.children.push(Content::Element(child));
    }

    /// Appends a text node.
    pub fn push_text(&mut self, text: impl Into<String>) {
        self.children.push(Content::Text(text.into()));
    }

    /// Iterates over child elements, skipping text.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|child| match child {
            Content::Element(element) => Some(element),
            Content::Text(_) => None,
        })
    }

    /// Iterates mutably over child elements, skipping text.
    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|child| match child {
            Content::Element(element) => Some(element),
            Content::Text(_) => None,
        })
    }

    /// Returns the first child element with the given name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|element| element.name == name)
    }

    /// Returns the first child element with the given name, mutably.
    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.elements_mut().find(|element| element.name == name)
    }

    /// Collects every descendant with the given name in depth-first document
    /// order. The element itself is included when its name matches.
    pub fn descendants(&self, name: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        self.collect_descendants(name, &mut found);
        found
    }

    fn collect_descendants<'a>(&'a self, name: &str, found: &mut Vec<&'a Element>) {
        if self.name == name {
            found.push(self);
        }
        for child in self.elements() {
            child.collect_descendants(name, found);
        }
    }

    /// Visits every descendant with the given name in depth-first document
    /// order, including the element itself.
    pub fn visit_mut<F>(&mut self, name: &str, visit: &mut F)
    where
        F: FnMut(&mut Element),
    {
        if self.name == name {
            visit(self);
        }
        for child in self.elements_mut() {
            child.visit_mut(name, visit);
        }
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        write!(f, "{indent}<{}", self.name)?;
        for (key, value) in &self.attributes {
            write!(f, " {key}=\"{}\"", escape_attribute(value))?;
        }

        match self.children.as_slice() {
            [] => writeln!(f, "/>"),
            [Content::Text(text)] => writeln!(f, ">{}</{}>", escape(text), self.name),
            children => {
                writeln!(f, ">")?;
                for child in children {
                    match child {
                        Content::Element(element) => element.write_indented(f, depth + 1)?,
                        Content::Text(text) => writeln!(f, "{indent}  {}", escape(text))?,
                    }
                }
                writeln!(f, "{indent}</{}>", self.name)
            }
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

/// Escapes an attribute value, including whitespace that attribute-value
/// normalization would otherwise fold into spaces on the next read.
fn escape_attribute(value: &str) -> Cow<'_, str> {
    let escaped = escape(value);
    if !escaped.contains(['\n', '\r', '\t']) {
        return escaped;
    }
    Cow::Owned(
        escaped
            .replace('\n', "&#xa;")
            .replace('\r', "&#xd;")
            .replace('\t', "&#x9;"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Element {
        Element::new("mxGraphModel").with_child(
            Element::new("root")
                .with_child(Element::new("mxCell").with_attribute("id", "0"))
                .with_child(
                    Element::new("mxCell")
                        .with_attribute("id", "1")
                        .with_attribute("parent", "0")
                        .with_child(Element::new("mxGeometry").with_attribute("x", "5")),
                ),
        )
    }

    #[test]
    fn test_attribute_order_is_preserved() {
        let element = Element::new("a")
            .with_attribute("z", "1")
            .with_attribute("a", "2")
            .with_attribute("m", "3");
        let keys: Vec<_> = element.attributes().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_set_attribute_keeps_position() {
        let mut element = Element::new("a")
            .with_attribute("x", "1")
            .with_attribute("y", "2");
        let previous = element.set_attribute("x", "10");
        assert_eq!(previous.as_deref(), Some("1"));
        assert_eq!(element.to_string(), "<a x=\"10\" y=\"2\"/>\n");
    }

    #[test]
    fn test_descendants_in_document_order() {
        let model = sample();
        let ids: Vec<_> = model
            .descendants("mxCell")
            .into_iter()
            .filter_map(|cell| cell.attribute("id"))
            .collect();
        assert_eq!(ids, vec!["0", "1"]);
    }

    #[test]
    fn test_visit_mut_reaches_nested_elements() {
        let mut model = sample();
        model.visit_mut("mxGeometry", &mut |geometry: &mut Element| {
            geometry.set_attribute("y", "7");
        });
        let geometry = model.descendants("mxGeometry")[0];
        assert_eq!(geometry.attribute("y"), Some("7"));
    }

    #[test]
    fn test_display_nests_children() {
        let expected = "\
<mxGraphModel>
  <root>
    <mxCell id=\"0\"/>
    <mxCell id=\"1\" parent=\"0\">
      <mxGeometry x=\"5\"/>
    </mxCell>
  </root>
</mxGraphModel>
";
        assert_eq!(sample().to_string(), expected);
    }

    #[test]
    fn test_display_escapes_special_characters() {
        let element = Element::new("mxCell")
            .with_attribute("value", "Tom & \"Jerry\"\nline")
            .with_child(Element::new("note"));
        let rendered = element.to_string();
        assert!(rendered.contains("value=\"Tom &amp; &quot;Jerry&quot;&#xa;line\""));
    }

    #[test]
    fn test_display_inlines_single_text_child() {
        let mut element = Element::new("label");
        element.push_text("a < b");
        assert_eq!(element.to_string(), "<label>a &lt; b</label>\n");
    }
}
