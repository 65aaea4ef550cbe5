//! Diagram documents and their typed node view.
//!
//! A [`Document`] owns the markup tree of one diagram. Stages never share a
//! document: each one either reads it or hands back a new value. The typed
//! [`Node`] view is an owned snapshot taken from the tree on demand.
//!
//! # Overview
//!
//! - [`Document`] - The outer model element and everything below it
//! - [`Node`] - A snapshot of one `<mxCell>`
//! - [`NodeKind`] - Vertex, edge or structural container
//! - [`Geometry`] - The `(x, y, width, height)` tuple of a cell
//! - [`GeometryDefaults`] - Values filled in for missing geometry fields

use std::fmt;

use log::warn;
use serde::Deserialize;

use crate::{geometry::Bounds, markup::Element};

/// Tag name of the outer document element.
pub const MODEL_TAG: &str = "mxGraphModel";
/// Tag name of the container holding the top-level cells.
pub const CONTAINER_TAG: &str = "root";
/// Tag name of a diagram node.
pub const CELL_TAG: &str = "mxCell";
/// Tag name of a node's geometry.
pub const GEOMETRY_TAG: &str = "mxGeometry";
/// Value of the `as` attribute on a node's geometry.
pub const GEOMETRY_ROLE: &str = "geometry";

/// An opaque node identifier.
///
/// Identifiers are compared as strings. Numeric identifiers additionally
/// expose their integer value, which the merge stage uses for re-addressing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NodeId(String);

impl NodeId {
    /// Creates an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the integer value of a numeric identifier.
    pub fn as_number(&self) -> Option<i64> {
        self.0.parse().ok()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// The role a cell plays in the diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A directly rendered shape (`vertex="1"`).
    Vertex,
    /// A connector between shapes (`edge="1"`).
    Edge,
    /// A structural cell such as the root cell or a layer.
    Container,
}

impl NodeKind {
    /// Classifies a cell element by its flags.
    pub fn of(cell: &Element) -> Self {
        if cell.attribute("vertex") == Some("1") {
            NodeKind::Vertex
        } else if cell.attribute("edge") == Some("1") {
            NodeKind::Edge
        } else {
            NodeKind::Container
        }
    }
}

/// The rectangular placement of a node.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Geometry {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl Geometry {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Reads a geometry element.
    ///
    /// Missing or non-numeric fields read as zero.
    pub fn from_element(element: &Element) -> Self {
        let field = |key: &str| match element.attribute(key) {
            None => 0.0,
            Some(raw) => raw.trim().parse::<f64>().unwrap_or_else(|_| {
                warn!(field = key, value = raw; "Non-numeric geometry field, reading as 0");
                0.0
            }),
        };
        Self::new(field("x"), field("y"), field("width"), field("height"))
    }

    pub fn x(self) -> f64 {
        self.x
    }

    pub fn y(self) -> f64 {
        self.y
    }

    pub fn width(self) -> f64 {
        self.width
    }

    pub fn height(self) -> f64 {
        self.height
    }

    /// Returns the box covered by this geometry.
    pub fn bounds(self) -> Bounds {
        Bounds::new_from_top_left(self.x, self.y, self.width, self.height)
    }
}

/// Values inserted for geometry fields that a document leaves out.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct GeometryDefaults {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl Default for GeometryDefaults {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 50.0,
        }
    }
}

impl GeometryDefaults {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns every required geometry attribute with its default value,
    /// in the order they are appended to an incomplete element.
    pub fn required_attributes(&self) -> [(&'static str, String); 5] {
        [
            ("x", self.x.to_string()),
            ("y", self.y.to_string()),
            ("width", self.width.to_string()),
            ("height", self.height.to_string()),
            ("as", GEOMETRY_ROLE.to_string()),
        ]
    }

    /// Builds a geometry element carrying only default values.
    pub fn to_element(&self) -> Element {
        self.required_attributes()
            .into_iter()
            .fold(Element::new(GEOMETRY_TAG), |element, (key, value)| {
                element.with_attribute(key, value)
            })
    }
}

/// A snapshot of one diagram node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: NodeId,
    parent: Option<NodeId>,
    kind: NodeKind,
    style: Option<String>,
    geometry: Option<Geometry>,
}

impl Node {
    /// Reads a cell element. A cell without an `id` gets an empty identifier.
    pub fn from_cell(cell: &Element) -> Self {
        Self {
            id: NodeId::new(cell.attribute("id").unwrap_or_default()),
            parent: cell.attribute("parent").map(NodeId::from),
            kind: NodeKind::of(cell),
            style: cell.attribute("style").map(str::to_string),
            geometry: cell.child(GEOMETRY_TAG).map(Geometry::from_element),
        }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// Returns the containing node, or `None` for a root-level node.
    pub fn parent(&self) -> Option<&NodeId> {
        self.parent.as_ref()
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Returns the raw style string.
    pub fn style(&self) -> Option<&str> {
        self.style.as_deref()
    }

    pub fn geometry(&self) -> Option<Geometry> {
        self.geometry
    }

    /// Returns `true` for vertex nodes that carry geometry.
    pub fn is_renderable(&self) -> bool {
        self.kind == NodeKind::Vertex && self.geometry.is_some()
    }

    /// Returns the box of a node that carries geometry.
    pub fn bounds(&self) -> Option<Bounds> {
        self.geometry.map(Geometry::bounds)
    }
}

/// A diagram document.
///
/// # Examples
///
/// ```
/// # use mxmend_core::{document::Document, markup::Element};
/// let model = Element::new("mxGraphModel").with_child(
///     Element::new("root").with_child(
///         Element::new("mxCell")
///             .with_attribute("id", "2")
///             .with_attribute("vertex", "1")
///             .with_child(
///                 Element::new("mxGeometry")
///                     .with_attribute("x", "10")
///                     .with_attribute("y", "20")
///                     .with_attribute("width", "30")
///                     .with_attribute("height", "40"),
///             ),
///     ),
/// );
/// let document = Document::new(model);
///
/// let nodes = document.renderable_nodes();
/// assert_eq!(nodes.len(), 1);
/// assert_eq!(nodes[0].bounds().map(|b| b.bottom()), Some(60.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Element,
}

impl Document {
    /// Wraps an outer element as a document.
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    /// Returns the outer element.
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Returns the outer element mutably.
    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    /// Consumes the document, returning the outer element.
    pub fn into_root(self) -> Element {
        self.root
    }

    /// Returns the container holding the top-level cells.
    pub fn container(&self) -> Option<&Element> {
        self.root.child(CONTAINER_TAG)
    }

    /// Returns the container holding the top-level cells, mutably.
    pub fn container_mut(&mut self) -> Option<&mut Element> {
        self.root.child_mut(CONTAINER_TAG)
    }

    /// Returns a snapshot of every cell in document order.
    pub fn nodes(&self) -> Vec<Node> {
        self.root
            .descendants(CELL_TAG)
            .into_iter()
            .map(Node::from_cell)
            .collect()
    }

    /// Returns the cells that take part in spatial checks, in document order.
    pub fn renderable_nodes(&self) -> Vec<Node> {
        self.nodes()
            .into_iter()
            .filter(Node::is_renderable)
            .collect()
    }

    /// Visits every cell element mutably in document order.
    pub fn for_each_cell_mut<F>(&mut self, mut visit: F)
    where
        F: FnMut(&mut Element),
    {
        self.root.visit_mut(CELL_TAG, &mut visit);
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(id: &str) -> Element {
        Element::new(CELL_TAG).with_attribute("id", id)
    }

    fn geometry(x: &str, y: &str, width: &str, height: &str) -> Element {
        Element::new(GEOMETRY_TAG)
            .with_attribute("x", x)
            .with_attribute("y", y)
            .with_attribute("width", width)
            .with_attribute("height", height)
    }

    fn document() -> Document {
        Document::new(
            Element::new(MODEL_TAG).with_child(
                Element::new(CONTAINER_TAG)
                    .with_child(cell("0"))
                    .with_child(cell("1").with_attribute("parent", "0"))
                    .with_child(
                        cell("header")
                            .with_attribute("parent", "1")
                            .with_attribute("vertex", "1")
                            .with_attribute("style", "rounded=1;")
                            .with_child(geometry("0", "0", "200", "40")),
                    )
                    .with_child(
                        cell("link")
                            .with_attribute("parent", "1")
                            .with_attribute("edge", "1")
                            .with_child(Element::new(GEOMETRY_TAG).with_attribute("relative", "1")),
                    )
                    .with_child(
                        cell("ghost")
                            .with_attribute("parent", "1")
                            .with_attribute("vertex", "1"),
                    ),
            ),
        )
    }

    #[test]
    fn test_node_id_as_number() {
        assert_eq!(NodeId::from("42").as_number(), Some(42));
        assert_eq!(NodeId::from("-3").as_number(), Some(-3));
        assert_eq!(NodeId::from("nav").as_number(), None);
        assert_eq!(NodeId::from("1.5").as_number(), None);
    }

    #[test]
    fn test_node_kinds() {
        let kinds: Vec<_> = document().nodes().iter().map(Node::kind).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Container,
                NodeKind::Container,
                NodeKind::Vertex,
                NodeKind::Edge,
                NodeKind::Vertex,
            ]
        );
    }

    #[test]
    fn test_node_snapshot() {
        let nodes = document().nodes();
        let header = &nodes[2];
        assert_eq!(header.id().as_str(), "header");
        assert_eq!(header.parent().map(NodeId::as_str), Some("1"));
        assert_eq!(header.style(), Some("rounded=1;"));
        assert_eq!(header.geometry(), Some(Geometry::new(0.0, 0.0, 200.0, 40.0)));
        assert!(nodes[0].parent().is_none());
    }

    #[test]
    fn test_renderable_nodes_exclude_edges_and_missing_geometry() {
        let ids: Vec<_> = document()
            .renderable_nodes()
            .iter()
            .map(|node| node.id().to_string())
            .collect();
        assert_eq!(ids, vec!["header"]);
    }

    #[test]
    fn test_geometry_reads_missing_and_invalid_fields_as_zero() {
        let element = Element::new(GEOMETRY_TAG)
            .with_attribute("x", "12.5")
            .with_attribute("y", "abc");
        assert_eq!(
            Geometry::from_element(&element),
            Geometry::new(12.5, 0.0, 0.0, 0.0)
        );
    }

    #[test]
    fn test_default_geometry_element() {
        let element = GeometryDefaults::default().to_element();
        assert_eq!(
            element.to_string(),
            "<mxGeometry x=\"0\" y=\"0\" width=\"100\" height=\"50\" as=\"geometry\"/>\n"
        );
    }

    #[test]
    fn test_for_each_cell_mut_visits_in_order() {
        let mut document = document();
        let mut seen = Vec::new();
        document.for_each_cell_mut(|cell| {
            seen.push(cell.attribute("id").unwrap_or_default().to_string());
            cell.set_attribute("visited", "1");
        });
        assert_eq!(seen, vec!["0", "1", "header", "link", "ghost"]);
        assert!(
            document
                .root()
                .descendants(CELL_TAG)
                .iter()
                .all(|cell| cell.has_attribute("visited"))
        );
    }

    #[test]
    fn test_container_lookup() {
        let document = document();
        assert_eq!(
            document.container().map(Element::name),
            Some(CONTAINER_TAG)
        );
        assert!(Document::new(Element::new(MODEL_TAG)).container().is_none());
    }
}
