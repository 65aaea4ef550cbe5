//! Spatial checks on a sanitized document.
//!
//! Only renderable nodes take part: vertex cells that carry geometry. Three
//! rule families apply, in this order:
//!
//! 1. **Collisions** - no two boxes may overlap.
//! 2. **Vertical flow** - sorting the boxes by their top edge must not change
//!    their document order.
//! 3. **Semantic zones** - a node whose id names a zone keyword must have its
//!    vertical midpoint inside that zone's band of the canvas.

use log::{debug, info};
use serde::Deserialize;
use thiserror::Error;

use mxmend_core::document::{Document, Node, NodeId};

/// A rule placing nodes whose id contains `keyword` in a vertical band.
///
/// The band is given as fractions of the canvas height, both inclusive. A
/// missing bound leaves that side of the band open.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ZoneRule {
    keyword: String,
    #[serde(default)]
    min_fraction: Option<f64>,
    #[serde(default)]
    max_fraction: Option<f64>,
}

impl ZoneRule {
    pub fn new(
        keyword: impl Into<String>,
        min_fraction: Option<f64>,
        max_fraction: Option<f64>,
    ) -> Self {
        Self {
            keyword: keyword.into(),
            min_fraction,
            max_fraction,
        }
    }

    /// A band with only an upper bound.
    pub fn at_most(keyword: impl Into<String>, max_fraction: f64) -> Self {
        Self::new(keyword, None, Some(max_fraction))
    }

    /// A band with only a lower bound.
    pub fn at_least(keyword: impl Into<String>, min_fraction: f64) -> Self {
        Self::new(keyword, Some(min_fraction), None)
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn min_fraction(&self) -> Option<f64> {
        self.min_fraction
    }

    pub fn max_fraction(&self) -> Option<f64> {
        self.max_fraction
    }

    /// Returns `true` if the lower-cased `id` contains this rule's keyword.
    fn applies_to(&self, id: &str) -> bool {
        id.to_lowercase().contains(&self.keyword.to_lowercase())
    }

    fn contains(&self, midpoint: f64, canvas_height: f64) -> bool {
        let fraction = midpoint / canvas_height;
        self.min_fraction.is_none_or(|min| min <= fraction)
            && self.max_fraction.is_none_or(|max| fraction <= max)
    }
}

fn describe_band(min_fraction: &Option<f64>, max_fraction: &Option<f64>) -> String {
    match (min_fraction, max_fraction) {
        (Some(min), Some(max)) => format!("{min}..={max}"),
        (Some(min), None) => format!("{min}.."),
        (None, Some(max)) => format!("..={max}"),
        (None, None) => "..".to_string(),
    }
}

/// Settings for [`Validator`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ValidateConfig {
    /// Zone rules, tried in order. The first one matching a node applies.
    zones: Vec<ZoneRule>,
}

impl Default for ValidateConfig {
    fn default() -> Self {
        Self {
            zones: vec![
                ZoneRule::at_most("nav", 0.10),
                ZoneRule::new("modal", Some(0.30), Some(0.70)),
                ZoneRule::at_least("foot", 0.90),
            ],
        }
    }
}

impl ValidateConfig {
    pub fn new(zones: Vec<ZoneRule>) -> Self {
        Self { zones }
    }

    pub fn zones(&self) -> &[ZoneRule] {
        &self.zones
    }
}

/// A broken spatial rule.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Violation {
    #[error("element `{first}` overlaps with `{second}`")]
    Collision { first: NodeId, second: NodeId },

    #[error("element `{found}` appears before `{expected}`")]
    FlowOrder {
        /// Index into the document-ordered renderable nodes.
        position: usize,
        /// The node at `position` in document order.
        found: NodeId,
        /// The node that belongs at `position` in top-down order.
        expected: NodeId,
    },

    #[error(
        "element `{id}` is outside the `{zone}` zone: midpoint {midpoint} of canvas height {canvas_height} is not within {}",
        describe_band(.min_fraction, .max_fraction)
    )]
    Zone {
        id: NodeId,
        zone: String,
        min_fraction: Option<f64>,
        max_fraction: Option<f64>,
        midpoint: f64,
        canvas_height: f64,
    },
}

/// Every defect found in one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefectReport {
    /// Every overlapping pair, in document order.
    pub collisions: Vec<Violation>,
    /// The first position where document order and top-down order differ.
    pub flow: Option<Violation>,
    /// Every node outside its zone, in document order.
    pub zones: Vec<Violation>,
}

impl DefectReport {
    /// Returns `true` if no rule is broken.
    pub fn is_clean(&self) -> bool {
        self.collisions.is_empty() && self.flow.is_none() && self.zones.is_empty()
    }

    /// Iterates over all violations, collisions first.
    pub fn violations(&self) -> impl Iterator<Item = &Violation> {
        self.collisions
            .iter()
            .chain(self.flow.iter())
            .chain(self.zones.iter())
    }

    /// Returns the total number of violations.
    pub fn len(&self) -> usize {
        self.collisions.len() + usize::from(self.flow.is_some()) + self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.is_clean()
    }
}

/// Checks the spatial rules of a document.
///
/// # Examples
///
/// ```
/// # use mxmend::validate::{Validator, Violation};
/// # use mxmend_parser::reader::parse_document;
/// let document = parse_document(r#"<mxGraphModel><root>
///     <mxCell id="a" vertex="1"><mxGeometry x="0" y="0" width="100" height="50"/></mxCell>
///     <mxCell id="b" vertex="1"><mxGeometry x="50" y="25" width="100" height="50"/></mxCell>
/// </root></mxGraphModel>"#).expect("well formed");
///
/// let violation = Validator::default().validate(&document).unwrap_err();
/// assert_eq!(violation.to_string(), "element `a` overlaps with `b`");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidateConfig,
}

impl Validator {
    pub fn new(config: ValidateConfig) -> Self {
        Self { config }
    }

    /// Returns the first broken rule.
    ///
    /// # Errors
    ///
    /// Collisions are checked first, then vertical flow, then zones. The
    /// first violation found is returned.
    pub fn validate(&self, document: &Document) -> Result<(), Violation> {
        let nodes = document.renderable_nodes();
        debug!(nodes = nodes.len(); "Validating document");

        if let Some(collision) = collisions(&nodes).next() {
            return Err(collision);
        }
        if let Some(flow) = flow_violation(&nodes) {
            return Err(flow);
        }
        if let Some(zone) = self.zone_violations(&nodes).next() {
            return Err(zone);
        }
        Ok(())
    }

    /// Collects every broken rule instead of stopping at the first one.
    pub fn report(&self, document: &Document) -> DefectReport {
        let nodes = document.renderable_nodes();
        let report = DefectReport {
            collisions: collisions(&nodes).collect(),
            flow: flow_violation(&nodes),
            zones: self.zone_violations(&nodes).collect(),
        };
        info!(
            nodes = nodes.len(),
            collisions = report.collisions.len(),
            flow = report.flow.is_some(),
            zones = report.zones.len();
            "Validated document"
        );
        report
    }

    fn zone_violations<'a>(&'a self, nodes: &'a [Node]) -> impl Iterator<Item = Violation> + 'a {
        let canvas_height = nodes
            .iter()
            .filter_map(Node::bounds)
            .map(|bounds| bounds.bottom())
            .fold(0.0_f64, f64::max);
        if canvas_height <= 0.0 {
            debug!("Canvas has no height, skipping zone checks");
        }

        nodes
            .iter()
            .filter(move |_| canvas_height > 0.0)
            .filter_map(move |node| {
                let bounds = node.bounds()?;
                let rule = self
                    .config
                    .zones
                    .iter()
                    .find(|rule| rule.applies_to(node.id().as_str()))?;
                let midpoint = bounds.mid_y();
                (!rule.contains(midpoint, canvas_height)).then(|| Violation::Zone {
                    id: node.id().clone(),
                    zone: rule.keyword.clone(),
                    min_fraction: rule.min_fraction,
                    max_fraction: rule.max_fraction,
                    midpoint,
                    canvas_height,
                })
            })
    }
}

/// Yields every overlapping pair `(i, j)` with `i < j` in document order.
fn collisions(nodes: &[Node]) -> impl Iterator<Item = Violation> + '_ {
    nodes.iter().enumerate().flat_map(move |(i, first)| {
        nodes[i + 1..].iter().filter_map(move |second| {
            let (a, b) = (first.bounds()?, second.bounds()?);
            a.overlaps(&b).then(|| Violation::Collision {
                first: first.id().clone(),
                second: second.id().clone(),
            })
        })
    })
}

fn flow_violation(nodes: &[Node]) -> Option<Violation> {
    let mut sorted: Vec<&Node> = nodes.iter().collect();
    sorted.sort_by(|a, b| top(a).total_cmp(&top(b)));

    nodes
        .iter()
        .zip(sorted)
        .enumerate()
        .find(|(_, (actual, expected))| actual.id() != expected.id())
        .map(|(position, (actual, expected))| Violation::FlowOrder {
            position,
            found: actual.id().clone(),
            expected: expected.id().clone(),
        })
}

fn top(node: &Node) -> f64 {
    node.bounds().map(|bounds| bounds.top()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use mxmend_core::markup::Element;

    use super::*;

    fn vertex(id: &str, x: f64, y: f64, width: f64, height: f64) -> Element {
        Element::new("mxCell")
            .with_attribute("id", id)
            .with_attribute("vertex", "1")
            .with_child(
                Element::new("mxGeometry")
                    .with_attribute("x", x.to_string())
                    .with_attribute("y", y.to_string())
                    .with_attribute("width", width.to_string())
                    .with_attribute("height", height.to_string()),
            )
    }

    fn document(cells: Vec<Element>) -> Document {
        let container = cells
            .into_iter()
            .fold(Element::new("root"), |container, cell| container.with_child(cell));
        Document::new(Element::new("mxGraphModel").with_child(container))
    }

    #[test]
    fn test_clean_document() {
        let document = document(vec![
            vertex("header", 0.0, 0.0, 100.0, 50.0),
            vertex("body", 0.0, 60.0, 100.0, 50.0),
        ]);
        assert_eq!(Validator::default().validate(&document), Ok(()));
        assert!(Validator::default().report(&document).is_clean());
    }

    #[test]
    fn test_touching_edges_do_not_collide() {
        let document = document(vec![
            vertex("a", 0.0, 0.0, 100.0, 50.0),
            vertex("b", 100.0, 0.0, 100.0, 50.0),
            vertex("c", 0.0, 50.0, 100.0, 50.0),
        ]);
        assert!(Validator::default().report(&document).collisions.is_empty());
    }

    #[test]
    fn test_collision_is_reported_in_document_order() {
        let document = document(vec![
            vertex("a", 0.0, 0.0, 100.0, 50.0),
            vertex("b", 50.0, 25.0, 100.0, 50.0),
        ]);
        assert_eq!(
            Validator::default().validate(&document),
            Err(Violation::Collision {
                first: NodeId::new("a"),
                second: NodeId::new("b"),
            })
        );
    }

    #[test]
    fn test_collision_takes_precedence_over_flow() {
        let document = document(vec![
            vertex("low", 0.0, 100.0, 50.0, 50.0),
            vertex("a", 200.0, 0.0, 100.0, 50.0),
            vertex("b", 250.0, 25.0, 100.0, 50.0),
        ]);
        assert!(matches!(
            Validator::default().validate(&document),
            Err(Violation::Collision { .. })
        ));
    }

    #[test]
    fn test_flow_order() {
        let document = document(vec![
            vertex("a", 0.0, 100.0, 50.0, 50.0),
            vertex("b", 200.0, 0.0, 50.0, 50.0),
        ]);
        let violation = Validator::default().validate(&document).unwrap_err();

        assert_eq!(
            violation,
            Violation::FlowOrder {
                position: 0,
                found: NodeId::new("a"),
                expected: NodeId::new("b"),
            }
        );
        assert_eq!(violation.to_string(), "element `a` appears before `b`");
    }

    #[test]
    fn test_equal_tops_keep_document_order() {
        let document = document(vec![
            vertex("b", 200.0, 0.0, 50.0, 50.0),
            vertex("a", 0.0, 0.0, 50.0, 50.0),
        ]);
        assert!(Validator::default().report(&document).flow.is_none());
    }

    #[test]
    fn test_zone_boundary_is_inclusive() {
        // Canvas height 1000; the navbar midpoint sits exactly at 10%.
        let document = document(vec![
            vertex("content", 200.0, 0.0, 100.0, 1000.0),
            vertex("navbar", 0.0, 80.0, 100.0, 40.0),
        ]);
        assert!(Validator::default().report(&document).zones.is_empty());
    }

    #[test]
    fn test_zone_violation_just_past_boundary() {
        let document = document(vec![
            vertex("content", 200.0, 0.0, 100.0, 1000.0),
            vertex("navbar", 0.0, 80.2, 100.0, 40.0),
        ]);
        let report = Validator::default().report(&document);

        assert_eq!(report.zones.len(), 1);
        let Violation::Zone {
            id,
            zone,
            canvas_height,
            ..
        } = &report.zones[0]
        else {
            panic!("expected a zone violation, got {:?}", report.zones[0]);
        };
        assert_eq!(id.as_str(), "navbar");
        assert_eq!(zone, "nav");
        assert_eq!(*canvas_height, 1000.0);
    }

    #[test]
    fn test_zone_keyword_is_case_insensitive() {
        let document = document(vec![
            vertex("Page", 200.0, 0.0, 100.0, 1000.0),
            vertex("SiteFooter", 0.0, 100.0, 100.0, 40.0),
        ]);
        let report = Validator::default().report(&document);
        assert_eq!(report.zones.len(), 1);
    }

    #[test]
    fn test_navbar_above_canvas_origin_is_in_zone() {
        let document = document(vec![
            vertex("navbar", 0.0, -40.0, 100.0, 40.0),
            vertex("content", 0.0, 0.0, 100.0, 1000.0),
        ]);
        assert_eq!(Validator::default().validate(&document), Ok(()));
    }

    #[test]
    fn test_open_band_in_zone_message() {
        let document = document(vec![
            vertex("content", 200.0, 0.0, 100.0, 1000.0),
            vertex("footer", 0.0, 500.0, 100.0, 100.0),
        ]);
        let violation = Validator::default().validate(&document).unwrap_err();

        assert_eq!(
            violation,
            Violation::Zone {
                id: NodeId::new("footer"),
                zone: "foot".to_string(),
                min_fraction: Some(0.9),
                max_fraction: None,
                midpoint: 550.0,
                canvas_height: 1000.0,
            }
        );
        assert_eq!(
            violation.to_string(),
            "element `footer` is outside the `foot` zone: midpoint 550 of canvas height 1000 is not within 0.9.."
        );
    }

    #[test]
    fn test_first_matching_rule_applies() {
        // "navmodal" matches "nav" first, so the modal band is never checked.
        let document = document(vec![
            vertex("page", 200.0, 0.0, 100.0, 1000.0),
            vertex("navmodal", 0.0, 0.0, 100.0, 40.0),
        ]);
        assert!(Validator::default().report(&document).zones.is_empty());
    }

    #[test]
    fn test_zero_height_canvas_skips_zones() {
        let document = document(vec![vertex("footer", 0.0, 0.0, 100.0, 0.0)]);
        assert_eq!(Validator::default().validate(&document), Ok(()));
    }

    #[test]
    fn test_custom_zone_rules() {
        let validator = Validator::new(ValidateConfig::new(vec![ZoneRule::new(
            "hero",
            Some(0.0),
            Some(0.5),
        )]));
        let document = document(vec![
            vertex("page", 200.0, 0.0, 100.0, 1000.0),
            vertex("hero", 0.0, 800.0, 100.0, 100.0),
        ]);
        assert!(matches!(
            validator.validate(&document),
            Err(Violation::Zone { .. })
        ));
    }

    #[test]
    fn test_report_collects_every_collision() {
        let document = document(vec![
            vertex("a", 0.0, 0.0, 100.0, 100.0),
            vertex("b", 10.0, 10.0, 100.0, 100.0),
            vertex("c", 20.0, 20.0, 100.0, 100.0),
        ]);
        let report = Validator::default().report(&document);

        let pairs: Vec<_> = report
            .collisions
            .iter()
            .map(|violation| match violation {
                Violation::Collision { first, second } => (first.as_str(), second.as_str()),
                other => panic!("unexpected violation {other:?}"),
            })
            .collect();
        assert_eq!(pairs, vec![("a", "b"), ("a", "c"), ("b", "c")]);
        assert_eq!(report.len(), 3);
    }

    #[test]
    fn test_edges_and_geometry_less_cells_are_ignored() {
        let edge = Element::new("mxCell")
            .with_attribute("id", "e")
            .with_attribute("edge", "1")
            .with_child(
                Element::new("mxGeometry")
                    .with_attribute("width", "500")
                    .with_attribute("height", "500"),
            );
        let bare = Element::new("mxCell")
            .with_attribute("id", "bare")
            .with_attribute("vertex", "1");
        let document = document(vec![vertex("a", 0.0, 0.0, 100.0, 100.0), edge, bare]);
        assert!(Validator::default().report(&document).is_clean());
    }
}
