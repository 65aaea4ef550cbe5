//! Pushing overlapping nodes apart.
//!
//! The resolver only ever moves nodes down. Boxes are visited top to bottom
//! and each one is moved below any earlier box it overlaps, leaving a fixed
//! margin. Horizontal position and size are never changed.

use log::{debug, info, warn};
use serde::Deserialize;

use mxmend_core::{
    document::{Document, GEOMETRY_TAG, NodeId, NodeKind},
    geometry::Bounds,
    markup::Element,
};

/// Settings for [`Resolver`].
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ResolveConfig {
    /// Vertical gap left between a moved box and the box it was moved past.
    margin: f64,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self { margin: 10.0 }
    }
}

impl ResolveConfig {
    pub fn new(margin: f64) -> Self {
        Self { margin }
    }

    pub fn margin(&self) -> f64 {
        self.margin
    }
}

/// The net vertical move of one node.
#[derive(Debug, Clone, PartialEq)]
pub struct Move {
    pub id: NodeId,
    pub from_y: f64,
    pub to_y: f64,
}

/// A resolved copy of a document and the moves that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub document: Document,
    /// One entry per moved node, in document order.
    pub moves: Vec<Move>,
}

/// Removes overlaps by moving nodes down.
///
/// # Examples
///
/// ```
/// # use mxmend::resolve::Resolver;
/// # use mxmend_parser::reader::parse_document;
/// let document = parse_document(r#"<mxGraphModel><root>
///     <mxCell id="a" vertex="1"><mxGeometry x="0" y="0" width="100" height="50"/></mxCell>
///     <mxCell id="b" vertex="1"><mxGeometry x="50" y="25" width="100" height="50"/></mxCell>
/// </root></mxGraphModel>"#).expect("well formed");
///
/// let resolved = Resolver::new(10.0).resolve(&document);
/// let b = &resolved.document.renderable_nodes()[1];
/// assert_eq!(b.geometry().map(|g| g.y()), Some(60.0));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Resolver {
    margin: f64,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(ResolveConfig::default().margin())
    }
}

impl Resolver {
    /// Creates a resolver. A negative or non-numeric margin is treated as zero.
    pub fn new(margin: f64) -> Self {
        let margin = if margin >= 0.0 {
            margin
        } else {
            warn!(margin; "Invalid resolve margin, using 0");
            0.0
        };
        Self { margin }
    }

    pub fn margin(&self) -> f64 {
        self.margin
    }

    /// Returns a copy of `document` in which no two renderable nodes overlap.
    pub fn resolve(&self, document: &Document) -> Resolved {
        let nodes = document.renderable_nodes();

        // (document index, current bounds), visited top to bottom
        let mut boxes: Vec<(usize, Bounds)> = nodes
            .iter()
            .enumerate()
            .filter_map(|(index, node)| Some((index, node.bounds()?)))
            .collect();
        boxes.sort_by(|(_, a), (_, b)| a.top().total_cmp(&b.top()));

        for i in 0..boxes.len() {
            // Restart the scan after every move so that the box ends up clear
            // of every earlier one. Each earlier box can push it at most once.
            while let Some(j) = (0..i).find(|&j| boxes[j].1.overlaps(&boxes[i].1)) {
                let target = boxes[j].1.bottom() + self.margin;
                debug!(
                    id = nodes[boxes[i].0].id().as_str(),
                    past = nodes[boxes[j].0].id().as_str(),
                    from = boxes[i].1.top(),
                    to = target;
                    "Moving node down"
                );
                boxes[i].1 = boxes[i].1.with_top(target);
            }
        }

        let mut tops = vec![None; nodes.len()];
        for (index, bounds) in &boxes {
            tops[*index] = Some(bounds.top());
        }

        let moves: Vec<Move> = nodes
            .iter()
            .zip(&tops)
            .filter_map(|(node, top)| {
                let from_y = node.bounds()?.top();
                let to_y = (*top)?;
                (to_y != from_y).then(|| Move {
                    id: node.id().clone(),
                    from_y,
                    to_y,
                })
            })
            .collect();

        let mut resolved = document.clone();
        let mut position = 0;
        resolved.for_each_cell_mut(|cell: &mut Element| {
            if NodeKind::of(cell) != NodeKind::Vertex {
                return;
            }
            let Some(geometry) = cell.child_mut(GEOMETRY_TAG) else {
                return;
            };
            let original = nodes.get(position).and_then(|node| node.bounds()).map(Bounds::top);
            match tops.get(position) {
                Some(Some(top)) if original != Some(*top) => {
                    geometry.set_attribute("y", top.to_string());
                }
                _ => {}
            }
            position += 1;
        });

        info!(nodes = nodes.len(), moved = moves.len(); "Resolved overlaps");
        Resolved {
            document: resolved,
            moves,
        }
    }
}
