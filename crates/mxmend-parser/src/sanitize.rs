//! Completing the geometry of a freshly parsed document.

use log::{debug, info};

use mxmend_core::{
    document::{Document, GEOMETRY_TAG, GeometryDefaults, NodeKind},
    markup::Element,
};

use crate::{error::ParseError, reader::parse_document};

/// Parses repaired text and fills in missing geometry.
///
/// Every `<mxGeometry>` receives any of `x`, `y`, `width`, `height` and `as`
/// it lacks, and a vertex cell without geometry receives a fully defaulted
/// one. After sanitizing, every vertex node carries complete geometry.
///
/// # Examples
///
/// ```
/// # use mxmend_parser::sanitize::Sanitizer;
/// let text = r#"<mxGraphModel><root>
///     <mxCell id="2" vertex="1"><mxGeometry x="40"/></mxCell>
/// </root></mxGraphModel>"#;
/// let document = Sanitizer::default().sanitize(text).expect("parses");
/// let geometry = document.root().descendants("mxGeometry")[0];
///
/// assert_eq!(geometry.attribute("x"), Some("40"));
/// assert_eq!(geometry.attribute("width"), Some("100"));
/// assert_eq!(geometry.attribute("as"), Some("geometry"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Sanitizer {
    defaults: GeometryDefaults,
}

impl Sanitizer {
    pub fn new(defaults: GeometryDefaults) -> Self {
        Self { defaults }
    }

    /// Parses `text` and completes its geometry.
    ///
    /// # Errors
    ///
    /// Returns the reader's [`ParseError`] unchanged; parsing is not retried.
    pub fn sanitize(&self, text: &str) -> Result<Document, ParseError> {
        let mut document = parse_document(text)?;
        self.complete(&mut document);
        Ok(document)
    }

    /// Fills in missing geometry on an already parsed document.
    pub fn complete(&self, document: &mut Document) {
        let mut added_geometry = 0;
        document.for_each_cell_mut(|cell| {
            if NodeKind::of(cell) == NodeKind::Vertex && cell.child(GEOMETRY_TAG).is_none() {
                debug!(id = cell.attribute("id").unwrap_or_default(); "Adding default geometry to vertex");
                cell.push_element(self.defaults.to_element());
                added_geometry += 1;
            }
        });

        let required = self.defaults.required_attributes();
        let mut filled_fields = 0;
        document.root_mut().visit_mut(GEOMETRY_TAG, &mut |geometry: &mut Element| {
            for (key, value) in &required {
                if !geometry.has_attribute(key) {
                    geometry.set_attribute(*key, value.clone());
                    filled_fields += 1;
                }
            }
        });

        info!(added_geometry, filled_fields; "Sanitized document geometry");
    }
}

#[cfg(test)]
mod tests {
    use mxmend_core::document::Geometry;

    use super::*;

    #[test]
    fn test_missing_fields_take_defaults() {
        let text = r#"<mxGraphModel><root>
            <mxCell id="2" vertex="1"><mxGeometry y="15" height="7"/></mxCell>
        </root></mxGraphModel>"#;
        let document = Sanitizer::default().sanitize(text).expect("parses");
        let geometry = document.root().descendants(GEOMETRY_TAG)[0];

        let attributes: Vec<_> = geometry.attributes().collect();
        assert_eq!(
            attributes,
            vec![
                ("y", "15"),
                ("height", "7"),
                ("x", "0"),
                ("width", "100"),
                ("as", "geometry"),
            ]
        );
    }

    #[test]
    fn test_vertex_without_geometry_gets_one() {
        let text = r#"<mxGraphModel><root><mxCell id="nav" vertex="1"/></root></mxGraphModel>"#;
        let document = Sanitizer::default().sanitize(text).expect("parses");
        let nodes = document.renderable_nodes();

        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].geometry(), Some(Geometry::new(0.0, 0.0, 100.0, 50.0)));
    }

    #[test]
    fn test_edges_are_not_given_geometry() {
        let text = r#"<mxGraphModel><root><mxCell id="e" edge="1"/></root></mxGraphModel>"#;
        let document = Sanitizer::default().sanitize(text).expect("parses");
        assert!(document.root().descendants(GEOMETRY_TAG).is_empty());
    }

    #[test]
    fn test_custom_defaults() {
        let sanitizer = Sanitizer::new(GeometryDefaults::new(5.0, 6.0, 70.0, 80.0));
        let text = r#"<mxGraphModel><root><mxCell id="2" vertex="1"/></root></mxGraphModel>"#;
        let document = sanitizer.sanitize(text).expect("parses");
        assert_eq!(
            document.renderable_nodes()[0].geometry(),
            Some(Geometry::new(5.0, 6.0, 70.0, 80.0))
        );
    }

    #[test]
    fn test_malformed_text_is_an_error() {
        assert!(Sanitizer::default().sanitize("<mxGraphModel><root>").is_err());
    }
}
