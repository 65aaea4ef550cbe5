//! mxmend - Repair, spatial validation and merging of generated diagrams.
//!
//! Generated mxGraph markup is rarely usable as is: it arrives wrapped in
//! prose, with unquoted attributes and incomplete geometry, and its shapes
//! overlap. [`Pipeline`] takes such text through extraction, repair and
//! sanitizing, then checks, fixes and combines the resulting documents.

pub mod config;
pub mod merge;
pub mod plan;
pub mod resolve;
pub mod validate;

mod error;

pub use mxmend_core::{document, geometry, markup};
pub use mxmend_parser::repair::{RepairReport, Repaired};

pub use error::MxmendError;

use log::{debug, info, trace, warn};

use mxmend_core::{document::Document, markup::Element};
use mxmend_parser::{
    extract::{Extractor, extract_json_object},
    repair::Repairer,
    sanitize::Sanitizer,
};

use config::AppConfig;
use merge::{MergeSource, Merger};
use plan::ViewPlan;
use resolve::{Resolved, Resolver};
use validate::{DefectReport, Validator};

/// Runs the mxmend stages with one configuration.
///
/// # Examples
///
/// ```
/// use mxmend::{Pipeline, config::AppConfig};
///
/// let blob = r#"Here is your layout:
/// <mxGraphModel><root>
///   <mxCell id=0/>
///   <mxCell id="header" vertex=1 parent=0><mxGeometry y="0" height="40"/></mxCell>
///   <mxCell id="body" vertex=1 parent=0><mxGeometry y="20"/></mxCell>
/// </root></mxGraphModel>
/// Let me know if you need changes."#;
///
/// let pipeline = Pipeline::new(AppConfig::default());
/// let document = pipeline.process(blob).expect("repairable input");
///
/// // `body` overlaps `header` until it is pushed down
/// assert!(pipeline.validate(&document).is_err());
/// let resolved = pipeline.resolve(&document);
/// assert!(pipeline.validate(&resolved.document).is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: AppConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Isolate the document markup inside a text blob.
    ///
    /// # Errors
    ///
    /// Returns [`MxmendError::ExtractionEmpty`] if the blob holds no
    /// opening document tag.
    pub fn extract(&self, blob: &str) -> Result<String, MxmendError> {
        trace!(len = blob.len(); "Extracting document");
        Extractor::default()
            .extract(blob)
            .ok_or(MxmendError::ExtractionEmpty)
    }

    /// Fix attribute-syntax defects in extracted markup.
    pub fn repair(&self, text: &str) -> Repaired {
        let repaired = Repairer::new(*self.config.repair()).repair(text);
        if !repaired.report.converged {
            warn!(passes = repaired.report.passes; "Repair stopped before reaching a fixed point");
        }
        debug!(rewrites = repaired.report.total(); "Repaired markup");
        repaired
    }

    /// Parse repaired markup and complete its geometry.
    ///
    /// # Errors
    ///
    /// Returns [`MxmendError::MalformedDocument`] if the text is not well
    /// formed.
    pub fn sanitize(&self, text: &str) -> Result<Document, MxmendError> {
        Sanitizer::new(*self.config.sanitize().geometry())
            .sanitize(text)
            .map_err(|err| MxmendError::new_malformed_document(err, text))
    }

    /// Extract, repair and sanitize a text blob.
    ///
    /// # Errors
    ///
    /// Returns the error of the first stage that fails.
    pub fn process(&self, blob: &str) -> Result<Document, MxmendError> {
        info!("Processing generated markup");

        let extracted = self.extract(blob)?;
        let repaired = self.repair(&extracted);
        let document = self.sanitize(&repaired.text)?;

        info!(
            nodes = document.nodes().len(),
            rewrites = repaired.report.total();
            "Document ready"
        );
        Ok(document)
    }

    /// Check the spatial rules, stopping at the first violation.
    ///
    /// # Errors
    ///
    /// Returns [`MxmendError::SpatialViolation`] with the first broken rule.
    pub fn validate(&self, document: &Document) -> Result<(), MxmendError> {
        Validator::new(self.config.validate().clone()).validate(document)?;
        debug!("Document passed spatial validation");
        Ok(())
    }

    /// Check the spatial rules, collecting every violation.
    pub fn report(&self, document: &Document) -> DefectReport {
        Validator::new(self.config.validate().clone()).report(document)
    }

    /// Move nodes down until none overlap.
    pub fn resolve(&self, document: &Document) -> Resolved {
        Resolver::new(self.config.resolve().margin()).resolve(document)
    }

    /// Fold several documents into one.
    ///
    /// # Errors
    ///
    /// Returns [`MxmendError::MergeRejected`] if any source is rejected.
    pub fn merge(&self, sources: &[MergeSource]) -> Result<Document, MxmendError> {
        info!(sources = sources.len(); "Merging documents");
        Ok(Merger::new(*self.config.merge()).merge(sources)?)
    }

    /// Collect several documents as pages of one file.
    ///
    /// # Errors
    ///
    /// Returns [`MxmendError::MergeRejected`] if any source is rejected.
    pub fn paginate(&self, sources: &[MergeSource]) -> Result<Element, MxmendError> {
        info!(sources = sources.len(); "Paginating documents");
        Ok(Merger::new(*self.config.merge()).paginate(sources)?)
    }

    /// Read a view plan from a text blob.
    ///
    /// # Errors
    ///
    /// Returns [`MxmendError::ExtractionEmpty`] if the blob holds no JSON
    /// object, or [`MxmendError::Plan`] if the object is not a view plan.
    pub fn plan(&self, blob: &str) -> Result<ViewPlan, MxmendError> {
        let json = extract_json_object(blob).ok_or(MxmendError::ExtractionEmpty)?;
        let plan: ViewPlan = serde_json::from_str(&json)?;
        info!(story_id = plan.story_id(), views = plan.views().len(); "Read view plan");
        Ok(plan)
    }
}
