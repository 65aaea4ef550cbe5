//! Combining several documents into one.
//!
//! [`Merger::merge`] folds the cells of every source into one composite
//! model, re-addressing ids so that sources never collide.
//! [`Merger::paginate`] keeps the sources apart instead, as pages of one
//! multi-page file.
//!
//! Both operations admit a source only if it parses strictly and none of its
//! styles carries an escaped colour value.

use std::{
    collections::HashSet,
    io::{self, Read},
};

use log::{debug, info, warn};
use serde::Deserialize;
use thiserror::Error;

use mxmend_core::{
    document::{CELL_TAG, CONTAINER_TAG, Document, MODEL_TAG},
    markup::Element,
};
use mxmend_parser::{error::ParseError, reader::parse_document, style::parse_style};

/// Outer element of a multi-page file.
pub const FILE_TAG: &str = "mxfile";
/// Element holding one page of a multi-page file.
pub const PAGE_TAG: &str = "diagram";

/// Cell attributes holding node references.
const REFERENCE_ATTRIBUTES: [&str; 4] = ["id", "parent", "source", "target"];

/// How ids that are not integers are re-addressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForeignIdPolicy {
    /// Prefix the id with the source index, except in the first source.
    #[default]
    Namespace,
    /// Keep the id unchanged.
    Preserve,
}

/// Settings for [`Merger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Offset between the numeric id ranges of consecutive sources.
    stride: u32,
    foreign_ids: ForeignIdPolicy,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            stride: 100,
            foreign_ids: ForeignIdPolicy::default(),
        }
    }
}

impl MergeConfig {
    pub fn new(stride: u32, foreign_ids: ForeignIdPolicy) -> Self {
        Self {
            stride,
            foreign_ids,
        }
    }

    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn foreign_ids(&self) -> ForeignIdPolicy {
        self.foreign_ids
    }
}

/// A named document text to merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeSource {
    name: String,
    content: String,
}

impl MergeSource {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Reads the whole of `reader` as the source text.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails or the bytes are not UTF-8.
    pub fn from_reader(name: impl Into<String>, mut reader: impl Read) -> io::Result<Self> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        Ok(Self::new(name, content))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Why a merge was rejected.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("no documents to merge")]
    NoInputs,

    #[error("cannot parse `{source_name}`: {err}")]
    Parse {
        source_name: String,
        err: ParseError,
        src: String,
    },

    #[error("escaped color values in `{source_name}`: {}", .offenders.join(", "))]
    EscapedColor {
        source_name: String,
        /// Every offending `key=value` declaration.
        offenders: Vec<String>,
    },

    #[error("`{source_name}` has no <mxGraphModel> element")]
    MissingModel { source_name: String },

    #[error("`{source_name}` has no <root> container")]
    MissingContainer { source_name: String },
}

/// Merges documents.
///
/// # Examples
///
/// ```
/// # use mxmend::merge::{MergeSource, Merger};
/// let sources = [
///     MergeSource::new("one", r#"<mxGraphModel><root><mxCell id="1"/></root></mxGraphModel>"#),
///     MergeSource::new("two", r#"<mxGraphModel><root><mxCell id="1"/></root></mxGraphModel>"#),
/// ];
/// let merged = Merger::default().merge(&sources).expect("valid sources");
///
/// let ids: Vec<_> = merged.nodes().iter().map(|node| node.id().to_string()).collect();
/// assert_eq!(ids, vec!["1", "101"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Merger {
    config: MergeConfig,
}

impl Merger {
    pub fn new(config: MergeConfig) -> Self {
        Self { config }
    }

    /// Folds every source into one model.
    ///
    /// Source `i` has its numeric ids and references shifted by
    /// `i * stride`. The composite model takes its attributes from the first
    /// source.
    ///
    /// # Errors
    ///
    /// Returns the first [`MergeError`] met; nothing is merged in that case.
    pub fn merge(&self, sources: &[MergeSource]) -> Result<Document, MergeError> {
        let documents = admit_all(sources)?;

        let mut model_attributes = Vec::new();
        let mut container = Element::new(CONTAINER_TAG);

        for (index, (source, document)) in sources.iter().zip(&documents).enumerate() {
            let model = model_of(source, document)?;
            let cells = model
                .child(CONTAINER_TAG)
                .ok_or_else(|| MergeError::MissingContainer {
                    source_name: source.name.clone(),
                })?;

            if index == 0 {
                model_attributes = model
                    .attributes()
                    .map(|(key, value)| (key.to_string(), value.to_string()))
                    .collect();
            }

            let offset = i64::from(self.config.stride) * index as i64;
            let mut copied = 0;
            for child in cells.elements() {
                let mut child = child.clone();
                child.visit_mut(CELL_TAG, &mut |cell: &mut Element| {
                    self.readdress(cell, index, offset);
                });
                container.push_element(child);
                copied += 1;
            }
            debug!(source = source.name(), offset, copied; "Merged source");
        }

        let model = model_attributes
            .into_iter()
            .fold(Element::new(MODEL_TAG), |model, (key, value)| {
                model.with_attribute(key, value)
            })
            .with_child(container);
        let merged = Document::new(model);

        warn_duplicate_ids(&merged);
        info!(sources = sources.len(), nodes = merged.nodes().len(); "Merged documents");
        Ok(merged)
    }

    /// Builds a multi-page file with one page per source, named after it.
    ///
    /// Ids are left as they are, since pages do not share an id space.
    ///
    /// # Errors
    ///
    /// Returns the first [`MergeError`] met.
    pub fn paginate(&self, sources: &[MergeSource]) -> Result<Element, MergeError> {
        let documents = admit_all(sources)?;

        let mut file = Element::new(FILE_TAG);
        for (source, document) in sources.iter().zip(&documents) {
            let model = model_of(source, document)?;
            file.push_element(
                Element::new(PAGE_TAG)
                    .with_attribute("name", source.name.clone())
                    .with_child(model.clone()),
            );
        }

        info!(pages = sources.len(); "Paginated documents");
        Ok(file)
    }

    fn readdress(&self, cell: &mut Element, index: usize, offset: i64) {
        for key in REFERENCE_ATTRIBUTES {
            let Some(value) = cell.attribute(key) else {
                continue;
            };
            let shifted = value
                .trim()
                .parse::<i64>()
                .ok()
                .and_then(|number| number.checked_add(offset));
            let new_value = match (shifted, self.config.foreign_ids) {
                (Some(number), _) => number.to_string(),
                (None, ForeignIdPolicy::Namespace) if index > 0 => format!("{index}:{value}"),
                (None, _) => continue,
            };
            cell.set_attribute(key, new_value);
        }
    }
}

/// Parses and checks every source.
fn admit_all(sources: &[MergeSource]) -> Result<Vec<Document>, MergeError> {
    if sources.is_empty() {
        return Err(MergeError::NoInputs);
    }
    sources.iter().map(admit).collect()
}

fn admit(source: &MergeSource) -> Result<Document, MergeError> {
    let document = parse_document(&source.content).map_err(|err| MergeError::Parse {
        source_name: source.name.clone(),
        err,
        src: source.content.clone(),
    })?;

    let offenders = escaped_colors(&document);
    if !offenders.is_empty() {
        warn!(source = source.name(), offenders = offenders.len(); "Rejecting source with escaped colors");
        return Err(MergeError::EscapedColor {
            source_name: source.name.clone(),
            offenders,
        });
    }
    Ok(document)
}

/// Returns the first model element of a source, which may itself be a
/// multi-page file.
fn model_of<'a>(source: &MergeSource, document: &'a Document) -> Result<&'a Element, MergeError> {
    document
        .root()
        .descendants(MODEL_TAG)
        .into_iter()
        .next()
        .ok_or_else(|| MergeError::MissingModel {
            source_name: source.name.clone(),
        })
}

/// Collects every colour declaration whose value is wrapped in quotes.
fn escaped_colors(document: &Document) -> Vec<String> {
    document
        .nodes()
        .iter()
        .filter_map(|node| node.style())
        .flat_map(|style| {
            parse_style(style)
                .into_iter()
                .filter(|declaration| declaration.key().ends_with("Color"))
                .filter_map(|declaration| {
                    let value = declaration.value()?;
                    is_quoted(value).then(|| format!("{}={value}", declaration.key()))
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

fn is_quoted(value: &str) -> bool {
    let wrapped = |quote: &str| {
        value.len() >= 2 * quote.len() && value.starts_with(quote) && value.ends_with(quote)
    };
    wrapped("&quot;") || wrapped("&#34;") || wrapped("\"")
}

fn warn_duplicate_ids(document: &Document) {
    let mut seen = HashSet::new();
    for node in document.nodes() {
        if !node.id().as_str().is_empty() && !seen.insert(node.id().clone()) {
            warn!(id = node.id().as_str(); "Merged document repeats an id");
        }
    }
}
