//! Isolating a candidate document inside a noisy text blob.
//!
//! Generated text usually wraps the document in prose, fenced code markers
//! and `<think>` reasoning asides. [`Extractor`] strips those and returns the
//! span of the outer document element; [`extract_json_object`] does the same
//! for a JSON payload.

use std::sync::LazyLock;

use log::{debug, trace};
use regex::Regex;

use mxmend_core::document::MODEL_TAG;

static RE_REASONING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid reasoning aside regex"));
static RE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```[A-Za-z0-9_+-]*").expect("valid code fence regex"));

/// Extracts the outer document element from a text blob.
///
/// # Examples
///
/// ```
/// # use mxmend_parser::extract::Extractor;
/// let blob = "Here you go:\n```xml\n<mxGraphModel dx=\"1\"><root/></mxGraphModel>\n```\nEnjoy!";
/// let extracted = Extractor::default().extract(blob);
/// assert_eq!(
///     extracted.as_deref(),
///     Some("<mxGraphModel dx=\"1\"><root/></mxGraphModel>")
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Extractor {
    root_tag: String,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(MODEL_TAG)
    }
}

impl Extractor {
    /// Creates an extractor for documents whose outer element is `root_tag`.
    pub fn new(root_tag: impl Into<String>) -> Self {
        Self {
            root_tag: root_tag.into(),
        }
    }

    /// Returns the outer element name this extractor looks for.
    pub fn root_tag(&self) -> &str {
        &self.root_tag
    }

    /// Returns the candidate document, or `None` when the blob holds no
    /// opening root tag at all.
    ///
    /// A complete `<root …>…</root>` span is returned verbatim. When the
    /// closing tag is missing, everything from the opening tag to the end of
    /// the text is returned instead.
    pub fn extract(&self, blob: &str) -> Option<String> {
        let cleaned = RE_REASONING.replace_all(blob, "");
        let cleaned = RE_FENCE.replace_all(&cleaned, "");
        let cleaned = cleaned.trim();

        let Some(open) = self.find_opening(cleaned) else {
            debug!(root_tag = self.root_tag; "No opening root tag found");
            return None;
        };

        let candidate = &cleaned[open..];
        match self.complete_span_len(candidate) {
            Some(len) => {
                trace!(start = open, len; "Extracted complete document");
                Some(candidate[..len].to_string())
            }
            None => {
                debug!(start = open; "Root tag is never closed, keeping the partial document");
                Some(candidate.to_string())
            }
        }
    }

    /// Finds the byte offset of the first opening tag whose name matches
    /// exactly.
    fn find_opening(&self, text: &str) -> Option<usize> {
        let needle = format!("<{}", self.root_tag);
        text.match_indices(&needle)
            .map(|(start, _)| start)
            .find(|&start| ends_tag_name(&text[start + needle.len()..]))
    }

    /// Returns the length of the complete element starting at the beginning
    /// of `candidate`, if its closing tag is present.
    fn complete_span_len(&self, candidate: &str) -> Option<usize> {
        let open_end = candidate.find('>')? + 1;
        if candidate[..open_end].ends_with("/>") {
            return Some(open_end);
        }

        let needle = format!("</{}", self.root_tag);
        candidate[open_end..]
            .match_indices(&needle)
            .find_map(|(offset, _)| {
                let after_name = open_end + offset + needle.len();
                let rest = &candidate[after_name..];
                let trimmed = rest.trim_start();
                trimmed
                    .starts_with('>')
                    .then(|| after_name + (rest.len() - trimmed.len()) + 1)
            })
    }
}

/// Returns `true` if the text following `<name` ends the tag name.
fn ends_tag_name(rest: &str) -> bool {
    rest.chars()
        .next()
        .is_none_or(|c| c.is_whitespace() || c == '>' || c == '/')
}

/// Extracts the outermost JSON object from a text blob.
///
/// Reasoning asides are removed and the span from the first `{` to the last
/// `}` is returned. Raw line breaks inside string literals are escaped so the
/// result can be handed to a strict JSON parser.
///
/// # Examples
///
/// ```
/// # use mxmend_parser::extract::extract_json_object;
/// let blob = "<think>plan</think>Sure! {\"story_id\": \"S1\",\n \"reasoning\": \"two\nlines\"} done";
/// assert_eq!(
///     extract_json_object(blob).as_deref(),
///     Some("{\"story_id\": \"S1\",\n \"reasoning\": \"two\\nlines\"}")
/// );
/// ```
pub fn extract_json_object(blob: &str) -> Option<String> {
    let cleaned = RE_REASONING.replace_all(blob, "");
    let cleaned = cleaned.trim();

    let start = cleaned.find('{')?;
    let end = cleaned.rfind('}')?;
    if start > end {
        return None;
    }

    Some(escape_string_line_breaks(&cleaned[start..=end]))
}

fn escape_string_line_breaks(json: &str) -> String {
    let mut escaped = String::with_capacity(json.len());
    let mut in_string = false;
    let mut after_backslash = false;

    for c in json.chars() {
        match c {
            '\n' if in_string => escaped.push_str("\\n"),
            '\r' if in_string => escaped.push_str("\\r"),
            _ => escaped.push(c),
        }

        if after_backslash {
            after_backslash = false;
        } else if c == '\\' && in_string {
            after_backslash = true;
        } else if c == '"' {
            in_string = !in_string;
        }
    }
    escaped
}
