//! Lexical repair of almost well-formed markup.
//!
//! [`Repairer`] fixes the attribute defects generated markup typically has
//! without touching regions that are already well formed:
//!
//! 1. Unquoted values following well-formed attributes are quoted.
//! 2. Style attributes are set aside, remaining unquoted values inside tags
//!    are quoted, and a value whose closing quote is missing is closed in
//!    front of the next attribute. Styles are then restored verbatim.
//! 3. Every `&` that does not start a predefined entity or a character
//!    reference is escaped.
//!
//! Steps 1 and 2 run in a bounded loop until the text stops changing.

use std::sync::LazyLock;

use log::{debug, info, warn};
use regex::{Captures, Regex};
use serde::Deserialize;

/// An unquoted value after a run of well-formed attributes in the same tag.
static RE_FORCE_QUOTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(<[A-Za-z_][\w:.-]*(?:\s+[A-Za-z_:][\w:.-]*=(?:"[^"]*"|'[^']*'))*)\s+([A-Za-z_:][\w:.-]*)=((?:[^\s"'<>/]|/+[^\s"'<>/])+)"#,
    )
    .expect("valid force-quote regex")
});
static RE_STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bstyle="[^"]*""#).expect("valid style regex"));
static RE_STYLE_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x{E000}([0-9]+)\x{E001}").expect("valid style placeholder regex")
});
static RE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[A-Za-z_][^<>]*").expect("valid tag regex"));
/// Quoted regions are matched first so that only bare values are rewritten.
static RE_UNQUOTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""[^"]*"|'[^']*'|\b([A-Za-z_:][\w:.-]*)=((?:[^\s"'=<>/`]|/+[^\s"'=<>/`])+)"#)
        .expect("valid unquoted value regex")
});
static RE_HALF_QUOTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b([A-Za-z_:][\w:.-]*)="([^"<>]*?)(\s+[A-Za-z_:][\w:.-]*=")"#)
        .expect("valid half-quoted value regex")
});
static RE_AMPERSAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(?:(lt|gt|quot|apos|amp|#[0-9]+|#x[0-9a-fA-F]+);)?")
        .expect("valid ampersand regex")
});

const PLACEHOLDER_OPEN: char = '\u{E000}';
const PLACEHOLDER_CLOSE: char = '\u{E001}';

/// Settings for [`Repairer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RepairConfig {
    /// Upper bound on quoting passes.
    max_passes: usize,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self { max_passes: 16 }
    }
}

impl RepairConfig {
    pub fn new(max_passes: usize) -> Self {
        Self { max_passes }
    }

    pub fn max_passes(&self) -> usize {
        self.max_passes
    }
}

/// Counts of the rewrites one [`Repairer::repair`] call performed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// Values quoted by the force-quote pass.
    pub forced_quotes: usize,
    /// Values quoted inside tags after styles were set aside.
    pub unquoted_values: usize,
    /// Values whose missing closing quote was inserted.
    pub half_quoted_values: usize,
    /// Bare `&` characters escaped as `&amp;`.
    pub escaped_ampersands: usize,
    /// Quoting passes run.
    pub passes: usize,
    /// Whether the quoting passes reached a fixed point within the bound.
    pub converged: bool,
}

impl RepairReport {
    /// Total number of rewrites.
    pub fn total(&self) -> usize {
        self.forced_quotes + self.unquoted_values + self.half_quoted_values + self.escaped_ampersands
    }
}

/// Repaired text together with what was changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repaired {
    pub text: String,
    pub report: RepairReport,
}

/// Rewrites attribute-syntax defects.
///
/// # Examples
///
/// ```
/// # use mxmend_parser::repair::Repairer;
/// let repaired = Repairer::default().repair(r#"<a x=1 y="2" w=3>"#);
/// assert_eq!(repaired.text, r#"<a x="1" y="2" w="3">"#);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Repairer {
    config: RepairConfig,
}

impl Repairer {
    pub fn new(config: RepairConfig) -> Self {
        Self { config }
    }

    /// Repairs `text`. Repairing the output again leaves it unchanged.
    pub fn repair(&self, text: &str) -> Repaired {
        let mut report = RepairReport::default();
        let mut current = text.to_string();

        for _ in 0..self.config.max_passes.max(1) {
            report.passes += 1;
            let next = quoting_pass(&current, &mut report);
            if next == current {
                report.converged = true;
                break;
            }
            current = next;
        }

        if !report.converged {
            warn!(
                passes = report.passes;
                "Attribute quoting did not reach a fixed point, keeping the last pass"
            );
        }

        let text = escape_ampersands(&current, &mut report);
        info!(
            forced_quotes = report.forced_quotes,
            unquoted_values = report.unquoted_values,
            half_quoted_values = report.half_quoted_values,
            escaped_ampersands = report.escaped_ampersands,
            passes = report.passes;
            "Repaired attribute syntax"
        );
        Repaired { text, report }
    }
}

fn quoting_pass(text: &str, report: &mut RepairReport) -> String {
    let text = force_quote(text, report);
    let (text, styles) = protect_styles(&text);
    let text = quote_bare_values(&text, report);
    let text = close_half_quoted(&text, report);
    restore_styles(&text, &styles)
}

fn force_quote(text: &str, report: &mut RepairReport) -> String {
    RE_FORCE_QUOTE
        .replace_all(text, |caps: &Captures| {
            report.forced_quotes += 1;
            format!(r#"{} {}="{}""#, &caps[1], &caps[2], &caps[3])
        })
        .into_owned()
}

/// Replaces well-formed style attributes by indexed placeholders.
///
/// Text that already contains a placeholder delimiter is left as is, so that
/// restoring never swaps input characters for a style.
fn protect_styles(text: &str) -> (String, Vec<String>) {
    if text.contains(PLACEHOLDER_OPEN) {
        debug!("Input contains the style placeholder delimiter, styles stay in place");
        return (text.to_string(), Vec::new());
    }
    let mut styles = Vec::new();
    let protected = RE_STYLE
        .replace_all(text, |caps: &Captures| {
            styles.push(caps[0].to_string());
            format!("{PLACEHOLDER_OPEN}{}{PLACEHOLDER_CLOSE}", styles.len() - 1)
        })
        .into_owned();
    if !styles.is_empty() {
        debug!(count = styles.len(); "Protected style attributes");
    }
    (protected, styles)
}

fn restore_styles(text: &str, styles: &[String]) -> String {
    RE_STYLE_PLACEHOLDER
        .replace_all(text, |caps: &Captures| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|index| styles.get(index))
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Quotes bare `key=value` pairs, only inside tags and outside quoted values.
fn quote_bare_values(text: &str, report: &mut RepairReport) -> String {
    RE_TAG
        .replace_all(text, |tag: &Captures| {
            RE_UNQUOTED
                .replace_all(&tag[0], |caps: &Captures| match (caps.get(1), caps.get(2)) {
                    (Some(key), Some(value)) => {
                        report.unquoted_values += 1;
                        format!(r#"{}="{}""#, key.as_str(), value.as_str())
                    }
                    _ => caps[0].to_string(),
                })
                .into_owned()
        })
        .into_owned()
}

/// Closes a value that swallowed the next attribute, in front of that
/// attribute's key.
///
/// Only tags with an odd number of double quotes hold an unterminated value.
/// One value is closed per tag and pass; the fixed-point loop handles the rest.
fn close_half_quoted(text: &str, report: &mut RepairReport) -> String {
    RE_TAG
        .replace_all(text, |tag: &Captures| {
            let tag = &tag[0];
            if tag.matches('"').count() % 2 == 0 {
                return tag.to_string();
            }
            RE_HALF_QUOTED
                .replacen(tag, 1, |caps: &Captures| {
                    report.half_quoted_values += 1;
                    format!(r#"{}="{}"{}"#, &caps[1], &caps[2], &caps[3])
                })
                .into_owned()
        })
        .into_owned()
}

fn escape_ampersands(text: &str, report: &mut RepairReport) -> String {
    RE_AMPERSAND
        .replace_all(text, |caps: &Captures| {
            if caps.get(1).is_some() {
                caps[0].to_string()
            } else {
                report.escaped_ampersands += 1;
                "&amp;".to_string()
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repair(text: &str) -> Repaired {
        Repairer::default().repair(text)
    }

    #[test]
    fn test_quotes_mixed_attributes() {
        let repaired = repair(r#"<a x=1 y="2" w=3>"#);
        assert_eq!(repaired.text, r#"<a x="1" y="2" w="3">"#);
        assert!(repaired.report.converged);
        assert_eq!(
            repaired.report.forced_quotes + repaired.report.unquoted_values,
            2
        );
    }

    #[test]
    fn test_adjacent_unquoted_values() {
        let repaired = repair("<mxGeometry x=10 y=20 width=30 height=40 as=geometry/>");
        assert_eq!(
            repaired.text,
            r#"<mxGeometry x="10" y="20" width="30" height="40" as="geometry"/>"#
        );
    }

    #[test]
    fn test_well_formed_text_is_untouched() {
        let text = r#"<mxCell id="2" value="a=b c=d" style="rounded=1;whiteSpace=wrap;" vertex="1"/>"#;
        let repaired = repair(text);
        assert_eq!(repaired.text, text);
        assert_eq!(repaired.report.total(), 0);
        assert_eq!(repaired.report.passes, 1);
    }

    #[test]
    fn test_style_declarations_are_not_treated_as_attributes() {
        let repaired = repair(r#"<mxCell id=5 style="fillColor=#fff;html=1;"/>"#);
        assert_eq!(
            repaired.text,
            r#"<mxCell id="5" style="fillColor=#fff;html=1;"/>"#
        );
    }

    #[test]
    fn test_half_quoted_value_is_closed_before_next_key() {
        let repaired = repair(r#"<mxCell value="Login parent="1"/>"#);
        assert_eq!(repaired.text, r#"<mxCell value="Login" parent="1"/>"#);
        assert_eq!(repaired.report.half_quoted_values, 1);
    }

    #[test]
    fn test_balanced_value_ending_in_key_is_untouched() {
        let text = r#"<mxCell value="x y=" id="2"/>"#;
        let repaired = repair(text);
        assert_eq!(repaired.text, text);
        assert_eq!(repaired.report.half_quoted_values, 0);
    }

    #[test]
    fn test_text_content_quotes_are_untouched() {
        let text = r#"<label>say a="b c="d</label>"#;
        let repaired = repair(text);
        assert_eq!(repaired.text, text);
        assert_eq!(repaired.report.total(), 0);
    }

    #[test]
    fn test_raw_placeholder_characters_survive() {
        let text = "<mxCell value=\"\u{E000}0\u{E001}\" style=\"rounded=1;\" id=3/>";
        let repaired = repair(text);
        assert_eq!(
            repaired.text,
            "<mxCell value=\"\u{E000}0\u{E001}\" style=\"rounded=1;\" id=\"3\"/>"
        );
    }

    #[test]
    fn test_text_content_is_not_quoted() {
        let text = "<label>x=1 and y=2</label>";
        assert_eq!(repair(text).text, text);
    }

    #[test]
    fn test_slashes_inside_values() {
        let repaired = repair("<link href=http://example.com/a/>");
        assert_eq!(repaired.text, r#"<link href="http://example.com/a"/>"#);
    }

    #[test]
    fn test_bare_ampersands_are_escaped() {
        let repaired = repair(r#"<a v="R&D &amp; Q&A &lt;b&gt; &#10; &#xA;"/>"#);
        assert_eq!(
            repaired.text,
            r#"<a v="R&amp;D &amp; Q&amp;A &lt;b&gt; &#10; &#xA;"/>"#
        );
        assert_eq!(repaired.report.escaped_ampersands, 2);
    }

    #[test]
    fn test_single_pass_bound_still_returns_text() {
        let repairer = Repairer::new(RepairConfig::new(1));
        let repaired = repairer.repair("<a b=1 c=2 d=3>");
        assert_eq!(repaired.report.passes, 1);
        assert!(!repaired.report.converged);
    }

    #[test]
    fn test_repair_is_idempotent_on_example() {
        let once = repair(r#"<a x=1 y="2 z=3 & w=4>"#);
        let twice = repair(&once.text);
        assert_eq!(twice.text, once.text);
    }
}
