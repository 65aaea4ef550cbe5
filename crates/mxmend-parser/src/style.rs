//! Parser for cell style strings.
//!
//! A style is a `;`-separated list of declarations, each either a bare name
//! (`ellipse`) or a `key=value` pair (`fillColor=#dae8fc`). Entity references
//! such as `&quot;` are atomic inside values, so their `;` never splits a
//! declaration.

use log::warn;
use winnow::{
    Parser as _,
    combinator::{alt, opt, preceded, repeat, separated},
    error::ModalResult,
    token::{take_till, take_while},
};

type Input<'a> = &'a str;

/// One declaration of a style string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Declaration<'a> {
    key: &'a str,
    value: Option<&'a str>,
}

impl<'a> Declaration<'a> {
    pub fn key(&self) -> &'a str {
        self.key
    }

    /// Returns the value, or `None` for a bare name.
    pub fn value(&self) -> Option<&'a str> {
        self.value
    }
}

/// An entity reference: `&name;` or `&#digits;`.
fn entity<'a>(input: &mut Input<'a>) -> ModalResult<&'a str> {
    (
        '&',
        take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '#'),
        ';',
    )
        .take()
        .parse_next(input)
}

fn value_chunk<'a>(input: &mut Input<'a>) -> ModalResult<&'a str> {
    alt((entity, take_till(1.., |c: char| c == ';' || c == '&'), "&")).parse_next(input)
}

fn value<'a>(input: &mut Input<'a>) -> ModalResult<&'a str> {
    repeat::<_, _, (), _, _>(0.., value_chunk)
        .take()
        .parse_next(input)
}

fn key<'a>(input: &mut Input<'a>) -> ModalResult<&'a str> {
    take_till(0.., |c: char| c == '=' || c == ';').parse_next(input)
}

fn declaration<'a>(input: &mut Input<'a>) -> ModalResult<Declaration<'a>> {
    (key, opt(preceded('=', value)))
        .map(|(key, value)| Declaration {
            key: key.trim(),
            value,
        })
        .parse_next(input)
}

fn declarations<'a>(input: &mut Input<'a>) -> ModalResult<Vec<Declaration<'a>>> {
    let all: Vec<Declaration<'a>> = separated(0.., declaration, ';').parse_next(input)?;
    Ok(all
        .into_iter()
        .filter(|declaration| !declaration.key.is_empty())
        .collect())
}

/// Splits a style string into declarations, skipping empty ones.
///
/// # Examples
///
/// ```
/// # use mxmend_parser::style::parse_style;
/// let declarations = parse_style("ellipse;fillColor=&quot;#fff&quot;;html=1;");
/// let pairs: Vec<_> = declarations.iter().map(|d| (d.key(), d.value())).collect();
/// assert_eq!(
///     pairs,
///     vec![
///         ("ellipse", None),
///         ("fillColor", Some("&quot;#fff&quot;")),
///         ("html", Some("1")),
///     ]
/// );
/// ```
pub fn parse_style(style: &str) -> Vec<Declaration<'_>> {
    declarations.parse(style).unwrap_or_else(|err| {
        warn!(style, error = err.to_string(); "Unreadable style string");
        Vec::new()
    })
}
