//! Error codes for the markup diagnostics.
//!
//! All codes belong to the `E1xx` range (markup reading).

use std::fmt;

/// Error codes for categorizing diagnostic errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Malformed markup.
    ///
    /// The reader could not make sense of the text at this position.
    E100,

    /// Unclosed element.
    ///
    /// The input ended while an element was still open.
    E101,

    /// Mismatched closing tag.
    ///
    /// A closing tag names a different element than the one currently open.
    E102,

    /// Malformed attribute.
    ///
    /// An attribute is missing its value, its quotes, or is duplicated.
    E103,

    /// Invalid entity reference.
    ///
    /// An `&` does not start one of the predefined entities or a
    /// character reference.
    E104,

    /// Missing root element.
    ///
    /// The input does not contain any element.
    E105,

    /// Content after the root element.
    ///
    /// A document has exactly one root element; more markup follows it.
    E106,

    /// Invalid encoding.
    ///
    /// The text is not valid UTF-8.
    E107,

    /// Unexpected closing tag.
    ///
    /// A closing tag appears while no element is open.
    E108,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E100").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E103 => "E103",
            ErrorCode::E104 => "E104",
            ErrorCode::E105 => "E105",
            ErrorCode::E106 => "E106",
            ErrorCode::E107 => "E107",
            ErrorCode::E108 => "E108",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E100 => "malformed markup",
            ErrorCode::E101 => "unclosed element",
            ErrorCode::E102 => "mismatched closing tag",
            ErrorCode::E103 => "malformed attribute",
            ErrorCode::E104 => "invalid entity reference",
            ErrorCode::E105 => "missing root element",
            ErrorCode::E106 => "content after root element",
            ErrorCode::E107 => "invalid encoding",
            ErrorCode::E108 => "unexpected closing tag",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
