//! Error and diagnostic system for the markup reader.
//!
//! The error system is built around the [`Diagnostic`] type, which represents
//! a single error with an optional error code, labelled source locations and
//! help text. The diagnostics raised while reading one document are wrapped
//! in [`ParseError`].
//!
//! # Example
//!
//! ```
//! # use mxmend_parser::error::{Diagnostic, ErrorCode};
//! # use mxmend_parser::Span;
//!
//! let diag = Diagnostic::error("closing tag `</root>` does not match `<mxCell>`")
//!     .with_code(ErrorCode::E102)
//!     .with_label(Span::new(120..127), "unexpected closing tag")
//!     .with_secondary_label(Span::new(40..52), "element opened here")
//!     .with_help("close `<mxCell>` before closing its parent");
//! ```

mod diagnostic;
mod error_code;
mod label;
mod parse_error;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use parse_error::ParseError;
