//! # mxmend Parser
//!
//! Turns noisy generated text into a [`Document`](mxmend_core::document::Document):
//!
//! 1. **Extract** - Isolate the outer document element ([`extract`])
//! 2. **Repair** - Fix attribute-syntax defects ([`repair`])
//! 3. **Read** - Parse strictly into an element tree ([`reader`])
//! 4. **Sanitize** - Complete missing geometry ([`sanitize`])
//!
//! ## Usage
//!
//! ```
//! # use mxmend_parser::{extract::Extractor, repair::Repairer, sanitize::Sanitizer};
//! let blob = "Here is the diagram:\n<mxGraphModel><root><mxCell id=2 vertex=1/></root></mxGraphModel>";
//!
//! let candidate = Extractor::default().extract(blob).expect("document present");
//! let repaired = Repairer::default().repair(&candidate);
//! let document = Sanitizer::default().sanitize(&repaired.text).expect("repaired text parses");
//!
//! assert_eq!(document.renderable_nodes().len(), 1);
//! ```

pub mod error;
pub mod extract;
pub mod reader;
pub mod repair;
pub mod sanitize;
pub mod style;

mod span;

pub use span::Span;
