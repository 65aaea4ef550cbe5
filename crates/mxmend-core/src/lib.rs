//! mxmend Core Types and Definitions
//!
//! This crate provides the foundational types shared by every mxmend stage:
//!
//! - **Markup**: An owned, order-preserving element tree ([`markup::Element`])
//! - **Document**: The diagram document and its typed node view ([`document`] module)
//! - **Geometry**: Axis-aligned boxes used by the spatial checks ([`geometry::Bounds`])

pub mod document;
pub mod geometry;
pub mod markup;
