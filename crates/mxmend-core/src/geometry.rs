//! Geometric primitives for the spatial checks.
//!
//! # Coordinate System
//!
//! Diagram documents use a coordinate system consistent with SVG:
//!
//! ```text
//!   (0,0) ────────► +X
//!     │
//!     │
//!     ▼
//!    +Y
//! ```
//!
//! - **Origin**: Top-left corner at `(0, 0)`
//! - **Y-axis**: Increases downward, so "top" is the smaller y value

/// An axis-aligned rectangle derived from a node's geometry.
///
/// Bounds are a derived view: they are recomputed whenever the geometry they
/// come from changes and are never written back on their own.
///
/// # Examples
///
/// ```
/// # use mxmend_core::geometry::Bounds;
/// let a = Bounds::new_from_top_left(0.0, 0.0, 10.0, 10.0);
/// let b = Bounds::new_from_top_left(5.0, 5.0, 10.0, 10.0);
/// let c = Bounds::new_from_top_left(10.0, 0.0, 10.0, 10.0);
///
/// assert!(a.overlaps(&b));
/// // Touching edges do not count as overlap
/// assert!(!a.overlaps(&c));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    left: f64,
    top: f64,
    right: f64,
    bottom: f64,
}

impl Bounds {
    /// Creates new bounds from a top-left corner and a size
    pub fn new_from_top_left(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            left: x,
            top: y,
            right: x + width,
            bottom: y + height,
        }
    }

    /// Returns the left edge
    pub fn left(self) -> f64 {
        self.left
    }

    /// Returns the top edge
    pub fn top(self) -> f64 {
        self.top
    }

    /// Returns the right edge
    pub fn right(self) -> f64 {
        self.right
    }

    /// Returns the bottom edge
    pub fn bottom(self) -> f64 {
        self.bottom
    }

    /// Returns the width of the bounds
    pub fn width(self) -> f64 {
        self.right - self.left
    }

    /// Returns the height of the bounds
    pub fn height(self) -> f64 {
        self.bottom - self.top
    }

    /// Returns the vertical midpoint
    pub fn mid_y(self) -> f64 {
        self.top + self.height() / 2.0
    }

    /// Checks whether two bounds overlap.
    ///
    /// Intervals are half-open on both axes, so boxes that only share an edge
    /// do not overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        let x_overlap = self.left < other.right && other.left < self.right;
        let y_overlap = self.top < other.bottom && other.top < self.bottom;
        x_overlap && y_overlap
    }

    /// Moves the bounds vertically so that its top edge is at `top`.
    ///
    /// Width, height and horizontal position are preserved.
    pub fn with_top(self, top: f64) -> Self {
        let height = self.height();
        Self {
            top,
            bottom: top + height,
            ..self
        }
    }
}
