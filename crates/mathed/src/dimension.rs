//! Box metrics - the fundamental width/ascent/descent value type
//!
//! Every math construct reports its extent as a `Dimension`. Horizontal
//! concatenation ("glue") sums widths and takes the max of ascents and
//! descents: a glued box is exactly as tall as its tallest component and as
//! deep as its deepest one.

use render_model::GlyphDim;
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

/// A position in device pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Width/ascent/descent of a laid-out box, in device pixels.
///
/// Invariant: `ascent >= 0` and `descent >= 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Dimension {
    pub width: i32,
    pub ascent: i32,
    pub descent: i32,
}

impl Dimension {
    pub fn new(width: i32, ascent: i32, descent: i32) -> Self {
        debug_assert!(ascent >= 0 && descent >= 0);
        Self {
            width,
            ascent,
            descent,
        }
    }

    /// The empty box: identity for glue
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn height(&self) -> i32 {
        self.ascent + self.descent
    }

    /// Clear to the empty box before a fresh metrics pass
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl From<GlyphDim> for Dimension {
    fn from(g: GlyphDim) -> Self {
        Self {
            width: g.width,
            ascent: g.ascent,
            descent: g.descent,
        }
    }
}

/// Horizontal glue: widths add, ascent/descent take the max
impl AddAssign for Dimension {
    fn add_assign(&mut self, other: Dimension) {
        self.width += other.width;
        self.ascent = self.ascent.max(other.ascent);
        self.descent = self.descent.max(other.descent);
    }
}
