//! The inset contract and the closed set of math constructs
//!
//! `InsetMath` is the polymorphic contract every construct implements;
//! `Inset` is the closed sum type over the known construct kinds, with
//! pattern-matching capability accessors instead of open-ended dynamic
//! casts. `MathAtom` is the single-owner box a cell stores its elements in.

use crate::class::MathClass;
use crate::coords::addr_of;
use crate::cursor::CursorSlice;
use crate::data::MathData;
use crate::delim::{InsetMathBig, InsetMathDelim};
use crate::dimension::Dimension;
use crate::error::MathedResult;
use crate::frac::{InsetMathBinom, InsetMathFrac};
use crate::grid::InsetMathGrid;
use crate::leaf::{InsetMathChar, InsetMathClass, InsetMathDots, InsetMathSymbol};
use crate::macro_inset::{ArgumentProxy, MathMacro};
use crate::metrics::{MetricsInfo, PainterInfo};
use crate::row::MathRow;
use crate::script::InsetMathScript;
use crate::sideset::InsetMathSideset;
use crate::write::{HtmlStream, LaTeXFeatures, MathMLStream, WriteStream};
use render_model::{Color, LineStyle, Painter as _};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cursor-trace decoration drawn around an inset the cursor is inside
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Marker {
    /// No decoration
    #[default]
    None,
    /// Small corner brackets below the box
    Corner,
    /// Full dotted frame (used by macros in edit mode)
    Frame,
}

/// The polymorphic contract every math construct implements
pub trait InsetMath {
    /// Compute this construct's extent from context and children.
    /// Must not draw; children's metrics are computed (and cached) first.
    fn metrics(&self, mi: &mut MetricsInfo, dim: &mut Dimension);

    /// Paint at (x, y) = (left edge, baseline), consistent with the
    /// dimension from the preceding metrics call.
    fn draw(&self, pi: &mut PainterInfo, x: i32, y: i32);

    /// Serialize to LaTeX form
    fn write(&self, ws: &mut WriteStream) -> fmt::Result;

    /// Class used by the spacing algorithm. Composites report the class
    /// of their last rendered atom.
    fn math_class(&self) -> MathClass {
        MathClass::Ord
    }

    /// Cursor-trace marker at the given macro nesting depth
    fn marker(&self, nesting: usize) -> Marker {
        let _ = nesting;
        Marker::None
    }

    /// Number of editable cells
    fn nargs(&self) -> usize {
        0
    }

    /// Editable cell by index
    fn cell(&self, idx: usize) -> Option<&MathData> {
        let _ = idx;
        None
    }

    fn cell_mut(&mut self, idx: usize) -> Option<&mut MathData> {
        let _ = idx;
        None
    }

    /// Move the cursor to the next cell; false when leaving the inset
    fn idx_forward(&self, cur: &mut CursorSlice) -> bool {
        if self.nargs() > 0 && cur.idx + 1 < self.nargs() {
            *cur = CursorSlice::front_of(cur.idx + 1);
            true
        } else {
            false
        }
    }

    /// Move the cursor to the previous cell; false when leaving the inset
    fn idx_backward(&self, cur: &mut CursorSlice) -> bool {
        if cur.idx > 0 {
            let idx = cur.idx - 1;
            let len = self.cell(idx).map_or(0, |cell| cell.len());
            *cur = CursorSlice::back_of(idx, len);
            true
        } else {
            false
        }
    }

    /// Move the cursor up or down; false when the motion leaves the inset
    fn idx_up_down(&self, cur: &mut CursorSlice, up: bool) -> bool {
        let _ = (cur, up);
        false
    }

    /// Right-edge kerning metadata consumed by script placement
    fn kerning(&self) -> i32 {
        0
    }

    /// Whether this is a large operator that takes limits in display style
    fn is_large_operator(&self) -> bool {
        false
    }

    /// Record packages/CSS the exported form depends on
    fn validate(&self, features: &mut dyn LaTeXFeatures) {
        let _ = features;
    }

    /// Minimal MathML form
    fn mathmlize(&self, ms: &mut MathMLStream) -> MathedResult<()>;

    /// Minimal HTML form
    fn htmlize(&self, hs: &mut HtmlStream) -> MathedResult<()>;
}

/// The closed set of math construct kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Inset {
    Char(InsetMathChar),
    Symbol(InsetMathSymbol),
    Dots(InsetMathDots),
    Class(InsetMathClass),
    Script(InsetMathScript),
    Frac(InsetMathFrac),
    Binom(InsetMathBinom),
    Delim(InsetMathDelim),
    Big(InsetMathBig),
    Sideset(InsetMathSideset),
    Grid(InsetMathGrid),
    Macro(MathMacro),
    ArgProxy(ArgumentProxy),
}

macro_rules! dispatch {
    ($self:expr, $inner:ident => $body:expr) => {
        match $self {
            Inset::Char($inner) => $body,
            Inset::Symbol($inner) => $body,
            Inset::Dots($inner) => $body,
            Inset::Class($inner) => $body,
            Inset::Script($inner) => $body,
            Inset::Frac($inner) => $body,
            Inset::Binom($inner) => $body,
            Inset::Delim($inner) => $body,
            Inset::Big($inner) => $body,
            Inset::Sideset($inner) => $body,
            Inset::Grid($inner) => $body,
            Inset::Macro($inner) => $body,
            Inset::ArgProxy($inner) => $body,
        }
    };
}

impl Inset {
    /// Metrics plus dimension-cache recording
    pub fn compute_metrics(&self, mi: &mut MetricsInfo, dim: &mut Dimension) {
        dim.clear();
        dispatch!(self, inner => inner.metrics(mi, dim));
        mi.coords.insets.add_dim(addr_of(self), *dim);
    }

    /// Draw plus position-cache recording and marker decoration
    pub fn draw_at(&self, pi: &mut PainterInfo, x: i32, y: i32) {
        pi.coords.insets.add_pos(addr_of(self), x, y);
        dispatch!(self, inner => inner.draw(pi, x, y));
        let marker = self.marker(pi.base.macro_nesting);
        if marker != Marker::None {
            self.draw_marker(pi, x, y, marker);
        }
    }

    fn draw_marker(&self, pi: &mut PainterInfo, x: i32, y: i32, marker: Marker) {
        let Some(dim) = pi.coords.insets.dim(addr_of(self)) else {
            return;
        };
        let t = pi.base.dotted_line_thickness();
        match marker {
            Marker::None => {}
            Marker::Corner => {
                // Small angle brackets at the bottom corners
                let d = y + dim.descent + 1;
                pi.pain
                    .line(x, d - 3, x, d, Color::GREY, LineStyle::Solid, t);
                pi.pain.line(
                    x + dim.width,
                    d - 3,
                    x + dim.width,
                    d,
                    Color::GREY,
                    LineStyle::Solid,
                    t,
                );
                pi.pain
                    .line(x, d, x + dim.width, d, Color::GREY, LineStyle::Solid, t);
            }
            Marker::Frame => {
                pi.pain.rectangle(
                    x,
                    y - dim.ascent,
                    dim.width,
                    dim.height(),
                    Color::GREY,
                    LineStyle::Dotted,
                    t,
                );
            }
        }
    }

    /// Append this construct's row elements during linearization.
    /// Leaves and composites contribute one element; macros dissolve.
    pub fn add_to_math_row<'a>(&'a self, row: &mut MathRow<'a>, nesting: usize) {
        match self {
            Inset::Macro(mac) => mac.add_to_math_row(self, row, nesting),
            _ => row.push_inset(self, nesting),
        }
    }

    // Capability accessors

    pub fn as_char(&self) -> Option<&InsetMathChar> {
        match self {
            Inset::Char(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&InsetMathSymbol> {
        match self {
            Inset::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_script(&self) -> Option<&InsetMathScript> {
        match self {
            Inset::Script(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_script_mut(&mut self) -> Option<&mut InsetMathScript> {
        match self {
            Inset::Script(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_frac(&self) -> Option<&InsetMathFrac> {
        match self {
            Inset::Frac(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_grid(&self) -> Option<&InsetMathGrid> {
        match self {
            Inset::Grid(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_grid_mut(&mut self) -> Option<&mut InsetMathGrid> {
        match self {
            Inset::Grid(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_macro(&self) -> Option<&MathMacro> {
        match self {
            Inset::Macro(m) => Some(m),
            _ => None,
        }
    }
}

impl InsetMath for Inset {
    fn metrics(&self, mi: &mut MetricsInfo, dim: &mut Dimension) {
        self.compute_metrics(mi, dim);
    }

    fn draw(&self, pi: &mut PainterInfo, x: i32, y: i32) {
        self.draw_at(pi, x, y);
    }

    fn write(&self, ws: &mut WriteStream) -> fmt::Result {
        dispatch!(self, inner => inner.write(ws))
    }

    fn math_class(&self) -> MathClass {
        dispatch!(self, inner => inner.math_class())
    }

    fn marker(&self, nesting: usize) -> Marker {
        dispatch!(self, inner => inner.marker(nesting))
    }

    fn nargs(&self) -> usize {
        dispatch!(self, inner => inner.nargs())
    }

    fn cell(&self, idx: usize) -> Option<&MathData> {
        dispatch!(self, inner => inner.cell(idx))
    }

    fn cell_mut(&mut self, idx: usize) -> Option<&mut MathData> {
        dispatch!(self, inner => inner.cell_mut(idx))
    }

    fn idx_forward(&self, cur: &mut CursorSlice) -> bool {
        dispatch!(self, inner => inner.idx_forward(cur))
    }

    fn idx_backward(&self, cur: &mut CursorSlice) -> bool {
        dispatch!(self, inner => inner.idx_backward(cur))
    }

    fn idx_up_down(&self, cur: &mut CursorSlice, up: bool) -> bool {
        dispatch!(self, inner => inner.idx_up_down(cur, up))
    }

    fn kerning(&self) -> i32 {
        dispatch!(self, inner => inner.kerning())
    }

    fn is_large_operator(&self) -> bool {
        dispatch!(self, inner => inner.is_large_operator())
    }

    fn validate(&self, features: &mut dyn LaTeXFeatures) {
        dispatch!(self, inner => inner.validate(features))
    }

    fn mathmlize(&self, ms: &mut MathMLStream) -> MathedResult<()> {
        dispatch!(self, inner => inner.mathmlize(ms))
    }

    fn htmlize(&self, hs: &mut HtmlStream) -> MathedResult<()> {
        dispatch!(self, inner => inner.htmlize(hs))
    }
}

/// Single-owner box around one inset; cloning deep-copies the subtree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MathAtom(Box<Inset>);

impl MathAtom {
    pub fn new(inset: Inset) -> Self {
        Self(Box::new(inset))
    }

    /// Shorthand for a plain character atom
    pub fn char(c: char) -> Self {
        Self::new(Inset::Char(InsetMathChar::new(c)))
    }

    pub fn nucleus(&self) -> &Inset {
        &self.0
    }

    pub fn nucleus_mut(&mut self) -> &mut Inset {
        &mut self.0
    }

    /// Take ownership of the inset, consuming the atom
    pub fn into_inset(self) -> Inset {
        *self.0
    }
}

impl std::ops::Deref for MathAtom {
    type Target = Inset;
    fn deref(&self) -> &Inset {
        &self.0
    }
}

impl std::ops::DerefMut for MathAtom {
    fn deref_mut(&mut self) -> &mut Inset {
        &mut self.0
    }
}

impl From<Inset> for MathAtom {
    fn from(inset: Inset) -> Self {
        Self::new(inset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atom_deref() {
        let atom = MathAtom::char('x');
        assert_eq!(atom.math_class(), MathClass::Ord);
        assert!(atom.as_char().is_some());
    }

    #[test]
    fn test_capability_accessors_are_exclusive() {
        let atom = MathAtom::char('+');
        assert!(atom.as_char().is_some());
        assert!(atom.as_grid().is_none());
        assert!(atom.as_script().is_none());
    }

    #[test]
    fn test_clone_is_deep() {
        let atom = MathAtom::char('x');
        let copy = atom.clone();
        assert_eq!(atom, copy);
        assert_ne!(
            crate::coords::addr_of(atom.nucleus()),
            crate::coords::addr_of(copy.nucleus())
        );
    }
}
