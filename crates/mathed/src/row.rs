//! MathRow - linearization and the final spacing pass
//!
//! A cell's atom tree is flattened into one sequence of typed elements,
//! dissolving macro expansions so their contents participate in spacing as
//! if textually substituted. Classes are then fixed up against final
//! neighbors and inter-element spacing is distributed in a single
//! left-to-right pass. The row borrows the tree it observes and lives for
//! one layout pass only.

use crate::class::{class_spacing, update_class, MathClass};
use crate::coords::addr_of;
use crate::data::MathData;
use crate::dimension::Dimension;
use crate::inset::{Inset, InsetMath, Marker};
use crate::metrics::{ChangeContext, MetricsBase, MetricsInfo, PainterInfo};
use render_model::{Color, LineStyle, Painter as _};
use tracing::error;

/// What one flat element stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// Sentinel carrying only class and folded spacing
    Dummy,
    /// A real inset to measure and draw
    Inset,
    /// Placeholder box synthesized for an empty cell
    Box,
    /// Start of a dissolved span (macro expansion or nested cell)
    Begin,
    /// End of a dissolved span
    End,
}

/// One element of the flattened row
#[derive(Debug, Clone)]
pub struct Element<'a> {
    pub kind: ElementKind,
    pub mclass: MathClass,
    /// Spacing in pixels on each side, filled by the spacing pass
    pub before: i32,
    pub after: i32,
    /// Macro-expansion depth this element sits at
    pub macro_nesting: usize,
    pub marker: Marker,
    /// Borrowed tree references; valid for this layout pass only
    pub inset: Option<&'a Inset>,
    pub cell: Option<&'a MathData>,
    /// Inline completion suggestion shown after the element
    pub compl_text: String,
    /// Length of the unambiguous completion prefix
    pub compl_unique_to: usize,
    pub color: Color,
}

impl<'a> Element<'a> {
    fn new(kind: ElementKind, mclass: MathClass) -> Self {
        Self {
            kind,
            mclass,
            before: 0,
            after: 0,
            macro_nesting: 0,
            marker: Marker::None,
            inset: None,
            cell: None,
            compl_text: String::new(),
            compl_unique_to: 0,
            color: Color::BLACK,
        }
    }

    /// Whether this element takes part in class spacing
    fn classed(&self) -> bool {
        matches!(
            self.kind,
            ElementKind::Dummy | ElementKind::Inset | ElementKind::Box
        )
    }
}

/// The flattened, spaced form of one cell
pub struct MathRow<'a> {
    elements: Vec<Element<'a>>,
}

impl<'a> MathRow<'a> {
    /// Linearize `cell` and compute final spacing.
    ///
    /// The first and last elements are always OPEN/CLOSE dummy sentinels, and
    /// at least one interior element exists (a placeholder box if the cell is
    /// empty), so downstream loops never run off the ends.
    pub fn new(base: &MetricsBase, cell: &'a MathData) -> Self {
        let mut row = Self {
            elements: Vec::with_capacity(cell.len() + 2),
        };
        row.elements
            .push(Element::new(ElementKind::Dummy, MathClass::Open));

        for atom in cell.iter() {
            atom.add_to_math_row(&mut row, base.macro_nesting);
        }

        if !row.elements.iter().any(|e| e.kind != ElementKind::Dummy) {
            let mut boxed = Element::new(ElementKind::Box, MathClass::Ord);
            boxed.macro_nesting = base.macro_nesting;
            boxed.color = Color::GREY;
            row.elements.push(boxed);
        }

        row.elements
            .push(Element::new(ElementKind::Dummy, MathClass::Close));

        if !base.text_mode {
            row.reclassify();
            row.space(base);
        }
        row.reserve_marker_space();
        row
    }

    /// Append one inset element (the default linearization of a construct)
    pub fn push_inset(&mut self, inset: &'a Inset, nesting: usize) {
        let mut element = Element::new(ElementKind::Inset, inset.math_class());
        element.macro_nesting = nesting;
        element.marker = inset.marker(nesting);
        element.inset = Some(inset);
        self.elements.push(element);
    }

    /// Open a dissolved span (macro expansion or nested cell)
    pub fn push_begin(&mut self, inset: Option<&'a Inset>, cell: Option<&'a MathData>, nesting: usize) {
        let mut element = Element::new(ElementKind::Begin, MathClass::Unknown);
        element.macro_nesting = nesting;
        element.inset = inset;
        element.cell = cell;
        self.elements.push(element);
    }

    /// Close a dissolved span; must pair with the latest open Begin
    pub fn push_end(&mut self, inset: Option<&'a Inset>, cell: Option<&'a MathData>, nesting: usize) {
        let mut element = Element::new(ElementKind::End, MathClass::Unknown);
        element.macro_nesting = nesting;
        element.inset = inset;
        element.cell = cell;
        self.elements.push(element);
    }

    pub fn elements(&self) -> &[Element<'a>] {
        &self.elements
    }

    pub fn front(&self) -> &Element<'a> {
        self.elements.first().expect("row always has sentinels")
    }

    pub fn back(&self) -> &Element<'a> {
        self.elements.last().expect("row always has sentinels")
    }

    /// Index of the previous spacing-relevant element before `i`
    fn prev_classed(&self, i: usize) -> Option<usize> {
        (0..i).rev().find(|&j| self.elements[j].classed())
    }

    /// Index of the next spacing-relevant element after `i`
    fn next_classed(&self, i: usize) -> Option<usize> {
        (i + 1..self.elements.len()).find(|&j| self.elements[j].classed())
    }

    /// TeXbook Appendix G rules 5-6 over interior elements, left to right
    fn reclassify(&mut self) {
        for i in 1..self.elements.len() - 1 {
            if !self.elements[i].classed() {
                continue;
            }
            let prev = self
                .prev_classed(i)
                .map_or(MathClass::Open, |j| self.elements[j].mclass);
            let next = self
                .next_classed(i)
                .map_or(MathClass::Close, |j| self.elements[j].mclass);
            update_class(&mut self.elements[i].mclass, prev, next);
        }
    }

    /// Distribute inter-class spacing. The gap between two elements is
    /// split floor-half onto the previous element's `after` and ceil-half
    /// onto the current element's `before`; pairing the sentinels in means
    /// edge spacing folds into them instead of being discarded.
    fn space(&mut self, base: &MetricsBase) {
        for i in 1..self.elements.len() {
            if !self.elements[i].classed() {
                continue;
            }
            let Some(prev) = self.prev_classed(i) else {
                continue;
            };
            let gap = class_spacing(self.elements[prev].mclass, self.elements[i].mclass, base);
            let half = gap / 2;
            self.elements[prev].after += half;
            self.elements[i].before += gap - half;
        }
    }

    /// Markers must never be swallowed by zero-spacing class pairs
    fn reserve_marker_space(&mut self) {
        for element in &mut self.elements {
            if element.marker != Marker::None {
                element.before = element.before.max(1);
                element.after = element.after.max(1);
            }
        }
    }

    /// Placeholder extent for the synthesized empty-cell box
    fn placeholder_dim(base: &MetricsBase) -> Dimension {
        let em = base.em();
        Dimension::new((em / 2).max(4), (em / 2).max(4), 0)
    }

    /// Extra vertical room for the corner-marker decoration
    fn marker_cushion(marker: Marker) -> i32 {
        match marker {
            Marker::None => 0,
            Marker::Corner | Marker::Frame => 2,
        }
    }

    /// Measure the whole row. Begin/End pairs are tracked on explicit
    /// stacks so the total footprint of each dissolved span is recorded in
    /// the coordinate cache under the original inset/cell, even though no
    /// single element owns it after flattening.
    pub fn metrics(&self, mi: &mut MetricsInfo, dim: &mut Dimension) {
        dim.clear();
        let mut inset_stack: Vec<(usize, i32)> = Vec::new();
        let mut cell_stack: Vec<(usize, i32)> = Vec::new();

        for element in &self.elements {
            dim.width += element.before;
            match element.kind {
                ElementKind::Dummy => {}
                ElementKind::Inset => {
                    let inset = element.inset.expect("inset element without inset");
                    let mut d = Dimension::default();
                    {
                        // Dissolved macro contents measure at the depth
                        // they were linearized at
                        let mut mi2 = mi.change_nesting_to(element.macro_nesting);
                        inset.compute_metrics(&mut mi2, &mut d);
                    }
                    d.descent += Self::marker_cushion(element.marker);
                    *dim += d;
                }
                ElementKind::Box => {
                    *dim += Self::placeholder_dim(&mi.base);
                }
                ElementKind::Begin => {
                    if let Some(inset) = element.inset {
                        inset_stack.push((addr_of(inset), dim.width));
                    }
                    if let Some(cell) = element.cell {
                        cell_stack.push((addr_of(cell), dim.width));
                    }
                }
                ElementKind::End => {
                    if let Some(inset) = element.inset {
                        Self::close_span(&mut inset_stack, addr_of(inset), dim, |addr, d| {
                            mi.coords.insets.add_dim(addr, d);
                        });
                    }
                    if let Some(cell) = element.cell {
                        Self::close_span(&mut cell_stack, addr_of(cell), dim, |addr, d| {
                            mi.coords.cells.add_dim(addr, d);
                        });
                    }
                }
            }
            dim.width += element.after;
        }

        debug_assert!(
            inset_stack.is_empty() && cell_stack.is_empty(),
            "unbalanced BEGIN/END in math row"
        );
    }

    fn close_span(
        stack: &mut Vec<(usize, i32)>,
        addr: usize,
        dim: &Dimension,
        mut record: impl FnMut(usize, Dimension),
    ) {
        match stack.pop() {
            Some((open_addr, start_x)) => {
                if open_addr != addr {
                    error!("math row END does not match its BEGIN");
                    debug_assert!(false, "mismatched BEGIN/END pair");
                    return;
                }
                let span = Dimension::new(dim.width - start_x, dim.ascent, dim.descent);
                record(addr, span);
            }
            None => {
                error!("math row END without a BEGIN");
                debug_assert!(false, "END without BEGIN");
            }
        }
    }

    /// Draw the row at (x, y) = (left edge, baseline), advancing through
    /// the same spacing the metrics pass accounted for.
    pub fn draw(&self, pi: &mut PainterInfo, x: i32, y: i32) {
        let mut cx = x;
        let mut inset_stack: Vec<(usize, i32)> = Vec::new();
        let mut cell_stack: Vec<(usize, i32)> = Vec::new();

        for element in &self.elements {
            cx += element.before;
            match element.kind {
                ElementKind::Dummy => {}
                ElementKind::Inset => {
                    let inset = element.inset.expect("inset element without inset");
                    {
                        let mut pi2 = pi.change_nesting_to(element.macro_nesting);
                        inset.draw_at(&mut pi2, cx, y);
                    }
                    let width = pi
                        .coords
                        .insets
                        .dim(addr_of(inset))
                        .map_or(0, |d| d.width);
                    cx += width;
                }
                ElementKind::Box => {
                    let d = Self::placeholder_dim(&pi.base);
                    if element.macro_nesting == 0 {
                        pi.pain.rectangle(
                            cx + 1,
                            y - d.ascent + 1,
                            d.width - 2,
                            d.height() - 2,
                            element.color,
                            LineStyle::Dotted,
                            pi.base.dotted_line_thickness(),
                        );
                    }
                    cx += d.width;
                }
                ElementKind::Begin => {
                    if let Some(inset) = element.inset {
                        inset_stack.push((addr_of(inset), cx));
                    }
                    if let Some(cell) = element.cell {
                        cell_stack.push((addr_of(cell), cx));
                    }
                }
                ElementKind::End => {
                    if let Some(inset) = element.inset {
                        if let Some((addr, sx)) = inset_stack.pop() {
                            debug_assert_eq!(addr, addr_of(inset));
                            pi.coords.insets.add_pos(addr, sx, y);
                        }
                    }
                    if let Some(cell) = element.cell {
                        if let Some((addr, sx)) = cell_stack.pop() {
                            debug_assert_eq!(addr, addr_of(cell));
                            pi.coords.cells.add_pos(addr, sx, y);
                        }
                    }
                }
            }
            cx += element.after;
        }
    }

    /// Total width contribution of spacing alone (diagnostics and tests)
    pub fn total_spacing(&self) -> i32 {
        self.elements.iter().map(|e| e.before + e.after).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::CoordCache;
    use crate::font::{FontInfo, MathStyle};
    use crate::inset::MathAtom;
    use render_model::ApproxFontMetrics;

    fn base() -> MetricsBase {
        MetricsBase::new(FontInfo::new(18.0, MathStyle::Text), 600)
    }

    #[test]
    fn test_sentinel_invariant() {
        let cell = MathData::from_str_atoms("ab");
        let b = base();
        let row = MathRow::new(&b, &cell);
        assert_eq!(row.front().kind, ElementKind::Dummy);
        assert_eq!(row.front().mclass, MathClass::Open);
        assert_eq!(row.back().kind, ElementKind::Dummy);
        assert_eq!(row.back().mclass, MathClass::Close);
    }

    #[test]
    fn test_empty_cell_synthesizes_box() {
        let cell = MathData::new();
        let b = base();
        let row = MathRow::new(&b, &cell);
        assert_eq!(row.elements().len(), 3);
        assert_eq!(row.elements()[1].kind, ElementKind::Box);
    }

    #[test]
    fn test_ord_bin_ord_keeps_bin_and_gets_med_spacing() {
        let cell = MathData::from_str_atoms("a+b");
        let b = base();
        let row = MathRow::new(&b, &cell);
        let elements = row.elements();
        assert_eq!(elements[2].mclass, MathClass::Bin);
        let med = b.med_space();
        assert!(med > 0);
        // Spacing around the Bin totals one med skip on each side
        assert_eq!(elements[1].after + elements[2].before, med);
        assert_eq!(elements[2].after + elements[3].before, med);
    }

    #[test]
    fn test_leading_bin_becomes_ord() {
        let cell = MathData::from_str_atoms("+a");
        let b = base();
        let row = MathRow::new(&b, &cell);
        assert_eq!(row.elements()[1].mclass, MathClass::Ord);
        assert_eq!(row.elements()[1].before, 0);
    }

    #[test]
    fn test_rounding_split_prefers_current() {
        // Force an odd gap: pick a size where the med skip is odd
        let mut b = base();
        b.font.base_size = 13.5; // em 14 -> med = round(56/18) = 3
        let cell = MathData::from_str_atoms("a+b");
        let row = MathRow::new(&b, &cell);
        let gap = b.med_space();
        assert_eq!(gap % 2, 1);
        let elements = row.elements();
        // floor half on the previous element, ceil half on the current one
        assert_eq!(elements[1].after, gap / 2);
        assert_eq!(elements[2].before, gap - gap / 2);
    }

    #[test]
    fn test_script_style_collapses_bin_spacing() {
        let mut b = base();
        b.font.style = MathStyle::Script;
        let cell = MathData::from_str_atoms("a+b");
        let row = MathRow::new(&b, &cell);
        assert_eq!(row.total_spacing(), 0);
    }

    #[test]
    fn test_text_mode_skips_spacing() {
        let mut b = base();
        b.text_mode = true;
        let cell = MathData::from_str_atoms("a+b");
        let row = MathRow::new(&b, &cell);
        assert_eq!(row.total_spacing(), 0);
    }

    #[test]
    fn test_metrics_width_includes_spacing() {
        let fonts = ApproxFontMetrics;
        let mut coords = CoordCache::new();
        let b = base();
        let cell = MathData::from_str_atoms("a+b");
        let row = MathRow::new(&b, &cell);
        let spacing = row.total_spacing();
        let mut mi = MetricsInfo::new(&fonts, &mut coords, b);
        let mut dim = Dimension::default();
        row.metrics(&mut mi, &mut dim);
        let glyphs: i32 = cell
            .iter()
            .map(|a| mi.coords.insets.dim(addr_of(a.nucleus())).unwrap().width)
            .sum();
        assert_eq!(dim.width, glyphs + spacing);
    }

    #[test]
    fn test_class_inset_forced_bin_is_reclassified_at_edge() {
        use crate::leaf::InsetMathClass;
        // A lone \mathbin{x}: Bin with sentinels on both sides becomes Ord
        let mut cell = MathData::new();
        cell.push(MathAtom::new(Inset::Class(InsetMathClass::new(
            MathClass::Bin,
            MathData::from_str_atoms("x"),
        ))));
        let b = base();
        let row = MathRow::new(&b, &cell);
        assert_eq!(row.elements()[1].mclass, MathClass::Ord);
    }
}
