//! Super/subscript inset
//!
//! The shape is a closed sum type, so a script node with an invalid cell
//! count is unrepresentable. Vertical placement follows the TeX arithmetic:
//! drops and rises start from the nucleus box, are adjusted by the
//! nucleus's script level and kerning metadata, and when both scripts are
//! present a minimum gap between their boxes is enforced by growing the
//! pair, never letting the superscript sink to the nucleus level.

use crate::class::MathClass;
use crate::coords::addr_of;
use crate::cursor::CursorSlice;
use crate::data::MathData;
use crate::dimension::Dimension;
use crate::error::MathedResult;
use crate::inset::{InsetMath, Marker};
use crate::metrics::{ChangeContext, MetricsInfo, PainterInfo};
use crate::write::{HtmlStream, MathMLStream, WriteStream};
use render_model::FontMetrics;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write as _;

/// Which script cells exist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScriptShape {
    /// Transient shape right after both scripts were removed
    NucleusOnly { nuc: MathData },
    Sup { nuc: MathData, sup: MathData },
    Sub { nuc: MathData, sub: MathData },
    SubSup {
        nuc: MathData,
        sub: MathData,
        sup: MathData,
    },
}

/// Explicit limits preference on the nucleus operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Limits {
    /// Stacked for large operators in display style, diagonal otherwise
    #[default]
    Auto,
    /// Always stacked above/below
    Limits,
    /// Never stacked
    NoLimits,
}

/// Structural edit queued when the cursor leaves an emptied script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptCollapse {
    /// Replace the whole inset by its bare nucleus content
    ToNucleus,
    /// Remove the empty subscript, keep the superscript
    DropSub,
    /// Remove the empty superscript, keep the subscript
    DropSup,
}

/// Minimum vertical gap between superscript and subscript boxes
const SCRIPT_GAP: i32 = 2;

/// The TeX-faithful vertical placement of diagonal scripts around a nucleus
/// box. Returns (rise of the superscript baseline, drop of the subscript
/// baseline), both relative to the nucleus baseline.
///
/// The subscript may poke at most half an x-height above its own baseline
/// toward the nucleus; a non-char nucleus pushes it further down by its
/// descent. Tall nuclei raise the superscript floor, and when both scripts
/// are present the pair grows (ceil-half upward) until their boxes are at
/// least `SCRIPT_GAP` apart, without letting the superscript sink below its
/// floor.
pub(crate) fn script_offsets(
    base: &crate::metrics::MetricsBase,
    fonts: &dyn render_model::FontMetrics,
    nd: Dimension,
    sub_dim: Option<Dimension>,
    sup_dim: Option<Dimension>,
    is_char_box: bool,
) -> (i32, i32) {
    let font = base.font.text_style();
    let em = base.em();
    let x_h = fonts.x_height(&font);
    let sub_std = em / 4;
    let sup_std = 2 * em / 5;

    let mut dy_down = 0;
    if let Some(subd) = sub_dim {
        let slevel = x_h / 2;
        let ascdrop = subd.ascent - slevel;
        let desdrop = if is_char_box {
            sub_std
        } else {
            nd.descent + sub_std
        };
        dy_down = ascdrop.max(desdrop).max(sub_std);
    }

    let mut min_rise = 0;
    let mut dy_up = 0;
    if let Some(supd) = sup_dim {
        min_rise = if is_char_box {
            x_h
        } else {
            x_h.max(nd.ascent - sup_std)
        };
        dy_up = (supd.descent + sup_std).max(min_rise);
    }

    if let (Some(subd), Some(supd)) = (sub_dim, sup_dim) {
        let gap = (dy_up - supd.descent) + (dy_down - subd.ascent);
        if gap < SCRIPT_GAP {
            let deficit = SCRIPT_GAP - gap;
            let up_extra = (deficit + 1) / 2;
            dy_up += up_extra;
            dy_down += deficit - up_extra;
            dy_up = dy_up.max(min_rise);
        }
    }

    (dy_up, dy_down)
}

/// A nucleus with attached super/subscripts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsetMathScript {
    shape: ScriptShape,
    limits: Limits,
}

impl InsetMathScript {
    pub fn with_sup(nuc: MathData, sup: MathData) -> Self {
        Self {
            shape: ScriptShape::Sup { nuc, sup },
            limits: Limits::Auto,
        }
    }

    pub fn with_sub(nuc: MathData, sub: MathData) -> Self {
        Self {
            shape: ScriptShape::Sub { nuc, sub },
            limits: Limits::Auto,
        }
    }

    pub fn with_sub_sup(nuc: MathData, sub: MathData, sup: MathData) -> Self {
        Self {
            shape: ScriptShape::SubSup { nuc, sub, sup },
            limits: Limits::Auto,
        }
    }

    pub fn set_limits(&mut self, limits: Limits) {
        self.limits = limits;
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    pub fn shape(&self) -> &ScriptShape {
        &self.shape
    }

    pub fn nuc(&self) -> &MathData {
        match &self.shape {
            ScriptShape::NucleusOnly { nuc }
            | ScriptShape::Sup { nuc, .. }
            | ScriptShape::Sub { nuc, .. }
            | ScriptShape::SubSup { nuc, .. } => nuc,
        }
    }

    pub fn down(&self) -> Option<&MathData> {
        match &self.shape {
            ScriptShape::Sub { sub, .. } | ScriptShape::SubSup { sub, .. } => Some(sub),
            _ => None,
        }
    }

    pub fn up(&self) -> Option<&MathData> {
        match &self.shape {
            ScriptShape::Sup { sup, .. } | ScriptShape::SubSup { sup, .. } => Some(sup),
            _ => None,
        }
    }

    pub fn has_down(&self) -> bool {
        self.down().is_some()
    }

    pub fn has_up(&self) -> bool {
        self.up().is_some()
    }

    /// Cell index of the subscript, when present (nucleus is always 0)
    fn down_idx(&self) -> Option<usize> {
        self.has_down().then_some(1)
    }

    /// Cell index of the superscript, when present
    fn up_idx(&self) -> Option<usize> {
        match &self.shape {
            ScriptShape::Sup { .. } => Some(1),
            ScriptShape::SubSup { .. } => Some(2),
            _ => None,
        }
    }

    /// Whether scripts stack above/below instead of attaching diagonally
    pub fn has_limits(&self, style: crate::font::MathStyle) -> bool {
        match self.limits {
            Limits::Limits => true,
            Limits::NoLimits => false,
            Limits::Auto => {
                style == crate::font::MathStyle::Display
                    && self
                        .nuc()
                        .last()
                        .is_some_and(|atom| atom.is_large_operator())
            }
        }
    }

    /// The structural edit to queue when the cursor leaves this inset,
    /// if any of its script cells has been emptied.
    pub fn notify_cursor_leaves(&self) -> Option<ScriptCollapse> {
        match &self.shape {
            ScriptShape::NucleusOnly { .. } => Some(ScriptCollapse::ToNucleus),
            ScriptShape::Sup { sup, .. } if sup.is_empty() => Some(ScriptCollapse::ToNucleus),
            ScriptShape::Sub { sub, .. } if sub.is_empty() => Some(ScriptCollapse::ToNucleus),
            ScriptShape::SubSup { sub, sup, .. } => match (sub.is_empty(), sup.is_empty()) {
                (true, true) => Some(ScriptCollapse::ToNucleus),
                (true, false) => Some(ScriptCollapse::DropSub),
                (false, true) => Some(ScriptCollapse::DropSup),
                (false, false) => None,
            },
            _ => None,
        }
    }

    /// Apply a branch-dropping collapse in place (ToNucleus is handled by
    /// the owning cell, which splices the nucleus contents in)
    pub fn apply_collapse(&mut self, collapse: ScriptCollapse) {
        match (collapse, &mut self.shape) {
            (ScriptCollapse::DropSub, ScriptShape::SubSup { nuc, sup, .. }) => {
                self.shape = ScriptShape::Sup {
                    nuc: std::mem::take(nuc),
                    sup: std::mem::take(sup),
                };
            }
            (ScriptCollapse::DropSup, ScriptShape::SubSup { nuc, sub, .. }) => {
                self.shape = ScriptShape::Sub {
                    nuc: std::mem::take(nuc),
                    sub: std::mem::take(sub),
                };
            }
            _ => {}
        }
    }

    /// Vertical placement for diagonal (non-limits) scripts; see
    /// [`script_offsets`]. Depends only on cached dimensions and font
    /// state, so the draw pass recomputes exactly what metrics used.
    fn script_offsets(
        &self,
        base: &crate::metrics::MetricsBase,
        fonts: &dyn render_model::FontMetrics,
        nd: Dimension,
        sub_dim: Option<Dimension>,
        sup_dim: Option<Dimension>,
    ) -> (i32, i32) {
        script_offsets(base, fonts, nd, sub_dim, sup_dim, self.nuc().is_char_box())
    }

    /// Gap between nucleus and a stacked limit
    fn limits_gap() -> i32 {
        SCRIPT_GAP
    }
}

impl InsetMath for InsetMathScript {
    fn metrics(&self, mi: &mut MetricsInfo, dim: &mut Dimension) {
        let mut nd = Dimension::default();
        self.nuc().metrics(mi, &mut nd);

        let mut sub_dim = None;
        let mut sup_dim = None;
        {
            let mut mi2 = mi.change_script();
            if let Some(sub) = self.down() {
                let mut d = Dimension::default();
                sub.metrics(&mut mi2, &mut d);
                sub_dim = Some(d);
            }
            if let Some(sup) = self.up() {
                let mut d = Dimension::default();
                sup.metrics(&mut mi2, &mut d);
                sup_dim = Some(d);
            }
        }

        if self.has_limits(mi.base.font.style) {
            let gap = Self::limits_gap();
            let width = nd
                .width
                .max(sub_dim.map_or(0, |d| d.width))
                .max(sup_dim.map_or(0, |d| d.width));
            dim.width = width;
            dim.ascent = nd.ascent + sup_dim.map_or(0, |d| d.height() + gap);
            dim.descent = nd.descent + sub_dim.map_or(0, |d| d.height() + gap);
        } else {
            let (dy_up, dy_down) = self.script_offsets(&mi.base, mi.fonts, nd, sub_dim, sup_dim);
            let kern = self.nuc().kerning();
            let script_width = sub_dim
                .map_or(0, |d| d.width)
                .max(sup_dim.map_or(0, |d| d.width + kern));
            dim.width = nd.width + script_width + 1;
            dim.ascent = nd.ascent.max(sup_dim.map_or(0, |d| dy_up + d.ascent));
            dim.descent = nd.descent.max(sub_dim.map_or(0, |d| dy_down + d.descent));
        }
    }

    fn draw(&self, pi: &mut PainterInfo, x: i32, y: i32) {
        // Reconstruct offsets from the dimensions cached by metrics
        let nd = pi.coords.cells.dim(addr_of(self.nuc())).unwrap_or_default();
        let sub_dim = self.down().map(|c| pi.coords.cells.dim(addr_of(c)).unwrap_or_default());
        let sup_dim = self.up().map(|c| pi.coords.cells.dim(addr_of(c)).unwrap_or_default());

        if self.has_limits(pi.base.font.style) {
            let gap = Self::limits_gap();
            let width = nd
                .width
                .max(sub_dim.map_or(0, |d| d.width))
                .max(sup_dim.map_or(0, |d| d.width));
            let dxx = (width - nd.width) / 2;
            self.nuc().draw(pi, x + dxx, y);
            if let (Some(sup), Some(supd)) = (self.up(), sup_dim) {
                let dx1 = (width - supd.width) / 2;
                let dy1 = nd.ascent + gap + supd.descent;
                self.draw_script(pi, sup, x + dx1, y - dy1);
            }
            if let (Some(sub), Some(subd)) = (self.down(), sub_dim) {
                let dx0 = (width - subd.width) / 2;
                let dy0 = nd.descent + gap + subd.ascent;
                self.draw_script(pi, sub, x + dx0, y + dy0);
            }
        } else {
            let (dy_up, dy_down) = self.script_offsets(&pi.base, pi.fonts, nd, sub_dim, sup_dim);
            let kern = self.nuc().kerning();
            self.nuc().draw(pi, x, y);
            if let Some(sup) = self.up() {
                self.draw_script(pi, sup, x + nd.width + kern, y - dy_up);
            }
            if let Some(sub) = self.down() {
                self.draw_script(pi, sub, x + nd.width, y + dy_down);
            }
        }
    }

    fn write(&self, ws: &mut WriteStream) -> fmt::Result {
        let nuc = self.nuc();
        match nuc.len() {
            0 => write!(ws, "{{}}")?,
            1 => nuc.write(ws)?,
            _ => {
                write!(ws, "{{")?;
                nuc.write(ws)?;
                write!(ws, "}}")?;
            }
        }
        match self.limits {
            Limits::Auto => {}
            Limits::Limits => ws.command("limits")?,
            Limits::NoLimits => ws.command("nolimits")?,
        }
        if let Some(sub) = self.down() {
            write!(ws, "_{{")?;
            sub.write(ws)?;
            write!(ws, "}}")?;
        }
        if let Some(sup) = self.up() {
            write!(ws, "^{{")?;
            sup.write(ws)?;
            write!(ws, "}}")?;
        }
        Ok(())
    }

    /// Only the rightmost visual atom of a compound determines adjacency
    /// spacing, so a script reports its nucleus tail class.
    fn math_class(&self) -> MathClass {
        self.nuc().last_class()
    }

    fn marker(&self, nesting: usize) -> Marker {
        if nesting == 0 {
            Marker::Corner
        } else {
            Marker::None
        }
    }

    fn nargs(&self) -> usize {
        match &self.shape {
            ScriptShape::NucleusOnly { .. } => 1,
            ScriptShape::Sup { .. } | ScriptShape::Sub { .. } => 2,
            ScriptShape::SubSup { .. } => 3,
        }
    }

    fn cell(&self, idx: usize) -> Option<&MathData> {
        match (&self.shape, idx) {
            (_, 0) => Some(self.nuc()),
            (ScriptShape::Sup { sup, .. }, 1) => Some(sup),
            (ScriptShape::Sub { sub, .. }, 1) => Some(sub),
            (ScriptShape::SubSup { sub, .. }, 1) => Some(sub),
            (ScriptShape::SubSup { sup, .. }, 2) => Some(sup),
            _ => None,
        }
    }

    fn cell_mut(&mut self, idx: usize) -> Option<&mut MathData> {
        match (&mut self.shape, idx) {
            (ScriptShape::NucleusOnly { nuc }, 0)
            | (ScriptShape::Sup { nuc, .. }, 0)
            | (ScriptShape::Sub { nuc, .. }, 0)
            | (ScriptShape::SubSup { nuc, .. }, 0) => Some(nuc),
            (ScriptShape::Sup { sup, .. }, 1) => Some(sup),
            (ScriptShape::Sub { sub, .. }, 1) => Some(sub),
            (ScriptShape::SubSup { sub, .. }, 1) => Some(sub),
            (ScriptShape::SubSup { sup, .. }, 2) => Some(sup),
            _ => None,
        }
    }

    fn idx_up_down(&self, cur: &mut CursorSlice, up: bool) -> bool {
        let nuc_len = self.nuc().len();
        if cur.idx == 0 {
            // Leaving the nucleus only succeeds at its ends (always with
            // explicit limits)
            let allowed =
                cur.pos == 0 || cur.pos == nuc_len || self.limits == Limits::Limits;
            if !allowed {
                return false;
            }
            let target = if up { self.up_idx() } else { self.down_idx() };
            match target {
                Some(idx) => {
                    *cur = CursorSlice::front_of(idx);
                    true
                }
                None => false,
            }
        } else if Some(cur.idx) == self.down_idx() && up {
            // From the subscript, up returns to the nucleus tail
            *cur = CursorSlice::back_of(0, nuc_len);
            true
        } else if Some(cur.idx) == self.up_idx() && !up {
            // From the superscript, down returns to the nucleus tail
            *cur = CursorSlice::back_of(0, nuc_len);
            true
        } else {
            false
        }
    }

    fn kerning(&self) -> i32 {
        // The script pair ends flush; no residual kerning
        0
    }

    fn mathmlize(&self, ms: &mut MathMLStream) -> MathedResult<()> {
        let (tag, cells): (&str, Vec<&MathData>) = match &self.shape {
            ScriptShape::NucleusOnly { nuc } => ("mrow", vec![nuc]),
            ScriptShape::Sup { nuc, sup } => ("msup", vec![nuc, sup]),
            ScriptShape::Sub { nuc, sub } => ("msub", vec![nuc, sub]),
            ScriptShape::SubSup { nuc, sub, sup } => ("msubsup", vec![nuc, sub, sup]),
        };
        ms.open(tag)?;
        for cell in cells {
            ms.open("mrow")?;
            cell.mathmlize(ms)?;
            ms.close("mrow")?;
        }
        ms.close(tag)
    }

    fn htmlize(&self, hs: &mut HtmlStream) -> MathedResult<()> {
        self.nuc().htmlize(hs)?;
        if let Some(sub) = self.down() {
            hs.open_span("sub")?;
            sub.htmlize(hs)?;
            hs.close_span()?;
        }
        if let Some(sup) = self.up() {
            hs.open_span("sup")?;
            sup.htmlize(hs)?;
            hs.close_span()?;
        }
        Ok(())
    }
}

impl InsetMathScript {
    fn draw_script(&self, pi: &mut PainterInfo, cell: &MathData, x: i32, y: i32) {
        let mut pi2 = pi.change_script();
        cell.draw(&mut pi2, x, y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::CoordCache;
    use crate::font::{FontInfo, MathStyle};
    use crate::inset::{Inset, MathAtom};
    use crate::leaf::InsetMathSymbol;
    use crate::metrics::MetricsBase;
    use render_model::ApproxFontMetrics;

    fn measure(script: &InsetMathScript, style: MathStyle) -> (Dimension, CoordCache) {
        let fonts = ApproxFontMetrics;
        let mut coords = CoordCache::new();
        let mut dim = Dimension::default();
        {
            let mut mi = MetricsInfo::new(
                &fonts,
                &mut coords,
                MetricsBase::new(FontInfo::new(12.0, style), 600),
            );
            script.metrics(&mut mi, &mut dim);
        }
        (dim, coords)
    }

    #[test]
    fn test_sup_raises_ascent() {
        let plain = MathData::from_str_atoms("x");
        let script = InsetMathScript::with_sup(plain.clone(), MathData::from_str_atoms("2"));
        let (dim, _) = measure(&script, MathStyle::Text);

        let fonts = ApproxFontMetrics;
        let mut coords = CoordCache::new();
        let mut nd = Dimension::default();
        {
            let mut mi = MetricsInfo::new(
                &fonts,
                &mut coords,
                MetricsBase::new(FontInfo::new(12.0, MathStyle::Text), 600),
            );
            plain.metrics(&mut mi, &mut nd);
        }
        assert!(dim.ascent > nd.ascent);
        assert!(dim.width > nd.width);
    }

    #[test]
    fn test_sub_deepens_descent() {
        let script = InsetMathScript::with_sub(
            MathData::from_str_atoms("x"),
            MathData::from_str_atoms("i"),
        );
        let (dim, _) = measure(&script, MathStyle::Text);
        assert!(dim.descent > 0);
    }

    #[test]
    fn test_both_scripts_keep_min_gap() {
        let script = InsetMathScript::with_sub_sup(
            MathData::from_str_atoms("x"),
            MathData::from_str_atoms("i"),
            MathData::from_str_atoms("2"),
        );
        let fonts = ApproxFontMetrics;
        let mut coords = CoordCache::new();
        let mut dim = Dimension::default();
        let mut mi = MetricsInfo::new(
            &fonts,
            &mut coords,
            MetricsBase::new(FontInfo::new(12.0, MathStyle::Text), 600),
        );
        script.metrics(&mut mi, &mut dim);

        let nd = mi.coords.cells.dim(addr_of(script.nuc())).unwrap();
        let subd = mi.coords.cells.dim(addr_of(script.down().unwrap())).unwrap();
        let supd = mi.coords.cells.dim(addr_of(script.up().unwrap())).unwrap();
        let (dy_up, dy_down) =
            script.script_offsets(&mi.base, mi.fonts, nd, Some(subd), Some(supd));
        let gap = (dy_up - supd.descent) + (dy_down - subd.ascent);
        assert!(gap >= SCRIPT_GAP);
    }

    #[test]
    fn test_limits_in_display_for_large_operator() {
        let mut nuc = MathData::new();
        nuc.push(MathAtom::new(Inset::Symbol(
            InsetMathSymbol::named("sum").unwrap(),
        )));
        let script = InsetMathScript::with_sub_sup(
            nuc,
            MathData::from_str_atoms("i"),
            MathData::from_str_atoms("n"),
        );
        assert!(script.has_limits(MathStyle::Display));
        assert!(!script.has_limits(MathStyle::Text));
    }

    #[test]
    fn test_limits_metrics_stack_vertically() {
        let mut nuc = MathData::new();
        nuc.push(MathAtom::new(Inset::Symbol(
            InsetMathSymbol::named("sum").unwrap(),
        )));
        let script = InsetMathScript::with_sub_sup(
            nuc,
            MathData::from_str_atoms("i"),
            MathData::from_str_atoms("n"),
        );
        let (display_dim, _) = measure(&script, MathStyle::Display);
        let (text_dim, _) = measure(&script, MathStyle::Text);
        // Stacked limits are taller and narrower than diagonal scripts
        assert!(display_dim.height() > text_dim.height());
    }

    #[test]
    fn test_write_forms() {
        let script = InsetMathScript::with_sub_sup(
            MathData::from_str_atoms("x"),
            MathData::from_str_atoms("i"),
            MathData::from_str_atoms("2"),
        );
        let mut buf = String::new();
        let mut ws = WriteStream::new(&mut buf);
        script.write(&mut ws).unwrap();
        assert_eq!(buf, "x_{i}^{2}");
    }

    #[test]
    fn test_write_braces_multi_atom_nucleus() {
        let script = InsetMathScript::with_sup(
            MathData::from_str_atoms("xy"),
            MathData::from_str_atoms("2"),
        );
        let mut buf = String::new();
        let mut ws = WriteStream::new(&mut buf);
        script.write(&mut ws).unwrap();
        assert_eq!(buf, "{xy}^{2}");
    }

    #[test]
    fn test_collapse_decision() {
        let both_empty = InsetMathScript::with_sub_sup(
            MathData::from_str_atoms("x"),
            MathData::new(),
            MathData::new(),
        );
        assert_eq!(
            both_empty.notify_cursor_leaves(),
            Some(ScriptCollapse::ToNucleus)
        );

        let sub_empty = InsetMathScript::with_sub_sup(
            MathData::from_str_atoms("x"),
            MathData::new(),
            MathData::from_str_atoms("2"),
        );
        assert_eq!(
            sub_empty.notify_cursor_leaves(),
            Some(ScriptCollapse::DropSub)
        );

        let full = InsetMathScript::with_sup(
            MathData::from_str_atoms("x"),
            MathData::from_str_atoms("2"),
        );
        assert_eq!(full.notify_cursor_leaves(), None);
    }

    #[test]
    fn test_collapse_applied_once_then_noop() {
        let mut cell = MathData::new();
        cell.push(MathAtom::new(Inset::Script(InsetMathScript::with_sup(
            MathData::from_str_atoms("ab"),
            MathData::new(),
        ))));
        let collapse = cell[0].as_script().unwrap().notify_cursor_leaves().unwrap();
        assert!(cell.apply_script_collapse(0, collapse));
        // The script dissolved into its nucleus content
        assert_eq!(cell.to_latex(), "ab");
        assert!(cell[0].as_script().is_none());
        // Re-notifying the collapsed position is a no-op
        assert!(!cell.apply_script_collapse(0, ScriptCollapse::ToNucleus));
    }

    #[test]
    fn test_drop_sub_keeps_sup() {
        let mut script = InsetMathScript::with_sub_sup(
            MathData::from_str_atoms("x"),
            MathData::new(),
            MathData::from_str_atoms("2"),
        );
        script.apply_collapse(ScriptCollapse::DropSub);
        assert!(script.has_up());
        assert!(!script.has_down());
        assert_eq!(script.nargs(), 2);
    }

    #[test]
    fn test_up_down_navigation() {
        let script = InsetMathScript::with_sub_sup(
            MathData::from_str_atoms("xy"),
            MathData::from_str_atoms("i"),
            MathData::from_str_atoms("2"),
        );
        // From nucleus start, up enters the superscript
        let mut cur = CursorSlice::new(0, 0);
        assert!(script.idx_up_down(&mut cur, true));
        assert_eq!(cur.idx, 2);
        // From the superscript, down returns to the nucleus tail
        assert!(script.idx_up_down(&mut cur, false));
        assert_eq!(cur, CursorSlice::new(0, 2));
        // Mid-nucleus, vertical motion is refused
        let mut mid = CursorSlice::new(0, 1);
        assert!(!script.idx_up_down(&mut mid, true));
    }

    #[test]
    fn test_math_class_is_nucleus_tail() {
        let script = InsetMathScript::with_sup(
            MathData::from_str_atoms(")"),
            MathData::from_str_atoms("2"),
        );
        assert_eq!(script.math_class(), MathClass::Close);
    }
}
