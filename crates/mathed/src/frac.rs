//! Fraction and binomial insets
//!
//! Stacked kinds pivot on the font's axis height: the numerator sits above
//! the rule by at least a thickness-derived gap, the denominator
//! symmetrically below, so the rule never touches either operand. Diagonal
//! kinds (nicefrac) raise a half-size numerator to the cap height instead.

use crate::class::MathClass;
use crate::coords::addr_of;
use crate::cursor::CursorSlice;
use crate::data::MathData;
use crate::delim::draw_delim_glyph;
use crate::dimension::Dimension;
use crate::error::MathedResult;
use crate::inset::{InsetMath, Marker};
use crate::metrics::{ChangeContext, MetricsBase, MetricsInfo, PainterInfo};
use crate::write::{HtmlStream, LaTeXFeatures, MathMLStream, WriteStream};
use render_model::{FontMetrics, LineStyle, Painter as _};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write as _;

/// Fraction family variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FracKind {
    /// Stacked without a rule: `{a \atop b}`
    Atop,
    /// Plain TeX `{a \over b}`
    Over,
    /// `\frac{a}{b}`
    Frac,
    /// `\dfrac`: display size regardless of ambient style
    Dfrac,
    /// `\tfrac`: script size regardless of ambient style
    Tfrac,
    /// `\cfrac`: continued fraction, display size
    Cfrac,
    /// `\cfrac[l]`: numerator flush left
    CfracLeft,
    /// `\cfrac[r]`: numerator flush right
    CfracRight,
    /// `\nicefrac`: diagonal half-size fraction
    NiceFrac,
    /// `\unitfrac`: diagonal fraction for units
    UnitFrac,
    /// `\unit[value]{unit}`
    Unit,
}

impl FracKind {
    /// Whether a horizontal rule is drawn between the cells
    fn has_rule(self) -> bool {
        matches!(
            self,
            FracKind::Over
                | FracKind::Frac
                | FracKind::Dfrac
                | FracKind::Tfrac
                | FracKind::Cfrac
                | FracKind::CfracLeft
                | FracKind::CfracRight
        )
    }

    /// Diagonal kinds render as `num / den` with a slanted bar
    fn is_diagonal(self) -> bool {
        matches!(self, FracKind::NiceFrac | FracKind::UnitFrac)
    }

    fn is_stacked(self) -> bool {
        !self.is_diagonal() && self != FracKind::Unit
    }
}

/// Horizontal alignment of an operand within the fraction width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellAlign {
    Left,
    Center,
    Right,
}

fn align_offset(align: CellAlign, total: i32, width: i32) -> i32 {
    match align {
        CellAlign::Left => 0,
        CellAlign::Center => (total - width) / 2,
        CellAlign::Right => total - width,
    }
}

/// General fraction inset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsetMathFrac {
    kind: FracKind,
    num: MathData,
    den: MathData,
}

/// Vertical layout of a stacked fraction relative to the baseline
#[derive(Debug, Clone, Copy)]
struct StackedOffsets {
    /// Rise of the numerator baseline
    dy_num: i32,
    /// Drop of the denominator baseline
    dy_den: i32,
    /// Height of the rule center above the baseline
    axis: i32,
}

impl InsetMathFrac {
    pub fn new(kind: FracKind, num: MathData, den: MathData) -> Self {
        Self { kind, num, den }
    }

    /// Plain `\frac{num}{den}`
    pub fn frac(num: MathData, den: MathData) -> Self {
        Self::new(FracKind::Frac, num, den)
    }

    pub fn kind(&self) -> FracKind {
        self.kind
    }

    pub fn num(&self) -> &MathData {
        &self.num
    }

    pub fn den(&self) -> &MathData {
        &self.den
    }

    fn num_align(&self) -> CellAlign {
        match self.kind {
            FracKind::CfracLeft => CellAlign::Left,
            FracKind::CfracRight => CellAlign::Right,
            _ => CellAlign::Center,
        }
    }

    /// Measure both cells under the kind's style forcing
    fn cell_metrics(&self, mi: &mut MetricsInfo) -> (Dimension, Dimension) {
        let mut nd = Dimension::default();
        let mut dd = Dimension::default();
        match self.kind {
            // Full size regardless of ambient style
            FracKind::Dfrac | FracKind::Cfrac | FracKind::CfracLeft | FracKind::CfracRight => {
                let mut mi2 = mi.change_style(crate::font::MathStyle::Text);
                self.num.metrics(&mut mi2, &mut nd);
                self.den.metrics(&mut mi2, &mut dd);
            }
            // Forced script size
            FracKind::Tfrac | FracKind::NiceFrac | FracKind::UnitFrac | FracKind::Unit => {
                let mut mi2 = mi.change_style(crate::font::MathStyle::Script);
                self.num.metrics(&mut mi2, &mut nd);
                self.den.metrics(&mut mi2, &mut dd);
            }
            _ => {
                let mut mi2 = mi.change_frac();
                self.num.metrics(&mut mi2, &mut nd);
                self.den.metrics(&mut mi2, &mut dd);
            }
        }
        (nd, dd)
    }

    /// The style the cells were measured at, for the draw pass
    fn cell_style(&self, ambient: crate::font::MathStyle) -> crate::font::MathStyle {
        match self.kind {
            FracKind::Dfrac | FracKind::Cfrac | FracKind::CfracLeft | FracKind::CfracRight => {
                crate::font::MathStyle::Text
            }
            FracKind::Tfrac | FracKind::NiceFrac | FracKind::UnitFrac | FracKind::Unit => {
                crate::font::MathStyle::Script
            }
            _ => match ambient {
                crate::font::MathStyle::Display => crate::font::MathStyle::Text,
                other => other.smaller(),
            },
        }
    }

    /// Axis-pivot arithmetic shared by all stacked kinds (and binomials)
    fn stacked_offsets(
        base: &MetricsBase,
        fonts: &dyn FontMetrics,
        nd: Dimension,
        dd: Dimension,
    ) -> StackedOffsets {
        let font = base.font.text_style();
        let axis = fonts.axis_height(&font);
        let rule = base.solid_line_thickness();
        // The gap grows with the rule so the bar never touches an operand
        let gap = (3 * rule / 2).max(2);
        let dy_num = axis + rule - rule / 2 + gap + nd.descent;
        let dy_den = (dd.ascent + gap + rule / 2 - axis).max(0);
        StackedOffsets {
            dy_num,
            dy_den,
            axis,
        }
    }

    /// Rise of the diagonal numerator so its top sits at the cap height
    fn dy_for_nicefrac(fonts: &dyn FontMetrics, base: &MetricsBase, nd: Dimension) -> i32 {
        let font = base.font.text_style();
        (fonts.cap_height(&font) - nd.ascent).max(0)
    }

    fn slash_width(base: &MetricsBase) -> i32 {
        (base.em() / 3).max(3)
    }

    fn command(&self) -> Option<&'static str> {
        match self.kind {
            FracKind::Frac => Some("frac"),
            FracKind::Dfrac => Some("dfrac"),
            FracKind::Tfrac => Some("tfrac"),
            FracKind::Cfrac | FracKind::CfracLeft | FracKind::CfracRight => Some("cfrac"),
            FracKind::NiceFrac => Some("nicefrac"),
            FracKind::UnitFrac => Some("unitfrac"),
            _ => None,
        }
    }
}

impl InsetMath for InsetMathFrac {
    fn metrics(&self, mi: &mut MetricsInfo, dim: &mut Dimension) {
        let (nd, dd) = self.cell_metrics(mi);

        if self.kind == FracKind::Unit {
            // Value and unit side by side, separated by a thin space
            dim.width = nd.width + mi.base.thin_space() + dd.width;
            dim.ascent = nd.ascent.max(dd.ascent);
            dim.descent = nd.descent.max(dd.descent);
        } else if self.kind.is_diagonal() {
            let dy = Self::dy_for_nicefrac(mi.fonts, &mi.base, nd);
            dim.width = nd.width + Self::slash_width(&mi.base) + dd.width;
            dim.ascent = dy + nd.ascent;
            dim.descent = dd.descent;
        } else {
            let offsets = Self::stacked_offsets(&mi.base, mi.fonts, nd, dd);
            dim.width = nd.width.max(dd.width) + 4;
            dim.ascent = offsets.dy_num + nd.ascent;
            dim.descent = offsets.dy_den + dd.descent;
        }
    }

    fn draw(&self, pi: &mut PainterInfo, x: i32, y: i32) {
        let nd = pi.coords.cells.dim(addr_of(&self.num)).unwrap_or_default();
        let dd = pi.coords.cells.dim(addr_of(&self.den)).unwrap_or_default();
        let style = self.cell_style(pi.base.font.style);
        let color = pi.base.font.color;

        if self.kind == FracKind::Unit {
            let thin = pi.base.thin_space();
            let mut pi2 = pi.change_style(style);
            self.num.draw(&mut pi2, x, y);
            self.den.draw(&mut pi2, x + nd.width + thin, y);
        } else if self.kind.is_diagonal() {
            let dy = Self::dy_for_nicefrac(pi.fonts, &pi.base, nd);
            let slash = Self::slash_width(&pi.base);
            let font = pi.base.font.text_style();
            let cap = pi.fonts.cap_height(&font);
            let thickness = pi.base.solid_line_thickness();
            {
                let mut pi2 = pi.change_style(style);
                self.num.draw(&mut pi2, x, y - dy);
                self.den.draw(&mut pi2, x + nd.width + slash, y);
            }
            pi.pain.line(
                x + nd.width,
                y + dd.descent,
                x + nd.width + slash,
                y - cap,
                color,
                LineStyle::Solid,
                thickness,
            );
        } else {
            let offsets = Self::stacked_offsets(&pi.base, pi.fonts, nd, dd);
            let width = nd.width.max(dd.width) + 4;
            let nx = x + 2 + align_offset(self.num_align(), width - 4, nd.width);
            let dx = x + 2 + align_offset(CellAlign::Center, width - 4, dd.width);
            {
                let mut pi2 = pi.change_style(style);
                self.num.draw(&mut pi2, nx, y - offsets.dy_num);
                self.den.draw(&mut pi2, dx, y + offsets.dy_den);
            }
            if self.kind.has_rule() {
                let thickness = pi.base.solid_line_thickness();
                pi.pain.line(
                    x + 1,
                    y - offsets.axis,
                    x + width - 1,
                    y - offsets.axis,
                    color,
                    LineStyle::Solid,
                    thickness,
                );
            }
        }
    }

    fn write(&self, ws: &mut WriteStream) -> fmt::Result {
        match self.kind {
            FracKind::Atop | FracKind::Over => {
                write!(ws, "{{")?;
                self.num.write(ws)?;
                ws.command(if self.kind == FracKind::Atop {
                    "atop"
                } else {
                    "over"
                })?;
                write!(ws, " ")?;
                self.den.write(ws)?;
                write!(ws, "}}")
            }
            FracKind::Unit => {
                ws.command("unit")?;
                write!(ws, "[")?;
                self.num.write(ws)?;
                write!(ws, "]{{")?;
                self.den.write(ws)?;
                write!(ws, "}}")
            }
            _ => {
                let name = self.command().expect("stacked kinds have a command");
                ws.command(name)?;
                match self.kind {
                    FracKind::CfracLeft => write!(ws, "[l]")?,
                    FracKind::CfracRight => write!(ws, "[r]")?,
                    _ => {}
                }
                write!(ws, "{{")?;
                self.num.write(ws)?;
                write!(ws, "}}{{")?;
                self.den.write(ws)?;
                write!(ws, "}}")
            }
        }
    }

    fn math_class(&self) -> MathClass {
        MathClass::Inner
    }

    fn marker(&self, nesting: usize) -> Marker {
        if nesting == 0 {
            Marker::Corner
        } else {
            Marker::None
        }
    }

    fn nargs(&self) -> usize {
        2
    }

    fn cell(&self, idx: usize) -> Option<&MathData> {
        match idx {
            0 => Some(&self.num),
            1 => Some(&self.den),
            _ => None,
        }
    }

    fn cell_mut(&mut self, idx: usize) -> Option<&mut MathData> {
        match idx {
            0 => Some(&mut self.num),
            1 => Some(&mut self.den),
            _ => None,
        }
    }

    /// Up/down toggles numerator/denominator
    fn idx_up_down(&self, cur: &mut CursorSlice, up: bool) -> bool {
        if up && cur.idx == 1 {
            *cur = CursorSlice::back_of(0, self.num.len());
            true
        } else if !up && cur.idx == 0 {
            *cur = CursorSlice::front_of(1);
            true
        } else {
            false
        }
    }

    fn validate(&self, features: &mut dyn LaTeXFeatures) {
        match self.kind {
            FracKind::Dfrac | FracKind::Tfrac | FracKind::Cfrac | FracKind::CfracLeft
            | FracKind::CfracRight => features.require("amsmath"),
            FracKind::NiceFrac | FracKind::UnitFrac | FracKind::Unit => features.require("units"),
            _ => {}
        }
        for atom in self.num.iter().chain(self.den.iter()) {
            atom.validate(features);
        }
    }

    fn mathmlize(&self, ms: &mut MathMLStream) -> MathedResult<()> {
        ms.open("mfrac")?;
        ms.open("mrow")?;
        self.num.mathmlize(ms)?;
        ms.close("mrow")?;
        ms.open("mrow")?;
        self.den.mathmlize(ms)?;
        ms.close("mrow")?;
        ms.close("mfrac")
    }

    fn htmlize(&self, hs: &mut HtmlStream) -> MathedResult<()> {
        hs.open_span("frac")?;
        hs.open_span("num")?;
        self.num.htmlize(hs)?;
        hs.close_span()?;
        hs.open_span("den")?;
        self.den.htmlize(hs)?;
        hs.close_span()?;
        hs.close_span()
    }
}

// =============================================================================
// InsetMathBinom
// =============================================================================

/// Binomial family variants (stacked with optional delimiters)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinomKind {
    /// `\binom{a}{b}`
    Binom,
    /// `\dbinom`: display size
    Dbinom,
    /// `\tbinom`: script size
    Tbinom,
    /// Plain TeX `{a \choose b}`
    Choose,
    /// `{a \brace b}`
    Brace,
    /// `{a \brack b}`
    Brack,
}

impl BinomKind {
    fn delimiters(self) -> (char, char) {
        match self {
            BinomKind::Brace => ('{', '}'),
            BinomKind::Brack => ('[', ']'),
            _ => ('(', ')'),
        }
    }
}

/// Stacked pair enclosed in growing delimiters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsetMathBinom {
    kind: BinomKind,
    num: MathData,
    den: MathData,
}

impl InsetMathBinom {
    pub fn new(kind: BinomKind, num: MathData, den: MathData) -> Self {
        Self { kind, num, den }
    }

    pub fn kind(&self) -> BinomKind {
        self.kind
    }

    /// Delimiter half-width, scaling with total height, clamped to [6, 15]
    fn dw(height: i32) -> i32 {
        (height / 5).clamp(6, 15)
    }

    fn cell_style(&self, ambient: crate::font::MathStyle) -> crate::font::MathStyle {
        match self.kind {
            BinomKind::Dbinom => crate::font::MathStyle::Text,
            BinomKind::Tbinom => crate::font::MathStyle::Script,
            _ => match ambient {
                crate::font::MathStyle::Display => crate::font::MathStyle::Text,
                other => other.smaller(),
            },
        }
    }
}

impl InsetMath for InsetMathBinom {
    fn metrics(&self, mi: &mut MetricsInfo, dim: &mut Dimension) {
        let style = self.cell_style(mi.base.font.style);
        let mut nd = Dimension::default();
        let mut dd = Dimension::default();
        {
            let mut mi2 = mi.change_style(style);
            self.num.metrics(&mut mi2, &mut nd);
            self.den.metrics(&mut mi2, &mut dd);
        }
        let offsets = InsetMathFrac::stacked_offsets(&mi.base, mi.fonts, nd, dd);
        let ascent = offsets.dy_num + nd.ascent;
        let descent = offsets.dy_den + dd.descent;
        let dw = Self::dw(ascent + descent);
        dim.width = nd.width.max(dd.width) + 2 * dw + 4;
        dim.ascent = ascent;
        dim.descent = descent;
    }

    fn draw(&self, pi: &mut PainterInfo, x: i32, y: i32) {
        let nd = pi.coords.cells.dim(addr_of(&self.num)).unwrap_or_default();
        let dd = pi.coords.cells.dim(addr_of(&self.den)).unwrap_or_default();
        let style = self.cell_style(pi.base.font.style);
        let offsets = InsetMathFrac::stacked_offsets(&pi.base, pi.fonts, nd, dd);
        let ascent = offsets.dy_num + nd.ascent;
        let descent = offsets.dy_den + dd.descent;
        let height = ascent + descent;
        let dw = Self::dw(height);
        let inner = nd.width.max(dd.width) + 4;
        let (open, close) = self.kind.delimiters();

        draw_delim_glyph(pi, open, x, y - ascent, dw, height);
        {
            let mut pi2 = pi.change_style(style);
            let nx = x + dw + 2 + (inner - 4 - nd.width) / 2;
            let dx = x + dw + 2 + (inner - 4 - dd.width) / 2;
            self.num.draw(&mut pi2, nx, y - offsets.dy_num);
            self.den.draw(&mut pi2, dx, y + offsets.dy_den);
        }
        draw_delim_glyph(pi, close, x + dw + inner, y - ascent, dw, height);
    }

    fn write(&self, ws: &mut WriteStream) -> fmt::Result {
        match self.kind {
            BinomKind::Choose | BinomKind::Brace | BinomKind::Brack => {
                let name = match self.kind {
                    BinomKind::Choose => "choose",
                    BinomKind::Brace => "brace",
                    _ => "brack",
                };
                write!(ws, "{{")?;
                self.num.write(ws)?;
                ws.command(name)?;
                write!(ws, " ")?;
                self.den.write(ws)?;
                write!(ws, "}}")
            }
            _ => {
                let name = match self.kind {
                    BinomKind::Binom => "binom",
                    BinomKind::Dbinom => "dbinom",
                    _ => "tbinom",
                };
                ws.command(name)?;
                write!(ws, "{{")?;
                self.num.write(ws)?;
                write!(ws, "}}{{")?;
                self.den.write(ws)?;
                write!(ws, "}}")
            }
        }
    }

    fn math_class(&self) -> MathClass {
        MathClass::Inner
    }

    fn marker(&self, nesting: usize) -> Marker {
        if nesting == 0 {
            Marker::Corner
        } else {
            Marker::None
        }
    }

    fn nargs(&self) -> usize {
        2
    }

    fn cell(&self, idx: usize) -> Option<&MathData> {
        match idx {
            0 => Some(&self.num),
            1 => Some(&self.den),
            _ => None,
        }
    }

    fn cell_mut(&mut self, idx: usize) -> Option<&mut MathData> {
        match idx {
            0 => Some(&mut self.num),
            1 => Some(&mut self.den),
            _ => None,
        }
    }

    fn idx_up_down(&self, cur: &mut CursorSlice, up: bool) -> bool {
        if up && cur.idx == 1 {
            *cur = CursorSlice::back_of(0, self.num.len());
            true
        } else if !up && cur.idx == 0 {
            *cur = CursorSlice::front_of(1);
            true
        } else {
            false
        }
    }

    fn validate(&self, features: &mut dyn LaTeXFeatures) {
        if matches!(self.kind, BinomKind::Binom | BinomKind::Dbinom | BinomKind::Tbinom) {
            features.require("amsmath");
        }
        for atom in self.num.iter().chain(self.den.iter()) {
            atom.validate(features);
        }
    }

    fn mathmlize(&self, ms: &mut MathMLStream) -> MathedResult<()> {
        let (open, close) = self.kind.delimiters();
        ms.element("mo", &open.to_string())?;
        ms.open("mfrac")?;
        ms.open("mrow")?;
        self.num.mathmlize(ms)?;
        ms.close("mrow")?;
        ms.open("mrow")?;
        self.den.mathmlize(ms)?;
        ms.close("mrow")?;
        ms.close("mfrac")?;
        ms.element("mo", &close.to_string())
    }

    fn htmlize(&self, hs: &mut HtmlStream) -> MathedResult<()> {
        let (open, close) = self.kind.delimiters();
        hs.text(&open.to_string())?;
        hs.open_span("binom")?;
        self.num.htmlize(hs)?;
        hs.text("/")?;
        self.den.htmlize(hs)?;
        hs.close_span()?;
        hs.text(&close.to_string())
    }
}
