//! Leaf insets: plain characters, named symbols, dots, and class forcing

use crate::class::{char_class, MathClass};
use crate::data::MathData;
use crate::dimension::Dimension;
use crate::error::MathedResult;
use crate::inset::{InsetMath, Marker};
use crate::metrics::{MetricsInfo, PainterInfo};
use crate::write::{HtmlStream, LaTeXFeatures, MathMLStream, WriteStream};
use render_model::{FontMetrics, FontSlant, Painter as _, TextStyle};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write as _;

// =============================================================================
// InsetMathChar
// =============================================================================

/// A single character atom
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsetMathChar {
    c: char,
}

impl InsetMathChar {
    pub fn new(c: char) -> Self {
        Self { c }
    }

    pub fn ch(&self) -> char {
        self.c
    }

    /// Letters render in math italic; digits and operators upright
    fn text_style(&self, base_font: &crate::font::FontInfo) -> TextStyle {
        let mut style = base_font.text_style();
        if !self.c.is_alphabetic() {
            style.font_slant = FontSlant::Normal;
        }
        style
    }
}

impl InsetMath for InsetMathChar {
    fn metrics(&self, mi: &mut MetricsInfo, dim: &mut Dimension) {
        let style = self.text_style(&mi.base.font);
        *dim = mi.fonts.char_dim(self.c, &style).into();
    }

    fn draw(&self, pi: &mut PainterInfo, x: i32, y: i32) {
        let style = self.text_style(&pi.base.font);
        let mut buf = [0u8; 4];
        pi.pain.text(x, y, self.c.encode_utf8(&mut buf), &style);
    }

    fn write(&self, ws: &mut WriteStream) -> fmt::Result {
        write!(ws, "{}", self.c)
    }

    fn math_class(&self) -> MathClass {
        char_class(self.c)
    }

    fn mathmlize(&self, ms: &mut MathMLStream) -> MathedResult<()> {
        let tag = if self.c.is_ascii_digit() {
            "mn"
        } else if self.c.is_alphabetic() {
            "mi"
        } else {
            "mo"
        };
        ms.element(tag, &self.c.to_string())
    }

    fn htmlize(&self, hs: &mut HtmlStream) -> MathedResult<()> {
        hs.text(&self.c.to_string())
    }
}

// =============================================================================
// InsetMathSymbol
// =============================================================================

/// Entry in the named-symbol table
#[derive(Debug, Clone, Copy)]
pub struct SymbolEntry {
    pub name: &'static str,
    pub ch: char,
    pub class: MathClass,
    pub large_op: bool,
    pub package: Option<&'static str>,
}

const fn sym(
    name: &'static str,
    ch: char,
    class: MathClass,
    large_op: bool,
    package: Option<&'static str>,
) -> SymbolEntry {
    SymbolEntry {
        name,
        ch,
        class,
        large_op,
        package,
    }
}

/// Named math symbols the engine knows how to lay out
pub const SYMBOLS: &[SymbolEntry] = &[
    // Greek lowercase
    sym("alpha", '\u{03B1}', MathClass::Ord, false, None),
    sym("beta", '\u{03B2}', MathClass::Ord, false, None),
    sym("gamma", '\u{03B3}', MathClass::Ord, false, None),
    sym("delta", '\u{03B4}', MathClass::Ord, false, None),
    sym("epsilon", '\u{03B5}', MathClass::Ord, false, None),
    sym("lambda", '\u{03BB}', MathClass::Ord, false, None),
    sym("mu", '\u{03BC}', MathClass::Ord, false, None),
    sym("pi", '\u{03C0}', MathClass::Ord, false, None),
    sym("sigma", '\u{03C3}', MathClass::Ord, false, None),
    sym("phi", '\u{03C6}', MathClass::Ord, false, None),
    sym("omega", '\u{03C9}', MathClass::Ord, false, None),
    // Greek uppercase
    sym("Gamma", '\u{0393}', MathClass::Ord, false, None),
    sym("Delta", '\u{0394}', MathClass::Ord, false, None),
    sym("Sigma", '\u{03A3}', MathClass::Ord, false, None),
    sym("Omega", '\u{03A9}', MathClass::Ord, false, None),
    // Large operators
    sym("sum", '\u{2211}', MathClass::Op, true, None),
    sym("prod", '\u{220F}', MathClass::Op, true, None),
    sym("coprod", '\u{2210}', MathClass::Op, true, None),
    sym("int", '\u{222B}', MathClass::Op, true, None),
    sym("oint", '\u{222E}', MathClass::Op, true, None),
    sym("bigcup", '\u{22C3}', MathClass::Op, true, None),
    sym("bigcap", '\u{22C2}', MathClass::Op, true, None),
    sym("bigoplus", '\u{2A01}', MathClass::Op, true, None),
    // Binary operators
    sym("pm", '\u{00B1}', MathClass::Bin, false, None),
    sym("mp", '\u{2213}', MathClass::Bin, false, None),
    sym("times", '\u{00D7}', MathClass::Bin, false, None),
    sym("div", '\u{00F7}', MathClass::Bin, false, None),
    sym("cdot", '\u{22C5}', MathClass::Bin, false, None),
    sym("cup", '\u{222A}', MathClass::Bin, false, None),
    sym("cap", '\u{2229}', MathClass::Bin, false, None),
    sym("oplus", '\u{2295}', MathClass::Bin, false, None),
    sym("otimes", '\u{2297}', MathClass::Bin, false, None),
    sym("setminus", '\u{2216}', MathClass::Bin, false, None),
    sym("boxtimes", '\u{22A0}', MathClass::Bin, false, Some("amssymb")),
    // Relations
    sym("leq", '\u{2264}', MathClass::Rel, false, None),
    sym("geq", '\u{2265}', MathClass::Rel, false, None),
    sym("neq", '\u{2260}', MathClass::Rel, false, None),
    sym("approx", '\u{2248}', MathClass::Rel, false, None),
    sym("equiv", '\u{2261}', MathClass::Rel, false, None),
    sym("propto", '\u{221D}', MathClass::Rel, false, None),
    sym("subset", '\u{2282}', MathClass::Rel, false, None),
    sym("supset", '\u{2283}', MathClass::Rel, false, None),
    sym("subseteq", '\u{2286}', MathClass::Rel, false, None),
    sym("in", '\u{2208}', MathClass::Rel, false, None),
    sym("notin", '\u{2209}', MathClass::Rel, false, None),
    sym("rightarrow", '\u{2192}', MathClass::Rel, false, None),
    sym("leftarrow", '\u{2190}', MathClass::Rel, false, None),
    sym("Rightarrow", '\u{21D2}', MathClass::Rel, false, None),
    sym("mapsto", '\u{21A6}', MathClass::Rel, false, None),
    sym("leadsto", '\u{21DD}', MathClass::Rel, false, Some("amssymb")),
    // Delimiters as symbols
    sym("langle", '\u{27E8}', MathClass::Open, false, None),
    sym("rangle", '\u{27E9}', MathClass::Close, false, None),
    sym("lVert", '\u{2016}', MathClass::Open, false, Some("amsmath")),
    sym("rVert", '\u{2016}', MathClass::Close, false, Some("amsmath")),
    // Ordinary named symbols
    sym("infty", '\u{221E}', MathClass::Ord, false, None),
    sym("partial", '\u{2202}', MathClass::Ord, false, None),
    sym("nabla", '\u{2207}', MathClass::Ord, false, None),
    sym("forall", '\u{2200}', MathClass::Ord, false, None),
    sym("exists", '\u{2203}', MathClass::Ord, false, None),
    sym("nexists", '\u{2204}', MathClass::Ord, false, Some("amssymb")),
    sym("emptyset", '\u{2205}', MathClass::Ord, false, None),
    sym("varnothing", '\u{2300}', MathClass::Ord, false, Some("amssymb")),
    sym("hbar", '\u{210F}', MathClass::Ord, false, None),
    sym("ell", '\u{2113}', MathClass::Ord, false, None),
    sym("prime", '\u{2032}', MathClass::Ord, false, None),
    // Punctuation
    sym("colon", ':', MathClass::Punct, false, None),
];

/// Look up a symbol by its command name
pub fn find_symbol(name: &str) -> Option<&'static SymbolEntry> {
    SYMBOLS.iter().find(|entry| entry.name == name)
}

/// A named symbol atom (`\alpha`, `\sum`, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsetMathSymbol {
    name: String,
    ch: char,
    class: MathClass,
    large_op: bool,
    package: Option<String>,
}

impl InsetMathSymbol {
    /// Construct from the symbol table; None for unknown names
    pub fn named(name: &str) -> Option<Self> {
        find_symbol(name).map(|entry| Self {
            name: entry.name.to_string(),
            ch: entry.ch,
            class: entry.class,
            large_op: entry.large_op,
            package: entry.package.map(str::to_string),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ch(&self) -> char {
        self.ch
    }

    /// Display-style large operators render at 1.5x size
    fn text_style(&self, mi_font: &crate::font::FontInfo, display: bool) -> TextStyle {
        let mut style = mi_font.text_style();
        style.font_slant = FontSlant::Normal;
        if self.large_op && display {
            style.font_size *= 1.5;
        }
        style
    }
}

impl InsetMath for InsetMathSymbol {
    fn metrics(&self, mi: &mut MetricsInfo, dim: &mut Dimension) {
        let display = mi.base.font.style == crate::font::MathStyle::Display;
        let style = self.text_style(&mi.base.font, display);
        *dim = mi.fonts.char_dim(self.ch, &style).into();
    }

    fn draw(&self, pi: &mut PainterInfo, x: i32, y: i32) {
        let display = pi.base.font.style == crate::font::MathStyle::Display;
        let style = self.text_style(&pi.base.font, display);
        let mut buf = [0u8; 4];
        pi.pain.text(x, y, self.ch.encode_utf8(&mut buf), &style);
    }

    fn write(&self, ws: &mut WriteStream) -> fmt::Result {
        ws.command(&self.name)
    }

    fn math_class(&self) -> MathClass {
        self.class
    }

    fn is_large_operator(&self) -> bool {
        self.large_op
    }

    fn validate(&self, features: &mut dyn LaTeXFeatures) {
        if let Some(package) = &self.package {
            features.require(package);
        }
    }

    fn mathmlize(&self, ms: &mut MathMLStream) -> MathedResult<()> {
        let tag = match self.class {
            MathClass::Ord => "mi",
            _ => "mo",
        };
        ms.element(tag, &self.ch.to_string())
    }

    fn htmlize(&self, hs: &mut HtmlStream) -> MathedResult<()> {
        hs.text(&self.ch.to_string())
    }
}

// =============================================================================
// InsetMathDots
// =============================================================================

/// Ellipsis variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DotsKind {
    /// Baseline dots `\ldots`
    Ldots,
    /// Axis-centered dots `\cdots`
    Cdots,
    /// Vertical dots `\vdots`
    Vdots,
    /// Diagonal dots `\ddots`
    Ddots,
}

impl DotsKind {
    pub fn command(self) -> &'static str {
        match self {
            DotsKind::Ldots => "ldots",
            DotsKind::Cdots => "cdots",
            DotsKind::Vdots => "vdots",
            DotsKind::Ddots => "ddots",
        }
    }

    fn glyph(self) -> char {
        match self {
            DotsKind::Ldots => '\u{2026}',
            DotsKind::Cdots => '\u{22EF}',
            DotsKind::Vdots => '\u{22EE}',
            DotsKind::Ddots => '\u{22F1}',
        }
    }
}

/// Ellipsis inset with kind-dependent raise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsetMathDots {
    kind: DotsKind,
}

impl InsetMathDots {
    pub fn new(kind: DotsKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> DotsKind {
        self.kind
    }

    /// Vertical raise of the dots relative to the baseline
    fn raise(&self, mi_base: &crate::metrics::MetricsBase) -> i32 {
        match self.kind {
            DotsKind::Ldots => 0,
            // Centered on the math axis
            DotsKind::Cdots => mi_base.em() / 4,
            DotsKind::Vdots | DotsKind::Ddots => 0,
        }
    }
}

impl InsetMath for InsetMathDots {
    fn metrics(&self, mi: &mut MetricsInfo, dim: &mut Dimension) {
        let style = mi.base.font.text_style();
        *dim = mi.fonts.char_dim(self.kind.glyph(), &style).into();
        let raise = self.raise(&mi.base);
        dim.ascent += raise;
        match self.kind {
            DotsKind::Vdots | DotsKind::Ddots => {
                // Tall constructs reach the full line height
                dim.ascent = dim.ascent.max(mi.fonts.max_ascent(&style));
                dim.descent = dim.descent.max(mi.fonts.max_descent(&style));
            }
            _ => {}
        }
    }

    fn draw(&self, pi: &mut PainterInfo, x: i32, y: i32) {
        let style = pi.base.font.text_style();
        let raise = self.raise(&pi.base);
        let mut buf = [0u8; 4];
        pi.pain
            .text(x, y - raise, self.kind.glyph().encode_utf8(&mut buf), &style);
    }

    fn write(&self, ws: &mut WriteStream) -> fmt::Result {
        ws.command(self.kind.command())
    }

    fn math_class(&self) -> MathClass {
        MathClass::Inner
    }

    fn mathmlize(&self, ms: &mut MathMLStream) -> MathedResult<()> {
        ms.element("mo", &self.kind.glyph().to_string())
    }

    fn htmlize(&self, hs: &mut HtmlStream) -> MathedResult<()> {
        hs.text(&self.kind.glyph().to_string())
    }
}

// =============================================================================
// InsetMathClass
// =============================================================================

/// `\mathbin{...}` and friends: force an atom class onto a subformula
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsetMathClass {
    class: MathClass,
    cell: MathData,
}

impl InsetMathClass {
    pub fn new(class: MathClass, cell: MathData) -> Self {
        Self { class, cell }
    }

    pub fn forced_class(&self) -> MathClass {
        self.class
    }

    fn command(&self) -> &'static str {
        match self.class {
            MathClass::Ord | MathClass::Unknown => "mathord",
            MathClass::Op => "mathop",
            MathClass::Bin => "mathbin",
            MathClass::Rel => "mathrel",
            MathClass::Open => "mathopen",
            MathClass::Close => "mathclose",
            MathClass::Punct => "mathpunct",
            MathClass::Inner => "mathinner",
        }
    }
}

impl InsetMath for InsetMathClass {
    fn metrics(&self, mi: &mut MetricsInfo, dim: &mut Dimension) {
        self.cell.metrics(mi, dim);
    }

    fn draw(&self, pi: &mut PainterInfo, x: i32, y: i32) {
        self.cell.draw(pi, x, y);
    }

    fn write(&self, ws: &mut WriteStream) -> fmt::Result {
        ws.command(self.command())?;
        write!(ws, "{{")?;
        self.cell.write(ws)?;
        write!(ws, "}}")
    }

    fn math_class(&self) -> MathClass {
        self.class
    }

    fn marker(&self, nesting: usize) -> Marker {
        if nesting == 0 {
            Marker::Corner
        } else {
            Marker::None
        }
    }

    fn nargs(&self) -> usize {
        1
    }

    fn cell(&self, idx: usize) -> Option<&MathData> {
        (idx == 0).then_some(&self.cell)
    }

    fn cell_mut(&mut self, idx: usize) -> Option<&mut MathData> {
        (idx == 0).then_some(&mut self.cell)
    }

    fn mathmlize(&self, ms: &mut MathMLStream) -> MathedResult<()> {
        ms.open("mrow")?;
        self.cell.mathmlize(ms)?;
        ms.close("mrow")
    }

    fn htmlize(&self, hs: &mut HtmlStream) -> MathedResult<()> {
        self.cell.htmlize(hs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::CoordCache;
    use crate::font::FontInfo;
    use crate::metrics::MetricsBase;
    use render_model::ApproxFontMetrics;

    fn mi<'a>(coords: &'a mut CoordCache, fonts: &'a ApproxFontMetrics) -> MetricsInfo<'a> {
        MetricsInfo::new(fonts, coords, MetricsBase::new(FontInfo::default(), 600))
    }

    #[test]
    fn test_char_class_mapping() {
        assert_eq!(InsetMathChar::new('+').math_class(), MathClass::Bin);
        assert_eq!(InsetMathChar::new('x').math_class(), MathClass::Ord);
    }

    #[test]
    fn test_char_metrics_nonzero() {
        let fonts = ApproxFontMetrics;
        let mut coords = CoordCache::new();
        let mut info = mi(&mut coords, &fonts);
        let mut dim = Dimension::default();
        InsetMathChar::new('x').metrics(&mut info, &mut dim);
        assert!(dim.width > 0);
        assert!(dim.ascent > 0);
    }

    #[test]
    fn test_symbol_lookup() {
        let sum = InsetMathSymbol::named("sum").unwrap();
        assert_eq!(sum.math_class(), MathClass::Op);
        assert!(sum.is_large_operator());
        assert!(InsetMathSymbol::named("nosuchsymbol").is_none());
    }

    #[test]
    fn test_symbol_write() {
        let alpha = InsetMathSymbol::named("alpha").unwrap();
        let mut buf = String::new();
        let mut ws = WriteStream::new(&mut buf);
        alpha.write(&mut ws).unwrap();
        assert_eq!(buf, "\\alpha");
    }

    #[test]
    fn test_symbol_validate_requires_package() {
        use crate::write::FeatureList;
        let sym = InsetMathSymbol::named("nexists").unwrap();
        let mut features = FeatureList::new();
        sym.validate(&mut features);
        assert!(features.has_package("amssymb"));
    }

    #[test]
    fn test_dots_write() {
        let dots = InsetMathDots::new(DotsKind::Cdots);
        let mut buf = String::new();
        let mut ws = WriteStream::new(&mut buf);
        dots.write(&mut ws).unwrap();
        assert_eq!(buf, "\\cdots");
    }

    #[test]
    fn test_class_inset_forces_class() {
        let inset = InsetMathClass::new(MathClass::Rel, MathData::from_str_atoms("x"));
        assert_eq!(inset.math_class(), MathClass::Rel);
        let mut buf = String::new();
        let mut ws = WriteStream::new(&mut buf);
        inset.write(&mut ws).unwrap();
        assert_eq!(buf, "\\mathrel{x}");
    }
}
