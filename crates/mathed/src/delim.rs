//! Delimiter insets
//!
//! `InsetMathDelim` stretches a pair of fence glyphs around one cell,
//! centered on the math axis. `InsetMathBig` is the fixed-size family
//! (`\bigl` ... `\Biggr`). Both render their glyphs through the shared
//! polyline approximations below, so no glyph rasterization is needed.

use crate::class::MathClass;
use crate::coords::addr_of;
use crate::data::MathData;
use crate::dimension::Dimension;
use crate::error::MathedResult;
use crate::inset::{InsetMath, Marker};
use crate::metrics::{MetricsInfo, PainterInfo};
use crate::write::{HtmlStream, LaTeXFeatures, MathMLStream, WriteStream};
use render_model::{FontMetrics, LineStyle, Painter as _};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write as _;

/// The character a delimiter name renders as; None for the empty fence "."
pub fn delim_char(name: &str) -> Option<char> {
    match name {
        "(" => Some('('),
        ")" => Some(')'),
        "[" => Some('['),
        "]" => Some(']'),
        "{" | "lbrace" => Some('{'),
        "}" | "rbrace" => Some('}'),
        "|" | "vert" => Some('|'),
        "Vert" => Some('\u{2016}'),
        "/" => Some('/'),
        "\\" | "backslash" => Some('\\'),
        "langle" => Some('\u{27E8}'),
        "rangle" => Some('\u{27E9}'),
        "lceil" => Some('\u{2308}'),
        "rceil" => Some('\u{2309}'),
        "lfloor" => Some('\u{230A}'),
        "rfloor" => Some('\u{230B}'),
        "uparrow" => Some('\u{2191}'),
        "downarrow" => Some('\u{2193}'),
        "." => None,
        _ => None,
    }
}

/// Write a delimiter token after `\left`, `\bigl` and friends
fn write_delim_token(ws: &mut WriteStream, name: &str) -> fmt::Result {
    match name {
        "{" | "}" => write!(ws, "\\{name}"),
        "." | "(" | ")" | "[" | "]" | "|" | "/" => write!(ws, "{name}"),
        "\\" => write!(ws, "\\backslash "),
        _ => {
            ws.command(name)?;
            // A following brace or letter must not glue onto the name
            write!(ws, " ")
        }
    }
}

/// Draw a stretched delimiter glyph as a polyline approximation inside the
/// box with top-left (x, y_top), width w and height h.
pub(crate) fn draw_delim_glyph(pi: &mut PainterInfo, ch: char, x: i32, y_top: i32, w: i32, h: i32) {
    let color = pi.base.font.color;
    let t = pi.base.solid_line_thickness();
    let pain = &mut pi.pain;
    match ch {
        '(' => pain.lines(
            &[
                (x + w, y_top),
                (x, y_top + h / 4),
                (x, y_top + 3 * h / 4),
                (x + w, y_top + h),
            ],
            color,
            LineStyle::Solid,
            t,
        ),
        ')' => pain.lines(
            &[
                (x, y_top),
                (x + w, y_top + h / 4),
                (x + w, y_top + 3 * h / 4),
                (x, y_top + h),
            ],
            color,
            LineStyle::Solid,
            t,
        ),
        '[' => pain.lines(
            &[
                (x + w, y_top),
                (x, y_top),
                (x, y_top + h),
                (x + w, y_top + h),
            ],
            color,
            LineStyle::Solid,
            t,
        ),
        ']' => pain.lines(
            &[
                (x, y_top),
                (x + w, y_top),
                (x + w, y_top + h),
                (x, y_top + h),
            ],
            color,
            LineStyle::Solid,
            t,
        ),
        '\u{2308}' => pain.lines(
            &[(x + w, y_top), (x, y_top), (x, y_top + h)],
            color,
            LineStyle::Solid,
            t,
        ),
        '\u{2309}' => pain.lines(
            &[(x, y_top), (x + w, y_top), (x + w, y_top + h)],
            color,
            LineStyle::Solid,
            t,
        ),
        '\u{230A}' => pain.lines(
            &[(x, y_top), (x, y_top + h), (x + w, y_top + h)],
            color,
            LineStyle::Solid,
            t,
        ),
        '\u{230B}' => pain.lines(
            &[(x + w, y_top), (x + w, y_top + h), (x, y_top + h)],
            color,
            LineStyle::Solid,
            t,
        ),
        '{' => pain.lines(
            &[
                (x + w, y_top),
                (x + w / 2, y_top + h / 8),
                (x + w / 2, y_top + 3 * h / 8),
                (x, y_top + h / 2),
                (x + w / 2, y_top + 5 * h / 8),
                (x + w / 2, y_top + 7 * h / 8),
                (x + w, y_top + h),
            ],
            color,
            LineStyle::Solid,
            t,
        ),
        '}' => pain.lines(
            &[
                (x, y_top),
                (x + w / 2, y_top + h / 8),
                (x + w / 2, y_top + 3 * h / 8),
                (x + w, y_top + h / 2),
                (x + w / 2, y_top + 5 * h / 8),
                (x + w / 2, y_top + 7 * h / 8),
                (x, y_top + h),
            ],
            color,
            LineStyle::Solid,
            t,
        ),
        '\u{27E8}' => pain.lines(
            &[(x + w, y_top), (x, y_top + h / 2), (x + w, y_top + h)],
            color,
            LineStyle::Solid,
            t,
        ),
        '\u{27E9}' => pain.lines(
            &[(x, y_top), (x + w, y_top + h / 2), (x, y_top + h)],
            color,
            LineStyle::Solid,
            t,
        ),
        '|' => pain.line(
            x + w / 2,
            y_top,
            x + w / 2,
            y_top + h,
            color,
            LineStyle::Solid,
            t,
        ),
        '\u{2016}' => {
            pain.line(x + w / 3, y_top, x + w / 3, y_top + h, color, LineStyle::Solid, t);
            pain.line(
                x + 2 * w / 3,
                y_top,
                x + 2 * w / 3,
                y_top + h,
                color,
                LineStyle::Solid,
                t,
            );
        }
        '/' => pain.line(x, y_top + h, x + w, y_top, color, LineStyle::Solid, t),
        '\\' => pain.line(x, y_top, x + w, y_top + h, color, LineStyle::Solid, t),
        _ => {
            // Fall back to the glyph itself, centered on the box
            let style = pi.base.font.text_style();
            let mut buf = [0u8; 4];
            pain.text(x, y_top + h / 2, ch.encode_utf8(&mut buf), &style);
        }
    }
}

// =============================================================================
// InsetMathDelim
// =============================================================================

/// `\left( ... \right)`: fences growing with their content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsetMathDelim {
    left: String,
    right: String,
    cell: MathData,
}

impl InsetMathDelim {
    pub fn new(left: impl Into<String>, right: impl Into<String>, cell: MathData) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
            cell,
        }
    }

    pub fn left(&self) -> &str {
        &self.left
    }

    pub fn right(&self) -> &str {
        &self.right
    }

    /// Fence width, scaling with content height, clamped to [4, 8]
    fn dw(height: i32) -> i32 {
        (height / 5).clamp(4, 8)
    }
}

impl InsetMath for InsetMathDelim {
    fn metrics(&self, mi: &mut MetricsInfo, dim: &mut Dimension) {
        let mut cd = Dimension::default();
        self.cell.metrics(mi, &mut cd);
        // Fences are centered on the math axis and cover the content
        let font = mi.base.font.text_style();
        let axis = mi.fonts.axis_height(&font);
        let half = (cd.ascent - axis).max(cd.descent + axis).max(1);
        let ascent = axis + half;
        let descent = (half - axis).max(0);
        let dw = Self::dw(ascent + descent);
        dim.width = cd.width + 2 * dw + 4;
        dim.ascent = ascent.max(cd.ascent);
        dim.descent = descent.max(cd.descent);
    }

    fn draw(&self, pi: &mut PainterInfo, x: i32, y: i32) {
        let cd = pi.coords.cells.dim(addr_of(&self.cell)).unwrap_or_default();
        let font = pi.base.font.text_style();
        let axis = pi.fonts.axis_height(&font);
        let half = (cd.ascent - axis).max(cd.descent + axis).max(1);
        let ascent = (axis + half).max(cd.ascent);
        let descent = (half - axis).max(0).max(cd.descent);
        let height = ascent + descent;
        let dw = Self::dw(height);

        if let Some(ch) = delim_char(&self.left) {
            draw_delim_glyph(pi, ch, x + 1, y - ascent, dw, height);
        }
        self.cell.draw(pi, x + dw + 2, y);
        if let Some(ch) = delim_char(&self.right) {
            draw_delim_glyph(pi, ch, x + dw + 2 + cd.width + 1, y - ascent, dw, height);
        }
    }

    fn write(&self, ws: &mut WriteStream) -> fmt::Result {
        write!(ws, "\\left")?;
        write_delim_token(ws, &self.left)?;
        self.cell.write(ws)?;
        write!(ws, "\\right")?;
        write_delim_token(ws, &self.right)
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
        1
    }

    fn cell(&self, idx: usize) -> Option<&MathData> {
        (idx == 0).then_some(&self.cell)
    }

    fn cell_mut(&mut self, idx: usize) -> Option<&mut MathData> {
        (idx == 0).then_some(&mut self.cell)
    }

    fn validate(&self, features: &mut dyn LaTeXFeatures) {
        for atom in self.cell.iter() {
            atom.validate(features);
        }
    }

    fn mathmlize(&self, ms: &mut MathMLStream) -> MathedResult<()> {
        ms.open("mrow")?;
        if let Some(ch) = delim_char(&self.left) {
            ms.element("mo", &ch.to_string())?;
        }
        self.cell.mathmlize(ms)?;
        if let Some(ch) = delim_char(&self.right) {
            ms.element("mo", &ch.to_string())?;
        }
        ms.close("mrow")
    }

    fn htmlize(&self, hs: &mut HtmlStream) -> MathedResult<()> {
        if let Some(ch) = delim_char(&self.left) {
            hs.text(&ch.to_string())?;
        }
        self.cell.htmlize(hs)?;
        if let Some(ch) = delim_char(&self.right) {
            hs.text(&ch.to_string())?;
        }
        Ok(())
    }
}

// =============================================================================
// InsetMathBig
// =============================================================================

/// Fixed-size big delimiters: `\bigl(` through `\Biggr)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsetMathBig {
    name: String,
    delim: String,
}

impl InsetMathBig {
    pub fn new(name: impl Into<String>, delim: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            delim: delim.into(),
        }
    }

    /// Whether a command name belongs to the big-delimiter family
    pub fn is_big_name(name: &str) -> bool {
        matches!(
            name,
            "big" | "Big" | "bigg" | "Bigg" | "bigl" | "Bigl" | "biggl" | "Biggl" | "bigm"
                | "Bigm" | "biggm" | "Biggm" | "bigr" | "Bigr" | "biggr" | "Biggr"
        )
    }

    /// Size class 1-4 from the command name
    pub fn size(&self) -> i32 {
        match self.name.trim_end_matches(['l', 'm', 'r']) {
            "big" => 1,
            "Big" => 2,
            "bigg" => 3,
            "Bigg" => 4,
            _ => 1,
        }
    }

    fn height_factor(&self) -> f32 {
        match self.size() {
            1 => 1.2,
            2 => 1.8,
            3 => 2.4,
            _ => 3.0,
        }
    }
}

impl InsetMath for InsetMathBig {
    fn metrics(&self, mi: &mut MetricsInfo, dim: &mut Dimension) {
        let font = mi.base.font.text_style();
        let axis = mi.fonts.axis_height(&font);
        let height = (self.height_factor() * mi.base.em() as f32) as i32;
        dim.ascent = axis + height / 2;
        dim.descent = (height - height / 2 - axis).max(0);
        dim.width = (height / 5).clamp(4, 10) + 2;
    }

    fn draw(&self, pi: &mut PainterInfo, x: i32, y: i32) {
        let font = pi.base.font.text_style();
        let axis = pi.fonts.axis_height(&font);
        let height = (self.height_factor() * pi.base.em() as f32) as i32;
        let w = (height / 5).clamp(4, 10);
        if let Some(ch) = delim_char(&self.delim) {
            draw_delim_glyph(pi, ch, x + 1, y - axis - height / 2, w, height);
        }
    }

    fn write(&self, ws: &mut WriteStream) -> fmt::Result {
        ws.command(&self.name)?;
        write_delim_token(ws, &self.delim)
    }

    /// `\bigl` opens, `\bigr` closes, `\bigm` relates, bare `\big` is Ord
    fn math_class(&self) -> MathClass {
        match self.name.chars().last() {
            Some('l') => MathClass::Open,
            Some('r') => MathClass::Close,
            Some('m') => MathClass::Rel,
            _ => MathClass::Ord,
        }
    }

    fn mathmlize(&self, ms: &mut MathMLStream) -> MathedResult<()> {
        let _ = ms;
        Err(MathMLStream::unsupported("big delimiter"))
    }

    fn htmlize(&self, hs: &mut HtmlStream) -> MathedResult<()> {
        let _ = hs;
        Err(HtmlStream::unsupported("big delimiter"))
    }
}
