//! Font metrics interface
//!
//! The math engine never rasterizes glyphs itself; it measures them through
//! this trait. `ApproxFontMetrics` is a deterministic backend derived from
//! typical math-font proportions, good enough for headless layout and tests.

use crate::TextStyle;
use serde::{Deserialize, Serialize};

/// Measured extents of a single glyph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GlyphDim {
    pub width: i32,
    pub ascent: i32,
    pub descent: i32,
}

impl GlyphDim {
    pub fn height(&self) -> i32 {
        self.ascent + self.descent
    }
}

/// Exact glyph metrics for an active font
pub trait FontMetrics {
    /// Tallest ascent any glyph of this font can have
    fn max_ascent(&self, font: &TextStyle) -> i32;
    /// Deepest descent any glyph of this font can have
    fn max_descent(&self, font: &TextStyle) -> i32;
    /// The em quad of the font
    fn em(&self, font: &TextStyle) -> i32;
    /// Height of a lowercase 'x'
    fn x_height(&self, font: &TextStyle) -> i32;
    /// Height of an uppercase letter above the baseline
    fn cap_height(&self, font: &TextStyle) -> i32;
    /// The vertical center line symbols like '+' and '=' sit on,
    /// measured above the baseline
    fn axis_height(&self, font: &TextStyle) -> i32;
    /// Advance width of a single character
    fn char_width(&self, c: char, font: &TextStyle) -> i32;
    /// Advance width of a string
    fn string_width(&self, s: &str, font: &TextStyle) -> i32 {
        s.chars().map(|c| self.char_width(c, font)).sum()
    }
    /// Full extents of a single character
    fn char_dim(&self, c: char, font: &TextStyle) -> GlyphDim;
}

/// Deterministic approximate metrics derived from the point size.
///
/// Proportions follow typical math fonts: 0.8em ascent, 0.2em descent,
/// 0.45em x-height, 0.5em average advance.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproxFontMetrics;

impl ApproxFontMetrics {
    fn scale(font: &TextStyle, factor: f32) -> i32 {
        (font.font_size * factor).round() as i32
    }
}

impl FontMetrics for ApproxFontMetrics {
    fn max_ascent(&self, font: &TextStyle) -> i32 {
        Self::scale(font, 0.8)
    }

    fn max_descent(&self, font: &TextStyle) -> i32 {
        Self::scale(font, 0.2)
    }

    fn em(&self, font: &TextStyle) -> i32 {
        Self::scale(font, 1.0).max(1)
    }

    fn x_height(&self, font: &TextStyle) -> i32 {
        Self::scale(font, 0.45)
    }

    fn cap_height(&self, font: &TextStyle) -> i32 {
        Self::scale(font, 0.7)
    }

    fn axis_height(&self, font: &TextStyle) -> i32 {
        // Optical center of '+' and '=': half the x-height
        Self::scale(font, 0.225)
    }

    fn char_width(&self, c: char, font: &TextStyle) -> i32 {
        let factor = match c {
            'i' | 'j' | 'l' | 't' | 'f' | '.' | ',' | ';' | ':' | '|' | '!' | '\'' => 0.3,
            'm' | 'w' | 'M' | 'W' => 0.8,
            '\u{2211}' | '\u{220F}' | '\u{222B}' | '\u{22C3}' | '\u{22C2}' => 0.9,
            _ => 0.5,
        };
        Self::scale(font, factor).max(1)
    }

    fn char_dim(&self, c: char, font: &TextStyle) -> GlyphDim {
        let has_descender = matches!(c, 'g' | 'j' | 'p' | 'q' | 'y' | ',' | ';');
        let is_lowercase = c.is_lowercase() && !matches!(c, 'b' | 'd' | 'f' | 'h' | 'k' | 'l' | 't');
        let ascent = if is_lowercase {
            self.x_height(font)
        } else {
            self.max_ascent(font)
        };
        let descent = if has_descender {
            self.max_descent(font)
        } else {
            0
        };
        GlyphDim {
            width: self.char_width(c, font),
            ascent,
            descent,
        }
    }
}
