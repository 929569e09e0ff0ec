//! Metrics and painter contexts threaded through every layout call
//!
//! `MetricsBase` carries the ambient layout state (font, available width,
//! macro nesting). Temporary changes are made through scoped changer guards
//! that restore the previous state when dropped, so deeply recursive
//! metrics/draw code cannot leak context even on early return.

use crate::coords::CoordCache;
use crate::font::{FontInfo, MathFamily, MathStyle};
use render_model::{FontMetrics, Painter};
use std::ops::{Deref, DerefMut};

/// Ambient layout state
#[derive(Debug, Clone)]
pub struct MetricsBase {
    pub font: FontInfo,
    /// Available width for line-breaking decisions, in pixels
    pub text_width: i32,
    /// How many macro expansions enclose the current position
    pub macro_nesting: usize,
    /// True inside \text-like content, where math spacing is suppressed
    pub text_mode: bool,
}

impl MetricsBase {
    pub fn new(font: FontInfo, text_width: i32) -> Self {
        Self {
            font,
            text_width,
            macro_nesting: 0,
            text_mode: false,
        }
    }

    /// The em quad at the current style level, in pixels
    pub fn em(&self) -> i32 {
        (self.font.base_size * self.font.style.size_factor())
            .round()
            .max(1.0) as i32
    }

    /// n math units (1 mu = 1/18 em), rounded to pixels
    pub fn mu(&self, units: i32) -> i32 {
        ((self.em() * units) as f32 / 18.0).round() as i32
    }

    /// Thin math skip (3 mu)
    pub fn thin_space(&self) -> i32 {
        self.mu(3)
    }

    /// Medium math skip (4 mu)
    pub fn med_space(&self) -> i32 {
        self.mu(4)
    }

    /// Thick math skip (5 mu)
    pub fn thick_space(&self) -> i32 {
        self.mu(5)
    }

    /// Thickness of rule lines (fraction bars, grid rules)
    pub fn solid_line_thickness(&self) -> i32 {
        (self.em() / 18).max(1)
    }

    /// Thickness of dotted decoration lines
    pub fn dotted_line_thickness(&self) -> i32 {
        (self.em() / 24).max(1)
    }
}

/// Context objects that expose a `MetricsBase`
pub trait HasMetricsBase {
    fn base(&self) -> &MetricsBase;
    fn base_mut(&mut self) -> &mut MetricsBase;
}

/// Context for the metrics pass
pub struct MetricsInfo<'a> {
    pub base: MetricsBase,
    pub fonts: &'a dyn FontMetrics,
    pub coords: &'a mut CoordCache,
}

impl<'a> MetricsInfo<'a> {
    pub fn new(fonts: &'a dyn FontMetrics, coords: &'a mut CoordCache, base: MetricsBase) -> Self {
        Self {
            base,
            fonts,
            coords,
        }
    }
}

impl HasMetricsBase for MetricsInfo<'_> {
    fn base(&self) -> &MetricsBase {
        &self.base
    }
    fn base_mut(&mut self) -> &mut MetricsBase {
        &mut self.base
    }
}

/// Context for the draw pass
pub struct PainterInfo<'a> {
    pub base: MetricsBase,
    pub fonts: &'a dyn FontMetrics,
    pub pain: &'a mut dyn Painter,
    pub coords: &'a mut CoordCache,
}

impl<'a> PainterInfo<'a> {
    pub fn new(
        fonts: &'a dyn FontMetrics,
        pain: &'a mut dyn Painter,
        coords: &'a mut CoordCache,
        base: MetricsBase,
    ) -> Self {
        Self {
            base,
            fonts,
            pain,
            coords,
        }
    }
}

impl HasMetricsBase for PainterInfo<'_> {
    fn base(&self) -> &MetricsBase {
        &self.base
    }
    fn base_mut(&mut self) -> &mut MetricsBase {
        &mut self.base
    }
}

/// Guard that restores the saved font on drop
pub struct FontChanger<'a, C: HasMetricsBase> {
    ctx: &'a mut C,
    saved: FontInfo,
}

impl<C: HasMetricsBase> Deref for FontChanger<'_, C> {
    type Target = C;
    fn deref(&self) -> &C {
        self.ctx
    }
}

impl<C: HasMetricsBase> DerefMut for FontChanger<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        self.ctx
    }
}

impl<C: HasMetricsBase> Drop for FontChanger<'_, C> {
    fn drop(&mut self) {
        self.ctx.base_mut().font = self.saved;
    }
}

/// Guard that restores the saved text width on drop
pub struct WidthChanger<'a, C: HasMetricsBase> {
    ctx: &'a mut C,
    saved: i32,
}

impl<C: HasMetricsBase> Deref for WidthChanger<'_, C> {
    type Target = C;
    fn deref(&self) -> &C {
        self.ctx
    }
}

impl<C: HasMetricsBase> DerefMut for WidthChanger<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        self.ctx
    }
}

impl<C: HasMetricsBase> Drop for WidthChanger<'_, C> {
    fn drop(&mut self) {
        self.ctx.base_mut().text_width = self.saved;
    }
}

/// Guard that restores the saved macro-nesting depth on drop
pub struct NestingChanger<'a, C: HasMetricsBase> {
    ctx: &'a mut C,
    saved: usize,
}

impl<C: HasMetricsBase> Deref for NestingChanger<'_, C> {
    type Target = C;
    fn deref(&self) -> &C {
        self.ctx
    }
}

impl<C: HasMetricsBase> DerefMut for NestingChanger<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        self.ctx
    }
}

impl<C: HasMetricsBase> Drop for NestingChanger<'_, C> {
    fn drop(&mut self) {
        self.ctx.base_mut().macro_nesting = self.saved;
    }
}

/// Scoped context changes, available on both metrics and painter contexts
pub trait ChangeContext: HasMetricsBase + Sized {
    /// Switch to the given style until the guard drops
    fn change_style(&mut self, style: MathStyle) -> FontChanger<'_, Self> {
        let saved = self.base().font;
        self.base_mut().font.style = style;
        FontChanger { ctx: self, saved }
    }

    /// Drop one script level (text -> script -> scriptscript)
    fn change_script(&mut self) -> FontChanger<'_, Self> {
        let saved = self.base().font;
        self.base_mut().font.style = saved.style.smaller();
        FontChanger { ctx: self, saved }
    }

    /// Style change for fraction cells: display drops to text,
    /// everything else drops one script level
    fn change_frac(&mut self) -> FontChanger<'_, Self> {
        let saved = self.base().font;
        self.base_mut().font.style = match saved.style {
            MathStyle::Display => MathStyle::Text,
            other => other.smaller(),
        };
        FontChanger { ctx: self, saved }
    }

    /// Style change for grid cells: display material lays out at text size
    fn change_array(&mut self) -> FontChanger<'_, Self> {
        let saved = self.base().font;
        if saved.style == MathStyle::Display {
            self.base_mut().font.style = MathStyle::Text;
        }
        FontChanger { ctx: self, saved }
    }

    /// Switch font family until the guard drops
    fn change_family(&mut self, family: MathFamily) -> FontChanger<'_, Self> {
        let saved = self.base().font;
        self.base_mut().font.family = family;
        FontChanger { ctx: self, saved }
    }

    /// Constrain the available width until the guard drops
    fn change_width(&mut self, width: i32) -> WidthChanger<'_, Self> {
        let saved = self.base().text_width;
        self.base_mut().text_width = width;
        WidthChanger { ctx: self, saved }
    }

    /// Enter one more level of macro expansion until the guard drops
    fn change_nesting(&mut self) -> NestingChanger<'_, Self> {
        let saved = self.base().macro_nesting;
        self.base_mut().macro_nesting = saved + 1;
        NestingChanger { ctx: self, saved }
    }

    /// Pin the macro-nesting depth to an absolute value until the guard
    /// drops; the row walk uses this to give each flattened element the
    /// depth it was linearized at
    fn change_nesting_to(&mut self, nesting: usize) -> NestingChanger<'_, Self> {
        let saved = self.base().macro_nesting;
        self.base_mut().macro_nesting = nesting;
        NestingChanger { ctx: self, saved }
    }
}

impl<T: HasMetricsBase + Sized> ChangeContext for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::CoordCache;
    use render_model::ApproxFontMetrics;

    fn base() -> MetricsBase {
        MetricsBase::new(FontInfo::default(), 600)
    }

    #[test]
    fn test_mu_scales_with_style() {
        let mut b = base();
        let text_thin = b.thin_space();
        b.font.style = MathStyle::Script;
        let script_thin = b.thin_space();
        assert!(script_thin <= text_thin);
    }

    #[test]
    fn test_skip_ordering() {
        let b = MetricsBase::new(FontInfo::new(24.0, MathStyle::Text), 600);
        assert!(b.thin_space() < b.med_space());
        assert!(b.med_space() < b.thick_space());
    }

    #[test]
    fn test_style_changer_restores() {
        let fonts = ApproxFontMetrics;
        let mut coords = CoordCache::new();
        let mut mi = MetricsInfo::new(&fonts, &mut coords, base());
        {
            let mi2 = mi.change_script();
            assert_eq!(mi2.base().font.style, MathStyle::Script);
        }
        assert_eq!(mi.base.font.style, MathStyle::Text);
    }

    #[test]
    fn test_changers_nest_and_restore_in_order() {
        let fonts = ApproxFontMetrics;
        let mut coords = CoordCache::new();
        let mut mi = MetricsInfo::new(&fonts, &mut coords, base());
        {
            let mut mi2 = mi.change_style(MathStyle::Display);
            {
                let mi3 = mi2.change_script();
                assert_eq!(mi3.base().font.style, MathStyle::Script);
            }
            assert_eq!(mi2.base().font.style, MathStyle::Display);
        }
        assert_eq!(mi.base.font.style, MathStyle::Text);
    }

    #[test]
    fn test_frac_changer_from_display() {
        let fonts = ApproxFontMetrics;
        let mut coords = CoordCache::new();
        let mut b = base();
        b.font.style = MathStyle::Display;
        let mut mi = MetricsInfo::new(&fonts, &mut coords, b);
        {
            let mi2 = mi.change_frac();
            assert_eq!(mi2.base().font.style, MathStyle::Text);
        }
        assert_eq!(mi.base.font.style, MathStyle::Display);
    }

    #[test]
    fn test_nesting_changer() {
        let fonts = ApproxFontMetrics;
        let mut coords = CoordCache::new();
        let mut mi = MetricsInfo::new(&fonts, &mut coords, base());
        {
            let mut mi2 = mi.change_nesting();
            assert_eq!(mi2.base().macro_nesting, 1);
            {
                let mi3 = mi2.change_nesting();
                assert_eq!(mi3.base().macro_nesting, 2);
            }
        }
        assert_eq!(mi.base.macro_nesting, 0);
    }

    #[test]
    fn test_width_changer() {
        let fonts = ApproxFontMetrics;
        let mut coords = CoordCache::new();
        let mut mi = MetricsInfo::new(&fonts, &mut coords, base());
        {
            let mi2 = mi.change_width(100);
            assert_eq!(mi2.base().text_width, 100);
        }
        assert_eq!(mi.base.text_width, 600);
    }
}
