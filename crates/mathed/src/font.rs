//! Math font state - style level and family threaded through layout
//!
//! `MathStyle` is the TeX size level (display/text/script/scriptscript);
//! `FontInfo` combines it with a family and base size and converts to the
//! concrete `TextStyle` the metrics/painter backends understand.

use render_model::{Color, FontSlant, FontWeight, TextStyle};
use serde::{Deserialize, Serialize};

/// TeX size style levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MathStyle {
    Display,
    #[default]
    Text,
    Script,
    ScriptScript,
}

impl MathStyle {
    /// The style used inside scripts of the current style
    pub fn smaller(self) -> MathStyle {
        match self {
            MathStyle::Display | MathStyle::Text => MathStyle::Script,
            MathStyle::Script | MathStyle::ScriptScript => MathStyle::ScriptScript,
        }
    }

    /// Script and scriptscript styles collapse optional spacing to zero
    pub fn is_script(self) -> bool {
        matches!(self, MathStyle::Script | MathStyle::ScriptScript)
    }

    /// Size multiplier relative to the base font size
    pub fn size_factor(self) -> f32 {
        match self {
            MathStyle::Display | MathStyle::Text => 1.0,
            MathStyle::Script => 0.7,
            MathStyle::ScriptScript => 0.49,
        }
    }
}

/// Math font families selectable via \mathrm, \mathbf, etc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MathFamily {
    /// Default math italic for variables
    #[default]
    Italic,
    /// Upright roman (\mathrm, digits, function names)
    Roman,
    /// Bold (\mathbf)
    Bold,
    /// Sans-serif (\mathsf)
    Sans,
    /// Typewriter (\mathtt)
    Typewriter,
    /// Calligraphic (\mathcal)
    Calligraphic,
    /// Blackboard bold (\mathbb)
    Blackboard,
    /// Fraktur (\mathfrak)
    Fraktur,
}

/// The current font context during a metrics or draw pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FontInfo {
    /// Point size at style factor 1.0
    pub base_size: f32,
    pub style: MathStyle,
    pub family: MathFamily,
    pub color: Color,
}

impl Default for FontInfo {
    fn default() -> Self {
        Self {
            base_size: 11.0,
            style: MathStyle::Text,
            family: MathFamily::Italic,
            color: Color::BLACK,
        }
    }
}

impl FontInfo {
    pub fn new(base_size: f32, style: MathStyle) -> Self {
        Self {
            base_size,
            style,
            ..Default::default()
        }
    }

    /// The mode-name key for this font context ("mathnormal", "mathrm", ...)
    pub fn mode_name(&self) -> &'static str {
        match self.family {
            MathFamily::Italic => "mathnormal",
            MathFamily::Roman => "mathrm",
            MathFamily::Bold => "mathbf",
            MathFamily::Sans => "mathsf",
            MathFamily::Typewriter => "mathtt",
            MathFamily::Calligraphic => "mathcal",
            MathFamily::Blackboard => "mathbb",
            MathFamily::Fraktur => "mathfrak",
        }
    }

    /// The concrete text style at the current style level
    pub fn text_style(&self) -> TextStyle {
        let (weight, slant) = match self.family {
            MathFamily::Italic => (FontWeight::Normal, FontSlant::Italic),
            MathFamily::Bold => (FontWeight::Bold, FontSlant::Normal),
            MathFamily::Blackboard => (FontWeight::Bold, FontSlant::Normal),
            _ => (FontWeight::Normal, FontSlant::Normal),
        };
        TextStyle {
            font_family: "Cambria Math".to_string(),
            font_size: self.base_size * self.style.size_factor(),
            font_weight: weight,
            font_slant: slant,
            color: self.color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smaller_chain() {
        assert_eq!(MathStyle::Display.smaller(), MathStyle::Script);
        assert_eq!(MathStyle::Text.smaller(), MathStyle::Script);
        assert_eq!(MathStyle::Script.smaller(), MathStyle::ScriptScript);
        assert_eq!(MathStyle::ScriptScript.smaller(), MathStyle::ScriptScript);
    }

    #[test]
    fn test_script_sizes_shrink() {
        let text = FontInfo::new(12.0, MathStyle::Text);
        let script = FontInfo::new(12.0, MathStyle::Script);
        assert!(script.text_style().font_size < text.text_style().font_size);
    }

    #[test]
    fn test_is_script() {
        assert!(!MathStyle::Display.is_script());
        assert!(!MathStyle::Text.is_script());
        assert!(MathStyle::Script.is_script());
        assert!(MathStyle::ScriptScript.is_script());
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(FontInfo::default().mode_name(), "mathnormal");
        let mut font = FontInfo::default();
        font.family = MathFamily::Roman;
        assert_eq!(font.mode_name(), "mathrm");
    }
}
