//! Text styling passed to the painter and the font-metrics backend

use crate::Color;
use serde::{Deserialize, Serialize};

/// Font weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

/// Font slant (italic/normal)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FontSlant {
    #[default]
    Normal,
    Italic,
}

/// Text styling for measurement and rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub font_family: String,
    pub font_size: f32,
    pub font_weight: FontWeight,
    pub font_slant: FontSlant,
    pub color: Color,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: "Cambria Math".to_string(),
            font_size: 11.0,
            font_weight: FontWeight::Normal,
            font_slant: FontSlant::Italic,
            color: Color::BLACK,
        }
    }
}

impl TextStyle {
    /// Style for a given point size, other fields at their defaults
    pub fn sized(font_size: f32) -> Self {
        Self {
            font_size,
            ..Default::default()
        }
    }

    pub fn with_slant(mut self, slant: FontSlant) -> Self {
        self.font_slant = slant;
        self
    }

    pub fn with_weight(mut self, weight: FontWeight) -> Self {
        self.font_weight = weight;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_style() {
        let style = TextStyle::default();
        assert_eq!(style.font_slant, FontSlant::Italic);
        assert_eq!(style.font_size, 11.0);
    }

    #[test]
    fn test_builders() {
        let style = TextStyle::sized(14.0)
            .with_slant(FontSlant::Normal)
            .with_weight(FontWeight::Bold);
        assert_eq!(style.font_size, 14.0);
        assert_eq!(style.font_weight, FontWeight::Bold);
    }
}
