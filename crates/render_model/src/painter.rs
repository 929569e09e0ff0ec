//! Painter interface
//!
//! The math engine issues draw commands against this abstract canvas;
//! device/backend specifics are entirely hidden behind it.
//! `RecordingPainter` captures the issued primitives for inspection in tests.

use crate::{Color, TextStyle};
use serde::{Deserialize, Serialize};

/// Stroke style for lines and rectangles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LineStyle {
    #[default]
    Solid,
    Dotted,
}

/// Abstract canvas the engine draws on
pub trait Painter {
    /// Draw text with its baseline starting at (x, y)
    fn text(&mut self, x: i32, y: i32, text: &str, font: &TextStyle);
    /// Draw a straight line between two points
    fn line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: Color, style: LineStyle, thickness: i32);
    /// Draw a connected polyline through the given points
    fn lines(&mut self, points: &[(i32, i32)], color: Color, style: LineStyle, thickness: i32);
    /// Stroke a rectangle outline
    fn rectangle(&mut self, x: i32, y: i32, w: i32, h: i32, color: Color, style: LineStyle, thickness: i32);
    /// Fill a rectangle
    fn fill_rectangle(&mut self, x: i32, y: i32, w: i32, h: i32, color: Color);
}

/// A draw command captured by `RecordingPainter`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RenderPrimitive {
    Text {
        x: i32,
        y: i32,
        text: String,
        font: TextStyle,
    },
    Line {
        from: (i32, i32),
        to: (i32, i32),
        color: Color,
        style: LineStyle,
        thickness: i32,
    },
    Lines {
        points: Vec<(i32, i32)>,
        color: Color,
        style: LineStyle,
        thickness: i32,
    },
    Rectangle {
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        color: Color,
        style: LineStyle,
        thickness: i32,
    },
    FillRectangle {
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        color: Color,
    },
}

/// Painter that records every primitive instead of rasterizing
#[derive(Debug, Default)]
pub struct RecordingPainter {
    pub primitives: Vec<RenderPrimitive>,
}

impl RecordingPainter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of captured primitives
    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// All text primitives, in draw order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.primitives.iter().filter_map(|p| match p {
            RenderPrimitive::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

impl Painter for RecordingPainter {
    fn text(&mut self, x: i32, y: i32, text: &str, font: &TextStyle) {
        self.primitives.push(RenderPrimitive::Text {
            x,
            y,
            text: text.to_string(),
            font: font.clone(),
        });
    }

    fn line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: Color, style: LineStyle, thickness: i32) {
        self.primitives.push(RenderPrimitive::Line {
            from: (x1, y1),
            to: (x2, y2),
            color,
            style,
            thickness,
        });
    }

    fn lines(&mut self, points: &[(i32, i32)], color: Color, style: LineStyle, thickness: i32) {
        self.primitives.push(RenderPrimitive::Lines {
            points: points.to_vec(),
            color,
            style,
            thickness,
        });
    }

    fn rectangle(&mut self, x: i32, y: i32, w: i32, h: i32, color: Color, style: LineStyle, thickness: i32) {
        self.primitives.push(RenderPrimitive::Rectangle {
            x,
            y,
            w,
            h,
            color,
            style,
            thickness,
        });
    }

    fn fill_rectangle(&mut self, x: i32, y: i32, w: i32, h: i32, color: Color) {
        self.primitives
            .push(RenderPrimitive::FillRectangle { x, y, w, h, color });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_painter_captures_in_order() {
        let mut painter = RecordingPainter::new();
        painter.text(0, 10, "x", &TextStyle::default());
        painter.line(0, 0, 5, 5, Color::BLACK, LineStyle::Solid, 1);
        assert_eq!(painter.len(), 2);
        assert!(matches!(painter.primitives[0], RenderPrimitive::Text { .. }));
        assert!(matches!(painter.primitives[1], RenderPrimitive::Line { .. }));
    }

    #[test]
    fn test_texts_iterator() {
        let mut painter = RecordingPainter::new();
        painter.text(0, 0, "a", &TextStyle::default());
        painter.fill_rectangle(0, 0, 1, 1, Color::GREY);
        painter.text(5, 0, "b", &TextStyle::default());
        let texts: Vec<_> = painter.texts().collect();
        assert_eq!(texts, vec!["a", "b"]);
    }
}
