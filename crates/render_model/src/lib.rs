//! Render Model - The drawing surface the math engine talks to
//!
//! This crate defines the narrow abstract interfaces between the math layout
//! engine and a concrete rendering backend:
//! - `FontMetrics` for exact glyph measurement
//! - `Painter` for issuing draw commands against an abstract canvas
//! - `Color` and `TextStyle` value types shared across both
//!
//! A deterministic `ApproxFontMetrics` backend and a primitive-recording
//! `RecordingPainter` are provided so layout can run (and be tested) headless.

mod color;
mod font_metrics;
mod painter;
mod text_style;

pub use color::Color;
pub use font_metrics::{ApproxFontMetrics, FontMetrics, GlyphDim};
pub use painter::{LineStyle, Painter, RecordingPainter, RenderPrimitive};
pub use text_style::{FontSlant, FontWeight, TextStyle};
