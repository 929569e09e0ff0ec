//! Mathed - mathematical formula layout and rendering engine
//!
//! This crate implements the math subsystem of the word processor:
//! - An inset tree of math constructs (characters, symbols, scripts,
//!   fractions, delimiters, grids, macros) with a common metrics/draw/write
//!   contract
//! - TeX-style atom classification and inter-atom spacing
//! - Row linearization that dissolves macro expansions before spacing
//! - A two-pass layout protocol: bottom-up metrics with dimension caching,
//!   then top-down drawing against an abstract painter
//! - A coordinate cache for cursor hit-testing
//! - Structural grid editing through a status-checked command dispatch
//!
//! Font measurement and painting are consumed through the narrow traits in
//! `render_model`; the surrounding document model drives the engine through
//! `MetricsInfo`/`PainterInfo` contexts and the dispatch surface.

pub mod class;
pub mod coords;
pub mod cursor;
pub mod data;
pub mod delim;
pub mod dimension;
pub mod dispatch;
pub mod error;
pub mod font;
pub mod frac;
pub mod grid;
pub mod inset;
pub mod leaf;
pub mod macro_inset;
pub mod metrics;
pub mod row;
pub mod script;
pub mod sideset;
pub mod write;

pub use class::{char_class, class_spacing, update_class, MathClass};
pub use coords::{addr_of, CoordCache, CoordMap, Geometry};
pub use cursor::CursorSlice;
pub use data::MathData;
pub use delim::{delim_char, InsetMathBig, InsetMathDelim};
pub use dimension::{Dimension, Point};
pub use dispatch::{
    parse_grid_feature, Action, DispatchResult, FuncRequest, FuncStatus, GridFeature,
};
pub use error::{MathedError, MathedResult};
pub use font::{FontInfo, MathFamily, MathStyle};
pub use frac::{BinomKind, FracKind, InsetMathBinom, InsetMathFrac};
pub use grid::{CellInfo, ColInfo, GridPos, InsetMathGrid, Multicolumn, RowInfo, VAlign};
pub use inset::{Inset, InsetMath, Marker, MathAtom};
pub use leaf::{
    find_symbol, DotsKind, InsetMathChar, InsetMathClass, InsetMathDots, InsetMathSymbol,
    SymbolEntry,
};
pub use macro_inset::{
    ArgumentProxy, DisplayMode, MacroContext, MacroDefinition, MacroTable, MathMacro,
};
pub use metrics::{ChangeContext, HasMetricsBase, MetricsBase, MetricsInfo, PainterInfo};
pub use row::{Element, ElementKind, MathRow};
pub use script::{InsetMathScript, Limits, ScriptCollapse, ScriptShape};
pub use sideset::InsetMathSideset;
pub use write::{FeatureList, HtmlStream, LaTeXFeatures, MathMLStream, WriteStream};

#[cfg(test)]
mod tests {
    use super::*;
    use render_model::{ApproxFontMetrics, FontMetrics, RecordingPainter, RenderPrimitive};

    // =============================================================================
    // Integration Tests
    // =============================================================================

    fn layout_and_draw(cell: &MathData, style: MathStyle) -> (Dimension, RecordingPainter) {
        let fonts = ApproxFontMetrics;
        let mut coords = CoordCache::new();
        let mut dim = Dimension::default();
        {
            let mut mi = MetricsInfo::new(
                &fonts,
                &mut coords,
                MetricsBase::new(FontInfo::new(12.0, style), 600),
            );
            cell.metrics(&mut mi, &mut dim);
        }
        let mut painter = RecordingPainter::new();
        {
            let mut pi = PainterInfo::new(
                &fonts,
                &mut painter,
                &mut coords,
                MetricsBase::new(FontInfo::new(12.0, style), 600),
            );
            cell.draw(&mut pi, 0, dim.ascent);
        }
        (dim, painter)
    }

    #[test]
    fn test_metrics_draw_pipeline_for_fraction() {
        let mut cell = MathData::new();
        cell.push(MathAtom::new(Inset::Frac(InsetMathFrac::frac(
            MathData::from_str_atoms("a"),
            MathData::from_str_atoms("b"),
        ))));
        let (dim, painter) = layout_and_draw(&cell, MathStyle::Text);
        assert!(dim.width > 0 && dim.height() > 0);
        let texts: Vec<_> = painter.texts().collect();
        assert!(texts.contains(&"a") && texts.contains(&"b"));
        // The fraction bar is a line primitive
        assert!(painter
            .primitives
            .iter()
            .any(|p| matches!(p, RenderPrimitive::Line { .. })));
    }

    #[test]
    fn test_simple_formula_spacing_and_order() {
        let cell = MathData::from_str_atoms("x+y");
        let (dim, painter) = layout_and_draw(&cell, MathStyle::Text);
        let positions: Vec<i32> = painter
            .primitives
            .iter()
            .filter_map(|p| match p {
                RenderPrimitive::Text { x, .. } => Some(*x),
                _ => None,
            })
            .collect();
        assert_eq!(positions.len(), 3);
        // Left-to-right drawing order, never overlapping
        assert!(positions[0] < positions[1] && positions[1] < positions[2]);
        // The med skips around '+' widen the row beyond the bare glyphs
        let fonts = ApproxFontMetrics;
        let font = FontInfo::new(12.0, MathStyle::Text).text_style();
        let bare = fonts.string_width("x+y", &font);
        assert!(dim.width > bare);
    }

    #[test]
    fn test_display_sum_with_limits() {
        let mut nuc = MathData::new();
        nuc.push(MathAtom::new(Inset::Symbol(
            InsetMathSymbol::named("sum").unwrap(),
        )));
        let script = InsetMathScript::with_sub_sup(
            nuc,
            MathData::from_str_atoms("i"),
            MathData::from_str_atoms("n"),
        );
        let mut cell = MathData::new();
        cell.push(MathAtom::new(Inset::Script(script)));
        let (dim, painter) = layout_and_draw(&cell, MathStyle::Display);
        assert!(dim.height() > 0);
        let texts: Vec<_> = painter.texts().collect();
        assert!(texts.contains(&"\u{2211}"));
        assert!(texts.contains(&"i") && texts.contains(&"n"));
    }

    #[test]
    fn test_matrix_in_delimiters() {
        let mut grid = InsetMathGrid::new(2, 2);
        *grid.cell_at_mut(0, 0) = MathData::from_str_atoms("1");
        *grid.cell_at_mut(0, 1) = MathData::from_str_atoms("0");
        *grid.cell_at_mut(1, 0) = MathData::from_str_atoms("0");
        *grid.cell_at_mut(1, 1) = MathData::from_str_atoms("1");
        let delim = InsetMathDelim::new("(", ")", {
            let mut inner = MathData::new();
            inner.push(MathAtom::new(Inset::Grid(grid)));
            inner
        });
        let mut cell = MathData::new();
        cell.push(MathAtom::new(Inset::Delim(delim)));
        let (dim, painter) = layout_and_draw(&cell, MathStyle::Text);
        assert!(dim.height() > 0);
        assert_eq!(painter.texts().filter(|t| *t == "1").count(), 2);
    }

    #[test]
    fn test_coordinate_cache_hit_testing() {
        let cell = MathData::from_str_atoms("abc");
        let fonts = ApproxFontMetrics;
        let mut coords = CoordCache::new();
        let mut dim = Dimension::default();
        {
            let mut mi = MetricsInfo::new(
                &fonts,
                &mut coords,
                MetricsBase::new(FontInfo::default(), 600),
            );
            cell.metrics(&mut mi, &mut dim);
        }
        let mut painter = RecordingPainter::new();
        {
            let mut pi = PainterInfo::new(
                &fonts,
                &mut painter,
                &mut coords,
                MetricsBase::new(FontInfo::default(), 600),
            );
            cell.draw(&mut pi, 10, 20);
        }
        // The cell itself and each char inset are hit-testable
        assert!(coords.cells.covers(addr_of(&cell), 12, 20));
        let first_char = addr_of(cell[0].nucleus());
        assert!(coords.insets.geometry(first_char).is_some());
        assert_eq!(coords.insets.find_near(11, 20), Some(first_char));
    }

    #[test]
    fn test_macro_footprint_recorded_without_owning_node() {
        let mut table = MacroTable::new();
        let mut body = MathData::new();
        body.push(MathAtom::new(Inset::ArgProxy(ArgumentProxy::new(0))));
        body.push(MathAtom::char('!'));
        table.define("bang", 1, body);

        let mut mac = MathMacro::new("bang", 1);
        mac.set_arg(0, MathData::from_str_atoms("q"));
        mac.update_representation(&table);

        let mut cell = MathData::new();
        cell.push(MathAtom::new(Inset::Macro(mac)));

        let fonts = ApproxFontMetrics;
        let mut coords = CoordCache::new();
        let mut dim = Dimension::default();
        let mut mi = MetricsInfo::new(
            &fonts,
            &mut coords,
            MetricsBase::new(FontInfo::default(), 600),
        );
        cell.metrics(&mut mi, &mut dim);

        // The dissolved macro never got a direct metrics call, yet its
        // footprint is in the cache under the original inset pointer
        let wrapper = addr_of(cell[0].nucleus());
        let span = mi.coords.insets.dim(wrapper).expect("macro span recorded");
        assert!(span.width > 0);
        assert!(span.width <= dim.width);
    }

    #[test]
    fn test_validate_collects_packages_through_nesting() {
        let mut num = MathData::new();
        num.push(MathAtom::new(Inset::Symbol(
            InsetMathSymbol::named("nexists").unwrap(),
        )));
        let frac = InsetMathFrac::new(FracKind::Dfrac, num, MathData::from_str_atoms("2"));
        let mut features = FeatureList::new();
        frac.validate(&mut features);
        assert!(features.has_package("amsmath"));
        assert!(features.has_package("amssymb"));
    }

    #[test]
    fn test_whole_formula_write() {
        // x^2 + \frac{1}{y}
        let mut cell = MathData::new();
        cell.push(MathAtom::new(Inset::Script(InsetMathScript::with_sup(
            MathData::from_str_atoms("x"),
            MathData::from_str_atoms("2"),
        ))));
        cell.push(MathAtom::char('+'));
        cell.push(MathAtom::new(Inset::Frac(InsetMathFrac::frac(
            MathData::from_str_atoms("1"),
            MathData::from_str_atoms("y"),
        ))));
        assert_eq!(cell.to_latex(), "x^{2}+\\frac{1}{y}");
    }

    #[test]
    fn test_serde_round_trip_of_formula_tree() {
        let mut grid = InsetMathGrid::new(2, 1);
        *grid.cell_at_mut(0, 0) = MathData::from_str_atoms("a");
        *grid.cell_at_mut(0, 1) = {
            let mut c = MathData::new();
            c.push(MathAtom::new(Inset::Script(InsetMathScript::with_sub(
                MathData::from_str_atoms("x"),
                MathData::from_str_atoms("0"),
            ))));
            c
        };
        let mut cell = MathData::new();
        cell.push(MathAtom::new(Inset::Grid(grid)));

        let json = serde_json::to_string(&cell).unwrap();
        let back: MathData = serde_json::from_str(&json).unwrap();
        assert_eq!(cell, back);
        assert_eq!(back.to_latex(), cell.to_latex());
    }

    #[test]
    fn test_grid_dispatch_round_trip_through_write() {
        let mut grid = InsetMathGrid::new(2, 2);
        *grid.cell_at_mut(0, 0) = MathData::from_str_atoms("a");
        *grid.cell_at_mut(0, 1) = MathData::from_str_atoms("b");
        *grid.cell_at_mut(1, 0) = MathData::from_str_atoms("c");
        *grid.cell_at_mut(1, 1) = MathData::from_str_atoms("d");
        let result = grid.do_dispatch(
            GridPos::new(1, 0),
            0,
            &FuncRequest::tabular("add-hline-above"),
        );
        assert!(result.dispatched());

        let mut buf = String::new();
        let mut ws = WriteStream::new(&mut buf);
        grid.write(&mut ws).unwrap();
        assert_eq!(buf, "a&b\\\\\n\\hline\nc&d");
    }

    #[test]
    fn test_mathml_export_of_script() {
        let script = InsetMathScript::with_sup(
            MathData::from_str_atoms("x"),
            MathData::from_str_atoms("2"),
        );
        let mut buf = String::new();
        let mut ms = MathMLStream::new(&mut buf);
        script.mathmlize(&mut ms).unwrap();
        assert_eq!(
            buf,
            "<msup><mrow><mi>x</mi></mrow><mrow><mn>2</mn></mrow></msup>"
        );
    }

    #[test]
    fn test_export_error_propagates_from_nested_construct() {
        let mut cell = MathData::new();
        cell.push(MathAtom::new(Inset::Big(InsetMathBig::new("bigl", "("))));
        let mut buf = String::new();
        let mut ms = MathMLStream::new(&mut buf);
        let err = cell.mathmlize(&mut ms).unwrap_err();
        assert!(matches!(err, MathedError::Export { format: "mathml", .. }));
    }
}
