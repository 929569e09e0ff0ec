//! Macro invocation and expansion
//!
//! A macro inset owns its argument cells and a cached expansion of the
//! definition body with the current arguments substituted. Expansion is a
//! pure function of (definition, argument contents) and is only recomputed
//! when the definition lookup reports a change or an argument was edited.
//! During linearization an expanded macro dissolves into the row between
//! Begin/End markers so its contents participate in spacing as if
//! textually substituted.

use crate::class::MathClass;
use crate::data::MathData;
use crate::dimension::Dimension;
use crate::error::MathedResult;
use crate::inset::{Inset, InsetMath, Marker};
use crate::metrics::{ChangeContext, MetricsInfo, PainterInfo};
use crate::row::MathRow;
use crate::write::{HtmlStream, MathMLStream, WriteStream};
use render_model::{Color, FontMetrics, LineStyle, Painter as _};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fmt::Write as _;
use tracing::trace;

/// Presentation state of a macro inset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DisplayMode {
    /// Freshly constructed, not yet resolved against a definition
    #[default]
    Init,
    /// Being typed interactively; not yet resolved
    InteractiveInit,
    /// No definition found; rendered as a grey command name
    Unfolded,
    /// Definition found; rendered through the cached expansion
    Normal,
}

/// A macro definition the engine can expand against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroDefinition {
    pub name: String,
    pub nargs: usize,
    /// Body tree containing `ArgumentProxy` leaves for the parameters
    pub body: MathData,
    /// Bumped every time the definition changes
    pub revision: u64,
}

/// External collaborator resolving macro names to definitions
pub trait MacroContext {
    fn lookup(&self, name: &str) -> Option<&MacroDefinition>;
}

/// Simple table-backed context used by tests and headless processing
#[derive(Debug, Default)]
pub struct MacroTable {
    defs: HashMap<String, MacroDefinition>,
    next_revision: u64,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define or redefine a macro; redefinition bumps the revision
    pub fn define(&mut self, name: impl Into<String>, nargs: usize, body: MathData) {
        let name = name.into();
        self.next_revision += 1;
        self.defs.insert(
            name.clone(),
            MacroDefinition {
                name,
                nargs,
                body,
                revision: self.next_revision,
            },
        );
    }
}

impl MacroContext for MacroTable {
    fn lookup(&self, name: &str) -> Option<&MacroDefinition> {
        self.defs.get(name)
    }
}

// =============================================================================
// ArgumentProxy
// =============================================================================

/// Stands in for "argument i" inside a macro definition body. Carries an
/// optional default rendered when the argument cell is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgumentProxy {
    index: usize,
    default: MathData,
}

impl ArgumentProxy {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            default: MathData::new(),
        }
    }

    pub fn with_default(index: usize, default: MathData) -> Self {
        Self { index, default }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn default_value(&self) -> &MathData {
        &self.default
    }
}

impl InsetMath for ArgumentProxy {
    fn metrics(&self, mi: &mut MetricsInfo, dim: &mut Dimension) {
        // Inside an unexpanded body the proxy shows its default (or an
        // empty box when there is none)
        self.default.metrics(mi, dim);
    }

    fn draw(&self, pi: &mut PainterInfo, x: i32, y: i32) {
        self.default.draw(pi, x, y);
    }

    fn write(&self, ws: &mut WriteStream) -> fmt::Result {
        write!(ws, "#{}", self.index + 1)
    }

    fn math_class(&self) -> MathClass {
        self.default.last_class()
    }

    fn mathmlize(&self, ms: &mut MathMLStream) -> MathedResult<()> {
        self.default.mathmlize(ms)
    }

    fn htmlize(&self, hs: &mut HtmlStream) -> MathedResult<()> {
        self.default.htmlize(hs)
    }
}

// =============================================================================
// MathMacro
// =============================================================================

/// A macro invocation node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MathMacro {
    name: String,
    args: Vec<MathData>,
    display: DisplayMode,
    /// Cached substituted-body result, valid while `needs_update` is false
    expanded: MathData,
    needs_update: bool,
    /// Revision of the definition the cache was built against
    def_revision: u64,
}

impl MathMacro {
    pub fn new(name: impl Into<String>, nargs: usize) -> Self {
        Self {
            name: name.into(),
            args: vec![MathData::new(); nargs],
            display: DisplayMode::Init,
            expanded: MathData::new(),
            needs_update: true,
            def_revision: 0,
        }
    }

    /// A macro the user is still typing the name of
    pub fn interactive(name: impl Into<String>) -> Self {
        let mut mac = Self::new(name, 0);
        mac.display = DisplayMode::InteractiveInit;
        mac
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.display
    }

    pub fn expanded(&self) -> &MathData {
        &self.expanded
    }

    pub fn arg(&self, idx: usize) -> Option<&MathData> {
        self.args.get(idx)
    }

    /// Replace an argument cell and invalidate the cached expansion
    pub fn set_arg(&mut self, idx: usize, content: MathData) {
        if let Some(cell) = self.args.get_mut(idx) {
            *cell = content;
            self.needs_update = true;
        }
    }

    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    /// Mark the expansion stale (e.g. after in-place argument edits)
    pub fn invalidate(&mut self) {
        self.needs_update = true;
    }

    /// Resolve against the definition context and rebuild the cached
    /// expansion if the definition changed or arguments were edited.
    /// Re-expansion never happens otherwise.
    pub fn update_representation(&mut self, ctx: &dyn MacroContext) {
        match ctx.lookup(&self.name) {
            None => {
                self.display = DisplayMode::Unfolded;
                self.expanded = MathData::new();
                self.def_revision = 0;
            }
            Some(def) => {
                if !self.needs_update && self.def_revision == def.revision {
                    return;
                }
                trace!(name = %self.name, revision = def.revision, "expanding macro");
                self.args.resize(def.nargs, MathData::new());
                self.expanded = substitute(&def.body, &self.args);
                self.def_revision = def.revision;
                self.display = DisplayMode::Normal;
                self.needs_update = false;
            }
        }
    }

    /// Linearization: an expanded macro dissolves between Begin/End
    /// markers, attributing an incremented nesting depth to every
    /// contained element; an unresolved one stays a single opaque element.
    pub fn add_to_math_row<'a>(
        &'a self,
        wrapper: &'a Inset,
        row: &mut MathRow<'a>,
        nesting: usize,
    ) {
        if self.display == DisplayMode::Normal {
            row.push_begin(Some(wrapper), Some(&self.expanded), nesting);
            for atom in self.expanded.iter() {
                atom.add_to_math_row(row, nesting + 1);
            }
            row.push_end(Some(wrapper), Some(&self.expanded), nesting);
        } else {
            row.push_inset(wrapper, nesting);
        }
    }

    fn grey_style(&self, base: &crate::metrics::MetricsBase) -> render_model::TextStyle {
        let mut style = base.font.text_style();
        style.color = Color::GREY;
        style.font_slant = render_model::FontSlant::Normal;
        style
    }

    fn button_label(&self) -> String {
        format!("\\{}", self.name)
    }
}

impl InsetMath for MathMacro {
    fn metrics(&self, mi: &mut MetricsInfo, dim: &mut Dimension) {
        if self.display == DisplayMode::Normal {
            let mut mi2 = mi.change_nesting();
            self.expanded.metrics(&mut mi2, dim);
        } else {
            // Grey command-name button
            let style = self.grey_style(&mi.base);
            let label = self.button_label();
            dim.width = mi.fonts.string_width(&label, &style) + 4;
            dim.ascent = mi.fonts.max_ascent(&style) + 2;
            dim.descent = mi.fonts.max_descent(&style) + 2;
        }
    }

    fn draw(&self, pi: &mut PainterInfo, x: i32, y: i32) {
        if self.display == DisplayMode::Normal {
            let mut pi2 = pi.change_nesting();
            self.expanded.draw(&mut pi2, x, y);
        } else {
            // Same arithmetic as the metrics pass, so the frame matches
            // the reserved box exactly
            let style = self.grey_style(&pi.base);
            let label = self.button_label();
            let width = pi.fonts.string_width(&label, &style) + 4;
            let ascent = pi.fonts.max_ascent(&style) + 2;
            let descent = pi.fonts.max_descent(&style) + 2;
            pi.pain.rectangle(
                x,
                y - ascent,
                width,
                ascent + descent,
                Color::GREY,
                LineStyle::Dotted,
                pi.base.dotted_line_thickness(),
            );
            pi.pain.text(x + 2, y, &label, &style);
        }
    }

    fn write(&self, ws: &mut WriteStream) -> fmt::Result {
        ws.command(&self.name)?;
        for arg in &self.args {
            write!(ws, "{{")?;
            arg.write(ws)?;
            write!(ws, "}}")?;
        }
        Ok(())
    }

    fn math_class(&self) -> MathClass {
        if self.display == DisplayMode::Normal {
            self.expanded.last_class()
        } else {
            MathClass::Ord
        }
    }

    fn marker(&self, nesting: usize) -> Marker {
        if nesting == 0 {
            Marker::Frame
        } else {
            Marker::None
        }
    }

    fn nargs(&self) -> usize {
        self.args.len()
    }

    fn cell(&self, idx: usize) -> Option<&MathData> {
        self.args.get(idx)
    }

    fn cell_mut(&mut self, idx: usize) -> Option<&mut MathData> {
        // Editing an argument invalidates the cached expansion
        self.needs_update = true;
        self.args.get_mut(idx)
    }

    fn mathmlize(&self, ms: &mut MathMLStream) -> MathedResult<()> {
        if self.display == DisplayMode::Normal {
            self.expanded.mathmlize(ms)
        } else {
            Err(MathMLStream::unsupported("unresolved macro"))
        }
    }

    fn htmlize(&self, hs: &mut HtmlStream) -> MathedResult<()> {
        if self.display == DisplayMode::Normal {
            self.expanded.htmlize(hs)
        } else {
            Err(HtmlStream::unsupported("unresolved macro"))
        }
    }
}

/// Substitute argument proxies throughout a body tree. Empty argument
/// cells fall back to the proxy's default value.
fn substitute(body: &MathData, args: &[MathData]) -> MathData {
    let mut out = MathData::new();
    for atom in body.iter() {
        match atom.nucleus() {
            Inset::ArgProxy(proxy) => {
                let replacement = match args.get(proxy.index()) {
                    Some(arg) if !arg.is_empty() => arg,
                    _ => proxy.default_value(),
                };
                for a in replacement.iter() {
                    out.push(a.clone());
                }
            }
            _ => {
                let mut copy = atom.clone();
                for i in 0..copy.nargs() {
                    if let Some(cell) = copy.cell_mut(i) {
                        let substituted = substitute(cell, args);
                        *cell = substituted;
                    }
                }
                out.push(copy);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frac::InsetMathFrac;
    use crate::inset::MathAtom;

    /// `\half{#1}` := \frac{#1}{2}
    fn half_definition() -> MathData {
        let mut num = MathData::new();
        num.push(MathAtom::new(Inset::ArgProxy(ArgumentProxy::new(0))));
        let frac = InsetMathFrac::frac(num, MathData::from_str_atoms("2"));
        let mut body = MathData::new();
        body.push(MathAtom::new(Inset::Frac(frac)));
        body
    }

    #[test]
    fn test_expansion_substitutes_arguments() {
        let mut table = MacroTable::new();
        table.define("half", 1, half_definition());

        let mut mac = MathMacro::new("half", 1);
        mac.set_arg(0, MathData::from_str_atoms("x"));
        mac.update_representation(&table);

        assert_eq!(mac.display_mode(), DisplayMode::Normal);
        assert_eq!(mac.expanded().to_latex(), "\\frac{x}{2}");
    }

    #[test]
    fn test_empty_argument_uses_proxy_default() {
        let mut body = MathData::new();
        body.push(MathAtom::new(Inset::ArgProxy(ArgumentProxy::with_default(
            0,
            MathData::from_str_atoms("z"),
        ))));
        let mut table = MacroTable::new();
        table.define("dflt", 1, body);

        let mut mac = MathMacro::new("dflt", 1);
        mac.update_representation(&table);
        assert_eq!(mac.expanded().to_latex(), "z");
    }

    #[test]
    fn test_unknown_macro_unfolds() {
        let table = MacroTable::new();
        let mut mac = MathMacro::new("nosuch", 0);
        mac.update_representation(&table);
        assert_eq!(mac.display_mode(), DisplayMode::Unfolded);
    }

    #[test]
    fn test_reexpansion_only_on_change() {
        let mut table = MacroTable::new();
        table.define("half", 1, half_definition());

        let mut mac = MathMacro::new("half", 1);
        mac.set_arg(0, MathData::from_str_atoms("a"));
        mac.update_representation(&table);
        assert!(!mac.needs_update());
        let first = mac.expanded().clone();

        // Same definition, same args: the cache is reused untouched
        mac.update_representation(&table);
        assert_eq!(mac.expanded(), &first);

        // Redefinition bumps the revision and forces a rebuild
        let mut body = MathData::new();
        body.push(MathAtom::new(Inset::ArgProxy(ArgumentProxy::new(0))));
        table.define("half", 1, body);
        mac.update_representation(&table);
        assert_eq!(mac.expanded().to_latex(), "a");
    }

    #[test]
    fn test_argument_edit_invalidates() {
        let mut table = MacroTable::new();
        table.define("half", 1, half_definition());
        let mut mac = MathMacro::new("half", 1);
        mac.set_arg(0, MathData::from_str_atoms("a"));
        mac.update_representation(&table);
        mac.set_arg(0, MathData::from_str_atoms("b"));
        assert!(mac.needs_update());
        mac.update_representation(&table);
        assert_eq!(mac.expanded().to_latex(), "\\frac{b}{2}");
    }

    #[test]
    fn test_write_with_arguments() {
        let mut mac = MathMacro::new("half", 1);
        mac.set_arg(0, MathData::from_str_atoms("x"));
        let mut buf = String::new();
        let mut ws = WriteStream::new(&mut buf);
        mac.write(&mut ws).unwrap();
        assert_eq!(buf, "\\half{x}");
    }

    #[test]
    fn test_proxy_write() {
        let proxy = ArgumentProxy::new(0);
        let mut buf = String::new();
        let mut ws = WriteStream::new(&mut buf);
        proxy.write(&mut ws).unwrap();
        assert_eq!(buf, "#1");
    }

    #[test]
    fn test_row_dissolution_increments_nesting() {
        use crate::font::FontInfo;
        use crate::metrics::MetricsBase;
        use crate::row::ElementKind;

        let mut table = MacroTable::new();
        table.define("half", 1, half_definition());
        let mut mac = MathMacro::new("half", 1);
        mac.set_arg(0, MathData::from_str_atoms("x"));
        mac.update_representation(&table);

        let mut cell = MathData::new();
        cell.push(MathAtom::new(Inset::Macro(mac)));
        let base = MetricsBase::new(FontInfo::default(), 600);
        let row = MathRow::new(&base, &cell);

        let kinds: Vec<ElementKind> = row.elements().iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ElementKind::Dummy,
                ElementKind::Begin,
                ElementKind::Inset,
                ElementKind::End,
                ElementKind::Dummy,
            ]
        );
        // The dissolved fraction sits one nesting level deeper
        assert_eq!(row.elements()[2].macro_nesting, 1);
        // Begin and End reference the same expansion cell
        assert_eq!(
            row.elements()[1].cell.map(crate::coords::addr_of),
            row.elements()[3].cell.map(crate::coords::addr_of),
        );
    }
}
