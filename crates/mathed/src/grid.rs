//! Grid inset - the tabular layout engine
//!
//! Generalizes matrices, aligned environments and arrays: an N x M array of
//! cells with per-row and per-column metadata (alignment, rule lines,
//! skips), multicolumn spans, and a command dispatch for structural edits.
//!
//! Layout is two passes per axis: per-cell metrics first, then row
//! ascent/descent maxima with cumulative vertical offsets, then column
//! widths with a multicolumn correction pass. The correction grows only the
//! last spanned column; splitting the deficit across all spanned columns
//! would be equally defensible, but the inherited policy is kept for
//! pixel compatibility.

use crate::class::MathClass;
use crate::coords::addr_of;
use crate::cursor::CursorSlice;
use crate::data::MathData;
use crate::dimension::Dimension;
use crate::dispatch::{
    parse_grid_feature, DispatchResult, FuncRequest, FuncStatus, GridFeature,
};
use crate::error::MathedResult;
use crate::inset::{InsetMath, Marker};
use crate::metrics::{ChangeContext, MetricsBase, MetricsInfo, PainterInfo};
use crate::write::{HtmlStream, LaTeXFeatures, MathMLStream, WriteStream};
use render_model::{FontMetrics, LineStyle, Painter as _};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write as _;
use tracing::debug;

/// Outer frame padding in pixels
const BORDER: i32 = 2;

/// Vertical alignment of the whole grid against the outer baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum VAlign {
    /// Baseline at the first row
    Top,
    /// Baseline at the vertical center
    #[default]
    Center,
    /// Baseline at the last row
    Bottom,
}

/// Per-row metadata; ascent/descent/offset are filled by the layout pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowInfo {
    pub ascent: i32,
    pub descent: i32,
    /// Baseline offset from the grid top
    pub offset: i32,
    /// Number of horizontal rule lines above this row
    /// (the trailing entry holds the lines below the last row)
    pub lines: usize,
    /// Extra vertical skip below this row, in pixels
    pub skip: i32,
    /// Whether a page break may occur after this row
    pub allow_newpage: bool,
}

impl Default for RowInfo {
    fn default() -> Self {
        Self {
            ascent: 0,
            descent: 0,
            offset: 0,
            lines: 0,
            skip: 0,
            allow_newpage: true,
        }
    }
}

/// Per-column metadata; width/offset are filled by the layout pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColInfo {
    /// Alignment character: 'l', 'c' or 'r'
    pub align: char,
    pub width: i32,
    /// Left edge of the column content from the grid left
    pub offset: i32,
    /// Number of vertical rule lines left of this column
    /// (the trailing entry holds the lines right of the last column)
    pub lines: usize,
    /// Extra horizontal skip after this column, in pixels
    pub skip: i32,
}

impl Default for ColInfo {
    fn default() -> Self {
        Self {
            align: 'c',
            width: 0,
            offset: 0,
            lines: 0,
            skip: 0,
        }
    }
}

/// Multicolumn state of one cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Multicolumn {
    #[default]
    Normal,
    /// First cell of a span; owns the content
    Begin,
    /// Absorbed into the span starting at the nearest Begin to its left
    Part,
}

/// Per-cell metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CellInfo {
    pub multi: Multicolumn,
    /// Alignment override for a multicolumn cell, e.g. "c"
    pub align: String,
}

/// Position of the cursor inside a grid, in cell coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPos {
    pub row: usize,
    pub col: usize,
}

impl GridPos {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Computed geometry of one layout pass
struct GridLayout {
    rows: Vec<RowInfo>,
    cols: Vec<ColInfo>,
    width: i32,
    ascent: i32,
    descent: i32,
}

/// The N x M tabular inset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsetMathGrid {
    nrows: usize,
    ncols: usize,
    cells: Vec<MathData>,
    rowinfo: Vec<RowInfo>,
    colinfo: Vec<ColInfo>,
    cellinfo: Vec<CellInfo>,
    v_align: VAlign,
}

impl InsetMathGrid {
    pub fn new(ncols: usize, nrows: usize) -> Self {
        assert!(ncols > 0 && nrows > 0, "grid needs at least one cell");
        Self {
            nrows,
            ncols,
            cells: vec![MathData::new(); ncols * nrows],
            rowinfo: vec![RowInfo::default(); nrows + 1],
            colinfo: vec![ColInfo::default(); ncols + 1],
            cellinfo: vec![CellInfo::default(); ncols * nrows],
            v_align: VAlign::Center,
        }
    }

    /// Build with a column alignment spec like "lcr"
    pub fn with_alignment(align: &str, nrows: usize) -> Self {
        let mut grid = Self::new(align.len().max(1), nrows);
        for (col, c) in align.chars().enumerate() {
            if matches!(c, 'l' | 'c' | 'r') {
                grid.colinfo[col].align = c;
            }
        }
        grid
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn v_align(&self) -> VAlign {
        self.v_align
    }

    pub fn set_v_align(&mut self, v_align: VAlign) {
        self.v_align = v_align;
    }

    pub fn index(&self, row: usize, col: usize) -> usize {
        debug_assert!(row < self.nrows && col < self.ncols);
        row * self.ncols + col
    }

    pub fn cell_at(&self, row: usize, col: usize) -> &MathData {
        &self.cells[self.index(row, col)]
    }

    pub fn cell_at_mut(&mut self, row: usize, col: usize) -> &mut MathData {
        let idx = self.index(row, col);
        &mut self.cells[idx]
    }

    pub fn cell_info(&self, row: usize, col: usize) -> &CellInfo {
        &self.cellinfo[self.index(row, col)]
    }

    pub fn row_info(&self, row: usize) -> &RowInfo {
        &self.rowinfo[row]
    }

    pub fn row_info_mut(&mut self, row: usize) -> &mut RowInfo {
        &mut self.rowinfo[row]
    }

    pub fn col_info(&self, col: usize) -> &ColInfo {
        &self.colinfo[col]
    }

    /// Structural consistency; every mutation must preserve this
    fn check_invariants(&self) {
        debug_assert_eq!(self.cells.len(), self.nrows * self.ncols);
        debug_assert_eq!(self.cellinfo.len(), self.cells.len());
        debug_assert_eq!(self.rowinfo.len(), self.nrows + 1);
        debug_assert_eq!(self.colinfo.len(), self.ncols + 1);
    }

    // =========================================================================
    // Structural edits
    // =========================================================================

    /// Insert an empty row below `row`
    pub fn add_row(&mut self, row: usize) {
        let at = (row + 1) * self.ncols;
        for _ in 0..self.ncols {
            self.cells.insert(at, MathData::new());
            self.cellinfo.insert(at, CellInfo::default());
        }
        self.rowinfo.insert(row + 1, RowInfo::default());
        self.nrows += 1;
        self.check_invariants();
    }

    /// Remove `row`; refused (no-op) for the last remaining row
    pub fn del_row(&mut self, row: usize) {
        if self.nrows == 1 {
            return;
        }
        let start = row * self.ncols;
        self.cells.drain(start..start + self.ncols);
        self.cellinfo.drain(start..start + self.ncols);
        self.rowinfo.remove(row);
        self.nrows -= 1;
        self.check_invariants();
    }

    /// Duplicate `row` below itself
    pub fn copy_row(&mut self, row: usize) {
        let start = row * self.ncols;
        let cells: Vec<MathData> = self.cells[start..start + self.ncols].to_vec();
        let infos: Vec<CellInfo> = self.cellinfo[start..start + self.ncols].to_vec();
        let at = (row + 1) * self.ncols;
        for (i, (cell, info)) in cells.into_iter().zip(infos).enumerate() {
            self.cells.insert(at + i, cell);
            self.cellinfo.insert(at + i, info);
        }
        self.rowinfo.insert(row + 1, self.rowinfo[row].clone());
        self.nrows += 1;
        self.check_invariants();
    }

    /// Swap `row` with the row below it; no-op for the last row
    pub fn swap_row(&mut self, row: usize) {
        if row + 1 >= self.nrows {
            return;
        }
        for col in 0..self.ncols {
            let a = row * self.ncols + col;
            let b = (row + 1) * self.ncols + col;
            self.cells.swap(a, b);
            self.cellinfo.swap(a, b);
        }
        self.rowinfo.swap(row, row + 1);
        self.check_invariants();
    }

    /// Insert an empty column right of `col`
    pub fn add_col(&mut self, col: usize) {
        for row in (0..self.nrows).rev() {
            let at = row * self.ncols + col + 1;
            self.cells.insert(at, MathData::new());
            self.cellinfo.insert(at, CellInfo::default());
        }
        self.colinfo.insert(col + 1, ColInfo::default());
        self.ncols += 1;
        self.check_invariants();
    }

    /// Remove `col`; refused (no-op) for the last remaining column
    pub fn del_col(&mut self, col: usize) {
        if self.ncols == 1 {
            return;
        }
        for row in (0..self.nrows).rev() {
            let at = row * self.ncols + col;
            self.cells.remove(at);
            self.cellinfo.remove(at);
        }
        self.colinfo.remove(col);
        self.ncols -= 1;
        self.check_invariants();
    }

    /// Duplicate `col` right of itself
    pub fn copy_col(&mut self, col: usize) {
        for row in (0..self.nrows).rev() {
            let at = row * self.ncols + col;
            let cell = self.cells[at].clone();
            let info = self.cellinfo[at].clone();
            self.cells.insert(at + 1, cell);
            self.cellinfo.insert(at + 1, info);
        }
        self.colinfo.insert(col + 1, self.colinfo[col].clone());
        self.ncols += 1;
        self.check_invariants();
    }

    /// Swap `col` with the column right of it; no-op for the last column
    pub fn swap_col(&mut self, col: usize) {
        if col + 1 >= self.ncols {
            return;
        }
        for row in 0..self.nrows {
            let a = row * self.ncols + col;
            self.cells.swap(a, a + 1);
            self.cellinfo.swap(a, a + 1);
        }
        self.colinfo.swap(col, col + 1);
        self.check_invariants();
    }

    pub fn set_col_align(&mut self, col: usize, align: char) {
        if matches!(align, 'l' | 'c' | 'r') {
            self.colinfo[col].align = align;
        }
    }

    // =========================================================================
    // Multicolumn
    // =========================================================================

    /// Span of the multicolumn beginning at (row, col): inclusive column
    /// range. A Normal cell spans just itself.
    pub fn multicolumn_range(&self, row: usize, col: usize) -> (usize, usize) {
        let mut last = col;
        while last + 1 < self.ncols
            && self.cellinfo[self.index(row, last + 1)].multi == Multicolumn::Part
        {
            last += 1;
        }
        (col, last)
    }

    /// Merge the cell at (row, col) with its right neighbor. Absorbed
    /// content is appended to the begin cell so nothing is lost.
    pub fn merge_multicolumn(&mut self, row: usize, col: usize) {
        let (_, last) = self.multicolumn_range(row, col);
        if last + 1 >= self.ncols {
            return;
        }
        let absorbed_idx = self.index(row, last + 1);
        let absorbed = std::mem::take(&mut self.cells[absorbed_idx]);
        let begin_idx = self.index(row, col);
        self.cells[begin_idx].append(absorbed);
        self.cellinfo[begin_idx].multi = Multicolumn::Begin;
        if self.cellinfo[begin_idx].align.is_empty() {
            self.cellinfo[begin_idx].align = self.colinfo[col].align.to_string();
        }
        self.cellinfo[absorbed_idx].multi = Multicolumn::Part;
        self.check_invariants();
    }

    /// Split the multicolumn beginning at (row, col) back into normal
    /// cells. The begin cell keeps the content; the absorbed cells become
    /// independently empty again.
    pub fn split_multicolumn(&mut self, row: usize, col: usize) {
        let (first, last) = self.multicolumn_range(row, col);
        let begin_idx = self.index(row, first);
        if self.cellinfo[begin_idx].multi != Multicolumn::Begin {
            return;
        }
        self.cellinfo[begin_idx].multi = Multicolumn::Normal;
        self.cellinfo[begin_idx].align.clear();
        for c in first + 1..=last {
            let idx = self.index(row, c);
            self.cellinfo[idx].multi = Multicolumn::Normal;
            self.cells[idx] = MathData::new();
        }
        self.check_invariants();
    }

    /// Move the content after `pos` in (row, col) to the start of the cell
    /// to the right; splitting a multicolumn begin-cell reverts the span.
    pub fn split_cell(&mut self, row: usize, col: usize, pos: usize) {
        if self.cellinfo[self.index(row, col)].multi == Multicolumn::Begin {
            self.split_multicolumn(row, col);
            return;
        }
        if col + 1 >= self.ncols {
            return;
        }
        let idx = self.index(row, col);
        let pos = pos.min(self.cells[idx].len());
        let tail: Vec<_> = (pos..self.cells[idx].len())
            .map(|_| self.cells[idx].remove(pos))
            .collect();
        let next = self.index(row, col + 1);
        for (i, atom) in tail.into_iter().enumerate() {
            self.cells[next].insert(i, atom);
        }
        self.check_invariants();
    }

    // =========================================================================
    // Paste
    // =========================================================================

    /// Paste a run of atoms into one cell at the given position
    pub fn paste_data(&mut self, row: usize, col: usize, pos: usize, data: MathData) {
        let idx = self.index(row, col);
        let pos = pos.min(self.cells[idx].len());
        for (i, atom) in data.iter().cloned().enumerate() {
            self.cells[idx].insert(pos + i, atom);
        }
    }

    /// Paste another grid cell-by-cell starting at (row, col), clipping
    /// rows/columns that do not fit in the destination
    pub fn paste_grid(&mut self, row: usize, col: usize, source: &InsetMathGrid) {
        for sr in 0..source.nrows {
            let dr = row + sr;
            if dr >= self.nrows {
                break;
            }
            for sc in 0..source.ncols {
                let dc = col + sc;
                if dc >= self.ncols {
                    break;
                }
                let content = source.cell_at(sr, sc).clone();
                self.cell_at_mut(dr, dc).append(content);
            }
        }
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Pure, side-effect-free status query for a command at a position
    pub fn get_status(&self, at: GridPos, cmd: &FuncRequest) -> FuncStatus {
        use crate::dispatch::Action;
        match cmd.action {
            Action::Paste => FuncStatus::enabled(),
            Action::TabularFeature => match parse_grid_feature(&cmd.argument) {
                Err(_) => FuncStatus::disabled(format!("unknown feature: {}", cmd.argument)),
                Ok((feature, _)) => self.feature_status(at, feature),
            },
            _ => FuncStatus::enabled(),
        }
    }

    fn feature_status(&self, at: GridPos, feature: GridFeature) -> FuncStatus {
        match feature {
            GridFeature::DeleteRow if self.nrows == 1 => {
                FuncStatus::disabled("cannot delete the last row")
            }
            GridFeature::DeleteColumn if self.ncols == 1 => {
                FuncStatus::disabled("cannot delete the last column")
            }
            GridFeature::SwapRow if at.row + 1 >= self.nrows => {
                FuncStatus::disabled("no row below to swap with")
            }
            GridFeature::SwapColumn if at.col + 1 >= self.ncols => {
                FuncStatus::disabled("no column right of this one to swap with")
            }
            GridFeature::DeleteHlineAbove if self.rowinfo[at.row].lines == 0 => {
                FuncStatus::disabled("no horizontal line to delete")
            }
            GridFeature::DeleteHlineBelow if self.rowinfo[at.row + 1].lines == 0 => {
                FuncStatus::disabled("no horizontal line to delete")
            }
            GridFeature::DeleteVlineLeft if self.colinfo[at.col].lines == 0 => {
                FuncStatus::disabled("no vertical line to delete")
            }
            GridFeature::DeleteVlineRight if self.colinfo[at.col + 1].lines == 0 => {
                FuncStatus::disabled("no vertical line to delete")
            }
            GridFeature::Multicolumn
                if self.multicolumn_range(at.row, at.col).1 + 1 >= self.ncols
                    && self.cell_info(at.row, at.col).multi != Multicolumn::Begin =>
            {
                FuncStatus::disabled("no cell to the right to merge with")
            }
            GridFeature::SplitCell
                if at.col + 1 >= self.ncols
                    && self.cell_info(at.row, at.col).multi != Multicolumn::Begin =>
            {
                FuncStatus::disabled("nothing to split into")
            }
            _ => FuncStatus::enabled(),
        }
    }

    /// Apply a table-editing command. Declines exactly when `get_status`
    /// reports disabled; every mutation invalidates cached layout upstream.
    pub fn do_dispatch(
        &mut self,
        at: GridPos,
        cursor_pos: usize,
        cmd: &FuncRequest,
    ) -> DispatchResult {
        if !self.get_status(at, cmd).is_enabled() {
            return DispatchResult::Undispatched;
        }
        let Ok((feature, count)) = parse_grid_feature(&cmd.argument) else {
            return DispatchResult::Undispatched;
        };
        debug!(feature = feature.name(), count, "grid dispatch");
        for _ in 0..count {
            match feature {
                GridFeature::AppendRow => self.add_row(at.row),
                GridFeature::DeleteRow => self.del_row(at.row.min(self.nrows - 1)),
                GridFeature::CopyRow => self.copy_row(at.row),
                GridFeature::SwapRow => self.swap_row(at.row),
                GridFeature::AppendColumn => self.add_col(at.col),
                GridFeature::DeleteColumn => self.del_col(at.col.min(self.ncols - 1)),
                GridFeature::CopyColumn => self.copy_col(at.col),
                GridFeature::SwapColumn => self.swap_col(at.col),
                GridFeature::AddHlineAbove => self.rowinfo[at.row].lines += 1,
                GridFeature::AddHlineBelow => self.rowinfo[at.row + 1].lines += 1,
                GridFeature::DeleteHlineAbove => {
                    self.rowinfo[at.row].lines = self.rowinfo[at.row].lines.saturating_sub(1)
                }
                GridFeature::DeleteHlineBelow => {
                    self.rowinfo[at.row + 1].lines =
                        self.rowinfo[at.row + 1].lines.saturating_sub(1)
                }
                GridFeature::AddVlineLeft => self.colinfo[at.col].lines += 1,
                GridFeature::AddVlineRight => self.colinfo[at.col + 1].lines += 1,
                GridFeature::DeleteVlineLeft => {
                    self.colinfo[at.col].lines = self.colinfo[at.col].lines.saturating_sub(1)
                }
                GridFeature::DeleteVlineRight => {
                    self.colinfo[at.col + 1].lines =
                        self.colinfo[at.col + 1].lines.saturating_sub(1)
                }
                GridFeature::AlignLeft => self.set_col_align(at.col, 'l'),
                GridFeature::AlignCenter => self.set_col_align(at.col, 'c'),
                GridFeature::AlignRight => self.set_col_align(at.col, 'r'),
                GridFeature::ValignTop => self.v_align = VAlign::Top,
                GridFeature::ValignMiddle => self.v_align = VAlign::Center,
                GridFeature::ValignBottom => self.v_align = VAlign::Bottom,
                GridFeature::Multicolumn => self.merge_multicolumn(at.row, at.col),
                GridFeature::SplitCell => self.split_cell(at.row, at.col, cursor_pos),
            }
        }
        self.check_invariants();
        DispatchResult::Dispatched
    }

    // =========================================================================
    // Layout
    // =========================================================================

    fn colsep(base: &MetricsBase) -> i32 {
        base.em() / 2
    }

    fn rowsep(base: &MetricsBase) -> i32 {
        base.em() / 4
    }

    fn line_sep(base: &MetricsBase) -> i32 {
        base.solid_line_thickness() + 1
    }

    /// Horizontal gap between columns `c-1` and `c` (skips, separation and
    /// rule lines); independent of column widths
    fn col_gap(&self, base: &MetricsBase, c: usize) -> i32 {
        Self::colsep(base) + self.colinfo[c - 1].skip + self.colinfo[c].lines as i32 * Self::line_sep(base)
    }

    /// The geometry of the grid given per-cell dimensions
    fn compute_layout(
        &self,
        base: &MetricsBase,
        fonts: &dyn FontMetrics,
        cell_dims: &[Dimension],
    ) -> GridLayout {
        let mut rows = self.rowinfo.clone();
        let mut cols = self.colinfo.clone();
        let line_sep = Self::line_sep(base);

        // Row pass: ascent/descent maxima over the row's own cells
        for row in 0..self.nrows {
            let mut ascent = 0;
            let mut descent = 0;
            for col in 0..self.ncols {
                let idx = self.index(row, col);
                if self.cellinfo[idx].multi == Multicolumn::Part {
                    continue;
                }
                ascent = ascent.max(cell_dims[idx].ascent);
                descent = descent.max(cell_dims[idx].descent);
            }
            rows[row].ascent = ascent;
            rows[row].descent = descent;
        }
        // Cumulative baseline offsets from the grid top
        let mut offset = BORDER;
        for row in 0..self.nrows {
            offset += rows[row].lines as i32 * line_sep;
            offset += rows[row].ascent;
            rows[row].offset = offset;
            offset += rows[row].descent + rows[row].skip;
            if row + 1 < self.nrows {
                offset += Self::rowsep(base);
            }
        }
        offset += rows[self.nrows].lines as i32 * line_sep + BORDER;
        let total_height = offset;

        // Column pass: single-column widths first
        for col in 0..self.ncols {
            let mut width = 0;
            for row in 0..self.nrows {
                let idx = self.index(row, col);
                if self.cellinfo[idx].multi != Multicolumn::Normal {
                    continue;
                }
                width = width.max(cell_dims[idx].width);
            }
            cols[col].width = width;
        }
        // Multicolumn correction: a span wider than its columns grows the
        // last spanned column by the whole deficit
        for row in 0..self.nrows {
            for col in 0..self.ncols {
                let idx = self.index(row, col);
                if self.cellinfo[idx].multi != Multicolumn::Begin {
                    continue;
                }
                let (first, last) = self.multicolumn_range(row, col);
                let mut current: i32 = (first..=last).map(|c| cols[c].width).sum();
                for c in first + 1..=last {
                    current += self.col_gap(base, c);
                }
                let natural = cell_dims[idx].width;
                if natural > current {
                    cols[last].width += natural - current;
                }
            }
        }
        // Cumulative horizontal offsets
        let mut x = BORDER + self.colinfo[0].lines as i32 * line_sep;
        for col in 0..self.ncols {
            cols[col].offset = x;
            x += cols[col].width;
            if col + 1 < self.ncols {
                x += self.col_gap(base, col + 1);
            }
        }
        x += self.colinfo[self.ncols].lines as i32 * line_sep + BORDER;
        cols[self.ncols].offset = x;

        // Whole-grid reference baseline per the vertical alignment
        let font = base.font.text_style();
        let axis = fonts.axis_height(&font);
        let ascent = match self.v_align {
            VAlign::Top => rows[0].offset,
            VAlign::Center => total_height / 2 + axis,
            VAlign::Bottom => rows[self.nrows - 1].offset,
        };

        GridLayout {
            rows,
            cols,
            width: x,
            ascent,
            descent: total_height - ascent,
        }
    }

    /// Pixel width of the cell starting at (row, col), spanning columns
    /// for a multicolumn begin cell
    fn span_width(&self, layout: &GridLayout, base: &MetricsBase, row: usize, col: usize) -> i32 {
        let (first, last) = self.multicolumn_range(row, col);
        let mut width: i32 = (first..=last).map(|c| layout.cols[c].width).sum();
        for c in first + 1..=last {
            width += self.col_gap(base, c);
        }
        width
    }

    fn cell_align(&self, row: usize, col: usize) -> char {
        let info = &self.cellinfo[self.index(row, col)];
        if info.multi == Multicolumn::Begin {
            if let Some(c) = info.align.chars().next() {
                return c;
            }
        }
        self.colinfo[col].align
    }

    fn cell_dims_from_cache(&self, pi: &PainterInfo) -> Vec<Dimension> {
        self.cells
            .iter()
            .map(|cell| pi.coords.cells.dim(addr_of(cell)).unwrap_or_default())
            .collect()
    }
}

impl InsetMath for InsetMathGrid {
    fn metrics(&self, mi: &mut MetricsInfo, dim: &mut Dimension) {
        let mut cell_dims = vec![Dimension::default(); self.cells.len()];
        {
            let mut mi2 = mi.change_array();
            for (idx, cell) in self.cells.iter().enumerate() {
                if self.cellinfo[idx].multi == Multicolumn::Part {
                    continue;
                }
                let mut d = Dimension::default();
                cell.metrics(&mut mi2, &mut d);
                cell_dims[idx] = d;
            }
        }
        let layout = self.compute_layout(&mi.base, mi.fonts, &cell_dims);
        dim.width = layout.width;
        dim.ascent = layout.ascent;
        dim.descent = layout.descent;
    }

    fn draw(&self, pi: &mut PainterInfo, x: i32, y: i32) {
        let cell_dims = self.cell_dims_from_cache(pi);
        let layout = self.compute_layout(&pi.base, pi.fonts, &cell_dims);
        let top = y - layout.ascent;
        let line_sep = Self::line_sep(&pi.base);
        let thickness = pi.base.solid_line_thickness();
        let color = pi.base.font.color;

        // Cells, row-major, skipping absorbed span parts
        for row in 0..self.nrows {
            for col in 0..self.ncols {
                let idx = self.index(row, col);
                if self.cellinfo[idx].multi == Multicolumn::Part {
                    continue;
                }
                let avail = self.span_width(&layout, &pi.base, row, col);
                let align = self.cell_align(row, col);
                let slack = avail - cell_dims[idx].width;
                let dx = match align {
                    'l' => 0,
                    'r' => slack,
                    _ => slack / 2,
                };
                let cx = x + layout.cols[col].offset + dx;
                let cy = top + layout.rows[row].offset;
                let mut pi2 = pi.change_array();
                self.cells[idx].draw(&mut pi2, cx, cy);
            }
        }

        // Rule segments, cell by cell so multicolumn spans stay unbroken
        for row in 0..self.nrows {
            let row_top = layout.rows[row].offset - layout.rows[row].ascent;
            let row_bottom = layout.rows[row].offset + layout.rows[row].descent;
            for col in 0..self.ncols {
                let idx = self.index(row, col);
                if self.cellinfo[idx].multi == Multicolumn::Part {
                    continue;
                }
                let left = layout.cols[col].offset;
                let right = left + self.span_width(&layout, &pi.base, row, col);
                // Lines above this row, across this cell's span
                for l in 0..self.rowinfo[row].lines {
                    let ly = top + row_top - 1 - l as i32 * line_sep;
                    pi.pain
                        .line(x + left, ly, x + right, ly, color, LineStyle::Solid, thickness);
                }
                // Lines left of this cell (span parts have no own boundary)
                for l in 0..self.colinfo[col].lines {
                    let lx = x + left - 2 - l as i32 * line_sep;
                    pi.pain.line(
                        lx,
                        top + row_top,
                        lx,
                        top + row_bottom,
                        color,
                        LineStyle::Solid,
                        thickness,
                    );
                }
            }
        }

        // Outer border rules, once for the whole grid
        let grid_bottom = top + layout.ascent + layout.descent - BORDER;
        for l in 0..self.rowinfo[self.nrows].lines {
            let ly = grid_bottom + 1 + l as i32 * line_sep;
            pi.pain.line(
                x + BORDER,
                ly,
                x + layout.width - BORDER,
                ly,
                color,
                LineStyle::Solid,
                thickness,
            );
        }
        for l in 0..self.colinfo[self.ncols].lines {
            let lx = x + layout.width - BORDER + 1 + l as i32 * line_sep;
            pi.pain.line(
                lx,
                top + BORDER,
                lx,
                grid_bottom,
                color,
                LineStyle::Solid,
                thickness,
            );
        }
    }

    fn write(&self, ws: &mut WriteStream) -> fmt::Result {
        for row in 0..self.nrows {
            if row > 0 {
                write!(ws, "\\\\\n")?;
            }
            for _ in 0..self.rowinfo[row].lines {
                ws.command("hline")?;
                write!(ws, "\n")?;
            }
            let mut first = true;
            for col in 0..self.ncols {
                let idx = self.index(row, col);
                let info = &self.cellinfo[idx];
                if info.multi == Multicolumn::Part {
                    continue;
                }
                if !first {
                    write!(ws, "&")?;
                }
                first = false;
                if info.multi == Multicolumn::Begin {
                    let (a, b) = self.multicolumn_range(row, col);
                    ws.command("multicolumn")?;
                    write!(ws, "{{{}}}", b - a + 1)?;
                    write!(
                        ws,
                        "{{{}}}",
                        if info.align.is_empty() { "c" } else { &info.align }
                    )?;
                    write!(ws, "{{")?;
                    self.cells[idx].write(ws)?;
                    write!(ws, "}}")?;
                } else {
                    self.cells[idx].write(ws)?;
                }
            }
        }
        if self.rowinfo[self.nrows].lines > 0 {
            write!(ws, "\\\\\n")?;
            for _ in 0..self.rowinfo[self.nrows].lines {
                ws.command("hline")?;
            }
        }
        Ok(())
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
        self.cells.len()
    }

    fn cell(&self, idx: usize) -> Option<&MathData> {
        self.cells.get(idx)
    }

    fn cell_mut(&mut self, idx: usize) -> Option<&mut MathData> {
        self.cells.get_mut(idx)
    }

    /// Up/down moves a full row, clamped at the top/bottom edge
    fn idx_up_down(&self, cur: &mut CursorSlice, up: bool) -> bool {
        if up {
            if cur.idx >= self.ncols {
                *cur = CursorSlice::front_of(cur.idx - self.ncols);
                true
            } else {
                false
            }
        } else if cur.idx + self.ncols < self.cells.len() {
            *cur = CursorSlice::front_of(cur.idx + self.ncols);
            true
        } else {
            false
        }
    }

    fn validate(&self, features: &mut dyn LaTeXFeatures) {
        for cell in &self.cells {
            for atom in cell.iter() {
                atom.validate(features);
            }
        }
    }

    fn mathmlize(&self, ms: &mut MathMLStream) -> MathedResult<()> {
        ms.open("mtable")?;
        for row in 0..self.nrows {
            ms.open("mtr")?;
            for col in 0..self.ncols {
                let idx = self.index(row, col);
                if self.cellinfo[idx].multi == Multicolumn::Part {
                    continue;
                }
                ms.open("mtd")?;
                self.cells[idx].mathmlize(ms)?;
                ms.close("mtd")?;
            }
            ms.close("mtr")?;
        }
        ms.close("mtable")
    }

    fn htmlize(&self, hs: &mut HtmlStream) -> MathedResult<()> {
        hs.open_span("grid")?;
        for row in 0..self.nrows {
            hs.open_span("gridrow")?;
            for col in 0..self.ncols {
                let idx = self.index(row, col);
                if self.cellinfo[idx].multi == Multicolumn::Part {
                    continue;
                }
                hs.open_span("gridcell")?;
                self.cells[idx].htmlize(hs)?;
                hs.close_span()?;
            }
            hs.close_span()?;
        }
        hs.close_span()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::CoordCache;
    use crate::font::{FontInfo, MathStyle};
    use crate::inset::MathAtom;
    use render_model::ApproxFontMetrics;

    fn grid_2x2(a: &str, b: &str, c: &str, d: &str) -> InsetMathGrid {
        let mut grid = InsetMathGrid::new(2, 2);
        *grid.cell_at_mut(0, 0) = MathData::from_str_atoms(a);
        *grid.cell_at_mut(0, 1) = MathData::from_str_atoms(b);
        *grid.cell_at_mut(1, 0) = MathData::from_str_atoms(c);
        *grid.cell_at_mut(1, 1) = MathData::from_str_atoms(d);
        grid
    }

    fn assert_consistent(grid: &InsetMathGrid) {
        assert_eq!(grid.cells.len(), grid.nrows() * grid.ncols());
        assert_eq!(grid.cellinfo.len(), grid.cells.len());
        assert_eq!(grid.rowinfo.len(), grid.nrows() + 1);
        assert_eq!(grid.colinfo.len(), grid.ncols() + 1);
    }

    #[test]
    fn test_construction_invariants() {
        let grid = InsetMathGrid::new(3, 2);
        assert_consistent(&grid);
        assert_eq!(grid.nargs(), 6);
    }

    #[test]
    fn test_structural_edits_keep_invariants() {
        let mut grid = grid_2x2("a", "b", "c", "d");
        grid.add_row(0);
        assert_consistent(&grid);
        assert_eq!(grid.nrows(), 3);
        grid.add_col(1);
        assert_consistent(&grid);
        assert_eq!(grid.ncols(), 3);
        grid.copy_row(1);
        assert_consistent(&grid);
        grid.swap_col(0);
        assert_consistent(&grid);
        grid.del_row(0);
        assert_consistent(&grid);
        grid.del_col(0);
        assert_consistent(&grid);
        grid.merge_multicolumn(0, 0);
        assert_consistent(&grid);
        grid.split_multicolumn(0, 0);
        assert_consistent(&grid);
    }

    #[test]
    fn test_cannot_delete_last_row_or_column() {
        let mut grid = InsetMathGrid::new(1, 1);
        grid.del_row(0);
        grid.del_col(0);
        assert_eq!(grid.nrows(), 1);
        assert_eq!(grid.ncols(), 1);
        let status = grid.get_status(GridPos::new(0, 0), &FuncRequest::tabular("delete-row"));
        assert!(!status.is_enabled());
        assert!(status.message().unwrap().contains("last row"));
    }

    #[test]
    fn test_swap_row_moves_content() {
        let mut grid = grid_2x2("a", "b", "c", "d");
        grid.swap_row(0);
        assert_eq!(grid.cell_at(0, 0).to_latex(), "c");
        assert_eq!(grid.cell_at(1, 0).to_latex(), "a");
    }

    #[test]
    fn test_dispatch_with_repeat_count() {
        let mut grid = grid_2x2("a", "b", "c", "d");
        let result = grid.do_dispatch(
            GridPos::new(0, 0),
            0,
            &FuncRequest::tabular("append-row 2"),
        );
        assert!(result.dispatched());
        assert_eq!(grid.nrows(), 4);
        assert_consistent(&grid);
    }

    #[test]
    fn test_dispatch_declines_when_status_disabled() {
        let mut grid = InsetMathGrid::new(1, 1);
        let result = grid.do_dispatch(GridPos::new(0, 0), 0, &FuncRequest::tabular("delete-row"));
        assert!(!result.dispatched());
        assert_eq!(grid.nrows(), 1);
    }

    #[test]
    fn test_delete_missing_hline_is_disabled() {
        let grid = grid_2x2("a", "b", "c", "d");
        let status = grid.get_status(
            GridPos::new(0, 0),
            &FuncRequest::tabular("delete-hline-above"),
        );
        assert!(!status.is_enabled());
    }

    #[test]
    fn test_write_2x2_with_hline() {
        let mut grid = grid_2x2("a", "b", "c", "d");
        // Simulate "add-hline-above" on the second row
        grid.row_info_mut(1).lines += 1;
        let mut buf = String::new();
        let mut ws = WriteStream::new(&mut buf);
        grid.write(&mut ws).unwrap();
        assert_eq!(buf, "a&b\\\\\n\\hline\nc&d");
        assert!(!buf.ends_with('&'));
        assert_eq!(buf.matches("\\hline").count(), 1);
    }

    #[test]
    fn test_multicolumn_write() {
        let mut grid = grid_2x2("a", "b", "c", "d");
        grid.merge_multicolumn(0, 0);
        let mut buf = String::new();
        let mut ws = WriteStream::new(&mut buf);
        grid.write(&mut ws).unwrap();
        assert_eq!(buf, "\\multicolumn{2}{c}{ab}\\\\\nc&d");
    }

    #[test]
    fn test_merge_then_split_restores_normal_cells() {
        let mut grid = grid_2x2("a", "b", "c", "d");
        grid.merge_multicolumn(0, 0);
        assert_eq!(grid.cell_info(0, 0).multi, Multicolumn::Begin);
        assert_eq!(grid.cell_info(0, 1).multi, Multicolumn::Part);
        // The begin cell holds the merged content
        assert_eq!(grid.cell_at(0, 0).to_latex(), "ab");
        grid.split_multicolumn(0, 0);
        assert_eq!(grid.cell_info(0, 0).multi, Multicolumn::Normal);
        assert_eq!(grid.cell_info(0, 1).multi, Multicolumn::Normal);
        // The begin cell keeps the data, the absorbed cell is empty again
        assert_eq!(grid.cell_at(0, 0).to_latex(), "ab");
        assert!(grid.cell_at(0, 1).is_empty());
    }

    #[test]
    fn test_split_cell_moves_tail_right() {
        let mut grid = grid_2x2("abc", "z", "c", "d");
        grid.split_cell(0, 0, 1);
        assert_eq!(grid.cell_at(0, 0).to_latex(), "a");
        assert_eq!(grid.cell_at(0, 1).to_latex(), "bcz");
    }

    #[test]
    fn test_paste_grid_clips_to_destination() {
        let mut dest = InsetMathGrid::new(2, 2);
        let src = grid_2x2("1", "2", "3", "4");
        dest.paste_grid(1, 1, &src);
        // Only the top-left source cell fits
        assert_eq!(dest.cell_at(1, 1).to_latex(), "1");
        assert!(dest.cell_at(0, 0).is_empty());
    }

    fn measure(grid: &InsetMathGrid) -> (Dimension, CoordCache) {
        let fonts = ApproxFontMetrics;
        let mut coords = CoordCache::new();
        let mut dim = Dimension::default();
        {
            let mut mi = MetricsInfo::new(
                &fonts,
                &mut coords,
                MetricsBase::new(FontInfo::new(12.0, MathStyle::Text), 600),
            );
            grid.metrics(&mut mi, &mut dim);
        }
        (dim, coords)
    }

    #[test]
    fn test_metrics_grow_with_content() {
        let small = grid_2x2("a", "b", "c", "d");
        let wide = grid_2x2("aaaa", "b", "c", "d");
        let (small_dim, _) = measure(&small);
        let (wide_dim, _) = measure(&wide);
        assert!(wide_dim.width > small_dim.width);
        assert!(small_dim.height() > 0);
    }

    #[test]
    fn test_multicolumn_deficit_grows_last_spanned_column_only() {
        // 3 columns, 2 rows; row 0 spans columns 0-1 with wide content
        let mut grid = InsetMathGrid::new(3, 2);
        *grid.cell_at_mut(0, 0) = MathData::from_str_atoms("wwwwwwww");
        *grid.cell_at_mut(1, 0) = MathData::from_str_atoms("a");
        *grid.cell_at_mut(1, 1) = MathData::from_str_atoms("b");
        *grid.cell_at_mut(1, 2) = MathData::from_str_atoms("c");
        grid.merge_multicolumn(0, 0);

        let fonts = ApproxFontMetrics;
        let base = MetricsBase::new(FontInfo::new(12.0, MathStyle::Text), 600);

        // Independent per-column widths before the correction
        let (_, coords) = measure(&grid);
        let cell_dims: Vec<Dimension> = grid
            .cells
            .iter()
            .map(|c| coords.cells.dim(addr_of(c)).unwrap_or_default())
            .collect();
        let layout = grid.compute_layout(&base, &fonts, &cell_dims);

        let col0_content = cell_dims[grid.index(1, 0)].width;
        let col1_content = cell_dims[grid.index(1, 1)].width;
        let span_natural = cell_dims[grid.index(0, 0)].width;
        let gap = grid.col_gap(&base, 1);
        assert!(span_natural > col0_content + gap + col1_content);

        // Column 0 keeps its independent width; column 1 absorbs the whole
        // deficit
        assert_eq!(layout.cols[0].width, col0_content);
        assert_eq!(
            layout.cols[1].width,
            span_natural - col0_content - gap
        );
        // Column 2 is untouched
        assert_eq!(layout.cols[2].width, cell_dims[grid.index(1, 2)].width);
    }

    #[test]
    fn test_valign_moves_baseline() {
        let mut grid = grid_2x2("a", "b", "c", "d");
        let (center, _) = measure(&grid);
        grid.set_v_align(VAlign::Top);
        let (top, _) = measure(&grid);
        grid.set_v_align(VAlign::Bottom);
        let (bottom, _) = measure(&grid);
        assert!(top.ascent < center.ascent);
        assert!(bottom.ascent > center.ascent);
        // Total height is alignment-independent
        assert_eq!(top.height(), center.height());
        assert_eq!(bottom.height(), center.height());
    }

    #[test]
    fn test_up_down_moves_full_rows() {
        let grid = InsetMathGrid::new(3, 3);
        let mut cur = CursorSlice::front_of(4); // center cell
        assert!(grid.idx_up_down(&mut cur, true));
        assert_eq!(cur.idx, 1);
        assert!(!grid.idx_up_down(&mut cur, true));
        let mut cur = CursorSlice::front_of(4);
        assert!(grid.idx_up_down(&mut cur, false));
        assert_eq!(cur.idx, 7);
        assert!(!grid.idx_up_down(&mut cur, false));
    }

    #[test]
    fn test_align_dispatch() {
        let mut grid = grid_2x2("a", "b", "c", "d");
        let result = grid.do_dispatch(GridPos::new(0, 1), 0, &FuncRequest::tabular("align-right"));
        assert!(result.dispatched());
        assert_eq!(grid.col_info(1).align, 'r');
    }

    #[test]
    fn test_empty_cell_atom_insert() {
        let mut grid = InsetMathGrid::new(2, 1);
        grid.cell_at_mut(0, 0).push(MathAtom::char('x'));
        assert_eq!(grid.cell_at(0, 0).to_latex(), "x");
    }
}
