//! Sideset inset: independent scripts on both sides of an operator
//!
//! Unlike nucleus scripts, the left-hand pair attaches flush to the
//! nucleus's left edge (right-aligned within the left column). Vertical
//! placement reuses the script arithmetic with the taller of each pair.

use crate::class::MathClass;
use crate::coords::addr_of;
use crate::cursor::CursorSlice;
use crate::data::MathData;
use crate::dimension::Dimension;
use crate::error::MathedResult;
use crate::inset::{InsetMath, Marker};
use crate::metrics::{ChangeContext, MetricsInfo, PainterInfo};
use crate::script::script_offsets;
use crate::write::{HtmlStream, LaTeXFeatures, MathMLStream, WriteStream};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write as _;

/// `\sideset{_{bl}^{tl}}{_{br}^{tr}}{nucleus}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsetMathSideset {
    nuc: MathData,
    bl: Option<MathData>,
    tl: Option<MathData>,
    br: Option<MathData>,
    tr: Option<MathData>,
}

impl InsetMathSideset {
    pub fn new(
        nuc: MathData,
        bl: Option<MathData>,
        tl: Option<MathData>,
        br: Option<MathData>,
        tr: Option<MathData>,
    ) -> Self {
        Self { nuc, bl, tl, br, tr }
    }

    pub fn nuc(&self) -> &MathData {
        &self.nuc
    }

    /// Cells in index order: nucleus, then bl, tl, br, tr as present
    fn cells(&self) -> Vec<&MathData> {
        let mut cells = vec![&self.nuc];
        cells.extend(self.bl.as_ref());
        cells.extend(self.tl.as_ref());
        cells.extend(self.br.as_ref());
        cells.extend(self.tr.as_ref());
        cells
    }

    fn cell_idx(&self, which: SidesetCell) -> Option<usize> {
        let mut idx = 1;
        for (cell, present) in [
            (SidesetCell::Bl, self.bl.is_some()),
            (SidesetCell::Tl, self.tl.is_some()),
            (SidesetCell::Br, self.br.is_some()),
            (SidesetCell::Tr, self.tr.is_some()),
        ] {
            if cell == which {
                return present.then_some(idx);
            }
            if present {
                idx += 1;
            }
        }
        None
    }

    fn dim_of(pi_coords: &crate::coords::CoordCache, cell: Option<&MathData>) -> Option<Dimension> {
        cell.map(|c| pi_coords.cells.dim(addr_of(c)).unwrap_or_default())
    }

    fn write_pair(
        ws: &mut WriteStream,
        sub: Option<&MathData>,
        sup: Option<&MathData>,
    ) -> fmt::Result {
        write!(ws, "{{")?;
        if let Some(sub) = sub {
            write!(ws, "_{{")?;
            sub.write(ws)?;
            write!(ws, "}}")?;
        }
        if let Some(sup) = sup {
            write!(ws, "^{{")?;
            sup.write(ws)?;
            write!(ws, "}}")?;
        }
        write!(ws, "}}")
    }
}

/// Logical cell names for navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SidesetCell {
    Bl,
    Tl,
    Br,
    Tr,
}

impl InsetMath for InsetMathSideset {
    fn metrics(&self, mi: &mut MetricsInfo, dim: &mut Dimension) {
        let mut nd = Dimension::default();
        self.nuc.metrics(mi, &mut nd);

        let mut script_dims: [Option<Dimension>; 4] = [None; 4];
        {
            let mut mi2 = mi.change_script();
            for (slot, cell) in [&self.bl, &self.tl, &self.br, &self.tr].into_iter().enumerate() {
                if let Some(cell) = cell {
                    let mut d = Dimension::default();
                    cell.metrics(&mut mi2, &mut d);
                    script_dims[slot] = Some(d);
                }
            }
        }
        let [bld, tld, brd, trd] = script_dims;

        // Use the taller of each vertical pair for placement
        let sub_dim = max_dim(bld, brd);
        let sup_dim = max_dim(tld, trd);
        let (dy_up, dy_down) = script_offsets(&mi.base, mi.fonts, nd, sub_dim, sup_dim, false);

        let left_w = bld.map_or(0, |d| d.width).max(tld.map_or(0, |d| d.width));
        let right_w = brd.map_or(0, |d| d.width).max(trd.map_or(0, |d| d.width));
        dim.width = left_w + nd.width + right_w + 1;
        dim.ascent = nd.ascent.max(sup_dim.map_or(0, |d| dy_up + d.ascent));
        dim.descent = nd.descent.max(sub_dim.map_or(0, |d| dy_down + d.descent));
    }

    fn draw(&self, pi: &mut PainterInfo, x: i32, y: i32) {
        let nd = pi.coords.cells.dim(addr_of(&self.nuc)).unwrap_or_default();
        let bld = Self::dim_of(&*pi.coords, self.bl.as_ref());
        let tld = Self::dim_of(&*pi.coords, self.tl.as_ref());
        let brd = Self::dim_of(&*pi.coords, self.br.as_ref());
        let trd = Self::dim_of(&*pi.coords, self.tr.as_ref());

        let sub_dim = max_dim(bld, brd);
        let sup_dim = max_dim(tld, trd);
        let (dy_up, dy_down) = script_offsets(&pi.base, pi.fonts, nd, sub_dim, sup_dim, false);

        let left_w = bld.map_or(0, |d| d.width).max(tld.map_or(0, |d| d.width));
        let nuc_x = x + left_w;

        self.nuc.draw(pi, nuc_x, y);
        let mut pi2 = pi.change_script();
        if let (Some(cell), Some(d)) = (&self.bl, bld) {
            cell.draw(&mut pi2, nuc_x - d.width, y + dy_down);
        }
        if let (Some(cell), Some(d)) = (&self.tl, tld) {
            cell.draw(&mut pi2, nuc_x - d.width, y - dy_up);
        }
        if let Some(cell) = &self.br {
            cell.draw(&mut pi2, nuc_x + nd.width, y + dy_down);
        }
        if let Some(cell) = &self.tr {
            cell.draw(&mut pi2, nuc_x + nd.width, y - dy_up);
        }
    }

    fn write(&self, ws: &mut WriteStream) -> fmt::Result {
        ws.command("sideset")?;
        Self::write_pair(ws, self.bl.as_ref(), self.tl.as_ref())?;
        Self::write_pair(ws, self.br.as_ref(), self.tr.as_ref())?;
        match self.nuc.len() {
            1 => self.nuc.write(ws),
            _ => {
                write!(ws, "{{")?;
                self.nuc.write(ws)?;
                write!(ws, "}}")
            }
        }
    }

    fn math_class(&self) -> MathClass {
        self.nuc.last_class()
    }

    fn marker(&self, nesting: usize) -> Marker {
        if nesting == 0 {
            Marker::Corner
        } else {
            Marker::None
        }
    }

    fn nargs(&self) -> usize {
        self.cells().len()
    }

    fn cell(&self, idx: usize) -> Option<&MathData> {
        self.cells().get(idx).copied()
    }

    fn cell_mut(&mut self, idx: usize) -> Option<&mut MathData> {
        let mut cells: Vec<&mut MathData> = vec![&mut self.nuc];
        cells.extend(self.bl.as_mut());
        cells.extend(self.tl.as_mut());
        cells.extend(self.br.as_mut());
        cells.extend(self.tr.as_mut());
        cells.into_iter().nth(idx)
    }

    fn idx_up_down(&self, cur: &mut CursorSlice, up: bool) -> bool {
        let nuc_len = self.nuc.len();
        if cur.idx == 0 {
            // Prefer the right-hand script, then the left-hand one
            let target = if up {
                self.cell_idx(SidesetCell::Tr)
                    .or_else(|| self.cell_idx(SidesetCell::Tl))
            } else {
                self.cell_idx(SidesetCell::Br)
                    .or_else(|| self.cell_idx(SidesetCell::Bl))
            };
            match target {
                Some(idx) => {
                    *cur = CursorSlice::front_of(idx);
                    true
                }
                None => false,
            }
        } else {
            let is_top = Some(cur.idx) == self.cell_idx(SidesetCell::Tl)
                || Some(cur.idx) == self.cell_idx(SidesetCell::Tr);
            let is_bottom = Some(cur.idx) == self.cell_idx(SidesetCell::Bl)
                || Some(cur.idx) == self.cell_idx(SidesetCell::Br);
            if (is_top && !up) || (is_bottom && up) {
                *cur = CursorSlice::back_of(0, nuc_len);
                true
            } else {
                false
            }
        }
    }

    fn validate(&self, features: &mut dyn LaTeXFeatures) {
        features.require("amsmath");
        for cell in self.cells() {
            for atom in cell.iter() {
                atom.validate(features);
            }
        }
    }

    fn mathmlize(&self, ms: &mut MathMLStream) -> MathedResult<()> {
        let _ = ms;
        Err(MathMLStream::unsupported("sideset"))
    }

    fn htmlize(&self, hs: &mut HtmlStream) -> MathedResult<()> {
        let _ = hs;
        Err(HtmlStream::unsupported("sideset"))
    }
}

fn max_dim(a: Option<Dimension>, b: Option<Dimension>) -> Option<Dimension> {
    match (a, b) {
        (None, None) => None,
        (Some(d), None) | (None, Some(d)) => Some(d),
        (Some(a), Some(b)) => Some(Dimension::new(
            a.width.max(b.width),
            a.ascent.max(b.ascent),
            a.descent.max(b.descent),
        )),
    }
}
